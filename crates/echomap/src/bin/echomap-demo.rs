//! Run a self-contained EchoMap session against the simulated swarm and
//! print what the map would show.

use std::sync::Arc;

use clap::Parser;
use echomap::{EchoMapResult, FixedResolver, LocalSimulator, Session};
use echomap_trace::Output;
use echomap_types::{Coordinate, EchoMapConfig};

/// Helper to watch an EchoMap session live from a terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct EchoMapDemo {
    #[arg(
        long,
        help = "Outputs structured json from logging:
    - None: No logging at all (fastest)
    - Log: Output logs to stderr with spans (human readable)
    - Compact: Same as Log but with less information
    - Json: Output logs as structured json (machine readable)",
        default_value = "Log"
    )]
    structured: Output,

    /// How long a ping stays on the map, in milliseconds.
    #[arg(long, default_value = "8000")]
    ping_ttl_ms: u64,

    /// Cadence of the simulated ambient feed, in milliseconds.
    #[arg(long, default_value = "2500")]
    ambient_interval_ms: u64,

    /// Upper bound on concurrently held pings.
    #[arg(long, default_value = "50")]
    max_active_pings: usize,

    /// How many seconds to run before shutting down.
    #[arg(long, default_value = "30")]
    run_for_secs: u64,

    /// Latitude reported for your own broadcast.
    #[arg(long, default_value = "51.5074", allow_hyphen_values = true)]
    lat: f64,

    /// Longitude reported for your own broadcast.
    #[arg(long, default_value = "-0.1278", allow_hyphen_values = true)]
    lng: f64,
}

impl EchoMapDemo {
    async fn run(self) {
        if let Err(err) = self.run_err().await {
            eprintln!("{err:?}");
        }
    }

    async fn run_err(self) -> EchoMapResult<()> {
        let config = EchoMapConfig::default().tune(|mut tp| {
            tp.ping_ttl_ms = self.ping_ttl_ms;
            tp.ambient_interval_ms = self.ambient_interval_ms;
            tp.max_active_pings = self.max_active_pings;
            tp
        });
        tracing::info!(?config);

        let resolver = Arc::new(FixedResolver(Coordinate::new(self.lat, self.lng)));
        let transport = Arc::new(LocalSimulator::new(config.tuning_params.clone()));
        let session = Session::spawn(config, resolver, transport).await?;

        println!("# ECHOMAP DEMO - RUNNING");

        let ping = session.broadcast().await?;
        println!("# you are on the map at {}", ping.coordinate);

        let deadline =
            tokio::time::Instant::now() + std::time::Duration::from_secs(self.run_for_secs);
        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            let stats = session.stats();
            let presence = if stats.self_ping.is_some() {
                "on the map"
            } else {
                "faded"
            };
            println!("# {} live ping(s), you are {}", stats.active_count, presence);
            for ping in session.recent(5) {
                println!(
                    "#   {} {} {}",
                    ping.coordinate,
                    ping.color,
                    ping.label.as_deref().unwrap_or("-"),
                );
            }
        }

        session.shutdown().await;
        println!("# ECHOMAP DEMO - DONE");
        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let demo = EchoMapDemo::parse();
    echomap_trace::init_fmt(demo.structured.clone())
        .expect("Failed to start contextual logging");
    demo.run().await;
}
