//! Capability seam over the channel pings travel on.
//!
//! Sessions never talk to a socket directly; they publish through a
//! [`PingTransport`] and read whatever arrives on the stream it hands back.
//! [`LocalSimulator`] stands in for the live swarm in demos and single-node
//! tests: its inbound stream carries synthesized ambient pings and publishing
//! is a logged no-op. [`MemHub`] connects several sessions inside one process
//! the way a real channel would: publishes fan out to every other endpoint,
//! and a late subscriber is caught up with `SYNC` replays of the pings still
//! live at connect time.

use std::sync::Arc;

use echomap_registry::{PingRegistry, Share};
use echomap_types::{EchoMapTuningParams, Ping, Timestamp};
use tokio::sync::mpsc;

use crate::error::{EchoMapError, EchoMapResult};
use crate::feed::AmbientFeed;
use crate::wire::SignalMessage;

/// The outside channel a session's pings travel on.
#[async_trait::async_trait]
pub trait PingTransport: 'static + Send + Sync {
    /// Push one of our own pings out to everyone else.
    ///
    /// The ping is already in the local registry when this is called; a
    /// failure here never takes it back out.
    async fn publish(&self, ping: &Ping) -> EchoMapResult<()>;

    /// Open the inbound stream of messages pushed to this endpoint.
    async fn subscribe(&self) -> EchoMapResult<mpsc::Receiver<SignalMessage>>;
}

/// A transport that simulates the swarm instead of reaching one.
///
/// The inbound stream delivers one synthesized ambient ping per configured
/// interval, exactly as a live channel would deliver other users' traffic.
/// Publishes are logged and dropped.
#[derive(Clone, Debug)]
pub struct LocalSimulator {
    config: EchoMapTuningParams,
}

impl LocalSimulator {
    /// Constructor
    pub fn new(config: EchoMapTuningParams) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl PingTransport for LocalSimulator {
    async fn publish(&self, ping: &Ping) -> EchoMapResult<()> {
        tracing::debug!(id = %ping.id, "ping published to the simulated swarm");
        Ok(())
    }

    async fn subscribe(&self) -> EchoMapResult<mpsc::Receiver<SignalMessage>> {
        let (tx, rx) = mpsc::channel(self.config.inbound_channel_depth);
        let freq = self.config.ambient_interval();
        let feed = AmbientFeed;
        tokio::task::spawn(async move {
            loop {
                tokio::time::sleep(freq).await;
                // exits once the subscriber side goes away
                if tx.send(SignalMessage::Ping(feed.next())).await.is_err() {
                    break;
                }
            }
            tracing::debug!("ambient feed task ending");
        });
        Ok(rx)
    }
}

/// An in-process hub connecting several sessions.
///
/// The hub plays the role a relay server would play in a live deployment: it
/// remembers which published pings are still live and fans every publish out
/// to all other endpoints. Cheap to clone; all clones are the same hub.
#[derive(Clone)]
pub struct MemHub {
    config: EchoMapTuningParams,
    registry: PingRegistry,
    state: Share<HubState>,
}

#[derive(Debug, Default)]
struct HubState {
    next_endpoint: usize,
    endpoints: Vec<(usize, mpsc::Sender<SignalMessage>)>,
}

impl MemHub {
    /// Constructor
    pub fn new(config: EchoMapTuningParams) -> Self {
        let registry = PingRegistry::new(Arc::new((*config).clone()));
        Self {
            config,
            registry,
            state: Share::new(HubState::default()),
        }
    }

    /// Mint a new endpoint. It receives nothing until it subscribes.
    pub fn endpoint(&self) -> MemEndpoint {
        let id = self.state.write(|s| {
            let id = s.next_endpoint;
            s.next_endpoint += 1;
            id
        });
        MemEndpoint {
            hub: self.clone(),
            id,
        }
    }

    /// Number of currently subscribed endpoints.
    pub fn endpoint_count(&self) -> usize {
        self.state.read(|s| s.endpoints.len())
    }

    async fn publish_from(&self, from: usize, ping: &Ping) -> EchoMapResult<()> {
        // Record before fanning out, so an endpoint subscribing concurrently
        // picks the ping up either live or from the replay.
        self.registry.insert(ping.clone());

        let targets: Vec<(usize, mpsc::Sender<SignalMessage>)> = self.state.read(|s| {
            s.endpoints
                .iter()
                .filter(|(id, _)| *id != from)
                .cloned()
                .collect()
        });

        let mut dead = Vec::new();
        for (id, tx) in targets {
            if tx
                .send(SignalMessage::Ping(ping.clone()))
                .await
                .is_err()
            {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            self.state
                .write(|s| s.endpoints.retain(|(id, _)| !dead.contains(id)));
            tracing::debug!(
                "MemHub (endpoints = {}) dropped {} disconnected endpoint(s)",
                self.endpoint_count(),
                dead.len(),
            );
        }
        Ok(())
    }

    fn connect(&self, id: usize, tx: mpsc::Sender<SignalMessage>) -> EchoMapResult<()> {
        self.state.write(|s| {
            if s.endpoints.iter().any(|(other, _)| *other == id) {
                Err(EchoMapError::transport_error(format!(
                    "endpoint {} already subscribed",
                    id
                )))
            } else {
                s.endpoints.push((id, tx));
                Ok(())
            }
        })
    }
}

impl std::fmt::Debug for MemHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemHub")
            .field("endpoints", &self.endpoint_count())
            .field("live", &self.registry.count())
            .finish()
    }
}

/// One session's connection to a [`MemHub`].
#[derive(Clone, Debug)]
pub struct MemEndpoint {
    hub: MemHub,
    id: usize,
}

#[async_trait::async_trait]
impl PingTransport for MemEndpoint {
    async fn publish(&self, ping: &Ping) -> EchoMapResult<()> {
        self.hub.publish_from(self.id, ping).await
    }

    async fn subscribe(&self) -> EchoMapResult<mpsc::Receiver<SignalMessage>> {
        let (tx, rx) = mpsc::channel(self.hub.config.inbound_channel_depth);

        // Register first, then snapshot: a publish racing this connect is
        // then either in the snapshot or delivered live, and a ping that
        // arrives both ways collapses to one entry at the registry.
        self.hub.connect(self.id, tx.clone())?;
        self.hub.registry.sweep(Timestamp::now());
        let backlog = self.hub.registry.snapshot();

        if !backlog.is_empty() {
            tracing::debug!(
                "MemHub replaying {} live ping(s) to endpoint {}",
                backlog.len(),
                self.id,
            );
            tokio::task::spawn(async move {
                for ping in backlog {
                    if tx.send(SignalMessage::Sync(ping)).await.is_err() {
                        break;
                    }
                }
            });
        }
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use echomap_types::config::tuning_params_struct::EchoMapTuningParams as TuningParams;
    use echomap_types::{Coordinate, EchoMapConfig, MetroColor, Provenance};

    use super::*;

    fn tuned(f: impl Fn(TuningParams) -> TuningParams) -> EchoMapTuningParams {
        EchoMapConfig::default().tune(f).tuning_params
    }

    fn ping(id: &str) -> Ping {
        Ping {
            id: id.into(),
            coordinate: Coordinate::new(48.8, 2.3),
            created_at: Timestamp::now(),
            color: MetroColor::Purple,
            provenance: Provenance::Mine,
            label: Some("You".into()),
        }
    }

    async fn recv(rx: &mut mpsc::Receiver<SignalMessage>) -> SignalMessage {
        tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for a message")
            .expect("channel closed")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn simulator_streams_ambient_pings() {
        let sim = LocalSimulator::new(tuned(|mut tp| {
            tp.ambient_interval_ms = 10;
            tp
        }));
        let mut rx = sim.subscribe().await.unwrap();

        let first = recv(&mut rx).await;
        let second = recv(&mut rx).await;
        assert!(!first.is_sync());
        assert_eq!(first.payload().provenance, Provenance::Ambient);
        assert_ne!(first.payload().id, second.payload().id);
    }

    #[tokio::test]
    async fn simulator_publish_is_a_quiet_noop() {
        let sim = LocalSimulator::new(tuned(|tp| tp));
        sim.publish(&ping("solo")).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn hub_fans_out_to_other_endpoints_only() {
        let hub = MemHub::new(tuned(|tp| tp));
        let a = hub.endpoint();
        let b = hub.endpoint();
        let mut rx_a = a.subscribe().await.unwrap();
        let mut rx_b = b.subscribe().await.unwrap();

        a.publish(&ping("from-a")).await.unwrap();

        let got = recv(&mut rx_b).await;
        assert!(!got.is_sync());
        assert_eq!(got.payload().id.as_str(), "from-a");
        // the sender never hears its own ping back
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn hub_replays_live_pings_to_late_subscribers() {
        let hub = MemHub::new(tuned(|tp| tp));
        let a = hub.endpoint();
        a.publish(&ping("one")).await.unwrap();
        a.publish(&ping("two")).await.unwrap();

        let b = hub.endpoint();
        let mut rx_b = b.subscribe().await.unwrap();
        let first = recv(&mut rx_b).await;
        let second = recv(&mut rx_b).await;
        assert!(first.is_sync() && second.is_sync());
        // newest first, same as a registry snapshot
        assert_eq!(first.payload().id.as_str(), "two");
        assert_eq!(second.payload().id.as_str(), "one");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn hub_does_not_replay_expired_pings() {
        let hub = MemHub::new(tuned(|mut tp| {
            tp.ping_ttl_ms = 50;
            tp
        }));
        let a = hub.endpoint();
        a.publish(&ping("fleeting")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let b = hub.endpoint();
        let mut rx_b = b.subscribe().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn hub_rejects_a_double_subscribe() {
        let hub = MemHub::new(tuned(|tp| tp));
        let a = hub.endpoint();
        let _rx = a.subscribe().await.unwrap();
        let err = a.subscribe().await.unwrap_err();
        assert!(matches!(err, EchoMapError::Transport(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn hub_prunes_disconnected_endpoints() {
        let hub = MemHub::new(tuned(|tp| tp));
        let a = hub.endpoint();
        let b = hub.endpoint();
        let _rx_a = a.subscribe().await.unwrap();
        let rx_b = b.subscribe().await.unwrap();
        assert_eq!(hub.endpoint_count(), 2);

        drop(rx_b);
        a.publish(&ping("after-b-left")).await.unwrap();
        assert_eq!(hub.endpoint_count(), 1);
    }
}
