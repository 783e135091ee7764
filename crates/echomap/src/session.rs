//! The per-user session runtime.
//!
//! A [`Session`] owns one [`PingRegistry`] and the two background tasks that
//! keep it honest: a sweep task that evicts expired pings on a fixed cadence,
//! and an inbound pump that drains the transport's stream into the registry.
//! Broadcasting is the one user-driven operation; everything else ticks on
//! its own until [`Session::shutdown`] is called.

use std::sync::Arc;

use echomap_registry::{PingRegistry, Share};
use echomap_types::{EchoMapConfig, MetroColor, Ping, PingId, Provenance, Timestamp};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::error::EchoMapResult;
use crate::resolver::{LocationResolver, ResolveError, ResolveOptions};
use crate::transport::PingTransport;
use crate::wire::SignalMessage;

/// Label attached to the user's own broadcasts.
pub const SELF_LABEL: &str = "You";

/// Sender to instruct session tasks to shut down.
pub type StopBroadcaster = tokio::sync::broadcast::Sender<()>;

/// Receiver for session task shutdown signals.
pub type StopReceiver = tokio::sync::broadcast::Receiver<()>;

#[derive(Debug, Default)]
struct SessionState {
    /// Id of the most recent broadcast, live or not.
    self_ping: Option<PingId>,
}

/// A point-in-time summary of a session, for status displays.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionStats {
    /// How many pings are currently live.
    pub active_count: usize,
    /// The user's own ping, if one is still live.
    pub self_ping: Option<Ping>,
}

/// One user's connection to the signal network.
///
/// Dropping a session without calling [`Session::shutdown`] leaves its
/// background tasks running until their channels close.
pub struct Session {
    config: EchoMapConfig,
    registry: PingRegistry,
    resolver: Arc<dyn LocationResolver>,
    transport: Arc<dyn PingTransport>,
    state: Share<SessionState>,
    stop_broadcaster: StopBroadcaster,
    task_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Session {
    /// Subscribe to the transport and start the background tasks.
    pub async fn spawn(
        config: EchoMapConfig,
        resolver: Arc<dyn LocationResolver>,
        transport: Arc<dyn PingTransport>,
    ) -> EchoMapResult<Session> {
        let tuning = config.tuning_params.clone();
        let registry = PingRegistry::new(Arc::new((*tuning).clone()));
        let (stop_broadcaster, _) = tokio::sync::broadcast::channel(1);

        let span = tracing::error_span!("Session::spawn", scope = config.tracing_scope);

        let sweep_handle = spawn_sweep_task(
            registry.clone(),
            tuning.sweep_interval(),
            stop_broadcaster.subscribe(),
            span.clone(),
        );

        let inbound = transport.subscribe().await?;
        let inbound_handle = spawn_inbound_task(
            registry.clone(),
            inbound,
            stop_broadcaster.subscribe(),
            span,
        );

        Ok(Session {
            config,
            registry,
            resolver,
            transport,
            state: Share::new(SessionState::default()),
            stop_broadcaster,
            task_handles: vec![sweep_handle, inbound_handle],
        })
    }

    /// Resolve the user's location and broadcast a ping for it.
    ///
    /// The resolver is held to the configured timeout; an overrun surfaces
    /// as [`ResolveError::Timeout`]. On success the ping is in the local
    /// registry even if the transport publish fails.
    pub async fn broadcast(&self) -> EchoMapResult<Ping> {
        let options = ResolveOptions {
            timeout: self.config.tuning_params.resolve_timeout(),
            ..ResolveOptions::default()
        };

        let coordinate =
            match tokio::time::timeout(options.timeout, self.resolver.resolve(&options)).await {
                Ok(Ok(coordinate)) => coordinate,
                Ok(Err(err)) => {
                    tracing::warn!(%err, "location resolve failed");
                    return Err(err.into());
                }
                Err(_) => {
                    tracing::warn!("location resolve timed out");
                    return Err(ResolveError::Timeout.into());
                }
            };

        let ping = Ping::new(coordinate, MetroColor::user_default(), Provenance::Mine)
            .with_label(SELF_LABEL);

        // The newest broadcast is the self ping from here on, even while the
        // previous one is still live in the registry.
        self.state
            .write(|s| s.self_ping = Some(ping.id.clone()));
        self.registry.insert(ping.clone());

        if let Err(err) = self.transport.publish(&ping).await {
            tracing::warn!(?err, "failed to publish ping, keeping it local");
        }
        Ok(ping)
    }

    /// All currently held pings, newest first.
    pub fn snapshot(&self) -> Vec<Ping> {
        self.registry.snapshot()
    }

    /// The `n` most recently added pings, newest first.
    pub fn recent(&self, n: usize) -> Vec<Ping> {
        self.registry.recent(n)
    }

    /// Number of currently held pings.
    pub fn count(&self) -> usize {
        self.registry.count()
    }

    /// The user's own ping, if it has not yet expired or been truncated.
    ///
    /// Advisory at the moment of the call; the next sweep may remove it.
    pub fn active_self_ping(&self) -> Option<Ping> {
        let id = self.state.read(|s| s.self_ping.clone())?;
        self.registry.get(&id)
    }

    /// Whether the user's own ping is still live.
    pub fn self_ping_active(&self) -> bool {
        self.active_self_ping().is_some()
    }

    /// Point-in-time stats for a status display.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            active_count: self.registry.count(),
            self_ping: self.active_self_ping(),
        }
    }

    /// A clone of the underlying registry handle.
    pub fn registry(&self) -> PingRegistry {
        self.registry.clone()
    }

    /// The config this session was spawned with.
    pub fn config(&self) -> &EchoMapConfig {
        &self.config
    }

    /// Stop the background tasks and wait for them to finish.
    pub async fn shutdown(self) {
        // Err means the tasks are already gone
        self.stop_broadcaster.send(()).ok();
        for handle in self.task_handles {
            match tokio::time::timeout(std::time::Duration::from_secs(1), handle).await {
                Ok(Ok(())) => (),
                Ok(Err(err)) => tracing::warn!(?err, "session task failed during shutdown"),
                Err(_) => tracing::warn!("session task failed to stop in time"),
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("registry", &self.registry)
            .field("self_ping", &self.state.read(|s| s.self_ping.clone()))
            .finish()
    }
}

fn spawn_sweep_task(
    registry: PingRegistry,
    freq: std::time::Duration,
    mut stop_rx: StopReceiver,
    span: tracing::Span,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn(
        async move {
            loop {
                tokio::select! {
                    // break if we receive on the stop channel
                    _ = stop_rx.recv() => { break; },

                    _ = tokio::time::sleep(freq) => {
                        registry.sweep(Timestamp::now());
                    }
                }
            }
            tracing::debug!("sweep task ending");
        }
        .instrument(span),
    )
}

fn spawn_inbound_task(
    registry: PingRegistry,
    mut inbound: mpsc::Receiver<SignalMessage>,
    mut stop_rx: StopReceiver,
    span: tracing::Span,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn(
        async move {
            loop {
                tokio::select! {
                    // break if we receive on the stop channel
                    _ = stop_rx.recv() => { break; },

                    maybe_msg = inbound.recv() => match maybe_msg {
                        Some(msg) => {
                            let sync = msg.is_sync();
                            // provenance is relative to the viewer
                            let ping = msg.into_payload().into_remote();
                            tracing::debug!(id = %ping.id, sync, "inbound ping");
                            registry.insert(ping);
                        }
                        None => {
                            tracing::debug!("inbound channel closed");
                            break;
                        }
                    },
                }
            }
            tracing::debug!("inbound task ending");
        }
        .instrument(span),
    )
}
