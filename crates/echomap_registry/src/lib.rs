#![deny(missing_docs)]
//! The Ping Registry: a bounded store of currently-live pings.
//!
//! Every ping that should be on screen right now lives here, newest first.
//! The two producers (the user's own broadcast and the ambient feed) insert
//! at the head; a periodic sweep evicts everything whose age has reached the
//! TTL; inserting past capacity silently drops the oldest entries from the
//! tail. Consumers never see the registry's own collection, only cloned
//! snapshots of it.
//!
//! The registry is a cheap-clone handle over a single lock. All operations
//! are synchronous and atomic: each one acquires the lock, mutates or reads,
//! and releases before returning, so concurrent producers and the sweep can
//! interleave in any order and each still observes a consistent state.

use std::{collections::VecDeque, sync::Arc};

use echomap_types::{config::tuning_params_struct, Ping, PingId, Timestamp};

mod share;
pub use share::Share;

/// A PingRegistry tracks the set of live [`Ping`]s, newest first.
///
/// Inserting never fails: at capacity the oldest entries are dropped to make
/// room, and a ping whose id is already present is ignored. Removal happens
/// through [`PingRegistry::sweep`], which the owner is expected to call on a
/// fixed cadence, so an expired ping may outlive its TTL by at most one sweep
/// interval.
#[derive(Clone)]
pub struct PingRegistry {
    config: RegistryConfig,
    state: Share<State>,
}

impl std::fmt::Debug for PingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.state
            .read(|state| f.debug_struct("PingRegistry").field("state", state).finish())
    }
}

/// Alias
pub type RegistryConfig = Arc<dyn PingRegistryConfig>;

/// Host-defined details about how the registry bounds and expires pings.
pub trait PingRegistryConfig: 'static + Send + Sync {
    /// How long a ping stays live before the sweep may evict it.
    /// A ping is evicted once its age is greater than or equal to this.
    fn ping_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_millis(8_000)
    }

    /// Hard cap on concurrently held pings. Inserting past the cap drops
    /// the oldest entries, regardless of how close they are to expiry.
    fn max_active_pings(&self) -> usize {
        50
    }
}

impl PingRegistryConfig for tuning_params_struct::EchoMapTuningParams {
    fn ping_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ping_ttl_ms)
    }

    fn max_active_pings(&self) -> usize {
        self.max_active_pings
    }
}

/// The actual inner state of the PingRegistry, guarded by the handle's lock.
#[derive(Debug, Default)]
pub(crate) struct State {
    /// Live pings, newest first.
    pings: VecDeque<Ping>,
}

impl PingRegistry {
    /// Constructor
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            state: Share::new(State::default()),
        }
    }

    /// Insert a ping at the head of the registry.
    ///
    /// If the registry is at capacity the oldest entries are dropped to make
    /// room; if the id is already present the new ping is ignored. Neither
    /// case is an error.
    pub fn insert(&self, ping: Ping) {
        self.state.write(|s| {
            let id = ping.id.clone();
            if let Some(dropped) = s.insert(&*self.config, ping) {
                tracing::debug!(
                    "PingRegistry (size = {}) ping added: id={} truncated={}",
                    s.pings.len(),
                    id,
                    dropped,
                );
            }
        });
    }

    /// Remove every ping whose age at `now` has reached the TTL.
    ///
    /// Idempotent: sweeping twice at the same instant removes nothing the
    /// second time. Returns the number of pings evicted.
    pub fn sweep(&self, now: Timestamp) -> usize {
        self.state.write(|s| {
            let evicted = s.sweep(self.config.ping_ttl(), now);
            if evicted > 0 {
                tracing::debug!(
                    "PingRegistry (size = {}) swept {} expired",
                    s.pings.len(),
                    evicted,
                );
            }
            evicted
        })
    }

    /// Clone the live pings, newest first. No side effects.
    pub fn snapshot(&self) -> Vec<Ping> {
        self.state.read(|s| s.pings.iter().cloned().collect())
    }

    /// The number of live pings.
    pub fn count(&self) -> usize {
        self.state.read(|s| s.pings.len())
    }

    /// Check whether any pings are live.
    pub fn is_empty(&self) -> bool {
        self.state.read(|s| s.pings.is_empty())
    }

    /// Look a single ping up by id.
    pub fn get(&self, id: &PingId) -> Option<Ping> {
        self.state
            .read(|s| s.pings.iter().find(|p| &p.id == id).cloned())
    }

    /// Clone the `n` most recent pings, newest first.
    pub fn recent(&self, n: usize) -> Vec<Ping> {
        self.state.read(|s| s.pings.iter().take(n).cloned().collect())
    }
}

impl State {
    /// Insert a ping at the head, then truncate the tail back to capacity.
    /// Returns the number of entries truncated away, or `None` if the id was
    /// already present and the ping was ignored.
    pub fn insert(&mut self, config: &dyn PingRegistryConfig, ping: Ping) -> Option<usize> {
        if self.pings.iter().any(|p| p.id == ping.id) {
            tracing::debug!("PingRegistry ignoring duplicate ping id: {}", ping.id);
            return None;
        }
        self.pings.push_front(ping);
        let cap = config.max_active_pings();
        let dropped = self.pings.len().saturating_sub(cap);
        if dropped > 0 {
            self.pings.truncate(cap);
        }
        Some(dropped)
    }

    /// Drop every ping that has expired as of `now`.
    pub fn sweep(&mut self, ttl: std::time::Duration, now: Timestamp) -> usize {
        let before = self.pings.len();
        self.pings.retain(|p| !p.is_expired(ttl, now));
        before - self.pings.len()
    }
}

#[cfg(test)]
mod tests {
    use echomap_types::{Coordinate, MetroColor, Provenance};
    use pretty_assertions::assert_eq;

    use super::*;

    struct TestConfig {
        ttl_ms: u64,
        cap: usize,
    }

    impl PingRegistryConfig for TestConfig {
        fn ping_ttl(&self) -> std::time::Duration {
            std::time::Duration::from_millis(self.ttl_ms)
        }

        fn max_active_pings(&self) -> usize {
            self.cap
        }
    }

    fn registry(ttl_ms: u64, cap: usize) -> PingRegistry {
        PingRegistry::new(Arc::new(TestConfig { ttl_ms, cap }))
    }

    fn ping(id: &str, at_ms: i64) -> Ping {
        Ping {
            id: id.into(),
            coordinate: Coordinate::new(10.0, 20.0),
            created_at: Timestamp::from_millis(at_ms),
            color: MetroColor::Teal,
            provenance: Provenance::Ambient,
            label: None,
        }
    }

    fn ids(pings: &[Ping]) -> Vec<&str> {
        pings.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn snapshot_is_newest_first() {
        let registry = registry(8_000, 50);
        for (id, at) in [("a", 100), ("b", 50), ("c", 900), ("d", 200)] {
            registry.insert(ping(id, at));
        }
        // insertion order wins, not timestamp order
        assert_eq!(ids(&registry.snapshot()), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn capacity_drops_the_oldest_inserts() {
        let registry = registry(8_000, 3);
        for id in ["1", "2", "3", "4"] {
            registry.insert(ping(id, 0));
            assert!(registry.count() <= 3);
        }
        assert_eq!(ids(&registry.snapshot()), vec!["4", "3", "2"]);
    }

    #[test]
    fn count_stays_bounded_under_sustained_inserts() {
        let registry = registry(8_000, 3);
        for n in 0..100 {
            registry.insert(ping(&format!("p{n}"), n));
            assert!(registry.count() <= 3);
        }
        assert_eq!(registry.count(), 3);
    }

    #[test]
    fn zero_capacity_holds_nothing() {
        let registry = registry(8_000, 0);
        registry.insert(ping("a", 0));
        assert_eq!(registry.count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_ids_are_ignored() {
        let registry = registry(8_000, 50);
        registry.insert(ping("a", 0).with_label("first"));
        registry.insert(ping("a", 500).with_label("second"));
        assert_eq!(registry.count(), 1);
        // first write wins
        assert_eq!(
            registry.get(&"a".into()).unwrap().label.as_deref(),
            Some("first")
        );
    }

    #[test]
    fn sweep_removes_exactly_the_expired() {
        let registry = registry(8_000, 50);
        registry.insert(ping("old", 0));
        registry.insert(ping("mid", 1_000));
        registry.insert(ping("new", 5_000));

        // nothing has reached the TTL yet
        assert_eq!(registry.sweep(Timestamp::from_millis(7_000)), 0);
        assert_eq!(registry.count(), 3);

        // age == TTL is expired, strictly younger is not
        assert_eq!(registry.sweep(Timestamp::from_millis(8_000)), 1);
        assert_eq!(ids(&registry.snapshot()), vec!["new", "mid"]);

        assert_eq!(registry.sweep(Timestamp::from_millis(9_000)), 1);
        assert_eq!(ids(&registry.snapshot()), vec!["new"]);
    }

    #[test]
    fn sweep_is_idempotent() {
        let registry = registry(8_000, 50);
        registry.insert(ping("a", 0));
        let now = Timestamp::from_millis(10_000);
        assert_eq!(registry.sweep(now), 1);
        assert_eq!(registry.sweep(now), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn sweep_on_empty_registry_is_a_noop() {
        let registry = registry(8_000, 50);
        assert_eq!(registry.sweep(Timestamp::from_millis(123_456)), 0);
    }

    #[test]
    fn get_and_recent_read_without_disturbing_order() {
        let registry = registry(8_000, 50);
        for n in 0..10 {
            registry.insert(ping(&format!("p{n}"), n));
        }
        assert_eq!(registry.get(&"p3".into()).unwrap().id.as_str(), "p3");
        assert_eq!(registry.get(&"nope".into()), None);
        assert_eq!(
            ids(&registry.recent(5)),
            vec!["p9", "p8", "p7", "p6", "p5"]
        );
        assert_eq!(registry.count(), 10);
    }

    #[test]
    fn clones_of_the_handle_share_one_state() {
        let registry = registry(8_000, 50);
        let other = registry.clone();
        registry.insert(ping("a", 0));
        assert_eq!(other.count(), 1);
        other.sweep(Timestamp::from_millis(8_000));
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshots_are_detached_from_the_registry() {
        let registry = registry(8_000, 50);
        registry.insert(ping("a", 0));
        let snapshot = registry.snapshot();
        registry.sweep(Timestamp::from_millis(8_000));
        assert_eq!(ids(&snapshot), vec!["a"]);
        assert!(registry.is_empty());
    }
}
