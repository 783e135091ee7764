//! Synthesizes the ambient traffic a live swarm would deliver.

use echomap_types::{Coordinate, MetroColor, Ping, Provenance};
use rand::seq::IteratorRandom;
use rand::Rng;

/// Display label carried by every synthesized ping.
pub const AMBIENT_LABEL: &str = "Anonymous User";

/// A generator of plausible ambient pings.
///
/// Coordinates are uniform over the inhabited band of the map: latitude
/// stays out of the polar extremes, longitude covers the full range. Colors
/// are drawn uniformly from the Metro palette.
#[derive(Clone, Copy, Debug, Default)]
pub struct AmbientFeed;

impl AmbientFeed {
    /// Synthesize one ambient ping. Never fails, never repeats an id.
    pub fn next(&self) -> Ping {
        let mut rng = rand::thread_rng();
        let lat = rng.gen_range(-70.0..70.0);
        let lng = rng.gen_range(-180.0..180.0);
        let color = MetroColor::ALL
            .iter()
            .copied()
            .choose(&mut rng)
            .unwrap_or(MetroColor::Cyan);
        Ping::new(Coordinate::new(lat, lng), color, Provenance::Ambient)
            .with_label(AMBIENT_LABEL)
    }
}
