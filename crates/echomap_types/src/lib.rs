#![deny(missing_docs)]
//! Core data types for the EchoMap ephemeral signal network.
//!
//! Everything in here is plain data: the [`Ping`] record itself, the
//! [`Timestamp`] it carries, the [`Coordinate`] it points at, and the
//! [`config`] knobs that govern how long any of it is allowed to live.
//! Behavior (storage, eviction, transport) lives in the crates layered on
//! top of this one.

pub mod color;
pub mod config;
pub mod coordinate;
pub mod ping;
pub mod timestamp;

pub use color::MetroColor;
pub use config::{EchoMapConfig, EchoMapTuningParams};
pub use coordinate::Coordinate;
pub use ping::{Ping, PingId, Provenance};
pub use timestamp::{Timestamp, TimestampError, TimestampResult};
