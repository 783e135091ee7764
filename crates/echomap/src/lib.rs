#![deny(missing_docs)]
//! Session runtime for the EchoMap ephemeral signal network.
//!
//! Spawn a [`Session`] with a [`LocationResolver`] and a [`PingTransport`]
//! and it keeps a bounded registry of live pings for you: your own
//! broadcasts, whatever arrives from the transport, nothing older than the
//! configured TTL.

/// re-exported dependencies
pub mod dependencies {
    pub use ::echomap_registry;
    pub use ::echomap_trace;
    pub use ::echomap_types;
    pub use ::tokio;
}

mod error;
pub use error::*;

mod feed;
pub use feed::*;

mod resolver;
pub use resolver::*;

mod session;
pub use session::*;

mod transport;
pub use transport::*;

mod wire;
pub use wire::*;
