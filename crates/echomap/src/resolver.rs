//! The seam between a session and whatever can answer "where am I".
//!
//! A live deployment plugs a platform position source in here; everything the
//! session needs from it is one async call that yields a [`Coordinate`] or a
//! [`ResolveError`]. The error display strings are the exact user-facing
//! messages the UI shows, so callers can surface them directly.

use std::time::Duration;

use echomap_types::Coordinate;

/// Knobs for a single resolve, mirroring what platform position APIs accept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Ask for a battery-expensive precise fix. Coarse is sufficient here.
    pub high_accuracy: bool,
    /// Abandon the resolve after this long.
    pub timeout: Duration,
    /// Accept a cached fix up to this old. Zero forces a fresh fix.
    pub maximum_age: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            high_accuracy: false,
            timeout: Duration::from_millis(10_000),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Why a location resolve failed.
///
/// Failures are terminal for the broadcast that triggered them: nothing is
/// retried and nothing reaches the registry.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The user refused to share their position.
    #[error("Location permission denied. Please enable it to ping.")]
    PermissionDenied,

    /// The platform has no position to give right now.
    #[error("Location information is unavailable.")]
    PositionUnavailable,

    /// No position arrived within the allowed time.
    #[error("The request to get user location timed out.")]
    Timeout,

    /// Anything the platform reported that fits none of the above.
    #[error("Unknown error occurred.")]
    Unknown,
}

/// Something that can resolve the user's current position.
#[async_trait::async_trait]
pub trait LocationResolver: 'static + Send + Sync {
    /// Resolve the user's current position.
    ///
    /// Implementations should honor `options.timeout` themselves where they
    /// can; the session additionally enforces it from the outside and maps
    /// an overrun to [`ResolveError::Timeout`].
    async fn resolve(&self, options: &ResolveOptions) -> Result<Coordinate, ResolveError>;
}

/// A resolver that always answers with one fixed coordinate.
#[derive(Clone, Copy, Debug)]
pub struct FixedResolver(pub Coordinate);

#[async_trait::async_trait]
impl LocationResolver for FixedResolver {
    async fn resolve(&self, _options: &ResolveOptions) -> Result<Coordinate, ResolveError> {
        Ok(self.0)
    }
}

/// A resolver that always fails with the configured error.
#[derive(Clone, Debug)]
pub struct FailingResolver(pub ResolveError);

#[async_trait::async_trait]
impl LocationResolver for FailingResolver {
    async fn resolve(&self, _options: &ResolveOptions) -> Result<Coordinate, ResolveError> {
        Err(self.0.clone())
    }
}
