use crate::resolver::ResolveError;

/// EchoMap Error Type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EchoMapError {
    /// Location resolution failed. Nothing was inserted or published.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The transport refused or lost the connection.
    #[error("Transport Error: {0}")]
    Transport(Box<str>),

    /// Other
    #[error("Other: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl EchoMapError {
    /// promote a custom error type to an EchoMapError
    pub fn other(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(e.into())
    }

    /// generate a transport error from a string
    pub fn transport_error(s: String) -> Self {
        Self::Transport(s.into_boxed_str())
    }
}

impl From<String> for EchoMapError {
    fn from(s: String) -> Self {
        #[derive(Debug, thiserror::Error)]
        struct OtherError(String);
        impl std::fmt::Display for OtherError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        EchoMapError::other(OtherError(s))
    }
}

impl From<&str> for EchoMapError {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}

/// EchoMap Result Type.
pub type EchoMapResult<T> = Result<T, EchoMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_errors_pass_their_message_through() {
        let err: EchoMapError = ResolveError::PermissionDenied.into();
        assert_eq!(
            err.to_string(),
            "Location permission denied. Please enable it to ping."
        );
    }

    #[test]
    fn strings_promote_to_other() {
        let err: EchoMapError = "it broke".into();
        assert_eq!(err.to_string(), "Other: it broke");
        let err = EchoMapError::transport_error("hub gone".to_string());
        assert_eq!(err.to_string(), "Transport Error: hub gone");
    }
}
