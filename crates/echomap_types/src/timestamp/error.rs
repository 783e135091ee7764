use thiserror::Error;

/// Errors from Timestamp arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimestampError {
    /// The resulting timestamp is outside the representable range.
    #[error("Overflow in timestamp arithmetic")]
    Overflow,
}

/// Timestamp result type.
pub type TimestampResult<T> = Result<T, TimestampError>;
