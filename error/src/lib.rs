use thiserror::Error;

/// Errors surfaced by the temporal index's `construct` and `load` operations.
///
/// `get` never returns an error: an inverted, empty, or pre-epoch range simply
/// yields an empty result, and a query against an unloaded index does too.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// `construct` was called with `min_level` ordinal greater than `max_level`.
    #[error("min_level ordinal {min} is greater than max_level ordinal {max}")]
    LevelRange { min: u8, max: u8 },

    /// A posting supplied to `load` carries a timestamp before the Unix epoch.
    #[error("posting timestamp is before the Unix epoch ({micros_before_epoch} microseconds)")]
    OutOfEpoch { micros_before_epoch: i64 },

    /// A posting supplied to `load` is missing its token set.
    #[error("posting at index {index} is malformed: {reason}")]
    MalformedPosting { index: usize, reason: &'static str },
}
