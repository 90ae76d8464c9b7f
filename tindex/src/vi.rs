use chrono::{DateTime, Utc};
use error::IndexError;

/// Monotone integer coordinate for a timestamp: microseconds since the Unix
/// epoch. Comparisons on `Vi` are equivalent to comparisons on the source
/// timestamp, which is what makes binary search over bucket starts valid.
pub type Vi = u64;

/// Returns `vi(epoch) == 0` and is monotone/injective on every timestamp at
/// or after the epoch. Callers must validate `t >= epoch` first (see
/// [`reject_pre_epoch`]) — this function panics on a negative offset rather
/// than silently wrapping, since that would violate monotonicity.
pub fn virtual_index(t: DateTime<Utc>) -> Vi {
    let micros = t.timestamp_micros();
    u64::try_from(micros).expect("virtual_index called with a pre-epoch timestamp")
}

/// Rejects a timestamp strictly before the Unix epoch.
pub fn reject_pre_epoch(t: DateTime<Utc>) -> Result<(), IndexError> {
    let micros = t.timestamp_micros();
    if micros < 0 {
        return Err(IndexError::OutOfEpoch {
            micros_before_epoch: -micros,
        });
    }
    Ok(())
}
