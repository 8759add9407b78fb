//! Time zone conversion helpers.
//!
//! Provider payloads carry exchange-local wall-clock timestamps with no
//! offset. [`from_local_naive`] converts such a timestamp to UTC using an
//! IANA time zone, erroring on DST gaps (spring-forward) and ambiguous times
//! (fall-back) rather than silently picking an instant.
//!
//! The exchanges this tool targets (Shanghai, Shenzhen) do not observe DST,
//! so the strict behavior never fires for them; it exists so a future
//! provider in a DST zone fails loudly instead of producing shifted bars.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// A local wall-clock time that does not map to exactly one instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TzError {
    /// The local time occurs twice (fall-back transition).
    #[error("ambiguous local time {naive} in {tz}")]
    Ambiguous { naive: NaiveDateTime, tz: Tz },

    /// The local time is skipped (spring-forward transition).
    #[error("nonexistent local time {naive} in {tz}")]
    Nonexistent { naive: NaiveDateTime, tz: Tz },
}

/// Convert a naive local timestamp to UTC using a specific IANA time zone.
///
/// Returns the single matching instant, or a [`TzError`] when the wall time
/// is ambiguous or does not exist in `tz`.
pub fn from_local_naive(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, TzError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, _) => Err(TzError::Ambiguous { naive, tz }),
        LocalResult::None => Err(TzError::Nonexistent { naive, tz }),
    }
}
