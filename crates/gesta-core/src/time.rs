//! Calendar-day boundary math in the platform's reference timezone
//!
//! Daily counters reset at the start of the next calendar day in a single
//! canonical reference timezone, so every reader computes the same boundary
//! regardless of where the request was served. The functions here are pure:
//! `now` is always an explicit argument.

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};

/// Offset of the platform's reference timezone, in seconds east of UTC.
///
/// UTC+01:00, the timezone the platform operates in.
pub const REFERENCE_OFFSET_SECS: i32 = 3600;

/// The reference timezone as a fixed offset
pub fn reference_offset() -> FixedOffset {
    // east_opt only fails outside +/-24h, which the constant never is
    FixedOffset::east_opt(REFERENCE_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Start of the next calendar day after `now`, in the given reference
/// timezone, expressed back in UTC.
pub fn next_day_boundary(now: DateTime<Utc>, reference: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&reference);
    let midnight = local
        .date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|naive| naive.and_local_timezone(reference).single());
    match midnight {
        Some(boundary) => boundary.with_timezone(&Utc),
        // Only reachable at the edge of chrono's representable range
        None => now + Duration::hours(24),
    }
}
