//! SubRip cue timestamps.

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// Format seconds into a SubRip timestamp (`HH:MM:SS,mmm`).
///
/// Rounding policy:
/// - We round half-up to the nearest millisecond before splitting into fields.
/// - Hours are zero-padded to two digits and widen as needed (`100:00:00,000`).
/// - Negative and non-finite inputs clamp to zero, so the function is total.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = to_millis(seconds);

    let hours = total_ms / MS_PER_HOUR;
    let rem = total_ms % MS_PER_HOUR;
    let minutes = rem / MS_PER_MINUTE;
    let rem = rem % MS_PER_MINUTE;
    let secs = rem / MS_PER_SECOND;
    let millis = rem % MS_PER_SECOND;

    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

fn to_millis(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }

    // `f64::round` rounds half away from zero, which is half-up for non-negative values.
    (seconds * 1000.0).round() as u64
}
