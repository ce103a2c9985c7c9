use crate::types::Millis;

/// Render a duration as `HH:MM:SS`. Non-positive durations render as zero.
/// Hours are not wrapped, so very long runs show e.g. `125:00:00`.
pub fn format_elapsed(ms: Millis) -> String {
    let total_secs = ms.max(0) / 1_000;
    let hours = total_secs / 3_600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
