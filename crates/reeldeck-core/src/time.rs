// crates/reeldeck-core/src/time.rs
//
// Frame-integral time helpers. The data model is frame-integral (§3, GLOSSARY
// "Frame unit"); this module is the single place that converts to/from
// seconds, microseconds (the canvas-engine adapter's wire unit, §4.4), and
// human-readable `MM:SS:FF` strings.

/// Convert seconds to the nearest frame at `frame_rate`.
///
/// ```
/// use reeldeck_core::time::seconds_to_frames;
/// assert_eq!(seconds_to_frames(5.0, 30.0), 150);
/// assert_eq!(seconds_to_frames(1.0, 30.0), 30);
/// ```
pub fn seconds_to_frames(seconds: f64, frame_rate: f64) -> i64 {
    (seconds * frame_rate).round() as i64
}

/// Convert a frame count to seconds at `frame_rate`.
pub fn frames_to_seconds(frames: i64, frame_rate: f64) -> f64 {
    frames as f64 / frame_rate
}

/// Convert microseconds (the canvas-engine's native unit, §4.4) to frames.
pub fn micros_to_frames(micros: i64, frame_rate: f64) -> i64 {
    seconds_to_frames(micros as f64 / 1_000_000.0, frame_rate)
}

/// Convert frames to microseconds for `seekTo`/`previewFrame` calls.
pub fn frames_to_micros(frames: i64, frame_rate: f64) -> i64 {
    (frames_to_seconds(frames, frame_rate) * 1_000_000.0).round() as i64
}

/// Format a frame count as `MM:SS:FF` at `frame_rate`.
///
/// ```
/// use reeldeck_core::time::format_frames;
/// assert_eq!(format_frames(0, 30.0), "00:00:00");
/// assert_eq!(format_frames(150, 30.0), "00:05:00");
/// assert_eq!(format_frames(151, 30.0), "00:05:01");
/// ```
pub fn format_frames(frames: i64, frame_rate: f64) -> String {
    let total_seconds = frames_to_seconds(frames, frame_rate);
    let m = (total_seconds / 60.0) as i64;
    let s = (total_seconds % 60.0) as i64;
    let f = frames - seconds_to_frames((m * 60 + s) as f64, frame_rate);
    format!("{m:02}:{s:02}:{f:02}")
}

/// True when two frame-derived durations agree within `tolerance_frames`.
/// Used by the clip-duration/playback-rate invariant checks in §8 (items 4, 2).
pub fn within_frame_tolerance(a: i64, b: i64, tolerance_frames: i64) -> bool {
    (a - b).abs() <= tolerance_frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_and_second_conversions_round_trip() {
        let frames = seconds_to_frames(12.5, 30.0);
        let secs = frames_to_seconds(frames, 30.0);
        assert!((secs - 12.5).abs() < 1.0 / 30.0);
    }

    #[test]
    fn micros_round_trip_within_a_frame() {
        let frames = 90;
        let micros = frames_to_micros(frames, 30.0);
        assert_eq!(micros_to_frames(micros, 30.0), frames);
    }

    #[test]
    fn tolerance_check_is_inclusive() {
        assert!(within_frame_tolerance(10, 11, 1));
        assert!(!within_frame_tolerance(10, 12, 1));
    }
}
