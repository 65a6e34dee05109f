//! Editor metrics.
//!
//! Recorded through the `metrics` facade; the binary decides which
//! recorder (if any) is installed.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const OPERATIONS_TOTAL: &str = "vedit_operations_total";
    pub const OPERATION_DURATION_SECONDS: &str = "vedit_operation_duration_seconds";
    pub const OPERATIONS_IN_PROGRESS: &str = "vedit_operations_in_progress";
    pub const FFMPEG_DURATION_SECONDS: &str = "vedit_ffmpeg_duration_seconds";
    pub const DOWNLOAD_DURATION_SECONDS: &str = "vedit_download_duration_seconds";
    pub const UPLOAD_DURATION_SECONDS: &str = "vedit_upload_duration_seconds";
}

/// Record a finished operation. `outcome` is `success` or an error kind.
pub fn record_operation(operation: &str, outcome: &str, duration_secs: f64) {
    let labels = [
        ("operation", operation.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::OPERATIONS_TOTAL, &labels).increment(1);
    histogram!(names::OPERATION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Adjust the in-progress gauge by `delta`.
pub fn track_in_progress(delta: f64) {
    gauge!(names::OPERATIONS_IN_PROGRESS).increment(delta);
}

/// Record FFmpeg processing duration.
pub fn record_ffmpeg_duration(operation: &str, duration_secs: f64) {
    let labels = [("operation", operation.to_string())];
    histogram!(names::FFMPEG_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record download duration.
pub fn record_download_duration(duration_secs: f64) {
    histogram!(names::DOWNLOAD_DURATION_SECONDS).record(duration_secs);
}

/// Record upload duration.
pub fn record_upload_duration(duration_secs: f64) {
    histogram!(names::UPLOAD_DURATION_SECONDS).record(duration_secs);
}
