//! Editor error taxonomy.

use thiserror::Error;
use vedit_media::{GeometryError, MediaError};
use vedit_models::FormatError;
use vedit_storage::StorageError;

/// Result type for editor operations.
pub type EditResult<T> = Result<T, EditError>;

/// Why an edit failed.
#[derive(Debug, Error)]
pub enum EditError {
    /// Malformed request: time range, geometry, format
    #[error("{0}")]
    InvalidInput(String),

    /// A source key does not exist in the store
    #[error("Video not found: {0}")]
    NotFound(String),

    /// A source object has zero bytes
    #[error("Video is empty: {0}")]
    EmptySource(String),

    /// Object store I/O failed
    #[error("Storage transfer failed: {0}")]
    Transfer(String),

    /// Stream metadata could not be read
    #[error("Failed to read video metadata: {0}")]
    Probe(String),

    /// FFmpeg exited non-zero, crashed or timed out
    #[error("{message}")]
    Tool {
        message: String,
        exit_code: Option<i32>,
        stderr_tail: Option<String>,
    },

    /// Crop rectangle does not fit the source frame
    #[error("{0}")]
    OutOfBounds(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EditError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify a failure to read stream metadata.
    pub fn probe(err: MediaError) -> Self {
        match err {
            MediaError::FfprobeFailed { message, stderr } => match stderr {
                Some(s) if !s.is_empty() => Self::Probe(format!("{}: {}", message, s)),
                _ => Self::Probe(message),
            },
            other => Self::Probe(other.to_string()),
        }
    }

    /// Classify a failed FFmpeg invocation.
    pub fn tool(err: MediaError) -> Self {
        match err {
            MediaError::FfmpegFailed {
                message,
                stderr,
                exit_code,
            } => Self::Tool {
                message: match exit_code {
                    Some(code) => format!("FFmpeg failed with exit code {}", code),
                    None => format!("FFmpeg failed: {}", message),
                },
                exit_code,
                stderr_tail: stderr,
            },
            MediaError::Timeout(secs) => Self::Tool {
                message: format!("FFmpeg timed out after {} seconds", secs),
                exit_code: None,
                stderr_tail: None,
            },
            other => Self::Tool {
                message: format!("FFmpeg could not run: {}", other),
                exit_code: None,
                stderr_tail: None,
            },
        }
    }

    /// Whether the caller is at fault (4xx) rather than the service (5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EditError::InvalidInput(_)
                | EditError::NotFound(_)
                | EditError::EmptySource(_)
                | EditError::OutOfBounds(_)
        )
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EditError::InvalidInput(_) => "invalid_input",
            EditError::NotFound(_) => "not_found",
            EditError::EmptySource(_) => "empty_source",
            EditError::Transfer(_) => "transfer_error",
            EditError::Probe(_) => "probe_error",
            EditError::Tool { .. } => "tool_error",
            EditError::OutOfBounds(_) => "out_of_bounds",
            EditError::Internal(_) => "internal_error",
        }
    }
}

impl From<StorageError> for EditError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => EditError::NotFound(key),
            StorageError::InvalidKey(key) => {
                EditError::InvalidInput(format!("Invalid video id: {}", key))
            }
            other => EditError::Transfer(other.to_string()),
        }
    }
}

impl From<GeometryError> for EditError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::OutOfBounds { .. } => EditError::OutOfBounds(err.to_string()),
            other => EditError::InvalidInput(other.to_string()),
        }
    }
}

impl From<FormatError> for EditError {
    fn from(err: FormatError) -> Self {
        EditError::InvalidInput(err.to_string())
    }
}

impl From<std::io::Error> for EditError {
    fn from(err: std::io::Error) -> Self {
        EditError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_classification() {
        let err: EditError = StorageError::not_found("a.mp4").into();
        assert!(matches!(err, EditError::NotFound(ref k) if k == "a.mp4"));
        assert!(err.is_client_error());

        let err: EditError = StorageError::upload_failed("connection reset").into();
        assert_eq!(err.kind(), "transfer_error");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_tool_classification() {
        let err = EditError::tool(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("Invalid data found".to_string()),
            Some(1),
        ));
        match err {
            EditError::Tool {
                ref message,
                exit_code,
                ref stderr_tail,
            } => {
                assert_eq!(message, "FFmpeg failed with exit code 1");
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr_tail.as_deref(), Some("Invalid data found"));
            }
            _ => panic!("expected tool error"),
        }

        let timeout = EditError::tool(MediaError::Timeout(30));
        assert!(timeout.to_string().contains("timed out"));
    }

    #[test]
    fn test_geometry_classification() {
        let err: EditError = GeometryError::InvalidResolution("abc".to_string()).into();
        assert_eq!(err.kind(), "invalid_input");

        let err: EditError = GeometryError::OutOfBounds {
            x: 10,
            y: 0,
            width: 100,
            height: 100,
            source_width: 50,
            source_height: 50,
        }
        .into();
        assert_eq!(err.kind(), "out_of_bounds");
    }
}
