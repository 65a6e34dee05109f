//! Video edit orchestration.
//!
//! Every operation runs the same pipeline:
//! validate → check sources → download → derive parameters → run FFmpeg →
//! upload → clean scratch files. Operation-specific behaviour lives in
//! [`operations`]; the shared skeleton lives in [`pipeline`].

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod operations;
pub mod pipeline;
pub mod scratch;

pub use config::EditorConfig;
pub use error::{EditError, EditResult};
pub use logging::OperationLogger;
pub use operations::{sanitize_filename, OperationParams, ValidatedOperation};
pub use pipeline::{EditOutcome, Editor, StoredObject};
pub use scratch::ScratchSpace;
