//! Shared data models for the video editing backend.
//!
//! This crate provides Serde-serializable types for:
//! - Editor operation requests (cut, convert, resize, crop, merge)
//! - Output container formats
//! - Encoding profiles for the hardware H.264 encoder
//! - HTTP response bodies

pub mod encoding;
pub mod format;
pub mod request;
pub mod response;

// Re-export common types
pub use encoding::{EncodingProfile, RateControl};
pub use format::{FormatError, OutputFormat, CONVERTIBLE_FORMATS, DEFAULT_OUTPUT_FORMAT};
pub use request::{
    describe_validation_errors, ConvertRequest, CropRequest, CutRequest, MergeRequest,
    OperationKind, OperationRequest, ResizeRequest,
};
pub use response::{EditResponse, MessageResponse, ObjectListing, UploadResponse, UrlResponse};
