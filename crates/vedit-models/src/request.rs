//! Editor operation requests.
//!
//! Request bodies are validated in two layers: the shape rules declared here
//! with `validator` (ranges, key lengths, time ordering), and the rules that
//! need parsing or probing (formats, resolutions, crop bounds) which the
//! editor applies before touching storage.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Cut a time range out of a stored video.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_cut_range"))]
pub struct CutRequest {
    /// Source object key
    #[validate(length(min = 1, max = 1024, message = "video_id must not be empty"))]
    pub video_id: String,
    /// Trim start in seconds
    #[validate(range(min = 0.0, message = "start_time must be >= 0"))]
    pub start_time: f64,
    /// Trim end in seconds (exclusive of everything after)
    pub end_time: f64,
    /// Output format; defaults to the source key's extension
    #[serde(default)]
    pub format: Option<String>,
}

fn validate_cut_range(req: &CutRequest) -> Result<(), ValidationError> {
    if req.end_time <= req.start_time {
        let mut err = ValidationError::new("time_range");
        err.message = Some("end_time must be greater than start_time".into());
        return Err(err);
    }
    Ok(())
}

/// Re-encode a stored video into another container.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConvertRequest {
    #[validate(length(min = 1, max = 1024, message = "video_id must not be empty"))]
    pub video_id: String,
    /// One of mp4, avi, mov, mkv (case-insensitive)
    pub target_format: String,
}

/// Fit a stored video inside a `<width>x<height>` box.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResizeRequest {
    #[validate(length(min = 1, max = 1024, message = "video_id must not be empty"))]
    pub video_id: String,
    /// Target box, e.g. "1280x720"
    pub resolution: String,
    #[serde(default)]
    pub format: Option<String>,
}

/// Cut a pixel rectangle out of every frame.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CropRequest {
    #[validate(length(min = 1, max = 1024, message = "video_id must not be empty"))]
    pub video_id: String,
    #[validate(range(min = 0, message = "x must be >= 0"))]
    pub x: i64,
    #[validate(range(min = 0, message = "y must be >= 0"))]
    pub y: i64,
    #[validate(range(min = 1, message = "width must be > 0"))]
    pub width: i64,
    #[validate(range(min = 1, message = "height must be > 0"))]
    pub height: i64,
    #[serde(default)]
    pub format: Option<String>,
}

/// Stack two stored videos into a 9:16 composite.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MergeRequest {
    /// Top half, also the audio source and the length of the result
    #[validate(length(min = 1, max = 1024, message = "main_video_id must not be empty"))]
    pub main_video_id: String,
    /// Bottom half, looped for as long as the main video plays
    #[validate(length(min = 1, max = 1024, message = "background_video_id must not be empty"))]
    pub background_video_id: String,
    #[serde(default)]
    pub format: Option<String>,
}

/// Operation kind, used for logging, metrics and response messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Cut,
    Convert,
    Resize,
    Crop,
    Merge,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Cut => "cut",
            OperationKind::Convert => "convert",
            OperationKind::Resize => "resize",
            OperationKind::Crop => "crop",
            OperationKind::Merge => "merge",
        }
    }

    /// Human-readable success message.
    pub fn success_message(&self) -> &'static str {
        match self {
            OperationKind::Cut => "Video cut successfully",
            OperationKind::Convert => "Video converted successfully",
            OperationKind::Resize => "Video resized successfully",
            OperationKind::Crop => "Video cropped successfully",
            OperationKind::Merge => "Videos merged successfully",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any editor operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum OperationRequest {
    Cut(CutRequest),
    Convert(ConvertRequest),
    Resize(ResizeRequest),
    Crop(CropRequest),
    Merge(MergeRequest),
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::Cut(_) => OperationKind::Cut,
            OperationRequest::Convert(_) => OperationKind::Convert,
            OperationRequest::Resize(_) => OperationKind::Resize,
            OperationRequest::Crop(_) => OperationKind::Crop,
            OperationRequest::Merge(_) => OperationKind::Merge,
        }
    }

    /// Object keys this operation reads, in input order.
    pub fn source_keys(&self) -> Vec<&str> {
        match self {
            OperationRequest::Cut(r) => vec![r.video_id.as_str()],
            OperationRequest::Convert(r) => vec![r.video_id.as_str()],
            OperationRequest::Resize(r) => vec![r.video_id.as_str()],
            OperationRequest::Crop(r) => vec![r.video_id.as_str()],
            OperationRequest::Merge(r) => {
                vec![r.main_video_id.as_str(), r.background_video_id.as_str()]
            }
        }
    }

    /// Run the declarative shape checks of the wrapped request.
    pub fn validate_shape(&self) -> Result<(), ValidationErrors> {
        match self {
            OperationRequest::Cut(r) => r.validate(),
            OperationRequest::Convert(r) => r.validate(),
            OperationRequest::Resize(r) => r.validate(),
            OperationRequest::Crop(r) => r.validate(),
            OperationRequest::Merge(r) => r.validate(),
        }
    }
}

impl From<CutRequest> for OperationRequest {
    fn from(r: CutRequest) -> Self {
        Self::Cut(r)
    }
}

impl From<ConvertRequest> for OperationRequest {
    fn from(r: ConvertRequest) -> Self {
        Self::Convert(r)
    }
}

impl From<ResizeRequest> for OperationRequest {
    fn from(r: ResizeRequest) -> Self {
        Self::Resize(r)
    }
}

impl From<CropRequest> for OperationRequest {
    fn from(r: CropRequest) -> Self {
        Self::Crop(r)
    }
}

impl From<MergeRequest> for OperationRequest {
    fn from(r: MergeRequest) -> Self {
        Self::Merge(r)
    }
}

/// Flatten validator output into a single client-facing sentence.
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();

    if messages.is_empty() {
        errors.to_string()
    } else {
        messages.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cut(start: f64, end: f64) -> CutRequest {
        CutRequest {
            video_id: "a.mp4".to_string(),
            start_time: start,
            end_time: end,
            format: None,
        }
    }

    #[test]
    fn test_cut_range_rules() {
        assert!(cut(0.0, 1.5).validate().is_ok());
        assert!(cut(2.0, 1.0).validate().is_err());
        assert!(cut(1.0, 1.0).validate().is_err());
        assert!(cut(-1.0, 3.0).validate().is_err());
    }

    #[test]
    fn test_cut_error_message_mentions_end_time() {
        let errors = cut(2.0, 1.0).validate().unwrap_err();
        let msg = describe_validation_errors(&errors);
        assert!(msg.contains("end_time must be greater than start_time"), "{msg}");
    }

    #[test]
    fn test_crop_shape_rules() {
        let mut req = CropRequest {
            video_id: "b.mp4".to_string(),
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            format: None,
        };
        assert!(req.validate().is_ok());

        req.x = -1;
        assert!(req.validate().is_err());

        req.x = 0;
        req.height = 0;
        let msg = describe_validation_errors(&req.validate().unwrap_err());
        assert_eq!(msg, "height must be > 0");
    }

    #[test]
    fn test_empty_key_rejected() {
        let req = ConvertRequest {
            video_id: String::new(),
            target_format: "mp4".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_merge_source_keys_order() {
        let req = OperationRequest::from(MergeRequest {
            main_video_id: "main.mp4".to_string(),
            background_video_id: "bg.mp4".to_string(),
            format: None,
        });
        assert_eq!(req.kind(), OperationKind::Merge);
        assert_eq!(req.source_keys(), vec!["main.mp4", "bg.mp4"]);
    }

    #[test]
    fn test_request_defaults_from_json() {
        let req: CutRequest =
            serde_json::from_str(r#"{"video_id":"a.mp4","start_time":1,"end_time":4}"#).unwrap();
        assert!(req.format.is_none());

        let op: OperationRequest = serde_json::from_str(
            r#"{"operation":"resize","video_id":"c.mp4","resolution":"1280x720"}"#,
        )
        .unwrap();
        assert_eq!(op.kind(), OperationKind::Resize);
    }
}
