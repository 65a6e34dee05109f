//! Output container formats.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format used when a request does not name one.
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp4";

/// Formats accepted by the convert operation.
pub const CONVERTIBLE_FORMATS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

/// Longest accepted format token.
const MAX_FORMAT_LEN: usize = 8;

/// Format parsing error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Invalid output format '{0}': use 1-8 letters or digits")]
    Malformed(String),

    #[error("Unsupported format '{0}'. Supported: mp4, avi, mov, mkv")]
    NotConvertible(String),
}

/// A lower-cased output container extension (e.g. `mp4`).
///
/// The token doubles as the file extension of scratch files and output keys,
/// so it is restricted to ASCII letters and digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String", into = "String")]
pub struct OutputFormat(String);

impl OutputFormat {
    /// Parse any well-formed extension token.
    pub fn parse(s: &str) -> Result<Self, FormatError> {
        let token = s.trim().trim_start_matches('.').to_ascii_lowercase();
        if token.is_empty()
            || token.len() > MAX_FORMAT_LEN
            || !token.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(FormatError::Malformed(s.to_string()));
        }
        Ok(Self(token))
    }

    /// Parse a format restricted to [`CONVERTIBLE_FORMATS`] (case-insensitive).
    pub fn parse_convertible(s: &str) -> Result<Self, FormatError> {
        let format = Self::parse(s).map_err(|_| FormatError::NotConvertible(s.to_string()))?;
        if CONVERTIBLE_FORMATS.contains(&format.as_str()) {
            Ok(format)
        } else {
            Err(FormatError::NotConvertible(s.to_string()))
        }
    }

    /// Parse an optional format, falling back to `mp4`.
    pub fn parse_or_default(s: Option<&str>) -> Result<Self, FormatError> {
        match s {
            Some(s) => Self::parse(s),
            None => Ok(Self::default()),
        }
    }

    /// Extract the format from the extension of an object key, if it has a usable one.
    pub fn from_key(key: &str) -> Option<Self> {
        let name = key.rsplit('/').next().unwrap_or(key);
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Self::parse(ext).ok()
    }

    /// The extension token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type for uploads of this container.
    pub fn content_type(&self) -> &'static str {
        match self.0.as_str() {
            "mp4" | "m4v" => "video/mp4",
            "mov" => "video/quicktime",
            "avi" => "video/x-msvideo",
            "mkv" => "video/x-matroska",
            "webm" => "video/webm",
            "ts" => "video/mp2t",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self(DEFAULT_OUTPUT_FORMAT.to_string())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OutputFormat> for String {
    fn from(value: OutputFormat) -> Self {
        value.0
    }
}
