use std::path::PathBuf;

use crate::foundation::error::{FrameloomError, FrameloomResult};

/// Immutable output-settings snapshot.
///
/// Passed down the call chain by handle; the merger and session never reach
/// into ambient state to discover output settings.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct OutputConfig {
    /// Directory all resolved output paths are rooted in.
    pub directory: PathBuf,
    /// Filename template. Supports `{frame}`, `{branch}`, `{layer}`,
    /// `{renderer}`, `{subresource}` and `{camera}` tokens.
    pub file_name_format: String,
    /// Zero-padding width applied to `{frame}`.
    pub frame_number_digits: usize,
    /// File extension appended to resolved paths (no leading dot).
    pub extension: String,
    /// Whether sinks may replace files that already exist.
    pub overwrite_existing: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_name_format: "{frame}".into(),
            frame_number_digits: 4,
            extension: "png".into(),
            overwrite_existing: true,
        }
    }
}

impl OutputConfig {
    /// Parse a config snapshot from JSON.
    pub fn from_json(json: &str) -> FrameloomResult<Self> {
        serde_json::from_str(json).map_err(|e| FrameloomError::serde(e.to_string()))
    }
}
