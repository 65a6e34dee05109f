//! Application state.

use std::sync::Arc;

use vedit_editor::{Editor, EditorConfig};
use vedit_media::{FfmpegTool, MediaCapabilities, MediaTool};
use vedit_storage::{create_store, ObjectStore, StorageConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub editor: Editor,
}

impl AppState {
    pub fn new(config: ApiConfig, editor: Editor) -> Self {
        Self { config, editor }
    }

    /// Build the store, the FFmpeg tool and the editor from the environment.
    pub async fn from_env(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let storage_config = StorageConfig::from_env()?;
        let store = create_store(&storage_config).await?;

        let editor_config = EditorConfig::from_env();
        let mut tool = FfmpegTool::new().with_timeout(editor_config.ffmpeg_timeout);
        if !editor_config.hwaccel {
            tool = tool.with_capabilities(MediaCapabilities::software());
        }
        let tool: Arc<dyn MediaTool> = Arc::new(tool);

        Ok(Self::new(config, Editor::new(store, tool, editor_config)))
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        self.editor.store()
    }
}
