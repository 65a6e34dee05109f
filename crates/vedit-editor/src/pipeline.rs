//! The shared edit pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::Instrument;
use uuid::Uuid;
use vedit_media::{MediaCapabilities, MediaTool};
use vedit_models::{
    ConvertRequest, CropRequest, CutRequest, EditResponse, MergeRequest, OperationKind,
    OperationRequest, OutputFormat, ResizeRequest,
};
use vedit_storage::ObjectStore;

use crate::config::EditorConfig;
use crate::error::{EditError, EditResult};
use crate::logging::OperationLogger;
use crate::metrics;
use crate::operations::{self, BuildContext, ValidatedOperation};
use crate::scratch::ScratchSpace;

/// Result of a successful edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub kind: OperationKind,
    /// Key the result was stored under
    pub key: String,
    pub url: String,
}

impl EditOutcome {
    pub fn message(&self) -> &'static str {
        self.kind.success_message()
    }
}

impl From<EditOutcome> for EditResponse {
    fn from(outcome: EditOutcome) -> Self {
        EditResponse {
            message: outcome.message().to_string(),
            url: outcome.url,
        }
    }
}

/// An object written by a direct upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Runs edit operations against an object store with an external media tool.
#[derive(Clone)]
pub struct Editor {
    store: Arc<dyn ObjectStore>,
    tool: Arc<dyn MediaTool>,
    config: Arc<EditorConfig>,
    /// Admission limit for FFmpeg invocations
    permits: Arc<Semaphore>,
}

/// Keeps the in-progress gauge right even when the request future is dropped.
struct InProgress;

impl InProgress {
    fn enter() -> Self {
        metrics::track_in_progress(1.0);
        InProgress
    }
}

impl Drop for InProgress {
    fn drop(&mut self) {
        metrics::track_in_progress(-1.0);
    }
}

impl Editor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        tool: Arc<dyn MediaTool>,
        config: EditorConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));
        Self {
            store,
            tool,
            config: Arc::new(config),
            permits,
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn tool(&self) -> &Arc<dyn MediaTool> {
        &self.tool
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub async fn cut(&self, request: CutRequest) -> EditResult<EditOutcome> {
        self.execute(request.into()).await
    }

    pub async fn convert(&self, request: ConvertRequest) -> EditResult<EditOutcome> {
        self.execute(request.into()).await
    }

    pub async fn resize(&self, request: ResizeRequest) -> EditResult<EditOutcome> {
        self.execute(request.into()).await
    }

    pub async fn crop(&self, request: CropRequest) -> EditResult<EditOutcome> {
        self.execute(request.into()).await
    }

    pub async fn merge(&self, request: MergeRequest) -> EditResult<EditOutcome> {
        self.execute(request.into()).await
    }

    /// Run any operation through the shared pipeline.
    pub async fn execute(&self, request: OperationRequest) -> EditResult<EditOutcome> {
        let operation_id = Uuid::new_v4().simple().to_string();
        let logger = OperationLogger::new(operation_id, request.kind());
        let span = logger.create_span();

        let started = Instant::now();
        let _in_progress = InProgress::enter();

        let result = self.run(&request, &logger).instrument(span).await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(outcome) => {
                metrics::record_operation(logger.operation().as_str(), "success", elapsed);
                logger.log_completion(&format!("{} in {:.2}s", outcome.key, elapsed));
            }
            Err(e) => {
                metrics::record_operation(logger.operation().as_str(), e.kind(), elapsed);
                if e.is_client_error() {
                    logger.log_warning(&e.to_string());
                } else {
                    logger.log_error(&e.to_string());
                }
            }
        }

        result
    }

    async fn run(&self, request: &OperationRequest, logger: &OperationLogger) -> EditResult<EditOutcome> {
        let op = operations::validate(request)?;
        logger.log_start(&format!(
            "sources={:?} format={}",
            op.sources, op.format
        ));

        for key in &op.sources {
            self.check_source(key).await?;
        }

        let mut scratch = ScratchSpace::create(&self.config.work_dir, logger.operation_id()).await?;
        let result = self.process(&op, &mut scratch, logger).await;
        scratch.cleanup().await;

        let key = result?;
        Ok(EditOutcome {
            kind: op.kind,
            url: self.store.public_url(&key),
            key,
        })
    }

    /// Existence and size check; nothing is downloaded for missing or empty sources.
    async fn check_source(&self, key: &str) -> EditResult<()> {
        let info = self.store.head(key).await?;
        if info.size == 0 {
            return Err(EditError::EmptySource(key.to_string()));
        }
        Ok(())
    }

    /// Download, run FFmpeg and upload. Returns the output key.
    async fn process(
        &self,
        op: &ValidatedOperation,
        scratch: &mut ScratchSpace,
        logger: &OperationLogger,
    ) -> EditResult<String> {
        let mut inputs: Vec<PathBuf> = Vec::with_capacity(op.sources.len());
        for (index, key) in op.sources.iter().enumerate() {
            let path = scratch.file(&format!("in{}", index), &operations::input_extension(key));

            let started = Instant::now();
            let bytes = self.store.download_to(key, &path).await?;
            metrics::record_download_duration(started.elapsed().as_secs_f64());
            logger.log_progress(&format!("downloaded {} ({} bytes)", key, bytes));

            inputs.push(path);
        }

        let output = scratch.file("out", op.format.as_str());
        let ctx = BuildContext {
            inputs: &inputs,
            output: &output,
            capabilities: self.capabilities().await,
            hardware_scale: self.config.hwaccel && self.tool.supports_hardware_scale().await,
            video_encoder: self.config.effective_encoder(),
        };
        let cmd = operations::build_command(op, &ctx, self.tool.as_ref()).await?;

        {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| EditError::internal("editor is shutting down"))?;

            let started = Instant::now();
            self.tool.run(&cmd).await.map_err(EditError::tool)?;
            metrics::record_ffmpeg_duration(op.kind.as_str(), started.elapsed().as_secs_f64());
        }

        let size = ensure_output(&output).await?;
        logger.log_progress(&format!("FFmpeg produced {} bytes", size));

        let key = operations::output_key(logger.operation_id(), &op.format);
        let started = Instant::now();
        self.store
            .upload_from(&output, &key, op.format.content_type())
            .await?;
        metrics::record_upload_duration(started.elapsed().as_secs_f64());

        Ok(key)
    }

    async fn capabilities(&self) -> MediaCapabilities {
        if self.config.hwaccel {
            self.tool.capabilities().await
        } else {
            MediaCapabilities::software()
        }
    }

    /// Store a file received from a client under `<uuid>_<sanitized name>`.
    pub async fn import_file(&self, local: &Path, filename: &str) -> EditResult<StoredObject> {
        let key = operations::upload_key(filename);
        let content_type = OutputFormat::from_key(&key)
            .map(|f| f.content_type())
            .unwrap_or("application/octet-stream");

        let started = Instant::now();
        self.store.upload_from(local, &key, content_type).await?;
        metrics::record_upload_duration(started.elapsed().as_secs_f64());

        tracing::info!(key = %key, "Stored uploaded file");
        Ok(StoredObject {
            url: self.store.public_url(&key),
            key,
        })
    }
}

/// A successful exit is not enough: an empty or missing file must never be uploaded.
async fn ensure_output(path: &Path) -> EditResult<u64> {
    let no_output = |detail: &str| EditError::Tool {
        message: format!("FFmpeg produced no output: {}", detail),
        exit_code: Some(0),
        stderr_tail: None,
    };

    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(meta.len()),
        Ok(_) => Err(no_output("file is empty")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(no_output("file is missing")),
        Err(e) => Err(e.into()),
    }
}
