//! Per-operation scratch files.
//!
//! Names are built from the operation id, a role and a sanitized extension,
//! never from object keys, so concurrent operations cannot collide and a key
//! cannot steer a path outside the work directory.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

#[derive(Debug)]
pub struct ScratchSpace {
    dir: PathBuf,
    operation_id: String,
    files: Vec<PathBuf>,
}

impl ScratchSpace {
    /// Prepare the work directory for one operation.
    pub async fn create(work_dir: &Path, operation_id: &str) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(work_dir).await?;
        Ok(Self {
            dir: work_dir.to_path_buf(),
            operation_id: operation_id.to_string(),
            files: Vec::new(),
        })
    }

    /// Reserve `<work_dir>/<operation id>-<role>.<ext>`; the file is removed on cleanup.
    pub fn file(&mut self, role: &str, ext: &str) -> PathBuf {
        let ext: String = ext
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(8)
            .collect();
        let name = if ext.is_empty() {
            format!("{}-{}", self.operation_id, role)
        } else {
            format!("{}-{}.{}", self.operation_id, role, ext)
        };
        let path = self.dir.join(name);
        self.files.push(path.clone());
        path
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Remove every reserved file. Returns how many existed.
    pub async fn cleanup(mut self) -> usize {
        let mut removed = 0;
        for path in std::mem::take(&mut self.files) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove scratch file {}: {}", path.display(), e),
            }
        }
        debug!(operation_id = %self.operation_id, removed, "Scratch files cleaned up");
        removed
    }
}

impl Drop for ScratchSpace {
    // Reached when the operation future is dropped before `cleanup` ran
    fn drop(&mut self) {
        for path in self.files.drain(..) {
            let _ = std::fs::remove_file(path);
        }
    }
}
