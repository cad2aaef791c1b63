//! Temporary artifacts of a conversion job.
//!
//! Each job gets its own work directory holding the concat manifest and the
//! normalized clips. [`TempArtifacts::cleanup`] deletes them explicitly on every
//! terminal state; dropping the value runs the same cleanup as a backstop.
//! Deletion failures are logged and returned, never raised over the job's
//! own outcome.

use crate::config::PipelineSettings;
use crate::error::{CoreError, CoreResult};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, TempDir};

/// Returns a temporary file path with random suffix. Does not create the file.
pub fn create_temp_file_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    use rand::distributions::Alphanumeric;
    use rand::{Rng, thread_rng};

    let random_suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    let filename = format!("{prefix}_{random_suffix}.{extension}");
    dir.join(filename)
}

/// Work directory plus every file a job registered in it.
#[derive(Debug)]
pub struct TempArtifacts {
    dir: Option<TempDir>,
    dir_path: PathBuf,
    files: Vec<PathBuf>,
}

impl TempArtifacts {
    /// Creates the job work directory under the configured temp location.
    pub fn create(settings: &PipelineSettings) -> CoreResult<Self> {
        let base = settings
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&base).map_err(|source| CoreError::FileSystem {
            path: base.clone(),
            source,
        })?;

        let dir = TempFileBuilder::new()
            .prefix("reelcat_")
            .tempdir_in(&base)
            .map_err(|source| CoreError::FileSystem {
                path: base.clone(),
                source,
            })?;
        let dir_path = dir.path().to_path_buf();
        log::debug!("Created job work directory {}", dir_path.display());

        Ok(Self {
            dir: Some(dir),
            dir_path,
            files: Vec::new(),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir_path
    }

    /// Reserves and registers a new file path in the work directory.
    pub fn new_path(&mut self, prefix: &str, extension: &str) -> PathBuf {
        let path = create_temp_file_path(&self.dir_path, prefix, extension);
        self.files.push(path.clone());
        path
    }

    /// Registered files, in registration order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Deletes every registered file that exists, then the work directory.
    /// Safe to call any number of times.
    pub fn cleanup(&mut self) -> Vec<CoreError> {
        let mut failures = Vec::new();

        for path in &self.files {
            match std::fs::remove_file(path) {
                Ok(()) => log::debug!("Removed temporary file {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    log::warn!("Failed to remove temporary file {}: {source}", path.display());
                    failures.push(CoreError::FileSystem {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }

        if let Some(dir) = self.dir.take() {
            if let Err(source) = dir.close() {
                if source.kind() != io::ErrorKind::NotFound {
                    log::warn!(
                        "Failed to remove work directory {}: {source}",
                        self.dir_path.display()
                    );
                    failures.push(CoreError::FileSystem {
                        path: self.dir_path.clone(),
                        source,
                    });
                }
            }
        }

        failures
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        self.cleanup();
    }
}
