//! Artifact materialization into the durable results volume.
//!
//! Layout: `{results_root}/{sanitized_user_id}/{job_id}/{filename}`.  One
//! directory per job; job ids are freshly generated, so writes from separate
//! requests never collide and no locking is needed.

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::{sanitize, OutputFileDescriptor, StorageError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root of the durable, shared results volume.
    pub results_root: PathBuf,
    /// Directory the engine writes its outputs into.
    pub engine_output_root: PathBuf,
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

pub struct ArtifactStore {
    config: StorageConfig,
}

impl ArtifactStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Copy every `output`-typed descriptor into the job's directory and
    /// return the stored paths relative to the results root.
    ///
    /// Descriptors whose source file is missing are skipped.  Two descriptors
    /// with the same base name overwrite each other; the last one wins.  The
    /// volume is committed before this returns.
    ///
    /// # Errors
    /// [`StorageError::InvalidComponent`] for an empty `user_id`/`job_id`,
    /// [`StorageError::Io`] if a directory or copy fails.
    #[instrument(skip(self, descriptors), fields(count = descriptors.len()))]
    pub async fn materialize(
        &self,
        user_id: &str,
        job_id: &str,
        descriptors: &[OutputFileDescriptor],
    ) -> Result<Vec<String>, StorageError> {
        let user_safe = sanitize(user_id)?;
        let job_safe = sanitize(job_id)?;

        let dest_dir = self.config.results_root.join(&user_safe).join(&job_safe);
        tokio::fs::create_dir_all(&dest_dir)
            .await
            .map_err(|e| StorageError::io(&dest_dir, e))?;

        let mut stored = Vec::new();

        for descriptor in descriptors.iter().filter(|d| d.is_output()) {
            let Some(name) = base_name(&descriptor.filename) else {
                warn!(filename = %descriptor.filename, "output has no usable file name, skipping");
                continue;
            };
            let Some(src) = self.source_path(&descriptor.subfolder, name) else {
                warn!(subfolder = %descriptor.subfolder, "output subfolder escapes the output root, skipping");
                continue;
            };

            match tokio::fs::metadata(&src).await {
                Ok(meta) if meta.is_file() => {}
                _ => {
                    debug!(src = %src.display(), "engine produced no file here, skipping");
                    continue;
                }
            }

            let dest = dest_dir.join(name);
            copy_preserving_mtime(&src, &dest).await?;
            stored.push(format!("{user_safe}/{job_safe}/{name}"));
        }

        self.commit(&dest_dir).await?;
        info!(stored = stored.len(), dir = %dest_dir.display(), "artifacts materialized");
        Ok(stored)
    }

    /// Flush directory entries from `dir` up to the results root so other
    /// readers of the shared volume see the new files.
    pub async fn commit(&self, dir: &Path) -> Result<(), StorageError> {
        let root = self.config.results_root.clone();
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || sync_dirs(&dir, &root))
            .await
            .map_err(|e| StorageError::io(self.config.results_root.clone(), io::Error::other(e)))?
    }

    /// `{engine_output_root}/{subfolder}/{name}`, or `None` if `subfolder`
    /// would climb out of the output root.
    fn source_path(&self, subfolder: &str, name: &str) -> Option<PathBuf> {
        let subfolder = Path::new(subfolder);
        let contained = subfolder
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            return None;
        }
        Some(self.config.engine_output_root.join(subfolder).join(name))
    }
}

/// Final path component of `filename`, stripping any directories.
fn base_name(filename: &str) -> Option<&str> {
    Path::new(filename).file_name()?.to_str()
}

async fn copy_preserving_mtime(src: &Path, dest: &Path) -> Result<(), StorageError> {
    // A previous copy may have left a read-only file behind.
    match tokio::fs::remove_file(dest).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(StorageError::io(dest, e)),
    }

    tokio::fs::copy(src, dest)
        .await
        .map_err(|e| StorageError::io(src, e))?;

    let modified = tokio::fs::metadata(src)
        .await
        .and_then(|m| m.modified())
        .ok();

    let dest_owned = dest.to_path_buf();
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let file = std::fs::File::open(&dest_owned)?;
        if let Some(modified) = modified {
            file.set_times(std::fs::FileTimes::new().set_modified(modified))?;
        }
        file.sync_all()
    })
    .await
    .map_err(|e| StorageError::io(dest, io::Error::other(e)))?
    .map_err(|e| StorageError::io(dest, e))
}

fn sync_dirs(dir: &Path, root: &Path) -> Result<(), StorageError> {
    let mut current = Some(dir);
    while let Some(path) = current {
        sync_dir(path).map_err(|e| StorageError::io(path, e))?;
        if path == root {
            break;
        }
        current = path.parent();
    }
    Ok(())
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> io::Result<()> {
    std::fs::File::open(path)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}
