//! # Local Mirror Builder
//!
//! Materializes walker events as directories and `.strm` pointer files.
//!
//! The walker only knows the [`MirrorSink`] trait; [`LocalMirrorBuilder`] is
//! the implementation that writes through a [`FileSystemAccess`] bridge.
//! Tests substitute recording sinks.

use async_trait::async_trait;
use bridge_traits::storage::{FileSystemAccess, RemoteNode};
use bytes::Bytes;
use core_async::sync::Mutex;
use core_runtime::config::{MirrorConfig, POINTER_ID_PLACEHOLDER};
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{MirrorError, Result};
use crate::naming::{pointer_file_name, sanitize_segment};

/// Receiver of the walker's directory and file events.
#[async_trait]
pub trait MirrorSink: Send + Sync {
    /// Make `parent/<sanitized folder_name>` exist and return it.
    ///
    /// Called once per accepted remote folder, before any of its children.
    async fn switch_dir(&self, folder_name: &str, parent: &Path) -> Result<PathBuf>;

    /// Write the pointer file for `file` into `dir` and return its path.
    async fn generate_pointer(&self, file: &RemoteNode, dir: &Path) -> Result<PathBuf>;
}

/// Writes the mirror tree below a destination root.
pub struct LocalMirrorBuilder {
    fs: Arc<dyn FileSystemAccess>,
    destination_root: PathBuf,
    include_extensions: bool,
    pointer_template: String,
    /// Directories created during this run
    created_dirs: Mutex<HashSet<PathBuf>>,
    /// Pointer path -> remote file id, for collision reporting
    written: Mutex<HashMap<PathBuf, String>>,
}

impl LocalMirrorBuilder {
    pub fn new(
        fs: Arc<dyn FileSystemAccess>,
        destination_root: impl Into<PathBuf>,
        include_extensions: bool,
        pointer_template: impl Into<String>,
    ) -> Self {
        Self {
            fs,
            destination_root: destination_root.into(),
            include_extensions,
            pointer_template: pointer_template.into(),
            created_dirs: Mutex::new(HashSet::new()),
            written: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(fs: Arc<dyn FileSystemAccess>, config: &MirrorConfig) -> Self {
        Self::new(
            fs,
            config.destination_root.clone(),
            config.include_extensions,
            config.pointer_template.clone(),
        )
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Stream reference written into the pointer for `file_id`.
    pub fn reference_for(&self, file_id: &str) -> String {
        self.pointer_template
            .replace(POINTER_ID_PLACEHOLDER, file_id)
    }

    /// Reject paths outside the destination root or with `..` components.
    fn ensure_contained(&self, path: &Path, operation: &str) -> Result<()> {
        let escapes = !path.starts_with(&self.destination_root)
            || path
                .components()
                .any(|c| matches!(c, Component::ParentDir));

        if escapes {
            return Err(MirrorError::local_io(
                operation,
                path,
                format!(
                    "path is outside the destination root {}",
                    self.destination_root.display()
                ),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl MirrorSink for LocalMirrorBuilder {
    async fn switch_dir(&self, folder_name: &str, parent: &Path) -> Result<PathBuf> {
        let path = parent.join(sanitize_segment(folder_name));
        self.ensure_contained(&path, "create directory")?;

        if !self.created_dirs.lock().await.insert(path.clone()) {
            warn!(
                folder = folder_name,
                path = %path.display(),
                "Two remote folders map to the same local directory, merging"
            );
        }

        self.fs
            .create_dir_all(&path)
            .await
            .map_err(|e| MirrorError::local_io("create directory", &path, e))?;

        debug!(path = %path.display(), "Directory ready");
        Ok(path)
    }

    async fn generate_pointer(&self, file: &RemoteNode, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(pointer_file_name(&file.name, self.include_extensions));
        self.ensure_contained(&path, "write pointer file")?;

        if let Some(previous) = self
            .written
            .lock()
            .await
            .insert(path.clone(), file.id.clone())
            .filter(|previous| *previous != file.id)
        {
            warn!(
                path = %path.display(),
                previous_id = %previous,
                file_id = %file.id,
                "Pointer name collision, last write wins"
            );
        }

        let content = format!("{}\n", self.reference_for(&file.id));
        self.fs
            .write_file(&path, Bytes::from(content))
            .await
            .map_err(|e| MirrorError::local_io("write pointer file", &path, e))?;

        debug!(path = %path.display(), file_id = %file.id, "Pointer written");
        Ok(path)
    }
}
