//! Remote Storage and File System Abstractions
//!
//! The remote side of a mirror run is reached through [`StorageProvider`];
//! the local side through [`FileSystemAccess`]. Both are trait objects so the
//! core can be driven by in-memory fakes in tests.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Kind of a remote item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteKind {
    Folder,
    File,
}

/// One item of the remote hierarchy.
///
/// A node may list several parents, so the hierarchy is a DAG rather than a
/// tree. Nodes are fetched on demand and never mutated by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNode {
    /// Opaque, stable provider identifier
    pub id: String,
    /// Display name as shown by the provider (not sanitized)
    pub name: String,
    pub kind: RemoteKind,
    #[serde(default)]
    pub parent_ids: Vec<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl RemoteNode {
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, RemoteKind::Folder)
    }

    pub fn file(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, RemoteKind::File)
    }

    fn new(id: impl Into<String>, name: impl Into<String>, kind: RemoteKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            parent_ids: Vec::new(),
            mime_type: None,
            size: None,
        }
    }

    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_ids = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind == RemoteKind::Folder
    }
}

/// Read-only access to a remote folder hierarchy.
///
/// Implementations perform a single call per method and report failures with
/// the classification the walker's retry loop relies on:
/// [`BridgeError::NotFound`](crate::error::BridgeError::NotFound) for missing
/// items and [`BridgeError::Transient`](crate::error::BridgeError::Transient)
/// for anything worth retrying.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::StorageProvider;
///
/// async fn count_children(provider: &dyn StorageProvider, id: &str) -> Result<usize> {
///     let mut total = 0;
///     let mut token = None;
///     loop {
///         let (items, next) = provider.list_children(id, token).await?;
///         total += items.len();
///         match next {
///             Some(next) => token = Some(next),
///             None => return Ok(total),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// List one page of the direct children of `folder_id`.
    ///
    /// Returns the items of the page and the token of the next page, if any.
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<String>,
    ) -> Result<(Vec<RemoteNode>, Option<String>)>;

    /// Fetch a single node by identifier.
    async fn get_node(&self, id: &str) -> Result<RemoteNode>;

    /// List the top-level containers (drives) a user can pick as a root.
    async fn list_top_level_containers(&self) -> Result<Vec<RemoteNode>>;
}

/// Local file system access used by the mirror builder.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn write_pointer(fs: &dyn FileSystemAccess, dir: &Path) -> Result<()> {
///     fs.create_dir_all(dir).await?;
///     fs.write_file(&dir.join("Movie.strm"), "plugin://...\n".into()).await
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Write data to a file, creating it or truncating an existing one
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;
}
