//! Shared fixtures for the mirror integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::RetryPolicy;
use bridge_traits::storage::{RemoteNode, StorageProvider};
use core_async::sync::Mutex as AsyncMutex;
use core_mirror::{MirrorSink, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// In-memory provider
// ============================================================================

/// In-memory remote hierarchy.
///
/// Each folder holds its children as a list of pages; page `n` is served for
/// token `"<folder>#<n>"`. Listing failures can be injected per folder.
#[derive(Default)]
pub struct FakeProvider {
    nodes: HashMap<String, RemoteNode>,
    pages: HashMap<String, Vec<Vec<RemoteNode>>>,
    /// folder id -> number of transient failures left before listing works
    failures: AsyncMutex<HashMap<String, u32>>,
    /// folder ids in the order they were listed (one entry per page request)
    listed: AsyncMutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a folder. Children are attached with [`FakeProvider::child`].
    pub fn folder(mut self, id: &str, name: &str) -> Self {
        self.nodes
            .insert(id.to_string(), RemoteNode::folder(id, name));
        self.pages.entry(id.to_string()).or_default();
        self
    }

    /// Append `node` to the last page of `parent`.
    pub fn child(mut self, parent: &str, node: RemoteNode) -> Self {
        let node = node.with_parents([parent]);
        if node.is_folder() && !self.nodes.contains_key(&node.id) {
            self.pages.entry(node.id.clone()).or_default();
        }
        self.nodes.insert(node.id.clone(), node.clone());

        let pages = self.pages.entry(parent.to_string()).or_default();
        if pages.is_empty() {
            pages.push(Vec::new());
        }
        if let Some(last) = pages.last_mut() {
            last.push(node);
        }
        self
    }

    /// Start a new listing page for `parent`.
    pub fn page_break(mut self, parent: &str) -> Self {
        self.pages.entry(parent.to_string()).or_default().push(Vec::new());
        self
    }

    /// Make listing `folder` fail transiently `times` times.
    pub fn failing(mut self, folder: &str, times: u32) -> Self {
        self.failures.get_mut().insert(folder.to_string(), times);
        self
    }

    pub async fn listed(&self) -> Vec<String> {
        self.listed.lock().await.clone()
    }

    fn page_index(folder_id: &str, token: Option<&str>) -> BridgeResult<usize> {
        match token {
            None => Ok(0),
            Some(token) => token
                .strip_prefix(&format!("{folder_id}#"))
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| BridgeError::OperationFailed(format!("bad page token {token}"))),
        }
    }
}

#[async_trait]
impl StorageProvider for FakeProvider {
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<String>,
    ) -> BridgeResult<(Vec<RemoteNode>, Option<String>)> {
        self.listed.lock().await.push(folder_id.to_string());

        if let Some(left) = self.failures.lock().await.get_mut(folder_id) {
            if *left > 0 {
                *left -= 1;
                return Err(BridgeError::Transient(format!(
                    "503 listing {folder_id}"
                )));
            }
        }

        let pages = self
            .pages
            .get(folder_id)
            .ok_or_else(|| BridgeError::NotFound(folder_id.to_string()))?;
        if pages.is_empty() {
            return Ok((Vec::new(), None));
        }

        let index = Self::page_index(folder_id, page_token.as_deref())?;
        let page = pages.get(index).cloned().unwrap_or_default();
        let next = (index + 1 < pages.len()).then(|| format!("{folder_id}#{}", index + 1));
        Ok((page, next))
    }

    async fn get_node(&self, id: &str) -> BridgeResult<RemoteNode> {
        self.nodes
            .get(id)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(id.to_string()))
    }

    async fn list_top_level_containers(&self) -> BridgeResult<Vec<RemoteNode>> {
        Ok(self
            .nodes
            .values()
            .filter(|node| node.is_folder() && node.parent_ids.is_empty())
            .cloned()
            .collect())
    }
}

// ============================================================================
// Recording sink
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    SwitchDir { name: String, path: PathBuf },
    Pointer { file_id: String, dir: PathBuf },
}

/// Sink that records calls and touches no filesystem.
#[derive(Default)]
pub struct RecordingSink {
    calls: AsyncMutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub async fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl MirrorSink for RecordingSink {
    async fn switch_dir(&self, folder_name: &str, parent: &Path) -> Result<PathBuf> {
        let path = parent.join(folder_name);
        self.calls.lock().await.push(SinkCall::SwitchDir {
            name: folder_name.to_string(),
            path: path.clone(),
        });
        Ok(path)
    }

    async fn generate_pointer(&self, file: &RemoteNode, dir: &Path) -> Result<PathBuf> {
        self.calls.lock().await.push(SinkCall::Pointer {
            file_id: file.id.clone(),
            dir: dir.to_path_buf(),
        });
        Ok(dir.join(format!("{}.strm", file.name)))
    }
}

pub fn provider(fake: FakeProvider) -> Arc<dyn StorageProvider> {
    Arc::new(fake)
}

pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::immediate(max_attempts)
}

/// Every file below `root`, relative to it, sorted.
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect(root, root, &mut files, false);
    files.sort();
    files
}

/// Every directory below `root`, relative to it, sorted.
pub fn list_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    collect(root, root, &mut dirs, true);
    dirs.sort();
    dirs
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<PathBuf>, dirs: bool) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            if dirs {
                out.push(path.strip_prefix(root).unwrap().to_path_buf());
            }
            collect(root, &path, out, dirs);
        } else if !dirs {
            out.push(path.strip_prefix(root).unwrap().to_path_buf());
        }
    }
}
