//! # Remote Tree Walker
//!
//! Depth-first, pre-order traversal of a remote folder graph.
//!
//! ## Overview
//!
//! The walker resolves the root folder, then expands folders one at a time
//! from an explicit stack of [`TraversalFrame`]s. For every folder it:
//! 1. Lists all children, following page tokens until exhausted
//! 2. Processes the children in the order the service returned them
//! 3. Descends into each new subfolder before moving to the next sibling
//!
//! Folders reachable through more than one parent are expanded once; later
//! encounters are skipped with a warning. Files become pointer files through
//! the injected [`MirrorSink`].
//!
//! Transient listing failures are retried according to the configured
//! [`RetryPolicy`]; any other failure aborts the whole walk.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_mirror::{LocalMirrorBuilder, TreeWalker};
//!
//! let walker = TreeWalker::new(provider).with_event_bus(bus);
//! let builder = LocalMirrorBuilder::new(fs, "/srv/library", true, template);
//! let summary = walker
//!     .walk("1AbCdEf", Path::new("/srv/library"), Some("Movies"), &builder)
//!     .await?;
//! println!("{summary}");
//! ```

use bridge_traits::error::BridgeError;
use bridge_traits::http::RetryPolicy;
use bridge_traits::storage::{RemoteNode, StorageProvider};
use core_async::time::{Duration, Instant};
use core_runtime::config::{MediaFilter, MirrorConfig};
use core_runtime::events::{EventBus, MirrorEvent};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::builder::MirrorSink;
use crate::error::{MirrorError, Result};
use crate::retry::{with_retry, RetryFailure};

/// Identifiers of folders already expanded in this run.
#[derive(Debug, Default)]
pub struct VisitedSet {
    ids: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`. Returns `false` if it was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Walker state for one expanded folder.
struct TraversalFrame {
    folder_id: String,
    local_path: PathBuf,
    depth: usize,
    children: std::vec::IntoIter<RemoteNode>,
    pointers_written: u64,
}

/// Outcome of a successful walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkSummary {
    pub run_id: String,
    pub root_id: String,
    /// Local directory the root folder was mirrored to
    pub root_path: PathBuf,
    /// Folders mirrored, root included
    pub folders: u64,
    pub pointers: u64,
    /// Folders skipped because they were already expanded via another parent
    pub skipped_folders: u64,
    /// Files rejected by the media filter
    pub skipped_files: u64,
    /// Listing pages fetched
    pub pages: u64,
    pub duration: Duration,
}

impl fmt::Display for WalkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mirrored {} folders into {} with {} pointer files in {:.1}s \
             ({} pages fetched, {} revisited folders skipped, {} files filtered out)",
            self.folders,
            self.root_path.display(),
            self.pointers,
            self.duration.as_secs_f64(),
            self.pages,
            self.skipped_folders,
            self.skipped_files,
        )
    }
}

/// Counters accumulated while walking.
#[derive(Debug, Default)]
struct WalkCounters {
    folders: u64,
    pointers: u64,
    skipped_folders: u64,
    skipped_files: u64,
    pages: u64,
}

/// Depth-first walker over a [`StorageProvider`].
pub struct TreeWalker {
    provider: Arc<dyn StorageProvider>,
    retry_policy: RetryPolicy,
    media_filter: MediaFilter,
    event_bus: Option<EventBus>,
}

impl TreeWalker {
    /// Walker with the default retry policy that accepts every file.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            provider,
            retry_policy: RetryPolicy::default(),
            media_filter: MediaFilter::all_files(),
            event_bus: None,
        }
    }

    /// Walker configured from `config`. The bus is only used when live
    /// updates are enabled.
    pub fn from_config(
        provider: Arc<dyn StorageProvider>,
        config: &MirrorConfig,
        event_bus: Option<EventBus>,
    ) -> Self {
        Self {
            provider,
            retry_policy: config.retry_policy.clone(),
            media_filter: config.media_filter.clone(),
            event_bus: event_bus.filter(|_| config.live_updates),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_media_filter(mut self, filter: MediaFilter) -> Self {
        self.media_filter = filter;
        self
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Mirror the folder `root_id` below `destination_root`.
    ///
    /// The top-level directory is named `custom_root_name` if given, else the
    /// remote root's own name. Every accepted folder is announced to `sink`
    /// through `switch_dir` before any of its children, every accepted file
    /// through `generate_pointer`.
    ///
    /// # Errors
    ///
    /// - [`MirrorError::NotFound`] if the root does not exist or is not a folder
    /// - [`MirrorError::RemoteUnavailable`] once a call exhausts its retries
    /// - [`MirrorError::Provider`] for non-retryable remote failures
    /// - [`MirrorError::LocalIo`] when the sink cannot write
    ///
    /// An aborted walk leaves the partial tree in place. A folder's directory
    /// is created before its listing is fetched, so the folder whose listing
    /// failed remains as an empty directory.
    #[instrument(skip_all, fields(root = %root_id))]
    pub async fn walk(
        &self,
        root_id: &str,
        destination_root: &Path,
        custom_root_name: Option<&str>,
        sink: &dyn MirrorSink,
    ) -> Result<WalkSummary> {
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        let result = self
            .run(&run_id, root_id, destination_root, custom_root_name, sink)
            .await;

        match result {
            Ok((root_path, counters)) => {
                let summary = WalkSummary {
                    run_id: run_id.clone(),
                    root_id: root_id.to_string(),
                    root_path,
                    folders: counters.folders,
                    pointers: counters.pointers,
                    skipped_folders: counters.skipped_folders,
                    skipped_files: counters.skipped_files,
                    pages: counters.pages,
                    duration: started.elapsed(),
                };

                info!(
                    folders = summary.folders,
                    pointers = summary.pointers,
                    skipped_folders = summary.skipped_folders,
                    skipped_files = summary.skipped_files,
                    pages = summary.pages,
                    "Mirror completed"
                );
                self.emit(MirrorEvent::Completed {
                    run_id,
                    folders: summary.folders,
                    pointers: summary.pointers,
                    skipped_folders: summary.skipped_folders,
                    skipped_files: summary.skipped_files,
                    pages: summary.pages,
                    duration_ms: summary.duration.as_millis() as u64,
                });
                Ok(summary)
            }
            Err(error) => {
                self.emit(MirrorEvent::Failed {
                    run_id,
                    message: error.to_string(),
                });
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        run_id: &str,
        root_id: &str,
        destination_root: &Path,
        custom_root_name: Option<&str>,
        sink: &dyn MirrorSink,
    ) -> Result<(PathBuf, WalkCounters)> {
        let root = self.resolve_root(run_id, root_id).await?;
        let root_name = custom_root_name.unwrap_or(&root.name);

        self.emit(MirrorEvent::Started {
            run_id: run_id.to_string(),
            root_id: root.id.clone(),
            root_name: root_name.to_string(),
            destination: destination_root.display().to_string(),
            started_at: chrono::Utc::now().timestamp(),
        });

        let mut counters = WalkCounters::default();
        let mut visited = VisitedSet::new();
        let mut stack: Vec<TraversalFrame> = Vec::new();

        visited.insert(&root.id);
        let root_path = sink.switch_dir(root_name, destination_root).await?;
        counters.folders += 1;
        self.folder_entered(run_id, &root.id, root_name, 0, &root_path);

        let children = self.list_all(run_id, &root.id, &mut counters).await?;
        stack.push(TraversalFrame {
            folder_id: root.id.clone(),
            local_path: root_path.clone(),
            depth: 0,
            children: children.into_iter(),
            pointers_written: 0,
        });

        loop {
            let next = match stack.last_mut() {
                Some(frame) => frame
                    .children
                    .next()
                    .map(|child| (child, frame.local_path.clone(), frame.depth)),
                None => break,
            };

            let Some((child, parent_path, parent_depth)) = next else {
                if let Some(frame) = stack.pop() {
                    debug!(folder_id = %frame.folder_id, depth = frame.depth, "Folder done");
                    self.emit(MirrorEvent::FolderExited {
                        run_id: run_id.to_string(),
                        folder_id: frame.folder_id,
                        depth: frame.depth,
                        pointers_written: frame.pointers_written,
                    });
                }
                continue;
            };

            if child.is_folder() {
                if !visited.insert(&child.id) {
                    counters.skipped_folders += 1;
                    warn!(
                        folder_id = %child.id,
                        name = %child.name,
                        "Folder already mirrored through another parent, skipping"
                    );
                    self.emit(MirrorEvent::FolderSkipped {
                        run_id: run_id.to_string(),
                        folder_id: child.id,
                        name: child.name,
                    });
                    continue;
                }

                let depth = parent_depth + 1;
                let local_path = sink.switch_dir(&child.name, &parent_path).await?;
                counters.folders += 1;
                self.folder_entered(run_id, &child.id, &child.name, depth, &local_path);

                let children = self.list_all(run_id, &child.id, &mut counters).await?;
                stack.push(TraversalFrame {
                    folder_id: child.id,
                    local_path,
                    depth,
                    children: children.into_iter(),
                    pointers_written: 0,
                });
            } else {
                if !self
                    .media_filter
                    .accepts(&child.name, child.mime_type.as_deref())
                {
                    counters.skipped_files += 1;
                    debug!(file_id = %child.id, name = %child.name, "Not a media file, skipping");
                    continue;
                }

                let path = sink.generate_pointer(&child, &parent_path).await?;
                counters.pointers += 1;
                if let Some(frame) = stack.last_mut() {
                    frame.pointers_written += 1;
                }
                self.emit(MirrorEvent::PointerWritten {
                    run_id: run_id.to_string(),
                    file_id: child.id,
                    path: path.display().to_string(),
                });
            }
        }

        Ok((root_path, counters))
    }

    /// Fetch the root node and make sure it is a folder.
    async fn resolve_root(&self, run_id: &str, root_id: &str) -> Result<RemoteNode> {
        let provider = self.provider.as_ref();
        let root = with_retry(
            &self.retry_policy,
            |attempt, delay, error| {
                self.report_retry(run_id, "get root folder", root_id, attempt, delay, error)
            },
            || provider.get_node(root_id),
        )
        .await
        .map_err(|failure| remote_error("get root folder", root_id, failure))?;

        if !root.is_folder() {
            return Err(MirrorError::NotFound {
                id: root_id.to_string(),
                message: format!("'{}' is not a folder", root.name),
            });
        }

        debug!(root_id = %root.id, name = %root.name, "Root resolved");
        Ok(root)
    }

    /// List every child of `folder_id`, concatenating all pages.
    async fn list_all(
        &self,
        run_id: &str,
        folder_id: &str,
        counters: &mut WalkCounters,
    ) -> Result<Vec<RemoteNode>> {
        let provider = self.provider.as_ref();
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let token = page_token.clone();
            let (page, next) = with_retry(
                &self.retry_policy,
                |attempt, delay, error| {
                    self.report_retry(run_id, "list children", folder_id, attempt, delay, error)
                },
                || provider.list_children(folder_id, token.clone()),
            )
            .await
            .map_err(|failure| remote_error("list children", folder_id, failure))?;

            counters.pages += 1;
            items.extend(page);

            match next {
                Some(token) if !seen_tokens.insert(token.clone()) => {
                    return Err(MirrorError::Provider {
                        operation: "list children".to_string(),
                        id: folder_id.to_string(),
                        message: format!("page token {token} was returned twice"),
                    });
                }
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(folder_id, count = items.len(), "Listed children");
        Ok(items)
    }

    fn report_retry(
        &self,
        run_id: &str,
        operation: &str,
        id: &str,
        attempt: u32,
        delay: Duration,
        error: &BridgeError,
    ) {
        warn!(
            operation,
            id,
            attempt,
            max_attempts = self.retry_policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Remote call failed, retrying"
        );
        self.emit(MirrorEvent::Retrying {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
            attempt,
            max_attempts: self.retry_policy.max_attempts,
            delay_ms: delay.as_millis() as u64,
            message: error.to_string(),
        });
    }

    fn folder_entered(&self, run_id: &str, folder_id: &str, name: &str, depth: usize, path: &Path) {
        info!(folder = name, depth, path = %path.display(), "Mirroring folder");
        self.emit(MirrorEvent::FolderEntered {
            run_id: run_id.to_string(),
            folder_id: folder_id.to_string(),
            name: name.to_string(),
            depth,
            local_path: path.display().to_string(),
        });
    }

    fn emit(&self, event: MirrorEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event).ok();
        }
    }
}

fn remote_error(operation: &str, id: &str, failure: RetryFailure) -> MirrorError {
    let RetryFailure { attempts, error } = failure;
    if error.is_not_found() {
        MirrorError::NotFound {
            id: id.to_string(),
            message: error.to_string(),
        }
    } else if error.is_transient() {
        MirrorError::RemoteUnavailable {
            operation: operation.to_string(),
            id: id.to_string(),
            attempts,
            message: error.to_string(),
        }
    } else {
        MirrorError::Provider {
            operation: operation.to_string(),
            id: id.to_string(),
            message: error.to_string(),
        }
    }
}
