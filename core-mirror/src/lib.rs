//! # Core Mirror
//!
//! Mirrors a remote folder graph as a local tree of `.strm` pointer files.
//!
//! - [`walker`]: depth-first traversal with pagination, retry and revisit protection
//! - [`builder`]: the [`MirrorSink`] trait and its local filesystem implementation
//! - [`naming`]: path segment sanitization and pointer file names
//! - [`retry`]: bounded retry of transient remote failures

pub mod builder;
pub mod error;
pub mod naming;
pub mod retry;
pub mod walker;

pub use builder::{LocalMirrorBuilder, MirrorSink};
pub use error::{MirrorError, Result};
pub use naming::{pointer_file_name, sanitize_segment, POINTER_EXTENSION};
pub use walker::{TreeWalker, VisitedSet, WalkSummary};
