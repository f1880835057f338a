//! Async filesystem helpers re-exported from the underlying runtime.
//!
//! The desktop filesystem bridge goes through these re-exports so that it
//! stays on the same runtime as the rest of the workspace.

pub use tokio::fs::{create_dir_all, write};
