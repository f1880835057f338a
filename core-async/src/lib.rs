//! Async runtime facade for the strm-mirror workspace.
//!
//! Every other crate reaches the executor through this crate instead of
//! depending on Tokio directly, so the runtime choice lives in one place.
//!
//! # Modules
//!
//! - `runtime`: runtime handles and a blocking entry point
//! - `task`: task spawning
//! - `time`: sleeping and timeouts (used by the retry backoff)
//! - `sync`: async-aware locks and the broadcast channel behind the event bus
//! - `fs`: async filesystem operations used by the desktop bridge
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, Duration};
//!
//! async fn backoff(attempt: u32) {
//!     sleep(Duration::from_millis(100 * 2u64.pow(attempt))).await;
//! }
//! ```

// Entry-point/test macros, so downstream crates never need a direct Tokio
// dependency for `main` or tests.
pub use core_async_macros::{main, test};

pub mod fs;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
