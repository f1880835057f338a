//! Synchronization primitives.
//!
//! Async-aware locks and channels. The event bus in `core-runtime` is built on
//! [`broadcast`]; test fakes use [`Mutex`] to record calls.

pub use tokio::sync::{broadcast, mpsc, oneshot, Mutex, MutexGuard, RwLock};
