//! # Host Bridge Traits
//!
//! Capability traits the mirror core depends on but does not implement.
//!
//! ## Traits
//!
//! - [`StorageProvider`](storage::StorageProvider) - paginated listing and
//!   detail fetch of a remote folder hierarchy
//! - [`FileSystemAccess`](storage::FileSystemAccess) - local directory and
//!   file creation for the mirror builder
//! - [`HttpClient`](http::HttpClient) - single-shot HTTP transport used by
//!   storage providers
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to a host
//!
//! Desktop implementations of the local traits live in `bridge-desktop`; the
//! Google Drive `StorageProvider` lives in `provider-google-drive`.
//!
//! ## Error Handling
//!
//! All traits report failures with [`BridgeError`](error::BridgeError).
//! Remote implementations must classify failures so callers can decide
//! whether to retry:
//!
//! - `NotFound` - the item does not exist; never retried
//! - `Transient` - timeouts, 5xx, rate limits; retried with backoff
//! - `OperationFailed` - everything else; fatal
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` so implementations can be shared behind
//! `Arc` across async tasks.

pub mod error;
pub mod http;
pub mod logging;
pub mod storage;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use storage::{FileSystemAccess, RemoteKind, RemoteNode, StorageProvider};
