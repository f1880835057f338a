//! strm-mirror
//!
//! Mirrors a Google Drive folder tree onto the local filesystem as Kodi
//! `.strm` pointer files. The binary in `main.rs` is a thin CLI over the
//! workspace crates re-exported here.

pub mod cli;
pub mod progress;

pub use bridge_desktop;
pub use bridge_traits;
pub use core_mirror;
pub use core_runtime;
pub use core_service;
pub use provider_google_drive;
