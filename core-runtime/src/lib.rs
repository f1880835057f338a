//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the mirror crates:
//! - Logging and tracing setup
//! - Run configuration (`MirrorConfig`)
//! - Progress event bus
//!
//! ## Overview
//!
//! Nothing in here talks to the network or touches the mirror tree. The
//! walker, the service facade and the CLI all build on these pieces so that
//! logging conventions, validation rules and progress events stay the same
//! across entry points.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{MirrorConfig, MirrorConfigBuilder, DEFAULT_POINTER_TEMPLATE};
pub use error::{Error, Result};
pub use events::{EventBus, EventStream, MirrorEvent};
