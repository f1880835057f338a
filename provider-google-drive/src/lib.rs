//! # Google Drive Provider
//!
//! Implements the `StorageProvider` trait for Google Drive API v3.
//!
//! ## Overview
//!
//! This crate provides:
//! - Paginated folder listing across My Drive and shared drives
//! - Item lookup by id, including shared drive roots
//! - Shortcut resolution to the shortcut's target
//! - Status classification for the caller's retry loop
//!
//! Authentication is not handled here; the connector is given a ready
//! OAuth 2.0 access token.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{GoogleDriveConnector, MY_DRIVE_ID, MY_DRIVE_NAME};
pub use error::{GoogleDriveError, Result};
