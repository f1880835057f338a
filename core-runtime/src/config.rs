//! # Mirror Configuration
//!
//! Run settings for one mirror invocation.
//!
//! ## Overview
//!
//! [`MirrorConfig`] is assembled with [`MirrorConfigBuilder`] and validated
//! fail-fast on `build()`, so the walker never starts with a destination it
//! cannot write into or a pointer template that cannot reference a file.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::MirrorConfig;
//!
//! let config = MirrorConfig::builder()
//!     .destination_root("/srv/kodi/library")
//!     .root_name("Movies")
//!     .include_extensions(false)
//!     .build()?;
//! ```
//!
//! ## Validation
//!
//! - the destination root is absolute and an existing directory
//! - a custom root name, when given, is not blank
//! - the pointer template contains the `{id}` placeholder
//! - the retry policy allows at least one attempt

use crate::error::{Error, Result};
use bridge_traits::http::RetryPolicy;
use std::path::{Path, PathBuf};

/// Placeholder substituted with the remote file identifier.
pub const POINTER_ID_PLACEHOLDER: &str = "{id}";

/// Stream reference understood by Kodi's Google Drive add-on.
pub const DEFAULT_POINTER_TEMPLATE: &str =
    "plugin://plugin.googledrive/?action=play&item_id={id}";

/// MIME type prefixes accepted by the default media filter.
pub const DEFAULT_MEDIA_MIME_PREFIXES: &[&str] = &["video/", "audio/"];

/// Extensions accepted by the media filter whatever the MIME type.
pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &[
    "3gp", "avi", "divx", "flv", "iso", "m2ts", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "mts",
    "ogv", "rmvb", "ts", "vob", "webm", "wmv", "aac", "aiff", "alac", "ape", "flac", "m4a", "mka",
    "mp3", "oga", "ogg", "opus", "wav", "wma",
];

/// Decides which remote files become pointer files.
///
/// The default filter is disabled and accepts every file; [`MediaFilter::media`]
/// restricts the mirror to audio and video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFilter {
    /// When false every file is accepted
    pub enabled: bool,
    pub mime_prefixes: Vec<String>,
    /// Lowercase extensions without the leading dot
    pub extensions: Vec<String>,
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            ..Self::media()
        }
    }
}

impl MediaFilter {
    /// Filter that only accepts audio and video files.
    pub fn media() -> Self {
        Self {
            enabled: true,
            mime_prefixes: DEFAULT_MEDIA_MIME_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extensions: DEFAULT_MEDIA_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Filter that accepts every file.
    pub fn all_files() -> Self {
        Self::default()
    }

    /// Returns true if a file with this name and MIME type should be mirrored.
    ///
    /// A known media extension or a media MIME type is enough. Drive reports
    /// many containers (`.mkv`, `.iso`) under `application/*` types, so a
    /// non-media MIME type never overrides the extension.
    pub fn accepts(&self, name: &str, mime_type: Option<&str>) -> bool {
        if !self.enabled || self.has_media_extension(name) {
            return true;
        }

        mime_type
            .map(str::trim)
            .map(|mime| {
                self.mime_prefixes
                    .iter()
                    .any(|prefix| mime.starts_with(prefix.as_str()))
            })
            .unwrap_or(false)
    }

    fn has_media_extension(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|known| *known == ext)
            })
            .unwrap_or(false)
    }
}

/// Settings for one mirror run.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Absolute, existing directory the mirror is written under
    pub destination_root: PathBuf,

    /// Name of the top-level mirrored directory; defaults to the remote root's name
    pub root_name: Option<String>,

    /// Keep the remote file extension in front of `.strm`
    pub include_extensions: bool,

    /// Publish progress events while walking
    pub live_updates: bool,

    pub media_filter: MediaFilter,

    /// Stream reference written into each pointer file
    pub pointer_template: String,

    /// Retry policy for listing and detail calls
    pub retry_policy: RetryPolicy,
}

impl MirrorConfig {
    /// Creates a new builder for constructing a `MirrorConfig`.
    pub fn builder() -> MirrorConfigBuilder {
        MirrorConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.destination_root.as_os_str().is_empty() {
            return Err(Error::Config("Destination root cannot be empty".to_string()));
        }

        if !self.destination_root.is_absolute() {
            return Err(Error::Config(format!(
                "Destination root must be an absolute path: {}",
                self.destination_root.display()
            )));
        }

        if !self.destination_root.is_dir() {
            return Err(Error::Config(format!(
                "Destination root does not exist or is not a directory: {}",
                self.destination_root.display()
            )));
        }

        if let Some(name) = &self.root_name {
            if name.trim().is_empty() {
                return Err(Error::Config(
                    "Root name cannot be blank. Omit it to use the remote folder's name."
                        .to_string(),
                ));
            }
        }

        if !self.pointer_template.contains(POINTER_ID_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "Pointer template must contain the {} placeholder: {}",
                POINTER_ID_PLACEHOLDER, self.pointer_template
            )));
        }

        if self.retry_policy.max_attempts == 0 {
            return Err(Error::Config(
                "Retry policy must allow at least one attempt".to_string(),
            ));
        }

        if self.retry_policy.base_delay > self.retry_policy.max_delay {
            return Err(Error::Config(
                "Retry base delay cannot exceed the maximum delay".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`MirrorConfig`].
#[derive(Debug, Default)]
pub struct MirrorConfigBuilder {
    destination_root: Option<PathBuf>,
    root_name: Option<String>,
    include_extensions: Option<bool>,
    live_updates: Option<bool>,
    media_filter: Option<MediaFilter>,
    pointer_template: Option<String>,
    retry_policy: Option<RetryPolicy>,
}

impl MirrorConfigBuilder {
    /// Sets the directory the mirror is written under (required).
    pub fn destination_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.destination_root = Some(path.into());
        self
    }

    /// Overrides the name of the top-level mirrored directory.
    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = Some(name.into());
        self
    }

    /// Same as [`root_name`](Self::root_name) for values that may be absent.
    pub fn maybe_root_name(mut self, name: Option<String>) -> Self {
        self.root_name = name;
        self
    }

    /// Keep (`true`, default) or strip the remote extension.
    pub fn include_extensions(mut self, include: bool) -> Self {
        self.include_extensions = Some(include);
        self
    }

    /// Enable (default) or disable progress events.
    pub fn live_updates(mut self, enabled: bool) -> Self {
        self.live_updates = Some(enabled);
        self
    }

    /// Mirror only media files, or every file (default).
    pub fn media_only(mut self, media_only: bool) -> Self {
        self.media_filter = Some(if media_only {
            MediaFilter::media()
        } else {
            MediaFilter::all_files()
        });
        self
    }

    pub fn media_filter(mut self, filter: MediaFilter) -> Self {
        self.media_filter = Some(filter);
        self
    }

    pub fn pointer_template(mut self, template: impl Into<String>) -> Self {
        self.pointer_template = Some(template.into());
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<MirrorConfig> {
        let destination_root = self.destination_root.ok_or_else(|| {
            Error::Config(
                "Destination root is required. Use .destination_root() to set it.".to_string(),
            )
        })?;

        let config = MirrorConfig {
            destination_root,
            root_name: self.root_name,
            include_extensions: self.include_extensions.unwrap_or(true),
            live_updates: self.live_updates.unwrap_or(true),
            media_filter: self.media_filter.unwrap_or_default(),
            pointer_template: self
                .pointer_template
                .unwrap_or_else(|| DEFAULT_POINTER_TEMPLATE.to_string()),
            retry_policy: self.retry_policy.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn destination() -> TempDir {
        TempDir::new().unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let dest = destination();
        let config = MirrorConfig::builder()
            .destination_root(dest.path())
            .build()
            .unwrap();

        assert_eq!(config.destination_root, dest.path());
        assert_eq!(config.root_name, None);
        assert!(config.include_extensions);
        assert!(config.live_updates);
        assert!(!config.media_filter.enabled);
        assert!(config.media_filter.accepts("notes.txt", Some("text/plain")));
        assert_eq!(config.pointer_template, DEFAULT_POINTER_TEMPLATE);
        assert_eq!(config.retry_policy, RetryPolicy::default());
    }

    #[test]
    fn test_builder_requires_destination() {
        let err = MirrorConfig::builder().build().unwrap_err();
        assert!(err.to_string().contains("Destination root is required"));
    }

    #[test]
    fn test_validate_rejects_relative_destination() {
        let err = MirrorConfig::builder()
            .destination_root("library/movies")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn test_validate_rejects_missing_destination() {
        let dest = destination();
        let err = MirrorConfig::builder()
            .destination_root(dest.path().join("missing"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_validate_rejects_file_destination() {
        let dest = destination();
        let file = dest.path().join("library.txt");
        std::fs::write(&file, "x").unwrap();

        let err = MirrorConfig::builder()
            .destination_root(&file)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_validate_rejects_blank_root_name() {
        let dest = destination();
        let err = MirrorConfig::builder()
            .destination_root(dest.path())
            .root_name("   ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Root name cannot be blank"));
    }

    #[test]
    fn test_validate_rejects_template_without_placeholder() {
        let dest = destination();
        let err = MirrorConfig::builder()
            .destination_root(dest.path())
            .pointer_template("plugin://plugin.googledrive/?action=play")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("{id}"));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let dest = destination();
        let err = MirrorConfig::builder()
            .destination_root(dest.path())
            .retry_policy(RetryPolicy::immediate(0))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("at least one attempt"));
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let dest = destination();
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(1),
            use_exponential_backoff: true,
        };
        let err = MirrorConfig::builder()
            .destination_root(dest.path())
            .retry_policy(policy)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("base delay"));
    }

    #[test]
    fn test_maybe_root_name() {
        let dest = destination();
        let config = MirrorConfig::builder()
            .destination_root(dest.path())
            .maybe_root_name(Some("Films".to_string()))
            .build()
            .unwrap();
        assert_eq!(config.root_name.as_deref(), Some("Films"));
    }

    #[test]
    fn test_media_filter_by_mime_type() {
        let filter = MediaFilter::media();
        assert!(filter.accepts("movie.bin", Some("video/x-matroska")));
        assert!(filter.accepts("track", Some("audio/flac")));
        assert!(!filter.accepts("poster.jpg", Some("image/jpeg")));
        assert!(!filter.accepts("notes.txt", Some("text/plain")));
    }

    #[test]
    fn test_media_extension_wins_over_application_mime_type() {
        let filter = MediaFilter::media();
        assert!(filter.accepts("disc.iso", Some("application/x-iso9660-image")));
        assert!(filter.accepts("movie.mkv", Some("application/x-matroska")));
        assert!(filter.accepts("Movie.MKV", None));
        assert!(filter.accepts("Movie.mkv", Some("application/octet-stream")));
        assert!(!filter.accepts("readme", None));
        assert!(!filter.accepts("subs.srt", Some("application/octet-stream")));
    }

    #[test]
    fn test_all_files_filter() {
        let filter = MediaFilter::all_files();
        assert!(filter.accepts("subs.srt", Some("application/x-subrip")));
        assert!(filter.accepts("readme", None));
    }

    #[test]
    fn test_media_only_builder_switch() {
        let dest = destination();
        let config = MirrorConfig::builder()
            .destination_root(dest.path())
            .media_only(true)
            .build()
            .unwrap();
        assert!(config.media_filter.enabled);
        assert!(!config.media_filter.accepts("notes.txt", Some("text/plain")));
    }
}
