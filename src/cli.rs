//! Command-line surface of `strm-mirror`.

use std::path::{Path, PathBuf};

use bridge_traits::storage::RemoteNode;
use clap::{ArgAction, Parser};
use core_runtime::config::{MirrorConfig, DEFAULT_POINTER_TEMPLATE};
use core_service::{CoreError, RootChooser};

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Mirror a Google Drive folder as Kodi `.strm` pointer files.
#[derive(Parser, Debug, Clone)]
#[command(name = "strm-mirror", disable_version_flag = true)]
pub struct Args {
    /// Folder ID of the source directory on Google Drive
    ///
    /// When omitted, the drives of the account are listed to pick from.
    #[arg(long)]
    pub source: Option<String>,

    /// Directory the mirror is written into (defaults to the current directory)
    #[arg(long = "dest", visible_alias = "destination", value_name = "PATH")]
    pub destination: Option<PathBuf>,

    /// Custom name for the mirrored root directory
    #[arg(long = "root", visible_alias = "rootname", value_name = "NAME")]
    pub root_name: Option<String>,

    /// Drop the original extension from generated pointer files
    #[arg(long = "no-ext", visible_alias = "no-extensions")]
    pub no_extensions: bool,

    /// Show live progress while mirroring (default)
    #[arg(long, overrides_with = "no_updates")]
    pub updates: bool,

    /// Disable live progress
    #[arg(long, overrides_with = "updates")]
    pub no_updates: bool,

    /// Only create pointers for audio and video files
    #[arg(long)]
    pub media_only: bool,

    /// Stream reference written into pointer files; `{id}` is replaced by the file ID
    #[arg(long, value_name = "TEMPLATE", default_value = DEFAULT_POINTER_TEMPLATE)]
    pub pointer_template: String,

    /// OAuth access token for the Drive API
    #[arg(long, env = "STRM_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Raw tracing filter, overrides -v
    #[arg(long, env = "STRM_LOG", hide = true)]
    pub log_filter: Option<String>,

    /// Display the app version and platform
    #[arg(long)]
    pub version: bool,
}

impl Args {
    pub fn live_updates(&self) -> bool {
        !self.no_updates
    }

    /// Validated mirror configuration for these arguments.
    ///
    /// `cwd` stands in for the current directory when no destination is given
    /// and anchors relative destinations.
    pub fn mirror_config(&self, cwd: &Path) -> Result<MirrorConfig, CoreError> {
        let destination = resolve_destination(self.destination.as_deref(), cwd)?;

        Ok(MirrorConfig::builder()
            .destination_root(destination)
            .maybe_root_name(self.root_name.clone())
            .include_extensions(!self.no_extensions)
            .live_updates(self.live_updates())
            .media_only(self.media_only)
            .pointer_template(self.pointer_template.clone())
            .build()?)
    }
}

/// Absolute path of an existing destination directory.
pub fn resolve_destination(destination: Option<&Path>, cwd: &Path) -> Result<PathBuf, CoreError> {
    let path = match destination {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => cwd.to_path_buf(),
    };

    if !path.is_dir() {
        return Err(CoreError::InitializationFailed(format!(
            "invalid destination: {} is not an existing directory",
            path.display()
        )));
    }
    Ok(path)
}

/// Text printed by `--version`.
pub fn version_report() -> String {
    format!(
        "{} v{}\n- os/family: {}\n- os/type: {}\n- os/arch: {}\n",
        APP_NAME,
        APP_VERSION,
        std::env::consts::FAMILY,
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}

/// Terminal prompt over the account's drives.
pub struct PromptChooser;

impl RootChooser for PromptChooser {
    fn choose(&self, containers: &[RemoteNode]) -> Result<Option<usize>, CoreError> {
        let names: Vec<&str> = containers.iter().map(|node| node.name.as_str()).collect();

        dialoguer::Select::new()
            .with_prompt("Select a drive to mirror")
            .items(&names)
            .default(0)
            .interact_opt()
            .map_err(|e| CoreError::RootSelection(format!("Failed to get user input: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("strm-mirror").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert!(args.source.is_none());
        assert!(args.live_updates());
        assert!(!args.no_extensions);
        assert!(!args.media_only);
        assert_eq!(args.pointer_template, DEFAULT_POINTER_TEMPLATE);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_aliases() {
        let args = parse(&[
            "--source",
            "1AbC",
            "--destination",
            "/srv/kodi",
            "--rootname",
            "Films",
            "--no-extensions",
        ]);
        assert_eq!(args.source.as_deref(), Some("1AbC"));
        assert_eq!(args.destination, Some(PathBuf::from("/srv/kodi")));
        assert_eq!(args.root_name.as_deref(), Some("Films"));
        assert!(args.no_extensions);

        let short = parse(&["--dest", "/srv", "--root", "X", "--no-ext"]);
        assert_eq!(short.destination, Some(PathBuf::from("/srv")));
        assert!(short.no_extensions);
    }

    #[test]
    fn test_updates_toggle_last_one_wins() {
        assert!(!parse(&["--no-updates"]).live_updates());
        assert!(parse(&["--no-updates", "--updates"]).live_updates());
        assert!(!parse(&["--updates", "--no-updates"]).live_updates());
    }

    #[test]
    fn test_verbosity_count() {
        assert_eq!(parse(&["-vv"]).verbose, 2);
    }

    #[test]
    fn test_relative_destination_is_made_absolute() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("library")).unwrap();

        let path = resolve_destination(Some(Path::new("library")), temp.path()).unwrap();
        assert_eq!(path, temp.path().join("library"));
        assert!(path.is_absolute());

        let cwd = resolve_destination(None, temp.path()).unwrap();
        assert_eq!(cwd, temp.path());
    }

    #[test]
    fn test_missing_destination_is_rejected() {
        let temp = TempDir::new().unwrap();
        let error = resolve_destination(Some(Path::new("nope")), temp.path()).unwrap_err();
        assert!(error.to_string().contains("invalid destination"));
    }

    #[test]
    fn test_mirror_config_from_args() {
        let temp = TempDir::new().unwrap();
        let args = parse(&["--no-ext", "--no-updates", "--media-only", "--root", "Kodi"]);

        let config = args.mirror_config(temp.path()).unwrap();

        assert_eq!(config.destination_root, temp.path());
        assert_eq!(config.root_name.as_deref(), Some("Kodi"));
        assert!(!config.include_extensions);
        assert!(!config.live_updates);
        assert!(config.media_filter.enabled);
    }

    #[test]
    fn test_default_run_keeps_non_media_files() {
        let temp = TempDir::new().unwrap();
        let config = parse(&[]).mirror_config(temp.path()).unwrap();

        assert!(!config.media_filter.enabled);
        assert!(config.media_filter.accepts("notes.txt", Some("text/plain")));
    }

    #[test]
    fn test_bad_template_is_rejected() {
        let temp = TempDir::new().unwrap();
        let args = parse(&["--pointer-template", "http://example.invalid/stream"]);

        assert!(matches!(
            args.mirror_config(temp.path()),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_version_report() {
        let report = version_report();
        assert!(report.starts_with(&format!("strm-mirror v{}", APP_VERSION)));
        assert!(report.contains("- os/arch: "));
    }
}
