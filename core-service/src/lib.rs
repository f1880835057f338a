//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (remote storage,
//! filesystem) into the mirror core. Desktop hosts enable the `desktop-shims`
//! feature, which builds the Google Drive provider on top of `bridge-desktop`.
//!
//! A run has two steps: pick a root folder ([`CoreService::resolve_root`])
//! and mirror it ([`CoreService::mirror`]).

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::storage::{FileSystemAccess, RemoteNode, StorageProvider};
use core_mirror::{LocalMirrorBuilder, TreeWalker, WalkSummary};
use core_runtime::config::MirrorConfig;
use core_runtime::events::{EventBus, EventStream, DEFAULT_EVENT_BUFFER_SIZE};
use tracing::{debug, info};

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub storage: Arc<dyn StorageProvider>,
    pub filesystem: Arc<dyn FileSystemAccess>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(storage: Arc<dyn StorageProvider>, filesystem: Arc<dyn FileSystemAccess>) -> Self {
        Self {
            storage,
            filesystem,
        }
    }
}

/// Picks one of the top-level containers when no root id was given.
pub trait RootChooser: Send + Sync {
    /// Index into `containers` of the chosen root, or `None` if the user
    /// declined to choose.
    fn choose(&self, containers: &[RemoteNode]) -> Result<Option<usize>>;
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    deps: Arc<CoreDependencies>,
    event_bus: EventBus,
}

impl CoreService {
    /// Create a new service from the provided dependencies.
    pub fn new(deps: CoreDependencies) -> Self {
        Self {
            deps: Arc::new(deps),
            event_bus: EventBus::new(DEFAULT_EVENT_BUFFER_SIZE),
        }
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    /// Subscribe to progress events of subsequent runs.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    /// Top-level containers the user can pick a root from.
    pub async fn list_roots(&self) -> Result<Vec<RemoteNode>> {
        Ok(self.deps.storage.list_top_level_containers().await?)
    }

    /// Identifier of the root folder to mirror.
    ///
    /// An explicit `source` id is used as is and checked later by the walk;
    /// otherwise the top-level containers are listed and `chooser` picks one.
    pub async fn resolve_root(
        &self,
        source: Option<&str>,
        chooser: &dyn RootChooser,
    ) -> Result<String> {
        if let Some(id) = source.map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }

        let containers = self.list_roots().await?;
        if containers.is_empty() {
            return Err(CoreError::RootSelection(
                "No drives are available to this account".to_string(),
            ));
        }
        debug!(count = containers.len(), "Listed top-level containers");

        let index = chooser
            .choose(&containers)?
            .ok_or_else(|| CoreError::RootSelection("No drive selected".to_string()))?;
        let chosen = containers.get(index).ok_or_else(|| {
            CoreError::RootSelection(format!(
                "Selection {} is out of range (0..{})",
                index,
                containers.len()
            ))
        })?;

        info!(root_id = %chosen.id, name = %chosen.name, "Root selected");
        Ok(chosen.id.clone())
    }

    /// Mirror `root_id` as described by `config`.
    ///
    /// The configuration is validated before any remote call is made.
    pub async fn mirror(&self, root_id: &str, config: &MirrorConfig) -> Result<WalkSummary> {
        config.validate()?;

        let walker = TreeWalker::from_config(
            Arc::clone(&self.deps.storage),
            config,
            Some(self.event_bus.clone()),
        );
        let builder = LocalMirrorBuilder::from_config(Arc::clone(&self.deps.filesystem), config);

        let summary = walker
            .walk(
                root_id,
                &config.destination_root,
                config.root_name.as_deref(),
                &builder,
            )
            .await?;
        Ok(summary)
    }
}

/// Convenience bootstrapper for desktop hosts: Google Drive over reqwest,
/// writing through tokio's filesystem.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_service::bootstrap_desktop;
///
/// let core = bootstrap_desktop("ya29.token")?;
/// let roots = core.list_roots().await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(access_token: &str) -> Result<CoreService> {
    use bridge_desktop::{ReqwestHttpClient, TokioFileSystem};
    use provider_google_drive::GoogleDriveConnector;

    if access_token.trim().is_empty() {
        return Err(CoreError::InitializationFailed(
            "An access token is required".to_string(),
        ));
    }

    let http = ReqwestHttpClient::new()
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    let storage = GoogleDriveConnector::new(Arc::new(http), access_token);

    Ok(CoreService::new(CoreDependencies::new(
        Arc::new(storage),
        Arc::new(TokioFileSystem::new()),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_desktop::TokioFileSystem;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::RetryPolicy;
    use core_mirror::MirrorError;
    use mockall::mock;
    use tempfile::TempDir;

    mock! {
        Provider {}

        #[async_trait]
        impl StorageProvider for Provider {
            async fn list_children(
                &self,
                folder_id: &str,
                page_token: Option<String>,
            ) -> bridge_traits::error::Result<(Vec<RemoteNode>, Option<String>)>;
            async fn get_node(&self, id: &str) -> bridge_traits::error::Result<RemoteNode>;
            async fn list_top_level_containers(&self) -> bridge_traits::error::Result<Vec<RemoteNode>>;
        }
    }

    struct Pick(Option<usize>);

    impl RootChooser for Pick {
        fn choose(&self, _containers: &[RemoteNode]) -> Result<Option<usize>> {
            Ok(self.0)
        }
    }

    fn service(provider: MockProvider) -> CoreService {
        CoreService::new(CoreDependencies::new(
            Arc::new(provider),
            Arc::new(TokioFileSystem::new()),
        ))
    }

    fn drives() -> Vec<RemoteNode> {
        vec![
            RemoteNode::folder("root", "My Drive"),
            RemoteNode::folder("0AbC", "Team Movies"),
        ]
    }

    #[core_async::test]
    async fn test_explicit_source_skips_listing() {
        let mut provider = MockProvider::new();
        provider.expect_list_top_level_containers().never();

        let id = service(provider)
            .resolve_root(Some(" 1xYz "), &Pick(None))
            .await
            .unwrap();

        assert_eq!(id, "1xYz");
    }

    #[core_async::test]
    async fn test_chooser_picks_container() {
        let mut provider = MockProvider::new();
        provider
            .expect_list_top_level_containers()
            .times(1)
            .returning(|| Ok(drives()));

        let id = service(provider)
            .resolve_root(None, &Pick(Some(1)))
            .await
            .unwrap();

        assert_eq!(id, "0AbC");
    }

    #[core_async::test]
    async fn test_declined_or_invalid_selection() {
        let mut provider = MockProvider::new();
        provider
            .expect_list_top_level_containers()
            .returning(|| Ok(drives()));
        let service = service(provider);

        let declined = service.resolve_root(None, &Pick(None)).await.unwrap_err();
        assert!(matches!(declined, CoreError::RootSelection(_)));

        let out_of_range = service.resolve_root(None, &Pick(Some(7))).await.unwrap_err();
        assert!(out_of_range.to_string().contains("out of range"));
    }

    #[core_async::test]
    async fn test_no_containers() {
        let mut provider = MockProvider::new();
        provider
            .expect_list_top_level_containers()
            .returning(|| Ok(Vec::new()));

        let error = service(provider)
            .resolve_root(None, &Pick(Some(0)))
            .await
            .unwrap_err();

        assert!(matches!(error, CoreError::RootSelection(_)));
    }

    #[core_async::test]
    async fn test_listing_failure_is_reported() {
        let mut provider = MockProvider::new();
        provider
            .expect_list_top_level_containers()
            .returning(|| Err(BridgeError::OperationFailed("401".to_string())));

        let error = service(provider)
            .resolve_root(None, &Pick(Some(0)))
            .await
            .unwrap_err();

        assert!(matches!(error, CoreError::Remote(_)));
    }

    #[core_async::test]
    async fn test_mirror_rejects_invalid_config_before_remote_calls() {
        let mut provider = MockProvider::new();
        provider.expect_get_node().never();

        let config = MirrorConfig {
            destination_root: "/definitely/not/here".into(),
            root_name: None,
            include_extensions: true,
            live_updates: true,
            media_filter: Default::default(),
            pointer_template: core_runtime::config::DEFAULT_POINTER_TEMPLATE.to_string(),
            retry_policy: RetryPolicy::default(),
        };

        let error = service(provider).mirror("root", &config).await.unwrap_err();
        assert!(matches!(error, CoreError::Config(_)));
    }

    #[core_async::test]
    async fn test_mirror_writes_tree_and_publishes_events() {
        let temp = TempDir::new().unwrap();
        let mut provider = MockProvider::new();
        provider
            .expect_get_node()
            .returning(|id| Ok(RemoteNode::folder(id, "My Drive")));
        provider.expect_list_children().returning(|_, _| {
            Ok((
                vec![RemoteNode::file("f1", "Film.mkv").with_mime_type("video/x-matroska")],
                None,
            ))
        });

        let service = service(provider);
        let mut events = service.subscribe();
        let config = MirrorConfig::builder()
            .destination_root(temp.path())
            .build()
            .unwrap();

        let summary = service.mirror("root", &config).await.unwrap();

        assert_eq!(summary.pointers, 1);
        assert!(temp.path().join("My Drive/Film.mkv.strm").is_file());

        let first = events.try_recv().unwrap().unwrap();
        assert_eq!(first.description(), "Mirror started");
    }

    #[core_async::test]
    async fn test_mirror_propagates_walk_errors() {
        let temp = TempDir::new().unwrap();
        let mut provider = MockProvider::new();
        provider
            .expect_get_node()
            .returning(|id| Err(BridgeError::NotFound(id.to_string())));

        let config = MirrorConfig::builder()
            .destination_root(temp.path())
            .build()
            .unwrap();

        let error = service(provider).mirror("gone", &config).await.unwrap_err();
        assert!(matches!(
            error,
            CoreError::Mirror(MirrorError::NotFound { .. })
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_bootstrap_requires_token() {
        assert!(matches!(
            bootstrap_desktop("  "),
            Err(CoreError::InitializationFailed(_))
        ));
    }
}
