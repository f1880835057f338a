//! Google Drive API connector implementation
//!
//! Implements the `StorageProvider` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::{RemoteKind, RemoteNode, StorageProvider};
use core_runtime::logging::redact_if_sensitive;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::GoogleDriveError;
use crate::types::{
    ApiErrorResponse, DriveFile, DrivesListResponse, FilesListResponse, SharedDrive,
    FOLDER_MIME_TYPE,
};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Maximum shared drives per drives.list page
const MAX_DRIVES_PAGE_SIZE: u32 = 100;

/// Fields to request for file resources
const FILE_FIELDS: &str =
    "id,name,mimeType,size,parents,trashed,shortcutDetails(targetId,targetMimeType)";

/// Alias Drive accepts for the user's own "My Drive" root folder
pub const MY_DRIVE_ID: &str = "root";

/// Display name of the "My Drive" root
pub const MY_DRIVE_NAME: &str = "My Drive";

/// Reasons Drive attaches to 403 responses that are really rate limits
const RATE_LIMIT_REASONS: &[&str] = &["rateLimitExceeded", "userRateLimitExceeded"];

/// Google Drive API connector
///
/// Every method issues exactly one HTTP request (drives.list pages aside) and
/// classifies failures for the walker's retry loop: 404 becomes
/// `BridgeError::NotFound`, 429/5xx and rate-limit 403s become
/// `BridgeError::Transient`, everything else is a non-retryable
/// `BridgeError::OperationFailed`.
///
/// Shared drive content is included (`supportsAllDrives`,
/// `includeItemsFromAllDrives`), and shortcuts are reported as their target.
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::storage::StorageProvider;
///
/// let connector = GoogleDriveConnector::new(http_client, access_token);
/// let (children, next_page) = connector.list_children("root", None).await?;
/// ```
pub struct GoogleDriveConnector {
    http_client: Arc<dyn HttpClient>,

    /// OAuth 2.0 access token with a `drive.readonly` (or wider) scope
    access_token: String,

    request_timeout: Duration,
}

impl GoogleDriveConnector {
    /// Create a new Google Drive connector
    pub fn new(http_client: Arc<dyn HttpClient>, access_token: impl Into<String>) -> Self {
        Self {
            http_client,
            access_token: access_token.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Override the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn request(&self, url: String) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(self.access_token.as_str())
            .header("Accept", "application/json")
            .timeout(self.request_timeout)
    }

    /// Drive's query language quotes string literals with `'`.
    fn quote(value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }

    fn children_url(folder_id: &str, page_token: Option<&str>) -> String {
        let query = format!("{} in parents and trashed=false", Self::quote(folder_id));
        let mut url = format!(
            "{}/files?q={}&pageSize={}&supportsAllDrives=true&includeItemsFromAllDrives=true&fields={}",
            DRIVE_API_BASE,
            urlencoding::encode(&query),
            MAX_PAGE_SIZE,
            urlencoding::encode(&format!("nextPageToken,files({})", FILE_FIELDS)),
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        url
    }

    fn file_url(file_id: &str) -> String {
        format!(
            "{}/files/{}?supportsAllDrives=true&fields={}",
            DRIVE_API_BASE,
            urlencoding::encode(file_id),
            urlencoding::encode(FILE_FIELDS)
        )
    }

    fn drive_url(drive_id: &str) -> String {
        format!(
            "{}/drives/{}?fields=id,name",
            DRIVE_API_BASE,
            urlencoding::encode(drive_id)
        )
    }

    fn drives_url(page_token: Option<&str>) -> String {
        let mut url = format!(
            "{}/drives?pageSize={}&fields={}",
            DRIVE_API_BASE,
            MAX_DRIVES_PAGE_SIZE,
            urlencoding::encode("nextPageToken,drives(id,name)")
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        url
    }

    /// Map a non-2xx response onto the provider error taxonomy.
    ///
    /// `subject` names the item the request was about; it ends up in
    /// `FileNotFound` so callers can report which id was missing.
    fn classify_status(response: &HttpResponse, subject: &str) -> GoogleDriveError {
        let status = response.status;
        let parsed = ApiErrorResponse::parse(&response.body);
        let message = parsed
            .as_ref()
            .map(|e| e.error.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| response.text());

        match status {
            401 => GoogleDriveError::AuthenticationFailed(message),
            404 => GoogleDriveError::FileNotFound {
                file_id: subject.to_string(),
            },
            429 => GoogleDriveError::RateLimitExceeded {
                status_code: status,
                message,
            },
            403 if parsed
                .as_ref()
                .is_some_and(|e| RATE_LIMIT_REASONS.iter().any(|r| e.has_reason(r))) =>
            {
                GoogleDriveError::RateLimitExceeded {
                    status_code: status,
                    message,
                }
            }
            500..=599 => GoogleDriveError::ServerError {
                status_code: status,
                message,
            },
            _ => GoogleDriveError::ApiError {
                status_code: status,
                message,
            },
        }
    }

    /// Execute one GET request and decode the JSON body.
    #[instrument(skip_all, fields(subject = %subject))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        subject: &str,
    ) -> std::result::Result<T, GoogleDriveError> {
        let response = self.http_client.execute(self.request(url)).await?;

        if !response.is_success() {
            let error = Self::classify_status(&response, subject);
            if error.is_transient() {
                warn!(status = response.status, error = %error, "Drive request failed, may retry");
            } else {
                debug!(status = response.status, error = %error, "Drive request failed");
            }
            return Err(error);
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse response for {}: {}", subject, e))
        })
    }

    /// Convert a Drive file resource into a `RemoteNode`.
    ///
    /// Shortcuts take the identity and kind of their target so that a
    /// shortcut to a folder is expanded (and de-duplicated) as that folder.
    fn convert_file(drive_file: DriveFile) -> RemoteNode {
        let (id, mime_type) = match (drive_file.is_shortcut(), drive_file.shortcut_details) {
            (true, Some(details)) => (details.target_id, details.target_mime_type),
            _ => (drive_file.id, Some(drive_file.mime_type)),
        };

        let kind = if mime_type.as_deref() == Some(FOLDER_MIME_TYPE) {
            RemoteKind::Folder
        } else {
            RemoteKind::File
        };

        let mut node = match kind {
            RemoteKind::Folder => RemoteNode::folder(id, drive_file.name),
            RemoteKind::File => RemoteNode::file(id, drive_file.name),
        }
        .with_parents(drive_file.parents);

        if let Some(mime_type) = mime_type.filter(|_| kind == RemoteKind::File) {
            node = node.with_mime_type(mime_type);
        }
        if let Some(size) = drive_file.size.and_then(|s| s.parse().ok()) {
            node = node.with_size(size);
        }

        node
    }

    fn convert_drive(drive: SharedDrive) -> RemoteNode {
        RemoteNode::folder(drive.id, drive.name)
    }
}

impl fmt::Debug for GoogleDriveConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleDriveConnector")
            .field(
                "access_token",
                &redact_if_sensitive("access_token", &self.access_token),
            )
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[async_trait]
impl StorageProvider for GoogleDriveConnector {
    #[instrument(skip_all, fields(folder_id = %folder_id, paged = page_token.is_some()))]
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<String>,
    ) -> Result<(Vec<RemoteNode>, Option<String>)> {
        let url = Self::children_url(folder_id, page_token.as_deref());
        let page: FilesListResponse = self.get_json(url, folder_id).await?;

        let children: Vec<RemoteNode> = page
            .files
            .into_iter()
            .filter(|f| !f.trashed)
            .map(Self::convert_file)
            .collect();

        debug!(
            count = children.len(),
            has_more = page.next_page_token.is_some(),
            "Listed folder page"
        );

        Ok((children, page.next_page_token))
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn get_node(&self, id: &str) -> Result<RemoteNode> {
        match self.get_json::<DriveFile>(Self::file_url(id), id).await {
            Ok(file) => Ok(Self::convert_file(file)),
            Err(GoogleDriveError::FileNotFound { .. }) => {
                // Shared drive ids are not always visible through files.get
                debug!("Not a file id, trying shared drives");
                let drive: SharedDrive = self.get_json(Self::drive_url(id), id).await?;
                Ok(Self::convert_drive(drive))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list_top_level_containers(&self) -> Result<Vec<RemoteNode>> {
        let mut containers = vec![RemoteNode::folder(MY_DRIVE_ID, MY_DRIVE_NAME)];
        let mut page_token: Option<String> = None;

        loop {
            let url = Self::drives_url(page_token.as_deref());
            let page: DrivesListResponse = self.get_json(url, "drives").await?;
            containers.extend(page.drives.into_iter().map(Self::convert_drive));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = containers.len(), "Listed top-level containers");
        Ok(containers)
    }
}
