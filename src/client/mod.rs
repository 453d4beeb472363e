//! Remote service access
//!
//! Each remote operation the workflow needs is its own trait so every step can be
//! exercised against a stub. [`HttpClient`] implements all of them against the
//! Artifactory REST API.
//!
//! ## Capabilities
//!
//! - [`BundleCreationApi`]: start a support bundle job
//! - [`BundleStatusApi`]: read the job status
//! - [`BundleDownloadApi`]: stream the finished archive
//! - [`BundleUploadApi`]: push a local file into a repository
//!
//! [`RemoteService`] is the union of the four and is blanket-implemented.

mod http;

pub use http::{HttpClient, HttpConnector};

use crate::config::ServerProfile;
use crate::error::{Error, Result};
use crate::types::{BundleId, CaseNumber, CreationOptions};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Status and fully buffered body of a response
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Response body
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Build a response from a status and body
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Streaming response body, owned by whoever holds it
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Status and streaming body of an archive download
pub struct DownloadResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Archive bytes; dropping it releases the connection
    pub body: ByteStream,
}

impl std::fmt::Debug for DownloadResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Where a service lives
pub trait Endpoint: Send + Sync {
    /// Base URL, always ending with `/`
    fn base_url(&self) -> &str;
}

/// Creates support bundles
#[async_trait]
pub trait BundleCreationApi: Endpoint {
    /// Submit a creation request
    async fn create_bundle(&self, options: &CreationOptions) -> Result<RawResponse>;
}

/// Reports support bundle status
#[async_trait]
pub trait BundleStatusApi: Endpoint {
    /// Fetch the status document of `id`
    async fn bundle_status(&self, id: &BundleId) -> Result<RawResponse>;
}

/// Downloads support bundle archives
#[async_trait]
pub trait BundleDownloadApi: Endpoint {
    /// Start streaming the archive of `id`
    async fn download_bundle(&self, id: &BundleId) -> Result<DownloadResponse>;
}

/// Uploads files into a repository
#[async_trait]
pub trait BundleUploadApi: Endpoint {
    /// Upload `file` to `{repo_key}/{case_number}/{filename}`
    async fn upload_bundle(
        &self,
        file: &Path,
        repo_key: &str,
        case_number: &CaseNumber,
        filename: &str,
    ) -> Result<RawResponse>;
}

/// Every capability the workflow uses
pub trait RemoteService:
    BundleCreationApi + BundleStatusApi + BundleDownloadApi + BundleUploadApi
{
}

impl<T> RemoteService for T where
    T: BundleCreationApi + BundleStatusApi + BundleDownloadApi + BundleUploadApi
{
}

/// Turns resolved server details into a usable client
pub trait Connector: Send + Sync {
    /// Build a client for `details`
    fn connect(&self, details: &ServerDetails) -> Result<Arc<dyn RemoteService>>;
}

/// How requests authenticate
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No authentication
    None,
    /// `Authorization: Bearer <token>`
    AccessToken(String),
    /// HTTP basic auth
    Basic {
        /// User name
        user: String,
        /// Password
        password: String,
    },
}

// Keep secrets out of debug logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::AccessToken(_) => f.write_str("AccessToken(***)"),
            Credentials::Basic { user, .. } => write!(f, "Basic({user}:***)"),
        }
    }
}

/// Resolved connection details of one server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerDetails {
    url: String,
    credentials: Credentials,
}

impl ServerDetails {
    /// Validate `url` and normalize it to end with `/`
    pub fn new(url: &str, credentials: Credentials) -> Result<Self> {
        let parsed = url::Url::parse(url).map_err(|e| Error::ConnectionResolution {
            server_id: url.to_string(),
            reason: format!("invalid url: {e}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::ConnectionResolution {
                server_id: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        let mut url = url.to_string();
        if !url.ends_with('/') {
            url.push('/');
        }
        Ok(Self { url, credentials })
    }

    /// Details without credentials
    pub fn anonymous(url: &str) -> Result<Self> {
        Self::new(url, Credentials::None)
    }

    /// Details of a configured server profile
    pub fn from_profile(profile: &ServerProfile) -> Result<Self> {
        let credentials = match (&profile.access_token, &profile.user, &profile.password) {
            (Some(token), _, _) if !token.is_empty() => Credentials::AccessToken(token.clone()),
            (_, Some(user), password) => Credentials::Basic {
                user: user.clone(),
                password: password.clone().unwrap_or_default(),
            },
            _ => Credentials::None,
        };
        Self::new(&profile.url, credentials).map_err(|e| match e {
            Error::ConnectionResolution { reason, .. } => Error::ConnectionResolution {
                server_id: profile.server_id.clone(),
                reason,
            },
            other => other,
        })
    }

    /// Base URL, ending with `/`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Authentication used for requests
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}
