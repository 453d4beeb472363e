//! reqwest implementation of the remote capabilities against the Artifactory REST API.

use super::{
    BundleCreationApi, BundleDownloadApi, BundleStatusApi, BundleUploadApi, Connector,
    Credentials, DownloadResponse, Endpoint, RawResponse, RemoteService, ServerDetails,
};
use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::types::{BundleId, CaseNumber, CreationOptions};
use async_trait::async_trait;
use futures::TryStreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::{ReaderStream, StreamReader};

const SUPPORT_BUNDLE_ENDPOINT: &str = "api/system/support/bundle";
/// Property attached to uploaded archives
const UPLOADED_BY: &str = "uploadedBy=support-bundle";
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for one Artifactory server
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    details: ServerDetails,
    upload_retry: RetryConfig,
}

impl HttpClient {
    /// Create a client for `details`
    ///
    /// `upload_retry` governs transport retries of uploads. Other requests are
    /// attempted once.
    pub fn new(details: ServerDetails, upload_retry: RetryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("support-bundle/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            details,
            upload_retry,
        })
    }

    fn bundle_url(&self, id: &BundleId) -> String {
        format!(
            "{}{}/{}",
            self.details.url(),
            SUPPORT_BUNDLE_ENDPOINT,
            urlencoding::encode(id.as_str())
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.details.credentials() {
            Credentials::None => request,
            Credentials::AccessToken(token) => request.bearer_auth(token),
            Credentials::Basic { user, password } => request.basic_auth(user, Some(password)),
        }
    }

    async fn buffered(request: reqwest::RequestBuilder) -> Result<RawResponse> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(RawResponse::new(status, body.to_vec()))
    }

    async fn put_file(&self, file: &Path, url: &str) -> Result<RawResponse> {
        let handle = tokio::fs::File::open(file).await?;
        let length = handle.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(handle));
        let request = self
            .authorize(self.client.put(url))
            .header(reqwest::header::CONTENT_LENGTH, length)
            .header(reqwest::header::CONTENT_TYPE, "application/zip")
            .body(body);
        Self::buffered(request).await
    }
}

impl Endpoint for HttpClient {
    fn base_url(&self) -> &str {
        self.details.url()
    }
}

#[async_trait]
impl BundleCreationApi for HttpClient {
    async fn create_bundle(&self, options: &CreationOptions) -> Result<RawResponse> {
        let url = format!("{}{}", self.details.url(), SUPPORT_BUNDLE_ENDPOINT);
        tracing::debug!(url = %url, payload = ?options, "Sending support bundle creation request");
        Self::buffered(self.authorize(self.client.post(&url)).json(options)).await
    }
}

#[async_trait]
impl BundleStatusApi for HttpClient {
    async fn bundle_status(&self, id: &BundleId) -> Result<RawResponse> {
        Self::buffered(self.authorize(self.client.get(self.bundle_url(id)))).await
    }
}

#[async_trait]
impl BundleDownloadApi for HttpClient {
    async fn download_bundle(&self, id: &BundleId) -> Result<DownloadResponse> {
        let url = format!("{}/archive", self.bundle_url(id));
        let response = self.authorize(self.client.get(&url)).send().await?;
        let status = response.status();
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(DownloadResponse {
            status,
            body: Box::pin(StreamReader::new(stream)),
        })
    }
}

#[async_trait]
impl BundleUploadApi for HttpClient {
    async fn upload_bundle(
        &self,
        file: &Path,
        repo_key: &str,
        case_number: &CaseNumber,
        filename: &str,
    ) -> Result<RawResponse> {
        let url = format!(
            "{}{}/{}/{};{}",
            self.details.url(),
            urlencoding::encode(repo_key),
            urlencoding::encode(case_number.as_str()),
            urlencoding::encode(filename),
            UPLOADED_BY
        );
        with_retry(&self.upload_retry, || self.put_file(file, &url)).await
    }
}

/// [`Connector`] producing [`HttpClient`]s
#[derive(Clone, Debug, Default)]
pub struct HttpConnector {
    upload_retry: RetryConfig,
}

impl HttpConnector {
    /// Create a connector whose clients retry uploads per `upload_retry`
    pub fn new(upload_retry: RetryConfig) -> Self {
        Self { upload_retry }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, details: &ServerDetails) -> Result<Arc<dyn RemoteService>> {
        let client = HttpClient::new(details.clone(), self.upload_retry.clone())
            .map_err(|e| Error::ConnectionResolution {
                server_id: details.url().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Arc::new(client))
    }
}
