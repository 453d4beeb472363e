//! Shared stub service for exercising the workflow steps without a network.

use crate::client::{
    BundleCreationApi, BundleDownloadApi, BundleStatusApi, BundleUploadApi, DownloadResponse,
    Endpoint, RawResponse,
};
use crate::error::{Error, Result};
use crate::types::{BundleId, CaseNumber, CreationOptions};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned answer of one stub call
#[derive(Clone, Debug)]
pub(crate) enum Reply {
    /// Server answered
    Http(StatusCode, Vec<u8>),
    /// Transport failure with this message
    Transport(String),
}

impl Reply {
    pub(crate) fn ok_json(body: &str) -> Self {
        Reply::Http(StatusCode::OK, body.as_bytes().to_vec())
    }

    pub(crate) fn status(status: StatusCode) -> Self {
        Reply::Http(status, Vec::new())
    }

    fn into_result(self) -> Result<RawResponse> {
        match self {
            Reply::Http(status, body) => Ok(RawResponse::new(status, body)),
            Reply::Transport(msg) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                msg,
            ))),
        }
    }
}

/// What the upload stub was called with
#[derive(Clone, Debug)]
pub(crate) struct UploadCall {
    pub(crate) file: PathBuf,
    pub(crate) repo_key: String,
    pub(crate) case_number: String,
    pub(crate) filename: String,
    pub(crate) file_existed: bool,
}

/// Stub implementing every remote capability
///
/// Status replies are consumed in order; the last one repeats forever.
pub(crate) struct StubService {
    pub(crate) base_url: String,
    pub(crate) create: Reply,
    pub(crate) statuses: Mutex<VecDeque<Reply>>,
    pub(crate) download: Reply,
    pub(crate) upload: Reply,
    pub(crate) created_with: Mutex<Option<CreationOptions>>,
    pub(crate) status_calls: AtomicUsize,
    pub(crate) download_calls: AtomicUsize,
    pub(crate) uploads: Mutex<Vec<UploadCall>>,
}

impl Default for StubService {
    fn default() -> Self {
        Self {
            base_url: "http://foo.bar/".to_string(),
            create: Reply::ok_json(r#"{"id":"foo"}"#),
            statuses: Mutex::new(VecDeque::from([Reply::ok_json(r#"{"status":"success"}"#)])),
            download: Reply::Http(StatusCode::OK, b"file-contents".to_vec()),
            upload: Reply::status(StatusCode::CREATED),
            created_with: Mutex::new(None),
            status_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
        }
    }
}

impl StubService {
    pub(crate) fn with_statuses(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            statuses: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        }
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn uploads(&self) -> Vec<UploadCall> {
        self.uploads.lock().unwrap().clone()
    }
}

impl Endpoint for StubService {
    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl BundleCreationApi for StubService {
    async fn create_bundle(&self, options: &CreationOptions) -> Result<RawResponse> {
        *self.created_with.lock().unwrap() = Some(options.clone());
        self.create.clone().into_result()
    }
}

#[async_trait]
impl BundleStatusApi for StubService {
    async fn bundle_status(&self, _id: &BundleId) -> Result<RawResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let reply = {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                statuses.pop_front()
            } else {
                statuses.front().cloned()
            }
        };
        reply
            .unwrap_or_else(|| Reply::status(StatusCode::INTERNAL_SERVER_ERROR))
            .into_result()
    }
}

#[async_trait]
impl BundleDownloadApi for StubService {
    async fn download_bundle(&self, _id: &BundleId) -> Result<DownloadResponse> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let raw = self.download.clone().into_result()?;
        Ok(DownloadResponse {
            status: raw.status,
            body: Box::pin(std::io::Cursor::new(raw.body)),
        })
    }
}

#[async_trait]
impl BundleUploadApi for StubService {
    async fn upload_bundle(
        &self,
        file: &Path,
        repo_key: &str,
        case_number: &CaseNumber,
        filename: &str,
    ) -> Result<RawResponse> {
        self.uploads.lock().unwrap().push(UploadCall {
            file: file.to_path_buf(),
            repo_key: repo_key.to_string(),
            case_number: case_number.to_string(),
            filename: filename.to_string(),
            file_existed: file.exists(),
        });
        self.upload.clone().into_result()
    }
}
