//! Downloading a ready support bundle to a private temp directory.

use super::poll::wait_until_ready;
use crate::client::{BundleDownloadApi, BundleStatusApi};
use crate::error::{Error, Result};
use crate::types::BundleId;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

const TEMP_DIR_PREFIX: &str = "support-bundle-";

/// Wait for `bundle_id` to be ready, then download it
///
/// Returns the path of `{bundle_id}.zip` inside a fresh private temp directory.
/// Readiness errors propagate unchanged and nothing is downloaded. On a failed
/// download the temp directory is removed again.
pub async fn download_support_bundle<C>(
    cancel: &CancellationToken,
    client: &C,
    timeout: Duration,
    retry_interval: Duration,
    bundle_id: &BundleId,
) -> Result<PathBuf>
where
    C: BundleStatusApi + BundleDownloadApi + ?Sized,
{
    tracing::debug!(
        bundle_id = %bundle_id,
        url = client.base_url(),
        "Download Support Bundle"
    );
    wait_until_ready(cancel, client, retry_interval, timeout, bundle_id).await?;

    let dir = tempfile::Builder::new().prefix(TEMP_DIR_PREFIX).tempdir()?;
    let path = dir.path().join(archive_name(bundle_id));

    let written = write_archive(client, bundle_id, &path).await?;

    let path = dir.keep().join(archive_name(bundle_id));
    tracing::debug!(path = %path.display(), bytes = written, "Downloaded Support Bundle");
    Ok(path)
}

/// Stream the archive into `path`; file and body are both released on return
async fn write_archive<C>(client: &C, bundle_id: &BundleId, path: &Path) -> Result<u64>
where
    C: BundleDownloadApi + ?Sized,
{
    let mut file = tokio::fs::File::create(path).await?;

    let mut response = client.download_bundle(bundle_id).await?;
    tracing::debug!(status = %response.status, "Got archive response");
    if response.status != StatusCode::OK {
        return Err(Error::remote(response.status));
    }

    let written = tokio::io::copy(&mut response.body, &mut file).await?;
    file.flush().await?;
    Ok(written)
}

/// `{bundle_id}.zip`, with path separators neutralized
fn archive_name(bundle_id: &BundleId) -> String {
    format!("{}.zip", bundle_id.as_str().replace(['/', '\\'], "_"))
}
