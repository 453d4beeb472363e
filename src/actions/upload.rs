//! Uploading the archive to the target repository.

use crate::client::BundleUploadApi;
use crate::clock::{self, Clock};
use crate::error::{Error, Result};
use crate::types::CaseNumber;
use reqwest::StatusCode;
use std::path::Path;

/// Upload `file` as `{repo_key}/{case_number}/SB-<timestamp>Z.zip`
///
/// The filename is taken from `clock` at call time. Returns the full destination
/// URL; success is exactly `201 Created`.
pub async fn upload_support_bundle<C>(
    client: &C,
    case_number: &CaseNumber,
    file: &Path,
    repo_key: &str,
    clock: &dyn Clock,
) -> Result<String>
where
    C: BundleUploadApi + ?Sized,
{
    let filename = clock::upload_filename(clock.now());
    let destination = format!(
        "{}{}/{}/{}",
        client.base_url(),
        repo_key,
        case_number,
        filename
    );
    tracing::debug!(
        file = %file.display(),
        destination = %destination,
        "Uploading Support Bundle"
    );

    let response = client
        .upload_bundle(file, repo_key, case_number, &filename)
        .await?;
    tracing::debug!(
        status = %response.status,
        body = %String::from_utf8_lossy(&response.body),
        "Got HTTP response status"
    );
    if response.status != StatusCode::CREATED {
        return Err(Error::remote(response.status));
    }

    tracing::info!(destination = %destination, "Support bundle uploaded");
    Ok(destination)
}
