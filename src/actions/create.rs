//! Support bundle creation.

use crate::client::BundleCreationApi;
use crate::error::{Error, Result};
use crate::json;
use crate::options::OptionsProvider;
use crate::types::{BundleId, CaseNumber};
use reqwest::StatusCode;

/// Ask the server to generate a support bundle for `case_number`
///
/// Succeeds only on `200 OK` with a body carrying a string `id`.
pub async fn create_support_bundle<C>(
    client: &C,
    case_number: &CaseNumber,
    options_provider: &dyn OptionsProvider,
) -> Result<BundleId>
where
    C: BundleCreationApi + ?Sized,
{
    tracing::debug!(
        case_number = %case_number,
        url = client.base_url(),
        "Create Support Bundle"
    );
    let options = options_provider.options(case_number)?;

    let response = client.create_bundle(&options).await?;
    tracing::debug!(
        status = %response.status,
        body = %String::from_utf8_lossy(&response.body),
        "Got creation response"
    );
    if response.status != StatusCode::OK {
        return Err(Error::remote(response.status));
    }

    let id = json::string_field(&response.body, "id")?;
    tracing::info!(bundle_id = %id, "Support bundle creation started");
    Ok(BundleId::from(id))
}
