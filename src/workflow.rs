//! Support bundle workflow orchestration
//!
//! Runs the steps strictly in order:
//! 1. Validate the single case number argument
//! 2. Resolve the source and target servers
//! 3. Create the bundle on the source server
//! 4. Wait for it and download it from the source server
//! 5. Upload it to the target server, then optionally delete the local copy
//!
//! A failing step ends the run. The caller still gets every field the earlier
//! steps produced, next to the unmodified error.

use crate::actions::{create_support_bundle, download_support_bundle, upload_support_bundle};
use crate::client::Connector;
use crate::clock::{Clock, SystemClock};
use crate::config::{ConnectionResolver, WorkflowConfig};
use crate::error::{Error, Result};
use crate::options::OptionsProvider;
use crate::types::{CaseNumber, WorkflowResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// A failed run: the error of the failing step plus what was done before it
#[derive(Debug, Error)]
#[error("{error}")]
pub struct WorkflowFailure {
    /// Fields filled in by the steps that succeeded
    pub partial: WorkflowResult,
    /// The failing step's error, as that step returned it
    #[source]
    pub error: Error,
}

/// Creates, downloads and re-uploads one support bundle
pub struct SupportBundleWorkflow {
    config: WorkflowConfig,
    resolver: Arc<dyn ConnectionResolver>,
    connector: Arc<dyn Connector>,
    options: Arc<dyn OptionsProvider>,
    clock: Arc<dyn Clock>,
}

impl SupportBundleWorkflow {
    /// Create a workflow using the wall clock
    pub fn new(
        config: WorkflowConfig,
        resolver: Arc<dyn ConnectionResolver>,
        connector: Arc<dyn Connector>,
        options: Arc<dyn OptionsProvider>,
    ) -> Self {
        Self {
            config,
            resolver,
            connector,
            options,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock naming the uploaded archive
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run the workflow for the positional `args` (exactly one case number)
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        args: &[String],
    ) -> std::result::Result<WorkflowResult, WorkflowFailure> {
        let mut result = WorkflowResult::default();
        match self.execute(cancel, args, &mut result).await {
            Ok(()) => Ok(result),
            Err(error) => {
                tracing::error!(error = %error, "Support bundle workflow failed");
                Err(WorkflowFailure {
                    partial: result,
                    error,
                })
            }
        }
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        args: &[String],
        result: &mut WorkflowResult,
    ) -> Result<()> {
        let case_number = parse_case_number(args)?;

        let source = self.resolver.source()?;
        tracing::debug!(url = source.url(), "Using source server");
        tracing::info!(case_number = %case_number, "Case number is {}", case_number);
        let target = self.resolver.target()?;

        let source_client = self.connector.connect(&source)?;
        let target_client = self.connector.connect(&target)?;

        // 1. Create
        let bundle_id =
            create_support_bundle(&*source_client, &case_number, &*self.options).await?;
        result.bundle_id = Some(bundle_id.clone());

        // 2. Wait and download
        let archive = download_support_bundle(
            cancel,
            &*source_client,
            self.config.download_timeout,
            self.config.retry_interval,
            &bundle_id,
        )
        .await?;
        result.local_file = Some(archive.clone());
        let _cleanup = self.config.cleanup.then(|| CleanupGuard::new(archive.clone()));

        // 3. Upload
        let destination = upload_support_bundle(
            &*target_client,
            &case_number,
            &archive,
            &self.config.target_repo,
            &*self.clock,
        )
        .await?;
        result.upload_destination = Some(destination);

        Ok(())
    }
}

/// Extract the case number from the positional arguments
///
/// Exactly one argument is accepted; it is trimmed of surrounding whitespace.
pub fn parse_case_number(args: &[String]) -> Result<CaseNumber> {
    match args {
        [case] => Ok(CaseNumber::new(case)),
        _ => Err(Error::InvalidArguments {
            expected: 1,
            received: args.len(),
        }),
    }
}

/// Deletes the downloaded archive and its temp directory when dropped
struct CleanupGuard {
    path: PathBuf,
}

impl CleanupGuard {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        delete_archive(&self.path);
    }
}

/// Remove `path`, then its parent directory if that is now empty
///
/// Failures are logged, never raised.
pub(crate) fn delete_archive(path: &Path) {
    tracing::debug!(path = %path.display(), "Deleting generated support bundle");
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "Error occurred while deleting the generated support bundle archive"
        );
        return;
    }
    if let Some(dir) = path.parent() {
        // only succeeds if empty
        if let Err(e) = std::fs::remove_dir(dir) {
            tracing::debug!(
                dir = %dir.display(),
                error = %e,
                "Temp directory of the support bundle was not removed"
            );
        }
    }
}
