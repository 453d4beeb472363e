//! # support-bundle
//!
//! Collects an Artifactory support bundle and hands it to a support case.
//!
//! One run:
//! - asks the source server to generate a support bundle
//! - polls until the bundle is ready, then downloads the archive to a temp file
//! - uploads the archive to `{repo}/{case}/SB-<timestamp>Z.zip` on the target server
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use support_bundle::{
//!     DefaultOptionsProvider, HttpConnector, ProfileResolver, SupportBundleWorkflow,
//!     WorkflowConfig, config::default_servers_path,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorkflowConfig::default();
//!     let workflow = SupportBundleWorkflow::new(
//!         config.clone(),
//!         Arc::new(ProfileResolver::new(default_servers_path(), None, None)),
//!         Arc::new(HttpConnector::new(config.upload_retry.clone())),
//!         Arc::new(DefaultOptionsProvider::default()),
//!     );
//!
//!     let result = workflow
//!         .run(&CancellationToken::new(), &["1234".to_string()])
//!         .await?;
//!     println!("Uploaded to {:?}", result.upload_destination);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Workflow steps: create, poll, download, upload
pub mod actions;
/// Remote service traits and the HTTP client
pub mod client;
/// Time source and timestamp formats
pub mod clock;
/// Configuration types and server profiles
pub mod config;
/// Error types
pub mod error;
/// JSON response field access
pub mod json;
/// Support bundle creation options
pub mod options;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types
pub mod types;
/// Workflow orchestration
pub mod workflow;

// Re-export commonly used types
pub use client::{Connector, HttpClient, HttpConnector, RemoteService, ServerDetails};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConnectionResolver, ProfileResolver, RetryConfig, WorkflowConfig};
pub use error::{Error, JsonError, Result};
pub use options::{DefaultOptionsProvider, OptionsProvider, PromptOptionsProvider};
pub use types::{BundleId, CaseNumber, CreationOptions, WorkflowResult};
pub use workflow::{SupportBundleWorkflow, WorkflowFailure};

use tokio_util::sync::CancellationToken;

/// Cancel `cancel` once the process receives a termination signal
///
/// - **Unix:** SIGTERM or SIGINT
/// - **Windows/other:** Ctrl+C via `tokio::signal::ctrl_c()`
///
/// Returns early, without cancelling, if `cancel` is cancelled by someone else.
pub async fn cancel_on_signal(cancel: CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = wait_for_signal() => {}
    }
    tracing::warn!("Cancelling support bundle workflow");
    cancel.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
