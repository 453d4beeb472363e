//! The individual workflow steps
//!
//! Each step is a free function generic over the capability it needs, so it can
//! run against [`crate::client::HttpClient`] or a stub.

mod create;
mod download;
pub mod poll;
mod upload;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use create::create_support_bundle;
pub use download::download_support_bundle;
pub use poll::{IN_PROGRESS, Readiness, wait_until_ready};
pub use upload::upload_support_bundle;
