//! Waiting for a support bundle to become ready
//!
//! The poller queries the bundle status on a fixed cadence until the server reports
//! anything other than `in progress`, or until the deadline passes.
//!
//! ```text
//!            tick, "in progress"
//!              +-----------+
//!              v           |
//!  start --> Polling ------+-- tick, any other status --> Ready
//!              |  \
//!              |   +-- transport error / non-200 / bad body --> Failed
//!              +------ deadline passed ---------------------> TimedOut
//! ```
//!
//! The first status request is issued one interval after the start. When the
//! deadline and a tick are due at the same time, the deadline wins. A request that
//! is already in flight is not aborted by the deadline.

use crate::client::{BundleStatusApi, RawResponse};
use crate::error::{Error, Result};
use crate::json;
use crate::types::BundleId;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Status value meaning the bundle is still being generated
pub const IN_PROGRESS: &str = "in progress";

/// Shortest cadence the poller accepts; a zero interval is raised to this
const MIN_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Longest timeout or interval the poller schedules; larger values are lowered to this
const MAX_WAIT: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Outcome of one status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Still generating
    InProgress,
    /// Terminal; carries the reported status
    Ready(String),
}

/// Interpret one status response
///
/// Non-200 responses and bodies without a string `status` are errors. Every status
/// other than [`IN_PROGRESS`] counts as ready, including ones this crate does not know.
pub fn readiness(response: &RawResponse) -> Result<Readiness> {
    if response.status != StatusCode::OK {
        return Err(Error::remote(response.status));
    }
    let status = json::string_field(&response.body, "status")?;
    if status == IN_PROGRESS {
        Ok(Readiness::InProgress)
    } else {
        Ok(Readiness::Ready(status))
    }
}

/// Poll the status of `bundle_id` every `retry_interval` until it is ready
///
/// Fails with [`Error::TimedOut`] once `timeout` has elapsed, with
/// [`Error::Cancelled`] when `cancel` fires, and immediately on the first
/// transport error, non-200 status or malformed body.
pub async fn wait_until_ready<C>(
    cancel: &CancellationToken,
    client: &C,
    retry_interval: Duration,
    timeout: Duration,
    bundle_id: &BundleId,
) -> Result<()>
where
    C: BundleStatusApi + ?Sized,
{
    let period = retry_interval.clamp(MIN_RETRY_INTERVAL, MAX_WAIT);
    let start = Instant::now();
    let deadline = tokio::time::sleep_until(later(start, timeout));
    tokio::pin!(deadline);

    let mut ticker = tokio::time::interval_at(later(start, period), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut checks = 0u32;
    loop {
        tokio::select! {
            biased;

            _ = &mut deadline => {
                tracing::warn!(
                    bundle_id = %bundle_id,
                    checks,
                    timeout = ?timeout,
                    "Timed out waiting for support bundle"
                );
                return Err(Error::TimedOut { waited: start.elapsed() });
            }
            _ = cancel.cancelled() => {
                return Err(Error::Cancelled);
            }
            _ = ticker.tick() => {
                checks += 1;
                tracing::debug!(bundle_id = %bundle_id, attempt = checks, "Attempting to get status for support bundle");

                let response = client.bundle_status(bundle_id).await?;
                tracing::debug!(status = %response.status, "Got HTTP response status");

                match readiness(&response)? {
                    Readiness::InProgress => {
                        tracing::debug!(status = IN_PROGRESS, "Support bundle status");
                    }
                    Readiness::Ready(status) => {
                        tracing::info!(bundle_id = %bundle_id, status = %status, "Support bundle is ready");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// `start + wait`, with `wait` capped at [`MAX_WAIT`] and never overflowing
fn later(start: Instant, wait: Duration) -> Instant {
    let wait = wait.min(MAX_WAIT);
    start.checked_add(wait).unwrap_or(start)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_helpers::{Reply, StubService};

    const IN_PROGRESS_BODY: &str = r#"{"status":"in progress"}"#;
    const SUCCESS_BODY: &str = r#"{"status":"success"}"#;

    fn id() -> BundleId {
        BundleId::new("foo")
    }

    async fn wait(stub: &StubService, interval_ms: u64, timeout_ms: u64) -> Result<()> {
        wait_until_ready(
            &CancellationToken::new(),
            stub,
            Duration::from_millis(interval_ms),
            Duration::from_millis(timeout_ms),
            &id(),
        )
        .await
    }

    #[tokio::test(start_paused = true)]
    async fn ready_after_two_ticks() {
        let stub = StubService::with_statuses([
            Reply::ok_json(IN_PROGRESS_BODY),
            Reply::ok_json(SUCCESS_BODY),
        ]);

        let start = Instant::now();
        wait(&stub, 10, 1000).await.unwrap();

        assert_eq!(stub.status_calls(), 2);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(20), "waited {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(30), "waited {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn first_check_waits_one_interval() {
        let stub = StubService::with_statuses([Reply::ok_json(SUCCESS_BODY)]);

        let start = Instant::now();
        wait(&stub, 50, 1000).await.unwrap();

        assert_eq!(stub.status_calls(), 1);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50), "waited {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(60), "waited {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_while_in_progress() {
        let stub = StubService::with_statuses([Reply::ok_json(IN_PROGRESS_BODY)]);

        let err = wait(&stub, 10, 15).await.unwrap_err();

        assert!(matches!(err, Error::TimedOut { .. }));
        assert_eq!(err.to_string(), "timeout waiting for support bundle to be ready");
        assert_eq!(stub.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_wins_over_simultaneous_tick() {
        let stub = StubService::with_statuses([Reply::ok_json(IN_PROGRESS_BODY)]);

        let err = wait(&stub, 10, 20).await.unwrap_err();

        assert!(matches!(err, Error::TimedOut { .. }));
        assert_eq!(stub.status_calls(), 1, "tick at the deadline must not query");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_never_queries() {
        let stub = StubService::default();

        let err = wait(&stub, 10, 0).await.unwrap_err();

        assert!(matches!(err, Error::TimedOut { .. }));
        assert_eq!(stub.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_timeout_does_not_overflow() {
        let stub = StubService::with_statuses([
            Reply::ok_json(IN_PROGRESS_BODY),
            Reply::ok_json(SUCCESS_BODY),
        ]);

        wait_until_ready(
            &CancellationToken::new(),
            &stub,
            Duration::from_millis(10),
            Duration::MAX,
            &id(),
        )
        .await
        .unwrap();

        assert_eq!(stub.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_interval_does_not_overflow() {
        let stub = StubService::default();

        let err = wait_until_ready(
            &CancellationToken::new(),
            &stub,
            Duration::MAX,
            Duration::from_millis(10),
            &id(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::TimedOut { .. }));
        assert_eq!(stub.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_fails_immediately() {
        let stub = StubService::with_statuses([Reply::status(StatusCode::NOT_FOUND)]);

        let err = wait(&stub, 10, 1000).await.unwrap_err();

        assert!(matches!(err, Error::RemoteRequestFailed { status } if status == StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("404"));
        assert_eq!(stub.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_is_not_retried() {
        let stub = StubService::with_statuses([
            Reply::Transport("connection refused".to_string()),
            Reply::ok_json(SUCCESS_BODY),
        ]);

        let err = wait(&stub, 10, 1000).await.unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert_eq!(stub.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_status_body_fails() {
        let stub = StubService::with_statuses([Reply::ok_json(r#"{"state":"done"}"#)]);
        let err = wait(&stub, 10, 1000).await.unwrap_err();
        assert_eq!(err.to_string(), "property status not found");

        let stub = StubService::with_statuses([Reply::ok_json(r#"{"status":7}"#)]);
        let err = wait(&stub, 10, 1000).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_counts_as_ready() {
        let stub = StubService::with_statuses([Reply::ok_json(r#"{"status":"failure"}"#)]);
        wait(&stub, 10, 1000).await.unwrap();
        assert_eq!(stub.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling() {
        let stub = StubService::with_statuses([Reply::ok_json(IN_PROGRESS_BODY)]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = wait_until_ready(
            &cancel,
            &stub,
            Duration::from_millis(10),
            Duration::from_secs(60),
            &id(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(stub.status_calls(), 0);
    }

    #[test]
    fn readiness_of_responses() {
        let in_progress = RawResponse::new(StatusCode::OK, IN_PROGRESS_BODY);
        assert_eq!(readiness(&in_progress).unwrap(), Readiness::InProgress);

        let success = RawResponse::new(StatusCode::OK, SUCCESS_BODY);
        assert_eq!(
            readiness(&success).unwrap(),
            Readiness::Ready("success".to_string())
        );

        let unavailable = RawResponse::new(StatusCode::SERVICE_UNAVAILABLE, SUCCESS_BODY);
        assert!(readiness(&unavailable).is_err());
    }
}
