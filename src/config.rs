//! Configuration types for support-bundle

use crate::client::ServerDetails;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upload target used when no `--target-server-id` is given (keep the trailing slash)
pub const DEFAULT_TARGET_URL: &str = "https://supportlogs.jfrog.com/";

/// Settings for one workflow run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// How long to wait for the bundle to become ready (default: 10 minutes)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub download_timeout: Duration,

    /// Delay between two status checks (default: 5 seconds)
    #[serde(default = "default_retry_interval", with = "duration_serde")]
    pub retry_interval: Duration,

    /// Delete the downloaded archive after the upload (default: true)
    #[serde(default = "default_true")]
    pub cleanup: bool,

    /// Repository key the archive is uploaded to (default: "logs")
    #[serde(default = "default_target_repo")]
    pub target_repo: String,

    /// Transport retries for the upload
    #[serde(default)]
    pub upload_retry: RetryConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            download_timeout: default_download_timeout(),
            retry_interval: default_retry_interval(),
            cleanup: true,
            target_repo: default_target_repo(),
            upload_retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration for transient transport failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_retry_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_target_repo() -> String {
    "logs".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// Parse a duration flag, falling back to `default` when it is empty or malformed
///
/// Malformed values are logged as a warning, never rejected.
pub fn parse_duration_or_default(value: &str, default: Duration) -> Duration {
    if value.trim().is_empty() {
        return default;
    }
    match parse_duration(value) {
        Some(d) => d,
        None => {
            tracing::warn!(
                value = value,
                default = ?default,
                "Error parsing duration, using default"
            );
            default
        }
    }
}

/// Longest accepted duration flag (`i64::MAX` nanoseconds, about 292 years)
const MAX_DURATION: Duration = Duration::from_nanos(i64::MAX as u64);

/// Parse a duration such as `300ms`, `5s`, `10m` or `1h30m`
///
/// Units: `ms`, `s`, `m`, `h`. Every number needs a unit, except a bare `0`.
/// Totals above `i64::MAX` nanoseconds are rejected.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value == "0" {
        return Some(Duration::ZERO);
    }
    if value.is_empty() {
        return None;
    }

    let mut total = Duration::ZERO;
    let mut rest = value;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let amount: f64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds_per_unit = match &rest[..unit_len] {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return None,
        };
        rest = &rest[unit_len..];

        total = total.checked_add(Duration::try_from_secs_f64(amount * seconds_per_unit).ok()?)?;
    }
    (total <= MAX_DURATION).then_some(total)
}

/// One named Artifactory server
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerProfile {
    /// Name used by `--server-id` / `--target-server-id`
    pub server_id: String,
    /// Base URL of the Artifactory instance
    pub url: String,
    /// Bearer token (preferred over user/password)
    #[serde(default)]
    pub access_token: Option<String>,
    /// Basic auth user
    #[serde(default)]
    pub user: Option<String>,
    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,
}

/// The server profile file
///
/// ```json
/// {
///   "default": "prod",
///   "servers": [
///     { "server_id": "prod", "url": "https://acme.jfrog.io/artifactory", "access_token": "..." }
///   ]
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServersFile {
    /// Server used when no ID is given
    #[serde(default)]
    pub default: Option<String>,
    /// Known servers
    #[serde(default)]
    pub servers: Vec<ServerProfile>,
}

impl ServersFile {
    /// Read and parse a profile file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read(path).map_err(|e| Error::Config {
            message: format!("failed to read server profiles '{}': {}", path.display(), e),
            key: Some("config".to_string()),
        })?;
        serde_json::from_slice(&content).map_err(|e| Error::Config {
            message: format!("invalid server profiles '{}': {}", path.display(), e),
            key: Some("servers".to_string()),
        })
    }

    /// Connection details for `server_id`, or for the default server when `None`
    ///
    /// Without an explicit default, a file holding a single server uses that one.
    pub fn resolve(&self, server_id: Option<&str>) -> Result<ServerDetails> {
        let label = server_id.unwrap_or("<default>").to_string();
        let wanted = match server_id.or(self.default.as_deref()) {
            Some(id) => Some(id),
            None if self.servers.len() == 1 => self.servers.first().map(|s| s.server_id.as_str()),
            None => None,
        };
        let Some(wanted) = wanted else {
            return Err(Error::ConnectionResolution {
                server_id: label,
                reason: "no server-id was given and no default server is configured".to_string(),
            });
        };

        let profile = self
            .servers
            .iter()
            .find(|s| s.server_id == wanted)
            .ok_or_else(|| Error::ConnectionResolution {
                server_id: wanted.to_string(),
                reason: "server-id not found".to_string(),
            })?;

        ServerDetails::from_profile(profile)
    }
}

/// Default location of the profile file: `$HOME/.support-bundle/servers.json`
pub fn default_servers_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".support-bundle")
        .join("servers.json")
}

/// Looks up the source and target servers of a run
pub trait ConnectionResolver: Send + Sync {
    /// Server the bundle is created on and downloaded from
    fn source(&self) -> Result<ServerDetails>;
    /// Server the bundle is uploaded to
    fn target(&self) -> Result<ServerDetails>;
}

/// [`ConnectionResolver`] backed by a [`ServersFile`] on disk
///
/// The file is only read when a lookup actually needs it.
#[derive(Clone, Debug)]
pub struct ProfileResolver {
    path: PathBuf,
    server_id: Option<String>,
    target_server_id: Option<String>,
}

impl ProfileResolver {
    /// Create a resolver reading `path`
    pub fn new(path: PathBuf, server_id: Option<String>, target_server_id: Option<String>) -> Self {
        Self {
            path,
            server_id: server_id.filter(|s| !s.is_empty()),
            target_server_id: target_server_id.filter(|s| !s.is_empty()),
        }
    }

    fn load(&self, server_id: Option<&str>) -> Result<ServersFile> {
        ServersFile::load(&self.path).map_err(|e| Error::ConnectionResolution {
            server_id: server_id.unwrap_or("<default>").to_string(),
            reason: e.to_string(),
        })
    }
}

impl ConnectionResolver for ProfileResolver {
    fn source(&self) -> Result<ServerDetails> {
        let id = self.server_id.as_deref();
        self.load(id)?.resolve(id)
    }

    fn target(&self) -> Result<ServerDetails> {
        match self.target_server_id.as_deref() {
            None => ServerDetails::anonymous(DEFAULT_TARGET_URL),
            Some(id) => self.load(Some(id))?.resolve(Some(id)),
        }
    }
}

// Duration serialization helper (seconds, fractional below one second)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_u64(duration.as_secs())
        } else {
            serializer.serialize_f64(duration.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        let nanos = (secs * 1e9).round();
        if !nanos.is_finite() || nanos < 0.0 || nanos > u64::MAX as f64 {
            return Err(de::Error::custom(format!("invalid duration {secs}")));
        }
        Ok(Duration::from_nanos(nanos as u64))
    }
}
