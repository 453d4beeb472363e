//! Core types for support-bundle

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Support case number supplied by the user
///
/// Free-form, trimmed of surrounding whitespace on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseNumber(String);

impl CaseNumber {
    /// Create a case number, trimming surrounding whitespace
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    /// Get the inner value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaseNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier Artifactory assigns to a created support bundle
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(String);

impl BundleId {
    /// Wrap a raw identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BundleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BundleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of the support bundle creation request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationOptions {
    /// Display name of the bundle
    pub name: String,
    /// Free-text description, carries the generation timestamp
    pub description: String,
    /// What to include; `None` lets the server pick its defaults
    ///
    /// Serialized as `{}` when absent, never `null`.
    #[serde(with = "parameters_serde", default)]
    pub parameters: Option<BundleParameters>,
}

/// Content selection of a support bundle
///
/// `logs` and `thread_dump` are always present together.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleParameters {
    /// Include Artifactory configuration files
    pub configuration: bool,
    /// Log selection
    pub logs: LogsParameters,
    /// Include system information
    pub system: bool,
    /// Thread dump selection
    pub thread_dump: ThreadDumpParameters,
}

/// Which logs go into the bundle
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsParameters {
    /// Include logs at all
    pub include: bool,
    /// First day of logs (`YYYY-MM-DD`)
    pub start_date: String,
    /// Last day of logs (`YYYY-MM-DD`)
    pub end_date: String,
}

/// How many thread dumps to take
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDumpParameters {
    /// Number of dumps (0 = none)
    pub count: u32,
    /// Milliseconds between dumps
    pub interval: u32,
}

/// What the workflow produced so far
///
/// Fields fill in as steps complete; a failed run still reports the fields
/// of the steps that succeeded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkflowResult {
    /// Set once the bundle was created
    pub bundle_id: Option<BundleId>,
    /// Set once the archive was downloaded
    pub local_file: Option<PathBuf>,
    /// Set once the archive was uploaded
    pub upload_destination: Option<String>,
}

// `None` <-> `{}` for the parameters object
mod parameters_serde {
    use super::BundleParameters;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(params: &Option<BundleParameters>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match params {
            Some(p) => p.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BundleParameters>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Object(ref map) if map.is_empty() => Ok(None),
            other => BundleParameters::deserialize(other)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
