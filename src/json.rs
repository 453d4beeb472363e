//! Minimal JSON envelope parsing for Artifactory responses
//!
//! Only a handful of fields are ever read from the support bundle endpoints, so the
//! body is kept as a generic object and fields are pulled out on demand.

use crate::error::JsonError;
use serde_json::{Map, Value};

/// A parsed JSON object whose fields are read lazily
#[derive(Debug, Clone, Default)]
pub struct JsonObject(Map<String, Value>);

impl JsonObject {
    /// Parse a response body into a JSON object
    ///
    /// Fails with [`JsonError::InvalidJson`] if the bytes are not a JSON object.
    pub fn parse(bytes: &[u8]) -> Result<Self, JsonError> {
        let map: Map<String, Value> = serde_json::from_slice(bytes)?;
        Ok(Self(map))
    }

    /// Read a string property
    pub fn get_string(&self, field: &str) -> Result<String, JsonError> {
        match self.0.get(field) {
            None => Err(JsonError::MissingField(field.to_string())),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(JsonError::NotAString(field.to_string())),
        }
    }
}

/// Parse `bytes` and read the string property `field` in one step
pub fn string_field(bytes: &[u8], field: &str) -> Result<String, JsonError> {
    JsonObject::parse(bytes)?.get_string(field)
}
