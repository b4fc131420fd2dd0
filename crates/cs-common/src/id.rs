//! Venue, report and reporter identity types.
//!
//! Venues and reports are identified by store-assigned integers. Reporters are
//! identified by a single opaque string type that is threaded through cooldown,
//! fraud and strike tracking alike.

use schemars::{json_schema, JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::error::Error;

/// Maximum reporter identity length in bytes.
pub const MAX_REPORTER_LEN: usize = 255;

/// Venue ID wrapper with display formatting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct VenueId(pub u64);

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VenueId {
    fn from(id: u64) -> Self {
        VenueId(id)
    }
}

/// Report ID wrapper. Monotonically increasing within a store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ReportId(pub u64);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ReportId {
    fn from(id: u64) -> Self {
        ReportId(id)
    }
}

/// Opaque reporter identity.
///
/// Whatever the surrounding system authenticates (an account, an anonymous
/// device token) is reduced to this one type before it reaches the core.
/// Leading/trailing whitespace is trimmed; the result must be non-empty and
/// at most [`MAX_REPORTER_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReporterId(String);

impl ReporterId {
    /// Parse and validate a reporter identity.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidReporter("identity is empty".to_string()));
        }
        if trimmed.len() > MAX_REPORTER_LEN {
            return Err(Error::InvalidReporter(format!(
                "identity is {} bytes, limit is {}",
                trimmed.len(),
                MAX_REPORTER_LEN
            )));
        }
        Ok(ReporterId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ReporterId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ReporterId::parse(&value)
    }
}

impl From<ReporterId> for String {
    fn from(id: ReporterId) -> Self {
        id.0
    }
}

impl std::str::FromStr for ReporterId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReporterId::parse(s)
    }
}

impl fmt::Display for ReporterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl JsonSchema for ReporterId {
    fn schema_name() -> Cow<'static, str> {
        "ReporterId".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "minLength": 1,
            "maxLength": MAX_REPORTER_LEN,
            "description": "Opaque reporter identity"
        })
    }
}
