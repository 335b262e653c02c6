//! Wire-format types for the upstream user API.
//!
//! These mirror the fixed external JSON contract
//! (`GET /api?results=N` -> `{ results: [...], info: {...} }`). They are
//! transient: fully replaced each sync cycle and never persisted.
//! Unknown JSON fields are ignored.

use serde::{Deserialize, Deserializer};
use tracing::debug;

/// Sentinel used when a postcode arrives in an undecodable shape.
pub const UNKNOWN_POSTCODE: &str = "Unknown";

/// Top-level response of the user-list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UserListResponse {
    pub results: Vec<RemoteUserRecord>,
    pub info: ResponseInfo,
}

/// Pagination/seed block accompanying every response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseInfo {
    pub seed: String,
    pub results: u32,
    pub page: u32,
    pub version: String,
}

/// One randomized user record as served by the upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteUserRecord {
    pub gender: String,
    pub name: RecordName,
    pub location: RecordLocation,
    pub email: String,
    pub login: RecordLogin,
    pub dob: RecordDob,
    pub registered: RecordDob,
    pub phone: String,
    pub cell: String,
    pub picture: RecordPicture,
    pub nat: String,
}

impl RemoteUserRecord {
    /// Given and family name joined with a single space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name.first, self.name.last)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordName {
    pub title: String,
    pub first: String,
    pub last: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordLocation {
    pub city: String,
    pub state: String,
    pub country: String,
    /// Arrives as either a string or an integer on the wire; anything
    /// else decodes to [`UNKNOWN_POSTCODE`] rather than failing.
    #[serde(deserialize_with = "postcode_string_or_int")]
    pub postcode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordLogin {
    /// Stable remote identifier; becomes the profile id.
    pub uuid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordDob {
    pub date: String,
    pub age: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordPicture {
    pub large: String,
    pub medium: String,
    pub thumbnail: String,
}

/// Explicit tagged decode for the postcode field: try string, else
/// coerce an integer to its string form, else the sentinel. The
/// undecodable case is recorded, never thrown.
fn postcode_string_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i.to_string()),
            None => {
                debug!("Postcode is a non-integer number ({}), using sentinel", n);
                Ok(UNKNOWN_POSTCODE.to_string())
            }
        },
        other => {
            debug!("Postcode has unexpected shape ({}), using sentinel", other);
            Ok(UNKNOWN_POSTCODE.to_string())
        }
    }
}
