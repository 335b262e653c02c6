//! Persisted profile entity and status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User decision state of a profile.
///
/// Transitions happen only through explicit user action
/// ([`SyncEngine::set_status`](crate::profiles::SyncEngine::set_status))
/// or re-fetch reconciliation, which preserves the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    New,
    Accepted,
    Declined,
}

impl ProfileStatus {
    /// Stable string form used in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::New => "new",
            ProfileStatus::Accepted => "accepted",
            ProfileStatus::Declined => "declined",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(ProfileStatus::New),
            "accepted" => Some(ProfileStatus::Accepted),
            "declined" => Some(ProfileStatus::Declined),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted local representation of a candidate match.
///
/// Identity is `id`, the stable remote identifier. Profiles are created
/// by the mapper, upserted by the sync engine, mutated in place by
/// status updates, and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Stable remote identifier (unique across the store).
    pub id: String,
    /// "{first} {last}".
    pub display_name: String,
    pub age: i64,
    /// "{city}, {country}".
    pub location_label: String,
    pub email: String,
    pub phone: String,
    /// Raw image bytes, owned by the entity. Absent when the image
    /// fetch failed; absence is never fatal.
    pub image_bytes: Option<Vec<u8>>,
    pub status: ProfileStatus,
    pub gender: String,
    pub nationality: String,
    /// False whenever the status changed locally since the last
    /// successful remote sync. Never set back to true by this crate;
    /// there is no upload path.
    pub synced_with_server: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            ProfileStatus::New,
            ProfileStatus::Accepted,
            ProfileStatus::Declined,
        ] {
            assert_eq!(ProfileStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProfileStatus::parse("pending"), None);
    }

    #[test]
    fn test_status_serde_form() {
        let json = serde_json::to_string(&ProfileStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
    }
}
