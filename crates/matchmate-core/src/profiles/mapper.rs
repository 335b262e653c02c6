//! Mapping from wire records to persisted profiles.
//!
//! Mapping is asynchronous because it fetches the profile image. The
//! image fetch is best-effort: any failure (bad URL, transport error,
//! non-success status) leaves the image empty rather than failing the
//! whole mapping.

use crate::network::RemoteFetcher;
use crate::profiles::types::{Profile, ProfileStatus};
use crate::profiles::wire::RemoteUserRecord;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Converts wire records into [`Profile`] entities.
pub struct ProfileMapper {
    fetcher: Arc<dyn RemoteFetcher>,
}

impl ProfileMapper {
    /// Create a mapper that fetches images through the given fetcher.
    pub fn new(fetcher: Arc<dyn RemoteFetcher>) -> Self {
        Self { fetcher }
    }

    /// Map one wire record to a profile candidate.
    ///
    /// New candidates default to status `New`, `synced_with_server=true`
    /// and `created_at=now`; reconciliation against the store happens in
    /// the sync engine, not here.
    pub async fn map_to_profile(&self, record: &RemoteUserRecord) -> Profile {
        let image_bytes = self.fetch_image(&record.picture.large).await;

        Profile {
            id: record.login.uuid.clone(),
            display_name: record.full_name(),
            age: record.dob.age,
            location_label: format!("{}, {}", record.location.city, record.location.country),
            email: record.email.clone(),
            phone: record.phone.clone(),
            image_bytes,
            status: ProfileStatus::New,
            gender: capitalize(&record.gender),
            nationality: record.nat.clone(),
            synced_with_server: true,
            created_at: Utc::now(),
        }
    }

    async fn fetch_image(&self, url: &str) -> Option<Vec<u8>> {
        match self.fetcher.fetch_url(url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!("Image fetch failed for {}: {}", url, e);
                None
            }
        }
    }
}

/// Uppercase the first character, as the upstream serves genders in
/// lowercase.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MatchError, Result};
    use crate::network::Endpoint;
    use crate::profiles::wire;
    use async_trait::async_trait;

    /// Fetcher fake that serves a fixed image or a fixed failure.
    struct ImageFake {
        image: Option<Vec<u8>>,
    }

    #[async_trait]
    impl RemoteFetcher for ImageFake {
        async fn fetch(&self, _endpoint: &Endpoint) -> Result<Vec<u8>> {
            Err(MatchError::NoData)
        }

        async fn fetch_url(&self, _url: &str) -> Result<Vec<u8>> {
            match &self.image {
                Some(bytes) => Ok(bytes.clone()),
                None => Err(MatchError::StatusCode { code: 404 }),
            }
        }
    }

    fn sample_record() -> RemoteUserRecord {
        let json = wire::tests::sample_record_json("u-1", r#""12345""#);
        serde_json::from_str(&json).unwrap()
    }

    #[tokio::test]
    async fn test_map_derives_fields() {
        let mapper = ProfileMapper::new(Arc::new(ImageFake {
            image: Some(vec![1, 2, 3]),
        }));
        let profile = mapper.map_to_profile(&sample_record()).await;

        assert_eq!(profile.id, "u-1");
        assert_eq!(profile.display_name, "Ada Lovelace");
        assert_eq!(profile.location_label, "London, United Kingdom");
        assert_eq!(profile.age, 34);
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.phone, "020-7946-0000");
        assert_eq!(profile.gender, "Female");
        assert_eq!(profile.nationality, "GB");
        assert_eq!(profile.image_bytes, Some(vec![1, 2, 3]));
        assert_eq!(profile.status, ProfileStatus::New);
        assert!(profile.synced_with_server);
    }

    #[tokio::test]
    async fn test_image_failure_is_not_fatal() {
        let mapper = ProfileMapper::new(Arc::new(ImageFake { image: None }));
        let profile = mapper.map_to_profile(&sample_record()).await;

        assert_eq!(profile.image_bytes, None);
        assert_eq!(profile.id, "u-1");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("male"), "Male");
        assert_eq!(capitalize("female"), "Female");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("X"), "X");
    }
}
