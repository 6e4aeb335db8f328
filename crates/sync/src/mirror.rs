//! Live local mirrors of the per-user remote collections.
//!
//! Each snapshot event replaces the corresponding mirror wholesale. There is
//! no per-document patching: the store already delivers complete views, and
//! overwriting keeps the mirror trivially convergent with the remote truth.
//!
//! Mirrors are generation-gated. Every identity swap advances the generation
//! and clears the data; writes carry the generation their listener was opened
//! under and are dropped when it no longer matches, so a late callback from a
//! previous user can never leak rows into the next user's view.

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};
use serde_json::Value;
use tokio::sync::RwLock;

use certihub_core::{CertificationEntry, CourseEntry, ProfileDocument};

use crate::gateway::DocumentRecord;

#[derive(Default)]
struct MirrorData {
    certifications: Vec<CertificationEntry>,
    courses: Vec<CourseEntry>,
    profile: Option<ProfileDocument>,
}

pub struct MirrorSet {
    generation: AtomicU64,
    data: RwLock<MirrorData>,
}

impl Default for MirrorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorSet {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            data: RwLock::new(MirrorData::default()),
        }
    }

    /// The generation new listeners should stamp their writes with.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Start a new mirror epoch: advance the generation and drop all data.
    /// Writes stamped with any earlier generation are rejected from here on.
    pub async fn begin_epoch(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut data = self.data.write().await;
        *data = MirrorData::default();
        debug!("mirror epoch advanced to generation {}", generation);
        generation
    }

    fn is_current(&self, generation: u64, mirror: &str) -> bool {
        let current = self.generation.load(Ordering::SeqCst);
        if generation != current {
            warn!(
                "dropping stale {} snapshot (generation {} != {})",
                mirror, generation, current
            );
            return false;
        }
        true
    }

    /// Overwrite the certifications mirror with a full snapshot. Returns
    /// false when the write was stale and discarded.
    pub async fn apply_certifications(&self, generation: u64, records: Vec<DocumentRecord>) -> bool {
        if !self.is_current(generation, "certifications") {
            return false;
        }
        let entries = parse_records(records, "certification");
        let mut data = self.data.write().await;
        // Re-check under the write lock so an epoch swap that raced the
        // parse still wins.
        if !self.is_current(generation, "certifications") {
            return false;
        }
        data.certifications = entries;
        true
    }

    /// Overwrite the courses mirror with a full snapshot.
    pub async fn apply_courses(&self, generation: u64, records: Vec<DocumentRecord>) -> bool {
        if !self.is_current(generation, "courses") {
            return false;
        }
        let entries = parse_records(records, "course");
        let mut data = self.data.write().await;
        if !self.is_current(generation, "courses") {
            return false;
        }
        data.courses = entries;
        true
    }

    /// Overwrite the profile mirror with the document's current fields, or
    /// clear it when the document does not exist.
    pub async fn apply_profile(&self, generation: u64, fields: Option<Value>) -> bool {
        if !self.is_current(generation, "profile") {
            return false;
        }
        let profile = match fields {
            Some(value) => match serde_json::from_value::<ProfileDocument>(value) {
                Ok(profile) => Some(profile),
                Err(error) => {
                    warn!("ignoring unreadable profile snapshot: {}", error);
                    return false;
                }
            },
            None => None,
        };
        let mut data = self.data.write().await;
        if !self.is_current(generation, "profile") {
            return false;
        }
        data.profile = profile;
        true
    }

    pub async fn certifications(&self) -> Vec<CertificationEntry> {
        self.data.read().await.certifications.clone()
    }

    pub async fn courses(&self) -> Vec<CourseEntry> {
        self.data.read().await.courses.clone()
    }

    pub async fn profile(&self) -> Option<ProfileDocument> {
        self.data.read().await.profile.clone()
    }
}

/// Deserialize snapshot records, injecting the gateway-assigned id into each
/// document's fields. Records that fail to parse are skipped so one corrupt
/// document cannot blank an entire mirror.
fn parse_records<T: serde::de::DeserializeOwned>(records: Vec<DocumentRecord>, kind: &str) -> Vec<T> {
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let mut fields = match record.fields {
            Value::Object(map) => map,
            other => {
                warn!("skipping {} {}: fields are not an object ({})", kind, record.id, other);
                continue;
            }
        };
        fields.insert("id".to_string(), Value::String(record.id.clone()));
        match serde_json::from_value(Value::Object(fields)) {
            Ok(entry) => entries.push(entry),
            Err(error) => warn!("skipping unreadable {} {}: {}", kind, record.id, error),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cert_record(id: &str, title: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            fields: json!({
                "title": title,
                "issuer": "Coursera",
                "month": "January",
                "year": "2024",
            }),
        }
    }

    #[tokio::test]
    async fn snapshot_overwrites_the_whole_mirror() {
        let mirrors = MirrorSet::new();
        let generation = mirrors.begin_epoch().await;

        assert!(
            mirrors
                .apply_certifications(generation, vec![cert_record("a", "One"), cert_record("b", "Two")])
                .await
        );
        assert_eq!(mirrors.certifications().await.len(), 2);

        assert!(
            mirrors
                .apply_certifications(generation, vec![cert_record("c", "Three")])
                .await
        );
        let entries = mirrors.certifications().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "c");
    }

    #[tokio::test]
    async fn stale_generation_writes_are_dropped() {
        let mirrors = MirrorSet::new();
        let old = mirrors.begin_epoch().await;
        let current = mirrors.begin_epoch().await;
        assert_ne!(old, current);

        assert!(!mirrors.apply_certifications(old, vec![cert_record("a", "One")]).await);
        assert!(mirrors.certifications().await.is_empty());
    }

    #[tokio::test]
    async fn epoch_swap_clears_all_mirrors() {
        let mirrors = MirrorSet::new();
        let generation = mirrors.begin_epoch().await;
        mirrors
            .apply_certifications(generation, vec![cert_record("a", "One")])
            .await;
        mirrors
            .apply_profile(generation, Some(json!({"fullName": "Ada"})))
            .await;

        mirrors.begin_epoch().await;
        assert!(mirrors.certifications().await.is_empty());
        assert!(mirrors.profile().await.is_none());
    }

    #[tokio::test]
    async fn corrupt_record_is_skipped_not_fatal() {
        let mirrors = MirrorSet::new();
        let generation = mirrors.begin_epoch().await;
        let bad = DocumentRecord {
            id: "bad".to_string(),
            fields: json!("not an object"),
        };
        mirrors
            .apply_certifications(generation, vec![bad, cert_record("ok", "Kept")])
            .await;
        let entries = mirrors.certifications().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "ok");
    }

    #[tokio::test]
    async fn missing_profile_document_clears_the_mirror() {
        let mirrors = MirrorSet::new();
        let generation = mirrors.begin_epoch().await;
        mirrors
            .apply_profile(generation, Some(json!({"fullName": "Ada"})))
            .await;
        assert!(mirrors.profile().await.is_some());

        mirrors.apply_profile(generation, None).await;
        assert!(mirrors.profile().await.is_none());
    }

    #[tokio::test]
    async fn partial_profile_fields_use_defaults() {
        let mirrors = MirrorSet::new();
        let generation = mirrors.begin_epoch().await;
        mirrors
            .apply_profile(generation, Some(json!({"fullName": "Ada", "gpa": "9.1"})))
            .await;
        let profile = mirrors.profile().await.unwrap();
        assert_eq!(profile.full_name, "Ada");
        assert_eq!(profile.gpa, "9.1");
        assert!(profile.semesters.is_empty());
    }
}
