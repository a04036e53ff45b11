// src/services/session_cache.rs
//! Per-submission cache of extracted fields and fingerprints.
//!
//! A successful upload parks its result here under a random session token
//! so the subsequent anchor call can refer back to it. Entries are
//! transient: they expire after a configurable TTL and are evicted once
//! anchoring completes. No cross-session sharing.

use crate::models::certificate::{CertificateFields, Fingerprint};
use chrono::{DateTime, Duration, Utc};
use ethers_core::utils::hex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::RwLock;

/// A cached submission awaiting its anchor call.
#[derive(Debug, Clone)]
pub struct CachedSubmission {
    pub fields: CertificateFields,
    pub fingerprint: Fingerprint,
    created_at: DateTime<Utc>,
}

/// In-memory, TTL-bounded store of pending submissions.
pub struct SubmissionCache {
    entries: RwLock<HashMap<String, CachedSubmission>>,
    ttl: Duration,
}

impl SubmissionCache {
    /// Creates a cache whose entries expire after `ttl_secs` seconds.
    pub fn new(ttl_secs: i64) -> Self {
        SubmissionCache {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Stores a submission and returns its fresh session token.
    pub fn insert(&self, fields: CertificateFields, fingerprint: Fingerprint) -> String {
        let session_id = generate_session_id();
        let entry = CachedSubmission {
            fields,
            fingerprint,
            created_at: Utc::now(),
        };
        self.entries
            .write()
            .expect("submission cache lock poisoned")
            .insert(session_id.clone(), entry);
        session_id
    }

    /// Looks up a live submission. Expired entries report as absent and
    /// are dropped on the spot.
    pub fn get(&self, session_id: &str) -> Option<CachedSubmission> {
        let now = Utc::now();
        {
            let entries = self.entries.read().expect("submission cache lock poisoned");
            match entries.get(session_id) {
                Some(entry) if now - entry.created_at <= self.ttl => {
                    return Some(entry.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but is past its TTL
        self.remove(session_id);
        None
    }

    /// Evicts a submission, typically after its anchor confirmed.
    pub fn remove(&self, session_id: &str) -> bool {
        self.entries
            .write()
            .expect("submission cache lock poisoned")
            .remove(session_id)
            .is_some()
    }

    /// Drops every expired entry. Called opportunistically; correctness
    /// does not depend on it since `get` re-checks the TTL.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().expect("submission cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| now - entry.created_at <= self.ttl);
        before - entries.len()
    }

    /// Number of live (possibly expired but not yet purged) entries.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("submission cache lock poisoned")
            .len()
    }
}

/// Random 32-hex-character session token.
fn generate_session_id() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::certificate::NOT_FOUND;

    fn sample_submission() -> (CertificateFields, Fingerprint) {
        let fields = CertificateFields {
            name: "John Smith".into(),
            register_number: "AB123456".into(),
            passing_date: "MAY-2023".into(),
            college: "Example Institute".into(),
            cgpa: NOT_FOUND.into(),
        };
        let fingerprint = Fingerprint::of(&fields);
        (fields, fingerprint)
    }

    #[test]
    fn test_insert_and_get() {
        let cache = SubmissionCache::new(60);
        let (fields, fingerprint) = sample_submission();

        let session_id = cache.insert(fields.clone(), fingerprint);
        let cached = cache.get(&session_id).unwrap();
        assert_eq!(cached.fields, fields);
        assert_eq!(cached.fingerprint, fingerprint);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let cache = SubmissionCache::new(60);
        let (fields, fingerprint) = sample_submission();
        let a = cache.insert(fields.clone(), fingerprint);
        let b = cache.insert(fields, fingerprint);
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_remove_evicts() {
        let cache = SubmissionCache::new(60);
        let (fields, fingerprint) = sample_submission();
        let session_id = cache.insert(fields, fingerprint);

        assert!(cache.remove(&session_id));
        assert!(cache.get(&session_id).is_none());
        assert!(!cache.remove(&session_id));
    }

    #[test]
    fn test_expired_entry_reports_absent() {
        // Zero TTL: everything is expired the moment it is inserted
        let cache = SubmissionCache::new(0);
        let (fields, fingerprint) = sample_submission();
        let session_id = cache.insert(fields, fingerprint);
        std::thread::sleep(std::time::Duration::from_millis(5));

        assert!(cache.get(&session_id).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let expired = SubmissionCache::new(0);
        let (fields, fingerprint) = sample_submission();
        expired.insert(fields.clone(), fingerprint);
        expired.insert(fields, fingerprint);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(expired.purge_expired(), 2);
        assert_eq!(expired.len(), 0);
    }
}
