//! Mock implementation of OtpRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{OtpKey, OtpRecord};
use crate::errors::DomainError;

use super::trait_::{OtpRepository, VerificationTransition};

/// In-memory OTP store. Each method holds the write lock for its whole body,
/// which gives the same atomicity the SQL implementation gets from conditional updates.
pub struct MockOtpRepository {
    records: Arc<RwLock<HashMap<Uuid, OtpRecord>>>,
    fail_counts: AtomicBool,
    delete_calls: AtomicUsize,
}

impl MockOtpRepository {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            fail_counts: AtomicBool::new(false),
            delete_calls: AtomicUsize::new(0),
        }
    }

    /// Make `count_expired`/`count_valid` return an error
    pub fn set_fail_counts(&self, fail: bool) {
        self.fail_counts.store(fail, Ordering::SeqCst);
    }

    /// Number of times `delete_expired` has been called
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Insert a record as-is, bypassing the superseding logic
    pub async fn seed(&self, record: OtpRecord) {
        self.records.write().await.insert(record.id, record);
    }

    pub async fn all(&self) -> Vec<OtpRecord> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn active_for(&self, key: &OtpKey, now: DateTime<Utc>) -> Vec<OtpRecord> {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.key() == *key && r.is_active(now))
            .cloned()
            .collect()
    }

    fn latest_active<'a>(
        records: &'a HashMap<Uuid, OtpRecord>,
        key: &OtpKey,
        session_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<&'a OtpRecord> {
        records
            .values()
            .filter(|r| r.key() == *key && r.is_active(now) && r.matches_session(session_token))
            .max_by_key(|r| r.created_at)
    }

    fn check_counts(&self) -> Result<(), DomainError> {
        if self.fail_counts.load(Ordering::SeqCst) {
            return Err(DomainError::internal("Mock count failure"));
        }
        Ok(())
    }
}

impl Default for MockOtpRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpRepository for MockOtpRepository {
    async fn insert_superseding(
        &self,
        record: OtpRecord,
        now: DateTime<Utc>,
    ) -> Result<OtpRecord, DomainError> {
        let mut records = self.records.write().await;
        let key = record.key();
        for existing in records.values_mut() {
            if existing.key() == key && existing.is_active(now) {
                existing.is_used = true;
                existing.updated_at = now;
            }
        }
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn reuse_or_insert(
        &self,
        candidate: OtpRecord,
        now: DateTime<Utc>,
    ) -> Result<(OtpRecord, bool), DomainError> {
        let mut records = self.records.write().await;
        if let Some(active) = Self::latest_active(&records, &candidate.key(), None, now) {
            return Ok((active.clone(), false));
        }
        records.insert(candidate.id, candidate.clone());
        Ok((candidate, true))
    }

    async fn find_active(
        &self,
        key: &OtpKey,
        session_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(Self::latest_active(&records, key, session_token, now).cloned())
    }

    async fn find_by_session(
        &self,
        key: &OtpKey,
        session_token: &str,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.key() == *key && r.matches_session(Some(session_token)))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>, DomainError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn apply_verification(
        &self,
        id: Uuid,
        matched: bool,
        now: DateTime<Utc>,
    ) -> Result<VerificationTransition, DomainError> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&id) else {
            return Ok(VerificationTransition::NotFound);
        };

        if record.is_used {
            return Ok(VerificationTransition::AlreadyUsed);
        }
        if record.is_locked() {
            return Ok(VerificationTransition::Locked(record.clone()));
        }
        if record.is_expired(now) {
            return Ok(VerificationTransition::Expired);
        }

        record.updated_at = now;
        if matched {
            record.is_used = true;
            record.used_at = Some(now);
            Ok(VerificationTransition::Consumed(record.clone()))
        } else {
            record.attempts += 1;
            Ok(VerificationTransition::Mismatch(record.clone()))
        }
    }

    async fn mark_used(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) if !record.is_used => {
                record.is_used = true;
                record.used_at = Some(now);
                record.updated_at = now;
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn count_issued_since(
        &self,
        key: &OtpKey,
        since: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.key() == *key && r.created_at >= since)
            .count() as u64)
    }

    async fn count_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        self.check_counts()?;
        let records = self.records.read().await;
        Ok(records.values().filter(|r| r.expires_at < now).count() as u64)
    }

    async fn count_valid(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        self.check_counts()?;
        let records = self.records.read().await;
        Ok(records.values().filter(|r| r.is_active(now)).count() as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.expires_at >= now);
        Ok((before - records.len()) as u64)
    }
}
