//! In-memory storage backend.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use parking_lot::RwLock;
use takehome_common::{now, CalculationId, Result, TakeHomeError, Timestamp, UserId};
use uuid::Uuid;

use crate::record::{CalculationRecord, NewCalculation};
use crate::store::{CalculationStore, SessionStore, UserStore};
use crate::user::{ProfileUpdate, User};

/// Process-local storage. Used by tests and for running without a database.
pub struct MemoryStorage {
    calculations: RwLock<Vec<CalculationRecord>>,
    next_id: AtomicI64,
    users: DashMap<UserId, User>,
    sessions: DashMap<String, (UserId, Timestamp)>,
    unavailable: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            calculations: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            users: DashMap::new(),
            sessions: DashMap::new(),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Insert or replace a user.
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Open a session for `user_id` valid for `ttl`; returns the session id.
    pub fn create_session(&self, user_id: UserId, ttl: Duration) -> String {
        let sid = Uuid::new_v4().to_string();
        self.sessions.insert(sid.clone(), (user_id, now() + ttl));
        sid
    }

    /// Make every operation fail with a database error, as if the store were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Total number of stored calculations across all users.
    pub fn calculation_count(&self) -> usize {
        self.calculations.read().len()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TakeHomeError::Database("storage unavailable".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalculationStore for MemoryStorage {
    async fn create_calculation(&self, calculation: NewCalculation) -> Result<CalculationRecord> {
        self.check_available()?;

        if !self.users.contains_key(&calculation.user_id) {
            return Err(TakeHomeError::Database(format!(
                "user {} does not exist",
                calculation.user_id
            )));
        }

        let id = CalculationId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = calculation.into_record(id, now());
        self.calculations.write().push(record.clone());

        Ok(record)
    }

    async fn history(&self, user_id: &UserId, limit: i64) -> Result<Vec<CalculationRecord>> {
        self.check_available()?;

        let mut records: Vec<CalculationRecord> = self
            .calculations
            .read()
            .iter()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        records.truncate(limit.max(0) as usize);

        Ok(records)
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        self.check_available()?;
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<User> {
        self.check_available()?;

        let mut user = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| TakeHomeError::NotFound(format!("user {}", user_id)))?;
        user.apply(update);

        Ok(user.clone())
    }
}

#[async_trait]
impl SessionStore for MemoryStorage {
    async fn resolve_session(&self, sid: &str) -> Result<Option<UserId>> {
        self.check_available()?;

        Ok(self
            .sessions
            .get(sid)
            .filter(|entry| entry.1 > now())
            .map(|entry| entry.0.clone()))
    }
}
