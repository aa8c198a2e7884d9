//! Storage traits implemented by the Postgres and in-memory backends.

use async_trait::async_trait;
use takehome_common::{Result, UserId};

use crate::record::{CalculationRecord, NewCalculation};
use crate::user::{ProfileUpdate, User};

/// Append-only calculation history.
#[async_trait]
pub trait CalculationStore: Send + Sync {
    /// Append one calculation and return it with its id and timestamp.
    async fn create_calculation(&self, calculation: NewCalculation) -> Result<CalculationRecord>;

    /// A user's most recent calculations, newest first, at most `limit`.
    async fn history(&self, user_id: &UserId, limit: i64) -> Result<Vec<CalculationRecord>>;
}

/// User profiles.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Apply a profile update. Fails with `NotFound` for unknown users.
    async fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<User>;
}

/// Login sessions written by the identity provider.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// User owning an unexpired session, if any.
    async fn resolve_session(&self, sid: &str) -> Result<Option<UserId>>;
}

/// Everything the HTTP service needs from persistence.
pub trait Storage: CalculationStore + UserStore + SessionStore {}

impl<T: CalculationStore + UserStore + SessionStore> Storage for T {}
