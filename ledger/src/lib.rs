//! TakeHome Ledger
//!
//! Persistence for the earnings service: the append-only calculation history,
//! user profiles and login sessions. Backed by Postgres in production and by
//! an in-memory store in tests.

pub mod record;
pub mod user;
pub mod store;
pub mod memory;
pub mod postgres;

pub use record::{CalculationRecord, NewCalculation};
pub use user::{ProfileUpdate, User};
pub use store::{CalculationStore, SessionStore, Storage, UserStore};
pub use memory::MemoryStorage;
pub use postgres::PgStorage;
