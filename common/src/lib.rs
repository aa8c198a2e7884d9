//! TakeHome Common Types
//!
//! Shared types used across the TakeHome workspace: identifiers, the
//! exchange-rate table, timing constants and the error taxonomy.

pub mod identifiers;
pub mod monetary;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use error::*;
pub use time::*;
