//! Database module: entity models and SQL repositories.
//!
//! - `model`: query-shaped view models returned by repositories.
//! - `repo`: SQL-only functions mapping rows into domain types.
//!
//! Callers import from `draftbot::db`; the repository API is re-exported
//! here.

pub mod model;
pub mod repo;

pub use model::UsedTopic;
pub use repo::*;
