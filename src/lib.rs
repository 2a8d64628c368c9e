//! Weekly content-approval automation: candidate blog drafts are generated
//! per customer, customers are notified to pick one, and an automatic
//! fallback confirms the first draft when the deadline passes.

pub mod config;
pub mod db;
pub mod generator;
pub mod model;
pub mod notify;
pub mod openai;
pub mod resolver;
pub mod schedule;
pub mod sens;
pub mod tracker;
pub mod week;
