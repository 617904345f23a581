//! Pairwise-voting wiki survey.
//!
//! Participants pick the better of two ideas attached to a question, propose
//! new ideas and comment. Every text gets a sentiment label, votes are kept
//! one per participant per question, and per-question sentiment snapshots
//! are refreshed after each write.

pub mod analytics;
pub mod config;
pub mod context;
pub mod corpus;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod profile;
pub mod ranking;
pub mod routes;
pub mod sentiment;
pub mod store;
pub mod survey;

pub use error::{Error, Result};
pub use survey::Survey;
