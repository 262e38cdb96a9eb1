//! Comment Outreach — quota-constrained engagement automation engine.

pub mod activity;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod platform;
pub mod quota;
pub mod reply;
pub mod store;
