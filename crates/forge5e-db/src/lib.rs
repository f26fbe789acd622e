//! PostgreSQL persistence for saved characters and progression plans.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
