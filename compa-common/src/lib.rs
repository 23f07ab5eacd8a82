//! # Compa Common Library
//!
//! Shared code for the compensation adjustment engine:
//! - Error taxonomy (`Error` enum, `Result` alias)
//! - Tenant scope resolution (`Role`, `resolve_tenant_scope`)
//! - Configuration loading
//! - Database initialization, schema, and persistent models
//! - Batch id generation

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod ids;

pub use auth::{resolve_tenant_scope, Role};
pub use error::{Error, Result};
