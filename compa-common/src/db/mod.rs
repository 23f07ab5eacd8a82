//! Database initialization and persistent models

pub mod init;
pub mod models;

pub use init::*;
pub use models::*;
