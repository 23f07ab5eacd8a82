//! Database access layer
//!
//! Free-function query modules over the shared pool; one module per table.

pub mod history;
pub mod matrix;
pub mod results;
