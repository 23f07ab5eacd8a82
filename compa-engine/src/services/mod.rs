//! Engine services

pub mod bulk;
pub mod calculator;
pub mod export;
pub mod matrix;
pub mod sheet;

pub use bulk::BulkProcessor;
pub use calculator::Calculator;
pub use matrix::MatrixService;
