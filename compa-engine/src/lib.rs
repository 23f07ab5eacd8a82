//! # Compa Engine
//!
//! Multi-tenant compensation adjustment engine:
//! - Adjustment matrix store (point lookup + administration + seeding)
//! - Compensation calculator (compa-ratio based increase computation)
//! - Tabular input reader (tolerant workbook parsing)
//! - Bulk processing pipeline (parallel batches, order-preserving results)
//! - Result exporter (annotated workbook generation)
//!
//! Every entry point takes an explicit, already-authorized tenant id; scope
//! resolution lives in `compa_common::auth`.

pub mod db;
pub mod pagination;
pub mod services;
pub mod storage;
pub mod types;

pub use services::{BulkProcessor, Calculator, MatrixService};
pub use storage::FileStorage;
pub use types::{BulkResponse, BulkRowResult, CalcOutcome, CalcRequest};
