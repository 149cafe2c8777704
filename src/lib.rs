//! # Test Execution Report Auditor
//!
//! Audits test-execution reports written as tables inside word-processing documents
//! (`.docx`, `.docm`). Each table row is a test step.
//!
//! ## Features
//!
//! - **Step reconciliation**: dotted four-part version tokens found in the document text are sorted
//!   numerically and assigned, one per row, as the canonical `Step #` of every table
//! - **Execution timestamps**: `Executed By & Date` cells are scanned for single timestamps or
//!   `New Value` / `Old Value` revision pairs, read at a fixed UTC+05:30 offset
//! - **Elapsed-time checks**: steps started an hour or more after the previous step of the same
//!   table are flagged; clocks running backwards are reported too
//! - **Screenshot evidence**: steps claiming an uploaded attachment must carry a clickable link,
//!   which is probed with an HTTP `HEAD` request
//! - **Failed steps**: rows marked `Fail` are listed with their expected and actual results
//! - **Tense check**: with a caller-supplied classifier, actual results are checked for present tense
//! - **Pure Rust document reading**: documents are read straight from the ZIP package, local or
//!   downloaded over http(s)
pub mod audit;
pub mod document;
pub mod error;
mod helpers;
pub mod options;
pub mod report;

pub use audit::Auditor;
pub use document::open_document;
pub use document::DocumentSource;
pub use error::AuditError;
pub use options::AuditOptions;
pub use report::AuditReport;
