//! # Document Reading Module
//!
//! Turns word-processing documents into the two views the analyzers consume:
//! ordered tables of trimmed cell text, and the flattened text of the whole body.
//! Tables and rows keep the order in which they appear in the source document.
pub mod docx;
pub mod table;

use crate::document::docx::DocxDocument;
use crate::error::AuditError;
use std::path::Path;
use thiserror::Error;

pub use table::Table;

/// Errors raised while opening or decoding a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// File extension is not a supported word-processing format
    #[error("Unsupported document format '{0}'")]
    UnsupportedFormat(String),

    /// A package part the format requires is absent
    #[error("Missing part '{part}' in '{name}'")]
    MissingPart { name: String, part: String },
}

/// Source of tables and raw text for one document.
pub trait DocumentSource {
    /// Returns the name (path or URL) of the document
    fn name(&self) -> String;

    /// Reads every top-level table in document order.
    fn read_tables(&mut self) -> Result<Vec<Table>, AuditError>;

    /// Reads the flattened text of the document body.
    fn read_text(&mut self) -> Result<String, AuditError>;
}

/// Opens a document, choosing the reader from its file extension.
pub fn open_document(file_name: &str) -> Result<Box<dyn DocumentSource>, AuditError> {
    let extension = Path::new(file_name.split(['?', '#']).next().unwrap_or(file_name))
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "docx" | "docm" => Ok(Box::new(DocxDocument::open(file_name)?)),
        _ => Err(DocumentError::UnsupportedFormat(file_name.to_owned()).into()),
    }
}
