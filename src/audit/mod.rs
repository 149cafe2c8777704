//! # Step Analysis Module
//!
//! Reconciles step identifiers with the version tokens of a document and checks every step for
//! execution-time gaps, screenshot evidence, recorded failures and, when a classifier is supplied,
//! the tense of the actual results.
//!
//! Tables are processed in document order and rows in row order. Structural problems
//! (`CountMismatch`, `MissingColumn`) abort only the operation they arise in; malformed timestamps
//! and unreachable links become findings on their row.
pub mod attachment;
pub mod delta;
pub mod probe;
pub mod reconcile;
pub mod results;
pub mod tense;
pub mod timestamp;
pub mod version;

use crate::audit::probe::HttpProbe;
use crate::audit::probe::NoProbe;
use crate::audit::probe::ReachabilityProbe;
use crate::audit::reconcile::reconcile;
use crate::audit::tense::TenseClassifier;
use crate::audit::version::extract_versions;
use crate::document::DocumentSource;
use crate::document::Table;
use crate::error::AuditError;
use crate::options::AuditOptions;
use crate::report::AuditReport;
use crate::report::Reconciliation;
use crate::report::TableReport;
use thiserror::Error;

pub const STEP_COLUMN: &str = "Step #";
pub const EXECUTED_COLUMN: &str = "Executed By & Date";
pub const PROCEDURE_COLUMN: &str = "Test Procedure";
pub const ACTUAL_COLUMN: &str = "Actual Result";
pub const EXPECTED_COLUMN: &str = "Expected Result";
pub const RESULT_COLUMN: &str = "Pass/Fail";

/// Errors raised by the analyzers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Number of version tokens differs from the number of data rows
    #[error("Found {versions} version tokens for {rows} data rows")]
    CountMismatch { versions: usize, rows: usize },

    /// A required header is absent from a table
    #[error("Missing column '{column}' in table {}", .table + 1)]
    MissingColumn { table: usize, column: String },

    /// Timestamp text matched the coarse pattern but is not a valid date-time
    #[error("Invalid timestamp '{text}': {message}")]
    TimestampParse { text: String, message: String },
}

/// Runs every analysis over a document.
pub struct Auditor {
    probe: Box<dyn ReachabilityProbe>,
    tense: Option<Box<dyn TenseClassifier>>,
}

impl Auditor {
    pub fn new(probe: Box<dyn ReachabilityProbe>) -> Auditor {
        Auditor { probe, tense: None }
    }

    /// Enables the tense check of actual results.
    pub fn with_tense_classifier(mut self, classifier: Box<dyn TenseClassifier>) -> Auditor {
        self.tense = Some(classifier);
        self
    }

    /// Builds an auditor that probes links over HTTP unless probing is disabled.
    pub fn from_options(options: &AuditOptions) -> Result<Auditor, AuditError> {
        let probe: Box<dyn ReachabilityProbe> = if options.probe_links {
            Box::new(HttpProbe::new()?)
        } else {
            Box::new(NoProbe)
        };
        Ok(Auditor::new(probe))
    }

    /// Audits one document.
    ///
    /// A failed reconciliation is recorded in the report and the analyzers then work with the
    /// step identifiers written in the document.
    pub fn audit(&self, source: &mut dyn DocumentSource) -> Result<AuditReport, AuditError> {
        let name = source.name();
        let tables = source.read_tables()?;
        let versions = extract_versions(&source.read_text()?);
        tracing::info!(document = %name, tables = tables.len(), versions = versions.len(), "auditing document");

        let (tables, reconciliation) = match reconcile(&tables, &versions) {
            Ok(reconciled) => (reconciled, Reconciliation::Renumbered { steps: versions.len() }),
            Err(error) => {
                tracing::warn!(document = %name, %error, "step identifiers not reconciled");
                (tables, Reconciliation::Failed { error: error.to_string() })
            }
        };

        Ok(AuditReport {
            document: name,
            versions,
            reconciliation,
            tables: tables.iter().map(|table| self.audit_table(table)).collect(),
        })
    }

    /// Runs each analyzer on one table; a missing column stops only the analyzer that needs it.
    pub fn audit_table(&self, table: &Table) -> TableReport {
        let mut errors = Vec::<String>::new();
        let mut record = |error: AnalysisError| {
            tracing::warn!(%error, "table analysis skipped");
            let message = error.to_string();
            if !errors.contains(&message) {
                errors.push(message);
            }
        };

        let steps = match table.column_index(STEP_COLUMN) {
            Ok(step) => table.rows.iter().map(|cells| cells[step].to_owned()).collect(),
            Err(error) => {
                record(error);
                Vec::new()
            }
        };
        let deltas = delta::analyze_table(table).unwrap_or_else(|error| {
            record(error);
            Vec::new()
        });
        let attachments = attachment::analyze_table(table, self.probe.as_ref()).unwrap_or_else(|error| {
            record(error);
            Vec::new()
        });
        let failures = results::failed_steps(table).unwrap_or_else(|error| {
            record(error);
            Vec::new()
        });
        let tenses = match &self.tense {
            Some(classifier) => tense::analyze_table(table, classifier.as_ref()).unwrap_or_else(|error| {
                record(error);
                Vec::new()
            }),
            None => Vec::new(),
        };

        TableReport {
            index: table.index,
            steps,
            deltas,
            attachments,
            failures,
            tenses,
            errors,
        }
    }
}
