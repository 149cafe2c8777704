use crate::audit::AnalysisError;
use crate::audit::ACTUAL_COLUMN;
use crate::audit::STEP_COLUMN;
use crate::document::Table;
use serde::Serialize;

/// Decides whether a sentence is written in the present tense.
pub trait TenseClassifier {
    fn is_present_tense(&self, sentence: &str) -> bool;
}

impl<F: Fn(&str) -> bool> TenseClassifier for F {
    fn is_present_tense(&self, sentence: &str) -> bool {
        self(sentence)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenseStatus {
    PresentTense,
    NotPresentTense,
    /// Actual Result cell is empty
    NoSentence,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TenseFinding {
    /// 0-based data row index within the table
    pub row: usize,
    pub step: String,
    pub status: TenseStatus,
}

impl TenseFinding {
    /// Actual results must be recorded, and in the present tense.
    pub fn is_failure(&self) -> bool {
        self.status != TenseStatus::PresentTense
    }
}

/// Classifies the Actual Result of every row. Empty cells never reach the classifier.
pub fn analyze_table(table: &Table, classifier: &dyn TenseClassifier) -> Result<Vec<TenseFinding>, AnalysisError> {
    let [step, actual] = table.columns([STEP_COLUMN, ACTUAL_COLUMN])?;
    let findings = table
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let sentence = cells[actual].trim();
            let status = if sentence.is_empty() {
                TenseStatus::NoSentence
            } else if classifier.is_present_tense(sentence) {
                TenseStatus::PresentTense
            } else {
                TenseStatus::NotPresentTense
            };
            TenseFinding {
                row,
                step: cells[step].to_owned(),
                status,
            }
        })
        .collect();
    Ok(findings)
}
