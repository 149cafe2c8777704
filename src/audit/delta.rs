use crate::audit::timestamp::parse_timestamp;
use crate::audit::timestamp::ExecutionStamp;
use crate::audit::AnalysisError;
use crate::audit::EXECUTED_COLUMN;
use crate::audit::STEP_COLUMN;
use crate::document::Table;
use chrono::DateTime;
use chrono::FixedOffset;
use chrono::TimeDelta;
use serde::Serialize;

/// Elapsed time between consecutive steps at or above this many hours is flagged.
pub const THRESHOLD_HOURS: i64 = 1;

/// Result of comparing a row's reference timestamp with the one carried from earlier rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeltaOutcome {
    /// First row of the table with a usable timestamp
    NoPrevious,
    /// Elapsed time below the threshold; `backward` when the clock went back
    Within { elapsed_seconds: i64, backward: bool },
    /// Elapsed time of one hour or more
    ExceedsThreshold { elapsed_seconds: i64 },
    /// Timestamp text matched but could not be parsed
    Invalid { message: String },
}

impl DeltaOutcome {
    /// Whether the outcome should be reported as a problem.
    pub fn is_failure(&self) -> bool {
        match self {
            DeltaOutcome::NoPrevious => false,
            DeltaOutcome::Within { backward, .. } => *backward,
            DeltaOutcome::ExceedsThreshold { .. } | DeltaOutcome::Invalid { .. } => true,
        }
    }
}

/// Delta finding for one data row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeltaFinding {
    /// 0-based data row index within the table
    pub row: usize,
    pub step: String,
    pub stamp: ExecutionStamp,
    pub outcome: DeltaOutcome,
}

/// Accumulator threaded through the rows of one table.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DeltaState {
    reference: Option<DateTime<FixedOffset>>,
}

impl DeltaState {
    /// Folds one row into the state.
    ///
    /// Rows without a reference timestamp produce nothing. A parse failure produces an
    /// `Invalid` outcome and leaves the carried reference as it was.
    pub fn advance(self, stamp: &ExecutionStamp) -> (DeltaState, Option<DeltaOutcome>) {
        let Some(text) = stamp.reference() else {
            return (self, None);
        };
        let current = match parse_timestamp(text) {
            Ok(current) => current,
            Err(error) => return (self, Some(DeltaOutcome::Invalid { message: error.to_string() })),
        };
        let outcome = match self.reference {
            None => DeltaOutcome::NoPrevious,
            Some(previous) => {
                let elapsed = current - previous;
                if elapsed < TimeDelta::hours(THRESHOLD_HOURS) {
                    DeltaOutcome::Within {
                        elapsed_seconds: elapsed.num_seconds(),
                        backward: elapsed < TimeDelta::zero(),
                    }
                } else {
                    DeltaOutcome::ExceedsThreshold {
                        elapsed_seconds: elapsed.num_seconds(),
                    }
                }
            }
        };
        (DeltaState { reference: Some(current) }, Some(outcome))
    }
}

/// Measures elapsed time between consecutive steps of one table.
///
/// State starts empty for every table, so no timestamp carries over between tables.
pub fn analyze_table(table: &Table) -> Result<Vec<DeltaFinding>, AnalysisError> {
    let [step, executed] = table.columns([STEP_COLUMN, EXECUTED_COLUMN])?;
    let (_, findings) = table.rows.iter().enumerate().fold(
        (DeltaState::default(), Vec::new()),
        |(state, mut findings), (row, cells)| {
            let stamp = ExecutionStamp::extract(&cells[executed]);
            let (state, outcome) = state.advance(&stamp);
            if let Some(outcome) = outcome {
                match &outcome {
                    DeltaOutcome::Invalid { message } => {
                        tracing::warn!(table = table.index + 1, step = %cells[step], %message, "unparsable execution timestamp");
                    }
                    DeltaOutcome::Within { backward: true, elapsed_seconds } => {
                        tracing::warn!(table = table.index + 1, step = %cells[step], elapsed_seconds, "execution timestamp earlier than previous step");
                    }
                    _ => (),
                }
                findings.push(DeltaFinding {
                    row,
                    step: cells[step].to_owned(),
                    stamp,
                    outcome,
                });
            }
            (state, findings)
        },
    );
    Ok(findings)
}
