use crate::audit::AnalysisError;
use crate::audit::ACTUAL_COLUMN;
use crate::audit::EXPECTED_COLUMN;
use crate::audit::RESULT_COLUMN;
use crate::audit::STEP_COLUMN;
use crate::document::Table;
use serde::Serialize;

/// A step recorded as failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedStep {
    pub row: usize,
    pub step: String,
    pub expected: String,
    pub actual: String,
}

/// Collects the rows whose `Pass/Fail` cell reads `fail`, in any case.
pub fn failed_steps(table: &Table) -> Result<Vec<FailedStep>, AnalysisError> {
    let [step, expected, actual, result] =
        table.columns([STEP_COLUMN, EXPECTED_COLUMN, ACTUAL_COLUMN, RESULT_COLUMN])?;
    let failed = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, cells)| cells[result].eq_ignore_ascii_case("fail"))
        .map(|(row, cells)| FailedStep {
            row,
            step: cells[step].to_owned(),
            expected: cells[expected].to_owned(),
            actual: cells[actual].to_owned(),
        })
        .collect();
    Ok(failed)
}
