use crate::audit::version::VersionToken;
use crate::audit::AnalysisError;
use crate::audit::STEP_COLUMN;
use crate::document::Table;

/// Assigns version tokens, in order, to the `Step #` cell of every data row.
///
/// Returns renumbered copies; the input tables are never modified. The token count must equal the
/// total number of data rows, and every table must have a `Step #` column, otherwise nothing is
/// renumbered.
pub fn reconcile(tables: &[Table], versions: &[VersionToken]) -> Result<Vec<Table>, AnalysisError> {
    let rows: usize = tables.iter().map(Table::len).sum();
    if rows != versions.len() {
        return Err(AnalysisError::CountMismatch {
            versions: versions.len(),
            rows,
        });
    }

    let steps = tables
        .iter()
        .map(|table| table.column_index(STEP_COLUMN))
        .collect::<Result<Vec<_>, _>>()?;

    let mut tokens = versions.iter();
    let reconciled = tables
        .iter()
        .zip(steps)
        .map(|(table, step)| {
            let mut table = table.clone();
            for (row, token) in table.rows.iter_mut().zip(tokens.by_ref()) {
                row[step] = token.to_string();
            }
            table
        })
        .collect();
    Ok(reconciled)
}
