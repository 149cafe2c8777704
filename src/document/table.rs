use crate::audit::AnalysisError;
use serde::Serialize;

/// One table of a document: a header row naming the columns followed by data rows.
///
/// Every data row holds exactly `header.len()` cells.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Table {
    /// 0-based position of the table in the document
    pub index: usize,
    /// Column names taken from the first row
    pub header: Vec<String>,
    /// Data rows, one cell per header column
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table from a raw grid whose first row is the header.
    /// Rows are padded or truncated to the header width; an empty grid yields an empty table.
    pub fn from_grid(index: usize, grid: Vec<Vec<String>>) -> Table {
        let mut rows = grid.into_iter();
        let header = rows.next().unwrap_or_default();
        let width = header.len();
        let rows = rows
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Table { index, header, rows }
    }

    /// Number of data rows (the header is not counted).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first header cell equal to `name`.
    pub fn column_index(&self, name: &str) -> Result<usize, AnalysisError> {
        self.header
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| AnalysisError::MissingColumn {
                table: self.index,
                column: name.to_owned(),
            })
    }

    /// Resolves several columns at once, failing on the first missing one.
    pub fn columns<const N: usize>(&self, names: [&str; N]) -> Result<[usize; N], AnalysisError> {
        let mut indexes = [0usize; N];
        for (slot, name) in indexes.iter_mut().zip(names) {
            *slot = self.column_index(name)?;
        }
        Ok(indexes)
    }
}
