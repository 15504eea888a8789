//! Tabular dataset loading for the training pipeline.
//!
//! Loads the raw loan application CSV into an in-memory column-named table.
//! Header names are trimmed on load; categorical text columns can be
//! normalized in place (trim + lowercase) before encoding so that training
//! and inference see identical label spellings.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::PipelineError;

/// Normalize a categorical label: trim surrounding whitespace, lowercase.
///
/// Applied to categorical columns and the target both at fit time and on
/// every inference request. The two stages must agree on this function or
/// encoder lookups silently diverge.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// In-memory tabular dataset: named columns, rows of raw string cells.
///
/// # Example
/// ```no_run
/// use loan_approval::dataset::LoanTable;
///
/// let table = LoanTable::from_csv_path("data/loan_data.csv").unwrap();
/// println!("{} rows, {} columns", table.n_rows(), table.columns().len());
/// ```
#[derive(Debug, Clone)]
pub struct LoanTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LoanTable {
    /// Load a table from a CSV file.
    ///
    /// # Errors
    /// Returns [`PipelineError::DatasetNotFound`] if the file does not exist
    /// and [`PipelineError::InvalidDataset`] if it cannot be parsed.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                PipelineError::DatasetNotFound(path.display().to_string())
            } else {
                PipelineError::Io(err.to_string())
            }
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a table from any CSV reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PipelineError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

        // Clean column names the same way the rest of the pipeline expects
        // to see them.
        let columns: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if columns.is_empty() {
            return Err(PipelineError::InvalidDataset(
                "dataset has no columns".to_string(),
            ));
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            if record.len() != columns.len() {
                return Err(PipelineError::InvalidDataset(format!(
                    "row {} has {} cells, expected {}",
                    rows.len() + 1,
                    record.len(),
                    columns.len()
                )));
            }
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        if rows.is_empty() {
            return Err(PipelineError::InvalidDataset(
                "dataset has no rows".to_string(),
            ));
        }

        Ok(Self { columns, rows })
    }

    /// Column names in original dataset order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cell values of one column, in row order.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidDataset`] if the column does not exist.
    pub fn column(&self, name: &str) -> Result<Vec<&str>, PipelineError> {
        let idx = self.column_index(name).ok_or_else(|| {
            PipelineError::InvalidDataset(format!("dataset has no column '{}'", name))
        })?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// One cell value.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        &self.rows[row][col]
    }

    /// Trim and lowercase every cell of the named columns in place.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidDataset`] if any column is absent.
    pub fn normalize_text_columns(&mut self, names: &[&str]) -> Result<(), PipelineError> {
        for name in names {
            let idx = self.column_index(name).ok_or_else(|| {
                PipelineError::InvalidDataset(format!("dataset has no column '{}'", name))
            })?;
            for row in &mut self.rows {
                row[idx] = normalize_label(&row[idx]);
            }
        }
        Ok(())
    }

    /// Per-column count of empty cells, in column order.
    ///
    /// Diagnostic helper for the `inspect data` tool; the training pipeline
    /// itself treats an empty numeric cell as a fatal parse error.
    pub fn missing_value_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let count = self
                    .rows
                    .iter()
                    .filter(|row| row[idx].trim().is_empty())
                    .count();
                (name.clone(), count)
            })
            .collect()
    }

    /// Count of rows per distinct value of the named column.
    pub fn value_counts(&self, name: &str) -> Result<HashMap<String, usize>, PipelineError> {
        let values = self.column(name)?;
        let mut counts = HashMap::new();
        for value in values {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
loan_id, education ,cibil_score,loan_status
1, Graduate ,750, Approved
2,Not Graduate,,rejected
3,graduate,420,Rejected
";

    fn table() -> LoanTable {
        LoanTable::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_headers_are_trimmed() {
        let t = table();
        assert_eq!(t.columns(), &["loan_id", "education", "cibil_score", "loan_status"]);
    }

    #[test]
    fn test_row_and_column_access() {
        let t = table();
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.column("cibil_score").unwrap(), vec!["750", "", "420"]);
        assert!(t.column("nope").is_err());
    }

    #[test]
    fn test_normalize_text_columns() {
        let mut t = table();
        t.normalize_text_columns(&["education", "loan_status"]).unwrap();
        assert_eq!(
            t.column("education").unwrap(),
            vec!["graduate", "not graduate", "graduate"]
        );
        assert_eq!(
            t.column("loan_status").unwrap(),
            vec!["approved", "rejected", "rejected"]
        );
    }

    #[test]
    fn test_normalize_unknown_column_is_error() {
        let mut t = table();
        assert!(t.normalize_text_columns(&["gender"]).is_err());
    }

    #[test]
    fn test_missing_value_counts() {
        let t = table();
        let counts = t.missing_value_counts();
        assert_eq!(counts[2], ("cibil_score".to_string(), 1));
        assert_eq!(counts[0], ("loan_id".to_string(), 0));
    }

    #[test]
    fn test_value_counts() {
        let mut t = table();
        t.normalize_text_columns(&["loan_status"]).unwrap();
        let counts = t.value_counts("loan_status").unwrap();
        assert_eq!(counts["approved"], 1);
        assert_eq!(counts["rejected"], 2);
    }

    #[test]
    fn test_missing_file_is_dataset_not_found() {
        let err = LoanTable::from_csv_path("no/such/file.csv").unwrap_err();
        assert!(matches!(err, PipelineError::DatasetNotFound(_)));
    }

    #[test]
    fn test_empty_dataset_is_invalid() {
        let err = LoanTable::from_reader("a,b\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDataset(_)));
    }

    #[test]
    fn test_ragged_row_is_invalid() {
        // csv itself rejects rows with a different cell count
        let result = LoanTable::from_reader("a,b\n1,2\n3\n".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Graduate "), "graduate");
        assert_eq!(normalize_label("NO"), "no");
        assert_eq!(normalize_label("approved"), "approved");
    }
}
