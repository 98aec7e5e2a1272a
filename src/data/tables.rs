//! Loading of feature and label tables from disk.
//!
//! The command-line front-ends read headerless numeric CSV: one row per
//! point for the feature table, and a single-column table for labels.

use std::path::Path;

use super::{Feature, Label};

/// Errors that can occur when loading a table.
#[derive(Debug, thiserror::Error)]
pub enum TableLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("table is empty: {0}")]
    Empty(String),

    #[error("ragged table: row {row} has {got} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("label table must have exactly one column, row {row} has {got}")]
    LabelColumns { row: usize, got: usize },
}

/// Load a feature table as a flat row-major buffer plus its column count.
pub fn read_points<F: Feature>(path: &Path) -> Result<(Vec<F>, usize), TableLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut values = Vec::new();
    let mut feature_count = 0usize;
    for (row, record) in reader.deserialize::<Vec<F>>().enumerate() {
        let record = record?;
        if row == 0 {
            feature_count = record.len();
        } else if record.len() != feature_count {
            return Err(TableLoadError::RaggedRow {
                row,
                expected: feature_count,
                got: record.len(),
            });
        }
        values.extend(record);
    }

    if feature_count == 0 {
        return Err(TableLoadError::Empty(path.display().to_string()));
    }
    Ok((values, feature_count))
}

/// Load a single-column label table.
pub fn read_labels(path: &Path) -> Result<Vec<Label>, TableLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut labels = Vec::new();
    for (row, record) in reader.deserialize::<Vec<Label>>().enumerate() {
        let record = record?;
        if record.len() != 1 {
            return Err(TableLoadError::LabelColumns {
                row,
                got: record.len(),
            });
        }
        labels.push(record[0]);
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_points_row_major() {
        let file = write_temp("1.0,2.0\n3.0,4.0\n");
        let (values, features) = read_points::<f64>(file.path()).unwrap();
        assert_eq!(features, 2);
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn rejects_ragged_rows() {
        let file = write_temp("1.0,2.0\n3.0\n");
        let err = read_points::<f64>(file.path()).unwrap_err();
        assert!(matches!(err, TableLoadError::RaggedRow { row: 1, .. }));
    }

    #[test]
    fn reads_labels() {
        let file = write_temp("0\n1\n1\n");
        assert_eq!(read_labels(file.path()).unwrap(), vec![0, 1, 1]);
    }

    #[test]
    fn rejects_wide_label_table() {
        let file = write_temp("0,1\n");
        let err = read_labels(file.path()).unwrap_err();
        assert!(matches!(err, TableLoadError::LabelColumns { row: 0, got: 2 }));
    }
}
