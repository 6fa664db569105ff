//! Error type for dataset construction and column access.

#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    // ---- Construction ----
    /// Column names must be non-empty.
    EmptyName,
    /// A column with this name already exists.
    DuplicateColumn { name: String },
    /// Column length differs from the dataset's row count.
    LengthMismatch { column: String, expected: usize, found: usize },

    // ---- Access ----
    /// Requested column does not exist.
    MissingColumn { name: String },
    /// Requested column holds text where numbers were expected.
    NotNumeric { name: String },
    /// Missing or infinite value in a referenced column.
    NonFinite { column: String, row: usize, value: f64 },
    /// Value outside `{0, 1}` in a column that must be binary.
    NotBinary { column: String, row: usize, value: f64 },
    /// Operation needs at least one row.
    EmptyDataset,
}

pub type DataResult<T> = Result<T, DataError>;

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::EmptyName => write!(f, "Column names must be non-empty"),
            DataError::DuplicateColumn { name } => write!(f, "Duplicate column '{name}'"),
            DataError::LengthMismatch { column, expected, found } => {
                write!(f, "Column '{column}' has {found} rows, dataset has {expected}")
            }
            DataError::MissingColumn { name } => write!(f, "Unknown column '{name}'"),
            DataError::NotNumeric { name } => write!(f, "Column '{name}' is not numeric"),
            DataError::NonFinite { column, row, value } => {
                write!(f, "Column '{column}' has non-finite value {value} at row {row}")
            }
            DataError::NotBinary { column, row, value } => {
                write!(f, "Column '{column}' must be 0/1, found {value} at row {row}")
            }
            DataError::EmptyDataset => write!(f, "Dataset has no rows"),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<DataError> for pyo3::PyErr {
    fn from(err: DataError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
