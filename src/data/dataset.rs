//! data::dataset — row-aligned table of named columns.
//!
//! Purpose
//! -------
//! Hold the cleaned observation table handed over by the preprocessing
//! layer: one row per team-fixture-round, numeric columns for outcome,
//! treatment, instruments and controls, and a numeric or text stratum
//! column.
//!
//! Key behaviors
//! -------------
//! - Columns are added by name; every column must have the same length.
//! - [`Dataset::numeric`] returns a column after checking that every value is
//!   finite. Missing values are the caller's responsibility and are
//!   reported, never imputed.
//! - [`Dataset::partition_by`] splits the table into per-stratum datasets
//!   sorted by [`StratumLabel`], independent of input row order.
//!
//! Invariants & assumptions
//! ------------------------
//! - Column order is insertion order; names are unique and non-empty.
//! - Row subsets keep the original relative row order.
use crate::data::{
    errors::{DataError, DataResult},
    stratum::StratumLabel,
};
use ndarray::{Array1, ArrayView1};
use std::collections::BTreeMap;

/// Storage for a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Array1<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&r| v[r]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }

    fn label(&self, row: usize, name: &str) -> DataResult<StratumLabel> {
        match self {
            Column::Numeric(v) => {
                let value = v[row];
                if !value.is_finite() {
                    return Err(DataError::NonFinite { column: name.to_string(), row, value });
                }
                Ok(StratumLabel::from(value))
            }
            Column::Text(v) => Ok(StratumLabel::Text(v[row].clone())),
        }
    }
}

/// Named, row-aligned columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    nrows: usize,
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Dataset::add_numeric`].
    pub fn with_numeric(
        mut self, name: &str, values: impl Into<Array1<f64>>,
    ) -> DataResult<Self> {
        self.add_numeric(name, values)?;
        Ok(self)
    }

    /// Builder-style [`Dataset::add_text`].
    pub fn with_text<S: Into<String>>(
        mut self, name: &str, values: impl IntoIterator<Item = S>,
    ) -> DataResult<Self> {
        self.add_text(name, values)?;
        Ok(self)
    }

    pub fn add_numeric(&mut self, name: &str, values: impl Into<Array1<f64>>) -> DataResult<()> {
        self.push(name, Column::Numeric(values.into()))
    }

    pub fn add_text<S: Into<String>>(
        &mut self, name: &str, values: impl IntoIterator<Item = S>,
    ) -> DataResult<()> {
        self.push(name, Column::Text(values.into_iter().map(Into::into).collect()))
    }

    fn push(&mut self, name: &str, column: Column) -> DataResult<()> {
        if name.is_empty() {
            return Err(DataError::EmptyName);
        }
        if self.names.iter().any(|n| n == name) {
            return Err(DataError::DuplicateColumn { name: name.to_string() });
        }
        if self.names.is_empty() {
            self.nrows = column.len();
        } else if column.len() != self.nrows {
            return Err(DataError::LengthMismatch {
                column: name.to_string(),
                expected: self.nrows,
                found: column.len(),
            });
        }
        self.names.push(name.to_string());
        self.columns.push(column);
        Ok(())
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> DataResult<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| DataError::MissingColumn { name: name.to_string() })
    }

    /// Numeric column with every value checked to be finite.
    pub fn numeric(&self, name: &str) -> DataResult<ArrayView1<'_, f64>> {
        match self.column(name)? {
            Column::Numeric(v) => {
                if let Some(row) = v.iter().position(|x| !x.is_finite()) {
                    return Err(DataError::NonFinite {
                        column: name.to_string(),
                        row,
                        value: v[row],
                    });
                }
                Ok(v.view())
            }
            Column::Text(_) => Err(DataError::NotNumeric { name: name.to_string() }),
        }
    }

    /// Numeric column restricted to `{0, 1}`.
    pub fn binary(&self, name: &str) -> DataResult<ArrayView1<'_, f64>> {
        let v = self.numeric(name)?;
        if let Some(row) = v.iter().position(|&x| x != 0.0 && x != 1.0) {
            return Err(DataError::NotBinary { column: name.to_string(), row, value: v[row] });
        }
        Ok(v)
    }

    /// New dataset holding `rows` (in the given order) of every column.
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            nrows: rows.len(),
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.select(rows)).collect(),
        }
    }

    /// Split by the distinct values of `column`, ascending by label.
    ///
    /// Each partition keeps its rows in their original relative order.
    pub fn partition_by(&self, column: &str) -> DataResult<Vec<(StratumLabel, Dataset)>> {
        let col = self.column(column)?;
        let mut groups: BTreeMap<StratumLabel, Vec<usize>> = BTreeMap::new();
        for row in 0..self.nrows {
            groups.entry(col.label(row, column)?).or_default().push(row);
        }
        Ok(groups.into_iter().map(|(label, rows)| (label, self.select_rows(&rows))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction checks (names, duplicates, lengths).
    // - Finite/binary validation on access.
    // - Stratum partitioning order and row preservation.
    // -------------------------------------------------------------------------

    fn sample() -> Dataset {
        Dataset::new()
            .with_numeric("y", array![1.0, 2.0, 3.0, 4.0])
            .and_then(|d| d.with_numeric("stage", array![2.0, 1.0, 2.0, 10.0]))
            .and_then(|d| d.with_text("cup", ["a", "b", "a", "b"]))
            .expect("valid dataset")
    }

    #[test]
    // Purpose
    // -------
    // Columns must share one length and have unique, non-empty names.
    //
    // Given
    // -----
    // - A 4-row dataset, then a 3-row column, a duplicate, and an empty name.
    //
    // Expect
    // ------
    // - `LengthMismatch`, `DuplicateColumn`, `EmptyName`.
    fn add_column_enforces_shape_and_names() {
        let mut data = sample();
        assert_eq!(
            data.add_numeric("x", array![1.0, 2.0, 3.0]),
            Err(DataError::LengthMismatch { column: "x".into(), expected: 4, found: 3 })
        );
        assert_eq!(
            data.add_numeric("y", Array1::<f64>::zeros(4)),
            Err(DataError::DuplicateColumn { name: "y".into() })
        );
        assert_eq!(data.add_numeric("", Array1::<f64>::zeros(4)), Err(DataError::EmptyName));
        assert_eq!(data.nrows(), 4);
        assert_eq!(data.column_names(), ["y", "stage", "cup"]);
    }

    #[test]
    // Purpose
    // -------
    // Missing values and non-binary entries are reported with their row.
    //
    // Given
    // -----
    // - A column with NaN at row 1 and a column with 2.0 at row 2.
    //
    // Expect
    // ------
    // - `NonFinite { row: 1 }` and `NotBinary { row: 2 }`.
    fn numeric_access_reports_offending_rows() {
        let data = Dataset::new()
            .with_numeric("x", array![0.0, f64::NAN, 1.0])
            .and_then(|d| d.with_numeric("d", array![0.0, 1.0, 2.0]))
            .expect("valid dataset");
        assert!(matches!(data.numeric("x"), Err(DataError::NonFinite { row: 1, .. })));
        assert!(matches!(data.binary("d"), Err(DataError::NotBinary { row: 2, .. })));
        assert!(matches!(data.numeric("missing"), Err(DataError::MissingColumn { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Partitions come out sorted ascending with rows in original order.
    //
    // Given
    // -----
    // - Stage labels 2, 1, 2, 10.
    //
    // Expect
    // ------
    // - Labels 1, 2, 10; stage 2 holds y = [1, 3].
    fn partition_by_sorts_labels_and_keeps_row_order() {
        let parts = sample().partition_by("stage").expect("numeric labels");
        let labels: Vec<String> = parts.iter().map(|(l, _)| l.to_string()).collect();
        assert_eq!(labels, ["1", "2", "10"]);
        assert_eq!(parts[1].1.numeric("y").expect("y").to_vec(), vec![1.0, 3.0]);
    }

    #[test]
    fn partition_by_text_column_and_rejects_text_as_numeric() {
        let data = sample();
        let parts = data.partition_by("cup").expect("text labels");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].1.nrows(), 2);
        assert!(matches!(data.numeric("cup"), Err(DataError::NotNumeric { .. })));
    }

    #[test]
    // Purpose
    // -------
    // A stage coded both `0.0` and `-0.0` is a single stratum.
    //
    // Given
    // -----
    // - Stage values 0.0, -0.0, 1.0, -0.0.
    //
    // Expect
    // ------
    // - Two partitions labelled "0" and "1"; the first holds three rows.
    fn partition_by_merges_signed_zero() {
        let data = Dataset::new()
            .with_numeric("stage", array![0.0, -0.0, 1.0, -0.0])
            .and_then(|d| d.with_numeric("y", array![1.0, 2.0, 3.0, 4.0]))
            .expect("valid dataset");
        let parts = data.partition_by("stage").expect("numeric labels");
        let labels: Vec<String> = parts.iter().map(|(l, _)| l.to_string()).collect();
        assert_eq!(labels, ["0", "1"]);
        assert_eq!(parts[0].1.numeric("y").expect("y").to_vec(), vec![1.0, 2.0, 4.0]);
        assert_eq!(parts[0].0, StratumLabel::from(-0.0_f64));
    }
}
