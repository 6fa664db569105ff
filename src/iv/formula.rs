//! Role assignment for a 2SLS fit.
use crate::iv::errors::{IvError, IvResult};

/// Outcome, treatment, instruments, and controls by column name.
///
/// Built with [`IvFormula::new`] and the chaining setters, then checked by
/// [`IvFormula::validate`] before any data is touched: at least one
/// instrument, and no column in two roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvFormula {
    pub outcome: String,
    pub treatment: String,
    pub instruments: Vec<String>,
    pub controls: Vec<String>,
}

impl IvFormula {
    pub fn new(outcome: impl Into<String>, treatment: impl Into<String>) -> Self {
        Self {
            outcome: outcome.into(),
            treatment: treatment.into(),
            instruments: Vec::new(),
            controls: Vec::new(),
        }
    }

    pub fn instrument(mut self, name: impl Into<String>) -> Self {
        self.instruments.push(name.into());
        self
    }

    pub fn instruments<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.instruments.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn control(mut self, name: impl Into<String>) -> Self {
        self.controls.push(name.into());
        self
    }

    pub fn controls<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.controls.extend(names.into_iter().map(Into::into));
        self
    }

    /// Minimum number of rows for first-stage estimability.
    pub fn min_rows(&self) -> usize {
        self.instruments.len() + self.controls.len() + 2
    }

    pub fn validate(&self) -> IvResult<()> {
        if self.instruments.is_empty() {
            return Err(IvError::NoInstruments);
        }
        let mut seen: Vec<&str> = Vec::new();
        let all = [&self.outcome, &self.treatment]
            .into_iter()
            .chain(self.instruments.iter())
            .chain(self.controls.iter());
        for name in all {
            if seen.contains(&name.as_str()) {
                return Err(IvError::OverlappingRoles { name: name.clone() });
            }
            seen.push(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Role validation catches missing instruments and reused columns.
    //
    // Given
    // -----
    // - A formula with no instrument; one with the treatment as a control.
    //
    // Expect
    // ------
    // - `NoInstruments`, then `OverlappingRoles { name: "d" }`.
    fn validate_rejects_empty_and_overlapping_roles() {
        assert_eq!(IvFormula::new("y", "d").validate(), Err(IvError::NoInstruments));
        let overlap = IvFormula::new("y", "d").instrument("z").control("d");
        assert_eq!(overlap.validate(), Err(IvError::OverlappingRoles { name: "d".into() }));
        let ok = IvFormula::new("y", "d").instruments(["z1", "z2"]).controls(["x"]);
        assert_eq!(ok.validate(), Ok(()));
        assert_eq!(ok.min_rows(), 5);
    }
}
