//! Role assignment for an MSM fit.
use crate::msm::errors::{MsmError, MsmResult};

/// Outcome, binary treatment, and confounders by column name.
///
/// The confounders enter both the propensity model and the weighted
/// outcome regression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsmFormula {
    pub outcome: String,
    pub treatment: String,
    pub controls: Vec<String>,
}

impl MsmFormula {
    pub fn new(outcome: impl Into<String>, treatment: impl Into<String>) -> Self {
        Self { outcome: outcome.into(), treatment: treatment.into(), controls: Vec::new() }
    }

    pub fn control(mut self, name: impl Into<String>) -> Self {
        self.controls.push(name.into());
        self
    }

    pub fn controls<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.controls.extend(names.into_iter().map(Into::into));
        self
    }

    /// Outcome regression `[1, T, controls]` plus one residual degree of
    /// freedom.
    pub fn min_rows(&self) -> usize {
        self.controls.len() + 3
    }

    pub fn validate(&self) -> MsmResult<()> {
        let mut seen: Vec<&str> = Vec::new();
        for name in [&self.outcome, &self.treatment].into_iter().chain(self.controls.iter()) {
            if seen.contains(&name.as_str()) {
                return Err(MsmError::OverlappingRoles { name: name.clone() });
            }
            seen.push(name);
        }
        Ok(())
    }
}
