//! iv::stratified — independent 2SLS fits per stratum.
//!
//! Purpose
//! -------
//! Run [`fit_2sls`] once per distinct value of a stratum column (for example
//! a competition round) without letting one bad stratum abort the batch.
//!
//! Key behaviors
//! -------------
//! - Strata come out in ascending label order: numeric labels numerically,
//!   text labels lexicographically, numeric before text.
//! - Each stratum yields a [`StratumFit`] whose outcome is either a complete
//!   [`TslsFit`] or the typed [`IvError`] that stopped it.
//! - Only problems that affect every stratum (invalid formula, missing
//!   stratum column) fail the call as a whole.
//!
//! Invariants & assumptions
//! ------------------------
//! - Results never pool information across strata.
//! - Per-stratum estimates do not depend on the row order of the input.
use crate::{
    data::{Dataset, StratumLabel},
    iv::{
        errors::{IvError, IvResult},
        formula::IvFormula,
        options::TslsOptions,
        two_stage::{TslsFit, fit_2sls},
    },
};

/// Fit or failure for one stratum.
#[derive(Debug, Clone, PartialEq)]
pub enum StratumOutcome<T, E> {
    Fitted(T),
    Failed(E),
}

impl<T, E> StratumOutcome<T, E> {
    pub fn fitted(&self) -> Option<&T> {
        match self {
            StratumOutcome::Fitted(fit) => Some(fit),
            StratumOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            StratumOutcome::Fitted(_) => None,
            StratumOutcome::Failed(err) => Some(err),
        }
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self, StratumOutcome::Fitted(_))
    }
}

impl<T, E> From<Result<T, E>> for StratumOutcome<T, E> {
    fn from(res: Result<T, E>) -> Self {
        match res {
            Ok(fit) => StratumOutcome::Fitted(fit),
            Err(err) => StratumOutcome::Failed(err),
        }
    }
}

/// Labelled per-stratum result.
#[derive(Debug, Clone, PartialEq)]
pub struct StratumResult<T, E> {
    pub label: StratumLabel,
    /// Rows in the stratum, reported even when the fit failed.
    pub nrows: usize,
    pub outcome: StratumOutcome<T, E>,
}

pub type StratumFit = StratumResult<TslsFit, IvError>;

/// Fit 2SLS separately within every stratum of `stratum_column`.
///
/// # Errors
/// - Formula errors, and [`IvError::Data`] when the stratum column is
///   missing or holds a non-finite value. Per-stratum failures are returned
///   inside the vector instead.
pub fn fit_2sls_by_stratum(
    formula: &IvFormula, data: &Dataset, stratum_column: &str, opts: &TslsOptions,
) -> IvResult<Vec<StratumFit>> {
    formula.validate()?;
    let parts = data.partition_by(stratum_column)?;
    Ok(parts
        .into_iter()
        .map(|(label, part)| StratumResult {
            label,
            nrows: part.nrows(),
            outcome: fit_2sls(formula, &part, opts).into(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iv::errors::Stage;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Ascending stratum order independent of input order.
    // - Partial-failure semantics for singular and undersized strata.
    // - Whole-call failure for a missing stratum column.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Degenerate and undersized strata are reported as failed while the
    // others fit.
    //
    // Given
    // -----
    // - Stage 2 listed first in the rows; stage 1 has a constant instrument;
    //   stage 3 has two rows, below the three needed for one instrument and
    //   no controls.
    //
    // Expect
    // ------
    // - Three entries ordered [1, 2, 3]; stage 1 failed with a first-stage
    //   singularity, stage 2 fitted, stage 3 failed with `InsufficientData`.
    fn degenerate_strata_fail_without_aborting_the_batch() {
        let data = Dataset::new()
            .with_numeric("stage", array![2.0, 2.0, 2.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0, 3.0, 3.0])
            .and_then(|d| {
                d.with_numeric("z", array![0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0])
            })
            .and_then(|d| {
                d.with_numeric("d", array![0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0])
            })
            .and_then(|d| {
                d.with_numeric("y", array![1.0, 2.5, 3.0, 2.0, 1.5, 1.0, 2.0, 3.0, 0.0, 0.5, 2.0])
            })
            .expect("valid dataset");
        let formula = IvFormula::new("y", "d").instrument("z");

        let results = fit_2sls_by_stratum(&formula, &data, "stage", &TslsOptions::default())
            .expect("stratum column present");

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].label, StratumLabel::from(1.0_f64));
        assert!(matches!(
            results[0].outcome.error(),
            Some(IvError::SingularDesign { stage: Stage::First, .. })
        ));
        assert_eq!(results[0].nrows, 4);
        assert!(results[1].outcome.is_fitted());
        assert_eq!(results[2].label, StratumLabel::from(3.0_f64));
        assert_eq!(results[2].nrows, 2);
        assert!(matches!(
            results[2].outcome.error(),
            Some(IvError::InsufficientData { nobs: 2, required: 3 })
        ));
    }

    #[test]
    fn missing_stratum_column_fails_the_call() {
        let data = Dataset::new().with_numeric("y", array![1.0, 2.0]).expect("valid dataset");
        let formula = IvFormula::new("y", "d").instrument("z");
        let err = fit_2sls_by_stratum(&formula, &data, "stage", &TslsOptions::default())
            .expect_err("no stage column");
        assert!(matches!(err, IvError::Data(_)));
    }
}
