//! iv::options — configuration for 2SLS fits.
//!
//! [`TslsOptions`] selects how second-stage standard errors are computed and
//! optionally carries an [`InstrumentStrength`] threshold. The threshold is
//! always supplied by the caller; no weak-instrument cutoff is hardcoded.
use crate::iv::errors::{IvError, IvResult};

/// Residual variance used for the structural standard errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StructuralSe {
    /// Residuals of the second-stage OLS, `Y − X̂β̂`.
    #[default]
    Naive,
    /// Residuals with the observed treatment, `Y − Xβ̂`.
    Corrected,
}

/// Weak-instrument threshold on the joint first-stage F test.
///
/// Instruments pass when `F > min_f` and `p < max_p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentStrength {
    pub min_f: f64,
    pub max_p: f64,
}

impl InstrumentStrength {
    /// # Errors
    /// - [`IvError::InvalidStrength`] if `min_f < 0`, `max_p ∉ (0, 1]`, or
    ///   either value is not finite.
    pub fn new(min_f: f64, max_p: f64) -> IvResult<Self> {
        if !(min_f.is_finite() && min_f >= 0.0 && max_p.is_finite() && max_p > 0.0 && max_p <= 1.0)
        {
            return Err(IvError::InvalidStrength { min_f, max_p });
        }
        Ok(Self { min_f, max_p })
    }

    pub fn passes(&self, f_stat: f64, p_value: f64) -> bool {
        f_stat > self.min_f && p_value < self.max_p
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TslsOptions {
    pub structural_se: StructuralSe,
    pub strength: Option<InstrumentStrength>,
}

impl TslsOptions {
    pub fn new(structural_se: StructuralSe, strength: Option<InstrumentStrength>) -> Self {
        Self { structural_se, strength }
    }
}
