//! regression — least-squares building blocks shared by the estimators.
//!
//! - [`design`]: named design matrices and the rank-checked Gram inverse.
//! - [`ols`]: OLS/WLS fits with classical inference and F tests.
//! - [`vif`]: variance inflation factors for collinearity diagnostics.

pub mod design;
pub mod errors;
pub mod ols;
pub mod vif;

pub use self::design::{DesignMatrix, INTERCEPT, RANK_TOL, invert_gram};
pub use self::errors::{RegressionError, RegressionResult};
pub use self::ols::{FTest, OlsFit, coefficient_tests, fit_ols, fit_wls};
pub use self::vif::variance_inflation;
