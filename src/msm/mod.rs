//! msm — marginal structural models by inverse probability weighting.
//!
//! Entry points are [`fit_msm`] and [`fit_msm_by_stratum`]. Each fit
//! estimates a logistic propensity model, turns it into IPTW weights, and
//! regresses the outcome on treatment and confounders by weighted least
//! squares. Propensities that cannot be estimated or that fall outside the
//! configured bounds are errors unless [`Trimming::Clip`] is requested.

pub mod errors;
pub mod formula;
pub mod iptw;
pub mod model;
pub mod options;
pub mod propensity;
pub mod report;

pub use self::errors::{MsmError, MsmResult, MsmStep};
pub use self::formula::MsmFormula;
pub use self::iptw::{bound_propensities, iptw_weights};
pub use self::model::{MsmFit, MsmStratumFit, fit_msm, fit_msm_by_stratum};
pub use self::options::{DEFAULT_TRIM, MsmOptions, Trimming, propensity_mle_options};
pub use self::propensity::{LogisticLikelihood, PropensityFit, fit_propensity};
pub use self::report::MsmTable;
