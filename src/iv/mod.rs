//! iv — two-stage least squares, single-sample and stratified.
//!
//! Entry points are [`fit_2sls`] and [`fit_2sls_by_stratum`]. Both take an
//! [`IvFormula`] naming the column roles, a [`Dataset`](crate::data::Dataset),
//! and [`TslsOptions`].

pub mod errors;
pub mod formula;
pub mod options;
pub mod report;
pub mod stratified;
pub mod two_stage;

pub use self::errors::{IvError, IvResult, Stage};
pub use self::formula::IvFormula;
pub use self::options::{InstrumentStrength, StructuralSe, TslsOptions};
pub use self::report::StratumTable;
pub use self::stratified::{StratumFit, StratumOutcome, StratumResult, fit_2sls_by_stratum};
pub use self::two_stage::{FirstStage, SecondStage, TslsFit, fit_2sls};
