//! data — the observation table consumed by every estimator.
//!
//! A [`Dataset`] is built by the caller from already-cleaned columns. The
//! estimators only read from it: they pull the columns named in their
//! formula, validate them, and never mutate or impute.

pub mod dataset;
pub mod errors;
pub mod stratum;

pub use self::dataset::{Column, Dataset};
pub use self::errors::{DataError, DataResult};
pub use self::stratum::StratumLabel;
