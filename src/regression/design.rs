//! regression::design — design matrices and the normal-equation solver.
//!
//! Purpose
//! -------
//! Assemble `[1, x₁, …, x_p]` design matrices from named columns and invert
//! Gram matrices `XᵀX` with an explicit rank check, so every estimator
//! reports rank deficiency as an error instead of returning coefficients
//! from a singular system.
//!
//! Key behaviors
//! -------------
//! - [`DesignMatrix::with_intercept`] prepends a constant column named
//!   `"const"`.
//! - [`invert_gram`] scales `XᵀX` to unit diagonal, takes a symmetric
//!   eigendecomposition, and declares the design singular when the smallest
//!   eigenvalue is at most [`RANK_TOL`] times the largest. Otherwise it
//!   returns `(XᵀX)⁻¹` assembled from the eigenpairs.
//!
//! Invariants & assumptions
//! ------------------------
//! - Scaling makes the rank test invariant to the units of each column; a
//!   constant instrument is collinear with the intercept whatever its
//!   level.
//! - An all-zero column is singular without any eigen work.
use crate::regression::errors::{RegressionError, RegressionResult};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Relative eigenvalue threshold below which a scaled Gram matrix is
/// treated as rank deficient.
pub const RANK_TOL: f64 = 1e-10;

/// Name given to the intercept column.
pub const INTERCEPT: &str = "const";

/// Dense `n × p` regressor matrix with column names.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    names: Vec<String>,
    x: Array2<f64>,
}

impl DesignMatrix {
    /// Stack `columns` next to a leading constant column.
    ///
    /// # Errors
    /// - [`RegressionError::DimensionMismatch`] if the columns differ in length.
    pub fn with_intercept(columns: &[(&str, ArrayView1<'_, f64>)]) -> RegressionResult<Self> {
        let n = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut x = Array2::<f64>::ones((n, columns.len() + 1));
        let mut names = Vec::with_capacity(columns.len() + 1);
        names.push(INTERCEPT.to_string());
        for (j, (name, col)) in columns.iter().enumerate() {
            if col.len() != n {
                return Err(RegressionError::DimensionMismatch { expected: n, found: col.len() });
            }
            x.column_mut(j + 1).assign(col);
            names.push((*name).to_string());
        }
        Ok(Self { names, x })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    /// Index of the column called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Same design with column `j` removed.
    pub fn without_column(&self, j: usize) -> DesignMatrix {
        let keep: Vec<usize> = (0..self.ncols()).filter(|&k| k != j).collect();
        DesignMatrix {
            names: keep.iter().map(|&k| self.names[k].clone()).collect(),
            x: self.x.select(Axis(1), &keep),
        }
    }

    /// Same design restricted to the listed columns, in that order.
    pub fn select_columns(&self, cols: &[usize]) -> DesignMatrix {
        DesignMatrix {
            names: cols.iter().map(|&k| self.names[k].clone()).collect(),
            x: self.x.select(Axis(1), cols),
        }
    }
}

/// Invert a Gram matrix after checking that it has full rank.
///
/// `names` is only used to label a [`RegressionError::SingularDesign`].
pub fn invert_gram(gram: &Array2<f64>, names: &[String]) -> RegressionResult<Array2<f64>> {
    let p = gram.nrows();
    let singular = |rank: usize| RegressionError::SingularDesign {
        rank,
        ncols: p,
        columns: names.to_vec(),
    };

    let diag: Array1<f64> = gram.diag().to_owned();
    let zero_cols = diag.iter().filter(|&&d| !(d > 0.0) || !d.is_finite()).count();
    if zero_cols > 0 {
        return Err(singular(p - zero_cols));
    }
    let scale = diag.mapv(|d| 1.0 / d.sqrt());

    let mut scaled = DMatrix::<f64>::zeros(p, p);
    for i in 0..p {
        for j in 0..p {
            scaled[(i, j)] = gram[[i, j]] * scale[i] * scale[j];
        }
    }
    let eigen = scaled.symmetric_eigen();
    let lambda_max = eigen.eigenvalues.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let cutoff = RANK_TOL * lambda_max;
    let rank = eigen.eigenvalues.iter().filter(|&&l| l > cutoff).count();
    if rank < p {
        return Err(singular(rank));
    }

    let q = &eigen.eigenvectors;
    let mut inv = Array2::<f64>::zeros((p, p));
    for (k, &lambda) in eigen.eigenvalues.iter().enumerate() {
        for i in 0..p {
            let coeff = q[(i, k)] / lambda;
            for j in 0..p {
                inv[[i, j]] += coeff * q[(j, k)];
            }
        }
    }
    for i in 0..p {
        for j in 0..p {
            inv[[i, j]] *= scale[i] * scale[j];
        }
    }
    Ok(inv)
}
