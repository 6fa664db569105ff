//! factorial_iv::moments — the stacked moment system and its two solvers.
//!
//! Purpose
//! -------
//! Reduce the unit-level moment conditions to cell sufficient statistics and
//! estimate `β = (ρ, ψ)` either in closed form or with L-BFGS.
//!
//! Key behaviors
//! -------------
//! - Each unit with instrument pattern `z` contributes, for every treatment
//!   pattern `d`, the rows `1{D = d} = A_{(d,z)}·ρ` and
//!   `Y·1{D = d} = B_{(d,z)}·ψ`. The stacked least-squares problem is
//!   separable into a `ρ` block and a `ψ` block.
//! - [`MomentSystem::solve_closed_form`] solves each block's normal
//!   equations after a rank check and reports
//!   `vcov = blockdiag(σ̂²_ρ G_ρ⁻¹, σ̂²_ψ G_ψ⁻¹)`, with `σ̂² = RSS/(M − p)`
//!   per block.
//! - [`MomentSystem::solve_lbfgs`] maximizes `ℓ(β) = −RSS(β)/N` from zero
//!   with an analytic gradient, then derives the same covariance from the
//!   finite-difference Hessian of each block.
//!
//! Invariants & assumptions
//! ------------------------
//! - The outcome is divided by its root mean square before solving, so
//!   gradient tolerances do not depend on the outcome's units. Estimates
//!   and covariances are reported on the original scale.
//! - Both solvers reach the same fixed point; they differ only by solver
//!   tolerance.
//! - Non-convergence of the iterative solver is an error carrying the last
//!   iterate and the residual norm.
use crate::{
    factorial_iv::{
        compliance::FactorialGrid,
        errors::{FactorialIvError, FactorialIvResult, MomentBlock},
        matrices::StructuralMatrices,
    },
    inference::hessian::covariance_from_gradient,
    optimization::{
        errors::OptResult,
        loglik_optimizer::{
            Grad, LogLikelihood, MLEOptions, Theta, maximize, validation::validate_theta,
        },
    },
    regression::{RegressionError, invert_gram},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};

/// Final gradient norm (scaled problem) above which an L-BFGS run is
/// rejected even if argmin reported convergence.
const GRADIENT_GATE: f64 = 1e-6;

/// Least-squares block in sufficient-statistic form:
/// `RSS(β) = yy − 2·rhsᵀβ + βᵀ·gram·β` over `rows` stacked rows.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticBlock {
    pub gram: Array2<f64>,
    pub rhs: Array1<f64>,
    pub yy: f64,
    pub rows: usize,
}

impl QuadraticBlock {
    pub fn dim(&self) -> usize {
        self.rhs.len()
    }

    pub fn rss(&self, beta: ArrayView1<'_, f64>) -> f64 {
        (self.yy - 2.0 * self.rhs.dot(&beta) + beta.dot(&self.gram.dot(&beta))).max(0.0)
    }

    /// `Gβ − h`, half the gradient of `RSS`.
    pub fn residual_gradient(&self, beta: ArrayView1<'_, f64>) -> Array1<f64> {
        self.gram.dot(&beta) - &self.rhs
    }

    /// Residual variance `RSS / (M − p)`.
    pub fn sigma2(&self, beta: ArrayView1<'_, f64>) -> f64 {
        self.rss(beta) / (self.rows - self.dim()) as f64
    }
}

/// Estimates produced by either solver, on the original outcome scale.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentEstimate {
    pub rho: Array1<f64>,
    pub psi: Array1<f64>,
    /// Covariance of `(ρ, ψ)`, `ρ` first.
    pub vcov: Array2<f64>,
    /// Iterations used by L-BFGS; `None` for the closed form.
    pub iterations: Option<usize>,
    pub residual_norm: f64,
}

/// Cell statistics and the two least-squares blocks for one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentSystem {
    grid: FactorialGrid,
    nobs: usize,
    y_scale: f64,
    rho_block: QuadraticBlock,
    psi_block: QuadraticBlock,
}

impl MomentSystem {
    /// Aggregate units into cells and build both blocks.
    ///
    /// Inputs are assumed validated: binary `treatment`/`instrument` with
    /// `K` columns matching `grid`, finite `outcome`, equal row counts.
    pub fn new(
        grid: FactorialGrid, matrices: &StructuralMatrices, outcome: ArrayView1<'_, f64>,
        treatment: ArrayView2<'_, f64>, instrument: ArrayView2<'_, f64>,
    ) -> Self {
        let nobs = outcome.len();
        let j = grid.n_patterns();
        let mean_sq = outcome.dot(&outcome) / nobs.max(1) as f64;
        let y_scale = if mean_sq > 0.0 { mean_sq.sqrt() } else { 1.0 };

        let mut n_z = vec![0.0; j];
        let mut count = vec![0.0; grid.n_cells()];
        let mut sum_y = vec![0.0; grid.n_cells()];
        let mut sum_y2 = vec![0.0; grid.n_cells()];
        for i in 0..nobs {
            let d = grid.pattern(treatment.row(i).iter().map(|&v| v == 1.0));
            let z = grid.pattern(instrument.row(i).iter().map(|&v| v == 1.0));
            let y = outcome[i] / y_scale;
            let cell = grid.cell(d, z);
            n_z[z] += 1.0;
            count[cell] += 1.0;
            sum_y[cell] += y;
            sum_y2[cell] += y * y;
        }

        let rows = nobs * j;
        let rho_block = Self::block(&grid, &matrices.a, &n_z, &count, nobs as f64, rows);
        let yy: f64 = sum_y2.iter().sum();
        let psi_block = Self::block(&grid, &matrices.b, &n_z, &sum_y, yy, rows);
        Self { grid, nobs, y_scale, rho_block, psi_block }
    }

    fn block(
        grid: &FactorialGrid, design: &Array2<f64>, n_z: &[f64], target_sums: &[f64], yy: f64,
        rows: usize,
    ) -> QuadraticBlock {
        let p = design.ncols();
        let j = grid.n_patterns();
        let mut gram = Array2::<f64>::zeros((p, p));
        let mut rhs = Array1::<f64>::zeros(p);
        for d in 0..j {
            for z in 0..j {
                let row = design.row(grid.cell(d, z));
                if n_z[z] > 0.0 {
                    for a in 0..p {
                        if row[a] == 0.0 {
                            continue;
                        }
                        for b in 0..p {
                            gram[[a, b]] += n_z[z] * row[a] * row[b];
                        }
                    }
                }
                rhs.scaled_add(target_sums[grid.cell(d, z)], &row);
            }
        }
        QuadraticBlock { gram, rhs, yy, rows }
    }

    pub fn nobs(&self) -> usize {
        self.nobs
    }

    pub fn rho_block(&self) -> &QuadraticBlock {
        &self.rho_block
    }

    pub fn psi_block(&self) -> &QuadraticBlock {
        &self.psi_block
    }

    fn n_rho(&self) -> usize {
        self.rho_block.dim()
    }

    /// Solve both blocks' normal equations.
    ///
    /// # Errors
    /// - [`FactorialIvError::SingularDesign`] when a block is not identified.
    pub fn solve_closed_form(&self) -> FactorialIvResult<MomentEstimate> {
        let (rho, v_rho) = Self::solve_block(&self.rho_block, MomentBlock::Rho)?;
        let (psi, v_psi) = Self::solve_block(&self.psi_block, MomentBlock::Psi)?;
        Ok(self.package(rho, psi, v_rho, v_psi, None))
    }

    fn solve_block(
        block: &QuadraticBlock, which: MomentBlock,
    ) -> FactorialIvResult<(Array1<f64>, Array2<f64>)> {
        let names: Vec<String> = (0..block.dim()).map(|i| format!("{which}[{i}]")).collect();
        let inv = invert_gram(&block.gram, &names).map_err(|err| match err {
            RegressionError::SingularDesign { rank, ncols, .. } => {
                FactorialIvError::SingularDesign { block: which, rank, ncols }
            }
            other => FactorialIvError::Regression(other),
        })?;
        let beta = inv.dot(&block.rhs);
        let sigma2 = block.sigma2(beta.view());
        Ok((beta, inv * sigma2))
    }

    /// Maximize `−RSS/N` with L-BFGS from the zero vector.
    ///
    /// # Errors
    /// - [`FactorialIvError::SingularDesign`] when a block is not identified
    ///   (checked before optimizing).
    /// - [`FactorialIvError::OptimizationDiverged`] when the run stops
    ///   without converging or with a large final gradient.
    /// - [`FactorialIvError::Optimization`] for backend failures.
    pub fn solve_lbfgs(&self, opts: &MLEOptions) -> FactorialIvResult<MomentEstimate> {
        let blocks = [(&self.rho_block, MomentBlock::Rho), (&self.psi_block, MomentBlock::Psi)];
        for (block, which) in blocks {
            Self::solve_block(block, which)?;
        }

        let objective = MomentObjective { split: self.n_rho(), nobs: self.nobs as f64 };
        let data = StackedBlocks { rho: self.rho_block.clone(), psi: self.psi_block.clone() };
        let theta0 = Array1::<f64>::zeros(self.n_rho() + self.psi_block.dim());
        let outcome = maximize(&objective, theta0, &data, opts)?;

        let theta = outcome.theta_hat;
        let (rho, psi) = objective.blocks(&theta);
        let grad = objective.grad(&theta, &data)?;
        let grad_norm = grad.dot(&grad).sqrt();
        if !outcome.converged || !(grad_norm <= GRADIENT_GATE) {
            let psi_unscaled = &psi * self.y_scale;
            return Err(FactorialIvError::OptimizationDiverged {
                iterations: outcome.iterations,
                residual_norm: self.residual_norm(rho, psi),
                status: outcome.status,
                last_iterate: rho.iter().chain(psi_unscaled.iter()).copied().collect(),
            });
        }

        let v_rho = self.block_covariance(&self.rho_block, rho)?;
        let v_psi = self.block_covariance(&self.psi_block, psi)?;
        Ok(self.package(rho.to_owned(), psi.to_owned(), v_rho, v_psi, Some(outcome.iterations)))
    }

    fn block_covariance(
        &self, block: &QuadraticBlock, beta: ArrayView1<'_, f64>,
    ) -> FactorialIvResult<Array2<f64>> {
        let n = self.nobs as f64;
        let grad = |b: &Array1<f64>| block.residual_gradient(b.view()) * (-2.0 / n);
        let sigma2 = block.sigma2(beta);
        Ok(covariance_from_gradient(&grad, &beta.to_owned(), n / 2.0, sigma2)?)
    }

    /// Norm of the stacked residual vector on the original outcome scale.
    fn residual_norm(&self, rho: ArrayView1<'_, f64>, psi_scaled: ArrayView1<'_, f64>) -> f64 {
        let scale2 = self.y_scale * self.y_scale;
        (self.rho_block.rss(rho) + self.psi_block.rss(psi_scaled) * scale2).sqrt()
    }

    /// Undo the outcome scaling and assemble the block-diagonal covariance.
    fn package(
        &self, rho: Array1<f64>, psi_scaled: Array1<f64>, v_rho: Array2<f64>,
        v_psi_scaled: Array2<f64>, iterations: Option<usize>,
    ) -> MomentEstimate {
        let split = rho.len();
        let residual_norm = self.residual_norm(rho.view(), psi_scaled.view());
        let psi = &psi_scaled * self.y_scale;
        let p = split + psi.len();
        let mut vcov = Array2::<f64>::zeros((p, p));
        vcov.slice_mut(s![..split, ..split]).assign(&v_rho);
        vcov.slice_mut(s![split.., split..])
            .assign(&(v_psi_scaled * (self.y_scale * self.y_scale)));
        MomentEstimate { rho, psi, vcov, iterations, residual_norm }
    }

    pub fn grid(&self) -> &FactorialGrid {
        &self.grid
    }
}

/// Both blocks, owned so they can serve as optimizer data.
#[derive(Debug, Clone)]
pub struct StackedBlocks {
    rho: QuadraticBlock,
    psi: QuadraticBlock,
}

/// `ℓ(β) = −(RSS_ρ(ρ) + RSS_ψ(ψ)) / N` over the concatenated `β = (ρ, ψ)`.
#[derive(Debug, Clone, Copy)]
pub struct MomentObjective {
    split: usize,
    nobs: f64,
}

impl MomentObjective {
    fn blocks<'a>(&self, theta: &'a Theta) -> (ArrayView1<'a, f64>, ArrayView1<'a, f64>) {
        (theta.slice(s![..self.split]), theta.slice(s![self.split..]))
    }
}

impl LogLikelihood for MomentObjective {
    type Data = StackedBlocks;

    fn value(&self, theta: &Theta, data: &StackedBlocks) -> OptResult<f64> {
        let (rho, psi) = self.blocks(theta);
        Ok(-(data.rho.rss(rho) + data.psi.rss(psi)) / self.nobs)
    }

    fn check(&self, theta: &Theta, data: &StackedBlocks) -> OptResult<()> {
        validate_theta(theta, data.rho.dim() + data.psi.dim())
    }

    fn grad(&self, theta: &Theta, data: &StackedBlocks) -> OptResult<Grad> {
        let (rho, psi) = self.blocks(theta);
        let scale = -2.0 / self.nobs;
        let mut grad = Array1::<f64>::zeros(theta.len());
        grad.slice_mut(s![..self.split]).assign(&(data.rho.residual_gradient(rho) * scale));
        grad.slice_mut(s![self.split..]).assign(&(data.psi.residual_gradient(psi) * scale));
        Ok(grad)
    }
}
