//! Structural matrices linking moment cells to model parameters.
use crate::factorial_iv::compliance::FactorialGrid;
use ndarray::Array2;

/// `A` maps type shares to cell treatment shares; `B` maps outcome
/// parameters to cell outcome means.
///
/// - `A[(d,z), t] = 1` iff joint type `t` takes `d` under `z`
///   (`4^K × 3^K`).
/// - `B[(d,z), (d',s)] = 1{d = d'} · A[(d,z), t(d,s)]` where `t(d,s)` is the
///   outcome stratum of [`FactorialGrid::stratum_type`] (`4^K × 4^K`).
///
/// Within one treatment pattern `d`, the strata `t(d,s)` are exactly the
/// types able to take `d` under some instrument pattern: per factor either
/// `{n, c}` (`d_k = 0`) or `{a, c}` (`d_k = 1`).
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralMatrices {
    pub a: Array2<f64>,
    pub b: Array2<f64>,
}

impl StructuralMatrices {
    pub fn build(grid: &FactorialGrid) -> Self {
        let j = grid.n_patterns();
        let mut a = Array2::<f64>::zeros((grid.n_cells(), grid.n_types()));
        for d in 0..j {
            for z in 0..j {
                let row = grid.cell(d, z);
                for t in 0..grid.n_types() {
                    if grid.compatible(t, d, z) {
                        a[[row, t]] = 1.0;
                    }
                }
            }
        }

        let mut b = Array2::<f64>::zeros((grid.n_cells(), grid.n_cells()));
        for d in 0..j {
            for z in 0..j {
                let row = grid.cell(d, z);
                for s in 0..j {
                    b[[row, grid.psi_index(d, s)]] = a[[row, grid.stratum_type(d, s)]];
                }
            }
        }
        Self { a, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // For one factor the matrices are the textbook LATE bookkeeping.
    //
    // Given
    // -----
    // - K = 1; types [a, n, c]; cells (0,0), (0,1), (1,0), (1,1).
    //
    // Expect
    // ------
    // - A rows {n,c}, {n}, {a}, {a,c}; B block-diagonal by d with ψ_{0,·}
    //   over strata (n, c) and ψ_{1,·} over (a, c).
    fn single_factor_matrices() {
        let grid = FactorialGrid::new(1).expect("valid k");
        let m = StructuralMatrices::build(&grid);
        assert_eq!(
            m.a,
            array![[0.0, 1.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0]]
        );
        assert_eq!(
            m.b,
            array![
                [1.0, 1.0, 0.0, 0.0],
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0, 1.0]
            ]
        );
    }

    #[test]
    // Purpose
    // -------
    // Under any instrument pattern every type takes exactly one treatment
    // pattern, so the `A` rows for fixed `z` partition the types.
    //
    // Given
    // -----
    // - K = 2 and K = 3.
    //
    // Expect
    // ------
    // - For every `z`, `Σ_d A[(d,z), t] = 1` for all `t`.
    fn treatment_shares_partition_types() {
        for k in [2, 3] {
            let grid = FactorialGrid::new(k).expect("valid k");
            let m = StructuralMatrices::build(&grid);
            for z in 0..grid.n_patterns() {
                for t in 0..grid.n_types() {
                    let total: f64 =
                        (0..grid.n_patterns()).map(|d| m.a[[grid.cell(d, z), t]]).sum();
                    assert_eq!(total, 1.0);
                }
            }
        }
    }
}
