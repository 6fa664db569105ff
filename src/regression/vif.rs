//! Variance inflation factors.
use crate::regression::{
    design::{DesignMatrix, INTERCEPT},
    errors::RegressionResult,
    ols::fit_ols,
};

/// `VIF_j = 1 / (1 − R²_j)` for every non-intercept column, where `R²_j`
/// comes from regressing column `j` on the remaining columns.
///
/// A column perfectly explained by the others gets `f64::INFINITY`.
pub fn variance_inflation(design: &DesignMatrix) -> RegressionResult<Vec<(String, f64)>> {
    let mut out = Vec::new();
    for (j, name) in design.names().iter().enumerate() {
        if name == INTERCEPT {
            continue;
        }
        let target = design.matrix().column(j).to_owned();
        let rest = design.without_column(j);
        let aux = fit_ols(target.view(), &rest)?;
        let vif = if aux.r_squared >= 1.0 { f64::INFINITY } else { 1.0 / (1.0 - aux.r_squared) };
        out.push((name.clone(), vif));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Orthogonal regressors have VIF 1; correlated ones inflate symmetrically.
    //
    // Given
    // -----
    // - a and b centred and orthogonal; then c = a + small noise.
    //
    // Expect
    // ------
    // - VIF(a) = VIF(b) = 1; VIF(a) = VIF(c) > 1 in the second design.
    fn vif_is_one_for_orthogonal_and_larger_for_correlated_columns() {
        let a = array![1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let b = array![1.0, 1.0, -1.0, -1.0, 0.0, 0.0];
        let design = DesignMatrix::with_intercept(&[("a", a.view()), ("b", b.view())])
            .expect("same lengths");
        let vifs = variance_inflation(&design).expect("full rank");
        assert_eq!(vifs.len(), 2);
        assert_relative_eq!(vifs[0].1, 1.0, epsilon = 1e-10);
        assert_relative_eq!(vifs[1].1, 1.0, epsilon = 1e-10);

        let c = array![1.1, -0.9, 0.8, -1.0, 1.2, -1.1];
        let design = DesignMatrix::with_intercept(&[("a", a.view()), ("c", c.view())])
            .expect("same lengths");
        let vifs = variance_inflation(&design).expect("full rank");
        assert!(vifs[0].1 > 5.0);
        assert_relative_eq!(vifs[0].1, vifs[1].1, epsilon = 1e-9);
    }
}
