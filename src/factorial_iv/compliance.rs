//! factorial_iv::compliance — compliance types and the factorial grids.
//!
//! Purpose
//! -------
//! Enumerate the latent compliance types and observable (treatment,
//! instrument) cells of a design with `K` binary factors, using integer
//! indices instead of string grids.
//!
//! Key behaviors
//! -------------
//! - A joint type is a length-`K` tuple over {always-taker, never-taker,
//!   complier}; there are `3^K` of them, indexed in base 3 with digits
//!   `a = 0`, `n = 1`, `c = 2` and factor 0 as the most significant digit.
//!   The perfect complier `c…c` is therefore the last type.
//! - Treatment and instrument patterns are `K`-bit integers, factor 0 in the
//!   most significant bit. Moment cells are `(d, z)` pairs ordered by `d`
//!   then `z`, `4^K` in total.
//! - [`category`] lists the types that realize treatment `d` under
//!   instrument `z` for one factor.
//!
//! Invariants & assumptions
//! ------------------------
//! - Monotonicity: no defiers, so every factor's type is one of the three.
//! - `1 ≤ K ≤ MAX_FACTORS`.
use crate::factorial_iv::errors::{FactorialIvError, FactorialIvResult};

/// Largest supported number of factors.
pub const MAX_FACTORS: usize = 6;

/// Per-factor compliance type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComplianceType {
    Always = 0,
    Never = 1,
    Complier = 2,
}

impl ComplianceType {
    pub const ALL: [ComplianceType; 3] =
        [ComplianceType::Always, ComplianceType::Never, ComplianceType::Complier];

    pub fn symbol(self) -> char {
        match self {
            ComplianceType::Always => 'a',
            ComplianceType::Never => 'n',
            ComplianceType::Complier => 'c',
        }
    }

    /// Treatment taken under instrument value `z`.
    pub fn realized(self, z: bool) -> bool {
        match self {
            ComplianceType::Always => true,
            ComplianceType::Never => false,
            ComplianceType::Complier => z,
        }
    }
}

use ComplianceType::{Always, Complier, Never};

/// Response categories addressed by `1 + z − d + 2·d·z`.
const CATEGORIES: [&[ComplianceType]; 4] =
    [&[Always], &[Never, Complier], &[Never], &[Always, Complier]];

/// Types whose treatment under instrument `z` equals `d`, for one factor.
pub fn category(d: bool, z: bool) -> &'static [ComplianceType] {
    let (d, z) = (d as usize, z as usize);
    CATEGORIES[1 + z + 2 * d * z - d]
}

/// Index arithmetic over the type and pattern grids of a `K`-factor design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactorialGrid {
    k: usize,
}

impl FactorialGrid {
    /// # Errors
    /// - [`FactorialIvError::InvalidFactorCount`] unless `1 ≤ k ≤ MAX_FACTORS`.
    pub fn new(k: usize) -> FactorialIvResult<Self> {
        if k == 0 || k > MAX_FACTORS {
            return Err(FactorialIvError::InvalidFactorCount { k, max: MAX_FACTORS });
        }
        Ok(Self { k })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// `2^K` treatment (or instrument) patterns.
    pub fn n_patterns(&self) -> usize {
        1 << self.k
    }

    /// `3^K` joint compliance types.
    pub fn n_types(&self) -> usize {
        3_usize.pow(self.k as u32)
    }

    /// `4^K` moment cells.
    pub fn n_cells(&self) -> usize {
        self.n_patterns() * self.n_patterns()
    }

    /// Index of the perfect-complier type `c…c`.
    pub fn perfect_complier(&self) -> usize {
        self.n_types() - 1
    }

    /// Value of factor `factor` in `pattern`.
    pub fn bit(&self, pattern: usize, factor: usize) -> bool {
        (pattern >> (self.k - 1 - factor)) & 1 == 1
    }

    /// Pattern with the given per-factor values.
    pub fn pattern(&self, bits: impl IntoIterator<Item = bool>) -> usize {
        bits.into_iter().fold(0, |acc, b| (acc << 1) | b as usize)
    }

    /// Per-factor types of joint type `t`.
    pub fn type_of(&self, t: usize) -> Vec<ComplianceType> {
        let mut digits = vec![Always; self.k];
        let mut rest = t;
        for slot in digits.iter_mut().rev() {
            *slot = ComplianceType::ALL[rest % 3];
            rest /= 3;
        }
        digits
    }

    /// Joint type index of per-factor `types`.
    pub fn type_index(&self, types: &[ComplianceType]) -> usize {
        types.iter().fold(0, |acc, t| acc * 3 + *t as usize)
    }

    /// Label such as `"cn"` for joint type `t`.
    pub fn type_label(&self, t: usize) -> String {
        self.type_of(t).into_iter().map(ComplianceType::symbol).collect()
    }

    /// All `3^K` joint types in index order.
    pub fn ps_grid(&self) -> Vec<Vec<ComplianceType>> {
        (0..self.n_types()).map(|t| self.type_of(t)).collect()
    }

    /// Cell index of treatment pattern `d` and instrument pattern `z`.
    pub fn cell(&self, d: usize, z: usize) -> usize {
        d * self.n_patterns() + z
    }

    /// Treatment and instrument pattern of every cell, in cell order.
    pub fn dz_grid(&self) -> (Vec<usize>, Vec<usize>) {
        let j = self.n_patterns();
        (0..self.n_cells()).map(|c| (c / j, c % j)).unzip()
    }

    /// Joint type of the outcome stratum `(d, s)`: complier where the mask
    /// `s` is set, otherwise the type that takes `d` regardless of `z`.
    pub fn stratum_type(&self, d: usize, s: usize) -> usize {
        let types: Vec<ComplianceType> = (0..self.k)
            .map(|f| match (self.bit(s, f), self.bit(d, f)) {
                (true, _) => Complier,
                (false, false) => Never,
                (false, true) => Always,
            })
            .collect();
        self.type_index(&types)
    }

    /// Position of `ψ_{d,s}` in the outcome parameter vector.
    pub fn psi_index(&self, d: usize, s: usize) -> usize {
        d * self.n_patterns() + s
    }

    /// Whether joint type `t` takes treatment pattern `d` under `z`.
    pub fn compatible(&self, t: usize, d: usize, z: usize) -> bool {
        self.type_of(t)
            .iter()
            .enumerate()
            .all(|(f, ty)| category(self.bit(d, f), self.bit(z, f)).contains(ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The per-factor response categories.
    // - Grid sizes and index orderings.
    // - Outcome strata and the perfect-complier index.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Each (d, z) cell lists exactly the types that realize d under z.
    //
    // Given
    // -----
    // - All four binary (d, z) combinations.
    //
    // Expect
    // ------
    // - (0,0) → {n,c}, (0,1) → {n}, (1,0) → {a}, (1,1) → {a,c}, and
    //   agreement with `ComplianceType::realized`.
    fn category_matches_realized_treatment() {
        assert_eq!(category(false, false), &[Never, Complier]);
        assert_eq!(category(false, true), &[Never]);
        assert_eq!(category(true, false), &[Always]);
        assert_eq!(category(true, true), &[Always, Complier]);
        for d in [false, true] {
            for z in [false, true] {
                for t in ComplianceType::ALL {
                    assert_eq!(category(d, z).contains(&t), t.realized(z) == d);
                }
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Grid sizes and orderings for K = 2.
    //
    // Given
    // -----
    // - A two-factor grid.
    //
    // Expect
    // ------
    // - 9 types starting "aa", ending "cc"; 16 cells ordered d then z.
    fn two_factor_grid_orderings() {
        let grid = FactorialGrid::new(2).expect("valid k");
        assert_eq!((grid.n_types(), grid.n_patterns(), grid.n_cells()), (9, 4, 16));
        assert_eq!(grid.type_label(0), "aa");
        assert_eq!(grid.type_label(5), "nc");
        assert_eq!(grid.type_label(grid.perfect_complier()), "cc");
        assert_eq!(grid.type_index(&[Never, Complier]), 5);

        let (d, z) = grid.dz_grid();
        assert_eq!(&d[..5], &[0, 0, 0, 0, 1]);
        assert_eq!(&z[..5], &[0, 1, 2, 3, 0]);
        assert!(grid.bit(0b10, 0) && !grid.bit(0b10, 1));
        assert_eq!(grid.pattern([true, false]), 0b10);
    }

    #[test]
    fn stratum_type_maps_masks_to_types() {
        let grid = FactorialGrid::new(2).expect("valid k");
        // d = (1, 0), no compliers → (a, n); full mask → (c, c).
        assert_eq!(grid.type_label(grid.stratum_type(0b10, 0b00)), "an");
        assert_eq!(grid.type_label(grid.stratum_type(0b10, 0b01)), "ac");
        assert_eq!(grid.stratum_type(0b00, 0b11), grid.perfect_complier());
    }

    #[test]
    fn factor_count_is_bounded() {
        assert!(FactorialGrid::new(0).is_err());
        assert!(FactorialGrid::new(MAX_FACTORS + 1).is_err());
        assert!(FactorialGrid::new(MAX_FACTORS).is_ok());
    }
}
