//! Plain-text tables for MSM results.
use crate::{
    iv::stratified::StratumOutcome,
    msm::model::{MsmFit, MsmStratumFit},
};
use std::fmt;

impl fmt::Display for MsmFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ps = &self.propensity;
        let out = &self.outcome;
        writeln!(
            f,
            "MSM (IPTW): {} ~ {} + {}",
            self.formula.outcome,
            self.formula.treatment,
            self.formula.controls.join(" + ")
        )?;
        writeln!(
            f,
            "Propensity model (log-lik = {:.4}, iterations = {}, score range [{:.4}, {:.4}])",
            ps.log_likelihood,
            ps.iterations,
            self.bounded_scores.iter().copied().fold(f64::INFINITY, f64::min),
            self.bounded_scores.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        )?;
        writeln!(f, "Weighted outcome model (nobs = {}, R² = {:.4})", out.nobs, out.r_squared)?;
        writeln!(f, "{:<20}{:>12}{:>12}{:>10}{:>10}", "", "coef", "std err", "t", "P>|t|")?;
        for (j, name) in out.names.iter().enumerate() {
            writeln!(
                f,
                "{:<20}{:>12.4}{:>12.4}{:>10.3}{:>10.4}",
                name, out.coef[j], out.se[j], out.t_stat[j], out.p_value[j]
            )?;
        }
        writeln!(f, "{:<20}{:>12}", "VIF", "")?;
        for (name, vif) in &self.vif {
            writeln!(f, "{name:<20}{vif:>12.3}")?;
        }
        Ok(())
    }
}

/// One-line-per-stratum overview of a stratified MSM run.
pub struct MsmTable<'a>(pub &'a [MsmStratumFit]);

impl fmt::Display for MsmTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10}{:>6}{:>12}{:>12}{:>10}{:>10}",
            "stratum", "nobs", "effect", "std err", "P>|t|", "R²"
        )?;
        for entry in self.0 {
            match &entry.outcome {
                StratumOutcome::Fitted(fit) => writeln!(
                    f,
                    "{:<10}{:>6}{:>12.4}{:>12.4}{:>10.4}{:>10.4}",
                    entry.label.to_string(),
                    fit.nobs(),
                    fit.effect(),
                    fit.effect_se(),
                    fit.effect_p(),
                    fit.r_squared()
                )?,
                StratumOutcome::Failed(err) => {
                    writeln!(f, "{:<10}{:>6}  failed: {err}", entry.label.to_string(), entry.nrows)?
                }
            }
        }
        Ok(())
    }
}
