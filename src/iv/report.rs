//! Plain-text tables for 2SLS results.
use crate::iv::{stratified::StratumFit, stratified::StratumOutcome, two_stage::TslsFit};
use std::fmt;

impl fmt::Display for TslsFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fs = &self.first_stage;
        let ss = &self.second_stage;
        writeln!(
            f,
            "2SLS: {} ~ {} | {}",
            self.formula.outcome,
            self.formula.treatment,
            self.formula.instruments.join(" + ")
        )?;
        writeln!(
            f,
            "First stage (nobs = {}, R² = {:.4}, partial R² = {:.4})",
            fs.nobs, fs.r_squared, fs.partial_r_squared
        )?;
        writeln!(
            f,
            "{:<20}{:>12}{:>12}{:>10}{:>10}",
            "instrument", "coef", "std err", "t", "P>|t|"
        )?;
        for (j, name) in fs.instruments.iter().enumerate() {
            writeln!(
                f,
                "{:<20}{:>12.4}{:>12.4}{:>10.3}{:>10.4}",
                name, fs.coef[j], fs.se[j], fs.t_stat[j], fs.p_value[j]
            )?;
        }
        writeln!(
            f,
            "partial F({}, {}) = {:.3} (p = {:.4}); overall F({}, {}) = {:.3} (p = {:.4})",
            fs.partial_f.df_num,
            fs.partial_f.df_den,
            fs.partial_f.statistic,
            fs.partial_f.p_value,
            fs.overall_f.df_num,
            fs.overall_f.df_den,
            fs.overall_f.statistic,
            fs.overall_f.p_value
        )?;
        if let Some(passes) = fs.passes_strength {
            writeln!(f, "instrument strength: {}", if passes { "pass" } else { "weak" })?;
        }
        writeln!(
            f,
            "Second stage (nobs = {}, R² = {:.4}, se = {:?})",
            ss.nobs, ss.r_squared, ss.structural_se
        )?;
        writeln!(f, "{:<20}{:>12}{:>12}{:>10}{:>10}", "", "coef", "std err", "t", "P>|t|")?;
        for (j, name) in ss.names.iter().enumerate() {
            writeln!(
                f,
                "{:<20}{:>12.4}{:>12.4}{:>10.3}{:>10.4}",
                name, ss.coef[j], ss.se[j], ss.t_stat[j], ss.p_value[j]
            )?;
        }
        Ok(())
    }
}

/// One-line-per-stratum overview of a stratified run.
pub struct StratumTable<'a>(pub &'a [StratumFit]);

impl fmt::Display for StratumTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10}{:>6}{:>12}{:>12}{:>10}{:>10}{:>12}",
            "stratum", "nobs", "effect", "std err", "P>|t|", "R²", "partial F"
        )?;
        for entry in self.0 {
            match &entry.outcome {
                StratumOutcome::Fitted(fit) => writeln!(
                    f,
                    "{:<10}{:>6}{:>12.4}{:>12.4}{:>10.4}{:>10.4}{:>12.3}",
                    entry.label.to_string(),
                    fit.nobs(),
                    fit.effect(),
                    fit.effect_se(),
                    fit.effect_p(),
                    fit.second_stage.r_squared,
                    fit.first_stage.partial_f.statistic
                )?,
                StratumOutcome::Failed(err) => {
                    writeln!(f, "{:<10}{:>6}  failed: {err}", entry.label.to_string(), entry.nrows)?
                }
            }
        }
        Ok(())
    }
}
