//! Stratum labels and their ordering.
use std::cmp::Ordering;

/// Value of a stratum column for one partition.
///
/// Numeric labels order numerically, text labels lexicographically, and
/// every numeric label sorts before every text label.
#[derive(Debug, Clone)]
pub enum StratumLabel {
    Numeric(f64),
    Text(String),
}

impl PartialEq for StratumLabel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StratumLabel {}

impl PartialOrd for StratumLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StratumLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (StratumLabel::Numeric(a), StratumLabel::Numeric(b)) => a.total_cmp(b),
            (StratumLabel::Text(a), StratumLabel::Text(b)) => a.cmp(b),
            (StratumLabel::Numeric(_), StratumLabel::Text(_)) => Ordering::Less,
            (StratumLabel::Text(_), StratumLabel::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl std::fmt::Display for StratumLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StratumLabel::Numeric(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.0}"),
            StratumLabel::Numeric(v) => write!(f, "{v}"),
            StratumLabel::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for StratumLabel {
    /// `-0.0` and `0.0` are one stratum.
    fn from(v: f64) -> Self {
        StratumLabel::Numeric(if v == 0.0 { 0.0 } else { v })
    }
}

impl From<&str> for StratumLabel {
    fn from(s: &str) -> Self {
        StratumLabel::Text(s.to_string())
    }
}
