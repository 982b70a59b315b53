use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Match value at which the adjustment coefficient is exactly one.
pub const NEUTRAL_MATCH: f64 = 0.5;

/// Post-processing applied to the final ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    #[default]
    None,
    /// Final ratio limited to `[0, 1]`.
    Unit,
}

impl ClampPolicy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Unit => "unit",
        }
    }

    fn apply(self, ratio: f64) -> f64 {
        match self {
            Self::None => ratio,
            Self::Unit => ratio.clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for ClampPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown clamp policy '{0}' (expected none or unit)")]
pub struct UnknownClampPolicy(pub String);

impl FromStr for ClampPolicy {
    type Err = UnknownClampPolicy;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "unit" => Ok(Self::Unit),
            _ => Err(UnknownClampPolicy(raw.to_string())),
        }
    }
}

/// Composed score. Ratios are in `0..=1` space; percentages are ×100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub match_value: f64,
    pub k: f64,
    pub final_ratio: f64,
    pub clamped: bool,
}

impl ScoreBreakdown {
    pub fn base_percent(&self) -> f64 {
        self.base * 100.0
    }

    pub fn final_percent(&self) -> f64 {
        self.final_ratio * 100.0
    }

    /// False when any reported figure overflowed or went undefined.
    pub fn is_finite(&self) -> bool {
        [
            self.base_percent(),
            self.match_value,
            self.k,
            self.final_percent(),
        ]
        .iter()
        .all(|value| value.is_finite())
    }
}

/// `k = 1 + α·(match − 0.5)`, `final = base × k`, with no clamping.
pub fn compose(base_percent: f64, match_value: f64, alpha: f64) -> ScoreBreakdown {
    compose_with(base_percent, match_value, alpha, ClampPolicy::None)
}

pub fn compose_with(
    base_percent: f64,
    match_value: f64,
    alpha: f64,
    clamp: ClampPolicy,
) -> ScoreBreakdown {
    let base = base_percent / 100.0;
    let k = 1.0 + alpha * (match_value - NEUTRAL_MATCH);
    let raw = base * k;
    let final_ratio = clamp.apply(raw);

    ScoreBreakdown {
        base,
        match_value,
        k,
        final_ratio,
        clamped: final_ratio != raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_match_leaves_base_unchanged() {
        for alpha in [0.0, 0.5, 2.0] {
            let breakdown = compose(80.0, NEUTRAL_MATCH, alpha);
            assert_eq!(breakdown.k, 1.0);
            assert!((breakdown.final_percent() - 80.0).abs() < 1e-9);
        }
    }

    #[test]
    fn final_score_is_monotonic_in_match_for_positive_alpha() {
        let low = compose(100.0, 0.2, 0.5);
        let high = compose(100.0, 0.9, 0.5);
        assert!(high.final_ratio > low.final_ratio);
        assert!((low.k - 0.85).abs() < 1e-12);
        assert!((high.k - 1.2).abs() < 1e-12);
    }

    #[test]
    fn unclamped_scores_may_exceed_one_hundred_percent() {
        let breakdown = compose(100.0, 3.0, 1.0);
        assert!((breakdown.final_percent() - 350.0).abs() < 1e-9);
        assert!(!breakdown.clamped);
    }

    #[test]
    fn unit_clamp_limits_ratio_but_reports_raw_k() {
        let high = compose_with(100.0, 3.0, 1.0, ClampPolicy::Unit);
        assert_eq!(high.final_ratio, 1.0);
        assert!((high.k - 3.5).abs() < 1e-12);
        assert!(high.clamped);

        let low = compose_with(100.0, -5.0, 1.0, ClampPolicy::Unit);
        assert_eq!(low.final_ratio, 0.0);
        assert!(low.clamped);
    }

    #[test]
    fn clamp_policies_parse() {
        assert_eq!("UNIT".parse::<ClampPolicy>(), Ok(ClampPolicy::Unit));
        assert_eq!("none".parse::<ClampPolicy>(), Ok(ClampPolicy::None));
        assert!("tight".parse::<ClampPolicy>().is_err());
    }
}
