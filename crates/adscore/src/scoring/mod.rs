//! Content-effect scoring: weighted tag matching composed onto a base score.

mod composer;
mod matcher;
mod request;

pub use composer::{
    compose, compose_with, ClampPolicy, ScoreBreakdown, UnknownClampPolicy, NEUTRAL_MATCH,
};
pub use matcher::{
    overall_match, DimensionMatch, MatchCalculator, MatchFormula, TagContribution, UnknownFormula,
};
pub use request::{
    DimensionSelections, ScoreRejection, ScoreRequest, TagSelection, DEFAULT_ALPHA,
    DEFAULT_BASE_SCORE,
};

use crate::sources::DataSnapshot;
use crate::taxonomy::AdType;
use request::validate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Value substituted when a tag has no entry in the active lookup table.
pub const DEFAULT_LOOKUP_VALUE: f64 = 0.5;

/// Engine settings chosen once per process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub formula: MatchFormula,
    pub default_value: f64,
    pub clamp: ClampPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            formula: MatchFormula::default(),
            default_value: DEFAULT_LOOKUP_VALUE,
            clamp: ClampPolicy::default(),
        }
    }
}

/// Stateless scorer; all data comes from the snapshot passed per call.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
    calculator: MatchCalculator,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            calculator: MatchCalculator::new(config.formula, config.default_value),
            config,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(
        &self,
        snapshot: &DataSnapshot,
        request: &ScoreRequest,
    ) -> Result<ScoreOutcome, ScoreRejection> {
        let validated = validate(request)?;

        let dimensions: Vec<DimensionMatch> = validated
            .dimensions
            .iter()
            .filter_map(|(dimension, selections)| {
                self.calculator
                    .dimension_match(snapshot, validated.ad_type, dimension, selections)
            })
            .collect();

        let per_dimension: Vec<f64> = dimensions.iter().map(|dimension| dimension.value).collect();
        let breakdown = compose_with(
            validated.base_score,
            overall_match(&per_dimension),
            validated.alpha,
            self.config.clamp,
        );
        if !breakdown.is_finite() {
            return Err(ScoreRejection::NonFiniteScore {
                match_value: breakdown.match_value,
                k: breakdown.k,
                final_ratio: breakdown.final_ratio,
            });
        }

        debug!(
            ad_type = %validated.ad_type,
            formula = %self.config.formula,
            snapshot_version = snapshot.version(),
            match_value = breakdown.match_value,
            k = breakdown.k,
            final_ratio = breakdown.final_ratio,
            "score computed"
        );

        Ok(ScoreOutcome {
            ad_type: validated.ad_type,
            formula: self.config.formula,
            snapshot_version: snapshot.version(),
            breakdown,
            dimensions,
        })
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

/// Scoring result with the derivation needed to audit it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOutcome {
    pub ad_type: AdType,
    pub formula: MatchFormula,
    pub snapshot_version: u64,
    pub breakdown: ScoreBreakdown,
    pub dimensions: Vec<DimensionMatch>,
}

impl ScoreOutcome {
    /// One trace line per scored dimension, each newline-terminated.
    pub fn formula_detail(&self) -> String {
        self.dimensions
            .iter()
            .map(|dimension| format!("{}\n", dimension.trace()))
            .collect()
    }

    pub fn used_default(&self) -> bool {
        self.dimensions
            .iter()
            .flat_map(|dimension| &dimension.tags)
            .any(|tag| tag.used_default)
    }
}
