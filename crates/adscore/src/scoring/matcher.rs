use super::composer::NEUTRAL_MATCH;
use super::request::TagSelection;
use crate::sources::DataSnapshot;
use crate::taxonomy::AdType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source of the per-tag value multiplied by each caller weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFormula {
    /// Content expression value, summed by weight.
    #[default]
    Expression,
    /// Population mean preference, summed by weight.
    Preference,
    /// Preference times expression, normalised by total weight.
    Blended,
}

impl MatchFormula {
    pub const fn ordered() -> [Self; 3] {
        [Self::Expression, Self::Preference, Self::Blended]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Expression => "expression",
            Self::Preference => "preference",
            Self::Blended => "blended",
        }
    }

    /// Human readable description of where the numbers come from.
    pub const fn data_source(self) -> &'static str {
        match self {
            Self::Expression => "content expression values + caller weights",
            Self::Preference => "population preference means + caller weights",
            Self::Blended => "population preference × content expression, weight normalised",
        }
    }
}

impl fmt::Display for MatchFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown match formula '{0}' (expected expression, preference or blended)")]
pub struct UnknownFormula(pub String);

impl FromStr for MatchFormula {
    type Err = UnknownFormula;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|formula| formula.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownFormula(raw.to_string()))
    }
}

/// Looked-up value and weighted contribution of one selected tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagContribution {
    pub tag: String,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
    /// Set when at least one lookup missed and the configured default stood in.
    pub used_default: bool,
}

/// Match value of one dimension together with the tags that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionMatch {
    pub dimension: String,
    pub value: f64,
    pub tags: Vec<TagContribution>,
}

impl DimensionMatch {
    /// Single-line derivation, e.g. `主题: 情感关系联结(value:0.500×weight:1.00) = 0.500`.
    pub fn trace(&self) -> String {
        let terms = self
            .tags
            .iter()
            .map(|tag| {
                let marker = if tag.used_default { "*" } else { "" };
                format!(
                    "{}{marker}(value:{:.3}×weight:{:.2})",
                    tag.tag, tag.value, tag.weight
                )
            })
            .collect::<Vec<_>>()
            .join(" + ");
        format!("{}: {terms} = {:.3}", self.dimension, self.value)
    }
}

/// Unweighted mean of the per-dimension values; neutral when nothing was scored.
pub fn overall_match(per_dimension: &[f64]) -> f64 {
    if per_dimension.is_empty() {
        return NEUTRAL_MATCH;
    }
    per_dimension.iter().sum::<f64>() / per_dimension.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCalculator {
    formula: MatchFormula,
    default_value: f64,
}

impl MatchCalculator {
    pub fn new(formula: MatchFormula, default_value: f64) -> Self {
        Self {
            formula,
            default_value,
        }
    }

    pub fn formula(&self) -> MatchFormula {
        self.formula
    }

    /// Scores one dimension. Returns `None` for an empty selection list so the
    /// dimension stays out of the overall average.
    pub fn dimension_match(
        &self,
        snapshot: &DataSnapshot,
        ad_type: AdType,
        dimension: &str,
        selections: &[TagSelection],
    ) -> Option<DimensionMatch> {
        if selections.is_empty() {
            return None;
        }

        let tags: Vec<TagContribution> = selections
            .iter()
            .map(|selection| {
                let (value, used_default) = self.lookup(snapshot, ad_type, &selection.tag);
                TagContribution {
                    tag: selection.tag.clone(),
                    value,
                    weight: selection.weight,
                    contribution: value * selection.weight,
                    used_default,
                }
            })
            .collect();

        let weighted_sum: f64 = tags.iter().map(|tag| tag.contribution).sum();
        let value = match self.formula {
            MatchFormula::Expression | MatchFormula::Preference => weighted_sum,
            MatchFormula::Blended => {
                let total_weight: f64 = tags.iter().map(|tag| tag.weight).sum();
                if total_weight > 0.0 {
                    weighted_sum / total_weight
                } else {
                    NEUTRAL_MATCH
                }
            }
        };

        Some(DimensionMatch {
            dimension: dimension.to_string(),
            value,
            tags,
        })
    }

    fn lookup(&self, snapshot: &DataSnapshot, ad_type: AdType, tag: &str) -> (f64, bool) {
        let label = ad_type.label();
        match self.formula {
            MatchFormula::Expression => self.or_default(snapshot.expression(label, tag)),
            MatchFormula::Preference => self.or_default(snapshot.preference(label, tag)),
            MatchFormula::Blended => {
                let (preference, missed_preference) =
                    self.or_default(snapshot.preference(label, tag));
                let (expression, missed_expression) =
                    self.or_default(snapshot.expression(label, tag));
                (
                    preference * expression,
                    missed_preference || missed_expression,
                )
            }
        }
    }

    fn or_default(&self, value: Option<f64>) -> (f64, bool) {
        match value {
            Some(value) => (value, false),
            None => (self.default_value, true),
        }
    }
}
