use crate::taxonomy::AdType;
use serde::ser::SerializeMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const DEFAULT_BASE_SCORE: f64 = 100.0;
pub const DEFAULT_ALPHA: f64 = 0.5;

/// One caller-weighted tag choice within a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSelection {
    pub tag: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub weight: f64,
}

impl TagSelection {
    pub fn new(tag: impl Into<String>, weight: f64) -> Self {
        Self {
            tag: tag.into(),
            weight,
        }
    }
}

/// Scoring call as supplied by a caller, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Baseline score as a percentage.
    #[serde(default = "default_base_score", deserialize_with = "lenient_f64")]
    pub base_score: f64,
    #[serde(default)]
    pub ad_type: Option<String>,
    /// Sensitivity of the final score to match deviation.
    #[serde(default = "default_alpha", deserialize_with = "lenient_f64")]
    pub alpha: f64,
    #[serde(default)]
    pub dimensions: DimensionSelections,
}

impl ScoreRequest {
    pub fn new(ad_type: impl Into<String>) -> Self {
        Self {
            base_score: DEFAULT_BASE_SCORE,
            ad_type: Some(ad_type.into()),
            alpha: DEFAULT_ALPHA,
            dimensions: DimensionSelections::default(),
        }
    }

    pub fn with_base_score(mut self, base_score: f64) -> Self {
        self.base_score = base_score;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_selection(
        mut self,
        dimension: impl Into<String>,
        tag: impl Into<String>,
        weight: f64,
    ) -> Self {
        self.dimensions
            .selections_mut(dimension.into())
            .push(TagSelection::new(tag, weight));
        self
    }

    pub fn total_selections(&self) -> usize {
        self.dimensions
            .iter()
            .map(|(_, selections)| selections.len())
            .sum()
    }
}

impl Default for ScoreRequest {
    fn default() -> Self {
        Self {
            base_score: DEFAULT_BASE_SCORE,
            ad_type: None,
            alpha: DEFAULT_ALPHA,
            dimensions: DimensionSelections::default(),
        }
    }
}

/// Tag selections keyed by dimension name, in the order the caller listed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionSelections(Vec<(String, Vec<TagSelection>)>);

impl DimensionSelections {
    /// Sets the selections for `dimension`. A repeated name replaces the earlier
    /// list and keeps its original position.
    pub fn insert(&mut self, dimension: impl Into<String>, selections: Vec<TagSelection>) {
        *self.selections_mut(dimension.into()) = selections;
    }

    pub fn get(&self, dimension: &str) -> Option<&[TagSelection]> {
        self.0
            .iter()
            .find(|(name, _)| name == dimension)
            .map(|(_, selections)| selections.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TagSelection])> {
        self.0
            .iter()
            .map(|(name, selections)| (name.as_str(), selections.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn selections_mut(&mut self, dimension: String) -> &mut Vec<TagSelection> {
        let index = match self.0.iter().position(|(name, _)| *name == dimension) {
            Some(index) => index,
            None => {
                self.0.push((dimension, Vec::new()));
                self.0.len() - 1
            }
        };
        &mut self.0[index].1
    }
}

impl Serialize for DimensionSelections {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, selections) in &self.0 {
            map.serialize_entry(name, selections)?;
        }
        map.end()
    }
}

struct DimensionSelectionsVisitor;

impl<'de> de::Visitor<'de> for DimensionSelectionsVisitor {
    type Value = DimensionSelections;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of dimension names to tag selections")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let mut dimensions = DimensionSelections::default();
        while let Some((name, selections)) = access.next_entry::<String, Vec<TagSelection>>()? {
            dimensions.insert(name, selections);
        }
        Ok(dimensions)
    }
}

impl<'de> Deserialize<'de> for DimensionSelections {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DimensionSelectionsVisitor)
    }
}

/// Reasons a scoring request is turned away before any value is computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreRejection {
    #[error("no ad type selected: please choose an ad type")]
    MissingAdType,
    #[error("unknown ad type '{0}'")]
    UnknownAdType(String),
    #[error("no tags selected: please choose at least one tag")]
    NoTagsSelected,
    #[error("dimension '{dimension}' is not defined for ad type {ad_type}")]
    UnknownDimension { ad_type: AdType, dimension: String },
    #[error("tag '{tag}' does not belong to dimension '{dimension}' of ad type {ad_type}")]
    UnknownTag {
        ad_type: AdType,
        dimension: String,
        tag: String,
    },
    #[error("calculation error: {field} must be a finite number, got {value}")]
    InvalidNumber { field: &'static str, value: f64 },
    #[error("calculation error: weight of tag '{tag}' must be a finite non-negative number, got {weight}")]
    InvalidWeight { tag: String, weight: f64 },
    #[error("calculation error: score is not a finite number (match value {match_value}, k {k}, final ratio {final_ratio})")]
    NonFiniteScore {
        match_value: f64,
        k: f64,
        final_ratio: f64,
    },
}

/// Request checked against the taxonomy, with dimensions in taxonomy order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedRequest<'a> {
    pub ad_type: AdType,
    pub base_score: f64,
    pub alpha: f64,
    pub dimensions: Vec<(&'static str, &'a [TagSelection])>,
}

pub(crate) fn validate(request: &ScoreRequest) -> Result<ValidatedRequest<'_>, ScoreRejection> {
    let label = request
        .ad_type
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .ok_or(ScoreRejection::MissingAdType)?;
    let ad_type =
        AdType::from_label(label).ok_or_else(|| ScoreRejection::UnknownAdType(label.to_string()))?;

    if request.total_selections() == 0 {
        return Err(ScoreRejection::NoTagsSelected);
    }

    for (field, value) in [("base_score", request.base_score), ("alpha", request.alpha)] {
        if !value.is_finite() {
            return Err(ScoreRejection::InvalidNumber { field, value });
        }
    }

    if let Some(selection) = request
        .dimensions
        .iter()
        .flat_map(|(_, selections)| selections)
        .find(|selection| !selection.weight.is_finite() || selection.weight < 0.0)
    {
        return Err(ScoreRejection::InvalidWeight {
            tag: selection.tag.clone(),
            weight: selection.weight,
        });
    }

    for (dimension, selections) in request.dimensions.iter() {
        let allowed = ad_type.tags(dimension);
        if allowed.is_empty() {
            return Err(ScoreRejection::UnknownDimension {
                ad_type,
                dimension: dimension.to_string(),
            });
        }

        if let Some(selection) = selections
            .iter()
            .find(|selection| !allowed.contains(&selection.tag.as_str()))
        {
            return Err(ScoreRejection::UnknownTag {
                ad_type,
                dimension: dimension.to_string(),
                tag: selection.tag.clone(),
            });
        }
    }

    let dimensions = ad_type
        .dimensions()
        .into_iter()
        .filter_map(|name| {
            request
                .dimensions
                .get(name)
                .map(|selections| (name, selections))
        })
        .collect();

    Ok(ValidatedRequest {
        ad_type,
        base_score: request.base_score,
        alpha: request.alpha,
        dimensions,
    })
}

fn default_base_score() -> f64 {
    DEFAULT_BASE_SCORE
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accepts JSON numbers as well as numeric strings such as `"0.6"`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("'{raw}' is not a number"))),
    }
}
