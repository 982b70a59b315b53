//! Static ad type → dimension → tag registry.
//!
//! Lookups never fail: an unknown ad type or dimension simply yields an empty
//! result. Callers that need strict validation go through [`AdType::from_label`]
//! and [`AdType::tags`].

mod catalog;

pub use catalog::DimensionSpec;

use serde::{Serialize, Serializer};
use std::fmt;

/// Closed set of ad types offered to callers.
///
/// The last four variants are catalogue entries without a tag taxonomy; they
/// are listed so front-ends can display them, but no selection can be scored
/// against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdType {
    LongVideo,
    ShortVideo,
    ImageText,
    Print,
    Animation,
    Audio,
    LiveCommerce,
    Interactive,
    Referral,
    Sponsorship,
    ProductPlacement,
}

impl AdType {
    pub const fn ordered() -> [Self; 11] {
        [
            Self::LongVideo,
            Self::ShortVideo,
            Self::ImageText,
            Self::Print,
            Self::Animation,
            Self::Audio,
            Self::LiveCommerce,
            Self::Interactive,
            Self::Referral,
            Self::Sponsorship,
            Self::ProductPlacement,
        ]
    }

    /// Ad types that carry a dimension/tag taxonomy.
    pub fn scored() -> impl Iterator<Item = Self> {
        Self::ordered()
            .into_iter()
            .filter(|ad_type| ad_type.has_taxonomy())
    }

    /// Label used in source tables, requests, and responses.
    pub const fn label(self) -> &'static str {
        match self {
            Self::LongVideo => "中长视频类",
            Self::ShortVideo => "短视频类",
            Self::ImageText => "图文类",
            Self::Print => "平面类",
            Self::Animation => "动画类",
            Self::Audio => "声音类",
            Self::LiveCommerce => "直播带货类",
            Self::Interactive => "互动类",
            Self::Referral => "裂变类",
            Self::Sponsorship => "赞助类",
            Self::ProductPlacement => "植入类",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ordered()
            .into_iter()
            .find(|ad_type| ad_type.label() == label)
    }

    pub fn dimension_specs(self) -> &'static [DimensionSpec] {
        match self {
            Self::LongVideo => catalog::LONG_VIDEO,
            Self::ShortVideo => catalog::SHORT_VIDEO,
            Self::ImageText => catalog::IMAGE_TEXT,
            Self::Print => catalog::PRINT,
            Self::Animation => catalog::ANIMATION,
            Self::Audio => catalog::AUDIO,
            Self::LiveCommerce => catalog::LIVE_COMMERCE,
            Self::Interactive | Self::Referral | Self::Sponsorship | Self::ProductPlacement => {
                catalog::CATALOGUE_ONLY
            }
        }
    }

    pub fn has_taxonomy(self) -> bool {
        !self.dimension_specs().is_empty()
    }

    /// Dimension names in display order.
    pub fn dimensions(self) -> Vec<&'static str> {
        self.dimension_specs().iter().map(|spec| spec.name).collect()
    }

    /// Valid tags for `dimension`, empty when the dimension is not defined.
    pub fn tags(self, dimension: &str) -> &'static [&'static str] {
        self.dimension_specs()
            .iter()
            .find(|spec| spec.name == dimension)
            .map(|spec| spec.tags)
            .unwrap_or(&[])
    }

    /// Every tag across all dimensions, in dimension order.
    pub fn all_tags(self) -> Vec<&'static str> {
        self.dimension_specs()
            .iter()
            .flat_map(|spec| spec.tags.iter().copied())
            .collect()
    }
}

impl fmt::Display for AdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AdType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

pub fn list_ad_types() -> Vec<AdType> {
    AdType::ordered().to_vec()
}

pub fn dimensions_for(ad_type: &str) -> Vec<&'static str> {
    AdType::from_label(ad_type)
        .map(AdType::dimensions)
        .unwrap_or_default()
}

pub fn tags_for(ad_type: &str, dimension: &str) -> &'static [&'static str] {
    AdType::from_label(ad_type)
        .map(|ad_type| ad_type.tags(dimension))
        .unwrap_or(&[])
}
