//! Fixed label vocabularies produced by the style/trait classifier
//!
//! Both sets are closed: every persisted event carries exactly one member of
//! each, whether it came from the classification service or from a fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Identifies one of the two enumerated label sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSet {
    Style,
    Trait,
}

impl LabelSet {
    /// Name sent to the classification service
    pub fn name(&self) -> &'static str {
        match self {
            LabelSet::Style => "professional_style",
            LabelSet::Trait => "personality_trait",
        }
    }

    /// All label strings of this set, in declaration order
    pub fn labels(&self) -> Vec<&'static str> {
        match self {
            LabelSet::Style => StyleLabel::all().iter().map(|l| l.as_str()).collect(),
            LabelSet::Trait => TraitLabel::all().iter().map(|l| l.as_str()).collect(),
        }
    }
}

/// Common behaviour of the enumerated label types
pub trait Label: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// The set this label type belongs to
    const SET: LabelSet;

    /// Every member of the set
    fn all() -> &'static [Self];

    /// Canonical lowercase spelling
    fn as_str(&self) -> &'static str;

    /// Case-insensitive lookup, tolerant of surrounding whitespace
    fn parse_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::all()
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(raw))
    }
}

/// Inferred professional style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleLabel {
    Professional,
    Casual,
    Creative,
    Technical,
}

impl Label for StyleLabel {
    const SET: LabelSet = LabelSet::Style;

    fn all() -> &'static [Self] {
        &[
            StyleLabel::Professional,
            StyleLabel::Casual,
            StyleLabel::Creative,
            StyleLabel::Technical,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            StyleLabel::Professional => "professional",
            StyleLabel::Casual => "casual",
            StyleLabel::Creative => "creative",
            StyleLabel::Technical => "technical",
        }
    }
}

/// Inferred personality trait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitLabel {
    Confident,
    Analytical,
    Innovative,
    Collaborative,
}

impl Label for TraitLabel {
    const SET: LabelSet = LabelSet::Trait;

    fn all() -> &'static [Self] {
        &[
            TraitLabel::Confident,
            TraitLabel::Analytical,
            TraitLabel::Innovative,
            TraitLabel::Collaborative,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            TraitLabel::Confident => "confident",
            TraitLabel::Analytical => "analytical",
            TraitLabel::Innovative => "innovative",
            TraitLabel::Collaborative => "collaborative",
        }
    }
}

macro_rules! impl_label_text {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as Label>::parse_label(s).ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "'{}' is not a member of the {} label set",
                        s,
                        <$ty as Label>::SET.name()
                    ))
                })
            }
        }
    };
}

impl_label_text!(StyleLabel);
impl_label_text!(TraitLabel);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(StyleLabel::parse_label("  Technical\n"), Some(StyleLabel::Technical));
        assert_eq!(TraitLabel::parse_label("ANALYTICAL"), Some(TraitLabel::Analytical));
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        assert_eq!(StyleLabel::parse_label(""), None);
        assert_eq!(StyleLabel::parse_label("confident"), None);
        assert!("sporty".parse::<TraitLabel>().is_err());
    }

    #[test]
    fn test_label_set_lists_every_member() {
        assert_eq!(
            LabelSet::Style.labels(),
            vec!["professional", "casual", "creative", "technical"]
        );
        assert_eq!(LabelSet::Trait.labels().len(), TraitLabel::all().len());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&StyleLabel::Creative).unwrap();
        assert_eq!(json, "\"creative\"");
        let back: TraitLabel = serde_json::from_str("\"collaborative\"").unwrap();
        assert_eq!(back, TraitLabel::Collaborative);
    }
}
