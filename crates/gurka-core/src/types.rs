//! Domain types produced by the search engine.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::fields::ReportField;

pub const NO_TITLE: &str = "No Title";
pub const NO_CONTENT: &str = "No Content";
pub const NO_FILE: &str = "No File";
pub const UNKNOWN: &str = "Unknown";

static GUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{?[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\}?$")
        .expect("GUID pattern is valid")
});

/// Read-only view of one stored index document.
///
/// Values keep the order they were stored in. Repeatable fields (tags) may
/// hold any number of values; all other fields hold at most one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    fields: BTreeMap<ReportField, Vec<String>>,
}

impl ReportDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: ReportField, value: impl Into<String>) {
        self.fields.entry(field).or_default().push(value.into());
    }

    pub fn with(mut self, field: ReportField, value: impl Into<String>) -> Self {
        self.push(field, value);
        self
    }

    pub fn values(&self, field: ReportField) -> &[String] {
        self.fields.get(&field).map_or(&[], Vec::as_slice)
    }

    /// First non-empty value of `field`.
    pub fn first(&self, field: ReportField) -> Option<&str> {
        self.values(field).iter().map(String::as_str).find(|v| !v.is_empty())
    }

    pub fn has(&self, field: ReportField) -> bool {
        self.first(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReportField, &[String])> + '_ {
        self.fields.iter().map(|(field, values)| (*field, values.as_slice()))
    }

    /// Classify by field presence: scenario name, then feature name, then commit message.
    pub fn document_type(&self) -> DocumentType {
        if self.has(ReportField::ScenarioName) {
            DocumentType::Scenario
        } else if self.has(ReportField::FeatureName) {
            DocumentType::Feature
        } else if self.has(ReportField::CommitMessage) {
            DocumentType::Testrun
        } else {
            DocumentType::Unknown
        }
    }

    /// Values of `field` with duplicates removed, first occurrence kept.
    pub fn distinct(&self, field: ReportField) -> Vec<String> {
        let mut seen = HashSet::new();
        self.values(field)
            .iter()
            .filter(|v| !v.is_empty() && seen.insert(v.as_str()))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    Feature,
    Scenario,
    Testrun,
    Unknown,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Feature => "Feature",
            Self::Scenario => "Scenario",
            Self::Testrun => "Testrun",
            Self::Unknown => UNKNOWN,
        };
        f.write_str(s)
    }
}

/// The field a hit is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchedField {
    Field(ReportField),
    Unknown,
}

impl MatchedField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Field(field) => field.as_str(),
            Self::Unknown => UNKNOWN,
        }
    }
}

impl fmt::Display for MatchedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature identifier in GUID form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureId(String);

impl FeatureId {
    /// Parse a GUID, braces optional. Malformed input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if !GUID.is_match(raw) {
            return None;
        }
        Some(Self(raw.trim_start_matches('{').trim_end_matches('}').to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One annotated hit returned to the caller.
///
/// `status`, `feature_id`, `parent_feature_*` and `duration` are filled only
/// when the inferred document type carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub score: f32,
    pub doc_type: DocumentType,
    pub title: String,
    pub content: String,
    pub file_name: String,
    pub matched_field: MatchedField,
    pub tags: Vec<String>,
    pub type_tags: Vec<String>,
    pub status: Option<String>,
    pub feature_id: Option<String>,
    pub parent_feature_id: Option<String>,
    pub parent_feature_name: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// First feature reachable from the hits, for default navigation.
    pub first_feature_id: Option<FeatureId>,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_prefers_scenario_then_feature_then_commit() {
        let doc = ReportDocument::new()
            .with(ReportField::FeatureName, "Checkout")
            .with(ReportField::ScenarioName, "Pay");
        assert_eq!(doc.document_type(), DocumentType::Scenario);

        let doc = ReportDocument::new()
            .with(ReportField::CommitMessage, "fix")
            .with(ReportField::FeatureName, "Checkout");
        assert_eq!(doc.document_type(), DocumentType::Feature);

        let doc = ReportDocument::new().with(ReportField::CommitMessage, "fix");
        assert_eq!(doc.document_type(), DocumentType::Testrun);

        let doc = ReportDocument::new().with(ReportField::RuleName, "Limits");
        assert_eq!(doc.document_type(), DocumentType::Unknown);
    }

    #[test]
    fn empty_values_do_not_count_as_present() {
        let doc = ReportDocument::new().with(ReportField::ScenarioName, "");
        assert!(!doc.has(ReportField::ScenarioName));
        assert_eq!(doc.document_type(), DocumentType::Unknown);
    }

    #[test]
    fn distinct_keeps_first_occurrence() {
        let doc = ReportDocument::new()
            .with(ReportField::Tag, "@smoke")
            .with(ReportField::Tag, "@slow")
            .with(ReportField::Tag, "@smoke");
        assert_eq!(doc.distinct(ReportField::Tag), vec!["@smoke", "@slow"]);
    }

    #[test]
    fn feature_id_parsing() {
        let id = FeatureId::parse("{3F2504E0-4F89-11D3-9A0C-0305E82C3301}").expect("guid");
        assert_eq!(id.as_str(), "3f2504e0-4f89-11d3-9a0c-0305e82c3301");
        assert!(FeatureId::parse("not-a-guid").is_none());
        assert!(FeatureId::parse("").is_none());
    }
}
