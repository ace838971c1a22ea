//! Field vocabulary shared with the index.
//!
//! The canonical names are the exact keys stored in the index; renaming any of
//! them requires re-indexing every product. The shorthand prefix table and the
//! boost schedule are both ordered lists because lookup order decides the
//! result when entries overlap.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportField {
    FileName,
    Name,
    BranchName,
    CommitId,
    CommitMessage,
    FeatureName,
    FeatureDescription,
    FeatureStatus,
    FeatureId,
    ScenarioName,
    ScenarioStatus,
    ScenarioTestDuration,
    ParentFeatureId,
    ParentFeatureName,
    StepText,
    Tag,
    FeatureTag,
    ScenarioTag,
    RuleTag,
    RuleName,
    RuleDescription,
    RuleStatus,
}

impl ReportField {
    /// Every field, in schema order.
    pub const ALL: [ReportField; 22] = [
        Self::FileName,
        Self::Name,
        Self::BranchName,
        Self::CommitId,
        Self::CommitMessage,
        Self::FeatureName,
        Self::FeatureDescription,
        Self::FeatureStatus,
        Self::FeatureId,
        Self::ScenarioName,
        Self::ScenarioStatus,
        Self::ScenarioTestDuration,
        Self::ParentFeatureId,
        Self::ParentFeatureName,
        Self::StepText,
        Self::Tag,
        Self::FeatureTag,
        Self::ScenarioTag,
        Self::RuleTag,
        Self::RuleName,
        Self::RuleDescription,
        Self::RuleStatus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FileName => "FileName",
            Self::Name => "Name",
            Self::BranchName => "BranchName",
            Self::CommitId => "CommitId",
            Self::CommitMessage => "CommitMessage",
            Self::FeatureName => "FeatureName",
            Self::FeatureDescription => "FeatureDescription",
            Self::FeatureStatus => "FeatureStatus",
            Self::FeatureId => "FeatureId",
            Self::ScenarioName => "ScenarioName",
            Self::ScenarioStatus => "ScenarioStatus",
            Self::ScenarioTestDuration => "ScenarioTestDuration",
            Self::ParentFeatureId => "ParentFeatureId",
            Self::ParentFeatureName => "ParentFeatureName",
            Self::StepText => "StepText",
            Self::Tag => "Tag",
            Self::FeatureTag => "FeatureTag",
            Self::ScenarioTag => "ScenarioTag",
            Self::RuleTag => "RuleTag",
            Self::RuleName => "RuleName",
            Self::RuleDescription => "RuleDescription",
            Self::RuleStatus => "RuleStatus",
        }
    }

    /// Exact, case-sensitive lookup of a stored field name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    /// Identifier-like fields are indexed as a single raw token.
    pub fn is_identifier(self) -> bool {
        matches!(self, Self::FeatureId | Self::ParentFeatureId | Self::CommitId)
    }
}

impl fmt::Display for ReportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shorthand prefixes a user may type, in lookup order.
///
/// Prefixes are compared case-insensitively against the start of the query.
/// The `@` marker is kept here for completeness but [`resolve`] checks it
/// before scanning the table.
pub const PREFIX_TABLE: &[(&str, ReportField)] = &[
    ("feature:", ReportField::FeatureName),
    ("egenskap:", ReportField::FeatureName),
    ("feature name:", ReportField::FeatureName),
    ("feature id:", ReportField::FeatureId),
    ("feature description:", ReportField::FeatureDescription),
    ("feature status:", ReportField::FeatureStatus),
    ("scenario:", ReportField::ScenarioName),
    ("test:", ReportField::ScenarioName),
    ("scenario name:", ReportField::ScenarioName),
    ("scenario status:", ReportField::ScenarioStatus),
    ("scenario duration:", ReportField::ScenarioTestDuration),
    ("step:", ReportField::StepText),
    ("steg:", ReportField::StepText),
    ("tag:", ReportField::Tag),
    ("tags:", ReportField::Tag),
    ("@", ReportField::Tag),
    ("featuretag:", ReportField::FeatureTag),
    ("feature tag:", ReportField::FeatureTag),
    ("scenariotag:", ReportField::ScenarioTag),
    ("scenario tag:", ReportField::ScenarioTag),
    ("rule:", ReportField::RuleName),
    ("rule description:", ReportField::RuleDescription),
    ("rule status:", ReportField::RuleStatus),
    ("ruletag:", ReportField::RuleTag),
    ("rule tag:", ReportField::RuleTag),
    ("file:", ReportField::FileName),
    ("fil:", ReportField::FileName),
    ("name:", ReportField::Name),
    ("namn:", ReportField::Name),
    ("branch:", ReportField::BranchName),
    ("commit:", ReportField::CommitId),
    ("message:", ReportField::CommitMessage),
    ("parent:", ReportField::ParentFeatureId),
    ("parent feature:", ReportField::ParentFeatureId),
    ("parent name:", ReportField::ParentFeatureName),
];

pub const TAG_MARKER: char = '@';

/// Repeatable tag-like fields in attribution priority order.
pub const TAG_FIELDS: [ReportField; 4] = [
    ReportField::Tag,
    ReportField::FeatureTag,
    ReportField::ScenarioTag,
    ReportField::RuleTag,
];

/// Candidate fields scanned when attributing a match, highest priority first.
pub const ATTRIBUTION_ORDER: [ReportField; 22] = [
    ReportField::Tag,
    ReportField::FeatureTag,
    ReportField::ScenarioTag,
    ReportField::RuleTag,
    ReportField::FeatureName,
    ReportField::ScenarioName,
    ReportField::RuleName,
    ReportField::Name,
    ReportField::FeatureDescription,
    ReportField::RuleDescription,
    ReportField::StepText,
    ReportField::CommitMessage,
    ReportField::ParentFeatureName,
    ReportField::FileName,
    ReportField::BranchName,
    ReportField::FeatureStatus,
    ReportField::ScenarioStatus,
    ReportField::RuleStatus,
    ReportField::ScenarioTestDuration,
    ReportField::CommitId,
    ReportField::FeatureId,
    ReportField::ParentFeatureId,
];

/// A recognized shorthand prefix at the start of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPrefix {
    pub field: ReportField,
    /// Byte length of the matched prefix in the raw query.
    pub len: usize,
}

/// Resolve the leading shorthand prefix of `raw`, if any.
pub fn resolve(raw: &str) -> Option<FieldPrefix> {
    if raw.starts_with(TAG_MARKER) {
        return Some(FieldPrefix { field: ReportField::Tag, len: TAG_MARKER.len_utf8() });
    }
    PREFIX_TABLE
        .iter()
        .find(|(prefix, _)| starts_with_ignore_case(raw, prefix))
        .map(|&(prefix, field)| FieldPrefix { field, len: prefix.len() })
}

/// Canonical field reached by a bare qualifier such as `feature` or `FeatureName`.
///
/// `tag`/`tags` always mean the generic tag field. Otherwise the first table
/// entry whose prefix word equals the identifier, or whose target field name
/// starts with it, wins.
pub fn resolve_qualifier(identifier: &str) -> Option<ReportField> {
    let ident = identifier.trim().to_lowercase();
    if ident.is_empty() {
        return None;
    }
    if ident == "tag" || ident == "tags" {
        return Some(ReportField::Tag);
    }
    PREFIX_TABLE
        .iter()
        .find(|(prefix, field)| {
            prefix.trim_end_matches(':') == ident
                || field.as_str().to_lowercase().starts_with(&ident)
        })
        .map(|&(_, field)| field)
}

fn starts_with_ignore_case(raw: &str, prefix: &str) -> bool {
    raw.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Per-field relevance weights for unqualified multi-field queries.
///
/// Fields missing from the schedule do not take part in implicit search.
#[derive(Debug, Clone, PartialEq)]
pub struct BoostSchedule {
    entries: Vec<(ReportField, f32)>,
}

impl Default for BoostSchedule {
    fn default() -> Self {
        use ReportField::*;
        Self {
            entries: vec![
                (FileName, 1.0),
                (Name, 1.5),
                (BranchName, 1.0),
                (CommitId, 1.0),
                (CommitMessage, 1.0),
                (FeatureName, 2.0),
                (FeatureDescription, 1.5),
                (FeatureStatus, 1.0),
                (FeatureId, 1.0),
                (ScenarioName, 1.8),
                (ScenarioStatus, 1.0),
                (ScenarioTestDuration, 1.0),
                (ParentFeatureId, 1.0),
                (ParentFeatureName, 1.0),
                (StepText, 1.5),
                (Tag, 2.0),
                (FeatureTag, 1.5),
                (ScenarioTag, 1.5),
                (RuleTag, 1.0),
                (RuleName, 1.8),
                (RuleDescription, 1.2),
                (RuleStatus, 1.0),
            ],
        }
    }
}

impl BoostSchedule {
    /// Apply configured overrides keyed by canonical field name.
    pub fn with_overrides(mut self, overrides: &HashMap<String, f32>) -> Result<Self> {
        for (name, &boost) in overrides {
            let field = ReportField::from_name(name)
                .ok_or_else(|| Error::InvalidConfig(format!("unknown boost field '{name}'")))?;
            if !(boost.is_finite() && boost > 0.0) {
                return Err(Error::InvalidConfig(format!("boost for '{name}' must be positive, got {boost}")));
            }
            match self.entries.iter_mut().find(|(f, _)| *f == field) {
                Some(entry) => entry.1 = boost,
                None => self.entries.push((field, boost)),
            }
        }
        Ok(self)
    }

    pub fn boost(&self, field: ReportField) -> Option<f32> {
        self.entries.iter().find(|(f, _)| *f == field).map(|&(_, b)| b)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReportField, f32)> + '_ {
        self.entries.iter().copied()
    }
}
