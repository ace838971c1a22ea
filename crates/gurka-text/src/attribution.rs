//! Guessing which field made a document match.
//!
//! The index scores whole documents, so the matching field is reconstructed
//! afterwards from the stored values. Layers run in order and the first one
//! that names a field wins; when none does, the document type picks a default.

use gurka_core::fields::{self, ReportField, ATTRIBUTION_ORDER, TAG_FIELDS, TAG_MARKER};
use gurka_core::types::{DocumentType, MatchedField, ReportDocument};
use tracing::trace;

use crate::normalize::{search_term, split_qualifier};

/// Token delimiters for overlap scoring, in addition to whitespace.
const PUNCTUATION: &[char] = &[
    ',', '.', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '"', '\'', '-', '_', '/', '\\', '@', '#', '*', '+', '=',
    '<', '>', '|', '&',
];

const MIN_TOKEN_CHARS: usize = 3;

/// What a layer sees: the hit, the query as typed, and the bare search term.
pub struct Probe<'a> {
    pub doc: &'a ReportDocument,
    pub query: &'a str,
    pub term: &'a str,
}

pub type Layer = fn(&Probe<'_>) -> Option<ReportField>;

/// Attribution layers, highest priority first.
pub const LAYERS: [(&str, Layer); 4] = [
    ("tag_marker", tag_marker),
    ("qualifier", explicit_qualifier),
    ("substring", substring_scan),
    ("token_overlap", token_overlap),
];

/// Attribute a hit to one field. Always returns a value.
pub fn attribute(doc: &ReportDocument, raw_query: &str) -> MatchedField {
    let query = raw_query.trim();
    let probe = Probe { doc, query, term: search_term(query) };
    for (name, layer) in LAYERS {
        if let Some(field) = layer(&probe) {
            trace!(layer = name, %field, "attributed match");
            return MatchedField::Field(field);
        }
    }
    type_default(doc.document_type())
}

pub fn type_default(doc_type: DocumentType) -> MatchedField {
    match doc_type {
        DocumentType::Feature => MatchedField::Field(ReportField::FeatureName),
        DocumentType::Scenario => MatchedField::Field(ReportField::ScenarioName),
        DocumentType::Testrun => MatchedField::Field(ReportField::CommitMessage),
        DocumentType::Unknown => MatchedField::Unknown,
    }
}

/// `@tag` queries: exact tag value, with or without the marker.
pub fn tag_marker(probe: &Probe<'_>) -> Option<ReportField> {
    let bare = probe.query.strip_prefix(TAG_MARKER)?.trim().to_lowercase();
    if bare.is_empty() {
        return None;
    }
    let marked = format!("{TAG_MARKER}{bare}");
    TAG_FIELDS.into_iter().find(|&field| {
        probe.doc.values(field).iter().any(|v| {
            let v = v.trim().to_lowercase();
            v == bare || v == marked
        })
    })
}

/// `field: term` queries whose qualifier names a field the document carries.
pub fn explicit_qualifier(probe: &Probe<'_>) -> Option<ReportField> {
    if probe.query.starts_with(TAG_MARKER) {
        return None;
    }
    let field = match fields::resolve(probe.query) {
        Some(prefix) => prefix.field,
        None => split_qualifier(probe.query).and_then(|(identifier, _)| fields::resolve_qualifier(identifier))?,
    };
    probe.doc.has(field).then_some(field)
}

/// First candidate field containing the whole search term.
pub fn substring_scan(probe: &Probe<'_>) -> Option<ReportField> {
    if probe.term.is_empty() {
        return None;
    }
    let needle = probe.term.to_lowercase();
    ATTRIBUTION_ORDER
        .into_iter()
        .find(|&field| probe.doc.values(field).iter().any(|v| v.to_lowercase().contains(&needle)))
}

/// Field containing the most search tokens; earlier fields win ties.
pub fn token_overlap(probe: &Probe<'_>) -> Option<ReportField> {
    let tokens = tokenize(probe.term);
    if tokens.is_empty() {
        return None;
    }
    let mut best: Option<(ReportField, usize)> = None;
    for field in ATTRIBUTION_ORDER {
        let count: usize = probe
            .doc
            .values(field)
            .iter()
            .map(|v| {
                let v = v.to_lowercase();
                tokens.iter().filter(|t| v.contains(t.as_str())).count()
            })
            .sum();
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((field, count));
        }
    }
    best.map(|(field, _)| field)
}

fn tokenize(term: &str) -> Vec<String> {
    term.split(|c: char| c.is_whitespace() || PUNCTUATION.contains(&c))
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_lowercase)
        .collect()
}
