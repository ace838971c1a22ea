use std::path::PathBuf;

use anyhow::Result;
use tantivy::{Index, ReloadPolicy, collector::TopDocs, TantivyDocument};
use tracing::{debug, warn};

use gurka_core::config::Config;
use gurka_core::error::Error;
use gurka_core::fields::{BoostSchedule, ReportField};
use gurka_core::traits::ReportSearcher;
use gurka_core::types::{
	DocumentType, FeatureId, ReportDocument, SearchResponse, SearchResult, NO_CONTENT, NO_FILE, NO_TITLE,
};

use crate::attribution::attribute;
use crate::normalize::normalize;
use crate::query_builder::QueryBuilder;
use crate::tantivy_utils::{product_index_dir, register_tokenizer, FieldMap};

/// Hits returned per query. There is no paging.
pub const TOP_K: usize = 10;

/// Per-product search over indexes stored under one root directory.
///
/// Holds no index handles between requests: each search opens the product
/// index, takes a fresh searcher, and drops both before returning.
pub struct ReportSearchEngine {
	index_root: PathBuf,
	boosts: BoostSchedule,
}

impl ReportSearchEngine {
	pub fn new(index_root: PathBuf, boosts: BoostSchedule) -> Self {
		Self { index_root, boosts }
	}

	pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
		Ok(Self::new(config.index_dir(), config.boosts()?))
	}

	/// Search `product`, logging and swallowing request-level failures.
	pub fn search(&self, product: &str, raw_query: &str) -> SearchResponse {
		match self.try_search(product, raw_query) {
			Ok(response) => response,
			Err(e) => {
				warn!(product, query = raw_query, error = %e, "search failed, returning no results");
				SearchResponse::empty()
			}
		}
	}

	pub fn try_search(&self, product: &str, raw_query: &str) -> Result<SearchResponse, Error> {
		let raw = raw_query.trim();
		if raw.is_empty() {
			return Ok(SearchResponse::empty());
		}
		let index_dir = product_index_dir(&self.index_root, product)?;
		let index = Index::open_in_dir(&index_dir).map_err(|e| Error::index_unavailable(&index_dir, e))?;
		register_tokenizer(&index);
		let reader = index
			.reader_builder()
			.reload_policy(ReloadPolicy::Manual)
			.try_into()
			.map_err(|e| Error::index_unavailable(&index_dir, e))?;
		let searcher = reader.searcher();
		let fields = FieldMap::from_schema(&index.schema());

		let normalized = normalize(raw);
		let built = QueryBuilder::new(&index, &fields, &self.boosts).build(&normalized)?;
		debug!(query = raw, normalized = %normalized, mode = ?built.mode, recovery = ?built.recovery, "built query");

		let top_docs = searcher
			.search(&*built.query, &TopDocs::with_limit(TOP_K))
			.map_err(|e| Error::index_unavailable(&index_dir, e))?;
		let mut results = Vec::with_capacity(top_docs.len());
		let mut first_feature = FirstFeature::default();
		for (score, doc_address) in top_docs {
			let doc: TantivyDocument = searcher.doc(doc_address).map_err(|e| Error::index_unavailable(&index_dir, e))?;
			let report = fields.to_report(&doc);
			first_feature.observe(&report);
			results.push(materialize(&report, score, raw));
		}
		debug!(query = raw, hits = results.len(), "search complete");
		Ok(SearchResponse { results, first_feature_id: first_feature.resolve() })
	}
}

impl ReportSearcher for ReportSearchEngine {
	fn search(&self, product: &str, raw_query: &str) -> SearchResponse {
		Self::search(self, product, raw_query)
	}
}

/// Build the display record for one hit.
pub fn materialize(report: &ReportDocument, score: f32, raw_query: &str) -> SearchResult {
	let doc_type = report.document_type();
	let first_of = |fields: &[ReportField], fallback: &str| {
		fields.iter().find_map(|&f| report.first(f)).unwrap_or(fallback).to_string()
	};
	let only = |wanted: DocumentType, field: ReportField| {
		(doc_type == wanted).then(|| report.first(field).map(str::to_string)).flatten()
	};
	let type_tags = match doc_type {
		DocumentType::Feature => report.distinct(ReportField::FeatureTag),
		DocumentType::Scenario => report.distinct(ReportField::ScenarioTag),
		DocumentType::Testrun => Vec::new(),
		DocumentType::Unknown => report.distinct(ReportField::RuleTag),
	};
	let status = match doc_type {
		DocumentType::Feature => report.first(ReportField::FeatureStatus),
		DocumentType::Scenario => report.first(ReportField::ScenarioStatus),
		DocumentType::Testrun | DocumentType::Unknown => None,
	};
	SearchResult {
		score,
		doc_type,
		title: first_of(&[ReportField::FeatureName, ReportField::ScenarioName, ReportField::Name], NO_TITLE),
		content: first_of(&[ReportField::FeatureDescription, ReportField::StepText, ReportField::CommitMessage], NO_CONTENT),
		file_name: first_of(&[ReportField::FileName], NO_FILE),
		matched_field: attribute(report, raw_query),
		tags: report.distinct(ReportField::Tag),
		type_tags,
		status: status.map(str::to_string),
		feature_id: only(DocumentType::Feature, ReportField::FeatureId),
		parent_feature_id: only(DocumentType::Scenario, ReportField::ParentFeatureId),
		parent_feature_name: only(DocumentType::Scenario, ReportField::ParentFeatureName),
		duration: only(DocumentType::Scenario, ReportField::ScenarioTestDuration),
	}
}

/// Tracks the first feature reachable from the hits.
///
/// A hit that is itself a feature beats any earlier scenario's parent
/// reference. Identifiers that are not GUIDs are skipped.
#[derive(Debug, Default)]
pub struct FirstFeature {
	own: Option<FeatureId>,
	parent: Option<FeatureId>,
}

impl FirstFeature {
	pub fn observe(&mut self, report: &ReportDocument) {
		if self.own.is_none() && report.document_type() == DocumentType::Feature {
			self.own = report.first(ReportField::FeatureId).and_then(FeatureId::parse);
		}
		if self.parent.is_none() {
			self.parent = report.first(ReportField::ParentFeatureId).and_then(FeatureId::parse);
		}
	}

	pub fn resolve(self) -> Option<FeatureId> {
		self.own.or(self.parent)
	}
}
