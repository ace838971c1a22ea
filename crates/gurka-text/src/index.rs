use std::path::{Path, PathBuf};

use anyhow::Result;
use tantivy::Index;
use tracing::info;

use gurka_core::error::Error;
use gurka_core::fields::ReportField;
use gurka_core::report::{Feature, Scenario, Testrun};
use gurka_core::traits::ReportIndexer;
use gurka_core::types::ReportDocument;

use crate::tantivy_utils::{build_schema, product_index_dir, register_tokenizer, FieldMap};

const WRITER_HEAP_BYTES: usize = 50_000_000;

pub struct TantivyReportIndexer {
	index: Index,
	fields: FieldMap,
	dir: PathBuf,
}

impl TantivyReportIndexer {
	/// Create an empty index in `index_dir`, replacing whatever was there.
	pub fn create(index_dir: PathBuf) -> Result<Self, anyhow::Error> {
		let schema = build_schema();
		if index_dir.exists() {
			std::fs::remove_dir_all(&index_dir)?;
		}
		std::fs::create_dir_all(&index_dir)?;
		let index = Index::create_in_dir(&index_dir, schema.clone())?;
		register_tokenizer(&index);
		let fields = FieldMap::from_schema(&schema);
		Ok(Self { index, fields, dir: index_dir })
	}

	/// Create the index for `product` under the shared index root.
	pub fn create_for_product(index_root: &Path, product: &str) -> Result<Self, anyhow::Error> {
		Self::create(product_index_dir(index_root, product)?)
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn index_documents(&self, docs: &[ReportDocument]) -> Result<usize, anyhow::Error> {
		let mut index_writer = self.index.writer(WRITER_HEAP_BYTES)?;
		for doc in docs {
			index_writer.add_document(self.fields.to_tantivy(doc))?;
		}
		index_writer.commit()?;
		Ok(docs.len())
	}
}

impl ReportIndexer for TantivyReportIndexer {
	fn index_testrun(&self, run: &Testrun, file_name: &str, product: &str) -> anyhow::Result<usize> {
		let docs = testrun_documents(run, file_name, product)?;
		let count = self.index_documents(&docs)?;
		info!(product, file = file_name, documents = count, dir = %self.dir.display(), "indexed report");
		Ok(count)
	}
}

/// Flatten one run into index documents for `product`.
///
/// Produces one document for the run itself, then for each feature the
/// feature, its rules, and every scenario (direct or inside a rule).
pub fn testrun_documents(run: &Testrun, file_name: &str, product: &str) -> Result<Vec<ReportDocument>, Error> {
	let product = run.product(product).ok_or_else(|| Error::NotFound(format!("product '{product}' in {file_name}")))?;
	let mut docs = vec![testrun_document(run, file_name)];
	for feature in &product.features {
		docs.push(feature_document(feature, file_name));
		for scenario in &feature.scenarios {
			docs.push(scenario_document(scenario, feature, &[], file_name));
		}
		for rule in &feature.rules {
			let mut doc = base(file_name);
			put(&mut doc, ReportField::RuleName, &rule.name);
			put(&mut doc, ReportField::RuleDescription, &rule.description);
			put(&mut doc, ReportField::RuleStatus, &rule.status);
			put_all(&mut doc, ReportField::RuleTag, &rule.tags);
			put_all(&mut doc, ReportField::Tag, &rule.tags);
			put(&mut doc, ReportField::ParentFeatureId, &feature.id);
			put(&mut doc, ReportField::ParentFeatureName, &feature.name);
			docs.push(doc);
			for scenario in &rule.scenarios {
				docs.push(scenario_document(scenario, feature, &rule.tags, file_name));
			}
		}
	}
	Ok(docs)
}

fn testrun_document(run: &Testrun, file_name: &str) -> ReportDocument {
	let mut doc = base(file_name);
	put(&mut doc, ReportField::Name, &run.name);
	put(&mut doc, ReportField::BranchName, &run.branch_name);
	put(&mut doc, ReportField::CommitId, &run.commit_id);
	put(&mut doc, ReportField::CommitMessage, &run.commit_message);
	doc
}

fn feature_document(feature: &Feature, file_name: &str) -> ReportDocument {
	let mut doc = base(file_name);
	put(&mut doc, ReportField::FeatureId, &feature.id);
	put(&mut doc, ReportField::FeatureName, &feature.name);
	put(&mut doc, ReportField::FeatureDescription, &feature.description);
	put(&mut doc, ReportField::FeatureStatus, &feature.status);
	put_all(&mut doc, ReportField::Tag, &feature.tags);
	put_all(&mut doc, ReportField::FeatureTag, &feature.tags);
	doc
}

/// Scenario tags inherit from the feature and the enclosing rule; `ScenarioTag` keeps only its own.
fn scenario_document(scenario: &Scenario, feature: &Feature, rule_tags: &[String], file_name: &str) -> ReportDocument {
	let mut doc = base(file_name);
	put(&mut doc, ReportField::ScenarioName, &scenario.name);
	put(&mut doc, ReportField::ScenarioStatus, &scenario.status);
	put(&mut doc, ReportField::ScenarioTestDuration, &scenario.test_duration);
	put(&mut doc, ReportField::ParentFeatureId, &feature.id);
	put(&mut doc, ReportField::ParentFeatureName, &feature.name);
	let steps: Vec<String> = scenario.steps.iter().map(|s| s.line()).filter(|l| !l.trim().is_empty()).collect();
	put(&mut doc, ReportField::StepText, &steps.join("\n"));
	put_all(&mut doc, ReportField::Tag, &feature.tags);
	put_all(&mut doc, ReportField::Tag, rule_tags);
	put_all(&mut doc, ReportField::Tag, &scenario.tags);
	put_all(&mut doc, ReportField::ScenarioTag, &scenario.tags);
	doc
}

fn base(file_name: &str) -> ReportDocument {
	let mut doc = ReportDocument::new();
	put(&mut doc, ReportField::FileName, file_name);
	doc
}

fn put(doc: &mut ReportDocument, field: ReportField, value: &str) {
	let value = value.trim();
	if !value.is_empty() {
		doc.push(field, value);
	}
}

fn put_all(doc: &mut ReportDocument, field: ReportField, values: &[String]) {
	for value in values {
		put(doc, field, value);
	}
}
