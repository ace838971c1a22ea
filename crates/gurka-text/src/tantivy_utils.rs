use std::path::{Component, Path, PathBuf};

use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer};
use tantivy::{Index, TantivyDocument};

use gurka_core::error::{Error, Result};
use gurka_core::fields::ReportField;
use gurka_core::types::ReportDocument;

pub const TEXT_TOKENIZER: &str = "gurka_text";

/// One stored field per canonical name. Identifiers stay a single raw token.
pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	for field in ReportField::ALL {
		if field.is_identifier() {
			schema_builder.add_text_field(field.as_str(), STRING | STORED);
		} else {
			let indexing = TextFieldIndexing::default().set_tokenizer(TEXT_TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
			schema_builder.add_text_field(field.as_str(), TextOptions::default().set_indexing_options(indexing).set_stored());
		}
	}
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.build();
	index.tokenizers().register(TEXT_TOKENIZER, tokenizer);
}

/// Index directory for one product under `root`.
///
/// The product name becomes a single path component, so separators and
/// relative components are rejected.
pub fn product_index_dir(root: &Path, product: &str) -> Result<PathBuf> {
	let mut components = Path::new(product).components();
	match (components.next(), components.next()) {
		(Some(Component::Normal(name)), None) if !product.contains(['/', '\\']) => Ok(root.join(name)),
		_ => Err(Error::InvalidProduct(product.to_string())),
	}
}

/// Canonical fields resolved against an index schema.
///
/// Fields missing from the schema are left out rather than failing, so an
/// older index still answers queries on the fields it has.
#[derive(Debug, Clone)]
pub struct FieldMap {
	fields: Vec<(ReportField, Field)>,
}

impl FieldMap {
	pub fn from_schema(schema: &Schema) -> Self {
		let fields = ReportField::ALL
			.into_iter()
			.filter_map(|f| schema.get_field(f.as_str()).ok().map(|field| (f, field)))
			.collect();
		Self { fields }
	}

	pub fn get(&self, field: ReportField) -> Option<Field> {
		self.fields.iter().find(|(f, _)| *f == field).map(|&(_, field)| field)
	}

	pub fn to_tantivy(&self, doc: &ReportDocument) -> TantivyDocument {
		let mut tantivy_doc = TantivyDocument::new();
		for (report_field, values) in doc.iter() {
			let Some(field) = self.get(report_field) else { continue };
			for value in values.iter().filter(|v| !v.is_empty()) {
				tantivy_doc.add_text(field, value);
			}
		}
		tantivy_doc
	}

	pub fn to_report(&self, doc: &TantivyDocument) -> ReportDocument {
		let mut report = ReportDocument::new();
		for &(report_field, field) in &self.fields {
			for value in doc.get_all(field).filter_map(|v| v.as_str()) {
				report.push(report_field, value);
			}
		}
		report
	}
}
