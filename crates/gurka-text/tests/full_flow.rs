use std::path::Path;

use gurka_core::error::Error;
use gurka_core::fields::{BoostSchedule, ReportField};
use gurka_core::report::{Feature, Product, Rule, Scenario, Step, Testrun};
use gurka_core::traits::{ReportIndexer, ReportSearcher};
use gurka_core::types::{DocumentType, MatchedField};
use gurka_text::{ReportSearchEngine, TantivyReportIndexer, TOP_K};
use tempfile::TempDir;

const CHECKOUT_ID: &str = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";
const FILE_NAME: &str = "shop_2024-03-01T12_00_00.gurka";

fn scenario(name: &str, tags: &[&str], steps: &[&str]) -> Scenario {
    Scenario {
        name: name.into(),
        status: "Passed".into(),
        test_duration: "00:00:01".into(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        steps: steps
            .iter()
            .map(|s| Step { kind: "Given".into(), text: s.to_string(), status: "Passed".into() })
            .collect(),
    }
}

fn sample_run() -> Testrun {
    let checkout = Feature {
        id: format!("{{{}}}", CHECKOUT_ID.to_uppercase()),
        name: "Checkout".into(),
        description: "Paying for the cart".into(),
        status: "Passed".into(),
        tags: vec!["@web".into()],
        scenarios: vec![
            scenario("Pay flow", &["@smoke"], &["a cart with two items", "the customer pays by card"]),
            scenario("Refund", &["@slow"], &["a paid order"]),
            scenario("User can LOG IN", &["@auth"], &["valid credentials"]),
        ],
        rules: vec![Rule {
            name: "Card limits".into(),
            tags: vec!["@limits".into()],
            scenarios: vec![scenario("Over limit", &["@smoke"], &["a card with a low limit"])],
            ..Rule::default()
        }],
    };
    let bulk = Feature {
        id: "6ba7b810-9dad-11d1-80b4-00c04fd430c8".into(),
        name: "Inventory".into(),
        scenarios: (0..15).map(|i| scenario(&format!("Bulk import {i}"), &[], &["a bulk file"])).collect(),
        ..Feature::default()
    };
    Testrun {
        name: "nightly".into(),
        branch_name: "main".into(),
        commit_id: "abc123".into(),
        commit_message: "Fix rounding in totals".into(),
        products: vec![Product { name: "Shop".into(), features: vec![checkout, bulk] }],
        ..Testrun::default()
    }
}

fn indexed(root: &Path) -> ReportSearchEngine {
    let indexer = TantivyReportIndexer::create_for_product(root, "Shop").expect("indexer");
    let count = indexer.index_testrun(&sample_run(), FILE_NAME, "Shop").expect("index");
    assert_eq!(count, 1 + 1 + 3 + 1 + 1 + 1 + 15);
    ReportSearchEngine::new(root.to_path_buf(), BoostSchedule::default())
}

#[test]
fn explicit_feature_query_attributes_feature_name() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = indexed(tmp.path());
    let response = engine.search("Shop", "feature:Checkout");
    let hit = response.results.first().expect("feature hit");
    assert_eq!(hit.doc_type, DocumentType::Feature);
    assert_eq!(hit.title, "Checkout");
    assert_eq!(hit.matched_field, MatchedField::Field(ReportField::FeatureName));
    assert_eq!(hit.feature_id.as_deref(), Some(format!("{{{}}}", CHECKOUT_ID.to_uppercase()).as_str()));
    assert_eq!(response.first_feature_id.map(|id| id.to_string()).as_deref(), Some(CHECKOUT_ID));
}

#[test]
fn tag_marker_finds_tagged_scenarios() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = indexed(tmp.path());
    let response = engine.search("Shop", "@smoke");
    let titles: Vec<&str> = response.results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(response.results.len(), 2, "hits: {titles:?}");
    assert!(titles.contains(&"Pay flow"));
    assert!(titles.contains(&"Over limit"));
    for hit in &response.results {
        assert_eq!(hit.doc_type, DocumentType::Scenario);
        assert_eq!(hit.matched_field, MatchedField::Field(ReportField::Tag));
        assert!(hit.tags.contains(&"@smoke".to_string()));
        assert_eq!(hit.type_tags, vec!["@smoke"]);
        assert_eq!(hit.parent_feature_name.as_deref(), Some("Checkout"));
    }
    assert_eq!(response.first_feature_id.map(|id| id.to_string()).as_deref(), Some(CHECKOUT_ID));
}

#[test]
fn unknown_field_returns_nothing_without_error() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = indexed(tmp.path());
    let response = engine.try_search("Shop", "nonexistentfield: xyz").expect("no error");
    assert!(response.results.is_empty());
    assert!(response.first_feature_id.is_none());
}

#[test]
fn free_text_searches_every_field() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = indexed(tmp.path());
    let response = engine.search("Shop", "pay flow");
    assert!(!response.results.is_empty());
    assert!(response.results.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(response.results.iter().any(|r| r.title == "Pay flow"));

    let commit = engine.search("Shop", "rounding");
    let hit = commit.results.first().expect("testrun hit");
    assert_eq!(hit.doc_type, DocumentType::Testrun);
    assert_eq!(hit.title, "nightly");
    assert_eq!(hit.content, "Fix rounding in totals");
    assert_eq!(hit.matched_field, MatchedField::Field(ReportField::CommitMessage));
}

#[test]
fn unbalanced_queries_are_recovered() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = indexed(tmp.path());
    let response = engine.try_search("Shop", "checkout (flow").expect("escaped retry");
    assert!(!response.results.is_empty());
    let response = engine.try_search("Shop", "feature:(checkout").expect("term fallback");
    assert!(response.results.iter().any(|r| r.title == "Checkout"));
}

#[test]
fn uppercase_operator_words_are_searched_as_text() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = indexed(tmp.path());
    let response = engine.try_search("Shop", "LOG IN").expect("operator words recovered");
    assert!(response.results.iter().any(|r| r.title == "User can LOG IN"));
    for query in ["rock AND", "AND", "OR", "NOT", "IN", "pay IN"] {
        assert!(engine.try_search("Shop", query).is_ok(), "{query:?}");
    }
    let response = engine.search("Shop", "pay IN");
    assert!(response.results.iter().any(|r| r.title == "Pay flow"));
}

#[test]
fn unrecoverable_queries_fail_quietly() {
    let tmp = TempDir::new().expect("tempdir");
    indexed(tmp.path());
    let mut schema_builder = tantivy::schema::Schema::builder();
    let body = schema_builder.add_text_field("Body", tantivy::schema::TEXT | tantivy::schema::STORED);
    let legacy_dir = tmp.path().join("Legacy");
    std::fs::create_dir_all(&legacy_dir).expect("legacy dir");
    let index = tantivy::Index::create_in_dir(&legacy_dir, schema_builder.build()).expect("legacy index");
    let mut writer: tantivy::IndexWriter = index.writer(15_000_000).expect("writer");
    let mut doc = tantivy::TantivyDocument::new();
    doc.add_text(body, "pay flow");
    writer.add_document(doc).expect("add");
    writer.commit().expect("commit");

    let engine = ReportSearchEngine::new(tmp.path().to_path_buf(), BoostSchedule::default());
    assert!(matches!(engine.try_search("Legacy", "pay flow"), Err(Error::QuerySyntax { .. })));
    let response = engine.search("Legacy", "pay flow");
    assert!(response.results.is_empty());
    assert!(response.first_feature_id.is_none());
}

#[test]
fn results_are_capped() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = indexed(tmp.path());
    let response = engine.search("Shop", "bulk");
    assert_eq!(response.results.len(), TOP_K);
}

#[test]
fn rule_documents_fall_back_to_sentinels() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = indexed(tmp.path());
    let response = engine.search("Shop", "rule:limits");
    let rule = response.results.iter().find(|r| r.doc_type == DocumentType::Unknown).expect("rule hit");
    assert_eq!(rule.title, "No Title");
    assert_eq!(rule.file_name, FILE_NAME);
    assert_eq!(rule.matched_field, MatchedField::Field(ReportField::RuleName));
    assert_eq!(rule.type_tags, vec!["@limits"]);
}

#[test]
fn unavailable_indexes_yield_empty_responses() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = indexed(tmp.path());
    let searcher: &dyn ReportSearcher = &engine;
    assert!(searcher.search("Admin", "checkout").results.is_empty());
    assert!(searcher.search("../Shop", "checkout").results.is_empty());
    assert!(searcher.search("Shop", "   ").results.is_empty());
    assert!(!searcher.search("Shop", "checkout").results.is_empty());
}

#[test]
fn reindexing_replaces_previous_documents() {
    let tmp = TempDir::new().expect("tempdir");
    indexed(tmp.path());
    let engine = indexed(tmp.path());
    assert_eq!(engine.search("Shop", "feature:Checkout").results.len(), 1);
}

#[test]
fn each_search_sees_the_latest_commit() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = indexed(tmp.path());
    assert_eq!(engine.search("Shop", "feature:Checkout").results.len(), 1);

    let mut run = sample_run();
    run.products[0].features.retain(|f| f.name != "Checkout");
    let indexer = TantivyReportIndexer::create_for_product(tmp.path(), "Shop").expect("indexer");
    indexer.index_testrun(&run, FILE_NAME, "Shop").expect("reindex");

    assert!(engine.search("Shop", "feature:Checkout").results.is_empty());
    assert_eq!(engine.search("Shop", "feature:Inventory").results.len(), 1);
}
