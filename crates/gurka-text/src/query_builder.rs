//! Turning a normalized query string into an executable tantivy query.
//!
//! Queries are untrusted text. A parse failure is retried once with reserved
//! characters escaped; only a second failure reaches the caller.

use tantivy::query::{BooleanQuery, EmptyQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, Term};
use tracing::debug;

use gurka_core::error::{Error, Result};
use gurka_core::fields::{BoostSchedule, ReportField};

use crate::normalize::has_explicit_field_prefix;
use crate::tantivy_utils::FieldMap;

/// Characters with meaning in the query grammar.
pub const RESERVED: &[char] = &[
    '\\', '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '\'', '~', '*', '?', ':', '/', '<', '>',
    '=', '`',
];

/// Field searched when an explicit query names no resolvable field.
pub const PRIMARY_FIELD: ReportField = ReportField::FeatureName;

/// Words the query grammar reads as operators when written in upper case.
pub const OPERATOR_WORDS: &[&str] = &["AND", "OR", "NOT", "IN"];

/// Make `text` parse as plain terms: reserved characters get a backslash and
/// operator words are lowercased. The field analyzer lowercases anyway.
pub fn escape_query(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for piece in text.split_inclusive(char::is_whitespace) {
        let word = piece.trim_end_matches(char::is_whitespace);
        if OPERATOR_WORDS.contains(&word) {
            escaped.push_str(&word.to_lowercase());
        } else {
            for ch in word.chars() {
                if RESERVED.contains(&ch) {
                    escaped.push('\\');
                }
                escaped.push(ch);
            }
        }
        escaped.push_str(&piece[word.len()..]);
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// `Field:term`, searched on that field only.
    Explicit,
    /// Free text, searched on every boosted field.
    Implicit,
}

/// How the final query was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Parsed,
    Escaped,
    /// Parser bypassed; a term query was built on the named field directly.
    TermFallback,
}

pub struct BuiltQuery {
    pub query: Box<dyn Query>,
    pub mode: QueryMode,
    pub recovery: Recovery,
}

pub struct QueryBuilder<'a> {
    index: &'a Index,
    fields: &'a FieldMap,
    boosts: &'a BoostSchedule,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(index: &'a Index, fields: &'a FieldMap, boosts: &'a BoostSchedule) -> Self {
        Self { index, fields, boosts }
    }

    pub fn build(&self, normalized: &str) -> Result<BuiltQuery> {
        if has_explicit_field_prefix(normalized) {
            let (query, recovery) = self.explicit(normalized)?;
            Ok(BuiltQuery { query, mode: QueryMode::Explicit, recovery })
        } else {
            let (query, recovery) = self.implicit(normalized)?;
            Ok(BuiltQuery { query, mode: QueryMode::Implicit, recovery })
        }
    }

    fn explicit(&self, normalized: &str) -> Result<(Box<dyn Query>, Recovery)> {
        let primary = self
            .fields
            .get(PRIMARY_FIELD)
            .ok_or_else(|| Error::query_syntax(normalized, format!("index has no {PRIMARY_FIELD} field")))?;
        let parser = QueryParser::for_index(self.index, vec![primary]);
        let err = match parser.parse_query(normalized) {
            Ok(query) => return Ok((query, Recovery::Parsed)),
            Err(err) => err,
        };
        debug!(query = normalized, error = %err, "explicit query failed to parse");

        let split = normalized
            .split_once(':')
            .map(|(field, term)| (field.trim(), term.trim()))
            .filter(|(field, term)| !field.is_empty() && !term.is_empty());
        if let Some((field_name, raw_term)) = split {
            return Ok((self.term_query(field_name, raw_term), Recovery::TermFallback));
        }

        let escaped = escape_query(normalized);
        parser
            .parse_query(&escaped)
            .map(|query| (query, Recovery::Escaped))
            .map_err(|e| Error::query_syntax(normalized, e))
    }

    fn implicit(&self, normalized: &str) -> Result<(Box<dyn Query>, Recovery)> {
        let parser = self.multi_field_parser();
        let err = match parser.parse_query(normalized) {
            Ok(query) => return Ok((query, Recovery::Parsed)),
            Err(err) => err,
        };
        debug!(query = normalized, error = %err, "implicit query failed to parse, retrying escaped");
        let escaped = escape_query(normalized);
        parser
            .parse_query(&escaped)
            .map(|query| (query, Recovery::Escaped))
            .map_err(|e| Error::query_syntax(normalized, e))
    }

    /// Disjunction over every scheduled field present in the index, each weighted by its boost.
    fn multi_field_parser(&self) -> QueryParser {
        let weighted: Vec<_> = self
            .boosts
            .iter()
            .filter_map(|(report_field, boost)| self.fields.get(report_field).map(|field| (field, boost)))
            .collect();
        let mut parser = QueryParser::for_index(self.index, weighted.iter().map(|&(field, _)| field).collect());
        for (field, boost) in weighted {
            parser.set_field_boost(field, boost);
        }
        parser
    }

    /// Exact-term query on `field_name`, analyzed the way the field was indexed.
    ///
    /// An unknown field or a term with no tokens matches nothing.
    fn term_query(&self, field_name: &str, raw_term: &str) -> Box<dyn Query> {
        let Ok(field) = self.index.schema().get_field(field_name) else {
            debug!(field = field_name, "qualifier names no indexed field");
            return Box::new(EmptyQuery);
        };
        let Ok(mut analyzer) = self.index.tokenizer_for_field(field) else {
            return Box::new(EmptyQuery);
        };
        let mut terms = Vec::new();
        let mut stream = analyzer.token_stream(raw_term);
        while let Some(token) = stream.next() {
            terms.push(Term::from_field_text(field, &token.text));
        }
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .into_iter()
            .map(|term| (Occur::Must, Box::new(TermQuery::new(term, IndexRecordOption::Basic)) as Box<dyn Query>))
            .collect();
        match clauses.len() {
            0 => Box::new(EmptyQuery),
            1 => clauses.remove(0).1,
            _ => Box::new(BooleanQuery::new(clauses)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tantivy_utils::{build_schema, register_tokenizer};

    fn index() -> Index {
        let index = Index::create_in_ram(build_schema());
        register_tokenizer(&index);
        index
    }

    #[test]
    fn escape_prefixes_reserved_characters() {
        assert_eq!(escape_query("pay (flow"), "pay \\(flow");
        assert_eq!(escape_query("a:b*"), "a\\:b\\*");
        assert_eq!(escape_query("plain words"), "plain words");
    }

    #[test]
    fn escape_lowercases_operator_words() {
        assert_eq!(escape_query("rock AND"), "rock and");
        assert_eq!(escape_query("User can LOG IN"), "User can LOG in");
        assert_eq!(escape_query("NOT  OR\tx"), "not  or\tx");
        assert_eq!(escape_query("ANDROID Or"), "ANDROID Or");
    }

    #[test]
    fn dangling_operator_words_recover_by_escaping() {
        let index = index();
        let fields = FieldMap::from_schema(&index.schema());
        let boosts = BoostSchedule::default();
        let builder = QueryBuilder::new(&index, &fields, &boosts);
        for query in ["LOG IN", "rock AND", "AND", "OR", "NOT", "IN", "pay IN"] {
            let built = builder.build(query).unwrap_or_else(|e| panic!("{query:?}: {e}"));
            assert_eq!(built.mode, QueryMode::Implicit, "{query:?}");
            assert_eq!(built.recovery, Recovery::Escaped, "{query:?}");
        }
    }

    #[test]
    fn explicit_query_without_term_retries_escaped() {
        let index = index();
        let fields = FieldMap::from_schema(&index.schema());
        let boosts = BoostSchedule::default();
        let builder = QueryBuilder::new(&index, &fields, &boosts);
        let built = builder.build("FeatureName:").expect("escaped retry");
        assert_eq!(built.mode, QueryMode::Explicit);
        assert_eq!(built.recovery, Recovery::Escaped);
    }

    #[test]
    fn index_without_scheduled_fields_is_a_syntax_error() {
        let mut schema_builder = tantivy::schema::Schema::builder();
        schema_builder.add_text_field("Body", tantivy::schema::TEXT);
        let index = Index::create_in_ram(schema_builder.build());
        let fields = FieldMap::from_schema(&index.schema());
        let boosts = BoostSchedule::default();
        let builder = QueryBuilder::new(&index, &fields, &boosts);
        assert!(matches!(builder.build("pay flow"), Err(Error::QuerySyntax { .. })));
    }

    #[test]
    fn field_shaped_queries_take_explicit_branch() {
        let index = index();
        let fields = FieldMap::from_schema(&index.schema());
        let boosts = BoostSchedule::default();
        let builder = QueryBuilder::new(&index, &fields, &boosts);

        let built = builder.build("FeatureName:Checkout").expect("explicit");
        assert_eq!(built.mode, QueryMode::Explicit);
        assert_eq!(built.recovery, Recovery::Parsed);

        let built = builder.build("nonexistentfield: xyz").expect("unknown field");
        assert_eq!(built.mode, QueryMode::Explicit);
    }

    #[test]
    fn unbalanced_input_still_builds() {
        let index = index();
        let fields = FieldMap::from_schema(&index.schema());
        let boosts = BoostSchedule::default();
        let builder = QueryBuilder::new(&index, &fields, &boosts);

        let built = builder.build("checkout (flow").expect("escaped retry");
        assert_eq!(built.mode, QueryMode::Implicit);

        let built = builder.build("FeatureName:(checkout").expect("term fallback");
        assert_eq!(built.mode, QueryMode::Explicit);
    }

    #[test]
    fn unknown_field_falls_back_to_empty_term_query() {
        let index = index();
        let fields = FieldMap::from_schema(&index.schema());
        let boosts = BoostSchedule::default();
        let builder = QueryBuilder::new(&index, &fields, &boosts);
        let built = builder.build("nonexistentfield:xyz").expect("fallback");
        assert_eq!(built.recovery, Recovery::TermFallback);
    }
}
