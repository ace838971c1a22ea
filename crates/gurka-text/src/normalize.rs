//! Rewriting shorthand prefixes into canonical `Field:` qualifiers.

use gurka_core::fields;

/// Replace one leading shorthand prefix with its canonical `Field:` form.
///
/// `@smoke`, `tag:smoke` and `TAGS:smoke` all become `Tag:smoke`. Text after
/// the prefix is passed through untouched; a query without a recognized
/// prefix is returned unchanged.
pub fn normalize(raw: &str) -> String {
    match fields::resolve(raw) {
        Some(prefix) => format!("{}:{}", prefix.field.as_str(), &raw[prefix.len..]),
        None => raw.to_string(),
    }
}

/// True when the query looks like `<identifier>:<rest>`.
///
/// The identifier only has to be alphanumeric; it does not need to name a
/// known field.
pub fn has_explicit_field_prefix(query: &str) -> bool {
    split_qualifier(query).is_some()
}

/// Split a field-shaped query into `(identifier, rest)`.
pub fn split_qualifier(query: &str) -> Option<(&str, &str)> {
    let (identifier, rest) = query.split_once(':')?;
    if identifier.is_empty() || !identifier.chars().all(char::is_alphanumeric) {
        return None;
    }
    Some((identifier, rest))
}

/// The part of the query a user actually searched for.
///
/// Strips a recognized shorthand prefix or a field-shaped qualifier.
pub fn search_term(query: &str) -> &str {
    if let Some(prefix) = fields::resolve(query) {
        return query[prefix.len..].trim();
    }
    match split_qualifier(query) {
        Some((_, rest)) => rest.trim(),
        None => query.trim(),
    }
}
