//! Semantic validation for relations.
//!
//! Structural checks (attribute presence, numeric syntax) happen while
//! decoding a document. The checks here look at values: the intent rules on
//! ids, positive counters, and the configured tag and member limits. They are
//! shared between the document parser and programmatic construction.

use crate::codec::ParseOptions;
use crate::error::ParseError;
use crate::model::{ElementId, ElementType, Relation, parse_unsigned};

/// Applies the update rules to a coerced id.
///
/// Zero (including every malformed form coerced to zero) and negative ids
/// cannot name an existing relation.
pub fn check_update_id(id: ElementId) -> Result<ElementId, ParseError> {
    if id == 0 {
        return Err(ParseError::ZeroId);
    }
    if id < 0 {
        return Err(ParseError::NegativeId);
    }
    Ok(id)
}

/// Parses a counter attribute such as `changeset` or `version`.
pub fn check_positive(field: &'static str, raw: &str) -> Result<u64, ParseError> {
    let value = parse_unsigned(raw).ok_or_else(|| ParseError::InvalidNumber {
        field,
        value: raw.to_string(),
    })?;
    if value == 0 {
        return Err(ParseError::NotPositive { field });
    }
    Ok(value)
}

/// Checks one tag's key and value.
///
/// Both must be non-empty after trimming; the key is checked first.
pub fn check_tag(
    key: Option<&str>,
    value: Option<&str>,
    options: &ParseOptions,
) -> Result<(), ParseError> {
    let key = key.filter(|k| !k.trim().is_empty()).ok_or(ParseError::MissingTagKey)?;
    let value = value.filter(|v| !v.trim().is_empty()).ok_or(ParseError::MissingTagValue)?;
    let max = options.max_tag_length;
    if key.chars().count() > max || value.chars().count() > max {
        return Err(ParseError::TagTooLong {
            key: key.to_string(),
            max: options.max_tag_length,
        });
    }
    Ok(())
}

/// Checks the member count of a relation against the configured limit.
pub fn check_member_count(
    owner: Option<ElementId>,
    count: usize,
    options: &ParseOptions,
) -> Result<(), ParseError> {
    if count > options.max_members {
        return Err(ParseError::TooManyMembers {
            id: owner,
            count,
            max: options.max_members,
        });
    }
    Ok(())
}

/// Validates a constructed relation the way a parsed one would be.
///
/// Duplicate keys cannot occur in a [`TagSet`](crate::model::TagSet), so
/// only the per-tag checks, the member limit and the counters are applied.
pub fn validate_relation(relation: &Relation, options: &ParseOptions) -> Result<(), ParseError> {
    if relation.changeset_id() == 0 {
        return Err(ParseError::NotPositive { field: "Changeset id" });
    }
    if relation.version() == 0 {
        return Err(ParseError::NotPositive { field: "Version" });
    }
    for (key, value) in relation.tags().iter() {
        check_tag(Some(key), Some(value), options)?;
    }
    let owner = (!relation.is_provisional()).then(|| relation.id());
    check_member_count(owner, relation.members().len(), options)
}

/// Returns the owner label used in element-level messages (`relation/<id>`).
pub fn owner_label(element: ElementType, id: Option<ElementId>) -> String {
    match id {
        Some(id) => format!("{}/{}", element, id),
        None => format!("{}/", element),
    }
}
