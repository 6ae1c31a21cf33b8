//! Error types for relation parsing, validation and storage.
//!
//! Messages are part of the observable contract toward API clients and
//! must stay stable. Use [`ErrorKind::code`] for machine-readable handling.

use thiserror::Error;

use crate::model::{ElementId, ElementType};

/// Error categories surfaced to callers.
///
/// None of the categories are retryable: the caller has to fix the input
/// (or the referenced state) before trying again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// R001: Document unparsable or missing required structure
    MalformedInput,
    /// R002: Value present but semantically disallowed
    InvalidValue,
    /// R003: Duplicate tag keys within one element
    IntegrityViolation,
    /// R004: Failure reported by a storage or changeset collaborator
    Referential,
}

impl ErrorKind {
    /// Returns the error code string (e.g., "R001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MalformedInput => "R001",
            ErrorKind::InvalidValue => "R002",
            ErrorKind::IntegrityViolation => "R003",
            ErrorKind::Referential => "R004",
        }
    }
}

/// Error while parsing a relation document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    // === R001: Malformed input ===
    #[error("Must specify a string with one or more characters")]
    EmptyDocument,

    #[error("Cannot parse valid relation from xml string (markup error near byte {offset})")]
    Unparsable { offset: usize },

    #[error("XML doesn't contain an osm/relation element.")]
    MissingRelation,

    #[error("document length {len} exceeds maximum {max}")]
    DocumentTooLarge { len: usize, max: usize },

    #[error("Changeset id is missing")]
    MissingChangeset,

    #[error("{field} is not a valid number: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("ID is required when updating")]
    MissingId,

    #[error("Version is required when updating")]
    MissingVersion,

    #[error("tag is missing key")]
    MissingTagKey,

    #[error("tag is missing value")]
    MissingTagValue,

    #[error("member is missing type")]
    MissingMemberType,

    #[error("The {value} is not allowed only, node, way, relation allowed")]
    UnknownMemberType { value: String },

    #[error("member is missing ref")]
    MissingMemberRef,

    #[error("member ref is not a valid number: {value}")]
    InvalidMemberRef { value: String },

    // === R002: Invalid value ===
    #[error("ID of relation cannot be zero when updating.")]
    ZeroId,

    #[error("ID of relation must be positive when updating.")]
    NegativeId,

    #[error("{field} must be a positive integer")]
    NotPositive { field: &'static str },

    #[error("visible must be true or false, found {value:?}")]
    InvalidVisible { value: String },

    #[error("Key/value for tag {key:?} cannot contain more than {max} characters")]
    TagTooLong { key: String, max: usize },

    #[error(
        "The relation {} has {count} members, but the maximum number of members is {max}",
        display_id(.id)
    )]
    TooManyMembers {
        id: Option<ElementId>,
        count: usize,
        max: usize,
    },

    // === R003: Integrity violation ===
    #[error("Element {element}/{} has duplicate tags with key {key}", display_id(.id))]
    DuplicateTag {
        element: ElementType,
        id: Option<ElementId>,
        key: String,
    },
}

impl ParseError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::ZeroId
            | ParseError::NegativeId
            | ParseError::NotPositive { .. }
            | ParseError::InvalidVisible { .. }
            | ParseError::TagTooLong { .. }
            | ParseError::TooManyMembers { .. } => ErrorKind::InvalidValue,
            ParseError::DuplicateTag { .. } => ErrorKind::IntegrityViolation,
            _ => ErrorKind::MalformedInput,
        }
    }
}

/// Error reported by a storage or changeset collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{element} {id} not found")]
    NotFound { element: ElementType, id: ElementId },

    #[error("version {version} of relation {id} not found")]
    VersionNotFound { id: ElementId, version: u64 },

    #[error("Version mismatch: Provided {provided}, server had: {current} of Relation {id}")]
    VersionMismatch {
        id: ElementId,
        provided: u64,
        current: u64,
    },

    #[error("relation {id} already has version {version}")]
    VersionExists { id: ElementId, version: u64 },

    #[error("Changeset {id} not found")]
    ChangesetNotFound { id: u64 },

    #[error("The changeset {id} was closed")]
    ChangesetClosed { id: u64 },

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Referential
    }
}

/// Any failure along the parse → changeset check → store path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(e) => e.kind(),
            Error::Store(e) => e.kind(),
        }
    }
}

fn display_id(id: &Option<ElementId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}
