//! OSM relations: parsing, validation and containment queries.
//!
//! This crate turns a serialized `<osm><relation .../></osm>` document into
//! an immutable [`Relation`] version, enforcing the create/update rules of
//! the OSM editing API, and answers which relations contain a given element.
//!
//! # Overview
//!
//! A relation is an ordered list of typed references (members) to nodes,
//! ways or other relations, plus free-form key/value tags:
//! - **Create**: id and version are optional; the entity stays provisional
//!   until a store assigns an id
//! - **Update**: id and version are required; the version is the base the
//!   edit applies to
//! - **Members**: order, duplicates and self-references are preserved
//!
//! # Quick Start
//!
//! ```rust
//! use osm_relation::{ContainmentIndex, ElementType, Intent, MemoryStore, RelationStore, parse_relation};
//!
//! let doc = r#"<osm>
//!   <relation changeset="4">
//!     <member type="way" ref="12" role="outer"/>
//!     <tag k="type" v="multipolygon"/>
//!   </relation>
//! </osm>"#;
//!
//! let relation = parse_relation(doc, Intent::Create).unwrap();
//! assert!(relation.is_provisional());
//! assert_eq!(relation.tags().get("type"), Some("multipolygon"));
//!
//! let store = MemoryStore::new();
//! let saved = store.save(&relation).unwrap();
//!
//! let index = ContainmentIndex::new(&store);
//! assert_eq!(index.containing(ElementType::Way, 12).unwrap(), vec![saved.id]);
//! ```
//!
//! # Modules
//!
//! - [`model`]: Core data types (Relation, TagSet, MemberList)
//! - [`codec`]: XML scanning, relation decoding and encoding
//! - [`validate`]: Semantic validation
//! - [`store`]: Storage and changeset interfaces, containment queries
//! - [`error`]: Error types
//! - [`limits`]: Default limits for untrusted input
//!
//! # Security
//!
//! Documents come from untrusted clients:
//! - Document size, member count and tag length are bounded by
//!   [`ParseOptions`]
//! - The first failing rule rejects the whole document; no partial entity
//!   is ever returned

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod store;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{ParseOptions, encode_relation, parse_relation, parse_relation_with_options};
pub use error::{Error, ErrorKind, ParseError, StoreError};
pub use model::{
    ElementId, ElementType, Intent, Member, MemberList, PROVISIONAL_ID, Relation, RelationBuilder,
    TagSet,
};
pub use store::{
    ChangesetGuard, ContainingMember, ContainmentIndex, MemoryStore, OpenChangesets, RelationStore,
    VersionedId, accept_relation, upload_relation,
};
pub use validate::validate_relation;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// OSM API version of the documents this crate reads and writes.
pub const API_VERSION: &str = "0.6";
