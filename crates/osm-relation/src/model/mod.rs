//! Data model types for relations.
//!
//! This module contains the core types:
//! - Identifiers and element kinds
//! - Tags (unique key → value)
//! - Members (ordered typed references)
//! - Relations (one immutable version)
//! - Builders (ergonomic construction)

pub mod builder;
pub mod element;
pub mod id;
pub mod member;
pub mod relation;
pub mod tags;

pub use builder::RelationBuilder;
pub use element::{ElementType, UnknownElementType};
pub use id::{ElementId, PROVISIONAL_ID, coerce_id, parse_ref, parse_unsigned};
pub use member::{Member, MemberList};
pub use relation::{Intent, Relation};
pub use tags::TagSet;
