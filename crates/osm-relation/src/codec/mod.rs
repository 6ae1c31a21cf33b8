//! Document encoding/decoding for relations.
//!
//! [`xml`] reads and writes the markup; [`relation`] maps it to and from
//! [`Relation`](crate::model::Relation) values.

pub mod relation;
pub mod xml;

pub use relation::{
    ParseOptions, decode_relation, encode_relation, parse_relation, parse_relation_with_options,
};
pub use xml::{
    MarkupError, XmlElement, XmlWriter, escape_attribute, parse_document,
    parse_document_with_max_depth,
};
