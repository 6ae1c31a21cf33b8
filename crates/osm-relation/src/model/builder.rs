//! Builder API for ergonomic Relation construction.
//!
//! # Example
//!
//! ```rust
//! use osm_relation::model::RelationBuilder;
//!
//! let relation = RelationBuilder::new(23)
//!     .id(1)
//!     .version(3)
//!     .tag("type", "route")
//!     .node(15, "stop")
//!     .way(4, "")
//!     .build();
//!
//! assert_eq!(relation.members().len(), 2);
//! assert_eq!(relation.tags().get("type"), Some("route"));
//! ```

use crate::codec::ParseOptions;
use crate::error::ParseError;
use crate::limits::DEFAULT_VERSION;
use crate::model::{ElementId, ElementType, Member, MemberList, PROVISIONAL_ID, Relation, TagSet};
use crate::validate::validate_relation;

/// Builder for constructing a Relation.
///
/// Tags set twice keep the last value; use [`RelationBuilder::try_build`]
/// to apply the same content checks a parsed document goes through.
#[derive(Debug, Clone)]
pub struct RelationBuilder {
    id: ElementId,
    version: u64,
    changeset_id: u64,
    visible: bool,
    tags: TagSet,
    members: MemberList,
}

impl RelationBuilder {
    /// Creates a builder for a provisional relation in the given changeset.
    pub fn new(changeset_id: u64) -> Self {
        Self {
            id: PROVISIONAL_ID,
            version: DEFAULT_VERSION,
            changeset_id,
            visible: true,
            tags: TagSet::new(),
            members: MemberList::new(),
        }
    }

    pub fn id(mut self, id: ElementId) -> Self {
        self.id = id;
        self
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Sets a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.set(key, value);
        self
    }

    /// Sets multiple tags at once.
    pub fn tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in tags {
            self.tags.set(k, v);
        }
        self
    }

    /// Appends a member.
    pub fn member(
        mut self,
        member_type: ElementType,
        member_id: ElementId,
        role: impl Into<String>,
    ) -> Self {
        self.members.push(Member::new(member_type, member_id, role));
        self
    }

    pub fn node(self, member_id: ElementId, role: impl Into<String>) -> Self {
        self.member(ElementType::Node, member_id, role)
    }

    pub fn way(self, member_id: ElementId, role: impl Into<String>) -> Self {
        self.member(ElementType::Way, member_id, role)
    }

    pub fn relation(self, member_id: ElementId, role: impl Into<String>) -> Self {
        self.member(ElementType::Relation, member_id, role)
    }

    /// Builds the relation without content checks.
    pub fn build(self) -> Relation {
        Relation::from_parts(
            self.id,
            self.version,
            self.changeset_id,
            self.visible,
            self.tags,
            self.members,
        )
    }

    /// Builds the relation, rejecting content a document parse would reject.
    pub fn try_build(self, options: &ParseOptions) -> Result<Relation, ParseError> {
        let relation = self.build();
        validate_relation(&relation, options)?;
        Ok(relation)
    }
}
