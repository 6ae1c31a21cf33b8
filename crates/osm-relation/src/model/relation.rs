//! The versioned relation entity.

use std::hash::{Hash, Hasher};

use crate::model::{ElementId, ElementType, Member, MemberList, PROVISIONAL_ID, TagSet};

/// Purpose of a parse: selects which fields are mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// A new element; id and version are optional.
    Create,
    /// A new version of an existing element; id and version are required.
    Update,
}

impl Intent {
    pub fn is_create(&self) -> bool {
        matches!(self, Intent::Create)
    }
}

/// One version of a relation.
///
/// Instances are immutable: an edit produces a new value through
/// [`Relation::revised`] or [`RelationBuilder`](crate::model::RelationBuilder).
/// Equality and hashing use `(id, version)` only; two values with the same
/// identity are the same version even if constructed separately.
#[derive(Debug, Clone)]
pub struct Relation {
    pub(crate) id: ElementId,
    pub(crate) version: u64,
    pub(crate) changeset_id: u64,
    pub(crate) visible: bool,
    pub(crate) tags: TagSet,
    pub(crate) members: MemberList,
}

impl Relation {
    /// The relation id, or [`PROVISIONAL_ID`] before the store assigned one.
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn changeset_id(&self) -> u64 {
        self.changeset_id
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns true while the relation has no store-assigned id.
    pub fn is_provisional(&self) -> bool {
        self.id <= PROVISIONAL_ID
    }

    /// Key → value tags of this version.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Tags ordered by key.
    pub fn sorted_tags(&self) -> Vec<(&str, &str)> {
        self.tags.sorted()
    }

    /// Members of this version, in document order.
    pub fn members(&self) -> &MemberList {
        &self.members
    }

    /// Members as `(type, id, role)` triples, in document order.
    pub fn member_triples(&self) -> Vec<(ElementType, ElementId, &str)> {
        self.members.triples().collect()
    }

    /// Builds an edit of this version with new content.
    ///
    /// The edit keeps this id and version as its base; storing it produces
    /// the next version.
    pub fn revised(&self, changeset_id: u64, tags: TagSet, members: MemberList) -> Relation {
        Relation {
            id: self.id,
            version: self.version,
            changeset_id,
            visible: true,
            tags,
            members,
        }
    }

    /// Builds a deletion of this version.
    ///
    /// Deleted versions carry no tags and no members. Like
    /// [`Relation::revised`], the result keeps this version as its base.
    pub fn deleted(&self, changeset_id: u64) -> Relation {
        Relation {
            id: self.id,
            version: self.version,
            changeset_id,
            visible: false,
            tags: TagSet::new(),
            members: MemberList::new(),
        }
    }

    /// Returns true if tags and members are equal, regardless of identity.
    pub fn same_content(&self, other: &Relation) -> bool {
        self.visible == other.visible && self.tags == other.tags && self.members == other.members
    }

    /// Returns true if any member references `(member_type, member_id)`.
    pub fn has_member(&self, member_type: ElementType, member_id: ElementId) -> bool {
        self.members.contains(member_type, member_id)
    }

    pub(crate) fn with_identity(mut self, id: ElementId, version: u64) -> Relation {
        self.id = id;
        self.version = version;
        self
    }

    pub(crate) fn from_parts(
        id: ElementId,
        version: u64,
        changeset_id: u64,
        visible: bool,
        tags: TagSet,
        members: MemberList,
    ) -> Relation {
        Relation {
            id,
            version,
            changeset_id,
            visible,
            tags,
            members,
        }
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.version == other.version
    }
}

impl Eq for Relation {}

impl Hash for Relation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.version.hash(state);
    }
}

impl<'a> IntoIterator for &'a Relation {
    type Item = &'a Member;
    type IntoIter = std::slice::Iter<'a, Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
