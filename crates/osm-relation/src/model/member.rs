//! Ordered member references of a relation.

use crate::model::{ElementId, ElementType};

/// One typed reference inside a relation.
///
/// The referenced element is not required to exist: ids may dangle, point
/// at the owning relation itself, or be negative placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    /// Kind of the referenced element.
    pub member_type: ElementType,
    /// Id of the referenced element.
    pub member_id: ElementId,
    /// Free-form role, empty by default.
    pub role: String,
}

impl Member {
    pub fn new(member_type: ElementType, member_id: ElementId, role: impl Into<String>) -> Self {
        Self {
            member_type,
            member_id,
            role: role.into(),
        }
    }

    /// Returns `(type, id, role)`.
    pub fn as_triple(&self) -> (ElementType, ElementId, &str) {
        (self.member_type, self.member_id, &self.role)
    }

    /// Returns true if this member references `(member_type, member_id)`.
    pub fn references(&self, member_type: ElementType, member_id: ElementId) -> bool {
        self.member_type == member_type && self.member_id == member_id
    }
}

/// Members of one relation version, in document order.
///
/// Order is significant and duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MemberList {
    members: Vec<Member>,
}

impl MemberList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            members: Vec::with_capacity(capacity),
        }
    }

    /// Appends a member at the end.
    pub fn push(&mut self, member: Member) {
        self.members.push(member);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the member at `sequence` (zero-based position).
    pub fn get(&self, sequence: usize) -> Option<&Member> {
        self.members.get(sequence)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Member> {
        self.members.iter()
    }

    /// Iterates over `(type, id, role)` triples in order.
    pub fn triples(&self) -> impl Iterator<Item = (ElementType, ElementId, &str)> + '_ {
        self.members.iter().map(Member::as_triple)
    }

    /// Iterates over `(sequence, member)` for every entry referencing the element.
    pub fn positions_of(
        &self,
        member_type: ElementType,
        member_id: ElementId,
    ) -> impl Iterator<Item = (usize, &Member)> + '_ {
        self.members
            .iter()
            .enumerate()
            .filter(move |(_, m)| m.references(member_type, member_id))
    }

    pub fn contains(&self, member_type: ElementType, member_id: ElementId) -> bool {
        self.members.iter().any(|m| m.references(member_type, member_id))
    }
}

impl From<Vec<Member>> for MemberList {
    fn from(members: Vec<Member>) -> Self {
        Self { members }
    }
}

impl FromIterator<Member> for MemberList {
    fn from_iter<I: IntoIterator<Item = Member>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MemberList {
    type Item = &'a Member;
    type IntoIter = std::slice::Iter<'a, Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
