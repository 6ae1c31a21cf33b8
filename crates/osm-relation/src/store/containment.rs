//! Reverse lookup from an element to the relations containing it.
//!
//! The index owns nothing: every query reads through the store, so results
//! reflect whatever snapshot the store hands out at that moment. A
//! [`ContainingMember`] is a back-reference for navigation only; the
//! owning relation stays the sole owner of its member entries.

use crate::error::StoreError;
use crate::model::{ElementId, ElementType, Relation};
use crate::store::RelationStore;

/// One membership row: `relation_id` lists `(member_type, member_id)` at
/// position `sequence` with `role`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainingMember {
    pub relation_id: ElementId,
    pub member_type: ElementType,
    pub member_id: ElementId,
    pub role: String,
    /// Zero-based position in the containing relation's member list.
    pub sequence: usize,
}

/// Query view over a store's membership data.
#[derive(Debug, Clone, Copy)]
pub struct ContainmentIndex<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S> ContainmentIndex<'s, S>
where
    S: RelationStore + ?Sized,
{
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Returns the ids of relations containing the element, ascending and
    /// without repeats.
    pub fn containing(
        &self,
        member_type: ElementType,
        member_id: ElementId,
    ) -> Result<Vec<ElementId>, StoreError> {
        let mut ids: Vec<ElementId> = self
            .containing_members(member_type, member_id)?
            .into_iter()
            .map(|row| row.relation_id)
            .collect();
        ids.dedup();
        Ok(ids)
    }

    /// Returns every membership row referencing the element, ordered by
    /// relation id and then position.
    ///
    /// A relation listing the element twice yields two rows.
    pub fn containing_members(
        &self,
        member_type: ElementType,
        member_id: ElementId,
    ) -> Result<Vec<ContainingMember>, StoreError> {
        let mut rows = self.store.find_containing(member_type, member_id)?;
        rows.sort_by_key(|row| (row.relation_id, row.sequence));
        Ok(rows)
    }

    /// Loads the current versions of the containing relations, by id.
    pub fn containing_relations(
        &self,
        member_type: ElementType,
        member_id: ElementId,
    ) -> Result<Vec<Relation>, StoreError> {
        self.containing(member_type, member_id)?
            .into_iter()
            .map(|id| self.store.load(id))
            .collect()
    }

    /// Loads the relation owning a membership row.
    pub fn relation(&self, row: &ContainingMember) -> Result<Relation, StoreError> {
        self.store.load(row.relation_id)
    }
}
