//! Collaborator interfaces for storage and changesets.
//!
//! The parser never touches storage. Callers hand parsed relations to a
//! [`RelationStore`] and consult a [`ChangesetGuard`] before doing so;
//! failures from either are propagated unchanged as [`StoreError`].
//! [`MemoryStore`] and [`OpenChangesets`] are in-memory implementations.

pub mod containment;
pub mod memory;

use log::debug;

use crate::codec::{ParseOptions, parse_relation_with_options};
use crate::error::{Error, StoreError};
use crate::model::{ElementId, ElementType, Intent, Relation};

pub use containment::{ContainingMember, ContainmentIndex};
pub use memory::{MemoryStore, OpenChangesets};

/// Identity of a stored relation version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionedId {
    pub id: ElementId,
    pub version: u64,
}

/// Storage for relation versions.
///
/// Implementations return immutable snapshots and must be safe to call from
/// several threads at once.
pub trait RelationStore: Send + Sync {
    /// Loads the current version of a relation.
    fn load(&self, id: ElementId) -> Result<Relation, StoreError>;

    /// Loads a specific historic version of a relation.
    fn load_version(&self, id: ElementId, version: u64) -> Result<Relation, StoreError>;

    /// Stores a new version.
    ///
    /// A provisional relation is created with a fresh id and version 1.
    /// Otherwise the relation's version must match the stored current
    /// version, and the new version is that plus one.
    fn save(&self, relation: &Relation) -> Result<VersionedId, StoreError>;

    /// Lists the membership rows referencing `(member_type, member_id)` in
    /// current, visible relations.
    fn find_containing(
        &self,
        member_type: ElementType,
        member_id: ElementId,
    ) -> Result<Vec<ContainingMember>, StoreError>;
}

/// Decides whether a changeset accepts new element versions.
pub trait ChangesetGuard: Send + Sync {
    fn ensure_writable(&self, changeset_id: u64) -> Result<(), StoreError>;
}

/// Parses a document and checks its changeset.
///
/// The changeset is consulted only after the document parsed cleanly.
pub fn accept_relation(
    document: &str,
    intent: Intent,
    guard: &dyn ChangesetGuard,
    options: &ParseOptions,
) -> Result<Relation, Error> {
    let relation = parse_relation_with_options(document, intent, options)?;
    if let Err(err) = guard.ensure_writable(relation.changeset_id()) {
        debug!(changeset = relation.changeset_id(); "Changeset refused relation: {err}");
        return Err(err.into());
    }
    Ok(relation)
}

/// Parses, checks the changeset and stores a relation in one step.
pub fn upload_relation<S>(
    document: &str,
    intent: Intent,
    guard: &dyn ChangesetGuard,
    store: &S,
    options: &ParseOptions,
) -> Result<VersionedId, Error>
where
    S: RelationStore + ?Sized,
{
    let relation = accept_relation(document, intent, guard, options)?;
    Ok(store.save(&relation)?)
}
