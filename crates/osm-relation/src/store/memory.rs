//! In-memory implementations of the collaborator interfaces.

use std::sync::Arc;

use log::trace;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::StoreError;
use crate::model::{ElementId, ElementType, Relation};
use crate::store::{ChangesetGuard, ContainingMember, RelationStore, VersionedId};

type MemberKey = (ElementType, ElementId);

#[derive(Debug, Default)]
struct MemoryState {
    last_id: ElementId,
    /// All versions per relation; index `n` holds version `n + 1`.
    history: FxHashMap<ElementId, Vec<Relation>>,
    /// Reverse membership index over current, visible versions.
    containing: FxHashMap<MemberKey, Vec<ContainingMember>>,
}

impl MemoryState {
    fn current(&self, id: ElementId) -> Option<&Relation> {
        self.history.get(&id).and_then(|versions| versions.last())
    }

    fn unindex(&mut self, relation_id: ElementId) {
        let Some(previous) = self.current(relation_id) else {
            return;
        };
        let keys: Vec<MemberKey> = previous
            .members()
            .iter()
            .map(|m| (m.member_type, m.member_id))
            .collect();
        for key in keys {
            if let Some(rows) = self.containing.get_mut(&key) {
                rows.retain(|row| row.relation_id != relation_id);
                if rows.is_empty() {
                    self.containing.remove(&key);
                }
            }
        }
    }

    fn index(&mut self, relation: &Relation) {
        if !relation.is_visible() {
            return;
        }
        for (sequence, member) in relation.members().iter().enumerate() {
            self.containing
                .entry((member.member_type, member.member_id))
                .or_default()
                .push(ContainingMember {
                    relation_id: relation.id(),
                    member_type: member.member_type,
                    member_id: member.member_id,
                    role: member.role.clone(),
                    sequence,
                });
        }
    }

    fn push_version(&mut self, relation: Relation) {
        self.unindex(relation.id());
        self.index(&relation);
        self.last_id = self.last_id.max(relation.id());
        self.history.entry(relation.id()).or_default().push(relation);
    }
}

/// Thread-safe in-memory relation store.
///
/// Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given versions, imported in order.
    pub fn from_relations(
        relations: impl IntoIterator<Item = Relation>,
    ) -> Result<Self, StoreError> {
        let store = Self::new();
        for relation in relations {
            store.import(relation)?;
        }
        Ok(store)
    }

    /// Stores a version under its own id and version.
    ///
    /// The version must directly follow the stored current version (or be 1
    /// for an unknown id). Used to load existing data; edits go through
    /// [`RelationStore::save`].
    pub fn import(&self, relation: Relation) -> Result<(), StoreError> {
        if relation.is_provisional() {
            return Err(StoreError::Backend(format!(
                "cannot import provisional relation {}",
                relation.id()
            )));
        }

        let mut state = self.state.write();
        let current = state.current(relation.id()).map_or(0, Relation::version);
        if relation.version() <= current {
            return Err(StoreError::VersionExists {
                id: relation.id(),
                version: relation.version(),
            });
        }
        if relation.version() != current + 1 {
            return Err(StoreError::VersionNotFound {
                id: relation.id(),
                version: current + 1,
            });
        }

        trace!(id = relation.id(), version = relation.version(); "Imported relation");
        state.push_version(relation);
        Ok(())
    }

    /// Number of relations (not versions) held.
    pub fn len(&self) -> usize {
        self.state.read().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().history.is_empty()
    }

    /// Loads every version of a relation, oldest first.
    pub fn history(&self, id: ElementId) -> Result<Vec<Relation>, StoreError> {
        self.state
            .read()
            .history
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                element: ElementType::Relation,
                id,
            })
    }
}

impl RelationStore for MemoryStore {
    fn load(&self, id: ElementId) -> Result<Relation, StoreError> {
        self.state.read().current(id).cloned().ok_or(StoreError::NotFound {
            element: ElementType::Relation,
            id,
        })
    }

    fn load_version(&self, id: ElementId, version: u64) -> Result<Relation, StoreError> {
        let state = self.state.read();
        let versions = state.history.get(&id).ok_or(StoreError::NotFound {
            element: ElementType::Relation,
            id,
        })?;
        let index = usize::try_from(version)
            .ok()
            .and_then(|v| v.checked_sub(1))
            .ok_or(StoreError::VersionNotFound { id, version })?;
        versions
            .get(index)
            .cloned()
            .ok_or(StoreError::VersionNotFound { id, version })
    }

    fn save(&self, relation: &Relation) -> Result<VersionedId, StoreError> {
        let mut state = self.state.write();

        let saved = if relation.is_provisional() {
            let id = state
                .last_id
                .checked_add(1)
                .ok_or_else(|| StoreError::Backend("relation id space exhausted".to_string()))?;
            VersionedId { id, version: 1 }
        } else {
            let current = state.current(relation.id()).ok_or(StoreError::NotFound {
                element: ElementType::Relation,
                id: relation.id(),
            })?;
            if relation.version() != current.version() {
                return Err(StoreError::VersionMismatch {
                    id: relation.id(),
                    provided: relation.version(),
                    current: current.version(),
                });
            }
            let version = current.version().checked_add(1).ok_or(StoreError::VersionExists {
                id: relation.id(),
                version: current.version(),
            })?;
            VersionedId {
                id: relation.id(),
                version,
            }
        };

        state.push_version(relation.clone().with_identity(saved.id, saved.version));
        trace!(
            id = saved.id,
            version = saved.version,
            changeset = relation.changeset_id();
            "Saved relation"
        );
        Ok(saved)
    }

    fn find_containing(
        &self,
        member_type: ElementType,
        member_id: ElementId,
    ) -> Result<Vec<ContainingMember>, StoreError> {
        let state = self.state.read();
        let mut rows = state
            .containing
            .get(&(member_type, member_id))
            .cloned()
            .unwrap_or_default();
        rows.sort_unstable_by_key(|row| (row.relation_id, row.sequence));
        Ok(rows)
    }
}

/// Changeset registry tracking which changesets are open.
#[derive(Debug, Clone, Default)]
pub struct OpenChangesets {
    /// Changeset id → open flag.
    changesets: Arc<RwLock<FxHashMap<u64, bool>>>,
}

impl OpenChangesets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an open changeset.
    pub fn open(&self, changeset_id: u64) {
        self.changesets.write().insert(changeset_id, true);
    }

    /// Closes a changeset. Unknown ids are registered as closed.
    pub fn close(&self, changeset_id: u64) {
        self.changesets.write().insert(changeset_id, false);
    }
}

impl ChangesetGuard for OpenChangesets {
    fn ensure_writable(&self, changeset_id: u64) -> Result<(), StoreError> {
        match self.changesets.read().get(&changeset_id) {
            Some(true) => Ok(()),
            Some(false) => Err(StoreError::ChangesetClosed { id: changeset_id }),
            None => Err(StoreError::ChangesetNotFound { id: changeset_id }),
        }
    }
}
