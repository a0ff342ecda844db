use parking_lot::RwLock;

use super::error::{StoreError, StoreResult};
use super::resource::Resource;
use super::state::{StoreDocument, StoreState};
use crate::storage::SaveSignal;

/// In-memory resource store.
///
/// All three maps and the reverse index sit behind one lock, so every
/// operation observes and produces a consistent state. Successful writes
/// post a save signal after the lock is released.
#[derive(Debug, Default)]
pub struct ResourceStore {
    state: RwLock<StoreState>,
    saves: Option<SaveSignal>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a loaded document, rejecting routers whose
    /// references do not resolve.
    pub fn from_document(doc: StoreDocument) -> StoreResult<Self> {
        let state = StoreState::from_document(doc);
        for router in state.doc.routers.values() {
            router.clone().resolve(&state, None)?;
        }
        Ok(Self {
            state: RwLock::new(state),
            saves: None,
        })
    }

    pub fn with_save_signal(mut self, signal: SaveSignal) -> Self {
        self.saves = Some(signal);
        self
    }

    pub fn list<R: Resource>(&self) -> Vec<R> {
        let state = self.state.read();
        R::table(&state).values().cloned().collect()
    }

    pub fn get<R: Resource>(&self, id: &str) -> StoreResult<R> {
        let state = self.state.read();
        R::table(&state)
            .get(id)
            .cloned()
            .ok_or_else(|| not_found::<R>(id))
    }

    pub fn exists<R: Resource>(&self, id: &str) -> bool {
        R::table(&self.state.read()).contains_key(id)
    }

    pub fn create<R: Resource>(&self, mut record: R) -> StoreResult<R> {
        {
            let mut state = self.state.write();
            let id = record.id().to_string();
            if R::table(&state).contains_key(&id) {
                return Err(StoreError::AlreadyExists { kind: R::KIND, id });
            }
            record.resolve(&state, None)?;
            R::reindex(&mut state.index, None, Some(&record));
            R::table_mut(&mut state).insert(id, record.clone());
        }
        self.signal_save();
        Ok(record)
    }

    /// Replaces the record stored under `id`. The record's own id is forced
    /// to `id`.
    pub fn update<R: Resource>(&self, id: &str, mut record: R) -> StoreResult<R> {
        {
            let mut state = self.state.write();
            let previous = R::table(&state)
                .get(id)
                .cloned()
                .ok_or_else(|| not_found::<R>(id))?;
            record.set_id(id);
            record.resolve(&state, Some(&previous))?;
            R::reindex(&mut state.index, Some(&previous), Some(&record));
            R::table_mut(&mut state).insert(id.to_string(), record.clone());
        }
        self.signal_save();
        Ok(record)
    }

    pub fn delete<R: Resource>(&self, id: &str) -> StoreResult<()> {
        {
            let mut state = self.state.write();
            if !R::table(&state).contains_key(id) {
                return Err(not_found::<R>(id));
            }
            let used_by = R::referrers(&state, id);
            if !used_by.is_empty() {
                return Err(StoreError::InUse {
                    kind: R::KIND,
                    id: id.to_string(),
                    used_by,
                });
            }
            if let Some(removed) = R::table_mut(&mut state).remove(id) {
                R::reindex(&mut state.index, Some(&removed), None);
            }
        }
        self.signal_save();
        Ok(())
    }

    /// Whether any router references `id`, with `router:<id>` labels.
    pub fn in_use<R: Resource>(&self, id: &str) -> (bool, Vec<String>) {
        let used_by = R::referrers(&self.state.read(), id);
        (!used_by.is_empty(), used_by)
    }

    /// A consistent copy of the full contents.
    pub fn document(&self) -> StoreDocument {
        self.state.read().doc.clone()
    }

    /// Runs `f` against the contents under the shared lock.
    pub fn read<T>(&self, f: impl FnOnce(&StoreDocument) -> T) -> T {
        f(self.state.read().document())
    }

    fn signal_save(&self) {
        if let Some(signal) = &self.saves {
            signal.notify();
        }
    }
}

fn not_found<R: Resource>(id: &str) -> StoreError {
    StoreError::NotFound {
        kind: R::KIND,
        id: id.to_string(),
    }
}
