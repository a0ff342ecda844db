//! Per-kind behavior the generic store operations dispatch on.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};

use super::error::{StoreError, StoreResult};
use super::state::{ReferenceIndex, StoreState};
use crate::model::{Middleware, ResourceKind, ResourceRef, Router, Service};

pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: &str);

    fn table(state: &StoreState) -> &BTreeMap<String, Self>;

    fn table_mut(state: &mut StoreState) -> &mut BTreeMap<String, Self>;

    /// Checks outgoing references before a write. `previous` is the record
    /// being replaced on update.
    fn resolve(&mut self, _state: &StoreState, _previous: Option<&Self>) -> StoreResult<()> {
        Ok(())
    }

    /// Labels of the resources that reference `id`.
    fn referrers(_state: &StoreState, _id: &str) -> Vec<String> {
        Vec::new()
    }

    /// Keeps the reverse index current across a write or delete.
    fn reindex(_index: &mut ReferenceIndex, _previous: Option<&Self>, _current: Option<&Self>) {}
}

impl Resource for Router {
    const KIND: ResourceKind = ResourceKind::Router;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn table(state: &StoreState) -> &BTreeMap<String, Self> {
        &state.doc.routers
    }

    fn table_mut(state: &mut StoreState) -> &mut BTreeMap<String, Self> {
        &mut state.doc.routers
    }

    fn resolve(&mut self, state: &StoreState, previous: Option<&Self>) -> StoreResult<()> {
        // An update without a service keeps the one already bound.
        if self.service.is_empty() {
            if let Some(prev) = previous {
                self.service = prev.service.clone();
            }
        }

        if !state.doc.services.contains_key(&self.service.id) {
            return Err(invalid(ResourceKind::Service, &self.service));
        }
        for mw in &self.middlewares {
            if !state.doc.middlewares.contains_key(&mw.id) {
                return Err(invalid(ResourceKind::Middleware, mw));
            }
        }
        Ok(())
    }

    fn reindex(index: &mut ReferenceIndex, previous: Option<&Self>, current: Option<&Self>) {
        if let Some(prev) = previous {
            index.remove(prev);
        }
        if let Some(cur) = current {
            index.insert(cur);
        }
    }
}

fn invalid(kind: ResourceKind, reference: &ResourceRef) -> StoreError {
    StoreError::InvalidReference {
        kind,
        id: reference.id.clone(),
    }
}

impl Resource for Service {
    const KIND: ResourceKind = ResourceKind::Service;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn table(state: &StoreState) -> &BTreeMap<String, Self> {
        &state.doc.services
    }

    fn table_mut(state: &mut StoreState) -> &mut BTreeMap<String, Self> {
        &mut state.doc.services
    }

    fn referrers(state: &StoreState, id: &str) -> Vec<String> {
        state.index.routers_using_service(id)
    }
}

impl Resource for Middleware {
    const KIND: ResourceKind = ResourceKind::Middleware;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn table(state: &StoreState) -> &BTreeMap<String, Self> {
        &state.doc.middlewares
    }

    fn table_mut(state: &mut StoreState) -> &mut BTreeMap<String, Self> {
        &mut state.doc.middlewares
    }

    fn referrers(state: &StoreState, id: &str) -> Vec<String> {
        state.index.routers_using_middleware(id)
    }
}
