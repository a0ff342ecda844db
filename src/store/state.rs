//! Store contents and the router reverse index.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{Middleware, Router, Service};

/// The full store contents; also the on-disk snapshot format.
///
/// Maps are ordered so snapshots and projections are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub middlewares: BTreeMap<String, Middleware>,
    #[serde(default)]
    pub routers: BTreeMap<String, Router>,
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
}

impl StoreDocument {
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty() && self.routers.is_empty() && self.services.is_empty()
    }
}

/// Which routers reference each service and middleware id.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    by_service: HashMap<String, BTreeSet<String>>,
    by_middleware: HashMap<String, BTreeSet<String>>,
}

impl ReferenceIndex {
    pub fn insert(&mut self, router: &Router) {
        self.by_service
            .entry(router.service.id.clone())
            .or_default()
            .insert(router.id.clone());
        for mw in router.middleware_ids() {
            self.by_middleware
                .entry(mw.to_string())
                .or_default()
                .insert(router.id.clone());
        }
    }

    pub fn remove(&mut self, router: &Router) {
        detach(&mut self.by_service, &router.service.id, &router.id);
        for mw in router.middleware_ids() {
            detach(&mut self.by_middleware, mw, &router.id);
        }
    }

    pub fn routers_using_service(&self, id: &str) -> Vec<String> {
        labels(self.by_service.get(id))
    }

    pub fn routers_using_middleware(&self, id: &str) -> Vec<String> {
        labels(self.by_middleware.get(id))
    }
}

fn detach(map: &mut HashMap<String, BTreeSet<String>>, target: &str, router: &str) {
    if let Some(set) = map.get_mut(target) {
        set.remove(router);
        if set.is_empty() {
            map.remove(target);
        }
    }
}

fn labels(set: Option<&BTreeSet<String>>) -> Vec<String> {
    set.map(|s| s.iter().map(|r| format!("router:{r}")).collect())
        .unwrap_or_default()
}

/// Store contents plus the derived index, guarded together by one lock.
#[derive(Debug, Default)]
pub struct StoreState {
    pub(crate) doc: StoreDocument,
    pub(crate) index: ReferenceIndex,
}

impl StoreState {
    /// Builds state from a document, normalizing record ids to their map keys.
    pub fn from_document(mut doc: StoreDocument) -> Self {
        for (key, r) in doc.routers.iter_mut() {
            r.id.clone_from(key);
        }
        for (key, s) in doc.services.iter_mut() {
            s.id.clone_from(key);
        }
        for (key, m) in doc.middlewares.iter_mut() {
            m.id.clone_from(key);
        }

        let mut index = ReferenceIndex::default();
        for router in doc.routers.values() {
            index.insert(router);
        }
        Self { doc, index }
    }

    pub fn document(&self) -> &StoreDocument {
        &self.doc
    }
}
