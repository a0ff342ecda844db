//! Resource model managed through the API.
//!
//! # Data Flow
//! ```text
//! API body (JSON, camelCase)
//!     → api::body (normalize polymorphic references, fill path ids)
//!     → model types (Router, Service, Middleware)
//!     → store (referential integrity, persistence)
//!     → provider::projection (gateway schema)
//! ```
//!
//! # Design Decisions
//! - References between resources are always stored as `{ "id": ... }` objects
//! - Services are a discriminated union internally; the wire keeps the
//!   gateway's "one populated sibling field" shape
//! - Middleware configuration is opaque JSON until projection

pub mod middleware;
pub mod router;
pub mod service;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub use middleware::Middleware;
pub use router::{Domain, Observability, Router, RouterTls};
pub use service::{
    Failover, HealthCheck, LoadBalancer, MirrorItem, Mirroring, ResponseForwarding, Server,
    Service, ServiceDocument, ServiceShapeError, ServiceSpec, Sticky, StickyCookie, Weighted,
    WeightedItem,
};

/// The three kinds of named resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Router,
    Service,
    Middleware,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Router => "router",
            ResourceKind::Service => "service",
            ResourceKind::Middleware => "middleware",
        }
    }

    /// Capitalized name used in user-facing messages.
    pub fn title(&self) -> &'static str {
        match self {
            ResourceKind::Router => "Router",
            ResourceKind::Service => "Service",
            ResourceKind::Middleware => "Middleware",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to another resource by id.
///
/// Serializes as `{"id": "..."}`. Deserializes from either that object form
/// or a bare id string, so `"service": "s1"` and `"service": {"id": "s1"}`
/// are equivalent on input. Extra fields on the object form are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Default)]
pub struct ResourceRef {
    pub id: String,
}

impl ResourceRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}

impl<'de> Deserialize<'de> for ResourceRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Bare(String),
            Object {
                #[serde(default)]
                id: String,
            },
        }

        match Wire::deserialize(deserializer) {
            Ok(Wire::Bare(id)) | Ok(Wire::Object { id }) => Ok(ResourceRef { id }),
            Err(_) => Err(serde::de::Error::custom(
                "reference must be an id string or an object with an \"id\" field",
            )),
        }
    }
}

impl From<&str> for ResourceRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
