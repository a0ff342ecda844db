//! Router resource.

use serde::{Deserialize, Serialize};

use super::ResourceRef;

/// A named rule → service binding with an optional middleware chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Router {
    pub id: String,

    /// Entry points the router listens on, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry_points: Vec<String>,

    /// Middleware chain, in application order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middlewares: Vec<ResourceRef>,

    pub service: ResourceRef,

    /// Rule expression; opaque to the manager.
    pub rule: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_syntax: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<RouterTls>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observability: Option<Observability>,
}

impl Router {
    /// Ids of the middlewares this router references, in chain order.
    pub fn middleware_ids(&self) -> impl Iterator<Item = &str> {
        self.middlewares.iter().map(|m| m.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterTls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_resolver: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<Domain>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Domain {
    #[serde(default)]
    pub main: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sans: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observability {
    #[serde(default)]
    pub access_logs: bool,
    #[serde(default)]
    pub tracing: bool,
    #[serde(default)]
    pub metrics: bool,
}
