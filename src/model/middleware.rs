//! Middleware resource.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, typed request/response transform.
///
/// `config` is kept as raw JSON; only the projection interprets it,
/// keyed on `middleware_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Middleware {
    pub id: String,

    #[serde(rename = "type")]
    pub middleware_type: String,

    #[serde(default)]
    pub config: Value,
}
