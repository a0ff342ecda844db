//! Request bodies and their normalization into model records.
//!
//! Bodies are looser than the model: ids may be omitted on update, and
//! required fields are optional so missing ones produce specific messages
//! instead of a generic decode error.

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use super::error::ApiError;
use crate::model::{
    Middleware, Observability, ResourceKind, ResourceRef, Router, RouterTls, Service,
    ServiceDocument,
};
use crate::provider::is_known_type;
use crate::store::Resource;

/// A resource that can be built from an API request body.
pub trait ApiResource: Resource {
    type Body: DeserializeOwned + Send + 'static;

    /// Validates `body`. `path_id` is `Some` on update.
    fn from_body(body: Self::Body, path_id: Option<&str>) -> Result<Self, ApiError>;
}

/// Applies the id rules: required on create, must match the path on update,
/// filled from the path when omitted.
fn resolve_id(kind: ResourceKind, body_id: String, path_id: Option<&str>) -> Result<String, ApiError> {
    match path_id {
        None if body_id.is_empty() => Err(ApiError::BadRequest(format!(
            "{} ID is required",
            kind.title()
        ))),
        None => Ok(body_id),
        Some(path) if body_id.is_empty() => Ok(path.to_string()),
        Some(path) if body_id != path => Err(ApiError::BadRequest(
            "ID in path must match ID in body".to_string(),
        )),
        Some(path) => Ok(path.to_string()),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterBody {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub entry_points: Vec<String>,
    #[serde(default)]
    pub middlewares: Vec<ResourceRef>,
    #[serde(default)]
    pub service: Option<ResourceRef>,
    #[serde(default)]
    pub rule: String,
    #[serde(default)]
    pub rule_syntax: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub tls: Option<RouterTls>,
    #[serde(default)]
    pub observability: Option<Observability>,
}

impl ApiResource for Router {
    type Body = RouterBody;

    fn from_body(body: RouterBody, path_id: Option<&str>) -> Result<Self, ApiError> {
        let id = resolve_id(ResourceKind::Router, body.id, path_id)?;
        if body.rule.is_empty() {
            return Err(ApiError::BadRequest("Router rule is required".to_string()));
        }

        // On update an empty service keeps the current binding (resolved by the store).
        let service = body.service.unwrap_or_default();
        if service.is_empty() && path_id.is_none() {
            return Err(ApiError::BadRequest(
                "Router service ID is required".to_string(),
            ));
        }
        if body.middlewares.iter().any(ResourceRef::is_empty) {
            return Err(ApiError::BadRequest(
                "Middleware references require an ID".to_string(),
            ));
        }

        Ok(Router {
            id,
            entry_points: body.entry_points,
            middlewares: body.middlewares,
            service,
            rule: body.rule,
            rule_syntax: body.rule_syntax.filter(|s| !s.is_empty()),
            priority: body.priority,
            tls: body.tls,
            observability: body.observability,
        })
    }
}

impl ApiResource for Service {
    type Body = ServiceDocument;

    fn from_body(mut body: ServiceDocument, path_id: Option<&str>) -> Result<Self, ApiError> {
        body.id = resolve_id(ResourceKind::Service, std::mem::take(&mut body.id), path_id)?;
        let service = Service::try_from(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        tracing::debug!(id = %service.id, form = service.spec.form_name(), "Service body accepted");
        Ok(service)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MiddlewareBody {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub middleware_type: String,
    #[serde(default)]
    pub config: Value,
}

impl ApiResource for Middleware {
    type Body = MiddlewareBody;

    fn from_body(body: MiddlewareBody, path_id: Option<&str>) -> Result<Self, ApiError> {
        let id = resolve_id(ResourceKind::Middleware, body.id, path_id)?;
        if body.middleware_type.is_empty() {
            return Err(ApiError::BadRequest(
                "Middleware type is required".to_string(),
            ));
        }
        if !is_known_type(&body.middleware_type) {
            tracing::warn!(
                id = %id,
                middleware_type = %body.middleware_type,
                "Unknown middleware type; it will be served as an empty middleware"
            );
        }
        Ok(Middleware {
            id,
            middleware_type: body.middleware_type,
            config: body.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn router_body(value: Value) -> RouterBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_router_accepts_both_reference_shapes() {
        let bare = Router::from_body(
            router_body(json!({
                "id": "r1", "rule": "Host(`a`)", "service": "s1", "middlewares": ["m1"]
            })),
            None,
        )
        .unwrap();
        let object = Router::from_body(
            router_body(json!({
                "id": "r1", "rule": "Host(`a`)",
                "service": {"id": "s1"}, "middlewares": [{"id": "m1"}]
            })),
            None,
        )
        .unwrap();
        assert_eq!(bare, object);
        assert_eq!(
            serde_json::to_value(&bare).unwrap()["service"],
            json!({"id": "s1"})
        );
    }

    #[test]
    fn test_router_required_fields() {
        let err = Router::from_body(router_body(json!({"rule": "x", "service": "s"})), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Router ID is required");

        let err = Router::from_body(router_body(json!({"id": "r", "service": "s"})), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Router rule is required");

        let err = Router::from_body(router_body(json!({"id": "r", "rule": "x"})), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Router service ID is required");
    }

    #[test]
    fn test_update_fills_and_checks_id() {
        let router = Router::from_body(router_body(json!({"rule": "x"})), Some("r1")).unwrap();
        assert_eq!(router.id, "r1");
        assert!(router.service.is_empty());

        let err = Router::from_body(router_body(json!({"id": "other", "rule": "x"})), Some("r1"))
            .unwrap_err();
        assert_eq!(err.to_string(), "ID in path must match ID in body");
    }

    #[test]
    fn test_service_shape_errors_are_bad_requests() {
        let doc: ServiceDocument = serde_json::from_value(json!({"id": "s"})).unwrap();
        let err = Service::from_body(doc, None).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_middleware_requires_type() {
        let body: MiddlewareBody = serde_json::from_value(json!({"id": "m"})).unwrap();
        let err = Middleware::from_body(body, None).unwrap_err();
        assert_eq!(err.to_string(), "Middleware type is required");
    }
}
