//! Shared-secret header gates.
//!
//! Two independent gates use this: the API-wide one (with path-prefix
//! exclusions) and the provider endpoint's own.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::InvalidHeaderName, HeaderMap, HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::ApiError;

#[derive(Debug, Clone)]
pub struct KeyGate {
    header: HeaderName,
    key: Arc<str>,
    excluded: Arc<[String]>,
}

impl KeyGate {
    pub fn new(header: &str, key: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            header: HeaderName::from_bytes(header.as_bytes())?,
            key: Arc::from(key),
            excluded: Arc::from(Vec::new()),
        })
    }

    /// Paths starting with any of `prefixes` bypass the gate.
    pub fn excluding(mut self, prefixes: Vec<String>) -> Self {
        self.excluded = Arc::from(prefixes);
        self
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let presented = headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty());
        match presented {
            None => Err(ApiError::Unauthorized("API key missing")),
            Some(value) if value == &*self.key => Ok(()),
            Some(_) => Err(ApiError::Unauthorized("Invalid API key")),
        }
    }
}

/// `axum::middleware::from_fn_with_state` entry point.
pub async fn require_key(
    State(gate): State<KeyGate>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if gate.is_excluded(&path) {
        return next.run(request).await;
    }

    match gate.check(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!(path = %path, reason = %err, "Rejected unauthenticated request");
            err.into_response()
        }
    }
}
