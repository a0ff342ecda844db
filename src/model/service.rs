//! Service resource.
//!
//! On the wire a service is an object with exactly one populated form field
//! (`url`, `loadBalancer`, `weighted`, `mirroring`, `failover`). Internally
//! that is a [`ServiceSpec`] enum so "exactly one form" is a type invariant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ResourceRef;

/// A named backend target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ServiceDocument", into = "ServiceDocument")]
pub struct Service {
    pub id: String,
    pub spec: ServiceSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceSpec {
    /// Single upstream URL; projected as a one-server load balancer.
    Url(String),
    LoadBalancer(LoadBalancer),
    Weighted(Weighted),
    Mirroring(Mirroring),
    Failover(Failover),
}

impl ServiceSpec {
    pub fn form_name(&self) -> &'static str {
        match self {
            ServiceSpec::Url(_) => "url",
            ServiceSpec::LoadBalancer(_) => "loadBalancer",
            ServiceSpec::Weighted(_) => "weighted",
            ServiceSpec::Mirroring(_) => "mirroring",
            ServiceSpec::Failover(_) => "failover",
        }
    }
}

/// Rejections raised when a wire document does not describe a valid service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceShapeError {
    #[error("service must have either URL, LoadBalancer, Weighted, Mirroring, or Failover configuration")]
    NoForm,

    #[error("service must define exactly one of URL, LoadBalancer, Weighted, Mirroring, or Failover (found {})", .0.join(", "))]
    MultipleForms(Vec<&'static str>),

    #[error("load balancer service must have at least one server")]
    NoServers,

    #[error("server URL is required for load balancer servers")]
    ServerUrlMissing,

    #[error("server weight must be at least 1")]
    ServerWeightZero,

    #[error("weighted service must have at least one service")]
    NoWeightedServices,

    #[error("weighted service entries require a service name")]
    WeightedNameMissing,

    #[error("main service ID is required for mirroring service")]
    MirrorMainMissing,

    #[error("mirroring service must have at least one mirror")]
    NoMirrors,

    #[error("mirror entries require a service name")]
    MirrorNameMissing,

    #[error("mirror percent must be between 0 and 100 (got {0})")]
    MirrorPercentOutOfRange(u32),

    #[error("main service ID is required for failover service")]
    FailoverMainMissing,

    #[error("fallback service ID is required for failover service")]
    FailoverFallbackMissing,
}

/// Wire shape of a service: one optional sibling field per form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDocument {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted: Option<Weighted>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirroring: Option<Mirroring>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover: Option<Failover>,
}

impl TryFrom<ServiceDocument> for Service {
    type Error = ServiceShapeError;

    fn try_from(doc: ServiceDocument) -> Result<Self, Self::Error> {
        let url = doc.url.filter(|u| !u.is_empty());

        let mut present = Vec::new();
        if url.is_some() {
            present.push("url");
        }
        if doc.load_balancer.is_some() {
            present.push("loadBalancer");
        }
        if doc.weighted.is_some() {
            present.push("weighted");
        }
        if doc.mirroring.is_some() {
            present.push("mirroring");
        }
        if doc.failover.is_some() {
            present.push("failover");
        }
        if present.len() > 1 {
            return Err(ServiceShapeError::MultipleForms(present));
        }

        let spec = if let Some(url) = url {
            ServiceSpec::Url(url)
        } else if let Some(lb) = doc.load_balancer {
            lb.validate()?;
            ServiceSpec::LoadBalancer(lb)
        } else if let Some(weighted) = doc.weighted {
            weighted.validate()?;
            ServiceSpec::Weighted(weighted)
        } else if let Some(mirroring) = doc.mirroring {
            mirroring.validate()?;
            ServiceSpec::Mirroring(mirroring)
        } else if let Some(failover) = doc.failover {
            failover.validate()?;
            ServiceSpec::Failover(failover)
        } else {
            return Err(ServiceShapeError::NoForm);
        };

        Ok(Service { id: doc.id, spec })
    }
}

impl From<Service> for ServiceDocument {
    fn from(service: Service) -> Self {
        let mut doc = ServiceDocument {
            id: service.id,
            ..Default::default()
        };
        match service.spec {
            ServiceSpec::Url(url) => doc.url = Some(url),
            ServiceSpec::LoadBalancer(lb) => doc.load_balancer = Some(lb),
            ServiceSpec::Weighted(w) => doc.weighted = Some(w),
            ServiceSpec::Mirroring(m) => doc.mirroring = Some(m),
            ServiceSpec::Failover(f) => doc.failover = Some(f),
        }
        doc
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    #[serde(default)]
    pub servers: Vec<Server>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,

    /// Accepted and stored; the projection always emits `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_host_header: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_forwarding: Option<ResponseForwarding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers_transport: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticky: Option<Sticky>,
}

impl LoadBalancer {
    fn validate(&self) -> Result<(), ServiceShapeError> {
        if self.servers.is_empty() {
            return Err(ServiceShapeError::NoServers);
        }
        if self.servers.iter().any(|s| s.url.is_empty()) {
            return Err(ServiceShapeError::ServerUrlMissing);
        }
        if self.servers.iter().any(|s| s.weight == Some(0)) {
            return Err(ServiceShapeError::ServerWeightZero);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(default)]
    pub url: String,

    /// Defaults to 1 in the projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_path: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Duration string such as `"10s"`, passed through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_redirects: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseForwarding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush_interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sticky {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<StickyCookie>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyCookie {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weighted {
    #[serde(default)]
    pub services: Vec<WeightedItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticky: Option<Sticky>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
}

impl Weighted {
    fn validate(&self) -> Result<(), ServiceShapeError> {
        if self.services.is_empty() {
            return Err(ServiceShapeError::NoWeightedServices);
        }
        if self.services.iter().any(|s| s.name.is_empty()) {
            return Err(ServiceShapeError::WeightedNameMissing);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightedItem {
    #[serde(default)]
    pub name: ResourceRef,
    #[serde(default)]
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mirroring {
    #[serde(default)]
    pub service: ResourceRef,

    /// Absent means `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_body: Option<bool>,

    /// Only projected when positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_body_size: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mirrors: Vec<MirrorItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
}

impl Mirroring {
    fn validate(&self) -> Result<(), ServiceShapeError> {
        if self.service.is_empty() {
            return Err(ServiceShapeError::MirrorMainMissing);
        }
        if self.mirrors.is_empty() {
            return Err(ServiceShapeError::NoMirrors);
        }
        if self.mirrors.iter().any(|m| m.name.is_empty()) {
            return Err(ServiceShapeError::MirrorNameMissing);
        }
        if let Some(m) = self.mirrors.iter().find(|m| m.percent > 100) {
            return Err(ServiceShapeError::MirrorPercentOutOfRange(m.percent));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MirrorItem {
    #[serde(default)]
    pub name: ResourceRef,
    #[serde(default)]
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failover {
    #[serde(default)]
    pub service: ResourceRef,

    #[serde(default)]
    pub fallback: ResourceRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
}

impl Failover {
    fn validate(&self) -> Result<(), ServiceShapeError> {
        if self.service.is_empty() {
            return Err(ServiceShapeError::FailoverMainMissing);
        }
        if self.fallback.is_empty() {
            return Err(ServiceShapeError::FailoverFallbackMissing);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<Service, ServiceShapeError> {
        let doc: ServiceDocument = serde_json::from_value(value).unwrap();
        Service::try_from(doc)
    }

    #[test]
    fn test_url_form() {
        let service = parse(json!({"id": "s1", "url": "http://a:80"})).unwrap();
        assert_eq!(service.spec, ServiceSpec::Url("http://a:80".into()));
    }

    #[test]
    fn test_no_form_rejected() {
        assert_eq!(parse(json!({"id": "s1"})), Err(ServiceShapeError::NoForm));
        assert_eq!(
            parse(json!({"id": "s1", "url": ""})),
            Err(ServiceShapeError::NoForm)
        );
    }

    #[test]
    fn test_multiple_forms_rejected() {
        let err = parse(json!({
            "id": "s1",
            "url": "http://a",
            "failover": {"service": "a", "fallback": "b"}
        }))
        .unwrap_err();
        assert_eq!(err, ServiceShapeError::MultipleForms(vec!["url", "failover"]));
    }

    #[test]
    fn test_load_balancer_requires_server_urls() {
        assert_eq!(
            parse(json!({"id": "s1", "loadBalancer": {"servers": []}})),
            Err(ServiceShapeError::NoServers)
        );
        assert_eq!(
            parse(json!({"id": "s1", "loadBalancer": {"servers": [{"weight": 2}]}})),
            Err(ServiceShapeError::ServerUrlMissing)
        );
    }

    #[test]
    fn test_server_weight_must_be_positive() {
        assert_eq!(
            parse(json!({"id": "s1", "loadBalancer": {"servers": [{"url": "http://a", "weight": 0}]}})),
            Err(ServiceShapeError::ServerWeightZero)
        );
        assert!(parse(json!({"id": "s1", "loadBalancer": {"servers": [{"url": "http://a", "weight": 1}]}})).is_ok());
    }

    #[test]
    fn test_weighted_entries_need_names() {
        assert_eq!(
            parse(json!({"id": "w", "weighted": {"services": []}})),
            Err(ServiceShapeError::NoWeightedServices)
        );
        assert_eq!(
            parse(json!({"id": "w", "weighted": {"services": [{"name": "a"}, {"name": "", "weight": 2}]}})),
            Err(ServiceShapeError::WeightedNameMissing)
        );
    }

    #[test]
    fn test_mirroring_rules() {
        assert_eq!(
            parse(json!({"id": "m", "mirroring": {"mirrors": [{"name": "b", "percent": 10}]}})),
            Err(ServiceShapeError::MirrorMainMissing)
        );
        assert_eq!(
            parse(json!({"id": "m", "mirroring": {"service": "a"}})),
            Err(ServiceShapeError::NoMirrors)
        );
        assert_eq!(
            parse(json!({"id": "m", "mirroring": {"service": "a", "mirrors": [{"name": "", "percent": 10}]}})),
            Err(ServiceShapeError::MirrorNameMissing)
        );
        assert_eq!(
            parse(json!({"id": "m", "mirroring": {"service": "a", "mirrors": [{"name": "b", "percent": 150}]}})),
            Err(ServiceShapeError::MirrorPercentOutOfRange(150))
        );
        assert!(parse(json!({"id": "m", "mirroring": {"service": "a", "mirrors": [{"name": "b", "percent": 100}]}})).is_ok());
    }

    #[test]
    fn test_failover_requires_both_references() {
        assert_eq!(
            parse(json!({"id": "s1", "failover": {"service": "a"}})),
            Err(ServiceShapeError::FailoverFallbackMissing)
        );
        assert_eq!(
            parse(json!({"id": "s1", "failover": {"fallback": "b"}})),
            Err(ServiceShapeError::FailoverMainMissing)
        );
    }

    #[test]
    fn test_wire_shape_keeps_single_sibling() {
        let service = parse(json!({
            "id": "w",
            "weighted": {"services": [{"name": "a", "weight": 3}]}
        }))
        .unwrap();
        let value = serde_json::to_value(&service).unwrap();
        assert_eq!(
            value,
            json!({"id": "w", "weighted": {"services": [{"name": {"id": "a"}, "weight": 3}]}})
        );
    }
}
