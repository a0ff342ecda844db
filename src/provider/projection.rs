//! Store → gateway dynamic-configuration translation.
//!
//! Pure: no I/O, no mutation of the input, deterministic output.

use super::middlewares::project_middleware;
use super::schema;
use crate::model::{
    HealthCheck, LoadBalancer, Router, Server, Service, ServiceSpec, Sticky,
};
use crate::store::StoreDocument;

/// Projects the full store contents.
pub fn project(doc: &StoreDocument) -> schema::DynamicConfig {
    let http = schema::HttpConfiguration {
        routers: doc
            .routers
            .iter()
            .map(|(id, r)| (id.clone(), project_router(r)))
            .collect(),
        services: doc
            .services
            .iter()
            .map(|(id, s)| (id.clone(), project_service(s)))
            .collect(),
        middlewares: doc
            .middlewares
            .iter()
            .map(|(id, m)| (id.clone(), project_middleware(m)))
            .collect(),
    };
    schema::DynamicConfig { http }
}

pub fn project_router(router: &Router) -> schema::Router {
    schema::Router {
        entry_points: router.entry_points.clone(),
        middlewares: router.middleware_ids().map(str::to_string).collect(),
        service: router.service.id.clone(),
        rule: router.rule.clone(),
        rule_syntax: router.rule_syntax.clone(),
        priority: router.priority,
        tls: router.tls.as_ref().map(|tls| schema::RouterTls {
            options: tls.options.clone(),
            cert_resolver: tls.cert_resolver.clone(),
            domains: tls
                .domains
                .iter()
                .map(|d| schema::Domain {
                    main: d.main.clone(),
                    sans: d.sans.clone(),
                })
                .collect(),
        }),
        observability: router.observability.map(|o| schema::Observability {
            access_logs: o.access_logs,
            tracing: o.tracing,
            metrics: o.metrics,
        }),
    }
}

pub fn project_service(service: &Service) -> schema::Service {
    let mut out = schema::Service::default();
    match &service.spec {
        ServiceSpec::Url(url) => {
            out.load_balancer = Some(schema::LoadBalancerService {
                servers: vec![project_server(&Server {
                    url: url.clone(),
                    ..Default::default()
                })],
                health_check: None,
                pass_host_header: true,
                response_forwarding: None,
                servers_transport: None,
                sticky: None,
            });
        }
        ServiceSpec::LoadBalancer(lb) => out.load_balancer = Some(project_load_balancer(lb)),
        ServiceSpec::Weighted(w) => {
            out.weighted = Some(schema::WeightedService {
                services: w
                    .services
                    .iter()
                    .map(|item| schema::WeightedServiceItem {
                        name: item.name.id.clone(),
                        weight: item.weight,
                    })
                    .collect(),
                sticky: w.sticky.as_ref().and_then(project_sticky),
                health_check: w.health_check.as_ref().map(project_health_check),
            });
        }
        ServiceSpec::Mirroring(m) => {
            out.mirroring = Some(schema::MirroringService {
                service: m.service.id.clone(),
                mirror_body: m.mirror_body.unwrap_or(true),
                max_body_size: m.max_body_size.filter(|size| *size > 0),
                mirrors: m
                    .mirrors
                    .iter()
                    .map(|item| schema::MirrorServiceItem {
                        name: item.name.id.clone(),
                        percent: item.percent,
                    })
                    .collect(),
                health_check: m.health_check.as_ref().map(project_health_check),
            });
        }
        ServiceSpec::Failover(f) => {
            out.failover = Some(schema::FailoverService {
                service: f.service.id.clone(),
                fallback: f.fallback.id.clone(),
                health_check: f.health_check.as_ref().map(project_health_check),
            });
        }
    }
    out
}

fn project_load_balancer(lb: &LoadBalancer) -> schema::LoadBalancerService {
    schema::LoadBalancerService {
        servers: lb.servers.iter().map(project_server).collect(),
        health_check: lb.health_check.as_ref().map(project_health_check),
        pass_host_header: true,
        response_forwarding: lb
            .response_forwarding
            .as_ref()
            .and_then(|rf| rf.flush_interval.clone())
            .map(|flush_interval| schema::ResponseForwarding { flush_interval }),
        servers_transport: lb.servers_transport.clone().filter(|t| !t.is_empty()),
        sticky: lb.sticky.as_ref().and_then(project_sticky),
    }
}

fn project_server(server: &Server) -> schema::Server {
    schema::Server {
        url: server.url.clone(),
        weight: server.weight.unwrap_or(1),
        preserve_path: server.preserve_path.unwrap_or(false),
    }
}

fn project_health_check(hc: &HealthCheck) -> schema::HealthCheck {
    schema::HealthCheck {
        scheme: hc.scheme.clone(),
        mode: hc.mode.clone(),
        path: hc.path.clone(),
        method: hc.method.clone(),
        status: hc.status,
        port: hc.port,
        interval: hc.interval.clone(),
        timeout: hc.timeout.clone(),
        hostname: hc.hostname.clone(),
        follow_redirects: hc.follow_redirects.unwrap_or(false),
        headers: hc.headers.clone(),
    }
}

/// Sticky is only emitted when a cookie block exists.
fn project_sticky(sticky: &Sticky) -> Option<schema::Sticky> {
    let cookie = sticky.cookie.as_ref()?;
    Some(schema::Sticky {
        cookie: schema::StickyCookie {
            name: cookie.name.clone(),
            secure: cookie.secure.unwrap_or(false),
            http_only: cookie.http_only.unwrap_or(false),
            same_site: cookie.same_site.clone(),
            max_age: cookie.max_age,
            path: cookie.path.clone(),
        },
    })
}
