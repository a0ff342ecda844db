//! Provider endpoint and its key gate.

use serde_json::json;
use traefik_manager::config::ManagerConfig;

mod common;

fn gated_config() -> ManagerConfig {
    let mut config = ManagerConfig::default();
    config.provider.auth.enabled = true;
    config.provider.auth.key = "k".into();
    config
}

#[tokio::test]
async fn test_provider_gate_checks_its_own_key() {
    let server = common::spawn(gated_config()).await;
    let url = server.url("/traefik/provider");

    let res = server
        .client
        .get(&url)
        .header("X-API-Key", "k")
        .send()
        .await
        .unwrap();
    let (status, body) = common::read(res).await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({"http": {"routers": {}, "services": {}, "middlewares": {}}})
    );

    let res = server
        .client
        .get(&url)
        .header("X-API-Key", "wrong")
        .send()
        .await
        .unwrap();
    let (status, err) = common::read(res).await;
    assert_eq!(status, 401);
    assert_eq!(err["error"], "Invalid API key");

    let res = server.client.get(&url).send().await.unwrap();
    let (status, err) = common::read(res).await;
    assert_eq!(status, 401);
    assert_eq!(err["error"], "API key missing");

    server.stop().await;
}

#[tokio::test]
async fn test_api_key_does_not_open_the_provider() {
    let mut config = gated_config();
    config.auth.enabled = true;
    config.auth.key = "api".into();
    config.provider.auth.header_name = "X-Provider-Key".into();
    let server = common::spawn(config).await;

    let res = server
        .client
        .get(server.url("/traefik/provider"))
        .header("X-API-Key", "api")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);

    let res = server
        .client
        .get(server.url("/traefik/provider"))
        .header("X-Provider-Key", "k")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);

    // The API key still governs the API itself
    let res = server
        .client
        .get(server.api("/routers"))
        .header("X-Provider-Key", "k")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);

    server.stop().await;
}

#[tokio::test]
async fn test_provider_serves_projection() {
    let server = common::spawn(ManagerConfig::default()).await;

    common::post(&server, "/services", json!({"id": "s", "url": "http://b:80"})).await;
    common::post(
        &server,
        "/middlewares",
        json!({"id": "sp", "type": "stripPrefix", "config": {"prefixes": ["/api"]}}),
    )
    .await;
    common::post(
        &server,
        "/routers",
        json!({
            "id": "r",
            "entryPoints": ["web"],
            "rule": "PathPrefix(`/api`)",
            "service": "s",
            "middlewares": ["sp"]
        }),
    )
    .await;

    let res = server
        .client
        .get(server.url("/traefik/provider"))
        .send()
        .await
        .unwrap();
    let (status, config) = common::read(res).await;
    assert_eq!(status, 200);

    assert_eq!(
        config["http"]["services"]["s"],
        json!({"loadBalancer": {
            "servers": [{"url": "http://b:80", "weight": 1, "preservePath": false}],
            "passHostHeader": true
        }})
    );
    assert_eq!(
        config["http"]["middlewares"]["sp"],
        json!({"stripPrefix": {"prefixes": ["/api"]}})
    );
    assert_eq!(config["http"]["routers"]["r"]["service"], "s");
    assert_eq!(config["http"]["routers"]["r"]["middlewares"], json!(["sp"]));
    assert_eq!(config["http"]["routers"]["r"]["entryPoints"], json!(["web"]));

    server.stop().await;
}
