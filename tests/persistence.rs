//! Snapshot round-trips and consistency under concurrent load.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use traefik_manager::config::ManagerConfig;
use traefik_manager::lifecycle::Shutdown;
use traefik_manager::provider::project;
use traefik_manager::storage::{self, load_store, save_channel, SavePersister};

mod common;

#[tokio::test]
async fn test_restart_restores_identical_resources() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("store.json");

    // First run: persister wired to the store's save signal.
    let (signal, requests) = save_channel();
    let store = Arc::new(load_store(&path).unwrap().with_save_signal(signal));
    let persister_shutdown = Shutdown::new();
    let persister = tokio::spawn(
        SavePersister::new(store.clone(), &path, Duration::ZERO)
            .run(requests, persister_shutdown.subscribe()),
    );

    let server = common::spawn_with_store(ManagerConfig::default(), store).await;
    common::post(&server, "/services", json!({"id": "s1", "url": "http://b:80"})).await;
    common::post(
        &server,
        "/middlewares",
        json!({"id": "m1", "type": "redirectScheme", "config": {"scheme": "https"}}),
    )
    .await;
    let (status, _) = common::post(
        &server,
        "/routers",
        json!({"id": "r1", "rule": "Host(`a`)", "service": "s1", "middlewares": ["m1"]}),
    )
    .await;
    assert_eq!(status, 201);

    let mut before = Vec::new();
    for kind in ["/routers", "/services", "/middlewares"] {
        before.push(common::get(&server, kind).await.1);
    }
    server.stop().await;
    persister_shutdown.trigger();
    persister.await.unwrap().unwrap();
    assert!(path.exists());

    // Second run from the snapshot alone.
    let store = Arc::new(load_store(&path).unwrap());
    let server = common::spawn_with_store(ManagerConfig::default(), store).await;
    let mut after = Vec::new();
    for kind in ["/routers", "/services", "/middlewares"] {
        after.push(common::get(&server, kind).await.1);
    }
    assert_eq!(before, after);
    assert_eq!(after[0][0]["service"], json!({"id": "s1"}));

    server.stop().await;
}

#[tokio::test]
async fn test_projection_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let server = common::spawn(ManagerConfig::default()).await;

    common::post(
        &server,
        "/services",
        json!({"id": "lb", "loadBalancer": {
            "servers": [{"url": "http://a:80"}, {"url": "http://b:80", "weight": 3}],
            "healthCheck": {"path": "/ping", "interval": "10s"},
            "sticky": {"cookie": {"name": "sid", "secure": true}}
        }}),
    )
    .await;
    common::post(
        &server,
        "/services",
        json!({"id": "mirror", "mirroring": {
            "service": "lb",
            "mirrors": [{"name": {"id": "lb"}, "percent": 10}]
        }}),
    )
    .await;
    common::post(
        &server,
        "/middlewares",
        json!({"id": "auth", "type": "basicAuth", "config": {"users": ["u:p"], "realm": "r"}}),
    )
    .await;
    common::post(
        &server,
        "/routers",
        json!({"id": "r", "rule": "Host(`x`)", "service": "mirror", "middlewares": ["auth"],
               "priority": 10, "tls": {"certResolver": "le"}}),
    )
    .await;

    let projected = server.store.read(project);
    storage::write(&path, &server.store.document()).unwrap();
    let reloaded = load_store(&path).unwrap();
    assert_eq!(reloaded.read(project), projected);

    server.stop().await;
}

#[tokio::test]
async fn test_dangling_snapshot_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(
        &path,
        json!({
            "routers": {"r": {"id": "r", "rule": "Host(`a`)", "service": {"id": "gone"}}},
            "services": {},
            "middlewares": {}
        })
        .to_string(),
    )
    .unwrap();

    let err = load_store(&path).err().unwrap();
    assert!(matches!(err, storage::SnapshotError::Integrity { .. }));
}

#[tokio::test]
async fn test_concurrent_readers_never_see_dangling_references() {
    let server = Arc::new(common::spawn(ManagerConfig::default()).await);
    common::post(
        &server,
        "/middlewares",
        json!({"id": "base", "type": "addPrefix", "config": {"prefix": "/x"}}),
    )
    .await;

    let writer = {
        let server = server.clone();
        tokio::spawn(async move {
            for i in 0..40 {
                let (sid, mid, rid) = (format!("s{i}"), format!("m{i}"), format!("r{i}"));
                common::post(&server, "/services", json!({"id": sid, "url": "http://b:80"})).await;
                common::post(
                    &server,
                    "/middlewares",
                    json!({"id": mid, "type": "stripPrefix", "config": {"prefixes": ["/p"]}}),
                )
                .await;
                common::post(
                    &server,
                    "/routers",
                    json!({"id": rid, "rule": "Host(`a`)", "service": sid,
                           "middlewares": [mid, "base"]}),
                )
                .await;
                common::delete(&server, &format!("/routers/{rid}")).await;
                common::delete(&server, &format!("/services/{sid}")).await;
                common::delete(&server, &format!("/middlewares/{mid}")).await;
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let server = server.clone();
            tokio::spawn(async move {
                for _ in 0..40 {
                    let res = server
                        .client
                        .get(server.url("/traefik/provider"))
                        .send()
                        .await
                        .unwrap();
                    let (status, config) = common::read(res).await;
                    assert_eq!(status, 200);
                    assert_consistent(&config["http"]);
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    let (_, routers) = common::get(&server, "/routers").await;
    assert_eq!(routers, json!([]));
}

fn assert_consistent(http: &Value) {
    let routers = http["routers"].as_object().unwrap();
    for (id, router) in routers {
        let service = router["service"].as_str().unwrap();
        assert!(
            http["services"].get(service).is_some(),
            "router {id} references missing service {service}"
        );
        for middleware in router["middlewares"].as_array().into_iter().flatten() {
            let middleware = middleware.as_str().unwrap();
            assert!(
                http["middlewares"].get(middleware).is_some(),
                "router {id} references missing middleware {middleware}"
            );
        }
    }
}
