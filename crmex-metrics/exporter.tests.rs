use axum::Json;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use k8s_openapi::serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::*;

fn memcached_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Memcached")
}

fn cache_cluster_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk("cache.example.com", "v1alpha1", "CacheCluster")
}

fn resource(name: &str, kind: &str, namespaced: bool) -> APIResource {
    APIResource {
        name: name.to_owned(),
        kind: kind.to_owned(),
        namespaced,
        verbs: vec!["list".to_owned(), "watch".to_owned()],
        ..Default::default()
    }
}

fn catalog() -> ApiResourceLists {
    vec![
        APIResourceList {
            group_version: "cache.example.com/v1alpha1".to_owned(),
            resources: vec![
                resource("memcacheds", "Memcached", true),
                resource("cacheclusters", "CacheCluster", false),
            ],
        },
        APIResourceList {
            group_version: "cache.example.com/v1beta1".to_owned(),
            resources: vec![resource("memcacheds", "Memcached", true)],
        },
    ]
}

/// Returns client for the API server that is not listening.
fn offline_client() -> Client {
    let config = kube::Config::new("http://127.0.0.1:9".parse().unwrap());
    Client::try_from(config).unwrap()
}

fn encode_registry(registry: &Registry) -> String {
    let mut text = String::new();
    prometheus_client::encoding::text::encode(&mut text, registry).unwrap();
    text
}

#[tokio::test]
async fn empty_namespaces_test() {
    let result = generate_and_serve_cr_metrics(offline_client(), &[], &[memcached_gvk()], "127.0.0.1", 0).await;

    let Err(error) = result else {
        panic!("empty namespaces must be rejected");
    };
    assert!(matches!(error, CrMetricsError::EmptyNamespaces));
    assert_eq!(
        "namespaces were empty; pass at least one namespace to generate custom resource metrics",
        error.to_string()
    );
}

#[tokio::test]
async fn start_stores_per_scope_test() {
    let client = offline_client();
    let token = CancellationToken::new();
    let mut registry = Registry::default();
    let namespaces = vec!["apps".to_owned(), "tools".to_owned()];
    let gvks = vec![memcached_gvk(), cache_cluster_gvk(), memcached_gvk()];

    let stores = start_metrics_stores(
        &Handle::current(),
        &client,
        &namespaces,
        &gvks,
        &catalog(),
        &mut registry,
        &token,
    )
    .unwrap();

    let descriptions = stores.iter().map(BgMetricsStore::description).collect::<Vec<_>>();
    assert_eq!(vec!["memcacheds in apps", "memcacheds in tools", "cacheclusters"], descriptions);
    assert!(stores.iter().all(|s| !s.is_ready()));

    let text = encode_registry(&registry);
    assert_eq!(1, text.matches("# TYPE memcached_info gauge").count());
    assert_eq!(1, text.matches("# TYPE cachecluster_info gauge").count());

    token.cancel();
}

#[tokio::test]
async fn same_kind_in_many_versions_shares_families_test() {
    let client = offline_client();
    let token = CancellationToken::new();
    let mut registry = Registry::default();
    let namespaces = vec!["apps".to_owned()];
    let gvks = vec![
        memcached_gvk(),
        GroupVersionKind::gvk("cache.example.com", "v1beta1", "Memcached"),
    ];

    let stores = start_metrics_stores(
        &Handle::current(),
        &client,
        &namespaces,
        &gvks,
        &catalog(),
        &mut registry,
        &token,
    )
    .unwrap();

    assert_eq!(2, stores.len());

    let text = encode_registry(&registry);
    assert_eq!(1, text.matches("# HELP memcached_info").count());
    assert_eq!(1, text.matches("# TYPE memcached_info gauge").count());

    token.cancel();
}

#[tokio::test]
async fn unknown_type_stops_setup_test() {
    let client = offline_client();
    let token = CancellationToken::new();
    let mut registry = Registry::default();
    let namespaces = vec!["apps".to_owned()];
    let gvks = vec![memcached_gvk(), GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Redis")];

    let result = start_metrics_stores(
        &Handle::current(),
        &client,
        &namespaces,
        &gvks,
        &catalog(),
        &mut registry,
        &token,
    );

    let Err(error) = result else {
        panic!("unknown resource type must be rejected");
    };
    assert_eq!(
        "unable to find type: cache.example.com/v1alpha1, Kind=Redis in server",
        error.to_string()
    );
}

fn is_watch(uri: &Uri) -> bool {
    uri.query()
        .is_some_and(|q| q.split('&').any(|p| p == "watch=true" || p == "watch=1"))
}

fn object_list(kind: &str, items: Value) -> Value {
    json!({
        "apiVersion": "cache.example.com/v1alpha1",
        "kind": format!("{kind}List"),
        "metadata": { "resourceVersion": "100" },
        "items": items,
    })
}

/// Minimal Kubernetes API server serving two custom resource types.
async fn fake_api_server(uri: Uri) -> Response {
    if is_watch(&uri) {
        tokio::time::sleep(Duration::from_secs(60)).await;
        return StatusCode::GATEWAY_TIMEOUT.into_response();
    }

    match uri.path() {
        "/apis/cache.example.com/v1alpha1" => Json(json!({
            "kind": "APIResourceList",
            "apiVersion": "v1",
            "groupVersion": "cache.example.com/v1alpha1",
            "resources": [
                { "name": "memcacheds", "singularName": "memcached", "namespaced": true, "kind": "Memcached", "verbs": ["list", "watch"] },
                { "name": "memcacheds/status", "singularName": "", "namespaced": true, "kind": "Memcached", "verbs": ["get"] },
                { "name": "cacheclusters", "singularName": "cachecluster", "namespaced": false, "kind": "CacheCluster", "verbs": ["list", "watch"] },
            ],
        }))
        .into_response(),
        "/apis/cache.example.com/v1alpha1/namespaces/default/memcacheds" => Json(object_list(
            "Memcached",
            json!([
                { "metadata": { "name": "example", "namespace": "default", "uid": "1", "resourceVersion": "99" } },
                { "metadata": { "name": "another", "namespace": "default", "uid": "2", "resourceVersion": "98" } },
            ]),
        ))
        .into_response(),
        "/apis/cache.example.com/v1alpha1/cacheclusters" => Json(object_list(
            "CacheCluster",
            json!([{ "metadata": { "name": "global", "uid": "3", "resourceVersion": "97" } }]),
        ))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn http_get(address: SocketAddr, path: &str) -> Option<String> {
    let mut stream = TcpStream::connect(address).await.ok()?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.ok()?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await.ok()?;
    Some(response)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn serves_metrics_for_cluster_objects_test() {
    let api_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let api_address = api_listener.local_addr().unwrap();
    let api_server = tokio::spawn(async move {
        axum::serve(api_listener, axum::Router::new().fallback(fake_api_server))
            .await
            .unwrap();
    });

    let metrics_address = {
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        probe.local_addr().unwrap()
    };

    let config = kube::Config::new(format!("http://{api_address}").parse().unwrap());
    let client = Client::try_from(config).unwrap();
    let namespaces = vec!["default".to_owned()];
    let gvks = vec![memcached_gvk(), cache_cluster_gvk()];

    let cr_metrics = generate_and_serve_cr_metrics(client, &namespaces, &gvks, "127.0.0.1", metrics_address.port())
        .await
        .unwrap();
    assert_eq!(2, cr_metrics.stores_count());

    let expected = [
        r#"memcached_info{namespace="default",name="example"} 1"#,
        r#"memcached_info{namespace="default",name="another"} 1"#,
        r#"cachecluster_info{namespace="",name="global"} 1"#,
    ];

    let started = Instant::now();
    let mut response = String::new();
    while started.elapsed() < Duration::from_secs(10) {
        if let Some(text) = http_get(metrics_address, "/metrics").await {
            response = text;
            if cr_metrics.is_ready() && expected.iter().all(|line| response.contains(line)) {
                break;
            }
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    for line in expected {
        assert!(response.contains(line), "missing '{line}' in:\n{response}");
    }

    assert!(cr_metrics.is_ready());
    let readyz = http_get(metrics_address, "/readyz").await.unwrap();
    assert!(readyz.starts_with("HTTP/1.1 200 OK"));

    cr_metrics.cancel();
    api_server.abort();
}
