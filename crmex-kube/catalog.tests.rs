use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use k8s_openapi::serde_json::{Value, json};
use rstest::rstest;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use super::*;

fn resource(name: &str, kind: &str, namespaced: bool) -> APIResource {
    APIResource {
        name: name.to_owned(),
        kind: kind.to_owned(),
        namespaced,
        singular_name: String::new(),
        verbs: vec!["list".to_owned(), "watch".to_owned()],
        ..Default::default()
    }
}

fn catalog() -> Vec<APIResourceList> {
    vec![
        APIResourceList {
            group_version: "cache.example.com/v1alpha1".to_owned(),
            resources: vec![
                resource("memcacheds/status", "Memcached", true),
                resource("memcacheds", "Memcached", true),
                resource("cacheclusters", "CacheCluster", false),
            ],
        },
        APIResourceList {
            group_version: "cache.example.com/v1beta1".to_owned(),
            resources: vec![resource("memcacheds", "Memcached", false)],
        },
        APIResourceList {
            group_version: "v1".to_owned(),
            resources: vec![resource("configmaps", "ConfigMap", true), resource("nodes", "Node", false)],
        },
    ]
}

#[rstest]
#[case("cache.example.com", "v1alpha1", "Memcached", true)]
#[case("cache.example.com", "v1alpha1", "CacheCluster", false)]
#[case("cache.example.com", "v1beta1", "Memcached", false)]
#[case("", "v1", "ConfigMap", true)]
#[case("", "v1", "Node", false)]
fn is_namespaced_test(#[case] group: &str, #[case] version: &str, #[case] kind: &str, #[case] expected: bool) {
    let gvk = GroupVersionKind::gvk(group, version, kind);

    assert_eq!(expected, is_namespaced(&gvk, &catalog()).unwrap());
}

#[rstest]
#[case("cache.example.com", "v1alpha1", "Redis")]
#[case("cache.example.com", "v2", "Memcached")]
#[case("other.example.com", "v1alpha1", "Memcached")]
#[case("", "v1", "memcached")]
fn is_namespaced_not_found_test(#[case] group: &str, #[case] version: &str, #[case] kind: &str) {
    let gvk = GroupVersionKind::gvk(group, version, kind);

    let error = is_namespaced(&gvk, &catalog()).unwrap_err();

    assert!(matches!(error, CatalogError::TypeNotFound(_)));
    assert_eq!(format!("unable to find type: {} in server", format_gvk(&gvk)), error.to_string());
}

#[test]
fn is_namespaced_empty_catalog_test() {
    let gvk = GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Memcached");

    assert!(is_namespaced(&gvk, &[]).is_err());
}

#[test]
fn find_api_resource_skips_subresources_test() {
    let gvk = GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Memcached");

    let ar = find_api_resource(&gvk, &catalog()).unwrap();

    assert_eq!("memcacheds", ar.plural);
    assert_eq!("cache.example.com", ar.group);
    assert_eq!("v1alpha1", ar.version);
    assert_eq!("cache.example.com/v1alpha1", ar.api_version);
    assert_eq!("Memcached", ar.kind);
}

#[test]
fn find_api_resource_core_test() {
    let gvk = GroupVersionKind::gvk("", "v1", "ConfigMap");

    let ar = find_api_resource(&gvk, &catalog()).unwrap();

    assert_eq!("configmaps", ar.plural);
    assert_eq!("v1", ar.api_version);
}

#[test]
fn find_api_resource_not_found_test() {
    let gvk = GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Redis");

    assert!(matches!(
        find_api_resource(&gvk, &catalog()),
        Err(CatalogError::TypeNotFound(_))
    ));
}

type Requests = Arc<Mutex<Vec<String>>>;

fn resource_list(group_version: &str, resources: Value) -> Value {
    json!({
        "kind": "APIResourceList",
        "apiVersion": "v1",
        "groupVersion": group_version,
        "resources": resources,
    })
}

fn failure(code: StatusCode, reason: &str) -> Response {
    let status = json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": format!("request failed with {reason}"),
        "reason": reason,
        "code": code.as_u16(),
    });

    (code, Json(status)).into_response()
}

/// Minimal Kubernetes API server recording paths of discovery requests.
async fn fake_api_server(State(requests): State<Requests>, uri: Uri) -> Response {
    requests.lock().unwrap().push(uri.path().to_owned());

    match uri.path() {
        "/apis/cache.example.com/v1alpha1" => Json(resource_list(
            "cache.example.com/v1alpha1",
            json!([
                { "name": "memcacheds", "singularName": "memcached", "namespaced": true, "kind": "Memcached", "verbs": ["list", "watch"] },
                { "name": "cacheclusters", "singularName": "cachecluster", "namespaced": false, "kind": "CacheCluster", "verbs": ["list", "watch"] },
            ]),
        ))
        .into_response(),
        "/api/v1" => Json(resource_list(
            "v1",
            json!([{ "name": "configmaps", "singularName": "configmap", "namespaced": true, "kind": "ConfigMap", "verbs": ["list", "watch"] }]),
        ))
        .into_response(),
        "/apis/forbidden.example.com/v1" => failure(StatusCode::FORBIDDEN, "Forbidden"),
        _ => failure(StatusCode::NOT_FOUND, "NotFound"),
    }
}

async fn start_api_server() -> (Client, Requests) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let requests = Requests::default();
    let router = axum::Router::new()
        .fallback(fake_api_server)
        .with_state(Arc::clone(&requests));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let config = kube::Config::new(format!("http://{address}").parse().unwrap());
    (Client::try_from(config).unwrap(), requests)
}

#[tokio::test]
async fn fetch_each_group_version_once_test() {
    let (client, requests) = start_api_server().await;
    let gvks = vec![
        GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Memcached"),
        GroupVersionKind::gvk("cache.example.com", "v1alpha1", "CacheCluster"),
        GroupVersionKind::gvk("", "v1", "ConfigMap"),
        GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Memcached"),
    ];

    let lists = get_api_resource_lists(&client, &gvks).await.unwrap();

    assert_eq!(
        vec!["cache.example.com/v1alpha1", "v1"],
        lists.iter().map(|l| l.group_version.as_str()).collect::<Vec<_>>()
    );
    assert_eq!(
        vec!["/apis/cache.example.com/v1alpha1".to_owned(), "/api/v1".to_owned()],
        *requests.lock().unwrap()
    );
    assert!(is_namespaced(&gvks[0], &lists).unwrap());
    assert!(!is_namespaced(&gvks[1], &lists).unwrap());
    assert!(is_namespaced(&gvks[2], &lists).unwrap());
}

#[tokio::test]
async fn unserved_group_version_is_skipped_test() {
    let (client, requests) = start_api_server().await;
    let redis = GroupVersionKind::gvk("missing.example.com", "v1", "Redis");
    let gvks = vec![GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Memcached"), redis.clone()];

    let lists = get_api_resource_lists(&client, &gvks).await.unwrap();

    assert_eq!(1, lists.len());
    assert_eq!(2, requests.lock().unwrap().len());
    assert_eq!(
        "unable to find type: missing.example.com/v1, Kind=Redis in server",
        is_namespaced(&redis, &lists).unwrap_err().to_string()
    );
}

#[tokio::test]
async fn api_error_is_propagated_test() {
    let (client, _requests) = start_api_server().await;
    let gvks = vec![
        GroupVersionKind::gvk("forbidden.example.com", "v1", "Secret"),
        GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Memcached"),
    ];

    let result = get_api_resource_lists(&client, &gvks).await;

    assert!(matches!(result, Err(CatalogError::KubeError(kube::Error::Api(response))) if response.code == 403));
}
