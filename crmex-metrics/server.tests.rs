use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use super::*;
use crate::{generate_metric_families, register_families};

async fn start(registry: Registry, readiness: StoresReadiness) -> (SocketAddr, CancellationToken, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let token = CancellationToken::new();
    let server_token = token.clone();
    let task = tokio::spawn(async move {
        serve_metrics_on(listener, Arc::new(registry), readiness, server_token)
            .await
            .unwrap();
    });

    (address, token, task)
}

async fn http_get(address: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(address).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn metrics_endpoint_test() {
    let mut registry = Registry::default();
    let families = register_families(generate_metric_families("Memcached"), &mut registry);
    let labels = vec![
        ("namespace".to_owned(), "default".to_owned()),
        ("name".to_owned(), "example".to_owned()),
    ];
    families[0].acquire(&labels, 1);
    let (address, token, task) = start(registry, StoresReadiness::default()).await;

    let response = http_get(address, "/metrics").await;

    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains(OPENMETRICS_CONTENT_TYPE));
    assert!(response.contains("# TYPE memcached_info gauge"));
    assert!(response.contains(r#"memcached_info{namespace="default",name="example"} 1"#));
    assert!(response.contains("# EOF"));

    token.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn health_and_readiness_test() {
    let flag = Arc::new(AtomicBool::new(false));
    let readiness = StoresReadiness::new([Arc::new(AtomicBool::new(true)), Arc::clone(&flag)]);
    let (address, token, task) = start(Registry::default(), readiness).await;

    assert!(http_get(address, "/healthz").await.starts_with("HTTP/1.1 200 OK"));
    assert!(http_get(address, "/readyz").await.starts_with("HTTP/1.1 503"));

    flag.store(true, Ordering::Relaxed);
    assert!(http_get(address, "/readyz").await.starts_with("HTTP/1.1 200 OK"));

    assert!(http_get(address, "/unknown").await.starts_with("HTTP/1.1 404"));

    token.cancel();
    task.await.unwrap();
}

#[test]
fn readiness_test() {
    assert!(StoresReadiness::default().is_ready());

    let flag = Arc::new(AtomicBool::new(false));
    let readiness = StoresReadiness::new([Arc::clone(&flag)]);
    assert!(!readiness.is_ready());

    flag.store(true, Ordering::Relaxed);
    assert!(readiness.is_ready());
}

#[tokio::test]
async fn bind_error_test() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let result = serve_metrics(
        Arc::new(Registry::default()),
        StoresReadiness::default(),
        "127.0.0.1",
        port,
        CancellationToken::new(),
    )
    .await;

    assert!(matches!(result, Err(ServerError::BindError(address, _)) if address == format!("127.0.0.1:{port}")));
}
