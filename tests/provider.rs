//! Integration tests for provider construction and the initial load,
//! exercised over real HTTP against a canned in-process server.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use consul_watch_config::prelude::*;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response on a fresh local port, then go quiet.
///
/// Later connections are refused, which the background loop treats as a
/// recoverable transport fault; tests stop the provider before that matters.
async fn serve_once(status_line: &'static str, index: u64, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (mut stream, _peer) = listener.accept().await.unwrap();

        // Drain the request headers; the contents don't matter here.
        let mut buffer = vec![0u8; 4096];
        let mut read = 0;
        loop {
            let n = stream.read(&mut buffer[read..]).await.unwrap();
            if n == 0 {
                break;
            }
            read += n;
            if buffer[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let response = format!(
            "{status_line}\r\n\
             Content-Type: application/json\r\n\
             X-Consul-Index: {index}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len(),
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
    });

    address
}

fn kv_entry(key: &str, node: &serde_json::Value) -> serde_json::Value {
    json!({ "Key": key, "Value": BASE64.encode(node.to_string()) })
}

#[tokio::test]
async fn initial_load_publishes_flattened_snapshot() {
    let body = json!([kv_entry(
        "myapp/config",
        &json!({"server": {"port": 8080, "host": "localhost"}, "debug": true})
    )])
    .to_string();
    let endpoint = serve_once("HTTP/1.1 200 OK", 7, body).await;

    let config = ConsulConfig::builder()
        .with_endpoint(endpoint)
        .with_path("myapp/config")
        .build()
        .await
        .unwrap();

    let snapshot = config.snapshot();
    assert_eq!(snapshot.get("server.port"), Some("8080"));
    assert_eq!(snapshot.get("server.host"), Some("localhost"));
    assert_eq!(snapshot.get("debug"), Some("true"));
    assert_eq!(snapshot.get("SERVER.PORT"), Some("8080"));

    config.stop();
}

#[tokio::test]
async fn multi_entry_listing_is_keyed_relative_to_the_watched_path() {
    let body = json!([
        { "Key": "myapp/config", "Value": null },
        kv_entry("myapp/config/server", &json!({"port": 9090})),
        kv_entry("myapp/config/database", &json!({"url": "postgres://db"})),
    ])
    .to_string();
    let endpoint = serve_once("HTTP/1.1 200 OK", 12, body).await;

    let config = ConsulConfig::builder()
        .with_endpoint(endpoint)
        .with_path("myapp/config")
        .build()
        .await
        .unwrap();

    let snapshot = config.snapshot();
    assert_eq!(snapshot.get("server.port"), Some("9090"));
    assert_eq!(snapshot.get("database.url"), Some("postgres://db"));
    // The directory marker for the watched path itself contributes nothing.
    assert_eq!(snapshot.len(), 2);

    config.stop();
}

#[tokio::test]
async fn empty_listing_is_a_valid_initial_snapshot() {
    let endpoint = serve_once("HTTP/1.1 200 OK", 3, "[]".to_string()).await;

    let config = ConsulConfig::builder()
        .with_endpoint(endpoint)
        .with_path("myapp/config")
        .build()
        .await
        .unwrap();

    assert!(config.snapshot().is_empty());
    config.stop();
}

#[tokio::test]
async fn non_success_status_aborts_startup() {
    let endpoint = serve_once(
        "HTTP/1.1 500 Internal Server Error",
        0,
        "[]".to_string(),
    )
    .await;

    let result = ConsulConfig::builder()
        .with_endpoint(endpoint)
        .with_path("myapp/config")
        .build()
        .await;

    assert!(matches!(result, Err(ConfigError::Status { .. })));
}

#[tokio::test]
async fn undecodable_value_aborts_startup() {
    let body = json!([{ "Key": "myapp/config", "Value": "!!!not-base64!!!" }]).to_string();
    let endpoint = serve_once("HTTP/1.1 200 OK", 1, body).await;

    let result = ConsulConfig::builder()
        .with_endpoint(endpoint)
        .with_path("myapp/config")
        .build()
        .await;

    assert!(matches!(result, Err(ConfigError::Decode { .. })));
}

#[tokio::test]
async fn unreachable_endpoint_aborts_startup() {
    // Bind a port, then free it so the connect is refused.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let result = ConsulConfig::builder()
        .with_endpoint(address)
        .with_path("myapp/config")
        .build()
        .await;

    assert!(matches!(result, Err(ConfigError::Transport { .. })));
}

#[tokio::test]
async fn background_watch_applies_changes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let bodies = vec![
        json!([kv_entry("myapp/config", &json!({"version": "1"}))]).to_string(),
        json!([kv_entry("myapp/config", &json!({"version": "2"}))]).to_string(),
    ];

    tokio::spawn(async move {
        for (i, body) in bodies.into_iter().enumerate() {
            let (mut stream, _peer) = listener.accept().await.unwrap();
            let mut buffer = vec![0u8; 4096];
            let mut read = 0;
            loop {
                let n = stream.read(&mut buffer[read..]).await.unwrap();
                if n == 0 {
                    break;
                }
                read += n;
                if buffer[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\n\
                 Content-Type: application/json\r\n\
                 X-Consul-Index: {}\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                i + 1,
                body.len(),
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
    });

    let config = ConsulConfig::builder()
        .with_endpoint(address)
        .with_path("myapp/config")
        .build()
        .await
        .unwrap();
    assert_eq!(config.get("version"), Some("1".to_string()));

    // The first blocking query picks up the second response.
    let updated = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            if config.get("version").as_deref() == Some("2") {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(updated.is_ok(), "watch never applied the changed snapshot");

    config.stop();
}

#[tokio::test]
async fn construction_validation_fails_fast() {
    let result = ConsulConfig::builder().with_path("myapp").build().await;
    assert!(matches!(result, Err(ConfigError::NoEndpoints)));

    let result = ConsulConfig::builder()
        .with_endpoint("http://localhost:8500")
        .build()
        .await;
    assert!(matches!(result, Err(ConfigError::MissingPath)));
}
