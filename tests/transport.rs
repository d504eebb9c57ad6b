// Transport tests against a local mock server.
use fetchlist::client::{
    AssumeOnline, Connectivity, FeedClient, FixedConnectivity, NetworkState,
};
use fetchlist::config::Config;
use fetchlist::error::FetchError;
use http::Uri;
use mockito::{Server, ServerGuard};
use std::net::TcpListener;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const BODY: &str = r#"[{"id":1,"listId":1,"name":"Item 1"}]"#;

fn config_for(server: &ServerGuard) -> Config {
    Config {
        feed_url: format!("{}/hiring.json", server.url()),
        probe_url: format!("{}/probe", server.url()),
        ..Config::default()
    }
}

fn client(config: &Config, connectivity: Arc<dyn Connectivity>) -> FeedClient {
    FeedClient::new(config, connectivity).unwrap()
}

/// Address nothing is listening on.
fn closed_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}{}", addr, path)
}

/// Accepts connections and never answers.
async fn silent_addr() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

#[tokio::test]
async fn ok_response_returns_body() {
    let mut server = Server::new_async().await;
    let probe = server.mock("HEAD", "/probe").with_status(200).create_async().await;
    let feed = server
        .mock("GET", "/hiring.json")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(BODY)
        .create_async()
        .await;

    let config = config_for(&server);
    let bytes = client(&config, Arc::new(AssumeOnline))
        .fetch_feed(&config.feed_uri().unwrap())
        .await
        .unwrap();

    assert_eq!(bytes, BODY.as_bytes());
    probe.assert_async().await;
    feed.assert_async().await;
}

#[tokio::test]
async fn non_200_is_server_error() {
    let mut server = Server::new_async().await;
    let _probe = server.mock("HEAD", "/probe").with_status(200).create_async().await;
    let _feed = server
        .mock("GET", "/hiring.json")
        .with_status(503)
        .with_body("unavailable")
        .create_async()
        .await;

    let config = config_for(&server);
    let err = client(&config, Arc::new(AssumeOnline))
        .fetch_feed(&config.feed_uri().unwrap())
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::ServerError(503));
    assert_eq!(err.to_string(), "Server returned error code: 503");
}

#[tokio::test]
async fn offline_sends_nothing() {
    let mut server = Server::new_async().await;
    let probe = server.mock("HEAD", "/probe").expect(0).create_async().await;
    let feed = server.mock("GET", "/hiring.json").expect(0).create_async().await;

    let config = config_for(&server);
    for state in [
        NetworkState::NoActiveNetwork,
        NetworkState::Capabilities {
            has_internet: true,
            validated: false,
        },
        NetworkState::Legacy { connected: false },
    ] {
        let err = client(&config, Arc::new(FixedConnectivity(state)))
            .fetch_feed(&config.feed_uri().unwrap())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::NoConnectivity);
    }

    probe.assert_async().await;
    feed.assert_async().await;
}

#[tokio::test]
async fn unreachable_probe_skips_request() {
    let mut server = Server::new_async().await;
    let feed = server.mock("GET", "/hiring.json").expect(0).create_async().await;

    let config = Config {
        probe_url: closed_url("/"),
        ..config_for(&server)
    };
    let err = client(&config, Arc::new(AssumeOnline))
        .fetch_feed(&config.feed_uri().unwrap())
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::ProbeFailed);
    assert_eq!(err.to_string(), "Connection error");
    feed.assert_async().await;
}

#[tokio::test]
async fn silent_probe_target_is_probe_failure() {
    let mut server = Server::new_async().await;
    let feed = server.mock("GET", "/hiring.json").expect(0).create_async().await;

    let addr = silent_addr().await;
    let config = Config {
        probe_url: format!("http://{}/", addr),
        probe_connect_timeout_secs: 1,
        probe_read_timeout_secs: 1,
        ..config_for(&server)
    };
    let err = client(&config, Arc::new(AssumeOnline))
        .fetch_feed(&config.feed_uri().unwrap())
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::ProbeFailed);
    assert_eq!(err.detail(), "Please check your network settings");
    feed.assert_async().await;
}

#[tokio::test]
async fn probe_accepts_any_status() {
    let mut server = Server::new_async().await;
    let _probe = server.mock("HEAD", "/probe").with_status(404).create_async().await;
    let _feed = server
        .mock("GET", "/hiring.json")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let config = config_for(&server);
    let bytes = client(&config, Arc::new(AssumeOnline))
        .fetch_feed(&config.feed_uri().unwrap())
        .await
        .unwrap();
    assert_eq!(bytes, b"[]");
}

#[tokio::test]
async fn refused_feed_is_connection_error() {
    let mut server = Server::new_async().await;
    let _probe = server.mock("HEAD", "/probe").with_status(200).create_async().await;

    let config = config_for(&server);
    let feed: Uri = closed_url("/hiring.json").parse().unwrap();
    let err = client(&config, Arc::new(AssumeOnline))
        .fetch_feed(&feed)
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::ConnectionError);
}

#[tokio::test]
async fn silent_server_times_out() {
    let mut server = Server::new_async().await;
    let _probe = server.mock("HEAD", "/probe").with_status(200).create_async().await;

    let addr = silent_addr().await;
    let config = Config {
        connect_timeout_secs: 1,
        read_timeout_secs: 1,
        ..config_for(&server)
    };
    let feed: Uri = format!("http://{}/hiring.json", addr).parse().unwrap();
    let err = client(&config, Arc::new(AssumeOnline))
        .fetch_feed(&feed)
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::Timeout);
    assert_eq!(err.detail(), "Request took too long");
}

#[tokio::test]
async fn stalled_body_times_out() {
    let mut server = Server::new_async().await;
    let _probe = server.mock("HEAD", "/probe").with_status(200).create_async().await;

    // Sends the response head and part of the body, then stalls.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n[{\"id\":1";
            let _ = socket.write_all(head.as_bytes()).await;
            held.push(socket);
        }
    });

    let config = Config {
        read_timeout_secs: 1,
        ..config_for(&server)
    };
    let feed: Uri = format!("http://{}/hiring.json", addr).parse().unwrap();
    let err = client(&config, Arc::new(AssumeOnline))
        .fetch_feed(&feed)
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::Timeout);
}

#[tokio::test]
async fn redirects_are_followed() {
    let mut server = Server::new_async().await;
    let _probe = server.mock("HEAD", "/probe").with_status(200).create_async().await;
    let moved = server
        .mock("GET", "/old.json")
        .with_status(302)
        .with_header("location", "/hiring.json")
        .create_async()
        .await;
    let feed = server
        .mock("GET", "/hiring.json")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_body(BODY)
        .create_async()
        .await;

    let config = config_for(&server);
    let old: Uri = format!("{}/old.json", server.url()).parse().unwrap();
    let bytes = client(&config, Arc::new(AssumeOnline))
        .fetch_feed(&old)
        .await
        .unwrap();

    assert_eq!(bytes, BODY.as_bytes());
    moved.assert_async().await;
    feed.assert_async().await;
}
