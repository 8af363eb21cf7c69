use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;

use msgdrop::config::{Config, RelayConfig, StoreConfig, MAX_UDP_PAYLOAD};
use msgdrop::message::Submission;
use msgdrop::store::{MessageLog, Store};

/// A running relay (and usually a store) rooted in a scratch directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub log: MessageLog,
    pub dir: TempDir,
    _shutdown: watch::Sender<bool>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a raw form body, the way a browser sends it.
    pub async fn submit(&self, path: &str, body: &str) -> Response {
        self.client
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("submit request failed")
    }

    pub async fn entries(&self) -> Vec<(String, Submission)> {
        self.log.entries().await.expect("failed to read message log")
    }

    /// Send a raw HTTP/1.1 request and return the whole response text.
    pub async fn raw_request(&self, request: &str) -> String {
        let mut stream = TcpStream::connect(self.addr)
            .await
            .expect("failed to connect");
        stream
            .write_all(request.as_bytes())
            .await
            .expect("failed to write request");

        let mut response = Vec::new();
        stream
            .read_to_end(&mut response)
            .await
            .expect("failed to read response");
        String::from_utf8_lossy(&response).into_owned()
    }
}

pub fn test_config(dir: &Path, store_addr: SocketAddr) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        web_root: dir.join("site"),
        max_body_size: MAX_UDP_PAYLOAD,
        log_level: "warn".to_string(),
        relay: RelayConfig {
            store_addr,
            timeout: Duration::from_secs(2),
            reply_buffer: 1024,
        },
        store: StoreConfig {
            bind_addr: store_addr,
            log_path: dir.join("storage").join("data.json"),
            max_datagram: 65_535,
        },
    }
}

fn scratch_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let site = dir.path().join("site");
    std::fs::create_dir_all(site.join("static")).unwrap();
    std::fs::write(site.join("static").join("style.css"), "body { margin: 0; }").unwrap();
    std::fs::write(site.join("hello.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("secret.txt"), "outside the web root").unwrap();
    dir
}

async fn serve(config: Config) -> SocketAddr {
    let app = msgdrop::build_app(config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    addr
}

fn client() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Spawn a store and a relay wired to it.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Like [`spawn_app`], with a chance to adjust the config first.
pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = scratch_dir();
    let mut config = test_config(dir.path(), "127.0.0.1:0".parse().unwrap());
    configure(&mut config);

    let store = Store::bind(&config.store)
        .await
        .expect("Failed to bind store");
    config.relay.store_addr = store.local_addr().unwrap();
    let log = store.log().clone();

    let (shutdown, shutdown_rx) = watch::channel(false);
    msgdrop::spawn_store(store, shutdown_rx);

    let addr = serve(config).await;

    TestApp {
        addr,
        client: client(),
        log,
        dir,
        _shutdown: shutdown,
    }
}

/// Spawn only a relay, pointed at `store_addr` (usually a fake store).
#[allow(dead_code)]
pub async fn spawn_relay(store_addr: SocketAddr, timeout: Duration) -> TestApp {
    let dir = scratch_dir();
    let mut config = test_config(dir.path(), store_addr);
    config.relay.timeout = timeout;
    let log = MessageLog::new(&config.store.log_path);

    let (shutdown, _) = watch::channel(false);
    let addr = serve(config).await;

    TestApp {
        addr,
        client: client(),
        log,
        dir,
        _shutdown: shutdown,
    }
}
