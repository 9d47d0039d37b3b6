//! End-to-end scenarios: axum router -> pipelines -> mock WHOIS servers on
//! loopback TCP.
#![cfg(feature = "server")]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use tower::ServiceExt;
use whois_engine::{
    catalog::{Catalog, ServerEntry},
    dns::{DnsAddress, DnsAnswer, DnsLookup},
    http::{router, AppState},
    record::DomainInfo,
    Config, DomainParser, ParserRegistry, SuffixResolver, WhoisClient, WhoisError, WhoisService,
};

struct MockServer {
    addr: String,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    /// Replies `body` to every connection, then closes it.
    async fn replying(body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let queries = Arc::new(Mutex::new(Vec::new()));
        let seen = queries.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 1024];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                seen.lock().unwrap().push(String::from_utf8_lossy(&buf[..n]).to_string());
                let _ = socket.write_all(body.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { addr, queries }
    }

    /// Accepts connections and never answers.
    async fn silent() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        Self { addr, queries: Arc::new(Mutex::new(Vec::new())) }
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

struct Exploding;

impl DomainParser for Exploding {
    fn name(&self) -> &str {
        "exploding"
    }

    fn parse(&self, _raw: &str) -> Result<DomainInfo, WhoisError> {
        panic!("unexpected token in registry output")
    }
}

struct StaticDns;

#[async_trait]
impl DnsLookup for StaticDns {
    async fn resolve(&self, _host: &str) -> DnsAnswer {
        DnsAnswer {
            a: vec![DnsAddress { address: "185.199.108.153".to_string(), ttl: 3600 }],
            aaaa: vec![],
            errors: vec![],
        }
    }
}

struct Setup {
    catalog: Vec<(&'static str, String)>,
    config: Config,
    parsers: ParserRegistry,
    rir_servers: HashMap<String, String>,
}

impl Setup {
    fn new() -> Self {
        Self {
            catalog: Vec::new(),
            config: Config::default(),
            parsers: ParserRegistry::new(),
            rir_servers: HashMap::new(),
        }
    }

    fn suffix(mut self, suffix: &'static str, server: &str) -> Self {
        self.catalog.push((suffix, server.to_string()));
        self
    }

    fn app(self) -> Router {
        let catalog = Catalog::from_map(
            self.catalog
                .into_iter()
                .map(|(suffix, server)| (suffix.to_string(), vec![ServerEntry::new(server)]))
                .collect(),
        );
        let config = Arc::new(self.config);
        let service = WhoisService::new(config.clone(), Arc::new(catalog))
            .with_parsers(Arc::new(self.parsers))
            .with_rir_servers(self.rir_servers);
        let client = WhoisClient::with_parts(service, Arc::new(SuffixResolver::embedded().unwrap()));
        router(AppState::new(client, config).with_dns(Arc::new(StaticDns)))
    }
}

async fn post_whois(app: Router, body: Value) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri("/whois")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

const GITHUB_IO: &str = "Domain Name: github.io
Registry Domain ID: D503300000040403495-LRMS
Registrar: GitHub
Creation Date: 2013-03-14
Name Server: dns1.p05.nsone.net
";

#[tokio::test]
async fn test_happy_path_catalog_hit() {
    let nic_io = MockServer::replying(GITHUB_IO).await;
    let app = Setup::new().suffix("io", &nic_io.addr).app();

    let (status, body) = post_whois(app, serde_json::json!({"query": "github.io"})).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["type"], "domain");
    assert_eq!(json["whois"]["is_available"], false);
    assert_eq!(json["whois"]["parsed"]["registrar"]["name"], "GitHub");
    assert_eq!(json["whois"]["parsed"]["created_date"], "2013-03-14T00:00:00+00:00");
    assert_eq!(json["whois"]["raw_text"], GITHUB_IO);
    assert_eq!(json["notes"]["public_suffixs"], serde_json::json!(["github.io"]));
    assert!(json["notes"].get("error").is_none());
    assert!(json.get("dns").is_none());
    assert_eq!(nic_io.queries(), vec!["github.io\r\n"]);
}

#[tokio::test]
async fn test_not_found_body() {
    let nic_app = MockServer::replying("No match for abc.app\n").await;
    let app = Setup::new().suffix("app", &nic_app.addr).app();

    let (status, body) = post_whois(app, serde_json::json!({"query": "abc.app"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["whois"]["is_available"], true);
    assert_eq!(json["whois"]["raw_text"], "No match for abc.app\n");
    assert!(json["notes"].get("error").is_none());
}

#[tokio::test]
async fn test_unknown_tld() {
    let app = Setup::new().app();
    let (status, body) = post_whois(app, serde_json::json!({"query": "unknown.abcde"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "unknown whois server\n");
}

#[tokio::test]
async fn test_timeout() {
    let silent = MockServer::silent().await;
    let mut setup = Setup::new().suffix("io", &silent.addr);
    setup.config.query_timeout_seconds = 1;

    let (status, body) = post_whois(setup.app(), serde_json::json!({"query": "github.io"})).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body, "timeout\n");
}

#[tokio::test]
async fn test_parser_panic_is_parse_error() {
    let server = MockServer::replying(GITHUB_IO).await;
    let mut setup = Setup::new().suffix("io", &server.addr);
    setup.parsers.register("127.0.0.1", Arc::new(Exploding));

    let (status, body) = post_whois(setup.app(), serde_json::json!({"query": "github.io"})).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    let error = json["notes"]["error"].as_str().unwrap();
    assert!(error.starts_with("parse error:"), "{error}");
    assert!(json["whois"]["parsed"].is_null());
    assert!(json["whois"]["is_available"].is_null());
    assert_eq!(json["whois"]["raw_text"], GITHUB_IO);
    assert_eq!(json["whois"]["whois_server"], "127.0.0.1");
}

#[tokio::test]
async fn test_ip_arin_referral() {
    const RIR_BODY: &str = "inetnum:        193.0.0.0 - 193.0.7.255\nnetname:        RIPE-NCC\ncountry:        NL\n";
    let arin = MockServer::replying("NetRange: 193.0.0.0 - 193.0.63.255\nOrgName: RIPE Network Coordination Centre\nOrgId: test\n").await;
    let rir = MockServer::replying(RIR_BODY).await;

    let mut setup = Setup::new();
    setup.config.arin_server = arin.addr.clone();
    setup.rir_servers.insert("test".to_string(), rir.addr.clone());

    let (status, body) = post_whois(setup.app(), serde_json::json!({"query": "193.0.6.139"})).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["type"], "ip");
    assert_eq!(json["whois"]["raw_text"], RIR_BODY);
    assert_eq!(json["whois"]["whois_server"], "127.0.0.1");
    assert_eq!(json["whois"]["parsed"]["networks"][0]["netname"], "RIPE-NCC");
    assert_eq!(json["whois"]["parsed"]["networks"][0]["range"]["end"], "193.0.7.255");
    assert!(json["notes"].get("public_suffixs").is_none());
    assert_eq!(arin.queries(), vec!["n 193.0.6.139\r\n"]);
    assert_eq!(rir.queries(), vec!["193.0.6.139\r\n"]);
}

#[tokio::test]
async fn test_ip_arin_org_name_without_org_id() {
    const ARIN_BODY: &str = "NetRange: 23.0.0.0 - 23.0.0.255\nNetName: SMALL-NET\nOrgName: Small Direct LLC\n";
    let arin = MockServer::replying(ARIN_BODY).await;
    let rir = MockServer::replying("inetnum: 0.0.0.0 - 255.255.255.255\n").await;

    let mut setup = Setup::new();
    setup.config.arin_server = arin.addr.clone();
    setup.rir_servers.insert("Small Direct LLC".to_string(), rir.addr.clone());

    let (status, body) = post_whois(setup.app(), serde_json::json!({"query": "23.0.0.1"})).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["whois"]["raw_text"], ARIN_BODY);
    assert_eq!(json["whois"]["whois_server"], "127.0.0.1");
    assert!(rir.queries().is_empty());
}

#[tokio::test]
async fn test_explicit_server_and_dns_attachment() {
    let server = MockServer::replying(GITHUB_IO).await;
    let app = Setup::new().app();

    let request = serde_json::json!({"query": "github.io", "ip": true, "whois_server": server.addr});
    let (status, body) = post_whois(app, request).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["whois"]["whois_server"], "127.0.0.1");
    assert_eq!(json["dns"]["a"][0]["address"], "185.199.108.153");
    assert_eq!(json["dns"]["a"][0]["ttl"], 3600);
}

#[tokio::test]
async fn test_bad_input() {
    let (status, body) = post_whois(Setup::new().app(), serde_json::json!({"query": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "invalid query: empty query\n");

    let (status, body) = post_whois(Setup::new().app(), serde_json::json!({"query": "com"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("public suffix:"), "{body}");
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = Setup::new().app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_silent_server_keeps_deadline_short() {
    let silent = MockServer::silent().await;
    let mut setup = Setup::new().suffix("io", &silent.addr);
    setup.config.query_timeout_seconds = 1;

    let started = std::time::Instant::now();
    let (status, _) = post_whois(setup.app(), serde_json::json!({"query": "github.io"})).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert!(started.elapsed() < Duration::from_secs(5));
}
