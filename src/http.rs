//! JSON front-end over the pipelines.

use crate::{
    config::Config,
    dns::{DnsAnswer, DnsLookup, HickoryDns},
    errors::WhoisError,
    facade::{spawn_domain_query, spawn_ip_query, RespType, Status},
    metrics,
    parser::date,
    query::{self, QueryInput, Target},
    WhoisClient, WhoisRecord,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::{sync::Arc, time::Instant};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    client: WhoisClient,
    dns: Arc<dyn DnsLookup>,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(client: WhoisClient, config: Arc<Config>) -> Self {
        let dns = Arc::new(HickoryDns::new(config.dns_timeout()));
        Self { client, dns, config }
    }

    pub fn with_dns(mut self, dns: Arc<dyn DnsLookup>) -> Self {
        self.dns = dns;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Domain,
    Ip,
}

#[derive(Debug, Serialize)]
pub struct Notes {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_suffixs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub queried_date: String,
}

#[derive(Debug, Serialize)]
pub struct WhoisResponse {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub whois: WhoisRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsAnswer>,
    pub notes: Notes,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/whois", post(whois_lookup))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}

async fn whois_lookup(State(state): State<AppState>, Json(input): Json<QueryInput>) -> Response {
    let started = Instant::now();
    let queried_date = date::format_canonical(&Utc::now());
    let whois_server = input.whois_server().map(str::to_string);
    let service = state.client.service().clone();

    let target = match query::classify(&input.query, state.client.suffixes()) {
        Ok(target) => target,
        Err(e) => {
            warn!(query = %input.query, "Rejected query: {}", e);
            metrics::increment_errors(e.kind());
            return e.into_response();
        }
    };

    let response = match target {
        Target::Ip(ip) => {
            metrics::increment_requests("ip");
            let status = Status::ip(ip.to_string(), whois_server);
            let (status, record) = spawn_ip_query(service, status).finish().await;
            let notes = Notes {
                query: input.query.trim().to_string(),
                public_suffixs: None,
                error: None,
                queried_date,
            };
            respond(QueryType::Ip, status, record.map(WhoisRecord::Ip), None, notes)
        }
        Target::Domain { host, public_suffixes } => {
            metrics::increment_requests("domain");
            let pending = spawn_domain_query(service, Status::domain(host.clone(), public_suffixes, whois_server));
            let dns = async {
                if input.ip {
                    Some(state.dns.resolve(&host).await)
                } else {
                    None
                }
            };
            let ((status, record), dns) = tokio::join!(pending.finish(), dns);

            if let Some(answer) = &dns {
                if !answer.errors.is_empty() {
                    warn!(query = %host, errors = ?answer.errors, "DNS attachment incomplete");
                    metrics::increment_dns_errors(answer.errors.len());
                }
            }

            let notes = Notes {
                query: input.query.trim().to_string(),
                public_suffixs: Some(status.public_suffixes.clone()),
                error: None,
                queried_date,
            };
            respond(QueryType::Domain, status, record.map(WhoisRecord::Domain), dns, notes)
        }
    };

    metrics::record_query_time(started.elapsed());
    response
}

/// Maps a finished query onto the HTTP contract.
fn respond(
    query_type: QueryType,
    status: Status,
    record: Option<WhoisRecord>,
    dns: Option<DnsAnswer>,
    mut notes: Notes,
) -> Response {
    let resp_type = status.outcome();
    info!(
        query = %notes.query,
        resp_type = %resp_type,
        whois_server = status.whois_server.as_deref().unwrap_or("-"),
        "whois query finished"
    );
    metrics::increment_responses(resp_type.as_str());

    match (resp_type, record) {
        (RespType::Found | RespType::NotFound | RespType::ParseError, Some(whois)) => {
            if let Some(error @ WhoisError::ParseError(_)) = &status.error {
                notes.error = Some(error.to_string());
            }
            let code = if resp_type == RespType::NotFound {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::OK
            };
            let body = WhoisResponse { query_type, whois, dns, notes };
            (code, Json(body)).into_response()
        }
        _ => {
            let error = status
                .error
                .unwrap_or_else(|| WhoisError::Internal("query finished without a record".to_string()));
            metrics::increment_errors(error.kind());
            error.into_response()
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.config.start_time.elapsed().as_secs(),
    })
}
