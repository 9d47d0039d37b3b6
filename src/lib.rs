//! # WHOIS Engine
//!
//! Resolves domain names and IP addresses to their authoritative WHOIS data
//! over port 43.
//!
//! ## Features
//!
//! - Public-suffix candidate walk against an XML server catalog
//! - ARIN-first IP lookups that follow `OrgId` referrals to the owning RIR
//! - Registry-specific parsers selected by answering server, behind a panic barrier
//! - Deterministic availability ladder (status codes, registration data,
//!   catalog pattern, not-found keywords)
//! - Optional axum JSON service with DNS attachment and Prometheus metrics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whois_engine::{WhoisClient, WhoisRecord};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WhoisClient::new().await?;
//!     let outcome = client.lookup("github.io").await?;
//!
//!     if let WhoisRecord::Domain(record) = &outcome.record {
//!         println!("Server: {}", record.whois_server);
//!         println!("Available: {:?}", record.is_available.as_bool());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod availability;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod facade;
pub mod parser;
pub mod query;
pub mod record;
pub mod suffix;
pub mod transport;
pub mod whois;

#[cfg(feature = "server")]
pub mod dns;
#[cfg(feature = "server")]
pub mod http;
#[cfg(feature = "server")]
pub mod metrics;

// Re-export main types for easy access
pub use catalog::Catalog;
pub use config::Config;
pub use errors::WhoisError;
pub use facade::{spawn_domain_query, spawn_ip_query, PendingQuery, RespType, Status};
pub use parser::{DomainParser, ParserRegistry};
pub use query::{QueryInput, Target};
pub use record::{Availability, DomainInfo, DomainRecord, IpInfo, IpRecord, Outcome};
pub use suffix::SuffixResolver;
pub use transport::{TcpTransport, Transport};
pub use whois::WhoisService;

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Either pipeline's record.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WhoisRecord {
    Domain(DomainRecord),
    Ip(IpRecord),
}

/// High-level client: query classification plus both pipelines.
#[derive(Clone)]
pub struct WhoisClient {
    service: WhoisService,
    suffixes: Arc<SuffixResolver>,
}

impl WhoisClient {
    /// Create a new client from environment configuration
    pub async fn new() -> Result<Self, WhoisError> {
        let config = Arc::new(Config::load()?);
        Self::from_config(config).await
    }

    /// Create a new client, loading the catalog and suffix list named by `config`
    pub async fn from_config(config: Arc<Config>) -> Result<Self, WhoisError> {
        let catalog = Arc::new(Catalog::load(&config.server_list).await?);
        let suffixes = Arc::new(SuffixResolver::load(&config.public_suffix_list).await?);
        info!("WhoisClient ready");
        Ok(Self::with_parts(WhoisService::new(config, catalog), suffixes))
    }

    pub fn with_parts(service: WhoisService, suffixes: Arc<SuffixResolver>) -> Self {
        Self { service, suffixes }
    }

    pub fn service(&self) -> &WhoisService {
        &self.service
    }

    pub fn suffixes(&self) -> &SuffixResolver {
        &self.suffixes
    }

    /// Classifies `query` and runs the matching pipeline.
    pub async fn lookup(&self, query: &str) -> Result<Outcome<WhoisRecord>, WhoisError> {
        self.lookup_with_server(query, None).await
    }

    pub async fn lookup_with_server(
        &self,
        query: &str,
        whois_server: Option<&str>,
    ) -> Result<Outcome<WhoisRecord>, WhoisError> {
        match query::classify(query, &self.suffixes)? {
            Target::Ip(ip) => {
                let Outcome { record, error } = self.service.query_ip(&ip.to_string(), whois_server).await?;
                Ok(Outcome { record: WhoisRecord::Ip(record), error })
            }
            Target::Domain { public_suffixes, .. } => {
                let Outcome { record, error } = self.service.query_domain(&public_suffixes, whois_server).await?;
                Ok(Outcome { record: WhoisRecord::Domain(record), error })
            }
        }
    }
}
