//! Front-end input handling: decides whether a query is an address or a
//! host name and derives the public-suffix candidates for host names.

use crate::{errors::WhoisError, suffix::SuffixResolver};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use url::{Host, Url};

/// Request body of `POST /whois`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryInput {
    pub query: String,
    /// Attach A/AAAA records to a domain answer.
    #[serde(default)]
    pub ip: bool,
    #[serde(default)]
    pub whois_server: String,
}

impl QueryInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Self::default() }
    }

    /// Explicit server override, `None` when blank.
    pub fn whois_server(&self) -> Option<&str> {
        Some(self.whois_server.trim()).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Domain { host: String, public_suffixes: Vec<String> },
    Ip(IpAddr),
}

/// Classifies a raw query. Failures here are bad input and never reach a pipeline.
pub fn classify(query: &str, suffixes: &SuffixResolver) -> Result<Target, WhoisError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(WhoisError::InvalidQuery("empty query".to_string()));
    }

    if let Ok(ip) = query.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>() {
        return Ok(Target::Ip(ip));
    }

    // Tolerate pasted URLs: "https://example.com/path"
    let host_text = match Url::parse(query) {
        Ok(url) if url.has_host() && query.contains("://") => url.host_str().unwrap_or(query).to_string(),
        _ => query.trim_end_matches('.').to_string(),
    };

    let host = match Host::parse(&host_text) {
        Ok(Host::Domain(domain)) => domain.to_lowercase(),
        Ok(Host::Ipv4(ip)) => return Ok(Target::Ip(IpAddr::V4(ip))),
        Ok(Host::Ipv6(ip)) => return Ok(Target::Ip(IpAddr::V6(ip))),
        Err(e) => return Err(WhoisError::InvalidQuery(format!("{}: {}", query, e))),
    };
    if host.chars().any(|c| c.is_whitespace() || c == '/' || c == '@') {
        return Err(WhoisError::InvalidQuery(query.to_string()));
    }

    let public_suffixes = suffixes.public_suffixes(&host)?;
    Ok(Target::Domain { host, public_suffixes })
}
