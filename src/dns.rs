//! A/AAAA attachment for domain answers.

use async_trait::async_trait;
use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
    TokioAsyncResolver,
};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DnsAddress {
    pub address: String,
    pub ttl: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DnsAnswer {
    pub a: Vec<DnsAddress>,
    pub aaaa: Vec<DnsAddress>,
    /// Lookup failures, for logs and metrics only.
    #[serde(skip)]
    pub errors: Vec<String>,
}

#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn resolve(&self, host: &str) -> DnsAnswer;
}

pub struct HickoryDns {
    resolver: TokioAsyncResolver,
}

impl HickoryDns {
    pub fn new(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 2;
        opts.use_hosts_file = false;
        Self { resolver: TokioAsyncResolver::tokio(ResolverConfig::google(), opts) }
    }
}

/// An empty answer is not a failure.
fn lookup_failure(kind: &str, host: &str, e: ResolveError) -> Option<String> {
    if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
        debug!(query = %host, "no {} records", kind);
        return None;
    }
    warn!(query = %host, "{} lookup failed: {}", kind, e);
    Some(format!("{} lookup failed: {}", kind, e))
}

#[async_trait]
impl DnsLookup for HickoryDns {
    async fn resolve(&self, host: &str) -> DnsAnswer {
        let (v4, v6) = tokio::join!(self.resolver.ipv4_lookup(host), self.resolver.ipv6_lookup(host));
        let mut answer = DnsAnswer::default();

        match v4 {
            Ok(response) => {
                let ttl = response.as_lookup().record_iter().next().map(|r| r.ttl()).unwrap_or(0);
                answer.a = response
                    .iter()
                    .map(|addr| DnsAddress { address: addr.to_string(), ttl })
                    .collect();
            }
            Err(e) => answer.errors.extend(lookup_failure("A", host, e)),
        }

        match v6 {
            Ok(response) => {
                let ttl = response.as_lookup().record_iter().next().map(|r| r.ttl()).unwrap_or(0);
                answer.aaaa = response
                    .iter()
                    .map(|addr| DnsAddress { address: addr.to_string(), ttl })
                    .collect();
            }
            Err(e) => answer.errors.extend(lookup_failure("AAAA", host, e)),
        }

        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_serialization_hides_errors() {
        let answer = DnsAnswer {
            a: vec![DnsAddress { address: "192.0.2.1".to_string(), ttl: 300 }],
            aaaa: vec![],
            errors: vec!["AAAA lookup failed: timeout".to_string()],
        };
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json, serde_json::json!({"a": [{"address": "192.0.2.1", "ttl": 300}], "aaaa": []}));
    }
}
