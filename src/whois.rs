use crate::{
    availability,
    catalog::{Catalog, ServerEntry},
    config::Config,
    errors::WhoisError,
    parser::ParserRegistry,
    record::{DomainRecord, IpRecord, Outcome, RawResponse},
    transport::{destination, host_only, TcpTransport, Transport},
};
use std::{collections::HashMap, future::Future, sync::Arc};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// RIR handle (as printed in ARIN's `OrgId:` line) to that RIR's WHOIS server.
pub fn default_rir_servers() -> HashMap<String, String> {
    [
        ("APNIC", "whois.apnic.net"),
        ("ARIN", "whois.arin.net"),
        ("RIPE", "whois.ripe.net"),
        ("LACNIC", "whois.lacnic.net"),
        ("AFRINIC", "whois.afrinic.net"),
    ]
    .into_iter()
    .map(|(org, server)| (org.to_string(), server.to_string()))
    .collect()
}

#[derive(Clone)]
pub struct WhoisService {
    config: Arc<Config>,
    catalog: Arc<Catalog>,
    parsers: Arc<ParserRegistry>,
    transport: Arc<dyn Transport>,
    rir_servers: Arc<HashMap<String, String>>,
}

impl WhoisService {
    pub fn new(config: Arc<Config>, catalog: Arc<Catalog>) -> Self {
        let transport = Arc::new(TcpTransport::new(&config));
        info!(
            "WhoisService initialized: {} catalog suffixes, ARIN server {}",
            catalog.len(),
            config.arin_server
        );
        Self {
            config,
            catalog,
            parsers: Arc::new(ParserRegistry::new()),
            transport,
            rir_servers: Arc::new(default_rir_servers()),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_parsers(mut self, parsers: Arc<ParserRegistry>) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_rir_servers(mut self, rir_servers: HashMap<String, String>) -> Self {
        self.rir_servers = Arc::new(rir_servers);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Walks `public_suffixes` most specific first and returns the first
    /// answer. `whois_server` bypasses the catalog.
    pub async fn query_domain(
        &self,
        public_suffixes: &[String],
        whois_server: Option<&str>,
    ) -> Result<Outcome<DomainRecord>, WhoisError> {
        self.with_deadline(self.walk_suffixes(public_suffixes, whois_server)).await
    }

    /// Queries ARIN and follows its `OrgId` referral to the owning RIR.
    /// `whois_server` skips the referral hop.
    pub async fn query_ip(&self, ip: &str, whois_server: Option<&str>) -> Result<Outcome<IpRecord>, WhoisError> {
        self.with_deadline(self.lookup_ip(ip, whois_server)).await
    }

    async fn with_deadline<T>(
        &self,
        pipeline: impl Future<Output = Result<T, WhoisError>>,
    ) -> Result<T, WhoisError> {
        match timeout(self.config.query_timeout(), pipeline).await {
            Ok(result) => result.map_err(WhoisError::normalize),
            Err(_) => {
                warn!("Query exceeded {}s deadline", self.config.query_timeout_seconds);
                Err(WhoisError::Timeout)
            }
        }
    }

    async fn walk_suffixes(
        &self,
        public_suffixes: &[String],
        whois_server: Option<&str>,
    ) -> Result<Outcome<DomainRecord>, WhoisError> {
        let explicit = whois_server.map(|server| [ServerEntry::new(server)]);
        let mut last_error = None;

        for suffix in public_suffixes {
            let servers: &[ServerEntry] = match &explicit {
                Some(servers) => servers.as_slice(),
                None => match self.catalog.resolve(suffix) {
                    Some((catalog_suffix, servers)) => {
                        debug!(suffix = %suffix, catalog_suffix = %catalog_suffix, "catalog hit");
                        servers
                    }
                    None => {
                        warn!(suffix = %suffix, "No whois server in catalog");
                        return Err(WhoisError::UnknownWhoisServer);
                    }
                },
            };

            for server in servers {
                let target = destination(&server.host, self.config.whois_port);
                match self.transport.fetch(&target, suffix).await {
                    Ok(body) => {
                        debug!(suffix = %suffix, server = %server.host, bytes = body.len(), "whois answer");
                        return self.finish_domain(RawResponse {
                            avail: server.avail_hint(&body),
                            server: host_only(&server.host),
                            rawtext: body,
                        });
                    }
                    Err(e) => {
                        warn!(suffix = %suffix, server = %server.host, "whois query failed: {}", e);
                        last_error = Some(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or(WhoisError::UnknownWhoisServer))
    }

    fn finish_domain(&self, raw: RawResponse) -> Result<Outcome<DomainRecord>, WhoisError> {
        let mut outcome = self.parsers.parse_domain(&raw.server, &raw.rawtext)?;

        // No verdict without a successful parse
        if let Some(info) = outcome.record.parsed.as_ref() {
            let assessment = availability::assess(Some(info), raw.avail, &raw.rawtext);
            debug!(server = %raw.server, rule = ?assessment.rule, "availability decided");
            outcome.record.is_available = assessment.availability;
        }

        if availability::matches_domain_not_found(&raw.rawtext) {
            outcome.error = Some(WhoisError::NotFound);
        }
        Ok(outcome)
    }

    async fn lookup_ip(&self, ip: &str, whois_server: Option<&str>) -> Result<Outcome<IpRecord>, WhoisError> {
        let port = self.config.whois_port;
        let (server, body) = match whois_server {
            Some(server) => {
                let body = self.transport.fetch(&destination(server, port), ip).await?;
                (host_only(server), body)
            }
            None => {
                let arin = self.config.arin_server.as_str();
                let body = self.transport.fetch(&destination(arin, port), &format!("n {}", ip)).await?;
                match referral_org(&body).and_then(|org| self.rir_servers.get(org).map(|rir| (org, rir))) {
                    Some((org, rir)) => {
                        debug!(query = %ip, org = %org, server = %rir, "following ARIN referral");
                        let body = self.transport.fetch(&destination(rir, port), ip).await?;
                        (host_only(rir), body)
                    }
                    None => (host_only(arin), body),
                }
            }
        };

        let mut outcome = self.parsers.parse_ip(&server, &body)?;
        if availability::matches_ip_not_found(&body) {
            outcome.error = Some(WhoisError::NotFound);
        }
        Ok(outcome)
    }
}

/// Value of the first `OrgId:` line.
fn referral_org(body: &str) -> Option<&str> {
    body.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        let value = value.trim();
        (key.trim().eq_ignore_ascii_case("orgid") && !value.is_empty()).then_some(value)
    })
}
