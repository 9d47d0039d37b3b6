//! Registry-specific WHOIS parsers.
//!
//! Parsers are selected by the WHOIS server that answered, not by TLD: many
//! TLDs share one registry back-end and therefore one output format. Servers
//! without a specialized parser fall back to the keyword-table parser.
//!
//! Every invocation runs behind a panic barrier so malformed upstream text
//! can never take the process down; a recovered panic is reported as a
//! `parse error: ...` while the raw text and server are still returned.

pub mod date;
mod default;
mod denic;
mod eurid;
pub mod ip;
mod jprs;
mod nominet;

use crate::{
    errors::WhoisError,
    record::{Availability, DomainInfo, DomainRecord, IpRecord, Outcome},
    transport::host_only,
};
use std::{
    any::Any,
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};
use tracing::{debug, error};

pub use default::DefaultParser;
pub use denic::DenicParser;
pub use eurid::EuridParser;
pub use ip::IpParser;
pub use jprs::JprsParser;
pub use nominet::NominetParser;

/// Converts raw domain WHOIS text into the canonical record.
pub trait DomainParser: Send + Sync {
    /// Stable name used in diagnostics.
    fn name(&self) -> &str;

    fn parse(&self, raw: &str) -> Result<DomainInfo, WhoisError>;
}

pub struct ParserRegistry {
    by_server: HashMap<String, Arc<dyn DomainParser>>,
    fallback: Arc<dyn DomainParser>,
    ip: IpParser,
}

impl ParserRegistry {
    /// Creates a new parser registry with all known parsers.
    pub fn new() -> Self {
        let mut registry = Self {
            by_server: HashMap::new(),
            fallback: Arc::new(DefaultParser::new()),
            ip: IpParser::new(),
        };
        registry.register("whois.nic.uk", Arc::new(NominetParser::new()));
        registry.register("whois.denic.de", Arc::new(DenicParser::new()));
        registry.register("whois.jprs.jp", Arc::new(JprsParser::new()));
        registry.register("whois.eu", Arc::new(EuridParser::new()));
        registry
    }

    /// Installs (or replaces) the parser for one WHOIS server host. A port
    /// on `server` is ignored.
    pub fn register(&mut self, server: &str, parser: Arc<dyn DomainParser>) {
        self.by_server.insert(host_only(server).to_lowercase(), parser);
    }

    pub fn for_server(&self, server: &str) -> &dyn DomainParser {
        self.by_server
            .get(&host_only(server).to_lowercase())
            .unwrap_or(&self.fallback)
            .as_ref()
    }

    /// Parses a domain body. Parser errors propagate; parser panics become a
    /// record without `parsed` plus a `ParseError`.
    pub fn parse_domain(&self, server: &str, raw: &str) -> Result<Outcome<DomainRecord>, WhoisError> {
        let parser = self.for_server(server);
        debug!(server = %server, parser = parser.name(), "parsing domain response");

        let mut record = DomainRecord {
            parsed: None,
            raw_text: raw.to_string(),
            whois_server: server.to_string(),
            is_available: Availability::Unknown,
        };

        match catch_unwind(AssertUnwindSafe(|| parser.parse(raw))) {
            Ok(Ok(info)) => {
                record.parsed = Some(info);
                Ok(Outcome::ok(record))
            }
            Ok(Err(e)) => {
                error!(server = %server, parser = parser.name(), "parser failed: {}", e);
                Err(e)
            }
            Err(payload) => {
                let message = panic_message(payload);
                error!(server = %server, parser = parser.name(), "parser panicked: {}", message);
                Ok(Outcome { record, error: Some(WhoisError::ParseError(message)) })
            }
        }
    }

    /// Parses an IP body behind the same barrier.
    pub fn parse_ip(&self, server: &str, raw: &str) -> Result<Outcome<IpRecord>, WhoisError> {
        let mut record = IpRecord {
            parsed: None,
            raw_text: raw.to_string(),
            whois_server: server.to_string(),
        };

        match catch_unwind(AssertUnwindSafe(|| self.ip.parse(raw))) {
            Ok(info) => {
                record.parsed = Some(info);
                Ok(Outcome::ok(record))
            }
            Err(payload) => {
                let message = panic_message(payload);
                error!(server = %server, parser = "ip", "parser panicked: {}", message);
                Ok(Outcome { record, error: Some(WhoisError::ParseError(message)) })
            }
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Checks if a value is a privacy/redaction placeholder.
pub(crate) fn is_redacted(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower.contains("redacted")
        || lower.contains("select request")
        || lower.contains("data protected")
        || lower.contains("not disclosed")
        || lower.contains("withheld")
        || lower == "n/a"
        || lower == "none"
        || value.is_empty()
}
