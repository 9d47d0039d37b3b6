//! Public suffix → WHOIS server catalog, loaded from the server-list XML.

use crate::errors::WhoisError;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use url::Url;

const EMBEDDED_SERVER_LIST: &str = include_str!("../data/whois-server-list.xml");

#[derive(Debug, Clone)]
pub struct ServerEntry {
    pub host: String,
    pub avail_pattern: Option<Regex>,
}

impl ServerEntry {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into(), avail_pattern: None }
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.avail_pattern = Some(pattern);
        self
    }

    /// `Some(true)` only when a pattern exists and matches the body.
    pub fn avail_hint(&self, body: &str) -> Option<bool> {
        match &self.avail_pattern {
            Some(re) if re.is_match(body) => Some(true),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DomainList {
    #[serde(rename = "domain", default)]
    domains: Vec<DomainNode>,
}

#[derive(Debug, Deserialize)]
struct DomainNode {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "whoisServer", default)]
    servers: Vec<ServerNode>,
    #[serde(rename = "domain", default)]
    domains: Vec<DomainNode>,
}

#[derive(Debug, Deserialize)]
struct ServerNode {
    #[serde(rename = "@host")]
    host: String,
    #[serde(rename = "availablePattern", default)]
    available_pattern: Option<String>,
}

/// Read-only after construction; shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct Catalog {
    servers: HashMap<String, Vec<ServerEntry>>,
}

impl Catalog {
    pub fn from_map(servers: HashMap<String, Vec<ServerEntry>>) -> Self {
        let servers = servers
            .into_iter()
            .map(|(suffix, entries)| (suffix.to_lowercase(), entries))
            .collect();
        Self { servers }
    }

    pub fn from_xml(xml: &str) -> Result<Self, WhoisError> {
        let list: DomainList = quick_xml::de::from_str(xml)?;
        let mut servers = HashMap::new();
        let mut stack: Vec<DomainNode> = list.domains;

        while let Some(node) = stack.pop() {
            let suffix = node.name.trim().trim_matches('.').to_lowercase();
            let entries: Vec<ServerEntry> = node
                .servers
                .into_iter()
                .filter(|s| !s.host.trim().is_empty())
                .map(|s| ServerEntry {
                    host: s.host.trim().to_lowercase(),
                    avail_pattern: s.available_pattern.as_deref().and_then(|p| compile_pattern(&suffix, p)),
                })
                .collect();
            if !suffix.is_empty() && !entries.is_empty() {
                servers.insert(suffix, entries);
            }
            stack.extend(node.domains);
        }

        Ok(Self { servers })
    }

    pub fn embedded() -> Result<Self, WhoisError> {
        Self::from_xml(EMBEDDED_SERVER_LIST)
    }

    /// Loads from a path or http(s) URL; an empty source selects the embedded list.
    pub async fn load(source: &str) -> Result<Self, WhoisError> {
        let source = source.trim();
        let catalog = if source.is_empty() {
            Self::embedded()?
        } else {
            Self::from_xml(&read_source(source).await?)?
        };
        info!("Server catalog loaded with {} suffixes", catalog.len());
        Ok(catalog)
    }

    pub fn get(&self, suffix: &str) -> Option<&[ServerEntry]> {
        self.servers.get(&suffix.to_lowercase()).map(Vec::as_slice)
    }

    /// Longest catalog suffix strictly inside `candidate`, with its servers.
    pub fn resolve(&self, candidate: &str) -> Option<(&str, &[ServerEntry])> {
        let candidate = candidate.trim_end_matches('.').to_lowercase();
        let labels: Vec<&str> = candidate.split('.').collect();
        for start in 1..labels.len() {
            let tail = labels[start..].join(".");
            if let Some((suffix, entries)) = self.servers.get_key_value(&tail) {
                return Some((suffix.as_str(), entries.as_slice()));
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

fn compile_pattern(suffix: &str, pattern: &str) -> Option<Regex> {
    match Regex::new(&translate_java_quotes(pattern)) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(suffix = %suffix, pattern = %pattern, "Dropping unusable availability pattern: {}", e);
            None
        }
    }
}

/// Rewrites Java `\Q...\E` literal spans into escaped regex text.
fn translate_java_quotes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find("\\Q") {
        out.push_str(&rest[..start]);
        let quoted = &rest[start + 2..];
        match quoted.find("\\E") {
            Some(end) => {
                out.push_str(&regex::escape(&quoted[..end]));
                rest = &quoted[end + 2..];
            }
            None => {
                out.push_str(&regex::escape(quoted));
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Reads a file path or downloads an http(s) URL.
pub(crate) async fn read_source(source: &str) -> Result<String, WhoisError> {
    match Url::parse(source) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            debug!("Downloading {}", url);
            let response = reqwest::get(url).await?.error_for_status()?;
            Ok(response.text().await?)
        }
        _ => tokio::fs::read_to_string(source)
            .await
            .map_err(|e| WhoisError::Catalog(format!("cannot read {}: {}", source, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<domainList version="1.0">
  <domain name="io">
    <source>IANA</source>
    <whoisServer host="whois.nic.io">
      <source>IANA</source>
      <availablePattern>\QNOT FOUND\E</availablePattern>
    </whoisServer>
  </domain>
  <domain name="uk">
    <whoisServer host="whois.nic.uk"/>
    <domain name="co.uk">
      <whoisServer host="whois.nic.uk"/>
      <whoisServer host="whois.backup.uk"/>
    </domain>
  </domain>
  <domain name="bad">
    <whoisServer host="whois.nic.bad">
      <availablePattern>(unclosed</availablePattern>
    </whoisServer>
  </domain>
  <domain name="empty"/>
</domainList>"#;

    #[test]
    fn test_nested_domains_flattened_in_order() {
        let catalog = Catalog::from_xml(SAMPLE).unwrap();
        let hosts: Vec<&str> = catalog.get("co.uk").unwrap().iter().map(|s| s.host.as_str()).collect();
        assert_eq!(hosts, vec!["whois.nic.uk", "whois.backup.uk"]);
        assert_eq!(catalog.get("uk").unwrap().len(), 1);
        assert!(catalog.get("empty").is_none());
    }

    #[test]
    fn test_java_quoted_pattern() {
        let catalog = Catalog::from_xml(SAMPLE).unwrap();
        let io = &catalog.get("io").unwrap()[0];
        assert_eq!(io.avail_hint("Domain NOT FOUND."), Some(true));
        assert_eq!(io.avail_hint("Domain Name: github.io"), None);
        assert_eq!(translate_java_quotes(r"\Qa.b\E+x"), r"a\.b+x");
    }

    #[test]
    fn test_bad_pattern_keeps_server() {
        let catalog = Catalog::from_xml(SAMPLE).unwrap();
        let bad = &catalog.get("bad").unwrap()[0];
        assert_eq!(bad.host, "whois.nic.bad");
        assert!(bad.avail_pattern.is_none());
    }

    #[test]
    fn test_resolve_longest_inner_suffix() {
        let catalog = Catalog::from_xml(SAMPLE).unwrap();
        assert_eq!(catalog.resolve("github.io").unwrap().0, "io");
        assert_eq!(catalog.resolve("foo.co.uk").unwrap().0, "co.uk");
        assert_eq!(catalog.resolve("co.uk").unwrap().0, "uk");
        assert!(catalog.resolve("unknown.abcde").is_none());
    }

    #[test]
    fn test_embedded_list_loads() {
        let catalog = Catalog::embedded().unwrap();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.get("com").unwrap()[0].host, "whois.verisign-grs.com");
        assert!(catalog.get("example").is_none());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let catalog = Catalog::load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(catalog.get("io").unwrap()[0].host, "whois.nic.io");
    }
}
