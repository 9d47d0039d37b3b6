//! Canonical records produced by the pipelines.

use crate::errors::WhoisError;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Tri-state availability; serialized as `true`, `false` or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    #[default]
    Unknown,
    Available,
    Registered,
}

impl Availability {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Availability::Unknown => None,
            Availability::Available => Some(true),
            Availability::Registered => Some(false),
        }
    }
}

impl From<bool> for Availability {
    fn from(available: bool) -> Self {
        if available {
            Availability::Available
        } else {
            Availability::Registered
        }
    }
}

impl Serialize for Availability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_bool().serialize(serializer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registrar {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abuse_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abuse_phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub street: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Contact {
    pub fn is_empty(&self) -> bool {
        *self == Contact::default()
    }
}

/// Parsed domain WHOIS data, uniform across registries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub statuses: Vec<String>,
    pub name_servers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnssec: Option<String>,
    pub registrar: Registrar,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrant: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrative: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing: Option<Contact>,
}

impl DomainInfo {
    pub(crate) fn push_status(&mut self, status: &str) {
        let status = status.trim();
        if !status.is_empty() && !self.statuses.iter().any(|s| s.eq_ignore_ascii_case(status)) {
            self.statuses.push(status.to_string());
        }
    }

    pub(crate) fn push_name_server(&mut self, value: &str) {
        // Some registries append glue addresses after the host name
        let server = value.split_whitespace().next().unwrap_or("").trim_end_matches('.').to_lowercase();
        if !server.is_empty() && !self.name_servers.contains(&server) {
            self.name_servers.push(server);
        }
    }
}

/// One WHOIS answer before parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub rawtext: String,
    /// Host only, without any port.
    pub server: String,
    /// `Some(true)` when the catalog's availability pattern matched.
    pub avail: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainRecord {
    pub parsed: Option<DomainInfo>,
    pub raw_text: String,
    pub whois_server: String,
    pub is_available: Availability,
}

/// One RPSL-style object out of an IP WHOIS body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IpObject {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inetnum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<IpRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub descr: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remarks: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phone: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fax: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub email: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub admin_c: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tech_c: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub abuse_c: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mnt_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IpInfo {
    pub networks: Vec<IpObject>,
    pub contacts: Vec<IpObject>,
    pub routes: Vec<IpObject>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IpRecord {
    pub parsed: Option<IpInfo>,
    pub raw_text: String,
    pub whois_server: String,
}

/// A pipeline result that still carries its record alongside a soft error
/// (`NotFound` or `ParseError`).
#[derive(Debug)]
pub struct Outcome<R> {
    pub record: R,
    pub error: Option<WhoisError>,
}

impl<R> Outcome<R> {
    pub fn ok(record: R) -> Self {
        Self { record, error: None }
    }
}
