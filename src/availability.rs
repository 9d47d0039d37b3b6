//! Availability decision ladder.
//!
//! Levels are tried in order and the first one that fires decides:
//!
//! 1. status codes
//! 2. registration data (created date, expiry date, registrar name)
//! 3. the catalog's availability pattern for the answering server
//! 4. domain not-found keywords in the raw text
//!
//! Anything that falls through is treated as registered.

use crate::record::{Availability, DomainInfo};

/// Registry phrases meaning "this domain does not exist".
pub const DOMAIN_NOT_FOUND: &[&str] = &[
    "no match for",
    "no match!!",
    "not found",
    "no data found",
    "no entries found",
    "no matching record",
    "no object found",
    "object does not exist",
    "domain not found",
    "nothing found",
    "status: free",
    "status: available",
    "is available for registration",
    "is free",
    "no information available",
    "not registered",
    "this domain name has not been registered",
    "the queried object does not exist",
    "domain name not known",
    "we do not have an entry in our database matching your query",
];

/// Phrases RIR servers use for an unknown address.
pub const IP_NOT_FOUND: &[&str] = &[
    "no data found",
    "not found",
    "no match",
    "not registered",
    "no object found",
    "object does not exist",
    "nothing found",
    "no entries found",
    "but this server does not have",
];

const AVAILABLE_STATUSES: &[&str] = &["notfound", "free"];

const REGISTERED_STATUSES: &[&str] = &[
    "active",
    "registered",
    "ok",
    "addperiod",
    "autorenewperiod",
    "renewperiod",
    "transferperiod",
    "pendingcreate",
    "pendingdelete",
    "pendingrenew",
    "pendingrestore",
    "pendingtransfer",
    "pendingupdate",
    "redemptionperiod",
];

/// Which ladder level produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    StatusCode,
    RegistrationData,
    CatalogPattern,
    NotFoundKeyword,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub availability: Availability,
    pub rule: Rule,
}

pub fn matches_domain_not_found(raw: &str) -> bool {
    matches_any(raw, DOMAIN_NOT_FOUND)
}

pub fn matches_ip_not_found(raw: &str) -> bool {
    matches_any(raw, IP_NOT_FOUND)
}

fn matches_any(raw: &str, keywords: &[&str]) -> bool {
    let lower = raw.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// `clientTransferProhibited` -> `clienttransferprohibited`, `not_found` -> `notfound`
fn normalize_status(status: &str) -> String {
    status
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn status_verdict(statuses: &[String]) -> Option<Availability> {
    let normalized: Vec<String> = statuses.iter().map(|s| normalize_status(s)).collect();

    if normalized.iter().any(|s| AVAILABLE_STATUSES.contains(&s.as_str())) {
        return Some(Availability::Available);
    }
    let registered = normalized.iter().any(|s| {
        REGISTERED_STATUSES.contains(&s.as_str()) || s.starts_with("client") || s.starts_with("server")
    });
    registered.then_some(Availability::Registered)
}

fn has_registration_data(info: &DomainInfo) -> bool {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    present(&info.created_date) || present(&info.expired_date) || present(&info.registrar.name)
}

/// Runs the ladder. `avail_hint` is the catalog pattern result for the raw body.
pub fn assess(info: Option<&DomainInfo>, avail_hint: Option<bool>, raw: &str) -> Assessment {
    let decide = |availability, rule| Assessment { availability, rule };

    if let Some(info) = info {
        if let Some(verdict) = status_verdict(&info.statuses) {
            return decide(verdict, Rule::StatusCode);
        }
        if has_registration_data(info) {
            return decide(Availability::Registered, Rule::RegistrationData);
        }
    }
    if let Some(available) = avail_hint {
        return decide(Availability::from(available), Rule::CatalogPattern);
    }
    if matches_domain_not_found(raw) {
        return decide(Availability::Available, Rule::NotFoundKeyword);
    }
    decide(Availability::Registered, Rule::Default)
}
