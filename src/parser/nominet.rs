//! Parser for whois.nic.uk (Nominet).
//!
//! Nominet prints a header line per section and the values indented below:
//!
//! ```text
//!     Domain name:
//!         bbc.co.uk
//!
//!     Registrar:
//!         British Broadcasting Corporation [Tag = BBC]
//!         URL: http://www.bbc.co.uk
//!
//!     Relevant dates:
//!         Registered on: before Aug-1996
//!         Expiry date:  13-Dec-2026
//! ```

use super::{date, is_redacted, DomainParser};
use crate::{
    errors::WhoisError,
    record::{Contact, DomainInfo},
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    Domain,
    Registrant,
    RegistrantAddress,
    Registrar,
    Dates,
    Status,
    NameServers,
    Dnssec,
}

impl Section {
    fn from_header(header: &str) -> Option<Self> {
        let section = match header.to_lowercase().as_str() {
            "domain name" => Section::Domain,
            "registrant" => Section::Registrant,
            "registrant's address" => Section::RegistrantAddress,
            "registrar" => Section::Registrar,
            "relevant dates" => Section::Dates,
            "registration status" => Section::Status,
            "name servers" => Section::NameServers,
            "dnssec" => Section::Dnssec,
            _ => return None,
        };
        Some(section)
    }
}

#[derive(Debug, Default, Clone)]
pub struct NominetParser;

impl NominetParser {
    pub fn new() -> Self {
        Self
    }
}

impl DomainParser for NominetParser {
    fn name(&self) -> &str {
        "nominet"
    }

    fn parse(&self, raw: &str) -> Result<DomainInfo, WhoisError> {
        let mut parsed = DomainInfo::default();
        let mut registrant = Contact::default();
        let mut section = Section::None;

        for line in raw.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                section = Section::None;
                continue;
            }

            // "Header:" alone on its line opens a section; unknown headers close the current one
            if let Some(header) = trimmed.strip_suffix(':') {
                if !header.contains(':') {
                    section = Section::from_header(header).unwrap_or(Section::None);
                    continue;
                }
            }

            match section {
                Section::None => {}
                Section::Domain => {
                    if parsed.domain.is_none() {
                        parsed.domain = Some(trimmed.to_lowercase());
                    }
                }
                Section::Registrant => {
                    if registrant.name.is_none() && !is_redacted(trimmed) {
                        registrant.name = Some(trimmed.to_string());
                    }
                }
                Section::RegistrantAddress => {
                    if !is_redacted(trimmed) {
                        registrant.street.push(trimmed.to_string());
                    }
                }
                Section::Registrar => match trimmed.split_once(':') {
                    Some((key, value)) if key.trim().eq_ignore_ascii_case("url") => {
                        parsed.registrar.url.get_or_insert_with(|| value.trim().to_string());
                    }
                    Some(_) => {}
                    None => {
                        // "Example Ltd [Tag = EXAMPLE]"
                        let (name, tag) = match trimmed.split_once('[') {
                            Some((name, rest)) => (name.trim(), rest.trim_end_matches(']').split_once('=')),
                            None => (trimmed, None),
                        };
                        if parsed.registrar.name.is_none() && !name.is_empty() {
                            parsed.registrar.name = Some(name.to_string());
                        }
                        if let Some((_, tag)) = tag {
                            parsed.registrar.id.get_or_insert_with(|| tag.trim().to_string());
                        }
                    }
                },
                Section::Dates => {
                    if let Some((key, value)) = trimmed.split_once(':') {
                        let value = date::normalize(value);
                        match key.trim().to_lowercase().as_str() {
                            "registered on" => {
                                parsed.created_date.get_or_insert(value);
                            }
                            "expiry date" => {
                                parsed.expired_date.get_or_insert(value);
                            }
                            "last updated" => {
                                parsed.updated_date.get_or_insert(value);
                            }
                            _ => {}
                        }
                    }
                }
                Section::Status => {
                    let status = trimmed.trim_end_matches('.').to_lowercase();
                    if status.starts_with("registered until") {
                        parsed.push_status("registered");
                    } else {
                        parsed.push_status(&status);
                    }
                }
                Section::NameServers => {
                    if !trimmed.to_lowercase().starts_with("no name servers") {
                        parsed.push_name_server(trimmed);
                    }
                }
                Section::Dnssec => {
                    if parsed.dnssec.is_none() {
                        parsed.dnssec = Some(trimmed.to_string());
                    }
                }
            }
        }

        if !registrant.is_empty() {
            parsed.registrant = Some(registrant);
        }
        Ok(parsed)
    }
}
