//! Parser for whois.denic.de.
//!
//! ```text
//! Domain: example.de
//! Nserver: ns1.example.de
//! Status: connect
//! Changed: 2023-01-15T10:30:00+01:00
//!
//! [Tech-C]
//! Type: ROLE
//! Name: Hostmaster
//! ```

use super::{date, is_redacted, DomainParser};
use crate::{
    errors::WhoisError,
    record::{Contact, DomainInfo},
};
use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([A-Za-z-]+)\]$").expect("Invalid DENIC block regex"));

#[derive(Debug, Clone, Copy, PartialEq)]
enum Block {
    Domain,
    Holder,
    Admin,
    Tech,
    Zone,
    Other,
}

impl Block {
    fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "holder" => Block::Holder,
            "admin-c" => Block::Admin,
            "tech-c" => Block::Tech,
            "zone-c" => Block::Zone,
            _ => Block::Other,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct DenicParser;

impl DenicParser {
    pub fn new() -> Self {
        Self
    }

    fn set_contact_field(contact: &mut Contact, key: &str, value: &str) {
        match key {
            "name" => contact.name = Some(value.to_string()),
            "organisation" | "organization" => contact.organization = Some(value.to_string()),
            "address" => contact.street.push(value.to_string()),
            "postalcode" => contact.postal_code = Some(value.to_string()),
            "city" => contact.city = Some(value.to_string()),
            "countrycode" => contact.country = Some(value.to_string()),
            "phone" => contact.phone = Some(value.to_string()),
            "fax" => contact.fax = Some(value.to_string()),
            "email" => contact.email = Some(value.to_string()),
            _ => {}
        }
    }
}

impl DomainParser for DenicParser {
    fn name(&self) -> &str {
        "denic"
    }

    fn parse(&self, raw: &str) -> Result<DomainInfo, WhoisError> {
        let mut parsed = DomainInfo::default();
        let mut holder = Contact::default();
        let mut admin = Contact::default();
        let mut tech = Contact::default();
        let mut block = Block::Domain;

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }

            if let Some(caps) = BLOCK_HEADER.captures(line) {
                block = Block::from_label(&caps[1]);
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();
            if value.is_empty() || is_redacted(value) {
                continue;
            }

            match block {
                Block::Domain => match key.as_str() {
                    "domain" => parsed.domain = Some(value.to_lowercase()),
                    "nserver" => parsed.push_name_server(value),
                    "status" => parsed.push_status(value),
                    "changed" => parsed.updated_date = Some(date::normalize(value)),
                    "dnskey" => parsed.dnssec = Some("signed".to_string()),
                    _ => {}
                },
                Block::Holder => Self::set_contact_field(&mut holder, &key, value),
                Block::Admin => Self::set_contact_field(&mut admin, &key, value),
                Block::Tech => Self::set_contact_field(&mut tech, &key, value),
                Block::Zone | Block::Other => {}
            }
        }

        if parsed.domain.is_some() && parsed.dnssec.is_none() {
            parsed.dnssec = Some("unsigned".to_string());
        }
        parsed.registrant = Some(holder).filter(|c| !c.is_empty());
        parsed.administrative = Some(admin).filter(|c| !c.is_empty());
        parsed.technical = Some(tech).filter(|c| !c.is_empty());
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DENIC: &str = "% Restricted rights.
%
% Terms and Conditions of Use
%

Domain: example.de
Nserver: ns1.example.de
Nserver: NS2.EXAMPLE.DE. 192.0.2.2
Dnskey: 257 3 8 AwEAAb...
Status: connect
Changed: 2023-01-15T10:30:00+01:00

[Holder]
Name: Example GmbH
Address: Musterstr. 1
City: Berlin
CountryCode: DE

[Tech-C]
Type: ROLE
Name: Hostmaster
Email: hostmaster@example.de
";

    #[test]
    fn test_domain_block() {
        let info = DenicParser::new().parse(DENIC).unwrap();
        assert_eq!(info.domain.as_deref(), Some("example.de"));
        assert_eq!(info.name_servers, vec!["ns1.example.de", "ns2.example.de"]);
        assert_eq!(info.statuses, vec!["connect"]);
        assert_eq!(info.updated_date.as_deref(), Some("2023-01-15T09:30:00+00:00"));
        assert_eq!(info.dnssec.as_deref(), Some("signed"));
    }

    #[test]
    fn test_bracketed_contacts() {
        let info = DenicParser::new().parse(DENIC).unwrap();
        let holder = info.registrant.unwrap();
        assert_eq!(holder.name.as_deref(), Some("Example GmbH"));
        assert_eq!(holder.street, vec!["Musterstr. 1"]);
        assert_eq!(holder.country.as_deref(), Some("DE"));
        let tech = info.technical.unwrap();
        assert_eq!(tech.email.as_deref(), Some("hostmaster@example.de"));
        assert!(info.administrative.is_none());
    }

    #[test]
    fn test_free_domain() {
        let info = DenicParser::new().parse("Domain: frei.de\nStatus: free\n").unwrap();
        assert_eq!(info.statuses, vec!["free"]);
        assert!(info.registrar.name.is_none());
    }
}
