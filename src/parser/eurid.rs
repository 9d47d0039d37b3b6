//! Parser for whois.eu (EURid): top-level `key: value` lines plus
//! `Section:` headers whose fields are indented underneath.

use super::{is_redacted, DomainParser};
use crate::{
    errors::WhoisError,
    record::{Contact, DomainInfo},
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Top,
    Registrant,
    Technical,
    Registrar,
    NameServers,
    Keys,
    Other,
}

#[derive(Debug, Default, Clone)]
pub struct EuridParser;

impl EuridParser {
    pub fn new() -> Self {
        Self
    }

    fn section_for(header: &str) -> Section {
        match header.trim().to_lowercase().as_str() {
            "registrant" => Section::Registrant,
            "technical" => Section::Technical,
            "registrar" => Section::Registrar,
            "name servers" => Section::NameServers,
            "keys" => Section::Keys,
            _ => Section::Other,
        }
    }

    fn set_contact_field(contact: &mut Contact, key: &str, value: &str) {
        match key {
            "name" => contact.name = Some(value.to_string()),
            "organisation" | "organization" => contact.organization = Some(value.to_string()),
            "phone" => contact.phone = Some(value.to_string()),
            "fax" => contact.fax = Some(value.to_string()),
            "email" => contact.email = Some(value.to_string()),
            _ => {}
        }
    }
}

impl DomainParser for EuridParser {
    fn name(&self) -> &str {
        "eurid"
    }

    fn parse(&self, raw: &str) -> Result<DomainInfo, WhoisError> {
        let mut parsed = DomainInfo::default();
        let mut registrant = Contact::default();
        let mut technical = Contact::default();
        let mut section = Section::Top;

        for line in raw.lines() {
            if line.trim().is_empty() || line.trim_start().starts_with('%') {
                continue;
            }
            let indented = line.starts_with(' ') || line.starts_with('\t');
            let trimmed = line.trim();

            if !indented {
                match trimmed.split_once(':') {
                    Some((header, rest)) if rest.trim().is_empty() => {
                        section = Self::section_for(header);
                    }
                    Some((key, value)) => {
                        section = Section::Top;
                        let value = value.trim();
                        match key.trim().to_lowercase().as_str() {
                            "domain" => parsed.domain = Some(value.to_lowercase()),
                            "status" => parsed.push_status(&value.to_lowercase()),
                            _ => {}
                        }
                    }
                    None => section = Section::Top,
                }
                continue;
            }

            match section {
                Section::NameServers => parsed.push_name_server(trimmed),
                Section::Keys => {
                    parsed.dnssec.get_or_insert_with(|| "signed".to_string());
                }
                Section::Registrant | Section::Technical | Section::Registrar => {
                    let Some((key, value)) = trimmed.split_once(':') else {
                        continue;
                    };
                    let key = key.trim().to_lowercase();
                    let value = value.trim();
                    if value.is_empty() || is_redacted(value) {
                        continue;
                    }
                    match section {
                        Section::Registrant => Self::set_contact_field(&mut registrant, &key, value),
                        Section::Technical => Self::set_contact_field(&mut technical, &key, value),
                        _ => match key.as_str() {
                            "name" => parsed.registrar.name = Some(value.to_string()),
                            "website" => parsed.registrar.url = Some(value.to_string()),
                            _ => {}
                        },
                    }
                }
                Section::Top | Section::Other => {}
            }
        }

        parsed.registrant = Some(registrant).filter(|c| !c.is_empty());
        parsed.technical = Some(technical).filter(|c| !c.is_empty());
        Ok(parsed)
    }
}
