//! Keyword-table parser for RFC 3912 `key: value` bodies.

use super::{date, is_redacted, DomainParser};
use crate::{
    errors::WhoisError,
    record::{Contact, DomainInfo},
};

#[derive(Debug, Clone, Copy)]
enum Role {
    Registrant,
    Administrative,
    Technical,
    Billing,
}

#[derive(Debug, Default, Clone)]
pub struct DefaultParser;

impl DefaultParser {
    pub fn new() -> Self {
        Self
    }

    /// Splits registrant/admin/tech/billing keys into role and field name.
    fn contact_key(key: &str) -> Option<(Role, &str)> {
        let prefixes = [
            ("registrant", Role::Registrant),
            ("admin", Role::Administrative),
            ("administrative contact", Role::Administrative),
            ("tech", Role::Technical),
            ("technical contact", Role::Technical),
            ("billing", Role::Billing),
        ];
        // Longest prefix wins so "administrative contact" beats "admin"
        prefixes
            .iter()
            .filter(|(p, _)| key.starts_with(p))
            .max_by_key(|(p, _)| p.len())
            .map(|(p, role)| (*role, key[p.len()..].trim()))
    }

    fn set_contact_field(contact: &mut Contact, field: &str, value: &str) {
        let field = field.trim_start_matches("contact").trim();
        match field {
            "" | "name" => set_once(&mut contact.name, value),
            f if f.contains("id") && !f.contains("province") => set_once(&mut contact.id, value),
            f if f.contains("org") => set_once(&mut contact.organization, value),
            f if f.contains("street") || f.contains("address") => contact.street.push(value.to_string()),
            f if f.contains("city") => set_once(&mut contact.city, value),
            f if f.contains("state") || f.contains("province") => set_once(&mut contact.province, value),
            f if f.contains("postal") || f.contains("zip") => set_once(&mut contact.postal_code, value),
            f if f.contains("country") => set_once(&mut contact.country, value),
            f if f.contains("fax") => set_once(&mut contact.fax, value),
            f if f.contains("phone") => set_once(&mut contact.phone, value),
            f if f.contains("email") || f.contains("e-mail") => set_once(&mut contact.email, value),
            _ => {}
        }
    }
}

impl DomainParser for DefaultParser {
    fn name(&self) -> &str {
        "default"
    }

    fn parse(&self, raw: &str) -> Result<DomainInfo, WhoisError> {
        let mut parsed = DomainInfo::default();
        let mut registrant = Contact::default();
        let mut administrative = Contact::default();
        let mut technical = Contact::default();
        let mut billing = Contact::default();

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('%') || line.starts_with('#') || line.starts_with(">>>") {
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim().to_lowercase();
                let value = value.trim();

                if value.is_empty() || is_redacted(value) {
                    continue;
                }

                // Match field patterns more intelligently (order matters - most specific first)
                match key.as_str() {
                    "domain name" | "domain" | "domainname" => set_once(&mut parsed.domain, &value.to_lowercase()),
                    "registry domain id" | "domain id" | "roid" => set_once(&mut parsed.id, value),
                    "dnssec" => set_once(&mut parsed.dnssec, value),

                    // Expiration date patterns (check first to catch "Registrar Registration Expiration Date")
                    k if k.contains("expir") || k.contains("expires") || k == "paid-till" => {
                        set_once(&mut parsed.expired_date, &date::normalize(value));
                    }

                    // Creation date patterns
                    k if k.contains("creation") || k.contains("created") || k == "registered" || k == "registration time" => {
                        set_once(&mut parsed.created_date, &date::normalize(value));
                    }

                    // Updated date patterns
                    k if k.contains("updated") || k.contains("modified") || k == "changed" => {
                        set_once(&mut parsed.updated_date, &date::normalize(value));
                    }

                    // Registrar sub-fields before the generic registrar arm
                    k if k.contains("registrar") && k.contains("iana") => set_once(&mut parsed.registrar.id, value),
                    k if k.contains("registrar") && k.contains("url") => set_once(&mut parsed.registrar.url, value),
                    k if k.contains("whois") && k.contains("server") => set_once(&mut parsed.registrar.whois_server, value),
                    k if k.contains("abuse") && k.contains("email") => set_once(&mut parsed.registrar.abuse_email, value),
                    k if k.contains("abuse") && k.contains("phone") => set_once(&mut parsed.registrar.abuse_phone, value),
                    k if k.contains("registrar") && !k.contains("registration") => {
                        set_once(&mut parsed.registrar.name, value);
                    }

                    // Name server patterns
                    k if k.contains("name server") || k == "nserver" || k == "ns" || k == "nameserver" || k == "nameservers" => {
                        parsed.push_name_server(value);
                    }

                    k => match Self::contact_key(k) {
                        Some((role, field)) => {
                            let contact = match role {
                                Role::Registrant => &mut registrant,
                                Role::Administrative => &mut administrative,
                                Role::Technical => &mut technical,
                                Role::Billing => &mut billing,
                            };
                            Self::set_contact_field(contact, field, value);
                        }
                        None if k.contains("status") || k == "state" => {
                            // EPP codes arrive as "clientHold https://icann.org/epp#clientHold",
                            // some ccTLDs list several per line: "REGISTERED, DELEGATED"
                            if value.contains(',') {
                                value.split(',').for_each(|code| parsed.push_status(code));
                            } else {
                                parsed.push_status(value.split_whitespace().next().unwrap_or(value));
                            }
                        }
                        None => {} // Ignore unrecognized fields
                    },
                }
            }
        }

        parsed.registrant = non_empty(registrant);
        parsed.administrative = non_empty(administrative);
        parsed.technical = non_empty(technical);
        parsed.billing = non_empty(billing);
        Ok(parsed)
    }
}

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

fn non_empty(contact: Contact) -> Option<Contact> {
    if contact.is_empty() {
        None
    } else {
        Some(contact)
    }
}
