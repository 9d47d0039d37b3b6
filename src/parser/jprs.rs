//! Parser for whois.jprs.jp. Lines are positional `a. [Label] value`
//! with Japanese or English labels; the letter prefix is optional.

use super::{date, is_redacted, DomainParser};
use crate::{
    errors::WhoisError,
    record::{Contact, DomainInfo},
};
use once_cell::sync::Lazy;
use regex::Regex;

static LABELED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z]\.\s*)?\[([^\]]+)\]\s*(.*)$").expect("Invalid JPRS line regex")
});

/// Trailing `(2025/03/31)` after a status word.
static STATUS_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d{4}/\d{2}/\d{2})\)").expect("Invalid JPRS status date regex"));

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Domain,
    Registrant,
    NameServer,
    Created,
    Expires,
    Updated,
    Status,
    Email,
}

fn field_for(label: &str) -> Option<Field> {
    let field = match label.trim().to_lowercase().as_str() {
        "ドメイン名" | "domain name" => Field::Domain,
        "登録者名" | "組織名" | "registrant" | "organization" => Field::Registrant,
        "ネームサーバ" | "name server" => Field::NameServer,
        "登録年月日" | "created on" => Field::Created,
        "有効期限" | "expires on" => Field::Expires,
        "最終更新" | "last updated" | "last update" => Field::Updated,
        "状態" | "status" => Field::Status,
        "電子メール" | "email" => Field::Email,
        _ => return None,
    };
    Some(field)
}

#[derive(Debug, Default, Clone)]
pub struct JprsParser;

impl JprsParser {
    pub fn new() -> Self {
        Self
    }
}

impl DomainParser for JprsParser {
    fn name(&self) -> &str {
        "jprs"
    }

    fn parse(&self, raw: &str) -> Result<DomainInfo, WhoisError> {
        let mut parsed = DomainInfo::default();
        let mut registrant = Contact::default();

        for line in raw.lines() {
            let Some(caps) = LABELED_LINE.captures(line.trim()) else {
                continue;
            };
            let value = caps[2].trim();
            if value.is_empty() || is_redacted(value) {
                continue;
            }
            let Some(field) = field_for(&caps[1]) else {
                continue;
            };

            match field {
                Field::Domain => {
                    parsed.domain.get_or_insert_with(|| value.to_lowercase());
                }
                Field::Registrant => {
                    registrant.name.get_or_insert_with(|| value.to_string());
                }
                Field::Email => {
                    registrant.email.get_or_insert_with(|| value.to_string());
                }
                Field::NameServer => parsed.push_name_server(value),
                Field::Created => {
                    parsed.created_date.get_or_insert_with(|| date::normalize(value));
                }
                Field::Expires => {
                    parsed.expired_date.get_or_insert_with(|| date::normalize(value));
                }
                Field::Updated => {
                    parsed.updated_date.get_or_insert_with(|| date::normalize(value));
                }
                Field::Status => {
                    // "Connected (2025/03/31)": the date is the expiry
                    if let Some(word) = value.split_whitespace().next() {
                        parsed.push_status(&word.to_lowercase());
                    }
                    if let Some(expiry) = STATUS_DATE.captures(value) {
                        parsed.expired_date.get_or_insert_with(|| date::normalize(&expiry[1]));
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
