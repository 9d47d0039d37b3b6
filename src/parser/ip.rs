//! RPSL-style parser shared by every RIR (RIPE, APNIC, AFRINIC, LACNIC, ARIN).
//!
//! A body is split into blocks at blank lines. Each block becomes a network,
//! a route, or a contact depending on what it carries. Keys are renamed onto
//! one schema through [`ALIASES`], so `NetRange`, `inetnum` and `inet6num`
//! all land in `inetnum`.

use super::date;
use crate::record::{IpInfo, IpObject, IpRange};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::trace;

static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("inet6num", "inetnum"),
        ("netrange", "inetnum"),
        ("route6", "route"),
        ("nethandle", "id"),
        ("nic-hdl", "id"),
        ("orgid", "id"),
        ("organisation", "id"),
        ("mntner", "id"),
        ("aut-num", "id"),
        ("irt", "id"),
        ("owner-id", "id"),
        ("person", "name"),
        ("role", "name"),
        ("orgname", "name"),
        ("org-name", "name"),
        ("owner", "name"),
        ("custname", "name"),
        ("as-name", "name"),
        ("organization", "org"),
        ("originas", "origin"),
        ("nettype", "status"),
        ("stateprov", "province"),
        ("postalcode", "postal_code"),
        ("regdate", "created_date"),
        ("created", "created_date"),
        ("updated", "updated_date"),
        ("last-modified", "updated_date"),
        ("changed", "updated_date"),
        ("e-mail", "email"),
        ("comment", "remarks"),
        ("admin-c", "admin_c"),
        ("tech-c", "tech_c"),
        ("abuse-c", "abuse_c"),
        ("mnt-by", "mnt_by"),
    ])
});

#[derive(Debug, Default, Clone)]
pub struct IpParser;

impl IpParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw: &str) -> IpInfo {
        let mut info = IpInfo::default();
        for block in split_blocks(raw) {
            let object = build_object(&block);
            if object.inetnum.is_some() {
                info.networks.push(object);
            } else if object.kind.as_deref() == Some("route") || object.kind.as_deref() == Some("route6") {
                info.routes.push(object);
            } else {
                info.contacts.push(object);
            }
        }
        info
    }
}

/// Splits a body into blocks of `(lowercased key, value)` pairs.
fn split_blocks(raw: &str) -> Vec<Vec<(String, String)>> {
    let mut blocks = Vec::new();
    let mut current: Vec<(String, String)> = Vec::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        if line.starts_with('%') || line.starts_with('#') {
            continue;
        }

        // RPSL continuation lines repeat the previous attribute
        if line.starts_with(' ') || line.starts_with('\t') || line.starts_with('+') {
            if let Some((key, _)) = current.last() {
                let key = key.clone();
                let value = line.trim_start_matches('+').trim();
                if !value.is_empty() {
                    current.push((key, value.to_string()));
                }
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            trace!("Skipping unkeyed line: {}", line);
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        current.push((key.trim().to_lowercase(), value.to_string()));
    }

    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn build_object(block: &[(String, String)]) -> IpObject {
    let mut object = IpObject {
        kind: block.first().map(|(key, _)| key.clone()),
        ..IpObject::default()
    };

    for (key, value) in block {
        let canonical = ALIASES.get(key.as_str()).copied().unwrap_or(key.as_str());
        let value = value.as_str();
        match canonical {
            "inetnum" => set_once(&mut object.inetnum, value),
            "id" => set_once(&mut object.id, value),
            "name" => set_once(&mut object.name, value),
            "cidr" => set_once(&mut object.cidr, value),
            "route" => set_once(&mut object.route, value),
            "origin" => set_once(&mut object.origin, value),
            "netname" => set_once(&mut object.netname, value),
            "org" => set_once(&mut object.org, value),
            "status" => set_once(&mut object.status, value),
            "parent" => set_once(&mut object.parent, value),
            "country" => set_once(&mut object.country, value),
            "city" => set_once(&mut object.city, value),
            "province" => set_once(&mut object.province, value),
            "postal_code" => set_once(&mut object.postal_code, value),
            "source" => set_once(&mut object.source, value),
            "created_date" => set_once(&mut object.created_date, &date::normalize(value)),
            "updated_date" => set_once(&mut object.updated_date, &date::normalize(value)),
            "descr" => object.descr.push(value.to_string()),
            "remarks" => object.remarks.push(value.to_string()),
            "address" => object.address.push(value.to_string()),
            "phone" => object.phone.push(value.to_string()),
            "fax" | "fax-no" => object.fax.push(value.to_string()),
            "email" => object.email.push(value.to_string()),
            "admin_c" => object.admin_c.push(value.to_string()),
            "tech_c" => object.tech_c.push(value.to_string()),
            "abuse_c" => object.abuse_c.push(value.to_string()),
            "mnt_by" => object.mnt_by.push(value.to_string()),
            other => {
                object.extra.entry(other.to_string()).or_insert_with(|| value.to_string());
            }
        }
    }

    if let Some(inetnum) = object.inetnum.clone() {
        match inetnum.split_once('-') {
            Some((start, end)) => {
                object.range = Some(IpRange {
                    start: start.trim().to_string(),
                    end: end.trim().to_string(),
                });
            }
            None if inetnum.contains('/') => set_once(&mut object.cidr, inetnum.trim()),
            None => {}
        }
    } else if let Some(route) = object.route.clone() {
        set_once(&mut object.id, &route);
    }

    object
}

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}
