use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

/// Canonical timestamp layout used in every record and response.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

pub fn format_canonical(dt: &DateTime<Utc>) -> String {
    dt.format(CANONICAL_FORMAT).to_string()
}

/// Canonical form of a WHOIS date, or the trimmed input when no layout fits.
pub fn normalize(raw: &str) -> String {
    match guess(raw) {
        Some(dt) => format_canonical(&dt),
        None => raw.trim().to_string(),
    }
}

/// Parse various date formats commonly found in whois data
pub fn guess(raw: &str) -> Option<DateTime<Utc>> {
    let (date_str, zone) = split_zone(raw.trim());
    if date_str.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    // Formats carrying an explicit numeric offset
    let offset_formats = [
        "%Y-%m-%dT%H:%M:%S%z",             // 2025-05-18T13:36:06+0000
        "%Y-%m-%dT%H:%M:%S%.f%z",          // 2025-05-18T13:36:06.000+0000
        "%Y-%m-%d %H:%M:%S%z",             // 2025-05-18 13:36:06+0000
        "%Y-%m-%d %H:%M:%S %z",            // 2025-05-18 13:36:06 +0000
    ];
    for format in &offset_formats {
        if let Ok(dt) = DateTime::parse_from_str(date_str, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let datetime_formats = [
        "%Y-%m-%dT%H:%M:%S%.fZ",           // 2025-05-18T13:36:06.0Z
        "%Y-%m-%dT%H:%M:%SZ",              // 2025-05-18T13:36:06Z
        "%Y-%m-%dT%H:%M:%S",               // 2025-05-18T13:36:06
        "%Y-%m-%d %H:%M:%S",               // 2025-05-18 13:36:06
        "%Y-%m-%d %H:%M",                  // 2025-05-18 13:36
        "%Y/%m/%d %H:%M:%S",               // 2025/05/18 13:36:06
        "%Y.%m.%d %H:%M:%S",               // 2025.05.18 13:36:06
        "%d.%m.%Y %H:%M:%S",               // 18.05.2025 13:36:06
        "%d-%b-%Y %H:%M:%S",               // 18-May-2025 13:36:06
        "%a %b %d %H:%M:%S %Y",            // Sun May 18 13:36:06 2025
    ];
    for format in &datetime_formats {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return apply_zone(naive_dt, zone);
        }
    }

    // Date only, midnight in the stated zone
    let date_only_formats = [
        "%Y-%m-%d",
        "%Y%m%d",
        "%d-%b-%Y",
        "%d-%B-%Y",
        "%d %b %Y",
        "%d %B %Y",
        "%Y/%m/%d",
        "%Y.%m.%d",
        "%d.%m.%Y",
        "%d/%m/%Y",
        "%b %d %Y",
        "%B %d %Y",
    ];
    for format in &date_only_formats {
        if let Ok(naive_date) = NaiveDate::parse_from_str(date_str, format) {
            if let Some(naive_dt) = naive_date.and_hms_opt(0, 0, 0) {
                return apply_zone(naive_dt, zone);
            }
        }
    }

    debug!("Failed to parse date: {}", raw);
    None
}

/// Strips a trailing zone annotation such as ` (JST)`, ` UTC` or ` GMT`.
fn split_zone(s: &str) -> (&str, i32) {
    let zones: [(&str, i32); 8] = [
        (" (JST)", 9 * 3600),
        (" JST", 9 * 3600),
        (" (UTC)", 0),
        (" UTC", 0),
        (" (GMT)", 0),
        (" GMT", 0),
        (" (CET)", 3600),
        (" CET", 3600),
    ];
    for (suffix, offset) in zones {
        if let Some(stripped) = s.strip_suffix(suffix) {
            return (stripped.trim(), offset);
        }
    }
    (s, 0)
}

fn apply_zone(naive_dt: NaiveDateTime, offset_seconds: i32) -> Option<DateTime<Utc>> {
    let offset = FixedOffset::east_opt(offset_seconds)?;
    offset
        .from_local_datetime(&naive_dt)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
