//! Checks for the `format` keyword.
//!
//! Formats this crate does not know are treated as annotations and always
//! pass.

use crate::pointer;
use crate::schema::Pattern;
use chrono::{DateTime, NaiveDate};
use std::net::{Ipv4Addr, Ipv6Addr};
use url::Url;

/// Is `s` valid under the named format?
pub fn is_valid(format: &str, s: &str) -> bool {
    match format {
        "date-time" => DateTime::parse_from_rfc3339(s).is_ok(),
        "date" => is_date(s),
        "time" => is_time(s),
        "email" => is_email(s, false),
        "idn-email" => is_email(s, true),
        "hostname" => is_hostname(s, false),
        "idn-hostname" => is_hostname(s, true),
        "ipv4" => s.parse::<Ipv4Addr>().is_ok(),
        "ipv6" => s.parse::<Ipv6Addr>().is_ok(),
        "uri" => s.is_ascii() && is_iri(s),
        "uri-reference" => s.is_ascii() && is_iri_reference(s),
        "iri" => is_iri(s),
        "iri-reference" => is_iri_reference(s),
        "json-pointer" => pointer::parse(s).is_ok(),
        "relative-json-pointer" => is_relative_json_pointer(s),
        "regex" => Pattern::new(s).is_ok(),
        _ => true,
    }
}

fn is_date(s: &str) -> bool {
    let shape = s.len() == 10
        && s.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });

    shape && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_time(s: &str) -> bool {
    // A full-time is exactly the part of a date-time after the 'T'.
    DateTime::parse_from_rfc3339(&format!("1970-01-01T{}", s)).is_ok()
}

fn is_email(s: &str, international: bool) -> bool {
    let at = match s.rfind('@') {
        Some(at) => at,
        None => return false,
    };
    let (local, domain) = (&s[..at], &s[at + 1..]);

    let local_ok = !local.is_empty()
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| !c.is_whitespace() && !c.is_control() && (international || c.is_ascii()));

    if !local_ok {
        return false;
    }

    if domain.starts_with('[') && domain.ends_with(']') {
        let literal = &domain[1..domain.len() - 1];
        return match literal.strip_prefix("IPv6:") {
            Some(v6) => v6.parse::<Ipv6Addr>().is_ok(),
            None => literal.parse::<Ipv4Addr>().is_ok(),
        };
    }

    is_hostname(domain, international)
}

fn is_hostname(s: &str, international: bool) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    s.split('.').all(|label| {
        !label.is_empty()
            && label.chars().count() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| {
                c == '-' || c.is_ascii_alphanumeric() || (international && c.is_alphanumeric())
            })
    })
}

fn has_illegal_uri_chars(s: &str) -> bool {
    s.chars()
        .any(|c| c.is_whitespace() || c.is_control() || "<>\"{}|\\^`".contains(c))
}

fn is_iri(s: &str) -> bool {
    !has_illegal_uri_chars(s) && Url::parse(s).is_ok()
}

fn is_iri_reference(s: &str) -> bool {
    if has_illegal_uri_chars(s) {
        return false;
    }

    Url::parse("http://example.invalid/")
        .and_then(|base| base.join(s))
        .is_ok()
}

fn is_relative_json_pointer(s: &str) -> bool {
    let digits = s.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || (digits > 1 && s.starts_with('0')) {
        return false;
    }

    let rest = &s[digits..];
    rest == "#" || pointer::parse(rest).is_ok()
}
