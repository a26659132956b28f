//! Builtin named string formats.
//!
//! Grammars for the standard format names live here as predicates over
//! `&str`; the `format` keyword decides, based on the dialect and the
//! context's validation mode, whether a failed predicate is an error or
//! just an annotation.
use std::{
    borrow::Cow,
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

use email_address::EmailAddress;
use fancy_regex::Regex;
use fluent_uri::{Uri, UriRef};
use once_cell::sync::Lazy;
use uuid_simd::{parse_hyphenated, Out};

/// A named string format check.
///
/// Closures of type `Fn(&str) -> bool` implement it, so custom formats can
/// be registered as plain functions.
pub trait Format: Send + Sync {
    /// Whether the string conforms to the format.
    fn is_valid(&self, value: &str) -> bool;
}

impl<F> Format for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    #[inline]
    fn is_valid(&self, value: &str) -> bool {
        self(value)
    }
}

pub(crate) type BuiltinFormat = fn(&str) -> bool;

/// A format check resolved through the registry composition: a registered
/// [`Format`] object or a builtin predicate.
pub(crate) enum FormatCheck<'a> {
    Custom(&'a std::sync::Arc<dyn Format>),
    Builtin(BuiltinFormat),
}

impl FormatCheck<'_> {
    pub(crate) fn is_valid(&self, value: &str) -> bool {
        match self {
            FormatCheck::Custom(format) => format.is_valid(value),
            FormatCheck::Builtin(check) => check(value),
        }
    }
}

/// Look up a standard format validator by name.
pub(crate) fn builtin(name: &str) -> Option<BuiltinFormat> {
    Some(match name {
        "date" => is_valid_date,
        "time" => is_valid_time,
        "date-time" => is_valid_datetime,
        "duration" => is_valid_duration,
        "email" | "idn-email" => is_valid_email,
        "hostname" => is_valid_hostname,
        "idn-hostname" => is_valid_idn_hostname,
        "ipv4" => is_valid_ipv4,
        "ipv6" => is_valid_ipv6,
        "uri" => is_valid_uri,
        "uri-reference" => is_valid_uri_reference,
        "iri" => is_valid_iri,
        "iri-reference" => is_valid_iri_reference,
        "uuid" => is_valid_uuid,
        "uri-template" => is_valid_uri_template,
        "json-pointer" => is_valid_json_pointer,
        "relative-json-pointer" => is_valid_relative_json_pointer,
        "regex" => is_valid_regex,
        _ => return None,
    })
}

fn is_valid_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    if bytes.len() != 10
        || bytes[4] != b'-'
        || bytes[7] != b'-'
        || !bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit())
    {
        return false;
    }
    let year = (u16::from(bytes[0]) - u16::from(b'0')) * 1000
        + (u16::from(bytes[1]) - u16::from(b'0')) * 100
        + u16::from(bytes[2] - b'0') * 10
        + u16::from(bytes[3] - b'0');
    let month = (bytes[5] - b'0') * 10 + (bytes[6] - b'0');
    let day = (bytes[8] - b'0') * 10 + (bytes[9] - b'0');
    let max_day = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => return false,
    };
    (1..=max_day).contains(&day)
}

#[inline]
fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

// RFC 3339 `full-time`, including the leap-second constraint: `60` is only
// accepted when the time is 23:59 in UTC terms.
fn is_valid_time(time: &str) -> bool {
    let bytes = time.as_bytes();
    let len = bytes.len();
    // Minimum valid time is "HH:MM:SSZ"
    if len < 9
        || !bytes[0].is_ascii_digit()
        || !bytes[1].is_ascii_digit()
        || bytes[2] != b':'
        || !bytes[3].is_ascii_digit()
        || !bytes[4].is_ascii_digit()
        || bytes[5] != b':'
        || !bytes[6].is_ascii_digit()
        || !bytes[7].is_ascii_digit()
    {
        return false;
    }
    let hh = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    let mm = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
    let ss = (bytes[6] - b'0') * 10 + (bytes[7] - b'0');
    if hh > 23 || mm > 59 || ss > 60 {
        return false;
    }
    let mut i = 8;
    if i < len && bytes[i] == b'.' {
        i += 1;
        let fraction_start = i;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == fraction_start {
            return false;
        }
    }
    if i == len {
        return false;
    }
    match bytes[i] {
        b'Z' | b'z' => i == len - 1 && (ss != 60 || (hh == 23 && mm == 59)),
        b'+' | b'-' => {
            if len - i != 6
                || !bytes[i + 1].is_ascii_digit()
                || !bytes[i + 2].is_ascii_digit()
                || bytes[i + 3] != b':'
                || !bytes[i + 4].is_ascii_digit()
                || !bytes[i + 5].is_ascii_digit()
            {
                return false;
            }
            let offset_hh = (bytes[i + 1] - b'0') * 10 + (bytes[i + 2] - b'0');
            let offset_mm = (bytes[i + 4] - b'0') * 10 + (bytes[i + 5] - b'0');
            if offset_hh > 23 || offset_mm > 59 {
                return false;
            }
            if ss == 60 {
                let sign = if bytes[i] == b'+' { -1 } else { 1 };
                let mut utc_hh = i32::from(hh) + sign * i32::from(offset_hh);
                let mut utc_mm = i32::from(mm) + sign * i32::from(offset_mm);
                utc_hh += utc_mm.div_euclid(60);
                utc_mm = utc_mm.rem_euclid(60);
                utc_hh = utc_hh.rem_euclid(24);
                utc_hh == 23 && utc_mm == 59
            } else {
                true
            }
        }
        _ => false,
    }
}

fn is_valid_datetime(value: &str) -> bool {
    // RFC 3339 `date-time`: full-date "T" full-time
    if value.len() < 11 {
        return false;
    }
    let (date, rest) = value.split_at(10);
    let mut chars = rest.chars();
    matches!(chars.next(), Some('T' | 't')) && is_valid_date(date) && is_valid_time(chars.as_str())
}

// ISO 8601 ABNF from the JSON Schema spec: "PnW" or "PnYnMnD(TnHnMnS)",
// each element optional but at least one present on each side of `T`.
fn is_valid_duration(value: &str) -> bool {
    fn scan(input: &str, units: &[u8]) -> Option<usize> {
        let bytes = input.as_bytes();
        let mut consumed = 0;
        let mut position = 0;
        let mut unit_cursor = 0;
        while position < bytes.len() {
            let digits_start = position;
            while position < bytes.len() && bytes[position].is_ascii_digit() {
                position += 1;
            }
            if position == digits_start || position == bytes.len() {
                break;
            }
            let Some(unit_index) = units[unit_cursor..]
                .iter()
                .position(|unit| *unit == bytes[position])
            else {
                break;
            };
            unit_cursor += unit_index + 1;
            position += 1;
            consumed = position;
        }
        (consumed > 0).then_some(consumed)
    }
    let Some(rest) = value.strip_prefix('P') else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    if let Some(consumed) = scan(rest, b"W") {
        return consumed == rest.len();
    }
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };
    if !date_part.is_empty() && scan(date_part, b"YMD") != Some(date_part.len()) {
        return false;
    }
    match time_part {
        Some(time) => scan(time, b"HMS") == Some(time.len()),
        None => !date_part.is_empty(),
    }
}

fn is_valid_email(email: &str) -> bool {
    let Ok(parsed) = EmailAddress::from_str(email) else {
        return false;
    };
    let domain = parsed.domain();
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        if let Some(address) = literal.strip_prefix("IPv6:") {
            address.parse::<Ipv6Addr>().is_ok()
        } else {
            literal.parse::<Ipv4Addr>().is_ok()
        }
    } else {
        is_valid_hostname(domain)
    }
}

fn is_valid_hostname(hostname: &str) -> bool {
    !(hostname.is_empty()
        || hostname.starts_with('-')
        || hostname.ends_with('-')
        || hostname.len() > 255
        || hostname
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '.'))
        || hostname.split('.').any(|label| label.len() > 63))
}

fn is_valid_idn_hostname(hostname: &str) -> bool {
    match idna::domain_to_ascii(hostname) {
        Ok(ascii) => is_valid_hostname(ascii.trim_end_matches('.')),
        Err(_) => false,
    }
}

fn is_valid_ipv4(value: &str) -> bool {
    // `Ipv4Addr::from_str` accepts no leading zeros, matching the
    // `dotted-quad` grammar.
    Ipv4Addr::from_str(value).is_ok()
}

fn is_valid_ipv6(value: &str) -> bool {
    Ipv6Addr::from_str(value).is_ok()
}

fn is_valid_uri(value: &str) -> bool {
    Uri::parse(value).is_ok()
}

fn is_valid_uri_reference(value: &str) -> bool {
    UriRef::parse(value).is_ok()
}

/// IRIs are URIs extended with non-ASCII characters; checking them with an
/// ASCII-only parser requires percent-encoding those characters first.
fn encode_non_ascii(value: &str) -> Cow<'_, str> {
    if value.is_ascii() {
        return Cow::Borrowed(value);
    }
    let mut encoded = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii() {
            encoded.push(ch);
        } else {
            for byte in ch.encode_utf8(&mut [0; 4]).bytes() {
                encoded.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    Cow::Owned(encoded)
}

fn is_valid_iri(value: &str) -> bool {
    Uri::parse(encode_non_ascii(value).as_ref()).is_ok()
}

fn is_valid_iri_reference(value: &str) -> bool {
    UriRef::parse(encode_non_ascii(value).as_ref()).is_ok()
}

fn is_valid_uuid(value: &str) -> bool {
    let mut out = [0; 16];
    parse_hyphenated(value.as_bytes(), Out::from_mut(&mut out)).is_ok()
}

static URI_TEMPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:(?:[^\x00-\x20"'<>%\\^`{|}]|%[0-9a-f]{2})|\{[+#./;?&=,!@|]?(?:[a-z0-9_]|%[0-9a-f]{2})+(?::[1-9][0-9]{0,3}|\*)?(?:,(?:[a-z0-9_]|%[0-9a-f]{2})+(?::[1-9][0-9]{0,3}|\*)?)*})*\z"#,
    )
    .expect("Is a valid regex")
});

fn is_valid_uri_template(value: &str) -> bool {
    URI_TEMPLATE_RE.is_match(value).unwrap_or(false)
}

static JSON_POINTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/(([^/~])|(~[01]))*)*\z").expect("Is a valid regex"));

fn is_valid_json_pointer(value: &str) -> bool {
    JSON_POINTER_RE.is_match(value).unwrap_or(false)
}

static RELATIVE_JSON_POINTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:0|[1-9][0-9]*)(?:#|(?:/(?:[^~/]|~0|~1)*)*)\z").expect("Is a valid regex")
});

fn is_valid_relative_json_pointer(value: &str) -> bool {
    RELATIVE_JSON_POINTER_RE.is_match(value).unwrap_or(false)
}

fn is_valid_regex(value: &str) -> bool {
    Regex::new(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::builtin;
    use test_case::test_case;

    #[test_case("date", "2024-02-29", true; "leap day")]
    #[test_case("date", "2023-02-29", false; "not a leap year")]
    #[test_case("date", "2024-13-01", false; "month out of range")]
    #[test_case("date", "24-01-01", false; "short year")]
    #[test_case("time", "23:59:60Z", true; "leap second in utc")]
    #[test_case("time", "12:00:60Z", false; "leap second out of place")]
    #[test_case("time", "08:30:06+05:30", true; "positive offset")]
    #[test_case("time", "08:30:06", false; "missing offset")]
    #[test_case("date-time", "1990-12-31T15:59:50.123-08:00", true; "fractional with offset")]
    #[test_case("date-time", "1990-12-31 15:59:50Z", false; "space separator")]
    #[test_case("duration", "P1Y2M3DT4H5M6S", true; "full duration")]
    #[test_case("duration", "P4W", true; "weeks")]
    #[test_case("duration", "PT1M", true; "time only")]
    #[test_case("duration", "P", false; "empty duration")]
    #[test_case("duration", "P1DT", false; "dangling time designator")]
    #[test_case("duration", "P1M2Y", false; "units out of order")]
    #[test_case("email", "user@example.com", true; "plain email")]
    #[test_case("email", "invalid-email", false; "no at sign")]
    #[test_case("hostname", "example.com", true; "plain hostname")]
    #[test_case("hostname", "-example.com", false; "leading dash")]
    #[test_case("idn-hostname", "bücher.example", true; "unicode hostname")]
    #[test_case("ipv4", "192.168.0.1", true; "plain ipv4")]
    #[test_case("ipv4", "192.168.0.01", false; "leading zero octet")]
    #[test_case("ipv6", "::1", true; "loopback")]
    #[test_case("ipv6", "12345::", false; "group too long")]
    #[test_case("uri", "https://example.com/a?b=c#d", true; "absolute uri")]
    #[test_case("uri", "/relative/path", false; "relative is not a uri")]
    #[test_case("uri-reference", "/relative/path#frag", true; "relative reference")]
    #[test_case("iri", "https://例え.jp/パス", true; "international uri")]
    #[test_case("uuid", "550e8400-e29b-41d4-a716-446655440000", true; "canonical uuid")]
    #[test_case("uuid", "550e8400e29b41d4a716446655440000", false; "missing hyphens")]
    #[test_case("uri-template", "http://example.com/{id}", true; "simple template")]
    #[test_case("json-pointer", "/a/b~1c", true; "escaped pointer")]
    #[test_case("json-pointer", "a/b", false; "missing leading slash")]
    #[test_case("relative-json-pointer", "1/a", true; "relative pointer")]
    #[test_case("relative-json-pointer", "/a", false; "not relative")]
    #[test_case("regex", "a[bc]+", true; "valid pattern")]
    #[test_case("regex", "a[", false; "unterminated class")]
    fn standard_formats(name: &str, value: &str, expected: bool) {
        let check = builtin(name).expect("Known format");
        assert_eq!(check(value), expected, "{name}: {value}");
    }

    #[test]
    fn unknown_names_are_not_builtin() {
        assert!(builtin("credit-card").is_none());
    }
}
