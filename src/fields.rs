//! Typed parsing of individual cell values.
//!
//! Each declared column type has one parser. Parsers never panic and
//! never abort a row: an invalid cell simply yields `None` and the
//! caller records a notice.

use chrono::NaiveDate;
use rgb::RGB8;

/// Declared type of one column in a file schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldType {
    Text,
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Float,
    NonNegativeFloat,
    Latitude,
    Longitude,
    /// `YYYYMMDD`
    Date,
    /// `H:MM:SS`, `HH:MM:SS` or `HHH:MM:SS`; hours may exceed 24 for
    /// services running past midnight
    Time,
    Timezone,
    CurrencyCode,
    LanguageCode,
    /// `RRGGBB` hex, no leading `#`
    Color,
    Url,
    Email,
    Phone,
    /// An integer code remapped to a typed enum by the entity builder
    Enum,
}

impl FieldType {
    /// Human readable name used in notice payloads.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer { .. } => "integer",
            FieldType::Float => "float",
            FieldType::NonNegativeFloat => "non-negative float",
            FieldType::Latitude => "latitude",
            FieldType::Longitude => "longitude",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Timezone => "timezone",
            FieldType::CurrencyCode => "currency code",
            FieldType::LanguageCode => "language code",
            FieldType::Color => "color",
            FieldType::Url => "URL",
            FieldType::Email => "email",
            FieldType::Phone => "phone number",
            FieldType::Enum => "enum",
        }
    }
}

pub const INTEGER: FieldType = FieldType::Integer {
    min: None,
    max: None,
};
pub const NON_NEGATIVE_INTEGER: FieldType = FieldType::Integer {
    min: Some(0),
    max: None,
};
pub const POSITIVE_INTEGER: FieldType = FieldType::Integer {
    min: Some(1),
    max: None,
};

/// A successfully parsed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    /// Seconds past midnight
    Time(u32),
    Color(RGB8),
    EnumCode(i64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<u32> {
        match self {
            FieldValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<RGB8> {
        match self {
            FieldValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_enum_code(&self) -> Option<i64> {
        match self {
            FieldValue::EnumCode(c) => Some(*c),
            _ => None,
        }
    }
}

/// Parses one non-empty cell against its declared type. `None` means
/// the value is invalid for that type.
pub fn parse_field(field_type: FieldType, raw: &str) -> Option<FieldValue> {
    match field_type {
        FieldType::Text => Some(FieldValue::Text(raw.to_owned())),
        FieldType::Integer { min, max } => {
            let value: i64 = raw.parse().ok()?;
            if min.map_or(false, |m| value < m) || max.map_or(false, |m| value > m) {
                return None;
            }
            Some(FieldValue::Integer(value))
        }
        FieldType::Float => raw.parse().ok().map(FieldValue::Float),
        FieldType::NonNegativeFloat => {
            let value: f64 = raw.parse().ok()?;
            (value >= 0.0).then(|| FieldValue::Float(value))
        }
        FieldType::Latitude => {
            let value: f64 = raw.parse().ok()?;
            (-90.0..=90.0).contains(&value).then(|| FieldValue::Float(value))
        }
        FieldType::Longitude => {
            let value: f64 = raw.parse().ok()?;
            (-180.0..=180.0)
                .contains(&value)
                .then(|| FieldValue::Float(value))
        }
        FieldType::Date => parse_date(raw).map(FieldValue::Date),
        FieldType::Time => parse_time(raw).map(FieldValue::Time),
        FieldType::Timezone => is_timezone(raw).then(|| FieldValue::Text(raw.to_owned())),
        FieldType::CurrencyCode => is_currency_code(raw).then(|| FieldValue::Text(raw.to_owned())),
        FieldType::LanguageCode => is_language_code(raw).then(|| FieldValue::Text(raw.to_owned())),
        FieldType::Color => parse_color(raw).map(FieldValue::Color),
        FieldType::Url => is_url(raw).then(|| FieldValue::Text(raw.to_owned())),
        FieldType::Email => is_email(raw).then(|| FieldValue::Text(raw.to_owned())),
        FieldType::Phone => is_phone(raw).then(|| FieldValue::Text(raw.to_owned())),
        FieldType::Enum => raw.parse().ok().map(FieldValue::EnumCode),
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

/// Parses `H:MM:SS`, `HH:MM:SS` or `HHH:MM:SS` into seconds past
/// midnight. Hours above 24 are legal (next-day service).
pub fn parse_time(s: &str) -> Option<u32> {
    let len = s.len();
    if !(7..=9).contains(&len) || !s.is_ascii() {
        return None;
    }
    let hour = &s[..len - 6];
    let min = &s[len - 5..len - 3];
    let sec = &s[len - 2..];
    if s.as_bytes()[len - 6] != b':' || s.as_bytes()[len - 3] != b':' {
        return None;
    }
    let hours: u32 = hour.parse().ok()?;
    let minutes: u32 = min.parse().ok()?;
    let seconds: u32 = sec.parse().ok()?;
    if minutes > 59 || seconds > 59 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Formats seconds past midnight back into `HH:MM:SS` for notice
/// payloads.
pub fn format_time(time: u32) -> String {
    format!("{:02}:{:02}:{:02}", time / 3600, time % 3600 / 60, time % 60)
}

pub fn parse_color(s: &str) -> Option<RGB8> {
    if s.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some(RGB8::new(r, g, b))
}

pub fn format_color(color: RGB8) -> String {
    format!("{:02X}{:02X}{:02X}", color.r, color.g, color.b)
}

/// Structural IANA timezone check: `Area/Location` with sane
/// characters, or one of the fixed names.
fn is_timezone(s: &str) -> bool {
    if s == "UTC" || s == "GMT" {
        return true;
    }
    s.contains('/')
        && s.split('/').all(|part| {
            !part.is_empty()
                && part
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'+')
        })
}

/// ISO 4217 shape: exactly three ASCII letters.
fn is_currency_code(s: &str) -> bool {
    s.len() == 3 && s.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Structural BCP 47 check: `xx`, `xx-YY`, `xx-Yyyy-ZZ`, …
fn is_language_code(s: &str) -> bool {
    let mut subtags = s.split('-');
    let primary = match subtags.next() {
        Some(p) => p,
        None => return false,
    };
    if !(2..=8).contains(&primary.len()) || !primary.bytes().all(|b| b.is_ascii_alphabetic()) {
        return false;
    }
    subtags.all(|sub| {
        (1..=8).contains(&sub.len()) && sub.bytes().all(|b| b.is_ascii_alphanumeric())
    })
}

fn is_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("http://")
        .or_else(|| s.strip_prefix("https://"));
    match rest {
        Some(rest) => {
            let host = rest.split('/').next().unwrap_or("");
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn is_email(s: &str) -> bool {
    let mut parts = s.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.contains(char::is_whitespace)
        }
        _ => false,
    }
}

fn is_phone(s: &str) -> bool {
    let digits = s.bytes().filter(u8::is_ascii_digit).count();
    digits >= 3
        && s.bytes().all(|b| {
            b.is_ascii_digit()
                || matches!(b, b' ' | b'+' | b'-' | b'(' | b')' | b'.' | b'/')
        })
}
