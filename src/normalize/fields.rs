use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use super::aliases::{
    canonical_area, canonical_city, find_city, DEFAULT_CITY, LISTING_TYPE_SYNONYMS,
    PROPERTY_TYPE_SYNONYMS,
};
use crate::types::{ListingType, NormalizationResult, PropertyType};
use crate::TARGET_NORMALIZE;

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;
const THOUSAND: f64 = 1_000.0;

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

lazy_static! {
    static ref CURRENCY: Regex = Regex::new(r"₹|\binr\b|\brs\b\.?|\brupees\b").unwrap();
    static ref PRICE: Regex =
        Regex::new(r"^(\d+(?:\.\d+)?)\s*(crores?|cr|lakhs?|lacs?|l|k)?$").unwrap();
    static ref EMAIL: Regex = Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").unwrap();
    static ref PROPERTY_TYPE_PATTERNS: Vec<(Regex, PropertyType)> =
        synonym_patterns(PROPERTY_TYPE_SYNONYMS);
    static ref LISTING_TYPE_PATTERNS: Vec<(Regex, ListingType)> =
        synonym_patterns(LISTING_TYPE_SYNONYMS);
}

// A synonym must stand as its own word, optionally pluralized. Digits may
// touch it so "3bhk" still reads as "bhk".
fn synonym_patterns<T: Copy>(table: &[(&str, T)]) -> Vec<(Regex, T)> {
    table
        .iter()
        .map(|(synonym, value)| {
            let pattern = format!(
                r"(?i)(?:^|[^\p{{L}}])({}(?:e?s)?)(?:$|[^\p{{L}}])",
                regex::escape(synonym)
            );
            (Regex::new(&pattern).unwrap(), *value)
        })
        .collect()
}

/// Price as it arrives from extraction: either already numeric or free text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl From<i64> for PriceInput {
    fn from(value: i64) -> Self {
        PriceInput::Number(value as f64)
    }
}

impl From<&str> for PriceInput {
    fn from(value: &str) -> Self {
        PriceInput::Text(value.to_string())
    }
}

/// Parse a price into whole rupees, expanding Cr / L / K units.
pub fn normalize_price<P: Into<PriceInput>>(input: P) -> NormalizationResult<i64> {
    let value = match input.into() {
        PriceInput::Number(n) => {
            if !n.is_finite() {
                return NormalizationResult::error("Invalid price format");
            }
            n
        }
        PriceInput::Text(text) => match parse_price_text(&text) {
            Some(n) => n,
            None => {
                debug!(target: TARGET_NORMALIZE, "Unparseable price: '{}'", text);
                return NormalizationResult::error("Invalid price format");
            }
        },
    };

    let rounded = value.round();
    if !rounded.is_finite() || rounded >= i64::MAX as f64 {
        return NormalizationResult::error("Invalid price format");
    }
    if rounded <= 0.0 {
        return NormalizationResult::error("Price must be greater than zero");
    }

    NormalizationResult::ok(rounded as i64)
}

fn parse_price_text(text: &str) -> Option<f64> {
    let lowered = text.to_lowercase().replace(',', "").replace("/-", "");
    let stripped = CURRENCY.replace_all(&lowered, "");
    let cleaned = stripped.trim();

    let captures = PRICE.captures(cleaned)?;
    let amount: f64 = captures.get(1)?.as_str().parse().ok()?;
    let multiplier = match captures.get(2).map(|m| m.as_str()) {
        Some("cr") | Some("crore") | Some("crores") => CRORE,
        Some("l") | Some("lakh") | Some("lakhs") | Some("lac") | Some("lacs") => LAKH,
        Some("k") => THOUSAND,
        _ => 1.0,
    };

    Some(amount * multiplier)
}

/// Canonicalize a phone number into `+<country><number>` form where possible.
pub fn normalize_phone(input: &str) -> NormalizationResult<String> {
    let has_plus = input.trim_start().starts_with('+');
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return NormalizationResult::error("Invalid phone number");
    }

    let normalized = if has_plus {
        format!("+{}", digits)
    } else {
        let local = digits.strip_prefix('0').unwrap_or(&digits);
        if local.len() == 10 {
            format!("+91{}", local)
        } else if local.len() == 12 && local.starts_with("91") {
            format!("+{}", local)
        } else {
            local.to_string()
        }
    };

    let digit_count = normalized.trim_start_matches('+').len();
    let result = NormalizationResult::ok(normalized);
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digit_count) {
        result.with_warning("Unusual phone number length")
    } else {
        result
    }
}

pub fn normalize_email(input: &str) -> NormalizationResult<String> {
    let email = input.trim().to_lowercase();
    if EMAIL.is_match(&email) {
        NormalizationResult::ok(email)
    } else {
        NormalizationResult::error("Invalid email format")
    }
}

/// Canonicalize a location into "Area, City" using the default city.
pub fn normalize_location(input: &str) -> NormalizationResult<String> {
    normalize_location_with_city(input, DEFAULT_CITY)
}

pub fn normalize_location_with_city(input: &str, default_city: &str) -> NormalizationResult<String> {
    let normalized = basic_normalize(input);
    if normalized.is_empty() {
        return NormalizationResult::error("Location is required");
    }

    let parts: Vec<&str> = normalized
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    let mut rendered: Vec<String> = Vec::with_capacity(parts.len() + 1);
    for (idx, part) in parts.iter().enumerate() {
        let value = if idx == 0 {
            canonical_area(part)
                .or_else(|| canonical_city(part))
                .map(str::to_string)
        } else {
            canonical_city(part)
                .or_else(|| canonical_area(part))
                .map(str::to_string)
        };
        rendered.push(value.unwrap_or_else(|| title_case(part)));
    }

    if parts.len() == 1 && find_city(&normalized).is_none() {
        rendered.push(default_city.to_string());
    }

    let location = rendered.join(", ");
    debug!(target: TARGET_NORMALIZE, "Normalized location '{}' to '{}'", input, location);
    NormalizationResult::ok(location)
}

/// Map free text onto one of the four property types. Never fails.
pub fn normalize_property_type(input: &str) -> NormalizationResult<PropertyType> {
    let normalized = basic_normalize(input);
    match earliest_synonym(&normalized, PROPERTY_TYPE_PATTERNS.as_slice()) {
        Some(property_type) => NormalizationResult::ok(property_type),
        None => NormalizationResult::ok(PropertyType::Residential)
            .with_warning("Unknown property type, defaulted to residential"),
    }
}

pub fn normalize_listing_type(input: &str) -> NormalizationResult<ListingType> {
    let lowered = input.trim().to_lowercase();
    match earliest_synonym(&lowered, LISTING_TYPE_PATTERNS.as_slice()) {
        Some(listing_type) => NormalizationResult::ok(listing_type),
        None => NormalizationResult::ok(ListingType::Sale)
            .with_warning("Unknown listing type, defaulted to sale"),
    }
}

fn earliest_synonym<T: Copy>(text: &str, table: &[(Regex, T)]) -> Option<T> {
    table
        .iter()
        .filter_map(|(pattern, value)| {
            let found = pattern.captures(text)?.get(1)?;
            Some((found.start(), *value))
        })
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, value)| value)
}

/// Unicode normalization, lowercase, punctuation (except commas) to spaces,
/// single spaces.
pub(crate) fn basic_normalize(input: &str) -> String {
    input
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != ',', " ")
        .split(',')
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join(",")
        .trim_matches(|c: char| c == ',' || c == ' ')
        .to_string()
}

pub(crate) fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
