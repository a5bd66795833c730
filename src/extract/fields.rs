//! Regex heuristics, one extractor per field.
//!
//! Every extractor reads the caption and fills at most one field group of
//! the record. Extractors never overwrite a value that is already set, so
//! they can run in any order and be tested in isolation.

use lazy_static::lazy_static;
use regex::Regex;

use crate::normalize::aliases::LOCATION_ALIASES;
use crate::normalize::{normalize_listing_type, normalize_price, normalize_property_type};
use crate::types::ExtractedProperty;

pub type FieldExtractor = fn(&str, &mut ExtractedProperty);

const SQ_FT_PER_SQ_YARD: f64 = 9.0;
const SQ_FT_PER_SQ_METER: f64 = 10.7639;
const SQ_FT_PER_ACRE: f64 = 43_560.0;
const SQ_FT_PER_GUNTA: f64 = 1_089.0;
const MAX_TITLE_CHARS: usize = 80;
const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 13;

lazy_static! {
    static ref LABELED_PRICE: Regex = Regex::new(
        r"(?i)(?:\b(?:price|cost|asking|rs|inr)\b\.?|₹)\s*[:\-]?\s*(?:₹|\brs\b\.?)?\s*(\d[\d,]*(?:\.\d+)?)\s*(crores?|cr|lakhs?|lacs?|l|k)?\b"
    )
    .unwrap();
    static ref UNIT_PRICE: Regex =
        Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(crores?|cr|lakhs?|lacs?|l)\b").unwrap();
    static ref BEDROOMS: Regex =
        Regex::new(r"(?i)\b(\d{1,2})\s*(?:bhk|bed(?:room)?s?|br)\b").unwrap();
    static ref BATHROOMS: Regex =
        Regex::new(r"(?i)\b(\d{1,2})\s*(?:bath(?:room)?s?|toilets?|washrooms?)\b").unwrap();
    static ref AREA_SQFT: Regex = Regex::new(
        r"(?i)\b(\d[\d,]*(?:\.\d+)?)\s*(?:sq\.?\s*ft|sqft|sft|square\s*feet|sq\.?\s*feet)\b"
    )
    .unwrap();
    static ref AREA_SQM: Regex =
        Regex::new(r"(?i)\b(\d[\d,]*(?:\.\d+)?)\s*(?:sq\.?\s*m|sqm|square\s*met(?:er|re)s?)\b")
            .unwrap();
    static ref LAND: Regex = Regex::new(
        r"(?i)\b(\d[\d,]*(?:\.\d+)?)\s*(sq\.?\s*y(?:ar)?ds?|square\s*yards?|gaj|acres?|guntas?)\b"
    )
    .unwrap();
    static ref PHONE: Regex = Regex::new(r"\+?\d[\d\s\-]{8,16}\d").unwrap();
    static ref EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap();
    static ref PHONE_DIGITS: Regex = Regex::new(r"\+?\d+").unwrap();
    // A bare "location" or "address" needs a separator; the pin and
    // "located at" do not. The value never continues onto the next line.
    static ref LABELED_LOCATION: Regex = Regex::new(
        r"(?i)(?:📍(?:[ \t]*(?:location|loc|address)\b[ \t]*[:\-]?)?|\b(?:location|loc|address)\b[ \t]*[:\-]|\blocated at\b)[ \t]*([^\n|#•]+)"
    )
    .unwrap();
    static ref FIELD_LABEL: Regex = Regex::new(
        r"(?i)^(?:(?:price|cost|rent|call|contact|whats\s*app|phone|mobile|email|area|size)\b|₹|rs\b)"
    )
    .unwrap();
    static ref KNOWN_AREA: Regex = {
        let mut keys: Vec<&str> = LOCATION_ALIASES.keys().copied().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let alternation = keys
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).unwrap()
    };
    static ref IN_PLACE: Regex =
        Regex::new(r"\b(?:[Ii]n|[Aa]t)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)").unwrap();
    static ref CONTACT_NAME: Regex = Regex::new(
        r"\b(?:[Cc]ontact|CONTACT|[Cc]all|CALL|[Ww]hats[Aa]pp)\s*(?:[Pp]erson)?\s*[:\-]?\s*([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)"
    )
    .unwrap();

    static ref FEATURES: Vec<(Regex, &'static str)> = word_table(&[
        (&["gated community", "gated"], "Gated Community"),
        (&["east facing"], "East Facing"),
        (&["west facing"], "West Facing"),
        (&["north facing"], "North Facing"),
        (&["south facing"], "South Facing"),
        (&["corner plot", "corner flat", "corner unit"], "Corner Property"),
        (&["vastu", "vaastu"], "Vastu Compliant"),
        (&["ready to move", "ready to occupy", "rtm"], "Ready to Move"),
        (&["under construction"], "Under Construction"),
        (&["rera"], "RERA Approved"),
        (&["hmda"], "HMDA Approved"),
        (&["dtcp"], "DTCP Approved"),
        (&["clear title"], "Clear Title"),
        (&["loan available", "bank loan"], "Loan Available"),
    ]);

    static ref AMENITIES: Vec<(Regex, &'static str)> = word_table(&[
        (&["swimming pool", "pool"], "Swimming Pool"),
        (&["gym", "gymnasium"], "Gym"),
        (&["clubhouse", "club house"], "Clubhouse"),
        (&["power backup"], "Power Backup"),
        (&["lift", "lifts", "elevator"], "Lift"),
        (&["parking", "car parking"], "Parking"),
        (&["security", "cctv"], "Security"),
        (&["play area", "kids play area", "park"], "Play Area"),
        (&["garden", "landscaped"], "Garden"),
        (&["jogging track", "walking track"], "Jogging Track"),
    ]);
}

fn word_table(rows: &[(&[&str], &'static str)]) -> Vec<(Regex, &'static str)> {
    rows.iter()
        .map(|(words, label)| {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)\b(?:{})\b", alternation);
            (Regex::new(&pattern).unwrap(), *label)
        })
        .collect()
}

/// The extractors in the order `extract_with_regex` runs them.
pub const FIELD_EXTRACTORS: &[(&str, FieldExtractor)] = &[
    ("price", extract_price),
    ("bedrooms", extract_bedrooms),
    ("bathrooms", extract_bathrooms),
    ("area", extract_area),
    ("land_size", extract_land_size),
    ("property_type", extract_property_type),
    ("listing_type", extract_listing_type),
    ("contact_phone", extract_phone),
    ("contact_email", extract_email),
    ("contact_name", extract_contact_name),
    ("location", extract_location),
    ("features", extract_features),
    ("amenities", extract_amenities),
    ("title", extract_title),
];

pub fn extract_price(text: &str, property: &mut ExtractedProperty) {
    if property.price.is_some() {
        return;
    }

    let candidates = LABELED_PRICE
        .captures_iter(text)
        .chain(UNIT_PRICE.captures_iter(text));
    for captures in candidates {
        let amount = captures.get(1).map_or("", |m| m.as_str());
        let unit = captures.get(2).map_or("", |m| m.as_str());
        let parsed = normalize_price(format!("{}{}", amount, unit).as_str());
        if let Some(price) = parsed.data {
            property.price = Some(price);
            return;
        }
    }
}

pub fn extract_bedrooms(text: &str, property: &mut ExtractedProperty) {
    if property.bedrooms.is_none() {
        property.bedrooms = first_number(&BEDROOMS, text).map(|n| n as i32);
    }
}

pub fn extract_bathrooms(text: &str, property: &mut ExtractedProperty) {
    if property.bathrooms.is_none() {
        property.bathrooms = first_number(&BATHROOMS, text).map(|n| n as i32);
    }
}

pub fn extract_area(text: &str, property: &mut ExtractedProperty) {
    if property.area.is_some() {
        return;
    }
    property.area = first_number(&AREA_SQFT, text)
        .or_else(|| first_number(&AREA_SQM, text).map(|sqm| (sqm * SQ_FT_PER_SQ_METER).round()));
}

pub fn extract_land_size(text: &str, property: &mut ExtractedProperty) {
    if property.land_size.is_some() {
        return;
    }

    let Some(captures) = LAND.captures(text) else {
        return;
    };
    let Some(amount) = captures.get(1).and_then(|m| parse_number(m.as_str())) else {
        return;
    };
    let unit = captures.get(2).map_or("", |m| m.as_str()).to_lowercase();
    let factor = if unit.starts_with("acre") {
        SQ_FT_PER_ACRE
    } else if unit.starts_with("gunta") {
        SQ_FT_PER_GUNTA
    } else {
        SQ_FT_PER_SQ_YARD
    };
    property.land_size = Some((amount * factor).round());
}

pub fn extract_property_type(text: &str, property: &mut ExtractedProperty) {
    if property.property_type.is_some() {
        return;
    }
    let result = normalize_property_type(text);
    if result.warnings.is_empty() {
        property.property_type = result.data;
    }
}

pub fn extract_listing_type(text: &str, property: &mut ExtractedProperty) {
    if property.listing_type.is_some() {
        return;
    }
    let result = normalize_listing_type(text);
    if result.warnings.is_empty() {
        property.listing_type = result.data;
    }
}

pub fn extract_phone(text: &str, property: &mut ExtractedProperty) {
    if property.contact_phone.is_some() {
        return;
    }
    property.contact_phone = PHONE
        .find_iter(text)
        .find_map(|m| phone_in_run(m.as_str()))
        .map(str::to_string);
}

/// The first stretch of adjacent digit groups in `run` long enough to be a
/// phone number, so "2024 9876543210" yields "9876543210".
fn phone_in_run(run: &str) -> Option<&str> {
    let groups: Vec<_> = PHONE_DIGITS.find_iter(run).collect();
    for start in 0..groups.len() {
        let mut digits = 0;
        let mut longest = None;
        for end in start..groups.len() {
            digits += groups[end].as_str().trim_start_matches('+').len();
            if digits > MAX_PHONE_DIGITS {
                break;
            }
            if digits >= MIN_PHONE_DIGITS {
                longest = Some(&run[groups[start].start()..groups[end].end()]);
            }
        }
        if longest.is_some() {
            return longest;
        }
    }
    None
}

pub fn extract_email(text: &str, property: &mut ExtractedProperty) {
    if property.contact_email.is_none() {
        property.contact_email = EMAIL.find(text).map(|m| m.as_str().to_string());
    }
}

pub fn extract_contact_name(text: &str, property: &mut ExtractedProperty) {
    if property.contact_name.is_none() {
        property.contact_name = CONTACT_NAME
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
    }
}

/// Location from a labelled line, a known locality, or "in <Place>".
pub fn extract_location(text: &str, property: &mut ExtractedProperty) {
    if property.location.is_some() {
        return;
    }

    let labeled = LABELED_LOCATION
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().trim_end_matches(['.', '!']).to_string())
        .filter(|s| !s.is_empty() && !FIELD_LABEL.is_match(s));

    property.location = labeled
        .or_else(|| known_area_with_city(text))
        .or_else(|| {
            IN_PLACE
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        });
}

fn known_area_with_city(text: &str) -> Option<String> {
    let found = KNOWN_AREA.find(text)?;
    let rest = &text[found.end()..];
    // Keep an explicit ", City" that directly follows the locality
    let city = rest
        .strip_prefix(',')
        .map(str::trim_start)
        .and_then(|r| r.split(|c: char| !c.is_alphabetic()).next())
        .filter(|word| crate::normalize::aliases::canonical_city(&word.to_lowercase()).is_some());

    Some(match city {
        Some(city) => format!("{}, {}", found.as_str(), city),
        None => found.as_str().to_string(),
    })
}

pub fn extract_features(text: &str, property: &mut ExtractedProperty) {
    if !property.features.is_empty() {
        return;
    }
    property.features = matching_labels(&FEATURES, text);

    let lowered = text.to_lowercase();
    let furnishing = if lowered.contains("semi furnished") || lowered.contains("semi-furnished") {
        Some("Semi Furnished")
    } else if lowered.contains("unfurnished") {
        Some("Unfurnished")
    } else if lowered.contains("furnished") {
        Some("Fully Furnished")
    } else {
        None
    };
    if let Some(label) = furnishing {
        property.features.push(label.to_string());
    }
}

pub fn extract_amenities(text: &str, property: &mut ExtractedProperty) {
    if property.amenities.is_empty() {
        property.amenities = matching_labels(&AMENITIES, text);
    }
}

/// First caption line with real words, stripped of emoji and hashtags.
pub fn extract_title(text: &str, property: &mut ExtractedProperty) {
    if property.title.is_some() {
        return;
    }

    property.title = text
        .lines()
        .map(|line| {
            line.split_whitespace()
                .filter(|word| !word.starts_with('#') && !word.starts_with('@'))
                .map(|word| {
                    word.chars()
                        .filter(|c| c.is_alphanumeric() || ",.-&/()'".contains(*c))
                        .collect::<String>()
                })
                .filter(|word| !word.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .find(|line| line.chars().filter(|c| c.is_alphabetic()).count() >= 5)
        .map(|line| line.chars().take(MAX_TITLE_CHARS).collect::<String>().trim().to_string());
}

fn matching_labels(table: &[(Regex, &'static str)], text: &str) -> Vec<String> {
    table
        .iter()
        .filter(|(pattern, _)| pattern.is_match(text))
        .map(|(_, label)| label.to_string())
        .collect()
}

fn first_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_number(m.as_str()))
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ListingType, PropertyType};

    fn run(extractor: FieldExtractor, text: &str) -> ExtractedProperty {
        let mut property = ExtractedProperty::default();
        extractor(text, &mut property);
        property
    }

    #[test]
    fn test_price() {
        assert_eq!(run(extract_price, "Price: 1.5 Cr negotiable").price, Some(15_000_000));
        assert_eq!(run(extract_price, "2BHK at just 75L!").price, Some(7_500_000));
        assert_eq!(run(extract_price, "₹45,00,000 only").price, Some(4_500_000));
        assert_eq!(run(extract_price, "Rs. 90 lakhs").price, Some(9_000_000));
        assert_eq!(run(extract_price, "3bhk 1500 sqft, call now").price, None);
    }

    #[test]
    fn test_rooms() {
        let text = "Spacious 3 BHK with 2 bathrooms";
        assert_eq!(run(extract_bedrooms, text).bedrooms, Some(3));
        assert_eq!(run(extract_bathrooms, text).bathrooms, Some(2));
        assert_eq!(run(extract_bedrooms, "2bhk flat").bedrooms, Some(2));
    }

    #[test]
    fn test_area_and_land() {
        assert_eq!(run(extract_area, "1,650 sft carpet").area, Some(1650.0));
        assert_eq!(run(extract_area, "area 1200 sq.ft").area, Some(1200.0));
        assert_eq!(run(extract_land_size, "200 sq yards plot").land_size, Some(1800.0));
        assert_eq!(run(extract_land_size, "2 acres farm").land_size, Some(87_120.0));
    }

    #[test]
    fn test_types() {
        assert_eq!(
            run(extract_property_type, "Open plot for sale").property_type,
            Some(PropertyType::Undeveloped)
        );
        assert_eq!(run(extract_property_type, "no hints here").property_type, None);
        assert_eq!(
            run(extract_listing_type, "Flat for rent").listing_type,
            Some(ListingType::Rent)
        );
        assert_eq!(
            run(extract_listing_type, "Current price 80L, 3BHK flat for sale").listing_type,
            Some(ListingType::Sale)
        );
        assert_eq!(
            run(extract_property_type, "Opposite Inorbit Mall, 3BHK flat for sale").property_type,
            Some(PropertyType::Residential)
        );
    }

    #[test]
    fn test_contacts() {
        let text = "Contact Ravi Kumar: 98765 43210 or sales@homes.in";
        assert_eq!(run(extract_phone, text).contact_phone.as_deref(), Some("98765 43210"));
        assert_eq!(run(extract_email, text).contact_email.as_deref(), Some("sales@homes.in"));
        assert_eq!(run(extract_contact_name, text).contact_name.as_deref(), Some("Ravi Kumar"));
        assert_eq!(run(extract_phone, "price 45,00,000").contact_phone, None);
    }

    #[test]
    fn test_phone_inside_longer_digit_run() {
        assert_eq!(
            run(extract_phone, "Since 2024 9876543210 call").contact_phone.as_deref(),
            Some("9876543210")
        );
        assert_eq!(
            run(extract_phone, "+91 98765 43210").contact_phone.as_deref(),
            Some("+91 98765 43210")
        );
        assert_eq!(run(extract_phone, "id 12345678901234567").contact_phone, None);
    }

    #[test]
    fn test_location() {
        assert_eq!(
            run(extract_location, "📍 Kondapur, Hyderabad\nCall now").location.as_deref(),
            Some("Kondapur, Hyderabad")
        );
        assert_eq!(
            run(extract_location, "Luxury villa near gachibowli, hyderabad with pool")
                .location
                .as_deref(),
            Some("gachibowli, hyderabad")
        );
        assert_eq!(
            run(extract_location, "3BHK flat in Jubilee Hills").location.as_deref(),
            Some("Jubilee Hills")
        );
        assert_eq!(
            run(extract_location, "Plot in Shadnagar available").location.as_deref(),
            Some("Shadnagar")
        );
        assert_eq!(
            run(extract_location, "📍 Location: Kondapur, Hyderabad").location.as_deref(),
            Some("Kondapur, Hyderabad")
        );
        assert_eq!(
            run(extract_location, "Villa located at Kokapet").location.as_deref(),
            Some("Kokapet")
        );
    }

    #[test]
    fn test_location_label_stays_on_its_line() {
        let property = run(extract_location, "Spacious 3BHK flat, DM for address\nPrice: 1.2 Cr");
        assert_eq!(property.location, None);

        let property = run(extract_location, "Location:\nPrice: 1.2 Cr");
        assert_eq!(property.location, None);

        let property = run(extract_location, "📍\nCall 98765 43210");
        assert_eq!(property.location, None);

        let property = run(extract_location, "Location - Price on request");
        assert_eq!(property.location, None);
    }

    #[test]
    fn test_features_and_amenities() {
        let property = run(
            extract_features,
            "East facing, semi-furnished flat in a gated community",
        );
        assert_eq!(
            property.features,
            vec!["Gated Community", "East Facing", "Semi Furnished"]
        );

        let amenities = run(extract_amenities, "Pool, gym and covered car parking").amenities;
        assert_eq!(amenities, vec!["Swimming Pool", "Gym", "Parking"]);
    }

    #[test]
    fn test_title() {
        let property = run(extract_title, "🏡✨\n🔥 Premium 3BHK Villa for Sale 🔥 #hyderabad");
        assert_eq!(property.title.as_deref(), Some("Premium 3BHK Villa for Sale"));
    }

    #[test]
    fn test_extractors_never_overwrite() {
        let mut property = ExtractedProperty {
            price: Some(1),
            ..Default::default()
        };
        extract_price("Price: 2 Cr", &mut property);
        assert_eq!(property.price, Some(1));
    }
}
