//! Static lookup tables used by the field normalizers.
//!
//! Keys are in the form produced by `basic_normalize` (lowercase, single
//! spaces, no punctuation). Canonical spellings map to themselves so that
//! normalizing an already-normalized value is a no-op.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::types::{ListingType, PropertyType};

pub const DEFAULT_CITY: &str = "Hyderabad";

lazy_static! {
    // Area (locality) aliases
    pub static ref LOCATION_ALIASES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("gachi", "Gachibowli");
        map.insert("gachibowli", "Gachibowli");
        map.insert("gachibauli", "Gachibowli");

        map.insert("hitec city", "HITEC City");
        map.insert("hitech city", "HITEC City");
        map.insert("hi tech city", "HITEC City");
        map.insert("hitec", "HITEC City");

        map.insert("jubilee", "Jubilee Hills");
        map.insert("jubilee hills", "Jubilee Hills");
        map.insert("banjara", "Banjara Hills");
        map.insert("banjara hills", "Banjara Hills");

        map.insert("fin district", "Financial District");
        map.insert("financial dist", "Financial District");
        map.insert("financial district", "Financial District");
        map.insert("nanakramguda", "Nanakramguda");

        map.insert("kphb", "KPHB Colony");
        map.insert("kphb colony", "KPHB Colony");
        map.insert("kukatpally", "Kukatpally");
        map.insert("madhapur", "Madhapur");
        map.insert("kondapur", "Kondapur");
        map.insert("manikonda", "Manikonda");
        map.insert("narsingi", "Narsingi");
        map.insert("kokapet", "Kokapet");
        map.insert("tellapur", "Tellapur");
        map.insert("miyapur", "Miyapur");
        map.insert("kompally", "Kompally");
        map.insert("shamshabad", "Shamshabad");
        map.insert("begumpet", "Begumpet");
        map.insert("ameerpet", "Ameerpet");
        map.insert("lb nagar", "LB Nagar");
        map.insert("ecil", "ECIL");
        map
    };

    // City aliases; a location containing any of these needs no default city
    pub static ref CITY_ALIASES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("hyderabad", "Hyderabad");
        map.insert("hyd", "Hyderabad");
        map.insert("hyderbad", "Hyderabad");
        map.insert("secunderabad", "Secunderabad");
        map.insert("bangalore", "Bengaluru");
        map.insert("bengaluru", "Bengaluru");
        map.insert("mumbai", "Mumbai");
        map.insert("chennai", "Chennai");
        map.insert("pune", "Pune");
        map.insert("delhi", "Delhi");
        map.insert("vizag", "Visakhapatnam");
        map.insert("visakhapatnam", "Visakhapatnam");
        map.insert("vijayawada", "Vijayawada");
        map.insert("warangal", "Warangal");
        map
    };
}

// Property type synonyms, matched as whole words; the earliest occurrence wins
pub const PROPERTY_TYPE_SYNONYMS: &[(&str, PropertyType)] = &[
    ("residential", PropertyType::Residential),
    ("apartment", PropertyType::Residential),
    ("flat", PropertyType::Residential),
    ("bhk", PropertyType::Residential),
    ("villa", PropertyType::Residential),
    ("house", PropertyType::Residential),
    ("independent", PropertyType::Residential),
    ("duplex", PropertyType::Residential),
    ("penthouse", PropertyType::Residential),
    ("home", PropertyType::Residential),
    ("commercial", PropertyType::Commercial),
    ("office", PropertyType::Commercial),
    ("showroom", PropertyType::Commercial),
    ("shop", PropertyType::Commercial),
    ("retail", PropertyType::Commercial),
    ("warehouse", PropertyType::Commercial),
    ("complex", PropertyType::Commercial),
    ("agricultural", PropertyType::Agricultural),
    ("agriculture", PropertyType::Agricultural),
    ("farmland", PropertyType::Agricultural),
    ("farmhouse", PropertyType::Agricultural),
    ("farm", PropertyType::Agricultural),
    ("undeveloped", PropertyType::Undeveloped),
    ("open plot", PropertyType::Undeveloped),
    ("plot", PropertyType::Undeveloped),
    ("land", PropertyType::Undeveloped),
    ("venture", PropertyType::Undeveloped),
    ("site", PropertyType::Undeveloped),
];

pub const LISTING_TYPE_SYNONYMS: &[(&str, ListingType)] = &[
    ("development_partnership", ListingType::DevelopmentPartnership),
    ("development partnership", ListingType::DevelopmentPartnership),
    ("joint venture", ListingType::DevelopmentPartnership),
    ("jv", ListingType::DevelopmentPartnership),
    ("development", ListingType::DevelopmentPartnership),
    ("partnership", ListingType::DevelopmentPartnership),
    ("rental", ListingType::Rent),
    ("rent", ListingType::Rent),
    ("lease", ListingType::Rent),
    ("to let", ListingType::Rent),
    ("to-let", ListingType::Rent),
    ("resale", ListingType::Sale),
    ("sale", ListingType::Sale),
    ("selling", ListingType::Sale),
    ("sell", ListingType::Sale),
    ("buy", ListingType::Sale),
];

/// Look up a locality alias
pub fn canonical_area(normalized: &str) -> Option<&'static str> {
    LOCATION_ALIASES.get(normalized).copied()
}

/// Look up a city alias
pub fn canonical_city(normalized: &str) -> Option<&'static str> {
    CITY_ALIASES.get(normalized).copied()
}

/// Returns the first city mentioned as a whole word in `normalized`.
pub fn find_city(normalized: &str) -> Option<&'static str> {
    normalized
        .split(|c: char| c == ' ' || c == ',')
        .filter(|token| !token.is_empty())
        .find_map(canonical_city)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_values_map_to_themselves() {
        for canonical in LOCATION_ALIASES.values() {
            let key = canonical.to_lowercase();
            assert_eq!(canonical_area(&key), Some(*canonical), "{}", key);
        }
    }

    #[test]
    fn test_find_city() {
        assert_eq!(find_city("banjara hills hyderabad"), Some("Hyderabad"));
        assert_eq!(find_city("madhapur, hyd"), Some("Hyderabad"));
        assert_eq!(find_city("gachibowli"), None);
    }
}
