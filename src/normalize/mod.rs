pub mod aliases;
pub mod bounds;
pub mod fields;

pub use bounds::validate_bounds;
pub use fields::{
    normalize_email, normalize_listing_type, normalize_location, normalize_location_with_city,
    normalize_phone, normalize_price, normalize_property_type, PriceInput,
};

use std::collections::HashSet;
use tracing::debug;

use crate::types::{ExtractedProperty, NormalizationResult, PropertyNormalization};
use crate::TARGET_NORMALIZE;
use aliases::DEFAULT_CITY;

/// Whole-record normalizer.
///
/// Runs every field normalizer over a record and folds the diagnostics into
/// one list of warnings and one list of errors. Whether errors block
/// persistence is left to the caller.
#[derive(Debug, Clone)]
pub struct Normalizer {
    default_city: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            default_city: DEFAULT_CITY.to_string(),
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_city(mut self, city: &str) -> Self {
        self.default_city = city.to_string();
        self
    }

    pub fn default_city(&self) -> &str {
        &self.default_city
    }

    pub fn normalize_property(&self, mut property: ExtractedProperty) -> PropertyNormalization {
        let mut diagnostics = Diagnostics::default();

        if let Some(price) = property.price {
            let result = normalize_price(price);
            if let Some(value) = result.data {
                property.price = Some(value);
            }
            diagnostics.absorb("price", &result);
        }

        if let Some(location) = property.location.take() {
            let result = normalize_location_with_city(&location, &self.default_city);
            property.location = result.data.clone();
            diagnostics.absorb("location", &result);
        }

        // Contact fields are optional: an unusable value is dropped and
        // flagged rather than blocking the record.
        if let Some(phone) = property.contact_phone.take() {
            let result = normalize_phone(&phone);
            property.contact_phone = result.data.clone();
            diagnostics.absorb_as_warnings("contact_phone", &result);
        }
        if let Some(email) = property.contact_email.take() {
            let result = normalize_email(&email);
            property.contact_email = result.data.clone();
            diagnostics.absorb_as_warnings("contact_email", &result);
        }

        let context = describe(&property);
        if property.property_type.is_none() {
            let result = normalize_property_type(&context);
            property.property_type = result.data;
            diagnostics.absorb("property_type", &result);
        }
        if property.listing_type.is_none() {
            let result = normalize_listing_type(&context);
            property.listing_type = result.data;
            diagnostics.absorb("listing_type", &result);
        }

        property.features = clean_list(std::mem::take(&mut property.features));
        property.amenities = clean_list(std::mem::take(&mut property.amenities));
        property.title = property
            .title
            .take()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| generate_title(&property));

        let bounds = validate_bounds(&property);
        for warning in bounds.warnings {
            diagnostics.warn(warning);
        }
        for error in bounds.errors {
            diagnostics.fail(error);
        }

        debug!(
            target: TARGET_NORMALIZE,
            "Normalized {:?}: {} warnings, {} errors",
            property.source_url,
            diagnostics.warnings.len(),
            diagnostics.errors.len()
        );

        PropertyNormalization {
            data: property,
            warnings: diagnostics.warnings,
            errors: diagnostics.errors,
        }
    }
}

/// Normalize a record with the default configuration.
pub fn normalize_property(property: ExtractedProperty) -> PropertyNormalization {
    Normalizer::default().normalize_property(property)
}

#[derive(Default)]
struct Diagnostics {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl Diagnostics {
    fn warn(&mut self, message: String) {
        if !self.warnings.contains(&message) {
            self.warnings.push(message);
        }
    }

    fn fail(&mut self, message: String) {
        if !self.errors.contains(&message) {
            self.errors.push(message);
        }
    }

    fn absorb<T>(&mut self, field: &str, result: &NormalizationResult<T>) {
        for warning in &result.warnings {
            self.warn(format!("{}: {}", field, warning));
        }
        for error in &result.errors {
            self.fail(format!("{}: {}", field, error));
        }
    }

    fn absorb_as_warnings<T>(&mut self, field: &str, result: &NormalizationResult<T>) {
        for message in result.warnings.iter().chain(result.errors.iter()) {
            self.warn(format!("{}: {}", field, message));
        }
    }
}

fn describe(property: &ExtractedProperty) -> String {
    [property.title.as_deref(), property.description.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty() && seen.insert(item.to_lowercase()))
        .collect()
}

fn generate_title(property: &ExtractedProperty) -> Option<String> {
    let location = property.location.as_deref()?;
    let area = location.split(',').next().unwrap_or(location).trim();
    let kind = property.property_type.unwrap_or_default();
    let listing = match property.listing_type.unwrap_or_default() {
        crate::types::ListingType::Sale => "for Sale",
        crate::types::ListingType::Rent => "for Rent",
        crate::types::ListingType::DevelopmentPartnership => "for Development",
    };

    let prefix = match property.bedrooms {
        Some(bedrooms) if bedrooms > 0 => format!("{} BHK ", bedrooms),
        _ => String::new(),
    };

    Some(format!(
        "{}{} {} in {}",
        prefix,
        fields::title_case(kind.as_str()),
        listing,
        area
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ListingType, PropertyType};

    fn sample() -> ExtractedProperty {
        ExtractedProperty {
            description: Some("Spacious 3bhk flat for sale, gated community".to_string()),
            price: Some(12_000_000),
            location: Some("gachi".to_string()),
            bedrooms: Some(3),
            area: Some(1_650.0),
            contact_phone: Some("09876543210".to_string()),
            contact_email: Some("Agent@Example.com".to_string()),
            features: vec!["Gated Community".to_string(), " gated community ".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_property() {
        let result = normalize_property(sample());
        assert!(result.is_valid(), "{:?}", result.errors);
        let data = &result.data;
        assert_eq!(data.location.as_deref(), Some("Gachibowli, Hyderabad"));
        assert_eq!(data.contact_phone.as_deref(), Some("+919876543210"));
        assert_eq!(data.contact_email.as_deref(), Some("agent@example.com"));
        assert_eq!(data.property_type, Some(PropertyType::Residential));
        assert_eq!(data.listing_type, Some(ListingType::Sale));
        assert_eq!(data.features, vec!["Gated Community".to_string()]);
        assert_eq!(
            data.title.as_deref(),
            Some("3 BHK Residential for Sale in Gachibowli")
        );
    }

    #[test]
    fn test_normalize_property_is_idempotent() {
        let once = normalize_property(sample());
        let twice = normalize_property(once.data.clone());
        assert_eq!(once.data, twice.data);
        assert_eq!(once.errors, twice.errors);
    }

    #[test]
    fn test_missing_price_and_location_are_errors() {
        let result = normalize_property(ExtractedProperty {
            description: Some("lovely villa".to_string()),
            ..Default::default()
        });
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.starts_with("price:")));
        assert!(result.errors.iter().any(|e| e.starts_with("location:")));
    }

    #[test]
    fn test_bad_contact_is_dropped_with_warning() {
        let mut property = sample();
        property.contact_email = Some("nope".to_string());
        let result = normalize_property(property);
        assert!(result.is_valid());
        assert_eq!(result.data.contact_email, None);
        assert!(result.warnings.iter().any(|w| w.starts_with("contact_email:")));
    }

    #[test]
    fn test_zero_price_reports_one_error() {
        let mut property = sample();
        property.price = Some(0);
        let result = normalize_property(property);
        let price_errors: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.starts_with("price:"))
            .collect();
        assert_eq!(price_errors.len(), 1);
    }

    #[test]
    fn test_custom_default_city() {
        let normalizer = Normalizer::new().with_default_city("Pune");
        let mut property = sample();
        property.location = Some("baner".to_string());
        let result = normalizer.normalize_property(property);
        assert_eq!(result.data.location.as_deref(), Some("Baner, Pune"));
    }
}
