use crate::types::{ExtractedProperty, NormalizationResult};

pub const MIN_PRICE: i64 = 100_000;
pub const MAX_PRICE: i64 = 1_000_000_000;
pub const MAX_ROOMS: i32 = 20;
pub const MIN_AREA: f64 = 100.0;
pub const MAX_AREA: f64 = 100_000.0;
pub const MIN_LAND_SIZE: f64 = 100.0;
pub const MAX_LAND_SIZE: f64 = 1_000_000.0;

/// Sanity-check numeric fields.
///
/// Unusual values are warnings. Missing price or location, and values that
/// cannot be physical (zero or negative), are errors.
pub fn validate_bounds(property: &ExtractedProperty) -> NormalizationResult<()> {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    match property.price {
        None => errors.push("price: Price is required".to_string()),
        Some(price) if price <= 0 => {
            errors.push("price: Price must be greater than zero".to_string())
        }
        Some(price) if !(MIN_PRICE..=MAX_PRICE).contains(&price) => warnings.push(format!(
            "price: {} is outside the expected range ({} - {})",
            price, MIN_PRICE, MAX_PRICE
        )),
        _ => {}
    }

    if property
        .location
        .as_deref()
        .map_or(true, |l| l.trim().is_empty())
    {
        errors.push("location: Location is required".to_string());
    }

    for (field, value) in [
        ("bedrooms", property.bedrooms),
        ("bathrooms", property.bathrooms),
    ] {
        match value {
            Some(v) if v < 0 => errors.push(format!("{}: cannot be negative", field)),
            Some(v) if v > MAX_ROOMS => {
                warnings.push(format!("{}: {} is unusually high", field, v))
            }
            _ => {}
        }
    }

    for (field, value, min, max) in [
        ("area", property.area, MIN_AREA, MAX_AREA),
        ("land_size", property.land_size, MIN_LAND_SIZE, MAX_LAND_SIZE),
    ] {
        match value {
            Some(v) if v <= 0.0 => errors.push(format!("{}: must be greater than zero", field)),
            Some(v) if v < min || v > max => warnings.push(format!(
                "{}: {} sq ft is outside the expected range ({} - {})",
                field, v, min, max
            )),
            _ => {}
        }
    }

    NormalizationResult {
        data: if errors.is_empty() { Some(()) } else { None },
        warnings,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ExtractedProperty {
        ExtractedProperty {
            price: Some(7_500_000),
            location: Some("Gachibowli, Hyderabad".to_string()),
            bedrooms: Some(2),
            area: Some(1_200.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_record_is_clean() {
        let result = validate_bounds(&valid());
        assert!(result.is_ok());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_required_fields_are_errors() {
        let result = validate_bounds(&ExtractedProperty::default());
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_out_of_range_values_are_warnings() {
        let mut property = valid();
        property.price = Some(50_000);
        property.bedrooms = Some(25);
        property.area = Some(250_000.0);
        property.land_size = Some(50.0);
        let result = validate_bounds(&property);
        assert!(result.is_ok());
        assert_eq!(result.warnings.len(), 4);
    }

    #[test]
    fn test_non_physical_values_are_errors() {
        let mut property = valid();
        property.area = Some(0.0);
        property.bathrooms = Some(-1);
        let result = validate_bounds(&property);
        assert_eq!(result.errors.len(), 2);
    }
}
