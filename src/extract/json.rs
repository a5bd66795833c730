use serde_json::Value;

use crate::normalize::{normalize_listing_type, normalize_price, normalize_property_type};
use crate::types::ExtractedProperty;

/// Pull the JSON object out of a model response.
///
/// Looks for a ```json fence first, then a bare ``` fence, then the
/// outermost `{...}` span.
pub fn extract_json_object(response: &str) -> Option<&str> {
    if let Some(start) = response.find("```json") {
        let body = &response[start + 7..];
        if let Some(end) = body.find("```") {
            return object_span(body[..end].trim());
        }
    }

    if let Some(start) = response.find("```") {
        let body = &response[start + 3..];
        if let Some(end) = body.find("```") {
            if let Some(object) = object_span(body[..end].trim()) {
                return Some(object);
            }
        }
    }

    object_span(response)
}

fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse the object returned by the model into a candidate record.
///
/// Keys may be camelCase or snake_case and numbers may arrive as strings.
/// Fields that fail to parse are left empty.
pub fn parse_llm_property(response: &str) -> Option<ExtractedProperty> {
    let object = extract_json_object(response)?;
    let value: Value = serde_json::from_str(object).ok()?;
    let map = value.as_object()?;

    let get = |camel: &str, snake: &str| {
        map.get(camel)
            .or_else(|| map.get(snake))
            .filter(|v| !v.is_null())
    };

    let price = get("price", "price").and_then(|v| match v {
        Value::Number(n) => n.as_f64().and_then(|f| normalize_price(f as i64).data),
        Value::String(s) => normalize_price(s.as_str()).data,
        _ => None,
    });

    let property_type = get("propertyType", "property_type")
        .and_then(Value::as_str)
        .and_then(|s| {
            let result = normalize_property_type(s);
            result.warnings.is_empty().then_some(result.data).flatten()
        });
    let listing_type = get("listingType", "listing_type")
        .and_then(Value::as_str)
        .and_then(|s| {
            let result = normalize_listing_type(s);
            result.warnings.is_empty().then_some(result.data).flatten()
        });

    Some(ExtractedProperty {
        title: get("title", "title").and_then(as_text),
        description: get("description", "description").and_then(as_text),
        price,
        location: get("location", "location").and_then(as_text),
        bedrooms: get("bedrooms", "bedrooms").and_then(as_number).map(|n| n as i32),
        bathrooms: get("bathrooms", "bathrooms").and_then(as_number).map(|n| n as i32),
        area: get("area", "area").and_then(as_number),
        land_size: get("landSize", "land_size").and_then(as_number),
        property_type,
        listing_type,
        contact_phone: get("contactPhone", "contact_phone").and_then(as_text),
        contact_email: get("contactEmail", "contact_email").and_then(as_text),
        contact_name: get("contactName", "contact_name").and_then(as_text),
        features: get("features", "features").map(as_list).unwrap_or_default(),
        amenities: get("amenities", "amenities").map(as_list).unwrap_or_default(),
        ..Default::default()
    })
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .filter(|c| *c != ',')
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn as_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
