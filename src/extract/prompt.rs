/// Prompt asking the model to turn a listing caption into a property record.
///
/// `default_city` is the city to assume when the caption only names a
/// locality.
pub fn property_extraction_prompt(caption: &str, default_city: &str) -> String {
    format!(
        r#"
You extract structured real-estate listings from Indian social media posts.

POST CAPTION:
----------
{caption}
----------

TASK: Extract the property being advertised in this caption.

EXTRACTION GUIDELINES:
1. Price:
   - Return the asking price in whole rupees as a number
   - Expand units: 1 Cr = 10000000, 1 Lakh (L, Lac) = 100000, 1 K = 1000
   - For rentals, return the monthly rent
2. Location:
   - Return "Locality, City", e.g. "Gachibowli, Hyderabad"
   - If only a locality is named, assume the city is {default_city}
3. Rooms and sizes:
   - bedrooms from "BHK" or "bedrooms"; bathrooms from "baths" or "toilets"
   - area is the built-up area in square feet
   - landSize is the plot size in square feet (1 sq yard = 9 sq ft, 1 acre = 43560 sq ft)
4. Types:
   - propertyType: residential | commercial | agricultural | undeveloped
   - listingType: sale | rent | development_partnership
5. Contacts: phone number, email and contact name exactly as written
6. Omit any field that the caption does not state. Do not guess.

RETURN FORMAT (JSON):
{{
  "title": "Short listing title",
  "description": "One sentence summary",
  "price": 0,
  "location": "Locality, City",
  "bedrooms": 0,
  "bathrooms": 0,
  "area": 0,
  "landSize": 0,
  "propertyType": "residential",
  "listingType": "sale",
  "contactPhone": "",
  "contactEmail": "",
  "contactName": "",
  "features": ["..."],
  "amenities": ["..."]
}}

Respond with the JSON object only.
"#,
        caption = caption.trim(),
        default_city = default_city
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_caption_and_city() {
        let prompt = property_extraction_prompt("  3BHK in Kondapur  ", "Hyderabad");
        assert!(prompt.contains("----------\n3BHK in Kondapur\n----------"));
        assert!(prompt.contains("assume the city is Hyderabad"));
        assert!(prompt.contains("\"landSize\": 0"));
    }
}
