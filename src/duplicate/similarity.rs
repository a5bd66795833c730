use strsim::levenshtein;

/// Edit-distance similarity as a percentage: `(1 - distance / max_len) * 100`.
///
/// Comparison is case-insensitive and ignores surrounding whitespace. Two
/// empty strings are identical.
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100.0;
    }

    let distance = levenshtein(&a, &b);
    (1.0 - distance as f64 / max_len as f64) * 100.0
}

/// Ratio of the smaller to the larger value, as a percentage. Non-positive
/// input has no meaningful similarity.
pub fn numeric_similarity(a: f64, b: f64) -> f64 {
    if a <= 0.0 || b <= 0.0 {
        return 0.0;
    }
    a.min(b) / a.max(b) * 100.0
}

/// Inclusive price band of `price ± fraction`.
pub fn price_band(price: i64, fraction: f64) -> (i64, i64) {
    let delta = price as f64 * fraction;
    (
        (price as f64 - delta).floor() as i64,
        (price as f64 + delta).ceil() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_similarity() {
        assert_eq!(levenshtein_similarity("Gachibowli", "gachibowli"), 100.0);
        assert_eq!(levenshtein_similarity("", ""), 100.0);
        assert_eq!(levenshtein_similarity("abc", ""), 0.0);

        // one edit over ten characters
        let similarity = levenshtein_similarity("Gachibowli", "Gachibowly");
        assert!((similarity - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_similarity() {
        assert!((numeric_similarity(1_000.0, 900.0) - 90.0).abs() < 1e-9);
        assert_eq!(numeric_similarity(0.0, 900.0), 0.0);
    }

    #[test]
    fn test_price_band() {
        assert_eq!(price_band(10_000_000, 0.1), (9_000_000, 11_000_000));
    }
}
