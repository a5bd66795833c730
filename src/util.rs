use sha2::{Digest, Sha256};
use url::Url;
use urlnorm::UrlNormalizer;

/// Normalize a post URL for exact-match comparison. Unparseable input is
/// compared as trimmed text.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    match Url::parse(trimmed) {
        Ok(parsed) => UrlNormalizer::default().compute_normalization_string(&parsed),
        Err(_) => trimmed.to_string(),
    }
}

/// Hex-encoded SHA-256 of `text`
pub fn text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_is_stable() {
        let url = "https://www.instagram.com/p/Cx12ab/";
        assert_eq!(normalize_url(url), normalize_url(url));
        assert_eq!(normalize_url("not a url "), "not a url");
    }

    #[test]
    fn test_text_hash_ignores_surrounding_whitespace() {
        assert_eq!(text_hash("3bhk flat"), text_hash("  3bhk flat\n"));
        assert_ne!(text_hash("3bhk flat"), text_hash("2bhk flat"));
        assert_eq!(text_hash("x").len(), 64);
    }
}
