//! Caption to candidate property record.
//!
//! Regex heuristics run first. When they leave the record without a price
//! or a location and an LLM is configured, the model is asked for the same
//! record and its answer fills the gaps. Regex values always win.

pub mod fields;
pub mod json;
pub mod prompt;

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::llm::{generate_llm_response, RetryPolicy};
use crate::normalize::aliases::DEFAULT_CITY;
use crate::types::{ExtractedProperty, RawPost};
use crate::util::text_hash;
use crate::{LLMParams, TARGET_EXTRACT, TARGET_LLM_REQUEST};

pub use fields::{FieldExtractor, FIELD_EXTRACTORS};
pub use json::{extract_json_object, parse_llm_property};
pub use prompt::property_extraction_prompt;

pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(12);
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Run every field extractor over `text` in order.
pub fn extract_with_regex(text: &str) -> ExtractedProperty {
    let mut property = ExtractedProperty::default();
    for (name, extractor) in FIELD_EXTRACTORS {
        extractor(text, &mut property);
        debug!(target: TARGET_EXTRACT, "Regex extractor '{}' done", name);
    }
    property
}

/// A candidate is worth normalizing without help once it has a price and a
/// location.
pub fn is_sufficient(property: &ExtractedProperty) -> bool {
    property.price.is_some() && property.location.is_some()
}

/// Time still to wait before the next LLM call is allowed.
fn remaining_spacing(last_call: Option<Instant>, now: Instant, spacing: Duration) -> Duration {
    match last_call {
        Some(last) => spacing.saturating_sub(now.saturating_duration_since(last)),
        None => Duration::ZERO,
    }
}

pub struct Extractor<C: Clock = SystemClock> {
    llm: Option<LLMParams>,
    default_city: String,
    rate_limit: Duration,
    llm_timeout: Duration,
    retry: RetryPolicy,
    last_llm_call: Option<Instant>,
    cache: TtlCache<String, ExtractedProperty, C>,
}

impl Extractor<SystemClock> {
    pub fn new(llm: Option<LLMParams>) -> Self {
        Self::with_cache(llm, TtlCache::new(DEFAULT_CACHE_TTL))
    }
}

impl<C: Clock> Extractor<C> {
    pub fn with_cache(llm: Option<LLMParams>, cache: TtlCache<String, ExtractedProperty, C>) -> Self {
        Extractor {
            llm,
            default_city: DEFAULT_CITY.to_string(),
            rate_limit: DEFAULT_RATE_LIMIT,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
            retry: RetryPolicy::default(),
            last_llm_call: None,
            cache,
        }
    }

    pub fn with_rate_limit(mut self, spacing: Duration) -> Self {
        self.rate_limit = spacing;
        self
    }

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_default_city(mut self, city: &str) -> Self {
        self.default_city = city.to_string();
        self
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Extract a candidate record from a post.
    ///
    /// Results are cached by caption hash, so reposts of the same caption
    /// do not cost a second LLM call. Post provenance (URL, handle, images)
    /// always comes from `post` itself.
    pub async fn extract(&mut self, post: &RawPost) -> ExtractedProperty {
        let key = text_hash(&post.text);

        let candidate = match self.cache.get(&key) {
            Some(cached) => {
                debug!(target: TARGET_EXTRACT, "Extraction cache hit for {}", post.post_url);
                cached
            }
            None => {
                self.cache.purge_expired();
                let candidate = self.extract_caption(&post.text).await;
                self.cache.insert(key, candidate.clone());
                candidate
            }
        };

        let mut property = ExtractedProperty::from_post(post);
        let caption = property.description.take();
        property.merge_missing(candidate);
        if property.description.is_none() {
            property.description = caption;
        }
        property
    }

    async fn extract_caption(&mut self, text: &str) -> ExtractedProperty {
        let mut candidate = extract_with_regex(text);
        if is_sufficient(&candidate) {
            return candidate;
        }

        let Some(params) = self.llm.clone() else {
            return candidate;
        };

        let wait = remaining_spacing(self.last_llm_call, Instant::now(), self.rate_limit);
        if !wait.is_zero() {
            info!(target: TARGET_LLM_REQUEST, "Waiting {:?} before next LLM extraction", wait);
            sleep(wait).await;
        }
        self.last_llm_call = Some(Instant::now());

        let prompt = property_extraction_prompt(text, &self.default_city);
        match generate_llm_response(&prompt, &params, self.llm_timeout, &self.retry).await {
            Some(response) => match parse_llm_property(&response) {
                Some(from_llm) => {
                    debug!(target: TARGET_LLM_REQUEST, "LLM extraction: {:?}", from_llm);
                    candidate.merge_missing(from_llm);
                }
                None => {
                    warn!(target: TARGET_LLM_REQUEST, "LLM response had no usable JSON object, keeping regex result");
                }
            },
            None => {
                warn!(target: TARGET_LLM_REQUEST, "LLM extraction unavailable, keeping regex result");
            }
        }

        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::types::{ListingType, PropertyType};
    use crate::LLMClient;
    use ollama_rs::Ollama;

    fn post(text: &str, url: &str) -> RawPost {
        RawPost {
            text: text.to_string(),
            post_url: url.to_string(),
            account_handle: Some("hyd_homes".to_string()),
            timestamp: None,
            images: vec!["https://cdn.example.com/1.jpg".to_string()],
        }
    }

    const CAPTION: &str = "🏡 Premium 3BHK Flat for Sale\n📍 Location: Kondapur, Hyderabad\n\
        💰 Price: 1.2 Cr\n1,850 sft | East facing | Gated community\n\
        Amenities: pool, gym, power backup\nCall 98765 43210";

    #[test]
    fn test_extract_with_regex_full_caption() {
        let property = extract_with_regex(CAPTION);
        assert_eq!(property.title.as_deref(), Some("Premium 3BHK Flat for Sale"));
        assert_eq!(property.location.as_deref(), Some("Kondapur, Hyderabad"));
        assert_eq!(property.price, Some(12_000_000));
        assert_eq!(property.bedrooms, Some(3));
        assert_eq!(property.area, Some(1850.0));
        assert_eq!(property.property_type, Some(PropertyType::Residential));
        assert_eq!(property.listing_type, Some(ListingType::Sale));
        assert_eq!(property.contact_phone.as_deref(), Some("98765 43210"));
        assert!(property.features.contains(&"East Facing".to_string()));
        assert!(property.amenities.contains(&"Power Backup".to_string()));
        assert!(is_sufficient(&property));
    }

    #[test]
    fn test_insufficient_without_price() {
        let property = extract_with_regex("Lovely 2BHK in Madhapur, DM for details");
        assert!(property.location.is_some());
        assert!(!is_sufficient(&property));
    }

    #[test]
    fn test_remaining_spacing() {
        let now = Instant::now();
        let spacing = Duration::from_secs(12);
        assert_eq!(remaining_spacing(None, now, spacing), Duration::ZERO);
        assert_eq!(remaining_spacing(Some(now), now, spacing), spacing);
        let later = now + Duration::from_secs(20);
        assert_eq!(remaining_spacing(Some(now), later, spacing), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_extract_keeps_post_provenance() {
        let mut extractor = Extractor::new(None);
        let property = extractor
            .extract(&post(CAPTION, "https://www.instagram.com/p/abc/"))
            .await;
        assert_eq!(property.source_url.as_deref(), Some("https://www.instagram.com/p/abc/"));
        assert_eq!(property.account_handle.as_deref(), Some("hyd_homes"));
        assert_eq!(property.images.len(), 1);
        assert_eq!(property.description.as_deref(), Some(CAPTION));
    }

    #[tokio::test]
    async fn test_extract_caches_by_caption() {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(Duration::from_secs(60), clock.clone());
        let mut extractor = Extractor::with_cache(None, cache);

        let first = extractor.extract(&post(CAPTION, "https://www.instagram.com/p/1/")).await;
        let second = extractor.extract(&post(CAPTION, "https://www.instagram.com/p/2/")).await;
        assert_eq!(extractor.cached_entries(), 1);
        assert_eq!(first.price, second.price);
        // provenance is per post even on a cache hit
        assert_eq!(second.source_url.as_deref(), Some("https://www.instagram.com/p/2/"));

        clock.advance(Duration::from_secs(61));
        extractor.extract(&post("Plot for sale in Shadnagar, Rs 40 lakhs", "u")).await;
        assert_eq!(extractor.cached_entries(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_llm_falls_back_to_regex() {
        // nothing listens on the discard port
        let llm = LLMParams {
            llm_client: LLMClient::Ollama(Ollama::new("http://127.0.0.1".to_string(), 9)),
            model: "unused".to_string(),
            temperature: 0.0,
        };
        let mut extractor = Extractor::new(Some(llm))
            .with_rate_limit(Duration::ZERO)
            .with_llm_timeout(Duration::from_millis(200))
            .with_retry_policy(RetryPolicy {
                max_attempts: 2,
                initial_backoff: Duration::ZERO,
            });
        assert!(extractor.has_llm());

        let started = std::time::Instant::now();
        let property = extractor
            .extract(&post(
                "Lovely 2BHK in Madhapur, DM for details",
                "https://www.instagram.com/p/llm/",
            ))
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(property.location.as_deref(), Some("Madhapur"));
        assert_eq!(property.bedrooms, Some(2));
        assert_eq!(property.price, None);
        assert_eq!(property.source_url.as_deref(), Some("https://www.instagram.com/p/llm/"));
        assert_eq!(extractor.cached_entries(), 1);
    }
}
