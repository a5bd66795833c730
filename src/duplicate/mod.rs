//! Duplicate detection for incoming property records.
//!
//! Independent strategies each propose matches against existing listings:
//! exact source URL (short-circuits), exact phone, exact email and a fuzzy
//! location/price/area comparison. Proposals are merged per candidate id
//! keeping the highest confidence, sorted, and trimmed.

pub mod similarity;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::types::{
    DuplicateCheckResult, DuplicateMatch, ExistingProperty, ExtractedProperty, MatchReason,
};
use crate::util::normalize_url;
use crate::TARGET_DUPLICATE;
use similarity::{levenshtein_similarity, numeric_similarity, price_band};

/// Read access to existing listings.
#[async_trait]
pub trait PropertyLookup: Send + Sync {
    /// `normalized_url` is the output of `util::normalize_url`.
    async fn find_by_source_url(&self, normalized_url: &str) -> Result<Vec<ExistingProperty>>;
    async fn find_by_phone(&self, phone: &str) -> Result<Vec<ExistingProperty>>;
    async fn find_by_email(&self, email: &str) -> Result<Vec<ExistingProperty>>;
    async fn find_in_price_range(&self, min: i64, max: i64) -> Result<Vec<ExistingProperty>>;
}

/// Confidence constants and cutoffs. These are hand-tuned defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateConfig {
    pub exact_url_confidence: f64,
    pub phone_confidence: f64,
    pub phone_with_location_confidence: f64,
    /// Location similarity (percent) required for the phone boost
    pub phone_location_similarity: f64,
    pub email_confidence: f64,
    pub price_band_fraction: f64,
    /// Location similarity (percent) above which a fuzzy match starts
    pub strong_location_similarity: f64,
    /// Lower bound of the weak location band
    pub weak_location_similarity: f64,
    pub fuzzy_base_confidence: f64,
    pub fuzzy_area_high_similarity: f64,
    pub fuzzy_area_high_confidence: f64,
    pub fuzzy_area_mid_similarity: f64,
    pub fuzzy_area_mid_confidence: f64,
    /// Area similarity required when location is only weakly similar
    pub weak_location_area_similarity: f64,
    pub weak_location_confidence: f64,
    pub duplicate_threshold: f64,
    pub max_matches: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            exact_url_confidence: 1.0,
            phone_confidence: 0.75,
            phone_with_location_confidence: 0.95,
            phone_location_similarity: 70.0,
            email_confidence: 0.85,
            price_band_fraction: 0.10,
            strong_location_similarity: 85.0,
            weak_location_similarity: 70.0,
            fuzzy_base_confidence: 0.70,
            fuzzy_area_high_similarity: 90.0,
            fuzzy_area_high_confidence: 0.90,
            fuzzy_area_mid_similarity: 80.0,
            fuzzy_area_mid_confidence: 0.85,
            weak_location_area_similarity: 85.0,
            weak_location_confidence: 0.75,
            duplicate_threshold: 0.85,
            max_matches: 5,
        }
    }
}

impl DuplicateConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.duplicate_threshold = threshold;
        self
    }
}

pub struct DuplicateChecker<'a, L: PropertyLookup + ?Sized> {
    lookup: &'a L,
    config: DuplicateConfig,
}

impl<'a, L: PropertyLookup + ?Sized> DuplicateChecker<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            config: DuplicateConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DuplicateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DuplicateConfig {
        &self.config
    }

    /// Score `candidate` against existing listings.
    pub async fn check(&self, candidate: &ExtractedProperty) -> Result<DuplicateCheckResult> {
        if let Some(url) = candidate.source_url.as_deref().filter(|u| !u.trim().is_empty()) {
            if let Some(found) = self.exact_url_match(url).await? {
                info!(
                    target: TARGET_DUPLICATE,
                    "Exact source URL match for {} (existing id {})", url, found.candidate_id
                );
                return Ok(DuplicateCheckResult {
                    is_duplicate: true,
                    highest_confidence: found.confidence,
                    matches: vec![found],
                });
            }
        }

        let mut proposals = Vec::new();
        proposals.extend(self.phone_matches(candidate).await?);
        proposals.extend(self.email_matches(candidate).await?);
        proposals.extend(self.fuzzy_matches(candidate).await?);

        let result = self.rank(proposals);
        debug!(
            target: TARGET_DUPLICATE,
            "Duplicate check for {:?}: {} matches, highest {:.2}, duplicate={}",
            candidate.source_url,
            result.matches.len(),
            result.highest_confidence,
            result.is_duplicate
        );
        Ok(result)
    }

    async fn exact_url_match(&self, url: &str) -> Result<Option<DuplicateMatch>> {
        let normalized = normalize_url(url);
        let mut rows = self.lookup.find_by_source_url(&normalized).await?;
        if rows.len() > 1 {
            debug!(
                target: TARGET_DUPLICATE,
                "{} existing rows share source URL {}; reporting the oldest", rows.len(), url
            );
        }
        rows.sort_by_key(|row| row.id);

        Ok(rows.into_iter().next().map(|row| DuplicateMatch {
            candidate_id: row.id,
            confidence: self.config.exact_url_confidence,
            reason: MatchReason::ExactUrl,
            matched_field: "source_url".to_string(),
            existing_summary: row.summary(),
        }))
    }

    async fn phone_matches(&self, candidate: &ExtractedProperty) -> Result<Vec<DuplicateMatch>> {
        let Some(phone) = candidate.contact_phone.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(Vec::new());
        };

        let rows = self.lookup.find_by_phone(phone).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let location_similarity = match candidate.location.as_deref() {
                    Some(location) => levenshtein_similarity(location, &row.location),
                    None => 0.0,
                };
                let confidence = if location_similarity >= self.config.phone_location_similarity {
                    self.config.phone_with_location_confidence
                } else {
                    self.config.phone_confidence
                };
                DuplicateMatch {
                    candidate_id: row.id,
                    confidence,
                    reason: MatchReason::Phone,
                    matched_field: "contact_phone".to_string(),
                    existing_summary: row.summary(),
                }
            })
            .collect())
    }

    async fn email_matches(&self, candidate: &ExtractedProperty) -> Result<Vec<DuplicateMatch>> {
        let Some(email) = candidate.contact_email.as_deref().filter(|e| !e.is_empty()) else {
            return Ok(Vec::new());
        };

        let rows = self.lookup.find_by_email(email).await?;
        Ok(rows
            .into_iter()
            .map(|row| DuplicateMatch {
                candidate_id: row.id,
                confidence: self.config.email_confidence,
                reason: MatchReason::Email,
                matched_field: "contact_email".to_string(),
                existing_summary: row.summary(),
            })
            .collect())
    }

    async fn fuzzy_matches(&self, candidate: &ExtractedProperty) -> Result<Vec<DuplicateMatch>> {
        let (Some(price), Some(location)) = (candidate.price, candidate.location.as_deref()) else {
            return Ok(Vec::new());
        };
        if price <= 0 {
            return Ok(Vec::new());
        }

        let (min, max) = price_band(price, self.config.price_band_fraction);
        let rows = self.lookup.find_in_price_range(min, max).await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let location_similarity = levenshtein_similarity(location, &row.location);
                let area_similarity = match (candidate.area, row.area) {
                    (Some(a), Some(b)) => Some(numeric_similarity(a, b)),
                    _ => None,
                };
                let confidence = self.fuzzy_confidence(location_similarity, area_similarity)?;

                debug!(
                    target: TARGET_DUPLICATE,
                    "Fuzzy match with {}: location {:.1}%, area {:?}, confidence {:.2}",
                    row.id, location_similarity, area_similarity, confidence
                );

                Some(DuplicateMatch {
                    candidate_id: row.id,
                    confidence,
                    reason: MatchReason::LocationPriceArea,
                    matched_field: "location".to_string(),
                    existing_summary: row.summary(),
                })
            })
            .collect())
    }

    /// Confidence for a candidate already inside the price band, or `None`
    /// when it is not similar enough to report.
    pub fn fuzzy_confidence(
        &self,
        location_similarity: f64,
        area_similarity: Option<f64>,
    ) -> Option<f64> {
        let c = &self.config;
        let area = area_similarity.unwrap_or(0.0);

        if location_similarity > c.strong_location_similarity {
            let confidence = if area > c.fuzzy_area_high_similarity {
                c.fuzzy_area_high_confidence
            } else if area > c.fuzzy_area_mid_similarity {
                c.fuzzy_area_mid_confidence
            } else {
                c.fuzzy_base_confidence
            };
            Some(confidence)
        } else if location_similarity >= c.weak_location_similarity
            && area > c.weak_location_area_similarity
        {
            Some(c.weak_location_confidence)
        } else {
            None
        }
    }

    fn rank(&self, proposals: Vec<DuplicateMatch>) -> DuplicateCheckResult {
        let mut best: HashMap<i64, DuplicateMatch> = HashMap::new();
        for proposal in proposals {
            match best.get(&proposal.candidate_id) {
                Some(existing) if existing.confidence >= proposal.confidence => {}
                _ => {
                    best.insert(proposal.candidate_id, proposal);
                }
            }
        }

        let mut matches: Vec<DuplicateMatch> = best.into_values().collect();
        matches.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.candidate_id.cmp(&b.candidate_id))
        });
        matches.truncate(self.config.max_matches);

        let highest_confidence = matches.first().map_or(0.0, |m| m.confidence);
        DuplicateCheckResult {
            is_duplicate: highest_confidence >= self.config.duplicate_threshold,
            matches,
            highest_confidence,
        }
    }
}
