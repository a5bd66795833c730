use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scraped Instagram post as handed to the import entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    pub text: String,
    pub post_url: String,
    #[serde(default)]
    pub account_handle: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[default]
    Residential,
    Commercial,
    Agricultural,
    Undeveloped,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Residential => "residential",
            PropertyType::Commercial => "commercial",
            PropertyType::Agricultural => "agricultural",
            PropertyType::Undeveloped => "undeveloped",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    #[default]
    Sale,
    Rent,
    DevelopmentPartnership,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sale => "sale",
            ListingType::Rent => "rent",
            ListingType::DevelopmentPartnership => "development_partnership",
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Candidate property record built from a single post.
///
/// Every field is optional: extraction fills what it can find, and the
/// normalizer rewrites the values it recognises into canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<i32>,
    /// Built-up area in square feet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    /// Land size in square feet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ExtractedProperty {
    /// Seeds a record with the provenance fields of the post it came from.
    pub fn from_post(post: &RawPost) -> Self {
        ExtractedProperty {
            description: Some(post.text.trim().to_string()),
            source_url: Some(post.post_url.clone()),
            account_handle: post.account_handle.clone(),
            posted_at: post.timestamp.clone(),
            images: post.images.clone(),
            ..Default::default()
        }
    }

    /// Fills every empty field of `self` from `other`. Values already set win.
    pub fn merge_missing(&mut self, other: ExtractedProperty) {
        fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }

        fill(&mut self.title, other.title);
        fill(&mut self.description, other.description);
        fill(&mut self.price, other.price);
        fill(&mut self.location, other.location);
        fill(&mut self.bedrooms, other.bedrooms);
        fill(&mut self.bathrooms, other.bathrooms);
        fill(&mut self.area, other.area);
        fill(&mut self.land_size, other.land_size);
        fill(&mut self.property_type, other.property_type);
        fill(&mut self.listing_type, other.listing_type);
        fill(&mut self.contact_phone, other.contact_phone);
        fill(&mut self.contact_email, other.contact_email);
        fill(&mut self.contact_name, other.contact_name);
        fill(&mut self.source_url, other.source_url);
        fill(&mut self.account_handle, other.account_handle);
        fill(&mut self.posted_at, other.posted_at);

        if self.features.is_empty() {
            self.features = other.features;
        }
        if self.amenities.is_empty() {
            self.amenities = other.amenities;
        }
        if self.images.is_empty() {
            self.images = other.images;
        }
    }
}

/// Value and diagnostics produced by a single field normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationResult<T> {
    pub data: Option<T>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl<T> NormalizationResult<T> {
    pub fn ok(data: T) -> Self {
        NormalizationResult {
            data: Some(data),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn error(message: &str) -> Self {
        NormalizationResult {
            data: None,
            warnings: Vec::new(),
            errors: vec![message.to_string()],
        }
    }

    pub fn with_warning(mut self, message: &str) -> Self {
        self.warnings.push(message.to_string());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of normalizing a whole record.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyNormalization {
    pub data: ExtractedProperty,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl PropertyNormalization {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    ExactUrl,
    Phone,
    Email,
    LocationPriceArea,
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchReason::ExactUrl => write!(f, "exact_url"),
            MatchReason::Phone => write!(f, "phone"),
            MatchReason::Email => write!(f, "email"),
            MatchReason::LocationPriceArea => write!(f, "location_price_area"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateMatch {
    pub candidate_id: i64,
    pub confidence: f64,
    pub reason: MatchReason,
    pub matched_field: String,
    pub existing_summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckResult {
    pub is_duplicate: bool,
    pub matches: Vec<DuplicateMatch>,
    pub highest_confidence: f64,
}

impl DuplicateCheckResult {
    pub fn best_match(&self) -> Option<&DuplicateMatch> {
        self.matches.first()
    }
}

/// An already-persisted listing, as seen by the duplicate checker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExistingProperty {
    pub id: i64,
    pub title: Option<String>,
    pub location: String,
    pub price: i64,
    pub area: Option<f64>,
    pub source_url: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

impl ExistingProperty {
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | ₹{}",
            self.title.as_deref().unwrap_or("Untitled"),
            self.location,
            self.price
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    CompletedWithErrors,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::CompletedWithErrors => "completed_with_errors",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::CompletedWithErrors)
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "completed_with_errors" => JobStatus::CompletedWithErrors,
            _ => JobStatus::Pending,
        }
    }
}

/// Bookkeeping for one import batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    pub id: String,
    pub status: JobStatus,
    pub source: String,
    pub posts_found: usize,
    pub properties_added: usize,
    pub properties_updated: usize,
    pub properties_skipped: usize,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ImportJob {
    pub fn new(source: &str, posts_found: usize) -> Self {
        ImportJob {
            id: uuid::Uuid::new_v4().to_string(),
            status: JobStatus::Pending,
            source: source.to_string(),
            posts_found,
            properties_added: 0,
            properties_updated: 0,
            properties_skipped: 0,
            errors: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn start(&mut self) {
        if self.status == JobStatus::Pending {
            self.status = JobStatus::Running;
        }
    }

    /// Moves a running job to its terminal state. Any recorded error yields
    /// `completed_with_errors`.
    pub fn finish(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = if self.errors.is_empty() {
            JobStatus::Completed
        } else {
            JobStatus::CompletedWithErrors
        };
        self.completed_at = Some(Utc::now());
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            total: self.posts_found,
            added: self.properties_added,
            updated: self.properties_updated,
            skipped: self.properties_skipped,
            errors: self.errors.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: usize,
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub success: bool,
    pub job_id: String,
    pub summary: ImportSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_messages: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_post_deserializes_camel_case() {
        let post: RawPost = serde_json::from_str(
            r#"{"text":"2bhk flat","postUrl":"https://instagram.com/p/abc","accountHandle":"homes"}"#,
        )
        .unwrap();
        assert_eq!(post.post_url, "https://instagram.com/p/abc");
        assert_eq!(post.account_handle.as_deref(), Some("homes"));
        assert!(post.images.is_empty());
    }

    #[test]
    fn test_merge_missing_keeps_existing_values() {
        let mut base = ExtractedProperty {
            price: Some(5_000_000),
            ..Default::default()
        };
        base.merge_missing(ExtractedProperty {
            price: Some(1),
            location: Some("Kondapur".to_string()),
            ..Default::default()
        });
        assert_eq!(base.price, Some(5_000_000));
        assert_eq!(base.location.as_deref(), Some("Kondapur"));
    }

    #[test]
    fn test_job_lifecycle() {
        let mut job = ImportJob::new("instagram", 2);
        assert_eq!(job.status, JobStatus::Pending);
        job.start();
        assert_eq!(job.status, JobStatus::Running);
        job.finish();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.completed_at.is_some());

        let mut failed = ImportJob::new("instagram", 1);
        failed.start();
        failed.errors.push("boom".to_string());
        failed.finish();
        assert_eq!(failed.status, JobStatus::CompletedWithErrors);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&ListingType::DevelopmentPartnership).unwrap(),
            "\"development_partnership\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::CompletedWithErrors).unwrap(),
            "\"completed_with_errors\""
        );
        assert_eq!(JobStatus::from("running"), JobStatus::Running);
    }
}
