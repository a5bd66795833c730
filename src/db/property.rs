use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Sqlite, Transaction};
use tracing::{debug, instrument};

use super::core::Database;
use crate::db::Row;
use crate::duplicate::PropertyLookup;
use crate::types::{ExistingProperty, ExtractedProperty};
use crate::util::normalize_url;
use crate::TARGET_DB;

const EXISTING_COLUMNS: &str =
    "id, title, location, price, area, source_url, contact_phone, contact_email";

/// Review state of a stored listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyStatus {
    Pending,
    PendingReview,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Pending => "pending",
            PropertyStatus::PendingReview => "pending_review",
        }
    }
}

/// Link from a new row to the listing it probably duplicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicateLink {
    pub duplicate_of_id: i64,
    pub confidence: f64,
}

/// A stored listing with its bookkeeping columns.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    pub id: i64,
    pub title: Option<String>,
    pub price: i64,
    pub location: String,
    pub source_url: Option<String>,
    pub contact_phone: Option<String>,
    pub status: String,
    pub duplicate_of_id: Option<i64>,
    pub duplicate_confidence: Option<f64>,
    pub job_id: Option<String>,
    pub warnings: Vec<String>,
}

fn existing_from_row(row: &SqliteRow) -> ExistingProperty {
    ExistingProperty {
        id: row.get("id"),
        title: row.get("title"),
        location: row.get("location"),
        price: row.get("price"),
        area: row.get("area"),
        source_url: row.get("source_url"),
        contact_phone: row.get("contact_phone"),
        contact_email: row.get("contact_email"),
    }
}

fn json_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

impl Database {
    /// Insert a normalized listing and its images. Returns the new row id.
    /// `warnings` are the normalization warnings kept on the row for review.
    #[instrument(target = "db", level = "info", skip(self, property, warnings))]
    pub async fn insert_property(
        &self,
        property: &ExtractedProperty,
        warnings: &[String],
        status: PropertyStatus,
        duplicate: Option<DuplicateLink>,
        job_id: &str,
    ) -> Result<i64, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        let normalized_source_url = property.source_url.as_deref().map(normalize_url);
        let mut transaction = self.pool().begin().await?;

        let (id,) = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO properties (
                title, description, price, location, bedrooms, bathrooms, area, land_size,
                property_type, listing_type, contact_phone, contact_email, contact_name,
                features, amenities, warnings, source_url, normalized_source_url,
                account_handle, posted_at, status, duplicate_of_id, duplicate_confidence,
                job_id, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                    ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?25)
            RETURNING id
            "#,
        )
        .bind(&property.title)
        .bind(&property.description)
        .bind(property.price)
        .bind(&property.location)
        .bind(property.bedrooms)
        .bind(property.bathrooms)
        .bind(property.area)
        .bind(property.land_size)
        .bind(property.property_type.unwrap_or_default().as_str())
        .bind(property.listing_type.unwrap_or_default().as_str())
        .bind(&property.contact_phone)
        .bind(&property.contact_email)
        .bind(&property.contact_name)
        .bind(json_list(&property.features))
        .bind(json_list(&property.amenities))
        .bind(json_list(warnings))
        .bind(&property.source_url)
        .bind(&normalized_source_url)
        .bind(&property.account_handle)
        .bind(&property.posted_at)
        .bind(status.as_str())
        .bind(duplicate.map(|d| d.duplicate_of_id))
        .bind(duplicate.map(|d| d.confidence))
        .bind(job_id)
        .bind(&now)
        .fetch_one(&mut *transaction)
        .await?;

        Self::replace_images(&mut transaction, id, &property.images).await?;
        transaction.commit().await?;

        debug!(target: TARGET_DB, "Inserted property {} with status {}", id, status.as_str());
        Ok(id)
    }

    /// Refresh an existing listing with newly extracted values. Warnings are
    /// replaced with the latest ones; review state and duplicate links are
    /// left alone.
    #[instrument(target = "db", level = "info", skip(self, property, warnings))]
    pub async fn update_property(
        &self,
        id: i64,
        property: &ExtractedProperty,
        warnings: &[String],
        job_id: &str,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        let mut transaction = self.pool().begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE properties SET
                title = ?2, description = ?3, price = ?4, location = ?5, bedrooms = ?6,
                bathrooms = ?7, area = ?8, land_size = ?9, property_type = ?10,
                listing_type = ?11, contact_phone = ?12, contact_email = ?13,
                contact_name = ?14, features = ?15, amenities = ?16, warnings = ?17,
                account_handle = COALESCE(?18, account_handle),
                posted_at = COALESCE(?19, posted_at),
                job_id = ?20, updated_at = ?21
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(property.price)
        .bind(&property.location)
        .bind(property.bedrooms)
        .bind(property.bathrooms)
        .bind(property.area)
        .bind(property.land_size)
        .bind(property.property_type.unwrap_or_default().as_str())
        .bind(property.listing_type.unwrap_or_default().as_str())
        .bind(&property.contact_phone)
        .bind(&property.contact_email)
        .bind(&property.contact_name)
        .bind(json_list(&property.features))
        .bind(json_list(&property.amenities))
        .bind(json_list(warnings))
        .bind(&property.account_handle)
        .bind(&property.posted_at)
        .bind(job_id)
        .bind(&now)
        .execute(&mut *transaction)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        if !property.images.is_empty() {
            Self::replace_images(&mut transaction, id, &property.images).await?;
        }
        transaction.commit().await?;

        debug!(target: TARGET_DB, "Updated property {}", id);
        Ok(())
    }

    async fn replace_images(
        transaction: &mut Transaction<'_, Sqlite>,
        property_id: i64,
        images: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM property_images WHERE property_id = ?1")
            .bind(property_id)
            .execute(&mut **transaction)
            .await?;

        for (position, url) in images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO property_images (property_id, url, position) VALUES (?1, ?2, ?3)",
            )
            .bind(property_id)
            .bind(url)
            .bind(position as i64)
            .execute(&mut **transaction)
            .await?;
        }
        Ok(())
    }

    #[instrument(target = "db", level = "info", skip(self))]
    pub async fn get_property(&self, id: i64) -> Result<Option<PropertyRecord>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, title, price, location, source_url, contact_phone, status,
                   duplicate_of_id, duplicate_confidence, job_id, warnings
            FROM properties WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|row| {
            let warnings: String = row.get("warnings");
            PropertyRecord {
                id: row.get("id"),
                title: row.get("title"),
                price: row.get("price"),
                location: row.get("location"),
                source_url: row.get("source_url"),
                contact_phone: row.get("contact_phone"),
                status: row.get("status"),
                duplicate_of_id: row.get("duplicate_of_id"),
                duplicate_confidence: row.get("duplicate_confidence"),
                job_id: row.get("job_id"),
                warnings: serde_json::from_str(&warnings).unwrap_or_default(),
            }
        }))
    }

    /// Image URLs of a listing in posted order.
    pub async fn get_property_images(&self, property_id: i64) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT url FROM property_images WHERE property_id = ?1 ORDER BY position",
        )
        .bind(property_id)
        .fetch_all(self.pool())
        .await
    }

    pub async fn count_properties(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM properties")
            .fetch_one(self.pool())
            .await
    }

    async fn fetch_existing(
        &self,
        filter: &str,
        value: &str,
    ) -> Result<Vec<ExistingProperty>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM properties WHERE {} = ?1 ORDER BY id",
            EXISTING_COLUMNS, filter
        );
        let rows = sqlx::query(&query).bind(value).fetch_all(self.pool()).await?;
        Ok(rows.iter().map(existing_from_row).collect())
    }
}

#[async_trait]
impl PropertyLookup for Database {
    async fn find_by_source_url(
        &self,
        normalized_url: &str,
    ) -> anyhow::Result<Vec<ExistingProperty>> {
        Ok(self
            .fetch_existing("normalized_source_url", normalized_url)
            .await?)
    }

    async fn find_by_phone(&self, phone: &str) -> anyhow::Result<Vec<ExistingProperty>> {
        Ok(self.fetch_existing("contact_phone", phone).await?)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Vec<ExistingProperty>> {
        Ok(self.fetch_existing("contact_email", email).await?)
    }

    async fn find_in_price_range(
        &self,
        min: i64,
        max: i64,
    ) -> anyhow::Result<Vec<ExistingProperty>> {
        let query = format!(
            "SELECT {} FROM properties WHERE price BETWEEN ?1 AND ?2 ORDER BY id",
            EXISTING_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(min)
            .bind(max)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.iter().map(existing_from_row).collect())
    }
}
