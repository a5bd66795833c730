use tracing::info;

use super::core::Database;
use crate::TARGET_DB;

impl Database {
    pub(crate) async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool().acquire().await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scraping_jobs (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                status TEXT NOT NULL, -- pending, running, completed, completed_with_errors
                posts_found INTEGER NOT NULL DEFAULT 0,
                properties_added INTEGER NOT NULL DEFAULT 0,
                properties_updated INTEGER NOT NULL DEFAULT 0,
                properties_skipped INTEGER NOT NULL DEFAULT 0,
                errors TEXT NOT NULL DEFAULT '[]', -- JSON array of per-record messages
                started_at TEXT NOT NULL,
                completed_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_scraping_jobs_status ON scraping_jobs (status);

            CREATE TABLE IF NOT EXISTS properties (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT,
                description TEXT,
                price INTEGER NOT NULL,
                location TEXT NOT NULL,
                bedrooms INTEGER,
                bathrooms INTEGER,
                area REAL, -- square feet
                land_size REAL, -- square feet
                property_type TEXT NOT NULL,
                listing_type TEXT NOT NULL,
                contact_phone TEXT,
                contact_email TEXT,
                contact_name TEXT,
                features TEXT NOT NULL DEFAULT '[]',
                amenities TEXT NOT NULL DEFAULT '[]',
                warnings TEXT NOT NULL DEFAULT '[]', -- normalization warnings left for review
                source_url TEXT,
                normalized_source_url TEXT,
                account_handle TEXT,
                posted_at TEXT,
                status TEXT NOT NULL DEFAULT 'pending', -- pending, pending_review
                duplicate_of_id INTEGER,
                duplicate_confidence REAL,
                job_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (duplicate_of_id) REFERENCES properties (id) ON DELETE SET NULL,
                FOREIGN KEY (job_id) REFERENCES scraping_jobs (id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_properties_normalized_source_url ON properties (normalized_source_url);
            CREATE INDEX IF NOT EXISTS idx_properties_contact_phone ON properties (contact_phone);
            CREATE INDEX IF NOT EXISTS idx_properties_contact_email ON properties (contact_email);
            CREATE INDEX IF NOT EXISTS idx_properties_price ON properties (price);
            CREATE INDEX IF NOT EXISTS idx_properties_job_id ON properties (job_id);

            CREATE TABLE IF NOT EXISTS property_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                property_id INTEGER NOT NULL,
                url TEXT NOT NULL,
                position INTEGER NOT NULL,
                FOREIGN KEY (property_id) REFERENCES properties (id) ON DELETE CASCADE,
                UNIQUE(property_id, position)
            );
            CREATE INDEX IF NOT EXISTS idx_property_images_property_id ON property_images (property_id);
            "#,
        )
        .execute(&mut *conn)
        .await?;

        info!(target: TARGET_DB, "Database schema initialized");
        Ok(())
    }
}
