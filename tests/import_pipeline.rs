use propintake::db::Database;
use propintake::duplicate::PropertyLookup;
use propintake::extract::Extractor;
use propintake::import::Importer;
use propintake::types::{JobStatus, RawPost};

const KONDAPUR_FLAT: &str = "🏡 3BHK Flat for Sale\n📍 Kondapur, Hyderabad\nPrice: 1.2 Cr\n\
    1850 sft | East facing\nCall 98765 43210";
const SHAMSHABAD_PLOT: &str = "Open plot for sale\n📍 Shamshabad, Hyderabad\nPrice: 45 Lakhs\n\
    200 sq yards, DTCP approved\nCall 91234 56789";
const NO_PRICE: &str = "Lovely 2BHK in Madhapur, DM for price";

fn post(text: &str, url: &str) -> RawPost {
    RawPost {
        text: text.to_string(),
        post_url: url.to_string(),
        account_handle: Some("hyd_realty".to_string()),
        timestamp: Some("2024-05-01T10:00:00Z".to_string()),
        images: vec![format!("{}media/1.jpg", url)],
    }
}

async fn importer() -> (Database, Importer) {
    let db = Database::in_memory().await.unwrap();
    let importer = Importer::new(db.clone(), Extractor::new(None));
    (db, importer)
}

#[tokio::test]
async fn test_batch_with_one_incomplete_post() {
    let (db, mut importer) = importer().await;

    let response = importer
        .run(vec![
            post(KONDAPUR_FLAT, "https://www.instagram.com/p/flat1/"),
            post(SHAMSHABAD_PLOT, "https://www.instagram.com/p/plot1/"),
            post(NO_PRICE, "https://www.instagram.com/p/noprice/"),
        ])
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.summary.total, 3);
    assert_eq!(response.summary.added, 2);
    assert_eq!(response.summary.updated, 0);
    assert_eq!(response.summary.skipped, 1);
    assert_eq!(response.summary.errors, 0);
    assert!(response.error_messages.is_none());

    let job = db.get_job(&response.job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.properties_added, 2);
    assert_eq!(job.properties_skipped, 1);
    assert_eq!(db.count_properties().await.unwrap(), 2);
}

#[tokio::test]
async fn test_reimporting_same_url_updates() {
    let (db, mut importer) = importer().await;
    let url = "https://www.instagram.com/p/flat1/";

    let first = importer.run(vec![post(KONDAPUR_FLAT, url)]).await.unwrap();
    assert_eq!(first.summary.added, 1);

    let repriced = KONDAPUR_FLAT.replace("1.2 Cr", "1.1 Cr");
    let second = importer.run(vec![post(&repriced, url)]).await.unwrap();
    assert_eq!(second.summary.added, 0);
    assert_eq!(second.summary.updated, 1);
    assert_eq!(db.count_properties().await.unwrap(), 1);

    let rows = db.find_by_phone("+919876543210").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].price, 11_000_000);

    let record = db.get_property(rows[0].id).await.unwrap().unwrap();
    assert_eq!(record.job_id.as_deref(), Some(second.job_id.as_str()));
    assert_eq!(record.status, "pending");
}

#[tokio::test]
async fn test_phone_duplicate_is_flagged_for_review() {
    let (db, mut importer) = importer().await;

    importer
        .run(vec![post(KONDAPUR_FLAT, "https://www.instagram.com/p/flat1/")])
        .await
        .unwrap();

    let repost = "Resale 3BHK Flat\n📍 Kondapur, Hyderabad\nPrice: 1.15 Cr\nCall 98765 43210";
    let response = importer
        .run(vec![post(repost, "https://www.instagram.com/p/flat2/")])
        .await
        .unwrap();
    assert_eq!(response.summary.added, 1);

    let rows = db.find_by_phone("+919876543210").await.unwrap();
    assert_eq!(rows.len(), 2);
    let (original, copy) = (rows[0].id, rows[1].id);

    let record = db.get_property(copy).await.unwrap().unwrap();
    assert_eq!(record.status, "pending_review");
    assert_eq!(record.duplicate_of_id, Some(original));
    assert_eq!(record.duplicate_confidence, Some(0.95));

    let images = db.get_property_images(copy).await.unwrap();
    assert_eq!(images, vec!["https://www.instagram.com/p/flat2/media/1.jpg"]);
}

#[tokio::test]
async fn test_persistence_failure_is_recorded_per_post() {
    let (db, mut importer) = importer().await;
    sqlx::query("DROP TABLE property_images")
        .execute(db.pool())
        .await
        .unwrap();

    let url = "https://www.instagram.com/p/flat1/";
    let response = importer
        .run(vec![post(KONDAPUR_FLAT, url), post(NO_PRICE, "https://www.instagram.com/p/x/")])
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.summary.total, 2);
    assert_eq!(response.summary.added, 0);
    assert_eq!(response.summary.skipped, 1);
    assert_eq!(response.summary.errors, 1);

    let messages = response.error_messages.unwrap();
    assert!(messages[0].starts_with(&format!("{}: ", url)));

    let job = db.get_job(&response.job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::CompletedWithErrors);
    assert_eq!(db.count_properties().await.unwrap(), 0);
}

#[tokio::test]
async fn test_out_of_range_area_is_stored_with_warning() {
    let (db, mut importer) = importer().await;

    let caption = "Independent house for sale\n📍 Kokapet, Hyderabad\nPrice: 3 Cr\n\
        250000 sft built up\nCall 91234 56789";
    let response = importer
        .run(vec![post(caption, "https://www.instagram.com/p/house1/")])
        .await
        .unwrap();
    assert_eq!(response.summary.added, 1);
    assert_eq!(response.summary.errors, 0);

    let rows = db.find_by_phone("+919123456789").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].area, Some(250_000.0));

    let record = db.get_property(rows[0].id).await.unwrap().unwrap();
    assert_eq!(record.status, "pending");
    assert!(
        record.warnings.iter().any(|w| w.starts_with("area:")),
        "{:?}",
        record.warnings
    );
}
