use anyhow::{Context, Result};
use clap::Parser;
use prettytable::{Cell, Row as PrettyRow, Table};
use propintake::db::Database;
use propintake::duplicate::DuplicateChecker;
use propintake::environment::Settings;
use propintake::types::RawPost;
use serde_json::to_string_pretty;
use tokio::main;

#[derive(Parser)]
#[command(author, version, about = "Check a caption against stored listings without importing it", long_about = None)]
struct Cli {
    /// Post caption to check
    #[arg(short, long)]
    text: String,

    /// Post URL, enables the exact URL check
    #[arg(short, long, default_value = "")]
    url: String,

    /// Only use regex extraction, never call the LLM
    #[arg(long)]
    no_llm: bool,
}

#[main]
async fn main() -> Result<()> {
    propintake::logging::configure_logging();

    let cli = Cli::parse();

    let mut settings = Settings::from_env()?;
    if cli.no_llm {
        settings = settings.without_llm();
    }

    let db = Database::new(&settings.database_path)
        .await
        .context("Failed to connect to database")?;

    let post = RawPost {
        text: cli.text,
        post_url: cli.url,
        account_handle: None,
        timestamp: None,
        images: Vec::new(),
    };

    let extracted = settings.extractor().extract(&post).await;
    let normalized = settings.normalizer().normalize_property(extracted);

    println!("Normalized record:\n{}", to_string_pretty(&normalized.data)?);
    for warning in &normalized.warnings {
        println!("warning: {}", warning);
    }
    for error in &normalized.errors {
        println!("error: {}", error);
    }

    let result = DuplicateChecker::new(&db)
        .with_config(settings.duplicate_config())
        .check(&normalized.data)
        .await?;

    if result.matches.is_empty() {
        println!("\nNo duplicate candidates found");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(PrettyRow::new(vec![
        Cell::new("ID"),
        Cell::new("Confidence"),
        Cell::new("Reason"),
        Cell::new("Field"),
        Cell::new("Existing"),
    ]));
    for candidate in &result.matches {
        table.add_row(PrettyRow::new(vec![
            Cell::new(&candidate.candidate_id.to_string()),
            Cell::new(&format!("{:.2}", candidate.confidence)),
            Cell::new(&candidate.reason.to_string()),
            Cell::new(&candidate.matched_field),
            Cell::new(&candidate.existing_summary),
        ]));
    }
    table.printstd();

    println!(
        "\nDuplicate: {} (highest confidence {:.2})",
        if result.is_duplicate { "yes" } else { "no" },
        result.highest_confidence
    );

    Ok(())
}
