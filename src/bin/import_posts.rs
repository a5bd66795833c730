use anyhow::{Context, Result};
use clap::Parser;
use prettytable::{Cell, Row as PrettyRow, Table};
use propintake::db::Database;
use propintake::environment::Settings;
use propintake::types::RawPost;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::main;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Import scraped Instagram posts into the property database", long_about = None)]
struct Cli {
    /// JSON file holding either an array of posts or {"posts": [...]}
    #[arg(short, long)]
    file: PathBuf,

    /// Only use regex extraction, never call the LLM
    #[arg(long)]
    no_llm: bool,

    /// Source label stored on the import job
    #[arg(short, long, default_value = "instagram")]
    source: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PostFile {
    Wrapped { posts: Vec<RawPost> },
    Bare(Vec<RawPost>),
}

impl PostFile {
    fn into_posts(self) -> Vec<RawPost> {
        match self {
            PostFile::Wrapped { posts } | PostFile::Bare(posts) => posts,
        }
    }
}

#[main]
async fn main() -> Result<()> {
    propintake::logging::configure_logging();

    let cli = Cli::parse();

    let contents = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let posts = serde_json::from_str::<PostFile>(&contents)
        .with_context(|| format!("{} is not a valid post list", cli.file.display()))?
        .into_posts();
    info!("Loaded {} posts from {}", posts.len(), cli.file.display());

    let mut settings = Settings::from_env()?;
    if cli.no_llm {
        settings = settings.without_llm();
    }

    let db = Database::new(&settings.database_path)
        .await
        .context("Failed to connect to database")?;
    let mut importer = settings.importer(db).with_source(&cli.source);

    let response = importer.run(posts).await?;

    let mut table = Table::new();
    table.add_row(PrettyRow::new(vec![
        Cell::new("Job"),
        Cell::new("Total"),
        Cell::new("Added"),
        Cell::new("Updated"),
        Cell::new("Skipped"),
        Cell::new("Errors"),
    ]));
    table.add_row(PrettyRow::new(vec![
        Cell::new(&response.job_id),
        Cell::new(&response.summary.total.to_string()),
        Cell::new(&response.summary.added.to_string()),
        Cell::new(&response.summary.updated.to_string()),
        Cell::new(&response.summary.skipped.to_string()),
        Cell::new(&response.summary.errors.to_string()),
    ]));
    table.printstd();

    if let Some(messages) = &response.error_messages {
        println!("\nErrors:");
        for message in messages {
            println!("  - {}", message);
        }
    }

    Ok(())
}
