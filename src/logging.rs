use std::io;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::filter::FilterFn;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_STDOUT_FILTER: &str =
    "info,import=info,llm_request=info,duplicate=info,normalize=warn,extract=info,db=warn,db_query=warn,sqlx=off";
const DEFAULT_FILE_FILTER: &str =
    "info,import=debug,llm_request=debug,duplicate=debug,normalize=debug,extract=debug,sqlx=info";

pub fn configure_logging() {
    // sqlx reports every slow statement as a warning; keep those out of stdout
    let custom_filter = FilterFn::new(|metadata| {
        !(metadata.level() == &Level::WARN && metadata.target() == "sqlx::query")
    });

    // Stdout log configuration, overridable through RUST_LOG
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDOUT_FILTER));
    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(stdout_filter)
        .with_filter(custom_filter);

    // File log configuration
    let file_appender = rolling::daily("logs", "propintake.log");
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new(DEFAULT_FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .init();
}
