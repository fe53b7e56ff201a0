use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Install the global tracing subscriber.
///
/// The level comes from the `LOG_LEVEL` environment variable when set,
/// falling back to `configured` (the config file's level) and then to a
/// build-dependent default. Only `mailgate*` targets are emitted.
pub fn init(configured: Option<&str>) {
    let default = if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    let fallback = configured
        .and_then(|level| LevelFilter::from_str(level).ok())
        .unwrap_or(default);

    let level = std::env::var("LOG_LEVEL").map_or(fallback, |level| {
        LevelFilter::from_str(level.as_str()).unwrap_or_else(|_| {
            eprintln!("Invalid log level specified {level}, defaulting to {fallback}");
            fallback
        })
    });

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with("mailgate")
                })),
        )
        .init();
}
