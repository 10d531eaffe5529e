//! News Triage - sorts RSS headlines into categories
//!
//! This crate fetches selected RSS/Atom feeds, classifies every headline with a
//! zero-shot model, stores the results in SQLite and renders a results table
//! with a category frequency chart.

pub mod chart;
pub mod classifier;
pub mod config;
pub mod db;
pub mod extractor;
pub mod fetcher;
pub mod memory;
pub mod pipeline;
pub mod routes;

/// Install the `tracing` subscriber used by every binary.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "news_triage=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
