//! Integration tests for the news-triage classifier
//!
//! These tests drive the full workflow from configuration loading through
//! feed fetching, classification over HTTP, storage and page rendering.

use std::io::Write;
use tempfile::NamedTempFile;

mod common {
    use tempfile::TempDir;

    /// Create a temporary directory for test databases
    pub fn create_temp_dir() -> TempDir {
        tempfile::tempdir().expect("Failed to create temp directory")
    }

    /// Create a test database path
    pub fn create_db_path(temp_dir: &TempDir) -> String {
        let db_path = temp_dir.path().join("test.db");
        format!("sqlite:{}?mode=rwc", db_path.display())
    }
}

#[cfg(test)]
mod config_integration_tests {
    use super::*;
    use news_triage::config::{Config, DEFAULT_CATEGORIES};

    #[test]
    fn test_load_actual_feeds_config() {
        let config = Config::load("feeds.toml");
        assert!(config.is_ok(), "Failed to load feeds.toml: {:?}", config.err());

        let config = config.unwrap();
        assert_eq!(config.feeds.len(), 6);
        assert_eq!(config.categories, DEFAULT_CATEGORIES);
        assert!(!config.extraction.enabled);
    }

    #[test]
    fn test_config_from_file() {
        let toml_content = r#"
            database_url = "sqlite::memory:"
            process_delay_ms = 250

            [[feeds]]
            name = "BBC India"
            url = "https://feeds.bbci.co.uk/news/world/asia/india/rss.xml"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.process_delay_ms, 250);
        assert_eq!(config.feeds[0].name, "BBC India");
    }
}

#[cfg(test)]
mod database_integration_tests {
    use super::common::*;
    use news_triage::db::{ClassifiedArticle, Database};

    fn article(i: usize, category: &str) -> ClassifiedArticle {
        ClassifiedArticle {
            title: format!("Article {}", i),
            content: format!("Summary {}", i),
            publication_date: String::new(),
            source_url: format!("https://article{}.example.com", i),
            category: category.to_string(),
            confidence: 0.5,
        }
    }

    #[tokio::test]
    async fn test_table_survives_reopen() {
        let temp_dir = create_temp_dir();
        let db_url = create_db_path(&temp_dir);

        {
            let db = Database::new(&db_url).await.unwrap();
            db.initialize().await.unwrap();
            db.replace_articles(&[article(1, "Others"), article(2, "Natural Disasters")])
                .await
                .unwrap();
        }

        {
            let db = Database::new(&db_url).await.unwrap();
            let articles = db.load_articles().await.unwrap();
            assert_eq!(articles.len(), 2);
            assert_eq!(articles[0].title, "Article 1");
        }
    }

    #[tokio::test]
    async fn test_repeated_replace_keeps_only_last_batch() {
        let temp_dir = create_temp_dir();
        let db_url = create_db_path(&temp_dir);

        let db = Database::new(&db_url).await.unwrap();
        db.initialize().await.unwrap();

        for round in 1..=3 {
            let batch: Vec<_> = (0..round * 10).map(|i| article(i, "Others")).collect();
            db.replace_articles(&batch).await.unwrap();
        }

        assert_eq!(db.load_articles().await.unwrap().len(), 30);
        let counts = db.category_counts().await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].count, 30);
    }
}

#[cfg(test)]
mod end_to_end_tests {
    use super::common::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use news_triage::config::Config;
    use news_triage::routes::{self, AppState};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request as MockRequest, ResponseTemplate};

    const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0">
            <channel>
                <title>World</title>
                <link>https://world.example.com</link>
                <description>World news</description>
                <item>
                    <title>Cyclone makes landfall</title>
                    <link>https://world.example.com/cyclone</link>
                    <description>Winds topped 200km/h.</description>
                    <pubDate>Mon, 09 Dec 2024 12:00:00 GMT</pubDate>
                </item>
                <item>
                    <title>Choir breaks charity record</title>
                    <link>https://world.example.com/choir</link>
                    <pubDate>Mon, 09 Dec 2024 10:00:00 GMT</pubDate>
                </item>
                <item>
                    <link>https://world.example.com/untitled</link>
                </item>
            </channel>
        </rss>
    "#;

    /// Mimics a zero-shot endpoint: labels sorted by descending score.
    fn zero_shot_response(request: &MockRequest) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let text = body["inputs"].as_str().unwrap_or_default().to_string();
        let winner = if text.contains("Cyclone") {
            "Natural Disasters"
        } else {
            "Positive/Uplifting"
        };
        let mut labels: Vec<String> = body["parameters"]["candidate_labels"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l.as_str().unwrap().to_string())
            .collect();
        labels.sort_by_key(|l| l != winner);
        let scores: Vec<f64> = labels
            .iter()
            .map(|l| if l == winner { 0.91 } else { 0.03 })
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "sequence": text,
            "labels": labels,
            "scores": scores,
        }))
    }

    async fn start_upstream() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/world.rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/zero-shot"))
            .respond_with(zero_shot_response)
            .mount(&server)
            .await;
        server
    }

    fn config_for(server: &MockServer, db_url: &str) -> Config {
        let content = format!(
            r#"
            database_url = "{db_url}"
            process_delay_ms = 0

            [classifier]
            endpoint = "{uri}/zero-shot"
            api_token_env = "NEWS_TRIAGE_TEST_TOKEN_UNSET"

            [[feeds]]
            name = "World"
            url = "{uri}/world.rss"
            "#,
            db_url = db_url,
            uri = server.uri()
        );
        Config::from_str(&content).unwrap()
    }

    #[tokio::test]
    async fn test_get_renders_form() {
        let server = start_upstream().await;
        let temp_dir = create_temp_dir();
        let config = config_for(&server, &create_db_path(&temp_dir));

        let state = Arc::new(AppState::from_config(&config).await.unwrap());
        let response = routes::router(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("World"));
        assert!(body.contains("type=\"checkbox\""));
    }

    #[tokio::test]
    async fn test_post_classifies_stores_and_charts() {
        let server = start_upstream().await;
        let temp_dir = create_temp_dir();
        let db_url = create_db_path(&temp_dir);
        let config = config_for(&server, &db_url);
        let feed_url = config.feeds[0].url.clone();

        let state = Arc::new(AppState::from_config(&config).await.unwrap());
        let db = state.db.clone();

        let form = serde_urlencoded::to_string([("rss_link", feed_url.as_str())]).unwrap();
        let response = routes::router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from(form))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Cyclone makes landfall"));
        assert!(body.contains("Choir breaks charity record"));
        assert!(body.contains("0.9100"));
        assert!(body.contains("Category Frequency Plot"));

        // The untitled entry is dropped, the rest land in the table
        let stored = db.load_articles().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].category, "Natural Disasters");
        assert_eq!(stored[0].content, "Winds topped 200km/h.");
        assert!(stored[0].publication_date.starts_with("2024-12-09T12:00:00"));
        assert_eq!(stored[1].category, "Positive/Uplifting");

        let counts = db.category_counts().await.unwrap();
        assert_eq!(counts.len(), 2);
        assert!(counts.iter().all(|c| c.count == 1));
    }

    #[tokio::test]
    async fn test_classifier_outage_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/world.rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/zero-shot"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let temp_dir = create_temp_dir();
        let config = config_for(&server, &create_db_path(&temp_dir));
        let feed_url = config.feeds[0].url.clone();
        let state = Arc::new(AppState::from_config(&config).await.unwrap());

        let form = serde_urlencoded::to_string([("rss_link", feed_url.as_str())]).unwrap();
        let response = routes::router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::from(form))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
