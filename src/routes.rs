use std::sync::Arc;

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

use crate::chart::BarChart;
use crate::classifier::{HttpClassifier, ZeroShotClassifier};
use crate::config::{Config, FeedConfig};
use crate::db::{ClassifiedArticle, Database};
use crate::pipeline::Pipeline;

/// Form field carrying each selected feed URL.
pub const FEED_FIELD: &str = "rss_link";

pub struct AppState {
    pub db: Arc<Database>,
    pub pipeline: Arc<Pipeline>,
    pub feeds: Vec<FeedConfig>,
}

impl AppState {
    /// Open the database and construct the classifier the way the server does.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let db = Database::new(&config.database_url).await?;
        db.initialize().await?;

        let classifier: Arc<dyn ZeroShotClassifier> =
            Arc::new(HttpClassifier::from_config(&config.classifier)?);
        info!("Using zero-shot classifier {}", classifier.name());

        let pipeline = Pipeline::from_config(config, classifier)?;

        Ok(Self {
            db: Arc::new(db),
            pipeline: Arc::new(pipeline),
            feeds: config.feeds.clone(),
        })
    }

    fn is_known_feed(&self, url: &str) -> bool {
        self.feeds.iter().any(|f| f.url == url)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(classify))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub feeds: Vec<FeedOption>,
    pub results: Option<ClassificationResults>,
}

pub struct FeedOption {
    pub name: String,
    pub url: String,
    pub selected: bool,
}

pub struct ClassificationResults {
    pub articles: Vec<ArticleRow>,
    pub chart_svg: String,
}

/// One row of the results table.
pub struct ArticleRow {
    pub title: String,
    /// Present only for links that are safe to put in an `href`.
    pub link: Option<String>,
    pub category: String,
    pub confidence: f64,
}

impl From<ClassifiedArticle> for ArticleRow {
    fn from(article: ClassifiedArticle) -> Self {
        Self {
            link: safe_link(&article.source_url),
            title: article.title,
            category: article.category,
            confidence: article.confidence,
        }
    }
}

/// Feed links are untrusted: only `http` and `https` URLs become hyperlinks.
pub fn safe_link(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed.to_string()),
        _ => None,
    }
}

fn feed_options(feeds: &[FeedConfig], selected: &[String]) -> Vec<FeedOption> {
    feeds
        .iter()
        .map(|f| FeedOption {
            name: f.name.clone(),
            url: f.url.clone(),
            selected: selected.contains(&f.url),
        })
        .collect()
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

/// Collect every `rss_link` value from a urlencoded form body.
pub fn selected_feeds(body: &str) -> Vec<String> {
    url::form_urlencoded::parse(body.as_bytes())
        .filter(|(key, _)| key == FEED_FIELD)
        .map(|(_, value)| value.into_owned())
        .collect()
}

// Route handlers
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    HtmlTemplate(IndexTemplate {
        feeds: feed_options(&state.feeds, &[]),
        results: None,
    })
}

pub async fn classify(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let urls: Vec<String> = selected_feeds(&body)
        .into_iter()
        .filter(|url| {
            let known = state.is_known_feed(url);
            if !known {
                warn!("Ignoring unknown feed {}", url);
            }
            known
        })
        .collect();
    info!("Classifying articles from {} feeds", urls.len());

    let articles = state.pipeline.process_feeds(&urls).await?;

    state.db.replace_articles(&articles).await?;
    let articles = state.db.load_articles().await?;
    let counts = state.db.category_counts().await?;

    let chart_svg = BarChart::from_counts(&counts).render_svg()?;

    Ok(HtmlTemplate(IndexTemplate {
        feeds: feed_options(&state.feeds, &urls),
        results: Some(ClassificationResults {
            articles: articles.into_iter().map(ArticleRow::from).collect(),
            chart_svg,
        }),
    }))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
