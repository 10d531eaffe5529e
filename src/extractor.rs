//! Article page download and text extraction.
//!
//! Used when `[extraction].enabled` is set: the feed summary is replaced by
//! the paragraphs scraped from the article itself.

use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid selector {0}")]
    Selector(String),
    #[error("no article text found")]
    NoText,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedArticle {
    pub published: Option<String>,
    pub text: String,
}

pub struct ArticleExtractor {
    client: Client,
}

impl ArticleExtractor {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("NewsTriage/1.0 (RSS Classifier)")
            .build()?;

        Ok(Self { client })
    }

    pub async fn extract(&self, url: &str) -> Result<ExtractedArticle, ExtractError> {
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_article(&html)
    }
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{css:?}: {e:?}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn meta_content(document: &Html, css: &str) -> Result<Vec<String>, ExtractError> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .filter_map(|m| m.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect())
}

pub fn parse_article(html: &str) -> Result<ExtractedArticle, ExtractError> {
    let document = Html::parse_document(html);

    let published = meta_content(&document, "meta[property='article:published_time']")?
        .into_iter()
        .next();

    // Prefer paragraphs inside <article>; fall back to every paragraph on the page.
    let mut paragraphs: Vec<String> = document
        .select(&selector("article p")?)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        paragraphs = document
            .select(&selector("p")?)
            .map(element_text)
            .filter(|p| !p.is_empty())
            .collect();
    }

    if paragraphs.is_empty() {
        return Err(ExtractError::NoText);
    }

    Ok(ExtractedArticle {
        published,
        text: paragraphs.join("\n\n"),
    })
}
