use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::classifier::{predict_category, ZeroShotClassifier};
use crate::config::Config;
use crate::db::ClassifiedArticle;
use crate::extractor::ArticleExtractor;
use crate::fetcher::{FeedEntry, Fetcher};

/// Fetches feeds and classifies their entries.
pub struct Pipeline {
    fetcher: Arc<Fetcher>,
    classifier: Arc<dyn ZeroShotClassifier>,
    extractor: Option<Arc<ArticleExtractor>>,
    categories: Vec<String>,
    delay: Duration,
    permits: Arc<Semaphore>,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<Fetcher>,
        classifier: Arc<dyn ZeroShotClassifier>,
        extractor: Option<Arc<ArticleExtractor>>,
        categories: Vec<String>,
        delay: Duration,
        max_concurrent_classifications: usize,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            extractor,
            categories,
            delay,
            permits: Arc::new(Semaphore::new(max_concurrent_classifications)),
        }
    }

    pub fn from_config(
        config: &Config,
        classifier: Arc<dyn ZeroShotClassifier>,
    ) -> anyhow::Result<Self> {
        let fetcher = Arc::new(Fetcher::new(Duration::from_secs(
            config.fetch_timeout_secs,
        ))?);
        let extractor = if config.extraction.enabled {
            Some(Arc::new(ArticleExtractor::new(Duration::from_secs(
                config.extraction.timeout_secs,
            ))?))
        } else {
            None
        };

        Ok(Self::new(
            fetcher,
            classifier,
            extractor,
            config.categories.clone(),
            Duration::from_millis(config.process_delay_ms),
            config.max_concurrent_classifications,
        ))
    }

    /// Process every feed concurrently.
    ///
    /// Results keep the order of `urls`, then the order of entries within each
    /// feed. Articles whose page cannot be extracted are dropped; any other
    /// failure aborts the whole run.
    pub async fn process_feeds(&self, urls: &[String]) -> anyhow::Result<Vec<ClassifiedArticle>> {
        let per_feed = try_join_all(urls.iter().map(|url| self.process_feed(url))).await?;
        let articles: Vec<ClassifiedArticle> = per_feed.into_iter().flatten().collect();

        info!(
            "Classified {} articles from {} feeds using {}",
            articles.len(),
            urls.len(),
            self.classifier.name()
        );
        Ok(articles)
    }

    async fn process_feed(&self, url: &str) -> anyhow::Result<Vec<ClassifiedArticle>> {
        let entries = self.fetcher.fetch_feed(url).await?;
        let results = try_join_all(entries.into_iter().map(|entry| self.process_entry(entry))).await?;
        Ok(results.into_iter().flatten().collect())
    }

    async fn process_entry(&self, entry: FeedEntry) -> anyhow::Result<Option<ClassifiedArticle>> {
        tokio::time::sleep(self.delay).await;

        let (content, published) = match &self.extractor {
            Some(extractor) => match extractor.extract(&entry.link).await {
                Ok(extracted) => {
                    let published = if entry.published.is_empty() {
                        extracted.published.unwrap_or_default()
                    } else {
                        entry.published
                    };
                    (extracted.text, published)
                }
                Err(e) => {
                    warn!("Error processing article at {}: {}", entry.link, e);
                    return Ok(None);
                }
            },
            None => (entry.summary, entry.published),
        };

        let prediction = {
            let _permit = self.permits.acquire().await?;
            predict_category(self.classifier.as_ref(), &entry.title, &self.categories).await?
        };
        debug!(
            "{:?} -> {} ({:.3})",
            entry.title, prediction.category, prediction.confidence
        );

        Ok(Some(ClassifiedArticle {
            title: entry.title,
            content,
            publication_date: published,
            source_url: entry.link,
            category: prediction.category,
            confidence: prediction.confidence,
        }))
    }
}
