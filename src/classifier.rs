//! Zero-shot classification of article titles.
//!
//! The model itself is an external service; [`HttpClassifier`] speaks the
//! Hugging Face `zero-shot-classification` request format, which is also what
//! self-hosted inference servers expose for NLI models.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ClassifierConfig;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("model returned {labels} labels but {scores} scores")]
    LengthMismatch { labels: usize, scores: usize },
    #[error("model returned no labels")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// The winning category for a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub category: String,
    pub confidence: f64,
}

#[async_trait]
pub trait ZeroShotClassifier: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Score `text` against every candidate label.
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ClassifyError>;
}

/// Classify `title` and keep the best-scoring label.
///
/// When two labels share the top score the one returned first wins.
pub async fn predict_category(
    classifier: &dyn ZeroShotClassifier,
    title: &str,
    labels: &[String],
) -> Result<Prediction, ClassifyError> {
    let scores = classifier.classify(title, labels).await?;
    top_prediction(&scores).ok_or(ClassifyError::Empty)
}

pub fn top_prediction(scores: &[LabelScore]) -> Option<Prediction> {
    let mut best: Option<&LabelScore> = None;
    for candidate in scores {
        match best {
            Some(current) if current.score >= candidate.score => {}
            _ => best = Some(candidate),
        }
    }
    best.map(|b| Prediction {
        category: b.label.clone(),
        confidence: b.score,
    })
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
    parameters: ClassifyParameters<'a>,
}

#[derive(Serialize)]
struct ClassifyParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Columns { labels: Vec<String>, scores: Vec<f64> },
    Pairs(Vec<LabelScoreRow>),
}

#[derive(Deserialize)]
struct LabelScoreRow {
    label: String,
    score: f64,
}

impl ClassifyResponse {
    fn into_scores(self) -> Result<Vec<LabelScore>, ClassifyError> {
        let scores: Vec<LabelScore> = match self {
            ClassifyResponse::Columns { labels, scores } => {
                if labels.len() != scores.len() {
                    return Err(ClassifyError::LengthMismatch {
                        labels: labels.len(),
                        scores: scores.len(),
                    });
                }
                labels
                    .into_iter()
                    .zip(scores)
                    .map(|(label, score)| LabelScore { label, score })
                    .collect()
            }
            ClassifyResponse::Pairs(rows) => rows
                .into_iter()
                .map(|row| LabelScore {
                    label: row.label,
                    score: row.score,
                })
                .collect(),
        };

        if scores.is_empty() {
            return Err(ClassifyError::Empty);
        }
        Ok(scores)
    }
}

pub struct HttpClassifier {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
    multi_label: bool,
}

impl HttpClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
        multi_label: bool,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token,
            multi_label,
        })
    }

    /// Build from config, reading the token from the configured environment variable.
    pub fn from_config(config: &ClassifierConfig) -> anyhow::Result<Self> {
        let api_token = std::env::var(&config.api_token_env)
            .ok()
            .filter(|t| !t.is_empty());
        Self::new(
            config.endpoint.clone(),
            api_token,
            Duration::from_secs(config.timeout_secs),
            config.multi_label,
        )
    }
}

impl fmt::Debug for HttpClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClassifier")
            .field("endpoint", &self.endpoint)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("multi_label", &self.multi_label)
            .finish()
    }
}

#[async_trait]
impl ZeroShotClassifier for HttpClassifier {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ClassifyError> {
        let body = ClassifyRequest {
            inputs: text,
            parameters: ClassifyParameters {
                candidate_labels: labels,
                multi_label: self.multi_label,
            },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await?
            .error_for_status()?
            .json::<ClassifyResponse>()
            .await?;

        response.into_scores()
    }
}
