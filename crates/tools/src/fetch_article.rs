//! Article fetch tool.
//!
//! Extraction is delegated to a readability proxy: `GET {reader_url}/{url}`
//! with `Accept: application/json` answers `{"data": {title, description, content}}`.
//! The tool then enforces a minimum usable length and truncates long bodies.

use async_trait::async_trait;
use briefly_config::ArticleConfig;
use briefly_core::error::ToolError;
use briefly_core::tool::Tool;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Appended to content cut at the length cap.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated...]";

/// An extracted news article, as handed back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ArticleError {
    #[error("Failed to fetch article: HTTP {0}")]
    Status(u16),

    #[error("Failed to fetch article: {0}")]
    Network(String),

    #[error("Failed to parse article response: {0}")]
    Parse(String),

    #[error(
        "Could not extract article content. The article may be behind a paywall or the page structure was unrecognized."
    )]
    ContentUnavailable,
}

#[derive(Debug, Deserialize)]
struct ReaderResponse {
    data: ReaderData,
}

#[derive(Debug, Default, Deserialize)]
struct ReaderData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Fetches articles through the readability proxy.
pub struct ArticleFetcher {
    reader_url: String,
    max_content_chars: usize,
    min_content_chars: usize,
    client: reqwest::Client,
}

impl ArticleFetcher {
    pub fn new(config: &ArticleConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            reader_url: config.reader_url.trim_end_matches('/').to_string(),
            max_content_chars: config.max_content_chars,
            min_content_chars: config.min_content_chars,
            client,
        }
    }

    /// Fetch and normalize the article at `url`.
    pub async fn fetch(&self, url: &str) -> Result<Article, ArticleError> {
        let reader = format!("{}/{}", self.reader_url, url);
        debug!(url = %url, "Fetching article");

        let response = self
            .client
            .get(&reader)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ArticleError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArticleError::Status(status.as_u16()));
        }

        let body: ReaderResponse = response
            .json()
            .await
            .map_err(|e| ArticleError::Parse(e.to_string()))?;

        let article = normalize(body.data, self.min_content_chars, self.max_content_chars)?;
        info!(url = %url, title = %article.title, chars = article.content.chars().count(), "Article fetched");
        Ok(article)
    }
}

/// Apply defaults, the minimum length check, and the truncation cap.
fn normalize(data: ReaderData, min_chars: usize, max_chars: usize) -> Result<Article, ArticleError> {
    let content = data.content.unwrap_or_default();
    if content.chars().count() < min_chars {
        return Err(ArticleError::ContentUnavailable);
    }

    Ok(Article {
        title: data
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".into()),
        subtitle: data.description.filter(|d| !d.is_empty()),
        author: None,
        content: truncate(content, max_chars),
    })
}

/// Cut `content` to `max_chars` characters and append the marker when it was longer.
fn truncate(content: String, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = content[..byte_idx].to_string();
            cut.push_str(TRUNCATION_MARKER);
            cut
        }
        None => content,
    }
}

/// The `fetch_article` tool exposed to the model.
pub struct FetchArticleTool {
    fetcher: ArticleFetcher,
}

impl FetchArticleTool {
    pub fn new(fetcher: ArticleFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Tool for FetchArticleTool {
    fn name(&self) -> &str {
        "fetch_article"
    }

    fn description(&self) -> &str {
        "Fetches and extracts the content of a news article given its URL. \
         Use this tool whenever the user provides a news article URL or asks about a specific article."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The full URL of the news article to fetch."
                }
            },
            "required": ["url"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let url = arguments["url"]
            .as_str()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'url' argument".into()))?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArguments(
                "URL must start with http:// or https://".into(),
            ));
        }

        let article = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        serde_json::to_string(&article).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: e.to_string(),
        })
    }
}
