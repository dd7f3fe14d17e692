//! 网页搜索工具（Serper）

use rig::tool::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SearchConfig;

/// 基于Serper的网页搜索工具
#[derive(Debug, Clone)]
pub struct SerperSearchTool {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    results_per_query: usize,
}

/// 搜索参数
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Mandatory search query you want to use to search the internet
    pub search_query: String,
}

/// 单条搜索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

/// 搜索工具错误
#[derive(Debug, Error)]
pub enum SearchToolError {
    #[error("search query is empty")]
    EmptyQuery,
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl SerperSearchTool {
    pub fn new(http: reqwest::Client, config: &SearchConfig, api_key: String) -> Self {
        Self {
            http,
            endpoint: config.serper_endpoint.clone(),
            api_key,
            results_per_query: config.results_per_query,
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchToolError::EmptyQuery);
        }

        let response: SerperResponse = self
            .http
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({
                "q": query,
                "num": self.results_per_query,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut hits = response.organic;
        hits.truncate(self.results_per_query);
        Ok(hits)
    }
}

impl Tool for SerperSearchTool {
    const NAME: &'static str = "search_the_internet";

    type Error = SearchToolError;
    type Args = SearchArgs;
    type Output = Vec<SearchHit>;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search the internet and return the most relevant results (title, link, snippet) for a query.".to_string(),
            parameters: serde_json::to_value(schemars::schema_for!(SearchArgs))
                .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        tracing::debug!(query = %args.search_query, "tool called: search_the_internet");
        let hits = self.search(&args.search_query).await?;
        tracing::debug!(results = hits.len(), "search finished");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serper_response_parsing_tolerates_missing_fields() {
        let body = r#"{
            "searchParameters": {"q": "AI ethics"},
            "organic": [
                {"title": "AI Ethics", "link": "https://example.com/a", "snippet": "About ethics", "position": 1},
                {"title": "Jobs and AI", "link": "https://example.com/b", "date": "2 days ago"}
            ]
        }"#;

        let response: SerperResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.organic.len(), 2);
        assert_eq!(response.organic[0].snippet, "About ethics");
        assert_eq!(response.organic[1].snippet, "");
        assert_eq!(response.organic[1].date.as_deref(), Some("2 days ago"));
    }

    #[test]
    fn test_empty_body_has_no_hits() {
        let response: SerperResponse = serde_json::from_str("{}").unwrap();
        assert!(response.organic.is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_before_any_request() {
        let tool = SerperSearchTool::new(
            reqwest::Client::new(),
            &SearchConfig::default(),
            "key".to_string(),
        );
        let result = tool.search("   ").await;
        assert!(matches!(result, Err(SearchToolError::EmptyQuery)));
    }
}
