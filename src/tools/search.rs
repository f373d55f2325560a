//! Web search tools backed by daedra (DuckDuckGo), no API key required.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{Value, json};

const DEFAULT_NUM_RESULTS: usize = 5;

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::InvalidInput(format!("Missing '{}' parameter", key)))
}

/// DuckDuckGo search.
#[derive(Default)]
pub struct SearchTool;

impl SearchTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web and get back result titles, URLs and snippets"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "How many results to return",
                    "default": DEFAULT_NUM_RESULTS
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = required_str(&args, "query")?;
        let num_results = args
            .get("num_results")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_NUM_RESULTS);

        let response = daedra::tools::search::perform_search(&daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results,
                ..Default::default()
            }),
        })
        .await
        .map_err(|e| AppError::Internal(format!("Search failed: {}", e)))?;

        let results: Vec<Value> = response
            .data
            .iter()
            .map(|r| json!({ "title": r.title, "url": r.url, "snippet": r.description }))
            .collect();

        Ok(json!({
            "query": query,
            "count": results.len(),
            "results": results,
        }))
    }
}

/// Fetch a page and return it as markdown text.
#[derive(Default)]
pub struct FetchPageTool;

impl FetchPageTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for FetchPageTool {
    fn name(&self) -> &str {
        "fetch_page"
    }

    fn description(&self) -> &str {
        "Read a web page when a search snippet is not enough; returns markdown"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "URL of the page to read"
                },
                "selector": {
                    "type": "string",
                    "description": "Optional CSS selector to narrow the extraction"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let url = required_str(&args, "url")?;
        let selector = args
            .get("selector")
            .and_then(|v| v.as_str())
            .map(String::from);

        let page = daedra::tools::fetch::fetch_page(&daedra::VisitPageArgs {
            url: url.to_string(),
            include_images: false,
            selector,
        })
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch page: {}", e)))?;

        Ok(json!({
            "url": page.url,
            "title": page.title,
            "content": page.content,
            "word_count": page.word_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_match_registry_ids() {
        assert_eq!(SearchTool::new().name(), "web_search");
        assert_eq!(FetchPageTool::new().name(), "fetch_page");
    }

    #[test]
    fn test_search_schema_requires_query() {
        let schema = SearchTool::new().parameters_schema();
        assert_eq!(schema["required"][0], "query");
    }

    #[tokio::test]
    async fn test_missing_required_parameters() {
        assert!(SearchTool::new().execute(json!({})).await.is_err());
        assert!(
            FetchPageTool::new()
                .execute(json!({ "selector": "main" }))
                .await
                .is_err()
        );
    }
}
