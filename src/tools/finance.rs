//! Market data tools over the public Yahoo Finance chart API.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{Value, json};

const DEFAULT_API_BASE: &str = "https://query1.finance.yahoo.com";

/// Stock quote lookup tool.
pub struct StockQuoteTool {
    client: reqwest::Client,
    api_base: String,
}

impl StockQuoteTool {
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE.to_string())
    }

    /// Override the API base, used by tests to point at a mock server.
    pub fn with_api_base(api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
        }
    }

    async fn fetch_chart(&self, symbol: &str) -> Result<Value> {
        let url = format!("{}/v8/finance/chart/{}", self.api_base, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", "5d")])
            .header("User-Agent", "atlas-server")
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Quote request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::NotFound(format!(
                "No quote data for symbol '{}'",
                symbol
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid quote response: {}", e)))
    }
}

impl Default for StockQuoteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for StockQuoteTool {
    fn name(&self) -> &str {
        "stock_quote"
    }

    fn description(&self) -> &str {
        "Get the latest price and daily range for a stock ticker symbol"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Ticker symbol, e.g. AAPL or NVDA"
                }
            },
            "required": ["symbol"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let symbol = args
            .get("symbol")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'symbol' parameter".to_string()))?;

        let chart = self.fetch_chart(symbol).await?;

        let meta = chart
            .pointer("/chart/result/0/meta")
            .ok_or_else(|| AppError::NotFound(format!("No quote data for symbol '{}'", symbol)))?;

        Ok(json!({
            "symbol": meta.get("symbol").cloned().unwrap_or(json!(symbol)),
            "currency": meta.get("currency").cloned().unwrap_or(Value::Null),
            "price": meta.get("regularMarketPrice").cloned().unwrap_or(Value::Null),
            "previous_close": meta.get("chartPreviousClose").cloned().unwrap_or(Value::Null),
            "day_high": meta.get("regularMarketDayHigh").cloned().unwrap_or(Value::Null),
            "day_low": meta.get("regularMarketDayLow").cloned().unwrap_or(Value::Null),
            "exchange": meta.get("exchangeName").cloned().unwrap_or(Value::Null),
        }))
    }
}

/// Company profile lookup tool.
///
/// Uses the same chart endpoint; the meta block carries the instrument
/// name, exchange and market state without needing an API key.
pub struct CompanyProfileTool {
    client: reqwest::Client,
    api_base: String,
}

impl CompanyProfileTool {
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE.to_string())
    }

    pub fn with_api_base(api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
        }
    }
}

impl Default for CompanyProfileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CompanyProfileTool {
    fn name(&self) -> &str {
        "company_profile"
    }

    fn description(&self) -> &str {
        "Get basic company information (name, exchange, instrument type) for a ticker symbol"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Ticker symbol, e.g. AAPL or NVDA"
                }
            },
            "required": ["symbol"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let symbol = args
            .get("symbol")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'symbol' parameter".to_string()))?;

        let url = format!("{}/v8/finance/chart/{}", self.api_base, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", "1d")])
            .header("User-Agent", "atlas-server")
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Profile request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::NotFound(format!(
                "No profile data for symbol '{}'",
                symbol
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid profile response: {}", e)))?;

        let meta = body
            .pointer("/chart/result/0/meta")
            .ok_or_else(|| AppError::NotFound(format!("No profile data for symbol '{}'", symbol)))?;

        Ok(json!({
            "symbol": meta.get("symbol").cloned().unwrap_or(json!(symbol)),
            "name": meta.get("longName").cloned().unwrap_or(Value::Null),
            "exchange": meta.get("fullExchangeName").cloned().unwrap_or(Value::Null),
            "instrument_type": meta.get("instrumentType").cloned().unwrap_or(Value::Null),
            "timezone": meta.get("exchangeTimezoneName").cloned().unwrap_or(Value::Null),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_tool_definition() {
        let tool = StockQuoteTool::new();
        assert_eq!(tool.name(), "stock_quote");
        assert!(!tool.description().is_empty());

        let schema = tool.parameters_schema();
        assert!(schema.get("properties").is_some());
        assert_eq!(schema["required"][0], "symbol");
    }

    #[test]
    fn test_profile_tool_definition() {
        let tool = CompanyProfileTool::new();
        assert_eq!(tool.name(), "company_profile");
        assert!(!tool.description().is_empty());
    }

    #[tokio::test]
    async fn test_quote_missing_symbol() {
        let tool = StockQuoteTool::new();
        let result = tool.execute(json!({})).await;
        assert!(result.is_err());
    }
}
