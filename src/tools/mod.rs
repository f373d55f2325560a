//! Built-in tools exposed to agents via function calling.
//!
//! - `web_search` / `fetch_page` - DuckDuckGo search and page fetching
//! - `stock_quote` / `company_profile` - market data from Yahoo Finance
//! - `send_message` / `admin_send_message` - Telegram Bot API

pub mod finance;
pub mod registry;
pub mod search;
pub mod telegram;

pub use registry::{Tool, ToolRegistry};
