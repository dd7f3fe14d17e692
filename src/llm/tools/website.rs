//! 网页阅读工具

use regex::Regex;
use rig::tool::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|svg)[^>]*>.*?</(script|style|noscript|svg)>")
        .expect("valid regex")
});
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(br|/p|/div|/li|/h[1-6]|/tr|/section|/article)[^>]*>").expect("valid regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid regex"));
static INLINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\f]+").expect("valid regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("valid regex"));

/// 读取网页并提取正文的工具
#[derive(Debug, Clone)]
pub struct WebsiteReaderTool {
    http: reqwest::Client,
    max_chars: usize,
}

/// 阅读参数
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WebsiteArgs {
    /// Mandatory full URL (http or https) of the page to read
    pub website_url: String,
}

/// 网页正文
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageText {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
    pub truncated: bool,
}

/// 网页阅读错误
#[derive(Debug, Error)]
pub enum WebsiteToolError {
    #[error("unsupported url `{0}`, only http and https are allowed")]
    UnsupportedUrl(String),
    #[error("failed to fetch page: {0}")]
    Request(#[from] reqwest::Error),
}

impl WebsiteReaderTool {
    pub fn new(http: reqwest::Client, max_chars: usize) -> Self {
        Self { http, max_chars }
    }

    async fn read(&self, url: &str) -> Result<PageText, WebsiteToolError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(WebsiteToolError::UnsupportedUrl(url.to_string()));
        }

        let html = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(extract_page_text(url, &html, self.max_chars))
    }
}

/// 将HTML转换为纯文本，超过 `max_chars` 时按字符截断
pub fn extract_page_text(url: &str, html: &str, max_chars: usize) -> PageText {
    let title = TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|t| !t.is_empty());

    let text = SCRIPT_OR_STYLE.replace_all(html, " ");
    let text = TITLE.replace_all(&text, " ");
    let text = BLOCK_BREAK.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, " ");
    let text = decode_entities(&text);
    let text = INLINE_SPACE.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    let text: String = text
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    let truncated = text.chars().count() > max_chars;
    let text = if truncated {
        text.chars().take(max_chars).collect()
    } else {
        text
    };

    PageText {
        url: url.to_string(),
        title,
        text,
        truncated,
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

impl Tool for WebsiteReaderTool {
    const NAME: &'static str = "read_website_content";

    type Error = WebsiteToolError;
    type Args = WebsiteArgs;
    type Output = PageText;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Read a web page and return its title and main text content.".to_string(),
            parameters: serde_json::to_value(schemars::schema_for!(WebsiteArgs))
                .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        tracing::debug!(url = %args.website_url, "tool called: read_website_content");
        self.read(&args.website_url).await
    }
}
