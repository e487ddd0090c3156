//! Portfolio-link fetching: URL → bounded plain text.
//!
//! Fetches with a realistic browser user-agent and a hard 10-second
//! timeout, reduces the HTML to readable text (readability extraction
//! first, HTML→markdown conversion as fallback), collapses whitespace,
//! and truncates to a fixed budget. Failures come back as
//! [`ExtractError`] values; [`crate::extract::stored_text`] turns them
//! into the sentinel strings the store persists.

use std::io::Cursor;
use std::time::Duration;

use crate::extract::ExtractError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CONTENT_CHARS: usize = 5000;
const TRUNCATION_MARKER: &str = "... [Content truncated]";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Fetch a URL and extract its readable text content.
pub async fn fetch_url(url: &str) -> Result<String, ExtractError> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(BROWSER_USER_AGENT)
        .build()
        .map_err(|e| ExtractError::Fetch(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ExtractError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractError::Fetch(format!("HTTP {} for {}", status, url)));
    }

    let html = response
        .text()
        .await
        .map_err(|e| ExtractError::Fetch(e.to_string()))?;

    html_to_text(&html, url)
}

/// Reduce an HTML document to collapsed, bounded plain text.
pub fn html_to_text(html: &str, url: &str) -> Result<String, ExtractError> {
    let parsed_url = reqwest::Url::parse(url)
        .or_else(|_| reqwest::Url::parse("http://localhost/"))
        .map_err(|e| ExtractError::Web(e.to_string()))?;

    // Readability extraction strips script/style/navigation; fall back to
    // a plain HTML→markdown pass when it finds no article body.
    let text = {
        let mut cursor = Cursor::new(html.as_bytes());
        match llm_readability::extractor::extract(&mut cursor, &parsed_url) {
            Ok(product) if !product.text.trim().is_empty() => product.text,
            _ => htmd::convert(html).map_err(|e| ExtractError::Web(e.to_string()))?,
        }
    };

    Ok(truncate_chars(&collapse_whitespace(&text)))
}

/// Collapse whitespace runs within lines and drop blank lines.
fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bound the extracted text, appending a marker when cut.
fn truncate_chars(text: &str) -> String {
    let mut out: String = text.chars().take(MAX_CONTENT_CHARS).collect();
    if text.chars().count() > MAX_CONTENT_CHARS {
        out.push_str(TRUNCATION_MARKER);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::stored_text;

    #[test]
    fn test_collapse_whitespace() {
        let text = "  a   b\n\n\n c\t\td  \n";
        assert_eq!(collapse_whitespace(text), "a b\nc d");
    }

    #[test]
    fn test_truncation_appends_marker() {
        let long = "x".repeat(6000);
        let out = truncate_chars(&long);
        assert_eq!(out.chars().count(), 5000 + TRUNCATION_MARKER.chars().count());
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_chars("short"), "short");
    }

    #[test]
    fn test_html_reduction_drops_markup() {
        let html = "<html><head><style>body { color: red; }</style></head>\
                    <body><p>Alpha beta</p><script>alert(1)</script></body></html>";
        let text = html_to_text(html, "http://example.com/").unwrap();
        assert!(text.contains("Alpha beta"));
        assert!(!text.contains("alert"));
        assert!(!text.contains("color: red"));
    }

    #[tokio::test]
    async fn test_unreachable_url_yields_sentinel() {
        // Nothing listens on the discard port; connection is refused fast.
        let text = stored_text(fetch_url("http://127.0.0.1:9/profile").await);
        assert!(!text.is_empty());
        assert!(text.starts_with("Error fetching URL:"), "{}", text);
    }
}
