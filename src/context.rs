//! Context assembly for the personalized chat mode.
//!
//! Renders the stored record into a bounded, human-readable block that
//! rides along as language-model context. Snippets are capped (200 chars
//! per link, 300 per file) to keep the prompt's token budget flat no
//! matter how much content the user has ingested.

use crate::models::UserData;

/// Returned when there is nothing stored at all.
pub const NO_DATA: &str = "No user data available.";

const LINK_SNIPPET_CHARS: usize = 200;
const FILE_SNIPPET_CHARS: usize = 300;

/// Render the bounded context block for a record.
pub fn build_context(data: &UserData) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !data.portfolio_links.is_empty() {
        parts.push("Portfolio Links:".to_string());
        for link in &data.portfolio_links {
            parts.push(format!(" - {}: {}", link.link_type, link.url));
            if !link.content.is_empty() {
                parts.push(format!(
                    "   Content summary: {}...",
                    snippet(&link.content, LINK_SNIPPET_CHARS)
                ));
            }
        }
    }

    if !data.files.is_empty() {
        parts.push("\nUploaded Files:".to_string());
        for (filename, file) in &data.files {
            parts.push(format!(" - {}", filename));
            if !file.content.is_empty() {
                parts.push(format!(
                    "   Content: {}...",
                    snippet(&file.content, FILE_SNIPPET_CHARS)
                ));
            }
        }
    }

    if parts.is_empty() {
        NO_DATA.to_string()
    } else {
        parts.join("\n")
    }
}

/// First `max` characters, respecting UTF-8 boundaries.
fn snippet(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileEntry, PortfolioLinkEntry, UserData};
    use chrono::Utc;

    fn link(url: &str, link_type: &str, content: &str) -> PortfolioLinkEntry {
        PortfolioLinkEntry {
            id: "id".into(),
            url: url.into(),
            link_type: link_type.into(),
            description: None,
            content: content.into(),
            added_at: Utc::now(),
        }
    }

    fn file(name: &str, content: &str) -> FileEntry {
        FileEntry {
            filename: name.into(),
            content: content.into(),
            file_type: "text".into(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_record_renders_sentinel() {
        assert_eq!(build_context(&UserData::empty()), NO_DATA);
    }

    #[test]
    fn test_link_snippet_truncates_to_200_chars() {
        let mut data = UserData::empty();
        data.portfolio_links
            .push(link("https://github.com/x", "github", &"A".repeat(500)));

        let context = build_context(&data);
        assert!(context.contains(" - github: https://github.com/x"));
        let expected = format!("   Content summary: {}...", "A".repeat(200));
        assert!(context.contains(&expected));
        assert!(!context.contains(&"A".repeat(201)));
    }

    #[test]
    fn test_file_snippet_truncates_to_300_chars() {
        let mut data = UserData::empty();
        data.files
            .insert("resume.pdf".into(), file("resume.pdf", &"B".repeat(400)));

        let context = build_context(&data);
        assert!(context.contains(" - resume.pdf"));
        let expected = format!("   Content: {}...", "B".repeat(300));
        assert!(context.contains(&expected));
        assert!(!context.contains(&"B".repeat(301)));
    }

    #[test]
    fn test_empty_content_gets_no_snippet_line() {
        let mut data = UserData::empty();
        data.portfolio_links.push(link("https://example.com", "website", ""));

        let context = build_context(&data);
        assert!(context.contains(" - website: https://example.com"));
        assert!(!context.contains("Content summary"));
    }

    #[test]
    fn test_links_render_before_files() {
        let mut data = UserData::empty();
        data.portfolio_links.push(link("https://example.com", "website", "w"));
        data.files.insert("a.txt".into(), file("a.txt", "hello"));

        let context = build_context(&data);
        let links_at = context.find("Portfolio Links:").unwrap();
        let files_at = context.find("Uploaded Files:").unwrap();
        assert!(links_at < files_at);
    }

    #[test]
    fn test_snippet_respects_multibyte_boundaries() {
        let text = "é".repeat(250);
        let s = snippet(&text, 200);
        assert_eq!(s.chars().count(), 200);
    }
}
