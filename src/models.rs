//! Core data models for the persisted user-data document.
//!
//! These types mirror the JSON document on disk exactly: one root record
//! holding every portfolio link and extracted file entry for the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The single persisted root record.
///
/// Both collections are always present for readers; `#[serde(default)]`
/// keeps partially-shaped documents (e.g. hand-edited backups) loadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub portfolio_links: Vec<PortfolioLinkEntry>,
    #[serde(default)]
    pub files: BTreeMap<String, FileEntry>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl UserData {
    /// Fresh empty record with both collections present.
    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            portfolio_links: Vec::new(),
            files: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.portfolio_links.is_empty() && self.files.is_empty()
    }
}

/// One stored portfolio link with its extracted page content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioLinkEntry {
    /// UUID assigned at creation; unique for the record's lifetime,
    /// never reused even after deletion.
    pub id: String,
    pub url: String,
    /// Open string enum: `linkedin`, `github`, `website`, or whatever the
    /// caller supplied. Not validated against a closed set.
    #[serde(rename = "type")]
    pub link_type: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Extracted page text, or sentinel error text. May be empty.
    #[serde(default)]
    pub content: String,
    pub added_at: DateTime<Utc>,
}

/// One stored file entry, keyed in [`UserData::files`] by its original
/// upload name. The on-disk artifact lives under a generated UUID name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    /// Extracted text, or sentinel error text.
    #[serde(default)]
    pub content: String,
    /// Derived category: see [`file_type_for`].
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Aggregate view of the stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSummary {
    pub total_portfolio_links: usize,
    pub total_files: usize,
    /// Distinct link types, sorted.
    pub portfolio_types: Vec<String>,
    /// Distinct file categories, sorted.
    pub file_types: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derive the stored file category from a filename's extension.
pub fn file_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "pdf",
        "doc" | "docx" => "document",
        "txt" => "text",
        "jpg" | "jpeg" | "png" | "gif" => "image",
        "csv" | "xlsx" | "xls" => "spreadsheet",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_mapping() {
        assert_eq!(file_type_for("resume.pdf"), "pdf");
        assert_eq!(file_type_for("notes.TXT"), "text");
        assert_eq!(file_type_for("cover.docx"), "document");
        assert_eq!(file_type_for("photo.JPEG"), "image");
        assert_eq!(file_type_for("grades.xlsx"), "spreadsheet");
        assert_eq!(file_type_for("archive.tar.gz"), "unknown");
        assert_eq!(file_type_for("no_extension"), "unknown");
    }

    #[test]
    fn test_empty_record_has_both_collections() {
        let data = UserData::empty();
        assert!(data.portfolio_links.is_empty());
        assert!(data.files.is_empty());
        assert_eq!(data.created_at, data.updated_at);
    }

    #[test]
    fn test_partial_document_loads_with_defaults() {
        // A document that only carries the two required collections must
        // still deserialize; timestamps fall back to now.
        let data: UserData =
            serde_json::from_str(r#"{"portfolio_links": [], "files": {}}"#).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_link_type_serializes_as_type() {
        let entry = PortfolioLinkEntry {
            id: "abc".into(),
            url: "https://github.com/x".into(),
            link_type: "github".into(),
            description: None,
            content: String::new(),
            added_at: Utc::now(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "github");
        assert!(json.get("link_type").is_none());
    }
}
