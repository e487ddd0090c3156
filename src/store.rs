//! File-backed user-data store.
//!
//! One JSON document holds the whole record; every operation is a full
//! read, mutate, full write. Mutations (and the self-healing read) hold
//! one async mutex so concurrent requests serialize instead of racing
//! read-read-write-write and silently dropping an update.
//!
//! A missing, unreadable, or corrupt document never fails a request: the
//! store reinitializes to the empty-record shape and carries on.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::models::{file_type_for, DataSummary, FileEntry, PortfolioLinkEntry, UserData};

pub struct UserDataStore {
    data_file: PathBuf,
    data_dir: PathBuf,
    lock: Mutex<()>,
}

impl UserDataStore {
    /// Open the store, creating the data directory and seeding an empty
    /// record when none exists yet.
    pub fn open(storage: &StorageConfig) -> Result<Self> {
        std::fs::create_dir_all(&storage.data_dir).with_context(|| {
            format!("Failed to create data directory {}", storage.data_dir.display())
        })?;

        let store = Self {
            data_file: storage.user_data_file(),
            data_dir: storage.data_dir.clone(),
            lock: Mutex::new(()),
        };

        if !store.data_file.exists() {
            store.write_document(&UserData::empty())?;
        }

        Ok(store)
    }

    /// Current record. Reinitializes transparently if the backing file is
    /// missing or corrupt.
    pub async fn get_user_data(&self) -> Result<UserData> {
        let _guard = self.lock.lock().await;
        self.load_or_heal()
    }

    /// Append a portfolio link entry; returns its freshly assigned id.
    pub async fn add_portfolio_link(
        &self,
        url: &str,
        link_type: &str,
        description: Option<String>,
        content: String,
    ) -> Result<String> {
        let _guard = self.lock.lock().await;
        let mut data = self.load_or_heal()?;

        let id = Uuid::new_v4().to_string();
        data.portfolio_links.push(PortfolioLinkEntry {
            id: id.clone(),
            url: url.to_string(),
            link_type: link_type.to_string(),
            description,
            content,
            added_at: Utc::now(),
        });

        self.save(&mut data)?;
        Ok(id)
    }

    /// Upsert a file entry keyed by its original filename. Re-uploading
    /// the same name replaces content and timestamp (last-write-wins).
    pub async fn add_file_data(&self, filename: &str, content: String) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut data = self.load_or_heal()?;

        data.files.insert(
            filename.to_string(),
            FileEntry {
                filename: filename.to_string(),
                content,
                file_type: file_type_for(filename).to_string(),
                uploaded_at: Utc::now(),
            },
        );

        self.save(&mut data)?;
        Ok(())
    }

    /// Remove a file entry. Reports whether anything was removed; the
    /// record is only rewritten when it was.
    pub async fn delete_file(&self, filename: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut data = self.load_or_heal()?;

        if data.files.remove(filename).is_none() {
            return Ok(false);
        }
        self.save(&mut data)?;
        Ok(true)
    }

    /// Filter out the link with the given id. Always reports success,
    /// whether or not the id existed.
    pub async fn delete_portfolio_link(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut data = self.load_or_heal()?;

        data.portfolio_links.retain(|link| link.id != id);
        self.save(&mut data)?;
        Ok(true)
    }

    pub async fn summary(&self) -> Result<DataSummary> {
        let _guard = self.lock.lock().await;
        let data = self.load_or_heal()?;

        let portfolio_types: BTreeSet<String> = data
            .portfolio_links
            .iter()
            .map(|link| link.link_type.clone())
            .collect();
        let file_types: BTreeSet<String> = data
            .files
            .values()
            .map(|file| file.file_type.clone())
            .collect();

        Ok(DataSummary {
            total_portfolio_links: data.portfolio_links.len(),
            total_files: data.files.len(),
            portfolio_types: portfolio_types.into_iter().collect(),
            file_types: file_types.into_iter().collect(),
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Write a full copy of the record. Without an explicit path the copy
    /// lands next to the document under a timestamp-derived name.
    pub async fn backup(&self, path: Option<PathBuf>) -> Result<PathBuf> {
        let _guard = self.lock.lock().await;
        let data = self.load_or_heal()?;

        let path = path.unwrap_or_else(|| {
            let stamp = Utc::now().format("%Y%m%d_%H%M%S");
            self.data_dir.join(format!("backup_{}.json", stamp))
        });

        let json = serde_json::to_string_pretty(&data).context("Failed to serialize backup")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write backup {}", path.display()))?;
        Ok(path)
    }

    /// Replace the current record with a previously backed-up one.
    ///
    /// Accepts the file only if it parses as JSON carrying both
    /// `portfolio_links` and `files` keys; deeper validation is
    /// intentionally permissive. Returns `false` (not an error) on a
    /// missing file, malformed content, or failed shape check.
    pub async fn restore(&self, path: &Path) -> Result<bool> {
        let _guard = self.lock.lock().await;

        let Ok(content) = std::fs::read_to_string(path) else {
            return Ok(false);
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&content) else {
            return Ok(false);
        };
        if value.get("portfolio_links").is_none() || value.get("files").is_none() {
            return Ok(false);
        }
        let Ok(mut data) = serde_json::from_value::<UserData>(value) else {
            return Ok(false);
        };

        self.save(&mut data)?;
        Ok(true)
    }

    /// Reset to the empty-record shape.
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_document(&UserData::empty())
    }

    fn load_or_heal(&self) -> Result<UserData> {
        match std::fs::read_to_string(&self.data_file) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(data) => Ok(data),
                Err(e) => {
                    tracing::warn!(
                        file = %self.data_file.display(),
                        error = %e,
                        "user-data document is corrupt, reinitializing"
                    );
                    self.heal()
                }
            },
            Err(_) => self.heal(),
        }
    }

    fn heal(&self) -> Result<UserData> {
        let data = UserData::empty();
        self.write_document(&data)?;
        Ok(data)
    }

    fn save(&self, data: &mut UserData) -> Result<()> {
        data.updated_at = Utc::now();
        self.write_document(data)
    }

    fn write_document(&self, data: &UserData) -> Result<()> {
        let json = serde_json::to_string_pretty(data).context("Failed to serialize user data")?;
        std::fs::write(&self.data_file, json)
            .with_context(|| format!("Failed to write {}", self.data_file.display()))?;
        Ok(())
    }
}
