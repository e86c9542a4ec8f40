// Backup - export/import of every list plus preferences as one JSON document
// Field names match the backups written by the Choosr mobile app, so files move between the two

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::config::{Preferences, ViewType};
use crate::lists::ChoiceList;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup file is empty")]
    Empty,
    #[error("invalid backup format: {0}")]
    InvalidFormat(#[from] serde_json::Error),
    #[error("backup contains list id '{0}' more than once")]
    DuplicateListId(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub lists: Vec<ChoiceList>,
    #[serde(default)]
    pub avoid_previous_results: bool,
    #[serde(default)]
    pub view_type: Option<ViewType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl ExportData {
    pub fn new(lists: Vec<ChoiceList>, preferences: &Preferences) -> Self {
        Self {
            lists,
            avoid_previous_results: preferences.avoid_previous_results,
            view_type: Some(preferences.view_type),
            exported_at: Some(Utc::now()),
        }
    }

    /// Preferences carried by this backup; a missing view type keeps `current`
    pub fn preferences(&self, current: &Preferences) -> Preferences {
        Preferences {
            avoid_previous_results: self.avoid_previous_results,
            view_type: self.view_type.unwrap_or(current.view_type),
        }
    }
}

/// Serialize lists and preferences into backup text
pub fn export_json(lists: &[ChoiceList], preferences: &Preferences) -> Result<String, BackupError> {
    let data = ExportData::new(lists.to_vec(), preferences);
    Ok(serde_json::to_string_pretty(&data)?)
}

/// Parse and clean up backup text
pub fn parse_import(text: &str) -> Result<ExportData, BackupError> {
    if text.trim().is_empty() {
        return Err(BackupError::Empty);
    }

    let mut data: ExportData = serde_json::from_str(text)?;

    let mut seen = HashSet::new();
    for list in &mut data.lists {
        if list.id.trim().is_empty() {
            list.id = crate::lists::new_list_id();
        }
        if !seen.insert(list.id.clone()) {
            return Err(BackupError::DuplicateListId(list.id.clone()));
        }
        list.normalize();
    }

    Ok(data)
}

pub fn write_export(path: impl AsRef<Path>, text: &str) -> Result<(), BackupError> {
    let path = path.as_ref();
    fs::write(path, text).map_err(|source| BackupError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Exported backup to {}", path.display());
    Ok(())
}

pub fn read_import(path: impl AsRef<Path>) -> Result<String, BackupError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| BackupError::Io {
        path: path.to_path_buf(),
        source,
    })
}
