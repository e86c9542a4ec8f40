use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use super::ChoiceList;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("list not found: {0}")]
    ListNotFound(String),
    #[error("list id already exists: {0}")]
    DuplicateId(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize lists: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ordered collection of lists, persisted as one JSON file.
///
/// Every mutation writes the file and publishes the new snapshot to subscribers.
#[derive(Debug)]
pub struct ListStore {
    lists: Vec<ChoiceList>,
    path: PathBuf,
    notifier: watch::Sender<Vec<ChoiceList>>,
}

impl ListStore {
    /// Open the store at `path`, loading whatever is there
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let lists = Self::load_lists(&path)?;
        let (notifier, _) = watch::channel(lists.clone());

        info!("Loaded {} lists from {}", lists.len(), path.display());
        Ok(Self {
            lists,
            path,
            notifier,
        })
    }

    /// Missing file means no lists yet; a corrupt file is logged and treated as empty
    fn load_lists(path: &Path) -> Result<Vec<ChoiceList>, StoreError> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match serde_json::from_str::<Vec<ChoiceList>>(&content) {
            Ok(lists) => Ok(lists),
            Err(e) => {
                warn!("Ignoring unreadable lists file {}: {}", path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    /// Write the whole collection to disk
    pub fn save(&self) -> Result<(), StoreError> {
        self.write(&self.lists)
    }

    fn write(&self, lists: &[ChoiceList]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(lists)?;
        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lists(&self) -> &[ChoiceList] {
        &self.lists
    }

    pub fn get(&self, id: &str) -> Option<&ChoiceList> {
        self.lists.iter().find(|list| list.id == id)
    }

    /// Look a list up by id, falling back to a case-insensitive name match
    pub fn find(&self, query: &str) -> Option<&ChoiceList> {
        let query = query.trim();
        self.get(query).or_else(|| {
            let lowered = query.to_lowercase();
            self.lists
                .iter()
                .find(|list| list.name.to_lowercase() == lowered)
        })
    }

    /// Watch the collection; the receiver always holds the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChoiceList>> {
        self.notifier.subscribe()
    }

    pub fn add_list(&mut self, mut list: ChoiceList) -> Result<(), StoreError> {
        if self.get(&list.id).is_some() {
            return Err(StoreError::DuplicateId(list.id));
        }
        list.normalize();

        let mut next = self.lists.clone();
        let (name, count) = (list.name.clone(), list.items.len());
        next.push(list);
        self.commit(next)?;
        info!("Added list '{}' ({} items)", name, count);
        Ok(())
    }

    /// Replace the list with the same id
    pub fn update_list(&mut self, mut updated: ChoiceList) -> Result<(), StoreError> {
        let pos = self.position(&updated.id)?;
        updated.normalize();

        let mut next = self.lists.clone();
        let name = updated.name.clone();
        next[pos] = updated;
        self.commit(next)?;
        info!("Updated list '{}'", name);
        Ok(())
    }

    pub fn delete_list(&mut self, id: &str) -> Result<bool, StoreError> {
        let Some(pos) = self.lists.iter().position(|list| list.id == id) else {
            return Ok(false);
        };

        let mut next = self.lists.clone();
        let removed = next.remove(pos);
        self.commit(next)?;
        info!("Deleted list '{}'", removed.name);
        Ok(true)
    }

    /// Add an item unless it is blank or a case-insensitive duplicate
    pub fn add_item(&mut self, list_id: &str, item: &str) -> Result<bool, StoreError> {
        let pos = self.position(list_id)?;
        let mut next = self.lists.clone();
        if !next[pos].push_item(item) {
            return Ok(false);
        }
        let name = next[pos].name.clone();
        self.commit(next)?;
        info!("Added '{}' to list '{}'", item.trim(), name);
        Ok(true)
    }

    /// Remove an item by exact text
    pub fn remove_item(&mut self, list_id: &str, item: &str) -> Result<bool, StoreError> {
        let pos = self.position(list_id)?;
        let mut next = self.lists.clone();
        if !next[pos].drop_item(item) {
            return Ok(false);
        }
        let name = next[pos].name.clone();
        self.commit(next)?;
        info!("Removed '{}' from list '{}'", item, name);
        Ok(true)
    }

    /// Swap in a whole new collection (used by import)
    pub fn replace_all(&mut self, mut lists: Vec<ChoiceList>) -> Result<(), StoreError> {
        lists.iter_mut().for_each(ChoiceList::normalize);
        let (before, after) = (self.lists.len(), lists.len());
        self.commit(lists)?;
        info!("Replaced {} lists with {}", before, after);
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.lists
            .iter()
            .position(|list| list.id == id)
            .ok_or_else(|| StoreError::ListNotFound(id.to_string()))
    }

    /// Persist `next` and only then make it current; a failed write leaves everything as it was
    fn commit(&mut self, next: Vec<ChoiceList>) -> Result<(), StoreError> {
        self.write(&next)?;
        self.lists = next;
        self.notifier.send_replace(self.lists.clone());
        Ok(())
    }
}
