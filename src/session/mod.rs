// Session - one long-lived owner of lists, preferences and shuffle rounds
// Every change to a list's items clears that list's round in the same call

use anyhow::{Context, Result};
use rand::Rng;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::backup::{self, BackupError};
use crate::config::{Config, Preferences, ViewType};
use crate::lists::{ChoiceList, ListStore};
use crate::shuffle::{ShuffleError, ShuffleSessionManager};

/// Result of a pick: where the item sits in its list and what it says
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub index: usize,
    pub item: String,
}

/// Changes to a list's display fields; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEdit {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub color_argb: Option<i64>,
    pub clear_emoji: bool,
    pub clear_color: bool,
}

pub struct Session {
    config: Config,
    config_path: Option<PathBuf>,
    store: ListStore,
    shuffle: ShuffleSessionManager,
}

impl Session {
    /// Open the store named by `config`. Preference changes are written back to
    /// `config_path` when one is given.
    pub fn open(config: Config, config_path: Option<PathBuf>) -> Result<Self> {
        let store = ListStore::open(&config.data_path)
            .with_context(|| format!("Failed to open lists at {}", config.data_path.display()))?;

        Ok(Self {
            config,
            config_path,
            store,
            shuffle: ShuffleSessionManager::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn preferences(&self) -> &Preferences {
        &self.config.preferences
    }

    pub fn lists(&self) -> &[ChoiceList] {
        self.store.lists()
    }

    pub fn get(&self, list_id: &str) -> Option<&ChoiceList> {
        self.store.get(list_id)
    }

    pub fn find(&self, query: &str) -> Option<&ChoiceList> {
        self.store.find(query)
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ChoiceList>> {
        self.store.subscribe()
    }

    pub fn shuffle(&self) -> &ShuffleSessionManager {
        &self.shuffle
    }

    pub fn add_list(&mut self, list: ChoiceList) -> Result<String> {
        let id = list.id.clone();
        // A reused id must not inherit an old round
        self.shuffle.clear(&id);
        self.store.add_list(list)?;
        Ok(id)
    }

    /// Replace a whole list. The round is dropped up front so it cannot outlive
    /// the items it was built for, whether or not the write succeeds.
    pub fn update_list(&mut self, list: ChoiceList) -> Result<()> {
        self.shuffle.clear(&list.id);
        self.store.update_list(list)?;
        Ok(())
    }

    /// Change name, glyph or color of a list
    pub fn edit_list(&mut self, list_id: &str, edit: ListEdit) -> Result<()> {
        let mut list = self
            .store
            .get(list_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("List not found: {}", list_id))?;

        if let Some(name) = edit.name {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                anyhow::bail!("List name cannot be empty");
            }
            list.name = trimmed.to_string();
        }
        if edit.clear_emoji {
            list.emoji = None;
        } else if let Some(emoji) = edit.emoji {
            list.emoji = Some(emoji);
        }
        if edit.clear_color {
            list.color_argb = None;
        } else if let Some(color) = edit.color_argb {
            list.color_argb = Some(color);
        }

        self.update_list(list)
    }

    pub fn rename_list(&mut self, list_id: &str, name: &str) -> Result<()> {
        self.edit_list(
            list_id,
            ListEdit {
                name: Some(name.to_string()),
                ..ListEdit::default()
            },
        )
    }

    pub fn delete_list(&mut self, list_id: &str) -> Result<bool> {
        self.shuffle.clear(list_id);
        Ok(self.store.delete_list(list_id)?)
    }

    pub fn add_item(&mut self, list_id: &str, item: &str) -> Result<bool> {
        let changed = self.store.add_item(list_id, item)?;
        if changed {
            self.shuffle.clear(list_id);
        }
        Ok(changed)
    }

    pub fn remove_item(&mut self, list_id: &str, item: &str) -> Result<bool> {
        let changed = self.store.remove_item(list_id, item)?;
        if changed {
            self.shuffle.clear(list_id);
        }
        Ok(changed)
    }

    pub fn set_avoid_previous_results(&mut self, value: bool) -> Result<()> {
        let preferences = Preferences {
            avoid_previous_results: value,
            ..self.config.preferences.clone()
        };
        self.apply_preferences(preferences)?;
        info!("Avoid previous results: {}", value);
        Ok(())
    }

    pub fn set_view_type(&mut self, view_type: ViewType) -> Result<()> {
        let preferences = Preferences {
            view_type,
            ..self.config.preferences.clone()
        };
        self.apply_preferences(preferences)?;
        info!("View type: {}", view_type);
        Ok(())
    }

    /// Index of the next item to show, or `None` for an unknown or empty list
    pub fn next_item_index(&self, list_id: &str) -> Result<Option<usize>, ShuffleError> {
        self.next_item_index_with(list_id, &mut rand::thread_rng())
    }

    pub fn next_item_index_with<R: Rng + ?Sized>(
        &self,
        list_id: &str,
        rng: &mut R,
    ) -> Result<Option<usize>, ShuffleError> {
        let Some(list) = self.store.get(list_id) else {
            return Ok(None);
        };
        if list.is_empty() {
            return Ok(None);
        }

        let index = self.shuffle.next_index_with(
            list_id,
            list.len(),
            self.config.preferences.avoid_previous_results,
            rng,
        )?;
        debug!("Picked index {} of {} from '{}'", index, list.len(), list.name);
        Ok(Some(index))
    }

    /// Pick the next item, resolved to its text
    pub fn pick(&self, list_id: &str) -> Result<Option<Pick>, ShuffleError> {
        let Some(index) = self.next_item_index(list_id)? else {
            return Ok(None);
        };
        Ok(self.store.get(list_id).and_then(|list| {
            list.items.get(index).map(|item| Pick {
                index,
                item: item.clone(),
            })
        }))
    }

    pub fn export_data(&self) -> Result<String, BackupError> {
        backup::export_json(self.store.lists(), &self.config.preferences)
    }

    /// Replace every list and preference with the backup's contents
    pub fn import_data(&mut self, text: &str) -> Result<usize> {
        let data = backup::parse_import(text)?;
        let count = data.lists.len();

        let preferences = data.preferences(&self.config.preferences);

        // Lists first: if they cannot be written, nothing has changed yet
        self.store.replace_all(data.lists)?;
        self.shuffle.reset();
        self.apply_preferences(preferences)
            .context("Lists were imported but preferences could not be saved")?;

        info!("Imported {} lists", count);
        Ok(count)
    }

    /// Save first, then switch; a failed write keeps the old preferences in memory
    fn apply_preferences(&mut self, preferences: Preferences) -> Result<()> {
        let mut next = self.config.clone();
        next.preferences = preferences;
        if let Some(path) = &self.config_path {
            next.save_to(path)?;
        }
        self.config = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use tempfile::{tempdir, TempDir};

    fn session(avoid: bool) -> (TempDir, Session) {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.data_path = dir.path().join("lists.json");
        config.preferences.avoid_previous_results = avoid;
        let config_path = dir.path().join("config.toml");
        let session = Session::open(config, Some(config_path)).unwrap();
        (dir, session)
    }

    fn dinner(session: &mut Session) -> String {
        session
            .add_list(ChoiceList::new("Dinner").with_items(["Pizza", "Sushi", "Tacos"]))
            .unwrap()
    }

    #[test]
    fn test_picks_cover_list_before_repeating() {
        let (_dir, mut session) = session(true);
        let id = dinner(&mut session);
        let mut rng = StdRng::seed_from_u64(21);

        for _ in 0..3 {
            let round: HashSet<usize> = (0..3)
                .map(|_| session.next_item_index_with(&id, &mut rng).unwrap().unwrap())
                .collect();
            assert_eq!(round.len(), 3);
        }
    }

    #[test]
    fn test_unknown_or_empty_list_gives_none() {
        let (_dir, mut session) = session(true);
        assert_eq!(session.next_item_index("missing").unwrap(), None);

        let id = session.add_list(ChoiceList::new("Empty")).unwrap();
        assert_eq!(session.next_item_index(&id).unwrap(), None);
        assert_eq!(session.pick(&id).unwrap(), None);
    }

    #[test]
    fn test_item_changes_clear_only_that_list() {
        let (_dir, mut session) = session(true);
        let dinner_id = dinner(&mut session);
        let games_id = session
            .add_list(ChoiceList::new("Games").with_items(["Chess", "Go"]))
            .unwrap();

        session.next_item_index(&dinner_id).unwrap();
        session.next_item_index(&games_id).unwrap();
        assert_eq!(session.shuffle().remaining(&dinner_id), Some(2));

        assert!(session.add_item(&dinner_id, "Curry").unwrap());
        assert_eq!(session.shuffle().remaining(&dinner_id), None);
        assert_eq!(session.shuffle().remaining(&games_id), Some(1));

        session.next_item_index(&dinner_id).unwrap();
        assert!(session.remove_item(&dinner_id, "Curry").unwrap());
        assert_eq!(session.shuffle().remaining(&dinner_id), None);
    }

    #[test]
    fn test_duplicate_add_keeps_round() {
        let (_dir, mut session) = session(true);
        let id = dinner(&mut session);
        session.next_item_index(&id).unwrap();

        assert!(!session.add_item(&id, "pizza").unwrap());
        assert_eq!(session.shuffle().remaining(&id), Some(2));
    }

    #[test]
    fn test_update_and_delete_clear_round() {
        let (_dir, mut session) = session(true);
        let id = dinner(&mut session);
        session.next_item_index(&id).unwrap();

        // Same item count, different items: the old round must not survive
        let mut edited = session.get(&id).unwrap().clone();
        edited.items = vec!["Ramen".into(), "Pho".into(), "Udon".into()];
        session.update_list(edited).unwrap();
        assert_eq!(session.shuffle().remaining(&id), None);

        session.next_item_index(&id).unwrap();
        assert!(session.delete_list(&id).unwrap());
        assert_eq!(session.shuffle().remaining(&id), None);
        assert_eq!(session.next_item_index(&id).unwrap(), None);
    }

    #[test]
    fn test_simple_mode_keeps_no_rounds() {
        let (_dir, mut session) = session(false);
        let id = dinner(&mut session);

        for _ in 0..20 {
            let pick = session.pick(&id).unwrap().unwrap();
            assert!(pick.index < 3);
            assert_eq!(session.get(&id).unwrap().items[pick.index], pick.item);
        }
        assert_eq!(session.shuffle().remaining(&id), None);
    }

    #[test]
    fn test_preferences_persist() {
        let (dir, mut session) = session(false);
        session.set_avoid_previous_results(true).unwrap();
        session.set_view_type(ViewType::List).unwrap();

        let saved = Config::load_from(dir.path().join("config.toml")).unwrap();
        assert!(saved.preferences.avoid_previous_results);
        assert_eq!(saved.preferences.view_type, ViewType::List);
    }

    #[test]
    fn test_edit_changes_display_fields() {
        let (_dir, mut session) = session(false);
        let id = dinner(&mut session);

        session
            .edit_list(
                &id,
                ListEdit {
                    emoji: Some("🍜".into()),
                    color_argb: Some(0xFF2196F3),
                    ..ListEdit::default()
                },
            )
            .unwrap();
        let list = session.get(&id).unwrap();
        assert_eq!(list.title(), "🍜 Dinner");
        assert_eq!(list.color_argb, Some(0xFF2196F3));

        session
            .edit_list(
                &id,
                ListEdit {
                    name: Some("Supper".into()),
                    clear_emoji: true,
                    clear_color: true,
                    ..ListEdit::default()
                },
            )
            .unwrap();
        let list = session.get(&id).unwrap();
        assert_eq!(list.title(), "Supper");
        assert_eq!(list.color_argb, None);
        assert_eq!(list.items, vec!["Pizza", "Sushi", "Tacos"]);
    }

    #[test]
    fn test_failed_update_does_not_keep_round() {
        let (dir, mut session) = session(true);
        let id = session
            .add_list(ChoiceList::new("Letters").with_items(["a", "b", "c"]))
            .unwrap();
        session.next_item_index(&id).unwrap();
        assert_eq!(session.shuffle().remaining(&id), Some(2));

        let path = dir.path().join("lists.json");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let mut edited = session.get(&id).unwrap().clone();
        edited.items = vec!["x".into(), "y".into(), "z".into()];
        assert!(session.update_list(edited).is_err());

        assert_eq!(session.get(&id).unwrap().items, vec!["a", "b", "c"]);
        assert_eq!(session.shuffle().remaining(&id), None);
    }

    #[test]
    fn test_failed_import_write_applies_nothing() {
        let (_src_dir, mut source) = session(true);
        dinner(&mut source);
        source.set_view_type(ViewType::List).unwrap();
        let text = source.export_data().unwrap();

        let (dir, mut target) = session(false);
        let id = target
            .add_list(ChoiceList::new("Old").with_items(["x"]))
            .unwrap();
        let path = dir.path().join("lists.json");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(target.import_data(&text).is_err());
        assert_eq!(target.lists().len(), 1);
        assert!(target.get(&id).is_some());
        assert!(!target.preferences().avoid_previous_results);
        assert_eq!(target.preferences().view_type, ViewType::Grid);
    }

    #[test]
    fn test_rename_rejects_blank_names() {
        let (_dir, mut session) = session(false);
        let id = dinner(&mut session);

        session.rename_list(&id, "  Supper ").unwrap();
        assert_eq!(session.get(&id).unwrap().name, "Supper");
        assert!(session.rename_list(&id, "   ").is_err());
        assert!(session.rename_list("missing", "x").is_err());
    }

    #[test]
    fn test_import_replaces_everything_and_resets_rounds() {
        let (_dir, mut source) = session(true);
        let id = dinner(&mut source);
        source.set_view_type(ViewType::List).unwrap();
        let text = source.export_data().unwrap();

        let (_other_dir, mut target) = session(true);
        let mut old = ChoiceList::new("Old").with_items(["x", "y"]);
        old.id = id.clone();
        target.add_list(old).unwrap();
        target.set_view_type(ViewType::Grid).unwrap();
        target.next_item_index(&id).unwrap();
        assert_eq!(target.shuffle().remaining(&id), Some(1));

        assert_eq!(target.import_data(&text).unwrap(), 1);
        assert_eq!(target.lists().len(), 1);
        assert_eq!(target.get(&id).unwrap().items, vec!["Pizza", "Sushi", "Tacos"]);
        assert!(target.preferences().avoid_previous_results);
        assert_eq!(target.preferences().view_type, ViewType::List);
        assert_eq!(target.shuffle().remaining(&id), None);
    }

    #[test]
    fn test_failed_import_changes_nothing() {
        let (_dir, mut session) = session(false);
        let id = dinner(&mut session);

        assert!(session.import_data("").is_err());
        assert!(session.import_data("not json").is_err());
        assert!(session.get(&id).is_some());
        assert!(!session.preferences().avoid_previous_results);
    }
}
