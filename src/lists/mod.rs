// Lists - the things you pick from
// Each list keeps a stable id so shuffle rounds and backups can find it again

pub mod store; // JSON-backed collection with change notifications

pub use store::{ListStore, StoreError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named list of items to choose from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceList {
    #[serde(default = "new_list_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub color_argb: Option<i64>,
}

pub(crate) fn new_list_id() -> String {
    Uuid::new_v4().to_string()
}

impl ChoiceList {
    /// Create an empty list with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_list_id(),
            name: name.into().trim().to_string(),
            items: Vec::new(),
            emoji: None,
            color_argb: None,
        }
    }

    /// Replace the items, trimming and dropping blanks and case-insensitive duplicates
    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.items = normalize_items(items);
        self
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    pub fn with_color(mut self, color_argb: i64) -> Self {
        self.color_argb = Some(color_argb);
        self
    }

    /// Case-insensitive membership check
    pub fn contains_item(&self, item: &str) -> bool {
        self.items.iter().any(|existing| same_item(existing, item))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Display name with the leading glyph, if any
    pub fn title(&self) -> String {
        match &self.emoji {
            Some(emoji) if !emoji.is_empty() => format!("{} {}", emoji, self.name),
            _ => self.name.clone(),
        }
    }

    /// Trim the name and bring items back to the list invariant
    pub(crate) fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.items = normalize_items(&self.items);
    }

    /// Append `item` unless it is blank or already present. Returns whether anything changed.
    pub(crate) fn push_item(&mut self, item: &str) -> bool {
        let trimmed = item.trim();
        if trimmed.is_empty() || self.contains_item(trimmed) {
            return false;
        }
        self.items.push(trimmed.to_string());
        true
    }

    /// Remove the exact `item`. Returns whether anything changed.
    pub(crate) fn drop_item(&mut self, item: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|existing| existing != item);
        self.items.len() != before
    }
}

fn same_item(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Trim, drop blanks, drop case-insensitive repeats (first spelling wins)
pub fn normalize_items<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() || normalized.iter().any(|existing| same_item(existing, trimmed)) {
            continue;
        }
        normalized.push(trimmed.to_string());
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_items() {
        let items = normalize_items(["  Pizza ", "pizza", "", "Sushi", "   ", "SUSHI", "Tacos"]);
        assert_eq!(items, vec!["Pizza", "Sushi", "Tacos"]);
    }

    #[test]
    fn test_push_item_dedupes_case_insensitively() {
        let mut list = ChoiceList::new("Dinner").with_items(["Pizza"]);
        assert!(!list.push_item("PIZZA"));
        assert!(!list.push_item("   "));
        assert!(list.push_item("  Ramen "));
        assert_eq!(list.items, vec!["Pizza", "Ramen"]);
    }

    #[test]
    fn test_drop_item_is_exact_match() {
        let mut list = ChoiceList::new("Dinner").with_items(["Pizza", "Ramen"]);
        assert!(!list.drop_item("pizza"));
        assert!(list.drop_item("Pizza"));
        assert_eq!(list.items, vec!["Ramen"]);
    }

    #[test]
    fn test_json_uses_camel_case_and_fills_missing_id() {
        let list = ChoiceList::new("Games").with_color(0xFF00FF00);
        let json = serde_json::to_string(&list).unwrap();
        assert!(json.contains("\"colorArgb\""));

        let parsed: ChoiceList = serde_json::from_str(r#"{"name":"Movies","items":["Up"]}"#).unwrap();
        assert!(!parsed.id.is_empty());
        assert_eq!(parsed.items, vec!["Up"]);
        assert_eq!(parsed.emoji, None);
    }

    #[test]
    fn test_normalize_fixes_hand_built_lists() {
        let mut list = ChoiceList::new("x");
        list.name = "  Dinner ".into();
        list.items = vec!["Pizza".into(), "pizza".into(), "  ".into(), " Sushi".into()];

        list.normalize();
        assert_eq!(list.name, "Dinner");
        assert_eq!(list.items, vec!["Pizza", "Sushi"]);
    }

    #[test]
    fn test_title_includes_emoji() {
        let list = ChoiceList::new(" Snacks ").with_emoji("🍿");
        assert_eq!(list.name, "Snacks");
        assert_eq!(list.title(), "🍿 Snacks");
    }
}
