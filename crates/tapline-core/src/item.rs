//! # Items
//!
//! The cached item type and the summary derived from a store read.
//!
//! ## Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Item Lifecycle                                 │
//! │                                                                         │
//! │  Remote result ──► Item { id: 0, name, favorite: false } (unsaved)     │
//! │       │                                                                 │
//! │       ▼ insert_many                                                     │
//! │  Store row     ──► Item { id: 7, name, favorite }  (id is identity)    │
//! │       │                                                                 │
//! │       ▼ delete_all                                                      │
//! │  (gone)                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// A cached item from the remote listing.
///
/// `id` is assigned by the store; `0` means the item has not been saved yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Store-assigned identifier (0 = unsaved).
    pub id: i64,

    /// Display name; also the merge key when fresh results are written.
    pub name: String,

    /// Whether the user marked this item as a favorite.
    pub favorite: bool,
}

impl Item {
    /// Creates an item with every field given.
    pub fn new(id: i64, name: impl Into<String>, favorite: bool) -> Self {
        Item {
            id,
            name: name.into(),
            favorite,
        }
    }

    /// Creates an unsaved, unfavorited item (the form remote results take).
    pub fn unsaved(name: impl Into<String>) -> Self {
        Item::new(0, name, false)
    }

    /// Returns true once the store has assigned an id.
    #[inline]
    pub fn is_saved(&self) -> bool {
        self.id != 0
    }

    /// Number of characters in the name.
    #[inline]
    pub fn name_len(&self) -> usize {
        self.name.chars().count()
    }
}

/// Summary recomputed on every store read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemCollectionSummary {
    /// The item with the longest name, `None` for an empty list.
    pub longest_name_item: Option<Item>,

    /// Every item, in store order.
    pub all_items: Vec<Item>,
}

impl ItemCollectionSummary {
    /// Builds the summary for a list of items.
    ///
    /// Ties on name length keep the item that comes first in store order.
    pub fn from_items(all_items: Vec<Item>) -> Self {
        let longest_name_item = all_items
            .iter()
            .fold(None::<&Item>, |best, item| match best {
                Some(current) if current.name_len() >= item.name_len() => Some(current),
                _ => Some(item),
            })
            .cloned();

        ItemCollectionSummary {
            longest_name_item,
            all_items,
        }
    }

    /// Looks up an item by id.
    pub fn find(&self, id: i64) -> Option<&Item> {
        self.all_items.iter().find(|item| item.id == id)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.all_items.len()
    }

    /// Returns true if there are no items.
    pub fn is_empty(&self) -> bool {
        self.all_items.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_name_wins() {
        let summary = ItemCollectionSummary::from_items(vec![
            Item::new(1, "weissbier", false),
            Item::new(2, "Punk Ipa", false),
        ]);

        assert_eq!(summary.longest_name_item, Some(Item::new(1, "weissbier", false)));
        assert_eq!(summary.len(), 2);
    }

    #[test]
    fn test_ties_keep_first_in_store_order() {
        let summary = ItemCollectionSummary::from_items(vec![
            Item::new(1, "Stout", false),
            Item::new(2, "Lager", true),
            Item::new(3, "Ale", false),
        ]);

        assert_eq!(summary.longest_name_item.map(|i| i.id), Some(1));
    }

    #[test]
    fn test_empty_list_has_no_longest() {
        let summary = ItemCollectionSummary::from_items(Vec::new());
        assert!(summary.longest_name_item.is_none());
        assert!(summary.is_empty());
    }

    #[test]
    fn test_name_length_counts_characters() {
        // "Märzen" is six characters but seven bytes
        let summary = ItemCollectionSummary::from_items(vec![
            Item::new(1, "Märzen", false),
            Item::new(2, "Porter1", false),
        ]);
        assert_eq!(summary.longest_name_item.map(|i| i.id), Some(2));
    }

    #[test]
    fn test_unsaved_item() {
        let item = Item::unsaved("Punk Ipa");
        assert_eq!(item.id, 0);
        assert!(!item.favorite);
        assert!(!item.is_saved());
    }
}
