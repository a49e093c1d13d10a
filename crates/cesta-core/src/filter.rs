//! Category filtering and the pending/completed partition.

use std::fmt;

use crate::item::ShoppingItem;

/// Category selection for the list view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every category
    #[default]
    All,
    /// One category, exact name match
    Only(String),
}

impl CategoryFilter {
    /// Parse a filter value: the sentinel `"all"` or a category name.
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value.to_string())
        }
    }

    pub fn matches(&self, item: &ShoppingItem) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => item.category == *category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Only(category) => write!(f, "{}", category),
        }
    }
}

/// Pending/completed split of the visible items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub pending: Vec<ShoppingItem>,
    pub completed: Vec<ShoppingItem>,
}

/// Split `items` by completion under `filter`, preserving source order
/// within each half. The input is left untouched.
pub fn partition(items: &[ShoppingItem], filter: &CategoryFilter) -> Partition {
    let mut split = Partition::default();
    for item in items {
        if !filter.matches(item) {
            continue;
        }
        if item.completed {
            split.completed.push(item.clone());
        } else {
            split.pending.push(item.clone());
        }
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(name: &str, category: &str, completed: bool) -> ShoppingItem {
        let mut item = ShoppingItem::new(name, 1, category, None).unwrap();
        item.completed = completed;
        item
    }

    #[test]
    fn partition_splits_by_completion() {
        let items = vec![
            make_item("Apple", "Fruits", false),
            make_item("Milk", "Dairy", true),
            make_item("Bread", "Pantry", false),
        ];
        let split = partition(&items, &CategoryFilter::All);
        assert_eq!(split.pending.len(), 2);
        assert_eq!(split.completed.len(), 1);
        assert_eq!(split.pending[0].name, "Apple");
        assert_eq!(split.pending[1].name, "Bread");
    }

    #[test]
    fn partition_filters_by_category() {
        let items = vec![
            make_item("Apple", "Fruits", false),
            make_item("Milk", "Dairy", true),
            make_item("Cherry", "Fruits", true),
        ];
        let split = partition(&items, &CategoryFilter::Only("Fruits".to_string()));
        assert_eq!(split.pending.len(), 1);
        assert_eq!(split.completed.len(), 1);
        assert_eq!(split.completed[0].name, "Cherry");
    }

    #[test]
    fn partition_covers_every_visible_item() {
        let items = vec![
            make_item("Apple", "Fruits", false),
            make_item("Milk", "Dairy", true),
        ];
        let split = partition(&items, &CategoryFilter::All);
        assert_eq!(split.pending.len() + split.completed.len(), items.len());
    }

    #[test]
    fn parse_recognizes_the_all_sentinel() {
        assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::parse("Dairy"),
            CategoryFilter::Only("Dairy".to_string())
        );
        assert_eq!(CategoryFilter::default(), CategoryFilter::All);
    }

    #[test]
    fn display_round_trips_with_parse() {
        for value in ["all", "Dairy"] {
            assert_eq!(CategoryFilter::parse(value).to_string(), value);
        }
    }
}
