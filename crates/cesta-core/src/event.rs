//! Change events and field mutations exchanged with the backing store.

use serde::{Deserialize, Serialize};

use crate::item::{ItemId, ShoppingItem};

/// A change notification from the backing store.
///
/// `Inserted` and `Updated` carry the full authoritative row; `Deleted`
/// carries only the id. Delivery may be duplicated or reordered, so
/// consumers fold events in with [`crate::ShoppingList::reconcile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChangeEvent {
    Inserted(ShoppingItem),
    Updated(ShoppingItem),
    Deleted(ItemId),
}

impl ChangeEvent {
    /// The id of the affected row.
    pub fn item_id(&self) -> ItemId {
        match self {
            ChangeEvent::Inserted(item) | ChangeEvent::Updated(item) => item.id,
            ChangeEvent::Deleted(id) => *id,
        }
    }
}

/// A single-field update pushed to the backing store.
///
/// Updates travel as mutation lists so that a completion toggle writes
/// only the changed boolean, not the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemMutation {
    SetName(String),
    SetQuantity(u32),
    SetCategory(String),
    SetEmoji(Option<String>),
    SetCompleted(bool),
}

/// What folding a remote event into the local collection did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// New row appended
    Inserted,
    /// Existing row replaced in place
    Replaced,
    /// Row removed
    Removed,
    /// Event targeted a row that is already gone
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_item(name: &str) -> ShoppingItem {
        ShoppingItem::new(name, 1, "Pantry", None).unwrap()
    }

    #[test]
    fn item_id_covers_all_variants() {
        let item = make_item("Rice");
        assert_eq!(ChangeEvent::Inserted(item.clone()).item_id(), item.id);
        assert_eq!(ChangeEvent::Updated(item.clone()).item_id(), item.id);

        let id = Uuid::new_v4();
        assert_eq!(ChangeEvent::Deleted(id).item_id(), id);
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = ChangeEvent::Updated(make_item("Flour"));
        let json = serde_json::to_string(&event).unwrap();
        let back: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn mutations_round_trip_through_json() {
        let mutations = vec![
            ItemMutation::SetName("Bread".to_string()),
            ItemMutation::SetEmoji(None),
            ItemMutation::SetCompleted(true),
        ];
        let json = serde_json::to_string(&mutations).unwrap();
        let back: Vec<ItemMutation> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mutations);
    }
}
