//! The in-memory item collection and event reconciliation.

use crate::error::StoreError;
use crate::event::{ChangeEvent, ItemMutation, Reconciliation};
use crate::item::{ItemId, ShoppingItem};

/// Insertion-ordered collection of shopping items, at most one per id.
///
/// This is the pure collection: no persistence, no validation beyond the
/// one-row-per-id invariant. [`crate::ListStore`] wraps it with both.
#[derive(Debug, Clone, Default)]
pub struct ShoppingList {
    items: Vec<ShoppingItem>,
}

impl ShoppingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from a saved or fetched snapshot. Rows with a duplicated id
    /// are dropped, keeping the first occurrence.
    pub fn from_items(items: Vec<ShoppingItem>) -> Self {
        let mut list = Self::new();
        for item in items {
            if list.position(item.id).is_none() {
                list.items.push(item);
            }
        }
        list
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&ShoppingItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.position(id)
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Append a new item. The id must not already be present.
    pub fn insert(&mut self, item: ShoppingItem) -> Result<(), StoreError> {
        if self.position(item.id).is_some() {
            return Err(StoreError::Validation(format!(
                "duplicate item id: {}",
                item.id
            )));
        }
        self.items.push(item);
        Ok(())
    }

    /// Put an item at `index` (clamped to the current length). If the id is
    /// already present the existing row is overwritten in place instead.
    pub fn insert_at(&mut self, index: usize, item: ShoppingItem) {
        match self.position(item.id) {
            Some(existing) => self.items[existing] = item,
            None => {
                let index = index.min(self.items.len());
                self.items.insert(index, item);
            }
        }
    }

    /// Replace name, category, and emoji, preserving everything else.
    pub fn edit(
        &mut self,
        id: ItemId,
        name: String,
        category: String,
        emoji: Option<String>,
    ) -> Result<(), StoreError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(StoreError::NotFound(id))?;
        item.name = name;
        item.category = category;
        item.emoji = emoji;
        Ok(())
    }

    /// Flip the completion flag, returning the new value.
    pub fn toggle(&mut self, id: ItemId) -> Result<bool, StoreError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(StoreError::NotFound(id))?;
        item.completed = !item.completed;
        Ok(item.completed)
    }

    /// Remove the item with `id`, returning it.
    pub fn remove(&mut self, id: ItemId) -> Result<ShoppingItem, StoreError> {
        let position = self.position(id).ok_or(StoreError::NotFound(id))?;
        Ok(self.items.remove(position))
    }

    /// Rewrite the category of every item matching `old`, returning the
    /// affected ids in list order.
    pub fn recategorize(&mut self, old: &str, new: &str) -> Vec<ItemId> {
        let mut changed = Vec::new();
        for item in &mut self.items {
            if item.category == old {
                item.category = new.to_string();
                changed.push(item.id);
            }
        }
        changed
    }

    /// Apply one mutation to each listed id. Ids no longer present are
    /// skipped; they may have been removed by a concurrent remote event.
    pub fn apply_to(&mut self, ids: &[ItemId], mutation: &ItemMutation) {
        for item in &mut self.items {
            if ids.contains(&item.id) {
                item.apply(mutation);
            }
        }
    }

    /// Fold a remote change event into the collection.
    ///
    /// Insert of a known id replaces the row, and update of an unknown id
    /// appends it, so duplicated or reordered delivery converges on the
    /// same state. Delete of an absent id does nothing.
    pub fn reconcile(&mut self, event: ChangeEvent) -> Reconciliation {
        match event {
            ChangeEvent::Inserted(item) | ChangeEvent::Updated(item) => {
                match self.position(item.id) {
                    Some(position) => {
                        self.items[position] = item;
                        Reconciliation::Replaced
                    }
                    None => {
                        self.items.push(item);
                        Reconciliation::Inserted
                    }
                }
            }
            ChangeEvent::Deleted(id) => match self.position(id) {
                Some(position) => {
                    self.items.remove(position);
                    Reconciliation::Removed
                }
                None => Reconciliation::Ignored,
            },
        }
    }

    /// Discard the collection in favor of a fresh snapshot.
    pub fn replace_all(&mut self, items: Vec<ShoppingItem>) {
        *self = Self::from_items(items);
    }
}
