//! The shopping list aggregate: items, categories, and their local cache.

use crate::cache::{LocalCache, MemoryCache, CATEGORIES_KEY, ITEMS_KEY};
use crate::category::Categories;
use crate::error::StoreError;
use crate::event::{ChangeEvent, ItemMutation, Reconciliation};
use crate::filter::{partition, CategoryFilter, Partition};
use crate::item::{self, ItemId, ShoppingItem};
use crate::list::ShoppingList;

/// Items and categories over a durable cache.
///
/// Every mutation applies in memory first, then writes the full serialized
/// collection back to the cache. A failed write reverts the in-memory
/// change before the error is returned, so memory and cache stay in step.
pub struct ListStore {
    items: ShoppingList,
    categories: Categories,
    cache: Box<dyn LocalCache>,
}

impl std::fmt::Debug for ListStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListStore")
            .field("items", &self.items)
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}

impl ListStore {
    /// Load saved state from `cache`. A missing item payload means an empty
    /// list; a missing category payload seeds the default sequence. Nothing
    /// is written back until the first mutation.
    pub fn open(cache: Box<dyn LocalCache>) -> Result<Self, StoreError> {
        let items = match cache.get(ITEMS_KEY)? {
            Some(payload) => {
                let records: Vec<ShoppingItem> = serde_json::from_str(&payload)
                    .map_err(|e| StoreError::Storage(format!("parse items: {}", e)))?;
                ShoppingList::from_items(records)
            }
            None => ShoppingList::new(),
        };
        let categories = match cache.get(CATEGORIES_KEY)? {
            Some(payload) => {
                let names: Vec<String> = serde_json::from_str(&payload)
                    .map_err(|e| StoreError::Storage(format!("parse categories: {}", e)))?;
                Categories::from_names(names)
            }
            None => Categories::new(),
        };
        Ok(Self {
            items,
            categories,
            cache,
        })
    }

    /// Store over a fresh volatile cache.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(Box::new(MemoryCache::new()))
    }

    pub fn items(&self) -> &[ShoppingItem] {
        self.items.items()
    }

    pub fn get(&self, id: ItemId) -> Option<&ShoppingItem> {
        self.items.get(id)
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.index_of(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn categories(&self) -> &[String] {
        self.categories.names()
    }

    /// Pending/completed split of the items visible under `filter`.
    pub fn partition(&self, filter: &CategoryFilter) -> Partition {
        partition(self.items.items(), filter)
    }

    /// Validate, append, and persist a new item, returning it.
    pub fn add(
        &mut self,
        name: &str,
        quantity: u32,
        category: &str,
        emoji: Option<&str>,
    ) -> Result<ShoppingItem, StoreError> {
        let item = ShoppingItem::new(name, quantity, category, emoji)?;
        self.items.insert(item.clone())?;
        if let Err(e) = self.persist_items() {
            let _ = self.items.remove(item.id);
            return Err(e);
        }
        Ok(item)
    }

    /// Replace name, category, and emoji of an existing item. Quantity and
    /// completion are untouched.
    pub fn edit(
        &mut self,
        id: ItemId,
        name: &str,
        category: &str,
        emoji: Option<&str>,
    ) -> Result<(), StoreError> {
        let name = item::validate_name(name)?;
        let category = item::validate_category(category)?;
        let emoji = item::normalize_emoji(emoji);
        let prior = self
            .items
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(id))?;
        self.items.edit(id, name, category, emoji)?;
        if let Err(e) = self.persist_items() {
            let _ = self
                .items
                .edit(id, prior.name, prior.category, prior.emoji);
            return Err(e);
        }
        Ok(())
    }

    /// Flip completion, returning the new value.
    pub fn toggle_completed(&mut self, id: ItemId) -> Result<bool, StoreError> {
        let completed = self.items.toggle(id)?;
        if let Err(e) = self.persist_items() {
            let _ = self.items.toggle(id);
            return Err(e);
        }
        Ok(completed)
    }

    /// Remove an item, returning it.
    pub fn remove(&mut self, id: ItemId) -> Result<ShoppingItem, StoreError> {
        let index = self.items.index_of(id).ok_or(StoreError::NotFound(id))?;
        let removed = self.items.remove(id)?;
        if let Err(e) = self.persist_items() {
            self.items.insert_at(index, removed);
            return Err(e);
        }
        Ok(removed)
    }

    /// Put a previously removed item back at its original index.
    pub fn restore_at(&mut self, index: usize, item: ShoppingItem) -> Result<(), StoreError> {
        let id = item.id;
        self.items.insert_at(index, item);
        if let Err(e) = self.persist_items() {
            let _ = self.items.remove(id);
            return Err(e);
        }
        Ok(())
    }

    /// Apply one mutation to each listed id and persist once. Missing ids
    /// are skipped.
    pub fn apply_to(&mut self, ids: &[ItemId], mutation: &ItemMutation) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        self.items.apply_to(ids, mutation);
        self.persist_items()
    }

    /// Fold a remote change event in and persist the result.
    ///
    /// The event is authoritative, so a failed persist keeps the reconciled
    /// state in memory and reports the storage error. An ignored event
    /// writes nothing.
    pub fn reconcile(&mut self, event: ChangeEvent) -> Result<Reconciliation, StoreError> {
        let outcome = self.items.reconcile(event);
        if outcome != Reconciliation::Ignored {
            self.persist_items()?;
        }
        Ok(outcome)
    }

    /// Replace the whole collection with a fetched snapshot and persist it.
    pub fn replace_all(&mut self, items: Vec<ShoppingItem>) -> Result<(), StoreError> {
        self.items.replace_all(items);
        self.persist_items()
    }

    /// Append a category and persist the sequence.
    pub fn add_category(&mut self, name: &str) -> Result<(), StoreError> {
        let prior = self.categories.clone();
        self.categories.add(name)?;
        if let Err(e) = self.persist_categories() {
            self.categories = prior;
            return Err(e);
        }
        Ok(())
    }

    /// Rename a category and recategorize every item carrying the old name,
    /// returning the affected ids. Both collections persist together; on a
    /// failed write the whole rename is undone.
    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<Vec<ItemId>, StoreError> {
        let prior = self.categories.clone();
        self.categories.rename(old, new)?;
        if self.categories == prior {
            // Same-name rename touches nothing.
            return Ok(Vec::new());
        }
        let changed = self.items.recategorize(old, new.trim());
        if let Err(e) = self
            .persist_categories()
            .and_then(|_| self.persist_items())
        {
            self.categories = prior;
            self.items
                .apply_to(&changed, &ItemMutation::SetCategory(old.to_string()));
            let _ = self.persist_categories();
            let _ = self.persist_items();
            return Err(e);
        }
        Ok(changed)
    }

    /// Undo a rename: restore the sequence entry and set the listed items
    /// back to the old name.
    pub fn revert_rename(
        &mut self,
        old: &str,
        new: &str,
        ids: &[ItemId],
    ) -> Result<(), StoreError> {
        self.categories.rename(new, old)?;
        self.items
            .apply_to(ids, &ItemMutation::SetCategory(old.to_string()));
        self.persist_categories()?;
        self.persist_items()
    }

    fn persist_items(&self) -> Result<(), StoreError> {
        let payload = serde_json::to_string(self.items.items())
            .map_err(|e| StoreError::Storage(format!("serialize items: {}", e)))?;
        self.cache.set(ITEMS_KEY, &payload)
    }

    fn persist_categories(&self) -> Result<(), StoreError> {
        let payload = serde_json::to_string(self.categories.names())
            .map_err(|e| StoreError::Storage(format!("serialize categories: {}", e)))?;
        self.cache.set(CATEGORIES_KEY, &payload)
    }
}
