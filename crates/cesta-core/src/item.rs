//! The shopping item record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::event::ItemMutation;

/// Unique identifier for a shopping item.
pub type ItemId = Uuid;

/// A single entry on the shopping list.
///
/// `created_at` is assigned once at creation and is the list's display
/// ordering key; it never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub category: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ShoppingItem {
    /// Build a validated item with a fresh id and the current timestamp.
    ///
    /// Names and categories are trimmed and must be non-empty; quantity
    /// must be at least 1. A blank emoji becomes `None`.
    pub fn new(
        name: &str,
        quantity: u32,
        category: &str,
        emoji: Option<&str>,
    ) -> Result<Self, StoreError> {
        let name = validate_name(name)?;
        let category = validate_category(category)?;
        if quantity == 0 {
            return Err(StoreError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            quantity,
            category,
            completed: false,
            emoji: normalize_emoji(emoji),
            created_at: Utc::now(),
        })
    }

    /// Apply a single field mutation in place.
    pub fn apply(&mut self, mutation: &ItemMutation) {
        match mutation {
            ItemMutation::SetName(name) => self.name = name.clone(),
            ItemMutation::SetQuantity(quantity) => self.quantity = *quantity,
            ItemMutation::SetCategory(category) => self.category = category.clone(),
            ItemMutation::SetEmoji(emoji) => self.emoji = emoji.clone(),
            ItemMutation::SetCompleted(completed) => self.completed = *completed,
        }
    }
}

pub(crate) fn validate_name(name: &str) -> Result<String, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Validation(
            "item name must not be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

pub(crate) fn validate_category(category: &str) -> Result<String, StoreError> {
    let category = category.trim();
    if category.is_empty() {
        return Err(StoreError::Validation(
            "category must not be empty".to_string(),
        ));
    }
    Ok(category.to_string())
}

/// Trim decorative input; blank becomes `None`.
pub(crate) fn normalize_emoji(emoji: Option<&str>) -> Option<String> {
    emoji.and_then(|e| {
        let e = e.trim();
        if e.is_empty() {
            None
        } else {
            Some(e.to_string())
        }
    })
}
