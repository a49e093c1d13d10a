//! The ordered category sequence.

use crate::error::StoreError;

/// Categories offered to a fresh store with no saved state.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Fruits",
    "Vegetables",
    "Meat",
    "Dairy",
    "Pantry",
    "Beverages",
    "Other",
];

/// Ordered set of category names. Insertion order is display order; names
/// are unique with exact (case-sensitive) comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categories {
    names: Vec<String>,
}

impl Categories {
    /// The default category sequence.
    pub fn new() -> Self {
        Self {
            names: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Restore a previously saved sequence, dropping duplicate names
    /// (first occurrence wins).
    pub fn from_names(names: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self { names: unique }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Append a new category at the end of the sequence.
    pub fn add(&mut self, name: &str) -> Result<(), StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation(
                "category name must not be empty".to_string(),
            ));
        }
        if self.contains(name) {
            return Err(StoreError::DuplicateCategory(name.to_string()));
        }
        self.names.push(name.to_string());
        Ok(())
    }

    /// Replace `old` with `new`, keeping its position in the sequence.
    ///
    /// Renaming a category to its own name is accepted and changes
    /// nothing, provided the category exists.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        let new = new.trim();
        if new.is_empty() {
            return Err(StoreError::Validation(
                "category name must not be empty".to_string(),
            ));
        }
        if new != old && self.contains(new) {
            return Err(StoreError::DuplicateCategory(new.to_string()));
        }
        let position = self
            .names
            .iter()
            .position(|n| n == old)
            .ok_or_else(|| StoreError::CategoryNotFound(old.to_string()))?;
        self.names[position] = new.to_string();
        Ok(())
    }
}

impl Default for Categories {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_seeds_defaults_in_order() {
        let categories = Categories::new();
        assert_eq!(categories.names().len(), DEFAULT_CATEGORIES.len());
        assert_eq!(categories.names()[0], "Fruits");
        assert_eq!(categories.names()[6], "Other");
    }

    #[test]
    fn add_appends_at_end() {
        let mut categories = Categories::new();
        categories.add("Frozen").unwrap();
        assert_eq!(categories.names().last().map(String::as_str), Some("Frozen"));
    }

    #[test]
    fn add_rejects_duplicates_and_blanks() {
        let mut categories = Categories::new();
        let err = categories.add("Dairy").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCategory(_)));

        let err = categories.add("   ").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn add_is_case_sensitive() {
        let mut categories = Categories::new();
        categories.add("dairy").unwrap();
        assert!(categories.contains("Dairy"));
        assert!(categories.contains("dairy"));
    }

    #[test]
    fn rename_preserves_position() {
        let mut categories = Categories::new();
        categories.rename("Meat", "Fish").unwrap();
        assert_eq!(categories.names()[2], "Fish");
        assert!(!categories.contains("Meat"));
    }

    #[test]
    fn rename_rejects_existing_target() {
        let mut categories = Categories::new();
        let err = categories.rename("Meat", "Dairy").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCategory(_)));
        assert!(categories.contains("Meat"));
    }

    #[test]
    fn rename_missing_category_fails() {
        let mut categories = Categories::new();
        let err = categories.rename("Frozen", "Fresh").unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound(_)));
    }

    #[test]
    fn rename_to_same_name_is_accepted() {
        let mut categories = Categories::new();
        categories.rename("Dairy", "Dairy").unwrap();
        assert_eq!(categories.names()[3], "Dairy");

        // A self-rename still requires the category to exist.
        let err = categories.rename("Frozen", "Frozen").unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound(_)));
    }

    #[test]
    fn from_names_drops_duplicates() {
        let categories = Categories::from_names(vec![
            "Dairy".to_string(),
            "Pantry".to_string(),
            "Dairy".to_string(),
        ]);
        assert_eq!(categories.names(), &["Dairy".to_string(), "Pantry".to_string()]);
    }
}
