//! Ordered, user-managed name vocabularies (categories and types)
//!
//! The order of a vocabulary is the default group order when records are
//! grouped. Records may still carry values outside the vocabulary.

use serde::{Deserialize, Serialize};

/// Name shown for records with no category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Default type vocabulary, matching the built-in smart lists
pub const DEFAULT_TYPES: [&str; 3] = ["Gift Cards", "Coupons", "Vouchers"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary(Vec<String>);

impl Vocabulary {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self::new();
        for name in names {
            // duplicates and blanks are dropped
            let _ = vocabulary.add(name);
        }
        vocabulary
    }

    pub fn default_types() -> Self {
        Self::from_names(DEFAULT_TYPES)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive position of a name
    pub fn position(&self, name: &str) -> Option<usize> {
        let needle = name.trim().to_lowercase();
        self.0.iter().position(|n| n.to_lowercase() == needle)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Append a name
    pub fn add(&mut self, name: impl Into<String>) -> Result<(), VocabularyError> {
        let name = validate_name(name.into())?;
        if self.contains(&name) {
            return Err(VocabularyError::Duplicate(name));
        }
        self.0.push(name);
        Ok(())
    }

    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> Result<(), VocabularyError> {
        let index = self
            .position(old)
            .ok_or_else(|| VocabularyError::NotFound(old.to_string()))?;
        let new = validate_name(new.into())?;
        if let Some(existing) = self.position(&new) {
            if existing != index {
                return Err(VocabularyError::Duplicate(new));
            }
        }
        self.0[index] = new;
        Ok(())
    }

    /// Remove a name; returns false if it wasn't present
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    /// Move the entry at `from` so it ends up at index `to`
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.0.len() || to >= self.0.len() {
            return false;
        }
        let item = self.0.remove(from);
        self.0.insert(to, item);
        true
    }
}

fn validate_name(name: String) -> Result<String, VocabularyError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(VocabularyError::EmptyName);
    }
    if trimmed.eq_ignore_ascii_case(UNCATEGORIZED) {
        return Err(VocabularyError::Reserved);
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocabularyError {
    EmptyName,
    Reserved,
    Duplicate(String),
    NotFound(String),
}

impl std::fmt::Display for VocabularyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::Reserved => write!(f, "'{}' is reserved", UNCATEGORIZED),
            Self::Duplicate(name) => write!(f, "'{}' already exists", name),
            Self::NotFound(name) => write!(f, "'{}' not found", name),
        }
    }
}

impl std::error::Error for VocabularyError {}
