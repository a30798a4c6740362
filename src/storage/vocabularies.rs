//! Vocabulary repository
//!
//! Category vocabularies and default currencies are kept per list; the type
//! vocabulary is global. Per-list entries are read lazily like record scopes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::CouponError;
use crate::models::{ListId, Vocabulary};

use super::keys::StorageKey;
use super::tiered::TieredStore;

pub struct VocabularyRepository {
    store: Arc<TieredStore>,
    categories: RwLock<HashMap<ListId, Vocabulary>>,
    types: RwLock<Vocabulary>,
    currencies: RwLock<HashMap<ListId, Option<String>>>,
}

impl VocabularyRepository {
    pub fn new(store: Arc<TieredStore>) -> Self {
        Self {
            store,
            categories: RwLock::new(HashMap::new()),
            types: RwLock::new(Vocabulary::default_types()),
            currencies: RwLock::new(HashMap::new()),
        }
    }

    /// Load the type vocabulary and forget cached per-list entries
    pub fn load(&self) -> Result<(), CouponError> {
        let types = self
            .store
            .load(StorageKey::Types)
            .unwrap_or_else(Vocabulary::default_types);
        *self
            .types
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))? =
            types;
        self.categories
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?
            .clear();
        self.currencies
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?
            .clear();
        Ok(())
    }

    pub fn categories(&self, list_id: ListId) -> Result<Vocabulary, CouponError> {
        let mut categories = self
            .categories
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        Ok(categories
            .entry(list_id)
            .or_insert_with(|| self.store.load_or_default(StorageKey::Categories(list_id)))
            .clone())
    }

    pub fn set_categories(&self, list_id: ListId, vocabulary: Vocabulary) -> Result<(), CouponError> {
        let mut categories = self
            .categories
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        categories.insert(list_id, vocabulary);
        Ok(())
    }

    pub fn save_categories(&self, list_id: ListId) -> Result<(), CouponError> {
        let vocabulary = self.categories(list_id)?;
        self.store.persist(StorageKey::Categories(list_id), &vocabulary);
        Ok(())
    }

    /// Forget a list's categories and currency in memory and both tiers
    pub fn drop_list(&self, list_id: ListId) -> Result<(), CouponError> {
        self.categories
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?
            .remove(&list_id);
        self.currencies
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?
            .remove(&list_id);
        self.store.purge(StorageKey::Categories(list_id));
        self.store.purge(StorageKey::DefaultCurrency(list_id));
        Ok(())
    }

    pub fn types(&self) -> Result<Vocabulary, CouponError> {
        let types = self
            .types
            .read()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(types.clone())
    }

    pub fn set_types(&self, vocabulary: Vocabulary) -> Result<(), CouponError> {
        *self
            .types
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))? =
            vocabulary;
        Ok(())
    }

    pub fn save_types(&self) -> Result<(), CouponError> {
        let types = self.types()?;
        self.store.persist(StorageKey::Types, &types);
        Ok(())
    }

    /// Stored default currency for a list, if one was ever set
    pub fn default_currency(&self, list_id: ListId) -> Result<Option<String>, CouponError> {
        let mut currencies = self
            .currencies
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        Ok(currencies
            .entry(list_id)
            .or_insert_with(|| self.store.load(StorageKey::DefaultCurrency(list_id)))
            .clone())
    }

    pub fn set_default_currency(
        &self,
        list_id: ListId,
        code: Option<String>,
    ) -> Result<(), CouponError> {
        let mut currencies = self
            .currencies
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        currencies.insert(list_id, code);
        Ok(())
    }

    pub fn save_default_currency(&self, list_id: ListId) -> Result<(), CouponError> {
        match self.default_currency(list_id)? {
            Some(code) => self.store.persist(StorageKey::DefaultCurrency(list_id), &code),
            None => self.store.purge(StorageKey::DefaultCurrency(list_id)),
        }
        Ok(())
    }
}
