//! List registry repository
//!
//! Stores the ordered registry (`lists.info`) and the current selection
//! (`lists.selected`).

use std::sync::{Arc, RwLock};

use crate::error::CouponError;
use crate::models::{CouponList, ListId};

use super::keys::StorageKey;
use super::tiered::TieredStore;

pub struct ListRepository {
    store: Arc<TieredStore>,
    lists: RwLock<Vec<CouponList>>,
    selected: RwLock<Option<ListId>>,
}

impl ListRepository {
    pub fn new(store: Arc<TieredStore>) -> Self {
        Self {
            store,
            lists: RwLock::new(Vec::new()),
            selected: RwLock::new(None),
        }
    }

    pub fn load(&self) -> Result<(), CouponError> {
        let lists: Vec<CouponList> = self.store.load_or_default(StorageKey::ListsInfo);
        let selected: Option<ListId> = self.store.load(StorageKey::ListsSelected);

        *self
            .lists
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))? =
            lists;
        *self
            .selected
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))? =
            selected;
        Ok(())
    }

    pub fn save_lists(&self) -> Result<(), CouponError> {
        let lists = self.get_all()?;
        self.store.persist(StorageKey::ListsInfo, &lists);
        Ok(())
    }

    pub fn save_selected(&self) -> Result<(), CouponError> {
        if let Some(selected) = self.selected()? {
            self.store.persist(StorageKey::ListsSelected, &selected);
        }
        Ok(())
    }

    /// All registered lists in registry order
    pub fn get_all(&self) -> Result<Vec<CouponList>, CouponError> {
        let lists = self
            .lists
            .read()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(lists.clone())
    }

    pub fn get(&self, id: ListId) -> Result<Option<CouponList>, CouponError> {
        let lists = self
            .lists
            .read()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(lists.iter().find(|l| l.id == id).cloned())
    }

    /// Find a list by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Option<CouponList>, CouponError> {
        let lists = self
            .lists
            .read()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        let name = name.trim();
        Ok(lists
            .iter()
            .find(|l| l.name.trim().eq_ignore_ascii_case(name))
            .cloned())
    }

    pub fn count(&self) -> Result<usize, CouponError> {
        let lists = self
            .lists
            .read()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(lists.len())
    }

    /// Insert or replace a list, keeping its registry position
    pub fn upsert(&self, list: CouponList) -> Result<(), CouponError> {
        let mut lists = self
            .lists
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        match lists.iter_mut().find(|l| l.id == list.id) {
            Some(slot) => *slot = list,
            None => lists.push(list),
        }
        Ok(())
    }

    pub fn remove(&self, id: ListId) -> Result<Option<CouponList>, CouponError> {
        let mut lists = self
            .lists
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        Ok(lists
            .iter()
            .position(|l| l.id == id)
            .map(|index| lists.remove(index)))
    }

    pub fn set_all(&self, new_lists: Vec<CouponList>) -> Result<(), CouponError> {
        let mut lists = self
            .lists
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        *lists = new_lists;
        Ok(())
    }

    pub fn selected(&self) -> Result<Option<ListId>, CouponError> {
        let selected = self
            .selected
            .read()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(*selected)
    }

    pub fn set_selected(&self, id: ListId) -> Result<(), CouponError> {
        let mut selected = self
            .selected
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        *selected = Some(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DefaultList;
    use crate::storage::blob::MemoryBlobStore;

    fn create_test_repo() -> (Arc<TieredStore>, ListRepository) {
        let store = Arc::new(TieredStore::local_only(Box::new(MemoryBlobStore::new())));
        let repo = ListRepository::new(Arc::clone(&store));
        repo.load().unwrap();
        (store, repo)
    }

    #[test]
    fn test_empty_registry() {
        let (_store, repo) = create_test_repo();
        assert_eq!(repo.count().unwrap(), 0);
        assert!(repo.selected().unwrap().is_none());
    }

    #[test]
    fn test_upsert_keeps_position() {
        let (_store, repo) = create_test_repo();
        let mut first = CouponList::new("Travel");
        repo.upsert(first.clone()).unwrap();
        repo.upsert(CouponList::new("Food")).unwrap();

        first.name = "Trips".into();
        repo.upsert(first.clone()).unwrap();

        let all = repo.get_all().unwrap();
        assert_eq!(all[0].name, "Trips");
        assert_eq!(all.len(), 2);
        assert_eq!(repo.get_by_name(" food ").unwrap().unwrap().name, "Food");
    }

    #[test]
    fn test_save_and_reload() {
        let (store, repo) = create_test_repo();
        let gift_cards = DefaultList::GiftCards.to_list();
        repo.upsert(gift_cards.clone()).unwrap();
        repo.set_selected(gift_cards.id).unwrap();
        repo.save_lists().unwrap();
        repo.save_selected().unwrap();

        let reloaded = ListRepository::new(store);
        reloaded.load().unwrap();
        assert_eq!(reloaded.get_all().unwrap(), vec![gift_cards.clone()]);
        assert_eq!(reloaded.selected().unwrap(), Some(gift_cards.id));
    }

    #[test]
    fn test_remove() {
        let (_store, repo) = create_test_repo();
        let list = CouponList::new("Travel");
        repo.upsert(list.clone()).unwrap();
        assert!(repo.remove(list.id).unwrap().is_some());
        assert!(repo.remove(list.id).unwrap().is_none());
    }
}
