//! Logical storage keys
//!
//! | Key | Shape | Scope |
//! |---|---|---|
//! | `records.<listId>` | ordered array of Record | per list |
//! | `deletedRecords` | ordered array of DeletedRecord (head = most recent) | global |
//! | `categories.<listId>` | ordered array of string | per list |
//! | `types` | ordered array of string | global |
//! | `defaultCurrency.<listId>` | string | per list |
//! | `lists.info` | ordered array of List | global |
//! | `lists.selected` | list id | global |

use std::fmt;
use std::str::FromStr;

use crate::models::ListId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    Records(ListId),
    DeletedRecords,
    Categories(ListId),
    Types,
    DefaultCurrency(ListId),
    ListsInfo,
    ListsSelected,
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Records(id) => write!(f, "records.{}", id.key_fragment()),
            Self::DeletedRecords => write!(f, "deletedRecords"),
            Self::Categories(id) => write!(f, "categories.{}", id.key_fragment()),
            Self::Types => write!(f, "types"),
            Self::DefaultCurrency(id) => write!(f, "defaultCurrency.{}", id.key_fragment()),
            Self::ListsInfo => write!(f, "lists.info"),
            Self::ListsSelected => write!(f, "lists.selected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey(pub String);

impl fmt::Display for UnknownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown storage key: {}", self.0)
    }
}

impl std::error::Error for UnknownKey {}

impl FromStr for StorageKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deletedRecords" => return Ok(Self::DeletedRecords),
            "types" => return Ok(Self::Types),
            "lists.info" => return Ok(Self::ListsInfo),
            "lists.selected" => return Ok(Self::ListsSelected),
            _ => {}
        }

        let (prefix, id) = s.split_once('.').ok_or_else(|| UnknownKey(s.to_string()))?;
        let id = ListId::parse(id).map_err(|_| UnknownKey(s.to_string()))?;
        match prefix {
            "records" => Ok(Self::Records(id)),
            "categories" => Ok(Self::Categories(id)),
            "defaultCurrency" => Ok(Self::DefaultCurrency(id)),
            _ => Err(UnknownKey(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_strings() {
        let id = ListId::recently_deleted();
        assert_eq!(
            StorageKey::Records(id).to_string(),
            "records.00000000-0000-0000-0000-00000000dead"
        );
        assert_eq!(StorageKey::ListsInfo.to_string(), "lists.info");
    }

    #[test]
    fn test_parse_back() {
        let id = ListId::new();
        for key in [
            StorageKey::Records(id),
            StorageKey::Categories(id),
            StorageKey::DefaultCurrency(id),
            StorageKey::DeletedRecords,
            StorageKey::Types,
            StorageKey::ListsInfo,
            StorageKey::ListsSelected,
        ] {
            assert_eq!(key.to_string().parse::<StorageKey>(), Ok(key));
        }
    }

    #[test]
    fn test_unknown_keys() {
        assert!("discounts".parse::<StorageKey>().is_err());
        assert!("records.not-a-uuid".parse::<StorageKey>().is_err());
        assert!("lists.other".parse::<StorageKey>().is_err());
    }
}
