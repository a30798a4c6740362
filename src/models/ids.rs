//! Strongly-typed ID wrappers
//!
//! Record and list ids are both UUIDs; the newtypes keep a record id from
//! ever being used as a storage scope.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse a full UUID string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.to_string()[..8])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if let Ok(uuid) = Uuid::parse_str(s) {
                    return Ok(Self(uuid));
                }
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(RecordId, "rec-");
define_id!(ListId, "lst-");

/// Reserved id of the synthesized Recently Deleted pseudo-list
const RECENTLY_DELETED: Uuid = Uuid::from_u128(0xdead);

impl ListId {
    /// The Recently Deleted pseudo-list; never stored in the list registry
    pub const fn recently_deleted() -> Self {
        Self(RECENTLY_DELETED)
    }

    pub fn is_recently_deleted(&self) -> bool {
        self.0 == RECENTLY_DELETED
    }

    /// Full hyphenated UUID, used to build storage keys
    pub fn key_fragment(&self) -> String {
        self.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = RecordId::new();
        let display = format!("{}", id);
        assert!(display.starts_with("rec-"));
        assert_eq!(display.len(), 12);
    }

    #[test]
    fn test_recently_deleted_is_stable() {
        let id = ListId::recently_deleted();
        assert!(id.is_recently_deleted());
        assert_eq!(id.key_fragment(), "00000000-0000-0000-0000-00000000dead");
        assert!(!ListId::new().is_recently_deleted());
    }

    #[test]
    fn test_id_serialization() {
        let id = ListId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ListId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_from_str_accepts_full_uuid() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id: RecordId = uuid_str.parse().unwrap();
        assert_eq!(id.as_uuid().to_string(), uuid_str);
        assert!("rec-550e8400".parse::<RecordId>().is_err());
    }
}
