//! Audit entry data structures
//!
//! One entry per mutation of a record, deleted record, list, vocabulary or
//! the list selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    /// Balance used against a record
    Debit,
    /// Record moved between list scopes
    Move,
    /// Record brought back from Recently Deleted
    Restore,
    /// Permanently removed (explicitly or by the retention sweep)
    Purge,
    /// Local state replaced by the remote replica
    Replace,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Debit => write!(f, "DEBIT"),
            Operation::Move => write!(f, "MOVE"),
            Operation::Restore => write!(f, "RESTORE"),
            Operation::Purge => write!(f, "PURGE"),
            Operation::Replace => write!(f, "REPLACE"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Record,
    DeletedRecord,
    List,
    Vocabulary,
    Selection,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Record => write!(f, "Record"),
            EntityType::DeletedRecord => write!(f, "DeletedRecord"),
            EntityType::List => write!(f, "List"),
            EntityType::Vocabulary => write!(f, "Vocabulary"),
            EntityType::Selection => write!(f, "Selection"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    pub entity_id: String,

    /// Human-readable description of the entity (record or list name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// List scope the operation touched, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    /// Human-readable diff summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    fn new(
        operation: Operation,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            entity_name,
            scope: None,
            before: None,
            after: None,
            diff_summary: None,
        }
    }

    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            after: serde_json::to_value(entity).ok(),
            ..Self::new(Operation::Create, entity_type, entity_id, entity_name)
        }
    }

    /// Entry carrying both snapshots; used by update, debit, move and replace
    pub fn change<T: Serialize>(
        operation: Operation,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
    ) -> Self {
        Self {
            before: serde_json::to_value(before).ok(),
            after: serde_json::to_value(after).ok(),
            diff_summary,
            ..Self::new(operation, entity_type, entity_id, entity_name)
        }
    }

    /// Entry carrying only the removed snapshot; used by delete and purge
    pub fn removal<T: Serialize>(
        operation: Operation,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            before: serde_json::to_value(entity).ok(),
            ..Self::new(operation, entity_type, entity_id, entity_name)
        }
    }

    pub fn in_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(scope) = &self.scope {
            output.push_str(&format!(" in {}", scope));
        }

        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "CREATE");
        assert_eq!(Operation::Debit.to_string(), "DEBIT");
        assert_eq!(Operation::Purge.to_string(), "PURGE");
    }

    #[test]
    fn test_entity_type_serialization() {
        let json = serde_json::to_string(&EntityType::DeletedRecord).unwrap();
        assert_eq!(json, "\"deleted_record\"");
    }

    #[test]
    fn test_create_entry() {
        let data = json!({"name": "Coffee", "code": "C1"});
        let entry = AuditEntry::create(
            EntityType::Record,
            "rec-12345678",
            Some("Coffee".to_string()),
            &data,
        );

        assert_eq!(entry.operation, Operation::Create);
        assert!(entry.before.is_none());
        assert_eq!(entry.after, Some(data));
    }

    #[test]
    fn test_change_entry() {
        let before = json!({"remaining_value": 1000});
        let after = json!({"remaining_value": 500});
        let entry = AuditEntry::change(
            Operation::Debit,
            EntityType::Record,
            "rec-12345678",
            None,
            &before,
            &after,
            Some("remaining_value: 1000 -> 500".to_string()),
        );

        assert_eq!(entry.operation, Operation::Debit);
        assert_eq!(entry.before, Some(before));
        assert_eq!(entry.after, Some(after));
    }

    #[test]
    fn test_removal_entry() {
        let entry = AuditEntry::removal(
            Operation::Purge,
            EntityType::DeletedRecord,
            "rec-12345678",
            None,
            &json!({"name": "Old"}),
        );
        assert!(entry.before.is_some());
        assert!(entry.after.is_none());
    }

    #[test]
    fn test_human_readable_format() {
        let entry = AuditEntry::create(
            EntityType::Record,
            "rec-12345678",
            Some("Coffee".to_string()),
            &json!({"name": "Coffee"}),
        )
        .in_scope("lst-abcdef01");

        let formatted = entry.format_human_readable();
        assert!(formatted.contains("CREATE"));
        assert!(formatted.contains("Record"));
        assert!(formatted.contains("rec-12345678"));
        assert!(formatted.contains("(Coffee)"));
        assert!(formatted.contains("in lst-abcdef01"));
    }
}
