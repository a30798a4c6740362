//! JSON Export functionality
//!
//! Exports the members of one list, with their source list and totals,
//! under a versioned schema.

use crate::error::{CouponError, CouponResult};
use crate::models::{CouponList, Record};
use crate::services::{AggregationService, CurrencyTotal};
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// A list and its effective members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub list: CouponList,

    pub members: Vec<ExportedMember>,

    /// Remaining value per currency
    pub totals: Vec<CurrencyTotal>,
}

/// One member together with the list it is stored under
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedMember {
    pub source_list: String,
    pub record: Record,
}

impl ListExport {
    pub fn from_storage(storage: &Storage, list: &CouponList) -> CouponResult<Self> {
        let aggregation = AggregationService::new(storage);
        let members: Vec<ExportedMember> = aggregation
            .members_with_source(list)?
            .into_iter()
            .map(|m| ExportedMember {
                source_list: m.source_name,
                record: m.record,
            })
            .collect();
        let records: Vec<Record> = members.iter().map(|m| m.record.clone()).collect();

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            list: list.clone(),
            totals: crate::services::totals_by_currency(&records),
            members,
        })
    }

    /// Validate the export structure
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for member in &self.members {
            if !seen.insert(member.record.id) {
                return Err(format!("Record {} appears more than once", member.record.id));
            }
            member
                .record
                .validate()
                .map_err(|e| format!("Record {}: {}", member.record.id, e))?;
        }

        Ok(())
    }
}

/// Export a list's members to JSON
pub fn export_list_json<W: Write>(
    storage: &Storage,
    list: &CouponList,
    writer: &mut W,
    pretty: bool,
) -> CouponResult<()> {
    let export = ListExport::from_storage(storage, list)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| CouponError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a JSON export and check it
pub fn import_from_json(json_str: &str) -> CouponResult<ListExport> {
    let export: ListExport =
        serde_json::from_str(json_str).map_err(|e| CouponError::Export(e.to_string()))?;

    export.validate().map_err(CouponError::Export)?;

    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComparisonOperator, Condition, ConditionField, Money, RecordDraft};

    fn create_test_storage() -> (Storage, CouponList) {
        let storage = Storage::in_memory();
        storage.load_all().unwrap();
        let wallet = CouponList::new("Wallet");
        storage.lists.upsert(wallet.clone()).unwrap();
        (storage, wallet)
    }

    #[test]
    fn test_list_export() {
        let (storage, wallet) = create_test_storage();
        storage
            .records
            .append(
                wallet.id,
                Record::new(
                    RecordDraft::new("Books", "B-1")
                        .with_value(Money::from_cents(2000), "USD")
                        .with_type("Gift Cards"),
                ),
            )
            .unwrap();

        let cards = CouponList::smart(
            "Cards",
            true,
            vec![Condition::text(ConditionField::Type, ComparisonOperator::Equals, "Gift Cards")],
        );
        let export = ListExport::from_storage(&storage, &cards).unwrap();

        assert_eq!(export.members.len(), 1);
        assert_eq!(export.members[0].source_list, "Wallet");
        assert_eq!(export.totals[0].total, Money::from_cents(2000));
        assert!(export.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let (storage, wallet) = create_test_storage();
        storage
            .records
            .append(
                wallet.id,
                Record::new(RecordDraft::new("Spa", "S-9").with_value(Money::from_cents(4000), "EUR")),
            )
            .unwrap();

        let mut json_output = Vec::new();
        export_list_json(&storage, &wallet, &mut json_output, true).unwrap();
        let json_string = String::from_utf8(json_output).unwrap();

        let imported = import_from_json(&json_string).unwrap();
        assert_eq!(imported.list.name, "Wallet");
        assert_eq!(imported.members[0].record.name, "Spa");
    }

    #[test]
    fn test_rejects_other_schema_version() {
        let (storage, wallet) = create_test_storage();
        let mut export = ListExport::from_storage(&storage, &wallet).unwrap();
        export.schema_version = "0.9.0".into();
        let json = serde_json::to_string(&export).unwrap();
        assert!(import_from_json(&json).is_err());
    }
}
