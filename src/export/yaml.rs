//! YAML Export functionality
//!
//! Same document as the JSON export, in a human-readable form.

use crate::error::{CouponError, CouponResult};
use crate::export::json::ListExport;
use crate::models::CouponList;
use crate::storage::Storage;
use std::io::Write;

/// Export a list's members to YAML
pub fn export_list_yaml<W: Write>(
    storage: &Storage,
    list: &CouponList,
    writer: &mut W,
) -> CouponResult<()> {
    let export = ListExport::from_storage(storage, list)?;

    writeln!(writer, "# Coupon list export: {}", export.list.name)
        .and_then(|_| writeln!(writer, "# Generated: {}", export.exported_at))
        .and_then(|_| writeln!(writer, "# App Version: {}", export.app_version))
        .and_then(|_| writeln!(writer))
        .map_err(|e| CouponError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| CouponError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a YAML export
pub fn import_from_yaml(yaml_str: &str) -> CouponResult<ListExport> {
    let export: ListExport =
        serde_yaml::from_str(yaml_str).map_err(|e| CouponError::Export(e.to_string()))?;

    export.validate().map_err(CouponError::Export)?;

    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, Record, RecordDraft};

    #[test]
    fn test_yaml_export() {
        let storage = Storage::in_memory();
        storage.load_all().unwrap();
        let wallet = CouponList::new("Wallet");
        storage.lists.upsert(wallet.clone()).unwrap();
        storage
            .records
            .append(
                wallet.id,
                Record::new(RecordDraft::new("Cinema", "C-7").with_value(Money::from_cents(1200), "GBP")),
            )
            .unwrap();

        let mut yaml_output = Vec::new();
        export_list_yaml(&storage, &wallet, &mut yaml_output).unwrap();
        let yaml_string = String::from_utf8(yaml_output).unwrap();

        assert!(yaml_string.contains("# Coupon list export: Wallet"));
        assert!(yaml_string.contains("Cinema"));

        // comment lines are valid YAML, so the document parses as written
        let imported = import_from_yaml(&yaml_string).unwrap();
        assert_eq!(imported.members.len(), 1);
        assert_eq!(imported.totals[0].currency_code, "GBP");
    }
}
