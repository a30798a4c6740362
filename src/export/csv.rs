//! CSV Export functionality
//!
//! One row per member of a list, spreadsheet-compatible.

use crate::error::{CouponError, CouponResult};
use crate::models::CouponList;
use crate::services::AggregationService;
use crate::storage::Storage;
use std::io::Write;

const HEADER: [&str; 11] = [
    "ID",
    "Name",
    "Code",
    "Remaining",
    "Currency",
    "Type",
    "Category",
    "Expires",
    "Description",
    "Created",
    "Source List",
];

fn export_err(e: impl std::fmt::Display) -> CouponError {
    CouponError::Export(e.to_string())
}

/// Export the members of a list to CSV
///
/// Untracked balances and missing dates are written as empty cells.
pub fn export_list_csv<W: Write>(
    storage: &Storage,
    list: &CouponList,
    writer: W,
) -> CouponResult<usize> {
    let members = AggregationService::new(storage).members_with_source(list)?;
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(HEADER).map_err(export_err)?;

    for member in &members {
        let record = &member.record;
        wtr.write_record([
            record.id.as_uuid().to_string(),
            record.name.clone(),
            record.code.clone(),
            record
                .remaining_value
                .map(|v| v.to_string())
                .unwrap_or_default(),
            record.currency_code.clone(),
            record.record_type.clone().unwrap_or_default(),
            record.category_name().unwrap_or_default().to_string(),
            record
                .expiration_date
                .map(|d| d.date_naive().to_string())
                .unwrap_or_default(),
            record.description.clone().unwrap_or_default(),
            record.created_at.to_rfc3339(),
            member.source_name.clone(),
        ])
        .map_err(export_err)?;
    }

    wtr.flush().map_err(export_err)?;
    Ok(members.len())
}
