//! Record display formatting
//!
//! Table, grouped and detail views of records, plus the Recently Deleted
//! listing with days left before purge.

use chrono::{DateTime, Utc};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{CurrencyLookup, DeletedRecord, Record};
use crate::services::{MemberRecord, RecordGroup};

use super::totals::format_amount;

fn remaining(record: &Record, lookup: &dyn CurrencyLookup) -> String {
    match record.remaining_value {
        Some(value) => format_amount(value, &record.currency_code, lookup),
        None => "-".to_string(),
    }
}

fn expires(record: &Record) -> String {
    record
        .expiration_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Format list members as a table
///
/// The source list column is only shown when members come from more than
/// one scope, i.e. for smart lists.
pub fn format_record_table(
    members: &[MemberRecord],
    show_source: bool,
    lookup: &dyn CurrencyLookup,
) -> String {
    if members.is_empty() {
        return "No records found.".to_string();
    }

    let mut builder = Builder::default();
    let mut header = vec!["ID", "Name", "Code", "Remaining", "Type", "Category", "Expires"];
    if show_source {
        header.push("List");
    }
    builder.push_record(header);

    for member in members {
        let record = &member.record;
        let mut row = vec![
            record.id.to_string(),
            record.name.clone(),
            record.code.clone(),
            remaining(record, lookup),
            record.record_type.clone().unwrap_or_default(),
            record.category_name().unwrap_or_default().to_string(),
            expires(record),
        ];
        if show_source {
            row.push(member.source_name.clone());
        }
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::psql());
    table.to_string()
}

/// Format records under their group headings
pub fn format_record_groups(groups: &[RecordGroup], lookup: &dyn CurrencyLookup) -> String {
    if groups.is_empty() {
        return "No records found.".to_string();
    }

    let mut output = String::new();
    for (i, group) in groups.iter().enumerate() {
        output.push_str(&format!("{} ({})\n", group.title, group.records.len()));
        for (j, record) in group.records.iter().enumerate() {
            let prefix = if j == group.records.len() - 1 { "└── " } else { "├── " };
            output.push_str(&format!(
                "  {}{} {} [{}]\n",
                prefix,
                record.id,
                record.name,
                remaining(record, lookup)
            ));
        }
        if i < groups.len() - 1 {
            output.push('\n');
        }
    }
    output
}

/// Format a single record's details
pub fn format_record_details(
    record: &Record,
    source_name: &str,
    lookup: &dyn CurrencyLookup,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Record: {}\n", record.name));
    output.push_str(&format!("  ID:          {}\n", record.id));
    output.push_str(&format!("  Code:        {}\n", record.code));
    output.push_str(&format!("  Remaining:   {}\n", remaining(record, lookup)));
    output.push_str(&format!("  Currency:    {}\n", record.currency_code));
    output.push_str(&format!("  List:        {}\n", source_name));

    if let Some(record_type) = &record.record_type {
        output.push_str(&format!("  Type:        {}\n", record_type));
    }
    if let Some(category) = record.category_name() {
        output.push_str(&format!("  Category:    {}\n", category));
    }
    if record.expiration_date.is_some() {
        output.push_str(&format!("  Expires:     {}\n", expires(record)));
    }
    if let Some(description) = record.description.as_deref().filter(|d| !d.trim().is_empty()) {
        output.push('\n');
        output.push_str(&format!("  {}\n", description));
    }

    output.push('\n');
    output.push_str(&format!(
        "  Created:  {}\n",
        record.created_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output
}

#[derive(Tabled)]
struct DeletedRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Deleted")]
    deleted: String,
    #[tabled(rename = "Purged In")]
    purged_in: String,
}

/// Days until the retention sweep removes an entry
pub fn days_until_purge(entry: &DeletedRecord, now: DateTime<Utc>, retention_days: i64) -> i64 {
    (retention_days - (now - entry.deleted_at).num_days()).max(0)
}

/// Format the Recently Deleted collection, most recent first
pub fn format_deleted_table(
    entries: &[DeletedRecord],
    now: DateTime<Utc>,
    retention_days: i64,
    lookup: &dyn CurrencyLookup,
) -> String {
    if entries.is_empty() {
        return "Recently Deleted is empty.".to_string();
    }

    let rows = entries.iter().map(|entry| DeletedRow {
        id: entry.id().to_string(),
        name: entry.record.name.clone(),
        remaining: remaining(&entry.record, lookup),
        deleted: entry.deleted_at.format("%Y-%m-%d").to_string(),
        purged_in: match days_until_purge(entry, now, retention_days) {
            1 => "1 day".to_string(),
            n => format!("{} days", n),
        },
    });

    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}
