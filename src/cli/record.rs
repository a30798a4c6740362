//! Record CLI commands
//!
//! Implements CLI commands for adding, editing, spending, moving and
//! deleting records, and for the Recently Deleted collection.

use chrono::Utc;
use clap::Subcommand;

use crate::display::{
    format_amount, format_deleted_table, format_record_details, format_record_groups,
    format_record_table, format_totals_inline,
};
use crate::error::{CouponError, CouponResult};
use crate::models::{RecordDraft, Vocabulary};
use crate::services::{grouping, totals_by_currency, MoveIntent, RecordGroup};

use super::{parse_date, parse_money, CliContext};

/// Record subcommands
#[derive(Subcommand)]
pub enum RecordCommands {
    /// Add a new record
    Add {
        /// Record name (e.g. the store)
        name: String,
        /// Redemption code
        code: String,
        /// Remaining value (e.g. "25" or "25.00"); omit for no tracked balance
        #[arg(short, long)]
        value: Option<String>,
        /// Currency code (defaults to the list's default currency)
        #[arg(long)]
        currency: Option<String>,
        /// List name or ID (defaults to the selected list)
        #[arg(short, long)]
        list: Option<String>,
        /// Record type (e.g. "Gift Cards")
        #[arg(short = 't', long = "type")]
        record_type: Option<String>,
        /// Category
        #[arg(short, long)]
        category: Option<String>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Expiration date (YYYY-MM-DD)
        #[arg(short, long)]
        expires: Option<String>,
    },

    /// List records of a list
    List {
        /// List name or ID (defaults to the selected list)
        #[arg(short, long)]
        list: Option<String>,
        /// Group records by category, in stored order
        #[arg(short, long)]
        grouped: bool,
        /// Sort each group by name instead of stored order
        #[arg(long, requires = "grouped")]
        by_name: bool,
    },

    /// Show record details
    Show {
        /// Record name or ID
        record: String,
    },

    /// Edit a record
    Edit {
        /// Record name or ID
        record: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        code: Option<String>,
        /// New remaining value
        #[arg(short, long)]
        value: Option<String>,
        /// Stop tracking a balance
        #[arg(long)]
        clear_value: bool,
        #[arg(long)]
        currency: Option<String>,
        #[arg(short = 't', long = "type")]
        record_type: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Expiration date (YYYY-MM-DD)
        #[arg(short, long)]
        expires: Option<String>,
        #[arg(long)]
        clear_expires: bool,
    },

    /// Spend part of a record's balance
    Use {
        /// Record name or ID
        record: String,
        /// Amount used
        amount: String,
    },

    /// Move a record to another list
    Move {
        /// Record name or ID
        record: String,
        /// Target list name or ID
        #[arg(short, long)]
        to: String,
    },

    /// Move a record to a category group, optionally at a position
    Regroup {
        /// Record name or ID
        record: String,
        /// Destination group ("Uncategorized" clears the category)
        group: String,
        /// Position within the group as shown by `record list --grouped`
        /// (1-based); defaults to the end
        #[arg(short, long)]
        position: Option<usize>,
    },

    /// Reorder records inside one category group of a list
    Reorder {
        /// Group title ("Uncategorized" for records without a category)
        group: String,
        /// Positions to move, as shown by `record list --grouped` (1-based)
        #[arg(required = true, num_args = 1..)]
        positions: Vec<usize>,
        /// Destination position (1-based); one past the last moves to the end
        #[arg(long)]
        to: usize,
        /// List name or ID (defaults to the selected list)
        #[arg(short, long)]
        list: Option<String>,
    },

    /// Move a record to Recently Deleted
    Delete {
        /// Record name or ID
        record: String,
    },

    /// Restore a record from Recently Deleted
    Restore {
        /// Deleted record name or ID
        record: String,
        /// Target list (defaults to the selected list)
        #[arg(short, long)]
        to: Option<String>,
    },

    /// Permanently delete a record from Recently Deleted
    Purge {
        /// Deleted record name or ID
        record: String,
    },
}

/// Recently Deleted subcommands
#[derive(Subcommand)]
pub enum DeletedCommands {
    /// List deleted records
    List,
}

/// Handle a record command
pub fn handle_record_command(ctx: &CliContext<'_>, cmd: RecordCommands) -> CouponResult<()> {
    let service = ctx.records();
    let lookup = ctx.currencies();

    match cmd {
        RecordCommands::Add {
            name,
            code,
            value,
            currency,
            list,
            record_type,
            category,
            description,
            expires,
        } => {
            let list = ctx.resolve_target_list(list.as_deref())?;

            let mut draft = RecordDraft::new(name, code);
            draft.remaining_value = value.as_deref().map(parse_money).transpose()?;
            draft.currency_code = currency.unwrap_or_default().trim().to_uppercase();
            draft.record_type = record_type;
            draft.category = category;
            draft.description = description;
            draft.expiration_date = expires.as_deref().map(parse_date).transpose()?;

            let record = service.add(list.id, draft)?;
            println!("Added record: {}", record.name);
            println!("  List: {}", list.name);
            println!("  ID: {}", record.id);
            if let Some(value) = record.remaining_value {
                println!("  Remaining: {}", format_amount(value, &record.currency_code, &lookup));
            }
        }

        RecordCommands::List {
            list,
            grouped,
            by_name,
        } => {
            let list = ctx.resolve_list(list.as_deref())?;

            if list.id.is_recently_deleted() {
                let entries = service.list_deleted()?;
                print!(
                    "{}",
                    format_deleted_table(&entries, Utc::now(), ctx.settings.retention_days, &lookup)
                );
                println!();
                return Ok(());
            }

            let members = ctx.aggregation().members_with_source(&list)?;
            println!("{} ({} records)", list.name, members.len());

            if grouped {
                let vocabulary = if list.is_smart {
                    Vocabulary::new()
                } else {
                    ctx.storage.vocabularies.categories(list.id)?
                };
                let records: Vec<_> = members.iter().map(|m| m.record.clone()).collect();
                let groups: Vec<RecordGroup> = if by_name {
                    grouping::group_by(&records, &vocabulary)
                } else {
                    grouping::group_in_backing_order(&records, &vocabulary)
                };
                print!("{}", format_record_groups(&groups, &lookup));
            } else {
                println!("{}", format_record_table(&members, list.is_smart, &lookup));
            }

            let records: Vec<_> = members.into_iter().map(|m| m.record).collect();
            println!(
                "Total: {}",
                format_totals_inline(&totals_by_currency(&records), &lookup)
            );
        }

        RecordCommands::Show { record } => {
            let (list_id, record) = ctx.resolve_record(&record)?;
            let source = ctx
                .lists()
                .get(list_id)?
                .map(|l| l.name)
                .unwrap_or_default();
            print!("{}", format_record_details(&record, &source, &lookup));
        }

        RecordCommands::Edit {
            record,
            name,
            code,
            value,
            clear_value,
            currency,
            record_type,
            category,
            description,
            expires,
            clear_expires,
        } => {
            let (list_id, mut record) = ctx.resolve_record(&record)?;

            let unchanged = name.is_none()
                && code.is_none()
                && value.is_none()
                && !clear_value
                && currency.is_none()
                && record_type.is_none()
                && category.is_none()
                && description.is_none()
                && expires.is_none()
                && !clear_expires;
            if unchanged {
                println!("No changes specified.");
                return Ok(());
            }

            if let Some(name) = name {
                record.name = name;
            }
            if let Some(code) = code {
                record.code = code;
            }
            if clear_value {
                record.remaining_value = None;
            } else if let Some(value) = value {
                record.remaining_value = Some(parse_money(&value)?);
            }
            if let Some(currency) = currency {
                record.currency_code = currency.trim().to_uppercase();
            }
            if let Some(record_type) = record_type {
                record.record_type = Some(record_type).filter(|t| !t.trim().is_empty());
            }
            if let Some(category) = category {
                record.category = Some(category).filter(|c| !c.trim().is_empty());
            }
            if let Some(description) = description {
                record.description = Some(description).filter(|d| !d.trim().is_empty());
            }
            if clear_expires {
                record.expiration_date = None;
            } else if let Some(expires) = expires {
                record.expiration_date = Some(parse_date(&expires)?);
            }

            let name = record.name.clone();
            if service.update(list_id, record)? {
                println!("Updated record: {}", name);
            }
        }

        RecordCommands::Use { record, amount } => {
            let (list_id, found) = ctx.resolve_record(&record)?;
            let amount = parse_money(&amount)?;

            if !service.use_amount(list_id, found.id, amount)? {
                return Err(CouponError::Validation(format!(
                    "'{}' has no tracked balance",
                    found.name
                )));
            }

            let updated = ctx
                .storage
                .records
                .get(list_id, found.id)?
                .ok_or_else(|| CouponError::record_not_found(found.id.to_string()))?;
            let left = updated.remaining_value.unwrap_or_default();
            println!(
                "Used {} from {}; {} left",
                format_amount(amount, &updated.currency_code, &lookup),
                updated.name,
                format_amount(left, &updated.currency_code, &lookup)
            );
        }

        RecordCommands::Move { record, to } => {
            let (from, record) = ctx.resolve_record(&record)?;
            let target = ctx.resolve_list(Some(&to))?;
            let name = record.name.clone();
            service.move_record(record, from, target.id)?;
            println!("Moved '{}' to '{}'", name, target.name);
        }

        RecordCommands::Regroup {
            record,
            group,
            position,
        } => {
            let (list_id, record) = ctx.resolve_record(&record)?;
            let intent = MoveIntent {
                record_id: record.id,
                source_group: grouping::group_title(&record),
                destination_group: group.clone(),
                destination_index: position.map(|p| p.saturating_sub(1)),
            };
            if service.reorder(list_id, &intent)? {
                println!("Moved '{}' to group '{}'", record.name, group.trim());
            }
        }

        RecordCommands::Reorder {
            group,
            positions,
            to,
            list,
        } => {
            let list = ctx.resolve_list(list.as_deref())?;
            if list.is_smart || list.id.is_recently_deleted() {
                return Err(CouponError::Validation(format!(
                    "'{}' is not an ordinary list; reorder records in the list that stores them",
                    list.name
                )));
            }
            if positions.iter().chain([&to]).any(|&p| p == 0) {
                return Err(CouponError::Validation("Positions start at 1".to_string()));
            }

            let from: Vec<usize> = positions.iter().map(|p| p - 1).collect();
            if !service.reorder_within_group(list.id, &group, &from, to - 1)? {
                return Err(CouponError::Validation(format!(
                    "Group '{}' has no such positions",
                    group.trim()
                )));
            }
            println!("Reordered group '{}' in '{}'", group.trim(), list.name);
        }

        RecordCommands::Delete { record } => {
            let (list_id, record) = ctx.resolve_record(&record)?;
            service.delete(list_id, record.id)?;
            println!(
                "Moved '{}' to Recently Deleted ({} days until purge)",
                record.name, ctx.settings.retention_days
            );
        }

        RecordCommands::Restore { record, to } => {
            let entry = ctx.resolve_deleted(&record)?;
            let target = ctx.resolve_target_list(to.as_deref())?;
            service.restore(entry.id(), target.id)?;
            println!("Restored '{}' to '{}'", entry.record.name, target.name);
        }

        RecordCommands::Purge { record } => {
            let entry = ctx.resolve_deleted(&record)?;
            service.permanently_delete(entry.id())?;
            println!("Permanently deleted '{}'", entry.record.name);
        }
    }

    Ok(())
}

/// Handle a Recently Deleted command
pub fn handle_deleted_command(ctx: &CliContext<'_>, cmd: DeletedCommands) -> CouponResult<()> {
    match cmd {
        DeletedCommands::List => {
            let entries = ctx.records().list_deleted()?;
            println!(
                "{}",
                format_deleted_table(
                    &entries,
                    Utc::now(),
                    ctx.settings.retention_days,
                    &ctx.currencies()
                )
            );
        }
    }
    Ok(())
}
