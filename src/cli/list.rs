//! List CLI commands
//!
//! Implements CLI commands for the list registry: creating ordinary and
//! smart lists, selecting, reordering and deleting them, and per-currency
//! totals.

use clap::Subcommand;

use crate::display::{format_list_details, format_list_table, format_totals};
use crate::error::{CouponError, CouponResult};
use crate::models::{ComparisonOperator, Condition, ConditionField, CouponList};

use super::{parse_date, parse_money, CliContext};

/// List subcommands
#[derive(Subcommand)]
pub enum ListCommands {
    /// Show all lists with counts and totals
    All,

    /// Show list details (defaults to the selected list)
    Show {
        /// List name or ID
        list: Option<String>,
    },

    /// Create a list
    Create {
        /// List name
        name: String,
        /// Color tag
        #[arg(long)]
        color: Option<String>,
        /// Icon tag
        #[arg(long)]
        icon: Option<String>,
        /// Create a smart list from the condition flags below
        #[arg(long)]
        smart: bool,
        /// Match any condition instead of all of them
        #[arg(long, requires = "smart")]
        match_any: bool,
        /// Match records of this type
        #[arg(short = 't', long = "type", requires = "smart")]
        record_type: Option<String>,
        /// Exclude records of this type
        #[arg(long, requires = "smart")]
        not_type: Option<String>,
        /// Match records stored in this list
        #[arg(long, requires = "smart")]
        source_list: Option<String>,
        /// Match records with at least this remaining value
        #[arg(long, requires = "smart")]
        min_value: Option<String>,
        /// Match records with at most this remaining value
        #[arg(long, requires = "smart")]
        max_value: Option<String>,
        /// Match records that track a balance
        #[arg(long, requires = "smart", conflicts_with = "no_balance")]
        has_balance: bool,
        /// Match records without a tracked balance
        #[arg(long, requires = "smart")]
        no_balance: bool,
        /// Match records expiring before this date (YYYY-MM-DD)
        #[arg(long, requires = "smart")]
        expires_before: Option<String>,
        /// Match records expiring after this date (YYYY-MM-DD)
        #[arg(long, requires = "smart")]
        expires_after: Option<String>,
        /// Match records that have an expiration date
        #[arg(long, requires = "smart")]
        has_expiration: bool,
        /// Match records that have a description
        #[arg(long, requires = "smart")]
        has_description: bool,
    },

    /// Edit a list's name or tags
    Edit {
        /// List name or ID
        list: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },

    /// Select the working list
    Select {
        /// List name or ID
        list: String,
    },

    /// Move a list to a new position (1-based)
    Reorder {
        /// List name or ID
        list: String,
        /// New position
        position: usize,
    },

    /// Delete a list; its records move to Recently Deleted
    Delete {
        /// List name or ID
        list: String,
    },
}

fn smart_conditions(cmd: &ListCommands) -> CouponResult<Vec<Condition>> {
    let ListCommands::Create {
        record_type,
        not_type,
        source_list,
        min_value,
        max_value,
        has_balance,
        no_balance,
        expires_before,
        expires_after,
        has_expiration,
        has_description,
        ..
    } = cmd
    else {
        return Ok(Vec::new());
    };

    let mut conditions = Vec::new();
    if let Some(t) = record_type {
        conditions.push(Condition::text(ConditionField::Type, ComparisonOperator::Equals, t));
    }
    if let Some(t) = not_type {
        conditions.push(Condition::text(ConditionField::Type, ComparisonOperator::NotEquals, t));
    }
    if let Some(name) = source_list {
        conditions.push(Condition::text(
            ConditionField::SourceListName,
            ComparisonOperator::Equals,
            name,
        ));
    }
    if let Some(value) = min_value {
        conditions.push(Condition::amount(
            ComparisonOperator::GreaterOrEqual,
            parse_money(value)?,
        ));
    }
    if let Some(value) = max_value {
        conditions.push(Condition::amount(
            ComparisonOperator::LessOrEqual,
            parse_money(value)?,
        ));
    }
    if *has_balance {
        conditions.push(Condition::presence(ConditionField::HasBalance, true));
    }
    if *no_balance {
        conditions.push(Condition::presence(ConditionField::HasBalance, false));
    }
    if let Some(date) = expires_before {
        conditions.push(Condition::expires(ComparisonOperator::LessThan, parse_date(date)?));
    }
    if let Some(date) = expires_after {
        conditions.push(Condition::expires(
            ComparisonOperator::GreaterThan,
            parse_date(date)?,
        ));
    }
    if *has_expiration {
        conditions.push(Condition::presence(ConditionField::HasExpirationDate, true));
    }
    if *has_description {
        conditions.push(Condition::presence(ConditionField::HasDescription, true));
    }
    Ok(conditions)
}

/// Position of a list in the registry
fn registry_index(ctx: &CliContext<'_>, list: &CouponList) -> CouponResult<usize> {
    ctx.lists()
        .list_all()?
        .iter()
        .position(|l| l.id == list.id)
        .ok_or_else(|| CouponError::list_not_found(list.name.clone()))
}

/// Handle a list command
pub fn handle_list_command(ctx: &CliContext<'_>, cmd: ListCommands) -> CouponResult<()> {
    let lists = ctx.lists();
    let aggregation = ctx.aggregation();
    let lookup = ctx.currencies();

    match cmd {
        ListCommands::All => {
            let mut summaries = Vec::new();
            for list in lists.list_all()? {
                summaries.push(aggregation.summary(&list)?);
            }
            summaries.push(aggregation.summary(&lists.recently_deleted())?);

            let selected = lists.selected().ok().map(|l| l.id);
            print!("{}", format_list_table(&summaries, selected, &lookup));
        }

        ListCommands::Show { list } => {
            let list = ctx.resolve_list(list.as_deref())?;
            let summary = aggregation.summary(&list)?;
            print!("{}", format_list_details(&summary, &lookup));
        }

        ListCommands::Create {
            ref name,
            ref color,
            ref icon,
            smart,
            match_any,
            ..
        } => {
            let mut list = if smart {
                CouponList::smart(name.clone(), !match_any, smart_conditions(&cmd)?)
            } else {
                CouponList::new(name.clone())
            };
            if let Some(color) = color {
                list.color_tag = color.clone();
            }
            if let Some(icon) = icon {
                list.icon_tag = icon.clone();
            }

            let list = lists.create_list(list)?;
            println!("Created list: {}", list.name);
            println!("  ID: {}", list.id);
            if list.is_smart {
                println!("  Conditions: {}", list.conditions.len());
            }
        }

        ListCommands::Edit {
            list,
            name,
            color,
            icon,
        } => {
            let mut list = ctx.resolve_list(Some(&list))?;
            if name.is_none() && color.is_none() && icon.is_none() {
                println!("No changes specified.");
                return Ok(());
            }
            if let Some(name) = name {
                list.name = name;
            }
            if let Some(color) = color {
                list.color_tag = color;
            }
            if let Some(icon) = icon {
                list.icon_tag = icon;
            }

            let name = list.name.clone();
            if lists.update_list(list)? {
                println!("Updated list: {}", name);
            } else {
                return Err(CouponError::list_not_found(name));
            }
        }

        ListCommands::Select { list } => {
            let list = ctx.resolve_list(Some(&list))?;
            lists.select_list(list.id)?;
            println!("Selected list: {}", list.name);
        }

        ListCommands::Reorder { list, position } => {
            let list = ctx.resolve_list(Some(&list))?;
            let from = registry_index(ctx, &list)?;
            let to = position.saturating_sub(1);
            if lists.reorder_lists(from, to)? {
                println!("Moved '{}' to position {}", list.name, to + 1);
            } else {
                return Err(CouponError::Validation(format!(
                    "Position {} is out of range",
                    position
                )));
            }
        }

        ListCommands::Delete { list } => {
            let list = ctx.resolve_list(Some(&list))?;
            let count = aggregation.count_of(&list)?;
            if lists.delete_list(list.id)? {
                println!("Deleted list: {}", list.name);
                if count > 0 {
                    println!("  {} record(s) moved to Recently Deleted", count);
                }
            }
        }
    }

    Ok(())
}

/// Handle the totals command
pub fn handle_totals_command(ctx: &CliContext<'_>, list: Option<String>) -> CouponResult<()> {
    let list = ctx.resolve_list(list.as_deref())?;
    let totals = ctx.aggregation().totals_for(&list)?;
    println!("{}", list.name);
    print!("{}", format_totals(&totals, &ctx.currencies()));
    Ok(())
}
