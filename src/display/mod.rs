//! Display formatting for terminal output
//!
//! Formats records, lists, the deleted collection and totals for the CLI.

pub mod list;
pub mod record;
pub mod totals;

pub use list::{format_condition, format_list_details, format_list_table};
pub use record::{
    days_until_purge, format_deleted_table, format_record_details, format_record_groups,
    format_record_table,
};
pub use totals::{format_amount, format_totals, format_totals_inline, EMPTY_TOTAL};
