//! History CLI command
//!
//! Shows the most recent entries of the audit log.

use crate::error::CouponResult;

use super::CliContext;

/// Print the last `count` audit entries, oldest first
pub fn handle_history_command(ctx: &CliContext<'_>, count: usize) -> CouponResult<()> {
    let Some(logger) = ctx.storage.audit_logger() else {
        println!("Audit log is not enabled.");
        return Ok(());
    };

    let entries = logger.read_recent(count)?;
    if entries.is_empty() {
        println!("No history yet.");
        return Ok(());
    }

    for entry in entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
