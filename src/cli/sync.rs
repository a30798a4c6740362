//! Sync CLI commands
//!
//! Reconciles the local copy with the remote mirror and runs the
//! Recently Deleted retention sweep.

use chrono::Utc;
use clap::Subcommand;

use crate::error::CouponResult;
use crate::services::SyncReport;

use super::CliContext;

/// Sync subcommands
#[derive(Subcommand)]
pub enum SyncCommands {
    /// Adopt changes written to the remote mirror by another device
    Pull,

    /// Pull, then purge Recently Deleted entries past the retention window
    Foreground,

    /// Show whether a remote mirror is configured
    Status,
}

fn print_report(report: &SyncReport) {
    if report.is_empty() {
        println!("Already up to date.");
        return;
    }
    if !report.applied.is_empty() {
        println!("Applied {} remote change(s):", report.applied.len());
        for key in &report.applied {
            println!("  {}", key);
        }
    }
    if !report.purged.is_empty() {
        println!("Purged {} expired record(s):", report.purged.len());
        for entry in &report.purged {
            println!("  {} {}", entry.id(), entry.record.name);
        }
    }
}

/// Handle a sync command
pub fn handle_sync_command(ctx: &CliContext<'_>, cmd: SyncCommands) -> CouponResult<()> {
    let reconciler = ctx.reconciler();

    match cmd {
        SyncCommands::Pull => {
            let applied = reconciler.pull()?;
            print_report(&SyncReport {
                applied,
                purged: Vec::new(),
            });
        }
        SyncCommands::Foreground => {
            let report = reconciler.on_foreground(Utc::now())?;
            print_report(&report);
        }
        SyncCommands::Status => {
            if ctx.storage.tiers().has_remote() {
                println!("Remote mirror: enabled");
            } else {
                println!("Remote mirror: disabled");
            }
            println!("Retention: {} days", ctx.settings.retention_days);
        }
    }

    Ok(())
}
