use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coupons::cli::{
    handle_category_command, handle_deleted_command, handle_export_command,
    handle_history_command, handle_list_command, handle_record_command, handle_sync_command,
    handle_totals_command, CliContext,
};
use coupons::config::{CouponPaths, Settings};
use coupons::services::{EntitlementGuard, ListService, StaticEntitlement};
use coupons::storage::Storage;

#[derive(Parser)]
#[command(
    name = "coupons",
    author = "Kaylee Beyene",
    version,
    about = "Terminal-based tracker for gift cards, coupons and store credit",
    long_about = "Coupons keeps gift cards, coupons and vouchers in lists, \
                  tracks their remaining balances per currency, and mirrors \
                  every change to a replica other devices can sync from."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record management commands
    #[command(subcommand, alias = "rec")]
    Record(coupons::cli::RecordCommands),

    /// List management commands
    #[command(subcommand)]
    List(coupons::cli::ListCommands),

    /// Recently Deleted commands
    #[command(subcommand)]
    Deleted(coupons::cli::DeletedCommands),

    /// Show per-currency totals of a list
    Totals {
        /// List name or ID (defaults to the selected list)
        list: Option<String>,
    },

    /// Category, type and default currency commands
    #[command(subcommand)]
    Category(coupons::cli::CategoryCommands),

    /// Sync with the remote mirror
    #[command(subcommand)]
    Sync(coupons::cli::SyncCommands),

    /// Export a list's records
    Export(coupons::cli::ExportArgs),

    /// Show recent changes from the audit log
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },

    /// Show or change configuration
    Config {
        /// Unlock pro features
        #[arg(long, conflicts_with = "lock")]
        unlock: bool,
        /// Return to the free tier
        #[arg(long)]
        lock: bool,
        /// Currency code used when a list has no default
        #[arg(long)]
        default_currency: Option<String>,
        /// Days deleted records are kept
        #[arg(long)]
        retention_days: Option<i64>,
    },
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = CouponPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;
    init_tracing(&settings);

    if let Some(Commands::Config {
        unlock,
        lock,
        default_currency,
        retention_days,
    }) = &cli.command
    {
        return handle_config(
            &paths,
            &mut settings,
            *unlock,
            *lock,
            default_currency.clone(),
            *retention_days,
        );
    }

    // Initialize storage
    let storage = Storage::new(paths.clone(), &settings)?;
    storage.load_all()?;

    let guard = EntitlementGuard::new(
        Box::new(StaticEntitlement(settings.pro_unlocked)),
        settings.free_tier_record_limit,
    );
    ListService::new(&storage, &guard).ensure_defaults()?;

    let ctx = CliContext::new(&storage, &guard, &settings);

    // Launching counts as coming to the foreground
    if let Err(e) = ctx.reconciler().on_foreground(Utc::now()) {
        tracing::warn!(error = %e, "foreground sync failed");
    }

    match cli.command {
        Some(Commands::Record(cmd)) => handle_record_command(&ctx, cmd)?,
        Some(Commands::List(cmd)) => handle_list_command(&ctx, cmd)?,
        Some(Commands::Deleted(cmd)) => handle_deleted_command(&ctx, cmd)?,
        Some(Commands::Totals { list }) => handle_totals_command(&ctx, list)?,
        Some(Commands::Category(cmd)) => handle_category_command(&ctx, cmd)?,
        Some(Commands::Sync(cmd)) => handle_sync_command(&ctx, cmd)?,
        Some(Commands::Export(args)) => handle_export_command(&ctx, args)?,
        Some(Commands::History { count }) => handle_history_command(&ctx, count)?,
        Some(Commands::Config { .. }) => {}
        None => {
            let selected = ctx.lists().selected()?;
            println!("Coupons - gift cards, coupons and store credit");
            println!();
            println!("Selected list: {}", selected.name);
            println!();
            println!("Run 'coupons --help' for usage information.");
            println!("Run 'coupons record list' to see the selected list.");
        }
    }

    Ok(())
}

fn handle_config(
    paths: &CouponPaths,
    settings: &mut Settings,
    unlock: bool,
    lock: bool,
    default_currency: Option<String>,
    retention_days: Option<i64>,
) -> Result<()> {
    let mut changed = false;
    if unlock || lock {
        settings.pro_unlocked = unlock;
        changed = true;
    }
    if let Some(code) = default_currency {
        let code = code.trim().to_uppercase();
        if code.chars().count() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            anyhow::bail!("Currency code must be three letters: {}", code);
        }
        settings.default_currency = code;
        changed = true;
    }
    if let Some(days) = retention_days {
        if days < 1 {
            anyhow::bail!("Retention must be at least one day");
        }
        settings.retention_days = days;
        changed = true;
    }
    if changed {
        settings.save(paths)?;
        println!("Configuration saved.");
        println!();
    }

    println!("Coupons Configuration");
    println!("=====================");
    println!("Data directory:   {}", paths.base_dir().display());
    println!("Local store:      {}", paths.local_dir().display());
    println!("Remote mirror:    {}", paths.remote_dir().display());
    println!("Audit log:        {}", paths.audit_log().display());
    println!();
    println!("Settings:");
    println!("  Default currency:  {}", settings.default_currency);
    println!("  Retention (days):  {}", settings.retention_days);
    println!("  Free tier limit:   {}", settings.free_tier_record_limit);
    println!("  Pro unlocked:      {}", settings.pro_unlocked);
    println!("  Remote mirror:     {}", settings.remote_mirror_enabled);
    println!("  Log level:         {}", settings.log_level);

    Ok(())
}
