//! CLI commands for data export
//!
//! Exports the effective members of a list in CSV, JSON or YAML.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};

use crate::error::{CouponError, CouponResult};
use crate::export::{
    export_list_csv, export_list_json, export_list_yaml, import_from_json, import_from_yaml,
};

use super::CliContext;

/// Export format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// CSV format (one row per record)
    Csv,
    /// JSON format (records with totals)
    Json,
    /// YAML format (human-readable)
    Yaml,
}

/// Export arguments
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path
    pub output: PathBuf,

    /// Export format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// List name or ID (defaults to the selected list)
    #[arg(short, long)]
    pub list: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

fn export_err(output: &Path, e: impl std::fmt::Display) -> CouponError {
    CouponError::Export(format!("Failed to write {}: {}", output.display(), e))
}

/// Handle the export command
pub fn handle_export_command(ctx: &CliContext<'_>, args: ExportArgs) -> CouponResult<()> {
    let list = ctx.resolve_list(args.list.as_deref())?;
    let output = &args.output;

    let file = File::create(output).map_err(|e| export_err(output, e))?;
    let mut writer = BufWriter::new(file);

    match args.format {
        ExportFormat::Csv => {
            let count = export_list_csv(ctx.storage, &list, &mut writer)?;
            writer.flush().map_err(|e| export_err(output, e))?;
            println!("Exported {} records of '{}' to: {}", count, list.name, output.display());
            return Ok(());
        }
        ExportFormat::Json => export_list_json(ctx.storage, &list, &mut writer, args.pretty)?,
        ExportFormat::Yaml => export_list_yaml(ctx.storage, &list, &mut writer)?,
    }
    writer.flush().map_err(|e| export_err(output, e))?;
    drop(writer);

    // Read the document back so a broken export is reported now
    let written = fs::read_to_string(output).map_err(|e| export_err(output, e))?;
    let export = match args.format {
        ExportFormat::Yaml => import_from_yaml(&written)?,
        _ => import_from_json(&written)?,
    };

    tracing::debug!(list = %list.name, records = export.members.len(), "export verified");
    println!(
        "Exported {} records of '{}' to: {}",
        export.members.len(),
        list.name,
        output.display()
    );

    Ok(())
}
