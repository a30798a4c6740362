//! Category CLI commands
//!
//! Implements CLI commands for the per-list category vocabulary, the
//! global record-type vocabulary, and a list's default currency.

use clap::{Args, Subcommand};

use crate::error::{CouponError, CouponResult};
use crate::models::Vocabulary;
use crate::services::VocabularyKind;

use super::CliContext;

/// Which vocabulary a command edits
#[derive(Args, Debug, Clone)]
pub struct VocabularyTarget {
    /// List whose categories to edit (defaults to the selected list)
    #[arg(short, long, conflicts_with = "types")]
    pub list: Option<String>,
    /// Edit the record-type vocabulary shared by all lists
    #[arg(long)]
    pub types: bool,
}

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories (or types) in display order
    List {
        #[command(flatten)]
        target: VocabularyTarget,
    },

    /// Add a category (or type)
    Add {
        name: String,
        #[command(flatten)]
        target: VocabularyTarget,
    },

    /// Rename a category (or type)
    Rename {
        old: String,
        new: String,
        #[command(flatten)]
        target: VocabularyTarget,
    },

    /// Remove a category (or type); records keep their value
    Remove {
        name: String,
        #[command(flatten)]
        target: VocabularyTarget,
    },

    /// Move a category (or type) to a new position (1-based)
    Move {
        name: String,
        position: usize,
        #[command(flatten)]
        target: VocabularyTarget,
    },

    /// Show or set the default currency of a list
    Currency {
        /// Three-letter code; "none" clears it
        code: Option<String>,
        /// List name or ID (defaults to the selected list)
        #[arg(short, long)]
        list: Option<String>,
    },
}

fn resolve_kind(ctx: &CliContext<'_>, target: &VocabularyTarget) -> CouponResult<(VocabularyKind, String)> {
    if target.types {
        return Ok((VocabularyKind::Types, "Types".to_string()));
    }
    let list = ctx.resolve_target_list(target.list.as_deref())?;
    if list.is_smart {
        return Err(CouponError::Validation(format!(
            "Smart list '{}' has no categories of its own",
            list.name
        )));
    }
    Ok((VocabularyKind::Categories(list.id), format!("Categories of {}", list.name)))
}

fn print_vocabulary(title: &str, vocabulary: &Vocabulary) {
    println!("{}", title);
    if vocabulary.is_empty() {
        println!("  (none)");
        return;
    }
    for (i, name) in vocabulary.names().iter().enumerate() {
        println!("  {:>2}. {}", i + 1, name);
    }
}

/// Handle a category command
pub fn handle_category_command(ctx: &CliContext<'_>, cmd: CategoryCommands) -> CouponResult<()> {
    let service = ctx.vocabularies();

    match cmd {
        CategoryCommands::List { target } => {
            let (kind, title) = resolve_kind(ctx, &target)?;
            print_vocabulary(&title, &service.get(kind)?);
        }

        CategoryCommands::Add { name, target } => {
            let (kind, _) = resolve_kind(ctx, &target)?;
            service.add(kind, &name)?;
            println!("Added: {}", name.trim());
        }

        CategoryCommands::Rename { old, new, target } => {
            let (kind, _) = resolve_kind(ctx, &target)?;
            service.rename(kind, &old, &new)?;
            println!("Renamed '{}' to '{}'", old.trim(), new.trim());
        }

        CategoryCommands::Remove { name, target } => {
            let (kind, _) = resolve_kind(ctx, &target)?;
            service.remove(kind, &name)?;
            println!("Removed: {}", name.trim());
        }

        CategoryCommands::Move {
            name,
            position,
            target,
        } => {
            let (kind, title) = resolve_kind(ctx, &target)?;
            let from = service
                .get(kind)?
                .position(&name)
                .ok_or_else(|| CouponError::NotFound {
                    entity_type: "Vocabulary entry",
                    identifier: name.clone(),
                })?;
            let vocabulary = service.move_item(kind, from, position.saturating_sub(1))?;
            print_vocabulary(&title, &vocabulary);
        }

        CategoryCommands::Currency { code, list } => {
            let list = ctx.resolve_target_list(list.as_deref())?;
            match code {
                None => {
                    let current = service
                        .default_currency(list.id)?
                        .unwrap_or_else(|| format!("{} (app default)", ctx.settings.default_currency));
                    println!("{}: {}", list.name, current);
                }
                Some(code) => {
                    let code = Some(code.as_str()).filter(|c| !c.trim().eq_ignore_ascii_case("none"));
                    service.set_default_currency(list.id, code)?;
                    match service.default_currency(list.id)? {
                        Some(code) => println!("Default currency of {} set to {}", list.name, code),
                        None => println!("Default currency of {} cleared", list.name),
                    }
                }
            }
        }
    }

    Ok(())
}
