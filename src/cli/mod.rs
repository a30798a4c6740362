//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod category;
pub mod export;
pub mod history;
pub mod list;
pub mod record;
pub mod sync;

pub use category::{handle_category_command, CategoryCommands};
pub use export::{handle_export_command, ExportArgs};
pub use history::handle_history_command;
pub use list::{handle_list_command, handle_totals_command, ListCommands};
pub use record::{handle_deleted_command, handle_record_command, DeletedCommands, RecordCommands};
pub use sync::{handle_sync_command, SyncCommands};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::config::Settings;
use crate::error::{CouponError, CouponResult};
use crate::models::{BuiltinCurrencies, CouponList, DeletedRecord, ListId, Money, Record};
use crate::services::{
    AggregationService, EntitlementGuard, ListService, RecordService, SyncReconciler,
    VocabularyService,
};
use crate::storage::Storage;

/// Everything a command handler needs
pub struct CliContext<'a> {
    pub storage: &'a Storage,
    pub guard: &'a EntitlementGuard,
    pub settings: &'a Settings,
}

impl<'a> CliContext<'a> {
    pub fn new(storage: &'a Storage, guard: &'a EntitlementGuard, settings: &'a Settings) -> Self {
        Self {
            storage,
            guard,
            settings,
        }
    }

    pub fn records(&self) -> RecordService<'a> {
        RecordService::new(self.storage, self.guard)
            .with_fallback_currency(self.settings.default_currency.clone())
    }

    pub fn lists(&self) -> ListService<'a> {
        ListService::new(self.storage, self.guard)
    }

    pub fn vocabularies(&self) -> VocabularyService<'a> {
        VocabularyService::new(self.storage, self.guard)
    }

    pub fn aggregation(&self) -> AggregationService<'a> {
        AggregationService::new(self.storage)
    }

    pub fn reconciler(&self) -> SyncReconciler<'a> {
        SyncReconciler::new(self.storage)
            .with_guard(self.guard)
            .with_retention_days(self.settings.retention_days)
    }

    pub fn currencies(&self) -> BuiltinCurrencies {
        BuiltinCurrencies
    }

    /// The named list, or the selected one when no name is given
    pub fn resolve_list(&self, identifier: Option<&str>) -> CouponResult<CouponList> {
        match identifier {
            Some(identifier) => self
                .lists()
                .find(identifier)?
                .ok_or_else(|| CouponError::list_not_found(identifier)),
            None => self.lists().selected(),
        }
    }

    /// A list records can be stored in: the named one, or the selected one
    /// unless Recently Deleted is selected
    pub fn resolve_target_list(&self, identifier: Option<&str>) -> CouponResult<CouponList> {
        let list = self.resolve_list(identifier)?;
        if list.id.is_recently_deleted() && identifier.is_none() {
            return self
                .storage
                .lists
                .get_all()?
                .into_iter()
                .next()
                .ok_or_else(|| CouponError::list_not_found("default"));
        }
        Ok(list)
    }

    pub fn resolve_record(&self, identifier: &str) -> CouponResult<(ListId, Record)> {
        self.records()
            .find_by_identifier(identifier)?
            .ok_or_else(|| CouponError::record_not_found(identifier))
    }

    /// Find a Recently Deleted entry by id or name
    pub fn resolve_deleted(&self, identifier: &str) -> CouponResult<DeletedRecord> {
        let needle = identifier.trim().to_lowercase();
        let full_id = identifier.parse::<crate::models::RecordId>().ok();
        self.records()
            .list_deleted()?
            .into_iter()
            .find(|d| {
                Some(d.id()) == full_id
                    || d.id().to_string() == identifier
                    || d.record.name.trim().to_lowercase() == needle
            })
            .ok_or_else(|| CouponError::NotFound {
                entity_type: "Deleted record",
                identifier: identifier.to_string(),
            })
    }
}

/// Parse an amount such as "12.50" or "$12.50"
pub fn parse_money(input: &str) -> CouponResult<Money> {
    Money::parse(input).map_err(|e| CouponError::Validation(format!("Invalid amount: {}", e)))
}

/// Parse a YYYY-MM-DD date as midnight UTC
pub fn parse_date(input: &str) -> CouponResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        CouponError::Validation(format!("Invalid date: {}. Use YYYY-MM-DD format.", input))
    })?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CouponError::Validation(format!("Invalid date: {}", input)))?;
    Ok(Utc.from_utc_datetime(&midnight))
}
