//! User settings for the coupon tracker
//!
//! Every field carries a serde default so older config files keep loading
//! after new settings are introduced.

use serde::{Deserialize, Serialize};

use super::paths::CouponPaths;
use crate::error::CouponError;

/// Days a deleted record stays in Recently Deleted before it is purged
pub const DEFAULT_RETENTION_DAYS: i64 = 40;

/// Records allowed across all lists before the free tier asks for an upgrade
pub const DEFAULT_FREE_TIER_RECORD_LIMIT: usize = 10;

/// User settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency code used when a list has no default of its own
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Retention window for Recently Deleted, in days
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Record count at which the free tier stops accepting new records
    #[serde(default = "default_free_tier_record_limit")]
    pub free_tier_record_limit: usize,

    /// Whether the pro entitlement has been unlocked
    #[serde(default)]
    pub pro_unlocked: bool,

    /// Mirror every local write to the remote replica
    #[serde(default = "default_true")]
    pub remote_mirror_enabled: bool,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS
}

fn default_free_tier_record_limit() -> usize {
    DEFAULT_FREE_TIER_RECORD_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_currency: default_currency(),
            retention_days: default_retention_days(),
            free_tier_record_limit: default_free_tier_record_limit(),
            pro_unlocked: false,
            remote_mirror_enabled: true,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &CouponPaths) -> Result<Self, CouponError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| CouponError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| CouponError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &CouponPaths) -> Result<(), CouponError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| CouponError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| CouponError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.schema_version, 1);
        assert_eq!(settings.default_currency, "USD");
        assert_eq!(settings.retention_days, 40);
        assert!(!settings.pro_unlocked);
        assert!(settings.remote_mirror_enabled);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CouponPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.default_currency = "EUR".into();
        settings.pro_unlocked = true;
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.default_currency, "EUR");
        assert!(loaded.pro_unlocked);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"pro_unlocked": true}"#).unwrap();
        assert!(settings.pro_unlocked);
        assert_eq!(settings.retention_days, DEFAULT_RETENTION_DAYS);
        assert_eq!(settings.free_tier_record_limit, DEFAULT_FREE_TIER_RECORD_LIMIT);
        assert_eq!(settings.log_level, "info");
    }
}
