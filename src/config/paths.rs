//! Path management for the coupon tracker
//!
//! ## Path Resolution Order
//!
//! 1. `COUPONS_DATA_DIR` environment variable (if set)
//! 2. The platform config directory (`~/.config/coupons` on Linux,
//!    `%APPDATA%\coupons` on Windows)
//!
//! The base directory holds two blob tiers: `local/` is the primary store and
//! `remote/` is the mirrored replica that other devices would sync from.

use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::CouponError;

/// Manages all paths used by the coupon tracker
#[derive(Debug, Clone)]
pub struct CouponPaths {
    base_dir: PathBuf,
}

impl CouponPaths {
    /// Resolve the base directory from the environment or platform defaults
    ///
    /// # Errors
    ///
    /// Returns an error if no home/config directory can be determined.
    pub fn new() -> Result<Self, CouponError> {
        let base_dir = if let Ok(custom) = std::env::var("COUPONS_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            BaseDirs::new()
                .map(|dirs| dirs.config_dir().join("coupons"))
                .ok_or_else(|| {
                    CouponError::Config("Could not determine a config directory".into())
                })?
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Directory of the local blob tier
    pub fn local_dir(&self) -> PathBuf {
        self.base_dir.join("local")
    }

    /// Directory of the file-backed remote replica
    pub fn remote_dir(&self) -> PathBuf {
        self.base_dir.join("remote")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Ensure the base directory and both blob tiers exist
    pub fn ensure_directories(&self) -> Result<(), CouponError> {
        for dir in [self.base_dir.clone(), self.local_dir(), self.remote_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                CouponError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// Check if the tracker has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CouponPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.local_dir(), temp_dir.path().join("local"));
        assert_eq!(paths.remote_dir(), temp_dir.path().join("remote"));
        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CouponPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.local_dir().exists());
        assert!(paths.remote_dir().exists());
        assert!(!paths.is_initialized());
    }
}
