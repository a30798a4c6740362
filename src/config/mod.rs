//! Configuration module
//!
//! - Data directory resolution for the local store and remote replica
//! - User settings persistence (currency, retention, entitlement stand-in)

pub mod paths;
pub mod settings;

pub use paths::CouponPaths;
pub use settings::Settings;
