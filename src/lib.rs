//! Coupons - Terminal-based tracker for gift cards, coupons and store credit
//!
//! This library provides the core functionality of the coupon tracker.
//! Records live in ordinary lists; smart lists are saved queries over every
//! list; deleted records wait in Recently Deleted until a retention sweep
//! removes them. Every change is mirrored to a remote replica that other
//! devices reconcile from.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (records, lists, conditions, vocabularies)
//! - `storage`: Tiered JSON blob storage and repositories
//! - `audit`: Audit logging system
//! - `services`: Business logic layer
//! - `export`: CSV, JSON and YAML export
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use coupons::config::{CouponPaths, Settings};
//! use coupons::storage::Storage;
//!
//! let paths = CouponPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths, &settings)?;
//! storage.load_all()?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{CouponError, CouponResult};
