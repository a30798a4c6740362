//! Export module
//!
//! Writes the effective members of a list in several formats:
//! - CSV: one row per record (spreadsheet-compatible)
//! - JSON: versioned document with totals
//! - YAML: the same document, human-readable

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_list_csv;
pub use json::{export_list_json, import_from_json, ExportedMember, ListExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_list_yaml, import_from_yaml};
