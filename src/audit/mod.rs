//! Audit logging
//!
//! Every mutation of records, lists, vocabularies and the selection is
//! appended to a line-delimited JSON log with before/after snapshots.
//!
//! - `AuditEntry`: one operation on one entity.
//! - `AuditLogger`: appends entries to the log file.
//! - `generate_diff`: short summary of what changed between two snapshots.

mod diff;
mod entry;
mod logger;

pub use diff::{diff_entities, generate_diff};
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
