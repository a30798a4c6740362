//! Grouping and ordering of records
//!
//! The backing `Vec<Record>` of a scope is the single source of truth for
//! order across all groups. Group views are derived from it, and every
//! reorder is translated into one splice of the backing order.

use crate::models::{Record, RecordId, Vocabulary, UNCATEGORIZED};

/// A titled slice of the member set
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    pub title: String,
    pub records: Vec<Record>,
}

/// A drag-and-drop request
///
/// `destination_index` is the group-local drop row; `None` means the record
/// was dropped on the group header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveIntent {
    pub record_id: RecordId,
    pub source_group: String,
    pub destination_group: String,
    pub destination_index: Option<usize>,
}

/// Default group of a record: its trimmed category, else "Uncategorized"
pub fn group_title(record: &Record) -> String {
    record
        .category_name()
        .unwrap_or(UNCATEGORIZED)
        .to_string()
}

fn same_group(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Group records by category
///
/// Managed vocabulary entries come first in vocabulary order, then
/// "Uncategorized", then unmanaged names lexicographically. Unmanaged names
/// differing only in case share one group titled by the first spelling
/// seen. Records within a
/// group are sorted by name, case-insensitively. Empty groups are omitted.
pub fn group_by(records: &[Record], vocabulary: &Vocabulary) -> Vec<RecordGroup> {
    group_by_with(records, vocabulary, group_title)
}

/// `group_by` with a caller-supplied group name for each record
pub fn group_by_with<F>(records: &[Record], vocabulary: &Vocabulary, display_name: F) -> Vec<RecordGroup>
where
    F: Fn(&Record) -> String,
{
    let mut groups = partition(records, vocabulary, display_name);
    for group in &mut groups {
        group
            .records
            .sort_by_cached_key(|record| record.name.to_lowercase());
    }
    groups
}

/// Group records by category, keeping each group in backing order
///
/// Group-local indices passed to [`move_within_group`] refer to this view.
pub fn group_in_backing_order(records: &[Record], vocabulary: &Vocabulary) -> Vec<RecordGroup> {
    partition(records, vocabulary, group_title)
}

fn partition<F>(records: &[Record], vocabulary: &Vocabulary, display_name: F) -> Vec<RecordGroup>
where
    F: Fn(&Record) -> String,
{
    let mut managed: Vec<RecordGroup> = vocabulary
        .names()
        .iter()
        .map(|name| RecordGroup {
            title: name.clone(),
            records: Vec::new(),
        })
        .collect();
    let mut uncategorized = Vec::new();
    let mut unmanaged: Vec<RecordGroup> = Vec::new();

    for record in records {
        let title = display_name(record);
        if let Some(index) = vocabulary.position(&title) {
            managed[index].records.push(record.clone());
        } else if same_group(&title, UNCATEGORIZED) {
            uncategorized.push(record.clone());
        } else {
            match unmanaged.iter_mut().find(|g| same_group(&g.title, &title)) {
                Some(group) => group.records.push(record.clone()),
                None => unmanaged.push(RecordGroup {
                    title,
                    records: vec![record.clone()],
                }),
            }
        }
    }

    unmanaged.sort_by_cached_key(|g| g.title.trim().to_lowercase());

    let mut groups: Vec<RecordGroup> = managed.into_iter().filter(|g| !g.records.is_empty()).collect();
    if !uncategorized.is_empty() {
        groups.push(RecordGroup {
            title: UNCATEGORIZED.to_string(),
            records: uncategorized,
        });
    }
    groups.extend(unmanaged);
    groups
}

/// Backing positions of the members of a group, ascending
fn member_positions(records: &[Record], group: &str, vocabulary: &Vocabulary) -> Vec<usize> {
    let canonical = vocabulary
        .position(group)
        .map(|i| vocabulary.names()[i].clone())
        .unwrap_or_else(|| group.trim().to_string());
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| same_group(&group_title(record), &canonical))
        .map(|(i, _)| i)
        .collect()
}

/// Stable move: remove `sources` (ascending, unique) and reinsert them,
/// in order, where `destination` pointed before the removal
fn move_offsets<T>(items: &mut Vec<T>, sources: &[usize], destination: usize) {
    let mut moved: Vec<T> = sources.iter().rev().map(|&i| items.remove(i)).collect();
    moved.reverse();
    let shift = sources.iter().filter(|&&i| i < destination).count();
    let at = (destination - shift).min(items.len());
    items.splice(at..at, moved);
}

/// Reorder records inside one group
///
/// `from` and `to` are group-local indices into the backing-order view of
/// the group; `to` may equal the group length to move to its end. Members of
/// other groups keep their relative order. Returns false for bad indices.
pub fn move_within_group(
    records: &mut Vec<Record>,
    vocabulary: &Vocabulary,
    group: &str,
    from: &[usize],
    to: usize,
) -> bool {
    let positions = member_positions(records, group, vocabulary);
    if positions.is_empty() || to > positions.len() {
        return false;
    }

    let mut local: Vec<usize> = from.to_vec();
    local.sort_unstable();
    local.dedup();
    if local.is_empty() || local.iter().any(|&i| i >= positions.len()) {
        return false;
    }

    let sources: Vec<usize> = local.iter().map(|&i| positions[i]).collect();
    let destination = match positions.get(to) {
        Some(&position) => position,
        None => positions[positions.len() - 1] + 1,
    };

    move_offsets(records, &sources, destination);
    true
}

/// Move a record into another group
///
/// With no `destination_index` the record lands after the group's last
/// member; otherwise it is inserted before the member at that local index.
/// Moving into "Uncategorized" clears the category.
pub fn reassign_group(
    records: &mut Vec<Record>,
    vocabulary: &Vocabulary,
    record_id: RecordId,
    new_group: &str,
    destination_index: Option<usize>,
) -> bool {
    let Some(index) = records.iter().position(|r| r.id == record_id) else {
        return false;
    };
    let mut record = records.remove(index);

    let new_group = new_group.trim();
    record.category = if new_group.is_empty() || same_group(new_group, UNCATEGORIZED) {
        None
    } else {
        Some(
            vocabulary
                .position(new_group)
                .map(|i| vocabulary.names()[i].clone())
                .unwrap_or_else(|| new_group.to_string()),
        )
    };

    let title = group_title(&record);
    let positions = member_positions(records, &title, vocabulary);
    let at = match (destination_index, positions.last()) {
        (Some(local), _) if local < positions.len() => positions[local],
        (_, Some(&last)) => last + 1,
        (_, None) => records.len(),
    };
    records.insert(at, record);
    true
}

/// Apply a drag-and-drop intent to the backing order
pub fn apply_move(records: &mut Vec<Record>, vocabulary: &Vocabulary, intent: &MoveIntent) -> bool {
    if !same_group(&intent.source_group, &intent.destination_group) {
        return reassign_group(
            records,
            vocabulary,
            intent.record_id,
            &intent.destination_group,
            intent.destination_index,
        );
    }

    let positions = member_positions(records, &intent.source_group, vocabulary);
    let Some(local) = positions.iter().position(|&p| records[p].id == intent.record_id) else {
        return false;
    };
    let to = intent.destination_index.unwrap_or(positions.len());
    move_within_group(records, vocabulary, &intent.source_group, &[local], to)
}
