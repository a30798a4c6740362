//! Aggregation engine
//!
//! Computes list membership and per-currency totals on every read. Smart
//! lists scan every registered scope; nothing here owns data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CouponResult;
use crate::models::{CouponList, ListId, Money, Record};
use crate::storage::Storage;

use super::conditions;

/// A member of a list together with the scope it is stored under
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRecord {
    pub record: Record,
    pub source_list: ListId,
    pub source_name: String,
}

/// Sum of remaining value for one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTotal {
    pub currency_code: String,
    pub total: Money,
}

/// A list with its member count and totals
#[derive(Debug, Clone, PartialEq)]
pub struct ListSummary {
    pub list: CouponList,
    pub count: usize,
    pub totals: Vec<CurrencyTotal>,
}

/// Service for membership and rollups
pub struct AggregationService<'a> {
    storage: &'a Storage,
}

impl<'a> AggregationService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Members of a list with their source scope
    ///
    /// Ordinary lists return their scope unchanged. Smart lists union every
    /// registered scope and keep the records that match, each evaluated
    /// against the name of the list it is stored under. The Recently Deleted
    /// pseudo-list returns the deleted collection.
    pub fn members_with_source(&self, list: &CouponList) -> CouponResult<Vec<MemberRecord>> {
        if list.id.is_recently_deleted() {
            return Ok(self
                .storage
                .records
                .get_deleted()?
                .into_iter()
                .map(|deleted| MemberRecord {
                    record: deleted.record,
                    source_list: list.id,
                    source_name: list.name.clone(),
                })
                .collect());
        }

        if !list.is_smart {
            return Ok(self
                .storage
                .records
                .get_scope(list.id)?
                .into_iter()
                .map(|record| MemberRecord {
                    record,
                    source_list: list.id,
                    source_name: list.name.clone(),
                })
                .collect());
        }

        let sources: Vec<(ListId, String)> = self
            .storage
            .lists
            .get_all()?
            .into_iter()
            .map(|l| (l.id, l.name))
            .collect();

        let mut members = Vec::new();
        for (source_list, source_name) in sources {
            for record in self.storage.records.get_scope(source_list)? {
                if conditions::matches(&record, &source_name, list) {
                    members.push(MemberRecord {
                        record,
                        source_list,
                        source_name: source_name.clone(),
                    });
                }
            }
        }
        Ok(members)
    }

    pub fn members_of(&self, list: &CouponList) -> CouponResult<Vec<Record>> {
        Ok(self
            .members_with_source(list)?
            .into_iter()
            .map(|member| member.record)
            .collect())
    }

    /// Number of members; for Recently Deleted, the size of the deleted collection
    pub fn count_of(&self, list: &CouponList) -> CouponResult<usize> {
        if list.id.is_recently_deleted() {
            return self.storage.records.deleted_count();
        }
        if !list.is_smart {
            return self.storage.records.count(list.id);
        }
        Ok(self.members_with_source(list)?.len())
    }

    pub fn totals_for(&self, list: &CouponList) -> CouponResult<Vec<CurrencyTotal>> {
        Ok(totals_by_currency(&self.members_of(list)?))
    }

    pub fn summary(&self, list: &CouponList) -> CouponResult<ListSummary> {
        let members = self.members_of(list)?;
        Ok(ListSummary {
            list: list.clone(),
            count: members.len(),
            totals: totals_by_currency(&members),
        })
    }

    /// Total number of records stored across every registered scope
    pub fn stored_record_count(&self) -> CouponResult<usize> {
        let mut total = 0;
        for list in self.storage.lists.get_all()? {
            total += self.storage.records.count(list.id)?;
        }
        Ok(total)
    }
}

/// Sum remaining value per currency, ascending by currency code
///
/// Records without a tracked balance contribute zero but still make their
/// currency appear.
pub fn totals_by_currency(records: &[Record]) -> Vec<CurrencyTotal> {
    let mut totals: BTreeMap<&str, Money> = BTreeMap::new();
    for record in records {
        *totals.entry(record.currency_code.as_str()).or_default() +=
            record.remaining_value.unwrap_or_default();
    }
    totals
        .into_iter()
        .map(|(code, total)| CurrencyTotal {
            currency_code: code.to_string(),
            total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComparisonOperator, Condition, ConditionField, DeletedRecord, RecordDraft};
    use chrono::Utc;

    fn record(name: &str, cents: i64, currency: &str, record_type: Option<&str>) -> Record {
        let mut draft = RecordDraft::new(name, "CODE").with_value(Money::from_cents(cents), currency);
        if let Some(t) = record_type {
            draft = draft.with_type(t);
        }
        Record::new(draft)
    }

    fn setup() -> (Storage, CouponList, CouponList) {
        let storage = Storage::in_memory();
        storage.load_all().unwrap();
        let a = CouponList::new("A");
        let b = CouponList::new("B");
        storage.lists.upsert(a.clone()).unwrap();
        storage.lists.upsert(b.clone()).unwrap();
        (storage, a, b)
    }

    #[test]
    fn test_ordinary_list_is_its_scope() {
        let (storage, a, _b) = setup();
        let coffee = record("Coffee", 1000, "USD", None);
        storage.records.append(a.id, coffee.clone()).unwrap();

        let service = AggregationService::new(&storage);
        assert_eq!(service.members_of(&a).unwrap(), vec![coffee]);
        assert_eq!(
            service.totals_for(&a).unwrap(),
            vec![CurrencyTotal {
                currency_code: "USD".into(),
                total: Money::from_cents(1000)
            }]
        );
    }

    #[test]
    fn test_smart_list_scans_every_scope() {
        let (storage, a, b) = setup();
        let card = record("X", 500, "USD", Some("Gift Cards"));
        storage.records.append(b.id, card.clone()).unwrap();
        storage
            .records
            .append(a.id, record("Y", 500, "USD", Some("Coupons")))
            .unwrap();

        let smart = CouponList::smart(
            "Cards",
            true,
            vec![Condition::text(ConditionField::Type, ComparisonOperator::Equals, "Gift Cards")],
        );
        storage.lists.upsert(smart.clone()).unwrap();

        let service = AggregationService::new(&storage);
        let members = service.members_with_source(&smart).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].record, card);
        assert_eq!(members[0].source_list, b.id);
        assert_eq!(service.count_of(&smart).unwrap(), 1);

        let summary = service.summary(&smart).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.totals[0].total, Money::from_cents(500));
    }

    #[test]
    fn test_record_in_several_smart_lists() {
        let (storage, a, _b) = setup();
        storage
            .records
            .append(a.id, record("X", 500, "USD", Some("Gift Cards")))
            .unwrap();

        let by_type = CouponList::smart(
            "Cards",
            true,
            vec![Condition::text(ConditionField::Type, ComparisonOperator::Equals, "Gift Cards")],
        );
        let with_balance = CouponList::smart(
            "Funded",
            true,
            vec![Condition::presence(ConditionField::HasBalance, true)],
        );

        let service = AggregationService::new(&storage);
        assert_eq!(service.count_of(&by_type).unwrap(), 1);
        assert_eq!(service.count_of(&with_balance).unwrap(), 1);
    }

    #[test]
    fn test_recently_deleted_counts_global_collection() {
        let (storage, _a, _b) = setup();
        storage
            .records
            .push_deleted(DeletedRecord::new(record("Old", 0, "USD", None), Utc::now()))
            .unwrap();

        let service = AggregationService::new(&storage);
        let deleted = CouponList::recently_deleted();
        assert_eq!(service.count_of(&deleted).unwrap(), 1);
        assert_eq!(service.members_of(&deleted).unwrap()[0].name, "Old");
    }

    #[test]
    fn test_totals_sorted_and_defaulted() {
        let mut untracked = record("Free", 0, "EUR", None);
        untracked.remaining_value = None;
        let totals = totals_by_currency(&[
            record("A", 1000, "USD", None),
            untracked,
            record("B", 250, "USD", None),
            record("C", 300, "CAD", None),
        ]);

        let codes: Vec<_> = totals.iter().map(|t| t.currency_code.as_str()).collect();
        assert_eq!(codes, vec!["CAD", "EUR", "USD"]);
        assert_eq!(totals[1].total, Money::zero());
        assert_eq!(totals[2].total, Money::from_cents(1250));
    }

    #[test]
    fn test_stored_record_count() {
        let (storage, a, b) = setup();
        storage.records.append(a.id, record("1", 1, "USD", None)).unwrap();
        storage.records.append(b.id, record("2", 1, "USD", None)).unwrap();
        assert_eq!(AggregationService::new(&storage).stored_record_count().unwrap(), 2);
    }
}
