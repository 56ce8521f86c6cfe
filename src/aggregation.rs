use crate::schema::{Bucket, TimeSeriesPoint, TransactionKind, TransactionRecord};
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

/// Turns raw transaction records into a time-bucketed series.
///
/// Buckets with no activity are not synthesized; downstream consumers must
/// tolerate gaps. Empty input yields an empty series (minimum-sample policy
/// belongs to the forecasting callers, not here).
pub struct HistoricalAggregator;

impl HistoricalAggregator {
    pub fn aggregate(records: &[TransactionRecord], bucket: Bucket) -> Vec<TimeSeriesPoint> {
        let mut buckets: BTreeMap<String, f64> = BTreeMap::new();

        for record in records {
            let key = period_key(record.date, bucket);
            let signed = match record.kind {
                TransactionKind::Income => record.amount,
                TransactionKind::Expense => -record.amount,
            };
            *buckets.entry(key).or_insert(0.0) += signed;
        }

        debug!(
            "Aggregated {} records into {} {:?} buckets",
            records.len(),
            buckets.len(),
            bucket
        );

        buckets
            .into_iter()
            .map(|(period, value)| TimeSeriesPoint { period, value })
            .collect()
    }

    /// Aggregates only records of the given kind, with amounts kept positive.
    /// Used by the revenue and expense handlers, which analyse one side of
    /// the ledger at a time.
    pub fn aggregate_kind(
        records: &[TransactionRecord],
        kind: TransactionKind,
        bucket: Bucket,
    ) -> Vec<TimeSeriesPoint> {
        let mut buckets: BTreeMap<String, f64> = BTreeMap::new();

        for record in records.iter().filter(|r| r.kind == kind) {
            *buckets.entry(period_key(record.date, bucket)).or_insert(0.0) += record.amount;
        }

        buckets
            .into_iter()
            .map(|(period, value)| TimeSeriesPoint { period, value })
            .collect()
    }
}

/// ISO period key for a date. Lexicographic order on these keys is
/// chronological order, which keeps the BTreeMap traversal ascending.
pub fn period_key(date: NaiveDate, bucket: Bucket) -> String {
    match bucket {
        Bucket::Day => date.format("%Y-%m-%d").to_string(),
        Bucket::Month => date.format("%Y-%m").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(y: i32, m: u32, d: u32, amount: f64, kind: TransactionKind) -> TransactionRecord {
        TransactionRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            amount,
            kind,
        }
    }

    #[test]
    fn test_monthly_aggregation_signs_and_order() {
        let records = vec![
            tx(2024, 2, 10, 500.0, TransactionKind::Expense),
            tx(2024, 1, 5, 1000.0, TransactionKind::Income),
            tx(2024, 1, 20, 250.0, TransactionKind::Expense),
            tx(2024, 2, 1, 2000.0, TransactionKind::Income),
        ];

        let series = HistoricalAggregator::aggregate(&records, Bucket::Month);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].period, "2024-01");
        assert_eq!(series[0].value, 750.0);
        assert_eq!(series[1].period, "2024-02");
        assert_eq!(series[1].value, 1500.0);
    }

    #[test]
    fn test_daily_aggregation_keys() {
        let records = vec![
            tx(2024, 3, 2, 100.0, TransactionKind::Income),
            tx(2024, 3, 2, 50.0, TransactionKind::Income),
            tx(2024, 3, 1, 10.0, TransactionKind::Income),
        ];

        let series = HistoricalAggregator::aggregate(&records, Bucket::Day);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].period, "2024-03-01");
        assert_eq!(series[1].period, "2024-03-02");
        assert_eq!(series[1].value, 150.0);
    }

    #[test]
    fn test_empty_input_is_valid() {
        let series = HistoricalAggregator::aggregate(&[], Bucket::Month);
        assert!(series.is_empty());
    }

    #[test]
    fn test_gaps_are_not_zero_filled() {
        let records = vec![
            tx(2024, 1, 15, 100.0, TransactionKind::Income),
            tx(2024, 4, 15, 100.0, TransactionKind::Income),
        ];

        let series = HistoricalAggregator::aggregate(&records, Bucket::Month);

        // February and March have no bucket at all.
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].period, "2024-01");
        assert_eq!(series[1].period, "2024-04");
    }

    #[test]
    fn test_aggregate_kind_filters_and_keeps_positive() {
        let records = vec![
            tx(2024, 1, 5, 1000.0, TransactionKind::Income),
            tx(2024, 1, 20, 250.0, TransactionKind::Expense),
        ];

        let expenses =
            HistoricalAggregator::aggregate_kind(&records, TransactionKind::Expense, Bucket::Month);
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].value, 250.0);
    }
}
