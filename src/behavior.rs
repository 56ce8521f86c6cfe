use crate::schema::{
    ChurnResult, CustomerHistory, CustomerMetrics, NextPurchaseEstimate, ValueSegment,
};
use chrono::{Duration, NaiveDate};
use log::debug;

/// Explicit "never purchased" marker for the recency metrics. Not an error:
/// a customer with contacts but no invoices is a real lead.
pub const NEVER_PURCHASED_DAYS: i64 = 999;

/// Fallback next-purchase estimate used when fewer than two invoices exist.
const FALLBACK_NEXT_PURCHASE_DAYS: i64 = 60;
const FALLBACK_NEXT_PURCHASE_AMOUNT: f64 = 5_000.0;
const FALLBACK_NEXT_PURCHASE_CONFIDENCE: f64 = 0.5;

/// RFM-style scoring of a single customer: recency/frequency/monetary
/// metrics, an additive churn probability, a value segment, and a
/// next-purchase estimate. Stateless; one result per request.
pub struct CustomerBehaviorScorer;

impl CustomerBehaviorScorer {
    pub fn score(history: &CustomerHistory, as_of: NaiveDate) -> ChurnResult {
        let metrics = Self::derive_metrics(history, as_of);
        let churn_probability = Self::churn_probability(&metrics, history);
        let value_segment = Self::value_segment(&metrics);
        let next_purchase = Self::next_purchase(history, &metrics, as_of);
        let recommended_actions =
            Self::recommendations(churn_probability, value_segment, &metrics, history);

        debug!(
            "Scored customer {}: churn={:.2}, segment={}",
            history.customer_id,
            churn_probability,
            value_segment.label()
        );

        ChurnResult {
            customer_id: history.customer_id.clone(),
            churn_probability,
            value_segment,
            metrics,
            next_purchase,
            recommended_actions,
        }
    }

    pub fn derive_metrics(history: &CustomerHistory, as_of: NaiveDate) -> CustomerMetrics {
        let total_revenue: f64 = history.invoices.iter().map(|i| i.total_amount).sum();
        let count = history.invoices.len();
        let avg_order_value = if count > 0 {
            total_revenue / count as f64
        } else {
            0.0
        };

        let mut purchase_dates: Vec<NaiveDate> =
            history.invoices.iter().map(|i| i.issue_date).collect();
        purchase_dates.sort();

        let days_since_last_purchase = purchase_dates
            .last()
            .map(|d| (as_of - *d).num_days())
            .unwrap_or(NEVER_PURCHASED_DAYS);
        let days_since_first_purchase = purchase_dates
            .first()
            .map(|d| (as_of - *d).num_days())
            .unwrap_or(NEVER_PURCHASED_DAYS);

        let contact_frequency = if history.contacts.is_empty() {
            0.0
        } else {
            let first_touch = history
                .contacts
                .iter()
                .map(|c| c.date)
                .chain(purchase_dates.first().copied())
                .min()
                .unwrap();
            let tenure_days = (as_of - first_touch).num_days().max(1) as f64;
            history.contacts.len() as f64 * 30.0 / tenure_days
        };

        CustomerMetrics {
            total_revenue,
            avg_order_value,
            purchase_frequency: count as f64,
            days_since_last_purchase,
            days_since_first_purchase,
            contact_frequency,
        }
    }

    /// Additive churn score, capped at 1.0. The recency rules are mutually
    /// exclusive (`else if`); the purchase-count rules are not, so a
    /// single-purchase customer collects both.
    fn churn_probability(metrics: &CustomerMetrics, history: &CustomerHistory) -> f64 {
        let mut score: f64 = 0.0;
        let purchases = history.invoices.len();

        if metrics.days_since_last_purchase > 180 {
            score += 0.4;
        } else if metrics.days_since_last_purchase > 90 {
            score += 0.2;
        }

        if purchases == 1 {
            score += 0.3;
        }
        if purchases < 3 {
            score += 0.1;
        }
        if metrics.avg_order_value < 1_000.0 {
            score += 0.2;
        }
        if history.contacts.is_empty() {
            score += 0.1;
        }

        score.min(1.0)
    }

    /// First matching rule wins, evaluated top to bottom.
    fn value_segment(metrics: &CustomerMetrics) -> ValueSegment {
        let revenue = metrics.total_revenue;
        let frequency = metrics.purchase_frequency;

        if revenue > 50_000.0 && frequency > 10.0 {
            ValueSegment::Champion
        } else if revenue > 25_000.0 && frequency > 5.0 {
            ValueSegment::LoyalCustomer
        } else if revenue > 10_000.0 {
            ValueSegment::PotentialLoyalist
        } else if frequency > 3.0 {
            ValueSegment::NewCustomer
        } else {
            ValueSegment::AtRisk
        }
    }

    fn next_purchase(
        history: &CustomerHistory,
        metrics: &CustomerMetrics,
        as_of: NaiveDate,
    ) -> NextPurchaseEstimate {
        if history.invoices.len() < 2 {
            return NextPurchaseEstimate {
                date: as_of + Duration::days(FALLBACK_NEXT_PURCHASE_DAYS),
                amount: FALLBACK_NEXT_PURCHASE_AMOUNT,
                confidence: FALLBACK_NEXT_PURCHASE_CONFIDENCE,
            };
        }

        let mut dates: Vec<NaiveDate> = history.invoices.iter().map(|i| i.issue_date).collect();
        dates.sort();

        let intervals: Vec<i64> = dates
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_days())
            .collect();
        let mean_interval =
            intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;

        NextPurchaseEstimate {
            date: *dates.last().unwrap() + Duration::days(mean_interval.round() as i64),
            amount: metrics.avg_order_value,
            confidence: (intervals.len() as f64 / 10.0).min(0.9),
        }
    }

    /// Fixed, ordered candidate list gated by churn probability and segment;
    /// truncated to four so the caller always gets a short action list.
    fn recommendations(
        churn: f64,
        segment: ValueSegment,
        metrics: &CustomerMetrics,
        history: &CustomerHistory,
    ) -> Vec<String> {
        let mut actions = Vec::new();

        if churn > 0.7 {
            actions.push("Schedule an immediate account review call".to_string());
        }
        if churn > 0.4 {
            actions.push("Offer a time-limited loyalty discount on the next order".to_string());
        }
        if segment == ValueSegment::AtRisk {
            actions.push("Enroll the customer in the win-back campaign".to_string());
        }
        if metrics.days_since_last_purchase > 90 {
            actions.push("Send a re-engagement email highlighting recent updates".to_string());
        }
        if metrics.avg_order_value < 1_000.0 {
            actions.push("Propose a bundled upsell to lift order value".to_string());
        }
        if history.contacts.is_empty() {
            actions.push("Establish a regular check-in cadence".to_string());
        }
        if segment == ValueSegment::Champion {
            actions.push("Invite the customer to the referral program".to_string());
        }

        actions.truncate(4);
        actions
    }
}
