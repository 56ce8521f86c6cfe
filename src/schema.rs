use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Granularity of an aggregated time series bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Day,
    Month,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum TransactionKind {
    #[schemars(description = "Money coming into the business (sales, funding, interest)")]
    Income,

    #[schemars(description = "Money leaving the business (purchases, payroll, rent)")]
    Expense,
}

/// One raw ledger entry as delivered by the data-store collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub kind: TransactionKind,
}

/// One aggregated bucket of a time series. Period keys are ISO formatted
/// (`YYYY-MM-DD` for daily, `YYYY-MM` for monthly) so lexicographic order is
/// chronological order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TimeSeriesPoint {
    pub period: String,
    pub value: f64,
}

/// A forward-looking point estimate produced by the trend forecaster or the
/// Monte Carlo simulator. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Forecast {
    #[schemars(description = "The future date this prediction refers to")]
    pub target_date: NaiveDate,

    #[schemars(description = "Predicted value, never negative")]
    pub predicted_value: f64,

    #[schemars(description = "Model confidence in [0, 1]")]
    pub confidence: f64,

    #[schemars(
        description = "Model internals retained for auditability (e.g. slope/intercept for trend fits, percentile bands for simulations)"
    )]
    pub features: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum ScenarioTier {
    Optimistic,
    #[serde(rename = "Most Likely")]
    MostLikely,
    Pessimistic,
}

impl ScenarioTier {
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioTier::Optimistic => "Optimistic",
            ScenarioTier::MostLikely => "Most Likely",
            ScenarioTier::Pessimistic => "Pessimistic",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioImpact {
    Positive,
    Negative,
    Neutral,
}

/// One weighted alternative outcome derived from a point forecast. A forecast
/// always expands to exactly three scenarios whose probabilities sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Scenario {
    pub name: ScenarioTier,
    pub probability: f64,
    pub predicted_value: f64,
    pub impact: ScenarioImpact,

    #[schemars(
        description = "Static per-tier planning assumptions (growth/retention/acquisition rates). These are fixed constants, not statistically fitted."
    )]
    pub assumptions: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskType {
    CreditRisk,
    LiquidityRisk,
}

impl RiskType {
    pub fn label(&self) -> &'static str {
        match self {
            RiskType::CreditRisk => "credit risk",
            RiskType::LiquidityRisk => "liquidity risk",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            RiskSeverity::Low => "LOW",
            RiskSeverity::Medium => "MEDIUM",
            RiskSeverity::High => "HIGH",
            RiskSeverity::Critical => "CRITICAL",
        }
    }
}

/// A point-in-time risk evaluation. Recomputed on demand and replaced
/// wholesale, never partially updated.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RiskAssessment {
    pub risk_type: RiskType,
    pub severity: RiskSeverity,

    #[schemars(description = "Likelihood of the risk materializing, capped at 0.95")]
    pub probability: f64,

    #[schemars(description = "Monetary exposure if the risk materializes")]
    pub impact: f64,

    #[schemars(description = "Additive rule score; intentionally not clamped to 100")]
    pub risk_score: f64,

    #[schemars(description = "The raw indicator values the rules were evaluated against")]
    pub indicators: BTreeMap<String, f64>,

    #[schemars(description = "Advisory prose from the text-generation collaborator, or a static fallback")]
    pub mitigation: String,

    pub review_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InvoiceRecord {
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: f64,
    pub status: InvoiceStatus,
    pub customer_id: String,

    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

impl InvoiceRecord {
    /// Unpaid and past its due date as of the given day.
    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.paid_date.is_none()
            && self.status != InvoiceStatus::Paid
            && self.status != InvoiceStatus::Cancelled
            && self.due_date < as_of
    }

    pub fn is_outstanding(&self) -> bool {
        matches!(self.status, InvoiceStatus::Sent | InvoiceStatus::Overdue)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BudgetRecord {
    pub name: String,
    pub category: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub allocated: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum CashEventSource {
    #[schemars(
        description = "An open receivable; subject to the historical collection rate when simulated"
    )]
    Invoice,

    #[schemars(description = "A confirmed cash movement taken at face value")]
    Committed,
}

/// A known future cash movement fed into the Monte Carlo simulator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CashEvent {
    pub date: NaiveDate,
    pub amount: f64,
    pub source: CashEventSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContactEvent {
    pub date: NaiveDate,
    pub channel: String,
}

/// Everything the behavior scorer needs about one customer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CustomerHistory {
    pub customer_id: String,
    pub invoices: Vec<InvoiceRecord>,
    pub contacts: Vec<ContactEvent>,
}

/// Recency/frequency/monetary metrics derived from a customer's history.
/// Purely computed, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CustomerMetrics {
    pub total_revenue: f64,
    pub avg_order_value: f64,

    #[schemars(description = "Lifetime purchase count")]
    pub purchase_frequency: f64,

    #[schemars(description = "999 when the customer has never purchased")]
    pub days_since_last_purchase: i64,

    #[schemars(description = "999 when the customer has never purchased")]
    pub days_since_first_purchase: i64,

    #[schemars(description = "Contact events per 30 days of tenure")]
    pub contact_frequency: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum ValueSegment {
    Champion,
    #[serde(rename = "Loyal Customer")]
    LoyalCustomer,
    #[serde(rename = "Potential Loyalist")]
    PotentialLoyalist,
    #[serde(rename = "New Customer")]
    NewCustomer,
    #[serde(rename = "At Risk")]
    AtRisk,
}

impl ValueSegment {
    pub fn label(&self) -> &'static str {
        match self {
            ValueSegment::Champion => "Champion",
            ValueSegment::LoyalCustomer => "Loyal Customer",
            ValueSegment::PotentialLoyalist => "Potential Loyalist",
            ValueSegment::NewCustomer => "New Customer",
            ValueSegment::AtRisk => "At Risk",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NextPurchaseEstimate {
    pub date: NaiveDate,
    pub amount: f64,
    pub confidence: f64,
}

/// Churn analysis output for one customer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChurnResult {
    pub customer_id: String,

    #[schemars(description = "Probability the customer churns, in [0, 1]")]
    pub churn_probability: f64,

    pub value_segment: ValueSegment,
    pub metrics: CustomerMetrics,
    pub next_purchase: NextPurchaseEstimate,

    #[schemars(description = "At most four actions, ordered by urgency")]
    pub recommended_actions: Vec<String>,
}

/// Outcome of routing one free-text financial question.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryResult {
    pub query: String,

    #[schemars(description = "Resolved intent key, e.g. `revenue_analysis`")]
    pub intent: String,

    #[schemars(description = "Summary text plus structured data, or a structured error payload")]
    pub response: serde_json::Value,

    pub processing_time_ms: u64,
    pub is_successful: bool,
}

impl QueryResult {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(QueryResult)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(
            serde_json::to_string(&RiskType::CreditRisk).unwrap(),
            "\"CREDIT_RISK\""
        );
        assert_eq!(
            serde_json::to_string(&RiskSeverity::Critical).unwrap(),
            "\"CRITICAL\""
        );
        assert_eq!(
            serde_json::to_string(&ScenarioTier::MostLikely).unwrap(),
            "\"Most Likely\""
        );
        assert_eq!(
            serde_json::to_string(&ScenarioImpact::Positive).unwrap(),
            "\"POSITIVE\""
        );
        assert_eq!(
            serde_json::to_string(&ValueSegment::LoyalCustomer).unwrap(),
            "\"Loyal Customer\""
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(RiskSeverity::Low < RiskSeverity::Medium);
        assert!(RiskSeverity::Medium < RiskSeverity::High);
        assert!(RiskSeverity::High < RiskSeverity::Critical);
    }

    #[test]
    fn test_overdue_detection() {
        let invoice = InvoiceRecord {
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            total_amount: 1200.0,
            status: InvoiceStatus::Sent,
            customer_id: "cust-1".to_string(),
            paid_date: None,
        };

        assert!(invoice.is_overdue(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(!invoice.is_overdue(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));

        let paid = InvoiceRecord {
            status: InvoiceStatus::Paid,
            paid_date: Some(NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()),
            ..invoice
        };
        assert!(!paid.is_overdue(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    }

    #[test]
    fn test_query_result_schema_generation() {
        let schema_json = QueryResult::schema_as_json().unwrap();
        assert!(schema_json.contains("intent"));
        assert!(schema_json.contains("processing_time_ms"));
        assert!(schema_json.contains("is_successful"));
    }

    #[test]
    fn test_forecast_round_trip() {
        let mut features = BTreeMap::new();
        features.insert("slope".to_string(), 10.0);

        let forecast = Forecast {
            target_date: NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
            predicted_value: 220.0,
            confidence: 0.95,
            features,
        };

        let json = serde_json::to_string(&forecast).unwrap();
        let back: Forecast = serde_json::from_str(&json).unwrap();
        assert_eq!(back.predicted_value, 220.0);
        assert_eq!(back.features.get("slope"), Some(&10.0));
    }
}
