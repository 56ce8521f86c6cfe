use crate::advisory::TextGenerator;
use crate::aggregation::HistoricalAggregator;
use crate::error::{EngineError, Result};
use crate::risk::RiskScorer;
use crate::scenario::ScenarioGenerator;
use crate::schema::{
    Bucket, CashEvent, CashEventSource, QueryResult, TransactionKind,
};
use crate::simulation::{MonteCarloSimulator, DEFAULT_TRIALS};
use crate::store::{Artifact, DateRange, FinanceDataReader, InvoiceFilter, ResultSink};
use crate::trend::TrendForecaster;
use chrono::{Duration, NaiveDate};
use log::{info, warn};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    RevenueAnalysis,
    ExpenseAnalysis,
    CashFlowAnalysis,
    BudgetAnalysis,
    FinancialForecast,
    RiskAssessment,
    General,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::RevenueAnalysis => "revenue_analysis",
            QueryIntent::ExpenseAnalysis => "expense_analysis",
            QueryIntent::CashFlowAnalysis => "cash_flow_analysis",
            QueryIntent::BudgetAnalysis => "budget_analysis",
            QueryIntent::FinancialForecast => "financial_forecast",
            QueryIntent::RiskAssessment => "risk_assessment",
            QueryIntent::General => "general_query",
        }
    }
}

/// Keyword lists per intent, in priority order. A query matching several
/// lists resolves to the earliest one, so ambiguous questions are settled
/// deterministically ("forecast our revenue" is a revenue question).
const INTENT_KEYWORDS: [(QueryIntent, &[&str]); 6] = [
    (
        QueryIntent::RevenueAnalysis,
        &["revenue", "sales", "income", "earnings", "turnover"],
    ),
    (
        QueryIntent::ExpenseAnalysis,
        &["expense", "spending", "cost", "expenditure", "overhead"],
    ),
    (
        QueryIntent::CashFlowAnalysis,
        &["cash flow", "cashflow", "cash position", "runway", "working capital"],
    ),
    (
        QueryIntent::BudgetAnalysis,
        &["budget", "allocation", "variance", "utilization"],
    ),
    (
        QueryIntent::FinancialForecast,
        &["forecast", "predict", "projection", "outlook"],
    ),
    (
        QueryIntent::RiskAssessment,
        &["risk", "exposure", "overdue", "liquidity", "credit"],
    ),
];

/// Case-insensitive substring containment against the ordered keyword
/// table; first match wins, no match falls through to the general intent.
pub fn classify_intent(query: &str) -> QueryIntent {
    let lowered = query.to_lowercase();

    for (intent, keywords) in INTENT_KEYWORDS.iter() {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return *intent;
        }
    }

    QueryIntent::General
}

/// Answers free-text financial questions by dispatching to the forecasting
/// and scoring primitives. This is a boundary that never throws: failures
/// become `is_successful = false` with a structured error payload, and the
/// wall-clock time is recorded either way.
pub struct QueryIntentRouter {
    reader: Arc<dyn FinanceDataReader>,
    risk_scorer: RiskScorer,
    sink: Option<Arc<dyn ResultSink>>,
}

impl QueryIntentRouter {
    pub fn new(reader: Arc<dyn FinanceDataReader>, advisor: Arc<dyn TextGenerator>) -> Self {
        Self {
            reader,
            risk_scorer: RiskScorer::new(advisor),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub async fn route(&self, tenant_id: &str, query: &str, as_of: NaiveDate) -> QueryResult {
        let started = Instant::now();
        let intent = classify_intent(query);
        info!("Routing query as {}: {:?}", intent.as_str(), query);

        let outcome = match intent {
            QueryIntent::RevenueAnalysis => self.revenue_analysis(tenant_id, as_of).await,
            QueryIntent::ExpenseAnalysis => self.expense_analysis(tenant_id, as_of).await,
            QueryIntent::CashFlowAnalysis => self.cash_flow_analysis(tenant_id, as_of).await,
            QueryIntent::BudgetAnalysis => self.budget_analysis(tenant_id, as_of).await,
            QueryIntent::FinancialForecast => self.financial_forecast(tenant_id, as_of).await,
            QueryIntent::RiskAssessment => self.risk_assessment(tenant_id, as_of).await,
            QueryIntent::General => self.general_overview(tenant_id, as_of).await,
        };

        let processing_time_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(response) => QueryResult {
                query: query.to_string(),
                intent: intent.as_str().to_string(),
                response,
                processing_time_ms,
                is_successful: true,
            },
            Err(e) => {
                warn!("Query handling failed for {}: {}", intent.as_str(), e);
                QueryResult {
                    query: query.to_string(),
                    intent: intent.as_str().to_string(),
                    response: json!({
                        "error": {
                            "kind": error_kind(&e),
                            "message": e.to_string(),
                        }
                    }),
                    processing_time_ms,
                    is_successful: false,
                }
            }
        };

        self.persist(Artifact::QueryLog(result.clone())).await;

        result
    }

    /// Fire-and-forget: a sink failure is logged, never propagated.
    async fn persist(&self, artifact: Artifact) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.persist(artifact).await {
                warn!("Result sink rejected artifact: {}", e);
            }
        }
    }

    async fn revenue_analysis(&self, tenant_id: &str, as_of: NaiveDate) -> Result<Value> {
        let range = trailing_window(as_of, 730);
        let records = self
            .reader
            .transactions(tenant_id, range, Some(TransactionKind::Income))
            .await?;

        let series =
            HistoricalAggregator::aggregate_kind(&records, TransactionKind::Income, Bucket::Month);
        let total: f64 = series.iter().map(|p| p.value).sum();

        let forecast = TrendForecaster::forecast(&series, series.len() as i64)?;
        let scenarios = ScenarioGenerator::expand(&forecast);
        self.persist(Artifact::Forecast(forecast.clone())).await;

        let summary = format!(
            "Revenue across the last {} months totals {:.2}. Next month projects to {:.2} at {:.0}% confidence.",
            series.len(),
            total,
            forecast.predicted_value,
            forecast.confidence * 100.0
        );

        Ok(json!({
            "summary": summary,
            "total": total,
            "series": series,
            "forecast": forecast,
            "scenarios": scenarios,
        }))
    }

    async fn expense_analysis(&self, tenant_id: &str, as_of: NaiveDate) -> Result<Value> {
        let range = trailing_window(as_of, 730);
        let records = self
            .reader
            .transactions(tenant_id, range, Some(TransactionKind::Expense))
            .await?;

        let series =
            HistoricalAggregator::aggregate_kind(&records, TransactionKind::Expense, Bucket::Month);
        let total: f64 = series.iter().map(|p| p.value).sum();

        let forecast = TrendForecaster::forecast(&series, series.len() as i64)?;

        let categorized = self
            .reader
            .expenses(tenant_id, trailing_window(as_of, 365))
            .await?;
        let mut by_category: std::collections::BTreeMap<String, f64> = Default::default();
        for expense in &categorized {
            *by_category.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
        }
        let mut top_categories: Vec<(String, f64)> = by_category.into_iter().collect();
        top_categories.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        top_categories.truncate(5);

        let summary = format!(
            "Expenses across the last {} months total {:.2}; next month projects to {:.2}.",
            series.len(),
            total,
            forecast.predicted_value
        );

        Ok(json!({
            "summary": summary,
            "total": total,
            "series": series,
            "forecast": forecast,
            "top_categories": top_categories
                .into_iter()
                .map(|(category, amount)| json!({"category": category, "amount": amount}))
                .collect::<Vec<_>>(),
        }))
    }

    async fn cash_flow_analysis(&self, tenant_id: &str, as_of: NaiveDate) -> Result<Value> {
        let range = trailing_window(as_of, 730);
        let records = self.reader.transactions(tenant_id, range, None).await?;
        let series = HistoricalAggregator::aggregate(&records, Bucket::Month);

        let outstanding = self
            .reader
            .invoices(
                tenant_id,
                InvoiceFilter {
                    outstanding_only: true,
                    ..Default::default()
                },
            )
            .await?;
        let inflows: Vec<CashEvent> = outstanding
            .iter()
            .filter(|i| i.is_outstanding())
            .map(|i| CashEvent {
                date: i.due_date,
                amount: i.total_amount,
                source: CashEventSource::Invoice,
            })
            .collect();

        // Scheduled expenses inside the projection window count as committed
        // outflows.
        let target_date = as_of + Duration::days(90);
        let scheduled = self
            .reader
            .expenses(tenant_id, DateRange::new(as_of, target_date))
            .await?;
        let outflows: Vec<CashEvent> = scheduled
            .iter()
            .map(|e| CashEvent {
                date: e.date,
                amount: e.amount,
                source: CashEventSource::Committed,
            })
            .collect();

        let mut rng = rand::thread_rng();
        let forecast = MonteCarloSimulator::simulate(
            &series,
            &inflows,
            &outflows,
            target_date,
            DEFAULT_TRIALS,
            &mut rng,
        )?;
        self.persist(Artifact::Forecast(forecast.clone())).await;

        let summary = format!(
            "Projected cash position on {} is {:.2}, with an 80% band of {:.2} to {:.2}.",
            target_date,
            forecast.predicted_value,
            forecast.features["p10"],
            forecast.features["p90"]
        );

        Ok(json!({
            "summary": summary,
            "forecast": forecast,
            "known_inflows": inflows.len(),
            "known_outflows": outflows.len(),
        }))
    }

    async fn budget_analysis(&self, tenant_id: &str, as_of: NaiveDate) -> Result<Value> {
        let range = trailing_window(as_of, 365);
        let budgets = self.reader.budgets(tenant_id, range).await?;
        let expenses = self.reader.expenses(tenant_id, range).await?;

        let mut lines = Vec::new();
        let mut over_count = 0usize;
        for budget in &budgets {
            let actual: f64 = expenses
                .iter()
                .filter(|e| {
                    e.category == budget.category
                        && e.date >= budget.period_start
                        && e.date <= budget.period_end
                })
                .map(|e| e.amount)
                .sum();
            let utilization = if budget.allocated > 0.0 {
                actual / budget.allocated
            } else {
                0.0
            };
            if actual > budget.allocated {
                over_count += 1;
            }
            lines.push(json!({
                "name": budget.name,
                "category": budget.category,
                "allocated": budget.allocated,
                "actual": actual,
                "utilization": utilization,
                "over_budget": actual > budget.allocated,
            }));
        }

        let summary = format!(
            "{} of {} budgets are running over allocation.",
            over_count,
            budgets.len()
        );

        Ok(json!({
            "summary": summary,
            "budgets": lines,
        }))
    }

    async fn financial_forecast(&self, tenant_id: &str, as_of: NaiveDate) -> Result<Value> {
        let range = trailing_window(as_of, 730);
        let records = self.reader.transactions(tenant_id, range, None).await?;
        let series = HistoricalAggregator::aggregate(&records, Bucket::Month);

        // Project the next three months off the same fit.
        let n = series.len() as i64;
        let mut projections = Vec::new();
        for offset in 0..3 {
            projections.push(TrendForecaster::forecast(&series, n + offset)?);
        }
        let scenarios = ScenarioGenerator::expand(&projections[0]);
        self.persist(Artifact::Forecast(projections[0].clone())).await;

        let summary = format!(
            "Net position projects to {:.2} next month and {:.2} in three months ({:.0}% confidence).",
            projections[0].predicted_value,
            projections[2].predicted_value,
            projections[0].confidence * 100.0
        );

        Ok(json!({
            "summary": summary,
            "projections": projections,
            "scenarios": scenarios,
        }))
    }

    async fn risk_assessment(&self, tenant_id: &str, as_of: NaiveDate) -> Result<Value> {
        let invoices = self
            .reader
            .invoices(tenant_id, InvoiceFilter::default())
            .await?;

        let outstanding: Vec<_> = invoices
            .iter()
            .filter(|i| i.is_outstanding())
            .cloned()
            .collect();
        let paid: Vec<_> = invoices
            .iter()
            .filter(|i| i.paid_date.is_some())
            .cloned()
            .collect();

        let assessment = self
            .risk_scorer
            .assess_credit_risk(&outstanding, &paid, as_of)
            .await;
        self.persist(Artifact::Risk(assessment.clone())).await;

        let summary = format!(
            "Credit risk is {} (score {:.0}) across {:.2} outstanding. Review again on {}.",
            assessment.severity.label(),
            assessment.risk_score,
            assessment.impact,
            assessment.review_date
        );

        Ok(json!({
            "summary": summary,
            "assessment": assessment,
        }))
    }

    async fn general_overview(&self, tenant_id: &str, as_of: NaiveDate) -> Result<Value> {
        let range = trailing_window(as_of, 365);
        let records = self.reader.transactions(tenant_id, range, None).await?;

        let income: f64 = records
            .iter()
            .filter(|r| r.kind == TransactionKind::Income)
            .map(|r| r.amount)
            .sum();
        let expenses: f64 = records
            .iter()
            .filter(|r| r.kind == TransactionKind::Expense)
            .map(|r| r.amount)
            .sum();

        let outstanding = self
            .reader
            .invoices(
                tenant_id,
                InvoiceFilter {
                    outstanding_only: true,
                    ..Default::default()
                },
            )
            .await?;
        let receivables: f64 = outstanding
            .iter()
            .filter(|i| i.is_outstanding())
            .map(|i| i.total_amount)
            .sum();

        let summary = format!(
            "Over the last 12 months: income {:.2}, expenses {:.2}, net {:.2}. {:.2} is currently outstanding.",
            income,
            expenses,
            income - expenses,
            receivables
        );

        Ok(json!({
            "summary": summary,
            "income": income,
            "expenses": expenses,
            "net": income - expenses,
            "outstanding_receivables": receivables,
        }))
    }
}

fn trailing_window(as_of: NaiveDate, days: i64) -> DateRange {
    DateRange::new(as_of - Duration::days(days), as_of)
}

fn error_kind(error: &EngineError) -> &'static str {
    match error {
        EngineError::InsufficientHistory { .. } => "insufficient_history",
        EngineError::InvalidSimulationParams(_) => "invalid_simulation_params",
        EngineError::DataFetch(_) => "data_fetch",
        EngineError::TextGeneration(_) => "text_generation",
        EngineError::Serialization(_) => "serialization",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::StaticAdvisor;
    use crate::schema::{InvoiceRecord, InvoiceStatus, TransactionRecord};
    use futures::future::BoxFuture;

    #[derive(Default)]
    struct StubReader {
        transactions: Vec<TransactionRecord>,
        invoices: Vec<InvoiceRecord>,
        expenses: Vec<crate::schema::ExpenseRecord>,
        budgets: Vec<crate::schema::BudgetRecord>,
        fail: bool,
    }

    impl FinanceDataReader for StubReader {
        fn transactions<'a>(
            &'a self,
            _tenant_id: &'a str,
            range: DateRange,
            kind: Option<TransactionKind>,
        ) -> BoxFuture<'a, Result<Vec<TransactionRecord>>> {
            Box::pin(async move {
                if self.fail {
                    return Err(EngineError::DataFetch("store offline".to_string()));
                }
                Ok(self
                    .transactions
                    .iter()
                    .filter(|r| range.contains(r.date) && kind.map_or(true, |k| r.kind == k))
                    .cloned()
                    .collect())
            })
        }

        fn invoices<'a>(
            &'a self,
            _tenant_id: &'a str,
            filter: InvoiceFilter,
        ) -> BoxFuture<'a, Result<Vec<InvoiceRecord>>> {
            Box::pin(async move {
                if self.fail {
                    return Err(EngineError::DataFetch("store offline".to_string()));
                }
                Ok(self
                    .invoices
                    .iter()
                    .filter(|i| !filter.outstanding_only || i.is_outstanding())
                    .cloned()
                    .collect())
            })
        }

        fn expenses<'a>(
            &'a self,
            _tenant_id: &'a str,
            range: DateRange,
        ) -> BoxFuture<'a, Result<Vec<crate::schema::ExpenseRecord>>> {
            Box::pin(async move {
                Ok(self
                    .expenses
                    .iter()
                    .filter(|e| range.contains(e.date))
                    .cloned()
                    .collect())
            })
        }

        fn budgets<'a>(
            &'a self,
            _tenant_id: &'a str,
            _range: DateRange,
        ) -> BoxFuture<'a, Result<Vec<crate::schema::BudgetRecord>>> {
            Box::pin(async move { Ok(self.budgets.clone()) })
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_income(from: NaiveDate, months: u32, base: f64) -> Vec<TransactionRecord> {
        (0..months)
            .map(|i| TransactionRecord {
                date: crate::utils::advance_period_end(from, true, i as i64),
                amount: base + i as f64 * 100.0,
                kind: TransactionKind::Income,
            })
            .collect()
    }

    fn router(reader: StubReader) -> QueryIntentRouter {
        QueryIntentRouter::new(Arc::new(reader), Arc::new(StaticAdvisor))
    }

    #[test]
    fn test_intent_priority_order() {
        assert_eq!(
            classify_intent("What is our revenue this quarter?"),
            QueryIntent::RevenueAnalysis
        );
        // Matches both revenue and forecast keywords; revenue is listed first.
        assert_eq!(
            classify_intent("Forecast our sales for next year"),
            QueryIntent::RevenueAnalysis
        );
        // Matches both expense and budget; expense wins.
        assert_eq!(
            classify_intent("Is our marketing spending within budget?"),
            QueryIntent::ExpenseAnalysis
        );
        assert_eq!(
            classify_intent("How much runway do we have?"),
            QueryIntent::CashFlowAnalysis
        );
        assert_eq!(
            classify_intent("Show budget utilization"),
            QueryIntent::BudgetAnalysis
        );
        assert_eq!(
            classify_intent("Predict next quarter"),
            QueryIntent::FinancialForecast
        );
        assert_eq!(
            classify_intent("Any overdue exposure?"),
            QueryIntent::RiskAssessment
        );
        assert_eq!(classify_intent("Hello there"), QueryIntent::General);
    }

    #[test]
    fn test_intent_matching_is_case_insensitive() {
        assert_eq!(
            classify_intent("SHOW ME THE REVENUE"),
            QueryIntent::RevenueAnalysis
        );
    }

    #[tokio::test]
    async fn test_revenue_route_end_to_end() {
        let reader = StubReader {
            transactions: monthly_income(day(2023, 1, 31), 14, 10_000.0),
            ..Default::default()
        };
        let result = router(reader)
            .route("tenant-1", "What is our revenue this quarter?", day(2024, 3, 15))
            .await;

        assert!(result.is_successful);
        assert_eq!(result.intent, "revenue_analysis");
        assert!(result.response["summary"]
            .as_str()
            .unwrap()
            .contains("Revenue"));
        assert!(result.response["forecast"]["predicted_value"].is_number());
        assert_eq!(result.response["scenarios"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_insufficient_history_becomes_error_payload() {
        let reader = StubReader {
            transactions: monthly_income(day(2024, 1, 31), 3, 10_000.0),
            ..Default::default()
        };
        let result = router(reader)
            .route("tenant-1", "revenue please", day(2024, 3, 15))
            .await;

        assert!(!result.is_successful);
        assert_eq!(
            result.response["error"]["kind"].as_str().unwrap(),
            "insufficient_history"
        );
    }

    #[tokio::test]
    async fn test_data_fetch_failure_never_panics() {
        let reader = StubReader {
            fail: true,
            ..Default::default()
        };
        let result = router(reader)
            .route("tenant-1", "revenue please", day(2024, 3, 15))
            .await;

        assert!(!result.is_successful);
        assert_eq!(result.response["error"]["kind"].as_str().unwrap(), "data_fetch");
        assert_eq!(result.intent, "revenue_analysis");
    }

    #[tokio::test]
    async fn test_general_overview_fallback() {
        let reader = StubReader {
            transactions: monthly_income(day(2023, 6, 30), 10, 5_000.0),
            ..Default::default()
        };
        let result = router(reader)
            .route("tenant-1", "How are we doing?", day(2024, 3, 15))
            .await;

        assert!(result.is_successful);
        assert_eq!(result.intent, "general_query");
        assert!(result.response["net"].is_number());
    }

    #[tokio::test]
    async fn test_risk_route_reports_severity() {
        let invoices = vec![
            InvoiceRecord {
                issue_date: day(2023, 11, 1),
                due_date: day(2023, 12, 1),
                total_amount: 120_000.0,
                status: InvoiceStatus::Sent,
                customer_id: "cust-a".to_string(),
                paid_date: None,
            },
        ];
        let reader = StubReader {
            invoices,
            ..Default::default()
        };
        let result = router(reader)
            .route("tenant-1", "What's our credit risk?", day(2024, 3, 15))
            .await;

        assert!(result.is_successful);
        assert_eq!(result.intent, "risk_assessment");
        // Fully overdue single-customer book over 100k: 40 + 20 + 10.
        assert_eq!(result.response["assessment"]["risk_score"], 70.0);
        assert_eq!(result.response["assessment"]["severity"], "HIGH");
    }
}
