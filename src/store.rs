use crate::error::Result;
use crate::schema::{
    BudgetRecord, ExpenseRecord, Forecast, InvoiceRecord, InvoiceStatus, QueryResult,
    RiskAssessment, TransactionKind, TransactionRecord,
};
use chrono::NaiveDate;
use futures::future::BoxFuture;

/// Inclusive date window used by every reader call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<String>,
    /// Restrict to invoices still awaiting payment.
    pub outstanding_only: bool,
}

/// Read-only view onto the durable store. The engine never writes through
/// this interface and never retries a failed fetch: a partial retry would
/// feed a corrupted series into trend fitting, so errors surface unchanged
/// as `EngineError::DataFetch`.
pub trait FinanceDataReader: Send + Sync {
    fn transactions<'a>(
        &'a self,
        tenant_id: &'a str,
        range: DateRange,
        kind: Option<TransactionKind>,
    ) -> BoxFuture<'a, Result<Vec<TransactionRecord>>>;

    fn invoices<'a>(
        &'a self,
        tenant_id: &'a str,
        filter: InvoiceFilter,
    ) -> BoxFuture<'a, Result<Vec<InvoiceRecord>>>;

    fn expenses<'a>(
        &'a self,
        tenant_id: &'a str,
        range: DateRange,
    ) -> BoxFuture<'a, Result<Vec<ExpenseRecord>>>;

    fn budgets<'a>(
        &'a self,
        tenant_id: &'a str,
        range: DateRange,
    ) -> BoxFuture<'a, Result<Vec<BudgetRecord>>>;
}

/// Artifact handed to the persistence collaborator.
#[derive(Debug, Clone)]
pub enum Artifact {
    Forecast(Forecast),
    Risk(RiskAssessment),
    QueryLog(QueryResult),
}

/// Fire-and-forget persistence. A sink failure must never fail the
/// computation that produced the artifact; callers log and move on.
pub trait ResultSink: Send + Sync {
    fn persist<'a>(&'a self, artifact: Artifact) -> BoxFuture<'a, Result<()>>;
}
