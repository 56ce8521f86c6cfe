//! # Financial Insight Engine
//!
//! Predictive financial analytics over historical transactional data:
//! trend-based forecasting, Monte Carlo cash-flow simulation, scenario
//! generation, rule-based risk scoring, RFM-style customer behavior
//! analysis, and a keyword router that answers free-text financial
//! questions with those primitives.
//!
//! ## Core Concepts
//!
//! - **Aggregation**: raw transactions become time-bucketed series; gaps are
//!   never zero-filled.
//! - **Trend forecasting**: deterministic least-squares extrapolation with a
//!   residual-variance confidence.
//! - **Monte Carlo simulation**: bounded-uniform random walks around the
//!   historical mean, layered with known future cash events, reported as
//!   p10/p50/p90 bands.
//! - **Risk scoring**: additive rule tables mapped to severity tiers, with
//!   collaborator-generated mitigation prose that degrades to a static
//!   fallback.
//! - **Routing**: free-text questions resolve to a fixed intent set by
//!   ordered keyword matching and never propagate errors to the caller.
//!
//! The engine holds no mutable state: every public entry point is a pure
//! function of its inputs (plus an injected random source for simulation)
//! and may be called concurrently. Durable data lives behind the
//! [`store::FinanceDataReader`] collaborator; results are disposable value
//! objects.
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_insight_engine::*;
//! use std::sync::Arc;
//!
//! let reader: Arc<dyn FinanceDataReader> = Arc::new(MyStoreReader::connect()?);
//! let router = QueryIntentRouter::new(reader, Arc::new(StaticAdvisor));
//!
//! let result = router
//!     .route("tenant-1", "What is our revenue this quarter?", today)
//!     .await;
//! assert_eq!(result.intent, "revenue_analysis");
//! ```

pub mod advisory;
pub mod aggregation;
pub mod behavior;
pub mod error;
pub mod risk;
pub mod router;
pub mod scenario;
pub mod schema;
pub mod simulation;
pub mod store;
pub mod trend;
pub mod utils;

#[cfg(feature = "gemini")]
pub mod llm;

pub use advisory::{StaticAdvisor, TextGenerator, FALLBACK_MITIGATION};
pub use aggregation::HistoricalAggregator;
pub use behavior::CustomerBehaviorScorer;
pub use error::{EngineError, Result};
pub use risk::{severity_for_score, LiquidityRatios, RiskScorer};
pub use router::{classify_intent, QueryIntent, QueryIntentRouter};
pub use scenario::ScenarioGenerator;
pub use schema::*;
pub use simulation::{MonteCarloSimulator, COLLECTION_RATE, DEFAULT_TRIALS, MIN_TRIALS};
pub use store::{Artifact, DateRange, FinanceDataReader, InvoiceFilter, ResultSink};
pub use trend::{TrendForecaster, MIN_HISTORY_POINTS};

#[cfg(feature = "gemini")]
pub use llm::GeminiAdvisor;
