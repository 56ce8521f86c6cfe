use crate::advisory::{mitigation_prompt, TextGenerator, FALLBACK_MITIGATION};
use crate::schema::{InvoiceRecord, RiskAssessment, RiskSeverity, RiskType};
use chrono::{Days, NaiveDate};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Credit risk is re-reviewed monthly; liquidity decays faster and gets a
/// two-week cycle.
pub const CREDIT_REVIEW_DAYS: u64 = 30;
pub const LIQUIDITY_REVIEW_DAYS: u64 = 14;

/// One additive scoring rule, evaluated against derived indicators. Keeping
/// the rules as data separates the tables from the traversal and lets tests
/// target each independently.
#[derive(Debug, Clone)]
pub struct RiskRule {
    pub indicator: &'static str,
    pub points: f64,
    pub triggered: bool,
}

impl RiskRule {
    fn new(indicator: &'static str, triggered: bool, points: f64) -> Self {
        Self {
            indicator,
            points,
            triggered,
        }
    }
}

fn rule_score(rules: &[RiskRule]) -> f64 {
    rules
        .iter()
        .filter(|r| r.triggered)
        .map(|r| r.points)
        .sum()
}

/// Severity tiers share their boundaries between credit and liquidity risk.
/// The comparisons are strict: a score of exactly 70 is HIGH, 71 is CRITICAL.
pub fn severity_for_score(score: f64) -> RiskSeverity {
    if score > 70.0 {
        RiskSeverity::Critical
    } else if score > 50.0 {
        RiskSeverity::High
    } else if score > 30.0 {
        RiskSeverity::Medium
    } else {
        RiskSeverity::Low
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreditIndicators {
    /// Overdue outstanding amount over total outstanding amount.
    pub overdue_ratio: f64,
    /// Mean issue-to-payment interval over the paid history, in days.
    pub avg_payment_days: f64,
    pub total_outstanding: f64,
    pub distinct_customers: usize,
}

pub fn derive_credit_indicators(
    outstanding: &[InvoiceRecord],
    payment_history: &[InvoiceRecord],
    as_of: NaiveDate,
) -> CreditIndicators {
    let total_outstanding: f64 = outstanding.iter().map(|i| i.total_amount).sum();
    let overdue_amount: f64 = outstanding
        .iter()
        .filter(|i| i.is_overdue(as_of))
        .map(|i| i.total_amount)
        .sum();

    let overdue_ratio = if total_outstanding > 0.0 {
        overdue_amount / total_outstanding
    } else {
        0.0
    };

    let payment_days: Vec<i64> = payment_history
        .iter()
        .filter_map(|i| i.paid_date.map(|paid| (paid - i.issue_date).num_days()))
        .collect();
    let avg_payment_days = if payment_days.is_empty() {
        0.0
    } else {
        payment_days.iter().sum::<i64>() as f64 / payment_days.len() as f64
    };

    let distinct_customers = outstanding
        .iter()
        .map(|i| i.customer_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    CreditIndicators {
        overdue_ratio,
        avg_payment_days,
        total_outstanding,
        distinct_customers,
    }
}

pub fn credit_rules(ind: &CreditIndicators) -> Vec<RiskRule> {
    vec![
        RiskRule::new("overdue_ratio", ind.overdue_ratio > 0.3, 40.0),
        RiskRule::new("avg_payment_days", ind.avg_payment_days > 45.0, 30.0),
        RiskRule::new("total_outstanding", ind.total_outstanding > 100_000.0, 20.0),
        RiskRule::new("customer_concentration", ind.distinct_customers < 5, 10.0),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidityRatios {
    pub current_ratio: f64,
    pub quick_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityIndicators {
    pub current_cash: f64,
    pub projected_outflows_90d: f64,
    /// Daily burn: projected 90-day outflows spread evenly.
    pub cash_burn_rate: f64,
    pub days_of_liquidity: f64,
    pub current_ratio: f64,
}

pub fn derive_liquidity_indicators(
    current_cash: f64,
    projected_outflows_90d: f64,
    ratios: &LiquidityRatios,
) -> LiquidityIndicators {
    let cash_burn_rate = projected_outflows_90d / 90.0;
    let days_of_liquidity = current_cash / cash_burn_rate.max(1.0);

    LiquidityIndicators {
        current_cash,
        projected_outflows_90d,
        cash_burn_rate,
        days_of_liquidity,
        current_ratio: ratios.current_ratio,
    }
}

/// The two runway thresholds are not exclusive: a runway under 30 days
/// also satisfies the under-60 rule, so both fire together. That is the
/// shipped scoring behavior; see DESIGN.md for the product-owner flag.
pub fn liquidity_rules(ind: &LiquidityIndicators) -> Vec<RiskRule> {
    vec![
        RiskRule::new("days_of_liquidity_under_30", ind.days_of_liquidity < 30.0, 50.0),
        RiskRule::new("days_of_liquidity_under_60", ind.days_of_liquidity < 60.0, 30.0),
        RiskRule::new("current_ratio", ind.current_ratio < 1.2, 20.0),
    ]
}

/// Weighted rule-based risk scoring with collaborator-generated mitigation
/// prose. Assessments are produced fresh per invocation and replaced
/// wholesale; nothing here is cached or mutated.
pub struct RiskScorer {
    advisor: Arc<dyn TextGenerator>,
}

impl RiskScorer {
    pub fn new(advisor: Arc<dyn TextGenerator>) -> Self {
        Self { advisor }
    }

    pub async fn assess_credit_risk(
        &self,
        outstanding: &[InvoiceRecord],
        payment_history: &[InvoiceRecord],
        as_of: NaiveDate,
    ) -> RiskAssessment {
        let ind = derive_credit_indicators(outstanding, payment_history, as_of);
        let rules = credit_rules(&ind);
        let risk_score = rule_score(&rules);

        debug!(
            "Credit rules triggered: {:?}",
            rules
                .iter()
                .filter(|r| r.triggered)
                .map(|r| r.indicator)
                .collect::<Vec<_>>()
        );

        let mut indicators = BTreeMap::new();
        indicators.insert("overdue_ratio".to_string(), ind.overdue_ratio);
        indicators.insert("avg_payment_days".to_string(), ind.avg_payment_days);
        indicators.insert("total_outstanding".to_string(), ind.total_outstanding);
        indicators.insert(
            "distinct_customers".to_string(),
            ind.distinct_customers as f64,
        );

        self.finish_assessment(
            RiskType::CreditRisk,
            risk_score,
            ind.total_outstanding,
            indicators,
            as_of + Days::new(CREDIT_REVIEW_DAYS),
        )
        .await
    }

    pub async fn assess_liquidity_risk(
        &self,
        current_cash: f64,
        projected_outflows_90d: f64,
        ratios: &LiquidityRatios,
        as_of: NaiveDate,
    ) -> RiskAssessment {
        let ind = derive_liquidity_indicators(current_cash, projected_outflows_90d, ratios);
        let rules = liquidity_rules(&ind);
        let risk_score = rule_score(&rules);

        debug!(
            "Liquidity: {:.1} days of runway at {:.2}/day burn",
            ind.days_of_liquidity, ind.cash_burn_rate
        );

        let mut indicators = BTreeMap::new();
        indicators.insert("current_cash".to_string(), ind.current_cash);
        indicators.insert(
            "projected_outflows_90d".to_string(),
            ind.projected_outflows_90d,
        );
        indicators.insert("cash_burn_rate".to_string(), ind.cash_burn_rate);
        indicators.insert("days_of_liquidity".to_string(), ind.days_of_liquidity);
        indicators.insert("current_ratio".to_string(), ind.current_ratio);

        self.finish_assessment(
            RiskType::LiquidityRisk,
            risk_score,
            projected_outflows_90d,
            indicators,
            as_of + Days::new(LIQUIDITY_REVIEW_DAYS),
        )
        .await
    }

    async fn finish_assessment(
        &self,
        risk_type: RiskType,
        risk_score: f64,
        impact: f64,
        indicators: BTreeMap<String, f64>,
        review_date: NaiveDate,
    ) -> RiskAssessment {
        let severity = severity_for_score(risk_score);
        // The score itself stays unclamped for transparency; only the
        // probability is capped.
        let probability = (risk_score / 100.0).min(0.95);

        let prompt = mitigation_prompt(risk_type, &indicators);
        let mitigation = match self.advisor.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Mitigation text generation failed, using fallback: {}", e);
                FALLBACK_MITIGATION.to_string()
            }
        };

        info!(
            "{:?} assessed: score={:.0}, severity={:?}, review on {}",
            risk_type, risk_score, severity, review_date
        );

        RiskAssessment {
            risk_type,
            severity,
            probability,
            impact,
            risk_score,
            indicators,
            mitigation,
            review_date,
        }
    }
}
