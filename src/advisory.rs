use crate::error::Result;
use crate::schema::RiskType;
use futures::future::BoxFuture;
use std::collections::BTreeMap;

/// Canned advisory text used whenever the text-generation collaborator is
/// unavailable, times out, or errors. Risk assessment must never fail on
/// the prose path.
pub const FALLBACK_MITIGATION: &str = "Review the flagged indicators with your finance team. \
Prioritize collection of overdue balances, tighten payment terms for repeat late payers, and \
maintain a cash reserve covering at least 60 days of projected outflows.";

/// Free-text completion collaborator. Implementations own their transport
/// and timeout policy; the engine only sees a prompt-in, text-out surface.
pub trait TextGenerator: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Always answers with the fallback text. The default advisor for
/// deployments without an LLM collaborator, and the degradation target for
/// deployments with one.
pub struct StaticAdvisor;

impl TextGenerator for StaticAdvisor {
    fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async { Ok(FALLBACK_MITIGATION.to_string()) })
    }
}

/// Builds the mitigation-advice prompt from a risk type and its indicator
/// values. The indicator map is rendered as a bullet list so the same
/// template serves both risk types.
pub fn mitigation_prompt(risk_type: RiskType, indicators: &BTreeMap<String, f64>) -> String {
    let mut indicator_lines = String::new();
    for (name, value) in indicators {
        indicator_lines.push_str(&format!("- {}: {:.2}\n", name, value));
    }

    format!(
        r#"You are a financial risk advisor for a small business.

An automated assessment flagged elevated {risk} based on these indicators:
{indicators}
Write 2-3 sentences of concrete, actionable mitigation advice for the business owner.
Plain prose only, no headings or bullet points."#,
        risk = risk_type.label(),
        indicators = indicator_lines,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_advisor_returns_fallback() {
        let advisor = StaticAdvisor;
        let text = advisor.complete("anything").await.unwrap();
        assert_eq!(text, FALLBACK_MITIGATION);
    }

    #[test]
    fn test_prompt_includes_risk_type_and_indicators() {
        let mut indicators = BTreeMap::new();
        indicators.insert("overdue_ratio".to_string(), 0.42);
        indicators.insert("total_outstanding".to_string(), 120_000.0);

        let prompt = mitigation_prompt(RiskType::CreditRisk, &indicators);

        assert!(prompt.contains("credit risk"));
        assert!(prompt.contains("overdue_ratio: 0.42"));
        assert!(prompt.contains("total_outstanding: 120000.00"));
    }
}
