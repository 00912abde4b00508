//! Outcome emission: map a terminal-state local context through ordered
//! rules to at most one outcome tag. First match wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::json_path::get_value_by_path;

/// `field` is a dotted path into the context map; the string at that
/// path must equal `value` exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionCondition {
    pub field: String,
    pub value: String,
}

/// A rule matches when every condition matches; an empty condition list
/// always matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionRule {
    pub outcome: String,
    #[serde(default)]
    pub conditions: Vec<EmissionCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionConfig {
    #[serde(default)]
    pub rules: Vec<EmissionRule>,
}

/// Evaluate rules in declared order; the first rule whose conditions all
/// match yields its outcome tag. No match emits nothing. Pure function.
pub fn evaluate(rules: &[EmissionRule], context: &Value) -> Option<String> {
    rules
        .iter()
        .find(|rule| rule.conditions.iter().all(|c| condition_matches(c, context)))
        .map(|rule| rule.outcome.clone())
}

fn condition_matches(condition: &EmissionCondition, context: &Value) -> bool {
    match get_value_by_path(context, &condition.field) {
        Some(Value::String(actual)) => *actual == condition.value,
        // Missing path or a non-string leaf is no match.
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn risk_rules() -> Vec<EmissionRule> {
        serde_json::from_value(json!([
            {"outcome": "npqs:high_risk",
             "conditions": [
                 {"field": "ogaResponse.decision", "value": "MANUAL_REVIEW"},
                 {"field": "submissionResponse.riskLevel", "value": "HIGH"}
             ]},
            {"outcome": "npqs:review",
             "conditions": [{"field": "ogaResponse.decision", "value": "MANUAL_REVIEW"}]}
        ]))
        .unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let context = json!({
            "ogaResponse": {"decision": "MANUAL_REVIEW"},
            "submissionResponse": {"riskLevel": "HIGH"}
        });
        assert_eq!(
            evaluate(&risk_rules(), &context),
            Some("npqs:high_risk".to_string())
        );
    }

    #[test]
    fn test_fallback_rule_when_first_partially_matches() {
        let context = json!({
            "ogaResponse": {"decision": "MANUAL_REVIEW"},
            "submissionResponse": {"riskLevel": "LOW"}
        });
        assert_eq!(
            evaluate(&risk_rules(), &context),
            Some("npqs:review".to_string())
        );
    }

    #[test]
    fn test_no_rule_matches_emits_nothing() {
        let context = json!({"ogaResponse": {"decision": "APPROVED"}});
        assert_eq!(evaluate(&risk_rules(), &context), None);
    }

    #[test]
    fn test_empty_condition_list_always_matches() {
        let rules: Vec<EmissionRule> =
            serde_json::from_value(json!([{"outcome": "always"}])).unwrap();
        assert_eq!(evaluate(&rules, &json!({})), Some("always".to_string()));
    }

    #[test]
    fn test_non_string_leaf_is_no_match() {
        let rules: Vec<EmissionRule> = serde_json::from_value(json!([
            {"outcome": "tag", "conditions": [{"field": "a.b", "value": "1"}]}
        ]))
        .unwrap();
        // numeric leaf, not the string "1"
        assert_eq!(evaluate(&rules, &json!({"a": {"b": 1}})), None);
        // missing path
        assert_eq!(evaluate(&rules, &json!({"a": {}})), None);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let context = json!({"ogaResponse": {"decision": "MANUAL_REVIEW"}});
        let rules = risk_rules();
        assert_eq!(evaluate(&rules, &context), evaluate(&rules, &context));
    }
}
