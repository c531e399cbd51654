// Color rule domain model - maps a scalar reading to a display color
use serde::{Deserialize, Serialize};

/// Color used when no rule applies
pub const NEUTRAL_COLOR: &str = "#cccccc";

/// Absolute tolerance of the `=` operator, wide enough to absorb rounding
/// from averaged readings
pub const EQUALITY_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleOperator {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
}

impl RuleOperator {
    pub fn matches(self, value: f64, threshold: f64) -> bool {
        match self {
            RuleOperator::LessThan => value < threshold,
            RuleOperator::LessOrEqual => value <= threshold,
            RuleOperator::Equal => (value - threshold).abs() < EQUALITY_TOLERANCE,
            RuleOperator::GreaterThan => value > threshold,
            RuleOperator::GreaterOrEqual => value >= threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRule {
    pub id: String,
    pub operator: RuleOperator,
    #[serde(alias = "value")]
    pub threshold: f64,
    pub color: String,
}

impl ColorRule {
    pub fn new(id: &str, operator: RuleOperator, threshold: f64, color: &str) -> Self {
        Self {
            id: id.to_string(),
            operator,
            threshold,
            color: color.to_string(),
        }
    }
}

/// Pick the display color for `value`
///
/// Rules are tried from the highest threshold down; the first match wins.
/// The sort is stable, so rules sharing a threshold keep their insertion order.
/// Returns `NEUTRAL_COLOR` for an empty rule list or when nothing matches.
pub fn evaluate_color(value: f64, rules: &[ColorRule]) -> String {
    let mut ordered: Vec<&ColorRule> = rules.iter().collect();
    ordered.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));

    ordered
        .into_iter()
        .find(|rule| rule.operator.matches(value, rule.threshold))
        .map(|rule| rule.color.clone())
        .unwrap_or_else(|| NEUTRAL_COLOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use RuleOperator::*;

    fn traffic_light() -> Vec<ColorRule> {
        vec![
            ColorRule::new("1", GreaterOrEqual, 30.0, "red"),
            ColorRule::new("2", GreaterOrEqual, 20.0, "green"),
            ColorRule::new("3", LessThan, 20.0, "blue"),
        ]
    }

    #[test]
    fn test_first_match_by_descending_threshold() {
        assert_eq!(evaluate_color(22.0, &traffic_light()), "green");
        assert_eq!(evaluate_color(30.0, &traffic_light()), "red");
        assert_eq!(evaluate_color(19.9, &traffic_light()), "blue");
    }

    #[test]
    fn test_result_is_independent_of_input_order() {
        let rules = traffic_light();
        let mut reversed = rules.clone();
        reversed.reverse();
        let rotated = vec![rules[1].clone(), rules[2].clone(), rules[0].clone()];

        for value in [-5.0, 19.99, 20.0, 22.0, 29.9, 30.0, 45.0] {
            let expected = evaluate_color(value, &rules);
            assert_eq!(evaluate_color(value, &reversed), expected);
            assert_eq!(evaluate_color(value, &rotated), expected);
        }
    }

    #[test]
    fn test_empty_rules_give_neutral_color() {
        for value in [-40.0, 0.0, 18.4, 1e9] {
            assert_eq!(evaluate_color(value, &[]), NEUTRAL_COLOR);
        }
    }

    #[test]
    fn test_no_match_gives_neutral_color() {
        let rules = vec![ColorRule::new("1", GreaterThan, 50.0, "red")];
        assert_eq!(evaluate_color(50.0, &rules), NEUTRAL_COLOR);
    }

    #[test]
    fn test_operator_boundaries() {
        assert!(LessThan.matches(9.9, 10.0));
        assert!(!LessThan.matches(10.0, 10.0));
        assert!(LessOrEqual.matches(10.0, 10.0));
        assert!(GreaterThan.matches(10.1, 10.0));
        assert!(!GreaterThan.matches(10.0, 10.0));
        assert!(GreaterOrEqual.matches(10.0, 10.0));
    }

    #[test]
    fn test_equality_uses_tolerance() {
        assert!(Equal.matches(25.05, 25.0));
        assert!(Equal.matches(24.95, 25.0));
        assert!(!Equal.matches(25.1, 25.0));
        assert!(!Equal.matches(24.8, 25.0));
    }

    #[test]
    fn test_equal_thresholds_keep_insertion_order() {
        let rules = vec![
            ColorRule::new("a", GreaterOrEqual, 10.0, "first"),
            ColorRule::new("b", GreaterOrEqual, 10.0, "second"),
        ];
        assert_eq!(evaluate_color(12.0, &rules), "first");
    }

    #[test]
    fn test_operator_serializes_as_symbol() {
        let rule: ColorRule =
            serde_json::from_str(r##"{"id":"x","operator":"<=","value":4.5,"color":"#fff"}"##)
                .unwrap();
        assert_eq!(rule.operator, LessOrEqual);
        assert_eq!(rule.threshold, 4.5);
        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains(r#""operator":"<=""#));
    }
}
