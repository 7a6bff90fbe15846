//! Replacement rules and their validation.
//!
//! Rules arrive as a JSON list of objects:
//!
//! ```json
//! [{"find": "{{NAME}}", "replace": "Alice"},
//!  {"find": "v(\\d+)", "replace": "version $1", "regex": true, "ignore_case": true}]
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

/// A single find/replace rule.
///
/// Rules are immutable once built; the builder methods consume `self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRule {
    find: String,
    replace: String,
    regex: bool,
    ignore_case: bool,
}

impl ReplacementRule {
    /// Create a literal, case-sensitive rule.
    ///
    /// Fails when `find` is empty.
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Result<Self> {
        let find = find.into();
        if find.is_empty() {
            return Err(Error::Validation("find must be a non-empty string".to_string()));
        }

        Ok(Self {
            find,
            replace: replace.into(),
            regex: false,
            ignore_case: false,
        })
    }

    /// Treat `find` as a regular expression.
    pub fn with_regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    /// Match regardless of case.
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn find(&self) -> &str {
        &self.find
    }

    pub fn replace(&self) -> &str {
        &self.replace
    }

    pub fn is_regex(&self) -> bool {
        self.regex
    }

    pub fn ignores_case(&self) -> bool {
        self.ignore_case
    }
}

/// Wire shape of a rule before validation.
#[derive(Debug, Deserialize)]
#[serde(expecting = "a rule object")]
struct RawRule {
    find: String,
    #[serde(default)]
    replace: Option<String>,
    #[serde(default)]
    regex: Option<bool>,
    #[serde(default, alias = "ignoreCase")]
    ignore_case: Option<bool>,
}

/// Parse and validate a JSON-encoded list of rules, keeping their order.
pub fn parse_rules(json: &str) -> Result<Vec<ReplacementRule>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::Validation(format!("rules payload is not valid JSON: {}", e)))?;

    rules_from_value(value)
}

/// Validate an already-decoded JSON value as a list of rules.
pub fn rules_from_value(value: Value) -> Result<Vec<ReplacementRule>> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(Error::Validation(format!(
                "rules must be a JSON list, got {}",
                json_type_name(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let raw = RawRule::deserialize(item)
                .map_err(|e| Error::Validation(format!("rule {}: {}", idx, e)))?;

            let rule = ReplacementRule::new(raw.find, raw.replace.unwrap_or_default())
                .map_err(|e| Error::Validation(format!("rule {}: {}", idx, e)))?;

            Ok(rule
                .with_regex(raw.regex.unwrap_or(false))
                .with_ignore_case(raw.ignore_case.unwrap_or(false)))
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_applied() {
        let rules = parse_rules(r#"[{"find": "{{NAME}}"}]"#).unwrap();

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].find(), "{{NAME}}");
        assert_eq!(rules[0].replace(), "");
        assert!(!rules[0].is_regex());
        assert!(!rules[0].ignores_case());
    }

    #[test]
    fn test_all_fields_and_order() {
        let rules = parse_rules(
            r#"[
                {"find": "a", "replace": "b"},
                {"find": "x+", "replace": "y", "regex": true, "ignore_case": true},
                {"find": "q", "replace": "r", "ignoreCase": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0], ReplacementRule::new("a", "b").unwrap());
        assert!(rules[1].is_regex());
        assert!(rules[1].ignores_case());
        assert!(!rules[2].is_regex());
        assert!(rules[2].ignores_case());
    }

    #[test]
    fn test_null_optionals_count_as_absent() {
        let rules =
            parse_rules(r#"[{"find": "a", "replace": null, "regex": null, "ignore_case": null}]"#)
                .unwrap();

        assert_eq!(rules[0].replace(), "");
        assert!(!rules[0].is_regex());
    }

    #[test]
    fn test_empty_list_is_valid() {
        assert!(parse_rules("[]").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = parse_rules("[{").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_rejects_non_list() {
        let err = parse_rules(r#"{"find": "a"}"#).unwrap_err();
        assert!(err.to_string().contains("must be a JSON list"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_rejects_non_object_element() {
        let err = parse_rules(r#"[{"find": "a"}, 42]"#).unwrap_err();
        assert!(err.to_string().starts_with("rule 1:"));
    }

    #[test]
    fn test_rejects_missing_or_bad_find() {
        assert!(parse_rules(r#"[{"replace": "b"}]"#)
            .unwrap_err()
            .to_string()
            .contains("find"));
        assert!(parse_rules(r#"[{"find": 3}]"#).is_err());
        assert!(parse_rules(r#"[{"find": ""}]"#)
            .unwrap_err()
            .to_string()
            .contains("non-empty"));
    }

    #[test]
    fn test_rejects_wrong_flag_types() {
        assert!(parse_rules(r#"[{"find": "a", "regex": "yes"}]"#).is_err());
        assert!(parse_rules(r#"[{"find": "a", "replace": 1}]"#).is_err());
    }

    #[test]
    fn test_new_rejects_empty_find() {
        assert!(ReplacementRule::new("", "x").is_err());
    }
}
