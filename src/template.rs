//! Template interpolation for feed definitions
//!
//! Handles `{{ variable }}` interpolation in feed configurations.
//! Supports nested access like `{{ params.baseUrl }}` and
//! `{{ tokens.LastRunTime }}`.

use crate::error::{Error, Result};
use crate::params::RunContext;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}").unwrap()
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Host-supplied custom parameters
    pub params: Value,
    /// Scheduler-set tokens
    pub tokens: Value,
    /// Additional context variables
    pub vars: Value,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with parameter values
    pub fn with_params(params: Value) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Build a context from a run context
    pub fn from_run_context(ctx: &RunContext) -> Self {
        Self {
            params: Value::Object(ctx.params.clone()),
            tokens: Value::Object(ctx.tokens.clone()),
            vars: Value::Null,
        }
    }

    /// Set additional variables
    pub fn set_vars(&mut self, vars: Value) -> &mut Self {
        self.vars = vars;
        self
    }

    /// Get a value by path (e.g., "params.baseUrl")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        if parts.is_empty() {
            return None;
        }

        // First part determines the root object
        let root = match parts[0] {
            "params" => &self.params,
            "tokens" => &self.tokens,
            "vars" => &self.vars,
            // Also support top-level access to parameter fields directly
            _ => {
                if let Some(val) = get_nested_value(&self.params, &parts) {
                    return Some(val);
                }
                return get_nested_value(&self.vars, &parts);
            }
        };

        if parts.len() == 1 {
            Some(root)
        } else {
            get_nested_value(root, &parts[1..])
        }
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for part in path {
        match current {
            Value::Object(map) => {
                current = map.get(*part)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut result = template.to_string();
    let mut errors = Vec::new();

    for cap in TEMPLATE_REGEX.captures_iter(template) {
        let full_match = cap.get(0).unwrap().as_str();
        let var_path = cap.get(1).unwrap().as_str();

        match ctx.get(var_path) {
            Some(value) => {
                let replacement = value_to_string(value);
                result = result.replace(full_match, &replacement);
            }
            None => {
                errors.push(var_path.to_string());
            }
        }
    }

    if errors.is_empty() {
        Ok(result)
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all variable names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap.get(1).unwrap().as_str().to_string())
        .collect()
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // For complex types, use JSON serialization
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Render all string values in a JSON object/value
pub fn render_value(value: &Value, ctx: &TemplateContext) -> Result<Value> {
    match value {
        Value::String(s) => {
            if has_templates(s) {
                Ok(Value::String(render(s, ctx)?))
            } else {
                Ok(value.clone())
            }
        }
        Value::Object(map) => {
            let mut new_map = serde_json::Map::new();
            for (k, v) in map {
                // Also render keys
                let new_key = if has_templates(k) {
                    render(k, ctx)?
                } else {
                    k.clone()
                };
                new_map.insert(new_key, render_value(v, ctx)?);
            }
            Ok(Value::Object(new_map))
        }
        Value::Array(arr) => {
            let new_arr: Result<Vec<Value>> = arr.iter().map(|v| render_value(v, ctx)).collect();
            Ok(Value::Array(new_arr?))
        }
        _ => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_substitution() {
        let ctx = TemplateContext::with_params(json!({
            "apiKey": "sk_test_123"
        }));

        let result = render("Bearer {{ params.apiKey }}", &ctx).unwrap();
        assert_eq!(result, "Bearer sk_test_123");
    }

    #[test]
    fn test_multiple_substitutions() {
        let ctx = TemplateContext::with_params(json!({
            "baseUrl": "https://api.example.com",
            "source": "alerts"
        }));

        let result = render(
            "{{ params.baseUrl }}/services/search/jobs/{{ params.source }}",
            &ctx,
        )
        .unwrap();
        assert_eq!(result, "https://api.example.com/services/search/jobs/alerts");
    }

    #[test]
    fn test_token_substitution() {
        let ctx = TemplateContext::from_run_context(
            &crate::params::RunContext::new(
                json!({ "baseUrl": "https://x" }),
                json!({ "LastRunTime": "2024-06-01T00:00:00Z" }),
            )
            .unwrap(),
        );

        let result = render("since={{ tokens.LastRunTime }}", &ctx).unwrap();
        assert_eq!(result, "since=2024-06-01T00:00:00Z");
    }

    #[test]
    fn test_nested_value() {
        let ctx = TemplateContext::with_params(json!({
            "credentials": {
                "accessKey": "ak-123"
            }
        }));

        let result = render("Key: {{ params.credentials.accessKey }}", &ctx).unwrap();
        assert_eq!(result, "Key: ak-123");
    }

    #[test]
    fn test_undefined_variable() {
        let ctx = TemplateContext::new();
        let result = render("{{ params.missing }}", &ctx);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("params.missing"));
    }

    #[test]
    fn test_no_templates() {
        let ctx = TemplateContext::new();
        let result = render("plain string without templates", &ctx).unwrap();
        assert_eq!(result, "plain string without templates");
    }

    #[test]
    fn test_has_templates() {
        assert!(has_templates("{{ params.key }}"));
        assert!(has_templates("prefix {{ var }} suffix"));
        assert!(!has_templates("no templates here"));
        assert!(!has_templates("{ not a template }"));
    }

    #[test]
    fn test_extract_variables() {
        let vars = extract_variables("{{ params.a }} and {{ tokens.b }}");
        assert_eq!(vars, vec!["params.a", "tokens.b"]);
    }

    #[test]
    fn test_render_value_object() {
        let ctx = TemplateContext::with_params(json!({
            "source": "daily-report"
        }));

        let input = json!({
            "output_mode": "json",
            "search": "savedsearch {{ params.source }}"
        });

        let result = render_value(&input, &ctx).unwrap();
        assert_eq!(
            result,
            json!({
                "output_mode": "json",
                "search": "savedsearch daily-report"
            })
        );
    }

    #[test]
    fn test_number_substitution() {
        let ctx = TemplateContext::with_params(json!({
            "limit": 100,
            "enabled": true
        }));

        let result = render(
            "limit={{ params.limit }}&enabled={{ params.enabled }}",
            &ctx,
        )
        .unwrap();
        assert_eq!(result, "limit=100&enabled=true");
    }

    #[test]
    fn test_whitespace_in_template() {
        let ctx = TemplateContext::with_params(json!({"key": "value"}));

        assert_eq!(render("{{params.key}}", &ctx).unwrap(), "value");
        assert_eq!(render("{{ params.key }}", &ctx).unwrap(), "value");
        assert_eq!(render("{{  params.key  }}", &ctx).unwrap(), "value");
    }
}
