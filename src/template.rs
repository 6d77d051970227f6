//! Template variables - `{{ .name }}` substitution on normalized JSON text
//!
//! Rendering runs after normalization, so every substituted value is escaped
//! as the inside of a JSON string.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::ApplyError;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}")
        .unwrap_or_else(|e| panic!("invalid template pattern: {}", e))
});

/// Parse `key=value` pairs as given to `--set`
pub fn parse_vars<S: AsRef<str>>(pairs: &[S]) -> Result<BTreeMap<String, String>, ApplyError> {
    let mut vars = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            ApplyError::input(format!("invalid --set '{}': expected key=value", pair))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ApplyError::input(format!(
                "invalid --set '{}': empty key",
                pair
            )));
        }
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}

/// Names referenced by a template, in order of first appearance
pub fn references(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in REFERENCE.captures_iter(text) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Substitute every reference; all unresolved names are reported together
pub fn render(text: &str, vars: &BTreeMap<String, String>) -> Result<String, ApplyError> {
    let missing: Vec<String> = references(text)
        .into_iter()
        .filter(|name| !vars.contains_key(name))
        .collect();
    if !missing.is_empty() {
        return Err(ApplyError::input(format!(
            "unresolved template variable(s): {} (pass them with --set key=value)",
            missing.join(", ")
        )));
    }

    let rendered = REFERENCE.replace_all(text, |caps: &Captures| {
        vars.get(&caps[1])
            .map(|v| escape(v))
            .unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

/// Escape a value for the inside of a JSON string literal
fn escape(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_both_reference_styles() {
        let out = render(
            r#"{"name": "{{ .env }}-{{team}}"}"#,
            &vars(&[("env", "prod"), ("team", "sre")]),
        )
        .unwrap();
        assert_eq!(out, r#"{"name": "prod-sre"}"#);
    }

    #[test]
    fn test_values_are_json_escaped() {
        let out = render(r#"{"q": "{{ .query }}"}"#, &vars(&[("query", "say \"hi\"\n")])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["q"], "say \"hi\"\n");
    }

    #[test]
    fn test_all_unresolved_names_are_reported() {
        let err = render("{{ .a }} {{ .b }} {{ .a }} {{ .c }}", &vars(&[("b", "1")])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("a, c"));
        assert!(err.is_input());
    }

    #[test]
    fn test_text_without_references_is_unchanged() {
        let text = r#"{"tiles": [], "note": "{ not a template }"}"#;
        assert_eq!(render(text, &BTreeMap::new()).unwrap(), text);
    }

    #[test]
    fn test_parse_vars() {
        let parsed = parse_vars(&["env=prod", "url=https://x?a=b"]).unwrap();
        assert_eq!(parsed["env"], "prod");
        assert_eq!(parsed["url"], "https://x?a=b");
        assert!(parse_vars(&["novalue"]).is_err());
        assert!(parse_vars(&["=x"]).is_err());
    }
}
