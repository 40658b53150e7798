// Placeholder substitution: `{{ name }}` and `{{ name|default:'literal' }}`
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Template parameters, name to value.
pub type Params = BTreeMap<String, String>;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?:\|\s*default\s*:\s*(?:'([^']*)'|"([^"]*)")\s*)?\}\}"#,
    )
    .expect("Could not create placeholder regex")
});

static PARAM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("Could not create parameter name regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Names left in the output because they had neither a value nor a default.
    pub unresolved: Vec<String>,
}

fn default_of<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str())
}

/// Every placeholder in the template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<Placeholder> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|caps| Placeholder {
            name: caps[1].to_string(),
            default: default_of(&caps).map(str::to_string),
        })
        .collect()
}

pub fn is_valid_param_name(name: &str) -> bool {
    PARAM_NAME.is_match(name)
}

/// Substitute every placeholder in one pass. Substituted text is never rescanned.
///
/// A bound value wins over a default unless it is empty. A placeholder with no
/// value and no default stays in the output verbatim and is reported in
/// [`Rendered::unresolved`].
pub fn render(template: &str, params: &Params) -> Rendered {
    let mut unresolved: Vec<String> = Vec::new();

    let text = PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            match (params.get(name), default_of(caps)) {
                (Some(value), None) => value.clone(),
                (Some(value), Some(_)) if !value.is_empty() => value.clone(),
                (_, Some(default)) => default.to_string(),
                (None, None) => {
                    if !unresolved.iter().any(|n| n == name) {
                        unresolved.push(name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        })
        .into_owned();

    Rendered { text, unresolved }
}
