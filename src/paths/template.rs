use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

use crate::errors::IngestError;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

/// Render a `{token}` template. Every placeholder must have a value.
pub fn render(template: &str, tokens: &HashMap<&str, String>) -> Result<String, IngestError> {
    let mut missing = Vec::new();

    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        match tokens.get(name) {
            Some(value) => value.clone(),
            None => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(IngestError::Template(format!(
            "template '{}' has no value for: {}",
            template,
            missing.join(", ")
        )));
    }

    Ok(normalize_separators(&rendered))
}

// Collapse doubled separators left behind by empty tokens
fn normalize_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        let slash = c == '/';
        if !(slash && previous_slash) {
            out.push(c);
        }
        previous_slash = slash;
    }
    out
}
