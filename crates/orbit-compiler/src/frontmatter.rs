//! Frontmatter extraction and parsing.

use serde_json::{Map, Value};

/// Frontmatter fields, ordered by key.
pub type Frontmatter = Map<String, Value>;

/// Extract frontmatter from a page or component source.
///
/// Returns the parsed frontmatter (empty when absent) and the remaining content
/// after the frontmatter block.
pub fn extract_frontmatter(source: &str) -> Result<(Frontmatter, &str), FrontmatterError> {
    let trimmed = source.trim_start();

    if !trimmed.starts_with("---") {
        return Ok((Frontmatter::new(), source));
    }

    // Find the closing ---
    let after_open = &trimmed[3..];
    let Some(close_pos) = after_open.find("\n---") else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml_content = after_open[..close_pos].trim();
    let remaining = &after_open[close_pos + 4..];

    let yaml: serde_yaml::Value = serde_yaml::from_str(yaml_content)
        .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    let frontmatter = match serde_json::to_value(yaml)
        .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?
    {
        Value::Null => Frontmatter::new(),
        Value::Object(map) => map,
        _ => return Err(FrontmatterError::NotAMapping),
    };

    Ok((frontmatter, remaining.trim_start()))
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),

    #[error("Frontmatter must be a mapping")]
    NotAMapping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_ordered_by_key() {
        let (fm, _) = extract_frontmatter("---\ntitle: Home\nauthor: Ada\norder: 2\n---\nbody").unwrap();

        let keys: Vec<&str> = fm.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["author", "order", "title"]);
    }

    #[test]
    fn extracts_valid_frontmatter() {
        let source = r#"---
title: About
order: 1
---

<h1>About</h1>
"#;

        let (fm, content) = extract_frontmatter(source).unwrap();

        assert_eq!(fm.get("title"), Some(&Value::from("About")));
        assert_eq!(fm.get("order"), Some(&Value::from(1)));
        assert!(content.starts_with("<h1>About</h1>"));
    }

    #[test]
    fn handles_no_frontmatter() {
        let source = "# Just Markdown\n\nNo frontmatter here.";

        let (fm, content) = extract_frontmatter(source).unwrap();

        assert!(fm.is_empty());
        assert_eq!(content, source);
    }

    #[test]
    fn handles_empty_block() {
        let (fm, content) = extract_frontmatter("---\n---\n<p>hi</p>").unwrap();

        assert!(fm.is_empty());
        assert_eq!(content, "<p>hi</p>");
    }

    #[test]
    fn errors_on_unclosed_frontmatter() {
        let result = extract_frontmatter("---\ntitle: Test\n# No closing");

        assert!(matches!(result, Err(FrontmatterError::Unclosed)));
    }

    #[test]
    fn errors_on_invalid_yaml() {
        let result = extract_frontmatter("---\ntitle: [invalid yaml\n---\n");

        assert!(matches!(result, Err(FrontmatterError::InvalidYaml(_))));
    }

    #[test]
    fn errors_on_scalar_frontmatter() {
        let result = extract_frontmatter("---\njust a string\n---\n");

        assert!(matches!(result, Err(FrontmatterError::NotAMapping)));
    }
}
