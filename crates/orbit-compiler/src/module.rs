//! Compiled module format.
//!
//! The built-in compiler emits one statement per line:
//!
//! ```js
//! export const frontmatter = {"title":"Home"};
//! export const html = "<h1>Home</h1>";
//! export default html;
//! ```
//!
//! Loaders may append side-effect imports (`import '...';`) after the body.

use std::sync::LazyLock;

use regex::Regex;

use crate::frontmatter::Frontmatter;

const FRONTMATTER_PREFIX: &str = "export const frontmatter = ";
const HTML_PREFIX: &str = "export const html = ";

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^import\s+['"]([^'"]+)['"]\s*;?\s*$"#).expect("Invalid import regex")
});

/// A compiled module read back into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticModule {
    pub frontmatter: Frontmatter,

    /// Rendered markup
    pub html: String,

    /// Side-effect import specifiers, in source order
    pub imports: Vec<String>,
}

impl StaticModule {
    /// Page title from frontmatter, if any.
    pub fn title(&self) -> Option<&str> {
        self.frontmatter.get("title").and_then(|v| v.as_str())
    }
}

/// Emit module source for rendered markup.
pub fn emit_module(frontmatter: &Frontmatter, html: &str) -> Result<String, serde_json::Error> {
    let frontmatter = serde_json::to_string(frontmatter)?;
    let html = serde_json::to_string(html)?;

    Ok(format!(
        "{FRONTMATTER_PREFIX}{frontmatter};\n{HTML_PREFIX}{html};\nexport default html;\n"
    ))
}

/// Parse module source produced by [`emit_module`].
///
/// Returns `None` when the source has no `html` export.
pub fn parse_module(code: &str) -> Option<StaticModule> {
    let mut frontmatter = Frontmatter::new();
    let mut html = None;

    for line in code.lines() {
        if let Some(rest) = line.strip_prefix(FRONTMATTER_PREFIX) {
            frontmatter = serde_json::from_str(rest.trim_end().trim_end_matches(';')).ok()?;
        } else if let Some(rest) = line.strip_prefix(HTML_PREFIX) {
            html = Some(serde_json::from_str::<String>(rest.trim_end().trim_end_matches(';')).ok()?);
        }
    }

    let imports = IMPORT_RE
        .captures_iter(code)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    Some(StaticModule {
        frontmatter,
        html: html?,
        imports,
    })
}
