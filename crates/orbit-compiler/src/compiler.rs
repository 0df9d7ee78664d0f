//! Built-in compiler for `.orbit` components and `.md` pages.

use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use minijinja::Environment;
use regex::Regex;

use crate::frontmatter::{extract_frontmatter, Frontmatter};
use crate::module::emit_module;
use crate::traits::{CompileError, CompileRequest, CompileResult, CompiledCss, ComponentCompiler};

static STYLE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style[^>]*>(.*?)</style>").expect("Invalid style block regex")
});

/// Source formats the compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.orbit` single-file component
    Component,
    /// `.md` page
    Markdown,
}

impl SourceKind {
    /// Classify a path by extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("orbit") => Some(SourceKind::Component),
            Some("md") => Some(SourceKind::Markdown),
            _ => None,
        }
    }
}

/// Compiles `.orbit` and `.md` sources into static modules.
///
/// A component is optional YAML frontmatter, markup and any number of
/// `<style>` blocks. The markup is a template rendered with the frontmatter as
/// context; the style blocks are concatenated into a single stylesheet.
#[derive(Debug, Default)]
pub struct OrbitCompiler;

impl OrbitCompiler {
    /// Create a new compiler.
    pub fn new() -> Self {
        Self
    }

    fn compile_component(&self, source: &str, path: &str) -> Result<CompileResult, CompileError> {
        let (frontmatter, body) = extract_frontmatter(source).map_err(|e| {
            CompileError::Frontmatter {
                path: path.to_string(),
                message: e.to_string(),
            }
        })?;

        let styles: Vec<&str> = STYLE_BLOCK_RE
            .captures_iter(body)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .collect();

        let markup = STYLE_BLOCK_RE.replace_all(body, "");
        let html = render_markup(markup.trim(), &frontmatter, path)?;

        let css = if styles.is_empty() {
            None
        } else {
            Some(CompiledCss {
                code: process_css(&styles.join("\n"), path)?,
                map: None,
            })
        };

        Ok(CompileResult {
            contents: module_source(&frontmatter, &html, path)?,
            css,
        })
    }

    fn compile_markdown(&self, source: &str, path: &str) -> Result<CompileResult, CompileError> {
        use pulldown_cmark::{html, Options, Parser};

        let (frontmatter, content) = extract_frontmatter(source).map_err(|e| {
            CompileError::Frontmatter {
                path: path.to_string(),
                message: e.to_string(),
            }
        })?;

        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;

        let parser = Parser::new_ext(content, options);

        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);

        Ok(CompileResult {
            contents: module_source(&frontmatter, &html_output, path)?,
            css: None,
        })
    }
}

#[async_trait]
impl ComponentCompiler for OrbitCompiler {
    fn name(&self) -> &'static str {
        "orbit"
    }

    async fn compile(
        &self,
        source: &str,
        request: &CompileRequest<'_>,
    ) -> Result<CompileResult, CompileError> {
        let path = request.filename.display().to_string();
        // Normalize newlines so output does not depend on checkout settings
        let source = source.replace("\r\n", "\n");

        match SourceKind::from_path(request.filename) {
            Some(SourceKind::Component) => self.compile_component(&source, &path),
            Some(SourceKind::Markdown) => self.compile_markdown(&source, &path),
            None => Err(CompileError::UnsupportedFile(path)),
        }
    }
}

/// Render component markup with its frontmatter as template context.
fn render_markup(markup: &str, frontmatter: &Frontmatter, path: &str) -> Result<String, CompileError> {
    let env = Environment::new();

    env.render_str(markup, frontmatter)
        .map_err(|e| CompileError::Template {
            path: path.to_string(),
            message: e.to_string(),
        })
}

/// Parse and re-print a stylesheet with lightningcss.
fn process_css(css: &str, path: &str) -> Result<String, CompileError> {
    use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

    let stylesheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: path.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| CompileError::Style {
        path: path.to_string(),
        message: e.to_string(),
    })?;

    let printed = stylesheet
        .to_css(PrinterOptions::default())
        .map_err(|e| CompileError::Style {
            path: path.to_string(),
            message: e.to_string(),
        })?;

    Ok(printed.code)
}

fn module_source(frontmatter: &Frontmatter, html: &str, path: &str) -> Result<String, CompileError> {
    emit_module(frontmatter, html).map_err(|e| CompileError::Module {
        path: path.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::parse_module;
    use crate::traits::CompileOptions;
    use std::path::PathBuf;

    async fn compile(source: &str, filename: &str) -> Result<CompileResult, CompileError> {
        let options = CompileOptions {
            project_root: PathBuf::from("/project"),
            ..Default::default()
        };
        let filename = PathBuf::from(filename);
        let request = CompileRequest {
            compile_options: &options,
            filename: &filename,
            project_root: &options.project_root,
        };

        OrbitCompiler::new().compile(source, &request).await
    }

    #[tokio::test]
    async fn compiles_component_with_style() {
        let source = r#"---
title: Home
---
<h1>{{ title }}</h1>
<style>
h1 { color: red; }
</style>
"#;

        let result = compile(source, "/project/pages/index.orbit").await.unwrap();
        let module = parse_module(&result.contents).unwrap();

        assert_eq!(module.html, "<h1>Home</h1>");
        assert_eq!(module.title(), Some("Home"));

        let css = result.css.unwrap();
        assert!(css.code.contains("color: red"));
        assert!(css.map.is_none());
    }

    #[tokio::test]
    async fn concatenates_style_blocks() {
        let source = "<p>x</p>\n<style>p { margin: 0 }</style>\n<style>a { color: blue }</style>";

        let css = compile(source, "/project/pages/x.orbit").await.unwrap().css.unwrap();

        assert!(css.code.contains("margin: 0"));
        assert!(css.code.contains("color: #00f") || css.code.contains("color: blue"));
    }

    #[tokio::test]
    async fn component_without_style_has_no_css() {
        let result = compile("<p>plain</p>", "/project/pages/plain.orbit").await.unwrap();

        assert!(result.css.is_none());
    }

    #[tokio::test]
    async fn compiles_markdown() {
        let result = compile("---\ntitle: Post\n---\n# Hello\n\nWorld", "/project/pages/post.md")
            .await
            .unwrap();
        let module = parse_module(&result.contents).unwrap();

        assert!(module.html.contains("<h1>Hello</h1>"));
        assert_eq!(module.title(), Some("Post"));
        assert!(result.css.is_none());
    }

    #[tokio::test]
    async fn rejects_invalid_css() {
        let result = compile("<p>x</p><style>.a..b { color: red }</style>", "/project/a.orbit").await;

        assert!(matches!(result, Err(CompileError::Style { .. })));
    }

    #[tokio::test]
    async fn rejects_broken_template() {
        let result = compile("<p>{{ title </p>", "/project/a.orbit").await;

        assert!(matches!(result, Err(CompileError::Template { .. })));
    }

    #[tokio::test]
    async fn rejects_unknown_extension() {
        let result = compile("body {}", "/project/a.css").await;

        assert!(matches!(result, Err(CompileError::UnsupportedFile(_))));
    }
}
