//! Template engine for rendering page documents.

use minijinja::{context, Environment};

/// Context for rendering a page document.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Context {
    /// Page title
    pub title: String,
    /// Absolute canonical URL of the page, already serialized by `url`
    pub canonical_url: String,
    /// Rendered page markup
    pub content: String,
    /// Stylesheets inlined into the head
    pub styles: Vec<String>,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the default document template.
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_template("page.html", PAGE_TEMPLATE)
            .expect("Failed to add page template");

        Self { env }
    }

    /// Render a page document.
    pub fn render_page(&self, context: &Context) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("page.html")?;

        tmpl.render(context! {
            title => &context.title,
            canonical_url => &context.canonical_url,
            content => &context.content,
            styles => &context.styles,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }}</title>
  <link rel="canonical" href="{{ canonical_url | safe }}">
  {% for style in styles %}<style>{{ style | safe }}</style>
  {% endfor %}
</head>
<body>
{{ content | safe }}
</body>
</html>"##;
