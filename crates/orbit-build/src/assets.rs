//! Asset processing for production output.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static INLINE_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(<style[^>]*>)(.*?)(</style>)").expect("Invalid inline style regex")
});

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }

    /// Minify every inline `<style>` block of an HTML document.
    ///
    /// Blocks that fail to parse are left as written.
    pub fn minify_inline_styles(html: &str) -> String {
        INLINE_STYLE_RE
            .replace_all(html, |caps: &Captures<'_>| {
                let css = &caps[2];
                match Self::minify_css(css) {
                    Ok(minified) => format!("{}{}{}", &caps[1], minified, &caps[3]),
                    Err(e) => {
                        tracing::warn!("Leaving inline style unminified: {}", e);
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}
