//! Fixed module lists handed to the bundler.

/// Framework runtime dependencies pre-bundled for every build.
pub const RUNTIME_DEPS: &[&str] = &[
    "@orbit/runtime/hydrate",
    "@orbit/runtime/internal",
    "@orbit/markdown-support",
];

/// CommonJS dependencies that must load natively (always external).
pub const CJS_MODULES: &[&str] = &["@orbit/parser", "prismjs", "shorthash"];

/// ESM-only dependencies that must be bundled (never external).
pub const ES_MODULES: &[&str] = &["@orbit/runtime", "@orbit/components", "unified"];

/// Packages resolved to a single copy.
pub const DEDUPE: &[&str] = &["react", "react-dom"];

/// Globs scanned for dependencies to pre-bundle.
pub const OPTIMIZE_ENTRIES: &[&str] = &["**/*"];

/// Syntax target of production output.
pub const BUILD_TARGET: &str = "es2020";

pub(crate) fn to_strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
