//! Classification of module ids requested from the loader.

use std::path::Path;

use orbit_compiler::SourceKind;

/// Reserved namespace prefix of side-channelled stylesheet ids.
pub const STYLE_NAMESPACE: &str = "orbit:css";

/// File name suffix of the hydration runtime's base module.
pub const HYDRATION_ENTRY_SUFFIX: &str = "__orbit_component.js";

/// What a requested module id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleRequest<'a> {
    /// The hydration runtime entry, synthesized from renderer integrations
    HydrationEntry,

    /// A `.orbit` or `.md` source file
    Component,

    /// A stylesheet held in the style cache, by key
    Style { key: &'a str },

    /// Anything else
    Unhandled,
}

impl<'a> ModuleRequest<'a> {
    /// Classify a module id. Checks run in priority order.
    pub fn classify(id: &'a str) -> Self {
        if id.ends_with(HYDRATION_ENTRY_SUFFIX) {
            ModuleRequest::HydrationEntry
        } else if SourceKind::from_path(Path::new(id)).is_some() {
            ModuleRequest::Component
        } else if let Some(key) = id.strip_prefix(STYLE_NAMESPACE) {
            ModuleRequest::Style { key }
        } else {
            ModuleRequest::Unhandled
        }
    }
}

/// Whether an id belongs to the reserved style namespace.
pub fn is_style_id(id: &str) -> bool {
    id.starts_with(STYLE_NAMESPACE)
}

/// Style id for a cache key, e.g. `orbit:css/pages/index.orbit.css`.
pub fn style_id(key: &str) -> String {
    format!("{STYLE_NAMESPACE}{key}")
}
