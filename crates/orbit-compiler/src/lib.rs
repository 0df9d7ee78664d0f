//! Component compiler for Orbit.
//!
//! Defines the contract the build pipeline uses to turn `.orbit` components and
//! `.md` pages into executable modules, plus a built-in compiler for both formats.

pub mod compiler;
pub mod frontmatter;
pub mod module;
pub mod traits;

pub use compiler::{OrbitCompiler, SourceKind};
pub use frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};
pub use module::{emit_module, parse_module, StaticModule};
pub use traits::{
    CompileError, CompileOptions, CompileRequest, CompileResult, CompiledCss, ComponentCompiler,
    RuntimeMode,
};
