//! Teddy - an HTML-flavored template engine
//!
//! Templates are plain HTML with a few extra tags:
//! - `<if>`, `<unless>`, `<elseif>`, `<elseunless>` and `<else>` chains
//! - `<foreach val="x" key="i" in="path">` loops
//! - `<include src="name">` with `<arg name>value</arg>` children
//! - one-line conditionals such as `<p if-active true="class=on">`
//! - `{dotted.path}` variables and `{! comments !}`
//!
//! ```ignore
//! use teddy::{EngineConfig, TeddyEngine};
//! use serde_json::json;
//!
//! let engine = TeddyEngine::new(EngineConfig::default());
//! let html = engine.render("index", &json!({ "title": "Hello" }))?;
//! ```

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod api;
pub mod compiler;
pub mod condition;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod model;
pub mod resolver;
pub mod scope;
pub mod source;
pub mod substitute;

// Re-export main types for public API
pub use api::{initialize_global_engine, TEDDY};
pub use config::{EngineConfig, Verbosity};
pub use engine::{RenderReport, TeddyEngine};
pub use error::{Error, Result};
pub use resolver::RenderWarning;
pub use source::{FilesystemSource, MemorySource, TemplateSource};
pub use substitute::{Substitution, SubstitutionOutcome};

#[cfg(feature = "embedded-views")]
pub use source::EmbeddedSource;

pub mod prelude {
    pub use crate::api::TEDDY;
    pub use crate::config::{EngineConfig, Verbosity};
    pub use crate::engine::{RenderReport, TeddyEngine};
    pub use crate::error::{Error, ErrorContext, Result};
    pub use crate::resolver::RenderWarning;
    pub use crate::source::{FilesystemSource, MemorySource, TemplateSource};
}
