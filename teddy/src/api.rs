use crate::engine::TeddyEngine;
use crate::error::{Error, OptionExt, Result};
use serde::Serialize;
use std::sync::{Arc, OnceLock};

/// Process wide engine used by [`TEDDY`]
static GLOBAL_ENGINE: OnceLock<Arc<TeddyEngine>> = OnceLock::new();

/// Install the engine behind [`TEDDY`]
///
/// This should be called once during application startup
pub fn initialize_global_engine(engine: Arc<TeddyEngine>) -> Result<()> {
    GLOBAL_ENGINE
        .set(engine)
        .map_err(|_| Error::internal("Global TEDDY engine already initialized"))?;
    Ok(())
}

fn global_engine() -> Result<&'static TeddyEngine> {
    GLOBAL_ENGINE
        .get()
        .map(|engine| engine.as_ref())
        .context("Global TEDDY engine not initialized. Call initialize_global_engine() during startup")
}

/// Global rendering API
///
/// Renders templates from anywhere in the application once an engine has
/// been installed with [`initialize_global_engine`].
///
/// # Examples
///
/// ```ignore
/// use teddy::{initialize_global_engine, EngineConfig, TeddyEngine, TEDDY};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// initialize_global_engine(Arc::new(TeddyEngine::new(EngineConfig::default())))?;
///
/// let html = TEDDY::render("emails/welcome", &json!({ "name": "Alice" }))?;
/// let line = TEDDY::render_string("<p>Hi {name}</p>", &json!({ "name": "Bob" }))?;
/// ```
pub struct TEDDY;

impl TEDDY {
    /// Render a named template with the global engine
    pub fn render<T: Serialize + ?Sized>(name: &str, model: &T) -> Result<String> {
        global_engine()?.render(name, model)
    }

    /// Compile a named template into the global engine's cache
    pub fn compile(name: &str) -> Result<()> {
        global_engine()?.compile(name)
    }

    /// Render template text that is not stored anywhere
    ///
    /// Works before initialisation too, using a default configured engine
    /// with no template source behind includes.
    pub fn render_string<T: Serialize + ?Sized>(source: &str, model: &T) -> Result<String> {
        match GLOBAL_ENGINE.get() {
            Some(engine) => engine.render_source(source, model),
            None => TeddyEngine::with_source(
                crate::config::EngineConfig::default(),
                crate::source::MemorySource::new(),
            )
            .render_source(source, model),
        }
    }

    pub fn is_initialized() -> bool {
        GLOBAL_ENGINE.get().is_some()
    }
}
