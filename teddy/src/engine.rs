use crate::compiler::{compile_source, normalize_name, CompiledTemplate, TemplateCache};
use crate::config::{EngineConfig, Verbosity};
use crate::error::{Error, ErrorChain, ErrorContext, Result};
use crate::model;
use crate::resolver::{RenderWarning, Renderer};
use crate::source::{FilesystemSource, TemplateSource};
use serde::Serialize;
use std::sync::Arc;

/// Output of a render together with everything it had to work around
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub html: String,
    pub warnings: Vec<RenderWarning>,
}

/// Teddy template engine
///
/// Holds configuration, a template source and the compiled template cache.
/// Every render gets its own scope stack and model snapshot, so one engine
/// can be shared between threads.
#[derive(Clone)]
pub struct TeddyEngine {
    config: EngineConfig,
    source: Arc<dyn TemplateSource>,
    cache: TemplateCache,
}

impl TeddyEngine {
    /// Engine reading templates from `config.template_root` on disk
    pub fn new(config: EngineConfig) -> Self {
        let source = FilesystemSource::new(&config.template_root);
        Self::with_source(config, source)
    }

    pub fn with_source<S: TemplateSource + 'static>(config: EngineConfig, source: S) -> Self {
        Self::with_shared_source(config, Arc::new(source))
    }

    pub fn with_shared_source(config: EngineConfig, source: Arc<dyn TemplateSource>) -> Self {
        log::debug!(
            "Teddy engine created (template root: {}, verbosity: {}, strict parser: {})",
            config.template_root,
            config.verbosity.as_str(),
            config.strict_parser
        );
        Self {
            config,
            source,
            cache: TemplateCache::new(),
        }
    }

    /// Filesystem engine configured from `TEDDY_*` environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(EngineConfig::from_env()?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Cache key for a caller supplied template name
    pub fn normalize_name(&self, name: &str) -> String {
        normalize_name(
            name,
            &self.config.template_root,
            &self.config.extension_suffix(),
        )
    }

    /// Load a template from the source and cache its compiled form
    pub fn compile(&self, name: &str) -> Result<()> {
        let key = self.normalize_name(name);
        self.load_and_compile(&key).map(|_| ())
    }

    /// Compile template text directly, without touching the source
    pub fn compile_str(&self, name: &str, source: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::invalid_input("template name cannot be empty"));
        }
        let key = self.normalize_name(name);
        self.cache.insert(CompiledTemplate::new(&key, source));
        Ok(())
    }

    /// Compiled text of a cached template
    pub fn compiled(&self, name: &str) -> Option<String> {
        self.cache
            .get(&self.normalize_name(name))
            .map(|template| template.source.clone())
    }

    /// Script form of a cached template for shipping to a remote peer
    pub fn packaged(&self, name: &str) -> Option<String> {
        self.cache
            .get(&self.normalize_name(name))
            .map(|template| template.packaged.clone())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn load_and_compile(&self, key: &str) -> Result<Arc<CompiledTemplate>> {
        let raw = self
            .source
            .load(key)
            .with_context(|| format!("compiling {}", key))
            .inspect_err(|e| {
                if self.config.verbosity.allows(Verbosity::Concise) {
                    log::warn!(
                        "Could not compile template: {}",
                        ErrorChain::new(e).format_for_log()
                    );
                }
            })?;

        let compiled = self.cache.insert(CompiledTemplate::new(key, &raw));
        if self.config.verbosity.allows(Verbosity::Debug) {
            log::debug!("Compiled template {} ({} bytes)", key, compiled.source.len());
        }
        Ok(compiled)
    }

    /// Cached template, compiling it first when missing or when every
    /// render recompiles. A failed forced recompile falls back to a cached
    /// entry, which keeps `compile_str` templates usable.
    pub(crate) fn compiled_or_compile(&self, key: &str) -> Result<Arc<CompiledTemplate>> {
        if !self.config.compile_at_every_render {
            if let Some(template) = self.cache.get(key) {
                return Ok(template);
            }
        }

        match self.load_and_compile(key) {
            Ok(template) => Ok(template),
            Err(e) => match self.cache.get(key) {
                Some(template) if e.is_missing_template() => Ok(template),
                _ => Err(e),
            },
        }
    }

    /// Render a template by name
    pub fn render<T: Serialize + ?Sized>(&self, name: &str, model: &T) -> Result<String> {
        self.render_report(name, model).map(|report| report.html)
    }

    /// Render and hand the result to `callback`
    pub fn render_callback<T, F>(&self, name: &str, model: &T, callback: F)
    where
        T: Serialize + ?Sized,
        F: FnOnce(Result<String>),
    {
        callback(self.render(name, model))
    }

    /// Render a template by name, keeping the warnings collected on the way
    pub fn render_report<T: Serialize + ?Sized>(&self, name: &str, model: &T) -> Result<RenderReport> {
        let key = self.normalize_name(name);
        let template = self.compiled_or_compile(&key).map_err(|e| {
            if e.is_missing_template() {
                Error::template_not_found(key.clone())
            } else {
                e
            }
        })?;

        self.render_compiled(&template.source, &key, model)
            .with_context(|| format!("rendering {}", key))
    }

    /// Render template text that is not registered under any name
    pub fn render_source<T: Serialize + ?Sized>(&self, source: &str, model: &T) -> Result<String> {
        let compiled = compile_source(source);
        self.render_compiled(&compiled, "<inline template>", model)
            .map(|report| report.html)
    }

    fn render_compiled<T: Serialize + ?Sized>(
        &self,
        compiled: &str,
        origin: &str,
        model: &T,
    ) -> Result<RenderReport> {
        let base = model::flatten(model);
        let mut renderer = Renderer::new(self, base);
        let html = renderer.run(compiled, origin)?;
        let warnings = renderer.into_warnings();

        if self.config.verbosity.allows(Verbosity::Debug) {
            log::debug!(
                "Rendered {} ({} bytes, {} warnings)",
                origin,
                html.len(),
                warnings.len()
            );
        }
        Ok(RenderReport { html, warnings })
    }
}
