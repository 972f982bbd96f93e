//! Where template source text comes from

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Supplies raw template source for a normalised template name
pub trait TemplateSource: Send + Sync {
    /// Fails with `Error::TemplateNotFound` when the name is unknown
    fn load(&self, name: &str) -> Result<String>;
}

/// Reads templates from disk
#[derive(Debug, Clone)]
pub struct FilesystemSource {
    root: PathBuf,
}

impl FilesystemSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TemplateSource for FilesystemSource {
    fn load(&self, name: &str) -> Result<String> {
        // The name as given first, then relative to the root
        let candidates = [PathBuf::from(name), self.root.join(name.trim_start_matches('/'))];

        for path in candidates.iter() {
            match fs::read_to_string(path) {
                Ok(content) => {
                    log::trace!("Loaded template {} from {}", name, path.display());
                    return Ok(content);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) if path.is_dir() => {
                    log::trace!("Skipping directory {}: {}", path.display(), e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Io(e).with_context(format!(
                        "Failed to read template '{}' from {}",
                        name,
                        path.display()
                    )))
                }
            }
        }

        Err(Error::template_not_found(name))
    }
}

/// In-memory templates, registered by name
#[derive(Debug, Default)]
pub struct MemorySource {
    templates: RwLock<HashMap<String, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style registration
    pub fn with(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&self, name: impl Into<String>, source: impl Into<String>) {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(name.into(), source.into());
        }
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.templates
            .write()
            .ok()
            .and_then(|mut templates| templates.remove(name))
    }
}

impl TemplateSource for MemorySource {
    fn load(&self, name: &str) -> Result<String> {
        let templates = self
            .templates
            .read()
            .map_err(|_| Error::internal("Memory template store lock poisoned"))?;

        templates
            .get(name)
            .or_else(|| templates.get(name.trim_start_matches('/')))
            .cloned()
            .ok_or_else(|| Error::template_not_found(name))
    }
}

/// Templates compiled into the binary with `rust-embed`
///
/// ```ignore
/// #[derive(rust_embed::RustEmbed)]
/// #[folder = "views/"]
/// struct Views;
///
/// let engine = TeddyEngine::with_source(config, EmbeddedSource::<Views>::new());
/// ```
#[cfg(feature = "embedded-views")]
pub struct EmbeddedSource<E: rust_embed::RustEmbed> {
    _assets: std::marker::PhantomData<fn() -> E>,
}

#[cfg(feature = "embedded-views")]
impl<E: rust_embed::RustEmbed> EmbeddedSource<E> {
    pub fn new() -> Self {
        Self {
            _assets: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "embedded-views")]
impl<E: rust_embed::RustEmbed> Default for EmbeddedSource<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "embedded-views")]
impl<E: rust_embed::RustEmbed> TemplateSource for EmbeddedSource<E> {
    fn load(&self, name: &str) -> Result<String> {
        let path = name.trim_start_matches('/');
        let file = E::get(path).ok_or_else(|| Error::template_not_found(name))?;

        std::str::from_utf8(&file.data)
            .map(|content| content.to_string())
            .map_err(|e| Error::template(format!("Invalid UTF-8 in template {}: {}", name, e)))
    }
}
