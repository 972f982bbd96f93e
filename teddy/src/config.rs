use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
#[cfg(feature = "config")]
use std::fs;
#[cfg(feature = "config")]
use std::path::Path;

/// How much the engine reports through the `log` facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Verbosity {
    /// Nothing is logged
    None,
    /// Missing attributes, unknown includes and bad arguments
    #[default]
    Concise,
    /// Adds unresolved variables and parser warnings
    Verbose,
    /// Adds a trace of every resolver step
    Debug,
}

impl Verbosity {
    /// Parse a verbosity name; anything unrecognised falls back to `Concise`
    pub fn from_str(level: &str) -> Self {
        match level.trim().to_lowercase().as_str() {
            "none" | "0" => Verbosity::None,
            "verbose" | "2" => Verbosity::Verbose,
            "debug" | "3" => Verbosity::Debug,
            _ => Verbosity::Concise,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::None => "none",
            Verbosity::Concise => "concise",
            Verbosity::Verbose => "verbose",
            Verbosity::Debug => "debug",
        }
    }

    /// True when messages of `level` should be emitted at this verbosity
    pub fn allows(&self, level: Verbosity) -> bool {
        level != Verbosity::None && *self >= level
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub verbosity: Verbosity,

    /// Prefix stripped from template names before they are looked up
    #[serde(default = "default_template_root")]
    pub template_root: String,

    /// Fatal parse errors abort the render instead of being logged
    #[serde(default)]
    pub strict_parser: bool,

    /// Recompile the template on every render, ignoring the cache
    #[serde(default)]
    pub compile_at_every_render: bool,

    #[serde(default = "default_extension")]
    pub extension: String,

    /// Cap on every fixed-point loop (substitution and resolver passes)
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
}

fn default_template_root() -> String {
    "./".to_string()
}

fn default_extension() -> String {
    "html".to_string()
}

fn default_max_passes() -> usize {
    crate::substitute::DEFAULT_MAX_PASSES
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            template_root: default_template_root(),
            strict_parser: false,
            compile_at_every_render: false,
            extension: default_extension(),
            max_passes: default_max_passes(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    #[cfg(feature = "config")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let content = fs::read_to_string(path_ref).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path_ref.display(),
                e
            ))
        })?;

        let config = Self::from_toml_str(&content)
            .map_err(|e| e.with_context(format!("parsing {}", path_ref.display())))?;

        log::debug!("Loaded engine configuration from {}", path_ref.display());
        Ok(config)
    }

    #[cfg(feature = "config")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment variable overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = EngineConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TEDDY_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("TEDDY_VERBOSITY") {
            self.verbosity = Verbosity::from_str(&level);
        }
        if let Some(root) = lookup("TEDDY_TEMPLATE_ROOT") {
            self.template_root = root;
        }
        if let Some(strict) = lookup("TEDDY_STRICT_PARSER") {
            self.strict_parser = parse_flag(&strict)
                .ok_or_else(|| Error::config("Invalid TEDDY_STRICT_PARSER value"))?;
        }
        if let Some(always) = lookup("TEDDY_COMPILE_AT_EVERY_RENDER") {
            self.compile_at_every_render = parse_flag(&always)
                .ok_or_else(|| Error::config("Invalid TEDDY_COMPILE_AT_EVERY_RENDER value"))?;
        }
        if let Some(passes) = lookup("TEDDY_MAX_PASSES") {
            self.max_passes = passes
                .trim()
                .parse()
                .map_err(|_| Error::config("Invalid TEDDY_MAX_PASSES value"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_passes == 0 {
            return Err(Error::config("max_passes must be at least 1"));
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(Error::config("extension cannot be empty"));
        }
        Ok(())
    }

    /// The extension with its leading dot, e.g. `.html`
    pub fn extension_suffix(&self) -> String {
        format!(".{}", self.extension.trim_start_matches('.'))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
