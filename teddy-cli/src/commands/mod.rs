pub mod compile;
pub mod render;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use teddy::{EngineConfig, TeddyEngine, Verbosity};

/// Engine settings gathered from global flags
#[derive(Debug, Default)]
pub struct EngineOptions {
    pub root: Option<PathBuf>,
    pub verbosity: Option<String>,
    pub strict: bool,
    pub config: Option<PathBuf>,
}

impl EngineOptions {
    /// Config file (or environment), then flags on top
    pub fn config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = EngineConfig::from_file(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                config.apply_env_overrides()?;
                config
            }
            None => EngineConfig::from_env()?,
        };

        if let Some(root) = &self.root {
            config.template_root = root_with_separator(root);
        }
        if let Some(level) = &self.verbosity {
            config.verbosity = Verbosity::from_str(level);
        }
        if self.strict {
            config.strict_parser = true;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn build(&self) -> Result<TeddyEngine> {
        let config = self.config()?;
        log::debug!(
            "Using template root {} ({} verbosity)",
            config.template_root,
            config.verbosity.as_str()
        );
        Ok(TeddyEngine::new(config))
    }
}

/// Template names are stripped of the root as a string prefix, so the root
/// always ends with a separator
fn root_with_separator(root: &Path) -> String {
    let root = root.display().to_string();
    if root.ends_with('/') {
        root
    } else {
        format!("{}/", root)
    }
}

/// Write to `output` when given, stdout otherwise
pub fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let options = EngineOptions {
            root: Some(PathBuf::from("views")),
            verbosity: Some("debug".to_string()),
            strict: true,
            config: None,
        };
        let config = options.config().unwrap();
        assert_eq!(config.template_root, "views/");
        assert_eq!(config.verbosity, Verbosity::Debug);
        assert!(config.strict_parser);
    }

    #[test]
    fn test_missing_config_file() {
        let options = EngineOptions {
            config: Some(PathBuf::from("/nonexistent/teddy.toml")),
            ..EngineOptions::default()
        };
        assert!(options.config().is_err());
    }
}
