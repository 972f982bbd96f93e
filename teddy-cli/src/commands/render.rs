use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use teddy::TeddyEngine;

pub fn run(
    engine: &TeddyEngine,
    template: &str,
    model: Option<PathBuf>,
    output: Option<PathBuf>,
    warnings: bool,
) -> Result<()> {
    let model = match model {
        Some(path) => load_model(&path)?,
        None => Value::Object(Default::default()),
    };

    let report = engine
        .render_report(template, &model)
        .with_context(|| format!("Failed to render {}", template))?;

    if warnings {
        if report.warnings.is_empty() {
            eprintln!("No warnings");
        }
        for warning in &report.warnings {
            eprintln!("warning: {}", warning);
        }
    }

    super::emit(&report.html, output.as_deref())
}

pub fn load_model(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read model {}", path.display()))?;
    let model: Value = serde_json::from_str(&content)
        .with_context(|| format!("Model {} is not valid JSON", path.display()))?;
    if !model.is_object() {
        log::warn!(
            "Model {} is not a JSON object, rendering with an empty model",
            path.display()
        );
    }
    Ok(model)
}
