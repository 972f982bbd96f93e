use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use teddy::TeddyEngine;

pub fn run(engine: &TeddyEngine, templates: &[String]) -> Result<()> {
    for template in templates {
        engine
            .compile(template)
            .with_context(|| format!("Failed to compile {}", template))?;
        let compiled = engine
            .compiled(template)
            .ok_or_else(|| anyhow!("{} missing from cache after compiling", template))?;
        println!("{}", compiled);
    }
    Ok(())
}

/// Compile every template and emit one registration statement per line
pub fn package(engine: &TeddyEngine, templates: &[String], output: Option<PathBuf>) -> Result<()> {
    let mut statements = Vec::with_capacity(templates.len());
    for template in templates {
        engine
            .compile(template)
            .with_context(|| format!("Failed to compile {}", template))?;
        let packaged = engine
            .packaged(template)
            .ok_or_else(|| anyhow!("{} missing from cache after compiling", template))?;
        statements.push(packaged);
    }
    log::info!("Packaged {} templates", statements.len());
    super::emit(&statements.join("\n"), output.as_deref())
}
