//! Tree resolution
//!
//! A [`Renderer`] walks one parsed template through the engine's stages:
//! conditionals, one-line conditionals and includes until none are left,
//! then loops, then cleanup of orphaned `else` branches. Each stage replaces
//! the control element it handled with plain markup.

mod conditional;
mod filters;
mod foreach;
mod include;

use crate::compiler::collapse_tag_gaps;
use crate::config::Verbosity;
use crate::dom::{Document, ParseIssue, Severity};
use crate::engine::TeddyEngine;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::scope::RenderContext;
use crate::substitute::{substitute, SubstitutionOutcome};

pub use filters::is_non_looped;

/// Problems a render worked around. None of them stop the render.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderWarning {
    #[error("<{tag}> element found with no \"{attribute}\" attribute, element ignored")]
    MissingAttribute {
        tag: &'static str,
        attribute: &'static str,
    },

    #[error("<include> references a template that could not be loaded (\"{name}\"): {reason}")]
    MissingTemplate { name: String, reason: String },

    #[error("<foreach> \"in\" attribute \"{path}\" does not resolve to a value, element ignored")]
    UndefinedCollection { path: String },

    #[error("<arg> with no attribute inside <include src=\"{include}\">, include ignored")]
    ArgWithoutName { include: String },

    #[error("<{tag}> found inside <include src=\"{include}\"> where only <arg> is allowed")]
    UnexpectedChild { include: String, tag: String },

    #[error("{{{name}}} does not resolve against the model")]
    UnresolvedVariable { name: String },

    #[error("{stage} gave up after {passes} passes, a template or variable probably references itself")]
    RunawayExpansion { stage: &'static str, passes: usize },

    #[error("markup {0}")]
    Parse(ParseIssue),
}

impl RenderWarning {
    /// Lowest verbosity at which this warning is logged
    pub fn level(&self) -> Verbosity {
        match self {
            RenderWarning::UnresolvedVariable { .. } => Verbosity::Verbose,
            RenderWarning::Parse(issue) if issue.severity == Severity::Warning => {
                Verbosity::Verbose
            }
            _ => Verbosity::Concise,
        }
    }
}

/// Resolves one template render against an engine
pub struct Renderer<'e> {
    engine: &'e TeddyEngine,
    context: RenderContext,
}

impl<'e> Renderer<'e> {
    pub fn new(engine: &'e TeddyEngine, base: Model) -> Self {
        Self {
            engine,
            context: RenderContext::new(base),
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn into_warnings(self) -> Vec<RenderWarning> {
        self.context.into_warnings()
    }

    fn verbosity(&self) -> Verbosity {
        self.engine.config().verbosity
    }

    fn max_passes(&self) -> usize {
        self.engine.config().max_passes.max(1)
    }

    /// Render compiled template text to its final string
    pub fn run(&mut self, compiled: &str, origin: &str) -> Result<String> {
        let base = self.context.base().clone();
        let mut doc = self.parse(compiled, origin)?;

        self.resolve_pending(&mut doc, &base)?;
        self.resolve_loops(&mut doc)?;
        conditional::remove_dangling(&mut doc);

        let html = doc.to_html();
        let html = self.substitute(&html, &base, "variable substitution", true);
        Ok(collapse_tag_gaps(&html))
    }

    /// Resolve conditionals, one-liners and includes outside unexpanded
    /// loops until none remain
    pub(crate) fn resolve_pending(&mut self, doc: &mut Document, ambient: &Model) -> Result<()> {
        let max_passes = self.max_passes();

        for _ in 0..max_passes {
            let conditionals = filters::conditionals(doc);
            let one_liners = filters::one_liners(doc);
            if conditionals.is_empty() && one_liners.is_empty() && filters::first_include(doc).is_none()
            {
                return Ok(());
            }

            for node in conditionals {
                if doc.is_attached(node) {
                    self.resolve_conditional(doc, node, ambient)?;
                }
            }
            for node in one_liners {
                if doc.is_attached(node) {
                    self.resolve_one_liner(doc, node, ambient);
                }
            }

            let mut includes = 0;
            while let Some(node) = filters::first_include(doc) {
                if includes >= max_passes {
                    self.warn(RenderWarning::RunawayExpansion {
                        stage: "include resolution",
                        passes: includes,
                    });
                    return Ok(());
                }
                self.resolve_include(doc, node, ambient)?;
                includes += 1;
            }
        }

        self.warn(RenderWarning::RunawayExpansion {
            stage: "conditional resolution",
            passes: max_passes,
        });
        Ok(())
    }

    /// Parse markup produced during the render, reporting what the parser
    /// worked around. Fatal problems abort only with a strict parser.
    pub(crate) fn parse(&mut self, markup: &str, origin: &str) -> Result<Document> {
        let outcome = Document::parse(markup);

        for issue in outcome.issues {
            if issue.severity == Severity::Fatal {
                if self.verbosity().allows(Verbosity::Concise) {
                    log::error!("Fatal markup error in {}: {}", origin, issue);
                }
                if self.engine.config().strict_parser {
                    return Err(Error::parse(issue.line, issue.column, issue.message)
                        .with_context(format!("parsing {}", origin)));
                }
            }
            self.warn(RenderWarning::Parse(issue));
        }

        Ok(outcome.document)
    }

    /// Substitute variables; unresolved names are only reported for the
    /// final pass since earlier stages legitimately leave loop variables
    pub(crate) fn substitute(
        &mut self,
        text: &str,
        model: &Model,
        stage: &'static str,
        report_unresolved: bool,
    ) -> String {
        let result = substitute(text, model, self.max_passes());

        if let SubstitutionOutcome::Runaway { passes } = result.outcome {
            self.warn(RenderWarning::RunawayExpansion { stage, passes });
        }
        if report_unresolved {
            for name in &result.unresolved {
                self.warn(RenderWarning::UnresolvedVariable { name: name.clone() });
            }
        }
        result.text
    }

    /// Log at the warning's level and keep it for the render report
    pub(crate) fn warn(&mut self, warning: RenderWarning) {
        if self.verbosity().allows(warning.level()) {
            match &warning {
                RenderWarning::Parse(issue) if issue.severity == Severity::Fatal => {}
                _ => log::warn!("{}", warning),
            }
        }
        self.context.record(warning);
    }

    pub(crate) fn trace(&self, message: impl FnOnce() -> String) {
        if self.verbosity().allows(Verbosity::Debug) {
            log::debug!("{}", message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::source::MemorySource;
    use serde_json::json;

    fn engine(templates: &[(&str, &str)]) -> TeddyEngine {
        let source = MemorySource::new();
        for (name, body) in templates {
            source.insert(*name, *body);
        }
        TeddyEngine::with_source(EngineConfig::default(), source)
    }

    fn run(engine: &TeddyEngine, markup: &str, model: serde_json::Value) -> (String, Vec<RenderWarning>) {
        let mut renderer = Renderer::new(engine, crate::model::flatten(&model));
        let html = renderer.run(markup, "test").unwrap();
        (html, renderer.into_warnings())
    }

    #[test]
    fn test_stages_run_in_order() {
        let engine = engine(&[("row.html", "<td>{cell}</td>")]);
        let (html, warnings) = run(
            &engine,
            r#"<if show><table><foreach val="cell" in="cells"><include src="row"><arg cell>{cell}</arg></include></foreach></table></if><else>hidden</else>"#,
            json!({ "show": true, "cells": ["a", "b"] }),
        );
        assert_eq!(html, "<table><td>a</td><td>b</td></table>");
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_unresolved_variables_reported_once_at_the_end() {
        let engine = engine(&[]);
        let (html, warnings) = run(
            &engine,
            r#"<foreach val="x" in="xs"><p>{x}{missing}</p></foreach>"#,
            json!({ "xs": [1] }),
        );
        assert_eq!(html, "<p>1{missing}</p>");
        assert_eq!(
            warnings,
            vec![RenderWarning::UnresolvedVariable {
                name: "missing".to_string()
            }]
        );
    }

    #[test]
    fn test_strict_parser_rejects_fatal_markup() {
        let source = MemorySource::new();
        let config = EngineConfig {
            strict_parser: true,
            ..EngineConfig::default()
        };
        let engine = TeddyEngine::with_source(config, source);
        let mut renderer = Renderer::new(&engine, Model::new());
        let err = renderer.run(r#"<p class="open>"#, "broken.html").unwrap_err();
        assert_eq!(err.error_code(), "E_PARSE");
    }

    #[test]
    fn test_lenient_parser_keeps_going() {
        let engine = engine(&[]);
        let (html, warnings) = run(&engine, r#"<p>{a}</p><b title="x"#, json!({ "a": 1 }));
        assert_eq!(html, r#"<p>1</p><b title="x"#);
        assert!(matches!(
            &warnings[0],
            RenderWarning::Parse(issue) if issue.severity == Severity::Fatal
        ));
    }

    #[test]
    fn test_warning_levels() {
        assert_eq!(
            RenderWarning::UnresolvedVariable { name: "a".into() }.level(),
            Verbosity::Verbose
        );
        assert_eq!(
            RenderWarning::UndefinedCollection { path: "a".into() }.level(),
            Verbosity::Concise
        );
        assert_eq!(
            RenderWarning::UnresolvedVariable { name: "a".into() }.to_string(),
            "{a} does not resolve against the model"
        );
    }
}
