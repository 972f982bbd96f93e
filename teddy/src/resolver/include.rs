use super::{RenderWarning, Renderer};
use crate::dom::{Document, NodeId};
use crate::error::{ErrorChain, Result};
use crate::model::Model;
use crate::substitute::render_var;
use serde_json::Value;

impl Renderer<'_> {
    /// Splice the referenced template in place of an `include`, binding its
    /// `arg` children both textually and as a local overlay
    pub(super) fn resolve_include(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        ambient: &Model,
    ) -> Result<()> {
        let Some(src) = doc.attr(node, "src").filter(|s| !s.is_empty()).map(str::to_string)
        else {
            self.warn(RenderWarning::MissingAttribute {
                tag: "include",
                attribute: "src",
            });
            doc.detach(node);
            return Ok(());
        };

        let model = self.context.apply(doc, node, ambient);
        let src = self.substitute(&src, &model, "include src", false);
        let name = self.engine.normalize_name(&src);

        let template = match self.engine.compiled_or_compile(&name) {
            Ok(template) => template,
            Err(e) => {
                self.warn(RenderWarning::MissingTemplate {
                    name,
                    reason: ErrorChain::new(&e).root_cause().to_string(),
                });
                doc.detach(node);
                return Ok(());
            }
        };

        let mut text = template.source.clone();
        let new_document = text.to_lowercase().contains("<!doctype");
        let mut overlay = Model::new();
        let mut has_args = false;

        for child in doc.child_elements(node) {
            let Some(el) = doc.element(child) else {
                continue;
            };
            if !el.is("arg") {
                self.warn(RenderWarning::UnexpectedChild {
                    include: src.clone(),
                    tag: el.name.clone(),
                });
                continue;
            }
            let Some(arg_name) = el.attrs.first().map(|a| a.name.to_lowercase()) else {
                self.warn(RenderWarning::ArgWithoutName { include: src });
                doc.detach(node);
                return Ok(());
            };

            let value = doc.inner_html(child);
            text = render_var(&text, &arg_name, &value);
            overlay.insert(arg_name, Value::String(value));
            has_args = true;
        }

        let mut fragment = self.parse(&text, &name)?;
        if has_args {
            let handle = self.context.push(overlay);
            let root = fragment.root();
            self.context.tag(&mut fragment, root, handle);
        }

        self.trace(|| {
            format!(
                "included {}{}",
                name,
                if new_document { " as a new document" } else { "" }
            )
        });
        if new_document {
            doc.replace_all(&fragment);
        } else {
            doc.replace_with_fragment(node, &fragment);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::TeddyEngine;
    use crate::source::MemorySource;
    use serde_json::json;

    fn resolve(engine: &TeddyEngine, markup: &str, model: serde_json::Value) -> (String, Vec<RenderWarning>) {
        let base = crate::model::flatten(&model);
        let mut renderer = Renderer::new(engine, base.clone());
        let mut doc = Document::parse(markup).document;
        renderer.resolve_pending(&mut doc, &base).unwrap();
        (doc.to_html(), renderer.into_warnings())
    }

    fn engine() -> TeddyEngine {
        let source = MemorySource::new()
            .with("greet.html", "<p>{greeting}</p>")
            .with("cond.html", "<if flag>{greeting}</if>")
            .with("page.html", "<!DOCTYPE html><html><body>{title}</body></html>");
        TeddyEngine::with_source(EngineConfig::default(), source)
    }

    #[test]
    fn test_args_are_substituted_and_scoped() {
        let engine = engine();
        let (html, warnings) = resolve(
            &engine,
            r#"<div><include src="greet"><arg greeting>Hi</arg></include></div>"#,
            json!({}),
        );
        assert_eq!(html, "<div><p>Hi</p></div>");
        assert!(warnings.is_empty());

        let (html, _) = resolve(
            &engine,
            r#"<include src="cond"><arg flag>yes</arg><arg greeting>Hey</arg></include>"#,
            json!({}),
        );
        assert_eq!(html, "Hey");
    }

    #[test]
    fn test_src_is_substituted() {
        let (html, _) = resolve(
            &engine(),
            r#"<include src="{which}"><arg greeting>Yo</arg></include>"#,
            json!({ "which": "greet" }),
        );
        assert_eq!(html, "<p>Yo</p>");
    }

    #[test]
    fn test_doctype_include_replaces_document() {
        let (html, _) = resolve(&engine(), r#"<p>before</p><include src="page"></include>"#, json!({}));
        assert_eq!(html, "<!DOCTYPE html><html><body>{title}</body></html>");
    }

    #[test]
    fn test_bad_includes_produce_nothing() {
        let engine = engine();

        let (html, warnings) = resolve(&engine, "<p>a</p><include></include>", json!({}));
        assert_eq!(html, "<p>a</p>");
        assert!(matches!(warnings[0], RenderWarning::MissingAttribute { .. }));

        let (html, warnings) = resolve(&engine, r#"<include src="nope"></include>b"#, json!({}));
        assert_eq!(html, "b");
        assert!(matches!(
            &warnings[0],
            RenderWarning::MissingTemplate { name, reason }
                if name == "nope.html" && reason == "Template not found: nope.html"
        ));

        let (html, warnings) = resolve(
            &engine,
            r#"<include src="greet"><arg>Hi</arg></include>c"#,
            json!({}),
        );
        assert_eq!(html, "c");
        assert!(matches!(warnings[0], RenderWarning::ArgWithoutName { .. }));
    }

    #[test]
    fn test_non_arg_children_are_ignored() {
        let (html, warnings) = resolve(
            &engine(),
            r#"<include src="greet"><span>x</span><arg greeting>Hi</arg></include>"#,
            json!({}),
        );
        assert_eq!(html, "<p>Hi</p>");
        assert!(matches!(&warnings[0], RenderWarning::UnexpectedChild { tag, .. } if tag == "span"));
    }
}
