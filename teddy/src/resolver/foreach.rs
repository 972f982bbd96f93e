use super::{RenderWarning, Renderer};
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::model::{is_truthy, lookup, Model};
use crate::scope::LOOPED_ATTR;
use serde_json::Value;

/// `(key, value)` pairs a collection iterates over. Sequence and string
/// indices are bound as strings.
pub fn entries(collection: &Value) -> Vec<(String, Value)> {
    match collection {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (i.to_string(), item.clone()))
            .collect(),
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Value::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Value::String(c.to_string())))
            .collect(),
        _ => Vec::new(),
    }
}

impl Renderer<'_> {
    /// Expand every `foreach`, outermost first, until none are left
    pub(super) fn resolve_loops(&mut self, doc: &mut Document) -> Result<()> {
        let base = self.context.base().clone();
        let max_passes = self.max_passes();

        for _ in 0..max_passes {
            let outermost: Vec<NodeId> = doc
                .elements_by_tag(doc.root(), "foreach")
                .into_iter()
                .filter(|&node| !doc.ancestors(node).any(|a| doc.is_tag(a, "foreach")))
                .collect();
            if outermost.is_empty() {
                return Ok(());
            }
            for node in outermost {
                self.resolve_foreach(doc, node, &base)?;
            }
        }

        self.warn(RenderWarning::RunawayExpansion {
            stage: "loop resolution",
            passes: max_passes,
        });
        Ok(())
    }

    fn resolve_foreach(&mut self, doc: &mut Document, node: NodeId, ambient: &Model) -> Result<()> {
        let attr = |name: &str| {
            doc.attr(node, name)
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
        };
        let (val, collection_path, key) = (attr("val"), attr("in"), attr("key"));

        let Some(val) = val else {
            self.warn(RenderWarning::MissingAttribute {
                tag: "foreach",
                attribute: "val",
            });
            doc.detach(node);
            return Ok(());
        };
        let Some(collection_path) = collection_path else {
            self.warn(RenderWarning::MissingAttribute {
                tag: "foreach",
                attribute: "in",
            });
            doc.detach(node);
            return Ok(());
        };

        let mut working = self.context.apply(doc, node, ambient);
        let collection = lookup(&working, &collection_path);
        let Some(collection) = collection.filter(|c| is_truthy(Some(c))) else {
            self.warn(RenderWarning::UndefinedCollection {
                path: collection_path,
            });
            doc.detach(node);
            return Ok(());
        };

        doc.set_attr(node, LOOPED_ATTR, "true");
        let body = doc.inner_html(node);
        let entries = entries(&collection);
        self.trace(|| {
            format!(
                "expanding <foreach val=\"{}\" in=\"{}\"> over {} entries",
                val,
                collection_path,
                entries.len()
            )
        });

        let mut output = String::new();
        for (entry_key, item) in entries {
            let mut binding = Model::new();
            binding.insert(val.clone(), item);
            if let Some(key) = &key {
                binding.insert(key.clone(), Value::String(entry_key));
            }
            working.extend(binding.clone());

            let text = self.substitute(&body, &working, "loop body", false);
            let mut fragment = self.parse(&text, "loop body")?;

            // nested loops are expanded later against the base model
            let root = fragment.root();
            if !fragment.elements_by_tag(root, "foreach").is_empty() {
                self.context.tag_merged(&mut fragment, root, &binding);
            }

            self.resolve_pending(&mut fragment, &working)?;
            output.push_str(&fragment.to_html());
        }

        let expanded = self.parse(&output, "loop output")?;
        doc.replace_with_fragment(node, &expanded);
        Ok(())
    }
}
