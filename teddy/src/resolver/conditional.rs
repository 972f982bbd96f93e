use super::Renderer;
use crate::condition::{one_liner_attr, parse_payload, Condition, ConditionKind};
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::model::Model;
use crate::scope::LOCAL_MODEL_ATTR;

/// The `if`/`unless` at `start` plus the `elseif`/`elseunless`/`else`
/// siblings that follow it. Unrelated nodes in between are skipped; the
/// group ends at the next `if`/`unless` or when siblings run out.
pub fn group_members(doc: &Document, start: NodeId) -> Vec<NodeId> {
    let mut members = vec![start];
    let mut current = doc.next_sibling(start);

    while let Some(node) = current {
        match doc.tag_name(node).and_then(ConditionKind::from_tag) {
            Some(kind) if kind.starts_group() => break,
            Some(kind) if kind.continues_group() => members.push(node),
            _ => {}
        }
        current = doc.next_sibling(node);
    }
    members
}

/// Drop `elseif`, `elseunless` and `else` elements left without a group
pub fn remove_dangling(doc: &mut Document) -> usize {
    let root = doc.root();
    let dangling: Vec<NodeId> = ["elseif", "elseunless", "else"]
        .iter()
        .flat_map(|tag| doc.elements_by_tag(root, tag))
        .collect();
    for &node in &dangling {
        doc.detach(node);
    }
    dangling.len()
}

impl Renderer<'_> {
    /// Replace a condition group with the content of its first matching
    /// branch, or with nothing
    pub(super) fn resolve_conditional(
        &mut self,
        doc: &mut Document,
        start: NodeId,
        ambient: &Model,
    ) -> Result<()> {
        let model = self.context.apply(doc, start, ambient);
        let members = group_members(doc, start);

        let mut matched = None;
        for &member in &members {
            let Some(el) = doc.element(member) else {
                continue;
            };
            let Some(kind) = ConditionKind::from_tag(&el.name) else {
                continue;
            };
            let condition = Condition::from_element(el, kind, |value| {
                self.substitute(value, &model, "condition", false)
            });
            if condition.evaluate(&model) {
                self.trace(|| format!("<{}> matched", kind.as_str()));
                matched = Some(member);
                break;
            }
        }

        match matched {
            Some(branch) => {
                let content = doc.inner_html(branch);
                let fragment = self.parse(&content, "conditional branch")?;
                doc.replace_with_fragment(start, &fragment);
            }
            None => {
                self.trace(|| "condition group produced nothing".to_string());
                doc.detach(start);
            }
        }
        for &member in members.iter().filter(|&&m| m != start) {
            doc.detach(member);
        }
        Ok(())
    }

    /// Evaluate an `if-<key>` attribute and set the chosen `true`/`false`
    /// payload on the element itself
    pub(super) fn resolve_one_liner(&mut self, doc: &mut Document, node: NodeId, ambient: &Model) {
        let model = self.context.apply(doc, node, ambient);
        let Some(el) = doc.element(node) else {
            return;
        };

        let condition = Condition::from_element(el, ConditionKind::OneLine, |value| {
            self.substitute(value, &model, "condition", false)
        });
        let outcome = condition.evaluate(&model);
        let payload = el
            .attr(if outcome { "true" } else { "false" })
            .map(str::to_string);
        let test_attr = one_liner_attr(el);

        if let Some(el) = doc.element_mut(node) {
            if let Some(name) = test_attr {
                el.remove_attr(&name);
            }
            el.remove_attr("true");
            el.remove_attr("false");
            el.remove_attr(LOCAL_MODEL_ATTR);

            if let Some((name, value)) = payload.as_deref().and_then(parse_payload) {
                el.set_attr(&name, value);
            }
        }
        self.trace(|| format!("one-line conditional evaluated to {}", outcome));
    }
}
