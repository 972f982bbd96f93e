//! Local model overlays
//!
//! Includes with arguments and loops whose body holds further loops bind
//! values that only their own subtree may see. Each binding is pushed onto
//! the render's [`ScopeStack`] and the returned handle is written onto the
//! control elements of the subtree as a `data-local-model` attribute. When
//! such an element is evaluated the overlay is merged over a copy of the
//! ambient model; the ambient model itself is never touched.

use crate::condition::is_one_liner;
use crate::dom::{Document, NodeId};
use crate::model::Model;
use crate::resolver::RenderWarning;
use std::collections::HashMap;

/// Attribute holding a 1-based overlay handle
pub const LOCAL_MODEL_ATTR: &str = "data-local-model";

/// Set on a `foreach` once its body has been expanded
pub const LOOPED_ATTR: &str = "looped";

/// Elements that read the model and therefore receive overlay handles
pub const SCOPED_TAGS: &[&str] = &["if", "elseif", "unless", "elseunless", "foreach"];

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    overlays: Vec<Model>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an overlay and return its handle
    pub fn push(&mut self, overlay: Model) -> usize {
        self.overlays.push(overlay);
        self.overlays.len()
    }

    pub fn get(&self, handle: usize) -> Option<&Model> {
        handle.checked_sub(1).and_then(|i| self.overlays.get(i))
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

/// Overlay handle carried by a node, if any
pub fn handle_of(doc: &Document, node: NodeId) -> Option<usize> {
    doc.attr(node, LOCAL_MODEL_ATTR)?
        .trim()
        .parse()
        .ok()
        .filter(|handle| *handle > 0)
}

/// Whether `node` receives overlay handles when its subtree is tagged
pub fn is_scoped(doc: &Document, node: NodeId) -> bool {
    match doc.element(node) {
        Some(el) => SCOPED_TAGS.iter().any(|tag| el.is(tag)) || is_one_liner(el),
        None => false,
    }
}

/// State owned by a single render call
#[derive(Debug)]
pub struct RenderContext {
    base: Model,
    scopes: ScopeStack,
    warnings: Vec<RenderWarning>,
}

impl RenderContext {
    pub fn new(base: Model) -> Self {
        Self {
            base,
            scopes: ScopeStack::new(),
            warnings: Vec::new(),
        }
    }

    /// The flattened model the render started with
    pub fn base(&self) -> &Model {
        &self.base
    }

    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    pub fn push(&mut self, overlay: Model) -> usize {
        self.scopes.push(overlay)
    }

    /// Copy of `ambient` with the node's overlay merged over it
    pub fn apply(&self, doc: &Document, node: NodeId, ambient: &Model) -> Model {
        let mut model = ambient.clone();
        if let Some(overlay) = handle_of(doc, node).and_then(|h| self.scopes.get(h)) {
            for (key, value) in overlay {
                model.insert(key.clone(), value.clone());
            }
        }
        model
    }

    /// Point every scoped element under `root` at `handle`
    pub fn tag(&self, doc: &mut Document, root: NodeId, handle: usize) -> usize {
        let targets: Vec<NodeId> = doc
            .descendants(root)
            .into_iter()
            .filter(|&n| is_scoped(doc, n))
            .collect();
        for &node in &targets {
            doc.set_attr(node, LOCAL_MODEL_ATTR, handle.to_string());
        }
        targets.len()
    }

    /// Bind `binding` for every nested `foreach` under `root`.
    ///
    /// Only loops are tagged. Anything inside a nested loop picks the binding
    /// up through that loop's working model, underneath the loop's own
    /// `key`/`val`. Loops that already carry an overlay keep it: a new overlay
    /// holding the old one with `binding` on top is pushed once per distinct
    /// handle.
    pub fn tag_merged(&mut self, doc: &mut Document, root: NodeId, binding: &Model) -> usize {
        let targets: Vec<NodeId> = doc
            .descendants(root)
            .into_iter()
            .filter(|&n| doc.is_tag(n, "foreach"))
            .collect();

        let mut merged: HashMap<Option<usize>, usize> = HashMap::new();
        for &node in &targets {
            let existing = handle_of(doc, node);
            let handle = match merged.get(&existing) {
                Some(handle) => *handle,
                None => {
                    let mut overlay = existing
                        .and_then(|h| self.scopes.get(h))
                        .cloned()
                        .unwrap_or_default();
                    overlay.extend(binding.clone());
                    let handle = self.push(overlay);
                    merged.insert(existing, handle);
                    handle
                }
            };
            doc.set_attr(node, LOCAL_MODEL_ATTR, handle.to_string());
        }
        targets.len()
    }

    pub fn record(&mut self, warning: RenderWarning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[RenderWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<RenderWarning> {
        self.warnings
    }
}
