use crate::condition::is_one_liner;
use crate::dom::{Document, NodeId};
use crate::scope::LOOPED_ATTR;

/// False when some ancestor is a `foreach` whose body has not been expanded
/// yet; such nodes are handled per iteration instead.
pub fn is_non_looped(doc: &Document, node: NodeId) -> bool {
    !doc
        .ancestors(node)
        .any(|a| doc.is_tag(a, "foreach") && doc.attr(a, LOOPED_ATTR).is_none())
}

/// Every eligible `if`, then every eligible `unless`, each in document order
pub fn conditionals(doc: &Document) -> Vec<NodeId> {
    let root = doc.root();
    ["if", "unless"]
        .iter()
        .flat_map(|tag| doc.elements_by_tag(root, tag))
        .filter(|&node| is_non_looped(doc, node))
        .collect()
}

pub fn one_liners(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|&node| doc.element(node).map(is_one_liner).unwrap_or(false))
        .filter(|&node| is_non_looped(doc, node))
        .collect()
}

pub fn first_include(doc: &Document) -> Option<NodeId> {
    doc.elements_by_tag(doc.root(), "include")
        .into_iter()
        .find(|&node| is_non_looped(doc, node))
}
