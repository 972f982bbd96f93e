use super::{is_void, Document, Element, NodeId, NodeKind};

impl Document {
    /// Serialise everything under the root
    pub fn to_html(&self) -> String {
        self.inner_html(Self::ROOT)
    }

    /// Serialise the children of `id`
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialise `id` itself, tags included
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Document => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeKind::Element(el) => {
                write_start_tag(el, out);
                if is_void(&el.name) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Doctype(text) => {
                out.push_str("<!");
                out.push_str(text);
                out.push('>');
            }
        }
    }
}

fn write_start_tag(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for attr in &el.attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push('=');
        if !attr.value.contains('"') {
            out.push('"');
            out.push_str(&attr.value);
            out.push('"');
        } else if !attr.value.contains('\'') {
            out.push('\'');
            out.push_str(&attr.value);
            out.push('\'');
        } else {
            out.push('"');
            out.push_str(&attr.value.replace('"', "&quot;"));
            out.push('"');
        }
    }
    out.push('>');
}
