//! Template compilation
//!
//! Compiling a template is purely textual: control characters and `{! !}`
//! comments go, whitespace runs collapse to one space and the space between
//! two adjacent tags disappears. The result is cached by normalised name.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\f\n\r\t\v]").expect("Compiler: Invalid control character regex"));

static TEMPLATE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{!.*?!\}").expect("Compiler: Invalid comment regex"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("Compiler: Invalid whitespace regex"));

static SPACE_BETWEEN_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"> <").expect("Compiler: Invalid tag gap regex"));

/// Run the compile passes over raw template source
pub fn compile_source(source: &str) -> String {
    let text = CONTROL_CHARS.replace_all(source, "");
    let text = TEMPLATE_COMMENT.replace_all(&text, "");
    let text = WHITESPACE_RUN.replace_all(&text, " ");
    collapse_tag_gaps(&text)
}

/// `> <` becomes `><`
pub fn collapse_tag_gaps(text: &str) -> String {
    SPACE_BETWEEN_TAGS.replace_all(text, "><").into_owned()
}

/// Script statement that registers a compiled template with a remote peer
pub fn package(name: &str, compiled: &str) -> String {
    format!(
        "teddy.compiledTemplates['{}']='{}';",
        name,
        compiled.replace('\\', "\\\\").replace('\'', "\\'")
    )
}

/// Map a caller supplied template name onto its cache key.
///
/// The template root is stripped (as a prefix, or its first occurrence),
/// then any leading slash, and the extension is appended when missing.
pub fn normalize_name(name: &str, template_root: &str, suffix: &str) -> String {
    let mut name = name.to_string();
    if !template_root.is_empty() {
        name = match name.strip_prefix(template_root) {
            Some(rest) => rest.to_string(),
            None => name.replacen(template_root, "", 1),
        };
    }
    let name = name.trim_start_matches('/');
    if name.ends_with(suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub name: String,
    pub source: String,
    pub packaged: String,
}

impl CompiledTemplate {
    pub fn new(name: &str, raw: &str) -> Self {
        let source = compile_source(raw);
        let packaged = package(name, &source);
        Self {
            name: name.to_string(),
            source,
            packaged,
        }
    }
}

/// Compiled templates by normalised name, shared between renders
#[derive(Clone, Default)]
pub struct TemplateCache {
    entries: Arc<DashMap<String, Arc<CompiledTemplate>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<CompiledTemplate>> {
        self.entries.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn insert(&self, template: CompiledTemplate) -> Arc<CompiledTemplate> {
        let template = Arc::new(template);
        self.entries
            .insert(template.name.clone(), Arc::clone(&template));
        template
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
