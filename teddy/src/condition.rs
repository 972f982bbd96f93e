//! Condition evaluation for `if`, `unless`, their `else` forms and one-line
//! conditional attributes.
//!
//! A conditional element's attributes are lowered, in document order, into a
//! sequence of tests and boolean combinators which is then folded left to
//! right without precedence.

use crate::dom::Element;
use crate::model::{is_truthy, lookup, loose_eq, Model};
use crate::scope::LOCAL_MODEL_ATTR;

/// Tags the engine consumes; none of them can be a one-line conditional
pub const CONTROL_TAGS: &[&str] = &[
    "if",
    "unless",
    "elseif",
    "elseunless",
    "else",
    "foreach",
    "include",
    "arg",
];

const NEGATION_PREFIX: &str = "not:";
const ONE_LINER_PREFIX: &str = "if-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    If,
    Unless,
    ElseIf,
    ElseUnless,
    Else,
    OneLine,
}

impl ConditionKind {
    /// Kind of a conditional tag; `None` for anything else
    pub fn from_tag(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "if" => Some(ConditionKind::If),
            "unless" => Some(ConditionKind::Unless),
            "elseif" => Some(ConditionKind::ElseIf),
            "elseunless" => Some(ConditionKind::ElseUnless),
            "else" => Some(ConditionKind::Else),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::If => "if",
            ConditionKind::Unless => "unless",
            ConditionKind::ElseIf => "elseif",
            ConditionKind::ElseUnless => "elseunless",
            ConditionKind::Else => "else",
            ConditionKind::OneLine => "one-line if",
        }
    }

    /// `if` and `unless` open a new group
    pub fn starts_group(&self) -> bool {
        matches!(self, ConditionKind::If | ConditionKind::Unless)
    }

    /// `elseif`, `elseunless` and `else` continue a group
    pub fn continues_group(&self) -> bool {
        matches!(
            self,
            ConditionKind::ElseIf | ConditionKind::ElseUnless | ConditionKind::Else
        )
    }

    fn is_inverted(&self) -> bool {
        matches!(self, ConditionKind::Unless | ConditionKind::ElseUnless)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
    Xor,
}

impl Combinator {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "and" => Some(Combinator::And),
            "or" => Some(Combinator::Or),
            "xor" => Some(Combinator::Xor),
            _ => None,
        }
    }

    pub fn apply(&self, left: bool, right: bool) -> bool {
        match self {
            Combinator::And => left && right,
            Combinator::Or => left || right,
            Combinator::Xor => left != right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    /// Dot path into the model, without any `not:` prefix
    pub key: String,
    /// Lower-cased attribute name as written
    pub raw_name: String,
    /// Attribute value after variable substitution
    pub literal: String,
    pub negate: bool,
}

impl Test {
    fn evaluate(&self, kind: ConditionKind, model: &Model) -> bool {
        let value = lookup(model, &self.key);
        let literal = self.literal.to_lowercase();

        // a negated test only repeats its name with the `not:` prefix
        let truthiness = self.literal.is_empty()
            || literal == self.raw_name
            || (!self.negate && literal == self.key);

        let hit = if truthiness {
            is_truthy(value.as_ref())
        } else {
            loose_eq(value.as_ref(), &self.literal)
        };
        let hit = if kind.is_inverted() { !hit } else { hit };
        hit != self.negate
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTerm {
    Test(Test),
    Combinator(Combinator),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub kind: ConditionKind,
    pub terms: Vec<ConditionTerm>,
}

impl Condition {
    /// Lower a conditional element into terms.
    ///
    /// `resolve` runs variable substitution over each attribute value.
    pub fn from_element<F>(el: &Element, kind: ConditionKind, mut resolve: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        let mut terms = Vec::new();

        match kind {
            ConditionKind::Else => {}
            ConditionKind::OneLine => {
                if let Some(attr) = el
                    .attrs
                    .iter()
                    .find(|a| a.name.to_lowercase().starts_with(ONE_LINER_PREFIX))
                {
                    let raw_name = attr.name.to_lowercase();
                    let key = raw_name[ONE_LINER_PREFIX.len()..].to_string();
                    terms.push(ConditionTerm::Test(Test {
                        key,
                        raw_name,
                        literal: resolve(attr.value.trim()),
                        negate: false,
                    }));
                }
            }
            _ => {
                for attr in &el.attrs {
                    let name = attr.name.to_lowercase();
                    if name == LOCAL_MODEL_ATTR || name == "xmlns" {
                        continue;
                    }
                    if let Some(combinator) = Combinator::from_name(&name) {
                        terms.push(ConditionTerm::Combinator(combinator));
                        continue;
                    }
                    let (key, negate) = match name.strip_prefix(NEGATION_PREFIX) {
                        Some(stripped) => (stripped.to_string(), true),
                        None => (name.clone(), false),
                    };
                    terms.push(ConditionTerm::Test(Test {
                        key,
                        raw_name: name,
                        literal: resolve(attr.value.trim()),
                        negate,
                    }));
                }
            }
        }

        Self { kind, terms }
    }

    /// Fold the terms left to right.
    ///
    /// A combinator missing its left side starts from `false`, one missing
    /// its right side combines with `false`, and a test not preceded by a
    /// combinator after the first one is ignored. No terms at all is false.
    pub fn evaluate(&self, model: &Model) -> bool {
        if self.kind == ConditionKind::Else {
            return true;
        }

        let mut result: Option<bool> = None;
        let mut pending: Option<Combinator> = None;

        for term in &self.terms {
            match term {
                ConditionTerm::Combinator(combinator) => {
                    if let Some(previous) = pending.replace(*combinator) {
                        result = Some(previous.apply(result.unwrap_or(false), false));
                    }
                }
                ConditionTerm::Test(test) => {
                    let value = test.evaluate(self.kind, model);
                    match pending.take() {
                        Some(combinator) => {
                            result = Some(combinator.apply(result.unwrap_or(false), value));
                        }
                        None if result.is_none() => result = Some(value),
                        None => {}
                    }
                }
            }
        }

        if let Some(combinator) = pending {
            result = Some(combinator.apply(result.unwrap_or(false), false));
        }
        result.unwrap_or(false)
    }
}

/// Any non-control element with an `if-<key>` attribute and a `true` or
/// `false` payload
pub fn is_one_liner(el: &Element) -> bool {
    !CONTROL_TAGS.iter().any(|tag| el.is(tag))
        && el
            .attrs
            .iter()
            .any(|a| a.name.to_lowercase().starts_with(ONE_LINER_PREFIX))
        && (el.has_attr("true") || el.has_attr("false"))
}

/// Name of the `if-<key>` attribute on a one-line conditional
pub fn one_liner_attr(el: &Element) -> Option<String> {
    el.attrs
        .iter()
        .find(|a| a.name.to_lowercase().starts_with(ONE_LINER_PREFIX))
        .map(|a| a.name.clone())
}

/// Split a `true=`/`false=` payload such as `class='active'` into the
/// attribute to set. Quotes are dropped; text after a second `=` is ignored.
pub fn parse_payload(payload: &str) -> Option<(String, String)> {
    let mut parts = payload.split('=');
    let name = parts.next()?.trim();
    if name.is_empty() {
        return None;
    }
    let value = parts.next().unwrap_or("").replace(['"', '\''], "");
    Some((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::model::flatten;
    use serde_json::json;

    fn eval(markup: &str, model: serde_json::Value) -> bool {
        let doc = Document::parse(markup).document;
        let node = doc.children(doc.root())[0];
        let el = doc.element(node).unwrap();
        let kind = ConditionKind::from_tag(&el.name).unwrap_or(ConditionKind::OneLine);
        Condition::from_element(el, kind, |v| v.to_string()).evaluate(&flatten(&model))
    }

    #[test]
    fn test_truthiness_branch() {
        assert!(eval("<if something></if>", json!({ "something": "x" })));
        assert!(eval(r#"<if something="something"></if>"#, json!({ "something": 1 })));
        assert!(!eval("<if something></if>", json!({ "something": "" })));
        assert!(!eval("<if something></if>", json!({})));
        assert!(eval("<if list></if>", json!({ "list": [] })));
    }

    #[test]
    fn test_equality_branch() {
        assert!(eval(r#"<if something="hello"></if>"#, json!({ "something": "hello" })));
        assert!(!eval(r#"<if something="hello"></if>"#, json!({ "something": "Hello" })));
        assert!(eval(r#"<if count="3"></if>"#, json!({ "count": 3 })));
        assert!(eval(r#"<if user.role="admin"></if>"#, json!({ "user": { "role": "admin" } })));
        assert!(!eval(r#"<if missing="x"></if>"#, json!({})));
    }

    #[test]
    fn test_negation_and_unless() {
        let model = json!({ "a": true, "b": "x" });
        for markup in ["<if a></if>", r#"<if b="x"></if>"#, r#"<if b="y"></if>"#, "<if c></if>"] {
            let positive = eval(markup, model.clone());
            let negated = markup.replacen("<if ", "<if not:", 1);
            let unless = markup.replace("if", "unless");
            assert_eq!(eval(&negated, model.clone()), !positive, "{}", negated);
            assert_eq!(eval(&unless, model.clone()), !positive, "{}", unless);
        }
        assert!(eval("<unless not:a></unless>", model.clone()));
        assert!(eval("<elseunless c></elseunless>", model));

        // the bare key is an ordinary literal under negation
        let model = json!({ "a": "x" });
        assert!(eval(r#"<if not:a="a"></if>"#, model.clone()));
        assert!(!eval(r#"<if not:a="not:a"></if>"#, model.clone()));
        assert!(!eval(r#"<if not:a="NOT:A"></if>"#, model));
    }

    #[test]
    fn test_combinators_fold_left() {
        let model = json!({ "t": true, "f": false });
        assert!(eval("<if t and t></if>", model.clone()));
        assert!(!eval("<if t and f></if>", model.clone()));
        assert!(eval("<if f or t></if>", model.clone()));
        assert!(eval("<if t xor f></if>", model.clone()));
        assert!(!eval("<if t xor t></if>", model.clone()));
        // (t or f) and f, no precedence
        assert!(!eval("<if t or f and f></if>", model.clone()));
        // leading combinator starts from false
        assert!(!eval("<if and t></if>", model.clone()));
        assert!(eval("<if or t></if>", model.clone()));
        // trailing combinator meets false
        assert!(!eval("<if t and></if>", model.clone()));
        assert!(eval("<if t or></if>", model.clone()));
        // a second test without a combinator is ignored
        assert!(eval("<if t f></if>", model.clone()));
        assert!(!eval("<if></if>", model));
    }

    #[test]
    fn test_else_is_always_true() {
        assert!(eval("<else></else>", json!({})));
    }

    #[test]
    fn test_one_line_conditions() {
        let model = json!({ "something": "hello", "empty": "" });
        assert!(eval(r#"<p if-something true="class=x"></p>"#, model.clone()));
        assert!(eval(r#"<p if-something="if-something" true="class=x"></p>"#, model.clone()));
        assert!(eval(r#"<p if-something="hello" true="class=x"></p>"#, model.clone()));
        assert!(!eval(r#"<p if-something="bye" true="class=x"></p>"#, model.clone()));
        assert!(!eval(r#"<p if-empty false="class=x"></p>"#, model.clone()));
        // the if- form is only a truthiness test on one-liners
        assert!(!eval(r#"<if something="if-something"></if>"#, model));
    }

    #[test]
    fn test_condition_attributes_skip_markers() {
        let doc = Document::parse(r#"<if a data-local-model="2" xmlns="x"></if>"#).document;
        let el = doc.element(doc.children(doc.root())[0]).unwrap();
        let condition = Condition::from_element(el, ConditionKind::If, |v| v.to_string());
        assert_eq!(condition.terms.len(), 1);
    }

    #[test]
    fn test_is_one_liner() {
        let doc = Document::parse(
            r#"<p if-a true="x"></p><p if-a></p><if if-a true="x"></if><p false="y" if-b></p>"#,
        )
        .document;
        let flags: Vec<bool> = doc
            .children(doc.root())
            .iter()
            .map(|&n| is_one_liner(doc.element(n).unwrap()))
            .collect();
        assert_eq!(flags, vec![true, false, false, true]);
    }

    #[test]
    fn test_parse_payload() {
        assert_eq!(
            parse_payload("class='active'"),
            Some(("class".to_string(), "active".to_string()))
        );
        assert_eq!(
            parse_payload(r#"data-x="a=b""#),
            Some(("data-x".to_string(), "a".to_string()))
        );
        assert_eq!(parse_payload("hidden"), Some(("hidden".to_string(), String::new())));
        assert_eq!(parse_payload(""), None);
    }
}
