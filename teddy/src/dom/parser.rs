use super::lexer::{Lexer, TokenKind};
use super::{is_void, Document, Element, NodeId, NodeKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseIssue {
    pub severity: Severity,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseIssue {
    fn new(severity: Severity, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            severity,
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}: {}",
            self.severity.as_str(),
            self.line,
            self.column,
            self.message
        )
    }
}

/// A parsed document plus everything the parser had to work around
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub document: Document,
    pub issues: Vec<ParseIssue>,
}

impl ParseOutcome {
    pub fn fatal(&self) -> Option<&ParseIssue> {
        self.issues.iter().find(|i| i.severity == Severity::Fatal)
    }
}

impl Document {
    /// Build a tree from markup. Never fails; problems end up in `issues`.
    pub fn parse(input: &str) -> ParseOutcome {
        let (tokens, lex_error) = Lexer::new(input).tokenize();
        let mut doc = Document::new();
        let mut issues = Vec::new();
        // open elements with the position they were opened at
        let mut open: Vec<(NodeId, usize, usize)> = Vec::new();

        for token in tokens {
            let parent = open.last().map(|(id, _, _)| *id).unwrap_or(Document::ROOT);

            match token.kind {
                TokenKind::StartTag {
                    name,
                    attrs,
                    self_closing,
                } => {
                    let childless = self_closing || is_void(&name);
                    let node = doc.create(NodeKind::Element(Element { name, attrs }));
                    doc.append(parent, node);
                    if !childless {
                        open.push((node, token.line, token.column));
                    }
                }
                TokenKind::EndTag(name) => {
                    let matching = open
                        .iter()
                        .rposition(|(id, _, _)| doc.is_tag(*id, &name));
                    match matching {
                        Some(index) => {
                            for (id, line, column) in open.drain(index + 1..) {
                                issues.push(ParseIssue::new(
                                    Severity::Warning,
                                    line,
                                    column,
                                    format!(
                                        "<{}> implicitly closed by </{}>",
                                        doc.tag_name(id).unwrap_or_default(),
                                        name
                                    ),
                                ));
                            }
                            open.pop();
                        }
                        None => issues.push(ParseIssue::new(
                            Severity::Error,
                            token.line,
                            token.column,
                            format!("Unexpected closing tag </{}> ignored", name),
                        )),
                    }
                }
                TokenKind::Text(text) => {
                    let node = doc.create(NodeKind::Text(text));
                    doc.append(parent, node);
                }
                TokenKind::Comment(text) => {
                    let node = doc.create(NodeKind::Comment(text));
                    doc.append(parent, node);
                }
                TokenKind::Doctype(text) => {
                    let node = doc.create(NodeKind::Doctype(text));
                    doc.append(parent, node);
                }
            }
        }

        for (id, line, column) in open.into_iter().rev() {
            issues.push(ParseIssue::new(
                Severity::Warning,
                line,
                column,
                format!("Unclosed <{}> closed at end of input", doc.tag_name(id).unwrap_or_default()),
            ));
        }

        if let Some(error) = lex_error {
            issues.push(ParseIssue::new(
                Severity::Fatal,
                error.line,
                error.column,
                error.message,
            ));
        }

        ParseOutcome {
            document: doc,
            issues,
        }
    }
}
