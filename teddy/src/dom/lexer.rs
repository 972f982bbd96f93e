use super::{Attribute, RAW_TEXT_ELEMENTS};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    StartTag {
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag(String),
    Text(String),
    Comment(String),
    /// `<!DOCTYPE ...>` and other `<!...>` / `<?...>` declarations
    Doctype(String),
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}:{}", self.kind, self.line, self.column)
    }
}

/// Input that ended in the middle of a construct
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Character lexer for template markup
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if self.current() == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
    }

    fn starts_with(&self, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(i, c)| self.input.get(self.position + i) == Some(&c))
    }

    fn starts_with_ignore_case(&self, pattern: &str) -> bool {
        pattern.chars().enumerate().all(|(i, c)| {
            self.input
                .get(self.position + i)
                .map(|x| x.eq_ignore_ascii_case(&c))
                .unwrap_or(false)
        })
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn rest(&self, from: usize) -> String {
        self.input[from..].iter().collect()
    }

    /// Tokenize the whole input.
    ///
    /// On a fatal error the tokens read so far are returned together with
    /// the error, and the unread remainder becomes a final text token.
    pub fn tokenize(mut self) -> (Vec<Token>, Option<LexError>) {
        let mut tokens = Vec::new();

        while let Some(ch) = self.current() {
            let (line, column, start) = (self.line, self.column, self.position);

            let result = if ch == '<' {
                match self.peek() {
                    Some(c) if c.is_ascii_alphabetic() => self.read_start_tag(),
                    Some('/') => self.read_end_tag(),
                    Some('!') if self.starts_with("<!--") => self.read_comment(),
                    Some('!') | Some('?') => self.read_declaration(),
                    _ => Ok(self.read_text()),
                }
            } else {
                Ok(self.read_text())
            };

            match result {
                Ok(kind) => {
                    let raw_body = match &kind {
                        TokenKind::StartTag {
                            name,
                            self_closing: false,
                            ..
                        } if RAW_TEXT_ELEMENTS.contains(&name.as_str()) => Some(name.clone()),
                        _ => None,
                    };
                    tokens.push(Token::new(kind, line, column));

                    if let Some(name) = raw_body {
                        let (body_line, body_column) = (self.line, self.column);
                        let body = self.read_raw_text(&name);
                        if !body.is_empty() {
                            tokens.push(Token::new(TokenKind::Text(body), body_line, body_column));
                        }
                    }
                }
                Err(message) => {
                    tokens.push(Token::new(TokenKind::Text(self.rest(start)), line, column));
                    let error = LexError {
                        message,
                        line: self.line,
                        column: self.column,
                    };
                    return (tokens, Some(error));
                }
            }
        }

        (tokens, None)
    }

    fn read_text(&mut self) -> TokenKind {
        let mut text = String::new();
        // a '<' that starts nothing is kept as text
        if let Some(ch) = self.current() {
            text.push(ch);
            self.advance();
        }
        while let Some(ch) = self.current() {
            if ch == '<' {
                break;
            }
            text.push(ch);
            self.advance();
        }
        TokenKind::Text(text)
    }

    fn read_raw_text(&mut self, name: &str) -> String {
        let closing = format!("</{}", name);
        let mut text = String::new();
        while let Some(ch) = self.current() {
            if self.starts_with_ignore_case(&closing) {
                break;
            }
            text.push(ch);
            self.advance();
        }
        text
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.current() {
            if ch.is_whitespace() || ch == '>' || ch == '/' || ch == '=' {
                break;
            }
            name.push(ch);
            self.advance();
        }
        name.to_lowercase()
    }

    fn read_start_tag(&mut self) -> Result<TokenKind, String> {
        self.advance(); // <
        let name = self.read_name();
        let mut attrs: Vec<Attribute> = Vec::new();

        loop {
            self.skip_whitespace();
            match self.current() {
                None => return Err(format!("Unterminated <{}> tag", name)),
                Some('>') => {
                    self.advance();
                    return Ok(TokenKind::StartTag {
                        name,
                        attrs,
                        self_closing: false,
                    });
                }
                Some('/') if self.peek() == Some('>') => {
                    self.advance();
                    self.advance();
                    return Ok(TokenKind::StartTag {
                        name,
                        attrs,
                        self_closing: true,
                    });
                }
                Some('/') => self.advance(),
                Some(_) => {
                    let attr = self.read_attribute(&name)?;
                    // first occurrence wins, as in browsers
                    if !attrs.iter().any(|a| a.name == attr.name) {
                        attrs.push(attr);
                    }
                }
            }
        }
    }

    fn read_attribute(&mut self, tag: &str) -> Result<Attribute, String> {
        let mut name = self.read_name();
        if name.is_empty() {
            // stray '=' or similar; swallow it as a name character
            if let Some(ch) = self.current() {
                name.push(ch);
                self.advance();
            }
        }

        self.skip_whitespace();
        if self.current() != Some('=') {
            return Ok(Attribute::new(name, ""));
        }
        self.advance();
        self.skip_whitespace();

        let value = match self.current() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let mut value = String::new();
                loop {
                    match self.current() {
                        None => {
                            return Err(format!(
                                "Unterminated value for attribute '{}' on <{}>",
                                name, tag
                            ))
                        }
                        Some(c) if c == quote => {
                            self.advance();
                            break;
                        }
                        Some(c) => {
                            value.push(c);
                            self.advance();
                        }
                    }
                }
                value
            }
            _ => {
                let mut value = String::new();
                while let Some(ch) = self.current() {
                    if ch.is_whitespace() || ch == '>' {
                        break;
                    }
                    value.push(ch);
                    self.advance();
                }
                value
            }
        };

        Ok(Attribute::new(name, value))
    }

    fn read_end_tag(&mut self) -> Result<TokenKind, String> {
        self.advance(); // <
        self.advance(); // /
        let name = self.read_name();
        while let Some(ch) = self.current() {
            self.advance();
            if ch == '>' {
                return Ok(TokenKind::EndTag(name));
            }
        }
        Err(format!("Unterminated </{}> tag", name))
    }

    fn read_comment(&mut self) -> Result<TokenKind, String> {
        for _ in 0..4 {
            self.advance();
        }
        let mut body = String::new();
        while self.current().is_some() {
            if self.starts_with("-->") {
                for _ in 0..3 {
                    self.advance();
                }
                return Ok(TokenKind::Comment(body));
            }
            if let Some(ch) = self.current() {
                body.push(ch);
            }
            self.advance();
        }
        Err("Unterminated comment".to_string())
    }

    fn read_declaration(&mut self) -> Result<TokenKind, String> {
        self.advance(); // <
        let mut body = String::new();
        while let Some(ch) = self.current() {
            self.advance();
            if ch == '>' {
                return Ok(TokenKind::Doctype(body));
            }
            body.push(ch);
        }
        Err("Unterminated declaration".to_string())
    }
}
