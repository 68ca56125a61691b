//! A minimal C# tokenizer.
//!
//! Only the shape of the token stream matters to the declaration scanner:
//! identifiers, string literal values, punctuation, and `=>`. Comments and
//! preprocessor lines are dropped. Everything else that is not punctuation
//! is kept as opaque text.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum TokenKind {
    Ident(String),
    Str(String),
    Punct(char),
    Arrow,

    /// Numbers, character literals, and multi-character operators.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

impl Token {
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.ident() == Some(name)
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    at_line_start: bool,
    tokens: Vec<Token>,
}

pub(super) fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        at_line_start: true,
        tokens: Vec::new(),
    };

    lexer.run();
    lexer.tokens
}

impl Lexer {
    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, line: u32) {
        self.tokens.push(Token { kind, line });
    }

    fn run(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                let _ = self.bump();
                self.at_line_start = true;
                continue;
            }

            if c.is_whitespace() {
                let _ = self.bump();
                continue;
            }

            let line_start = self.at_line_start;
            self.at_line_start = false;
            let line = self.line;

            match (c, self.peek(1), self.peek(2)) {
                ('#', _, _) if line_start => self.skip_line(),
                ('/', Some('/'), _) => self.skip_line(),
                ('/', Some('*'), _) => self.skip_block_comment(),
                ('"', Some('"'), Some('"')) => {
                    let value = self.raw_string();
                    self.push(TokenKind::Str(value), line);
                }
                ('"', _, _) => {
                    let _ = self.bump();
                    let value = self.regular_string(false);
                    self.push(TokenKind::Str(value), line);
                }
                ('@', Some('"'), _) => {
                    self.pos += 1;
                    let _ = self.bump();
                    let value = self.verbatim_string(false);
                    self.push(TokenKind::Str(value), line);
                }
                ('$', Some('"'), Some('"')) if self.peek(3) == Some('"') => {
                    self.pos += 1;
                    let value = self.raw_string();
                    self.push(TokenKind::Str(value), line);
                }
                ('$', Some('"'), _) => {
                    self.pos += 2;
                    let value = self.regular_string(true);
                    self.push(TokenKind::Str(value), line);
                }
                ('$', Some('@'), Some('"')) | ('@', Some('$'), Some('"')) => {
                    self.pos += 3;
                    let value = self.verbatim_string(true);
                    self.push(TokenKind::Str(value), line);
                }
                ('\'', _, _) => {
                    let start = self.pos;
                    self.skip_char_literal();
                    let text = self.text_since(start);
                    self.push(TokenKind::Other(text), line);
                }
                ('=', Some('>'), _) => {
                    self.pos += 2;
                    self.push(TokenKind::Arrow, line);
                }
                ('=' | '!' | '<' | '>', Some('='), _) => {
                    self.pos += 2;
                    self.push(TokenKind::Other(format!("{c}=")), line);
                }
                ('@', Some(next), _) if is_ident_start(next) => {
                    self.pos += 1;
                    let name = self.identifier();
                    self.push(TokenKind::Ident(name), line);
                }
                _ if is_ident_start(c) => {
                    let name = self.identifier();
                    self.push(TokenKind::Ident(name), line);
                }
                _ if c.is_ascii_digit() => {
                    let start = self.pos;
                    self.skip_number();
                    let text = self.text_since(start);
                    self.push(TokenKind::Other(text), line);
                }
                _ => {
                    let _ = self.bump();
                    self.push(TokenKind::Punct(c), line);
                }
            }
        }
    }

    fn text_since(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while let Some(c) = self.bump() {
            if c == '*' && self.peek(0) == Some('/') {
                self.pos += 1;
                return;
            }
        }
    }

    fn identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek(0) {
            if !is_ident_part(c) {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        name
    }

    fn skip_number(&mut self) {
        while let Some(c) = self.peek(0) {
            let fraction = c == '.' && self.peek(1).is_some_and(|next| next.is_ascii_digit());
            if !(is_ident_part(c) || fraction) {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_char_literal(&mut self) {
        self.pos += 1;
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    let _ = self.bump();
                }
                '\'' | '\n' => return,
                _ => {}
            }
        }
    }

    /// Body of a `"..."` or `$"..."` literal, after the opening quote.
    fn regular_string(&mut self, interpolated: bool) -> String {
        let mut value = String::new();
        while let Some(c) = self.bump() {
            match c {
                '"' | '\n' => break,
                '\\' => {
                    if let Some(escaped) = self.bump() {
                        value.push(unescape(escaped));
                    }
                }
                '{' if interpolated => {
                    if self.peek(0) == Some('{') {
                        self.pos += 1;
                        value.push('{');
                    } else {
                        self.skip_interpolation_hole();
                    }
                }
                '}' if interpolated && self.peek(0) == Some('}') => {
                    self.pos += 1;
                    value.push('}');
                }
                _ => value.push(c),
            }
        }
        value
    }

    /// Body of a `@"..."` or `$@"..."` literal, after the opening quote.
    fn verbatim_string(&mut self, interpolated: bool) -> String {
        let mut value = String::new();
        while let Some(c) = self.bump() {
            match c {
                '"' => {
                    if self.peek(0) == Some('"') {
                        self.pos += 1;
                        value.push('"');
                    } else {
                        break;
                    }
                }
                '{' if interpolated => {
                    if self.peek(0) == Some('{') {
                        self.pos += 1;
                        value.push('{');
                    } else {
                        self.skip_interpolation_hole();
                    }
                }
                '}' if interpolated && self.peek(0) == Some('}') => {
                    self.pos += 1;
                    value.push('}');
                }
                _ => value.push(c),
            }
        }
        value
    }

    /// A `"""` literal; the closing delimiter has as many quotes as the opening one.
    fn raw_string(&mut self) -> String {
        let mut quotes = 0;
        while self.peek(0) == Some('"') {
            quotes += 1;
            self.pos += 1;
        }

        let mut value = String::new();
        let mut run = 0;
        while let Some(c) = self.bump() {
            if c == '"' {
                run += 1;
                if run == quotes {
                    break;
                }
                continue;
            }

            for _ in 0..run {
                value.push('"');
            }
            run = 0;
            value.push(c);
        }

        value.trim().to_string()
    }

    fn skip_interpolation_hole(&mut self) {
        let mut depth = 1;
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                '"' => {
                    let _ = self.regular_string(false);
                }
                '\'' => {
                    self.pos -= 1;
                    self.skip_char_literal();
                }
                _ => {}
            }
        }
    }
}

const fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        _ => c,
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
