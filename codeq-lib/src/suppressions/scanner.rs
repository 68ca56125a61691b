//! Locate `SuppressMessage` annotations in C# source and name their targets.
//!
//! The scanner walks the token stream one declaration at a time. Namespace
//! and type bodies are entered so nested declarations get their enclosing
//! names; member bodies and initializers are skipped as balanced regions.
//! Attribute sections seen before a declaration apply to it.

use super::lexer::{Token, TokenKind, tokenize};
use crate::symbols::{combine_member_fqn, normalize_fully_qualified_method_name, normalize_qualified_type_name};

const LOG_TARGET: &str = "   scanner";

const TYPE_KEYWORDS: [&str; 5] = ["class", "struct", "interface", "record", "enum"];

const MODIFIERS: [&str; 20] = [
    "public", "private", "protected", "internal", "static", "virtual", "override", "abstract", "sealed", "async", "extern",
    "unsafe", "new", "readonly", "partial", "required", "volatile", "const", "ref", "file",
];

/// A suppression annotation together with the declaration it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SuppressionAttribute {
    pub fully_qualified_name: String,
    pub category: String,
    pub check_id: String,
    pub justification: Option<String>,
}

#[derive(Debug, Default)]
struct Arguments {
    category: Option<String>,
    check_id: Option<String>,
    justification: Option<String>,
    scope: Option<String>,
    target: Option<String>,
    line: u32,
}

enum Scope {
    Namespace(String),
    Type(String),
    Block,
}

struct Scanner<'a> {
    tokens: &'a [Token],
    pos: usize,
    scopes: Vec<Scope>,
    file_namespace: Option<String>,
    pending: Vec<Arguments>,
    found: Vec<SuppressionAttribute>,
}

/// Find every recognized suppression annotation in a C# source file.
pub(super) fn scan_source(source: &str) -> Vec<SuppressionAttribute> {
    let tokens = tokenize(source);
    let mut scanner = Scanner {
        tokens: &tokens,
        pos: 0,
        scopes: Vec::new(),
        file_namespace: None,
        pending: Vec::new(),
        found: Vec::new(),
    };

    scanner.run();
    scanner.found
}

impl<'a> Scanner<'a> {
    fn token(&self, index: usize) -> Option<&'a Token> {
        self.tokens.get(index)
    }

    fn run(&mut self) {
        while let Some(token) = self.token(self.pos) {
            match &token.kind {
                TokenKind::Punct('[') => self.attribute_section(),
                TokenKind::Punct('}') => {
                    self.pos += 1;
                    let _ = self.scopes.pop();
                    self.pending.clear();
                }
                TokenKind::Punct(';') => {
                    self.pos += 1;
                    self.pending.clear();
                }
                TokenKind::Ident(word) if word == "namespace" => self.namespace(),
                _ => self.declaration(),
            }
        }
    }

    fn current_namespace(&self) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| match scope {
                Scope::Namespace(name) => Some(name.as_str()),
                _ => None,
            })
            .or(self.file_namespace.as_deref())
    }

    fn current_type(&self) -> Option<&str> {
        match self.scopes.iter().rev().find(|scope| !matches!(scope, Scope::Block)) {
            Some(Scope::Type(fqn)) => Some(fqn),
            _ => None,
        }
    }

    fn namespace(&mut self) {
        self.pos += 1;
        let mut name = String::new();
        while let Some(token) = self.token(self.pos) {
            match &token.kind {
                TokenKind::Ident(part) => name.push_str(part),
                TokenKind::Punct('.') => name.push('.'),
                _ => break,
            }
            self.pos += 1;
        }

        self.pending.clear();
        match self.token(self.pos).map(|token| &token.kind) {
            Some(TokenKind::Punct('{')) => {
                self.pos += 1;
                let full = match self.current_namespace() {
                    Some(outer) if !outer.is_empty() => format!("{outer}.{name}"),
                    _ => name,
                };
                self.scopes.push(Scope::Namespace(full));
            }
            Some(TokenKind::Punct(';')) => {
                self.pos += 1;
                self.file_namespace = Some(name);
            }
            _ => {}
        }
    }

    fn attribute_section(&mut self) {
        let tokens = self.tokens;
        let start = self.pos;
        let end = matching_close(tokens, start).unwrap_or(tokens.len());
        self.pos = (end + 1).min(tokens.len());

        let mut inner = &tokens[start + 1..end];
        let mut target = None;
        if let [first, colon, rest @ ..] = inner
            && colon.is_punct(':')
            && !rest.first().is_some_and(|token| token.is_punct(':'))
            && let Some(name) = first.ident()
        {
            target = Some(name);
            inner = rest;
        }

        let global = matches!(target, Some("assembly" | "module"));
        let applies_to_declaration = matches!(target, None | Some("method" | "type" | "field" | "property" | "event"));

        for attribute in split_top_level(inner, ',') {
            let Some(arguments) = suppress_message_arguments(attribute) else {
                continue;
            };

            if global {
                self.global_suppression(arguments);
            } else if applies_to_declaration {
                self.pending.push(arguments);
            }
        }
    }

    fn global_suppression(&mut self, arguments: Arguments) {
        let Some(fully_qualified_name) = global_target(&arguments) else {
            log::debug!(
                target: LOG_TARGET,
                "Ignoring project-wide suppression on line {} without a type or member target",
                arguments.line
            );
            return;
        };

        self.record(arguments, &fully_qualified_name);
    }

    fn record(&mut self, arguments: Arguments, fully_qualified_name: &str) {
        let (Some(category), Some(check_id)) = (arguments.category, arguments.check_id) else {
            return;
        };

        self.found.push(SuppressionAttribute {
            fully_qualified_name: fully_qualified_name.to_string(),
            category,
            check_id,
            justification: arguments.justification,
        });
    }

    fn attach_pending(&mut self, fully_qualified_names: &[String]) {
        let pending = std::mem::take(&mut self.pending);
        for arguments in pending {
            for fqn in fully_qualified_names {
                let copy = Arguments {
                    category: arguments.category.clone(),
                    check_id: arguments.check_id.clone(),
                    justification: arguments.justification.clone(),
                    scope: None,
                    target: None,
                    line: arguments.line,
                };
                self.record(copy, fqn);
            }
        }
    }

    fn declaration(&mut self) {
        let tokens = self.tokens;
        let start = self.pos;
        let Some(end) = header_end(tokens, start) else {
            self.pos = tokens.len();
            return;
        };

        let header = &tokens[start..end];
        let terminator = &tokens[end].kind;

        if header.is_empty() {
            self.pending.clear();
            if *terminator == TokenKind::Punct('{') {
                self.scopes.push(Scope::Block);
                self.pos = end + 1;
            } else {
                self.pos = self.skip_statement(end + 1);
            }
            return;
        }

        let parameters = parameter_list_start(header);
        let before_parameters = &header[..parameters.unwrap_or(header.len())];

        if let Some(keyword) = before_parameters
            .iter()
            .position(|token| token.ident().is_some_and(|word| TYPE_KEYWORDS.contains(&word)))
        {
            self.type_declaration(header, keyword, end);
        } else if before_parameters.iter().any(|token| token.is_ident("delegate")) {
            let name = parameters.and_then(|index| method_name(header, index));
            if let Some(fqn) = name.map(|name| self.nested_type_fqn(&name)) {
                self.attach_pending(&[fqn]);
            }
            self.pos = self.skip_body(end);
        } else if is_indexer(header) {
            self.pending.clear();
            self.pos = self.skip_body(end);
        } else if let Some(index) = parameters {
            let fqn = self.current_type().zip(method_name(header, index)).map(|(type_fqn, name)| {
                let is_static = before_parameters.iter().any(|token| token.is_ident("static"));
                let display = if is_static { format!("static {name}()") } else { format!("{name}()") };
                combine_member_fqn(type_fqn, &display)
            });

            match fqn {
                Some(fqn) => self.attach_pending(&[fqn]),
                None => self.pending.clear(),
            }
            self.pos = self.skip_body(end);
        } else {
            self.property_or_fields(header, end);
        }
    }

    fn type_declaration(&mut self, header: &[Token], keyword: usize, end: usize) {
        let is_enum = header[keyword].is_ident("enum");
        let name = header[keyword + 1..]
            .iter()
            .filter_map(Token::ident)
            .find(|word| !TYPE_KEYWORDS.contains(word))
            .map(str::to_string);

        let Some(name) = name else {
            self.pending.clear();
            self.pos = self.skip_body(end);
            return;
        };

        let fqn = self.nested_type_fqn(&name);
        self.attach_pending(std::slice::from_ref(&fqn));

        if self.tokens[end].is_punct('{') && !is_enum {
            self.scopes.push(Scope::Type(fqn));
            self.pos = end + 1;
        } else {
            self.pos = self.skip_body(end);
        }
    }

    fn nested_type_fqn(&self, name: &str) -> String {
        let fqn = match (self.current_type(), self.current_namespace()) {
            (Some(outer), _) => format!("{outer}+{name}"),
            (None, Some(namespace)) if !namespace.is_empty() => format!("{namespace}.{name}"),
            _ => name.to_string(),
        };
        normalize_qualified_type_name(&fqn)
    }

    fn property_or_fields(&mut self, header: &[Token], end: usize) {
        let tokens = self.tokens;
        let mut names: Vec<String> = split_top_level(header, ',')
            .into_iter()
            .filter_map(|declarator| last_ident(declarator))
            .collect();

        let terminator = &tokens[end];
        let mut pos = end;

        if terminator.is_punct('{') || terminator.kind == TokenKind::Arrow {
            // property or event with accessors
            names.truncate(1);
            pos = self.skip_body(end);
            if self.token(pos).is_some_and(|token| token.is_punct('=')) {
                pos = self.skip_statement(pos + 1);
            }
        } else {
            loop {
                match self.token(pos) {
                    Some(token) if token.is_punct('=') => pos = skip_initializer(self.tokens, pos + 1),
                    Some(token) if token.is_punct(',') => {
                        let declarator_start = pos + 1;
                        pos = declarator_start;
                        while self
                            .token(pos)
                            .is_some_and(|token| !(token.is_punct('=') || token.is_punct(',') || token.is_punct(';') || token.is_punct('}')))
                        {
                            pos += 1;
                        }
                        if let Some(name) = last_ident(&tokens[declarator_start..pos]) {
                            names.push(name);
                        }
                    }
                    Some(token) if token.is_punct(';') => {
                        pos += 1;
                        break;
                    }
                    _ => break,
                }
            }
        }

        self.pos = pos;

        let Some(type_fqn) = self.current_type() else {
            self.pending.clear();
            return;
        };

        let fqns: Vec<String> = names.iter().map(|name| combine_member_fqn(type_fqn, name)).collect();
        self.attach_pending(&fqns);
    }

    /// Skip whatever follows a declaration header, returning the next position.
    fn skip_body(&self, terminator: usize) -> usize {
        match self.token(terminator).map(|token| &token.kind) {
            Some(TokenKind::Punct('{')) => matching_close(self.tokens, terminator).map_or(self.tokens.len(), |close| close + 1),
            Some(TokenKind::Arrow | TokenKind::Punct('=')) => self.skip_statement(terminator + 1),
            Some(TokenKind::Punct(';')) => terminator + 1,
            _ => terminator,
        }
    }

    /// Skip to just past the next `;` outside of any brackets.
    fn skip_statement(&self, from: usize) -> usize {
        let end = skip_initializer(self.tokens, from);
        match self.token(end) {
            Some(token) if token.is_punct(';') || token.is_punct(',') => end + 1,
            _ => end,
        }
    }
}

/// Index of the token closing the bracket opened at `open`.
fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let (open_char, close_char) = match tokens.get(open)?.kind {
        TokenKind::Punct('{') => ('{', '}'),
        TokenKind::Punct('[') => ('[', ']'),
        TokenKind::Punct('(') => ('(', ')'),
        _ => return None,
    };

    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        if token.is_punct(open_char) {
            depth += 1;
        } else if token.is_punct(close_char) {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }

    None
}

/// Index of the `{`, `;`, `=>`, `=`, or `}` ending the declaration header at `start`.
fn header_end(tokens: &[Token], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(start) {
        match &token.kind {
            TokenKind::Punct('(' | '[' | '<') => depth += 1,
            TokenKind::Punct(')' | ']' | '>') => depth = depth.saturating_sub(1),
            TokenKind::Punct('{' | ';' | '=' | '}') | TokenKind::Arrow if depth == 0 => return Some(index),
            _ => {}
        }
    }

    None
}

/// Index of the `,`, `;`, or `}` ending an initializer expression.
fn skip_initializer(tokens: &[Token], from: usize) -> usize {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(from) {
        match &token.kind {
            TokenKind::Punct('(' | '[' | '{') => depth += 1,
            TokenKind::Punct(')' | ']') => depth = depth.saturating_sub(1),
            TokenKind::Punct('}') if depth == 0 => return index,
            TokenKind::Punct('}') => depth -= 1,
            TokenKind::Punct(',' | ';') if depth == 0 => return index,
            _ => {}
        }
    }

    tokens.len()
}

fn split_top_level(tokens: &[Token], separator: char) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, token) in tokens.iter().enumerate() {
        match &token.kind {
            TokenKind::Punct('(' | '[' | '{' | '<') => depth += 1,
            TokenKind::Punct(')' | ']' | '}' | '>') => depth = depth.saturating_sub(1),
            TokenKind::Punct(c) if *c == separator && depth == 0 => {
                parts.push(&tokens[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }

    if start < tokens.len() {
        parts.push(&tokens[start..]);
    }

    parts
}

fn last_ident(tokens: &[Token]) -> Option<String> {
    let mut depth = 0usize;
    let mut last = None;
    for token in tokens {
        match &token.kind {
            TokenKind::Punct('<' | '(' | '[') => depth += 1,
            TokenKind::Punct('>' | ')' | ']') => depth = depth.saturating_sub(1),
            TokenKind::Ident(name) if depth == 0 => last = Some(name.clone()),
            _ => {}
        }
    }
    last
}

fn is_indexer(header: &[Token]) -> bool {
    header
        .windows(2)
        .any(|pair| pair[0].is_ident("this") && pair[1].is_punct('['))
}

/// Position of the `(` opening a method's parameter list.
///
/// Tuple return types also start with `(`, so only a parenthesis preceded by
/// a name, a generic parameter list, or an operator token qualifies.
fn parameter_list_start(header: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in header.iter().enumerate() {
        match &token.kind {
            TokenKind::Punct('(') => {
                if depth == 0 && index > 0 && names_parameter_list(header, index) {
                    return Some(index);
                }
                depth += 1;
            }
            TokenKind::Punct('[' | '<') => depth += 1,
            TokenKind::Punct(')' | ']' | '>') => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    None
}

fn names_parameter_list(header: &[Token], open: usize) -> bool {
    if operator_position(&header[..open]).is_some() {
        return true;
    }

    match &header[open - 1].kind {
        TokenKind::Ident(word) => !MODIFIERS.contains(&word.as_str()),
        TokenKind::Punct('>') => true,
        _ => false,
    }
}

fn operator_position(tokens: &[Token]) -> Option<usize> {
    tokens.iter().position(|token| token.is_ident("operator"))
}

fn method_name(header: &[Token], open: usize) -> Option<String> {
    let before = &header[..open];

    if let Some(operator) = operator_position(before) {
        let symbol: String = before[operator + 1..].iter().map(token_text).collect();
        let conversion = operator
            .checked_sub(1)
            .and_then(|index| before[index].ident())
            .filter(|word| matches!(*word, "implicit" | "explicit"));
        return Some(match conversion {
            Some(kind) => format!("{kind} operator {symbol}"),
            None => format!("operator {symbol}"),
        });
    }

    let mut index = open - 1;
    if before[index].is_punct('>') {
        let mut depth = 0usize;
        loop {
            match &before[index].kind {
                TokenKind::Punct('>') => depth += 1,
                TokenKind::Punct('<') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            index = index.checked_sub(1)?;
        }
        index = index.checked_sub(1)?;
    }

    let name = before[index].ident()?;
    if index > 0 && before[index - 1].is_punct('~') {
        return Some("Finalize".to_string());
    }

    Some(name.to_string())
}

fn token_text(token: &Token) -> String {
    match &token.kind {
        TokenKind::Ident(text) | TokenKind::Other(text) => text.clone(),
        TokenKind::Punct(c) => c.to_string(),
        TokenKind::Arrow => "=>".to_string(),
        TokenKind::Str(value) => format!("\"{value}\""),
    }
}

/// The arguments of a `SuppressMessage` attribute, or `None` for any other attribute.
fn suppress_message_arguments(attribute: &[Token]) -> Option<Arguments> {
    let open = attribute.iter().position(|token| token.is_punct('('));
    let name_tokens = &attribute[..open.unwrap_or(attribute.len())];
    let name = name_tokens.iter().rev().find_map(Token::ident)?;
    if name != "SuppressMessage" && name != "SuppressMessageAttribute" {
        return None;
    }

    let mut arguments = Arguments {
        line: attribute.first().map_or(0, |token| token.line),
        ..Arguments::default()
    };

    let Some(open) = open else {
        return Some(arguments);
    };
    let close = matching_close(attribute, open).unwrap_or(attribute.len());

    let mut positional = 0;
    for argument in split_top_level(&attribute[open + 1..close], ',') {
        match argument {
            [key, separator, value @ ..] if (separator.is_punct('=') || separator.is_punct(':')) && key.ident().is_some() => {
                let value = string_value(value);
                match key.ident() {
                    Some("Justification") => arguments.justification = value,
                    Some("Scope") => arguments.scope = value,
                    Some("Target") => arguments.target = value,
                    _ => {}
                }
            }
            _ => {
                match positional {
                    0 => arguments.category = string_value(argument),
                    1 => arguments.check_id = string_value(argument),
                    _ => {}
                }
                positional += 1;
            }
        }
    }

    Some(arguments)
}

/// The value of a string literal expression, folding `+` concatenations.
fn string_value(tokens: &[Token]) -> Option<String> {
    let mut value = String::new();
    let mut expect_literal = true;

    for token in tokens {
        match &token.kind {
            TokenKind::Str(part) if expect_literal => {
                value.push_str(part);
                expect_literal = false;
            }
            TokenKind::Punct('+') if !expect_literal => expect_literal = true,
            _ => return None,
        }
    }

    (!expect_literal).then_some(value)
}

/// Canonical name of the target of an `assembly:` or `module:` suppression.
fn global_target(arguments: &Arguments) -> Option<String> {
    let scope = arguments.scope.as_deref()?.trim().to_ascii_lowercase();
    if scope != "type" && scope != "member" {
        return None;
    }

    let target = arguments.target.as_deref()?.trim();
    if let Some(name) = target.strip_prefix("~T:") {
        return Some(normalize_qualified_type_name(&documentation_id_to_name(name)));
    }

    let name = documentation_id_to_name(target.strip_prefix("~M:")?);
    let name = if name.contains('(') { name } else { format!("{name}()") };
    Some(normalize_fully_qualified_method_name(&name))
}

/// Turn a documentation comment id into a display name.
///
/// Generic arity markers are dropped and `#ctor` / `#cctor` become `.ctor` /
/// `.cctor`.
fn documentation_id_to_name(id: &str) -> String {
    let mut name = String::with_capacity(id.len());
    let mut chars = id.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '`' => {
                while chars.next_if(|next| *next == '`' || next.is_ascii_digit()).is_some() {}
            }
            '#' => name.push('.'),
            _ => name.push(c),
        }
    }

    name
}
