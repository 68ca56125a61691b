//! Depth-aware scanning helpers for symbol strings.
//!
//! All delimiters handled here are ASCII, so byte offsets taken from
//! `char_indices` are always valid slice boundaries.

#![expect(clippy::string_slice, reason = "offsets come from ASCII delimiters located with char_indices")]

/// Tracks bracket nesting while walking a symbol string.
///
/// A `<` only opens a generic argument list when it directly follows an
/// identifier character. This keeps compiler-generated names such as
/// `<Main>b__0` and operator names such as `operator <` from being read as
/// generics.
#[derive(Debug, Default)]
pub struct Depth {
    angle: usize,
    paren: usize,
    bracket: usize,
    prev: Option<char>,
}

impl Depth {
    pub fn step(&mut self, c: char) {
        match c {
            '<' if self.prev.is_some_and(opens_generic_after) => self.angle += 1,
            '>' => self.angle = self.angle.saturating_sub(1),
            '(' => self.paren += 1,
            ')' => self.paren = self.paren.saturating_sub(1),
            '[' => self.bracket += 1,
            ']' => self.bracket = self.bracket.saturating_sub(1),
            _ => {}
        }
        self.prev = Some(c);
    }

    pub const fn is_top(&self) -> bool {
        self.angle == 0 && self.paren == 0 && self.bracket == 0
    }

    const fn is_outside_generics_and_parens(&self) -> bool {
        self.angle == 0 && self.paren == 0
    }
}

fn opens_generic_after(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '`' | '$' | '>' | ']')
}

/// Locate the outermost balanced parameter list.
///
/// Returns the byte offsets of the opening `(` and its matching `)`.
pub fn find_parameter_list(s: &str) -> Option<(usize, usize)> {
    let mut depth = Depth::default();
    let mut open = None;

    for (i, c) in s.char_indices() {
        if open.is_none() && c == '(' && depth.is_outside_generics_and_parens() {
            open = Some(i);
        }

        depth.step(c);

        if let Some(start) = open
            && c == ')'
            && depth.is_outside_generics_and_parens()
        {
            return Some((start, i));
        }
    }

    None
}

/// Split a qualified name on top-level `.` separators.
///
/// A `.` that directly follows a separator starts the next segment, so
/// `Type..ctor` splits into `Type` and `.ctor`.
pub fn split_segments(s: &str) -> Vec<&str> {
    split_top_level(s, '.')
}

/// Split a type path on top-level `+` nested-type separators.
pub fn split_nested(s: &str) -> Vec<&str> {
    split_top_level(s, '+')
}

fn split_top_level(s: &str, separator: char) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = Depth::default();
    let mut start = 0;

    for (i, c) in s.char_indices() {
        if c == separator && depth.is_top() && i > start {
            segments.push(&s[start..i]);
            start = i + c.len_utf8();
        }
        depth.step(c);
    }

    segments.push(&s[start..]);
    segments
}

/// Drop a leading return type and modifiers from a member display string.
///
/// `System.Collections.Generic.List<int> static NS.Type.Method(int a)` becomes
/// `NS.Type.Method(int a)`. Operator declarations keep their keyword, so
/// `int NS.Type.operator +(NS.Type a)` becomes `NS.Type.operator +(NS.Type a)`.
pub fn strip_return_type(s: &str) -> &str {
    let s = s.trim();
    let name_end = find_parameter_list(s).map_or(s.len(), |(start, _)| start);
    let head = &s[..name_end];

    let mut word_starts = vec![0];
    let mut depth = Depth::default();
    for (i, c) in head.char_indices() {
        if c.is_whitespace() && depth.is_top() {
            word_starts.push(i + c.len_utf8());
        }
        depth.step(c);
    }

    let words: Vec<(usize, &str)> = word_starts
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let end = word_starts.get(index + 1).map_or(head.len(), |&next| next);
            (start, head[start..end].trim())
        })
        .filter(|(_, word)| !word.is_empty())
        .collect();

    let Some(&(last_start, _)) = words.last() else {
        return s;
    };

    let operator_index = words
        .iter()
        .position(|(_, word)| *word == "operator" || word.ends_with(".operator"));

    let start = match operator_index {
        Some(index) => {
            let conversion = index
                .checked_sub(1)
                .and_then(|prev| words.get(prev))
                .filter(|(_, word)| matches!(*word, "implicit" | "explicit") || word.ends_with(".implicit") || word.ends_with(".explicit"));
            conversion.map_or(words[index].0, |(start, _)| *start)
        }
        None => last_start,
    };

    &s[start..]
}
