#![expect(clippy::string_slice, reason = "offsets come from ASCII delimiters located with char_indices")]

use super::scan::{find_parameter_list, split_nested, split_segments, strip_return_type};
use super::sentinels::is_sentinel;

const PARAMETER_PLACEHOLDER: &str = "(...)";

/// Replace the contents of the outermost parameter list with `...`.
///
/// Generic brackets and nested parentheses are tracked together, so commas
/// inside `Dictionary<K, V>` or tuple types are never mistaken for parameter
/// separators. Input without a balanced parameter list is returned unchanged,
/// as is empty or whitespace-only input.
///
/// ```ignore
/// assert_eq!(normalize_method_signature("Foo.Bar(int a, Dictionary<int, string> b)"), "Foo.Bar(...)");
/// assert_eq!(normalize_method_signature("Foo.Bar(int a"), "Foo.Bar(int a");
/// ```
#[must_use]
pub fn normalize_method_signature(raw: &str) -> String {
    if raw.trim().is_empty() {
        return raw.to_string();
    }

    match find_parameter_list(raw) {
        Some((start, end)) => format!("{}{PARAMETER_PLACEHOLDER}{}", &raw[..start], &raw[end + 1..]),
        None => raw.to_string(),
    }
}

/// Extract the bare method name from a member display string.
///
/// Strips the return type, the qualifying path, the parameter list, and any
/// generic arity on the method itself. Constructor markers, operator names,
/// and compiler-generated names starting with `<` are kept verbatim.
#[must_use]
pub fn extract_method_name(raw: &str) -> String {
    if raw.trim().is_empty() {
        return raw.to_string();
    }

    let name = strip_return_type(raw);
    let head = find_parameter_list(name).map_or(name, |(start, _)| &name[..start]);
    let last = split_segments(head).last().copied().unwrap_or(head).trim();

    if is_special_name(last) {
        last.to_string()
    } else {
        strip_generic_suffix(last).to_string()
    }
}

/// Strip a trailing generic argument list from a type name segment.
///
/// Handles nested generics (`Map<List<int>, string>`) and CLR backtick arity
/// (`` List`1 ``). The reserved sentinel tokens are returned unchanged since
/// they only look like generic lists.
#[must_use]
pub fn normalize_type_name(raw: &str) -> String {
    if is_sentinel(raw) || raw.trim().is_empty() {
        return raw.to_string();
    }

    strip_generic_suffix(raw.trim()).to_string()
}

/// Normalize every segment of a dotted type path, including nested types.
///
/// `NS.Outer<T>+Inner<U>` becomes `NS.Outer+Inner`.
#[must_use]
pub fn normalize_qualified_type_name(raw: &str) -> String {
    if is_sentinel(raw) || raw.trim().is_empty() {
        return raw.to_string();
    }

    split_segments(raw.trim())
        .into_iter()
        .map(normalize_nested_type_segment)
        .collect::<Vec<_>>()
        .join(".")
}

/// Produce the canonical FQN of a method or member.
///
/// The return type is dropped, generic lists are stripped at every type level
/// and at the method level, and the parameter list is replaced with `(...)`:
/// `void Namespace.Type<T>.Method<U>(T a, U b)` becomes
/// `Namespace.Type.Method(...)`.
#[must_use]
pub fn normalize_fully_qualified_method_name(raw: &str) -> String {
    if raw.trim().is_empty() {
        return raw.to_string();
    }

    let name = strip_return_type(raw);
    let (head, tail) = match find_parameter_list(name) {
        Some((start, end)) => (&name[..start], Some(&name[end + 1..])),
        None => (name, None),
    };

    let segments = split_segments(head);
    let Some((last, types)) = segments.split_last() else {
        return raw.to_string();
    };

    let mut parts: Vec<String> = types.iter().map(|segment| normalize_nested_type_segment(segment)).collect();
    parts.push(format_member_segment(last, tail));
    parts.join(".")
}

/// Join a declaring type FQN with a member display name.
///
/// Some dialects repeat the enclosing type names in front of the member name
/// (`void Outer.Inner.Run(int a)` declared in `NS.Outer+Inner`). The repeated
/// segments are collapsed instead of appended, so the result is
/// `NS.Outer+Inner.Run(...)`. A member named after its declaring type is its
/// constructor and becomes `.ctor`, or `.cctor` when declared `static`.
#[must_use]
pub fn combine_member_fqn(type_fqn: &str, member_display: &str) -> String {
    let is_static = member_display.split_whitespace().any(|word| word == "static");
    let name = strip_return_type(member_display);
    let (head, tail) = match find_parameter_list(name) {
        Some((start, end)) => (&name[..start], Some(&name[end + 1..])),
        None => (name, None),
    };

    let segments = split_segments(head);
    let type_path = type_path_segments(type_fqn);

    // Longest run of leading member segments that repeats the end of the type path
    let mut skip = 0;
    for candidate in (1..segments.len()).rev() {
        let prefix: Vec<String> = segments[..candidate]
            .iter()
            .flat_map(|segment| split_nested(segment))
            .map(|segment| normalize_type_name(segment.trim()))
            .collect();
        if prefix.len() <= type_path.len() && type_path[type_path.len() - prefix.len()..] == prefix[..] {
            skip = candidate;
            break;
        }
    }

    let remaining = &segments[skip..];
    let Some((last, qualifiers)) = remaining.split_last() else {
        return type_fqn.to_string();
    };

    let mut parts: Vec<String> = vec![type_fqn.to_string()];
    parts.extend(qualifiers.iter().map(|segment| normalize_nested_type_segment(segment)));

    let declaring_type = type_path.last().map(String::as_str);
    let member_name = strip_generic_suffix(last.trim());
    if qualifiers.is_empty() && tail.is_some() && declaring_type == Some(member_name) {
        let ctor = if is_static { ".cctor" } else { ".ctor" };
        parts.push(format!("{ctor}{PARAMETER_PLACEHOLDER}"));
    } else {
        parts.push(format_member_segment(last, tail));
    }

    parts.join(".")
}

/// The innermost simple name of a type FQN: `NS.Outer+Inner<T>` gives `Inner`.
#[must_use]
pub fn simple_type_name(type_fqn: &str) -> String {
    type_path_segments(type_fqn).pop().unwrap_or_default()
}

fn type_path_segments(type_fqn: &str) -> Vec<String> {
    split_segments(type_fqn)
        .into_iter()
        .flat_map(split_nested)
        .map(|segment| normalize_type_name(segment.trim()))
        .collect()
}

fn format_member_segment(segment: &str, parameter_tail: Option<&str>) -> String {
    let segment = segment.trim();
    let name = if is_special_name(segment) {
        segment
    } else {
        strip_generic_suffix(segment)
    };

    match parameter_tail {
        Some(rest) => format!("{name}{PARAMETER_PLACEHOLDER}{rest}"),
        None => name.to_string(),
    }
}

fn normalize_nested_type_segment(segment: &str) -> String {
    if is_sentinel(segment) {
        return segment.to_string();
    }

    split_nested(segment.trim())
        .into_iter()
        .map(|part| normalize_type_name(part.trim()))
        .collect::<Vec<_>>()
        .join("+")
}

fn is_special_name(name: &str) -> bool {
    name.starts_with('<')
        || name.starts_with(".ctor")
        || name.starts_with(".cctor")
        || name.starts_with("op_")
        || name.contains("operator")
}

/// Remove a trailing `<...>` list and backtick arity from a name.
fn strip_generic_suffix(name: &str) -> &str {
    let mut name = name.trim_end();

    if name.ends_with('>') {
        let mut depth = 0usize;
        for (i, c) in name.char_indices().rev() {
            match c {
                '>' => depth += 1,
                '<' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if i > 0 {
                            name = name[..i].trim_end();
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(pos) = name.find('`')
        && pos > 0
        && name[pos..].chars().all(|c| c == '`' || c.is_ascii_digit())
    {
        name = &name[..pos];
    }

    name
}
