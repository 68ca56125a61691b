//! Small conveniences over `roxmltree` shared by the XML dialects.

use roxmltree::Node;

/// Child elements with the given tag name.
pub fn children<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |child| child.has_tag_name(name))
}

/// The first child element with the given tag name.
pub fn child<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

/// Trimmed text content of the first child element with the given tag name.
pub fn child_text<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'static str) -> Option<&'a str> {
    child(node, name).and_then(|n| n.text()).map(str::trim)
}

pub fn attr_f64(node: Node<'_, '_>, name: &str) -> Option<f64> {
    node.attribute(name).and_then(|value| value.trim().parse::<f64>().ok())
}

pub fn attr_u64(node: Node<'_, '_>, name: &str) -> Option<u64> {
    node.attribute(name).and_then(|value| value.trim().parse::<u64>().ok())
}

pub fn attr_u32(node: Node<'_, '_>, name: &str) -> Option<u32> {
    node.attribute(name).and_then(|value| value.trim().parse::<u32>().ok())
}
