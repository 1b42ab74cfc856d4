use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::ElementRef;

/// All text under an element, whitespace-trimmed at the edges.
pub(crate) fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of the element's direct text-node children only, one entry per
/// non-blank node. Child elements are skipped, not descended into.
pub(crate) fn text_node_parts(element: ElementRef) -> Vec<String> {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            _ => None,
        })
        .collect()
}

/// Text of an element's last child node, whether that node is a text node or
/// a nested element.
pub(crate) fn trailing_text(element: ElementRef) -> String {
    element
        .children()
        .last()
        .map(node_text)
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn node_text(node: NodeRef<'_, Node>) -> String {
    match node.value() {
        Node::Text(text) => text.to_string(),
        _ => ElementRef::wrap(node)
            .map(|element| element.text().collect())
            .unwrap_or_default(),
    }
}

/// Direct child elements, in document order.
pub(crate) fn child_elements<'a>(
    element: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.children().filter_map(ElementRef::wrap)
}
