use crate::models::{Document, Element, ElementKind, Node};

/// Validates the structural invariants of a document.
///
/// Asserts that:
/// - The document holds at least one block
/// - Every element has at least one child
/// - Containers hold only their item kind and nothing else
/// - List items appear only directly inside a container
/// - Void blocks hold exactly one empty run
/// - Links appear only inside text blocks and hold only runs
///
/// # Panics
/// Panics with a descriptive message if any invariant is violated.
pub fn check(doc: &Document) {
    assert!(!doc.blocks().is_empty(), "document has no blocks");
    for (index, block) in doc.blocks().iter().enumerate() {
        assert!(
            !block.kind.is_list_item(),
            "list item at top level: block {index}"
        );
        assert!(
            !matches!(block.kind, ElementKind::Link { .. }),
            "link at top level: block {index}"
        );
        check_element(block, &index.to_string());
    }
}

fn check_element(element: &Element, at: &str) {
    assert!(
        !element.children.is_empty(),
        "element without children at {at}: {}",
        element.kind.label()
    );

    if element.kind.is_container() {
        for (index, child) in element.children.iter().enumerate() {
            let child_at = format!("{at}.{index}");
            let child = child
                .as_element()
                .unwrap_or_else(|| panic!("text directly inside container at {child_at}"));
            assert!(
                element.kind.accepts_item(&child.kind),
                "{} holds {} at {child_at}",
                element.kind.label(),
                child.kind.label()
            );
            check_element(child, &child_at);
        }
        return;
    }

    if element.kind.is_void() {
        assert!(
            element.children.len() == 1
                && element.children[0].as_text().is_some_and(|t| t.text.is_empty()),
            "void block with content at {at}"
        );
        return;
    }

    for (index, child) in element.children.iter().enumerate() {
        if let Node::Element(child) = child {
            let child_at = format!("{at}.{index}");
            assert!(
                matches!(child.kind, ElementKind::Link { .. }),
                "block {} nested inside {} at {child_at}",
                child.kind.label(),
                element.kind.label()
            );
            assert!(
                child.children.iter().all(|c| c.as_text().is_some()),
                "link with nested elements at {child_at}"
            );
            check_element(child, &child_at);
        }
    }
}
