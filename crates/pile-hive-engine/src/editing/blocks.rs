use std::ops::RangeInclusive;

use super::{BlockFormat, CursorRange, Editor};
use crate::models::{Cursor, Document, Element, ElementKind, Node, Path};

impl Editor {
    /// True iff every block touched by the selection matches `format`. List
    /// formats match on the enclosing container.
    pub fn is_block_active(&self, format: BlockFormat) -> bool {
        match self.cursor_range() {
            Some(range) => all_match(&self.document, range.blocks(), format),
            None => false,
        }
    }

    pub(super) fn toggle_block(
        &mut self,
        range: Option<&CursorRange>,
        format: BlockFormat,
        force_on: bool,
    ) {
        let Some(range) = range else {
            return;
        };
        let blocks = range.blocks();
        let active = !force_on && all_match(&self.document, blocks.clone(), format);

        if let BlockFormat::Align(align) = format {
            for block in blocks {
                if let Some(element) = self.document.text_block_mut(block) {
                    element.align = (!active).then_some(align);
                }
            }
            return;
        }

        lift(&mut self.document, blocks.clone());

        let kind = if active {
            ElementKind::Paragraph
        } else {
            match format.block_kind() {
                Some(kind) => kind,
                None => return,
            }
        };
        for block in blocks.clone() {
            if let Some(element) = self.document.text_block_mut(block) {
                element.kind = kind.clone();
            }
        }

        if !active && let Some(container) = format.container() {
            wrap(&mut self.document, blocks, container);
        }
    }

    pub(super) fn toggle_todo(&mut self, path: &Path) {
        if let Some(element) = self.document.element_mut(path)
            && let ElementKind::TodoItem { checked } = &mut element.kind
        {
            *checked = !*checked;
        }
    }

    /// Insert a new block at the caret: after the current block when the
    /// caret is at its end, before it when at its start, otherwise between
    /// the halves of the split block. The caret ends up at the end of the
    /// new block.
    pub(super) fn insert_block(&mut self, range: &mut Option<CursorRange>, element: Element) {
        let Some(current) = *range else {
            return;
        };
        let caret = self.collapse(current);
        let Some(path) = self.document.path_of(caret.block) else {
            return;
        };

        let len = self.document.block_len(caret.block);
        let after = if caret.offset >= len {
            true
        } else if caret.offset == 0 {
            false
        } else {
            self.split_block(caret);
            true
        };

        let index = match path.indices() {
            [top] => top + usize::from(after),
            [top, item] => split_container(&mut self.document, *top, item + usize::from(after)),
            _ => return,
        };
        let new_len = element.text_len();
        let blocks = self.document.blocks_mut();
        blocks.insert(index.min(blocks.len()), element);

        let block = caret.block + usize::from(after);
        *range = Some(CursorRange::collapsed(Cursor::new(block, new_len)));
    }

    /// Split a text block at the caret. The tail becomes the next sibling,
    /// keeping kind and alignment; to-do tails start unchecked.
    pub(super) fn split_block(&mut self, caret: Cursor) {
        let Some(path) = self.document.path_of(caret.block) else {
            return;
        };
        let Some(next) = path.next_sibling() else {
            return;
        };
        let Some(block) = self.document.element(&path) else {
            return;
        };

        let kind = match &block.kind {
            ElementKind::TodoItem { .. } => ElementKind::TodoItem { checked: false },
            kind => kind.clone(),
        };
        let align = block.align;

        let mut head = self.document.spans(caret.block);
        let tail = head.split_off(caret.offset);
        self.document.set_spans(caret.block, head);

        let mut element = Element::new(kind, tail.into_nodes());
        element.align = align;
        self.document.insert(&next, element);
    }
}

fn all_match(doc: &Document, blocks: RangeInclusive<usize>, format: BlockFormat) -> bool {
    blocks.into_iter().all(|block| matches_format(doc, block, format))
}

fn matches_format(doc: &Document, block: usize, format: BlockFormat) -> bool {
    let Some(element) = doc.text_block(block) else {
        return false;
    };
    if let BlockFormat::Align(align) = format {
        return element.align == Some(align);
    }
    match format.container() {
        Some(container) => doc
            .container_of(block)
            .is_some_and(|parent| parent.kind == container),
        None => format.block_kind().is_some_and(|kind| element.kind == kind),
    }
}

/// Move the given text blocks out of their list containers to the top
/// level, splitting each container around them. Text-block order does not
/// change.
pub(super) fn lift(doc: &mut Document, blocks: RangeInclusive<usize>) {
    let old = std::mem::take(doc.blocks_mut());
    let mut out = Vec::with_capacity(old.len());
    let mut ordinal = 0;

    for element in old {
        if !element.kind.is_container() {
            if element.kind.is_text_block() {
                ordinal += 1;
            }
            out.push(element);
            continue;
        }

        let Element {
            kind,
            align,
            children,
        } = element;
        let mut kept: Vec<Node> = Vec::new();
        for child in children {
            let inside = blocks.contains(&ordinal);
            ordinal += 1;
            match child {
                Node::Element(item) if inside => {
                    flush(&mut out, &kind, align, &mut kept);
                    out.push(item);
                }
                child => kept.push(child),
            }
        }
        flush(&mut out, &kind, align, &mut kept);
    }

    *doc.blocks_mut() = out;
}

fn flush(
    out: &mut Vec<Element>,
    kind: &ElementKind,
    align: Option<crate::models::Align>,
    kept: &mut Vec<Node>,
) {
    if kept.is_empty() {
        return;
    }
    out.push(Element {
        kind: kind.clone(),
        align,
        children: std::mem::take(kept),
    });
}

/// Wrap top-level text blocks into one new container
pub(super) fn wrap(doc: &mut Document, blocks: RangeInclusive<usize>, container: ElementKind) {
    let first = doc.path_of(*blocks.start()).and_then(|path| path.top());
    let last = doc.path_of(*blocks.end()).and_then(|path| path.top());
    let (Some(first), Some(last)) = (first, last) else {
        return;
    };
    if first > last {
        return;
    }

    let items: Vec<Node> = doc
        .blocks_mut()
        .drain(first..=last)
        .map(Node::Element)
        .collect();
    doc.blocks_mut()
        .insert(first, Element::new(container, items));
}

/// Split the container at `top` before item `at` and return the top-level
/// index where a block placed between the two parts belongs
pub(super) fn split_container(doc: &mut Document, top: usize, at: usize) -> usize {
    let blocks = doc.blocks_mut();
    let Some(container) = blocks.get_mut(top) else {
        return blocks.len();
    };
    if at == 0 {
        return top;
    }
    if at >= container.children.len() {
        return top + 1;
    }

    let rest = container.children.split_off(at);
    let tail = Element {
        kind: container.kind.clone(),
        align: container.align,
        children: rest,
    };
    blocks.insert(top + 1, tail);
    top + 1
}
