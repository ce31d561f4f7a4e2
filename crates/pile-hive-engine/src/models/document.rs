use serde::{Deserialize, Serialize};

use crate::models::inline::Spans;
use crate::models::{Element, ElementKind, Node, Path, Point, Text};

/// Position of a caret expressed as the n-th text block in document order.
///
/// Restructuring commands (wrapping, unwrapping, splitting lists) move text
/// blocks around without changing their order, so selections are carried
/// across them as cursors and turned back into points afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub block: usize,
    pub offset: usize,
}

impl Cursor {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// An ordered sequence of top-level blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    blocks: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            blocks: vec![Element::paragraph("")],
        }
    }
}

impl Document {
    /// The empty document: a single empty paragraph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from blocks, restoring every structural invariant
    pub fn from_blocks(blocks: Vec<Element>) -> Self {
        let mut doc = Self { blocks };
        doc.normalize();
        doc
    }

    /// One paragraph per line
    pub fn from_plain_text(text: &str) -> Self {
        Self::from_blocks(text.split('\n').map(Element::paragraph).collect())
    }

    pub fn blocks(&self) -> &[Element] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Element> {
        &mut self.blocks
    }

    pub fn element(&self, path: &Path) -> Option<&Element> {
        let (first, rest) = path.indices().split_first()?;
        let mut element = self.blocks.get(*first)?;
        for index in rest {
            element = element.children.get(*index)?.as_element()?;
        }
        Some(element)
    }

    pub(crate) fn element_mut(&mut self, path: &Path) -> Option<&mut Element> {
        let (first, rest) = path.indices().split_first()?;
        let mut element = self.blocks.get_mut(*first)?;
        for index in rest {
            element = match element.children.get_mut(*index)? {
                Node::Element(child) => child,
                Node::Text(_) => return None,
            };
        }
        Some(element)
    }

    /// Remove the element at `path`, returning it
    pub(crate) fn remove(&mut self, path: &Path) -> Option<Element> {
        let index = path.last()?;
        match path.parent() {
            Some(parent) if !parent.is_empty() => {
                let parent = self.element_mut(&parent)?;
                if index >= parent.children.len() {
                    return None;
                }
                match parent.children.remove(index) {
                    Node::Element(element) => Some(element),
                    Node::Text(_) => None,
                }
            }
            _ => (index < self.blocks.len()).then(|| self.blocks.remove(index)),
        }
    }

    /// Insert `element` so that it ends up at `path`
    pub(crate) fn insert(&mut self, path: &Path, element: Element) {
        let Some(index) = path.last() else {
            return;
        };
        match path.parent() {
            Some(parent) if !parent.is_empty() => {
                if let Some(parent) = self.element_mut(&parent) {
                    let index = index.min(parent.children.len());
                    parent.children.insert(index, Node::Element(element));
                }
            }
            _ => {
                let index = index.min(self.blocks.len());
                self.blocks.insert(index, element);
            }
        }
    }

    /// Paths of every text block, in document order
    pub fn text_block_paths(&self) -> Vec<Path> {
        let mut paths = Vec::new();
        for (index, block) in self.blocks.iter().enumerate() {
            collect_text_blocks(block, Path::from([index]), &mut paths);
        }
        paths
    }

    pub fn text_block_count(&self) -> usize {
        self.text_block_paths().len()
    }

    pub fn path_of(&self, block: usize) -> Option<Path> {
        self.text_block_paths().into_iter().nth(block)
    }

    pub fn block_index(&self, path: &Path) -> Option<usize> {
        self.text_block_paths().iter().position(|p| p == path)
    }

    /// The n-th text block
    pub fn text_block(&self, block: usize) -> Option<&Element> {
        self.element(&self.path_of(block)?)
    }

    pub(crate) fn text_block_mut(&mut self, block: usize) -> Option<&mut Element> {
        let path = self.path_of(block)?;
        self.element_mut(&path)
    }

    /// The container directly holding the n-th text block, if it is in a list
    pub fn container_of(&self, block: usize) -> Option<&Element> {
        let path = self.path_of(block)?;
        let parent = path.parent().filter(|p| !p.is_empty())?;
        self.element(&parent)
    }

    pub(crate) fn spans(&self, block: usize) -> Spans {
        self.text_block(block)
            .map(|element| Spans::from_nodes(&element.children))
            .unwrap_or_default()
    }

    pub(crate) fn set_spans(&mut self, block: usize, spans: Spans) {
        if let Some(element) = self.text_block_mut(block) {
            element.children = if element.kind.is_void() {
                vec![Node::Text(Text::default())]
            } else {
                spans.into_nodes()
            };
        }
    }

    pub fn block_len(&self, block: usize) -> usize {
        self.text_block(block).map(Element::text_len).unwrap_or(0)
    }

    /// Resolve a point into a cursor. Unknown paths resolve to the last text
    /// block before them; offsets are clamped onto a char boundary.
    pub fn cursor(&self, point: &Point) -> Cursor {
        let paths = self.text_block_paths();
        let block = match paths.iter().position(|p| *p == point.path) {
            Some(block) => block,
            None => paths
                .iter()
                .rposition(|p| *p < point.path)
                .unwrap_or(0),
        };
        self.clamp(Cursor::new(block, point.offset))
    }

    pub fn point(&self, cursor: Cursor) -> Point {
        let cursor = self.clamp(cursor);
        let path = self.path_of(cursor.block).unwrap_or_else(|| Path::from([0]));
        Point::new(path, cursor.offset)
    }

    pub fn clamp(&self, cursor: Cursor) -> Cursor {
        let count = self.text_block_count();
        let block = cursor.block.min(count.saturating_sub(1));
        let text = self.text_block(block).map(Element::string).unwrap_or_default();
        Cursor::new(block, floor_char_boundary(&text, cursor.offset))
    }

    pub fn start(&self) -> Point {
        self.point(Cursor::new(0, 0))
    }

    pub fn end(&self) -> Point {
        let last = self.text_block_count().saturating_sub(1);
        self.point(Cursor::new(last, self.block_len(last)))
    }

    /// Text between two points, in document order, without separators
    pub fn string_between(&self, a: &Point, b: &Point) -> String {
        let (a, b) = (self.cursor(a), self.cursor(b));
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let mut out = String::new();
        for block in start.block..=end.block {
            let text = self.text_block(block).map(Element::string).unwrap_or_default();
            let from = if block == start.block { start.offset } else { 0 };
            let to = if block == end.block { end.offset } else { text.len() };
            out.push_str(&text[from.min(to)..to]);
        }
        out
    }

    /// Text blocks joined by newlines
    pub fn plain_text(&self) -> String {
        self.text_block_paths()
            .iter()
            .filter_map(|path| self.element(path))
            .map(Element::string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Indented debug rendering of the tree, one node per line
    pub fn outline(&self) -> String {
        let mut lines = Vec::new();
        for block in &self.blocks {
            outline_element(block, 0, &mut lines);
        }
        lines.join("\n")
    }

    /// Restore the structural invariants:
    /// - every element has at least one child
    /// - containers hold only their item kind and are never empty
    /// - list items never appear outside a container
    /// - text blocks hold normalized runs and links, void blocks one empty run
    /// - the document holds at least one block
    pub fn normalize(&mut self) {
        let blocks = std::mem::take(&mut self.blocks);
        let mut out = Vec::with_capacity(blocks.len());
        for block in blocks {
            normalize_top_level(block, &mut out);
        }
        if out.is_empty() {
            out.push(Element::paragraph(""));
        }
        self.blocks = out;
    }
}

fn collect_text_blocks(element: &Element, path: Path, out: &mut Vec<Path>) {
    if element.kind.is_text_block() {
        out.push(path);
        return;
    }
    for (index, child) in element.children.iter().enumerate() {
        if let Node::Element(child) = child {
            collect_text_blocks(child, path.child(index), out);
        }
    }
}

fn outline_element(element: &Element, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let align = element
        .align
        .map(|align| format!(" align={align:?}").to_lowercase())
        .unwrap_or_default();
    lines.push(format!("{indent}{}{align}", element.kind.label()));
    for child in &element.children {
        match child {
            Node::Element(child) => outline_element(child, depth + 1, lines),
            Node::Text(text) => {
                let marks: Vec<&str> = text.marks.iter().map(|mark| mark.name()).collect();
                let marks = if marks.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", marks.join(","))
                };
                lines.push(format!("{indent}  {:?}{marks}", text.text));
            }
        }
    }
}

fn normalize_top_level(element: Element, out: &mut Vec<Element>) {
    let kind = element.kind.clone();
    if kind.is_container() {
        let mut items = Vec::new();
        collect_items(&kind, element.children, &mut items);
        if !items.is_empty() {
            out.push(Element {
                kind,
                align: element.align,
                children: items.into_iter().map(Node::Element).collect(),
            });
        }
    } else if kind.is_list_item() {
        let container = match kind {
            ElementKind::TodoItem { .. } => ElementKind::TodoList,
            _ => ElementKind::BulletedList,
        };
        out.push(Element::new(
            container,
            vec![Node::Element(normalize_text_block(element))],
        ));
    } else if let ElementKind::Link { .. } = kind {
        out.push(normalize_text_block(Element::new(
            ElementKind::Paragraph,
            vec![Node::Element(element)],
        )));
    } else {
        out.push(normalize_text_block(element));
    }
}

/// Gather the items of a container, coercing anything else into its item kind
fn collect_items(container: &ElementKind, children: Vec<Node>, items: &mut Vec<Element>) {
    let Some(item_kind) = container.item_kind() else {
        return;
    };
    for child in children {
        match child {
            Node::Element(element) if element.kind.is_container() => {
                collect_items(container, element.children, items);
            }
            Node::Element(mut element) => {
                if !container.accepts_item(&element.kind) {
                    element.kind = item_kind.clone();
                }
                items.push(normalize_text_block(element));
            }
            Node::Text(text) => items.push(Element::new(item_kind.clone(), vec![Node::Text(text)])),
        }
    }
}

fn normalize_text_block(mut element: Element) -> Element {
    element.children = if element.kind.is_void() {
        vec![Node::Text(Text::default())]
    } else {
        Spans::from_nodes(&element.children).into_nodes()
    };
    element
}

/// Largest char boundary of `text` that is `<= offset`
pub(crate) fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Char boundary before `offset`, or 0
pub(crate) fn prev_char_boundary(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())]
        .char_indices()
        .next_back()
        .map(|(index, _)| index)
        .unwrap_or(0)
}

/// Char boundary after `offset`, or the text length
pub(crate) fn next_char_boundary(text: &str, offset: usize) -> usize {
    let offset = offset.min(text.len());
    text[offset..]
        .chars()
        .next()
        .map(|c| offset + c.len_utf8())
        .unwrap_or(text.len())
}
