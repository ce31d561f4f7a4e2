//! Flat view of a text block's inline content.
//!
//! A text block stores runs and link elements as a small tree. Edits are far
//! easier on a flat list of spans addressed by byte offsets, so commands
//! flatten the children, edit the spans, and rebuild the tree. Rebuilding is
//! also where inline normalization happens: adjacent runs with the same
//! formatting merge, empty runs disappear, and links get padding runs.

use std::ops::Range;

use crate::models::{Element, ElementKind, Marks, Node, Text};

/// A run of text with its marks and the URL of the link it sits in, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub marks: Marks,
    pub link: Option<String>,
}

impl Span {
    pub fn new(text: impl Into<String>, marks: Marks, link: Option<String>) -> Self {
        Self {
            text: text.into(),
            marks,
            link,
        }
    }

    fn same_format(&self, other: &Span) -> bool {
        self.marks == other.marks && self.link == other.link
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spans(Vec<Span>);

impl Spans {
    pub fn new(spans: Vec<Span>) -> Self {
        Self(spans)
    }

    /// Flatten inline children. Any element that is not a link contributes
    /// its text as plain runs.
    pub fn from_nodes(children: &[Node]) -> Self {
        let mut spans = Vec::new();
        collect_spans(children, None, &mut spans);
        Self(spans)
    }

    pub fn as_slice(&self) -> &[Span] {
        &self.0
    }

    /// Total byte length
    pub fn len(&self) -> usize {
        self.0.iter().map(|span| span.text.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text(&self) -> String {
        self.0.iter().map(|span| span.text.as_str()).collect()
    }

    /// The span the caret at `offset` takes its formatting from: the one
    /// ending at or containing the offset, or the first span at offset 0
    pub fn span_at(&self, offset: usize) -> Option<&Span> {
        let mut pos = 0;
        for span in &self.0 {
            let end = pos + span.text.len();
            if offset > pos && offset <= end {
                return Some(span);
            }
            pos = end;
        }
        self.0.first()
    }

    /// URL of the link strictly surrounding `offset`. A caret at either edge
    /// of a link is outside it.
    pub fn link_at(&self, offset: usize) -> Option<&str> {
        let mut pos = 0;
        for span in &self.0 {
            let end = pos + span.text.len();
            if offset > pos && offset < end {
                return span.link.as_deref();
            }
            pos = end;
        }
        None
    }

    /// Make sure a span boundary falls on `offset`, splitting the span that
    /// straddles it. Returns the index of the first span starting at or
    /// after `offset`.
    pub fn split_at(&mut self, offset: usize) -> usize {
        let mut pos = 0;
        for index in 0..self.0.len() {
            if offset == pos {
                return index;
            }
            let len = self.0[index].text.len();
            if offset < pos + len {
                let tail = self.0[index].text.split_off(offset - pos);
                let rest = Span::new(
                    tail,
                    self.0[index].marks,
                    self.0[index].link.clone(),
                );
                self.0.insert(index + 1, rest);
                return index + 1;
            }
            pos += len;
        }
        self.0.len()
    }

    /// Split at both ends of `range` and return the span indices inside it
    pub fn isolate(&mut self, range: Range<usize>) -> Range<usize> {
        let start = self.split_at(range.start);
        let end = self.split_at(range.end);
        start..end
    }

    /// Spans that overlap `range` by at least one byte
    pub fn intersecting(&self, range: Range<usize>) -> Vec<&Span> {
        let mut pos = 0;
        let mut out = Vec::new();
        for span in &self.0 {
            let end = pos + span.text.len();
            if pos.max(range.start) < end.min(range.end) {
                out.push(span);
            }
            pos = end;
        }
        out
    }

    /// Apply `f` to every span inside `range`, splitting at the edges first
    pub fn update_range(&mut self, range: Range<usize>, mut f: impl FnMut(&mut Span)) {
        if range.is_empty() {
            return;
        }
        let indices = self.isolate(range);
        for span in &mut self.0[indices] {
            f(span);
        }
    }

    /// Everything after `offset` moves into the returned spans
    pub fn split_off(&mut self, offset: usize) -> Spans {
        let index = self.split_at(offset);
        Spans(self.0.split_off(index))
    }

    pub fn append(&mut self, other: Spans) {
        self.0.extend(other.0);
    }

    pub fn insert(&mut self, offset: usize, span: Span) {
        let index = self.split_at(offset);
        self.0.insert(index, span);
    }

    pub fn delete(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let indices = self.isolate(range);
        self.0.drain(indices);
    }

    /// Rebuild inline children: merge equal neighbours, drop empty runs,
    /// group link spans into link elements and pad links with runs.
    pub fn into_nodes(self) -> Vec<Node> {
        let mut merged: Vec<Span> = Vec::new();
        for span in self.0 {
            if span.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.same_format(&span) => last.text.push_str(&span.text),
                _ => merged.push(span),
            }
        }

        let mut nodes: Vec<Node> = Vec::new();
        for span in merged {
            let text = Text::with_marks(span.text, span.marks);
            match span.link {
                None => nodes.push(Node::Text(text)),
                Some(url) => {
                    let extend = matches!(
                        nodes.last(),
                        Some(Node::Element(Element {
                            kind: ElementKind::Link { url: last },
                            ..
                        })) if *last == url
                    );
                    if extend {
                        if let Some(Node::Element(link)) = nodes.last_mut() {
                            link.children.push(Node::Text(text));
                        }
                    } else {
                        if !matches!(nodes.last(), Some(Node::Text(_))) {
                            nodes.push(Node::Text(Text::default()));
                        }
                        nodes.push(Node::Element(Element::new(
                            ElementKind::Link { url },
                            vec![Node::Text(text)],
                        )));
                    }
                }
            }
        }

        if !matches!(nodes.last(), Some(Node::Text(_))) {
            nodes.push(Node::Text(Text::default()));
        }
        nodes
    }
}

fn collect_spans(children: &[Node], link: Option<&str>, out: &mut Vec<Span>) {
    for child in children {
        match child {
            Node::Text(text) => out.push(Span::new(
                text.text.clone(),
                text.marks,
                link.map(str::to_string),
            )),
            Node::Element(element) => match &element.kind {
                ElementKind::Link { url } => collect_spans(&element.children, Some(url), out),
                _ => collect_spans(&element.children, link, out),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mark;
    use pretty_assertions::assert_eq;

    fn plain(text: &str) -> Span {
        Span::new(text, Marks::default(), None)
    }

    #[test]
    fn test_split_at_inside_span() {
        let mut spans = Spans::new(vec![plain("hello world")]);
        let index = spans.split_at(5);

        assert_eq!(index, 1);
        assert_eq!(spans.as_slice()[0].text, "hello");
        assert_eq!(spans.as_slice()[1].text, " world");
    }

    #[test]
    fn test_split_at_existing_boundary_is_noop() {
        let mut spans = Spans::new(vec![plain("ab"), plain("cd")]);
        assert_eq!(spans.split_at(2), 1);
        assert_eq!(spans.as_slice().len(), 2);
        assert_eq!(spans.split_at(4), 2);
    }

    #[test]
    fn test_update_range_marks_only_inside() {
        let mut spans = Spans::new(vec![plain("hello world")]);
        spans.update_range(6..11, |span| span.marks.set(Mark::Bold, true));

        let nodes = spans.into_nodes();
        assert_eq!(
            nodes,
            vec![
                Node::Text(Text::new("hello ")),
                Node::Text(Text::with_marks("world", Marks::default().with(Mark::Bold))),
            ]
        );
    }

    #[test]
    fn test_into_nodes_merges_equal_runs() {
        let spans = Spans::new(vec![plain("ab"), plain(""), plain("cd")]);
        assert_eq!(spans.into_nodes(), vec![Node::Text(Text::new("abcd"))]);
    }

    #[test]
    fn test_into_nodes_empty_gives_single_empty_run() {
        assert_eq!(
            Spans::default().into_nodes(),
            vec![Node::Text(Text::default())]
        );
    }

    #[test]
    fn test_into_nodes_pads_links() {
        let spans = Spans::new(vec![Span::new(
            "site",
            Marks::default(),
            Some("https://a.example".to_string()),
        )]);
        let nodes = spans.into_nodes();

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], Node::Text(Text::default()));
        assert_eq!(
            nodes[1].as_element().map(|e| e.kind.clone()),
            Some(ElementKind::Link {
                url: "https://a.example".to_string()
            })
        );
        assert_eq!(nodes[2], Node::Text(Text::default()));
    }

    #[test]
    fn test_from_nodes_round_trip_through_link() {
        let children = vec![
            Node::Text(Text::new("go ")),
            Node::Element(Element::with_text(
                ElementKind::Link {
                    url: "u".to_string(),
                },
                "there",
            )),
            Node::Text(Text::default()),
        ];
        let spans = Spans::from_nodes(&children);

        assert_eq!(spans.text(), "go there");
        assert_eq!(spans.as_slice()[1].link.as_deref(), Some("u"));
        assert_eq!(spans.into_nodes(), children);
    }

    #[test]
    fn test_span_at_prefers_span_before_boundary() {
        let bold = Marks::default().with(Mark::Bold);
        let spans = Spans::new(vec![Span::new("ab", bold, None), plain("cd")]);

        assert_eq!(spans.span_at(2).map(|s| s.marks), Some(bold));
        assert_eq!(spans.span_at(3).map(|s| s.marks), Some(Marks::default()));
        assert_eq!(spans.span_at(0).map(|s| s.marks), Some(bold));
    }

    #[test]
    fn test_link_at_excludes_edges() {
        let spans = Spans::new(vec![
            plain("a "),
            Span::new("link", Marks::default(), Some("u".to_string())),
        ]);
        assert_eq!(spans.link_at(2), None);
        assert_eq!(spans.link_at(4), Some("u"));
        assert_eq!(spans.link_at(6), None);
    }

    #[test]
    fn test_intersecting_ignores_touching_spans() {
        let spans = Spans::new(vec![plain("ab"), plain("cd"), plain("ef")]);
        let hits: Vec<&str> = spans
            .intersecting(2..4)
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(hits, vec!["cd"]);
    }

    #[test]
    fn test_delete_across_spans() {
        let mut spans = Spans::new(vec![plain("abc"), plain("def")]);
        spans.delete(1..5);
        assert_eq!(spans.text(), "af");
    }
}
