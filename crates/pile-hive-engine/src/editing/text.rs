use super::marks::block_ranges;
use super::{CursorRange, Editor};
use crate::models::document::{next_char_boundary, prev_char_boundary};
use crate::models::{Cursor, Element, ElementKind, Marks, Span};

impl Editor {
    /// Collapse the range, deleting its content when expanded
    pub(super) fn collapse(&mut self, range: CursorRange) -> Cursor {
        if range.is_collapsed() {
            range.focus
        } else {
            self.delete_between(range.start(), range.end())
        }
    }

    pub(super) fn insert_text(&mut self, range: &mut Option<CursorRange>, text: &str) {
        let Some(current) = *range else {
            return;
        };
        let mut caret = self.collapse(current);
        *range = Some(CursorRange::collapsed(caret));
        if text.is_empty() {
            return;
        }

        if self.is_void(caret.block) {
            self.insert_block(range, Element::paragraph(""));
            let Some(next) = *range else {
                return;
            };
            caret = next.focus;
        }

        let spans = self.document.spans(caret.block);
        let marks = self
            .pending_marks
            .take()
            .or_else(|| spans.span_at(caret.offset).map(|span| span.marks))
            .unwrap_or_default();
        let link = spans.link_at(caret.offset).map(str::to_string);

        self.insert_span(caret, Span::new(text, marks, link));
        *range = Some(CursorRange::collapsed(Cursor::new(
            caret.block,
            caret.offset + text.len(),
        )));
    }

    fn insert_span(&mut self, caret: Cursor, span: Span) {
        let mut spans = self.document.spans(caret.block);
        spans.insert(caret.offset, span);
        self.document.set_spans(caret.block, spans);
    }

    fn is_void(&self, block: usize) -> bool {
        self.document
            .text_block(block)
            .is_some_and(|element| element.kind.is_void())
    }

    pub(super) fn insert_break(&mut self, range: &mut Option<CursorRange>) {
        let Some(current) = *range else {
            return;
        };
        let caret = self.collapse(current);
        *range = Some(CursorRange::collapsed(caret));

        let Some(kind) = self.document.text_block(caret.block).map(|b| b.kind.clone()) else {
            return;
        };
        match kind {
            ElementKind::Code => self.insert_text(range, "\n"),
            ElementKind::Divider | ElementKind::Image { .. } => {
                self.insert_block(range, Element::paragraph(""))
            }
            ElementKind::Paragraph
            | ElementKind::Heading { .. }
            | ElementKind::Quote
            | ElementKind::ListItem
            | ElementKind::TodoItem { .. }
            | ElementKind::BulletedList
            | ElementKind::NumberedList
            | ElementKind::TodoList
            | ElementKind::Link { .. } => {
                self.split_block(caret);
                *range = Some(CursorRange::collapsed(Cursor::new(caret.block + 1, 0)));
            }
        }
    }

    /// Collapsed: insert the URL as linked text. Expanded: link the selected
    /// text of every touched block and collapse to the end.
    pub(super) fn insert_link(&mut self, range: &mut Option<CursorRange>, url: &str) {
        let Some(current) = *range else {
            return;
        };
        if url.is_empty() {
            return;
        }

        if current.is_collapsed() {
            let caret = current.focus;
            if self.is_void(caret.block) {
                return;
            }
            self.insert_span(
                caret,
                Span::new(url, Marks::default(), Some(url.to_string())),
            );
            *range = Some(CursorRange::collapsed(Cursor::new(
                caret.block,
                caret.offset + url.len(),
            )));
            return;
        }

        for (block, bytes) in block_ranges(&self.document, &current) {
            let mut spans = self.document.spans(block);
            spans.update_range(bytes, |span| span.link = Some(url.to_string()));
            self.document.set_spans(block, spans);
        }
        *range = Some(CursorRange::collapsed(current.end()));
    }

    pub(super) fn delete_backward(&mut self, range: &mut Option<CursorRange>) {
        let Some(current) = *range else {
            return;
        };
        if !current.is_collapsed() {
            let caret = self.collapse(current);
            *range = Some(CursorRange::collapsed(caret));
            return;
        }

        let caret = current.focus;
        let Some(block) = self.document.text_block(caret.block) else {
            return;
        };
        let kind = block.kind.clone();
        let text = block.string();

        if caret.offset == 0 {
            if kind != ElementKind::Paragraph {
                // a block start turns the block back into a paragraph first
                if kind.is_list_item() {
                    super::blocks::lift(&mut self.document, caret.block..=caret.block);
                }
                if let Some(element) = self.document.text_block_mut(caret.block) {
                    element.kind = ElementKind::Paragraph;
                }
                return;
            }
            if caret.block == 0 {
                return;
            }
            let previous = caret.block - 1;
            let merged = if self.is_void(previous) {
                self.remove_block(previous);
                Cursor::new(previous, 0)
            } else {
                let end = Cursor::new(previous, self.document.block_len(previous));
                self.delete_between(end, caret)
            };
            *range = Some(CursorRange::collapsed(merged));
            return;
        }

        let from = prev_char_boundary(&text, caret.offset);
        let mut spans = self.document.spans(caret.block);
        spans.delete(from..caret.offset);
        self.document.set_spans(caret.block, spans);
        *range = Some(CursorRange::collapsed(Cursor::new(caret.block, from)));
    }

    pub(super) fn delete_forward(&mut self, range: &mut Option<CursorRange>) {
        let Some(current) = *range else {
            return;
        };
        if !current.is_collapsed() {
            let caret = self.collapse(current);
            *range = Some(CursorRange::collapsed(caret));
            return;
        }

        let caret = current.focus;
        let Some(block) = self.document.text_block(caret.block) else {
            return;
        };
        let text = block.string();

        if caret.offset < text.len() {
            let to = next_char_boundary(&text, caret.offset);
            let mut spans = self.document.spans(caret.block);
            spans.delete(caret.offset..to);
            self.document.set_spans(caret.block, spans);
            return;
        }

        let next = caret.block + 1;
        if next >= self.document.text_block_count() {
            return;
        }
        let merged = if self.is_void(next) && !self.is_void(caret.block) {
            self.remove_block(next);
            caret
        } else {
            self.delete_between(caret, Cursor::new(next, 0))
        };
        *range = Some(CursorRange::collapsed(merged));
    }

    /// Delete everything between two cursors in document order, merging the
    /// tail of the end block into the start block. Returns the caret.
    pub(super) fn delete_between(&mut self, start: Cursor, end: Cursor) -> Cursor {
        let (start, end) = (self.document.clamp(start), self.document.clamp(end));
        if start >= end {
            return start;
        }

        if start.block == end.block {
            let mut spans = self.document.spans(start.block);
            spans.delete(start.offset..end.offset);
            self.document.set_spans(start.block, spans);
            return start;
        }

        if self.is_void(start.block) {
            // the void goes away and the end block keeps its tail
            let mut spans = self.document.spans(end.block);
            spans.delete(0..end.offset);
            self.document.set_spans(end.block, spans);
            self.remove_blocks(start.block, end.block - 1);
            return Cursor::new(start.block, 0);
        }

        let mut head = self.document.spans(start.block);
        let mut rest = self.document.spans(end.block);
        let tail = rest.split_off(end.offset);
        let _ = head.split_off(start.offset);
        head.append(tail);
        self.document.set_spans(start.block, head);
        self.remove_blocks(start.block + 1, end.block);
        start
    }

    fn remove_block(&mut self, block: usize) {
        self.remove_blocks(block, block);
    }

    /// Remove text blocks `first..=last`, latest first so earlier paths stay valid
    fn remove_blocks(&mut self, first: usize, last: usize) {
        let paths: Vec<_> = (first..=last)
            .filter_map(|block| self.document.path_of(block))
            .collect();
        for path in paths.iter().rev() {
            self.document.remove(path);
        }
    }
}
