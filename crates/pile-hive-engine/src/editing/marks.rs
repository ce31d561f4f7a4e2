use super::{CursorRange, Editor};
use crate::models::{Document, Mark, Marks};

impl Editor {
    /// Whether `mark` is active for the current selection. An expanded
    /// selection needs the mark on every run it covers; a collapsed caret
    /// reports the pending marks or those of the run it sits in.
    pub fn is_mark_active(&self, mark: Mark) -> bool {
        match self.cursor_range() {
            None => false,
            Some(range) if range.is_collapsed() => self.caret_marks(range).contains(mark),
            Some(range) => all_carry(&self.document, &range, mark),
        }
    }

    fn caret_marks(&self, range: CursorRange) -> Marks {
        self.pending_marks.unwrap_or_else(|| {
            self.document
                .spans(range.focus.block)
                .span_at(range.focus.offset)
                .map(|span| span.marks)
                .unwrap_or_default()
        })
    }

    pub(super) fn toggle_mark(&mut self, range: Option<&CursorRange>, mark: Mark) {
        let Some(range) = range.copied() else {
            return;
        };

        if range.is_collapsed() {
            let mut marks = self.caret_marks(range);
            marks.set(mark, !marks.contains(mark));
            self.pending_marks = Some(marks);
            return;
        }

        let on = !all_carry(&self.document, &range, mark);
        for (block, bytes) in block_ranges(&self.document, &range) {
            let mut spans = self.document.spans(block);
            spans.update_range(bytes, |span| span.marks.set(mark, on));
            self.document.set_spans(block, spans);
        }
    }
}

/// Byte range covered in each block of an expanded range
pub(super) fn block_ranges(
    doc: &Document,
    range: &CursorRange,
) -> Vec<(usize, std::ops::Range<usize>)> {
    let (start, end) = (range.start(), range.end());
    (start.block..=end.block)
        .map(|block| {
            let from = if block == start.block { start.offset } else { 0 };
            let to = if block == end.block {
                end.offset
            } else {
                doc.block_len(block)
            };
            (block, from..to.max(from))
        })
        .collect()
}

fn all_carry(doc: &Document, range: &CursorRange, mark: Mark) -> bool {
    let mut seen = false;
    for (block, bytes) in block_ranges(doc, range) {
        let spans = doc.spans(block);
        for span in spans.intersecting(bytes) {
            if !span.marks.contains(mark) {
                return false;
            }
            seen = true;
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::Cmd;
    use crate::models::{Element, ElementKind, Node, Point, Text, invariants};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn editor(text: &str) -> Editor {
        Editor::new(Document::from_plain_text(text))
    }

    #[rstest]
    #[case(Mark::Bold)]
    #[case(Mark::Italic)]
    #[case(Mark::Underline)]
    #[case(Mark::Strikethrough)]
    #[case(Mark::Code)]
    fn test_toggle_mark_twice_is_involution(#[case] mark: Mark) {
        // Given a paragraph where a run carries some other mark
        let other = if mark == Mark::Bold {
            Mark::Italic
        } else {
            Mark::Bold
        };
        let mut editor = Editor::new(Document::from_blocks(vec![Element::new(
            ElementKind::Paragraph,
            vec![
                Node::Text(Text::new("plain ")),
                Node::Text(Text::with_marks("marked", Marks::default().with(other))),
                Node::Text(Text::new(" tail")),
            ],
        )]));
        let original = editor.document().clone();
        editor.apply(Cmd::select(Point::new([0], 3), Point::new([0], 14)));

        // When toggling the same mark twice
        editor.apply(Cmd::ToggleMark(mark));
        editor.apply(Cmd::ToggleMark(mark));

        // Then the marks are back where they started
        assert_eq!(editor.document(), &original);
    }

    #[test]
    fn test_bold_on_then_off() {
        let mut editor = editor("hello world");
        editor.apply(Cmd::select(Point::new([0], 6), Point::new([0], 11)));

        editor.apply(Cmd::ToggleMark(Mark::Bold));
        assert!(editor.is_mark_active(Mark::Bold));
        insta::assert_snapshot!(editor.document().outline(), @r#"
        paragraph
          "hello "
          "world" [bold]
        "#);

        editor.apply(Cmd::ToggleMark(Mark::Bold));
        assert!(!editor.is_mark_active(Mark::Bold));
        assert_eq!(editor.document(), &Document::from_plain_text("hello world"));
    }

    #[test]
    fn test_partially_marked_selection_sets_mark_everywhere() {
        let mut editor = editor("abcdef");
        editor.apply(Cmd::select(Point::new([0], 0), Point::new([0], 3)));
        editor.apply(Cmd::ToggleMark(Mark::Bold));

        editor.apply(Cmd::select(Point::new([0], 0), Point::new([0], 6)));
        assert!(!editor.is_mark_active(Mark::Bold));
        editor.apply(Cmd::ToggleMark(Mark::Bold));

        assert!(editor.is_mark_active(Mark::Bold));
        let runs = &editor.document().blocks()[0].children;
        assert_eq!(runs.len(), 1);
    }

    #[test]
    fn test_mark_across_blocks() {
        let mut editor = editor("one\ntwo");
        editor.apply(Cmd::select(Point::new([1], 1), Point::new([0], 1)));

        editor.apply(Cmd::ToggleMark(Mark::Underline));

        insta::assert_snapshot!(editor.document().outline(), @r#"
        paragraph
          "o"
          "ne" [underline]
        paragraph
          "t" [underline]
          "wo"
        "#);
        invariants::check(editor.document());
    }

    #[test]
    fn test_collapsed_toggle_sets_pending_marks() {
        let mut editor = editor("ab");
        editor.apply(Cmd::caret(Point::new([0], 2)));

        let patch = editor.apply(Cmd::ToggleMark(Mark::Italic));
        assert!(!patch.changed);
        assert!(editor.is_mark_active(Mark::Italic));

        editor.apply(Cmd::insert_text("c"));
        assert_eq!(editor.pending_marks(), None);
        insta::assert_snapshot!(editor.document().outline(), @r#"
        paragraph
          "ab"
          "c" [italic]
        "#);
    }

    #[test]
    fn test_select_clears_pending_marks() {
        let mut editor = editor("ab");
        editor.apply(Cmd::caret(Point::new([0], 1)));
        editor.apply(Cmd::ToggleMark(Mark::Code));

        editor.apply(Cmd::caret(Point::new([0], 2)));

        assert_eq!(editor.pending_marks(), None);
        assert!(!editor.is_mark_active(Mark::Code));
    }

    #[test]
    fn test_toggle_mark_without_selection_is_noop() {
        let mut editor = editor("ab");
        let patch = editor.apply(Cmd::ToggleMark(Mark::Bold));
        assert!(!patch.changed);
        assert_eq!(editor.pending_marks(), None);
    }
}
