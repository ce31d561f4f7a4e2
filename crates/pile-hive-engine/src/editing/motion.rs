use super::{CursorRange, Editor, Motion};
use crate::models::Cursor;
use crate::models::document::{next_char_boundary, prev_char_boundary};

impl Editor {
    /// Move the focus. Without `extend` the selection collapses onto the new
    /// focus; a plain left/right on an expanded selection collapses to its
    /// start or end instead of moving.
    pub(super) fn move_caret(
        &mut self,
        range: &mut Option<CursorRange>,
        motion: Motion,
        extend: bool,
    ) {
        let Some(current) = *range else {
            return;
        };

        if !extend && !current.is_collapsed() {
            match motion {
                Motion::Left => {
                    *range = Some(CursorRange::collapsed(current.start()));
                    return;
                }
                Motion::Right => {
                    *range = Some(CursorRange::collapsed(current.end()));
                    return;
                }
                _ => {}
            }
        }

        let focus = self.step(current.focus, motion);
        *range = Some(if extend {
            CursorRange::new(current.anchor, focus)
        } else {
            CursorRange::collapsed(focus)
        });
    }

    fn step(&self, cursor: Cursor, motion: Motion) -> Cursor {
        let doc = &self.document;
        let last = doc.text_block_count().saturating_sub(1);
        let text = doc
            .text_block(cursor.block)
            .map(|element| element.string())
            .unwrap_or_default();

        match motion {
            Motion::Left if cursor.offset > 0 => {
                Cursor::new(cursor.block, prev_char_boundary(&text, cursor.offset))
            }
            Motion::Left if cursor.block > 0 => {
                Cursor::new(cursor.block - 1, doc.block_len(cursor.block - 1))
            }
            Motion::Right if cursor.offset < text.len() => {
                Cursor::new(cursor.block, next_char_boundary(&text, cursor.offset))
            }
            Motion::Right if cursor.block < last => Cursor::new(cursor.block + 1, 0),
            Motion::Left | Motion::Right => cursor,
            Motion::Up if cursor.block > 0 => {
                doc.clamp(Cursor::new(cursor.block - 1, cursor.offset))
            }
            Motion::Up => Cursor::new(0, 0),
            Motion::Down if cursor.block < last => {
                doc.clamp(Cursor::new(cursor.block + 1, cursor.offset))
            }
            Motion::Down => Cursor::new(last, text.len()),
            Motion::LineStart => Cursor::new(cursor.block, 0),
            Motion::LineEnd => Cursor::new(cursor.block, text.len()),
            Motion::DocumentStart => Cursor::new(0, 0),
            Motion::DocumentEnd => Cursor::new(last, doc.block_len(last)),
        }
    }
}
