/*!
 * # Editing Core Module
 *
 * The command layer over the document tree.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: the Document tree
 * - An [`Editor`] owns one [`Document`], the current [`Selection`], pending
 *   marks for the next typed text, and a version counter
 * - Nothing outside this module mutates the tree
 *
 * ### 2. Command-Based Editing
 * - All edits are represented as **Commands** (`Cmd` enum)
 * - `Editor::apply` runs a command, restores the document invariants and
 *   returns a [`Patch`] describing the outcome
 * - Commands that need a selection are silent no-ops without one
 *
 * ### 3. Selections survive restructuring
 * - While a command runs, the selection is held as [`Cursor`]s: the ordinal
 *   of a text block plus a byte offset
 * - Wrapping blocks into lists, lifting them out, or splitting containers
 *   never reorders text blocks, so cursors stay valid and are turned back into
 *   paths once the command is done
 *
 * ## Module Structure
 *
 * - **`commands`**: `Cmd`, `BlockFormat` and `Motion`
 * - **`marks`**: mark toggling and active-mark queries
 * - **`blocks`**: block formats, list wrapping and structural inserts
 * - **`text`**: typing, breaks, links and deletion
 * - **`motion`**: caret movement
 * - **`patch`**: command results
 *
 * ## Usage Pattern
 *
 * ```rust
 * use pile_hive_engine::editing::{BlockFormat, Cmd, Editor};
 * use pile_hive_engine::models::{Document, Point};
 *
 * let mut editor = Editor::new(Document::new());
 * editor.apply(Cmd::caret(Point::new([0], 0)));
 * editor.apply(Cmd::insert_text("Shopping"));
 * let patch = editor.apply(Cmd::ToggleBlock(BlockFormat::TodoList));
 *
 * assert!(patch.changed);
 * assert_eq!(editor.document().plain_text(), "Shopping");
 * ```
 */

mod blocks;
pub mod commands;
mod marks;
mod motion;
pub mod patch;
mod text;

pub use commands::{BlockFormat, Cmd, Motion};
pub use patch::Patch;

use crate::models::{Cursor, Document, Element, ElementKind, Marks, Selection};

/// A selection resolved into text-block cursors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CursorRange {
    pub anchor: Cursor,
    pub focus: Cursor,
}

impl CursorRange {
    pub fn new(anchor: Cursor, focus: Cursor) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(cursor: Cursor) -> Self {
        Self::new(cursor, cursor)
    }

    pub fn resolve(doc: &Document, selection: &Selection) -> Self {
        Self::new(doc.cursor(&selection.anchor), doc.cursor(&selection.focus))
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn start(&self) -> Cursor {
        self.anchor.min(self.focus)
    }

    pub fn end(&self) -> Cursor {
        self.anchor.max(self.focus)
    }

    /// Text-block ordinals the range touches. A range ending at offset 0 of
    /// a later block does not touch that block.
    pub fn blocks(&self) -> std::ops::RangeInclusive<usize> {
        let (start, end) = (self.start(), self.end());
        let last = if end.block > start.block && end.offset == 0 {
            end.block - 1
        } else {
            end.block
        };
        start.block..=last
    }

    pub fn to_selection(self, doc: &Document) -> Selection {
        Selection::new(doc.point(self.anchor), doc.point(self.focus))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Editor {
    document: Document,
    selection: Option<Selection>,
    pending_marks: Option<Marks>,
    version: u64,
}

impl Editor {
    /// Wrap a document. The editor starts without a selection.
    pub fn new(mut document: Document) -> Self {
        document.normalize();
        Self {
            document,
            selection: None,
            pending_marks: None,
            version: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Marks toggled at a collapsed caret, waiting for the next typed text
    pub fn pending_marks(&self) -> Option<Marks> {
        self.pending_marks
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Swap in a whole document, placing the caret at its start
    pub fn replace_document(&mut self, mut document: Document) {
        document.normalize();
        self.selection = Some(Selection::collapsed(document.start()));
        self.document = document;
        self.pending_marks = None;
        self.version += 1;
    }

    /// The text block holding the focus
    pub fn focus_block(&self) -> Option<&Element> {
        let focus = self.cursor_range()?.focus;
        self.document.text_block(focus.block)
    }

    pub(crate) fn cursor_range(&self) -> Option<CursorRange> {
        self.selection
            .as_ref()
            .map(|selection| CursorRange::resolve(&self.document, selection))
    }

    /// Apply a command and return the resulting patch
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let before = self.document.clone();
        let mut range = self.cursor_range();
        log::trace!("apply {cmd:?}");

        match cmd {
            Cmd::InsertText { text } => self.insert_text(&mut range, &text),
            Cmd::InsertBreak => self.insert_break(&mut range),
            Cmd::DeleteBackward => self.delete_backward(&mut range),
            Cmd::DeleteForward => self.delete_forward(&mut range),
            Cmd::DeleteRange { from, to } => {
                let from = self.document.cursor(&from);
                let to = self.document.cursor(&to);
                let caret = self.delete_between(from.min(to), from.max(to));
                range = Some(CursorRange::collapsed(caret));
            }
            Cmd::ToggleMark(mark) => self.toggle_mark(range.as_ref(), mark),
            Cmd::ToggleBlock(format) => self.toggle_block(range.as_ref(), format, false),
            Cmd::SetBlock(format) => self.toggle_block(range.as_ref(), format, true),
            Cmd::InsertDivider => {
                self.insert_block(&mut range, Element::empty(ElementKind::Divider))
            }
            Cmd::InsertImage { url, alt } => self.insert_block(
                &mut range,
                Element::empty(ElementKind::Image { url, alt }),
            ),
            Cmd::InsertLink { url } => self.insert_link(&mut range, &url),
            Cmd::InsertHeading { level } => self.insert_block(
                &mut range,
                Element::empty(ElementKind::Heading { level }),
            ),
            Cmd::InsertQuote => {
                self.insert_block(&mut range, Element::empty(ElementKind::Quote))
            }
            Cmd::InsertCodeBlock => {
                self.insert_block(&mut range, Element::empty(ElementKind::Code))
            }
            Cmd::ToggleTodo { path } => self.toggle_todo(&path),
            Cmd::Select(selection) => {
                range = selection.map(|s| CursorRange::resolve(&self.document, &s));
                self.pending_marks = None;
            }
            Cmd::Move { motion, extend } => {
                self.move_caret(&mut range, motion, extend);
                self.pending_marks = None;
            }
        }

        self.document.normalize();
        self.selection = range.map(|range| range.to_selection(&self.document));

        let changed = self.document != before;
        if changed {
            self.version += 1;
        }

        Patch {
            changed,
            new_selection: self.selection.clone(),
            version: self.version,
        }
    }
}
