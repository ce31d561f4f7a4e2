//! Screen-space tracking of the selection.
//!
//! The engine never measures anything itself. The presentation layer
//! implements [`SelectionGeometry`] over whatever it last rendered, and the
//! tracker turns those rectangles into anchor points for floating UI.

use crate::editing::Editor;
use crate::models::{Point, Selection};

/// Gap between the caret and a menu opened under it
pub const MENU_OFFSET: i32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    /// Smallest rect holding both
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        Rect::new(
            left,
            top,
            self.right().max(other.right()) - left,
            self.bottom().max(other.bottom()) - top,
        )
    }
}

/// Measurements supplied by whatever renders the document
pub trait SelectionGeometry {
    /// Rectangle of a collapsed caret at `point`, if it is on screen
    fn caret_rect(&self, point: &Point) -> Option<Rect>;

    /// Bounding box of an expanded selection, if any part is on screen
    fn selection_bounding_box(&self, selection: &Selection) -> Option<Rect>;

    fn viewport(&self) -> Size;
}

/// Rectangles observed for the current selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Anchors {
    pub caret: Option<Rect>,
    /// Only set for expanded selections
    pub selection: Option<Rect>,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    anchors: Anchors,
    viewport: Size,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-measure after a change. Nothing is measured while there is no
    /// selection; the anchors are simply cleared.
    pub fn observe(&mut self, editor: &Editor, geometry: &dyn SelectionGeometry) -> Anchors {
        self.viewport = geometry.viewport();
        self.anchors = match editor.selection() {
            None => Anchors::default(),
            Some(selection) => Anchors {
                caret: geometry.caret_rect(&selection.focus),
                selection: if selection.is_collapsed() {
                    None
                } else {
                    geometry.selection_bounding_box(selection)
                },
            },
        };
        self.anchors
    }

    pub fn anchors(&self) -> Anchors {
        self.anchors
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Top centre of the selection box, for the format toolbar
    pub fn toolbar_anchor(&self) -> Option<Position> {
        let rect = self.anchors.selection?;
        (rect.width > 0).then(|| Position::new(rect.left + rect.width / 2, rect.top))
    }

    /// Just below the caret, for the slash palette
    pub fn menu_anchor(&self) -> Option<Position> {
        let rect = self.anchors.caret?;
        Some(Position::new(rect.left, rect.bottom() + MENU_OFFSET))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::Cmd;
    use crate::models::Document;
    use std::cell::Cell;

    /// One row per block, one column per byte
    struct GridGeometry {
        calls: Cell<usize>,
    }

    impl GridGeometry {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
            }
        }

        fn rect_at(point: &Point) -> Rect {
            let row = point.path.top().unwrap_or(0) as i32;
            Rect::new(point.offset as i32, row * 2, 1, 2)
        }
    }

    impl SelectionGeometry for GridGeometry {
        fn caret_rect(&self, point: &Point) -> Option<Rect> {
            self.calls.set(self.calls.get() + 1);
            Some(Self::rect_at(point))
        }

        fn selection_bounding_box(&self, selection: &Selection) -> Option<Rect> {
            self.calls.set(self.calls.get() + 1);
            let (start, end) = selection.edges();
            let start = Self::rect_at(start);
            let end = Self::rect_at(end);
            Some(Rect::new(
                start.left,
                start.top,
                end.left - start.left,
                end.bottom() - start.top,
            ))
        }

        fn viewport(&self) -> Size {
            Size::new(80, 24)
        }
    }

    #[test]
    fn test_no_selection_measures_nothing() {
        let editor = Editor::new(Document::from_plain_text("hello"));
        let geometry = GridGeometry::new();
        let mut tracker = SelectionTracker::new();

        let anchors = tracker.observe(&editor, &geometry);

        assert_eq!(anchors, Anchors::default());
        assert_eq!(geometry.calls.get(), 0);
        assert_eq!(tracker.toolbar_anchor(), None);
        assert_eq!(tracker.menu_anchor(), None);
    }

    #[test]
    fn test_collapsed_selection_only_has_caret() {
        let mut editor = Editor::new(Document::from_plain_text("hello"));
        editor.apply(Cmd::caret(Point::new([0], 3)));
        let mut tracker = SelectionTracker::new();

        tracker.observe(&editor, &GridGeometry::new());

        assert_eq!(tracker.menu_anchor(), Some(Position::new(3, 2 + MENU_OFFSET)));
        assert_eq!(tracker.toolbar_anchor(), None);
        assert_eq!(tracker.viewport(), Size::new(80, 24));
    }

    #[test]
    fn test_toolbar_anchor_is_top_centre() {
        let mut editor = Editor::new(Document::from_plain_text("hello world"));
        editor.apply(Cmd::select(Point::new([0], 2), Point::new([0], 10)));
        let mut tracker = SelectionTracker::new();

        tracker.observe(&editor, &GridGeometry::new());

        assert_eq!(tracker.toolbar_anchor(), Some(Position::new(6, 0)));
    }

    #[test]
    fn test_rect_union() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(5, 1, 1, 4);
        assert_eq!(a.union(&b), Rect::new(0, 0, 6, 5));
    }
}
