use crate::models::{Align, ElementKind, HeadingLevel, Mark, Path, Point, Selection};

/// Block-level formats a selection can be toggled into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFormat {
    Paragraph,
    Heading(HeadingLevel),
    Quote,
    Code,
    BulletedList,
    NumberedList,
    TodoList,
    Align(Align),
}

impl BlockFormat {
    /// The container kind for list formats
    pub fn container(self) -> Option<ElementKind> {
        match self {
            BlockFormat::BulletedList => Some(ElementKind::BulletedList),
            BlockFormat::NumberedList => Some(ElementKind::NumberedList),
            BlockFormat::TodoList => Some(ElementKind::TodoList),
            BlockFormat::Paragraph
            | BlockFormat::Heading(_)
            | BlockFormat::Quote
            | BlockFormat::Code
            | BlockFormat::Align(_) => None,
        }
    }

    /// The kind a touched block takes when the format is turned on.
    /// Alignment is a property, not a kind.
    pub fn block_kind(self) -> Option<ElementKind> {
        match self {
            BlockFormat::Paragraph => Some(ElementKind::Paragraph),
            BlockFormat::Heading(level) => Some(ElementKind::Heading { level }),
            BlockFormat::Quote => Some(ElementKind::Quote),
            BlockFormat::Code => Some(ElementKind::Code),
            BlockFormat::BulletedList | BlockFormat::NumberedList => Some(ElementKind::ListItem),
            BlockFormat::TodoList => Some(ElementKind::TodoItem { checked: false }),
            BlockFormat::Align(_) => None,
        }
    }
}

/// Caret movements for front ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    DocumentStart,
    DocumentEnd,
}

/// Every mutation of an [`Editor`](super::Editor) is one of these
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Replace the selection with text carrying the pending or caret marks
    InsertText { text: String },
    /// Split the current block, or insert a newline inside code
    InsertBreak,
    DeleteBackward,
    DeleteForward,
    /// Delete between two points regardless of the current selection
    DeleteRange { from: Point, to: Point },
    ToggleMark(Mark),
    ToggleBlock(BlockFormat),
    /// Like `ToggleBlock` but never turns the format off
    SetBlock(BlockFormat),
    InsertDivider,
    InsertImage { url: String, alt: Option<String> },
    /// Link the selected text, or insert the URL as a link at the caret
    InsertLink { url: String },
    InsertHeading { level: HeadingLevel },
    InsertQuote,
    InsertCodeBlock,
    ToggleTodo { path: Path },
    Select(Option<Selection>),
    Move { motion: Motion, extend: bool },
}

impl Cmd {
    pub fn insert_text(text: impl Into<String>) -> Self {
        Cmd::InsertText { text: text.into() }
    }

    pub fn insert_link(url: impl Into<String>) -> Self {
        Cmd::InsertLink { url: url.into() }
    }

    pub fn select(anchor: Point, focus: Point) -> Self {
        Cmd::Select(Some(Selection::new(anchor, focus)))
    }

    pub fn caret(point: Point) -> Self {
        Cmd::Select(Some(Selection::collapsed(point)))
    }

    pub fn move_caret(motion: Motion) -> Self {
        Cmd::Move {
            motion,
            extend: false,
        }
    }

    pub fn extend(motion: Motion) -> Self {
        Cmd::Move {
            motion,
            extend: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BlockFormat::BulletedList, Some(ElementKind::BulletedList), Some(ElementKind::ListItem))]
    #[case(BlockFormat::NumberedList, Some(ElementKind::NumberedList), Some(ElementKind::ListItem))]
    #[case(
        BlockFormat::TodoList,
        Some(ElementKind::TodoList),
        Some(ElementKind::TodoItem { checked: false })
    )]
    #[case(BlockFormat::Quote, None, Some(ElementKind::Quote))]
    #[case(BlockFormat::Align(Align::Right), None, None)]
    fn test_format_kinds(
        #[case] format: BlockFormat,
        #[case] container: Option<ElementKind>,
        #[case] kind: Option<ElementKind>,
    ) {
        assert_eq!(format.container(), container);
        assert_eq!(format.block_kind(), kind);
    }
}
