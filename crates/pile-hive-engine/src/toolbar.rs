//! Floating format toolbar shown over an expanded selection.

use crate::editing::{Cmd, Editor};
use crate::models::{Mark, Selection};
use crate::selection::{Position, Size};

/// Distance kept from the viewport edges and from the selection
pub const MARGIN: i32 = 10;

/// How far the toolbar drops below the anchor when there is no room above
pub const FLIP_OFFSET: i32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarTool {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Link,
}

impl ToolbarTool {
    pub const ALL: [ToolbarTool; 6] = [
        ToolbarTool::Bold,
        ToolbarTool::Italic,
        ToolbarTool::Underline,
        ToolbarTool::Strikethrough,
        ToolbarTool::Code,
        ToolbarTool::Link,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ToolbarTool::Bold => "bold",
            ToolbarTool::Italic => "italic",
            ToolbarTool::Underline => "underline",
            ToolbarTool::Strikethrough => "strikethrough",
            ToolbarTool::Code => "code",
            ToolbarTool::Link => "link",
        }
    }

    /// Title with its shortcut hint
    pub fn title(self) -> &'static str {
        match self {
            ToolbarTool::Bold => "Bold (⌘B)",
            ToolbarTool::Italic => "Italic (⌘I)",
            ToolbarTool::Underline => "Underline (⌘U)",
            ToolbarTool::Strikethrough => "Strikethrough (⌘⇧X)",
            ToolbarTool::Code => "Inline Code (⌘E)",
            ToolbarTool::Link => "Add Link (⌘K)",
        }
    }

    /// The mark this tool toggles; the link tool has none
    pub fn mark(self) -> Option<Mark> {
        match self {
            ToolbarTool::Bold => Some(Mark::Bold),
            ToolbarTool::Italic => Some(Mark::Italic),
            ToolbarTool::Underline => Some(Mark::Underline),
            ToolbarTool::Strikethrough => Some(Mark::Strikethrough),
            ToolbarTool::Code => Some(Mark::Code),
            ToolbarTool::Link => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolbarItem {
    pub tool: ToolbarTool,
    pub title: &'static str,
    pub active: bool,
}

/// Visible iff there is an expanded selection
pub fn is_visible(selection: Option<&Selection>) -> bool {
    selection.is_some_and(|selection| !selection.is_collapsed())
}

/// Tools with their active state for the editor's selection
pub fn items(editor: &Editor) -> Vec<ToolbarItem> {
    ToolbarTool::ALL
        .into_iter()
        .map(|tool| ToolbarItem {
            tool,
            title: tool.title(),
            active: tool.mark().is_some_and(|mark| editor.is_mark_active(mark)),
        })
        .collect()
}

/// The command a tool runs. The link tool asks `prompt` for a URL and does
/// nothing when it is cancelled or empty.
pub fn command_for(tool: ToolbarTool, prompt: impl FnOnce() -> Option<String>) -> Option<Cmd> {
    match tool.mark() {
        Some(mark) => Some(Cmd::ToggleMark(mark)),
        None => prompt()
            .filter(|url| !url.trim().is_empty())
            .map(|url| Cmd::InsertLink {
                url: url.trim().to_string(),
            }),
    }
}

/// Top-left corner for a toolbar of `size` anchored at `anchor`: clamped
/// horizontally into the viewport and flipped below when there is no room
/// above.
pub fn place(anchor: Position, size: Size, viewport: Size) -> Position {
    let Position { mut x, mut y } = anchor;
    if x + size.width > viewport.width {
        x = viewport.width - size.width - MARGIN;
    }
    if x < MARGIN {
        x = MARGIN;
    }
    if y - size.height < MARGIN {
        y += FLIP_OFFSET;
    }
    Position::new(x, y - size.height - MARGIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, Point};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::fits(Position::new(100, 200), Position::new(100, 160))]
    #[case::past_right_edge(Position::new(780, 200), Position::new(690, 160))]
    #[case::past_left_edge(Position::new(2, 200), Position::new(10, 160))]
    #[case::no_room_above(Position::new(100, 20), Position::new(100, 20))]
    fn test_place(#[case] anchor: Position, #[case] expected: Position) {
        let size = Size::new(100, 30);
        let viewport = Size::new(800, 600);
        assert_eq!(place(anchor, size, viewport), expected);
    }

    #[test]
    fn test_visibility_needs_expanded_selection() {
        let collapsed = Selection::collapsed(Point::new([0], 1));
        let expanded = Selection::new(Point::new([0], 1), Point::new([0], 3));

        assert!(!is_visible(None));
        assert!(!is_visible(Some(&collapsed)));
        assert!(is_visible(Some(&expanded)));
    }

    #[test]
    fn test_items_report_active_marks() {
        let mut editor = Editor::new(Document::from_plain_text("hello"));
        editor.apply(Cmd::select(Point::new([0], 0), Point::new([0], 5)));
        editor.apply(Cmd::ToggleMark(Mark::Italic));

        let items = items(&editor);
        let active: Vec<&str> = items
            .iter()
            .filter(|item| item.active)
            .map(|item| item.tool.id())
            .collect();

        assert_eq!(items.len(), 6);
        assert_eq!(active, vec!["italic"]);
        assert_eq!(items[5].title, "Add Link (⌘K)");
    }

    #[test]
    fn test_link_tool_uses_prompt() {
        assert_eq!(command_for(ToolbarTool::Link, || None), None);
        assert_eq!(command_for(ToolbarTool::Link, || Some("  ".to_string())), None);
        assert_eq!(
            command_for(ToolbarTool::Link, || Some("https://a.example".to_string())),
            Some(Cmd::insert_link("https://a.example"))
        );
        assert_eq!(
            command_for(ToolbarTool::Code, || panic!("mark tools never prompt")),
            Some(Cmd::ToggleMark(Mark::Code))
        );
    }
}
