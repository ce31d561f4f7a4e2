//! Rendering of the document and its floating menus, and the screen layout
//! the engine measures selections against.

use chrono::Utc;
use pile_hive_engine::models::{
    Document, Element, ElementKind, Mark, Marks, Node, Path, Point, Selection,
};
use pile_hive_engine::palette::SlashCommand;
use pile_hive_engine::selection::{self as geometry, Position, SelectionGeometry, Size};
use pile_hive_engine::toolbar::{self, ToolbarTool};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::{App, Prompt};

/// Geometry is reported in virtual pixels so the menu offsets keep their
/// proportions on a character grid
pub const CELL_WIDTH: i32 = 8;
pub const CELL_HEIGHT: i32 = 16;

const PALETTE_WIDTH: u16 = 44;
const PALETTE_MAX_ROWS: u16 = 10;

#[derive(Debug, Clone)]
struct BlockRows {
    path: Path,
    /// First row, counted from the top of the document
    row: u16,
    indent: u16,
    text: String,
    line_starts: Vec<usize>,
    checkbox: bool,
}

/// Where every text block, menu entry and toolbar button landed on screen
#[derive(Debug, Clone, Default)]
pub struct ScreenLayout {
    frame: Rect,
    area: Rect,
    scroll: u16,
    blocks: Vec<BlockRows>,
    palette_hits: Vec<(Rect, &'static SlashCommand)>,
    toolbar_hits: Vec<(Rect, ToolbarTool)>,
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
}

impl ScreenLayout {
    /// Lay out `document` inside `area`, scrolled so that `focus` is visible
    pub fn build(
        document: &Document,
        frame: Rect,
        area: Rect,
        scroll: u16,
        focus: Option<&Point>,
    ) -> (Vec<Line<'static>>, ScreenLayout) {
        let mut lines = Vec::new();
        let mut blocks = Vec::new();
        for (index, block) in document.blocks().iter().enumerate() {
            render_block(block, Path::new(vec![index]), None, 0, &mut lines, &mut blocks);
        }

        let mut layout = ScreenLayout {
            frame,
            area,
            scroll,
            blocks,
            palette_hits: Vec::new(),
            toolbar_hits: Vec::new(),
        };
        if let Some(row) = focus.and_then(|point| layout.document_row(point)) {
            if row < layout.scroll {
                layout.scroll = row;
            } else if area.height > 0 && row >= layout.scroll + area.height {
                layout.scroll = row + 1 - area.height;
            }
        }
        (lines, layout)
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    fn block(&self, path: &Path) -> Option<&BlockRows> {
        self.blocks.iter().find(|block| &block.path == path)
    }

    fn line_of(block: &BlockRows, offset: usize) -> usize {
        block
            .line_starts
            .iter()
            .rposition(|start| *start <= offset)
            .unwrap_or(0)
    }

    fn document_row(&self, point: &Point) -> Option<u16> {
        let block = self.block(&point.path)?;
        Some(block.row + Self::line_of(block, point.offset) as u16)
    }

    /// Screen cell of the caret at `point`, if it is on screen
    pub fn caret_cell(&self, point: &Point) -> Option<(u16, u16)> {
        let block = self.block(&point.path)?;
        let offset = point.offset.min(block.text.len());
        let line = Self::line_of(block, offset);
        let start = block.line_starts[line];
        let column = block
            .text
            .get(start..offset)
            .map(|text| text.chars().count())
            .unwrap_or(0) as u16;

        let row = (block.row + line as u16).checked_sub(self.scroll)?;
        if row >= self.area.height {
            return None;
        }
        Some((
            self.area.x + block.indent + column,
            self.area.y + row,
        ))
    }

    /// The document point under a screen cell
    pub fn point_at(&self, column: u16, row: u16) -> Option<Point> {
        if !contains(self.area, column, row) {
            return None;
        }
        let row = row - self.area.y + self.scroll;
        let block = self.blocks.iter().rev().find(|block| block.row <= row)?;
        let line = usize::from(row - block.row).min(block.line_starts.len() - 1);
        let start = block.line_starts[line];
        let end = block
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(block.text.len());

        let column = usize::from(column.saturating_sub(self.area.x + block.indent));
        let offset = block.text[start..end]
            .char_indices()
            .nth(column)
            .map(|(index, _)| start + index)
            .unwrap_or(end);
        Some(Point::new(block.path.clone(), offset))
    }

    /// The to-do item whose checkbox is under a screen cell
    pub fn checkbox_at(&self, column: u16, row: u16) -> Option<Path> {
        if !contains(self.area, column, row) {
            return None;
        }
        let row = row - self.area.y + self.scroll;
        self.blocks
            .iter()
            .find(|block| block.checkbox && block.row == row)
            .filter(|_| column >= self.area.x && column < self.area.x + 3)
            .map(|block| block.path.clone())
    }

    pub fn palette_command_at(&self, column: u16, row: u16) -> Option<&'static SlashCommand> {
        self.palette_hits
            .iter()
            .find(|(rect, _)| contains(*rect, column, row))
            .map(|(_, command)| *command)
    }

    pub fn toolbar_tool_at(&self, column: u16, row: u16) -> Option<ToolbarTool> {
        self.toolbar_hits
            .iter()
            .find(|(rect, _)| contains(*rect, column, row))
            .map(|(_, tool)| *tool)
    }
}

impl SelectionGeometry for ScreenLayout {
    fn caret_rect(&self, point: &Point) -> Option<geometry::Rect> {
        let (column, row) = self.caret_cell(point)?;
        Some(geometry::Rect::new(
            i32::from(column) * CELL_WIDTH,
            i32::from(row) * CELL_HEIGHT,
            1,
            CELL_HEIGHT,
        ))
    }

    fn selection_bounding_box(&self, selection: &Selection) -> Option<geometry::Rect> {
        let anchor = self.caret_rect(&selection.anchor)?;
        let focus = self.caret_rect(&selection.focus)?;
        let bounds = anchor.union(&focus);
        if anchor.top == focus.top {
            return Some(bounds);
        }
        // multi-line selections cover the full editor width
        Some(geometry::Rect::new(
            i32::from(self.area.x) * CELL_WIDTH,
            bounds.top,
            i32::from(self.area.width) * CELL_WIDTH,
            bounds.height,
        ))
    }

    fn viewport(&self) -> Size {
        Size::new(
            i32::from(self.frame.width) * CELL_WIDTH,
            i32::from(self.frame.height) * CELL_HEIGHT,
        )
    }
}

fn to_cell(position: Position) -> (u16, u16) {
    (
        (position.x.max(0) / CELL_WIDTH) as u16,
        (position.y.max(0) / CELL_HEIGHT) as u16,
    )
}

fn prefix(kind: &ElementKind, container: Option<&ElementKind>, number: usize) -> String {
    match kind {
        ElementKind::Heading { level } => format!("{} ", "#".repeat(usize::from(level.get()))),
        ElementKind::Quote => "│ ".to_string(),
        ElementKind::Code => "┆ ".to_string(),
        ElementKind::ListItem => match container {
            Some(ElementKind::NumberedList) => format!("{number}. "),
            _ => "• ".to_string(),
        },
        ElementKind::TodoItem { checked: true } => "[x] ".to_string(),
        ElementKind::TodoItem { checked: false } => "[ ] ".to_string(),
        _ => String::new(),
    }
}

fn block_style(kind: &ElementKind) -> Style {
    match kind {
        ElementKind::Heading { .. } => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        ElementKind::Quote => Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC),
        ElementKind::Code => Style::default().fg(Color::Green),
        ElementKind::TodoItem { checked: true } => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT),
        _ => Style::default(),
    }
}

fn mark_style(base: Style, marks: &Marks) -> Style {
    marks.iter().fold(base, |style, mark| match mark {
        Mark::Bold => style.add_modifier(Modifier::BOLD),
        Mark::Italic => style.add_modifier(Modifier::ITALIC),
        Mark::Underline => style.add_modifier(Modifier::UNDERLINED),
        Mark::Strikethrough => style.add_modifier(Modifier::CROSSED_OUT),
        Mark::Code => style.fg(Color::Yellow).bg(Color::DarkGray),
    })
}

fn push_text(text: &str, style: Style, lines: &mut Vec<Vec<Span<'static>>>) {
    for (i, piece) in text.split('\n').enumerate() {
        if i > 0 {
            lines.push(Vec::new());
        }
        if !piece.is_empty()
            && let Some(line) = lines.last_mut()
        {
            line.push(Span::styled(piece.to_string(), style));
        }
    }
}

/// Split inline children into styled screen lines at every newline
fn inline_lines(children: &[Node], base: Style) -> Vec<Vec<Span<'static>>> {
    let mut lines: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    for child in children {
        match child {
            Node::Text(text) => push_text(&text.text, mark_style(base, &text.marks), &mut lines),
            Node::Element(link) => {
                let link_style = base.fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
                for node in &link.children {
                    if let Node::Text(text) = node {
                        push_text(&text.text, mark_style(link_style, &text.marks), &mut lines);
                    }
                }
            }
        }
    }
    lines
}

fn render_block(
    element: &Element,
    path: Path,
    container: Option<&ElementKind>,
    number: usize,
    lines: &mut Vec<Line<'static>>,
    blocks: &mut Vec<BlockRows>,
) {
    if element.kind.is_container() {
        for (index, child) in element.children.iter().enumerate() {
            if let Node::Element(item) = child {
                render_block(
                    item,
                    path.child(index),
                    Some(&element.kind),
                    index + 1,
                    lines,
                    blocks,
                );
            }
        }
        return;
    }

    let row = lines.len() as u16;
    match &element.kind {
        ElementKind::Divider => {
            lines.push(Line::styled("─".repeat(40), Style::default().fg(Color::DarkGray)));
            blocks.push(BlockRows {
                path,
                row,
                indent: 0,
                text: String::new(),
                line_starts: vec![0],
                checkbox: false,
            });
        }
        ElementKind::Image { url, alt } => {
            let label = alt.as_deref().unwrap_or(url);
            lines.push(Line::styled(
                format!("[image: {label}]"),
                Style::default().fg(Color::Magenta),
            ));
            blocks.push(BlockRows {
                path,
                row,
                indent: 0,
                text: String::new(),
                line_starts: vec![0],
                checkbox: false,
            });
        }
        kind => {
            let prefix = prefix(kind, container, number);
            let indent = prefix.chars().count() as u16;
            let base = block_style(kind);
            let text = element.string();
            let line_starts = std::iter::once(0)
                .chain(text.match_indices('\n').map(|(index, _)| index + 1))
                .collect();

            for (i, spans) in inline_lines(&element.children, base).into_iter().enumerate() {
                let lead = if i == 0 {
                    prefix.clone()
                } else {
                    " ".repeat(usize::from(indent))
                };
                let mut line = vec![Span::styled(
                    lead,
                    base.remove_modifier(Modifier::CROSSED_OUT),
                )];
                line.extend(spans);
                lines.push(Line::from(line));
            }

            blocks.push(BlockRows {
                path,
                row,
                indent,
                text,
                line_starts,
                checkbox: matches!(kind, ElementKind::TodoItem { .. }),
            });
        }
    }
}

pub fn draw(frame: &mut Frame, app: &App) -> ScreenLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let store = app.store();
    let editor_block = Block::default().borders(Borders::ALL);
    let editor_area = editor_block.inner(chunks[1]);

    let (lines, mut layout) = ScreenLayout::build(
        store.document(),
        frame.area(),
        editor_area,
        app.scroll(),
        store.editor().selection().map(|selection| &selection.focus),
    );

    // Header
    let dirty = if store.is_dirty() { " •" } else { "" };
    let header = Line::from(vec![
        Span::styled(
            format!("{}{dirty}", store.title()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            store.save_status(Utc::now()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), chunks[0]);

    // Document
    let body = if lines.len() == 1 && store.document().plain_text().is_empty() {
        vec![Line::styled(
            "Type '/' for commands...",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        lines
    };
    frame.render_widget(
        Paragraph::new(body)
            .block(editor_block)
            .scroll((layout.scroll(), 0)),
        chunks[1],
    );

    // Footer: prompt, status message or help
    let footer = match app.prompt() {
        Some((Prompt::Link, input)) => format!("Link URL: {input}"),
        Some((Prompt::Title, input)) => format!("Title: {input}"),
        None => match app.status() {
            Some(status) => status.to_string(),
            None => "^Q quit | ^S save | ^N new | F2 title | ^T toggle to-do | ^K link | / commands"
                .to_string(),
        },
    };
    frame.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );

    if store.toolbar().open
        && let Some(anchor) = store.toolbar().position
    {
        draw_toolbar(frame, &mut layout, store.editor(), anchor);
    }

    let slash_menu = store.slash_menu();
    drop(store);

    if slash_menu.open
        && let Some(position) = slash_menu.position
    {
        draw_palette(frame, &mut layout, app, position);
    }

    if app.prompt().is_none()
        && let Some(selection) = app.store().editor().selection()
        && let Some((column, row)) = layout.caret_cell(&selection.focus)
    {
        frame.set_cursor_position((column, row));
    }

    layout
}

fn draw_toolbar(
    frame: &mut Frame,
    layout: &mut ScreenLayout,
    editor: &pile_hive_engine::Editor,
    anchor: Position,
) {
    let items = toolbar::items(editor);
    let labels: Vec<(String, ToolbarTool, bool)> = items
        .iter()
        .map(|item| {
            let label = match item.tool {
                ToolbarTool::Bold => " B ",
                ToolbarTool::Italic => " I ",
                ToolbarTool::Underline => " U ",
                ToolbarTool::Strikethrough => " S ",
                ToolbarTool::Code => " <> ",
                ToolbarTool::Link => " Link ",
            };
            (label.to_string(), item.tool, item.active)
        })
        .collect();

    let width = labels.iter().map(|(label, ..)| label.chars().count() as u16).sum::<u16>() + 2;
    let height = 3;
    let size = Size::new(i32::from(width) * CELL_WIDTH, height * CELL_HEIGHT);
    let (x, y) = to_cell(toolbar::place(anchor, size, layout.viewport()));
    let area = Rect::new(x, y, width, height as u16).intersection(frame.area());
    if area.is_empty() {
        return;
    }

    let mut spans = Vec::new();
    let mut column = area.x + 1;
    for (label, tool, active) in labels {
        let len = label.chars().count() as u16;
        layout
            .toolbar_hits
            .push((Rect::new(column, area.y + 1, len, 1), tool));
        column += len;
        let style = if active {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        spans.push(Span::styled(label, style));
    }

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_palette(frame: &mut Frame, layout: &mut ScreenLayout, app: &App, position: Position) {
    let commands = app.session().palette().visible();
    let rows = (commands.len() as u16).clamp(1, PALETTE_MAX_ROWS);
    let (x, y) = to_cell(position);
    let bounds = frame.area();
    let x = x.min(bounds.width.saturating_sub(PALETTE_WIDTH));
    let area = Rect::new(x, y, PALETTE_WIDTH, rows + 2).intersection(bounds);
    if area.is_empty() {
        return;
    }

    let highlighted = app.session().palette().highlighted();
    let items: Vec<ListItem> = if commands.is_empty() {
        vec![ListItem::new("No matching commands")]
    } else {
        commands
            .iter()
            .take(usize::from(PALETTE_MAX_ROWS))
            .enumerate()
            .map(|(i, command)| {
                layout
                    .palette_hits
                    .push((Rect::new(area.x, area.y + 1 + i as u16, area.width, 1), *command));
                let style = if i == highlighted {
                    Style::default().bg(Color::Yellow).fg(Color::Black)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:>3} {:<14}", command.glyph, command.title), style),
                    Span::styled(
                        format!(" {}", command.description),
                        style.fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect()
    };

    frame.render_widget(Clear, area);
    frame.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title("Blocks")),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layout_for(document: &Document) -> ScreenLayout {
        let frame = Rect::new(0, 0, 80, 24);
        let area = Rect::new(1, 2, 78, 20);
        ScreenLayout::build(document, frame, area, 0, None).1
    }

    fn list(kind: ElementKind, items: &[&str]) -> Element {
        let item_kind = kind.item_kind().unwrap_or(ElementKind::ListItem);
        Element::new(
            kind,
            items
                .iter()
                .map(|text| Node::Element(Element::with_text(item_kind.clone(), *text)))
                .collect(),
        )
    }

    #[test]
    fn test_caret_cell_accounts_for_prefix() {
        let doc = Document::from_blocks(vec![
            Element::paragraph("plain"),
            list(ElementKind::NumberedList, &["one", "two"]),
        ]);
        let layout = layout_for(&doc);

        assert_eq!(layout.caret_cell(&Point::new([0], 2)), Some((3, 2)));
        // "2. " prefix on the second row of the list
        assert_eq!(layout.caret_cell(&Point::new([1, 1], 1)), Some((5, 4)));
    }

    #[test]
    fn test_point_at_inverts_caret_cell() {
        let doc = Document::from_blocks(vec![
            Element::paragraph("héllo"),
            list(ElementKind::TodoList, &["task"]),
        ]);
        let layout = layout_for(&doc);

        assert_eq!(layout.point_at(3, 2), Some(Point::new([0], 3)));
        assert_eq!(layout.point_at(60, 2), Some(Point::new([0], 6)));
        assert_eq!(layout.point_at(6, 3), Some(Point::new([1, 0], 1)));
        assert_eq!(layout.point_at(0, 0), None);
    }

    #[test]
    fn test_code_block_lines() {
        let doc = Document::from_blocks(vec![Element::with_text(ElementKind::Code, "ab\ncd")]);
        let (lines, layout) =
            ScreenLayout::build(&doc, Rect::new(0, 0, 80, 24), Rect::new(0, 0, 80, 20), 0, None);

        assert_eq!(lines.len(), 2);
        assert_eq!(layout.caret_cell(&Point::new([0], 4)), Some((3, 1)));
        assert_eq!(layout.point_at(2, 1), Some(Point::new([0], 3)));
    }

    #[test]
    fn test_checkbox_hit() {
        let doc = Document::from_blocks(vec![list(ElementKind::TodoList, &["a", "b"])]);
        let layout = layout_for(&doc);

        assert_eq!(layout.checkbox_at(2, 3), Some(Path::new(vec![0, 1])));
        assert_eq!(layout.checkbox_at(6, 3), None);
    }

    #[test]
    fn test_scroll_follows_focus() {
        let doc = Document::from_plain_text(&"line\n".repeat(30));
        let focus = Point::new([29], 0);
        let (_, layout) = ScreenLayout::build(
            &doc,
            Rect::new(0, 0, 80, 12),
            Rect::new(0, 0, 80, 10),
            0,
            Some(&focus),
        );

        assert_eq!(layout.scroll(), 20);
        assert_eq!(layout.caret_cell(&focus), Some((0, 9)));
    }

    #[test]
    fn test_geometry_in_virtual_pixels() {
        let doc = Document::from_blocks(vec![Element::paragraph("abcdef")]);
        let layout = layout_for(&doc);

        let selection = Selection::new(Point::new([0], 1), Point::new([0], 4));
        assert_eq!(
            layout.selection_bounding_box(&selection),
            Some(geometry::Rect::new(
                2 * CELL_WIDTH,
                2 * CELL_HEIGHT,
                3 * CELL_WIDTH + 1,
                CELL_HEIGHT
            ))
        );
        assert_eq!(layout.viewport(), Size::new(80 * CELL_WIDTH, 24 * CELL_HEIGHT));
    }
}
