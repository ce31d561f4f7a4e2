//! Slash command palette.
//!
//! Typing `/` at a word boundary opens the palette anchored at the caret.
//! While it is open, every document change re-reads the text between the
//! anchor and the caret: as long as it still starts with `/`, the rest is the
//! search; otherwise the palette closes. The palette never edits the document
//! itself. Running a command or dismissing the palette hands back the
//! [`Cmd`]s the caller should apply.

use crate::editing::{BlockFormat, Cmd, Editor};
use crate::input::{Key, KeyEvent};
use crate::models::{HeadingLevel, Point};

pub const TRIGGER: char = '/';

/// What a palette entry does once chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteAction {
    /// Turn the current block into the format
    SetBlock(BlockFormat),
    ToggleBlock(BlockFormat),
    InsertDivider,
}

impl PaletteAction {
    pub fn to_cmd(self) -> Cmd {
        match self {
            PaletteAction::SetBlock(format) => Cmd::SetBlock(format),
            PaletteAction::ToggleBlock(format) => Cmd::ToggleBlock(format),
            PaletteAction::InsertDivider => Cmd::InsertDivider,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashCommand {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub keywords: &'static [&'static str],
    /// Short marker shown next to the title
    pub glyph: &'static str,
    pub action: PaletteAction,
}

impl SlashCommand {
    /// Case-insensitive substring match on title, description or a keyword
    pub fn matches(&self, search: &str) -> bool {
        if search.is_empty() {
            return true;
        }
        let search = search.to_lowercase();
        self.title.to_lowercase().contains(&search)
            || self.description.to_lowercase().contains(&search)
            || self.keywords.iter().any(|keyword| keyword.contains(&search))
    }
}

static COMMANDS: [SlashCommand; 10] = [
    SlashCommand {
        id: "paragraph",
        title: "Text",
        description: "Start writing with plain text",
        keywords: &["text", "paragraph", "plain"],
        glyph: "T",
        action: PaletteAction::SetBlock(BlockFormat::Paragraph),
    },
    SlashCommand {
        id: "heading-1",
        title: "Heading 1",
        description: "Big section heading",
        keywords: &["heading", "h1", "title", "big"],
        glyph: "H1",
        action: PaletteAction::SetBlock(BlockFormat::Heading(HeadingLevel::H1)),
    },
    SlashCommand {
        id: "heading-2",
        title: "Heading 2",
        description: "Medium section heading",
        keywords: &["heading", "h2", "subtitle"],
        glyph: "H2",
        action: PaletteAction::SetBlock(BlockFormat::Heading(HeadingLevel::H2)),
    },
    SlashCommand {
        id: "heading-3",
        title: "Heading 3",
        description: "Small section heading",
        keywords: &["heading", "h3", "small"],
        glyph: "H3",
        action: PaletteAction::SetBlock(BlockFormat::Heading(HeadingLevel::H3)),
    },
    SlashCommand {
        id: "quote",
        title: "Quote",
        description: "Capture a quote",
        keywords: &["quote", "blockquote", "cite"],
        glyph: "\"",
        action: PaletteAction::SetBlock(BlockFormat::Quote),
    },
    SlashCommand {
        id: "code",
        title: "Code",
        description: "Capture a code snippet",
        keywords: &["code", "snippet", "programming"],
        glyph: "<>",
        action: PaletteAction::SetBlock(BlockFormat::Code),
    },
    SlashCommand {
        id: "bulleted-list",
        title: "Bulleted List",
        description: "Create a simple bulleted list",
        keywords: &["list", "bullet", "unordered"],
        glyph: "•",
        action: PaletteAction::ToggleBlock(BlockFormat::BulletedList),
    },
    SlashCommand {
        id: "numbered-list",
        title: "Numbered List",
        description: "Create a list with numbering",
        keywords: &["list", "numbered", "ordered"],
        glyph: "1.",
        action: PaletteAction::ToggleBlock(BlockFormat::NumberedList),
    },
    SlashCommand {
        id: "todo-list",
        title: "To-do List",
        description: "Track tasks with a to-do list",
        keywords: &["todo", "task", "checkbox", "check"],
        glyph: "[]",
        action: PaletteAction::ToggleBlock(BlockFormat::TodoList),
    },
    SlashCommand {
        id: "divider",
        title: "Divider",
        description: "Visually divide blocks",
        keywords: &["divider", "separator", "line", "hr"],
        glyph: "--",
        action: PaletteAction::InsertDivider,
    },
];

/// The fixed catalog, in display order
pub fn commands() -> &'static [SlashCommand] {
    &COMMANDS
}

pub fn filter(search: &str) -> Vec<&'static SlashCommand> {
    COMMANDS
        .iter()
        .filter(|command| command.matches(search))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PaletteState {
    #[default]
    Closed,
    Open {
        /// Caret position where the trigger was typed
        anchor: Point,
        search: String,
    },
}

/// Outcome of routing a key through the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKey {
    /// The key belongs to the editor
    NotHandled,
    Handled,
    /// Run this command
    Invoke(&'static SlashCommand),
}

#[derive(Debug, Clone, Default)]
pub struct Palette {
    state: PaletteState,
    highlighted: usize,
    filtered: Vec<&'static str>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PaletteState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PaletteState::Open { .. })
    }

    pub fn search(&self) -> Option<&str> {
        match &self.state {
            PaletteState::Open { search, .. } => Some(search),
            PaletteState::Closed => None,
        }
    }

    pub fn anchor(&self) -> Option<&Point> {
        match &self.state {
            PaletteState::Open { anchor, .. } => Some(anchor),
            PaletteState::Closed => None,
        }
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    /// Commands matching the current search; empty when closed
    pub fn visible(&self) -> Vec<&'static SlashCommand> {
        match &self.state {
            PaletteState::Open { search, .. } => filter(search),
            PaletteState::Closed => Vec::new(),
        }
    }

    pub fn highlighted_command(&self) -> Option<&'static SlashCommand> {
        self.visible().get(self.highlighted).copied()
    }

    /// Whether typing the trigger now should open the palette: the caret is
    /// collapsed and neither neighbour inside its block is a word character
    pub fn should_trigger(editor: &Editor) -> bool {
        let Some(selection) = editor.selection() else {
            return false;
        };
        if !selection.is_collapsed() {
            return false;
        }
        let doc = editor.document();
        let caret = doc.cursor(&selection.focus);
        let Some(block) = doc.text_block(caret.block) else {
            return false;
        };
        let text = block.string();
        let before = text[..caret.offset].chars().next_back();
        let after = text[caret.offset..].chars().next();
        before.is_none_or(char::is_whitespace) && after.is_none_or(char::is_whitespace)
    }

    pub fn open(&mut self, anchor: Point) {
        log::debug!("palette opened at {} offset {}", anchor.path, anchor.offset);
        self.state = PaletteState::Open {
            anchor,
            search: String::new(),
        };
        self.refilter();
    }

    pub fn close(&mut self) {
        self.state = PaletteState::Closed;
        self.highlighted = 0;
        self.filtered.clear();
    }

    /// Re-read the typed query after a document change
    pub fn on_change(&mut self, editor: &Editor) {
        let PaletteState::Open { anchor, .. } = &self.state else {
            return;
        };
        let Some(selection) = editor.selection() else {
            self.close();
            return;
        };

        let typed = editor.document().string_between(anchor, &selection.focus);
        match typed.strip_prefix(TRIGGER) {
            Some(rest) => {
                let rest = rest.to_string();
                if let PaletteState::Open { search, .. } = &mut self.state {
                    *search = rest;
                }
                self.refilter();
            }
            None => self.close(),
        }
    }

    fn refilter(&mut self) {
        let ids: Vec<&'static str> = self.visible().iter().map(|command| command.id).collect();
        if ids != self.filtered {
            self.highlighted = 0;
            self.filtered = ids;
        }
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> PaletteKey {
        if !self.is_open() {
            return PaletteKey::NotHandled;
        }
        let count = self.filtered.len();

        match event.key {
            Key::Down => {
                if count > 0 {
                    self.highlighted = (self.highlighted + 1) % count;
                }
                PaletteKey::Handled
            }
            Key::Up => {
                if count > 0 {
                    self.highlighted = if self.highlighted == 0 {
                        count - 1
                    } else {
                        self.highlighted - 1
                    };
                }
                PaletteKey::Handled
            }
            Key::Enter => match self.highlighted_command() {
                Some(command) => PaletteKey::Invoke(command),
                None => PaletteKey::Handled,
            },
            Key::Escape => {
                self.close();
                PaletteKey::Handled
            }
            Key::Backspace => {
                // the editor still deletes the trigger itself
                if self.search().is_some_and(str::is_empty) {
                    self.close();
                }
                PaletteKey::NotHandled
            }
            _ => PaletteKey::NotHandled,
        }
    }

    /// Close and return the edits that run `command`: remove the trigger and
    /// the typed query, then apply the command's action
    pub fn invoke(&mut self, editor: &Editor, command: &SlashCommand) -> Vec<Cmd> {
        let mut cmds = Vec::with_capacity(2);
        if let (Some(anchor), Some(selection)) = (self.anchor(), editor.selection()) {
            cmds.push(Cmd::DeleteRange {
                from: anchor.clone(),
                to: selection.focus.clone(),
            });
        }
        cmds.push(command.action.to_cmd());
        log::debug!("palette invoked {}", command.id);
        self.close();
        cmds
    }

    /// Explicit close request: close and return the edit removing the trigger
    pub fn dismiss(&mut self) -> Option<Cmd> {
        let anchor = self.anchor()?.clone();
        let to = Point::new(anchor.path.clone(), anchor.offset + TRIGGER.len_utf8());
        self.close();
        Some(Cmd::DeleteRange { from: anchor, to })
    }

    /// A click outside the editor closes the palette without editing
    pub fn click_outside(&mut self) {
        self.close();
    }
}
