//! An editing session: routes keys through hotkeys, the slash palette and
//! the editor, then refreshes the palette search, the selection anchors and
//! the store's menu flags after every change.

use crate::editing::{BlockFormat, Cmd, Motion, Patch};
use crate::input::{Key, KeyEvent};
use crate::models::{Mark, Selection};
use crate::palette::{Palette, PaletteKey, SlashCommand, TRIGGER};
use crate::selection::{SelectionGeometry, SelectionTracker};
use crate::store::autosave::lock;
use crate::store::{DocumentId, SharedStore, save_shared};
use crate::toolbar::{self, ToolbarTool};

/// What the front end should do after a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    /// Not an editing key; the front end may use it
    Ignored,
    /// `mod+k`: ask the user for a URL and call [`EditorSession::insert_link`]
    LinkRequested,
    Saved,
    SaveFailed(String),
}

const MARK_HOTKEYS: [(char, bool, Mark); 5] = [
    ('b', false, Mark::Bold),
    ('i', false, Mark::Italic),
    ('u', false, Mark::Underline),
    ('x', true, Mark::Strikethrough),
    ('e', false, Mark::Code),
];

const BLOCK_HOTKEYS: [(char, BlockFormat); 2] = [
    ('7', BlockFormat::BulletedList),
    ('8', BlockFormat::NumberedList),
];

pub struct EditorSession {
    store: SharedStore,
    palette: Palette,
    tracker: SelectionTracker,
}

impl EditorSession {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            palette: Palette::new(),
            tracker: SelectionTracker::new(),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    pub fn handle_key(
        &mut self,
        event: KeyEvent,
        geometry: &dyn SelectionGeometry,
    ) -> KeyOutcome {
        if let Some(outcome) = self.handle_hotkey(&event, geometry) {
            return outcome;
        }

        match self.palette.handle_key(&event) {
            PaletteKey::Handled => {
                self.sync_menus();
                return KeyOutcome::Handled;
            }
            PaletteKey::Invoke(command) => {
                self.run_palette_command(command, geometry);
                return KeyOutcome::Handled;
            }
            PaletteKey::NotHandled => {}
        }

        let modifiers = event.modifiers;
        let cmd = match event.key {
            Key::Char(c) if event.typed_char().is_some() => {
                if c == TRIGGER {
                    self.maybe_open_palette(geometry);
                }
                Cmd::insert_text(c.to_string())
            }
            Key::Enter if !modifiers.mod_key => Cmd::InsertBreak,
            Key::Backspace => Cmd::DeleteBackward,
            Key::Delete => Cmd::DeleteForward,
            Key::Left => Cmd::Move {
                motion: if modifiers.mod_key { Motion::LineStart } else { Motion::Left },
                extend: modifiers.shift,
            },
            Key::Right => Cmd::Move {
                motion: if modifiers.mod_key { Motion::LineEnd } else { Motion::Right },
                extend: modifiers.shift,
            },
            Key::Up => Cmd::Move {
                motion: if modifiers.mod_key { Motion::DocumentStart } else { Motion::Up },
                extend: modifiers.shift,
            },
            Key::Down => Cmd::Move {
                motion: if modifiers.mod_key { Motion::DocumentEnd } else { Motion::Down },
                extend: modifiers.shift,
            },
            Key::Home => Cmd::Move {
                motion: Motion::LineStart,
                extend: modifiers.shift,
            },
            Key::End => Cmd::Move {
                motion: Motion::LineEnd,
                extend: modifiers.shift,
            },
            _ => return KeyOutcome::Ignored,
        };

        self.apply(cmd, geometry);
        KeyOutcome::Handled
    }

    fn handle_hotkey(
        &mut self,
        event: &KeyEvent,
        geometry: &dyn SelectionGeometry,
    ) -> Option<KeyOutcome> {
        if let Some((_, _, mark)) = MARK_HOTKEYS
            .iter()
            .find(|(c, shift, _)| event.is_shortcut(*c, *shift))
        {
            self.apply(Cmd::ToggleMark(*mark), geometry);
            return Some(KeyOutcome::Handled);
        }

        if let Some((_, format)) = BLOCK_HOTKEYS
            .iter()
            .find(|(c, _)| event.is_shortcut(*c, true))
        {
            self.apply(Cmd::ToggleBlock(*format), geometry);
            return Some(KeyOutcome::Handled);
        }

        if event.is_shortcut('s', false) {
            return Some(match save_shared(&self.store) {
                Ok(()) => KeyOutcome::Saved,
                Err(e) => {
                    log::error!("{e:#}");
                    KeyOutcome::SaveFailed(format!("{e:#}"))
                }
            });
        }

        if event.is_shortcut('k', false) {
            return Some(KeyOutcome::LinkRequested);
        }

        None
    }

    /// Opens the palette when the trigger is typed at a word boundary. Runs
    /// before the trigger itself is inserted.
    fn maybe_open_palette(&mut self, geometry: &dyn SelectionGeometry) {
        let caret = {
            let store = lock(&self.store);
            if !Palette::should_trigger(store.editor()) {
                return;
            }
            match store.editor().selection() {
                Some(selection) => selection.focus.clone(),
                None => return,
            }
        };

        self.palette.open(caret);
        let mut store = lock(&self.store);
        self.tracker.observe(store.editor(), geometry);
        store.set_slash_menu_open(true, self.tracker.menu_anchor());
    }

    /// Run a command and refresh everything that follows the document
    pub fn apply(&mut self, cmd: Cmd, geometry: &dyn SelectionGeometry) -> Patch {
        let patch = lock(&self.store).apply(cmd);
        self.on_change(geometry);
        patch
    }

    pub fn insert_text(&mut self, text: &str, geometry: &dyn SelectionGeometry) -> Patch {
        self.apply(Cmd::insert_text(text), geometry)
    }

    pub fn insert_link(&mut self, url: &str, geometry: &dyn SelectionGeometry) -> Patch {
        self.apply(Cmd::insert_link(url), geometry)
    }

    pub fn select(
        &mut self,
        selection: Option<Selection>,
        geometry: &dyn SelectionGeometry,
    ) -> Patch {
        self.apply(Cmd::Select(selection), geometry)
    }

    fn on_change(&mut self, geometry: &dyn SelectionGeometry) {
        let mut store = lock(&self.store);
        self.palette.on_change(store.editor());
        self.tracker.observe(store.editor(), geometry);

        let expanded = toolbar::is_visible(store.editor().selection());
        match self.tracker.toolbar_anchor() {
            Some(anchor) if expanded => store.set_toolbar_open(true, Some(anchor)),
            _ if expanded => {}
            _ => store.set_toolbar_open(false, None),
        }
        drop(store);

        self.sync_menus();
    }

    fn sync_menus(&mut self) {
        let mut store = lock(&self.store);
        if !self.palette.is_open() && store.slash_menu().open {
            store.set_slash_menu_open(false, None);
        }
    }

    /// Remove the trigger and query, then run `command`
    pub fn run_palette_command(
        &mut self,
        command: &SlashCommand,
        geometry: &dyn SelectionGeometry,
    ) {
        let cmds = {
            let store = lock(&self.store);
            self.palette.invoke(store.editor(), command)
        };
        for cmd in cmds {
            self.apply(cmd, geometry);
        }
        self.sync_menus();
    }

    /// Explicit close of the palette; deletes the trigger character
    pub fn close_palette(&mut self, geometry: &dyn SelectionGeometry) {
        if let Some(cmd) = self.palette.dismiss() {
            self.apply(cmd, geometry);
        }
        self.sync_menus();
    }

    /// Start a fresh document, dropping palette and anchor state that
    /// pointed into the old one
    pub fn new_document(&mut self) -> DocumentId {
        self.palette.close();
        self.tracker = SelectionTracker::new();
        lock(&self.store).new_document()
    }

    /// A click outside the editor closes both menus without editing
    pub fn click_outside(&mut self) {
        self.palette.click_outside();
        let mut store = lock(&self.store);
        store.set_slash_menu_open(false, None);
        store.set_toolbar_open(false, None);
    }

    /// Run a toolbar tool. Returns whether a command was applied.
    pub fn invoke_tool(
        &mut self,
        tool: ToolbarTool,
        prompt: impl FnOnce() -> Option<String>,
        geometry: &dyn SelectionGeometry,
    ) -> bool {
        match toolbar::command_for(tool, prompt) {
            Some(cmd) => {
                self.apply(cmd, geometry);
                true
            }
            None => false,
        }
    }
}
