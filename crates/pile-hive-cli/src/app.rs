use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use pile_hive_engine::input::{Key, Modifiers};
use pile_hive_engine::store::DEFAULT_TITLE;
use pile_hive_engine::toolbar::ToolbarTool;
use pile_hive_engine::{
    Cmd, DocumentStore, EditorSession, ElementKind, KeyOutcome, Selection, SharedStore,
};
use std::sync::MutexGuard;

use crate::view::ScreenLayout;

/// A single-line input shown in the footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Link,
    Title,
}

pub struct App {
    session: EditorSession,
    layout: ScreenLayout,
    prompt: Option<(Prompt, String)>,
    status: Option<String>,
    quit: bool,
}

impl App {
    pub fn new(store: SharedStore) -> Self {
        Self {
            session: EditorSession::new(store),
            layout: ScreenLayout::default(),
            prompt: None,
            status: None,
            quit: false,
        }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn store(&self) -> MutexGuard<'_, DocumentStore> {
        self.session
            .store()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn prompt(&self) -> Option<(Prompt, &str)> {
        self.prompt
            .as_ref()
            .map(|(prompt, input)| (*prompt, input.as_str()))
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn scroll(&self) -> u16 {
        self.layout.scroll()
    }

    pub fn set_layout(&mut self, layout: ScreenLayout) {
        self.layout = layout;
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.prompt.is_some() {
            self.on_prompt_key(key);
            return;
        }
        self.status = None;

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') if ctrl => {
                self.quit = true;
                return;
            }
            KeyCode::Char('n') if ctrl => {
                let id = self.session.new_document();
                self.status = Some(format!("New document {id}"));
                return;
            }
            KeyCode::Char('t') if ctrl => {
                self.toggle_focused_todo();
                return;
            }
            KeyCode::F(2) => {
                let title = self.store().title().to_string();
                self.prompt = Some((Prompt::Title, title));
                return;
            }
            _ => {}
        }

        let Some(event) = translate(&key) else {
            return;
        };
        match self.session.handle_key(event, &self.layout) {
            KeyOutcome::LinkRequested => self.prompt = Some((Prompt::Link, String::new())),
            KeyOutcome::Saved => self.status = Some("Saved".to_string()),
            KeyOutcome::SaveFailed(error) => self.status = Some(error),
            KeyOutcome::Handled | KeyOutcome::Ignored => {}
        }
    }

    fn on_prompt_key(&mut self, key: KeyEvent) {
        let Some((prompt, input)) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Esc => self.prompt = None,
            KeyCode::Enter => {
                let prompt = *prompt;
                let input = std::mem::take(input);
                self.prompt = None;
                self.finish_prompt(prompt, input);
            }
            _ => {}
        }
    }

    fn finish_prompt(&mut self, prompt: Prompt, input: String) {
        match prompt {
            Prompt::Link => {
                if !self
                    .session
                    .invoke_tool(ToolbarTool::Link, || Some(input), &self.layout)
                {
                    self.status = Some("No link added".to_string());
                }
            }
            Prompt::Title => {
                let title = input.trim();
                let title = if title.is_empty() { DEFAULT_TITLE } else { title };
                self.store().set_title(title);
            }
        }
    }

    fn toggle_focused_todo(&mut self) {
        let path = {
            let store = self.store();
            let editor = store.editor();
            let is_todo = editor
                .focus_block()
                .is_some_and(|block| matches!(block.kind, ElementKind::TodoItem { .. }));
            match editor.selection() {
                Some(selection) if is_todo => selection.focus.path.clone(),
                _ => return,
            }
        };
        self.session.apply(Cmd::ToggleTodo { path }, &self.layout);
    }

    pub fn on_paste(&mut self, text: &str) {
        match self.prompt.as_mut() {
            Some((_, input)) => input.push_str(text.trim_end_matches('\n')),
            None => {
                self.session.insert_text(text, &self.layout);
            }
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(tool) = self.layout.toolbar_tool_at(column, row) {
                    if tool == ToolbarTool::Link {
                        self.prompt = Some((Prompt::Link, String::new()));
                    } else {
                        self.session.invoke_tool(tool, || None, &self.layout);
                    }
                } else if let Some(command) = self.layout.palette_command_at(column, row) {
                    self.session.run_palette_command(command, &self.layout);
                } else if let Some(path) = self.layout.checkbox_at(column, row) {
                    self.session.apply(Cmd::ToggleTodo { path }, &self.layout);
                } else if let Some(point) = self.layout.point_at(column, row) {
                    self.session
                        .select(Some(Selection::collapsed(point)), &self.layout);
                } else {
                    self.session.click_outside();
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(point) = self.layout.point_at(column, row) else {
                    return;
                };
                let anchor = self
                    .store()
                    .editor()
                    .selection()
                    .map(|selection| selection.anchor.clone());
                if let Some(anchor) = anchor {
                    self.session
                        .select(Some(Selection::new(anchor, point)), &self.layout);
                }
            }
            _ => {}
        }
    }
}

/// Map a terminal key to the engine's key representation. Control is the
/// command modifier.
pub fn translate(key: &KeyEvent) -> Option<pile_hive_engine::input::KeyEvent> {
    let code = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Esc => Key::Escape,
        KeyCode::Tab => Key::Tab,
        _ => return None,
    };
    let modifiers = Modifiers {
        mod_key: key.modifiers.contains(KeyModifiers::CONTROL),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
        alt: key.modifiers.contains(KeyModifiers::ALT),
    };
    Some(pile_hive_engine::input::KeyEvent::new(code, modifiers))
}
