//! The document store: the one place that owns the active document, its
//! title and save state, and the flags of the floating menus.

pub mod autosave;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::editing::{Cmd, Editor, Patch};
use crate::io::{KeyValueStorage, StorageError};
use crate::models::Document;
use crate::selection::Position;

pub use autosave::{AutoSaver, DEFAULT_INTERVAL, SharedStore, save_shared};

/// Storage key always holding the last saved document
pub const CURRENT_DOCUMENT_KEY: &str = "current-document";

pub const DEFAULT_TITLE: &str = "Untitled";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn storage_key(&self) -> String {
        format!("document-{}", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Open flag and screen anchor of a floating menu
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuState {
    pub open: bool,
    pub position: Option<Position>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocumentRef<'a> {
    value: &'a Document,
    title: &'a str,
    updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    #[serde(default)]
    value: Option<Document>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

pub struct DocumentStore {
    editor: Editor,
    title: String,
    last_saved: Option<DateTime<Utc>>,
    is_dirty: bool,
    slash_menu: MenuState,
    toolbar: MenuState,
    document_id: Option<DocumentId>,
    storage: Box<dyn KeyValueStorage + Send>,
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("title", &self.title)
            .field("last_saved", &self.last_saved)
            .field("is_dirty", &self.is_dirty)
            .field("document_id", &self.document_id)
            .field("version", &self.editor.version())
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// An untitled empty document backed by `storage`
    pub fn new(storage: impl KeyValueStorage + Send + 'static) -> Self {
        let mut editor = Editor::default();
        editor.replace_document(Document::new());
        Self {
            editor,
            title: DEFAULT_TITLE.to_string(),
            last_saved: None,
            is_dirty: false,
            slash_menu: MenuState::default(),
            toolbar: MenuState::default(),
            document_id: None,
            storage: Box::new(storage),
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn document(&self) -> &Document {
        self.editor.document()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn slash_menu(&self) -> MenuState {
        self.slash_menu
    }

    pub fn toolbar(&self) -> MenuState {
        self.toolbar
    }

    pub fn document_id(&self) -> Option<&DocumentId> {
        self.document_id.as_ref()
    }

    /// Run a command, marking the store dirty when the document changed
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let patch = self.editor.apply(cmd);
        if patch.changed {
            self.is_dirty = true;
        }
        patch
    }

    pub fn set_value(&mut self, document: Document) {
        self.editor.replace_document(document);
        self.is_dirty = true;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.is_dirty = true;
    }

    pub fn set_slash_menu_open(&mut self, open: bool, position: Option<Position>) {
        self.slash_menu = MenuState { open, position };
    }

    pub fn set_toolbar_open(&mut self, open: bool, position: Option<Position>) {
        self.toolbar = MenuState { open, position };
    }

    /// Persist under the current-document key, and under the document's own
    /// key when one is loaded
    pub fn save_document(&mut self) -> Result<(), StorageError> {
        self.save_document_at(Utc::now())
    }

    pub fn save_document_at(&mut self, now: DateTime<Utc>) -> Result<(), StorageError> {
        let json = serde_json::to_string(&StoredDocumentRef {
            value: self.editor.document(),
            title: &self.title,
            updated_at: now,
        })?;

        self.storage.set(CURRENT_DOCUMENT_KEY, &json)?;
        if let Some(id) = &self.document_id {
            self.storage.set(&id.storage_key(), &json)?;
        }

        log::info!("saved {:?} ({} bytes)", self.title, json.len());
        self.last_saved = Some(now);
        self.is_dirty = false;
        Ok(())
    }

    /// Load `document-<id>`, or the current document without an id. Missing
    /// or unreadable entries fall back to an empty untitled document.
    pub fn load_document(&mut self, id: Option<&str>) {
        let id = id.map(DocumentId::new);
        let key = id
            .as_ref()
            .map(DocumentId::storage_key)
            .unwrap_or_else(|| CURRENT_DOCUMENT_KEY.to_string());

        let stored = match self.storage.get(&key) {
            Ok(Some(json)) => match serde_json::from_str::<StoredDocument>(&json) {
                Ok(stored) => Some(stored),
                Err(e) => {
                    log::error!("Failed to load document {key}: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::error!("Failed to read document {key}: {e}");
                None
            }
        };

        let (document, title, last_saved) = match stored {
            Some(stored) => (
                stored.value.unwrap_or_default(),
                stored
                    .title
                    .filter(|title| !title.is_empty())
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                stored.updated_at,
            ),
            None => (Document::new(), DEFAULT_TITLE.to_string(), None),
        };

        self.editor.replace_document(document);
        self.title = title;
        self.last_saved = last_saved;
        self.is_dirty = false;
        self.slash_menu = MenuState::default();
        self.toolbar = MenuState::default();
        self.document_id = id;
    }

    /// Start a fresh document with a new id
    pub fn new_document(&mut self) -> DocumentId {
        let id = DocumentId::generate();
        self.editor.replace_document(Document::new());
        self.title = DEFAULT_TITLE.to_string();
        self.last_saved = None;
        self.is_dirty = false;
        self.slash_menu = MenuState::default();
        self.toolbar = MenuState::default();
        self.document_id = Some(id.clone());
        id
    }

    /// Save iff dirty. Failures are logged, never returned.
    pub fn auto_save(&mut self) -> bool {
        if !self.is_dirty {
            return false;
        }
        match self.save_document() {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to save document: {e}");
                false
            }
        }
    }

    pub fn save_status(&self, now: DateTime<Utc>) -> String {
        format_last_saved(self.last_saved, now)
    }
}

/// Human-readable age of the last save
pub fn format_last_saved(last_saved: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(saved) = last_saved else {
        return "Never saved".to_string();
    };

    let minutes = (now - saved).num_minutes();
    if minutes < 1 {
        return "Saved just now".to_string();
    }
    if minutes == 1 {
        return "Saved 1 minute ago".to_string();
    }
    if minutes < 60 {
        return format!("Saved {minutes} minutes ago");
    }

    let hours = minutes / 60;
    if hours == 1 {
        return "Saved 1 hour ago".to_string();
    }
    if hours < 24 {
        return format!("Saved {hours} hours ago");
    }

    saved.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{FileStorage, MemoryStorage};
    use crate::models::{Element, ElementKind, Point};
    use crate::tests::create_test_storage_dir;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    /// Storage whose contents stay observable after being boxed into a store
    #[derive(Clone, Default)]
    struct SharedMemory(Arc<Mutex<MemoryStorage>>);

    impl SharedMemory {
        fn raw(&self, key: &str) -> Option<String> {
            self.0.lock().unwrap().get(key).unwrap()
        }
    }

    impl KeyValueStorage for SharedMemory {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.lock().unwrap().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.lock().unwrap().set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.0.lock().unwrap().remove(key)
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_load_with_nothing_stored() {
        // Given an empty storage
        let mut store = DocumentStore::new(MemoryStorage::new());

        // When loading
        store.load_document(None);

        // Then the default document is shown, clean and never saved
        assert_eq!(store.document(), &Document::new());
        assert_eq!(store.title(), "Untitled");
        assert!(!store.is_dirty());
        assert_eq!(store.last_saved(), None);
    }

    #[test]
    fn test_load_malformed_json_falls_back() {
        let mut storage = MemoryStorage::new();
        storage.set(CURRENT_DOCUMENT_KEY, "{not json").unwrap();
        let mut store = DocumentStore::new(storage);
        store.set_title("Dirty");

        store.load_document(None);

        assert_eq!(store.document(), &Document::new());
        assert_eq!(store.title(), "Untitled");
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let mut storage = MemoryStorage::new();
        storage.set(CURRENT_DOCUMENT_KEY, r#"{"title":""}"#).unwrap();
        let mut store = DocumentStore::new(storage);

        store.load_document(None);

        assert_eq!(store.title(), "Untitled");
        assert_eq!(store.document(), &Document::new());
    }

    #[test]
    fn test_apply_marks_dirty_only_on_change() {
        let mut store = DocumentStore::new(MemoryStorage::new());

        store.apply(Cmd::caret(Point::new([0], 0)));
        assert!(!store.is_dirty());

        store.apply(Cmd::insert_text("x"));
        assert!(store.is_dirty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let storage = SharedMemory::default();
        let mut store = DocumentStore::new(storage.clone());
        store.apply(Cmd::insert_text("hello"));
        store.apply(Cmd::ToggleBlock(crate::editing::BlockFormat::Quote));
        store.set_title("Notes");

        store.save_document_at(at(9, 30)).unwrap();
        assert!(!store.is_dirty());
        assert_eq!(store.last_saved(), Some(at(9, 30)));

        let raw = storage.raw(CURRENT_DOCUMENT_KEY).unwrap_or_default();
        assert!(raw.contains(r#""updatedAt":"2024-03-01T09:30:00Z""#));
        assert!(raw.contains(r#""title":"Notes""#));

        let mut other = DocumentStore::new(storage);
        other.load_document(None);
        assert_eq!(other.title(), "Notes");
        assert_eq!(other.document().blocks()[0].kind, ElementKind::Quote);
        assert_eq!(other.document().plain_text(), "hello");
        assert_eq!(other.last_saved(), Some(at(9, 30)));
    }

    #[test]
    fn test_save_writes_document_key_when_id_loaded() {
        let storage = SharedMemory::default();
        let mut store = DocumentStore::new(storage.clone());
        let id = store.new_document();

        store.set_title("Mine");
        store.save_document().unwrap();

        assert!(storage.raw(&id.storage_key()).is_some());
        assert!(storage.raw(CURRENT_DOCUMENT_KEY).is_some());

        let mut other = DocumentStore::new(storage);
        other.load_document(Some(id.as_str()));
        assert_eq!(other.title(), "Mine");
        assert_eq!(other.document_id(), Some(&id));
    }

    #[test]
    fn test_auto_save_only_when_dirty() {
        let storage = SharedMemory::default();
        let mut store = DocumentStore::new(storage.clone());

        assert!(!store.auto_save());
        assert_eq!(storage.raw(CURRENT_DOCUMENT_KEY), None);

        store.set_title("t");
        assert!(store.auto_save());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_load_resets_menus() {
        let mut store = DocumentStore::new(MemoryStorage::new());
        store.set_slash_menu_open(true, Some(Position::new(1, 2)));
        store.set_toolbar_open(true, None);

        store.load_document(None);

        assert_eq!(store.slash_menu(), MenuState::default());
        assert_eq!(store.toolbar(), MenuState::default());
    }

    #[test]
    fn test_load_normalizes_stored_tree() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                CURRENT_DOCUMENT_KEY,
                r#"{"value":[{"type":"list-item","children":[]}],"title":"T"}"#,
            )
            .unwrap();
        let mut store = DocumentStore::new(storage);

        store.load_document(None);

        let doc = store.document();
        assert_eq!(doc.blocks()[0].kind, ElementKind::BulletedList);
        assert_eq!(
            doc.text_block(0).map(|e| e.kind.clone()),
            Some(ElementKind::ListItem)
        );
        crate::models::invariants::check(doc);
    }

    #[test]
    fn test_file_storage_backed_store() {
        let dir = create_test_storage_dir();
        let mut store = DocumentStore::new(FileStorage::open(dir.path()).unwrap());
        store.set_value(Document::from_blocks(vec![Element::paragraph("on disk")]));
        store.save_document().unwrap();

        let mut reloaded = DocumentStore::new(FileStorage::open(dir.path()).unwrap());
        reloaded.load_document(None);

        assert_eq!(reloaded.document().plain_text(), "on disk");
    }

    #[rstest]
    #[case::never(None, "Never saved")]
    #[case::just_now(Some(Duration::seconds(30)), "Saved just now")]
    #[case::one_minute(Some(Duration::seconds(90)), "Saved 1 minute ago")]
    #[case::minutes(Some(Duration::minutes(12)), "Saved 12 minutes ago")]
    #[case::one_hour(Some(Duration::minutes(75)), "Saved 1 hour ago")]
    #[case::hours(Some(Duration::hours(5)), "Saved 5 hours ago")]
    #[case::date(Some(Duration::days(3)), "2024-02-27")]
    fn test_format_last_saved(#[case] age: Option<Duration>, #[case] expected: &str) {
        let now = at(12, 0);
        let saved = age.map(|age| now - age);
        assert_eq!(format_last_saved(saved, now), expected);
    }
}
