use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::editing::{Cmd, Editor};
use crate::models::{Document, Element, Point};

/// Create a temporary storage directory
pub fn create_test_storage_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a file with content inside a storage directory
pub fn create_test_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}

/// An editor over `blocks` with a collapsed caret at `point`
pub fn editor_at(blocks: Vec<Element>, point: Point) -> Editor {
    let mut editor = Editor::new(Document::from_blocks(blocks));
    editor.apply(Cmd::caret(point));
    editor
}
