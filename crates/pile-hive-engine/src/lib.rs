pub mod editing;
pub mod input;
pub mod io;
pub mod models;
pub mod palette;
pub mod selection;
pub mod session;
pub mod store;
pub mod toolbar;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{BlockFormat, Cmd, Editor, Motion, Patch};
pub use io::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use models::{Document, Element, ElementKind, Mark, Marks, Node, Path, Point, Selection, Text};
pub use session::{EditorSession, KeyOutcome};
pub use store::{AutoSaver, DocumentId, DocumentStore, SharedStore};
