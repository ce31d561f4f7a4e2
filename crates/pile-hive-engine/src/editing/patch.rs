use crate::models::Selection;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Whether the document tree changed
    pub changed: bool,
    pub new_selection: Option<Selection>,
    pub version: u64,
}
