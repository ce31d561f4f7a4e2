pub mod document;
pub mod inline;
pub mod invariants;
pub mod node;
pub mod path;

pub use document::{Cursor, Document};
pub use inline::{Span, Spans};
pub use node::{Align, Element, ElementKind, HeadingLevel, Mark, Marks, Node, Text};
pub use path::{Path, Point, Selection};
