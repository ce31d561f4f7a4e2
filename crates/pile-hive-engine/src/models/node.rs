use serde::{Deserialize, Serialize};

/// Inline formatting a text run can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl Mark {
    pub const ALL: [Mark; 5] = [
        Mark::Bold,
        Mark::Italic,
        Mark::Underline,
        Mark::Strikethrough,
        Mark::Code,
    ];

    /// Field name used in the stored JSON
    pub fn name(self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Strikethrough => "strikethrough",
            Mark::Code => "code",
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The set of marks on a run. Absent marks are never written as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
}

impl Marks {
    pub fn contains(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underline => self.underline,
            Mark::Strikethrough => self.strikethrough,
            Mark::Code => self.code,
        }
    }

    pub fn set(&mut self, mark: Mark, on: bool) {
        let slot = match mark {
            Mark::Bold => &mut self.bold,
            Mark::Italic => &mut self.italic,
            Mark::Underline => &mut self.underline,
            Mark::Strikethrough => &mut self.strikethrough,
            Mark::Code => &mut self.code,
        };
        *slot = on;
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.set(mark, true);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Marks::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = Mark> + '_ {
        Mark::ALL.into_iter().filter(|mark| self.contains(*mark))
    }
}

/// A run of text sharing one set of marks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn with_marks(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }
}

/// Heading level, always within 1..=6
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const H1: HeadingLevel = HeadingLevel(1);
    pub const H2: HeadingLevel = HeadingLevel(2);
    pub const H3: HeadingLevel = HeadingLevel(3);

    pub fn new(level: u8) -> Option<Self> {
        (1..=6).contains(&level).then_some(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        HeadingLevel::new(level).ok_or_else(|| format!("heading level out of range: {level}"))
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.0
    }
}

/// Horizontal alignment, settable on any block independently of its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
}

/// The closed set of element kinds.
///
/// Every behavioural question (does it hold text, is it a container, is it
/// void) is answered by an exhaustive match so a new kind cannot slip through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ElementKind {
    Paragraph,
    Heading {
        level: HeadingLevel,
    },
    Quote,
    Code,
    BulletedList,
    NumberedList,
    ListItem,
    TodoList,
    TodoItem {
        #[serde(default)]
        checked: bool,
    },
    Divider,
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    Link {
        url: String,
    },
}

impl ElementKind {
    /// Blocks whose children are inline runs; selection points address these
    pub fn is_text_block(&self) -> bool {
        match self {
            ElementKind::Paragraph
            | ElementKind::Heading { .. }
            | ElementKind::Quote
            | ElementKind::Code
            | ElementKind::ListItem
            | ElementKind::TodoItem { .. }
            | ElementKind::Divider
            | ElementKind::Image { .. } => true,
            ElementKind::BulletedList
            | ElementKind::NumberedList
            | ElementKind::TodoList
            | ElementKind::Link { .. } => false,
        }
    }

    pub fn is_container(&self) -> bool {
        match self {
            ElementKind::BulletedList | ElementKind::NumberedList | ElementKind::TodoList => true,
            ElementKind::Paragraph
            | ElementKind::Heading { .. }
            | ElementKind::Quote
            | ElementKind::Code
            | ElementKind::ListItem
            | ElementKind::TodoItem { .. }
            | ElementKind::Divider
            | ElementKind::Image { .. }
            | ElementKind::Link { .. } => false,
        }
    }

    /// Blocks with no meaningful text: they carry a single empty run
    pub fn is_void(&self) -> bool {
        match self {
            ElementKind::Divider | ElementKind::Image { .. } => true,
            ElementKind::Paragraph
            | ElementKind::Heading { .. }
            | ElementKind::Quote
            | ElementKind::Code
            | ElementKind::BulletedList
            | ElementKind::NumberedList
            | ElementKind::ListItem
            | ElementKind::TodoList
            | ElementKind::TodoItem { .. }
            | ElementKind::Link { .. } => false,
        }
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, ElementKind::ListItem | ElementKind::TodoItem { .. })
    }

    /// The item kind a container holds, or `None` for non-containers
    pub fn item_kind(&self) -> Option<ElementKind> {
        match self {
            ElementKind::BulletedList | ElementKind::NumberedList => Some(ElementKind::ListItem),
            ElementKind::TodoList => Some(ElementKind::TodoItem { checked: false }),
            ElementKind::Paragraph
            | ElementKind::Heading { .. }
            | ElementKind::Quote
            | ElementKind::Code
            | ElementKind::ListItem
            | ElementKind::TodoItem { .. }
            | ElementKind::Divider
            | ElementKind::Image { .. }
            | ElementKind::Link { .. } => None,
        }
    }

    /// Whether `child` may live directly inside this container
    pub fn accepts_item(&self, child: &ElementKind) -> bool {
        match self {
            ElementKind::BulletedList | ElementKind::NumberedList => {
                matches!(child, ElementKind::ListItem)
            }
            ElementKind::TodoList => matches!(child, ElementKind::TodoItem { .. }),
            _ => false,
        }
    }

    /// Short label used by outlines and status lines
    pub fn label(&self) -> String {
        match self {
            ElementKind::Paragraph => "paragraph".to_string(),
            ElementKind::Heading { level } => format!("heading({})", level.get()),
            ElementKind::Quote => "quote".to_string(),
            ElementKind::Code => "code".to_string(),
            ElementKind::BulletedList => "bulleted-list".to_string(),
            ElementKind::NumberedList => "numbered-list".to_string(),
            ElementKind::ListItem => "list-item".to_string(),
            ElementKind::TodoList => "todo-list".to_string(),
            ElementKind::TodoItem { checked } => format!("todo-item(checked={checked})"),
            ElementKind::Divider => "divider".to_string(),
            ElementKind::Image { url, .. } => format!("image({url})"),
            ElementKind::Link { url } => format!("link({url})"),
        }
    }
}

/// An element node: a kind, an optional alignment and at least one child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(kind: ElementKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            align: None,
            children,
        }
    }

    /// A text-bearing block holding a single unformatted run
    pub fn with_text(kind: ElementKind, text: impl Into<String>) -> Self {
        Self::new(kind, vec![Node::Text(Text::new(text))])
    }

    pub fn empty(kind: ElementKind) -> Self {
        Self::with_text(kind, "")
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::with_text(ElementKind::Paragraph, text)
    }

    /// Concatenated text of every run below this element
    pub fn string(&self) -> String {
        let mut out = String::new();
        self.collect_string(&mut out);
        out
    }

    fn collect_string(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(&text.text),
                Node::Element(element) => element.collect_string(out),
            }
        }
    }

    pub fn text_len(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                Node::Text(text) => text.text.len(),
                Node::Element(element) => element.text_len(),
            })
            .sum()
    }
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_serializes_only_true_marks() {
        let text = Text::with_marks("hi", Marks::default().with(Mark::Bold));
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(json, r#"{"text":"hi","bold":true}"#);
    }

    #[test]
    fn test_element_wire_format() {
        let heading = Element::with_text(
            ElementKind::Heading {
                level: HeadingLevel::H2,
            },
            "Title",
        );
        let json = serde_json::to_string(&heading).unwrap();
        assert_eq!(
            json,
            r#"{"type":"heading","level":2,"children":[{"text":"Title"}]}"#
        );
    }

    #[test]
    fn test_node_deserializes_nested_list() {
        let json = r#"{"type":"todo-list","children":[
            {"type":"todo-item","checked":true,"children":[{"text":"done","italic":true}]}
        ]}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        let list = node.as_element().unwrap();
        assert_eq!(list.kind, ElementKind::TodoList);

        let item = list.children[0].as_element().unwrap();
        assert_eq!(item.kind, ElementKind::TodoItem { checked: true });
        assert!(item.children[0].as_text().unwrap().marks.italic);
    }

    #[test]
    fn test_align_round_trip() {
        let mut element = Element::paragraph("centered");
        element.align = Some(Align::Center);
        let json = serde_json::to_string(&element).unwrap();
        assert!(json.contains(r#""align":"center""#));

        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back, element);
    }

    #[test]
    fn test_heading_level_rejects_out_of_range() {
        assert!(HeadingLevel::new(0).is_none());
        assert!(HeadingLevel::new(7).is_none());
        assert_eq!(HeadingLevel::new(6).map(HeadingLevel::get), Some(6));

        let result: Result<Element, _> =
            serde_json::from_str(r#"{"type":"heading","level":9,"children":[{"text":""}]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_kind_classification() {
        assert!(ElementKind::Divider.is_void());
        assert!(ElementKind::Divider.is_text_block());
        assert!(!ElementKind::TodoList.is_text_block());
        assert!(ElementKind::TodoList.accepts_item(&ElementKind::TodoItem { checked: true }));
        assert!(!ElementKind::BulletedList.accepts_item(&ElementKind::TodoItem { checked: false }));
        assert_eq!(
            ElementKind::NumberedList.item_kind(),
            Some(ElementKind::ListItem)
        );
    }

    #[test]
    fn test_element_string_includes_link_text() {
        let element = Element::new(
            ElementKind::Paragraph,
            vec![
                Node::Text(Text::new("see ")),
                Node::Element(Element::with_text(
                    ElementKind::Link {
                        url: "https://example.com".to_string(),
                    },
                    "here",
                )),
                Node::Text(Text::new("")),
            ],
        );
        assert_eq!(element.string(), "see here");
        assert_eq!(element.text_len(), 8);
    }
}
