// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use pile_hive_engine::models::{
    Document, Element, ElementKind, HeadingLevel, Mark, Marks, Node, Text,
};

#[allow(dead_code)]
pub fn generate_document(sections: usize) -> Document {
    let mut blocks = Vec::with_capacity(sections * 4);
    for section in 0..sections {
        blocks.push(Element::with_text(
            ElementKind::Heading {
                level: HeadingLevel::H2,
            },
            format!("Section {section}"),
        ));
        blocks.push(Element::paragraph(
            "Paragraph with some content. This helps create realistic document structure.",
        ));
        blocks.push(Element::new(
            ElementKind::BulletedList,
            (0..3)
                .map(|i| {
                    Node::Element(Element::with_text(ElementKind::ListItem, format!("Item {i}")))
                })
                .collect(),
        ));
        blocks.push(Element::new(
            ElementKind::Paragraph,
            vec![
                Node::Text(Text::new("plain ")),
                Node::Text(Text::with_marks("formatted", Marks::default().with(Mark::Bold))),
            ],
        ));
    }
    Document::from_blocks(blocks)
}
