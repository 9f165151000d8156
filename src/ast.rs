//! Node tree produced by the parser and consumed by the HTML renderer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Document(Vec<Node>),
    // Block-level nodes
    Paragraph(Vec<Node>),
    Heading {
        level: u8, // 1..=3
        children: Vec<Node>,
    },
    CodeBlock {
        language: Option<String>,
        literal: String,
    },
    BlockQuote(Vec<Node>), // One per quoted line, never merged
    UnorderedList(Vec<Node>), // Contains ListItem nodes
    OrderedList(Vec<Node>),   // Contains ListItem nodes
    ListItem(Vec<Node>),
    // Inline nodes
    Text(String),
    Code(String),        // Inline code span
    Emphasis(Vec<Node>), // <em> tag
    Strong(Vec<Node>),   // <strong> tag
    Link {
        destination: String,
        children: Vec<Node>,
    },
    LineBreak, // <br> between lines of one paragraph
}

impl Node {
    /// Whether this node occupies whole lines rather than sitting inside one.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Node::Document(_)
                | Node::Paragraph(_)
                | Node::Heading { .. }
                | Node::CodeBlock { .. }
                | Node::BlockQuote(_)
                | Node::UnorderedList(_)
                | Node::OrderedList(_)
                | Node::ListItem(_)
        )
    }
}
