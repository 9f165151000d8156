//! Block-level parsing for chat markdown.
//!
//! The pipeline is fixed: protect code, split into lines, classify each line
//! (heading, blockquote, unordered item, ordered item, plain text), coalesce
//! list items and plain-text runs into blocks, then parse inline content.

use crate::ast::Node;
use crate::inline::parse_inline;
use crate::protect::{self, Piece, ProtectedSpans, SpanId};

/// Deepest heading level recognized
const MAX_HEADING_LEVEL: usize = 3;

pub struct Parser;

/// List type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListType {
    Unordered,
    Ordered,
}

/// One source line after classification.
#[derive(Debug, Clone, PartialEq)]
enum Line {
    Blank,
    Fence(SpanId),
    Heading { level: u8, content: Vec<Piece> },
    BlockQuote(Vec<Piece>),
    ListItem { list_type: ListType, content: Vec<Piece> },
    Text(Vec<Piece>),
}

impl Parser {
    pub fn new() -> Self {
        Parser
    }

    pub fn parse(&self, input: &str) -> Node {
        let (pieces, spans) = protect::extract(input);
        let lines: Vec<Line> = split_lines(pieces)
            .into_iter()
            .map(|line| match line {
                RawLine::Fence(id) => Line::Fence(id),
                RawLine::Pieces(pieces) => self.classify(&pieces),
            })
            .collect();

        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            match &lines[i] {
                Line::Blank => i += 1,
                Line::Fence(id) => {
                    blocks.push(spans.restore_fence(*id));
                    i += 1;
                }
                Line::Heading { level, content } => {
                    blocks.push(Node::Heading {
                        level: *level,
                        children: parse_inline(content, &spans),
                    });
                    i += 1;
                }
                // One blockquote per line, never merged with its neighbours
                Line::BlockQuote(content) => {
                    blocks.push(Node::BlockQuote(parse_inline(content, &spans)));
                    i += 1;
                }
                Line::ListItem { list_type, .. } => {
                    let (list, lines_consumed) =
                        self.parse_list(&lines[i..], *list_type, &spans);
                    blocks.push(list);
                    i += lines_consumed;
                }
                Line::Text(_) => {
                    let (paragraph, lines_consumed) =
                        self.parse_paragraph(&lines[i..], &spans);
                    blocks.push(paragraph);
                    i += lines_consumed;
                }
            }
        }

        debug_assert!(blocks.iter().all(Node::is_block));
        tracing::debug!(lines = lines.len(), blocks = blocks.len(), "parsed document");
        Node::Document(blocks)
    }

    /// Classify a line by the first rule that matches: heading, blockquote,
    /// unordered item, ordered item. Anything else is paragraph text.
    fn classify(&self, line: &[Piece]) -> Line {
        if is_blank(line) {
            return Line::Blank;
        }
        if let Some((level, content)) = self.parse_atx_heading(line) {
            return Line::Heading { level, content };
        }
        if let Some(content) = self.parse_blockquote(line) {
            return Line::BlockQuote(content);
        }
        if let Some((list_type, content)) = self.is_list_start(line) {
            return Line::ListItem { list_type, content };
        }
        Line::Text(trim_end_pieces(line.to_vec()))
    }

    /// `#`, `##` or `###`, a space, then non-empty content.
    fn parse_atx_heading(&self, line: &[Piece]) -> Option<(u8, Vec<Piece>)> {
        let lead = leading_text(line);
        let hash_count = lead.bytes().take_while(|&b| b == b'#').count();
        if hash_count == 0 || hash_count > MAX_HEADING_LEVEL {
            return None;
        }
        if !lead[hash_count..].starts_with(' ') {
            return None;
        }

        let content = non_empty(trim_pieces(strip_leading(line, hash_count + 1)))?;
        Some((hash_count as u8, content))
    }

    /// `>` followed by optional whitespace, then non-empty content.
    fn parse_blockquote(&self, line: &[Piece]) -> Option<Vec<Piece>> {
        let lead = leading_text(line);
        let rest = lead.strip_prefix('>')?;
        let spacing = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        non_empty(trim_pieces(strip_leading(line, 1 + spacing)))
    }

    /// Check if a line starts a list item, returning its type and content.
    ///
    /// Unordered: optional indentation, one of `-`, `*`, `+`, whitespace.
    /// Ordered: optional indentation, digits, `.`, whitespace.
    fn is_list_start(&self, line: &[Piece]) -> Option<(ListType, Vec<Piece>)> {
        let lead = leading_text(line);
        let after_indent = lead.trim_start_matches([' ', '\t']);
        let indent = lead.len() - after_indent.len();

        let (list_type, marker_len) = if after_indent.starts_with(['-', '*', '+']) {
            (ListType::Unordered, 1)
        } else {
            let digits = after_indent.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 || !after_indent[digits..].starts_with('.') {
                return None;
            }
            (ListType::Ordered, digits + 1)
        };

        let after_marker = &after_indent[marker_len..];
        let spacing = after_marker.len() - after_marker.trim_start_matches([' ', '\t']).len();
        if spacing == 0 {
            return None;
        }

        let content = non_empty(trim_pieces(strip_leading(
            line,
            indent + marker_len + spacing,
        )))?;
        Some((list_type, content))
    }

    /// Parse a list, collecting consecutive items of the same type.
    ///
    /// Blank lines between two items of the same type do not split the list.
    fn parse_list(
        &self,
        lines: &[Line],
        list_type: ListType,
        spans: &ProtectedSpans,
    ) -> (Node, usize) {
        let mut items = Vec::new();
        let mut consumed = 0;
        let mut i = 0;

        while i < lines.len() {
            match &lines[i] {
                Line::ListItem {
                    list_type: item_type,
                    content,
                } if *item_type == list_type => {
                    items.push(Node::ListItem(parse_inline(content, spans)));
                    i += 1;
                    consumed = i;
                }
                Line::Blank => i += 1,
                _ => break,
            }
        }

        let list = match list_type {
            ListType::Unordered => Node::UnorderedList(items),
            ListType::Ordered => Node::OrderedList(items),
        };
        (list, consumed)
    }

    /// Parse a paragraph by collecting consecutive plain-text lines.
    ///
    /// The lines are kept apart by newlines, which inline parsing turns into
    /// line breaks. Only the paragraph's outer edges are trimmed, so the
    /// indentation of later lines survives.
    fn parse_paragraph(&self, lines: &[Line], spans: &ProtectedSpans) -> (Node, usize) {
        let mut content = Vec::new();
        let mut i = 0;

        while let Some(Line::Text(pieces)) = lines.get(i) {
            if i > 0 {
                content.push(Piece::Text("\n".to_string()));
            }
            content.extend(pieces.iter().cloned());
            i += 1;
        }

        let content = trim_pieces(content);
        (Node::Paragraph(parse_inline(&content, spans)), i)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// A line before classification. Fences always stand on a line of their own.
enum RawLine {
    Fence(SpanId),
    Pieces(Vec<Piece>),
}

fn split_lines(pieces: Vec<Piece>) -> Vec<RawLine> {
    let mut lines = Vec::new();
    let mut current = Vec::new();

    for piece in pieces {
        match piece {
            Piece::Text(text) => {
                let mut segments = text.split('\n');
                if let Some(first) = segments.next() {
                    push_text(&mut current, first);
                }
                for segment in segments {
                    lines.push(RawLine::Pieces(std::mem::take(&mut current)));
                    push_text(&mut current, segment);
                }
            }
            Piece::Code(id) => current.push(Piece::Code(id)),
            Piece::Fence(id) => {
                if !current.is_empty() {
                    lines.push(RawLine::Pieces(std::mem::take(&mut current)));
                }
                lines.push(RawLine::Fence(id));
            }
        }
    }

    if !current.is_empty() {
        lines.push(RawLine::Pieces(current));
    }
    lines
}

fn push_text(line: &mut Vec<Piece>, text: &str) {
    if !text.is_empty() {
        line.push(Piece::Text(text.to_string()));
    }
}

fn is_blank(line: &[Piece]) -> bool {
    line.iter().all(|piece| match piece {
        Piece::Text(text) => text.trim().is_empty(),
        _ => false,
    })
}

/// Text at the very start of the line, before any code span.
fn leading_text(line: &[Piece]) -> &str {
    match line.first() {
        Some(Piece::Text(text)) => text,
        _ => "",
    }
}

/// Drop the first `len` bytes of the line's leading text.
fn strip_leading(line: &[Piece], len: usize) -> Vec<Piece> {
    let mut pieces = line.to_vec();
    if let Some(Piece::Text(text)) = pieces.first_mut() {
        text.replace_range(..len, "");
        if text.is_empty() {
            pieces.remove(0);
        }
    }
    pieces
}

/// Trim whitespace from the start of the first piece and the end of the last.
fn trim_pieces(mut pieces: Vec<Piece>) -> Vec<Piece> {
    if let Some(Piece::Text(text)) = pieces.first_mut() {
        *text = text.trim_start().to_string();
        if text.is_empty() {
            pieces.remove(0);
        }
    }
    trim_end_pieces(pieces)
}

fn trim_end_pieces(mut pieces: Vec<Piece>) -> Vec<Piece> {
    if let Some(Piece::Text(text)) = pieces.last_mut() {
        *text = text.trim_end().to_string();
        if text.is_empty() {
            pieces.pop();
        }
    }
    pieces
}

fn non_empty(pieces: Vec<Piece>) -> Option<Vec<Piece>> {
    (!pieces.is_empty()).then_some(pieces)
}
