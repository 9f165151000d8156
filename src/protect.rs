//! Protected-span extraction and restoration.
//!
//! Fenced code blocks and inline code spans are lifted out of the source
//! before any markdown rule runs. Their place in the text is taken by a
//! [`Piece`] carrying a [`SpanId`], an index into [`ProtectedSpans`]. The id
//! lives outside the character stream, so no input text can forge one.

use crate::ast::Node;

const FENCE: &str = "```";

/// Index into the side table of protected spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanId(usize);

/// One segment of placeholder-protected source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(String),
    Fence(SpanId),
    Code(SpanId),
}

#[derive(Debug, Clone, PartialEq)]
struct FencedBlock {
    language: Option<String>,
    literal: String,
}

/// Side table of everything lifted out by [`extract`], in discovery order.
#[derive(Debug, Default)]
pub struct ProtectedSpans {
    fences: Vec<FencedBlock>,
    codes: Vec<String>,
}

impl ProtectedSpans {
    pub fn fence_count(&self) -> usize {
        self.fences.len()
    }

    pub fn code_count(&self) -> usize {
        self.codes.len()
    }

    /// Turn a fence placeholder back into its code block node.
    pub fn restore_fence(&self, id: SpanId) -> Node {
        let block = &self.fences[id.0];
        Node::CodeBlock {
            language: block.language.clone(),
            literal: block.literal.clone(),
        }
    }

    /// Turn an inline code placeholder back into its code span node.
    pub fn restore_code(&self, id: SpanId) -> Node {
        Node::Code(self.code_literal(id).to_string())
    }

    pub fn code_literal(&self, id: SpanId) -> &str {
        &self.codes[id.0]
    }

    fn push_fence(&mut self, language: Option<String>, literal: String) -> SpanId {
        self.fences.push(FencedBlock { language, literal });
        SpanId(self.fences.len() - 1)
    }

    fn push_code(&mut self, literal: String) -> SpanId {
        self.codes.push(literal);
        SpanId(self.codes.len() - 1)
    }
}

/// Split `input` into text and protected pieces.
///
/// Fences are lifted first so a backtick inside a code block can never be
/// taken for an inline code delimiter.
pub fn extract(input: &str) -> (Vec<Piece>, ProtectedSpans) {
    let mut spans = ProtectedSpans::default();
    let mut pieces = Vec::new();

    for piece in extract_fences(input, &mut spans) {
        match piece {
            Piece::Text(text) => pieces.extend(extract_code_spans(&text, &mut spans)),
            other => pieces.push(other),
        }
    }

    tracing::debug!(
        fences = spans.fence_count(),
        inline_codes = spans.code_count(),
        pieces = pieces.len(),
        "extracted protected spans"
    );
    (pieces, spans)
}

fn extract_fences(input: &str, spans: &mut ProtectedSpans) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut text_start = 0;
    let mut search_from = 0;

    while let Some(offset) = input[search_from..].find(FENCE) {
        let open = search_from + offset;
        if !starts_line(input, open) {
            // Nothing later on this line can start a line either
            search_from = input[open..].find('\n').map_or(input.len(), |nl| open + nl + 1);
            continue;
        }

        let after_ticks = open + FENCE.len();
        let language_len = input[after_ticks..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(input.len() - after_ticks);
        let content_start = after_ticks + language_len;

        // An opening fence without a closing one stays literal text, and so
        // does every fence after it.
        let Some(close_offset) = input[content_start..].find(FENCE) else {
            break;
        };
        let close = content_start + close_offset;

        if text_start < open {
            pieces.push(Piece::Text(input[text_start..open].to_string()));
        }
        let language =
            (language_len > 0).then(|| input[after_ticks..content_start].to_string());
        let literal = trim_blank_lines(&input[content_start..close]).to_string();
        pieces.push(Piece::Fence(spans.push_fence(language, literal)));

        text_start = close + FENCE.len();
        search_from = text_start;
    }

    if text_start < input.len() {
        pieces.push(Piece::Text(input[text_start..].to_string()));
    }
    pieces
}

/// Whether `pos` is preceded only by horizontal whitespace on its line.
fn starts_line(input: &str, pos: usize) -> bool {
    let line_start = input[..pos].rfind('\n').map_or(0, |nl| nl + 1);
    input[line_start..pos].chars().all(|c| c == ' ' || c == '\t')
}

/// Drop leading whitespace-only lines and all trailing whitespace.
fn trim_blank_lines(content: &str) -> &str {
    let mut start = 0;
    for line in content.split_inclusive('\n') {
        if !line.ends_with('\n') || !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }
    content[start..].trim_end()
}

fn extract_code_spans(text: &str, spans: &mut ProtectedSpans) -> Vec<Piece> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < bytes.len() && bytes[j] != b'`' && bytes[j] != b'\n' {
            j += 1;
        }

        // Need a closing backtick on the same line with something in between
        if j < bytes.len() && bytes[j] == b'`' && j > i + 1 {
            if text_start < i {
                pieces.push(Piece::Text(text[text_start..i].to_string()));
            }
            let id = spans.push_code(text[i + 1..j].to_string());
            pieces.push(Piece::Code(id));
            i = j + 1;
            text_start = i;
        } else {
            i += 1;
        }
    }

    if text_start < text.len() {
        pieces.push(Piece::Text(text[text_start..].to_string()));
    }
    pieces
}
