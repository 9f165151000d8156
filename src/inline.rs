//! Inline transforms: bold, italic and links.
//!
//! A block's content is flattened into a token stream where inline code
//! spans are opaque atoms. Each pass rewrites the stream by folding matched
//! runs into a single span token, so later passes see the earlier result as
//! one atom and cannot reinterpret its delimiters.

use crate::ast::Node;
use crate::protect::{Piece, ProtectedSpans, SpanId};

/// URL schemes that are never turned into anchors
const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Char(char),
    Code(SpanId),
    Span(Span),
}

#[derive(Debug, Clone, PartialEq)]
struct Span {
    kind: SpanKind,
    children: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq)]
enum SpanKind {
    Strong(char),
    Emphasis(char),
    Link(String),
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    /// `marker` repeated `width` times on each side, no marker or newline inside
    Delimited { marker: char, width: usize },
    /// `[label](url)`
    Link,
}

/// Evaluation order matters: bold before italic so `**x**` is never read as
/// two empty emphases, and links last so their labels may carry emphasis.
const PASSES: [Pass; 5] = [
    Pass::Delimited { marker: '*', width: 2 },
    Pass::Delimited { marker: '_', width: 2 },
    Pass::Delimited { marker: '*', width: 1 },
    Pass::Delimited { marker: '_', width: 1 },
    Pass::Link,
];

/// A matched run, as absolute token indices.
struct Match {
    start: usize,
    content_start: usize,
    content_end: usize,
    end: usize,
    kind: SpanKind,
}

/// Token positions of one `[label](url)` run: the opening `[`, the `]`, and
/// the closing `)`.
#[derive(Debug, Clone, Copy)]
struct LinkShape {
    start: usize,
    label_end: usize,
    url_end: usize,
}

impl LinkShape {
    fn url_start(&self) -> usize {
        self.label_end + 2
    }

    fn end(&self) -> usize {
        self.url_end + 1
    }

    /// A delimited run may sit inside the label, inside the URL, or wrap the
    /// whole link. Anything else would tear the link apart.
    fn is_crossed_by(&self, start: usize, end: usize) -> bool {
        let overlaps = start < self.end() && self.start < end;
        let wraps = start <= self.start && self.end() <= end;
        let in_label = self.start < start && end <= self.label_end;
        let in_url = self.url_start() <= start && end <= self.url_end;
        overlaps && !(wraps || in_label || in_url)
    }
}

/// Parse the inline content of one block into nodes.
///
/// Newlines inside the content become [`Node::LineBreak`]; code span
/// placeholders are restored from `spans`.
pub fn parse_inline(pieces: &[Piece], spans: &ProtectedSpans) -> Vec<Node> {
    let tokens = tokenize(pieces);
    let tokens = PASSES
        .iter()
        .fold(tokens, |tokens, pass| apply(*pass, tokens, spans));
    into_nodes(tokens, spans)
}

fn tokenize(pieces: &[Piece]) -> Vec<Token> {
    let mut tokens = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Text(text) => tokens.extend(text.chars().map(Token::Char)),
            Piece::Code(id) => tokens.push(Token::Code(*id)),
            // Fences are split into their own blocks before inline parsing
            Piece::Fence(_) => {}
        }
    }
    tokens
}

fn apply(pass: Pass, tokens: Vec<Token>, spans: &ProtectedSpans) -> Vec<Token> {
    let matches = match pass {
        Pass::Delimited { marker, width } => delimited_matches(&tokens, marker, width),
        Pass::Link => link_matches(&tokens, spans),
    };

    fold_matches(tokens, matches)
        .into_iter()
        .map(|token| match token {
            Token::Span(span) => Token::Span(Span {
                kind: span.kind,
                children: apply(pass, span.children, spans),
            }),
            other => other,
        })
        .collect()
}

/// Replace every matched run, in order and non-overlapping, with a span.
fn fold_matches(tokens: Vec<Token>, matches: Vec<Match>) -> Vec<Token> {
    if matches.is_empty() {
        return tokens;
    }

    let mut out = Vec::with_capacity(tokens.len());
    let mut rest = tokens.into_iter();
    let mut pos = 0;
    for m in matches {
        out.extend(rest.by_ref().take(m.start - pos));
        rest.by_ref().take(m.content_start - m.start).for_each(drop);
        let children = rest.by_ref().take(m.content_end - m.content_start).collect();
        rest.by_ref().take(m.end - m.content_end).for_each(drop);
        out.push(Token::Span(Span {
            kind: m.kind,
            children,
        }));
        pos = m.end;
    }
    out.extend(rest);
    out
}

fn is_char(token: Option<&Token>, c: char) -> bool {
    matches!(token, Some(Token::Char(t)) if *t == c)
}

fn is_run(tokens: &[Token], start: usize, marker: char, width: usize) -> bool {
    (start..start + width).all(|i| is_char(tokens.get(i), marker))
}

/// Scan left to right for `marker` runs. A candidate never tears a link
/// apart; one that would is left as literal text.
fn delimited_matches(tokens: &[Token], marker: char, width: usize) -> Vec<Match> {
    let links = find_links(tokens, |link| Some(*link));
    let mut matches = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match match_delimited(tokens, i, marker, width) {
            Some(m) if !crosses_link(&links, m.start, m.end) => {
                i = m.end;
                matches.push(m);
            }
            _ => i += 1,
        }
    }
    matches
}

fn crosses_link(links: &[LinkShape], start: usize, end: usize) -> bool {
    let first = links.partition_point(|link| link.end() <= start);
    links[first..]
        .iter()
        .take_while(|link| link.start < end)
        .any(|link| link.is_crossed_by(start, end))
}

fn match_delimited(tokens: &[Token], start: usize, marker: char, width: usize) -> Option<Match> {
    if !is_run(tokens, start, marker, width) {
        return None;
    }

    // The scan stops at the next marker, so each token is visited by at most
    // one candidate per pass.
    let content_start = start + width;
    let mut j = content_start;
    while j < tokens.len() && !is_char(tokens.get(j), marker) && !is_char(tokens.get(j), '\n') {
        j += 1;
    }

    if j == content_start || !is_run(tokens, j, marker, width) {
        return None;
    }

    let kind = if width == 2 {
        SpanKind::Strong(marker)
    } else {
        SpanKind::Emphasis(marker)
    };
    Some(Match {
        start,
        content_start,
        content_end: j,
        end: j + width,
        kind,
    })
}

fn link_matches(tokens: &[Token], spans: &ProtectedSpans) -> Vec<Match> {
    find_links(tokens, |link| {
        let url = &tokens[link.url_start()..link.url_end];
        if is_blocked_destination(url, spans) {
            return None;
        }
        // Emphasis passes may already have folded parts of the URL, such as
        // `_name_` in a path, so read it back as source text.
        Some(Match {
            start: link.start,
            content_start: link.start + 1,
            content_end: link.label_end,
            end: link.end(),
            kind: SpanKind::Link(source_text(url, spans)),
        })
    })
}

/// Find `[label](url)` runs left to right, keeping those `accept` maps to a
/// value. Neither part may be empty or contain a newline.
///
/// Closers are looked up in tables built once per call, and a `]` whose link
/// was refused is not offered again, so the scan is linear.
fn find_links<T, F>(tokens: &[Token], mut accept: F) -> Vec<T>
where
    F: FnMut(&LinkShape) -> Option<T>,
{
    let next_bracket = next_stop(tokens, ']');
    let next_paren = next_stop(tokens, ')');
    let mut found = Vec::new();
    let mut refused_label_end = None;
    let mut i = 0;

    while i < tokens.len() {
        let shape = link_at(tokens, i, &next_bracket, &next_paren)
            .filter(|link| refused_label_end != Some(link.label_end));
        if let Some(link) = shape {
            if let Some(value) = accept(&link) {
                found.push(value);
                i = link.end();
                continue;
            }
            refused_label_end = Some(link.label_end);
        }
        i += 1;
    }
    found
}

fn link_at(
    tokens: &[Token],
    start: usize,
    next_bracket: &[usize],
    next_paren: &[usize],
) -> Option<LinkShape> {
    if !is_char(tokens.get(start), '[') {
        return None;
    }

    let label_end = next_bracket[start + 1];
    if label_end == start + 1
        || !is_char(tokens.get(label_end), ']')
        || !is_char(tokens.get(label_end + 1), '(')
    {
        return None;
    }

    let url_start = label_end + 2;
    let url_end = next_paren[url_start];
    if url_end == url_start || !is_char(tokens.get(url_end), ')') {
        return None;
    }

    Some(LinkShape {
        start,
        label_end,
        url_end,
    })
}

/// For every index, the first position at or after it holding `stop` or a
/// newline, or `tokens.len()` if there is none. One extra slot covers the
/// end of the stream.
fn next_stop(tokens: &[Token], stop: char) -> Vec<usize> {
    let mut next = vec![tokens.len(); tokens.len() + 1];
    for i in (0..tokens.len()).rev() {
        next[i] = if is_char(tokens.get(i), stop) || is_char(tokens.get(i), '\n') {
            i
        } else {
            next[i + 1]
        };
    }
    next
}

/// Whether the URL starts with a scheme that must never become an anchor.
/// Whitespace and control characters are ignored, and only enough of the
/// URL to cover the longest scheme is read.
fn is_blocked_destination(url: &[Token], spans: &ProtectedSpans) -> bool {
    let longest = BLOCKED_SCHEMES.iter().map(|scheme| scheme.len()).max().unwrap_or(0);
    let mut prefix = String::new();
    for token in url {
        if prefix.len() >= longest {
            break;
        }
        let text = source_text(std::slice::from_ref(token), spans);
        prefix.extend(
            text.chars()
                .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control()),
        );
    }
    let prefix = prefix.to_ascii_lowercase();
    BLOCKED_SCHEMES
        .iter()
        .any(|scheme| prefix.starts_with(scheme))
}

/// Reconstruct the markdown a token run was parsed from.
fn source_text(tokens: &[Token], spans: &ProtectedSpans) -> String {
    let mut text = String::new();
    for token in tokens {
        match token {
            Token::Char(c) => text.push(*c),
            Token::Code(id) => {
                text.push('`');
                text.push_str(spans.code_literal(*id));
                text.push('`');
            }
            Token::Span(span) => {
                let inner = source_text(&span.children, spans);
                match &span.kind {
                    SpanKind::Strong(marker) => {
                        let delimiter = marker.to_string().repeat(2);
                        text.push_str(&delimiter);
                        text.push_str(&inner);
                        text.push_str(&delimiter);
                    }
                    SpanKind::Emphasis(marker) => {
                        text.push(*marker);
                        text.push_str(&inner);
                        text.push(*marker);
                    }
                    SpanKind::Link(destination) => {
                        text.push('[');
                        text.push_str(&inner);
                        text.push_str("](");
                        text.push_str(destination);
                        text.push(')');
                    }
                }
            }
        }
    }
    text
}

fn into_nodes(tokens: Vec<Token>, spans: &ProtectedSpans) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut text = String::new();

    for token in tokens {
        let node = match token {
            Token::Char('\n') => Node::LineBreak,
            Token::Char(c) => {
                text.push(c);
                continue;
            }
            Token::Code(id) => spans.restore_code(id),
            Token::Span(span) => {
                let children = into_nodes(span.children, spans);
                match span.kind {
                    SpanKind::Strong(_) => Node::Strong(children),
                    SpanKind::Emphasis(_) => Node::Emphasis(children),
                    SpanKind::Link(destination) => Node::Link {
                        destination,
                        children,
                    },
                }
            }
        };
        if !text.is_empty() {
            nodes.push(Node::Text(std::mem::take(&mut text)));
        }
        nodes.push(node);
    }

    if !text.is_empty() {
        nodes.push(Node::Text(text));
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protect::extract;
    use pretty_assertions::assert_eq;

    fn inline(source: &str) -> Vec<Node> {
        let (pieces, spans) = extract(source);
        parse_inline(&pieces, &spans)
    }

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(inline("just words"), vec![text("just words")]);
    }

    #[test]
    fn test_bold_is_one_strong_node() {
        assert_eq!(inline("**bold**"), vec![Node::Strong(vec![text("bold")])]);
        assert_eq!(inline("__bold__"), vec![Node::Strong(vec![text("bold")])]);
    }

    #[test]
    fn test_italic() {
        assert_eq!(
            inline("an *em* and _em_"),
            vec![
                text("an "),
                Node::Emphasis(vec![text("em")]),
                text(" and "),
                Node::Emphasis(vec![text("em")]),
            ]
        );
    }

    #[test]
    fn test_italic_may_wrap_bold() {
        assert_eq!(
            inline("*a **b** c*"),
            vec![Node::Emphasis(vec![
                text("a "),
                Node::Strong(vec![text("b")]),
                text(" c"),
            ])]
        );
    }

    #[test]
    fn test_underscore_italic_inside_star_bold() {
        assert_eq!(
            inline("**a _b_ c**"),
            vec![Node::Strong(vec![
                text("a "),
                Node::Emphasis(vec![text("b")]),
                text(" c"),
            ])]
        );
    }

    #[test]
    fn test_unmatched_markers_stay_literal() {
        assert_eq!(inline("**open and half"), vec![text("**open and half")]);
        assert_eq!(inline("a * b"), vec![text("a * b")]);
    }

    #[test]
    fn test_emphasis_cannot_cross_newline() {
        assert_eq!(
            inline("*a\nb*"),
            vec![text("*a"), Node::LineBreak, text("b*")]
        );
    }

    #[test]
    fn test_bold_may_contain_code() {
        assert_eq!(
            inline("**see `x*y`**"),
            vec![Node::Strong(vec![text("see "), Node::Code("x*y".to_string())])]
        );
    }

    #[test]
    fn test_link() {
        assert_eq!(
            inline("go [home](https://example.com) now"),
            vec![
                text("go "),
                Node::Link {
                    destination: "https://example.com".to_string(),
                    children: vec![text("home")],
                },
                text(" now"),
            ]
        );
    }

    #[test]
    fn test_link_label_keeps_emphasis() {
        assert_eq!(
            inline("[**docs**](/d)"),
            vec![Node::Link {
                destination: "/d".to_string(),
                children: vec![Node::Strong(vec![text("docs")])],
            }]
        );
    }

    #[test]
    fn test_link_url_survives_underscores() {
        assert_eq!(
            inline("[page](https://x.org/some_page_name)"),
            vec![Node::Link {
                destination: "https://x.org/some_page_name".to_string(),
                children: vec![text("page")],
            }]
        );
    }

    #[test]
    fn test_underscores_in_label_and_url_keep_link() {
        assert_eq!(
            inline("[my_file docs](https://x.com/my_file)"),
            vec![Node::Link {
                destination: "https://x.com/my_file".to_string(),
                children: vec![text("my_file docs")],
            }]
        );
    }

    #[test]
    fn test_emphasis_cannot_leave_link_url() {
        assert_eq!(
            inline("[a](http://x.com/a*b) and *c*"),
            vec![
                Node::Link {
                    destination: "http://x.com/a*b".to_string(),
                    children: vec![text("a")],
                },
                text(" and "),
                Node::Emphasis(vec![text("c")]),
            ]
        );
    }

    #[test]
    fn test_emphasis_may_wrap_whole_link() {
        assert_eq!(
            inline("*see [docs](/d)*"),
            vec![Node::Emphasis(vec![
                text("see "),
                Node::Link {
                    destination: "/d".to_string(),
                    children: vec![text("docs")],
                },
            ])]
        );
    }

    #[test]
    fn test_unclosed_brackets_stay_literal() {
        let source = "[".repeat(2_000);
        assert_eq!(inline(&source), vec![text(&source)]);
        let source = format!("{})", "[a](javascript:".repeat(500));
        assert_eq!(inline(&source), vec![text(&source)]);
    }

    #[test]
    fn test_script_link_stays_text() {
        assert_eq!(
            inline("[click](javascript:alert(1))"),
            vec![text("[click](javascript:alert(1))")]
        );
        assert_eq!(
            inline("[x](  JavaScript:void)"),
            vec![text("[x](  JavaScript:void)")]
        );
    }

    #[test]
    fn test_incomplete_link_is_literal() {
        assert_eq!(inline("[label] (url)"), vec![text("[label] (url)")]);
        assert_eq!(inline("[](url)"), vec![text("[](url)")]);
    }
}
