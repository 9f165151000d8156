//! Lightweight markdown-to-HTML renderer for chat messages.
//!
//! Code is protected first, then block and inline rules run over the rest,
//! and every piece of literal text is HTML-escaped on the way out.

pub mod ast;
pub mod chat;
pub mod config;
pub mod error;
pub mod escape;
pub mod inline;
pub mod parser;
pub mod protect;
pub mod renderer;

pub use config::{Config, RenderOptions};
pub use error::{Error, Result};
pub use escape::escape_html;

use parser::Parser;
use renderer::HtmlRenderer;

/// Parse markdown text and render to HTML with the default markup.
pub fn markdown_to_html(markdown: &str) -> String {
    render(Some(markdown))
}

/// Render a message body that may be absent. Absent or empty input gives an
/// empty string; no input makes this fail.
pub fn render(message: Option<&str>) -> String {
    render_with(message, &HtmlRenderer::new())
}

/// Like [`render`], with a configured renderer.
pub fn render_with(message: Option<&str>, renderer: &HtmlRenderer) -> String {
    match message {
        None | Some("") => String::new(),
        Some(markdown) => {
            let ast = Parser::new().parse(markdown);
            renderer.render(&ast)
        }
    }
}
