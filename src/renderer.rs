//! HTML renderer for the chat markdown tree.

use crate::ast::Node;
use crate::config::RenderOptions;
use crate::escape::escape_html;

pub struct HtmlRenderer {
    options: RenderOptions,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::with_options(RenderOptions::default())
    }

    pub fn with_options(options: RenderOptions) -> Self {
        HtmlRenderer { options }
    }

    /// Render a node tree. Blocks are concatenated with no separator.
    pub fn render(&self, node: &Node) -> String {
        self.render_node(node)
    }

    fn render_children(&self, children: &[Node]) -> String {
        children.iter().map(|child| self.render_node(child)).collect()
    }

    fn render_node(&self, node: &Node) -> String {
        match node {
            Node::Document(children) => self.render_children(children),
            Node::Paragraph(children) => format!("<p>{}</p>", self.render_children(children)),
            Node::Heading { level, children } => {
                format!("<h{}>{}</h{}>", level, self.render_children(children), level)
            }
            Node::CodeBlock { language, literal } => {
                let code_open = match language {
                    Some(language) => format!(
                        "<code class=\"{}{}\">",
                        escape_html(&self.options.language_class_prefix),
                        escape_html(language)
                    ),
                    None => "<code>".to_string(),
                };
                format!(
                    "<div class=\"{}\"><pre>{}{}</code></pre></div>",
                    escape_html(&self.options.code_block_class),
                    code_open,
                    escape_html(literal)
                )
            }
            Node::BlockQuote(children) => {
                format!("<blockquote>{}</blockquote>", self.render_children(children))
            }
            Node::UnorderedList(children) => format!("<ul>{}</ul>", self.render_children(children)),
            Node::OrderedList(children) => format!("<ol>{}</ol>", self.render_children(children)),
            Node::ListItem(children) => format!("<li>{}</li>", self.render_children(children)),
            Node::Text(text) => escape_html(text),
            Node::Code(code) => format!(
                "<code class=\"{}\">{}</code>",
                escape_html(&self.options.inline_code_class),
                escape_html(code)
            ),
            Node::Emphasis(children) => format!("<em>{}</em>", self.render_children(children)),
            Node::Strong(children) => {
                format!("<strong>{}</strong>", self.render_children(children))
            }
            Node::Link {
                destination,
                children,
            } => {
                let isolation = if self.options.links_in_new_tab {
                    " target=\"_blank\" rel=\"noopener noreferrer\""
                } else {
                    ""
                };
                format!(
                    "<a href=\"{}\"{}>{}</a>",
                    escape_html(destination),
                    isolation,
                    self.render_children(children)
                )
            }
            Node::LineBreak => "<br>".to_string(),
        }
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}
