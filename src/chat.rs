//! Chat records exchanged with the transport and kept in history.
//!
//! History is a caller-owned value: the renderer never reads or writes
//! storage, it is handed entries and returns HTML for them.

use serde::{Deserialize, Serialize};

use crate::ast::Node;
use crate::error::{Error, Result};
use crate::renderer::HtmlRenderer;

/// Shown in place of the text when a user sends only an image
const IMAGE_ONLY_HTML: &str = "<p><em>Sent an image</em></p>";

/// Body sent to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    pub user_id: String,
    /// Base64 image payload, without a data URL prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ChatRequest {
    /// A request needs either non-blank text or an attached image.
    pub fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() && self.image.is_none() {
            return Err(Error::EmptyMessage);
        }
        Ok(())
    }
}

/// Body returned by the chat endpoint. Only `response` is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatResponse {
    pub fn render(&self, renderer: &HtmlRenderer) -> String {
        crate::render_with(Some(self.response.as_str()), renderer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl HistoryEntry {
    /// Render this entry. Bot text is markdown; user text is shown verbatim.
    pub fn render(&self, renderer: &HtmlRenderer) -> String {
        match self.sender {
            Sender::Bot => crate::render_with(Some(self.text.as_str()), renderer),
            Sender::User if self.text.is_empty() && self.image.is_some() => {
                IMAGE_ONLY_HTML.to_string()
            }
            Sender::User => {
                renderer.render(&Node::Paragraph(vec![Node::Text(self.text.clone())]))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub sender: Sender,
    pub html: String,
}

/// Ordered chat transcript, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    entries: Vec<HistoryEntry>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a history stored as a JSON array of entries.
    pub fn from_json(json: &str) -> Result<Self> {
        let history: Self = serde_json::from_str(json)?;
        tracing::debug!(entries = history.len(), "loaded chat history");
        Ok(history)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn push_user(
        &mut self,
        text: impl Into<String>,
        image: Option<String>,
        timestamp: Option<String>,
    ) {
        self.entries.push(HistoryEntry {
            sender: Sender::User,
            text: text.into(),
            image,
            timestamp,
        });
    }

    pub fn push_bot(&mut self, text: impl Into<String>, timestamp: Option<String>) {
        self.entries.push(HistoryEntry {
            sender: Sender::Bot,
            text: text.into(),
            image: None,
            timestamp,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Render every entry in order, one renderer call per entry.
    pub fn render(&self, renderer: &HtmlRenderer) -> Vec<RenderedMessage> {
        self.entries
            .iter()
            .map(|entry| RenderedMessage {
                sender: entry.sender,
                html: entry.render(renderer),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(message: &str, image: Option<&str>) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            session_id: "chat_1_abc".to_string(),
            user_id: "me@example.com".to_string(),
            image: image.map(str::to_string),
        }
    }

    #[test]
    fn test_request_needs_text_or_image() {
        assert!(request("hi", None).validate().is_ok());
        assert!(request("", Some("aGk=")).validate().is_ok());
        assert!(matches!(
            request("   ", None).validate(),
            Err(Error::EmptyMessage)
        ));
    }

    #[test]
    fn test_request_omits_missing_image() {
        let json = serde_json::to_string(&request("hi", None)).unwrap();
        assert_eq!(
            json,
            r#"{"message":"hi","session_id":"chat_1_abc","user_id":"me@example.com"}"#
        );
    }

    #[test]
    fn test_response_renders_markdown() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"response":"**hi**","session_id":"s","timestamp":"2024-01-01T00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(
            response.render(&HtmlRenderer::new()),
            "<p><strong>hi</strong></p>"
        );
    }

    #[test]
    fn test_history_json_uses_type_field() {
        let json = r##"[
            {"type":"user","text":"hello"},
            {"type":"bot","text":"# Hi","timestamp":"2024-01-01T00:00:00Z"}
        ]"##;
        let history = ChatHistory::from_json(json).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].sender, Sender::User);
        assert_eq!(
            history.to_json().unwrap(),
            r##"[{"type":"user","text":"hello"},{"type":"bot","text":"# Hi","timestamp":"2024-01-01T00:00:00Z"}]"##
        );
    }

    #[test]
    fn test_invalid_history_is_an_error() {
        let err = ChatHistory::from_json(r#"[{"type":"robot","text":"x"}]"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_user_text_is_never_markdown() {
        let mut history = ChatHistory::new();
        history.push_user("**not bold** <script>", None, None);
        let rendered = history.render(&HtmlRenderer::new());
        assert_eq!(
            rendered,
            vec![RenderedMessage {
                sender: Sender::User,
                html: "<p>**not bold** &lt;script&gt;</p>".to_string(),
            }]
        );
    }

    #[test]
    fn test_image_only_message() {
        let mut history = ChatHistory::new();
        history.push_user("", Some("aGk=".to_string()), None);
        assert_eq!(
            history.render(&HtmlRenderer::new())[0].html,
            "<p><em>Sent an image</em></p>"
        );
    }

    #[test]
    fn test_render_keeps_order_and_clear_empties() {
        let mut history = ChatHistory::new();
        history.push_user("q", None, None);
        history.push_bot("- a\n- b", None);
        history.push_user("thanks", None, None);

        let rendered = history.render(&HtmlRenderer::new());
        let senders: Vec<Sender> = rendered.iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::User, Sender::Bot, Sender::User]);
        assert_eq!(rendered[1].html, "<ul><li>a</li><li>b</li></ul>");

        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_empty_bot_text_renders_nothing() {
        let mut history = ChatHistory::new();
        history.push_bot("", None);
        assert_eq!(history.render(&HtmlRenderer::new())[0].html, "");
    }
}
