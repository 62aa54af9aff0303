//! Message and Conversation domain types.
//!
//! These are the value objects that flow through a single chat request:
//! the browser sends its history → the loop seeds a conversation → tool
//! exchanges are appended → each round sends the whole conversation upstream.

use serde::{Deserialize, Serialize};

use crate::tool::{ToolInvocation, ToolResult};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A single text message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// One entry of the working conversation sent upstream as `input`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationItem {
    Message(Message),
    ToolInvocation(ToolInvocation),
    ToolResult(ToolResult),
}

/// The ordered, request-local conversation.
///
/// Owned by exactly one loop run. Tool records can only be appended as an
/// invocation immediately followed by its result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    items: Vec<ConversationItem>,
}

impl Conversation {
    /// Seed a conversation with a system preamble followed by the client history.
    pub fn seeded(preamble: impl Into<String>, history: impl IntoIterator<Item = Message>) -> Self {
        let mut items = vec![ConversationItem::Message(Message::system(preamble))];
        items.extend(history.into_iter().map(ConversationItem::Message));
        Self { items }
    }

    /// Append a tool invocation and the result it produced, in that order.
    pub fn push_tool_exchange(&mut self, invocation: ToolInvocation, result: ToolResult) {
        self.items.push(ConversationItem::ToolInvocation(invocation));
        self.items.push(ConversationItem::ToolResult(result));
    }

    pub fn items(&self) -> &[ConversationItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of tool exchanges recorded so far.
    pub fn tool_exchanges(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, ConversationItem::ToolResult(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
    }

    #[test]
    fn seeded_conversation_starts_with_preamble() {
        let conv = Conversation::seeded(
            "You summarize news.",
            vec![Message::user("hi"), Message::assistant("hello")],
        );
        assert_eq!(conv.len(), 3);
        match &conv.items()[0] {
            ConversationItem::Message(m) => {
                assert_eq!(m.role, Role::System);
                assert_eq!(m.content, "You summarize news.");
            }
            other => panic!("expected system message, got {other:?}"),
        }
    }

    #[test]
    fn tool_exchange_keeps_result_after_invocation() {
        let mut conv = Conversation::seeded("sys", vec![Message::user("read this")]);
        let inv = ToolInvocation::new("call_1", "fetch_article", r#"{"url":"https://a.b"}"#);
        conv.push_tool_exchange(inv, ToolResult::success("call_1", "{}"));

        let items = conv.items();
        assert!(matches!(&items[2], ConversationItem::ToolInvocation(i) if i.call_id == "call_1"));
        assert!(matches!(&items[3], ConversationItem::ToolResult(r) if r.invocation_id == "call_1"));
        assert_eq!(conv.tool_exchanges(), 1);
    }

    #[test]
    fn role_deserializes_lowercase() {
        let msg: Message = serde_json::from_str(r#"{"role":"assistant","content":"x"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert!(serde_json::from_str::<Message>(r#"{"role":"tool","content":"x"}"#).is_err());
    }
}
