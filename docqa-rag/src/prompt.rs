//! Prompt assembly for answer generation.
//!
//! A [`Prompt`] keeps its parts separate (system instruction with the
//! document context, replayed history, the new question) so chat backends
//! can send them as messages, while [`Prompt::render`] flattens them for
//! backends that take one string.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::document::Chunk;
use crate::session::Turn;

/// The exact reply requested for questions unrelated to the document.
pub const OUT_OF_CONTEXT: &str = "Out of context";

/// Context placeholder used when retrieval found nothing.
pub const NO_CONTEXT: &str = "(no document context is available)";

/// Author of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions to the model.
    System,
    /// The person asking.
    User,
    /// Earlier model output.
    Assistant,
}

impl Role {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// A fully assembled request for a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Instruction fragment, including any document context.
    pub system: String,
    /// Replayed conversation, oldest first, alternating user/assistant.
    pub history: Vec<Message>,
    /// The new question.
    pub question: String,
}

impl Prompt {
    /// All parts as chat messages: system, history, then the question.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(Message::new(Role::System, self.system.clone()));
        messages.extend(self.history.iter().cloned());
        messages.push(Message::new(Role::User, self.question.clone()));
        messages
    }

    /// All parts as a single string, one `role: content` block per message.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for message in self.messages() {
            let _ = write!(out, "{}: {}\n\n", message.role.as_str(), message.content);
        }
        out.truncate(out.trim_end().len());
        out
    }
}

fn history_messages(history: &[Turn]) -> Vec<Message> {
    history
        .iter()
        .flat_map(|turn| {
            [
                Message::new(Role::User, turn.question.clone()),
                Message::new(Role::Assistant, turn.answer.clone()),
            ]
        })
        .collect()
}

/// Build the prompt that answers `question` from `chunks`.
///
/// The instruction restricts the answer to the supplied context, caps it at
/// `max_sentences` sentences, and asks for [`OUT_OF_CONTEXT`] when the
/// question is unrelated to the document.
pub fn answer_prompt(
    question: &str,
    chunks: &[Chunk],
    history: &[Turn],
    max_sentences: usize,
) -> Prompt {
    let context = if chunks.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        chunks.iter().map(|c| c.text.trim()).collect::<Vec<_>>().join("\n\n")
    };
    let sentence_word = if max_sentences == 1 { "sentence" } else { "sentences" };

    let system = format!(
        "You are a helpful assistant answering questions only based on the provided document. \
         Use only the context below; do not rely on outside knowledge. \
         Keep every answer to at most {max_sentences} {sentence_word}. \
         If the question is unrelated to the document, respond only with: '{OUT_OF_CONTEXT}'.\n\
         \nContext:\n{context}"
    );

    Prompt { system, history: history_messages(history), question: question.to_string() }
}

/// Build the prompt that rewrites a follow-up into a standalone question.
pub fn condense_prompt(question: &str, history: &[Turn]) -> Prompt {
    let system = "Given a chat history and the latest user question which might reference \
                  context in the chat history, formulate a standalone question which can be \
                  understood without the chat history. Do NOT answer the question, just \
                  reformulate it if needed and otherwise return it as is."
        .to_string();

    Prompt { system, history: history_messages(history), question: question.to_string() }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            id: "d_0".into(),
            document_id: "d".into(),
            index: 0,
            text: text.into(),
            start: 0,
            end: text.chars().count(),
            metadata: HashMap::new(),
        }
    }

    fn turn(question: &str, answer: &str) -> Turn {
        Turn {
            seq: 1,
            question: question.into(),
            answer: answer.into(),
            grounded: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn answer_prompt_includes_context_limit_and_question() {
        let prompt = answer_prompt(
            "What is the refund window?",
            &[chunk("Refunds within 30 days."), chunk("Ship in 2 days.")],
            &[],
            3,
        );

        assert!(prompt.system.contains("at most 3 sentences"));
        assert!(prompt.system.contains("Refunds within 30 days.\n\nShip in 2 days."));
        assert!(prompt.system.contains(OUT_OF_CONTEXT));
        assert_eq!(prompt.question, "What is the refund window?");
    }

    #[test]
    fn empty_retrieval_uses_placeholder() {
        let prompt = answer_prompt("q", &[], &[], 1);
        assert!(prompt.system.contains(NO_CONTEXT));
        assert!(prompt.system.contains("at most 1 sentence."));
    }

    #[test]
    fn history_becomes_alternating_messages() {
        let prompt = answer_prompt("q2", &[], &[turn("q1", "a1")], 3);
        let roles: Vec<Role> = prompt.messages().iter().map(|m| m.role).collect();

        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(prompt.messages()[2].content, "a1");
    }

    #[test]
    fn render_flattens_messages() {
        let prompt = condense_prompt("and then?", &[turn("q1", "a1")]);
        let rendered = prompt.render();

        assert!(rendered.starts_with("system: Given a chat history"));
        assert!(rendered.contains("user: q1\n\nassistant: a1\n\nuser: and then?"));
        assert!(rendered.ends_with("and then?"));
    }
}
