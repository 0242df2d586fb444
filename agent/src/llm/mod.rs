use crate::Result;
use crate::tools::{ToolCall, ToolDefinition};
use async_trait::async_trait;
use std::hash::{DefaultHasher, Hash, Hasher};

mod openai;
pub use openai::OpenAI;

#[derive(Clone, Debug, Hash)]
pub enum Message {
    User(String),
    Assistant(String, Vec<ToolCall>),
    System(String),
    Tool {
        id: String,
        name: String,
        result: String,
    },
}

impl Message {
    /// Rough token estimate, about four characters per token.
    pub fn ntokens(&self) -> usize {
        let chars = match self {
            Message::User(content) | Message::System(content) => content.len(),
            Message::Assistant(content, tool_calls) => {
                content.len() + tool_calls.iter().map(|c| c.args.len()).sum::<usize>()
            }
            Message::Tool { result, .. } => result.len(),
        };
        chars.div_ceil(4)
    }

    pub fn get_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::User(content) => writeln!(f, "**User**\n\n{}\n", content),
            Message::System(content) => writeln!(f, "**System**\n\n{}\n", content),
            Message::Assistant(content, tool_calls) => {
                writeln!(f, "**Assistant**\n\n{}\n", content)?;
                for call in tool_calls {
                    writeln!(f, "{}", call)?;
                }
                Ok(())
            }
            Message::Tool { id, name, result } => {
                writeln!(f, "**Tool** {} ({})\n\n{}\n", name, id, result)
            }
        }
    }
}

pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
}

pub struct CompletionResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait LLM {
    async fn completion<'a>(&self, request: CompletionRequest<'a>) -> Result<CompletionResponse>;
}

#[cfg(test)]
mod tests {
    use super::Message;
    use crate::tools::ToolCall;

    #[test]
    fn test_ntokens() {
        assert_eq!(Message::User(String::new()).ntokens(), 0);
        assert_eq!(Message::User("abcd".to_string()).ntokens(), 1);
        assert_eq!(Message::System("abcde".to_string()).ntokens(), 2);
        assert_eq!(
            Message::Assistant(
                "abcd".to_string(),
                vec![ToolCall {
                    id: "1".to_string(),
                    name: "search".to_string(),
                    args: "{\"q\":1}".to_string(),
                }]
            )
            .ntokens(),
            3
        );
    }

    #[test]
    fn test_hash_distinguishes_messages() {
        let a = Message::User("a".to_string());
        let b = Message::Assistant("a".to_string(), vec![]);
        assert_eq!(a.get_hash(), a.clone().get_hash());
        assert_ne!(a.get_hash(), b.get_hash());
    }
}
