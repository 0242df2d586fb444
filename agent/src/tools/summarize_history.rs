use crate::Result;
use crate::llm::{CompletionRequest, LLM, Message};
use std::sync::Arc;

/// Compresses everything between the task prompt and the last `keep_last`
/// messages into a single assistant summary.
pub struct SummarizeHistory {
    llm: Arc<dyn LLM + Send + Sync>,
    keep_last: usize,
    max_tokens: usize,
}

impl SummarizeHistory {
    pub fn new(llm: Arc<dyn LLM + Send + Sync>, keep_last: usize, max_tokens: usize) -> Box<Self> {
        Box::new(Self {
            llm,
            keep_last,
            max_tokens,
        })
    }

    pub fn over_limit(&self, messages: &[Message]) -> bool {
        messages.iter().map(Message::ntokens).sum::<usize>() > self.max_tokens
    }

    pub async fn summarize_history(&self, mut messages: Vec<Message>) -> Result<Vec<Message>> {
        // the first two messages are the system and user prompt which hold the task instructions
        if messages.len() <= 2 + self.keep_last {
            return Ok(messages);
        }

        let cut = tool_group_start(&messages, messages.len() - self.keep_last);
        if cut <= 2 {
            return Ok(messages);
        }

        tracing::info!(
            messages = messages.len(),
            kept = messages.len() - cut,
            "summarizing agent history"
        );

        let last_messages = messages.split_off(cut);

        messages.push(Message::User(PROMPT.to_string()));

        let result = self
            .llm
            .completion(CompletionRequest {
                messages: &messages,
                tools: &[],
            })
            .await?;

        messages.truncate(2);
        messages.push(Message::Assistant(result.content, vec![]));
        messages.extend(last_messages);

        Ok(messages)
    }
}

/// Moves `cut` back so an assistant message and the tool results answering it
/// stay on the same side.
fn tool_group_start(messages: &[Message], mut cut: usize) -> usize {
    while cut > 0 && matches!(messages[cut], Message::Tool { .. }) {
        cut -= 1;
    }
    cut
}

const PROMPT: &str = "In order to keep the conversational history from becoming too long, you must generate a summary of the current chat history.
Instructions:
- The summary must compress the information, be as succinct as possible. The final summary should not be more than 1000 words in length.
- Preserve key information from the conversational history, in particular any figures found for the companies and metrics under study.
- Keep the source of every figure next to it so it can be verified later.";
