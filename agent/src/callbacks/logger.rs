use crate::Result;
use crate::callbacks::Callback;
use crate::llm::Message;
use async_trait::async_trait;
use std::fmt::Write;

/// Emits the agent transcript as markdown, one `info` event per step, showing
/// only the messages added since the previous step unless the history was
/// rewritten.
pub struct MessageLogger {
    name: String,
    last_hashes: Vec<u64>,
    step: u32,
}

impl MessageLogger {
    pub fn new(name: &str) -> Box<Self> {
        Box::new(Self {
            name: name.to_string(),
            last_hashes: Vec::new(),
            step: 0,
        })
    }

    /// Renders the markdown for this step and advances to the next one.
    fn step_transcript(&mut self, messages: &[Message]) -> String {
        let new_hashes = messages.iter().map(Message::get_hash).collect::<Vec<_>>();

        let mut out = String::new();
        let shown = if new_hashes.len() < self.last_hashes.len()
            || self.prefix_match_len(&new_hashes) != self.last_hashes.len()
        {
            out.push_str("## [HISTORY CLEARED]\n\n");
            messages
        } else {
            &messages[self.last_hashes.len()..]
        };

        // writing to a String cannot fail
        let _ = writeln!(out, "### Step {}", self.step);
        for message in shown {
            let _ = write!(out, "{}", message);
        }
        out.push_str("---\n");

        self.step += 1;
        self.last_hashes = new_hashes;

        out
    }

    fn prefix_match_len(&self, new_hashes: &[u64]) -> usize {
        new_hashes
            .iter()
            .zip(self.last_hashes.iter())
            .take_while(|&(a, b)| *a == *b)
            .count()
    }
}

#[async_trait]
impl Callback for MessageLogger {
    async fn call(&mut self, messages: Vec<Message>) -> Result<Vec<Message>> {
        let step = self.step;
        let transcript = self.step_transcript(&messages);

        tracing::info!(agent = %self.name, step, "\n{}", transcript);

        Ok(messages)
    }
}
