use crate::callbacks;
use crate::llm::{self, Message};
use crate::tools::{self, SharedTool};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub trait StopCondition {
    fn done(&self, history: &[llm::Message]) -> bool;
}

type Callback = Box<dyn callbacks::Callback + Send>;

pub struct Agent {
    llm: Arc<dyn llm::LLM + Send + Sync>,
    tools: HashMap<String, SharedTool>,
    callbacks: Vec<Callback>,
    tool_defs: Vec<tools::ToolDefinition>,
    stop_condition: Box<dyn StopCondition + Send>,
    max_iterations: Option<usize>,
}

impl Agent {
    fn tool(&self, tool_call: &tools::ToolCall) -> Result<SharedTool> {
        self.tools
            .get(&tool_call.name)
            .cloned()
            .ok_or(Error::ToolDoesNotExist(tool_call.name.clone()))
    }

    pub async fn run(&mut self, mut messages: Vec<llm::Message>) -> Result<Vec<Message>> {
        let mut iterations = 0;

        while !self.stop_condition.done(&messages) {
            if let Some(max) = self.max_iterations {
                if iterations >= max {
                    return Err(Error::MaxIterations(max));
                }
            }
            iterations += 1;

            let next = self
                .llm
                .completion(llm::CompletionRequest {
                    messages: &messages,
                    tools: &self.tool_defs,
                })
                .await?;

            messages.push(llm::Message::Assistant(
                next.content,
                next.tool_calls.clone(),
            ));

            for tool_call in &next.tool_calls {
                let tool = self.tool(tool_call);
                let result = match tool {
                    Ok(tool) => {
                        tracing::debug!(
                            tool = %tool_call.name,
                            id = %tool_call.id,
                            "invoking tool"
                        );
                        tool.invoke(tool_call, messages.clone()).await
                    }
                    Err(err) => Err(err),
                };

                messages = match result {
                    Ok(messages) => messages,
                    // the model picked a tool it does not have or sent bad arguments
                    Err(err @ (Error::ToolDoesNotExist(_) | Error::JsonError(_))) => {
                        tracing::warn!(tool = %tool_call.name, error = %err, "tool call rejected");
                        messages.push(tool_error(tool_call, &err));
                        messages
                    }
                    Err(err) => return Err(err),
                };
            }

            for callback in &mut self.callbacks {
                messages = callback.call(messages).await?;
            }
        }

        Ok(messages)
    }
}

fn tool_error(tool_call: &tools::ToolCall, err: &Error) -> Message {
    Message::Tool {
        id: tool_call.id.clone(),
        name: tool_call.name.clone(),
        result: format!("Error: {}", err),
    }
}

#[derive(Default)]
pub struct AgentBuilder {
    llm: Option<Arc<dyn llm::LLM + Send + Sync>>,
    tools: Vec<SharedTool>,
    callbacks: Vec<Callback>,
    stop_condition: Option<Box<dyn StopCondition + Send>>,
    max_iterations: Option<usize>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn llm(mut self, llm: Arc<dyn llm::LLM + Send + Sync>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn tool(mut self, tool: SharedTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: Vec<SharedTool>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn callback(mut self, callback: Callback) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn stop_condition(mut self, cond: Box<dyn StopCondition + Send>) -> Self {
        self.stop_condition = Some(cond);
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let mut tool_defs = Vec::new();
        let mut tools = HashMap::new();

        for tool in self.tools {
            let def = tool.definition()?;
            tools.insert(def.name.clone(), tool);
            tool_defs.push(def);
        }

        Ok(Agent {
            llm: self
                .llm
                .ok_or(Error::MissingArg("llm is required for agent".to_string()))?,
            tools,
            tool_defs,
            callbacks: self.callbacks,
            stop_condition: self.stop_condition.ok_or(Error::MissingArg(
                "stop_condition is required for agent".to_string(),
            ))?,
            max_iterations: self.max_iterations,
        })
    }
}
