use crate::crew::FinalAnswer;
use crate::llm::{LLM, Message};
use crate::tools::SharedTool;
use crate::{AgentBuilder, Error, Result};
use std::sync::Arc;

pub const DEFAULT_MAX_ITER: usize = 25;

/// A persona the crew can hand work to. Immutable once built.
pub struct Role {
    name: String,
    role: String,
    goal: String,
    backstory: String,
    verbose: bool,
    allow_delegation: bool,
    tools: Vec<SharedTool>,
    max_iter: usize,
}

impl Role {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn allow_delegation(&self) -> bool {
        self.allow_delegation
    }

    pub fn tools(&self) -> &[SharedTool] {
        &self.tools
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}.\n{}\n\nYour personal goal is: {}\n\n{}",
            self.role, self.backstory, self.goal, ANSWER_INSTRUCTIONS
        )
    }

    /// Agent preloaded with this role's tools, iteration limit and stop condition.
    pub(crate) fn agent_builder(&self, llm: Arc<dyn LLM + Send + Sync>) -> AgentBuilder {
        AgentBuilder::new()
            .llm(llm)
            .tools(self.tools.clone())
            .stop_condition(Box::new(FinalAnswer))
            .max_iterations(self.max_iter)
    }

    pub(crate) fn messages(&self, prompt: String) -> Vec<Message> {
        vec![Message::System(self.system_prompt()), Message::User(prompt)]
    }

    pub(crate) fn is(&self, role: &str) -> bool {
        self.role.trim().eq_ignore_ascii_case(role.trim())
    }
}

const ANSWER_INSTRUCTIONS: &str = "Use the tools available to you whenever they help. \
Once you know the final answer, reply with it as plain text without calling any tool.";

pub struct RoleBuilder {
    name: String,
    role: String,
    goal: Option<String>,
    backstory: Option<String>,
    verbose: bool,
    allow_delegation: bool,
    tools: Vec<SharedTool>,
    max_iter: usize,
}

impl RoleBuilder {
    pub fn new(name: &str, role: &str) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
            goal: None,
            backstory: None,
            verbose: false,
            allow_delegation: false,
            tools: Vec::new(),
            max_iter: DEFAULT_MAX_ITER,
        }
    }

    pub fn goal(mut self, goal: &str) -> Self {
        self.goal = Some(goal.to_string());
        self
    }

    pub fn backstory(mut self, backstory: &str) -> Self {
        self.backstory = Some(backstory.to_string());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn tool(mut self, tool: SharedTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn build(self) -> Result<Arc<Role>> {
        if self.role.trim().is_empty() {
            return Err(Error::MissingArg(format!(
                "role label is required for {}",
                self.name
            )));
        }

        Ok(Arc::new(Role {
            goal: self
                .goal
                .ok_or(Error::MissingArg(format!("goal is required for {}", self.name)))?,
            backstory: self.backstory.ok_or(Error::MissingArg(format!(
                "backstory is required for {}",
                self.name
            )))?,
            name: self.name,
            role: self.role,
            verbose: self.verbose,
            allow_delegation: self.allow_delegation,
            tools: self.tools,
            max_iter: self.max_iter,
        }))
    }
}
