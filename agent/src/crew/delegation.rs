use crate::Result;
use crate::crew::{Role, final_answer, task};
use crate::llm::{LLM, Message};
use crate::tools::{FunctionalTool, SharedTool, ToolCall, ToolDefinition};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

pub const DELEGATE_WORK: &str = "delegate_work_to_coworker";
pub const ASK_QUESTION: &str = "ask_question_to_coworker";

/// The roles a delegating role may hand work to.
#[derive(Clone)]
struct Coworkers {
    roles: Vec<Arc<Role>>,
    llm: Arc<dyn LLM + Send + Sync>,
}

impl Coworkers {
    fn labels(&self) -> String {
        self.roles
            .iter()
            .map(|role| role.role())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Runs `request` as a fresh task for the named coworker. Coworkers only
    /// get their own tools, so delegation never nests.
    async fn ask(&self, coworker: &str, request: &str, context: &str) -> Result<String> {
        let Some(role) = self.roles.iter().find(|role| role.is(coworker)) else {
            return Ok(format!(
                "Error: there is no coworker named '{}', choose one of: {}",
                coworker,
                self.labels()
            ));
        };

        tracing::info!(coworker = %role.role(), "delegating to coworker");

        let mut agent = role.agent_builder(self.llm.clone()).build()?;
        let history = agent
            .run(role.messages(task::with_context(request, context)))
            .await?;

        final_answer(&history)
    }
}

/// Delegation tools for a role, or none when the role may not delegate or
/// has nobody to delegate to.
pub fn delegation_tools(
    role: &Role,
    crew_roles: &[Arc<Role>],
    llm: Arc<dyn LLM + Send + Sync>,
) -> Vec<SharedTool> {
    if !role.allow_delegation() {
        return vec![];
    }

    let roles = crew_roles
        .iter()
        .filter(|other| !std::ptr::eq(Arc::as_ptr(other), role))
        .cloned()
        .collect::<Vec<_>>();

    if roles.is_empty() {
        return vec![];
    }

    let coworkers = Coworkers { roles, llm };
    let delegate: SharedTool = Arc::new(DelegateWork(coworkers.clone()));
    let ask: SharedTool = Arc::new(AskQuestion(coworkers));
    vec![delegate, ask]
}

#[derive(Deserialize, JsonSchema)]
struct DelegateWorkArgs {
    /// the task to delegate
    task: String,
    /// everything the coworker needs to know to perform the task
    context: String,
    /// the role of the coworker to delegate to
    coworker: String,
}

struct DelegateWork(Coworkers);

#[async_trait]
impl FunctionalTool for DelegateWork {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<DelegateWorkArgs>(
            DELEGATE_WORK,
            &format!(
                "Delegate a specific task to one of the following coworkers: {}. \
                 The coworker knows nothing about your task, so share all the context you have.",
                self.0.labels()
            ),
        )
    }

    async fn invoke_fn(&self, call: &ToolCall) -> Result<Message> {
        let args: DelegateWorkArgs = call.args()?;
        Ok(Message::Tool {
            id: call.id.clone(),
            name: DELEGATE_WORK.to_string(),
            result: self.0.ask(&args.coworker, &args.task, &args.context).await?,
        })
    }
}

#[derive(Deserialize, JsonSchema)]
struct AskQuestionArgs {
    /// the question to ask
    question: String,
    /// everything the coworker needs to know to answer
    context: String,
    /// the role of the coworker to ask
    coworker: String,
}

struct AskQuestion(Coworkers);

#[async_trait]
impl FunctionalTool for AskQuestion {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<AskQuestionArgs>(
            ASK_QUESTION,
            &format!(
                "Ask a specific question to one of the following coworkers: {}. \
                 The coworker knows nothing about your task, so share all the context you have.",
                self.0.labels()
            ),
        )
    }

    async fn invoke_fn(&self, call: &ToolCall) -> Result<Message> {
        let args: AskQuestionArgs = call.args()?;
        Ok(Message::Tool {
            id: call.id.clone(),
            name: ASK_QUESTION.to_string(),
            result: self
                .0
                .ask(&args.coworker, &args.question, &args.context)
                .await?,
        })
    }
}
