//! Sequential multi-role orchestration.
//!
//! A [`Crew`] owns a set of [`Role`]s and an ordered list of [`Task`]s. On
//! [`Crew::kickoff`] every task runs, in order, as an agent loop for the role
//! it is bound to, with the previous task's answer passed along as context.
//! Roles that allow delegation can hand sub-requests to the other roles of
//! the crew through tools.

use crate::callbacks::MessageLogger;
use crate::llm::{LLM, Message};
use crate::tools::SummarizeHistory;
use crate::{Error, Result, StopCondition};
use std::sync::Arc;

mod delegation;
mod role;
mod task;

use delegation::delegation_tools;
pub use delegation::{ASK_QUESTION, DELEGATE_WORK};
pub use role::{DEFAULT_MAX_ITER, Role, RoleBuilder};
pub use task::{Task, TaskOutput};

const SUMMARY_KEEP_LAST: usize = 4;
const SUMMARY_MAX_TOKENS: usize = 12_000;

/// Done once the assistant answers without asking for a tool.
pub(crate) struct FinalAnswer;

impl StopCondition for FinalAnswer {
    fn done(&self, history: &[Message]) -> bool {
        matches!(history.last(), Some(Message::Assistant(_, tool_calls)) if tool_calls.is_empty())
    }
}

pub(crate) fn final_answer(history: &[Message]) -> Result<String> {
    match history.last() {
        Some(Message::Assistant(content, tool_calls)) if tool_calls.is_empty() => {
            Ok(content.clone())
        }
        _ => Err(Error::AgentWorkflowError(
            "agent stopped without a final answer".to_string(),
        )),
    }
}

pub struct Crew {
    llm: Arc<dyn LLM + Send + Sync>,
    roles: Vec<Arc<Role>>,
    tasks: Vec<Task>,
    verbose: u8,
    respect_context_window: bool,
}

impl Crew {
    pub fn roles(&self) -> &[Arc<Role>] {
        &self.roles
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    /// Runs every task and returns the last task's answer.
    pub async fn kickoff(&self) -> Result<String> {
        let outputs = self.run_tasks().await?;

        outputs
            .last()
            .map(|output| output.raw.clone())
            .ok_or(Error::InvalidCrew("crew has no tasks".to_string()))
    }

    pub async fn run_tasks(&self) -> Result<Vec<TaskOutput>> {
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for (i, task) in self.tasks.iter().enumerate() {
            let context = outputs.last().map(|output| output.raw.as_str());

            if self.verbose >= 1 {
                tracing::info!(
                    task = i + 1,
                    of = self.tasks.len(),
                    role = %task.role().role(),
                    "starting task"
                );
            }

            let output = self.execute_task(task, context).await?;

            if self.verbose >= 1 {
                tracing::info!(task = i + 1, role = %output.role, "task finished");
            }

            outputs.push(output);
        }

        Ok(outputs)
    }

    async fn execute_task(&self, task: &Task, context: Option<&str>) -> Result<TaskOutput> {
        let role = task.role();

        let mut builder = role
            .agent_builder(self.llm.clone())
            .tools(delegation_tools(role, &self.roles, self.llm.clone()));

        if self.respect_context_window {
            builder = builder.callback(SummarizeHistory::new(
                self.llm.clone(),
                SUMMARY_KEEP_LAST,
                SUMMARY_MAX_TOKENS,
            ));
        }

        if self.verbose >= 2 && role.verbose() {
            builder = builder.callback(MessageLogger::new(role.name()));
        }

        let mut agent = builder.build()?;
        let history = agent.run(role.messages(task.prompt(context))).await?;

        Ok(TaskOutput {
            description: task.description().to_string(),
            role: role.role().to_string(),
            raw: final_answer(&history)?,
        })
    }
}

pub struct CrewBuilder {
    llm: Option<Arc<dyn LLM + Send + Sync>>,
    roles: Vec<Arc<Role>>,
    tasks: Vec<Task>,
    verbose: u8,
    respect_context_window: bool,
}

impl Default for CrewBuilder {
    fn default() -> Self {
        Self {
            llm: None,
            roles: Vec::new(),
            tasks: Vec::new(),
            verbose: 0,
            respect_context_window: true,
        }
    }
}

impl CrewBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn llm(mut self, llm: Arc<dyn LLM + Send + Sync>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn role(mut self, role: Arc<Role>) -> Self {
        self.roles.push(role);
        self
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = Arc<Role>>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    pub fn respect_context_window(mut self, respect: bool) -> Self {
        self.respect_context_window = respect;
        self
    }

    pub fn build(self) -> Result<Crew> {
        if self.tasks.is_empty() {
            return Err(Error::InvalidCrew("crew has no tasks".to_string()));
        }

        for task in &self.tasks {
            if !self.roles.iter().any(|role| Arc::ptr_eq(role, task.role())) {
                return Err(Error::InvalidCrew(format!(
                    "task '{}' is bound to {}, which is not a member of the crew",
                    task.description(),
                    task.role().name()
                )));
            }
        }

        Ok(Crew {
            llm: self
                .llm
                .ok_or(Error::MissingArg("llm is required for crew".to_string()))?,
            roles: self.roles,
            tasks: self.tasks,
            verbose: self.verbose,
            respect_context_window: self.respect_context_window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CrewBuilder, DELEGATE_WORK, Role, RoleBuilder, Task};
    use crate::llm::{CompletionRequest, CompletionResponse, LLM, Message};
    use crate::tools::{FunctionalTool, ToolCall, ToolDefinition};
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records every user prompt and answers "answer N" for the Nth prompt.
    #[derive(Default)]
    struct RecordingLLM {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LLM for RecordingLLM {
        async fn completion<'a>(
            &self,
            request: CompletionRequest<'a>,
        ) -> Result<CompletionResponse> {
            let Some(Message::User(prompt)) = request.messages.get(1) else {
                panic!("expected the task prompt after the system prompt");
            };
            let mut prompts = self.prompts.lock().expect("lock");
            prompts.push(prompt.clone());
            Ok(CompletionResponse {
                content: format!("answer {}", prompts.len()),
                tool_calls: vec![],
            })
        }
    }

    fn role(name: &str, label: &str) -> Result<Arc<Role>> {
        RoleBuilder::new(name, label)
            .goal("goal")
            .backstory("backstory")
            .verbose(true)
            .allow_delegation(true)
            .build()
    }

    #[tokio::test]
    async fn test_tasks_run_in_order_with_context() -> Result<()> {
        let llm = Arc::new(RecordingLLM::default());
        let research = role("Research Agent", "Data Researcher")?;
        let verify = role("Verification Agent", "Data Verifier")?;

        let crew = CrewBuilder::new()
            .llm(llm.clone())
            .roles([research.clone(), verify.clone()])
            .task(Task::new("research Acme", &research))
            .task(Task::new("verify Acme", &verify))
            .verbose(1)
            .build()?;

        let outputs = crew.run_tasks().await?;

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].role, "Data Researcher");
        assert_eq!(outputs[0].raw, "answer 1");
        assert_eq!(outputs[1].description, "verify Acme");
        assert_eq!(outputs[1].raw, "answer 2");

        let prompts = llm.prompts.lock().expect("lock").clone();
        assert_eq!(
            prompts,
            vec![
                "research Acme".to_string(),
                "verify Acme\n\nThis is the context you're working with:\nanswer 1".to_string(),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_kickoff_returns_last_output() -> Result<()> {
        let llm = Arc::new(RecordingLLM::default());
        let a = role("A", "First")?;
        let b = role("B", "Second")?;
        let c = role("C", "Third")?;

        let crew = CrewBuilder::new()
            .llm(llm)
            .roles([a.clone(), b.clone(), c.clone()])
            .tasks([Task::new("1", &a), Task::new("2", &b), Task::new("3", &c)])
            .build()?;

        assert_eq!(crew.kickoff().await?, "answer 3");
        Ok(())
    }

    #[test]
    fn test_build_rejects_foreign_role() -> Result<()> {
        let member = role("Research Agent", "Data Researcher")?;
        let outsider = role("Research Agent", "Data Researcher")?;

        let result = CrewBuilder::new()
            .llm(Arc::new(RecordingLLM::default()))
            .role(member)
            .task(Task::new("research", &outsider))
            .build();

        assert!(matches!(result, Err(Error::InvalidCrew(_))));
        Ok(())
    }

    #[test]
    fn test_build_requires_tasks_and_llm() -> Result<()> {
        let member = role("Research Agent", "Data Researcher")?;

        assert!(matches!(
            CrewBuilder::new()
                .llm(Arc::new(RecordingLLM::default()))
                .role(member.clone())
                .build(),
            Err(Error::InvalidCrew(_))
        ));
        assert!(matches!(
            CrewBuilder::new()
                .role(member.clone())
                .task(Task::new("research", &member))
                .build(),
            Err(Error::MissingArg(_))
        ));
        Ok(())
    }

    /// Delegates once from the researcher, then answers with what came back.
    #[derive(Default)]
    struct DelegatingLLM {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LLM for DelegatingLLM {
        async fn completion<'a>(
            &self,
            request: CompletionRequest<'a>,
        ) -> Result<CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let system = match request.messages.first() {
                Some(Message::System(system)) => system.as_str(),
                _ => panic!("missing system prompt"),
            };

            if system.starts_with("You are Data Verifier.") {
                return Ok(CompletionResponse {
                    content: "verified: 10M".to_string(),
                    tool_calls: vec![],
                });
            }

            match request.messages.last() {
                Some(Message::User(_)) => {
                    assert!(request.tools.iter().any(|def| def.name == DELEGATE_WORK));
                    Ok(CompletionResponse {
                        content: String::new(),
                        tool_calls: vec![ToolCall {
                            id: "call1".to_string(),
                            name: DELEGATE_WORK.to_string(),
                            args: "{\"task\":\"verify Acme revenue\",\"context\":\"10M\",\"coworker\":\"Data Verifier\"}".to_string(),
                        }],
                    })
                }
                Some(Message::Tool { result, .. }) => Ok(CompletionResponse {
                    content: format!("researched, {}", result),
                    tool_calls: vec![],
                }),
                _ => panic!("unexpected message sequence"),
            }
        }
    }

    #[tokio::test]
    async fn test_delegation_inside_task() -> Result<()> {
        let llm = Arc::new(DelegatingLLM::default());
        let research = role("Research Agent", "Data Researcher")?;
        let verify = role("Verification Agent", "Data Verifier")?;

        let crew = CrewBuilder::new()
            .llm(llm.clone())
            .roles([research.clone(), verify])
            .task(Task::new("research Acme", &research))
            .build()?;

        assert_eq!(crew.kickoff().await?, "researched, verified: 10M");
        // researcher asks, verifier answers, researcher concludes
        assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
        Ok(())
    }

    struct Lookup;

    #[derive(serde::Deserialize, schemars::JsonSchema)]
    struct LookupArgs {
        company: String,
    }

    #[async_trait]
    impl FunctionalTool for Lookup {
        fn definition(&self) -> Result<ToolDefinition> {
            ToolDefinition::new::<LookupArgs>("lookup", "look up a company")
        }

        async fn invoke_fn(&self, call: &ToolCall) -> Result<Message> {
            let args: LookupArgs = call.args()?;
            Ok(Message::Tool {
                id: call.id.clone(),
                name: "lookup".to_string(),
                result: format!("{} found", args.company),
            })
        }
    }

    /// Calls the lookup tool forever.
    struct LoopingLLM;

    #[async_trait]
    impl LLM for LoopingLLM {
        async fn completion<'a>(&self, _: CompletionRequest<'a>) -> Result<CompletionResponse> {
            Ok(CompletionResponse {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    id: "call".to_string(),
                    name: "lookup".to_string(),
                    args: "{\"company\":\"Acme\"}".to_string(),
                }],
            })
        }
    }

    #[tokio::test]
    async fn test_role_iteration_limit() -> Result<()> {
        let research = RoleBuilder::new("Research Agent", "Data Researcher")
            .goal("goal")
            .backstory("backstory")
            .tool(Arc::new(Lookup))
            .max_iter(2)
            .build()?;

        let crew = CrewBuilder::new()
            .llm(Arc::new(LoopingLLM))
            .role(research.clone())
            .task(Task::new("research Acme", &research))
            .build()?;

        assert!(matches!(crew.kickoff().await, Err(Error::MaxIterations(2))));
        Ok(())
    }

    /// Sends the wrong argument name first, then retries after reading the error.
    struct WrongArgsLLM;

    #[async_trait]
    impl LLM for WrongArgsLLM {
        async fn completion<'a>(
            &self,
            request: CompletionRequest<'a>,
        ) -> Result<CompletionResponse> {
            let (id, args) = match request.messages.last() {
                Some(Message::User(_)) => ("first", "{\"q\":\"acme\"}"),
                Some(Message::Tool { result, .. }) if result.starts_with("Error: ") => {
                    ("second", "{\"company\":\"Acme\"}")
                }
                Some(Message::Tool { result, .. }) => {
                    return Ok(CompletionResponse {
                        content: format!("recovered: {}", result),
                        tool_calls: vec![],
                    });
                }
                _ => panic!("unexpected message sequence"),
            };
            Ok(CompletionResponse {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    id: id.to_string(),
                    name: "lookup".to_string(),
                    args: args.to_string(),
                }],
            })
        }
    }

    #[tokio::test]
    async fn test_bad_tool_call_does_not_end_the_crew() -> Result<()> {
        let research = RoleBuilder::new("Research Agent", "Data Researcher")
            .goal("goal")
            .backstory("backstory")
            .tool(Arc::new(Lookup))
            .build()?;

        let crew = CrewBuilder::new()
            .llm(Arc::new(WrongArgsLLM))
            .role(research.clone())
            .task(Task::new("research Acme", &research))
            .build()?;

        assert_eq!(crew.kickoff().await?, "recovered: Acme found");
        Ok(())
    }
}
