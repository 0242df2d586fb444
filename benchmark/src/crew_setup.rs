use crate::input::CollectedInput;
use agent::Result;
use agent::crew::{Role, RoleBuilder, Task};
use agent::tools::SharedTool;
use std::sync::Arc;

pub struct Roles {
    pub user_input: Arc<Role>,
    pub research: Arc<Role>,
    pub verification: Arc<Role>,
}

impl Roles {
    pub fn all(&self) -> [Arc<Role>; 3] {
        [
            self.user_input.clone(),
            self.research.clone(),
            self.verification.clone(),
        ]
    }
}

pub fn create_roles(search: SharedTool) -> Result<Roles> {
    let user_input = RoleBuilder::new("User Input Agent", "User Input Specialist")
        .goal("Ask the user for companies and benchmarking metrics.")
        .backstory(
            "You are skilled at gathering information from users and ensuring they provide the necessary details for the task.",
        )
        .verbose(true)
        .allow_delegation(false)
        .build()?;

    let research = RoleBuilder::new("Research Agent", "Data Researcher")
        .goal("Research the specified metrics for each company.")
        .backstory(
            "With an analytical mind, you excel at finding and compiling data from various online sources.",
        )
        .verbose(true)
        .allow_delegation(true)
        .tool(search.clone())
        .build()?;

    let verification = RoleBuilder::new("Verification Agent", "Data Verifier")
        .goal("Verify the accuracy of the researched data.")
        .backstory(
            "Your attention to detail ensures that all information is accurate and reliable.",
        )
        .verbose(true)
        .allow_delegation(true)
        .tool(search)
        .build()?;

    Ok(Roles {
        user_input,
        research,
        verification,
    })
}

/// The lists are spliced in with their debug rendering so stray whitespace
/// and empty entries reach the model exactly as the operator typed them.
pub fn create_tasks(roles: &Roles, input: &CollectedInput) -> Vec<Task> {
    // TODO: the operator answers before kickoff, so this task cannot reach
    // them; wire it to the console or drop it.
    let user_input = Task::new(
        "Ask the user for a list of companies and the metrics to be benchmarked. Provide the user with a suggested list of metrics and get their approval.",
        &roles.user_input,
    );

    let research = Task::new(
        format!(
            "Research the specified metrics for each company: {:?} using various online resources and databases.",
            input.companies
        ),
        &roles.research,
    );

    let verification = Task::new(
        format!(
            "Verify the accuracy of the researched data by cross-checking with reliable sources for companies: {:?} and metrics: {:?}.",
            input.companies, input.metrics
        ),
        &roles.verification,
    );

    vec![user_input, research, verification]
}
