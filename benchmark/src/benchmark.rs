use crate::config::Config;
use crate::crew_setup::{create_roles, create_tasks};
use crate::input::{CollectedInput, collect_input};
use agent::Result;
use agent::crew::{Crew, CrewBuilder};
use agent::llm::LLM;
use agent::tools::SerperSearch;
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Transcripts for every verbose role plus per-task progress events.
const CREW_VERBOSITY: u8 = 2;

pub fn build_crew(
    config: &Config,
    llm: Arc<dyn LLM + Send + Sync>,
    input: &CollectedInput,
) -> Result<Crew> {
    let search = Arc::new(SerperSearch::new(&config.serper_api_key));
    let roles = create_roles(search)?;
    let tasks = create_tasks(&roles, input);

    CrewBuilder::new()
        .llm(llm)
        .roles(roles.all())
        .tasks(tasks)
        .verbose(CREW_VERBOSITY)
        .build()
}

/// Prompts the operator, runs the crew once and prints its answer as is.
pub async fn run<R: BufRead, W: Write>(
    config: &Config,
    llm: Arc<dyn LLM + Send + Sync>,
    reader: R,
    writer: &mut W,
) -> Result<String> {
    writeln!(writer, "Starting the CrewAI Benchmarking Tool...")?;

    let input = collect_input(reader, writer)?;
    let crew = build_crew(config, llm, &input)?;

    writeln!(writer, "Crew formed. Starting the process...")?;
    writer.flush()?;

    let result = crew.kickoff().await?;

    writeln!(writer, "\nFinal Result:")?;
    writeln!(writer, "{}", result)?;

    Ok(result)
}
