mod benchmark;
mod config;
mod crew_setup;
mod input;

use agent::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,agent=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // nothing is prompted or sent before both keys are known
    let config = config::Config::from_env()?;

    let llm = agent::llm::OpenAI::new(config.model.clone(), &config.openai_api_key);

    benchmark::run(&config, llm, std::io::stdin().lock(), &mut std::io::stdout()).await?;

    Ok(())
}
