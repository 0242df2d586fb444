use agent::{Error, Result};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const SERPER_API_KEY: &str = "SERPER_API_KEY";
pub const OPENAI_MODEL_NAME: &str = "OPENAI_MODEL_NAME";

const DEFAULT_MODEL: &str = "gpt-4o";

/// Settings read once at startup and passed by reference afterwards.
pub struct Config {
    pub openai_api_key: String,
    pub serper_api_key: String,
    pub model: String,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(err) => tracing::debug!(%err, "no .env loaded"),
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key).filter(|value| !value.is_empty()).ok_or_else(|| {
                Error::Config(format!(
                    "Please set the {} environment variable in the .env file.",
                    key
                ))
            })
        };

        Ok(Self {
            openai_api_key: required(OPENAI_API_KEY)?,
            serper_api_key: required(SERPER_API_KEY)?,
            model: lookup(OPENAI_MODEL_NAME)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}
