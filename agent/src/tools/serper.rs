use crate::Result;
use crate::llm::Message;
use crate::tools::{FunctionalTool, ToolCall, ToolDefinition};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

pub const NAME: &str = "Serper Search";
pub const DESCRIPTION: &str = "Useful for searching information on the internet";

/// Google search through the serper.dev api.
///
/// The response body is handed back untouched whatever the status code, so
/// the model sees api errors as plain text.
pub struct SerperSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SerperSearch {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: SERPER_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub async fn search(&self, query: &str) -> Result<String> {
        tracing::info!(query, "searching the web");

        let response = self
            .client
            .post(self.endpoint.as_str())
            .header("X-API-KEY", self.api_key.as_str())
            .json(&serde_json::json!({ "q": query }))
            .send()
            .await?;

        tracing::debug!(status = %response.status(), "search response");

        Ok(response.text().await?)
    }
}

#[derive(Deserialize, JsonSchema)]
struct SearchArgs {
    /// the search query
    query: String,
}

#[async_trait]
impl FunctionalTool for SerperSearch {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<SearchArgs>(NAME, DESCRIPTION)
    }

    async fn invoke_fn(&self, call: &ToolCall) -> Result<Message> {
        let args: SearchArgs = call.args()?;
        Ok(Message::Tool {
            id: call.id.clone(),
            name: NAME.to_string(),
            result: self.search(&args.query).await?,
        })
    }
}
