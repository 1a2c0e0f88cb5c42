use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use backoff::ExponentialBackoffBuilder;

use super::Llm;
use crate::{config::ApiConfig, errors::ApiError};

#[derive(Clone)]
pub struct LlmClient {
    client: Client<OpenAIConfig>,
}

impl LlmClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let mut cfg = OpenAIConfig::default();
        if let Some(url) = base_url { cfg = cfg.with_api_base(url); }
        if let Some(key) = api_key { cfg = cfg.with_api_key(key); }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        // a failed call skips the item, so the client must not retry on 429
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        let client = Client::with_config(cfg).with_http_client(http).with_backoff(no_retry);
        Ok(Self { client })
    }

    pub fn from_config(api: &ApiConfig) -> anyhow::Result<Self> {
        Self::new(api.base_url.clone(), api.api_key.clone(), api.timeout)
    }
}

#[async_trait::async_trait]
impl Llm for LlmClient {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, ApiError> {
        let user: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?
            .into();
        let req = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(vec![user])
            .build()?;
        let resp = self.client.chat().create(req).await?;
        let first = resp.choices.into_iter().next().ok_or(ApiError::NoChoices)?;
        Ok(first.message.content.unwrap_or_default())
    }
}
