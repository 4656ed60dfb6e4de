use std::time::Duration;

use serde_json::Value;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, ResponseFormat,
    },
    Client,
};

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{MeishiError, Result},
    llm::provider::CompletionOptions,
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";

#[derive(Debug, Clone)]
struct ApiConfig {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    max_output_tokens: u32,
}

impl ApiConfig {
    fn from_llm_config(config: &LlmConfig) -> Self {
        let (provider, model) = parse_llm_provider_model(&config.model);

        let default_base_url = match provider.to_lowercase().as_str() {
            "openrouter" => OPENROUTER_BASE_URL,
            "ollama" => OLLAMA_BASE_URL,
            "lmstudio" => LMSTUDIO_BASE_URL,
            _ => OPENAI_BASE_URL,
        };

        Self {
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url.to_string()),
            api_key: config.api_key.clone(),
            model: model.to_string(),
            timeout_secs: config.timeout_secs,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    config: ApiConfig,
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_config = ApiConfig::from_llm_config(config);

        let (provider, _) = parse_llm_provider_model(&config.model);
        let needs_api_key = !matches!(
            provider.to_lowercase().as_str(),
            "ollama" | "local" | "lmstudio"
        );

        if needs_api_key && api_config.api_key.is_none() {
            return Err(MeishiError::Llm(
                "API key required for this provider".to_string(),
            ));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_base(api_config.base_url.clone())
            .with_api_key(api_config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()
            .map_err(|error| {
                MeishiError::Llm(format!("Failed to create LLM HTTP client: {error}"))
            })?;

        // Cap async-openai's internal backoff at our timeout. Without this it
        // retries 500 errors with exponential backoff for up to 15 minutes,
        // which would reintroduce the retrying this call path must not do.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(api_config.timeout_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            config: api_config,
        })
    }

    /// Single completion attempt. A failure is the caller's to handle; this
    /// client never retries on its own.
    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(MeishiError::Validation("Prompt cannot be empty".to_string()));
        }

        let request = self.build_request(prompt, system_prompt, options, false)?;
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| MeishiError::Llm(format!("Completion failed: {e}")))?;
        Self::extract_content(response)
    }

    /// Single completion attempt in JSON mode, parsed into a value.
    pub async fn complete_json(
        &self,
        prompt: &str,
        options: Option<&CompletionOptions>,
    ) -> Result<Value> {
        if prompt.trim().is_empty() {
            return Err(MeishiError::Validation("Prompt cannot be empty".to_string()));
        }

        let request = self.build_request(prompt, None, options, true)?;
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| MeishiError::Llm(format!("Completion failed: {e}")))?;

        let content = Self::extract_content(response)?;
        tracing::debug!(response_len = content.len(), "LLM JSON response received");
        serde_json::from_str(&content).map_err(|e| {
            tracing::error!(
                response_len = content.len(),
                response_preview = %content.chars().take(100).collect::<String>(),
                error = %e,
                "Failed to parse JSON response"
            );
            MeishiError::Llm(format!("Failed to parse JSON response: {e}"))
        })
    }

    fn build_request(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
        json_mode: bool,
    ) -> Result<CreateChatCompletionRequest> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| MeishiError::Llm(format!("Failed to build message: {e}")))?
                    .into(),
            );
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| MeishiError::Llm(format!("Failed to build message: {e}")))?
                .into(),
        );

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.config.model).messages(messages);

        let max_tokens = options
            .and_then(|o| o.max_tokens)
            .unwrap_or(self.config.max_output_tokens);
        args.max_tokens(max_tokens);

        if let Some(temperature) = options.and_then(|o| o.temperature) {
            args.temperature(temperature);
        }
        if json_mode {
            args.response_format(ResponseFormat::JsonObject);
        }

        args.build()
            .map_err(|e| MeishiError::Llm(format!("Failed to build request: {e}")))
    }

    fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| MeishiError::Llm("Empty completion response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(model: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            model: model.to_string(),
            api_key: api_key.map(String::from),
            base_url: None,
            timeout_secs: 30,
            max_output_tokens: 1024,
        }
    }

    #[test]
    fn test_api_key_required_for_openai() {
        let result = LlmApiClient::new(&llm_config("openai/gpt-4o-mini", None));
        assert!(matches!(result, Err(MeishiError::Llm(_))));
    }

    #[test]
    fn test_ollama_needs_no_api_key() {
        let result = LlmApiClient::new(&llm_config("ollama/llama3.2", None));
        assert!(result.is_ok());
    }

    #[test]
    fn test_provider_base_url_resolution() {
        let config = ApiConfig::from_llm_config(&llm_config("openrouter/gpt-4o", Some("k")));
        assert_eq!(config.base_url, OPENROUTER_BASE_URL);
        assert_eq!(config.model, "gpt-4o");

        let config = ApiConfig::from_llm_config(&llm_config("ollama/llama3.2", None));
        assert_eq!(config.base_url, OLLAMA_BASE_URL);
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let mut llm = llm_config("openai/gpt-4o-mini", Some("k"));
        llm.base_url = Some("http://localhost:8080/v1".to_string());
        let config = ApiConfig::from_llm_config(&llm);
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let client = LlmApiClient::new(&llm_config("ollama/llama3.2", None)).unwrap();
        let result = client.complete("   ", None, None).await;
        assert!(matches!(result, Err(MeishiError::Validation(_))));
    }
}
