use anyhow::{anyhow, Result};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use std::time::Duration;
use tokio::time::sleep;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

/// How many times a request is attempted and the first pause between tries.
/// The pause doubles after every failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

/// Send `prompt` to the configured model, retrying with exponential backoff.
///
/// Each attempt is bounded by `request_timeout`. Returns `None` once all
/// retries are exhausted; callers treat that as "no result".
pub async fn generate_llm_response(
    prompt: &str,
    params: &LLMParams,
    request_timeout: Duration,
    retry: &RetryPolicy,
) -> Option<String> {
    let mut backoff = retry.initial_backoff;

    debug!(target: TARGET_LLM_REQUEST, "Starting LLM response generation with model {}", params.model);

    for retry_count in 0..retry.max_attempts {
        match timeout(request_timeout, send_request(prompt, params)).await {
            Ok(Ok(response)) if !response.trim().is_empty() => {
                debug!(target: TARGET_LLM_REQUEST, "LLM response received: {}", response);
                return Some(response);
            }
            Ok(Ok(_)) => {
                warn!(target: TARGET_LLM_REQUEST, "LLM returned an empty response");
            }
            Ok(Err(e)) => {
                warn!(target: TARGET_LLM_REQUEST, "Error generating response: {}", e);
            }
            Err(_) => {
                warn!(target: TARGET_LLM_REQUEST, "LLM request timed out after {:?}", request_timeout);
            }
        }

        if retry_count + 1 < retry.max_attempts {
            info!(target: TARGET_LLM_REQUEST, "Retrying LLM request in {:?}... ({}/{})", backoff, retry_count + 1, retry.max_attempts);
            sleep(backoff).await;
            backoff *= 2;
        }
    }

    error!(target: TARGET_LLM_REQUEST, "No response generated after {} attempts", retry.max_attempts);
    None
}

async fn send_request(prompt: &str, params: &LLMParams) -> Result<String> {
    match &params.llm_client {
        LLMClient::Ollama(ollama) => {
            let mut request = GenerationRequest::new(params.model.clone(), prompt.to_string());
            request.options = Some(GenerationOptions::default().temperature(params.temperature));
            let response = ollama
                .generate(request)
                .await
                .map_err(|e| anyhow!("Ollama error: {}", e))?;
            Ok(response.response)
        }
        LLMClient::OpenAI(client) => {
            let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into();
            let request = CreateChatCompletionRequestArgs::default()
                .model(params.model.clone())
                .temperature(params.temperature)
                .messages(vec![message])
                .build()?;
            let response = client.chat().create(request).await?;
            response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| anyhow!("OpenAI response contained no content"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ollama_rs::Ollama;
    use std::time::Instant;

    #[tokio::test]
    async fn test_unreachable_model_gives_none_after_all_attempts() {
        let params = LLMParams {
            llm_client: LLMClient::Ollama(Ollama::new("http://127.0.0.1".to_string(), 9)),
            model: "unused".to_string(),
            temperature: 0.0,
        };
        let retry = RetryPolicy {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(10),
        };

        let started = Instant::now();
        let response =
            generate_llm_response("hello", &params, Duration::from_millis(200), &retry).await;
        assert_eq!(response, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
