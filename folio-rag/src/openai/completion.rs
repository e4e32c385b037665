use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::error;

use crate::completion::{CompletionRequest, CompletionService, TokenStream};
use crate::error::{RagError, Result};
use crate::message::{ChatMessage, Role};

const SERVICE: &str = "OpenAI";

fn service_error(context: &str, e: OpenAIError) -> RagError {
    RagError::CompletionError { service: SERVICE.to_string(), message: format!("{context}: {e}") }
}

/// A [`CompletionService`] streaming chat completions from OpenAI or an
/// OpenAI-compatible API.
pub struct OpenAICompletionService {
    client: Client<OpenAIConfig>,
}

impl OpenAICompletionService {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { client: Client::with_config(OpenAIConfig::new().with_api_key(api_key)) }
    }

    /// Create a client for an OpenAI-compatible API.
    pub fn compatible(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key).with_api_base(base_url);
        Self { client: Client::with_config(config) }
    }
}

fn to_openai_message(
    message: &ChatMessage,
) -> std::result::Result<ChatCompletionRequestMessage, OpenAIError> {
    Ok(match message.role {
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()?
            .into(),
    })
}

fn build_messages(
    request: &CompletionRequest,
) -> std::result::Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.clone())
            .build()?
            .into(),
    );
    for message in &request.messages {
        messages.push(to_openai_message(message)?);
    }
    Ok(messages)
}

#[async_trait]
impl CompletionService for OpenAICompletionService {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<TokenStream> {
        let messages =
            build_messages(&request).map_err(|e| service_error("failed to build messages", e))?;
        let openai_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .build()
            .map_err(|e| service_error("failed to build request", e))?;

        let mut upstream = self.client.chat().create_stream(openai_request).await.map_err(|e| {
            error!(service = SERVICE, error = %e, "failed to open completion stream");
            service_error("API error", e)
        })?;

        let stream = try_stream! {
            while let Some(chunk) = upstream.next().await {
                let chunk = chunk.map_err(|e| service_error("stream error", e))?;
                for choice in chunk.choices {
                    if let Some(content) = choice.delta.content {
                        yield content;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_leads_the_messages() {
        let request = CompletionRequest {
            system_prompt: "sys".to_string(),
            messages: vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
            temperature: 0.7,
            model: "gpt-4o-mini".to_string(),
        };
        let messages = build_messages(&request).unwrap();
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
    }
}
