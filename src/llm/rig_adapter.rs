//! Bridges a rig-core `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionError, CompletionModel, Message};
use rust_decimal::Decimal;

use crate::error::LlmError;

use super::costs;
use super::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};

const PROVIDER: &str = "groq";

pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        costs::model_cost(&self.model_name)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (preamble, history, prompt) =
            split_messages(&request.messages).ok_or_else(|| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: "request has no user message".to_string(),
            })?;

        let mut builder = self
            .model
            .completion_request(to_rig(prompt))
            .messages(history.into_iter().map(to_rig).collect());
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }
        if request.json_response {
            builder = builder
                .additional_params(serde_json::json!({"response_format": {"type": "json_object"}}));
        }

        let response = builder.send().await.map_err(map_completion_error)?;

        let content = response
            .choice
            .iter()
            .filter_map(|part| match part {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .concat();

        Ok(CompletionResponse {
            content,
            input_tokens: u32::try_from(response.usage.input_tokens).unwrap_or(u32::MAX),
            output_tokens: u32::try_from(response.usage.output_tokens).unwrap_or(u32::MAX),
            finish_reason: FinishReason::Stop,
            response_id: None,
        })
    }
}

/// Split chat messages into rig's shape: system text becomes the preamble,
/// the last user or assistant message the prompt, everything between the history.
fn split_messages(
    messages: &[ChatMessage],
) -> Option<(Option<String>, Vec<&ChatMessage>, &ChatMessage)> {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let mut turns: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != Role::System).collect();
    let prompt = turns.pop()?;
    let preamble = (!system.is_empty()).then(|| system.join("\n\n"));
    Some((preamble, turns, prompt))
}

fn to_rig(message: &ChatMessage) -> Message {
    match message.role {
        Role::Assistant => Message::assistant(message.content.clone()),
        Role::User | Role::System => Message::user(message.content.clone()),
    }
}

fn map_completion_error(err: CompletionError) -> LlmError {
    match err {
        CompletionError::ResponseError(reason) => LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason,
        },
        CompletionError::JsonError(e) => LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        },
        other => classify_failure(other.to_string()),
    }
}

/// rig reports HTTP failures as text; recover auth and rate-limit cases from it.
fn classify_failure(reason: String) -> LlmError {
    let lowered = reason.to_lowercase();
    if lowered.contains("401") || lowered.contains("403") || lowered.contains("invalid api key") {
        LlmError::AuthFailed {
            provider: PROVIDER.to_string(),
        }
    } else if lowered.contains("429") || lowered.contains("rate limit") {
        LlmError::RateLimited {
            provider: PROVIDER.to_string(),
            retry_after: None,
        }
    } else {
        LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_messages_become_the_preamble() {
        let messages = vec![
            ChatMessage::system("You screen candidates."),
            ChatMessage::user("hello"),
            ChatMessage::assistant("Hi! What is your name?"),
            ChatMessage::system("Reply in JSON."),
            ChatMessage::user("Asha"),
        ];
        let (preamble, history, prompt) = split_messages(&messages).unwrap();
        assert_eq!(preamble.as_deref(), Some("You screen candidates.\n\nReply in JSON."));
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(prompt.content, "Asha");
    }

    #[test]
    fn request_without_user_turn_is_rejected() {
        assert!(split_messages(&[ChatMessage::system("only a preamble")]).is_none());
        assert!(split_messages(&[]).is_none());
    }

    #[test]
    fn failures_are_classified_from_their_text() {
        assert!(matches!(
            classify_failure("HTTP 401 Unauthorized".into()),
            LlmError::AuthFailed { .. }
        ));
        assert!(matches!(
            classify_failure("status 429: Rate limit reached".into()),
            LlmError::RateLimited { retry_after: None, .. }
        ));
        assert!(matches!(
            classify_failure("connection reset by peer".into()),
            LlmError::RequestFailed { .. }
        ));
    }
}
