use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{ContentBlock, ConversationRole, Message, SystemContentBlock};
use praxis_core::models::token_count::TokenUsage;
use tracing::{debug, info};

use crate::error::BedrockError;
use crate::tokens;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default per-call timeout for a model invocation.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model_id: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// A single-turn text completion.
///
/// Implementations do not retry; the caller owns the retry budget.
pub trait TextCompletion: Send + Sync {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<Completion, BedrockError>>;
}

/// [`TextCompletion`] over the Bedrock Converse API.
pub struct BedrockCompletion {
    client: Client,
    call_timeout: Duration,
}

impl BedrockCompletion {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub async fn from_region(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self::new(Client::new(&config))
    }
}

impl TextCompletion for BedrockCompletion {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<Completion, BedrockError>> {
        Box::pin(async move {
            let secs = self.call_timeout.as_secs();
            tokio::time::timeout(self.call_timeout, invoke_converse(&self.client, request))
                .await
                .map_err(|_| BedrockError::Timeout(secs))?
        })
    }
}

/// Core invocation using the Bedrock Converse API.
async fn invoke_converse(
    client: &Client,
    request: &CompletionRequest,
) -> Result<Completion, BedrockError> {
    debug!(model = %request.model_id, "invoking converse");

    let response = client
        .converse()
        .model_id(&request.model_id)
        .system(SystemContentBlock::Text(request.system_prompt.clone()))
        .messages(
            Message::builder()
                .role(ConversationRole::User)
                .content(ContentBlock::Text(request.user_prompt.clone()))
                .build()
                .map_err(|e| BedrockError::Invocation(e.to_string()))?,
        )
        .send()
        .await
        .map_err(|e| BedrockError::Invocation(e.into_service_error().to_string()))?;

    let output_message = response
        .output()
        .and_then(|o| o.as_message().ok())
        .ok_or_else(|| BedrockError::ResponseParse("no message in response".to_string()))?;

    let text = output_message
        .content()
        .iter()
        .filter_map(|block| {
            if let ContentBlock::Text(text) = block {
                Some(text.as_str())
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("");

    let tokens = response
        .usage()
        .map(tokens::extract_token_usage)
        .unwrap_or_default();
    let usage = tokens::usage_for(&request.model_id, tokens);

    info!(
        model = %request.model_id,
        input_tokens = usage.tokens.input,
        output_tokens = usage.tokens.output,
        "converse complete"
    );

    Ok(Completion { text, usage })
}
