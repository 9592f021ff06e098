//! LLM client backed by the `genai` crate
//!
//! One client type covers every provider genai knows about (OpenAI, Anthropic,
//! Ollama, Gemini, xAI, Groq). Credentials come from the provider's standard
//! environment variable; an explicit endpoint can be supplied for
//! OpenAI-compatible gateways.

use super::client::LLMClient;
use super::error::BackendError;
use super::types::{ChatMessage, LLMRequest, LLMResponse, MessageRole, ToolCall, ToolDefinition};
use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::{
    ChatMessage as GenAIChatMessage, ChatOptions, ChatRequest as GenAIChatRequest, MessageContent,
    Tool as GenAITool, ToolResponse,
};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use std::time::{Duration, Instant};
use tracing::{debug, error};

pub struct GenAIClient {
    client: Client,
    model: String,
    provider: AdapterKind,
    timeout: Duration,
}

impl GenAIClient {
    pub fn new(provider: AdapterKind, model: impl Into<String>, timeout: Duration) -> Self {
        let model = model.into();
        debug!(provider = provider.as_str(), model = %model, "Creating GenAI client");
        Self {
            client: Client::default(),
            model,
            provider,
            timeout,
        }
    }

    /// Routes every request to `endpoint_url` instead of the provider default.
    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        let endpoint_url = endpoint_url.into();
        debug!(
            provider = self.provider.as_str(),
            endpoint = %endpoint_url,
            "Using custom endpoint"
        );

        let provider = self.provider;
        let model = self.model.clone();
        let resolver = ServiceTargetResolver::from_resolver_fn(
            move |_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
                let auth = match provider.default_key_env_name() {
                    Some(key_var) => AuthData::from_env(key_var),
                    None => AuthData::from_single(""),
                };
                Ok(ServiceTarget {
                    endpoint: Endpoint::from_owned(endpoint_url.clone()),
                    auth,
                    model: ModelIden::new(provider, &model),
                })
            },
        );

        self.client = Client::builder()
            .with_service_target_resolver(resolver)
            .build();
        self
    }

    fn convert_message(msg: &ChatMessage) -> GenAIChatMessage {
        match msg.role {
            MessageRole::System => GenAIChatMessage::system(&msg.content),
            MessageRole::User => GenAIChatMessage::user(&msg.content),
            MessageRole::Assistant => match &msg.tool_calls {
                Some(calls) => {
                    let genai_calls: Vec<genai::chat::ToolCall> = calls
                        .iter()
                        .map(|tc| genai::chat::ToolCall {
                            call_id: tc.call_id.clone(),
                            fn_name: tc.name.clone(),
                            fn_arguments: tc.arguments.clone(),
                        })
                        .collect();
                    GenAIChatMessage::assistant(MessageContent::from_tool_calls(genai_calls))
                }
                None => GenAIChatMessage::assistant(&msg.content),
            },
            MessageRole::Tool => ToolResponse {
                call_id: msg.tool_call_id.clone().unwrap_or_default(),
                content: msg.content.clone(),
            }
            .into(),
        }
    }

    fn convert_tool(tool: &ToolDefinition) -> GenAITool {
        GenAITool::new(&tool.name)
            .with_description(&tool.description)
            .with_schema(tool.parameters.clone())
    }
}

#[async_trait]
impl LLMClient for GenAIClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let start = Instant::now();

        let messages: Vec<GenAIChatMessage> =
            request.messages.iter().map(Self::convert_message).collect();
        let tools: Vec<GenAITool> = request.tools.iter().map(Self::convert_tool).collect();
        let genai_request = GenAIChatRequest::new(messages).with_tools(tools);

        let mut options = ChatOptions::default();
        if let Some(temp) = request.temperature {
            options = options.with_temperature(temp as f64);
        }
        if let Some(max_tokens) = request.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }

        let response = match tokio::time::timeout(
            self.timeout,
            self.client
                .exec_chat(&self.model, genai_request, Some(&options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                error!("{} API error: {}", self.provider.as_str(), e);
                return Err(BackendError::ApiError {
                    message: format!("{} request failed: {}", self.provider.as_str(), e),
                    status_code: None,
                });
            }
            Err(_) => {
                error!(
                    "{} request timed out after {}s",
                    self.provider.as_str(),
                    self.timeout.as_secs()
                );
                return Err(BackendError::TimeoutError {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let content = response.first_text().unwrap_or_default().to_string();
        let tool_calls: Vec<ToolCall> = response
            .tool_calls()
            .into_iter()
            .map(|tc| ToolCall {
                call_id: tc.call_id.clone(),
                name: tc.fn_name.clone(),
                arguments: tc.fn_arguments.clone(),
            })
            .collect();

        Ok(LLMResponse::with_tool_calls(
            content,
            tool_calls,
            start.elapsed(),
        ))
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_info(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

impl std::fmt::Debug for GenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAIClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
