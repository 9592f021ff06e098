//! Tool-calling LLM extraction
//!
//! The model studies one entry with the registered tools and finishes by
//! calling `submit_features`. The submission is validated against the
//! configured schema; invalid submissions go back to the model as tool
//! errors so it can correct itself within the iteration budget.

use super::record::{FeatureRecord, FeatureSchema};
use super::{ExtractionCapability, ExtractionError};
use crate::catalog::Entry;
use crate::llm::{ChatMessage, LLMClient, LLMRequest, LLMResponse, ToolCall};
use crate::tools::{SubmitFeaturesTool, ToolSession, ToolSystem};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ITERATIONS: usize = 8;
const MAX_CONSECUTIVE_ZERO_TOOL_CALLS: usize = 2;
const TEMPERATURE: f32 = 0.1;

const SYSTEM_PROMPT: &str = r#"You survey MCP server repositories and record how each one is activated.

You receive a JSON object with the catalog id (repo_id), the GitHub repository (repo_ref, may be null) and a display name.

Available tools:
- get_catalog_entry: full catalog record for a repo_id (description, stars, forks, license, links)
- get_readme: README text of an owner/name GitHub repository
- list_server_tools (only when offered): start the server with npx, uvx, docker, node or python and list the tools it exposes
- submit_features: submit the finished feature row

Workflow:
1. Call get_catalog_entry with the repo_id.
2. Read the README when the catalog record does not settle a field.
3. Only call list_server_tools when it is offered and you know a concrete launch command.
4. Call submit_features exactly once with every field filled.

Field conventions:
- docker, uvx, npx, filesystem_access: "yes" or "no"
- credentials: environment variables or secrets the server needs, empty if none
- example_activation_commands: raw commands, one per line
- tools: tool names, one per line

Respond with tool calls only."#;

const REMINDER: &str =
    "You must call a tool now. When you have the features, call submit_features with the complete row.";

/// Extracts features by running a bounded tool-calling conversation.
pub struct LlmExtractor {
    client: Arc<dyn LLMClient>,
    tools: Arc<ToolSystem>,
    schema: FeatureSchema,
    max_iterations: usize,
}

impl LlmExtractor {
    pub fn new(client: Arc<dyn LLMClient>, tools: Arc<ToolSystem>, schema: FeatureSchema) -> Self {
        Self {
            client,
            tools,
            schema,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    fn initial_messages(&self, entry: &Entry) -> Vec<ChatMessage> {
        let payload = json!({
            "repo_id": entry.id,
            "repo_ref": entry.repo_ref(),
            "name": entry.full_name,
        });
        let fields = self.schema.field_names().join(", ");

        vec![
            ChatMessage::system(format!("{}\n\nRow fields: {}", SYSTEM_PROMPT, fields)),
            ChatMessage::user(payload.to_string()),
        ]
    }

    /// Handles one batch of tool calls. Returns the record once a valid
    /// submission arrives.
    async fn run_tool_calls(
        &self,
        session: &ToolSession<'_>,
        tool_calls: &[ToolCall],
        messages: &mut Vec<ChatMessage>,
    ) -> Option<FeatureRecord> {
        for call in tool_calls {
            debug!(tool = %call.name, call_id = %call.call_id, "Handling tool call");

            if call.name == SubmitFeaturesTool::NAME {
                match self.schema.parse(call.arguments.clone()) {
                    Ok(record) => return Some(record),
                    Err(e) => {
                        warn!(error = %e, "Rejected feature submission");
                        messages.push(ChatMessage::tool_response(
                            &call.call_id,
                            json!({ "error": format!("invalid submission: {}", e) }).to_string(),
                        ));
                        continue;
                    }
                }
            }

            let result = match session.execute(&call.name, call.arguments.clone()).await {
                Ok(output) => output,
                Err(e) => json!({ "error": e.to_string() }),
            };
            messages.push(ChatMessage::tool_response(&call.call_id, result.to_string()));
        }
        None
    }

    /// Accepts a row written as plain JSON text instead of a tool call.
    fn parse_text_reply(&self, response: &LLMResponse) -> Option<FeatureRecord> {
        let candidate = extract_json_from_markdown(&response.content);
        let value: Value = serde_json::from_str(candidate).ok()?;
        self.schema.parse(value).ok()
    }
}

#[async_trait]
impl ExtractionCapability for LlmExtractor {
    async fn extract(&self, entry: &Entry) -> Result<FeatureRecord, ExtractionError> {
        let mut messages = self.initial_messages(entry);
        let tools = self.tools.as_tool_definitions();
        let session = self.tools.session();
        let mut consecutive_zero_tool_calls = 0;

        for iteration in 1..=self.max_iterations {
            debug!(entry = %entry.id, iteration, max = self.max_iterations, "LLM turn");

            let request = LLMRequest::new(messages.clone())
                .with_tools(tools.clone())
                .with_temperature(TEMPERATURE);
            let response = self.client.chat(request).await?;

            if !response.has_tool_calls() {
                if let Some(record) = self.parse_text_reply(&response) {
                    info!(entry = %entry.id, iteration, "Features parsed from text reply");
                    return Ok(record);
                }

                consecutive_zero_tool_calls += 1;
                if consecutive_zero_tool_calls >= MAX_CONSECUTIVE_ZERO_TOOL_CALLS {
                    return Err(ExtractionError::InvalidResponse(format!(
                        "model did not call any tools after {} attempts",
                        consecutive_zero_tool_calls
                    )));
                }

                warn!(
                    entry = %entry.id,
                    attempt = consecutive_zero_tool_calls,
                    "Model did not call any tools, sending reminder"
                );
                messages.push(ChatMessage::assistant(&response.content));
                messages.push(ChatMessage::user(REMINDER));
                continue;
            }

            consecutive_zero_tool_calls = 0;
            messages.push(ChatMessage::assistant_with_tools(
                &response.content,
                response.tool_calls.clone(),
            ));

            if let Some(record) = self
                .run_tool_calls(&session, &response.tool_calls, &mut messages)
                .await
            {
                info!(entry = %entry.id, iteration, "Features submitted");
                return Ok(record);
            }
        }

        Err(ExtractionError::MaxIterations(self.max_iterations))
    }

    fn name(&self) -> &str {
        self.client.name()
    }
}

/// Strips a surrounding markdown code fence, if any.
fn extract_json_from_markdown(content: &str) -> &str {
    let trimmed = content.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    trimmed
}
