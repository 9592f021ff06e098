use anyhow::{anyhow, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::cache::ToolCache;
use super::registry::{ToolRegistry, ToolSettings};
use crate::llm::ToolDefinition;

/// The tools offered to the model. Calls go through a [`ToolSession`], which
/// owns the result cache for one extraction.
pub struct ToolSystem {
    registry: ToolRegistry,
}

impl ToolSystem {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn standard(settings: ToolSettings) -> Result<Self> {
        Ok(Self::new(ToolRegistry::standard(settings)?))
    }

    /// Starts a session with an empty cache. Results cached in it are freed
    /// when the session is dropped.
    pub fn session(&self) -> ToolSession<'_> {
        ToolSession {
            registry: &self.registry,
            cache: ToolCache::new(),
        }
    }

    pub fn as_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.as_tool_definitions()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.registry.tool_names()
    }

    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }
}

/// Tool dispatch for a single extraction.
pub struct ToolSession<'a> {
    registry: &'a ToolRegistry,
    cache: ToolCache,
}

impl ToolSession<'_> {
    pub async fn execute(&self, tool_name: &str, arguments: Value) -> Result<Value> {
        info!(tool = tool_name, args = ?arguments, "Executing tool");

        if let Some(cached) = self.cache.get(tool_name, &arguments) {
            debug!(tool = tool_name, "Tool result found in cache");
            return Ok(cached);
        }

        let tool = self
            .registry
            .get_tool(tool_name)
            .ok_or_else(|| anyhow!("Unknown tool: {}", tool_name))?;

        let result = tool.execute(arguments.clone()).await;

        match &result {
            Ok(output) => {
                let preview: String = output.to_string().chars().take(200).collect();
                debug!(tool = tool_name, output_preview = %preview, "Tool output preview");

                if tool.cacheable() {
                    self.cache.insert(tool_name, &arguments, output.clone());
                }
            }
            Err(e) => {
                warn!(tool = tool_name, error = %e, "Tool execution failed");
            }
        }

        result
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
