//! Tool registry
//!
//! Holds the tools offered to the extraction model and renders them as
//! definitions for the LLM request.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use super::implementations::*;
use super::trait_def::Tool;
use crate::catalog::HttpCatalog;
use crate::extraction::FeatureSchema;
use crate::llm::ToolDefinition;

/// Everything the standard tool set needs to reach the outside world.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub catalog: HttpCatalog,
    pub github_token: Option<String>,
    pub github_api: Option<String>,
    pub http_timeout: Duration,
    pub probe_timeout: Duration,
    pub schema: FeatureSchema,
    /// Offer `list_server_tools`, which starts processes on this machine
    pub allow_server_probe: bool,
}

pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// Catalog lookup, README fetch, the submit tool and, when allowed, the
    /// stdio probe.
    pub fn standard(settings: ToolSettings) -> Result<Self> {
        let mut readme = GetReadmeTool::new(settings.github_token, settings.http_timeout)?;
        if let Some(api) = settings.github_api {
            readme = readme.with_api_base(api);
        }

        let mut tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(GetCatalogEntryTool::new(settings.catalog)),
            Arc::new(readme),
        ];
        if settings.allow_server_probe {
            tools.push(Arc::new(ListServerToolsTool::new(settings.probe_timeout)));
        }
        tools.push(Arc::new(SubmitFeaturesTool::new(settings.schema)));

        Ok(Self::new(tools))
    }

    pub fn as_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.schema(),
            })
            .collect()
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
