use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::stdio::{probe_server_tools, StdioServerParams};
use super::trait_def::Tool;
use crate::catalog::{EntryId, HttpCatalog, DEFAULT_GITHUB_API};
use crate::extraction::FeatureSchema;

pub const DEFAULT_README_MAX_CHARS: usize = 12_000;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(20);

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow!("Missing required argument: {}", key))
}

pub struct GetCatalogEntryTool {
    catalog: HttpCatalog,
}

impl GetCatalogEntryTool {
    pub fn new(catalog: HttpCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for GetCatalogEntryTool {
    fn name(&self) -> &'static str {
        "get_catalog_entry"
    }

    fn description(&self) -> &'static str {
        "Fetch the full catalog record of a repository by its catalog id"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_id": {
                    "type": ["integer", "string"],
                    "description": "Catalog id of the repository"
                }
            },
            "required": ["repo_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let id = match args.get("repo_id") {
            Some(Value::Number(n)) => EntryId::new(n.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => EntryId::new(s.trim()),
            _ => bail!("Missing required argument: repo_id"),
        };

        Ok(self
            .catalog
            .get_entry(&id)
            .await
            .unwrap_or_else(|| json!({ "error": "Repository not found" })))
    }
}

/// Reads a repository README through the GitHub contents API.
pub struct GetReadmeTool {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
    max_chars: usize,
}

impl GetReadmeTool {
    pub fn new(token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repo-census/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: DEFAULT_GITHUB_API.to_string(),
            token,
            max_chars: DEFAULT_README_MAX_CHARS,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

#[async_trait]
impl Tool for GetReadmeTool {
    fn name(&self) -> &'static str {
        "get_readme"
    }

    fn description(&self) -> &'static str {
        "Fetch the README of a GitHub repository given as owner/name"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo": {
                    "type": "string",
                    "description": "Repository in owner/name form"
                }
            },
            "required": ["repo"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let repo = required_str(&args, "repo")?.trim().trim_matches('/');
        if repo.split('/').filter(|part| !part.is_empty()).count() != 2 {
            bail!("Expected owner/name, got: {}", repo);
        }

        let url = format!("{}/repos/{}/readme", self.api_base, repo);
        debug!(url = %url, "Fetching README");

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github.raw");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("README request failed")?;
        let status = response.status();
        if !status.is_success() {
            bail!("GitHub returned HTTP {} for {}", status.as_u16(), repo);
        }
        let text = response.text().await.context("Failed to read README body")?;

        let total_chars = text.chars().count();
        let truncated = total_chars > self.max_chars;
        let readme: String = text.chars().take(self.max_chars).collect();

        Ok(json!({
            "repo": repo,
            "readme": readme,
            "truncated": truncated,
            "total_chars": total_chars,
        }))
    }
}

/// Starts an MCP server over stdio and reports the names of its tools.
///
/// Arguments come from the model, which has read untrusted README text, so
/// only allowlisted launchers run; see
/// [`StdioServerParams::check_launch_policy`].
pub struct ListServerToolsTool {
    timeout: Duration,
}

impl ListServerToolsTool {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Tool for ListServerToolsTool {
    fn name(&self) -> &'static str {
        "list_server_tools"
    }

    fn description(&self) -> &'static str {
        "Launch an MCP server over stdio (command, args, env) and list the tools it exposes"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "enum": ["npx", "uvx", "docker", "node", "python", "python3"] },
                "args": { "type": "array", "items": { "type": "string" } },
                "env": { "type": "object", "additionalProperties": { "type": "string" } }
            },
            "required": ["command"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let params: StdioServerParams =
            serde_json::from_value(args).context("Invalid server parameters")?;
        params.check_launch_policy()?;
        let tools = probe_server_tools(&params, self.timeout).await?;
        Ok(json!({ "command": params.command, "tools": tools }))
    }

    fn cacheable(&self) -> bool {
        false
    }
}

/// Terminal tool: the model calls it with the finished feature row.
pub struct SubmitFeaturesTool {
    schema: FeatureSchema,
}

impl SubmitFeaturesTool {
    pub const NAME: &'static str = "submit_features";

    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }
}

#[async_trait]
impl Tool for SubmitFeaturesTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Submit the extracted features of the repository; call exactly once when done"
    }

    fn schema(&self) -> Value {
        self.schema.json_schema()
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        self.schema
            .parse(args)
            .context("Submitted features do not match the row schema")?;
        info!(schema = self.schema.as_str(), "Feature submission validated");
        Ok(json!({ "accepted": true }))
    }

    fn cacheable(&self) -> bool {
        false
    }
}
