//! Launching an MCP server over stdio and listing the tools it exposes
//!
//! The probe speaks just enough JSON-RPC for discovery: `initialize`, the
//! `notifications/initialized` notification and `tools/list`. The child is
//! killed when the probe returns or times out.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{ChildStdout, Command};
use tracing::{debug, info};

const PROTOCOL_VERSION: &str = "2024-11-05";

/// Launchers a model-requested probe may start.
pub const ALLOWED_LAUNCHERS: [&str; 6] = ["npx", "uvx", "docker", "node", "python", "python3"];

/// Variables that change what the launcher loads or executes.
const BLOCKED_ENV_KEYS: [&str; 11] = [
    "PATH",
    "HOME",
    "SHELL",
    "BASH_ENV",
    "ENV",
    "NODE_OPTIONS",
    "NODE_PATH",
    "PYTHONPATH",
    "PYTHONHOME",
    "PYTHONSTARTUP",
    "DOCKER_HOST",
];
const BLOCKED_ENV_PREFIXES: [&str; 4] = ["LD_", "DYLD_", "NPM_CONFIG_", "UV_"];

/// How to start a stdio server: command, arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StdioServerParams {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
}

impl StdioServerParams {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: None,
            env: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Checks parameters that came from untrusted text: the command must be a
    /// bare package launcher, arguments may not run inline code or widen a
    /// container's access, and the environment may not redirect loading.
    pub fn check_launch_policy(&self) -> Result<()> {
        let command = self.command.as_str();
        if !ALLOWED_LAUNCHERS.contains(&command) {
            bail!(
                "command {:?} is not allowed; use one of: {}",
                command,
                ALLOWED_LAUNCHERS.join(", ")
            );
        }

        if let Some(arg) = self
            .args
            .iter()
            .flatten()
            .find(|arg| is_blocked_flag(command, arg))
        {
            bail!("argument {:?} is not allowed for {}", arg, command);
        }

        if let Some(key) = self.env.iter().flatten().map(|(k, _)| k).find(|k| is_blocked_env(k)) {
            bail!("environment variable {} is not allowed", key);
        }
        Ok(())
    }
}

fn is_blocked_env(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    BLOCKED_ENV_KEYS.contains(&key.as_str())
        || BLOCKED_ENV_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

/// Flags that evaluate inline code or grant a container host access.
fn is_blocked_flag(command: &str, arg: &str) -> bool {
    let flag = arg.split('=').next().unwrap_or(arg);
    match command {
        "node" => matches!(
            flag,
            "-e" | "--eval" | "-p" | "--print" | "-r" | "--require" | "--import" | "--loader"
        ),
        "python" | "python3" => arg.starts_with("-c"),
        "npx" => matches!(flag, "-c" | "--call" | "--shell" | "--script-shell"),
        "docker" => {
            matches!(
                flag,
                "-v" | "--volume"
                    | "--mount"
                    | "--privileged"
                    | "--pid"
                    | "--ipc"
                    | "--cap-add"
                    | "--device"
                    | "--security-opt"
            ) || arg == "--network=host"
                || arg.starts_with("-v")
        }
        _ => false,
    }
}

/// Starts the server, lists its tools and shuts it down.
pub async fn probe_server_tools(params: &StdioServerParams, timeout: Duration) -> Result<Vec<String>> {
    info!(command = %params.command, "Probing stdio server for tools");
    tokio::time::timeout(timeout, run_probe(params))
        .await
        .map_err(|_| anyhow!("stdio server did not answer within {}s", timeout.as_secs()))?
}

async fn run_probe(params: &StdioServerParams) -> Result<Vec<String>> {
    let mut command = Command::new(&params.command);
    command
        .args(params.args.iter().flatten())
        .envs(params.env.iter().flatten())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to start {}", params.command))?;
    let mut stdin = child.stdin.take().context("child stdin unavailable")?;
    let stdout = child.stdout.take().context("child stdout unavailable")?;
    let mut lines = BufReader::new(stdout).lines();

    send(
        &mut stdin,
        &json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": { "name": "repo-census", "version": env!("CARGO_PKG_VERSION") }
            }
        }),
    )
    .await?;
    read_response(&mut lines, 1).await?;

    send(
        &mut stdin,
        &json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
    )
    .await?;
    send(
        &mut stdin,
        &json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
    )
    .await?;
    let result = read_response(&mut lines, 2).await?;

    let _ = child.start_kill();
    tool_names(&result)
}

async fn send(stdin: &mut tokio::process::ChildStdin, message: &Value) -> Result<()> {
    let mut line = message.to_string();
    line.push('\n');
    stdin
        .write_all(line.as_bytes())
        .await
        .context("Failed to write to stdio server")?;
    stdin.flush().await.context("Failed to flush stdio server input")
}

/// Reads lines until the response carrying `id`, skipping notifications and
/// any non-JSON chatter the server prints.
async fn read_response(lines: &mut Lines<BufReader<ChildStdout>>, id: u64) -> Result<Value> {
    while let Some(line) = lines.next_line().await? {
        let Ok(message) = serde_json::from_str::<Value>(&line) else {
            debug!(line = %line, "Ignoring non-JSON output from stdio server");
            continue;
        };
        if message.get("id").and_then(Value::as_u64) != Some(id) {
            continue;
        }
        if let Some(error) = message.get("error") {
            bail!("stdio server returned an error: {}", error);
        }
        return message
            .get("result")
            .cloned()
            .ok_or_else(|| anyhow!("response {} has no result", id));
    }
    bail!("stdio server closed its output before answering request {}", id)
}

fn tool_names(result: &Value) -> Result<Vec<String>> {
    let tools = result
        .get("tools")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("tools/list result has no tools array"))?;
    Ok(tools
        .iter()
        .filter_map(|tool| tool.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}
