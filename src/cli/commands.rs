use clap::{Parser, Subcommand, ValueEnum};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

use crate::extraction::FeatureSchema;

/// Catalog survey of MCP server repositories
#[derive(Parser, Debug)]
#[command(
    name = "repo-census",
    about = "Walk a repository catalog and tabulate how each MCP server is activated",
    version,
    long_about = "repo-census pages through a repository catalog, asks an LLM to extract \
                  activation features for every entry, and writes one CSV row per entry. \
                  Entries that fail or time out are logged and skipped."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only errors and the final summary"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run the full fetch-and-extract pipeline",
        long_about = "Initializes the output table, walks every catalog page and appends one \
                      row per extracted entry.\n\n\
                      Examples:\n  \
                      repo-census run\n  \
                      repo-census run --schema full --output out/repos.csv\n  \
                      repo-census run --max-pages 2 --timeout 30\n  \
                      repo-census run --github 'mcp server' --provider anthropic --model claude-sonnet-4-5"
    )]
    Run(RunArgs),

    #[command(about = "Print one catalog page")]
    List(ListArgs),

    #[command(about = "Print one catalog entry as JSON")]
    Get(GetArgs),

    #[command(about = "Search the catalog")]
    Search(SearchArgs),

    #[command(
        about = "Start a stdio MCP server and list its tools",
        long_about = "Launches the command, performs the MCP initialize handshake and prints \
                      the tool names.\n\n\
                      Examples:\n  \
                      repo-census probe uvx mcp-server-fetch\n  \
                      repo-census probe npx -- -y @modelcontextprotocol/server-filesystem /tmp"
    )]
    Probe(ProbeArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[arg(short = 'o', long, value_name = "FILE", help = "Output CSV path")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "activation", help = "Table schema")]
    pub schema: SchemaArg,

    #[arg(long, value_name = "N", help = "Entries per catalog page")]
    pub page_size: Option<usize>,

    #[arg(long, value_name = "N", help = "Stop after N pages")]
    pub max_pages: Option<usize>,

    #[arg(long, value_name = "SECONDS", help = "Per-entry extraction deadline")]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long,
        value_parser = parse_adapter_kind,
        help = "LLM provider (openai, anthropic, gemini, ollama, ...)"
    )]
    pub provider: Option<AdapterKind>,

    #[arg(short = 'm', long, value_name = "MODEL", help = "LLM model name")]
    pub model: Option<String>,

    #[arg(
        long,
        value_name = "QUERY",
        help = "Walk GitHub repository search results instead of the catalog"
    )]
    pub github: Option<String>,

    #[arg(
        long,
        help = "Let the model start MCP servers (npx, uvx, docker, node, python) to list their tools"
    )]
    pub allow_server_probe: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    #[arg(long, default_value = "12", help = "Entries to fetch")]
    pub limit: usize,

    #[arg(long, default_value = "0", help = "Offset of the first entry")]
    pub offset: usize,
}

#[derive(Parser, Debug, Clone)]
pub struct GetArgs {
    #[arg(value_name = "ID", help = "Catalog id")]
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    #[arg(value_name = "QUERY", help = "Search text")]
    pub query: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ProbeArgs {
    #[arg(value_name = "COMMAND", help = "Executable that starts the server")]
    pub command: String,

    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Arguments passed to the server"
    )]
    pub args: Vec<String>,

    #[arg(long, default_value = "20", value_name = "SECONDS", help = "Handshake timeout")]
    pub timeout: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaArg {
    Activation,
    Full,
}

impl From<SchemaArg> for FeatureSchema {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Activation => FeatureSchema::Activation,
            SchemaArg::Full => FeatureSchema::Full,
        }
    }
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    AdapterKind::from_lower_str(&s.to_lowercase()).ok_or_else(|| {
        format!(
            "Invalid provider: {}. Valid options: openai, anthropic, gemini, ollama, xai, groq, deepseek, cohere",
            s
        )
    })
}
