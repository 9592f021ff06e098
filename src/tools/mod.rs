//! Tools the extraction model can call while studying an entry

pub mod cache;
pub mod implementations;
pub mod registry;
pub mod stdio;
pub mod system;
pub mod trait_def;

pub use cache::ToolCache;
pub use implementations::{
    GetCatalogEntryTool, GetReadmeTool, ListServerToolsTool, SubmitFeaturesTool,
    DEFAULT_PROBE_TIMEOUT, DEFAULT_README_MAX_CHARS,
};
pub use registry::{ToolRegistry, ToolSettings};
pub use stdio::{probe_server_tools, StdioServerParams};
pub use system::{ToolSession, ToolSystem};
pub use trait_def::Tool;
