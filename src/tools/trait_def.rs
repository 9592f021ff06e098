use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A capability the extraction model may call by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON Schema of the arguments object.
    fn schema(&self) -> Value;
    async fn execute(&self, arguments: Value) -> Result<Value>;

    /// Whether a successful result may be reused for identical arguments.
    fn cacheable(&self) -> bool {
        true
    }
}
