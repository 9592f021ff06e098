use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    tool_name: String,
    arguments: String,
}

impl CacheKey {
    fn new(tool_name: &str, arguments: &Value) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            arguments: arguments.to_string(),
        }
    }
}

/// Tool results keyed by tool name and serialized arguments.
///
/// Lives for one extraction, so a model that repeats a call within its
/// conversation gets the earlier result without another request.
#[derive(Default)]
pub struct ToolCache {
    entries: RwLock<HashMap<CacheKey, Value>>,
}

impl ToolCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tool_name: &str, arguments: &Value) -> Option<Value> {
        let key = CacheKey::new(tool_name, arguments);
        self.entries.read().ok()?.get(&key).cloned()
    }

    pub fn insert(&self, tool_name: &str, arguments: &Value, result: Value) {
        let key = CacheKey::new(tool_name, arguments);
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, result);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hit_and_miss() {
        let cache = ToolCache::new();
        assert!(cache.is_empty());

        let args = json!({"repo": "acme/server"});
        cache.insert("get_readme", &args, json!({"readme": "# acme"}));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("get_readme", &args), Some(json!({"readme": "# acme"})));
        assert_eq!(cache.get("get_readme", &json!({"repo": "acme/other"})), None);
        assert_eq!(cache.get("get_catalog_entry", &args), None);
    }

    #[test]
    fn test_clear() {
        let cache = ToolCache::new();
        cache.insert("get_catalog_entry", &json!({"repo_id": 1}), json!({"id": 1}));
        cache.insert("get_catalog_entry", &json!({"repo_id": 2}), json!({"id": 2}));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
