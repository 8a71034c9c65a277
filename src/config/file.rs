//! File-based Configuration Provider
//!
//! Reads a JSON settings file. Nested objects are addressed with dotted keys,
//! so `{"backoff": {"base": 0.1}}` answers `backoff.base`.

use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::RwLock;

use super::ConfigResult;
use super::provider::ConfigProvider;

pub struct FileConfigProvider {
    path: PathBuf,
    data: RwLock<Option<Value>>,
}

impl FileConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(None),
        }
    }

    async fn load(&self) -> ConfigResult<Value> {
        if !self.path.exists() {
            return Ok(Value::Object(Default::default()));
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        tracing::debug!(path = %self.path.display(), "Loaded settings file");
        Ok(serde_json::from_str(&content)?)
    }

    async fn ensure_loaded(&self) -> ConfigResult<()> {
        let mut data = self.data.write().await;
        if data.is_none() {
            *data = Some(self.load().await?);
        }
        Ok(())
    }

    pub async fn reload(&self) -> ConfigResult<()> {
        let mut data = self.data.write().await;
        *data = Some(self.load().await?);
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    // A literal dotted key wins over the nested path.
    if let Some(value) = root.get(key) {
        return Some(value);
    }
    key.split('.').try_fold(root, |current, part| current.get(part))
}

#[async_trait::async_trait]
impl ConfigProvider for FileConfigProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        self.ensure_loaded().await?;

        let data = self.data.read().await;
        let value = data.as_ref().and_then(|root| lookup(root, key));
        Ok(match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(v) => Some(v.to_string()),
        })
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .finish()
    }
}
