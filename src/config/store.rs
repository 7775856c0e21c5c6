use crate::domain::ports::SourceStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

/// Filesystem-backed store used by the CLI.
#[derive(Debug, Clone, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceStore for LocalStore {
    async fn read_source(&self, path: &str) -> Result<String> {
        let text = fs::read_to_string(path).await?;
        Ok(text)
    }

    async fn write_output(&self, path: &str, contents: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, contents).await?;
        Ok(())
    }
}
