use crate::utils::error::Result;
use async_trait::async_trait;

/// Where source programs come from and where emitted artifacts go.
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn read_source(&self, path: &str) -> Result<String>;
    async fn write_output(&self, path: &str, contents: &str) -> Result<()>;
}

/// Which artifact a compile run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    /// Generate `Main.java`.
    Java,
    /// Dump the analyzed AST as JSON.
    Ast,
    /// Interpret the program and report `main()`'s result.
    Run,
}

impl EmitMode {
    pub fn parse(value: &str) -> Option<EmitMode> {
        match value {
            "java" => Some(EmitMode::Java),
            "ast" => Some(EmitMode::Ast),
            "run" => Some(EmitMode::Run),
            _ => None,
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn emit(&self) -> EmitMode;
    fn verbose(&self) -> bool;
}
