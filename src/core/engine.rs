use crate::core::analyzer::Analyzer;
use crate::core::generator;
use crate::core::interpreter::Interpreter;
use crate::core::lexer::Lexer;
use crate::core::parser::Parser;
use crate::domain::ports::{ConfigProvider, EmitMode, SourceStore};
use crate::utils::error::Result;

/// Drives a single compile: read, lex, parse, analyze, then emit whichever
/// artifact the configuration asks for.
pub struct CompilerEngine<S: SourceStore, C: ConfigProvider> {
    store: S,
    config: C,
}

impl<S: SourceStore, C: ConfigProvider> CompilerEngine<S, C> {
    pub fn new(store: S, config: C) -> Self {
        Self { store, config }
    }

    /// Runs the pipeline and returns a short description of the outcome: the
    /// emitted file's path, or the value `main()` returned.
    pub async fn run(&self) -> Result<String> {
        let input_path = self.config.input_path();
        tracing::info!("Compiling {}", input_path);
        let text = self.store.read_source(input_path).await?;

        let tokens = Lexer::new(&text).lex()?;
        tracing::debug!("Lexed {} tokens", tokens.len());

        let mut source = Parser::new(tokens).parse_source()?;
        tracing::debug!(
            "Parsed {} fields and {} methods",
            source.fields.len(),
            source.methods.len()
        );

        Analyzer::new().analyze(&mut source)?;
        tracing::debug!("Analysis passed");

        match self.config.emit() {
            EmitMode::Java => {
                let java = generator::generate(&source)?;
                let output_path = format!("{}/Main.java", self.config.output_path());
                self.store.write_output(&output_path, &java).await?;
                tracing::info!("Wrote {}", output_path);
                Ok(output_path)
            }
            EmitMode::Ast => {
                let json = serde_json::to_string_pretty(&source)?;
                let output_path = format!("{}/ast.json", self.config.output_path());
                self.store.write_output(&output_path, &json).await?;
                tracing::info!("Wrote {}", output_path);
                Ok(output_path)
            }
            EmitMode::Run => {
                let value = Interpreter::new().evaluate_source(&source)?;
                tracing::info!("main() returned {}", value);
                Ok(format!("main() returned {}", value))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::PlcError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStore {
        files: Arc<Mutex<HashMap<String, String>>>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put(&self, path: &str, contents: &str) {
            self.files
                .lock()
                .await
                .insert(path.to_string(), contents.to_string());
        }

        async fn get(&self, path: &str) -> Option<String> {
            self.files.lock().await.get(path).cloned()
        }
    }

    #[async_trait::async_trait]
    impl SourceStore for MockStore {
        async fn read_source(&self, path: &str) -> Result<String> {
            self.files.lock().await.get(path).cloned().ok_or_else(|| {
                PlcError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("file not found: {}", path),
                ))
            })
        }

        async fn write_output(&self, path: &str, contents: &str) -> Result<()> {
            self.put(path, contents).await;
            Ok(())
        }
    }

    struct MockConfig {
        input_path: String,
        output_path: String,
        emit: EmitMode,
    }

    impl MockConfig {
        fn new(emit: EmitMode) -> Self {
            Self {
                input_path: "program.plc".to_string(),
                output_path: "out".to_string(),
                emit,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            &self.input_path
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn emit(&self) -> EmitMode {
            self.emit
        }

        fn verbose(&self) -> bool {
            false
        }
    }

    const PROGRAM: &str = "DEF main(): Integer DO\n    RETURN 2 + 3;\nEND";

    #[tokio::test]
    async fn test_emit_java_writes_main_java() {
        let store = MockStore::new();
        store.put("program.plc", PROGRAM).await;
        let engine = CompilerEngine::new(store.clone(), MockConfig::new(EmitMode::Java));

        let output_path = engine.run().await.unwrap();

        assert_eq!(output_path, "out/Main.java");
        let java = store.get("out/Main.java").await.unwrap();
        assert!(java.starts_with("public class Main {"));
        assert!(java.contains("return 2 + 3;"));
    }

    #[tokio::test]
    async fn test_emit_ast_writes_json_dump() {
        let store = MockStore::new();
        store.put("program.plc", PROGRAM).await;
        let engine = CompilerEngine::new(store.clone(), MockConfig::new(EmitMode::Ast));

        let output_path = engine.run().await.unwrap();

        assert_eq!(output_path, "out/ast.json");
        let json = store.get("out/ast.json").await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["methods"][0]["name"], "main");
    }

    #[tokio::test]
    async fn test_emit_run_reports_result() {
        let store = MockStore::new();
        store.put("program.plc", PROGRAM).await;
        let engine = CompilerEngine::new(store, MockConfig::new(EmitMode::Run));

        let outcome = engine.run().await.unwrap();

        assert_eq!(outcome, "main() returned 5");
    }

    #[tokio::test]
    async fn test_missing_input_is_an_io_error() {
        let engine = CompilerEngine::new(MockStore::new(), MockConfig::new(EmitMode::Java));
        assert!(matches!(engine.run().await, Err(PlcError::Io(_))));
    }

    #[tokio::test]
    async fn test_compile_error_surfaces() {
        let store = MockStore::new();
        store.put("program.plc", "DEF main(): Integer DO RETURN TRUE; END").await;
        let engine = CompilerEngine::new(store, MockConfig::new(EmitMode::Java));

        assert!(matches!(
            engine.run().await,
            Err(PlcError::Analysis { .. })
        ));
    }
}
