use plc::utils::validation::Validate;
use plc::{CliConfig, CompilerEngine, LocalStore, PlcError, TomlConfig};

const PROGRAM: &str = "LET greeting: String = \"Hello, World!\";\n\
                       DEF main(): Integer DO\n\
                       \x20   print(greeting);\n\
                       \x20   RETURN 0;\n\
                       END";

fn write_program(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

fn cli_config(input: String, output_path: String, emit: &str) -> CliConfig {
    CliConfig {
        input,
        output_path,
        emit: emit.to_string(),
        verbose: false,
    }
}

#[tokio::test]
async fn test_emit_java_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_program(&dir, "hello.plc", PROGRAM);
    let output_path = dir.path().join("out").to_str().unwrap().to_string();
    let config = cli_config(input, output_path.clone(), "java");
    assert!(config.validate().is_ok());

    let engine = CompilerEngine::new(LocalStore::new(), config);
    let outcome = engine.run().await.unwrap();

    assert_eq!(outcome, format!("{}/Main.java", output_path));
    let java = std::fs::read_to_string(&outcome).unwrap();
    assert!(java.starts_with("public class Main {"));
    assert!(java.contains("String greeting = \"Hello, World!\";"));
    assert!(java.contains("System.out.println(greeting);"));
}

#[tokio::test]
async fn test_emit_ast_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_program(&dir, "hello.plc", PROGRAM);
    let output_path = dir.path().join("out").to_str().unwrap().to_string();
    let config = cli_config(input, output_path.clone(), "ast");

    let engine = CompilerEngine::new(LocalStore::new(), config);
    let outcome = engine.run().await.unwrap();

    let json = std::fs::read_to_string(&outcome).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["fields"][0]["name"], "greeting");
    assert_eq!(parsed["methods"][0]["name"], "main");
}

#[tokio::test]
async fn test_emit_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_program(&dir, "hello.plc", PROGRAM);
    let output_path = dir.path().join("out").to_str().unwrap().to_string();
    let config = cli_config(input, output_path, "run");

    let engine = CompilerEngine::new(LocalStore::new(), config);
    let outcome = engine.run().await.unwrap();

    assert_eq!(outcome, "main() returned 0");
}

#[tokio::test]
async fn test_toml_manifest_drives_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_program(&dir, "hello.plc", PROGRAM);
    let output_path = dir.path().join("out").to_str().unwrap().to_string();

    let manifest = format!(
        "[project]\nname = \"hello\"\n\n[build]\ninput = \"{}\"\noutput_path = \"{}\"\nemit = \"java\"\n",
        input, output_path
    );
    let manifest_path = dir.path().join("plc.toml");
    std::fs::write(&manifest_path, manifest).unwrap();

    let config = TomlConfig::from_file(&manifest_path).unwrap();
    assert!(config.validate().is_ok());

    let engine = CompilerEngine::new(LocalStore::new(), config);
    let outcome = engine.run().await.unwrap();

    let java = std::fs::read_to_string(&outcome).unwrap();
    assert!(java.contains("int main() {"));
}

#[tokio::test]
async fn test_lex_error_has_compile_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_program(&dir, "bad.plc", "DEF main(): Integer DO print('); END");
    let output_path = dir.path().join("out").to_str().unwrap().to_string();
    let config = cli_config(input, output_path, "java");

    let engine = CompilerEngine::new(LocalStore::new(), config);
    let error = engine.run().await.unwrap_err();

    assert!(matches!(error, PlcError::Lex { .. }));
    assert_eq!(error.exit_code(), 1);
}

#[tokio::test]
async fn test_analysis_error_has_compile_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_program(
        &dir,
        "bad.plc",
        "DEF main(): Integer DO\n    RETURN \"zero\";\nEND",
    );
    let output_path = dir.path().join("out").to_str().unwrap().to_string();
    let config = cli_config(input, output_path, "java");

    let engine = CompilerEngine::new(LocalStore::new(), config);
    let error = engine.run().await.unwrap_err();

    assert!(matches!(error, PlcError::Analysis { .. }));
    assert_eq!(error.exit_code(), 1);
}

#[tokio::test]
async fn test_missing_input_has_system_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.plc").to_str().unwrap().to_string();
    let output_path = dir.path().join("out").to_str().unwrap().to_string();
    let config = cli_config(missing, output_path, "java");

    let engine = CompilerEngine::new(LocalStore::new(), config);
    let error = engine.run().await.unwrap_err();

    assert!(matches!(error, PlcError::Io(_)));
    assert_eq!(error.exit_code(), 3);
}

#[test]
fn test_config_validation_rejects_bad_emit() {
    let config = cli_config("main.plc".to_string(), "./out".to_string(), "wasm");
    let error = config.validate().unwrap_err();
    assert_eq!(error.exit_code(), 2);
}
