pub mod store;
pub mod toml_config;

use crate::domain::ports::{ConfigProvider, EmitMode};
use crate::utils::error::{PlcError, Result};
use crate::utils::validation::{
    validate_path, validate_source_extension, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "plcc")]
#[command(about = "Compiler and interpreter for the PLC teaching language")]
pub struct CliConfig {
    /// Path to the .plc source file to compile
    pub input: String,

    #[arg(long, default_value = "./out")]
    pub output_path: String,

    #[arg(long, default_value = "java", help = "Artifact to emit: java, ast or run")]
    pub emit: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn emit(&self) -> EmitMode {
        // validate() rejects unknown modes before the engine runs.
        EmitMode::parse(&self.emit).unwrap_or(EmitMode::Java)
    }

    fn verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_source_extension("input", &self.input)?;
        validate_path("output_path", &self.output_path)?;
        validate_emit_mode("emit", &self.emit)?;
        Ok(())
    }
}

pub fn validate_emit_mode(field_name: &str, value: &str) -> Result<()> {
    match EmitMode::parse(value) {
        Some(_) => Ok(()),
        None => Err(PlcError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Unknown emit mode. Valid modes: java, ast, run".to_string(),
        }),
    }
}
