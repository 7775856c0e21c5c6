use crate::config::validate_emit_mode;
use crate::domain::ports::{ConfigProvider, EmitMode};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_identifier, validate_path, validate_source_extension, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Project manifest (`plc.toml`) alternative to CLI flags, so a program can
/// carry its build settings next to its source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub project: ProjectConfig,
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub input: String,
    pub output_path: Option<String>,
    pub emit: Option<String>,
    pub verbose: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        let config: TomlConfig = toml::from_str(&processed)?;
        Ok(config)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_identifier("project.name", &self.project.name)?;
        validate_path("build.input", &self.build.input)?;
        validate_source_extension("build.input", &self.build.input)?;
        if let Some(output_path) = &self.build.output_path {
            validate_path("build.output_path", output_path)?;
        }
        if let Some(emit) = &self.build.emit {
            validate_emit_mode("build.emit", emit)?;
        }
        Ok(())
    }
}

/// Replaces `${VAR}` references with the environment variable's value,
/// leaving unset references untouched.
fn substitute_env_vars(content: &str) -> String {
    let pattern = regex::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            let name = &caps[1];
            std::env::var(name).unwrap_or_else(|_| format!("${{{}}}", name))
        })
        .to_string()
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.build.input
    }

    fn output_path(&self) -> &str {
        self.build.output_path.as_deref().unwrap_or("./out")
    }

    fn emit(&self) -> EmitMode {
        self.build
            .emit
            .as_deref()
            .and_then(EmitMode::parse)
            .unwrap_or(EmitMode::Java)
    }

    fn verbose(&self) -> bool {
        self.build.verbose.unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
