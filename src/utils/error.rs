use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlcError {
    #[error("lexical error at index {index}: {message}")]
    Lex { message: String, index: usize },

    #[error("parse error at index {index}: {message}")]
    Parse { message: String, index: usize },

    #[error("analysis error: {message}")]
    Analysis { message: String },

    #[error("runtime error: {message}")]
    Runtime { message: String },

    #[error("generation error: {0}")]
    Generation(#[from] std::fmt::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML config error: {0}")]
    TomlConfig(#[from] toml::de::Error),

    #[error("invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("missing configuration field: {field}")]
    MissingConfig { field: String },
}

/// Broad classification used for logging and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Compile,
    Config,
    System,
}

impl PlcError {
    pub fn lex(message: impl Into<String>, index: usize) -> Self {
        PlcError::Lex {
            message: message.into(),
            index,
        }
    }

    pub fn parse(message: impl Into<String>, index: usize) -> Self {
        PlcError::Parse {
            message: message.into(),
            index,
        }
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        PlcError::Analysis {
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        PlcError::Runtime {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PlcError::Lex { .. }
            | PlcError::Parse { .. }
            | PlcError::Analysis { .. }
            | PlcError::Runtime { .. }
            | PlcError::Generation(_) => ErrorCategory::Compile,
            PlcError::InvalidConfigValue { .. }
            | PlcError::MissingConfig { .. }
            | PlcError::TomlConfig(_) => ErrorCategory::Config,
            PlcError::Io(_) | PlcError::Serialization(_) => ErrorCategory::System,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Compile => 1,
            ErrorCategory::Config => 2,
            ErrorCategory::System => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlcError>;
