use crate::utils::error::{PlcError, Result};
use regex::Regex;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PlcError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(PlcError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_source_extension(field_name: &str, path: &str) -> Result<()> {
    match std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some("plc") => Ok(()),
        Some(extension) => Err(PlcError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: format!("Unsupported file extension: {}. Expected: plc", extension),
        }),
        None => Err(PlcError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

/// Names in configuration (like the manifest's project name) must be valid
/// PLC identifiers, same character classes the lexer accepts.
pub fn validate_identifier(field_name: &str, value: &str) -> Result<()> {
    let pattern = Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("static identifier pattern");
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(PlcError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Not a valid identifier".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("input", "programs/fizzbuzz.plc").is_ok());
        assert!(validate_path("input", "").is_err());
        assert!(validate_path("input", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_source_extension() {
        assert!(validate_source_extension("input", "main.plc").is_ok());
        assert!(validate_source_extension("input", "main.java").is_err());
        assert!(validate_source_extension("input", "main").is_err());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("entry", "main").is_ok());
        assert!(validate_identifier("entry", "run-fast_2").is_ok());
        assert!(validate_identifier("entry", "2fast").is_err());
        assert!(validate_identifier("entry", "").is_err());
    }
}
