//! Dialect Schema Types
//!
//! Command definitions for a firmware dialect, as stored in
//! `*.gcode-dialect.toml` files.

use serde::Deserialize;
use std::collections::HashMap;

/// Root dialect file structure (matches TOML)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DialectFile {
    pub dialect: DialectMeta,
    #[serde(default)]
    pub commands: Vec<CommandDef>,
}

/// Dialect metadata
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DialectMeta {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
}

/// Runtime dialect (optimized for lookups)
#[derive(Debug, Clone, PartialEq)]
pub struct Dialect {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub commands: HashMap<String, CommandDef>,
}

/// GCode command definition
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CommandDef {
    pub name: String,
    pub description_short: Option<String>,
    pub description_long: Option<String>,
    pub parameters: Option<Vec<ParameterDef>>,
}

/// Command parameter definition
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(default)]
    pub required: bool,
    pub description: String,
    pub constraints: Option<ParameterConstraints>,
    pub aliases: Option<Vec<String>>,
}

/// Parameter data types
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Int,
    Float,
    String,
    Bool,
}

/// Parameter validation constraints
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ParameterConstraints {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub enum_values: Option<Vec<String>>,
}

impl From<DialectFile> for Dialect {
    fn from(file: DialectFile) -> Self {
        // Keyed by upper-cased name so lookups are case-insensitive
        let commands = file
            .commands
            .into_iter()
            .map(|cmd| (cmd.name.to_ascii_uppercase(), cmd))
            .collect();

        Self {
            name: file.dialect.name,
            version: file.dialect.version,
            description: file.dialect.description,
            commands,
        }
    }
}

impl Dialect {
    /// Overlay another dialect's commands on top of this one
    pub fn extend(&mut self, other: Dialect) {
        self.commands.extend(other.commands);
        if other.version.is_some() {
            self.version = other.version;
        }
        if other.description.is_some() {
            self.description = other.description;
        }
    }
}

impl CommandDef {
    /// Find parameter by name (including aliases)
    pub fn find_parameter(&self, name: &str) -> Option<&ParameterDef> {
        self.parameters
            .as_ref()?
            .iter()
            .find(|param| param.matches_name(name))
    }

    /// Get required parameters
    pub fn required_parameters(&self) -> Vec<&ParameterDef> {
        self.parameters
            .as_ref()
            .map(|params| params.iter().filter(|p| p.required).collect())
            .unwrap_or_default()
    }
}

impl ParameterDef {
    /// Check if parameter matches name (including aliases)
    pub fn matches_name(&self, name: &str) -> bool {
        if self.name.eq_ignore_ascii_case(name) {
            return true;
        }

        self.aliases
            .as_ref()
            .map(|aliases| aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name)))
            .unwrap_or(false)
    }

    /// Validate parameter value
    pub fn validate(&self, value: &str) -> Result<(), String> {
        match self.param_type {
            ParameterType::Int => {
                let val: i64 = value.parse().map_err(|_| {
                    format!("Parameter '{}' expects integer, got '{}'", self.name, value)
                })?;
                self.check_range(val as f64)?;
            }
            ParameterType::Float => {
                let val: f64 = value
                    .parse()
                    .ok()
                    .filter(|v: &f64| v.is_finite())
                    .ok_or_else(|| {
                        format!("Parameter '{}' expects number, got '{}'", self.name, value)
                    })?;
                self.check_range(val)?;
            }
            ParameterType::String => {
                if let Some(enum_values) = self
                    .constraints
                    .as_ref()
                    .and_then(|c| c.enum_values.as_ref())
                {
                    if !enum_values.iter().any(|v| v.eq_ignore_ascii_case(value)) {
                        return Err(format!(
                            "Parameter '{}' value '{}' not in allowed values: {}",
                            self.name,
                            value,
                            enum_values.join(", ")
                        ));
                    }
                }
            }
            ParameterType::Bool => {
                // Flags are written as a bare letter
                if !value.is_empty() {
                    return Err(format!(
                        "Parameter '{}' is a flag and should not have value '{}'",
                        self.name, value
                    ));
                }
            }
        }

        Ok(())
    }

    fn check_range(&self, val: f64) -> Result<(), String> {
        let Some(constraints) = &self.constraints else {
            return Ok(());
        };
        if let Some(min) = constraints.min_value {
            if val < min {
                return Err(format!(
                    "Parameter '{}' value {} below minimum {}",
                    self.name, val, min
                ));
            }
        }
        if let Some(max) = constraints.max_value {
            if val > max {
                return Err(format!(
                    "Parameter '{}' value {} exceeds maximum {}",
                    self.name, val, max
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, param_type: ParameterType, constraints: Option<ParameterConstraints>) -> ParameterDef {
        ParameterDef {
            name: name.to_string(),
            param_type,
            required: false,
            description: format!("{name} parameter"),
            constraints,
            aliases: None,
        }
    }

    #[test]
    fn test_dialect_from_file() {
        let file: DialectFile = toml::from_str(
            r#"
[dialect]
name = "test"
version = "1.0"

[[commands]]
name = "m624"
description_short = "Begin object"
"#,
        )
        .expect("valid dialect");

        let dialect = Dialect::from(file);
        assert_eq!(dialect.name, "test");
        assert_eq!(dialect.commands.len(), 1);
        assert!(dialect.commands.contains_key("M624"));
    }

    #[test]
    fn test_parameter_matches_name() {
        let mut p = param("X", ParameterType::Float, None);
        p.aliases = Some(vec!["U".to_string()]);

        assert!(p.matches_name("X"));
        assert!(p.matches_name("x"));
        assert!(p.matches_name("u"));
        assert!(!p.matches_name("Y"));
    }

    #[test]
    fn test_int_validation() {
        let p = param(
            "S",
            ParameterType::Int,
            Some(ParameterConstraints {
                min_value: Some(0.0),
                max_value: Some(255.0),
                enum_values: None,
            }),
        );

        assert!(p.validate("100").is_ok());
        assert!(p.validate("300").is_err()); // Above max
        assert!(p.validate("-10").is_err()); // Below min
        assert!(p.validate("abc").is_err()); // Not a number
    }

    #[test]
    fn test_float_validation() {
        let p = param(
            "F",
            ParameterType::Float,
            Some(ParameterConstraints {
                min_value: Some(0.0),
                ..Default::default()
            }),
        );

        assert!(p.validate("3000").is_ok());
        assert!(p.validate(".01").is_ok());
        assert!(p.validate("-1").is_err());
        assert!(p.validate("inf").is_err());
    }

    #[test]
    fn test_enum_and_flag_validation() {
        let mut mode = param("M", ParameterType::String, None);
        mode.constraints = Some(ParameterConstraints {
            enum_values: Some(vec!["A".to_string(), "B".to_string()]),
            ..Default::default()
        });
        assert!(mode.validate("a").is_ok());
        assert!(mode.validate("C").is_err());

        let flag = param("X", ParameterType::Bool, None);
        assert!(flag.validate("").is_ok());
        assert!(flag.validate("1").is_err());
    }
}
