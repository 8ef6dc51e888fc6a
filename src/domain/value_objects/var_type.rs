//! Variable type value object
//!
//! The closed set of types a contract variable may declare, plus the
//! type check applied to defaults and overlay values.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// Declared type of a contract variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    String,
    Int,
    Float,
    Bool,
    Json,
    Enum,
    Url,
}

impl VarType {
    /// All accepted type names, in documentation order
    pub const NAMES: [&'static str; 7] = ["string", "int", "float", "bool", "json", "enum", "url"];

    /// Check a value against this type.
    ///
    /// `allowed` carries the enum members and is ignored for other types.
    /// Returns a human readable reason on mismatch.
    pub fn check(&self, value: &Value, allowed: &[String]) -> Result<(), String> {
        match self {
            VarType::String => match value {
                Value::String(_) => Ok(()),
                other => Err(format!("expected string, got {}", kind_of(other))),
            },
            VarType::Int => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(()),
                other => Err(format!("expected int, got {}", kind_of(other))),
            },
            VarType::Float => match value {
                Value::Number(_) => Ok(()),
                other => Err(format!("expected float, got {}", kind_of(other))),
            },
            VarType::Bool => match value {
                Value::Bool(_) => Ok(()),
                other => Err(format!("expected bool, got {}", kind_of(other))),
            },
            VarType::Json => Ok(()),
            VarType::Enum => match value {
                Value::String(s) if allowed.iter().any(|a| a == s) => Ok(()),
                Value::String(s) => Err(format!(
                    "'{}' is not one of [{}]",
                    s,
                    allowed.join(", ")
                )),
                other => Err(format!("expected enum string, got {}", kind_of(other))),
            },
            VarType::Url => match value {
                Value::String(s) => url::Url::parse(s)
                    .map(|_| ())
                    .map_err(|e| format!("invalid url: {}", e)),
                other => Err(format!("expected url string, got {}", kind_of(other))),
            },
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

impl FromStr for VarType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(VarType::String),
            "int" => Ok(VarType::Int),
            "float" => Ok(VarType::Float),
            "bool" => Ok(VarType::Bool),
            "json" => Ok(VarType::Json),
            "enum" => Ok(VarType::Enum),
            "url" => Ok(VarType::Url),
            other => Err(format!(
                "unknown type '{}' (expected one of {})",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarType::String => "string",
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::Bool => "bool",
            VarType::Json => "json",
            VarType::Enum => "enum",
            VarType::Url => "url",
        };
        f.write_str(name)
    }
}
