//! Contract entity - the declared schema of configuration variables
//!
//! A contract is parsed fresh on every invocation from its document form.
//! Validation happens in two passes: every variable on its own, then the
//! rename aliases across the whole contract. Any failure rejects the
//! contract as a whole.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::value_objects::{LifecycleState, VarType};
use crate::error::{EnvgateError, EnvgateResult};

use super::secret_config::validate_secret_name;

/// Contract document as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractDocument {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableDocument>,
}

/// One variable definition as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariableDocument {
    #[serde(rename = "type", default)]
    pub var_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub secret: bool,
    #[serde(default)]
    pub secret_ref: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    /// Allowed members of an `enum` variable
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub state: Option<String>,
    /// Legacy boolean lifecycle encoding
    #[serde(default)]
    pub deprecated: Option<bool>,
    #[serde(default)]
    pub deprecate_after: Option<String>,
    #[serde(default)]
    pub replacement: Option<String>,
    /// Legacy spelling of `replacement`
    #[serde(default)]
    pub replaced_by: Option<String>,
    #[serde(default)]
    pub migration: Option<MigrationDocument>,
}

/// Migration metadata of a variable
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MigrationDocument {
    #[serde(default)]
    pub rename_from: Option<String>,
}

/// A validated contract variable
#[derive(Debug, Clone, PartialEq)]
pub struct ContractVariable {
    pub name: String,
    pub var_type: VarType,
    pub required: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// Name of the secret-reference entry backing this variable
    pub secret_ref: Option<String>,
    /// Environments this variable applies to; `None` means all
    pub scopes: Option<BTreeSet<String>>,
    pub allowed_values: Vec<String>,
    pub state: LifecycleState,
    pub deprecate_after: Option<NaiveDate>,
    pub replacement: Option<String>,
    pub rename_from: Option<String>,
}

impl ContractVariable {
    pub fn is_secret(&self) -> bool {
        self.secret_ref.is_some()
    }

    pub fn is_removed(&self) -> bool {
        self.state.is_removed()
    }

    /// Whether the variable applies to the given environment
    pub fn in_scope(&self, env: &str) -> bool {
        self.scopes.as_ref().map_or(true, |s| s.contains(env))
    }

    /// In scope for `env` and not removed
    pub fn is_live_in(&self, env: &str) -> bool {
        !self.is_removed() && self.in_scope(env)
    }

    /// Type check a value against this variable's declared type
    pub fn check_value(&self, value: &Value) -> Result<(), String> {
        self.var_type.check(value, &self.allowed_values)
    }

    /// Human readable deprecation notice, if deprecated
    pub fn deprecation_notice(&self) -> Option<String> {
        if !self.state.is_deprecated() {
            return None;
        }
        let mut notice = format!("{} is deprecated", self.name);
        if let Some(date) = self.deprecate_after {
            notice.push_str(&format!(" after {}", date));
        }
        if let Some(replacement) = &self.replacement {
            notice.push_str(&format!("; use {} instead", replacement));
        }
        Some(notice)
    }
}

/// A validated contract
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contract {
    variables: BTreeMap<String, ContractVariable>,
    /// Legacy name -> canonical name
    aliases: BTreeMap<String, String>,
}

impl Contract {
    /// Validate a contract document
    pub fn from_document(doc: ContractDocument) -> EnvgateResult<Self> {
        if let Some(version) = doc.version {
            if version != 1 {
                return Err(EnvgateError::schema(
                    "version",
                    format!("unsupported contract version {}", version),
                ));
            }
        }

        let mut variables = BTreeMap::new();
        for (name, var_doc) in doc.variables {
            let variable = validate_variable(&name, var_doc)?;
            variables.insert(name, variable);
        }

        let aliases = resolve_aliases(&variables)?;

        for variable in variables.values() {
            if let Some(replacement) = &variable.replacement {
                match variables.get(replacement) {
                    Some(target) if !target.is_removed() => {}
                    Some(_) => {
                        return Err(EnvgateError::schema(
                            format!("variables.{}.replacement", variable.name),
                            format!("replacement '{}' is removed", replacement),
                        ))
                    }
                    None => {
                        return Err(EnvgateError::schema(
                            format!("variables.{}.replacement", variable.name),
                            format!("replacement '{}' is not a contract variable", replacement),
                        ))
                    }
                }
            }
        }

        Ok(Self { variables, aliases })
    }

    pub fn get(&self, name: &str) -> Option<&ContractVariable> {
        self.variables.get(name)
    }

    /// Canonical name for a legacy `rename_from` alias
    pub fn resolve_alias(&self, legacy: &str) -> Option<&str> {
        self.aliases.get(legacy).map(String::as_str)
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    pub fn variables(&self) -> impl Iterator<Item = &ContractVariable> {
        self.variables.values()
    }

    /// Whether `name` is a contract variable that applies to `env`
    pub fn in_scope(&self, name: &str, env: &str) -> bool {
        self.get(name).is_some_and(|v| v.in_scope(env))
    }

    /// Variables that are in scope for `env` and not removed
    pub fn live_in<'a>(&'a self, env: &'a str) -> impl Iterator<Item = &'a ContractVariable> {
        self.variables.values().filter(move |v| v.is_live_in(env))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Upper-snake identifier: `[A-Z][A-Z0-9_]*`
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn validate_variable(name: &str, doc: VariableDocument) -> EnvgateResult<ContractVariable> {
    let at = |field: &str| format!("variables.{}.{}", name, field);

    if !is_valid_name(name) {
        return Err(EnvgateError::schema(
            format!("variables.{}", name),
            "variable names must be UPPER_SNAKE_CASE",
        ));
    }

    let var_type: VarType = doc
        .var_type
        .as_deref()
        .unwrap_or("string")
        .parse()
        .map_err(|e: String| EnvgateError::schema(at("type"), e))?;

    let allowed_values = match (var_type, doc.values) {
        (VarType::Enum, Some(values)) if !values.is_empty() => values,
        (VarType::Enum, _) => {
            return Err(EnvgateError::schema(
                at("values"),
                "enum variables must list their allowed values",
            ))
        }
        (_, Some(_)) => {
            return Err(EnvgateError::schema(
                at("values"),
                "only enum variables may declare values",
            ))
        }
        (_, None) => Vec::new(),
    };

    let state = lifecycle_state(name, doc.state.as_deref(), doc.deprecated)?;

    let replacement = match (doc.replacement, doc.replaced_by) {
        (Some(_), Some(_)) => {
            return Err(EnvgateError::schema(
                at("replaced_by"),
                "set either replacement or replaced_by, not both",
            ))
        }
        (a, b) => a.or(b),
    };

    if !state.is_deprecated() {
        if doc.deprecate_after.is_some() {
            return Err(EnvgateError::schema(
                at("deprecate_after"),
                format!("only valid when state is deprecated (state is {})", state),
            ));
        }
        if replacement.is_some() {
            return Err(EnvgateError::schema(
                at("replacement"),
                format!("only valid when state is deprecated (state is {})", state),
            ));
        }
    }

    let deprecate_after = doc
        .deprecate_after
        .as_deref()
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                EnvgateError::schema(at("deprecate_after"), format!("'{}' is not a YYYY-MM-DD date", raw))
            })
        })
        .transpose()?;

    let secret_ref = match (doc.secret, doc.secret_ref) {
        (true, Some(r)) if !r.trim().is_empty() => {
            validate_secret_name(&at("secret_ref"), &r)?;
            Some(r)
        }
        (true, _) => {
            return Err(EnvgateError::schema(
                at("secret_ref"),
                "secret variables must name a secret_ref",
            ))
        }
        (false, Some(_)) => {
            return Err(EnvgateError::schema(
                at("secret_ref"),
                "secret_ref is only valid on secret variables",
            ))
        }
        (false, None) => None,
    };

    if secret_ref.is_some() && doc.default.is_some() {
        return Err(EnvgateError::schema(
            at("default"),
            "secret variables must not declare a default",
        ));
    }

    if let Some(default) = &doc.default {
        var_type
            .check(default, &allowed_values)
            .map_err(|e| EnvgateError::schema(at("default"), e))?;
    }

    let scopes = match doc.scopes {
        Some(list) if list.is_empty() => {
            return Err(EnvgateError::schema(at("scopes"), "scopes must not be empty"))
        }
        Some(list) => Some(list.into_iter().collect::<BTreeSet<_>>()),
        None => None,
    };

    let rename_from = doc.migration.and_then(|m| m.rename_from);
    if let Some(old) = &rename_from {
        if !is_valid_name(old) {
            return Err(EnvgateError::schema(
                at("migration.rename_from"),
                format!("'{}' is not an UPPER_SNAKE_CASE name", old),
            ));
        }
        if old == name {
            return Err(EnvgateError::schema(
                at("migration.rename_from"),
                "a variable cannot be renamed from itself",
            ));
        }
    }

    Ok(ContractVariable {
        name: name.to_string(),
        var_type,
        required: doc.required,
        default: doc.default,
        description: doc.description,
        secret_ref,
        scopes,
        allowed_values,
        state,
        deprecate_after,
        replacement,
        rename_from,
    })
}

/// Reconcile the explicit `state` with the legacy `deprecated` flag
fn lifecycle_state(
    name: &str,
    state: Option<&str>,
    deprecated: Option<bool>,
) -> EnvgateResult<LifecycleState> {
    let explicit = state
        .map(|s| s.parse::<LifecycleState>())
        .transpose()
        .map_err(|e| EnvgateError::schema(format!("variables.{}.state", name), e))?;

    match (explicit, deprecated) {
        (Some(s), Some(true)) if !s.is_deprecated() => Err(EnvgateError::schema(
            format!("variables.{}.deprecated", name),
            format!("deprecated: true conflicts with state: {}", s),
        )),
        (Some(s), Some(false)) if s.is_deprecated() => Err(EnvgateError::schema(
            format!("variables.{}.deprecated", name),
            "deprecated: false conflicts with state: deprecated",
        )),
        (Some(s), _) => Ok(s),
        (None, Some(true)) => Ok(LifecycleState::Deprecated),
        (None, _) => Ok(LifecycleState::Active),
    }
}

fn resolve_aliases(
    variables: &BTreeMap<String, ContractVariable>,
) -> EnvgateResult<BTreeMap<String, String>> {
    let mut aliases: BTreeMap<String, String> = BTreeMap::new();

    for variable in variables.values() {
        let Some(old) = &variable.rename_from else {
            continue;
        };
        let path = format!("variables.{}.migration.rename_from", variable.name);

        if let Some(claimed_by) = aliases.get(old) {
            return Err(EnvgateError::schema(
                path,
                format!("'{}' is already the rename source of {}", old, claimed_by),
            ));
        }
        if let Some(existing) = variables.get(old) {
            if !existing.is_removed() {
                return Err(EnvgateError::schema(
                    path,
                    format!(
                        "'{}' is still defined with state {}; mark it removed before renaming",
                        old, existing.state
                    ),
                ));
            }
        }
        aliases.insert(old.clone(), variable.name.clone());
    }

    Ok(aliases)
}
