//! Settings types and definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::prelude::*;

/// Type alias for setting validator function
pub type SettingValidator = Box<dyn Fn(&SettingValue) -> PermResult<()> + Send + Sync>;

/// Setting value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)] // No type tag - type inferred from SettingDefinition
pub enum SettingValue {
	Bool(bool), // Must be before Int to avoid bool -> int coercion
	Int(i64),
	String(String),
	Json(serde_json::Value),
}

impl SettingValue {
	/// Check if this value matches the type of another value
	pub fn matches_type(&self, other: &SettingValue) -> bool {
		matches!(
			(self, other),
			(SettingValue::String(_), SettingValue::String(_))
				| (SettingValue::Int(_), SettingValue::Int(_))
				| (SettingValue::Bool(_), SettingValue::Bool(_))
				| (SettingValue::Json(_), SettingValue::Json(_))
		)
	}

	/// Get the type name for error messages
	pub fn type_name(&self) -> &'static str {
		match self {
			SettingValue::String(_) => "string",
			SettingValue::Int(_) => "int",
			SettingValue::Bool(_) => "bool",
			SettingValue::Json(_) => "json",
		}
	}

	/// Parse a raw string (environment variable, CLI flag) into the type of `like`
	pub fn parse_like(raw: &str, like: &SettingValue) -> PermResult<SettingValue> {
		let raw = raw.trim();
		match like {
			SettingValue::Bool(_) => match raw.to_ascii_lowercase().as_str() {
				"1" | "true" | "yes" | "on" => Ok(SettingValue::Bool(true)),
				"0" | "false" | "no" | "off" => Ok(SettingValue::Bool(false)),
				_ => Err(Error::ConfigError(format!("'{}' is not a boolean", raw))),
			},
			SettingValue::Int(_) => raw
				.parse::<i64>()
				.map(SettingValue::Int)
				.map_err(|_| Error::ConfigError(format!("'{}' is not an integer", raw))),
			SettingValue::String(_) => Ok(SettingValue::String(raw.to_string())),
			SettingValue::Json(_) => serde_json::from_str(raw)
				.map(SettingValue::Json)
				.map_err(|e| Error::ConfigError(format!("'{}' is not valid JSON: {}", raw, e))),
		}
	}
}

/// Setting definition - defines metadata for each setting
pub struct SettingDefinition {
	/// Dot-separated key (e.g., "perm.max_depth")
	pub key: String,

	/// Human-readable description
	pub description: String,

	/// Optional default value
	/// If None and optional=false, the setting MUST be configured
	pub default: Option<SettingValue>,

	/// Whether this setting is optional (can be unconfigured even without a default)
	pub optional: bool,

	/// Optional validation function
	pub validator: Option<SettingValidator>,
}

impl Clone for SettingDefinition {
	fn clone(&self) -> Self {
		SettingDefinition {
			key: self.key.clone(),
			description: self.description.clone(),
			default: self.default.clone(),
			optional: self.optional,
			validator: None, // Don't clone the validator function
		}
	}
}

impl Debug for SettingDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingDefinition")
			.field("key", &self.key)
			.field("description", &self.description)
			.field("default", &self.default)
			.field("optional", &self.optional)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl SettingDefinition {
	pub fn builder(key: impl Into<String>) -> SettingDefinitionBuilder {
		SettingDefinitionBuilder::new(key)
	}

	/// Check type against the default and run the validator
	pub fn validate(&self, value: &SettingValue) -> PermResult<()> {
		if let Some(default) = &self.default {
			if !value.matches_type(default) {
				return Err(Error::ValidationError(format!(
					"Type mismatch for setting '{}': expected {}, got {}",
					self.key,
					default.type_name(),
					value.type_name()
				)));
			}
		}

		if let Some(validator) = &self.validator {
			validator(value)?;
		}
		Ok(())
	}
}

/// Builder for SettingDefinition with fluent API
pub struct SettingDefinitionBuilder {
	key: String,
	description: Option<String>,
	default: Option<SettingValue>,
	optional: bool,
	validator: Option<SettingValidator>,
}

impl SettingDefinitionBuilder {
	pub fn new(key: impl Into<String>) -> Self {
		Self { key: key.into(), description: None, default: None, optional: false, validator: None }
	}

	/// Set the description (required)
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Set the default value (optional - if not set, setting is required)
	pub fn default(mut self, value: SettingValue) -> Self {
		self.default = Some(value);
		self
	}

	/// Mark this setting as optional (can be unconfigured)
	pub fn optional(mut self, optional: bool) -> Self {
		self.optional = optional;
		self
	}

	pub fn validator<F>(mut self, f: F) -> Self
	where
		F: Fn(&SettingValue) -> PermResult<()> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(f));
		self
	}

	pub fn build(self) -> PermResult<SettingDefinition> {
		let description = self
			.description
			.ok_or_else(|| Error::ConfigError("Setting description is required".into()))?;

		if !self.key.contains('.') {
			return Err(Error::ConfigError(format!(
				"Setting key '{}' must be namespaced (e.g. 'perm.max_depth')",
				self.key
			)));
		}

		let def = SettingDefinition {
			key: self.key,
			description,
			default: self.default,
			optional: self.optional,
			validator: self.validator,
		};

		// A default that fails its own validator is a registration bug
		if let Some(default) = &def.default {
			def.validate(default)?;
		}
		Ok(def)
	}
}

/// Mutable registry used during initialization
pub struct SettingsRegistry {
	definitions: HashMap<String, SettingDefinition>,
}

impl SettingsRegistry {
	pub fn new() -> Self {
		Self { definitions: HashMap::new() }
	}

	/// Register a new setting definition
	pub fn register(&mut self, def: SettingDefinition) -> PermResult<()> {
		if self.definitions.contains_key(&def.key) {
			return Err(Error::ConfigError(format!("Setting '{}' is already registered", def.key)));
		}

		tracing::debug!("Registering setting: {}", def.key);
		self.definitions.insert(def.key.clone(), def);
		Ok(())
	}

	/// Freeze the registry (make it immutable)
	pub fn freeze(self) -> FrozenSettingsRegistry {
		tracing::debug!("Freezing settings registry with {} definitions", self.definitions.len());
		FrozenSettingsRegistry { definitions: self.definitions }
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

impl Default for SettingsRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// Immutable registry shared by all settings readers
pub struct FrozenSettingsRegistry {
	definitions: HashMap<String, SettingDefinition>,
}

impl FrozenSettingsRegistry {
	pub fn get(&self, key: &str) -> Option<&SettingDefinition> {
		self.definitions.get(key)
	}

	/// List all registered settings
	pub fn list(&self) -> impl Iterator<Item = &SettingDefinition> {
		self.definitions.values()
	}

	/// List settings with a specific prefix
	pub fn list_by_prefix<'a>(
		&'a self,
		prefix: &'a str,
	) -> Box<dyn Iterator<Item = &'a SettingDefinition> + 'a> {
		Box::new(self.definitions.values().filter(move |def| def.key.starts_with(prefix)))
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder_requires_description() {
		let res = SettingDefinition::builder("perm.x").default(SettingValue::Int(1)).build();
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_builder_requires_namespace() {
		let res = SettingDefinition::builder("flat").description("d").build();
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_default_must_pass_validator() {
		let res = SettingDefinition::builder("perm.depth")
			.description("depth")
			.default(SettingValue::Int(0))
			.validator(|v| match v {
				SettingValue::Int(n) if *n > 0 => Ok(()),
				_ => Err(Error::ValidationError("must be positive".into())),
			})
			.build();
		assert!(matches!(res, Err(Error::ValidationError(_))));
	}

	#[test]
	fn test_duplicate_registration() {
		let mut registry = SettingsRegistry::new();
		let def = || SettingDefinition::builder("perm.flag").description("flag").build();
		registry.register(def().expect("build")).expect("register");
		assert!(matches!(registry.register(def().expect("build")), Err(Error::ConfigError(_))));
		assert_eq!(registry.freeze().len(), 1);
	}

	#[test]
	fn test_parse_like() {
		let b = SettingValue::parse_like("yes", &SettingValue::Bool(false)).expect("bool");
		assert_eq!(b, SettingValue::Bool(true));
		let i = SettingValue::parse_like(" 42 ", &SettingValue::Int(0)).expect("int");
		assert_eq!(i, SettingValue::Int(42));
		let j = SettingValue::parse_like(r#"["A","B"]"#, &SettingValue::Json(serde_json::Value::Null))
			.expect("json");
		assert_eq!(j, SettingValue::Json(serde_json::json!(["A", "B"])));
		assert!(SettingValue::parse_like("maybe", &SettingValue::Bool(false)).is_err());
		assert!(SettingValue::parse_like("1.5", &SettingValue::Int(0)).is_err());
	}

	#[test]
	fn test_untagged_deserialize_prefers_bool() {
		let v: SettingValue = serde_json::from_str("true").expect("parse");
		assert_eq!(v, SettingValue::Bool(true));
		let v: SettingValue = serde_json::from_str("7").expect("parse");
		assert_eq!(v, SettingValue::Int(7));
	}
}

// vim: ts=4
