//! Settings store: registered defaults plus runtime overrides

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::types::{FrozenSettingsRegistry, SettingValue};
use crate::prelude::*;

/// Resolved settings (override -> default)
pub struct Settings {
	registry: Arc<FrozenSettingsRegistry>,
	overrides: RwLock<HashMap<String, SettingValue>>,
}

impl Settings {
	pub fn new(registry: Arc<FrozenSettingsRegistry>) -> Self {
		Self { registry, overrides: RwLock::new(HashMap::new()) }
	}

	pub fn registry(&self) -> &FrozenSettingsRegistry {
		&self.registry
	}

	/// Get setting value with full resolution (override -> default)
	pub fn get(&self, key: &str) -> PermResult<SettingValue> {
		let def = self
			.registry
			.get(key)
			.ok_or_else(|| Error::ValidationError(format!("Unknown setting: {}", key)))?;

		if let Some(value) = self.overrides.read().get(key) {
			return Ok(value.clone());
		}

		def.default.clone().ok_or_else(|| {
			Error::ValidationError(format!("Setting '{}' has no default and must be configured", key))
		})
	}

	/// Override a setting after type and validator checks
	pub fn set(&self, key: &str, value: SettingValue) -> PermResult<()> {
		let def = self
			.registry
			.get(key)
			.ok_or_else(|| Error::ValidationError(format!("Unknown setting: {}", key)))?;
		def.validate(&value)?;

		self.overrides.write().insert(key.to_string(), value);
		info!("Setting '{}' overridden", key);
		Ok(())
	}

	/// Drop an override (falls back to the default). Returns whether one existed.
	pub fn delete(&self, key: &str) -> bool {
		self.overrides.write().remove(key).is_some()
	}

	/// Validate that all required settings (no default and not optional) are configured
	pub fn validate_required_settings(&self) -> PermResult<()> {
		let overrides = self.overrides.read();
		for def in self.registry.list() {
			if def.optional || def.default.is_some() {
				continue;
			}
			if !overrides.contains_key(&def.key) {
				return Err(Error::ValidationError(format!(
					"Required setting '{}' is not configured",
					def.key
				)));
			}
		}
		Ok(())
	}

	/// Apply overrides from environment-style variables.
	///
	/// `perm.max_depth` is read from `{PREFIX}_PERM_MAX_DEPTH` and parsed
	/// according to the type of the registered default.
	pub fn apply_env_from<I, K, V>(&self, prefix: &str, vars: I) -> PermResult<usize>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let vars: HashMap<String, String> =
			vars.into_iter().map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string())).collect();

		let mut applied = 0;
		for def in self.registry.list() {
			let var_name = env_var_name(prefix, &def.key);
			let Some(raw) = vars.get(&var_name) else {
				continue;
			};
			let Some(default) = &def.default else {
				warn!("Ignoring {}: setting '{}' has no default to infer a type from", var_name, def.key);
				continue;
			};

			let value = SettingValue::parse_like(raw, default)?;
			self.set(&def.key, value)?;
			debug!("Setting '{}' loaded from {}", def.key, var_name);
			applied += 1;
		}
		Ok(applied)
	}

	/// Apply overrides from the process environment
	pub fn apply_env(&self, prefix: &str) -> PermResult<usize> {
		self.apply_env_from(prefix, std::env::vars())
	}

	/// Type-safe getters (returns error if not found)
	pub fn get_string(&self, key: &str) -> PermResult<String> {
		match self.get(key)? {
			SettingValue::String(s) => Ok(s),
			v => Err(Error::ValidationError(format!(
				"Setting '{}' is not a string, got {}",
				key,
				v.type_name()
			))),
		}
	}

	pub fn get_int(&self, key: &str) -> PermResult<i64> {
		match self.get(key)? {
			SettingValue::Int(i) => Ok(i),
			v => Err(Error::ValidationError(format!(
				"Setting '{}' is not an integer, got {}",
				key,
				v.type_name()
			))),
		}
	}

	pub fn get_bool(&self, key: &str) -> PermResult<bool> {
		match self.get(key)? {
			SettingValue::Bool(b) => Ok(b),
			v => Err(Error::ValidationError(format!(
				"Setting '{}' is not a boolean, got {}",
				key,
				v.type_name()
			))),
		}
	}

	pub fn get_json(&self, key: &str) -> PermResult<serde_json::Value> {
		match self.get(key)? {
			SettingValue::Json(j) => Ok(j),
			v => Err(Error::ValidationError(format!(
				"Setting '{}' is not JSON, got {}",
				key,
				v.type_name()
			))),
		}
	}

	/// JSON setting holding an array of strings
	pub fn get_string_list(&self, key: &str) -> PermResult<Vec<Box<str>>> {
		let json = self.get_json(key)?;
		serde_json::from_value::<Vec<String>>(json)
			.map(|list| list.into_iter().map(String::into_boxed_str).collect())
			.map_err(|_| Error::ValidationError(format!("Setting '{}' is not a string list", key)))
	}
}

fn env_var_name(prefix: &str, key: &str) -> String {
	let key = key.replace(['.', '-'], "_").to_ascii_uppercase();
	if prefix.is_empty() { key } else { format!("{}_{}", prefix, key) }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::settings::{SettingDefinition, SettingsRegistry};

	fn settings() -> Settings {
		let mut registry = SettingsRegistry::new();
		registry
			.register(
				SettingDefinition::builder("test.enabled")
					.description("flag")
					.default(SettingValue::Bool(true))
					.build()
					.expect("build"),
			)
			.expect("register");
		registry
			.register(
				SettingDefinition::builder("test.limit")
					.description("limit")
					.default(SettingValue::Int(10))
					.validator(|v| match v {
						SettingValue::Int(n) if *n > 0 => Ok(()),
						_ => Err(Error::ValidationError("limit must be positive".into())),
					})
					.build()
					.expect("build"),
			)
			.expect("register");
		registry
			.register(
				SettingDefinition::builder("test.required")
					.description("no default")
					.build()
					.expect("build"),
			)
			.expect("register");
		Settings::new(Arc::new(registry.freeze()))
	}

	#[test]
	fn test_default_and_override() {
		let settings = settings();
		assert!(settings.get_bool("test.enabled").expect("get"));

		settings.set("test.enabled", SettingValue::Bool(false)).expect("set");
		assert!(!settings.get_bool("test.enabled").expect("get"));

		assert!(settings.delete("test.enabled"));
		assert!(settings.get_bool("test.enabled").expect("get"));
		assert!(!settings.delete("test.enabled"));
	}

	#[test]
	fn test_set_rejects_wrong_type_and_invalid_value() {
		let settings = settings();
		let res = settings.set("test.limit", SettingValue::String("many".into()));
		assert!(matches!(res, Err(Error::ValidationError(_))));
		let res = settings.set("test.limit", SettingValue::Int(0));
		assert!(matches!(res, Err(Error::ValidationError(_))));
		let res = settings.set("test.unknown", SettingValue::Int(1));
		assert!(matches!(res, Err(Error::ValidationError(_))));
		assert!(settings.get_bool("test.limit").is_err());
	}

	#[test]
	fn test_required_settings() {
		let settings = settings();
		assert!(settings.get("test.required").is_err());
		assert!(settings.validate_required_settings().is_err());
		settings.set("test.required", SettingValue::String("x".into())).expect("set");
		assert!(settings.validate_required_settings().is_ok());
	}

	#[test]
	fn test_apply_env_from() {
		let settings = settings();
		let applied = settings
			.apply_env_from("CANOPY", [("CANOPY_TEST_LIMIT", "25"), ("CANOPY_TEST_ENABLED", "off"), ("OTHER", "1")])
			.expect("apply");
		assert_eq!(applied, 2);
		assert_eq!(settings.get_int("test.limit").expect("get"), 25);
		assert!(!settings.get_bool("test.enabled").expect("get"));

		let res = settings.apply_env_from("CANOPY", [("CANOPY_TEST_LIMIT", "-3")]);
		assert!(res.is_err(), "Validator runs for environment overrides");
	}

	#[test]
	fn test_env_var_name() {
		assert_eq!(env_var_name("CANOPY", "perm.max_depth"), "CANOPY_PERM_MAX_DEPTH");
		assert_eq!(env_var_name("", "perm.cache-capacity"), "PERM_CACHE_CAPACITY");
	}
}

// vim: ts=4
