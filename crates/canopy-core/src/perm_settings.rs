//! Permission engine settings registration
//!
//! Registers the `perm.*` settings and resolves them into a `PermissionConfig`.

use std::sync::Arc;

use crate::prelude::*;
use crate::settings::{SettingDefinition, SettingValue, Settings, SettingsRegistry};
use canopy_types::types::ADMIN_CODE;

/// Codes that only administrators may hand out through roles
const DEFAULT_PRIVILEGED_CODES: [&str; 3] = [ADMIN_CODE, "APPLY_ROLES", "EDIT_PERMISSIONS"];

fn positive_int(value: &SettingValue) -> PermResult<()> {
	match value {
		SettingValue::Int(n) if *n > 0 => Ok(()),
		_ => Err(Error::ValidationError("value must be a positive integer".into())),
	}
}

fn string_list(value: &SettingValue) -> PermResult<()> {
	match value {
		SettingValue::Json(serde_json::Value::Array(items))
			if items.iter().all(serde_json::Value::is_string) =>
		{
			Ok(())
		}
		_ => Err(Error::ValidationError("value must be a JSON array of strings".into())),
	}
}

/// Register all permission settings
pub fn register_settings(registry: &mut SettingsRegistry) -> PermResult<()> {
	registry.register(
		SettingDefinition::builder("perm.admin_implies_all")
			.description("Members holding ADMIN pass every permission code check")
			.default(SettingValue::Bool(true))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("perm.global_edit_codes")
			.description("Codes a member needs (any of) before any record edit check")
			.default(SettingValue::Json(serde_json::json!([])))
			.validator(string_list)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("perm.privileged_codes")
			.description("Codes whose roles may only be applied by administrators")
			.default(SettingValue::Json(serde_json::json!(DEFAULT_PRIVILEGED_CODES)))
			.validator(string_list)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("perm.cache_capacity")
			.description("Number of members whose permission codes are kept in memory")
			.default(SettingValue::Int(1000))
			.validator(positive_int)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("perm.max_depth")
			.description("Deepest parent or child chain followed before resolving to deny")
			.default(SettingValue::Int(64))
			.validator(positive_int)
			.build()?,
	)?;

	Ok(())
}

/// Resolved permission engine configuration
#[derive(Debug, Clone)]
pub struct PermissionConfig {
	pub admin_implies_all: bool,
	pub global_edit_codes: Vec<Box<str>>,
	pub privileged_codes: Vec<Box<str>>,
	pub cache_capacity: usize,
	pub max_depth: usize,
}

impl Default for PermissionConfig {
	fn default() -> Self {
		Self {
			admin_implies_all: true,
			global_edit_codes: Vec::new(),
			privileged_codes: DEFAULT_PRIVILEGED_CODES.iter().map(|c| Box::from(*c)).collect(),
			cache_capacity: 1000,
			max_depth: 64,
		}
	}
}

impl PermissionConfig {
	pub fn from_settings(settings: &Settings) -> PermResult<Self> {
		let to_usize = |key: &str| -> PermResult<usize> {
			usize::try_from(settings.get_int(key)?)
				.map_err(|_| Error::ConfigError(format!("Setting '{}' is out of range", key)))
		};

		Ok(Self {
			admin_implies_all: settings.get_bool("perm.admin_implies_all")?,
			global_edit_codes: settings.get_string_list("perm.global_edit_codes")?,
			privileged_codes: settings.get_string_list("perm.privileged_codes")?,
			cache_capacity: to_usize("perm.cache_capacity")?,
			max_depth: to_usize("perm.max_depth")?,
		})
	}

	/// Registry with the permission settings, overridden from `{prefix}_PERM_*` variables
	pub fn settings_from_env(prefix: &str) -> PermResult<Settings> {
		let mut registry = SettingsRegistry::new();
		register_settings(&mut registry)?;
		let settings = Settings::new(Arc::new(registry.freeze()));
		settings.apply_env(prefix)?;
		Ok(settings)
	}

	pub fn from_env(prefix: &str) -> PermResult<Self> {
		Self::from_settings(&Self::settings_from_env(prefix)?)
	}

	pub fn is_privileged(&self, code: &str) -> bool {
		self.privileged_codes.iter().any(|c| &**c == code)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn settings() -> Settings {
		let mut registry = SettingsRegistry::new();
		register_settings(&mut registry).expect("register");
		Settings::new(Arc::new(registry.freeze()))
	}

	#[test]
	fn test_defaults_match_registry() {
		let config = PermissionConfig::from_settings(&settings()).expect("config");
		let default = PermissionConfig::default();
		assert_eq!(config.admin_implies_all, default.admin_implies_all);
		assert_eq!(config.global_edit_codes, default.global_edit_codes);
		assert_eq!(config.privileged_codes, default.privileged_codes);
		assert_eq!(config.cache_capacity, 1000);
		assert_eq!(config.max_depth, 64);
		assert!(config.is_privileged("EDIT_PERMISSIONS"));
		assert!(!config.is_privileged("CMS_ACCESS"));
	}

	#[test]
	fn test_overrides_from_env() {
		let settings = settings();
		settings
			.apply_env_from(
				"CANOPY",
				[
					("CANOPY_PERM_ADMIN_IMPLIES_ALL", "false"),
					("CANOPY_PERM_GLOBAL_EDIT_CODES", r#"["CMS_ACCESS"]"#),
					("CANOPY_PERM_MAX_DEPTH", "8"),
				],
			)
			.expect("apply");

		let config = PermissionConfig::from_settings(&settings).expect("config");
		assert!(!config.admin_implies_all);
		assert_eq!(config.global_edit_codes, vec![Box::<str>::from("CMS_ACCESS")]);
		assert_eq!(config.max_depth, 8);
	}

	#[test]
	fn test_rejects_bad_values() {
		let settings = settings();
		assert!(settings.set("perm.max_depth", SettingValue::Int(0)).is_err());
		assert!(settings.set("perm.global_edit_codes", SettingValue::Json(serde_json::json!([1, 2]))).is_err());
		assert!(settings.set("perm.global_edit_codes", SettingValue::Json(serde_json::json!("x"))).is_err());
	}
}

// vim: ts=4
