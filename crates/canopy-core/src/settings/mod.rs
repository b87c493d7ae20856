//! Typed configuration registry with runtime overrides

pub mod store;
pub mod types;

pub use store::Settings;
pub use types::{
	FrozenSettingsRegistry, SettingDefinition, SettingDefinitionBuilder, SettingValue,
	SettingsRegistry,
};

// vim: ts=4
