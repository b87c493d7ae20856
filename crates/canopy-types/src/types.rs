//! Common types used throughout the Canopy permission engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::prelude::*;

// Identifiers //
//*************//
macro_rules! id_type {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
		pub struct $name(pub i64);

		impl $name {
			/// IDs start at 1; zero and negative values never refer to a stored row
			pub fn is_valid(self) -> bool {
				self.0 > 0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl Serialize for $name {
			fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
			where
				S: serde::Serializer,
			{
				serializer.serialize_i64(self.0)
			}
		}

		impl<'de> Deserialize<'de> for $name {
			fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
			where
				D: serde::Deserializer<'de>,
			{
				Ok($name(i64::deserialize(deserializer)?))
			}
		}
	};
}

id_type!(
	/// Primary key of a hierarchical record (page, folder, ...)
	RecordId
);
id_type!(MemberId);
id_type!(GroupId);
id_type!(RoleId);
id_type!(PermissionId);

impl RecordId {
	/// Parse a batch of externally supplied IDs, silently dropping anything
	/// that is not a positive integer.
	///
	/// # Examples
	/// ```
	/// use canopy_types::types::RecordId;
	/// assert_eq!(RecordId::parse_list(&["3", "x", "0", " 7 "]), vec![RecordId(3), RecordId(7)]);
	/// ```
	pub fn parse_list<S: AsRef<str>>(ids: &[S]) -> Vec<RecordId> {
		ids.iter()
			.filter_map(|id| id.as_ref().trim().parse::<i64>().ok())
			.map(RecordId)
			.filter(|id| id.is_valid())
			.collect()
	}
}

// PermissionType //
//****************//
/// The operation a permission check is made for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionType {
	View,
	Edit,
	Delete,
}

impl PermissionType {
	pub const ALL: [PermissionType; 3] =
		[PermissionType::View, PermissionType::Edit, PermissionType::Delete];

	pub fn as_str(self) -> &'static str {
		match self {
			PermissionType::View => "view",
			PermissionType::Edit => "edit",
			PermissionType::Delete => "delete",
		}
	}

	/// Policy field consulted for this operation. Delete reuses the edit policy.
	pub fn policy_field(self) -> PolicyField {
		match self {
			PermissionType::View => PolicyField::View,
			PermissionType::Edit | PermissionType::Delete => PolicyField::Edit,
		}
	}
}

impl fmt::Display for PermissionType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PermissionType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"view" => Ok(PermissionType::View),
			"edit" => Ok(PermissionType::Edit),
			"delete" => Ok(PermissionType::Delete),
			_ => Err(Error::InvalidArgument(format!("invalid permission type '{}'", s))),
		}
	}
}

// PolicyField //
//*************//
/// Which per-record policy (and which link tables) a check reads
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolicyField {
	View,
	Edit,
}

impl PolicyField {
	pub fn code(self) -> &'static str {
		match self {
			PolicyField::View => "V",
			PolicyField::Edit => "E",
		}
	}
}

// InheritType //
//*************//
/// Per-record access policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InheritType {
	Anyone,
	LoggedInUsers,
	/// Members of the record's viewer/editor groups
	OnlyTheseUsers,
	/// Members explicitly linked to the record
	OnlyTheseMembers,
	#[default]
	Inherit,
}

impl InheritType {
	pub fn as_str(self) -> &'static str {
		match self {
			InheritType::Anyone => "Anyone",
			InheritType::LoggedInUsers => "LoggedInUsers",
			InheritType::OnlyTheseUsers => "OnlyTheseUsers",
			InheritType::OnlyTheseMembers => "OnlyTheseMembers",
			InheritType::Inherit => "Inherit",
		}
	}
}

impl fmt::Display for InheritType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for InheritType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Anyone" => Ok(InheritType::Anyone),
			"LoggedInUsers" => Ok(InheritType::LoggedInUsers),
			"OnlyTheseUsers" => Ok(InheritType::OnlyTheseUsers),
			"OnlyTheseMembers" => Ok(InheritType::OnlyTheseMembers),
			"Inherit" => Ok(InheritType::Inherit),
			_ => Err(Error::InvalidArgument(format!("invalid inherit type '{}'", s))),
		}
	}
}

// Stage //
//*******//
/// Versioning stage. Unversioned classes live in the base (draft) stage only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
	Draft,
	Live,
}

impl Stage {
	/// Evaluation order for versioned classes: draft wins over live
	pub const ORDERED: [Stage; 2] = [Stage::Draft, Stage::Live];

	pub fn code(self) -> &'static str {
		match self {
			Stage::Draft => "D",
			Stage::Live => "L",
		}
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Stage::Draft => f.write_str("Draft"),
			Stage::Live => f.write_str("Live"),
		}
	}
}

// PermissionKind //
//****************//
/// Type of a permission row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionKind {
	Grant,
	Deny,
	Inherit,
}

impl PermissionKind {
	pub fn code(self) -> i64 {
		match self {
			PermissionKind::Grant => 1,
			PermissionKind::Deny => -1,
			PermissionKind::Inherit => 0,
		}
	}

	pub fn from_code(code: i64) -> PermResult<Self> {
		match code {
			1 => Ok(PermissionKind::Grant),
			-1 => Ok(PermissionKind::Deny),
			0 => Ok(PermissionKind::Inherit),
			_ => Err(Error::InvalidArgument(format!("invalid permission kind {}", code))),
		}
	}
}

// PermissionArg //
//***************//
/// Stored arg value meaning "applies to all records"
pub const ARG_ALL: i64 = -1;
/// Stored arg value for unscoped permissions
pub const ARG_NONE: i64 = 0;

/// Scope of a permission code check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionArg {
	/// Any grant of the code, whatever its arg
	Any,
	/// Only grants that apply to every record
	All,
	/// Grants for every record or for this specific one
	Record(RecordId),
}

impl PermissionArg {
	/// Value stored in the permission row when granting with this arg
	pub fn stored(self) -> i64 {
		match self {
			PermissionArg::Any => ARG_NONE,
			PermissionArg::All => ARG_ALL,
			PermissionArg::Record(id) => id.0,
		}
	}
}

// Codes //
//*******//
/// Permission code that unlocks everything when admin_implies_all is set
pub const ADMIN_CODE: &str = "ADMIN";


// vim: ts=4
