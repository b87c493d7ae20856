//! Transitive group membership.
//!
//! A member belongs to the groups it was added to and, implicitly, to every
//! ancestor of those groups. Permissions and roles attached to a parent group
//! therefore flow down to members of its subgroups.

use std::collections::HashSet;
use std::sync::Arc;

use canopy_types::perm_adapter::PermissionAdapter;

use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct GroupSet {
	adapter: Arc<dyn PermissionAdapter>,
}

impl GroupSet {
	pub fn new(adapter: Arc<dyn PermissionAdapter>) -> Self {
		Self { adapter }
	}

	/// Direct groups of the members plus all their ancestors
	pub async fn for_members(&self, member_ids: &[MemberId]) -> PermResult<Vec<GroupId>> {
		let member_ids: Vec<MemberId> =
			member_ids.iter().copied().filter(|id| id.is_valid()).collect();
		if member_ids.is_empty() {
			return Ok(Vec::new());
		}

		let direct = self.adapter.list_member_group_ids(&member_ids).await?;
		self.with_ancestors(&direct).await
	}

	pub async fn for_member(&self, member_id: MemberId) -> PermResult<Vec<GroupId>> {
		self.for_members(&[member_id]).await
	}

	/// The given groups plus every group above them
	pub async fn with_ancestors(&self, group_ids: &[GroupId]) -> PermResult<Vec<GroupId>> {
		self.closure(group_ids, Direction::Up).await
	}

	/// The given groups plus every group below them
	pub async fn with_descendants(&self, group_ids: &[GroupId]) -> PermResult<Vec<GroupId>> {
		self.closure(group_ids, Direction::Down).await
	}

	// Breadth-first walk, one query per level. The visited set ends the walk
	// on cyclic parent links.
	async fn closure(&self, group_ids: &[GroupId], direction: Direction) -> PermResult<Vec<GroupId>> {
		let mut visited: HashSet<GroupId> = HashSet::new();
		let mut frontier: Vec<GroupId> =
			group_ids.iter().copied().filter(|id| id.is_valid() && visited.insert(*id)).collect();

		while !frontier.is_empty() {
			let next = match direction {
				Direction::Up => self.adapter.list_group_parent_ids(&frontier).await?,
				Direction::Down => self.adapter.list_child_group_ids(&frontier).await?,
			};

			frontier = next.into_iter().filter(|id| visited.insert(*id)).collect();
		}

		let mut groups: Vec<GroupId> = visited.into_iter().collect();
		groups.sort_unstable();
		Ok(groups)
	}
}

#[derive(Clone, Copy, Debug)]
enum Direction {
	Up,
	Down,
}

// vim: ts=4
