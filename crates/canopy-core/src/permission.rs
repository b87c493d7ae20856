//! Permission code checks for members.
//!
//! Codes reach a member through permission rows (grant or deny) and roles
//! attached to any group in the member's group set. Deny rows win over grants.

use async_trait::async_trait;
use lru::LruCache;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};

use canopy_types::perm_adapter::{CreateRoleData, PermissionAdapter};
use canopy_types::types::{ADMIN_CODE, ARG_ALL, PermissionArg, PermissionKind};

use crate::group_set::GroupSet;
use crate::perm_settings::PermissionConfig;
use crate::prelude::*;

/// Code needed to assign roles to groups
pub const APPLY_ROLES_CODE: &str = "APPLY_ROLES";

type CodeList = Arc<[Box<str>]>;
type GroupList = Arc<[GroupId]>;

/// Drops cached record permissions after membership or code changes.
/// `None` stands for every member.
#[async_trait]
pub trait PermissionFlusher: Send + Sync {
	async fn flush_members(&self, member_ids: Option<&[MemberId]>);
}

pub struct PermissionService {
	adapter: Arc<dyn PermissionAdapter>,
	group_set: GroupSet,
	config: Arc<PermissionConfig>,
	codes: parking_lot::RwLock<LruCache<MemberId, CodeList>>,
	groups: parking_lot::RwLock<LruCache<MemberId, GroupList>>,
	flushers: parking_lot::RwLock<Vec<Weak<dyn PermissionFlusher>>>,
}

impl std::fmt::Debug for PermissionService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PermissionService")
			.field("adapter", &self.adapter)
			.field("config", &self.config)
			.field("cached_members", &self.codes.read().len())
			.field("flushers", &self.flushers.read().len())
			.finish()
	}
}

impl PermissionService {
	pub fn new(adapter: Arc<dyn PermissionAdapter>, config: Arc<PermissionConfig>) -> Self {
		let capacity = NonZeroUsize::new(config.cache_capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
		Self {
			group_set: GroupSet::new(Arc::clone(&adapter)),
			adapter,
			config,
			codes: parking_lot::RwLock::new(LruCache::new(capacity)),
			groups: parking_lot::RwLock::new(LruCache::new(capacity)),
			flushers: parking_lot::RwLock::new(Vec::new()),
		}
	}

	pub fn adapter(&self) -> &Arc<dyn PermissionAdapter> {
		&self.adapter
	}

	pub fn config(&self) -> &PermissionConfig {
		&self.config
	}

	pub fn group_set(&self) -> &GroupSet {
		&self.group_set
	}

	/// The member's group set: direct groups plus their ancestors
	pub async fn group_list(&self, member: MemberId) -> PermResult<GroupList> {
		if !member.is_valid() {
			return Ok(Arc::from(Vec::new()));
		}

		let cached = self.groups.write().get(&member).cloned();
		if let Some(groups) = cached {
			return Ok(groups);
		}

		let groups: GroupList = self.group_set.for_member(member).await?.into();
		self.groups.write().put(member, Arc::clone(&groups));
		Ok(groups)
	}

	/// Whether the member belongs (directly or through a subgroup) to any of the groups
	pub async fn member_in_groups(&self, member: MemberId, group_ids: &[GroupId]) -> PermResult<bool> {
		if group_ids.is_empty() {
			return Ok(false);
		}
		let groups = self.group_list(member).await?;
		Ok(groups.iter().any(|g| group_ids.contains(g)))
	}

	/// Codes held by the member regardless of argument: granted directly or via
	/// roles, minus codes denied for any group in the set.
	pub async fn permissions_for_member(&self, member: MemberId) -> PermResult<CodeList> {
		if !member.is_valid() {
			return Ok(Arc::from(Vec::new()));
		}

		let cached = self.codes.write().get(&member).cloned();
		if let Some(codes) = cached {
			return Ok(codes);
		}

		let groups = self.group_list(member).await?;
		let mut held: BTreeSet<Box<str>> = BTreeSet::new();
		if !groups.is_empty() {
			held.extend(self.adapter.list_permission_codes(&groups, PermissionKind::Grant).await?);
			held.extend(self.adapter.list_role_codes(&groups).await?);
			for denied in self.adapter.list_permission_codes(&groups, PermissionKind::Deny).await? {
				held.remove(&denied);
			}
		}

		let codes: CodeList = held.into_iter().collect();
		debug!("member {} holds {} permission codes", member, codes.len());
		self.codes.write().put(member, Arc::clone(&codes));
		Ok(codes)
	}

	/// Whether the member holds any of the codes, for any argument.
	/// `ADMIN` satisfies every check when `perm.admin_implies_all` is on.
	pub async fn check_member<S>(&self, member: Option<MemberId>, codes: &[S]) -> PermResult<bool>
	where
		S: AsRef<str> + Sync,
	{
		let Some(member) = member.filter(|m| m.is_valid()) else {
			return Ok(false);
		};
		let Some(wanted) = self.wanted_codes(codes) else {
			return Ok(false);
		};

		let held = self.permissions_for_member(member).await?;
		Ok(wanted.iter().any(|code| held.iter().any(|h| &**h == *code)))
	}

	/// Scoped code check. `All` needs a row with arg -1, `Record(n)` a row with
	/// arg -1 or n. A matching deny row vetoes; role codes match any argument.
	pub async fn check_member_arg<S>(
		&self,
		member: Option<MemberId>,
		codes: &[S],
		arg: PermissionArg,
	) -> PermResult<bool>
	where
		S: AsRef<str> + Sync,
	{
		let args = match arg {
			PermissionArg::Any => return self.check_member(member, codes).await,
			PermissionArg::All => vec![ARG_ALL],
			PermissionArg::Record(record_id) => {
				if !record_id.is_valid() {
					return Err(Error::InvalidArgument(format!(
						"permission arg must be a record ID, got {}",
						record_id
					)));
				}
				vec![ARG_ALL, record_id.0]
			}
		};

		let Some(member) = member.filter(|m| m.is_valid()) else {
			return Ok(false);
		};
		let Some(wanted) = self.wanted_codes(codes) else {
			return Ok(false);
		};
		let groups = self.group_list(member).await?;
		if groups.is_empty() {
			return Ok(false);
		}

		if let Some(perm_id) =
			self.adapter.find_permission(&wanted, &groups, PermissionKind::Deny, Some(args.as_slice())).await?
		{
			debug!("member {} denied {:?} by permission {}", member, wanted, perm_id);
			return Ok(false);
		}
		if self
			.adapter
			.find_permission(&wanted, &groups, PermissionKind::Grant, Some(args.as_slice()))
			.await?
			.is_some()
		{
			return Ok(true);
		}

		let role_codes = self.adapter.list_role_codes(&groups).await?;
		Ok(role_codes.iter().any(|code| wanted.contains(&&**code)))
	}

	fn wanted_codes<'a, S: AsRef<str>>(&self, codes: &'a [S]) -> Option<Vec<&'a str>> {
		let mut wanted: Vec<&'a str> =
			codes.iter().map(AsRef::as_ref).filter(|c| !c.is_empty()).collect();
		if wanted.is_empty() {
			return None;
		}
		if self.config.admin_implies_all && !wanted.contains(&ADMIN_CODE) {
			wanted.push(ADMIN_CODE);
		}
		Some(wanted)
	}

	// Writes
	//********
	pub async fn grant(&self, group: GroupId, code: &str, arg: PermissionArg) -> PermResult<PermissionId> {
		self.write_permission(group, code, PermissionKind::Grant, arg).await
	}

	pub async fn deny(&self, group: GroupId, code: &str, arg: PermissionArg) -> PermResult<PermissionId> {
		self.write_permission(group, code, PermissionKind::Deny, arg).await
	}

	async fn write_permission(
		&self,
		group: GroupId,
		code: &str,
		kind: PermissionKind,
		arg: PermissionArg,
	) -> PermResult<PermissionId> {
		let perm_id = self.adapter.write_permission(group, code, kind, arg.stored()).await?;
		// Codes flow down the group tree, so any member may be affected
		self.flush_permission_cache();
		self.notify_group_members(group).await;
		info!("permission {} {:?} {} on group {} (arg {})", perm_id, kind, code, group, arg.stored());
		Ok(perm_id)
	}

	pub async fn add_member(&self, group: GroupId, member: MemberId) -> PermResult<()> {
		self.adapter.add_group_member(group, member).await?;
		self.flush_member(member);
		self.notify_flushers(Some(&[member])).await;
		Ok(())
	}

	pub async fn remove_member(&self, group: GroupId, member: MemberId) -> PermResult<()> {
		self.adapter.remove_group_member(group, member).await?;
		self.flush_member(member);
		self.notify_flushers(Some(&[member])).await;
		Ok(())
	}

	/// Create a role. Roles bundling a privileged code are always admin-only.
	pub async fn create_role(&self, data: &CreateRoleData<'_>) -> PermResult<RoleId> {
		let privileged = data.codes.iter().any(|code| self.config.is_privileged(code));
		let data = CreateRoleData {
			title: data.title,
			only_admin_can_apply: data.only_admin_can_apply || privileged,
			codes: data.codes,
		};
		self.adapter.create_role(&data).await
	}

	/// Whether `actor` may assign the role to a group
	pub async fn can_apply_role(&self, actor: Option<MemberId>, role: RoleId) -> PermResult<bool> {
		let role = self.adapter.read_role(role).await?;
		let admin_only = role.only_admin_can_apply
			|| role.codes.iter().any(|code| self.config.is_privileged(code));

		if admin_only {
			self.check_member(actor, &[ADMIN_CODE]).await
		} else {
			self.check_member(actor, &[APPLY_ROLES_CODE]).await
		}
	}

	pub async fn apply_role(&self, actor: Option<MemberId>, group: GroupId, role: RoleId) -> PermResult<()> {
		if !self.can_apply_role(actor, role).await? {
			warn!("member {:?} may not apply role {} to group {}", actor, role, group);
			return Err(Error::PermissionDenied);
		}
		self.adapter.add_group_role(group, role).await?;
		self.flush_permission_cache();
		self.notify_group_members(group).await;
		Ok(())
	}

	// Lookups
	//*********
	/// Groups granted any of the codes, directly or through a role
	pub async fn groups_by_permission(&self, codes: &[&str]) -> PermResult<Vec<GroupId>> {
		self.adapter.list_groups_by_codes(codes, PermissionKind::Grant).await
	}

	/// Members of the granted groups or of any of their subgroups
	pub async fn members_by_permission(&self, codes: &[&str]) -> PermResult<Vec<MemberId>> {
		let groups = self.groups_by_permission(codes).await?;
		if groups.is_empty() {
			return Ok(Vec::new());
		}
		let family = self.group_set.with_descendants(&groups).await?;
		self.adapter.list_group_member_ids(&family).await
	}

	// Cache
	//*******
	pub fn flush_permission_cache(&self) {
		self.codes.write().clear();
		self.groups.write().clear();
		debug!("permission code cache flushed");
	}

	pub fn flush_member(&self, member: MemberId) {
		self.codes.write().pop(&member);
		self.groups.write().pop(&member);
	}

	/// Have `flusher` told about every later membership or code change.
	/// Only a weak reference is kept; dropped flushers fall out on their own.
	pub fn register_flusher<F: PermissionFlusher + 'static>(&self, flusher: &Arc<F>) {
		let weak: Weak<dyn PermissionFlusher> = Arc::downgrade(flusher) as Weak<F>;
		self.flushers.write().push(weak);
	}

	async fn notify_flushers(&self, member_ids: Option<&[MemberId]>) {
		let flushers: Vec<Arc<dyn PermissionFlusher>> = {
			let mut registered = self.flushers.write();
			registered.retain(|flusher| flusher.strong_count() > 0);
			registered.iter().filter_map(Weak::upgrade).collect()
		};
		for flusher in flushers {
			flusher.flush_members(member_ids).await;
		}
	}

	/// Notify for the members of `group` and of its subgroups, or for
	/// everyone when they cannot be listed
	async fn notify_group_members(&self, group: GroupId) {
		if self.flushers.read().is_empty() {
			return;
		}
		let members = match self.group_set.with_descendants(&[group]).await {
			Ok(family) => self.adapter.list_group_member_ids(&family).await,
			Err(err) => Err(err),
		};
		match members {
			Ok(members) if members.is_empty() => {}
			Ok(members) => self.notify_flushers(Some(members.as_slice())).await,
			Err(err) => {
				warn!("cannot list members of group {}, flushing all: {}", group, err);
				self.notify_flushers(None).await;
			}
		}
	}
}

// vim: ts=4
