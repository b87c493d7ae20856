//! Inherited permission resolution.
//!
//! Every record carries a view policy and an edit policy. A policy of
//! `Inherit` defers to the record's parent, recursively, and a root record
//! with `Inherit` takes the answer of the configured default checker.
//!
//! Checks are batched: one call resolves any number of records with a
//! handful of queries per tree level. Versioned classes are checked in the
//! Draft stage first and in Live for records that have no draft.
//!
//! Results are cached per `{type}-{class}-{member}` key, first in process and
//! then, after `persist_cache()`, in the configured cache store.

use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use canopy_types::cache_adapter::CacheAdapter;
use canopy_types::perm_adapter::{PermissionAdapter, RecordNode};
use canopy_types::types::ADMIN_CODE;

use crate::checker::{PermissionChecker, PermissionMap};
use crate::default_checker::DefaultPermissionChecker;
use crate::permission::{PermissionFlusher, PermissionService};
use crate::prelude::*;

/// For each ID of a batch, the IDs already on its chain in the current walk
/// (descendants when walking up to parents, ancestors when walking down to
/// children). An ID found on its own chain closes a cycle.
type Lineage = HashMap<RecordId, HashSet<RecordId>>;

/// Per-call state carried down the parent recursion
#[derive(Clone, Copy)]
struct Walk<'a> {
	ptype: PermissionType,
	member: Option<MemberId>,
	global_codes: &'a [Box<str>],
	lineage: &'a Lineage,
	depth: usize,
}

/// A batch answer. `truncated` is set when the depth cap cut a walk short
/// below this batch; such answers are returned but never cached.
struct Outcome {
	map: PermissionMap,
	truncated: bool,
}

impl Outcome {
	fn complete(map: PermissionMap) -> Self {
		Self { map, truncated: false }
	}
}

pub struct InheritedPermissions {
	base_class: Box<str>,
	cache_class: Box<str>,
	versioned: bool,
	adapter: Arc<dyn PermissionAdapter>,
	permissions: Arc<PermissionService>,
	default_permissions: Option<Arc<dyn DefaultPermissionChecker>>,
	cache: Option<Arc<dyn CacheAdapter>>,
	global_edit_codes: Vec<Box<str>>,
	max_depth: usize,
	local: RwLock<HashMap<String, PermissionMap>>,
	dirty: Mutex<HashSet<String>>,
}

pub struct InheritedPermissionsBuilder {
	base_class: Box<str>,
	permissions: Arc<PermissionService>,
	versioned: bool,
	default_permissions: Option<Arc<dyn DefaultPermissionChecker>>,
	cache: Option<Arc<dyn CacheAdapter>>,
	global_edit_codes: Option<Vec<Box<str>>>,
}

impl InheritedPermissionsBuilder {
	/// Check Draft then Live instead of the base stage only
	pub fn versioned(mut self, versioned: bool) -> Self {
		self.versioned = versioned;
		self
	}

	/// Checker answering for `Inherit` records without a parent.
	/// Without one such records are never allowed.
	pub fn default_permissions(mut self, checker: Arc<dyn DefaultPermissionChecker>) -> Self {
		self.default_permissions = Some(checker);
		self
	}

	pub fn cache(mut self, cache: Arc<dyn CacheAdapter>) -> Self {
		self.cache = Some(cache);
		self
	}

	/// Codes required (any of) before any edit check. Defaults to `perm.global_edit_codes`.
	pub fn global_edit_codes<S: AsRef<str>>(mut self, codes: &[S]) -> Self {
		self.global_edit_codes = Some(codes.iter().map(|c| Box::from(c.as_ref())).collect());
		self
	}

	pub fn build(self) -> PermResult<InheritedPermissions> {
		if self.base_class.trim().is_empty() {
			return Err(Error::InvalidArgument("base class cannot be empty".into()));
		}

		let config = self.permissions.config();
		let global_edit_codes =
			self.global_edit_codes.unwrap_or_else(|| config.global_edit_codes.clone());
		let max_depth = config.max_depth;

		Ok(InheritedPermissions {
			cache_class: self.base_class.replace('\\', "-").into_boxed_str(),
			base_class: self.base_class,
			versioned: self.versioned,
			adapter: Arc::clone(self.permissions.adapter()),
			permissions: self.permissions,
			default_permissions: self.default_permissions,
			cache: self.cache,
			global_edit_codes,
			max_depth,
			local: RwLock::new(HashMap::new()),
			dirty: Mutex::new(HashSet::new()),
		})
	}
}

const VERSIONED_STAGES: &[Stage] = &Stage::ORDERED;
const BASE_STAGE: &[Stage] = &[Stage::Draft];

fn normalize_ids(ids: &[RecordId]) -> Vec<RecordId> {
	let mut seen = HashSet::new();
	ids.iter().copied().filter(|id| id.is_valid() && seen.insert(*id)).collect()
}

impl InheritedPermissions {
	pub fn builder(
		base_class: impl Into<Box<str>>,
		permissions: Arc<PermissionService>,
	) -> InheritedPermissionsBuilder {
		InheritedPermissionsBuilder {
			base_class: base_class.into(),
			permissions,
			versioned: false,
			default_permissions: None,
			cache: None,
			global_edit_codes: None,
		}
	}

	pub fn base_class(&self) -> &str {
		&self.base_class
	}

	pub fn is_versioned(&self) -> bool {
		self.versioned
	}

	pub fn default_permissions(&self) -> Option<&Arc<dyn DefaultPermissionChecker>> {
		self.default_permissions.as_ref()
	}

	/// `{type}-{class}-{member}`, with `\` in the class replaced by `-` and 0 for anonymous
	pub fn cache_key(&self, ptype: PermissionType, member: Option<MemberId>) -> String {
		let member_id = member.filter(|m| m.is_valid()).map_or(0, |m| m.0);
		format!("{}-{}-{}", ptype.as_str(), self.cache_class, member_id)
	}

	fn stages(&self) -> &'static [Stage] {
		if self.versioned { VERSIONED_STAGES } else { BASE_STAGE }
	}

	fn global_codes_for(&self, ptype: PermissionType) -> &[Box<str>] {
		match ptype {
			PermissionType::Edit => &self.global_edit_codes,
			PermissionType::View | PermissionType::Delete => &[],
		}
	}

	// Batch checks
	//**************

	/// Resolve `ptype` for every valid ID. Members lacking all of
	/// `global_codes` (when any are given) are denied everything.
	pub async fn batch_check<S>(
		&self,
		ptype: PermissionType,
		ids: &[RecordId],
		member: Option<MemberId>,
		global_codes: &[S],
		use_cached: bool,
	) -> PermResult<PermissionMap>
	where
		S: AsRef<str> + Sync,
	{
		let global_codes: Vec<Box<str>> =
			global_codes.iter().map(|c| Box::from(c.as_ref())).collect();
		let lineage = Lineage::new();
		let walk = Walk {
			ptype,
			member: member.filter(|m| m.is_valid()),
			global_codes: &global_codes,
			lineage: &lineage,
			depth: 0,
		};
		Ok(self.check_batch(normalize_ids(ids), walk, use_cached).await?.map)
	}

	/// Resolve the records of a single stage. IDs missing from the stage are
	/// not part of the result.
	pub async fn batch_check_for_stage(
		&self,
		ptype: PermissionType,
		ids: &[RecordId],
		member: Option<MemberId>,
		group_ids: &[GroupId],
		stage: Stage,
	) -> PermResult<PermissionMap> {
		let member = member.filter(|m| m.is_valid());
		let nodes = self.adapter.read_records(&self.base_class, stage, &normalize_ids(ids)).await?;
		let is_admin = self.permissions.check_member(member, &[ADMIN_CODE]).await?;

		let lineage = Lineage::new();
		let walk = Walk {
			ptype,
			member,
			global_codes: self.global_codes_for(ptype),
			lineage: &lineage,
			depth: 0,
		};
		Ok(self.check_stage(nodes, stage, group_ids, is_admin, walk).await?.map)
	}

	fn check_batch<'a>(
		&'a self,
		ids: Vec<RecordId>,
		walk: Walk<'a>,
		use_cached: bool,
	) -> BoxFuture<'a, PermResult<Outcome>> {
		Box::pin(async move {
			let mut result: PermissionMap = ids.iter().map(|id| (*id, false)).collect();
			if ids.is_empty() {
				return Ok(Outcome::complete(result));
			}
			if walk.ptype != PermissionType::View && walk.member.is_none() {
				return Ok(Outcome::complete(result));
			}

			let key = self.cache_key(walk.ptype, walk.member);
			if use_cached {
				if let Some((hits, missing)) = self.lookup_cached(&key, &ids).await {
					result.extend(hits);
					let mut truncated = false;
					if !missing.is_empty() {
						trace!("{}: {} IDs not cached", key, missing.len());
						let fresh = self.check_batch(missing, walk, false).await?;
						truncated = fresh.truncated;
						result.extend(fresh.map);
					}
					return Ok(Outcome { map: result, truncated });
				}
			}

			if !walk.global_codes.is_empty()
				&& !self.permissions.check_member(walk.member, walk.global_codes).await?
			{
				debug!("{}: member lacks global codes {:?}", key, walk.global_codes);
				return Ok(Outcome::complete(result));
			}

			let group_ids = match walk.member {
				Some(member) => self.permissions.group_list(member).await?,
				None => Arc::from(Vec::new()),
			};
			let is_admin = self.permissions.check_member(walk.member, &[ADMIN_CODE]).await?;

			// Draft wins wherever the record exists in Draft
			let mut resolved = PermissionMap::new();
			let mut truncated = false;
			for stage in self.stages() {
				let pending: Vec<RecordId> =
					ids.iter().copied().filter(|id| !resolved.contains_key(id)).collect();
				if pending.is_empty() {
					break;
				}
				let nodes = self.adapter.read_records(&self.base_class, *stage, &pending).await?;
				let staged = self.check_stage(nodes, *stage, &group_ids, is_admin, walk).await?;
				truncated |= staged.truncated;
				resolved.extend(staged.map);
			}

			result.extend(resolved);
			debug!(
				"{}: {} of {} allowed (depth {})",
				key,
				result.values().filter(|v| **v).count(),
				result.len(),
				walk.depth
			);
			if truncated {
				debug!("{}: depth cap reached, not caching", key);
			} else {
				self.store_cached(&key, &result);
			}
			Ok(Outcome { map: result, truncated })
		})
	}

	async fn check_stage(
		&self,
		nodes: Vec<RecordNode>,
		stage: Stage,
		group_ids: &[GroupId],
		is_admin: bool,
		walk: Walk<'_>,
	) -> PermResult<Outcome> {
		let mut result: PermissionMap = nodes.iter().map(|n| (n.record_id, false)).collect();
		if nodes.is_empty() {
			return Ok(Outcome::complete(result));
		}
		if is_admin {
			result.values_mut().for_each(|v| *v = true);
			return Ok(Outcome::complete(result));
		}

		let field = walk.ptype.policy_field();
		let logged_in = walk.member.is_some();
		let mut by_group = Vec::new();
		let mut by_member = Vec::new();
		let mut inherited = Vec::new();

		for node in &nodes {
			match node.policy(field) {
				InheritType::Anyone => {
					result.insert(node.record_id, true);
				}
				InheritType::LoggedInUsers if logged_in => {
					result.insert(node.record_id, true);
				}
				InheritType::OnlyTheseUsers if logged_in => by_group.push(node.record_id),
				InheritType::OnlyTheseMembers if logged_in => by_member.push(node.record_id),
				InheritType::Inherit => inherited.push(node),
				InheritType::LoggedInUsers
				| InheritType::OnlyTheseUsers
				| InheritType::OnlyTheseMembers => {}
			}
		}

		if !by_group.is_empty() && !group_ids.is_empty() {
			let linked = self
				.adapter
				.list_group_linked_records(&self.base_class, field, &by_group, group_ids)
				.await?;
			for id in linked {
				result.insert(id, true);
			}
		}

		if let Some(member) = walk.member.filter(|_| !by_member.is_empty()) {
			let linked = self
				.adapter
				.list_member_linked_records(&self.base_class, field, &by_member, member)
				.await?;
			for id in linked {
				result.insert(id, true);
			}
		}

		let mut truncated = false;
		if !inherited.is_empty() {
			trace!("{} {}: {} records inherit", self.base_class, stage, inherited.len());
			truncated = self.resolve_inherited(&inherited, walk, &mut result).await?;
		}
		Ok(Outcome { map: result, truncated })
	}

	/// Fill in `result` for records inheriting from their parent.
	/// Returns true when the depth cap left some of them unresolved.
	async fn resolve_inherited(
		&self,
		inherited: &[&RecordNode],
		walk: Walk<'_>,
		result: &mut PermissionMap,
	) -> PermResult<bool> {
		let mut by_parent: HashMap<RecordId, Vec<RecordId>> = HashMap::new();
		let mut roots = Vec::new();
		for node in inherited {
			match node.parent_id {
				Some(parent_id) => by_parent.entry(parent_id).or_default().push(node.record_id),
				None => roots.push(node.record_id),
			}
		}

		if !roots.is_empty() {
			let allowed = match &self.default_permissions {
				Some(checker) => checker.check(walk.ptype, walk.member).await?,
				None => false,
			};
			for id in roots {
				result.insert(id, allowed);
			}
		}

		if by_parent.is_empty() {
			return Ok(false);
		}
		if walk.depth >= self.max_depth {
			warn!(
				"{}: parent chain deeper than {} levels, denying {} records",
				self.base_class,
				self.max_depth,
				by_parent.values().map(Vec::len).sum::<usize>()
			);
			return Ok(true);
		}

		let mut lineage = Lineage::new();
		for (parent_id, children) in &by_parent {
			let below = lineage.entry(*parent_id).or_default();
			for child in children {
				below.insert(*child);
				if let Some(further) = walk.lineage.get(child) {
					below.extend(further.iter().copied());
				}
			}
		}

		let mut parent_ids: Vec<RecordId> = Vec::with_capacity(lineage.len());
		for (parent_id, below) in &lineage {
			if below.contains(parent_id) {
				warn!("{}: record {} is its own ancestor, denying its subtree", self.base_class, parent_id);
			} else {
				parent_ids.push(*parent_id);
			}
		}
		// Cycles are cut for good, their denial is cacheable
		if parent_ids.is_empty() {
			return Ok(false);
		}
		parent_ids.sort_unstable();

		let parent_walk = Walk {
			ptype: walk.ptype,
			member: walk.member,
			global_codes: walk.global_codes,
			lineage: &lineage,
			depth: walk.depth + 1,
		};
		let parents = self.check_batch(parent_ids, parent_walk, true).await?;

		// Only an allowed parent changes anything: children start out denied
		for (parent_id, allowed) in parents.map {
			if !allowed {
				continue;
			}
			if let Some(children) = by_parent.get(&parent_id) {
				for child in children {
					result.insert(*child, true);
				}
			}
		}
		Ok(parents.truncated)
	}

	// Deletion
	//**********

	fn delete_batch<'a>(
		&'a self,
		ids: Vec<RecordId>,
		member: Option<MemberId>,
		use_cached: bool,
		lineage: &'a Lineage,
		depth: usize,
	) -> BoxFuture<'a, PermResult<Outcome>> {
		Box::pin(async move {
			let mut result: PermissionMap = ids.iter().map(|id| (*id, false)).collect();
			if ids.is_empty() || member.is_none() {
				return Ok(Outcome::complete(result));
			}

			let key = self.cache_key(PermissionType::Delete, member);
			if use_cached {
				if let Some((hits, missing)) = self.lookup_cached(&key, &ids).await {
					result.extend(hits);
					let mut truncated = false;
					if !missing.is_empty() {
						let fresh = self.delete_batch(missing, member, false, lineage, depth).await?;
						truncated = fresh.truncated;
						result.extend(fresh.map);
					}
					return Ok(Outcome { map: result, truncated });
				}
			}

			// Only editable records can be deleted
			let ancestors = Lineage::new();
			let edit_walk = Walk {
				ptype: PermissionType::Edit,
				member,
				global_codes: &self.global_edit_codes,
				lineage: &ancestors,
				depth: 0,
			};
			let edit = self.check_batch(ids, edit_walk, true).await?;
			let mut truncated = edit.truncated;
			let editable: Vec<RecordId> =
				edit.map.into_iter().filter_map(|(id, allowed)| allowed.then_some(id)).collect();

			if !editable.is_empty() {
				let children = self.list_children(&editable).await?;
				let blocked = if children.is_empty() {
					HashSet::new()
				} else {
					let (blocked, cut) = self.blocked_parents(&children, member, lineage, depth).await?;
					truncated |= cut;
					blocked
				};
				for id in editable {
					if !blocked.contains(&id) {
						result.insert(id, true);
					}
				}
			}

			if truncated {
				debug!("{}: depth cap reached, not caching", key);
			} else {
				self.store_cached(&key, &result);
			}
			Ok(Outcome { map: result, truncated })
		})
	}

	/// Parents having at least one child that cannot be deleted, and whether
	/// the depth cap decided any of them
	async fn blocked_parents(
		&self,
		children: &[(RecordId, RecordId)],
		member: Option<MemberId>,
		lineage: &Lineage,
		depth: usize,
	) -> PermResult<(HashSet<RecordId>, bool)> {
		if depth >= self.max_depth {
			warn!("{}: child chain deeper than {} levels, keeping parents", self.base_class, self.max_depth);
			return Ok((children.iter().map(|(_, parent)| *parent).collect(), true));
		}

		let mut child_lineage = Lineage::new();
		for (child, parent) in children {
			let above = child_lineage.entry(*child).or_default();
			above.insert(*parent);
			if let Some(further) = lineage.get(parent) {
				above.extend(further.iter().copied());
			}
		}

		let mut blocked = HashSet::new();
		let mut child_ids = Vec::new();
		for (child, parent) in children {
			if child_lineage.get(child).is_some_and(|above| above.contains(child)) {
				warn!("{}: record {} is its own ancestor, keeping record {}", self.base_class, child, parent);
				blocked.insert(*parent);
			} else {
				child_ids.push(*child);
			}
		}
		child_ids.sort_unstable();
		child_ids.dedup();

		let deletable = self.delete_batch(child_ids, member, true, &child_lineage, depth + 1).await?;
		for (child, parent) in children {
			if !deletable.map.get(child).copied().unwrap_or(false) {
				blocked.insert(*parent);
			}
		}
		Ok((blocked, deletable.truncated))
	}

	/// (child, parent) pairs over all stages
	async fn list_children(&self, parent_ids: &[RecordId]) -> PermResult<Vec<(RecordId, RecordId)>> {
		let mut pairs = Vec::new();
		let mut seen = HashSet::new();
		for stage in self.stages() {
			for pair in self.adapter.list_child_records(&self.base_class, *stage, parent_ids).await? {
				if seen.insert(pair) {
					pairs.push(pair);
				}
			}
		}
		Ok(pairs)
	}

	/// Warm the cache for a batch (e.g. right after listing a tree)
	pub async fn prepopulate_cache(
		&self,
		ptype: PermissionType,
		ids: &[RecordId],
		member: Option<MemberId>,
	) -> PermResult<()> {
		self.check_multiple(ptype, ids, member, false).await?;
		Ok(())
	}

	// Cache
	//*******

	/// Cached values for `ids` plus the IDs the cache knows nothing about.
	/// None when there is no cache entry for the key at all.
	async fn lookup_cached(&self, key: &str, ids: &[RecordId]) -> Option<(PermissionMap, Vec<RecordId>)> {
		let known = self.local.read().contains_key(key);
		if !known {
			self.load_persistent(key).await?;
		}

		let local = self.local.read();
		let entry = local.get(key)?;
		let mut hits = PermissionMap::new();
		let mut missing = Vec::new();
		for id in ids {
			match entry.get(id) {
				Some(allowed) => {
					hits.insert(*id, *allowed);
				}
				None => missing.push(*id),
			}
		}
		Some((hits, missing))
	}

	/// Pull an entry from the cache store into the local cache.
	/// Store failures are logged and treated as a miss.
	async fn load_persistent(&self, key: &str) -> Option<()> {
		let cache = self.cache.as_ref()?;
		let json = match cache.get(key).await {
			Ok(json) => json?,
			Err(err) => {
				warn!("permission cache read failed for {}: {}", key, err);
				return None;
			}
		};

		match serde_json::from_str::<PermissionMap>(&json) {
			Ok(map) => {
				self.local.write().entry(key.to_string()).or_insert(map);
				Some(())
			}
			Err(err) => {
				warn!("discarding unreadable permission cache entry {}: {}", key, err);
				None
			}
		}
	}

	fn store_cached(&self, key: &str, result: &PermissionMap) {
		self.local
			.write()
			.entry(key.to_string())
			.or_default()
			.extend(result.iter().map(|(id, allowed)| (*id, *allowed)));
		if self.cache.is_some() {
			self.dirty.lock().insert(key.to_string());
		}
	}

	fn take_dirty_entries(&self) -> Vec<(String, PermissionMap)> {
		let keys: Vec<String> = self.dirty.lock().drain().collect();
		let local = self.local.read();
		keys.into_iter().filter_map(|key| local.get(&key).cloned().map(|map| (key, map))).collect()
	}

	/// Write locally computed entries to the cache store, merged over what
	/// the store already holds. Returns the number of entries written.
	pub async fn persist_cache(&self) -> PermResult<usize> {
		let Some(cache) = &self.cache else {
			return Ok(0);
		};

		let entries = self.take_dirty_entries();
		let count = entries.len();
		let mut entries = entries.into_iter();
		while let Some((key, map)) = entries.next() {
			if let Err(err) = write_entry(cache.as_ref(), &key, map).await {
				// Keep the rest for the next attempt
				let mut dirty = self.dirty.lock();
				dirty.insert(key);
				dirty.extend(entries.map(|(key, _)| key));
				return Err(err);
			}
		}

		debug!("{}: persisted {} permission cache entries", self.base_class, count);
		Ok(count)
	}

	/// Drop the in-process cache. The cache store is untouched.
	pub fn clear_cache(&self) {
		self.local.write().clear();
		self.dirty.lock().clear();
	}

	/// Invalidate cached results. `None` clears the whole cache store;
	/// otherwise the view, edit and delete entries of each member are removed.
	/// Local entries always go; cache store failures are logged.
	pub async fn flush_member_cache(&self, member_ids: Option<&[MemberId]>) -> PermResult<()> {
		let Some(member_ids) = member_ids else {
			self.clear_cache();
			if let Some(cache) = &self.cache {
				if let Err(err) = cache.clear().await {
					warn!("{}: failed to clear permission cache store: {}", self.base_class, err);
				}
			}
			info!("{}: flushed all permission caches", self.base_class);
			return Ok(());
		};

		let keys: Vec<String> = member_ids
			.iter()
			.flat_map(|member| {
				PermissionType::ALL.into_iter().map(move |ptype| {
					format!("{}-{}-{}", ptype.as_str(), self.cache_class, member.0.max(0))
				})
			})
			.collect();

		{
			let mut local = self.local.write();
			let mut dirty = self.dirty.lock();
			for key in &keys {
				local.remove(key);
				dirty.remove(key);
			}
		}
		if let Some(cache) = &self.cache {
			for key in &keys {
				if let Err(err) = cache.delete(key).await {
					warn!("failed to delete permission cache entry {}: {}", key, err);
				}
			}
		}
		info!("{}: flushed permission caches of {} members", self.base_class, member_ids.len());
		Ok(())
	}
}

async fn write_entry(cache: &dyn CacheAdapter, key: &str, mut map: PermissionMap) -> PermResult<()> {
	if let Some(stored) = cache.get(key).await? {
		if let Ok(stored) = serde_json::from_str::<PermissionMap>(&stored) {
			for (id, allowed) in stored {
				map.entry(id).or_insert(allowed);
			}
		}
	}
	cache.set(key, &serde_json::to_string(&map)?).await
}

#[async_trait::async_trait]
impl PermissionChecker for InheritedPermissions {
	async fn can_view_multiple(
		&self,
		ids: &[RecordId],
		member: Option<MemberId>,
		use_cached: bool,
	) -> PermResult<PermissionMap> {
		self.batch_check(PermissionType::View, ids, member, &[] as &[&str], use_cached).await
	}

	async fn can_edit_multiple(
		&self,
		ids: &[RecordId],
		member: Option<MemberId>,
		use_cached: bool,
	) -> PermResult<PermissionMap> {
		self.batch_check(PermissionType::Edit, ids, member, &self.global_edit_codes, use_cached)
			.await
	}

	/// Editable records are deletable when all their children are
	async fn can_delete_multiple(
		&self,
		ids: &[RecordId],
		member: Option<MemberId>,
		use_cached: bool,
	) -> PermResult<PermissionMap> {
		let lineage = Lineage::new();
		let member = member.filter(|m| m.is_valid());
		Ok(self.delete_batch(normalize_ids(ids), member, use_cached, &lineage, 0).await?.map)
	}
}

#[async_trait::async_trait]
impl PermissionFlusher for InheritedPermissions {
	async fn flush_members(&self, member_ids: Option<&[MemberId]>) {
		if let Err(err) = self.flush_member_cache(member_ids).await {
			warn!("{}: permission cache flush failed: {}", self.base_class, err);
		}
	}
}

impl std::fmt::Debug for InheritedPermissions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InheritedPermissions")
			.field("base_class", &self.base_class)
			.field("versioned", &self.versioned)
			.field("default_permissions", &self.default_permissions)
			.field("cache", &self.cache)
			.field("global_edit_codes", &self.global_edit_codes)
			.field("cached_keys", &self.local.read().len())
			.finish()
	}
}

impl Drop for InheritedPermissions {
	fn drop(&mut self) {
		let Some(cache) = self.cache.clone() else {
			return;
		};
		if self.dirty.get_mut().is_empty() {
			return;
		}

		let entries = self.take_dirty_entries();
		let Ok(handle) = tokio::runtime::Handle::try_current() else {
			warn!("{}: dropping {} unpersisted cache entries", self.base_class, entries.len());
			return;
		};
		handle.spawn(async move {
			for (key, map) in entries {
				if let Err(err) = write_entry(cache.as_ref(), &key, map).await {
					warn!("failed to persist permission cache entry {}: {}", key, err);
				}
			}
		});
	}
}


// vim: ts=4
