//! Layered policy storage.
//!
//! A [`PolicyStore`] is one layer of policies with an optional parent layer.
//! Lookups walk from the layer they are issued on towards the root and stop
//! at the first hit; mutations only ever touch the layer they are issued on.
//!
//! # Resolution Order
//!
//! [`PolicyStore::resolve`] probes progressively more general keys, each one
//! across the whole layer chain before moving on:
//!
//! 1. Exact `(type, name)` key
//! 2. `(type, default name)` key
//! 3. Kind-wide default (see [`PolicyStore::set_default`])
//!
//! # Concurrency
//!
//! Each layer publishes an immutable snapshot of its entries through an
//! [`ArcSwap`]. Readers never block; writers copy the snapshot, apply their
//! change and publish it with a compare-and-swap, retrying on contention.
//! Concurrent writers to the same key resolve last-writer-wins.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap as HashMap;

use crate::key::{BuildKey, PolicyKey, PolicyKind};


#[derive(Clone, PartialEq, Eq, Hash)]
enum Slot {
	Keyed(PolicyKey),
	Default(TypeId),
}

impl Slot {
	fn keyed<K: PolicyKind>(key: &BuildKey) -> Self {
		Self::Keyed(PolicyKey::of::<K>(key))
	}

	fn default_for<K: PolicyKind>() -> Self {
		Self::Default(TypeId::of::<K>())
	}
}

/// Erased policy value. Always holds an `Arc<K::Policy>` for the kind in its slot.
type Erased = Arc<dyn Any + Send + Sync>;

type Entries = HashMap<Slot, Erased>;

/// One layer of policies with an optional parent.
pub struct PolicyStore {
	label: &'static str,
	entries: ArcSwap<Entries>,
	parent: Option<Arc<PolicyStore>>,
}

impl PolicyStore {
	/// Creates a root layer.
	pub fn new(label: &'static str) -> Self {
		Self {
			label,
			entries: ArcSwap::from_pointee(Entries::default()),
			parent: None,
		}
	}

	/// Creates a layer that falls back to `parent`.
	pub fn with_parent(label: &'static str, parent: Arc<PolicyStore>) -> Self {
		Self {
			label,
			entries: ArcSwap::from_pointee(Entries::default()),
			parent: Some(parent),
		}
	}

	/// Creates an empty child layer of this store.
	pub fn child(self: &Arc<Self>, label: &'static str) -> Self {
		Self::with_parent(label, Arc::clone(self))
	}

	pub fn label(&self) -> &'static str {
		self.label
	}

	pub fn parent(&self) -> Option<&Arc<PolicyStore>> {
		self.parent.as_ref()
	}

	/// Number of layers from this one to the root, inclusive.
	pub fn depth(&self) -> usize {
		self.layers().count()
	}

	/// Number of entries held by this layer alone.
	pub fn len(&self) -> usize {
		self.entries.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.load().is_empty()
	}

	/// Looks up the exact key, walking parent layers.
	pub fn get<K: PolicyKind>(&self, key: &BuildKey) -> Option<Arc<K::Policy>> {
		self.get_with_layer::<K>(key).map(|(policy, _)| policy)
	}

	/// Looks up the exact key and returns the layer that holds it.
	pub fn get_with_layer<K: PolicyKind>(
		&self,
		key: &BuildKey,
	) -> Option<(Arc<K::Policy>, &PolicyStore)> {
		self.find::<K>(&Slot::keyed::<K>(key))
	}

	/// Looks up the exact key in this layer only.
	pub fn get_local<K: PolicyKind>(&self, key: &BuildKey) -> Option<Arc<K::Policy>> {
		self.lookup_local::<K>(&Slot::keyed::<K>(key))
	}

	/// Looks up the exact key, then the type's default namespace.
	pub fn probe<K: PolicyKind>(&self, key: &BuildKey) -> Option<Arc<K::Policy>> {
		self.probe_with_layer::<K>(key).map(|(policy, _)| policy)
	}

	/// [`probe`](Self::probe) that also returns the holding layer.
	pub fn probe_with_layer<K: PolicyKind>(
		&self,
		key: &BuildKey,
	) -> Option<(Arc<K::Policy>, &PolicyStore)> {
		if let Some(found) = self.get_with_layer::<K>(key) {
			return Some(found);
		}
		if key.is_default() {
			return None;
		}
		self.get_with_layer::<K>(&key.to_default())
	}

	/// Full resolution: exact key, type default, then the kind-wide default.
	pub fn resolve<K: PolicyKind>(&self, key: &BuildKey) -> Option<Arc<K::Policy>> {
		self.resolve_with_layer::<K>(key).map(|(policy, _)| policy)
	}

	/// [`resolve`](Self::resolve) that also returns the holding layer.
	pub fn resolve_with_layer<K: PolicyKind>(
		&self,
		key: &BuildKey,
	) -> Option<(Arc<K::Policy>, &PolicyStore)> {
		self.probe_with_layer::<K>(key)
			.or_else(|| self.find::<K>(&Slot::default_for::<K>()))
	}

	/// Returns the kind-wide default, walking parent layers.
	pub fn get_default<K: PolicyKind>(&self) -> Option<Arc<K::Policy>> {
		self.find::<K>(&Slot::default_for::<K>()).map(|(policy, _)| policy)
	}

	/// Sets a policy in this layer, replacing any previous value for the key.
	pub fn set<K: PolicyKind>(&self, key: &BuildKey, policy: Arc<K::Policy>) {
		tracing::trace!(layer = self.label, kind = K::NAME, key = %key, "policy set");
		self.insert(Slot::keyed::<K>(key), Arc::new(policy));
	}

	/// Removes a policy from this layer. Parent layers are untouched.
	pub fn clear<K: PolicyKind>(&self, key: &BuildKey) {
		tracing::trace!(layer = self.label, kind = K::NAME, key = %key, "policy cleared");
		self.remove(&Slot::keyed::<K>(key));
	}

	/// Replaces this layer's policy for `key` with `f(current)` in one atomic step.
	///
	/// `f` only sees this layer's entry and may be called again if another
	/// writer wins the race.
	pub fn modify<K: PolicyKind>(
		&self,
		key: &BuildKey,
		mut f: impl FnMut(Option<&Arc<K::Policy>>) -> Arc<K::Policy>,
	) {
		tracing::trace!(layer = self.label, kind = K::NAME, key = %key, "policy modified");
		let slot = Slot::keyed::<K>(key);
		self.update(|entries| {
			let current = entries.get(&slot).and_then(|e| e.downcast_ref::<Arc<K::Policy>>());
			let next = f(current);
			entries.insert(slot.clone(), Arc::new(next));
		});
	}

	/// Sets the kind-wide default in this layer.
	pub fn set_default<K: PolicyKind>(&self, policy: Arc<K::Policy>) {
		tracing::trace!(layer = self.label, kind = K::NAME, "default policy set");
		self.insert(Slot::default_for::<K>(), Arc::new(policy));
	}

	/// Removes the kind-wide default from this layer.
	pub fn clear_default<K: PolicyKind>(&self) {
		tracing::trace!(layer = self.label, kind = K::NAME, "default policy cleared");
		self.remove(&Slot::default_for::<K>());
	}

	fn layers(&self) -> impl Iterator<Item = &PolicyStore> {
		std::iter::successors(Some(self), |layer| layer.parent.as_deref())
	}

	fn find<K: PolicyKind>(&self, slot: &Slot) -> Option<(Arc<K::Policy>, &PolicyStore)> {
		self.layers()
			.find_map(|layer| layer.lookup_local::<K>(slot).map(|policy| (policy, layer)))
	}

	fn lookup_local<K: PolicyKind>(&self, slot: &Slot) -> Option<Arc<K::Policy>> {
		let entries = self.entries.load();
		let erased = entries.get(slot)?;
		erased.downcast_ref::<Arc<K::Policy>>().cloned()
	}

	fn insert(&self, slot: Slot, value: Erased) {
		self.update(|entries| {
			entries.insert(slot.clone(), value.clone());
		});
	}

	fn remove(&self, slot: &Slot) {
		if !self.entries.load().contains_key(slot) {
			return;
		}
		self.update(|entries| {
			entries.remove(slot);
		});
	}

	fn update(&self, mut apply: impl FnMut(&mut Entries)) {
		loop {
			let cur = self.entries.load_full();
			let mut next = (*cur).clone();
			apply(&mut next);

			let prev = self.entries.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return;
			}
		}
	}
}

impl fmt::Debug for PolicyStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PolicyStore")
			.field("label", &self.label)
			.field("entries", &self.len())
			.field("parent", &self.parent.as_ref().map(|p| p.label))
			.finish()
	}
}
