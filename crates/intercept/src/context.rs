//! Per-build state.
//!
//! A [`BuildContext`] is owned by the thread running one build. It carries
//! the requested and current build targets, the value built so far and two
//! policy layers: the container-scoped store shared with other builds, and a
//! build-scoped child layer that is dropped when the build ends.

use std::fmt;
use std::sync::Arc;

use weave_policy::{BuildKey, PolicyStore};

use crate::component::Instance;
use crate::types::NamedType;

/// Undo actions registered by strategies, run newest first if a build fails.
#[derive(Default)]
pub struct RecoveryStack {
	actions: Vec<Box<dyn FnOnce() + Send>>,
}

impl RecoveryStack {
	pub fn push(&mut self, action: impl FnOnce() + Send + 'static) {
		self.actions.push(Box::new(action));
	}

	pub fn len(&self) -> usize {
		self.actions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.actions.is_empty()
	}

	pub fn execute(self) {
		for action in self.actions.into_iter().rev() {
			action();
		}
	}
}

/// Mutable record threaded through every strategy of one build.
pub struct BuildContext {
	original: NamedType,
	current: NamedType,
	existing: Option<Instance>,
	container: Arc<PolicyStore>,
	policies: PolicyStore,
	complete: bool,
	recovery: RecoveryStack,
}

impl BuildContext {
	/// Starts a build of `target`, layering build-scoped policies over `container`.
	pub fn new(container: Arc<PolicyStore>, target: NamedType, existing: Option<Instance>) -> Self {
		let policies = container.child("build");
		Self {
			original: target.clone(),
			current: target,
			existing,
			container,
			policies,
			complete: false,
			recovery: RecoveryStack::default(),
		}
	}

	/// Target the caller asked for.
	pub fn original(&self) -> &NamedType {
		&self.original
	}

	pub fn original_key(&self) -> BuildKey {
		self.original.key()
	}

	/// Target being built now; differs from the original after a mapping.
	pub fn current(&self) -> &NamedType {
		&self.current
	}

	pub fn current_key(&self) -> BuildKey {
		self.current.key()
	}

	pub fn set_current(&mut self, target: NamedType) {
		tracing::debug!(from = %self.current.key(), to = %target.key(), "build target changed");
		self.current = target;
	}

	pub fn existing(&self) -> Option<&Instance> {
		self.existing.as_ref()
	}

	pub fn set_existing(&mut self, instance: Instance) {
		self.existing = Some(instance);
	}

	pub fn take_existing(&mut self) -> Option<Instance> {
		self.existing.take()
	}

	/// Effective policies: the build-scoped layer over the container store.
	pub fn policies(&self) -> &PolicyStore {
		&self.policies
	}

	/// The container-scoped store shared with concurrent builds.
	pub fn container(&self) -> &Arc<PolicyStore> {
		&self.container
	}

	/// Marks the build as finished; remaining pre-phase hooks are skipped.
	pub fn complete(&mut self) {
		self.complete = true;
	}

	pub fn is_complete(&self) -> bool {
		self.complete
	}

	pub fn add_recovery(&mut self, action: impl FnOnce() + Send + 'static) {
		self.recovery.push(action);
	}

	pub(crate) fn take_recovery(&mut self) -> RecoveryStack {
		std::mem::take(&mut self.recovery)
	}

	pub fn into_existing(self) -> Option<Instance> {
		self.existing
	}
}

impl fmt::Debug for BuildContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BuildContext")
			.field("original", &self.original.key())
			.field("current", &self.current.key())
			.field("existing", &self.existing.as_ref().map(|i| i.type_info().name()))
			.field("complete", &self.complete)
			.finish()
	}
}
