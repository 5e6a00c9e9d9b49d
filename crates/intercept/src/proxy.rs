//! Values produced by interception.

use std::fmt;

use parking_lot::RwLock;

use crate::behavior::{Behavior, BehaviorPipeline};
use crate::component::{Component, Instance, MethodCall, MethodResult};
use crate::types::Type;

/// Capability exposed by values that carry a behavior pipeline.
pub trait InterceptingProxy: Send + Sync {
	/// Appends a behavior to the pipeline; it runs inside existing ones.
	fn add_behavior(&self, behavior: Behavior);

	/// Snapshot of the attached behaviors, outermost first.
	fn behaviors(&self) -> Vec<Behavior>;

	/// The value calls are ultimately forwarded to.
	fn target(&self) -> &Instance;
}

/// A value whose member calls run through a [`BehaviorPipeline`] before
/// reaching the wrapped target.
pub struct InterceptingInstance {
	ty: Type,
	target: Instance,
	pipeline: RwLock<BehaviorPipeline>,
}

impl InterceptingInstance {
	pub fn new(ty: Type, target: Instance, pipeline: BehaviorPipeline) -> Self {
		Self {
			ty,
			target,
			pipeline: RwLock::new(pipeline),
		}
	}
}

impl Component for InterceptingInstance {
	fn type_info(&self) -> &Type {
		&self.ty
	}

	fn invoke(&self, call: &MethodCall) -> MethodResult {
		// The lock is never held across a call.
		let pipeline = self.pipeline.read().clone();
		pipeline.invoke(call, &|call| self.target.invoke(call))
	}

	fn as_intercepting_proxy(&self) -> Option<&dyn InterceptingProxy> {
		Some(self)
	}
}

impl InterceptingProxy for InterceptingInstance {
	fn add_behavior(&self, behavior: Behavior) {
		tracing::trace!(ty = %self.ty.name(), behavior = behavior.name(), "behavior attached");
		self.pipeline.write().add(behavior);
	}

	fn behaviors(&self) -> Vec<Behavior> {
		self.pipeline.read().behaviors().to_vec()
	}

	fn target(&self) -> &Instance {
		&self.target
	}
}

impl fmt::Debug for InterceptingInstance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InterceptingInstance")
			.field("ty", self.ty.name())
			.field("target", self.target.type_info().name())
			.field("pipeline", &*self.pipeline.read())
			.finish()
	}
}
