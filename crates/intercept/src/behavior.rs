//! Interception behaviors and the pipeline that runs them.
//!
//! A behavior wraps a member invocation: it receives the call and a [`Next`]
//! continuation, and decides whether (and how) to proceed. Behaviors run in
//! the order they were added; the first one added is outermost.

use std::fmt;
use std::sync::Arc;

use crate::component::{MethodCall, MethodResult};
use crate::types::{InterfaceSet, TypeName};


/// One unit of cross-cutting logic attached around intercepted calls.
pub trait InterceptionBehavior: Send + Sync {
	fn name(&self) -> &str;

	/// Inactive behaviors are filtered out before they are attached.
	fn will_execute(&self) -> bool {
		true
	}

	/// Interfaces the proxy must expose for this behavior to work.
	fn required_interfaces(&self) -> InterfaceSet {
		InterfaceSet::new()
	}

	fn invoke(&self, call: &MethodCall, next: Next<'_>) -> MethodResult;
}

/// Shared handle to a behavior.
pub type Behavior = Arc<dyn InterceptionBehavior>;

/// Final step of a pipeline: the intercepted target itself.
pub type Target<'a> = &'a dyn Fn(&MethodCall) -> MethodResult;

/// Continuation handed to a behavior: the remaining behaviors plus the target.
pub struct Next<'a> {
	rest: &'a [Behavior],
	target: Target<'a>,
}

impl<'a> Next<'a> {
	/// Runs the rest of the pipeline with `call`.
	pub fn run(self, call: &MethodCall) -> MethodResult {
		match self.rest.split_first() {
			Some((head, rest)) => head.invoke(
				call,
				Next {
					rest,
					target: self.target,
				},
			),
			None => (self.target)(call),
		}
	}

	/// Number of behaviors still ahead of the target.
	pub fn remaining(&self) -> usize {
		self.rest.len()
	}
}

/// Ordered list of behaviors wrapped around a target.
#[derive(Clone, Default)]
pub struct BehaviorPipeline {
	behaviors: Vec<Behavior>,
}

impl BehaviorPipeline {
	pub fn new(behaviors: impl IntoIterator<Item = Behavior>) -> Self {
		Self {
			behaviors: behaviors.into_iter().collect(),
		}
	}

	/// Appends a behavior; it runs inside all previously added ones.
	pub fn add(&mut self, behavior: Behavior) {
		self.behaviors.push(behavior);
	}

	pub fn behaviors(&self) -> &[Behavior] {
		&self.behaviors
	}

	pub fn len(&self) -> usize {
		self.behaviors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.behaviors.is_empty()
	}

	pub fn invoke(&self, call: &MethodCall, target: Target<'_>) -> MethodResult {
		Next {
			rest: &self.behaviors,
			target,
		}
		.run(call)
	}
}

impl fmt::Debug for BehaviorPipeline {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.behaviors.iter().map(|b| b.name()))
			.finish()
	}
}

/// Keeps only behaviors that will execute, preserving order.
pub fn executing(behaviors: impl IntoIterator<Item = Behavior>) -> Vec<Behavior> {
	behaviors.into_iter().filter(|b| b.will_execute()).collect()
}

/// Union of the interfaces `behaviors` require and `additional`.
pub fn all_interfaces(behaviors: &[Behavior], additional: &InterfaceSet) -> InterfaceSet {
	let mut all = additional.clone();
	for behavior in behaviors {
		all.extend(behavior.required_interfaces());
	}
	all
}

type BehaviorFn = dyn Fn(&MethodCall, Next<'_>) -> MethodResult + Send + Sync;

/// Closure-backed behavior.
pub struct FnBehavior {
	name: Box<str>,
	enabled: bool,
	interfaces: InterfaceSet,
	f: Box<BehaviorFn>,
}

impl FnBehavior {
	pub fn new<F>(name: impl Into<Box<str>>, f: F) -> Self
	where
		F: Fn(&MethodCall, Next<'_>) -> MethodResult + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			enabled: true,
			interfaces: InterfaceSet::new(),
			f: Box::new(f),
		}
	}

	/// Behavior that forwards every call unchanged.
	pub fn passthrough(name: impl Into<Box<str>>) -> Self {
		Self::new(name, |call, next| next.run(call))
	}

	pub fn enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	pub fn requires(mut self, iface: impl Into<TypeName>) -> Self {
		self.interfaces.insert(iface.into());
		self
	}

	pub fn into_behavior(self) -> Behavior {
		Arc::new(self)
	}
}

impl InterceptionBehavior for FnBehavior {
	fn name(&self) -> &str {
		&self.name
	}

	fn will_execute(&self) -> bool {
		self.enabled
	}

	fn required_interfaces(&self) -> InterfaceSet {
		self.interfaces.clone()
	}

	fn invoke(&self, call: &MethodCall, next: Next<'_>) -> MethodResult {
		(self.f)(call, next)
	}
}
