//! Built values and member invocation.

use std::sync::Arc;

use crate::error::InvocationError;
use crate::proxy::InterceptingProxy;
use crate::types::Type;

/// Dynamically typed argument or return value.
pub type Value = serde_json::Value;

/// Outcome of invoking a member.
pub type MethodResult = Result<Value, InvocationError>;

/// A member invocation: method name plus positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
	pub method: Box<str>,
	pub args: Vec<Value>,
}

impl MethodCall {
	pub fn new(method: impl Into<Box<str>>, args: Vec<Value>) -> Self {
		Self {
			method: method.into(),
			args,
		}
	}

	pub fn method(&self) -> &str {
		&self.method
	}
}

/// A constructed value the pipeline can hand out and intercept.
pub trait Component: Send + Sync + 'static {
	/// Concrete type of this value.
	fn type_info(&self) -> &Type;

	/// Invokes a member by name.
	fn invoke(&self, call: &MethodCall) -> MethodResult;

	/// Returns the proxy capability if this value was produced by interception.
	fn as_intercepting_proxy(&self) -> Option<&dyn InterceptingProxy> {
		None
	}
}

/// Shared handle to a built value.
pub type Instance = Arc<dyn Component>;

/// Whether `instance` already carries an interception pipeline.
pub fn is_intercepted(instance: &Instance) -> bool {
	instance.as_intercepting_proxy().is_some()
}
