//! Interceptor capabilities.
//!
//! Two variants exist: a [`TypeInterceptor`] swaps the type being built for
//! a substitute before construction, an [`InstanceInterceptor`] wraps a value
//! after it is built. [`Interceptor`] tags which variant a policy carries.

use std::fmt;
use std::sync::Arc;

use crate::behavior::Behavior;
use crate::component::Instance;
use crate::error::BuildError;
use crate::types::{InterfaceSet, Type, TypeInfo};

mod subclass;
mod wrapper;

pub use subclass::SubclassInterceptor;
pub use wrapper::WrapperInterceptor;

/// Intercepts by building a substitute type in place of the requested one.
pub trait TypeInterceptor: Send + Sync {
	fn name(&self) -> &str;

	fn can_intercept(&self, ty: &TypeInfo) -> bool;

	/// Returns a type that can be built in place of `ty` and exposes
	/// `interfaces` in addition to everything `ty` exposes.
	///
	/// Values built from the substitute must expose the
	/// [`InterceptingProxy`](crate::InterceptingProxy) capability.
	fn create_proxy_type(&self, ty: &Type, interfaces: &InterfaceSet) -> Result<Type, BuildError>;
}

/// Intercepts by wrapping an already built value.
pub trait InstanceInterceptor: Send + Sync {
	fn name(&self) -> &str;

	fn can_intercept(&self, ty: &TypeInfo) -> bool;

	/// Wraps `instance`, seen as `ty`, so calls run through `behaviors`.
	fn wrap(
		&self,
		ty: &Type,
		instance: Instance,
		behaviors: Vec<Behavior>,
		interfaces: &InterfaceSet,
	) -> Result<Instance, BuildError>;
}

/// An interceptor of either variant.
#[derive(Clone)]
pub enum Interceptor {
	Type(Arc<dyn TypeInterceptor>),
	Instance(Arc<dyn InstanceInterceptor>),
}

impl Interceptor {
	pub fn of_type(interceptor: impl TypeInterceptor + 'static) -> Self {
		Self::Type(Arc::new(interceptor))
	}

	pub fn of_instance(interceptor: impl InstanceInterceptor + 'static) -> Self {
		Self::Instance(Arc::new(interceptor))
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Type(i) => i.name(),
			Self::Instance(i) => i.name(),
		}
	}

	pub fn can_intercept(&self, ty: &TypeInfo) -> bool {
		match self {
			Self::Type(i) => i.can_intercept(ty),
			Self::Instance(i) => i.can_intercept(ty),
		}
	}

	pub fn as_type(&self) -> Option<&Arc<dyn TypeInterceptor>> {
		match self {
			Self::Type(i) => Some(i),
			Self::Instance(_) => None,
		}
	}

	pub fn as_instance(&self) -> Option<&Arc<dyn InstanceInterceptor>> {
		match self {
			Self::Instance(i) => Some(i),
			Self::Type(_) => None,
		}
	}
}

impl fmt::Debug for Interceptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Type(i) => write!(f, "Interceptor::Type({})", i.name()),
			Self::Instance(i) => write!(f, "Interceptor::Instance({})", i.name()),
		}
	}
}
