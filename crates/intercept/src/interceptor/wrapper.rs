use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

use super::InstanceInterceptor;
use crate::behavior::{Behavior, BehaviorPipeline};
use crate::component::Instance;
use crate::error::BuildError;
use crate::proxy::InterceptingInstance;
use crate::types::{InterfaceSet, Type, TypeInfo, TypeName};

/// Instance interceptor that wraps values seen through an interface.
///
/// The wrapper exposes the intercepted interface plus any additional
/// interfaces and forwards calls to the original value through the
/// behaviors it was created with.
#[derive(Default)]
pub struct WrapperInterceptor {
	cache: Mutex<HashMap<(TypeName, InterfaceSet), Type>>,
}

impl WrapperInterceptor {
	pub fn new() -> Self {
		Self::default()
	}

	fn wrapper_type(&self, ty: &Type, interfaces: &InterfaceSet) -> Type {
		let key = (ty.name().clone(), interfaces.clone());
		self.cache
			.lock()
			.entry(key)
			.or_insert_with(|| {
				TypeInfo::class(format!("{}Wrapper", ty.name()))
					.implements(ty.name().clone())
					.interfaces(ty.interfaces().iter().cloned())
					.interfaces(interfaces.iter().cloned())
					.sealed()
					.build()
			})
			.clone()
	}
}

impl InstanceInterceptor for WrapperInterceptor {
	fn name(&self) -> &str {
		"wrapper"
	}

	fn can_intercept(&self, ty: &TypeInfo) -> bool {
		ty.is_interface()
	}

	fn wrap(
		&self,
		ty: &Type,
		instance: Instance,
		behaviors: Vec<Behavior>,
		interfaces: &InterfaceSet,
	) -> Result<Instance, BuildError> {
		if !self.can_intercept(ty) {
			return Err(BuildError::InterceptionNotSupported {
				interceptor: self.name().to_string(),
				ty: ty.name().clone(),
			});
		}
		let concrete = instance.type_info();
		if !concrete.is_assignable_to(ty.name()) {
			return Err(BuildError::Interceptor {
				interceptor: self.name().to_string(),
				reason: format!("{} does not implement {}", concrete.name(), ty.name()),
			});
		}

		let wrapper = self.wrapper_type(ty, interfaces);
		tracing::debug!(
			ty = %ty.name(),
			wrapper = %wrapper.name(),
			behaviors = behaviors.len(),
			"wrapping instance"
		);
		let wrapped: Instance = Arc::new(InterceptingInstance::new(
			wrapper,
			instance,
			BehaviorPipeline::new(behaviors),
		));
		Ok(wrapped)
	}
}
