use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

use super::TypeInterceptor;
use crate::behavior::BehaviorPipeline;
use crate::component::{Instance, Value};
use crate::error::BuildError;
use crate::proxy::InterceptingInstance;
use crate::types::{Constructor, InterfaceSet, Type, TypeInfo, TypeName};

/// Type interceptor that derives a proxy type from any non-sealed class.
///
/// The proxy mirrors every constructor of the base type: building the proxy
/// builds the base value with the same arguments and wraps it in an
/// [`InterceptingInstance`] with an empty pipeline. Proxy types are cached per
/// `(base, interfaces)`, so repeated requests return the same type.
#[derive(Default)]
pub struct SubclassInterceptor {
	cache: Mutex<HashMap<(TypeName, InterfaceSet), Type>>,
}

impl SubclassInterceptor {
	pub fn new() -> Self {
		Self::default()
	}
}

impl TypeInterceptor for SubclassInterceptor {
	fn name(&self) -> &str {
		"subclass"
	}

	fn can_intercept(&self, ty: &TypeInfo) -> bool {
		!ty.is_interface() && !ty.is_sealed()
	}

	fn create_proxy_type(&self, ty: &Type, interfaces: &InterfaceSet) -> Result<Type, BuildError> {
		if !self.can_intercept(ty) {
			return Err(BuildError::InterceptionNotSupported {
				interceptor: self.name().to_string(),
				ty: ty.name().clone(),
			});
		}

		let key = (ty.name().clone(), interfaces.clone());
		let mut cache = self.cache.lock();
		let proxy = cache
			.entry(key)
			.or_insert_with(|| derive_proxy(ty, interfaces))
			.clone();
		Ok(proxy)
	}
}

fn proxy_name(base: &TypeName, interfaces: &InterfaceSet) -> TypeName {
	if interfaces.is_empty() {
		return format!("{base}Proxy").into();
	}
	let extra: Vec<_> = interfaces.iter().map(TypeName::as_str).collect();
	format!("{base}Proxy<{}>", extra.join("+")).into()
}

fn derive_proxy(base: &Type, interfaces: &InterfaceSet) -> Type {
	let name = proxy_name(base.name(), interfaces);
	tracing::debug!(base = %base.name(), proxy = %name, "deriving proxy type");

	TypeInfo::class(name)
		.base(base.name().clone())
		.interfaces(base.interfaces().iter().cloned())
		.interfaces(interfaces.iter().cloned())
		.build_cyclic(|proxy, name| {
			base.constructors()
				.iter()
				.map(|ctor| proxy_constructor(name, ctor.clone(), proxy.clone()))
				.collect()
		})
}

fn proxy_constructor(name: &TypeName, base: Constructor, proxy: Weak<TypeInfo>) -> Constructor {
	let owner = name.clone();
	let params = base.params().to_vec();
	Constructor::new(
		owner.clone(),
		params,
		Arc::new(move |args: Vec<Value>| -> Result<Instance, BuildError> {
			let target = base.invoke(args)?;
			let ty = proxy.upgrade().ok_or_else(|| BuildError::Construction {
				ty: owner.clone(),
				reason: "proxy type was dropped".to_string(),
			})?;
			let instance: Instance = Arc::new(InterceptingInstance::new(
				ty,
				target,
				BehaviorPipeline::default(),
			));
			Ok(instance)
		}),
	)
}
