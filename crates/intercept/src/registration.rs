//! Programmatic interception setup.
//!
//! [`Interception`] writes interception policies into a store and validates
//! each registration before anything is written, so bad configuration is
//! reported to the caller instead of surfacing in a later build.
//! [`InterceptionOptions`] selects which interception strategies a chain
//! gets and can be parsed from TOML.

use std::sync::Arc;

use serde::Deserialize;
use weave_policy::{BuildKey, PolicyStore};

use crate::construct::ConstructorSelector;
use crate::error::ConfigError;
use crate::interceptor::Interceptor;
use crate::pipeline::{Stage, StagedStrategyChain};
use crate::policies::{
	AdditionalInterfaces, BehaviorSource, Behaviors, BuildKeyMapping, BuildKeyMappingPolicy,
	ConstructorSelection, InstanceInterception, InstanceInterceptionPolicy, TypeInterception,
	TypeInterceptionPolicy,
};
use crate::strategy::{InstanceWrappingStrategy, TypeSubstitutionStrategy};
use crate::types::{NamedType, Type};

/// Which interception strategies to install and whether registrations are checked.
///
/// ```toml
/// type_substitution = true
/// instance_wrapping = false
/// validate_registrations = true
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterceptionOptions {
	pub type_substitution: bool,
	pub instance_wrapping: bool,
	pub validate_registrations: bool,
}

impl Default for InterceptionOptions {
	fn default() -> Self {
		Self {
			type_substitution: true,
			instance_wrapping: true,
			validate_registrations: true,
		}
	}
}

impl InterceptionOptions {
	/// Parses options from TOML. Missing fields keep their defaults.
	pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(source)?)
	}

	/// Adds the enabled interception strategies to `chain`.
	///
	/// Instance wrapping goes into [`Stage::Setup`] so its post-phase hook
	/// runs after every other strategy. Type substitution goes into
	/// [`Stage::PreCreation`], after key mapping and before construction.
	pub fn install(&self, chain: &mut StagedStrategyChain) {
		if self.instance_wrapping {
			chain.add(Stage::Setup, InstanceWrappingStrategy);
		}
		if self.type_substitution {
			chain.add(Stage::PreCreation, TypeSubstitutionStrategy);
		}
	}
}

/// Registers interception policies into one policy layer.
///
/// Every method returns `&Self` on success so registrations can be chained
/// with `?`.
#[derive(Debug)]
pub struct Interception<'a> {
	store: &'a PolicyStore,
	options: InterceptionOptions,
}

impl<'a> Interception<'a> {
	pub fn new(store: &'a PolicyStore) -> Self {
		Self::with_options(store, InterceptionOptions::default())
	}

	pub fn with_options(store: &'a PolicyStore, options: InterceptionOptions) -> Self {
		Self { store, options }
	}

	pub fn options(&self) -> &InterceptionOptions {
		&self.options
	}

	/// Registers `interceptor` for `ty` built under `name`.
	///
	/// The interceptor variant decides which policy kind is written.
	pub fn set_interceptor_for(
		&self,
		ty: &Type,
		name: Option<&str>,
		interceptor: Interceptor,
	) -> Result<&Self, ConfigError> {
		if self.options.validate_registrations && !interceptor.can_intercept(ty) {
			tracing::warn!(
				ty = %ty.name(),
				interceptor = interceptor.name(),
				"interceptor registration rejected"
			);
			return Err(ConfigError::NotInterceptable {
				interceptor: interceptor.name().to_string(),
				ty: ty.name().clone(),
			});
		}

		let key = key_for(ty, name);
		tracing::debug!(key = %key, ?interceptor, "interceptor registered");
		match interceptor {
			Interceptor::Type(_) => {
				let policy = TypeInterceptionPolicy::try_from(interceptor)?;
				self.store.set::<TypeInterception>(&key, Arc::new(policy));
			}
			Interceptor::Instance(_) => {
				let policy = InstanceInterceptionPolicy::try_from(interceptor)?;
				self.store.set::<InstanceInterception>(&key, Arc::new(policy));
			}
		}
		Ok(self)
	}

	/// Registers `interceptor` in the default namespace of `ty`.
	///
	/// Same as [`set_interceptor_for`](Self::set_interceptor_for) with no name.
	pub fn set_default_interceptor_for(
		&self,
		ty: &Type,
		interceptor: Interceptor,
	) -> Result<&Self, ConfigError> {
		self.set_interceptor_for(ty, None, interceptor)
	}

	/// Appends a behavior to those configured for `ty` under `name`.
	pub fn add_behavior(
		&self,
		ty: &Type,
		name: Option<&str>,
		behavior: impl Into<BehaviorSource>,
	) -> Result<&Self, ConfigError> {
		let source = behavior.into();
		if self.options.validate_registrations
			&& let BehaviorSource::Shared(b) = &source
			&& b.name().is_empty()
		{
			tracing::warn!(ty = %ty.name(), "behavior registration rejected");
			return Err(ConfigError::EmptyBehaviorName { ty: ty.name().clone() });
		}

		let key = key_for(ty, name);
		tracing::debug!(key = %key, behavior = ?source, "behavior registered");
		self.store.modify::<Behaviors>(&key, |current| {
			let policy = current.map(|p| (**p).clone()).unwrap_or_default();
			Arc::new(policy.with(source.clone()))
		});
		Ok(self)
	}

	/// Requires proxies and wrappers for `ty` under `name` to expose `iface`.
	pub fn add_interface(
		&self,
		ty: &Type,
		name: Option<&str>,
		iface: &Type,
	) -> Result<&Self, ConfigError> {
		if self.options.validate_registrations && !iface.is_interface() {
			tracing::warn!(ty = %ty.name(), iface = %iface.name(), "interface registration rejected");
			return Err(ConfigError::NotAnInterface {
				ty: iface.name().clone(),
			});
		}

		let key = key_for(ty, name);
		tracing::debug!(key = %key, iface = %iface.name(), "additional interface registered");
		self.store.modify::<AdditionalInterfaces>(&key, |current| {
			let mut policy = current.map(|p| (**p).clone()).unwrap_or_default();
			policy.interfaces.insert(iface.name().clone());
			Arc::new(policy)
		});
		Ok(self)
	}

	/// Sets the constructor selector for `ty` under `name`.
	pub fn select_constructor(
		&self,
		ty: &Type,
		name: Option<&str>,
		selector: impl ConstructorSelector + 'static,
	) -> &Self {
		let selector: Arc<dyn ConstructorSelector> = Arc::new(selector);
		self.store.set::<ConstructorSelection>(&key_for(ty, name), selector);
		self
	}

	/// Builds `to` whenever `from` is requested under `name`.
	pub fn map_type(&self, from: &Type, name: Option<&str>, to: NamedType) -> &Self {
		let key = key_for(from, name);
		tracing::debug!(key = %key, to = %to.key(), "type mapping registered");
		self.store
			.set::<BuildKeyMapping>(&key, Arc::new(BuildKeyMappingPolicy { target: to }));
		self
	}

	/// Removes every interception policy registered for `ty` under `name`.
	///
	/// A constructor remapper left in this layer by earlier builds is replaced
	/// by the selector it wraps.
	pub fn clear(&self, ty: &Type, name: Option<&str>) -> &Self {
		let key = key_for(ty, name);
		self.store.clear::<TypeInterception>(&key);
		self.store.clear::<InstanceInterception>(&key);
		self.store.clear::<Behaviors>(&key);
		self.store.clear::<AdditionalInterfaces>(&key);

		if let Some(selector) = self.store.get_local::<ConstructorSelection>(&key)
			&& let Some(remap) = selector.as_substitute()
		{
			tracing::debug!(
				key = %key,
				substitute = %remap.substitute().name(),
				"constructor remapping removed"
			);
			self.store
				.set::<ConstructorSelection>(&key, Arc::clone(remap.original()));
		}
		self
	}
}

fn key_for(ty: &Type, name: Option<&str>) -> BuildKey {
	BuildKey::named(ty.name().clone(), name)
}
