//! Policy kinds consumed by the interception strategies.
//!
//! | Kind | Value | Written by |
//! |------|-------|------------|
//! | [`TypeInterception`] | [`TypeInterceptionPolicy`] | registration |
//! | [`InstanceInterception`] | [`InstanceInterceptionPolicy`] | registration |
//! | [`Behaviors`] | [`InterceptionBehaviorsPolicy`] | registration |
//! | [`AdditionalInterfaces`] | [`AdditionalInterfacesPolicy`] | registration |
//! | [`EffectiveBehaviors`] | [`EffectiveBehaviorsPolicy`] | type substitution, build-scoped |
//! | [`ConstructorSelection`] | `dyn` [`ConstructorSelector`] | registration, remapper |
//! | [`BuildKeyMapping`] | [`BuildKeyMappingPolicy`] | registration |

use std::fmt;
use std::sync::Arc;

use weave_policy::policy_kind;

use crate::behavior::Behavior;
use crate::construct::ConstructorSelector;
use crate::error::{BuildError, ConfigError};
use crate::interceptor::{InstanceInterceptor, Interceptor, TypeInterceptor};
use crate::types::{InterfaceSet, NamedType, Type};

policy_kind! {
	/// Type interceptor to substitute the built type with.
	pub TypeInterception => TypeInterceptionPolicy, "type-interception"
}

policy_kind! {
	/// Instance interceptor to wrap built values with.
	pub InstanceInterception => InstanceInterceptionPolicy, "instance-interception"
}

policy_kind! {
	/// Behaviors configured for a target.
	pub Behaviors => InterceptionBehaviorsPolicy, "behaviors"
}

policy_kind! {
	/// Extra interfaces a proxy or wrapper must expose.
	pub AdditionalInterfaces => AdditionalInterfacesPolicy, "additional-interfaces"
}

policy_kind! {
	/// Behaviors computed for the current build, handed from pre- to post-phase.
	pub EffectiveBehaviors => EffectiveBehaviorsPolicy, "effective-behaviors"
}

policy_kind! {
	/// Constructor selection for a target.
	pub ConstructorSelection => dyn ConstructorSelector, "constructor-selection"
}

policy_kind! {
	/// Redirects a build key to another target.
	pub BuildKeyMapping => BuildKeyMappingPolicy, "build-key-mapping"
}

#[derive(Clone)]
pub struct TypeInterceptionPolicy {
	pub interceptor: Arc<dyn TypeInterceptor>,
}

#[derive(Clone)]
pub struct InstanceInterceptionPolicy {
	pub interceptor: Arc<dyn InstanceInterceptor>,
}

impl TryFrom<Interceptor> for TypeInterceptionPolicy {
	type Error = ConfigError;

	fn try_from(interceptor: Interceptor) -> Result<Self, Self::Error> {
		match interceptor {
			Interceptor::Type(interceptor) => Ok(Self { interceptor }),
			Interceptor::Instance(i) => Err(ConfigError::WrongVariant {
				interceptor: i.name().to_string(),
				expected: "a type",
			}),
		}
	}
}

impl TryFrom<Interceptor> for InstanceInterceptionPolicy {
	type Error = ConfigError;

	fn try_from(interceptor: Interceptor) -> Result<Self, Self::Error> {
		match interceptor {
			Interceptor::Instance(interceptor) => Ok(Self { interceptor }),
			Interceptor::Type(i) => Err(ConfigError::WrongVariant {
				interceptor: i.name().to_string(),
				expected: "an instance",
			}),
		}
	}
}

/// Inputs available to behavior factories.
pub struct BehaviorRequest<'a> {
	pub interceptor: &'a Interceptor,
	/// Type the interception is applied to.
	pub type_to_intercept: &'a Type,
	/// Concrete type of the value behind the interception.
	pub implementation: &'a Type,
}

type BehaviorFactory = dyn Fn(&BehaviorRequest<'_>) -> Result<Behavior, BuildError> + Send + Sync;

/// Where a configured behavior comes from.
#[derive(Clone)]
pub enum BehaviorSource {
	/// The same behavior value is attached to every build.
	Shared(Behavior),
	/// A fresh behavior is created for each build.
	Factory(Arc<BehaviorFactory>),
}

impl BehaviorSource {
	pub fn factory<F>(f: F) -> Self
	where
		F: Fn(&BehaviorRequest<'_>) -> Result<Behavior, BuildError> + Send + Sync + 'static,
	{
		Self::Factory(Arc::new(f))
	}

	fn produce(&self, request: &BehaviorRequest<'_>) -> Result<Behavior, BuildError> {
		match self {
			Self::Shared(behavior) => Ok(Arc::clone(behavior)),
			Self::Factory(f) => f(request),
		}
	}
}

impl From<Behavior> for BehaviorSource {
	fn from(behavior: Behavior) -> Self {
		Self::Shared(behavior)
	}
}

impl fmt::Debug for BehaviorSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Shared(b) => write!(f, "Shared({})", b.name()),
			Self::Factory(_) => f.write_str("Factory"),
		}
	}
}

/// Ordered behavior sources configured for one target.
#[derive(Clone, Debug, Default)]
pub struct InterceptionBehaviorsPolicy {
	sources: Vec<BehaviorSource>,
}

impl InterceptionBehaviorsPolicy {
	pub fn new(sources: impl IntoIterator<Item = BehaviorSource>) -> Self {
		Self {
			sources: sources.into_iter().collect(),
		}
	}

	pub fn with(mut self, source: impl Into<BehaviorSource>) -> Self {
		self.sources.push(source.into());
		self
	}

	pub fn sources(&self) -> &[BehaviorSource] {
		&self.sources
	}

	/// Produces the configured behaviors in order, active or not.
	///
	/// Callers filter on [`will_execute`](crate::InterceptionBehavior::will_execute).
	pub fn effective_behaviors(
		&self,
		interceptor: &Interceptor,
		type_to_intercept: &Type,
		implementation: &Type,
	) -> Result<Vec<Behavior>, BuildError> {
		let request = BehaviorRequest {
			interceptor,
			type_to_intercept,
			implementation,
		};
		self.sources.iter().map(|s| s.produce(&request)).collect()
	}
}

#[derive(Clone, Debug, Default)]
pub struct AdditionalInterfacesPolicy {
	pub interfaces: InterfaceSet,
}

/// Behaviors selected for the running build.
#[derive(Clone, Default)]
pub struct EffectiveBehaviorsPolicy {
	pub behaviors: Vec<Behavior>,
}

impl fmt::Debug for EffectiveBehaviorsPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.behaviors.iter().map(|b| b.name()))
			.finish()
	}
}

#[derive(Clone, Debug)]
pub struct BuildKeyMappingPolicy {
	pub target: NamedType,
}
