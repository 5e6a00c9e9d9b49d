//! Interception strategies for a staged build pipeline.
//!
//! A build resolves a [`NamedType`] into an [`Instance`] by running a
//! [`StrategyChain`] over a [`BuildContext`]. Configuration lives in a
//! layered [`PolicyStore`](weave_policy::PolicyStore): a container-scoped
//! layer shared by every build, with a short-lived build-scoped layer on top.
//!
//! Two strategies add interception to a chain:
//!
//! - [`TypeSubstitutionStrategy`] swaps the requested type for a proxy type
//!   before construction and attaches behaviors to the proxy afterwards.
//! - [`InstanceWrappingStrategy`] wraps the finished value with an instance
//!   interceptor.
//!
//! Both read their configuration from the [`policies`] kinds, usually
//! written through [`Interception`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use weave_intercept::{
//!     Builder, Component, FnBehavior, Instance, Interception, InterceptionOptions, Interceptor,
//!     MethodCall, MethodResult, NamedType, SubclassInterceptor, Type, TypeInfo,
//! };
//! use weave_policy::PolicyStore;
//!
//! struct Greeter(Type);
//!
//! impl Component for Greeter {
//!     fn type_info(&self) -> &Type {
//!         &self.0
//!     }
//!
//!     fn invoke(&self, _call: &MethodCall) -> MethodResult {
//!         Ok(json!("hello"))
//!     }
//! }
//!
//! let greeter = TypeInfo::class("Greeter")
//!     .constructor(&[], |_| {
//!         let ty = TypeInfo::class("Greeter").build();
//!         Ok(Arc::new(Greeter(ty)) as Instance)
//!     })
//!     .build();
//!
//! let container = Arc::new(PolicyStore::new("container"));
//! Interception::new(&container)
//!     .set_interceptor_for(&greeter, None, Interceptor::of_type(SubclassInterceptor::new()))?
//!     .add_behavior(
//!         &greeter,
//!         None,
//!         FnBehavior::new("shout", |call, next| {
//!             let out = next.run(call)?;
//!             Ok(json!(out.as_str().unwrap_or_default().to_uppercase()))
//!         })
//!         .into_behavior(),
//!     )?;
//!
//! let builder = Builder::with_interception(container, InterceptionOptions::default());
//! let instance = builder.build(NamedType::new(greeter))?;
//! assert_eq!(instance.invoke(&MethodCall::new("greet", vec![]))?, json!("HELLO"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod behavior;
mod builder;
mod component;
mod construct;
mod context;
mod error;
mod interceptor;
mod pipeline;
pub mod policies;
mod proxy;
mod registration;
mod strategy;
mod types;

#[cfg(test)]
mod test_support;

pub use behavior::{
	Behavior, BehaviorPipeline, FnBehavior, InterceptionBehavior, Next, Target, all_interfaces,
	executing,
};
pub use builder::{Builder, base_chain};
pub use component::{Component, Instance, MethodCall, MethodResult, Value, is_intercepted};
pub use construct::{
	Argument, ArgumentProvider, ConstructorSelector, DefaultConstructorSelector, FnArgument,
	LiteralArgument, SelectedConstructor, SpecifiedConstructor, SubstituteConstructorSelector,
	find_selector, literal, set_policy_for_substitute_type,
};
pub use context::{BuildContext, RecoveryStack};
pub use error::{BuildError, ConfigError, InvocationError};
pub use interceptor::{
	InstanceInterceptor, Interceptor, SubclassInterceptor, TypeInterceptor, WrapperInterceptor,
};
pub use pipeline::{BuilderStrategy, Stage, StagedStrategyChain, Strategy, StrategyChain};
pub use proxy::{InterceptingInstance, InterceptingProxy};
pub use registration::{Interception, InterceptionOptions};
pub use strategy::{
	BuildKeyMappingStrategy, ConstructionStrategy, InstanceWrappingStrategy,
	TypeSubstitutionStrategy,
};
pub use types::{
	ConstructFn, Constructor, InterfaceSet, NamedType, Type, TypeBuilder, TypeInfo, TypeKind,
	TypeName,
};
pub use weave_policy::BuildKey;
