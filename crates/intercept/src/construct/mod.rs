//! Constructor selection.
//!
//! A [`ConstructorSelector`] decides which constructor builds the current
//! target and which providers supply its arguments. Selectors live in the
//! policy store under [`ConstructorSelection`](crate::policies::ConstructorSelection);
//! [`find_selector`] resolves the one that applies to a build.

use std::fmt;
use std::sync::Arc;

use weave_policy::PolicyStore;

use crate::component::{Instance, Value};
use crate::context::BuildContext;
use crate::error::{BuildError, format_params};
use crate::policies::ConstructorSelection;
use crate::types::{Constructor, TypeName};

mod remap;

pub use remap::{SubstituteConstructorSelector, set_policy_for_substitute_type};


/// Supplies one constructor argument.
pub trait ArgumentProvider: Send + Sync {
	fn resolve(&self, ctx: &BuildContext) -> Result<Value, BuildError>;
}

pub type Argument = Arc<dyn ArgumentProvider>;

/// Argument with a fixed value.
#[derive(Debug, Clone)]
pub struct LiteralArgument(pub Value);

impl ArgumentProvider for LiteralArgument {
	fn resolve(&self, _ctx: &BuildContext) -> Result<Value, BuildError> {
		Ok(self.0.clone())
	}
}

type ArgumentFn = dyn Fn(&BuildContext) -> Result<Value, BuildError> + Send + Sync;

/// Argument computed from the build context.
pub struct FnArgument(Box<ArgumentFn>);

impl FnArgument {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&BuildContext) -> Result<Value, BuildError> + Send + Sync + 'static,
	{
		Self(Box::new(f))
	}
}

impl ArgumentProvider for FnArgument {
	fn resolve(&self, ctx: &BuildContext) -> Result<Value, BuildError> {
		(self.0)(ctx)
	}
}

pub fn literal(value: impl Into<Value>) -> Argument {
	Arc::new(LiteralArgument(value.into()))
}

/// A chosen constructor and the providers for its parameters, in order.
#[derive(Clone)]
pub struct SelectedConstructor {
	pub constructor: Constructor,
	pub arguments: Vec<Argument>,
}

impl SelectedConstructor {
	/// Resolves every argument and invokes the constructor.
	pub fn invoke(&self, ctx: &BuildContext) -> Result<Instance, BuildError> {
		let args = self
			.arguments
			.iter()
			.map(|arg| arg.resolve(ctx))
			.collect::<Result<Vec<_>, _>>()?;
		self.constructor.invoke(args)
	}
}

impl fmt::Debug for SelectedConstructor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SelectedConstructor")
			.field("constructor", &self.constructor)
			.field("arguments", &self.arguments.len())
			.finish()
	}
}

/// Chooses the constructor for a build.
pub trait ConstructorSelector: Send + Sync {
	fn select(&self, ctx: &BuildContext) -> Result<SelectedConstructor, BuildError>;

	/// Returns the remapping view if this selector targets a substitute type.
	fn as_substitute(&self) -> Option<&SubstituteConstructorSelector> {
		None
	}
}

/// Picks the parameterless constructor of the current target.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConstructorSelector;

impl ConstructorSelector for DefaultConstructorSelector {
	fn select(&self, ctx: &BuildContext) -> Result<SelectedConstructor, BuildError> {
		let ty = &ctx.current().ty;
		let constructor = ty
			.find_constructor(&[])
			.ok_or_else(|| BuildError::NoMatchingConstructor {
				ty: ty.name().clone(),
				params: String::new(),
			})?;
		Ok(SelectedConstructor {
			constructor: constructor.clone(),
			arguments: Vec::new(),
		})
	}
}

/// Picks the current target's constructor with the given parameter types.
pub struct SpecifiedConstructor {
	params: Vec<TypeName>,
	arguments: Vec<Argument>,
}

impl SpecifiedConstructor {
	pub fn new(params: &[&str], arguments: Vec<Argument>) -> Self {
		Self {
			params: params.iter().map(|p| TypeName::from(*p)).collect(),
			arguments,
		}
	}
}

impl ConstructorSelector for SpecifiedConstructor {
	fn select(&self, ctx: &BuildContext) -> Result<SelectedConstructor, BuildError> {
		let ty = &ctx.current().ty;
		let constructor = ty
			.find_constructor(&self.params)
			.ok_or_else(|| BuildError::NoMatchingConstructor {
				ty: ty.name().clone(),
				params: format_params(&self.params),
			})?;
		Ok(SelectedConstructor {
			constructor: constructor.clone(),
			arguments: self.arguments.clone(),
		})
	}
}

/// Resolves the selector that applies to a build, with the layer holding it.
///
/// Probes the original key, then resolves the current key (falling back to
/// the kind-wide default). `None` means nothing is configured anywhere.
pub fn find_selector(ctx: &BuildContext) -> Option<(Arc<dyn ConstructorSelector>, &PolicyStore)> {
	let policies = ctx.policies();
	policies
		.probe_with_layer::<ConstructorSelection>(&ctx.original_key())
		.or_else(|| policies.resolve_with_layer::<ConstructorSelection>(&ctx.current_key()))
}
