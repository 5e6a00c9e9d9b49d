//! Constructor remapping for substituted types.
//!
//! When a build's type is swapped for a substitute, the configured
//! constructor selector still describes the original type. The remapper
//! wraps it: the original selector picks the constructor and argument
//! providers, the remapper finds the substitute's constructor with the same
//! parameter list and keeps the providers as they are.
//!
//! # Invariants
//!
//! - A remapper never wraps another remapper; at most one level of
//!   indirection exists per key, however often the key is rebuilt.

use std::sync::Arc;

use super::{ConstructorSelector, DefaultConstructorSelector, SelectedConstructor, find_selector};
use crate::context::BuildContext;
use crate::error::{BuildError, format_params};
use crate::policies::ConstructorSelection;
use crate::types::Type;

/// Selects the substitute type's constructor matching the one chosen by the
/// original selector.
pub struct SubstituteConstructorSelector {
	substitute: Type,
	original: Arc<dyn ConstructorSelector>,
}

impl SubstituteConstructorSelector {
	/// Wraps `original`. If `original` is itself a remapper, its inner
	/// selector is wrapped instead.
	pub fn new(substitute: Type, original: Arc<dyn ConstructorSelector>) -> Self {
		let original = match original.as_substitute() {
			Some(remap) => Arc::clone(&remap.original),
			None => original,
		};
		Self {
			substitute,
			original,
		}
	}

	pub fn substitute(&self) -> &Type {
		&self.substitute
	}

	/// The selector this remapper wraps; never a remapper itself.
	pub fn original(&self) -> &Arc<dyn ConstructorSelector> {
		&self.original
	}
}

impl ConstructorSelector for SubstituteConstructorSelector {
	fn select(&self, ctx: &BuildContext) -> Result<SelectedConstructor, BuildError> {
		let selected = self.original.select(ctx)?;
		let params = selected.constructor.params();
		let Some(constructor) = self.substitute.find_constructor(params) else {
			return Err(BuildError::IncompatibleSubstitute {
				original: selected.constructor.owner().clone(),
				substitute: self.substitute.name().clone(),
				params: format_params(params),
			});
		};

		tracing::trace!(
			original = ?selected.constructor,
			substitute = ?constructor,
			"constructor remapped"
		);
		Ok(SelectedConstructor {
			constructor: constructor.clone(),
			arguments: selected.arguments,
		})
	}

	fn as_substitute(&self) -> Option<&SubstituteConstructorSelector> {
		Some(self)
	}
}

/// Installs a remapper for the build's original key that targets `substitute`.
///
/// The remapper is stored in the layer the current selector was found in.
/// When no selector is configured, the default selector is wrapped and the
/// remapper lives in the build-scoped layer.
pub fn set_policy_for_substitute_type(ctx: &BuildContext, substitute: &Type) {
	let key = ctx.original_key();
	let (current, layer) = match find_selector(ctx) {
		Some(found) => found,
		None => {
			let fallback: Arc<dyn ConstructorSelector> = Arc::new(DefaultConstructorSelector);
			(fallback, ctx.policies())
		}
	};

	let next: Arc<dyn ConstructorSelector> = match current.as_substitute() {
		Some(remap) if remap.substitute().name() == substitute.name() => Arc::clone(&current),
		Some(remap) => Arc::new(SubstituteConstructorSelector::new(
			substitute.clone(),
			Arc::clone(remap.original()),
		)),
		None => Arc::new(SubstituteConstructorSelector::new(
			substitute.clone(),
			Arc::clone(&current),
		)),
	};

	tracing::debug!(
		key = %key,
		substitute = %substitute.name(),
		layer = layer.label(),
		"constructor selection remapped"
	);
	layer.set::<ConstructorSelection>(&key, next);
}
