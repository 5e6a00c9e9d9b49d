use std::sync::Arc;

use crate::construct::{ConstructorSelector, DefaultConstructorSelector, find_selector};
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::pipeline::BuilderStrategy;

/// Builds the current target when no value exists yet.
///
/// Uses the constructor selector configured for the build (see
/// [`find_selector`]) or the parameterless constructor when none is.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstructionStrategy;

impl BuilderStrategy for ConstructionStrategy {
	fn name(&self) -> &str {
		"construction"
	}

	fn pre_build_up(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
		if ctx.existing().is_some() {
			return Ok(());
		}

		let selector: Arc<dyn ConstructorSelector> = match find_selector(ctx) {
			Some((selector, _)) => selector,
			None => Arc::new(DefaultConstructorSelector),
		};
		let selected = selector.select(ctx)?;
		let instance = selected.invoke(ctx)?;

		tracing::debug!(
			key = %ctx.current_key(),
			constructor = ?selected.constructor,
			"instance constructed"
		);
		ctx.set_existing(instance);
		Ok(())
	}
}
