use crate::context::BuildContext;
use crate::error::BuildError;
use crate::pipeline::BuilderStrategy;
use crate::policies::BuildKeyMapping;
use crate::types::NamedType;

/// Redirects the current build target through a [`BuildKeyMapping`] policy.
///
/// A mapping target without a name keeps the name of the key it maps from.
/// Mappings are applied once; the original key is left as requested.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildKeyMappingStrategy;

impl BuilderStrategy for BuildKeyMappingStrategy {
	fn name(&self) -> &str {
		"build-key-mapping"
	}

	fn pre_build_up(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
		let Some(mapping) = ctx.policies().probe::<BuildKeyMapping>(&ctx.current_key()) else {
			return Ok(());
		};
		let target = match mapping.target.name {
			Some(_) => mapping.target.clone(),
			None => NamedType {
				ty: mapping.target.ty.clone(),
				name: ctx.current().name.clone(),
			},
		};
		ctx.set_current(target);
		Ok(())
	}
}
