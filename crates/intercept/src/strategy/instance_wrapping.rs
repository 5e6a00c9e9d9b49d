use std::sync::Arc;

use crate::behavior::{all_interfaces, executing};
use crate::component::is_intercepted;
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::interceptor::Interceptor;
use crate::pipeline::BuilderStrategy;
use crate::policies::{AdditionalInterfaces, Behaviors, InstanceInterception};

/// Wraps the built value with an instance interceptor.
///
/// Policies are probed at the requested key, so a value built through a
/// key mapping is wrapped as the type the caller asked for. Values that
/// already carry a pipeline are left alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstanceWrappingStrategy;

impl BuilderStrategy for InstanceWrappingStrategy {
	fn name(&self) -> &str {
		"instance-wrapping"
	}

	fn post_build_up(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
		let Some(instance) = ctx.existing() else {
			return Ok(());
		};
		if is_intercepted(instance) {
			tracing::trace!(key = %ctx.original_key(), "already intercepted");
			return Ok(());
		}
		let instance = Arc::clone(instance);

		let key = ctx.original_key();
		let policies = ctx.policies();
		let Some(policy) = policies.probe::<InstanceInterception>(&key) else {
			return Ok(());
		};
		let Some(configured) = policies.probe::<Behaviors>(&key) else {
			return Ok(());
		};
		let additional = policies
			.probe::<AdditionalInterfaces>(&key)
			.or_else(|| policies.probe::<AdditionalInterfaces>(&ctx.current_key()))
			.map(|p| p.interfaces.clone())
			.unwrap_or_default();

		let ty = Arc::clone(&ctx.original().ty);
		let interceptor = Interceptor::Instance(Arc::clone(&policy.interceptor));
		let behaviors = executing(configured.effective_behaviors(
			&interceptor,
			&ty,
			instance.type_info(),
		)?);
		if behaviors.is_empty() {
			tracing::debug!(key = %key, "no active behaviors, instance left as built");
			return Ok(());
		}

		if !policy.interceptor.can_intercept(&ty) {
			return Err(BuildError::InterceptionNotSupported {
				interceptor: policy.interceptor.name().to_string(),
				ty: ty.name().clone(),
			});
		}

		let interfaces = all_interfaces(&behaviors, &additional);
		tracing::debug!(
			key = %key,
			interceptor = interceptor.name(),
			behaviors = behaviors.len(),
			"wrapping instance"
		);
		let wrapped = policy.interceptor.wrap(&ty, instance, behaviors, &interfaces)?;
		ctx.set_existing(wrapped);
		Ok(())
	}
}
