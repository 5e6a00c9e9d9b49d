use std::sync::Arc;

use crate::behavior::{all_interfaces, executing};
use crate::construct::set_policy_for_substitute_type;
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::interceptor::Interceptor;
use crate::pipeline::BuilderStrategy;
use crate::policies::{
	AdditionalInterfaces, Behaviors, EffectiveBehaviors, EffectiveBehaviorsPolicy, TypeInterception,
};

/// Swaps the type being built for an interceptor-generated proxy type.
///
/// The pre-phase hook computes the behaviors for the build, records them in
/// the build-scoped layer and remaps constructor selection onto the proxy
/// type. The post-phase hook attaches the recorded behaviors to the proxy
/// value once it exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeSubstitutionStrategy;

impl BuilderStrategy for TypeSubstitutionStrategy {
	fn name(&self) -> &str {
		"type-substitution"
	}

	fn pre_build_up(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
		if ctx.existing().is_some() {
			return Ok(());
		}

		let key = ctx.current_key();
		let policies = ctx.policies();
		let Some(policy) = policies.probe::<TypeInterception>(&key) else {
			return Ok(());
		};
		let ty = Arc::clone(&ctx.current().ty);
		if !policy.interceptor.can_intercept(&ty) {
			tracing::debug!(
				key = %key,
				interceptor = policy.interceptor.name(),
				"type not interceptable"
			);
			return Ok(());
		}

		let interceptor = Interceptor::Type(Arc::clone(&policy.interceptor));
		let behaviors = match policies.probe::<Behaviors>(&key) {
			Some(configured) => executing(configured.effective_behaviors(&interceptor, &ty, &ty)?),
			None => Vec::new(),
		};
		let additional = policies
			.probe::<AdditionalInterfaces>(&key)
			.map(|p| p.interfaces.clone())
			.unwrap_or_default();
		let interfaces = all_interfaces(&behaviors, &additional);

		tracing::debug!(
			key = %key,
			interceptor = interceptor.name(),
			behaviors = behaviors.len(),
			"substituting proxy type"
		);
		policies.set::<EffectiveBehaviors>(&key, Arc::new(EffectiveBehaviorsPolicy { behaviors }));

		let proxy = policy.interceptor.create_proxy_type(&ty, &interfaces)?;
		set_policy_for_substitute_type(ctx, &proxy);
		Ok(())
	}

	fn post_build_up(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
		let Some(proxy) = ctx.existing().and_then(|i| i.as_intercepting_proxy()) else {
			return Ok(());
		};
		let Some(effective) = ctx
			.policies()
			.get_local::<EffectiveBehaviors>(&ctx.current_key())
		else {
			return Ok(());
		};

		for behavior in &effective.behaviors {
			proxy.add_behavior(Arc::clone(behavior));
		}
		Ok(())
	}
}
