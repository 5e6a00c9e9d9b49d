use std::sync::Arc;

use weave_policy::PolicyStore;

use crate::component::Instance;
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::pipeline::{Stage, StagedStrategyChain, StrategyChain};
use crate::registration::InterceptionOptions;
use crate::strategy::{BuildKeyMappingStrategy, ConstructionStrategy};
use crate::types::NamedType;

/// Runs builds against a container-scoped policy store.
///
/// Each build gets its own build-scoped policy layer, which is dropped when
/// the build returns.
#[derive(Debug, Clone)]
pub struct Builder {
	container: Arc<PolicyStore>,
	chain: StrategyChain,
}

impl Builder {
	pub fn new(container: Arc<PolicyStore>, chain: StrategyChain) -> Self {
		Self { container, chain }
	}

	/// Builder with key mapping and construction only.
	pub fn plain(container: Arc<PolicyStore>) -> Self {
		Self::new(container, base_chain().make_chain())
	}

	/// Builder with key mapping, construction and the interception
	/// strategies enabled in `options`.
	pub fn with_interception(container: Arc<PolicyStore>, options: InterceptionOptions) -> Self {
		let mut staged = base_chain();
		options.install(&mut staged);
		Self::new(container, staged.make_chain())
	}

	pub fn container(&self) -> &Arc<PolicyStore> {
		&self.container
	}

	pub fn chain(&self) -> &StrategyChain {
		&self.chain
	}

	/// Builds a new value for `target`.
	pub fn build(&self, target: NamedType) -> Result<Instance, BuildError> {
		self.build_up(target, None)
	}

	/// Runs the chain for `target`, starting from `existing` if given.
	pub fn build_up(
		&self,
		target: NamedType,
		existing: Option<Instance>,
	) -> Result<Instance, BuildError> {
		let mut ctx = BuildContext::new(Arc::clone(&self.container), target, existing);
		let _span = tracing::debug_span!("build", key = %ctx.original_key()).entered();

		self.chain.build_up(&mut ctx)?;
		let key = ctx.original_key();
		ctx.into_existing().ok_or(BuildError::NothingBuilt { key })
	}
}

/// Staged chain holding the strategies every builder needs.
pub fn base_chain() -> StagedStrategyChain {
	let mut staged = StagedStrategyChain::new();
	staged
		.add(Stage::TypeMapping, BuildKeyMappingStrategy)
		.add(Stage::Creation, ConstructionStrategy);
	staged
}
