//! Strategy chain driver.
//!
//! A build runs every strategy's pre-phase hook in order, then every
//! post-phase hook in reverse order. Strategies are registered into
//! [`Stage`]s; [`StagedStrategyChain::make_chain`] flattens them into a
//! [`StrategyChain`] in stage order, keeping insertion order within a stage.
//!
//! # Failure
//!
//! The first hook that returns an error ends the build. No further hooks
//! run, post-phase hooks included. The build's recovery stack is executed
//! newest first and the error is returned to the caller.

use std::fmt;
use std::sync::Arc;

use crate::context::BuildContext;
use crate::error::BuildError;

/// One step of a build.
///
/// Both hooks default to doing nothing.
pub trait BuilderStrategy: Send + Sync {
	fn name(&self) -> &str;

	fn pre_build_up(&self, _ctx: &mut BuildContext) -> Result<(), BuildError> {
		Ok(())
	}

	fn post_build_up(&self, _ctx: &mut BuildContext) -> Result<(), BuildError> {
		Ok(())
	}
}

pub type Strategy = Arc<dyn BuilderStrategy>;

/// Ordered phases of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
	Setup,
	TypeMapping,
	PreCreation,
	Creation,
	Initialization,
	PostInitialization,
}

const STAGE_COUNT: usize = 6;

impl Stage {
	pub const ALL: [Stage; STAGE_COUNT] = [
		Stage::Setup,
		Stage::TypeMapping,
		Stage::PreCreation,
		Stage::Creation,
		Stage::Initialization,
		Stage::PostInitialization,
	];

	fn index(self) -> usize {
		self as usize
	}
}

/// Strategies grouped by [`Stage`].
#[derive(Clone, Default)]
pub struct StagedStrategyChain {
	stages: [Vec<Strategy>; STAGE_COUNT],
}

impl StagedStrategyChain {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `strategy` to the end of `stage`.
	pub fn add(&mut self, stage: Stage, strategy: impl BuilderStrategy + 'static) -> &mut Self {
		self.add_shared(stage, Arc::new(strategy))
	}

	pub fn add_shared(&mut self, stage: Stage, strategy: Strategy) -> &mut Self {
		tracing::trace!(?stage, strategy = strategy.name(), "strategy added");
		self.stages[stage.index()].push(strategy);
		self
	}

	pub fn stage(&self, stage: Stage) -> &[Strategy] {
		&self.stages[stage.index()]
	}

	pub fn make_chain(&self) -> StrategyChain {
		StrategyChain::new(self.stages.iter().flatten().cloned())
	}
}

impl fmt::Debug for StagedStrategyChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut map = f.debug_map();
		for stage in Stage::ALL {
			let names: Vec<&str> = self.stage(stage).iter().map(|s| s.name()).collect();
			map.entry(&stage, &names);
		}
		map.finish()
	}
}

/// Flattened, immutable strategy sequence.
#[derive(Clone, Default)]
pub struct StrategyChain {
	strategies: Arc<[Strategy]>,
}

impl StrategyChain {
	pub fn new(strategies: impl IntoIterator<Item = Strategy>) -> Self {
		Self {
			strategies: strategies.into_iter().collect(),
		}
	}

	pub fn len(&self) -> usize {
		self.strategies.len()
	}

	pub fn is_empty(&self) -> bool {
		self.strategies.is_empty()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.strategies.iter().map(|s| s.name())
	}

	/// Runs the chain over `ctx`.
	///
	/// Pre-phase hooks run forward until one marks the build complete; the
	/// post-phase then runs backwards from that strategy.
	pub fn build_up(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
		match self.run(ctx) {
			Ok(()) => Ok(()),
			Err(err) => {
				let recovery = ctx.take_recovery();
				tracing::debug!(
					key = %ctx.original_key(),
					error = %err,
					recovery = recovery.len(),
					"build failed"
				);
				recovery.execute();
				Err(err)
			}
		}
	}

	fn run(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
		let mut ran = 0;
		for strategy in self.strategies.iter() {
			ran += 1;
			strategy.pre_build_up(ctx)?;
			if ctx.is_complete() {
				tracing::trace!(strategy = strategy.name(), "build completed early");
				break;
			}
		}

		for strategy in self.strategies[..ran].iter().rev() {
			strategy.post_build_up(ctx)?;
		}
		Ok(())
	}
}

impl fmt::Debug for StrategyChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.names()).finish()
	}
}
