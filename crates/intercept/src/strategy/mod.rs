//! Built-in build strategies.
//!
//! | Strategy | Stage | Phase |
//! |----------|-------|-------|
//! | [`InstanceWrappingStrategy`] | `Setup` | post |
//! | [`BuildKeyMappingStrategy`] | `TypeMapping` | pre |
//! | [`TypeSubstitutionStrategy`] | `PreCreation` | pre and post |
//! | [`ConstructionStrategy`] | `Creation` | pre |
//!
//! Instance wrapping sits in the first stage so its post-phase hook runs
//! last, after every other strategy has finished with the value.

mod construction;
mod instance_wrapping;
mod mapping;
mod type_substitution;

pub use construction::ConstructionStrategy;
pub use instance_wrapping::InstanceWrappingStrategy;
pub use mapping::BuildKeyMappingStrategy;
pub use type_substitution::TypeSubstitutionStrategy;
