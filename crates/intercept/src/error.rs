use thiserror::Error;
use weave_policy::{BuildKey, TypeName};

/// Errors raised while registering interception policies.
///
/// These fail fast, before any build touches the registration.
#[derive(Error, Debug)]
pub enum ConfigError {
	/// The interceptor reported it cannot intercept the target type.
	#[error("interceptor '{interceptor}' cannot intercept {ty}")]
	NotInterceptable { interceptor: String, ty: TypeName },
	/// An additional interface was given a type that is not an interface.
	#[error("{ty} is not an interface")]
	NotAnInterface { ty: TypeName },
	/// A behavior with an empty name was registered.
	#[error("behavior registered for {ty} has an empty name")]
	EmptyBehaviorName { ty: TypeName },
	/// An interceptor of one variant was given where the other is required.
	#[error("interceptor '{interceptor}' is not {expected} interceptor")]
	WrongVariant {
		interceptor: String,
		expected: &'static str,
	},
	/// Interception options could not be parsed.
	#[error("invalid interception options: {0}")]
	InvalidOptions(#[from] toml::de::Error),
}

/// Errors that abort a build.
#[derive(Error, Debug, Clone)]
pub enum BuildError {
	/// No constructor on the type has the requested parameter list.
	#[error("no constructor of {ty} matches ({params})")]
	NoMatchingConstructor { ty: TypeName, params: String },
	/// The substitute type cannot be built with the original constructor's arguments.
	#[error(
		"substitute {substitute} has no constructor compatible with {original}({params})"
	)]
	IncompatibleSubstitute {
		original: TypeName,
		substitute: TypeName,
		params: String,
	},
	/// A constructor was invoked with the wrong number of arguments.
	#[error("constructor of {ty} expects {expected} arguments, got {got}")]
	ArityMismatch {
		ty: TypeName,
		expected: usize,
		got: usize,
	},
	/// An argument provider failed.
	#[error("argument {index} for {ty}: {reason}")]
	Argument {
		ty: TypeName,
		index: usize,
		reason: String,
	},
	/// A constructor factory failed.
	#[error("constructing {ty} failed: {reason}")]
	Construction { ty: TypeName, reason: String },
	/// An interceptor was asked to handle a type it does not support.
	#[error("interceptor '{interceptor}' does not support {ty}")]
	InterceptionNotSupported { interceptor: String, ty: TypeName },
	/// An interceptor failed to produce a proxy type or wrapper.
	#[error("interceptor '{interceptor}' failed: {reason}")]
	Interceptor { interceptor: String, reason: String },
	/// The strategy chain finished without producing an instance.
	#[error("build of {key} produced no instance")]
	NothingBuilt { key: BuildKey },
}

/// Errors returned from invoking a member on a component.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
	#[error("{ty} has no method '{method}'")]
	UnknownMethod { ty: TypeName, method: String },
	#[error("invalid arguments for '{method}': {reason}")]
	InvalidArguments { method: String, reason: String },
	#[error("{0}")]
	Failed(String),
}

pub(crate) fn format_params(params: &[TypeName]) -> String {
	params
		.iter()
		.map(TypeName::as_str)
		.collect::<Vec<_>>()
		.join(", ")
}
