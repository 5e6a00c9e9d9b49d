use std::sync::Arc;

use pretty_assertions::assert_eq;
use weave_intercept::{
	Builder, ConfigError, Interception, InterceptionOptions, Interceptor, NamedType,
	SubclassInterceptor, WrapperInterceptor, is_intercepted,
};

use crate::common::*;

#[test]
fn disabled_type_substitution_builds_plain_values() {
	let container = container();
	let ty = calculator();
	Interception::new(&container)
		.set_interceptor_for(&ty, None, Interceptor::of_type(SubclassInterceptor::new()))
		.unwrap()
		.add_behavior(&ty, None, Counting::new("audit").behavior())
		.unwrap();

	let options = InterceptionOptions::from_toml("type_substitution = false").unwrap();
	let builder = Builder::with_interception(Arc::clone(&container), options);

	assert_eq!(builder.chain().names().collect::<Vec<_>>(), [
		"instance-wrapping",
		"build-key-mapping",
		"construction",
	]);
	let instance = builder.build(NamedType::new(ty)).unwrap();
	assert!(!is_intercepted(&instance));
}

#[test]
fn default_chain_orders_strategies_by_stage() {
	let builder = Builder::with_interception(container(), InterceptionOptions::default());
	assert_eq!(builder.chain().names().collect::<Vec<_>>(), [
		"instance-wrapping",
		"build-key-mapping",
		"type-substitution",
		"construction",
	]);
}

#[test]
fn registration_errors_surface_before_any_build() {
	let container = container();
	let options = InterceptionOptions::from_toml(
		r#"
		type_substitution = true
		instance_wrapping = true
		validate_registrations = true
		"#,
	)
	.unwrap();
	let reg = Interception::with_options(&container, options);

	let err = reg
		.set_interceptor_for(
			&calculator(),
			None,
			Interceptor::of_instance(WrapperInterceptor::new()),
		)
		.err()
		.unwrap();
	assert_eq!(
		err.to_string(),
		"interceptor 'wrapper' cannot intercept Calculator"
	);

	let err = reg
		.add_interface(&calculator(), None, &sealed_calculator())
		.err()
		.unwrap();
	assert!(matches!(err, ConfigError::NotAnInterface { .. }));
	assert!(container.is_empty());
}
