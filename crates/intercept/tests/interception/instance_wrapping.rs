use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use weave_intercept::{
	BuildError, Builder, FnBehavior, Interception, InterceptionOptions, Interceptor, NamedType,
	SubclassInterceptor, WrapperInterceptor, is_intercepted,
};
use weave_policy::PolicyStore;

use crate::common::*;

fn wrapper() -> Interceptor {
	Interceptor::of_instance(WrapperInterceptor::new())
}

/// Registers `ICalculator -> Calculator` and wraps `ICalculator` builds.
fn wrapped_interface(container: &Arc<PolicyStore>) -> Interception<'_> {
	let reg = Interception::new(container);
	reg.map_type(&icalculator(), None, NamedType::new(calculator()))
		.set_interceptor_for(&icalculator(), None, wrapper())
		.unwrap();
	reg
}

fn builder(container: &Arc<PolicyStore>) -> Builder {
	Builder::with_interception(Arc::clone(container), InterceptionOptions::default())
}

#[test]
fn mapped_interface_is_wrapped() {
	init_tracing();
	let container = container();
	let audit = Counting::new("audit");
	wrapped_interface(&container)
		.add_behavior(&icalculator(), None, audit.behavior())
		.unwrap();

	let instance = builder(&container).build(NamedType::new(icalculator())).unwrap();

	assert_eq!(instance.type_info().name().as_str(), "ICalculatorWrapper");
	let proxy = instance.as_intercepting_proxy().unwrap();
	assert_eq!(proxy.target().type_info().name().as_str(), "Calculator");
	assert_eq!(instance.invoke(&add(20, 22)), Ok(json!(42)));
	assert_eq!(audit.calls(), 1);
}

#[test]
fn instance_policy_without_behaviors_leaves_value_unchanged() {
	let container = container();
	wrapped_interface(&container);

	let instance = builder(&container).build(NamedType::new(icalculator())).unwrap();

	assert!(!is_intercepted(&instance));
	assert_eq!(instance.type_info().name().as_str(), "Calculator");
}

#[test]
fn wrapped_value_is_not_wrapped_again() {
	let container = container();
	wrapped_interface(&container)
		.add_behavior(&icalculator(), None, Counting::new("audit").behavior())
		.unwrap();
	let builder = builder(&container);
	let first = builder.build(NamedType::new(icalculator())).unwrap();

	let second = builder
		.build_up(NamedType::new(icalculator()), Some(Arc::clone(&first)))
		.unwrap();

	assert!(Arc::ptr_eq(&first, &second));
	let proxy = second.as_intercepting_proxy().unwrap();
	assert!(!is_intercepted(proxy.target()));
	assert_eq!(proxy.behaviors().len(), 1);
}

#[test]
fn pre_built_value_can_be_wrapped() {
	let container = container();
	wrapped_interface(&container)
		.add_behavior(&icalculator(), None, Counting::new("audit").behavior())
		.unwrap();
	let plain = Builder::plain(Arc::clone(&container))
		.build(NamedType::new(calculator()))
		.unwrap();

	let wrapped = builder(&container)
		.build_up(NamedType::new(icalculator()), Some(Arc::clone(&plain)))
		.unwrap();

	let proxy = wrapped.as_intercepting_proxy().unwrap();
	assert!(Arc::ptr_eq(proxy.target(), &plain));
}

#[test]
fn type_and_instance_interception_do_not_stack() {
	let container = container();
	let audit = Counting::new("audit");
	let reg = Interception::new(&container);
	reg.map_type(&icalculator(), None, NamedType::new(calculator()))
		.set_interceptor_for(&icalculator(), None, wrapper())
		.unwrap()
		.add_behavior(&icalculator(), None, audit.behavior())
		.unwrap()
		.set_interceptor_for(&calculator(), None, Interceptor::of_type(SubclassInterceptor::new()))
		.unwrap()
		.add_behavior(&calculator(), None, audit.behavior())
		.unwrap();

	let instance = builder(&container).build(NamedType::new(icalculator())).unwrap();

	assert_eq!(instance.type_info().name().as_str(), "CalculatorProxy");
	instance.invoke(&add(1, 1)).unwrap();
	assert_eq!(audit.calls(), 1);
}

#[test]
fn behavior_can_short_circuit_the_target() {
	let container = container();
	wrapped_interface(&container)
		.add_behavior(
			&icalculator(),
			None,
			FnBehavior::new("cache", |call, next| {
				if call.method() == "offset" {
					return Ok(json!(-1));
				}
				next.run(call)
			})
			.into_behavior(),
		)
		.unwrap();

	let instance = builder(&container).build(NamedType::new(icalculator())).unwrap();

	assert_eq!(
		instance.invoke(&weave_intercept::MethodCall::new("offset", vec![])),
		Ok(json!(-1))
	);
	assert_eq!(instance.invoke(&add(1, 2)), Ok(json!(3)));
}

#[test]
fn wrapping_an_unsupported_type_is_an_error() {
	let container = container();
	let options = InterceptionOptions {
		validate_registrations: false,
		..InterceptionOptions::default()
	};
	Interception::with_options(&container, options)
		.set_interceptor_for(&calculator(), None, wrapper())
		.unwrap()
		.add_behavior(&calculator(), None, Counting::new("audit").behavior())
		.unwrap();

	let err = builder(&container)
		.build(NamedType::new(calculator()))
		.err()
		.unwrap();
	assert!(matches!(err, BuildError::InterceptionNotSupported { .. }));
}
