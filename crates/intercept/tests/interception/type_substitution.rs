use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use serde_json::json;
use weave_intercept::policies::ConstructorSelection;
use weave_intercept::{
	BuildError, Builder, Interception, InterceptionOptions, Interceptor, InterfaceSet, NamedType,
	SpecifiedConstructor, SubclassInterceptor, Type, TypeInterceptor, TypeInfo, is_intercepted,
	literal,
};
use weave_policy::{BuildKey, PolicyStore};

use crate::common::*;

fn intercepting(container: &Arc<PolicyStore>) -> Builder {
	Builder::with_interception(Arc::clone(container), InterceptionOptions::default())
}

fn subclass() -> Interceptor {
	Interceptor::of_type(SubclassInterceptor::new())
}

#[test]
fn behavior_runs_once_around_every_call() {
	init_tracing();
	let container = container();
	let ty = calculator();
	let audit = Counting::new("audit");
	Interception::new(&container)
		.set_interceptor_for(&ty, None, subclass())
		.unwrap()
		.add_behavior(&ty, None, audit.behavior())
		.unwrap();

	let instance = intercepting(&container).build(NamedType::new(ty)).unwrap();
	assert!(is_intercepted(&instance));
	assert!(instance.type_info().is_assignable_to(&"Calculator".into()));

	assert_eq!(instance.invoke(&add(2, 3)), Ok(json!(5)));
	assert_eq!(audit.calls(), 1);
	assert_eq!(instance.invoke(&add(1, 1)), Ok(json!(2)));
	assert_eq!(audit.calls(), 2);
}

#[test]
fn unconfigured_type_builds_like_a_plain_pipeline() {
	let container = container();
	let ty = calculator();

	let plain = Builder::plain(Arc::clone(&container))
		.build(NamedType::new(Arc::clone(&ty)))
		.unwrap();
	let intercepted = intercepting(&container).build(NamedType::new(ty)).unwrap();

	assert!(!is_intercepted(&intercepted));
	assert_eq!(intercepted.type_info().name(), plain.type_info().name());
	assert_eq!(intercepted.invoke(&add(4, 5)), plain.invoke(&add(4, 5)));
	assert!(container.is_empty());
}

#[test]
fn existing_instance_is_left_alone() {
	let container = container();
	let ty = calculator();
	Interception::new(&container)
		.set_interceptor_for(&ty, None, subclass())
		.unwrap()
		.add_behavior(&ty, None, Counting::new("audit").behavior())
		.unwrap();
	let existing = Builder::plain(Arc::clone(&container))
		.build(NamedType::new(Arc::clone(&ty)))
		.unwrap();

	let result = intercepting(&container)
		.build_up(NamedType::new(ty), Some(Arc::clone(&existing)))
		.unwrap();

	assert!(Arc::ptr_eq(&result, &existing));
	assert!(!is_intercepted(&result));
}

#[test]
fn uninterceptable_type_is_built_as_is() {
	let container = container();
	let ty = sealed_calculator();
	let options = InterceptionOptions {
		validate_registrations: false,
		..InterceptionOptions::default()
	};
	Interception::with_options(&container, options)
		.set_interceptor_for(&ty, None, subclass())
		.unwrap()
		.add_behavior(&ty, None, Counting::new("audit").behavior())
		.unwrap();

	let instance = intercepting(&container).build(NamedType::new(ty)).unwrap();

	assert!(!is_intercepted(&instance));
	assert_eq!(instance.type_info().name().as_str(), "SealedCalculator");
	let key = BuildKey::new("SealedCalculator");
	assert!(container.get::<ConstructorSelection>(&key).is_none());
}

#[test]
fn only_active_behaviors_are_attached_in_order() {
	let container = container();
	let ty = calculator();
	let behaviors = [
		Counting::new("first"),
		Counting::inactive("skipped"),
		Counting::new("second"),
		Counting::inactive("also-skipped"),
	];
	let reg = Interception::new(&container);
	reg.set_interceptor_for(&ty, None, subclass()).unwrap();
	for behavior in &behaviors {
		reg.add_behavior(&ty, None, behavior.behavior()).unwrap();
	}

	let instance = intercepting(&container).build(NamedType::new(ty)).unwrap();
	let proxy = instance.as_intercepting_proxy().unwrap();
	assert_eq!(behavior_names(&proxy.behaviors()), ["first", "second"]);

	instance.invoke(&add(0, 0)).unwrap();
	let calls: Vec<usize> = behaviors.iter().map(|b| b.calls()).collect();
	assert_eq!(calls, [1, 0, 1, 0]);
}

#[test]
fn rebuilding_keeps_a_single_remapper() {
	let container = container();
	let ty = calculator();
	let reg = Interception::new(&container);
	reg.set_interceptor_for(&ty, None, subclass())
		.unwrap()
		.select_constructor(&ty, None, SpecifiedConstructor::new(&["i64"], vec![literal(10)]));

	let builder = intercepting(&container);
	for _ in 0..3 {
		let instance = builder.build(NamedType::new(Arc::clone(&ty))).unwrap();
		assert!(is_intercepted(&instance));
		assert_eq!(instance.invoke(&add(1, 2)), Ok(json!(13)));
	}

	let selector = container
		.get::<ConstructorSelection>(&BuildKey::new("Calculator"))
		.unwrap();
	let remap = selector.as_substitute().unwrap();
	assert!(remap.original().as_substitute().is_none());
	assert_eq!(remap.substitute().name().as_str(), "CalculatorProxy");
}

#[test]
fn clearing_interception_restores_plain_builds() {
	let container = container();
	let ty = calculator();
	let reg = Interception::new(&container);
	reg.set_interceptor_for(&ty, None, subclass())
		.unwrap()
		.add_behavior(&ty, None, Counting::new("audit").behavior())
		.unwrap()
		.select_constructor(&ty, None, SpecifiedConstructor::new(&["i64"], vec![literal(10)]));

	let builder = intercepting(&container);
	let proxied = builder.build(NamedType::new(Arc::clone(&ty))).unwrap();
	assert_eq!(proxied.type_info().name().as_str(), "CalculatorProxy");

	reg.clear(&ty, None);

	let rebuilt = builder.build(NamedType::new(Arc::clone(&ty))).unwrap();
	assert!(!is_intercepted(&rebuilt));
	assert_eq!(rebuilt.type_info().name().as_str(), "Calculator");
	assert_eq!(rebuilt.invoke(&add(1, 2)), Ok(json!(13)));

	let plain = Builder::plain(Arc::clone(&container))
		.build(NamedType::new(ty))
		.unwrap();
	assert_eq!(plain.type_info().name().as_str(), "Calculator");

	let selector = container
		.get::<ConstructorSelection>(&BuildKey::new("Calculator"))
		.unwrap();
	assert!(selector.as_substitute().is_none());
}

#[test]
fn named_registration_overrides_type_default() {
	let container = container();
	let ty = calculator();
	let fallback = Counting::new("fallback");
	let special = Counting::new("special");
	let reg = Interception::new(&container);
	reg.set_default_interceptor_for(&ty, subclass())
		.unwrap()
		.add_behavior(&ty, None, fallback.behavior())
		.unwrap()
		.add_behavior(&ty, Some("special"), special.behavior())
		.unwrap();

	let builder = intercepting(&container);
	let named = builder
		.build(NamedType::named(Arc::clone(&ty), Some("special")))
		.unwrap();
	let other = builder
		.build(NamedType::named(ty, Some("other")))
		.unwrap();

	let names = |i: &weave_intercept::Instance| {
		behavior_names(&i.as_intercepting_proxy().unwrap().behaviors())
	};
	assert_eq!(names(&named), ["special"]);
	assert_eq!(names(&other), ["fallback"]);
}

/// Produces a proxy type whose only constructor cannot take the original's arguments.
struct Mismatched;

impl TypeInterceptor for Mismatched {
	fn name(&self) -> &str {
		"mismatched"
	}

	fn can_intercept(&self, ty: &TypeInfo) -> bool {
		!ty.is_interface()
	}

	fn create_proxy_type(&self, ty: &Type, _interfaces: &InterfaceSet) -> Result<Type, BuildError> {
		Ok(TypeInfo::class(format!("{}Mismatch", ty.name()))
			.base(ty.name().clone())
			.constructor(&["String", "String"], |_| {
				Err(BuildError::Construction {
					ty: "Mismatch".into(),
					reason: "never called".to_string(),
				})
			})
			.build())
	}
}

#[test]
fn incompatible_substitute_fails_the_build() {
	let container = container();
	let ty = calculator();
	Interception::new(&container)
		.set_interceptor_for(&ty, None, Interceptor::of_type(Mismatched))
		.unwrap();

	let err = intercepting(&container)
		.build(NamedType::new(ty))
		.err()
		.unwrap();
	match err {
		BuildError::IncompatibleSubstitute {
			original,
			substitute,
			params,
		} => {
			assert_eq!(original.as_str(), "Calculator");
			assert_eq!(substitute.as_str(), "CalculatorMismatch");
			assert_eq!(params, "");
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn concurrent_builds_share_one_remapper() {
	let container = container();
	let ty = calculator();
	Interception::new(&container)
		.set_interceptor_for(&ty, None, subclass())
		.unwrap()
		.select_constructor(&ty, None, SpecifiedConstructor::new(&["i64"], vec![literal(1)]));
	let builder = intercepting(&container);

	let handles: Vec<_> = (0..8)
		.map(|_| {
			let builder = builder.clone();
			let ty = Arc::clone(&ty);
			thread::spawn(move || {
				(0..16)
					.map(|_| {
						let instance = builder.build(NamedType::new(Arc::clone(&ty))).unwrap();
						instance.invoke(&add(1, 1)).unwrap()
					})
					.collect::<Vec<_>>()
			})
		})
		.collect();
	for handle in handles {
		assert!(handle.join().unwrap().iter().all(|v| *v == json!(3)));
	}

	let selector = container
		.get::<ConstructorSelection>(&BuildKey::new("Calculator"))
		.unwrap();
	assert!(selector.as_substitute().unwrap().original().as_substitute().is_none());
}
