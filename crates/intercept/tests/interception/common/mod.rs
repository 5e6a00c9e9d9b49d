use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use serde_json::json;
use weave_intercept::{
	Behavior, BuildError, Component, Constructor, Instance, InterceptionBehavior, InvocationError,
	MethodCall, MethodResult, Next, Type, TypeBuilder, TypeInfo, TypeName, Value,
};
use weave_policy::PolicyStore;

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn container() -> Arc<PolicyStore> {
	Arc::new(PolicyStore::new("container"))
}

/// Adds two numbers plus a fixed offset.
pub struct Calculator {
	ty: Type,
	offset: i64,
}

impl Component for Calculator {
	fn type_info(&self) -> &Type {
		&self.ty
	}

	fn invoke(&self, call: &MethodCall) -> MethodResult {
		match call.method() {
			"add" => {
				let [a, b] = call.args.as_slice() else {
					return Err(InvocationError::InvalidArguments {
						method: "add".to_string(),
						reason: format!("expected 2 arguments, got {}", call.args.len()),
					});
				};
				let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) else {
					return Err(InvocationError::InvalidArguments {
						method: "add".to_string(),
						reason: "arguments must be integers".to_string(),
					});
				};
				Ok(json!(a + b + self.offset))
			}
			"offset" => Ok(json!(self.offset)),
			other => Err(InvocationError::UnknownMethod {
				ty: self.ty.name().clone(),
				method: other.to_string(),
			}),
		}
	}
}

fn calculator_type(builder: TypeBuilder) -> Type {
	builder.build_cyclic(|weak, name| {
		vec![
			calculator_constructor(weak, name, &[]),
			calculator_constructor(weak, name, &["i64"]),
		]
	})
}

/// Constructor taking either nothing or the offset.
fn calculator_constructor(weak: &Weak<TypeInfo>, name: &TypeName, params: &[&str]) -> Constructor {
	let weak = weak.clone();
	let owner = name.clone();
	Constructor::new(
		name.clone(),
		params.iter().map(|p| TypeName::from(*p)),
		Arc::new(move |args: Vec<Value>| -> Result<Instance, BuildError> {
			let ty = weak.upgrade().ok_or_else(|| BuildError::Construction {
				ty: owner.clone(),
				reason: "type dropped".to_string(),
			})?;
			let offset = match args.first() {
				None => 0,
				Some(arg) => arg.as_i64().ok_or_else(|| BuildError::Argument {
					ty: owner.clone(),
					index: 0,
					reason: "offset must be an integer".to_string(),
				})?,
			};
			let instance: Instance = Arc::new(Calculator { ty, offset });
			Ok(instance)
		}),
	)
}

/// `Calculator`: an open class implementing `ICalculator`.
pub fn calculator() -> Type {
	calculator_type(TypeInfo::class("Calculator").implements("ICalculator"))
}

/// `SealedCalculator`: same members, but sealed.
pub fn sealed_calculator() -> Type {
	calculator_type(
		TypeInfo::class("SealedCalculator")
			.implements("ICalculator")
			.sealed(),
	)
}

pub fn icalculator() -> Type {
	TypeInfo::interface("ICalculator").build()
}

pub fn add(a: i64, b: i64) -> MethodCall {
	MethodCall::new("add", vec![json!(a), json!(b)])
}

/// Behavior that counts the calls passing through it.
pub struct Counting {
	name: &'static str,
	active: bool,
	calls: AtomicUsize,
}

impl Counting {
	pub fn new(name: &'static str) -> Arc<Self> {
		Arc::new(Self {
			name,
			active: true,
			calls: AtomicUsize::new(0),
		})
	}

	pub fn inactive(name: &'static str) -> Arc<Self> {
		Arc::new(Self {
			name,
			active: false,
			calls: AtomicUsize::new(0),
		})
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn behavior(self: &Arc<Self>) -> Behavior {
		Arc::clone(self) as Behavior
	}
}

impl InterceptionBehavior for Counting {
	fn name(&self) -> &str {
		self.name
	}

	fn will_execute(&self) -> bool {
		self.active
	}

	fn invoke(&self, call: &MethodCall, next: Next<'_>) -> MethodResult {
		self.calls.fetch_add(1, Ordering::SeqCst);
		next.run(call)
	}
}

pub fn behavior_names(behaviors: &[Behavior]) -> Vec<String> {
	behaviors.iter().map(|b| b.name().to_string()).collect()
}
