use std::sync::Arc;

use serde_json::json;
use weave_policy::PolicyStore;

use crate::component::{Component, Instance, MethodCall, MethodResult, Value};
use crate::context::BuildContext;
use crate::error::{BuildError, InvocationError};
use crate::types::{Constructor, NamedType, Type, TypeBuilder, TypeName};

/// Value that remembers its constructor arguments.
///
/// `args` returns them, `kind` returns the type name, `echo` returns its
/// first call argument.
pub struct Plain {
	ty: Type,
	args: Vec<Value>,
}

impl Component for Plain {
	fn type_info(&self) -> &Type {
		&self.ty
	}

	fn invoke(&self, call: &MethodCall) -> MethodResult {
		match call.method() {
			"args" => Ok(Value::Array(self.args.clone())),
			"kind" => Ok(json!(self.ty.name().as_str())),
			"echo" => Ok(call.args.first().cloned().unwrap_or(Value::Null)),
			other => Err(InvocationError::UnknownMethod {
				ty: self.ty.name().clone(),
				method: other.to_string(),
			}),
		}
	}
}

/// Finishes `builder` with one [`Plain`]-producing constructor per entry of `ctors`.
pub fn plain(builder: TypeBuilder, ctors: &[&[&str]]) -> Type {
	let ctors: Vec<Vec<TypeName>> = ctors
		.iter()
		.map(|params| params.iter().map(|p| TypeName::from(*p)).collect())
		.collect();
	builder.build_cyclic(move |weak, name| {
		ctors
			.into_iter()
			.map(|params| {
				let weak = weak.clone();
				let owner = name.clone();
				Constructor::new(
					name.clone(),
					params,
					Arc::new(move |args: Vec<Value>| -> Result<Instance, BuildError> {
						let ty = weak.upgrade().ok_or_else(|| BuildError::Construction {
							ty: owner.clone(),
							reason: "type dropped".to_string(),
						})?;
						let instance: Instance = Arc::new(Plain { ty, args });
						Ok(instance)
					}),
				)
			})
			.collect()
	})
}

pub fn context_for(container: &Arc<PolicyStore>, ty: &Type) -> BuildContext {
	BuildContext::new(Arc::clone(container), NamedType::new(Arc::clone(ty)), None)
}

pub fn container() -> Arc<PolicyStore> {
	Arc::new(PolicyStore::new("container"))
}
