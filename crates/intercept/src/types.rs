//! Runtime type descriptors.
//!
//! The pipeline never builds values directly. It works with [`TypeInfo`]
//! descriptors: a name, a kind, the interfaces the type exposes and its
//! constructors. Descriptors are shared as [`Type`] handles and compared by
//! name.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Weak};

pub use weave_policy::TypeName;
use weave_policy::BuildKey;

use crate::component::{Instance, Value};
use crate::error::{BuildError, format_params};

/// Shared handle to a type descriptor.
pub type Type = Arc<TypeInfo>;

/// Ordered set of interface names.
pub type InterfaceSet = BTreeSet<TypeName>;

/// Builds an instance from positional argument values.
pub type ConstructFn = Arc<dyn Fn(Vec<Value>) -> Result<Instance, BuildError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
	Class,
	Interface,
}

/// One way of constructing a type.
#[derive(Clone)]
pub struct Constructor {
	owner: TypeName,
	params: Arc<[TypeName]>,
	factory: ConstructFn,
}

impl Constructor {
	pub fn new(owner: TypeName, params: impl IntoIterator<Item = TypeName>, factory: ConstructFn) -> Self {
		Self {
			owner,
			params: params.into_iter().collect(),
			factory,
		}
	}

	/// Type that declares this constructor.
	pub fn owner(&self) -> &TypeName {
		&self.owner
	}

	pub fn params(&self) -> &[TypeName] {
		&self.params
	}

	/// Whether this constructor takes exactly `params`, position by position.
	pub fn accepts(&self, params: &[TypeName]) -> bool {
		*self.params == *params
	}

	pub fn invoke(&self, args: Vec<Value>) -> Result<Instance, BuildError> {
		if args.len() != self.params.len() {
			return Err(BuildError::ArityMismatch {
				ty: self.owner.clone(),
				expected: self.params.len(),
				got: args.len(),
			});
		}
		(self.factory)(args)
	}
}

impl fmt::Debug for Constructor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}({})", self.owner, format_params(&self.params))
	}
}

/// Descriptor of a buildable type or an interface.
pub struct TypeInfo {
	name: TypeName,
	kind: TypeKind,
	sealed: bool,
	base: Option<TypeName>,
	interfaces: InterfaceSet,
	constructors: Vec<Constructor>,
}

impl TypeInfo {
	pub fn class(name: impl Into<TypeName>) -> TypeBuilder {
		TypeBuilder::new(name.into(), TypeKind::Class)
	}

	pub fn interface(name: impl Into<TypeName>) -> TypeBuilder {
		TypeBuilder::new(name.into(), TypeKind::Interface)
	}

	pub fn name(&self) -> &TypeName {
		&self.name
	}

	pub fn kind(&self) -> TypeKind {
		self.kind
	}

	pub fn is_interface(&self) -> bool {
		self.kind == TypeKind::Interface
	}

	pub fn is_sealed(&self) -> bool {
		self.sealed
	}

	/// Type this one derives from, if any.
	pub fn base(&self) -> Option<&TypeName> {
		self.base.as_ref()
	}

	pub fn interfaces(&self) -> &InterfaceSet {
		&self.interfaces
	}

	/// Whether a value of this type can stand in for `ty`.
	pub fn is_assignable_to(&self, ty: &TypeName) -> bool {
		self.name == *ty || self.base.as_ref() == Some(ty) || self.interfaces.contains(ty)
	}

	pub fn constructors(&self) -> &[Constructor] {
		&self.constructors
	}

	/// Finds the constructor taking exactly `params`.
	pub fn find_constructor(&self, params: &[TypeName]) -> Option<&Constructor> {
		self.constructors.iter().find(|ctor| ctor.accepts(params))
	}
}

impl PartialEq for TypeInfo {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name
	}
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TypeInfo")
			.field("name", &self.name)
			.field("kind", &self.kind)
			.field("interfaces", &self.interfaces)
			.field("constructors", &self.constructors)
			.finish()
	}
}

/// A type together with the optional registration name it is built under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedType {
	pub ty: Type,
	pub name: Option<Arc<str>>,
}

impl NamedType {
	pub fn new(ty: Type) -> Self {
		Self { ty, name: None }
	}

	pub fn named(ty: Type, name: Option<&str>) -> Self {
		Self {
			ty,
			name: name.filter(|n| !n.is_empty()).map(Arc::from),
		}
	}

	pub fn key(&self) -> BuildKey {
		BuildKey::named(self.ty.name().clone(), self.name.as_deref())
	}
}

/// Builder for [`TypeInfo`].
pub struct TypeBuilder {
	name: TypeName,
	kind: TypeKind,
	sealed: bool,
	base: Option<TypeName>,
	interfaces: InterfaceSet,
	constructors: Vec<Constructor>,
}

impl TypeBuilder {
	fn new(name: TypeName, kind: TypeKind) -> Self {
		Self {
			name,
			kind,
			sealed: false,
			base: None,
			interfaces: InterfaceSet::new(),
			constructors: Vec::new(),
		}
	}

	pub fn sealed(mut self) -> Self {
		self.sealed = true;
		self
	}

	pub fn base(mut self, base: impl Into<TypeName>) -> Self {
		self.base = Some(base.into());
		self
	}

	pub fn implements(mut self, iface: impl Into<TypeName>) -> Self {
		self.interfaces.insert(iface.into());
		self
	}

	pub fn interfaces<I>(mut self, ifaces: I) -> Self
	where
		I: IntoIterator<Item = TypeName>,
	{
		self.interfaces.extend(ifaces);
		self
	}

	/// Adds a constructor taking `params` in order.
	pub fn constructor<F>(mut self, params: &[&str], factory: F) -> Self
	where
		F: Fn(Vec<Value>) -> Result<Instance, BuildError> + Send + Sync + 'static,
	{
		let ctor = Constructor::new(
			self.name.clone(),
			params.iter().map(|p| TypeName::from(*p)),
			Arc::new(factory),
		);
		self.constructors.push(ctor);
		self
	}

	pub fn build(self) -> Type {
		Arc::new(self.finish(Vec::new()))
	}

	/// Builds a type whose constructors need a handle to the type itself.
	///
	/// `constructors` receives a weak handle that upgrades once the type is
	/// published; constructors it returns are appended to any added earlier.
	pub fn build_cyclic<F>(self, constructors: F) -> Type
	where
		F: FnOnce(&Weak<TypeInfo>, &TypeName) -> Vec<Constructor>,
	{
		Arc::new_cyclic(|weak| {
			let extra = constructors(weak, &self.name);
			self.finish(extra)
		})
	}

	fn finish(self, extra: Vec<Constructor>) -> TypeInfo {
		let mut constructors = self.constructors;
		constructors.extend(extra);
		TypeInfo {
			name: self.name,
			kind: self.kind,
			sealed: self.sealed,
			base: self.base,
			interfaces: self.interfaces,
			constructors,
		}
	}
}
