//! Keys used to address policies.
//!
//! A policy is addressed by a [`PolicyKey`]: the target type, an optional
//! name and the policy kind. A missing or empty name selects the default
//! namespace, which never collides with named entries of the same type and
//! kind.

use std::any::TypeId;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Cheaply clonable name of a buildable type or interface.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
	pub fn new(name: impl Into<Arc<str>>) -> Self {
		Self(name.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for TypeName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.0, f)
	}
}

impl fmt::Display for TypeName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for TypeName {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl From<String> for TypeName {
	fn from(name: String) -> Self {
		Self::new(name)
	}
}

impl Borrow<str> for TypeName {
	fn borrow(&self) -> &str {
		&self.0
	}
}

/// Identifies what a build operation constructs: a type plus an optional name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BuildKey {
	ty: TypeName,
	name: Option<Arc<str>>,
}

impl BuildKey {
	/// Key in the default namespace of `ty`.
	pub fn new(ty: impl Into<TypeName>) -> Self {
		Self {
			ty: ty.into(),
			name: None,
		}
	}

	/// Key for a named registration. Empty names fold into the default namespace.
	pub fn named(ty: impl Into<TypeName>, name: Option<&str>) -> Self {
		Self {
			ty: ty.into(),
			name: normalize_name(name),
		}
	}

	pub fn ty(&self) -> &TypeName {
		&self.ty
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn is_default(&self) -> bool {
		self.name.is_none()
	}

	/// The same type in the default namespace.
	pub fn to_default(&self) -> Self {
		Self {
			ty: self.ty.clone(),
			name: None,
		}
	}
}

impl fmt::Debug for BuildKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "BuildKey({self})")
	}
}

impl fmt::Display for BuildKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.name {
			Some(name) => write!(f, "{}[{}]", self.ty, name),
			None => write!(f, "{}", self.ty),
		}
	}
}

fn normalize_name(name: Option<&str>) -> Option<Arc<str>> {
	name.filter(|n| !n.is_empty()).map(Arc::from)
}

/// Marker describing one kind of policy and the value type stored under it.
///
/// Kinds are zero-sized types; their [`TypeId`] is part of every
/// [`PolicyKey`]. The stored value may be unsized, so trait-object policies
/// are addressed as `Arc<dyn Trait>`.
pub trait PolicyKind: 'static {
	type Policy: ?Sized + Send + Sync + 'static;

	/// Short label used in traces.
	const NAME: &'static str;
}

/// Declares a [`PolicyKind`] marker type.
///
/// ```ignore
/// policy_kind! {
///     /// Maps a build key to another one.
///     pub BuildKeyMapping => BuildKeyMappingPolicy, "build-key-mapping"
/// }
/// ```
#[macro_export]
macro_rules! policy_kind {
	($(#[$meta:meta])* $vis:vis $kind:ident => $policy:ty, $label:literal) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
		$vis struct $kind;

		impl $crate::PolicyKind for $kind {
			type Policy = $policy;
			const NAME: &'static str = $label;
		}
	};
}

/// Fully qualified address of a policy: (type, name, kind).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PolicyKey {
	ty: TypeName,
	name: Option<Arc<str>>,
	kind: TypeId,
	kind_name: &'static str,
}

impl PolicyKey {
	pub fn of<K: PolicyKind>(key: &BuildKey) -> Self {
		Self {
			ty: key.ty.clone(),
			name: key.name.clone(),
			kind: TypeId::of::<K>(),
			kind_name: K::NAME,
		}
	}

	pub fn ty(&self) -> &TypeName {
		&self.ty
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn kind(&self) -> TypeId {
		self.kind
	}

	pub fn kind_name(&self) -> &'static str {
		self.kind_name
	}
}

impl fmt::Debug for PolicyKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.name {
			Some(name) => write!(f, "{}({}[{}])", self.kind_name, self.ty, name),
			None => write!(f, "{}({})", self.kind_name, self.ty),
		}
	}
}
