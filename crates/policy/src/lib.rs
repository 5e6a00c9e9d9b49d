//! Layered, key-based policy store.
//!
//! Policies are opaque configuration objects addressed by
//! `(type, optional name, kind)`. Stores are stacked into layers: a
//! container-scoped root shared by concurrent builds, with short-lived
//! build-scoped children on top.
//!
//! ```
//! use std::sync::Arc;
//! use weave_policy::{BuildKey, PolicyStore, policy_kind};
//!
//! policy_kind!(Greeting => String, "greeting");
//!
//! let container = Arc::new(PolicyStore::new("container"));
//! container.set::<Greeting>(&BuildKey::new("Greeter"), Arc::new("hello".to_string()));
//!
//! let build = container.child("build");
//! let named = BuildKey::named("Greeter", Some("formal"));
//! assert_eq!(build.probe::<Greeting>(&named).as_deref().map(String::as_str), Some("hello"));
//! ```

mod key;
mod store;

pub use key::{BuildKey, PolicyKey, PolicyKind, TypeName};
pub use store::PolicyStore;
