//! Memoized subtrees.

use crate::{
	backend::Backend,
	node::{CacheNode, ElementNode},
};
use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;

/// A tracked argument of a [`CacheNode`].
///
/// Primitives compare by value, [`Arg::Ref`] compares by pointer only. There is no deep equality:
/// Pass the same [`Rc`] again to hit the cache.
#[derive(Clone)]
pub enum Arg {
	Null,
	Bool(bool),
	Number(f64),
	Str(Rc<str>),
	Ref(Rc<dyn Any>),
}
impl Arg {
	pub fn by_ref<T: Any>(value: Rc<T>) -> Self {
		Self::Ref(value)
	}

	/// Whether two arguments are interchangeable for caching purposes.
	///
	/// Like `===`, `NaN` is never the same as itself.
	#[must_use]
	pub fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(Arg::Null, Arg::Null) => true,
			(Arg::Bool(a), Arg::Bool(b)) => a == b,
			#[allow(clippy::float_cmp)]
			(Arg::Number(a), Arg::Number(b)) => a == b,
			(Arg::Str(a), Arg::Str(b)) => a == b,
			(Arg::Ref(a), Arg::Ref(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}

	#[must_use]
	pub fn as_bool(&self) -> Option<bool> {
		match *self {
			Arg::Bool(b) => Some(b),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_f64(&self) -> Option<f64> {
		match *self {
			Arg::Number(n) => Some(n),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Arg::Str(s) => Some(&**s),
			_ => None,
		}
	}

	#[must_use]
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		match self {
			Arg::Ref(value) => value.downcast_ref(),
			_ => None,
		}
	}
}
impl Debug for Arg {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Arg::Null => f.write_str("Null"),
			Arg::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
			Arg::Number(n) => f.debug_tuple("Number").field(n).finish(),
			Arg::Str(s) => f.debug_tuple("Str").field(s).finish(),
			Arg::Ref(value) => f.debug_tuple("Ref").field(&Rc::as_ptr(value)).finish(),
		}
	}
}

impl From<bool> for Arg {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}
impl From<f64> for Arg {
	fn from(n: f64) -> Self {
		Self::Number(n)
	}
}
impl From<i32> for Arg {
	fn from(n: i32) -> Self {
		Self::Number(n.into())
	}
}
impl From<u32> for Arg {
	fn from(n: u32) -> Self {
		Self::Number(n.into())
	}
}
impl From<&str> for Arg {
	fn from(s: &str) -> Self {
		Self::Str(s.into())
	}
}
impl From<String> for Arg {
	fn from(s: String) -> Self {
		Self::Str(s.into())
	}
}
impl From<Rc<str>> for Arg {
	fn from(s: Rc<str>) -> Self {
		Self::Str(s)
	}
}
impl<T: Into<Arg>> From<Option<T>> for Arg {
	fn from(value: Option<T>) -> Self {
		value.map_or(Arg::Null, Into::into)
	}
}

pub(crate) fn args_match(previous: &[Arg], next: &[Arg]) -> bool {
	previous.len() == next.len() && previous.iter().zip(next).all(|(previous, next)| previous.same(next))
}

/// Wraps `build` so that it's only run again once `args` change.
///
/// Nothing is evaluated here. The reconciler calls `build` when the node is first realized,
/// and afterwards only if an argument differs from the previous render's argument at the same position.
///
/// `build` should be a pure function of its arguments.
pub fn cache<B: Backend>(args: Vec<Arg>, build: impl Fn(&[Arg]) -> ElementNode<B> + 'static) -> CacheNode<B> {
	CacheNode {
		args,
		build: Rc::new(build),
		cached: None,
	}
}

/// Collects [`Arg`]s for [`cache()`].
#[macro_export]
macro_rules! args {
	($($arg:expr),*$(,)?) => {
		vec![$($crate::Arg::from($arg)),*]
	};
}
