//! The virtual node model.
//!
//! Trees are built fresh for every render and are not edited afterwards, apart from their backing references,
//! which the reconciler fills in exactly once per node.

use crate::{backend::Backend, cache::Arg};
use core::fmt::{self, Debug, Display, Formatter};
use hashbrown::HashMap;
use std::rc::Rc;

/// An event handler. Handlers are compared by reference, so reuse the same [`Rc`] across renders to avoid rebinding.
pub type Handler<E> = Rc<dyn Fn(&E)>;

/// Wraps a closure into a [`Handler`].
pub fn handler<E>(f: impl Fn(&E) + 'static) -> Handler<E> {
	Rc::new(f)
}

/// Reserved attribute key that selects the namespace a new element is created in.
///
/// It's never written to the backing store as an actual attribute.
pub const NAMESPACE_ATTRIBUTE: &str = "ns";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// A primitive attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
	Str(String),
	Number(f64),
	Bool(bool),
}

/// Formats the value the way the browser stringifies it for `setAttribute`.
impl Display for AttrValue {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match *self {
			AttrValue::Str(ref s) => f.write_str(s),
			AttrValue::Bool(b) => Display::fmt(&b, f),
			AttrValue::Number(n) if n.is_nan() => f.write_str("NaN"),
			AttrValue::Number(n) if n.is_infinite() => f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" }),
			// Avoids "-0".
			AttrValue::Number(n) if n == 0.0 => f.write_str("0"),
			AttrValue::Number(n) => Display::fmt(&n, f),
		}
	}
}

impl AttrValue {
	/// Equality as far as the backing store can tell: `NaN` is the same as `NaN`, since both are written as `"NaN"`.
	pub(crate) fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(AttrValue::Number(a), AttrValue::Number(b)) if a.is_nan() => b.is_nan(),
			_ => self == other,
		}
	}
}

impl From<&str> for AttrValue {
	fn from(s: &str) -> Self {
		Self::Str(s.to_owned())
	}
}
impl From<String> for AttrValue {
	fn from(s: String) -> Self {
		Self::Str(s)
	}
}
impl From<f64> for AttrValue {
	fn from(n: f64) -> Self {
		Self::Number(n)
	}
}
impl From<i32> for AttrValue {
	fn from(n: i32) -> Self {
		Self::Number(n.into())
	}
}
impl From<u32> for AttrValue {
	fn from(n: u32) -> Self {
		Self::Number(n.into())
	}
}
impl From<bool> for AttrValue {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

/// Attribute name → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(HashMap<String, AttrValue>);
impl Attributes {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
		self.0.insert(name.into(), value.into())
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&AttrValue> {
		self.0.get(name)
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<K: Into<String>, V: Into<AttrValue>, const N: usize> From<[(K, V); N]> for Attributes {
	fn from(entries: [(K, V); N]) -> Self {
		IntoIterator::into_iter(entries).collect()
	}
}
impl<K: Into<String>, V: Into<AttrValue>> core::iter::FromIterator<(K, V)> for Attributes {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// Event name → handler.
pub struct Events<E>(HashMap<String, Handler<E>>);
impl<E> Events<E> {
	#[must_use]
	pub fn new() -> Self {
		Self(HashMap::new())
	}

	pub fn insert(&mut self, event: impl Into<String>, handler: Handler<E>) -> Option<Handler<E>> {
		self.0.insert(event.into(), handler)
	}

	#[must_use]
	pub fn get(&self, event: &str) -> Option<&Handler<E>> {
		self.0.get(event)
	}

	#[must_use]
	pub fn contains(&self, event: &str) -> bool {
		self.0.contains_key(event)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Handler<E>)> {
		self.0.iter().map(|(event, handler)| (event.as_str(), handler))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<E> Default for Events<E> {
	fn default() -> Self {
		Self::new()
	}
}
impl<E> Clone for Events<E> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}
impl<E> Debug for Events<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.0.keys()).finish()
	}
}
impl<K: Into<String>, E, const N: usize> From<[(K, Handler<E>); N]> for Events<E> {
	fn from(entries: [(K, Handler<E>); N]) -> Self {
		Self(IntoIterator::into_iter(entries).map(|(k, h)| (k.into(), h)).collect())
	}
}

/// A virtual node.
pub enum VNode<B: Backend> {
	Text(TextNode<B>),
	Cache(CacheNode<B>),
	Element(ElementNode<B>),
}
impl<B: Backend> VNode<B> {
	/// The backing node, looking through one level of [`CacheNode`].
	#[must_use]
	pub fn node(&self) -> Option<&B::Node> {
		match self {
			VNode::Text(text) => text.node(),
			VNode::Cache(cache) => cache.cached().and_then(ElementNode::node),
			VNode::Element(element) => element.node(),
		}
	}

	pub(crate) fn kind(&self) -> &'static str {
		match self {
			VNode::Text(_) => "text node",
			VNode::Cache(_) => "cache node",
			VNode::Element(_) => "element",
		}
	}
}
impl<B: Backend> Clone for VNode<B> {
	fn clone(&self) -> Self {
		match self {
			VNode::Text(text) => VNode::Text(text.clone()),
			VNode::Cache(cache) => VNode::Cache(cache.clone()),
			VNode::Element(element) => VNode::Element(element.clone()),
		}
	}
}
impl<B: Backend> Debug for VNode<B> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			VNode::Text(text) => Debug::fmt(text, f),
			VNode::Cache(cache) => Debug::fmt(cache, f),
			VNode::Element(element) => Debug::fmt(element, f),
		}
	}
}
impl<B: Backend> From<TextNode<B>> for VNode<B> {
	fn from(text: TextNode<B>) -> Self {
		Self::Text(text)
	}
}
impl<B: Backend> From<CacheNode<B>> for VNode<B> {
	fn from(cache: CacheNode<B>) -> Self {
		Self::Cache(cache)
	}
}
impl<B: Backend> From<ElementNode<B>> for VNode<B> {
	fn from(element: ElementNode<B>) -> Self {
		Self::Element(element)
	}
}

fn realize<N: PartialEq + Debug>(slot: &mut Option<N>, node: N) {
	debug_assert!(
		slot.as_ref().map_or(true, |current| *current == node),
		"Virtual node was already realized as {:?}, can't realize it as {:?}.",
		slot,
		node,
	);
	*slot = Some(node);
}

pub struct TextNode<B: Backend> {
	pub(crate) text: String,
	pub(crate) node: Option<B::Node>,
}
impl<B: Backend> TextNode<B> {
	#[must_use]
	pub fn new(text: impl Into<String>) -> Self {
		Self { text: text.into(), node: None }
	}

	#[must_use]
	pub fn text(&self) -> &str {
		&self.text
	}

	#[must_use]
	pub fn node(&self) -> Option<&B::Node> {
		self.node.as_ref()
	}

	pub(crate) fn realize(&mut self, node: B::Node) {
		realize(&mut self.node, node)
	}
}
impl<B: Backend> Clone for TextNode<B> {
	fn clone(&self) -> Self {
		Self {
			text: self.text.clone(),
			node: self.node.clone(),
		}
	}
}
impl<B: Backend> Debug for TextNode<B> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("TextNode").field("text", &self.text).field("node", &self.node).finish()
	}
}

/// A memoized subtree. See [`cache`](`crate::cache()`).
pub struct CacheNode<B: Backend> {
	pub(crate) args: Vec<Arg>,
	pub(crate) build: Rc<dyn Fn(&[Arg]) -> ElementNode<B>>,
	pub(crate) cached: Option<Box<ElementNode<B>>>,
}
impl<B: Backend> CacheNode<B> {
	#[must_use]
	pub fn args(&self) -> &[Arg] {
		&self.args
	}

	/// The subtree from the last evaluation, if there was one.
	#[must_use]
	pub fn cached(&self) -> Option<&ElementNode<B>> {
		self.cached.as_deref()
	}

	/// Runs the build function unless a result is already cached.
	pub(crate) fn evaluate(&mut self) -> &mut ElementNode<B> {
		let Self { args, build, cached } = self;
		cached.get_or_insert_with(|| {
			tracing::trace!("Evaluating cache node with {} argument(s).", args.len());
			Box::new(build(args.as_slice()))
		})
	}
}
impl<B: Backend> Clone for CacheNode<B> {
	fn clone(&self) -> Self {
		Self {
			args: self.args.clone(),
			build: Rc::clone(&self.build),
			cached: self.cached.clone(),
		}
	}
}
impl<B: Backend> Debug for CacheNode<B> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("CacheNode").field("args", &self.args).field("cached", &self.cached).finish_non_exhaustive()
	}
}

pub struct ElementNode<B: Backend> {
	pub(crate) name: String,
	pub(crate) attributes: Attributes,
	pub(crate) events: Events<B::Event>,
	pub(crate) children: Vec<Option<VNode<B>>>,
	pub(crate) node: Option<B::Node>,
}
impl<B: Backend> ElementNode<B> {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			attributes: Attributes::new(),
			events: Events::new(),
			children: Vec::new(),
			node: None,
		}
	}

	/// An element that already stands for `node`, with nothing else recorded about it.
	pub(crate) fn adopted(name: String, node: B::Node) -> Self {
		Self {
			node: Some(node),
			..Self::new(name)
		}
	}

	#[must_use]
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.attributes.insert(name, value);
		self
	}

	#[must_use]
	pub fn on(mut self, event: impl Into<String>, handler: Handler<B::Event>) -> Self {
		self.events.insert(event, handler);
		self
	}

	/// Appends a child. [`None`] appends an empty slot.
	#[must_use]
	pub fn child(mut self, child: impl Into<crate::Child<B>>) -> Self {
		self.children.push(child.into().into_vnode());
		self
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn attributes(&self) -> &Attributes {
		&self.attributes
	}

	#[must_use]
	pub fn events(&self) -> &Events<B::Event> {
		&self.events
	}

	#[must_use]
	pub fn children(&self) -> &[Option<VNode<B>>] {
		&self.children
	}

	#[must_use]
	pub fn node(&self) -> Option<&B::Node> {
		self.node.as_ref()
	}

	#[must_use]
	pub fn is_realized(&self) -> bool {
		self.node.is_some()
	}

	pub(crate) fn realize(&mut self, node: B::Node) {
		realize(&mut self.node, node)
	}
}
impl<B: Backend> Clone for ElementNode<B> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			attributes: self.attributes.clone(),
			events: self.events.clone(),
			children: self.children.clone(),
			node: self.node.clone(),
		}
	}
}
impl<B: Backend> Debug for ElementNode<B> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ElementNode")
			.field("name", &self.name)
			.field("attributes", &self.attributes)
			.field("events", &self.events)
			.field("children", &self.children)
			.field("node", &self.node)
			.finish()
	}
}
