//! Declarative construction of element trees.

use crate::{
	backend::Backend,
	node::{Attributes, CacheNode, ElementNode, Events, TextNode, VNode, NAMESPACE_ATTRIBUTE, SVG_NAMESPACE},
};

/// Anything that can sit in a child slot. Strings become text nodes, and [`Child::Empty`] is a placeholder that renders nothing.
pub enum Child<B: Backend> {
	Empty,
	Text(String),
	Node(VNode<B>),
}
impl<B: Backend> Child<B> {
	pub(crate) fn into_vnode(self) -> Option<VNode<B>> {
		match self {
			Child::Empty => None,
			Child::Text(text) => Some(VNode::Text(TextNode::new(text))),
			Child::Node(node) => Some(node),
		}
	}
}
impl<B: Backend> From<&str> for Child<B> {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}
impl<B: Backend> From<String> for Child<B> {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}
impl<B: Backend> From<ElementNode<B>> for Child<B> {
	fn from(element: ElementNode<B>) -> Self {
		Self::Node(VNode::Element(element))
	}
}
impl<B: Backend> From<CacheNode<B>> for Child<B> {
	fn from(cache: CacheNode<B>) -> Self {
		Self::Node(VNode::Cache(cache))
	}
}
impl<B: Backend> From<VNode<B>> for Child<B> {
	fn from(node: VNode<B>) -> Self {
		Self::Node(node)
	}
}
impl<B: Backend, T: Into<Child<B>>> From<Option<T>> for Child<B> {
	fn from(child: Option<T>) -> Self {
		child.map_or(Child::Empty, Into::into)
	}
}

/// The call shapes accepted by [`h`] and [`svg`]:
///
/// - `()`
/// - children
/// - [`Attributes`]
/// - ([`Attributes`], children)
/// - ([`Attributes`], [`Events`])
/// - ([`Attributes`], [`Events`], children)
///
/// where children are a `Vec<Child<B>>`, most conveniently built with [`children!`](`crate::children!`).
pub trait ElementArgs<B: Backend> {
	fn into_parts(self) -> (Attributes, Events<B::Event>, Vec<Child<B>>);
}
impl<B: Backend> ElementArgs<B> for () {
	fn into_parts(self) -> (Attributes, Events<B::Event>, Vec<Child<B>>) {
		(Attributes::new(), Events::new(), Vec::new())
	}
}
impl<B: Backend> ElementArgs<B> for Vec<Child<B>> {
	fn into_parts(self) -> (Attributes, Events<B::Event>, Vec<Child<B>>) {
		(Attributes::new(), Events::new(), self)
	}
}
impl<B: Backend> ElementArgs<B> for Attributes {
	fn into_parts(self) -> (Attributes, Events<B::Event>, Vec<Child<B>>) {
		(self, Events::new(), Vec::new())
	}
}
impl<B: Backend> ElementArgs<B> for (Attributes, Vec<Child<B>>) {
	fn into_parts(self) -> (Attributes, Events<B::Event>, Vec<Child<B>>) {
		(self.0, Events::new(), self.1)
	}
}
impl<B: Backend> ElementArgs<B> for (Attributes, Events<B::Event>) {
	fn into_parts(self) -> (Attributes, Events<B::Event>, Vec<Child<B>>) {
		(self.0, self.1, Vec::new())
	}
}
impl<B: Backend> ElementArgs<B> for (Attributes, Events<B::Event>, Vec<Child<B>>) {
	fn into_parts(self) -> (Attributes, Events<B::Event>, Vec<Child<B>>) {
		self
	}
}

/// Creates an unrealized element.
pub fn h<B: Backend>(name: impl Into<String>, args: impl ElementArgs<B>) -> ElementNode<B> {
	let (attributes, events, children) = args.into_parts();
	ElementNode {
		attributes,
		events,
		children: children.into_iter().map(Child::into_vnode).collect(),
		..ElementNode::new(name)
	}
}

/// Like [`h`], but the element is created in the SVG namespace.
pub fn svg<B: Backend>(name: impl Into<String>, args: impl ElementArgs<B>) -> ElementNode<B> {
	let mut element = h(name, args);
	element.attributes.insert(NAMESPACE_ATTRIBUTE, SVG_NAMESPACE);
	element
}

/// Collects [`Child`]ren for [`h`] and [`svg`].
#[macro_export]
macro_rules! children {
	($($child:expr),*$(,)?) => {
		vec![$($crate::Child::from($child)),*]
	};
}

/// Builds [`Attributes`](`crate::Attributes`) from `name => value` pairs with mixed value types.
#[macro_export]
macro_rules! attributes {
	($($name:expr => $value:expr),*$(,)?) => {{
		#[allow(unused_mut)]
		let mut attributes = $crate::Attributes::new();
		$(attributes.insert($name, $value);)*
		attributes
	}};
}

/// Builds [`Events`](`crate::Events`) from `event => handler` pairs.
#[macro_export]
macro_rules! events {
	($($event:expr => $handler:expr),*$(,)?) => {{
		#[allow(unused_mut)]
		let mut events = $crate::Events::new();
		$(events.insert($event, $handler);)*
		events
	}};
}
