//! A [`Backend`] that keeps its node tree in memory.
//!
//! Every mutation is recorded, which makes it easy to assert on exactly what a patch did.
//! Listeners can be triggered with [`MemoryBackend::dispatch`].

use crate::{backend::Backend, node::Handler};
use core::fmt::{self, Debug, Formatter, Write as _};
use std::{collections::BTreeMap, rc::Rc};
use tracing::error;

/// Handle to a node in a [`MemoryBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// The event payload [`MemoryBackend::dispatch`] passes to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
	pub name: String,
	pub target: NodeId,
}

/// A single recorded change to a [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	CreateElement { node: NodeId, name: String, namespace: Option<String> },
	CreateText { node: NodeId, data: String },
	SetAttribute { node: NodeId, name: String, value: String },
	RemoveAttribute { node: NodeId, name: String },
	AddListener { node: NodeId, event: String },
	RemoveListener { node: NodeId, event: String },
	SetText { node: NodeId, data: String },
	Insert { parent: NodeId, child: NodeId, index: usize },
	Remove { parent: NodeId, child: NodeId },
	Replace { parent: NodeId, new: NodeId, old: NodeId },
}

struct Element {
	name: String,
	namespace: Option<String>,
	attributes: BTreeMap<String, String>,
	listeners: Vec<(String, Handler<MemoryEvent>)>,
	children: Vec<NodeId>,
}

enum Data {
	Element(Element),
	Text(String),
}

struct Slot {
	parent: Option<NodeId>,
	data: Data,
}

#[derive(Default)]
pub struct MemoryBackend {
	slots: Vec<Slot>,
	mutations: Vec<Mutation>,
}
impl MemoryBackend {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached element without recording it, standing in for pre-existing markup.
	pub fn create_root(&mut self, name: &str) -> NodeId {
		self.push(Data::Element(Element {
			name: name.to_owned(),
			namespace: None,
			attributes: BTreeMap::new(),
			listeners: Vec::new(),
			children: Vec::new(),
		}))
	}

	#[must_use]
	pub fn mutations(&self) -> &[Mutation] {
		&self.mutations
	}

	pub fn take_mutations(&mut self) -> Vec<Mutation> {
		std::mem::take(&mut self.mutations)
	}

	/// How many nodes were ever created, including roots.
	#[must_use]
	pub fn node_count(&self) -> usize {
		self.slots.len()
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		match self.element(node) {
			Some(element) => element.children.as_slice(),
			None => &[],
		}
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.slots.get(node.0).and_then(|slot| slot.parent)
	}

	#[must_use]
	pub fn name(&self, node: NodeId) -> Option<&str> {
		self.element(node).map(|element| element.name.as_str())
	}

	#[must_use]
	pub fn namespace(&self, node: NodeId) -> Option<&str> {
		self.element(node).and_then(|element| element.namespace.as_deref())
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		self.element(node).and_then(|element| element.attributes.get(name)).map(String::as_str)
	}

	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match self.slots.get(node.0).map(|slot| &slot.data) {
			Some(Data::Text(data)) => Some(data.as_str()),
			_ => None,
		}
	}

	#[must_use]
	pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
		self.element(node).map_or(0, |element| element.listeners.iter().filter(|(name, _)| name == event).count())
	}

	/// Calls each `event` listener on `target` once, in the order they were added. Returns how many were called.
	pub fn dispatch(&self, target: NodeId, event: &str) -> usize {
		let handlers: Vec<Handler<MemoryEvent>> = match self.element(target) {
			Some(element) => element.listeners.iter().filter(|(name, _)| name == event).map(|(_, handler)| Rc::clone(handler)).collect(),
			None => return 0,
		};
		let payload = MemoryEvent { name: event.to_owned(), target };
		for handler in &handlers {
			handler(&payload);
		}
		handlers.len()
	}

	/// Serializes the subtree at `node`, with attributes in name order.
	#[must_use]
	pub fn to_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	fn write_html(&self, node: NodeId, html: &mut String) {
		match self.slots.get(node.0).map(|slot| &slot.data) {
			Some(Data::Text(data)) => html.push_str(&escape(data, false)),
			Some(Data::Element(element)) => {
				html.push('<');
				html.push_str(&element.name);
				for (name, value) in &element.attributes {
					// Writing into a `String` can't fail.
					let _ = write!(html, " {}=\"{}\"", name, escape(value, true));
				}
				html.push('>');
				for &child in &element.children {
					self.write_html(child, html);
				}
				let _ = write!(html, "</{}>", element.name);
			}
			None => error!("Tried to serialize unknown node {:?}.", node),
		}
	}

	fn push(&mut self, data: Data) -> NodeId {
		self.slots.push(Slot { parent: None, data });
		NodeId(self.slots.len() - 1)
	}

	fn element(&self, node: NodeId) -> Option<&Element> {
		match self.slots.get(node.0).map(|slot| &slot.data) {
			Some(Data::Element(element)) => Some(element),
			_ => None,
		}
	}

	fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
		match self.slots.get_mut(node.0).map(|slot| &mut slot.data) {
			Some(Data::Element(element)) => Some(element),
			_ => {
				error!("Expected {:?} to be an element.", node);
				None
			}
		}
	}

	/// Unlinks `child` from its current parent, if any.
	fn detach(&mut self, child: NodeId) {
		if let Some(parent) = self.slots.get_mut(child.0).and_then(|slot| slot.parent.take()) {
			if let Some(element) = self.element_mut(parent) {
				element.children.retain(|&c| c != child);
			}
		}
	}
}
impl Debug for MemoryBackend {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryBackend")
			.field("slots.len()", &self.slots.len())
			.field("mutations.len()", &self.mutations.len())
			.finish()
	}
}

impl Backend for MemoryBackend {
	type Node = NodeId;
	type Event = MemoryEvent;

	fn create_element(&mut self, name: &str, namespace: Option<&str>) -> NodeId {
		let node = self.push(Data::Element(Element {
			name: name.to_owned(),
			namespace: namespace.map(str::to_owned),
			attributes: BTreeMap::new(),
			listeners: Vec::new(),
			children: Vec::new(),
		}));
		self.mutations.push(Mutation::CreateElement {
			node,
			name: name.to_owned(),
			namespace: namespace.map(str::to_owned),
		});
		node
	}

	fn create_text_node(&mut self, data: &str) -> NodeId {
		let node = self.push(Data::Text(data.to_owned()));
		self.mutations.push(Mutation::CreateText { node, data: data.to_owned() });
		node
	}

	fn tag_name(&self, element: &NodeId) -> String {
		self.name(*element).unwrap_or_default().to_owned()
	}

	fn set_attribute(&mut self, element: &NodeId, name: &str, value: &str) {
		if let Some(data) = self.element_mut(*element) {
			data.attributes.insert(name.to_owned(), value.to_owned());
			self.mutations.push(Mutation::SetAttribute {
				node: *element,
				name: name.to_owned(),
				value: value.to_owned(),
			});
		}
	}

	fn remove_attribute(&mut self, element: &NodeId, name: &str) {
		if let Some(data) = self.element_mut(*element) {
			data.attributes.remove(name);
			self.mutations.push(Mutation::RemoveAttribute { node: *element, name: name.to_owned() });
		}
	}

	fn add_event_listener(&mut self, element: &NodeId, event: &str, handler: &Handler<MemoryEvent>) {
		if let Some(data) = self.element_mut(*element) {
			// Like the DOM, adding an identical listener again does nothing.
			if data.listeners.iter().any(|(name, existing)| name == event && Rc::ptr_eq(existing, handler)) {
				return;
			}
			data.listeners.push((event.to_owned(), Rc::clone(handler)));
			self.mutations.push(Mutation::AddListener { node: *element, event: event.to_owned() });
		}
	}

	fn remove_event_listener(&mut self, element: &NodeId, event: &str, handler: &Handler<MemoryEvent>) {
		if let Some(data) = self.element_mut(*element) {
			let count = data.listeners.len();
			data.listeners.retain(|(name, existing)| !(name == event && Rc::ptr_eq(existing, handler)));
			if data.listeners.len() != count {
				self.mutations.push(Mutation::RemoveListener { node: *element, event: event.to_owned() });
			}
		}
	}

	fn set_text(&mut self, text: &NodeId, data: &str) {
		match self.slots.get_mut(text.0).map(|slot| &mut slot.data) {
			Some(Data::Text(current)) => {
				*current = data.to_owned();
				self.mutations.push(Mutation::SetText { node: *text, data: data.to_owned() });
			}
			_ => error!("Expected {:?} to be a text node.", text),
		}
	}

	fn child_count(&self, parent: &NodeId) -> usize {
		self.children(*parent).len()
	}

	fn child_at(&self, parent: &NodeId, index: usize) -> Option<NodeId> {
		self.children(*parent).get(index).copied()
	}

	fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
		self.parent(*node)
	}

	fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) {
		if self.element(*parent).is_none() || self.slots.get(child.0).is_none() {
			return error!("Can't insert {:?} into {:?}.", child, parent);
		}
		self.detach(*child);

		let index = match self.element_mut(*parent) {
			Some(element) => {
				let index = reference
					.and_then(|reference| element.children.iter().position(|c| c == reference))
					.unwrap_or_else(|| element.children.len());
				element.children.insert(index, *child);
				index
			}
			None => return,
		};
		self.slots[child.0].parent = Some(*parent);
		self.mutations.push(Mutation::Insert {
			parent: *parent,
			child: *child,
			index,
		});
	}

	fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
		if self.parent(*child) != Some(*parent) {
			return error!("{:?} is not a child of {:?}.", child, parent);
		}
		self.detach(*child);
		self.mutations.push(Mutation::Remove { parent: *parent, child: *child });
	}

	fn replace_child(&mut self, parent: &NodeId, new: &NodeId, old: &NodeId) {
		if self.parent(*old) != Some(*parent) || self.slots.get(new.0).is_none() {
			return error!("Can't replace {:?} with {:?} in {:?}.", old, new, parent);
		}
		self.detach(*new);

		if let Some(element) = self.element_mut(*parent) {
			if let Some(index) = element.children.iter().position(|c| c == old) {
				element.children[index] = *new;
			}
		}
		self.slots[old.0].parent = None;
		self.slots[new.0].parent = Some(*parent);
		self.mutations.push(Mutation::Replace {
			parent: *parent,
			new: *new,
			old: *old,
		});
	}
}

fn escape(text: &str, attribute: bool) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' if attribute => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	escaped
}

#[cfg(test)]
mod tests {
	use super::{MemoryBackend, Mutation};
	use crate::{node::handler, Backend};
	use std::{cell::Cell, rc::Rc};

	#[test]
	fn serializes_in_order() {
		let mut backend = MemoryBackend::new();
		let root = backend.create_root("div");
		let b = backend.create_element("b", None);
		let text = backend.create_text_node("1 < 2");
		backend.append_child(&root, &b);
		backend.insert_before(&root, &text, Some(&b));
		backend.set_attribute(&b, "title", "\"x\"");
		backend.set_attribute(&b, "class", "y");

		assert_eq!(backend.to_html(root), "<div>1 &lt; 2<b class=\"y\" title=\"&quot;x&quot;\"></b></div>");
		assert_eq!(backend.parent(text), Some(root));
	}

	#[test]
	fn inserting_moves_nodes() {
		let mut backend = MemoryBackend::new();
		let a = backend.create_root("a");
		let b = backend.create_root("b");
		let child = backend.create_text_node("x");
		backend.append_child(&a, &child);
		backend.append_child(&b, &child);

		assert!(backend.children(a).is_empty());
		assert_eq!(backend.children(b), &[child]);
		assert_eq!(backend.parent(child), Some(b));
	}

	#[test]
	fn identical_listeners_are_added_once() {
		let mut backend = MemoryBackend::new();
		let root = backend.create_root("button");
		let count = Rc::new(Cell::new(0));
		let clicked = {
			let count = Rc::clone(&count);
			handler(move |_| count.set(count.get() + 1))
		};

		backend.add_event_listener(&root, "click", &clicked);
		backend.add_event_listener(&root, "click", &clicked);
		assert_eq!(backend.listener_count(root, "click"), 1);
		assert_eq!(backend.dispatch(root, "click"), 1);
		assert_eq!(count.get(), 1);

		backend.remove_event_listener(&root, "click", &clicked);
		assert_eq!(backend.dispatch(root, "click"), 0);
		assert_eq!(
			backend.take_mutations(),
			vec![
				Mutation::AddListener { node: root, event: "click".to_owned() },
				Mutation::RemoveListener { node: root, event: "click".to_owned() },
			]
		);
	}
}
