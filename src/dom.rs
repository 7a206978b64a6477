//! The browser [***DOM***](https://developer.mozilla.org/en-US/docs/Web/API/Document_Object_Model) as a [`Backend`].

use crate::{
	backend::Backend,
	builder::h,
	load::hydrate,
	node::{ElementNode, Handler},
	rc_hash_map::{CountSaturatedError, RcHashMap},
};
use core::{
	convert::TryFrom,
	fmt::{self, Debug, Formatter},
};
use js_sys::Function;
use std::rc::Rc;
use tracing::{error, info, instrument, trace, warn};
use wasm_bindgen::{closure::Closure, throw_str, JsCast, JsValue};
use web_sys::{Document, Element, Event, Node};

/// Identifies a [`Handler`] by address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct HandlerKey(*const ());
impl HandlerKey {
	fn of(handler: &Handler<Event>) -> Self {
		Self(Rc::as_ptr(handler).cast::<()>())
	}
}

/// The JS-side function for one [`Handler`]. Holding the handler keeps its address from being reused while it's bound.
struct Listener {
	_handler: Handler<Event>,
	closure: Closure<dyn Fn(Event)>,
}
impl Listener {
	fn new(handler: Handler<Event>) -> Self {
		let callback = Rc::clone(&handler);
		Self {
			_handler: handler,
			closure: Closure::wrap(Box::new(move |event: Event| callback(&event)) as Box<dyn Fn(Event)>),
		}
	}

	fn function(&self) -> &Function {
		self.closure.as_ref().unchecked_ref()
	}
}

/// Realizes virtual nodes as [***Node***](https://developer.mozilla.org/en-US/docs/Web/API/Node)s of a [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document).
///
/// Each distinct [`Handler`] gets a single JS function, reference-counted across all elements it's bound to.
/// Removed and replaced subtrees are unbound during the patch, and functions that are no longer bound anywhere are freed at its end.
///
/// # Safety
///
/// Listeners still attached to the DOM when this instance is dropped will throw into
/// [***JavaScript***](https://developer.mozilla.org/en-US/docs/Web/JavaScript) when their event fires.
pub struct DomBackend {
	document: Document,
	handler_handles: RcHashMap<HandlerKey, u16, Listener>,
}
impl DomBackend {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			handler_handles: RcHashMap::new(),
		}
	}

	/// Uses the current window's document, if there is one.
	#[must_use]
	pub fn from_window() -> Option<Self> {
		web_sys::window().and_then(|window| window.document()).map(Self::new)
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	/// [`hydrate`]s the element with the given ***id***.
	///
	/// If there's no such element, an unrealized `<div>` is returned instead, which the first patch will build from scratch.
	#[instrument(skip(self))]
	pub fn hydrate_by_id(&self, id: &str) -> ElementNode<Self> {
		match self.document.get_element_by_id(id) {
			Some(element) => hydrate(self, element.into()),
			None => {
				warn!("No element with id {:?} found. Falling back to a detached <div>.", id);
				h("div", ())
			}
		}
	}

	fn get_or_create_listener<'a>(handler_handles: &'a mut RcHashMap<HandlerKey, u16, Listener>, handler: &Handler<Event>) -> &'a Function {
		match handler_handles.increment_or_insert_with(HandlerKey::of(handler), |_| Listener::new(Rc::clone(handler))) {
			Ok(listener) => listener.function(),
			Err(CountSaturatedError) => throw_str("Too many (more than 65k) active bindings of the same event handler"),
		}
	}
}
impl Debug for DomBackend {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("DomBackend")
			.field("document", &self.document)
			.field("handler_handles.len()", &self.handler_handles.len())
			.finish()
	}
}

fn fail(message: &str, error: &JsValue) -> ! {
	if cfg!(debug_assertions) {
		panic!("{}: {:?}", message, error)
	} else {
		throw_str(message)
	}
}

fn as_element<'a>(node: &'a Node, operation: &str) -> Option<&'a Element> {
	let element = node.dyn_ref::<Element>();
	if element.is_none() {
		error!("Expected an element to {} but found {:?}.", operation, node);
	}
	element
}

impl Backend for DomBackend {
	type Node = Node;
	type Event = Event;

	fn create_element(&mut self, name: &str, namespace: Option<&str>) -> Node {
		let element = match namespace {
			Some(namespace) => self.document.create_element_ns(Some(namespace), name),
			None => self.document.create_element(name),
		};
		match element {
			Ok(element) => element.into(),
			Err(error) => fail(&format!("Failed to create <{}>", name), &error),
		}
	}

	fn create_text_node(&mut self, data: &str) -> Node {
		self.document.create_text_node(data).into()
	}

	fn tag_name(&self, element: &Node) -> String {
		element.dyn_ref::<Element>().map_or_else(|| element.node_name(), Element::tag_name)
	}

	fn set_attribute(&mut self, element: &Node, name: &str, value: &str) {
		if let Some(element) = as_element(element, "set an attribute on") {
			if let Err(error) = element.set_attribute(name, value) {
				error!("Could not set attribute {:?}: {:?}", name, error)
			}
		}
	}

	fn remove_attribute(&mut self, element: &Node, name: &str) {
		if let Some(element) = as_element(element, "remove an attribute from") {
			if let Err(error) = element.remove_attribute(name) {
				warn!("Could not remove attribute {:?}: {:?}", name, error)
			}
		}
	}

	#[instrument(skip(self, handler))]
	fn add_event_listener(&mut self, element: &Node, event: &str, handler: &Handler<Event>) {
		let function = Self::get_or_create_listener(&mut self.handler_handles, handler);
		if let Err(error) = element.add_event_listener_with_callback(event, function) {
			error!("Failed to add event listener {:?}: {:?}", event, error)
		}
	}

	#[instrument(skip(self, handler))]
	fn remove_event_listener(&mut self, element: &Node, event: &str, handler: &Handler<Event>) {
		let listener = match self.handler_handles.weak_decrement(&HandlerKey::of(handler)) {
			Ok(Some(listener)) => listener,
			Ok(None) => throw_str("Tried to unbind an event handler that was never bound"),
			Err(CountSaturatedError) => throw_str("Tried to unbind an event handler more often than it was bound"),
		};
		if let Err(error) = element.remove_event_listener_with_callback(event, listener.function()) {
			error!("Failed to remove event listener {:?}: {:?}", event, error)
		}
	}

	fn set_text(&mut self, text: &Node, data: &str) {
		text.set_node_value(Some(data))
	}

	fn child_count(&self, parent: &Node) -> usize {
		parent.child_nodes().length() as usize
	}

	fn child_at(&self, parent: &Node, index: usize) -> Option<Node> {
		u32::try_from(index).ok().and_then(|index| parent.child_nodes().get(index))
	}

	fn parent_node(&self, node: &Node) -> Option<Node> {
		node.parent_node()
	}

	fn insert_before(&mut self, parent: &Node, child: &Node, reference: Option<&Node>) {
		if let Err(error) = parent.insert_before(child, reference) {
			error!("Failed to insert node: {:?}", error)
		}
	}

	fn append_child(&mut self, parent: &Node, child: &Node) {
		if let Err(error) = parent.append_child(child) {
			error!("Failed to append node: {:?}", error)
		}
	}

	fn remove_child(&mut self, parent: &Node, child: &Node) {
		if let Err(error) = parent.remove_child(child) {
			error!("Failed to remove the node: {:?}", error)
		}
	}

	fn replace_child(&mut self, parent: &Node, new: &Node, old: &Node) {
		if let Err(error) = parent.replace_child(new, old) {
			error!("Failed to replace node: {:?}", error)
		}
	}

	fn finish(&mut self) {
		{
			let drain = self.handler_handles.drain_weak();
			trace!("Freed {} event listener(s).", drain.count());
		}
		info!("Event listener count/cached capacity: {}/{}", self.handler_handles.len(), self.handler_handles.capacity());
	}
}
