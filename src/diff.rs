use crate::{
	backend::Backend,
	cache::args_match,
	node::{AttrValue, Attributes, ElementNode, Events, VNode, NAMESPACE_ATTRIBUTE},
};
use std::rc::Rc;
use tracing::{instrument, trace, trace_span, warn};

/// Knobs for behaviour that differs between renderers.
///
/// The [`Default`] only ever adds and overwrites: It never removes an attribute or listener just because the next tree lacks it,
/// which is correct as long as each render specifies the complete attribute and handler set of every element it keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchConfig {
	/// Remove attributes that were present before but are absent now.
	pub remove_stale_attributes: bool,
	/// Detach handlers for events that were bound before but are absent now.
	pub remove_stale_listeners: bool,
	/// Treat `false` as "no attribute" instead of writing `"false"`.
	pub omit_false_attributes: bool,
}
impl PatchConfig {
	/// Everything on: The backing store mirrors the latest tree exactly.
	#[must_use]
	pub fn pruning() -> Self {
		Self {
			remove_stale_attributes: true,
			remove_stale_listeners: true,
			omit_false_attributes: true,
		}
	}
}

/// Applies the difference between two virtual trees to a [`Backend`].
///
/// # Correct Use
///
/// `before` must be the tree that was last patched (or [`hydrate`](`crate::hydrate`)d) onto the backing store, unchanged since.
/// `after` should be freshly built. Nodes in the same position must be of the same kind across renders
/// (text for text, element for element, cache for cache). Anything else is a bug in the renderer and panics.
///
/// Empty child slots are stripped before children are compared by index, so an element whose neighbours
/// switch between empty and non-empty may be patched against a sibling rather than its own previous version.
#[derive(Debug)]
pub struct Patcher<'a, B: Backend> {
	backend: &'a mut B,
	config: PatchConfig,
}
impl<'a, B: Backend> Patcher<'a, B> {
	#[must_use]
	pub fn new(backend: &'a mut B) -> Self {
		Self::with_config(backend, PatchConfig::default())
	}

	#[must_use]
	pub fn with_config(backend: &'a mut B, config: PatchConfig) -> Self {
		Self { backend, config }
	}

	/// Makes the backing store reflect `after`, reusing `before`'s backing nodes wherever possible.
	///
	/// Returns `true` iff `after`'s root is a new backing node, which the caller then has to put in place of `before`'s.
	///
	/// # Panics
	///
	/// Iff a child position holds a different kind of node than before.
	#[instrument(skip_all, fields(before = %before.name, after = %after.name))]
	pub fn patch(&mut self, before: &mut ElementNode<B>, after: &mut ElementNode<B>) -> bool {
		let replaced = self.patch_element(before, after);
		self.backend.finish();
		replaced
	}

	fn patch_element(&mut self, before: &mut ElementNode<B>, after: &mut ElementNode<B>) -> bool {
		let node = match before.node.as_ref() {
			Some(node) if before.name.eq_ignore_ascii_case(&after.name) => node.clone(),
			Some(_) => {
				let span = trace_span!("Replacing element", before = %before.name, after = %after.name);
				let _enter = span.enter();
				self.unbind_element(before);
				self.create_element(after);
				return true;
			}
			None => {
				let span = trace_span!("Creating unpatched element", tag = %after.name);
				let _enter = span.enter();
				self.create_element(after);
				return true;
			}
		};

		let span = trace_span!("Diffing element", tag = %after.name);
		let _enter = span.enter();

		after.realize(node.clone());
		self.update_attributes(&node, &before.attributes, &after.attributes);
		self.update_events(&node, &before.events, &after.events);
		self.update_children(&node, &mut before.children, &mut after.children);
		false
	}

	fn update_attributes(&mut self, element: &B::Node, before: &Attributes, after: &Attributes) {
		for (name, value) in after.iter() {
			if name == NAMESPACE_ATTRIBUTE || before.get(name).map_or(false, |previous| previous.same(value)) {
				continue;
			}

			#[cfg(feature = "dangerous-logging")]
			let span = trace_span!("Updating attribute", name, ?value);
			#[cfg(not(feature = "dangerous-logging"))]
			let span = trace_span!("Updating attribute", name);
			let _enter = span.enter();

			if self.config.omit_false_attributes && *value == AttrValue::Bool(false) {
				match before.get(name) {
					None | Some(AttrValue::Bool(false)) => (),
					Some(_) => self.backend.remove_attribute(element, name),
				}
			} else {
				self.backend.set_attribute(element, name, &value.to_string());
			}
		}

		if self.config.remove_stale_attributes {
			for (name, value) in before.iter() {
				let unwritten = self.config.omit_false_attributes && *value == AttrValue::Bool(false);
				if name != NAMESPACE_ATTRIBUTE && !unwritten && !after.contains(name) {
					trace!("Removing stale attribute {:?}.", name);
					self.backend.remove_attribute(element, name);
				}
			}
		}
	}

	fn update_events(&mut self, element: &B::Node, before: &Events<B::Event>, after: &Events<B::Event>) {
		for (event, handler) in after.iter() {
			match before.get(event) {
				Some(previous) if Rc::ptr_eq(previous, handler) => continue,
				Some(previous) => {
					trace!("Swapping {:?} handler.", event);
					self.backend.remove_event_listener(element, event, previous);
				}
				None => trace!("Binding {:?} handler.", event),
			}
			self.backend.add_event_listener(element, event, handler);
		}

		if self.config.remove_stale_listeners {
			for (event, previous) in before.iter() {
				if !after.contains(event) {
					trace!("Unbinding stale {:?} handler.", event);
					self.backend.remove_event_listener(element, event, previous);
				}
			}
		}
	}

	fn update_children(&mut self, parent: &B::Node, before: &mut Vec<Option<VNode<B>>>, after: &mut Vec<Option<VNode<B>>>) {
		let unstripped_len = before.len();
		before.retain(Option::is_some);
		after.retain(Option::is_some);

		let span = trace_span!("Diffing children", "before.len()" = before.len(), "after.len()" = after.len());
		let _enter = span.enter();

		for stale in before.iter().skip(after.len()).flatten() {
			self.unbind_child(stale);
		}
		for _ in after.len()..before.len() {
			let last = self.backend.child_count(parent).checked_sub(1).and_then(|last| self.backend.child_at(parent, last));
			match last {
				Some(last) => self.backend.remove_child(parent, &last),
				None => {
					warn!("Ran out of backing children while trimming. The backing store was changed outside of patching.");
					break;
				}
			}
		}

		for (i, next) in after.iter_mut().flatten().enumerate() {
			match before.get_mut(i).and_then(Option::as_mut) {
				Some(previous) => self.patch_child(parent, i, previous, next),
				None if i < unstripped_len => {
					trace!("Inserting new child at {}.", i);
					let node = self.create_child(next);
					let reference = self.backend.child_at(parent, i);
					self.backend.insert_before(parent, &node, reference.as_ref());
				}
				None => {
					trace!("Appending new child at {}.", i);
					let node = self.create_child(next);
					self.backend.append_child(parent, &node);
				}
			}
		}
	}

	fn patch_child(&mut self, parent: &B::Node, i: usize, previous: &mut VNode<B>, next: &mut VNode<B>) {
		let old = match previous.node() {
			Some(old) => old.clone(),
			None => {
				warn!("Previous {} at {} was never realized. Inserting a new node in its place.", previous.kind(), i);
				let node = self.create_child(next);
				let reference = self.backend.child_at(parent, i);
				return self.backend.insert_before(parent, &node, reference.as_ref());
			}
		};

		match (previous, next) {
			(VNode::Text(previous), VNode::Text(next)) => {
				#[cfg(feature = "dangerous-logging")]
				let span = trace_span!("Diffing text node", before = %previous.text, after = %next.text);
				#[cfg(not(feature = "dangerous-logging"))]
				let span = trace_span!("Diffing text node", "after.len()" = next.text.len());
				let _enter = span.enter();

				if previous.text != next.text {
					self.backend.set_text(&old, &next.text);
				}
				next.realize(old);
			}

			(VNode::Element(previous), VNode::Element(next)) => {
				if self.patch_element(previous, next) {
					if let Some(new) = next.node.as_ref() {
						self.backend.replace_child(parent, new, &old);
					}
				}
			}

			(VNode::Cache(previous), VNode::Cache(next)) => {
				let span = trace_span!("Diffing cache node", "args.len()" = next.args.len());
				let _enter = span.enter();

				if args_match(&previous.args, &next.args) {
					trace!("Arguments unchanged. Reusing the cached subtree.");
					next.cached = previous.cached.take();
				} else {
					trace!("Arguments changed. Rebuilding.");
					let previous = previous.evaluate();
					let next = next.evaluate();
					if self.patch_element(previous, next) {
						if let Some(new) = next.node.as_ref() {
							self.backend.replace_child(parent, new, &old);
						}
					}
				}
			}

			(previous, next) => panic!(
				"Can't patch {} onto {} at child {}: The renderer produced differently shaped trees for the same position.",
				next.kind(),
				previous.kind(),
				i,
			),
		}
	}

	/// Unbinds every handler in `element`'s subtree and frees what the backend no longer needs.
	///
	/// Call this before discarding a tree whose backing nodes are dropped outside of patching.
	pub(crate) fn release(&mut self, element: &ElementNode<B>) {
		self.unbind_element(element);
		self.backend.finish();
	}

	/// Detaches the handlers of a subtree that's leaving the backing store.
	fn unbind_element(&mut self, element: &ElementNode<B>) {
		if let Some(node) = element.node.as_ref() {
			for (event, handler) in element.events.iter() {
				trace!("Unbinding {:?} handler of removed <{}>.", event, element.name);
				self.backend.remove_event_listener(node, event, handler);
			}
		}
		for child in element.children.iter().flatten() {
			self.unbind_child(child);
		}
	}

	fn unbind_child(&mut self, child: &VNode<B>) {
		match child {
			VNode::Text(_) => (),
			VNode::Element(element) => self.unbind_element(element),
			VNode::Cache(cache) => {
				if let Some(element) = cache.cached() {
					self.unbind_element(element)
				}
			}
		}
	}

	/// Builds the backing subtree for `element` from scratch, realizing every node in it.
	fn create_element(&mut self, element: &mut ElementNode<B>) -> B::Node {
		let namespace = match element.attributes.get(NAMESPACE_ATTRIBUTE) {
			Some(AttrValue::Str(namespace)) => Some(namespace.as_str()),
			Some(other) => {
				warn!("Ignoring non-string namespace {:?} on <{}>.", other, element.name);
				None
			}
			None => None,
		};

		let span = trace_span!("Creating element", tag = %element.name, ?namespace);
		let _enter = span.enter();

		let node = self.backend.create_element(&element.name, namespace);

		for (name, value) in element.attributes.iter() {
			if name == NAMESPACE_ATTRIBUTE || (self.config.omit_false_attributes && *value == AttrValue::Bool(false)) {
				continue;
			}
			self.backend.set_attribute(&node, name, &value.to_string());
		}
		for (event, handler) in element.events.iter() {
			self.backend.add_event_listener(&node, event, handler);
		}
		for child in element.children.iter_mut().flatten() {
			let child = self.create_child(child);
			self.backend.append_child(&node, &child);
		}

		element.realize(node.clone());
		node
	}

	fn create_child(&mut self, child: &mut VNode<B>) -> B::Node {
		match child {
			VNode::Text(text) => {
				let node = self.backend.create_text_node(&text.text);
				text.realize(node.clone());
				node
			}
			VNode::Element(element) => self.create_element(element),
			VNode::Cache(cache) => {
				let span = trace_span!("Creating cache node", "args.len()" = cache.args.len());
				let _enter = span.enter();
				let element = cache.evaluate();
				self.create_element(element)
			}
		}
	}
}

/// [`Patcher::patch`] with the default [`PatchConfig`].
pub fn patch<B: Backend>(backend: &mut B, before: &mut ElementNode<B>, after: &mut ElementNode<B>) -> bool {
	Patcher::new(backend).patch(before, after)
}
