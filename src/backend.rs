use crate::node::Handler;
use core::fmt::Debug;

/// A live node tree that virtual nodes are realized onto.
///
/// The reconciler only ever talks to the backing store through this trait, and always through an explicit `&mut` handle,
/// so a single [`patch`](`crate::patch`) call has exclusive access for its whole duration.
///
/// Implementations are expected to behave like the [***DOM***](https://developer.mozilla.org/en-US/docs/Web/API/Document_Object_Model):
/// inserting a node that already has a parent moves it, and adding the same listener twice for the same event is a no-op.
/// Failures of individual operations should be logged rather than propagated.
pub trait Backend {
	/// A cheap, cloneable handle to a live node. Equality is node identity.
	type Node: Clone + PartialEq + Debug;
	/// The event payload passed to [`Handler`]s.
	type Event;

	/// Creates a detached element, in `namespace` if one is given.
	fn create_element(&mut self, name: &str, namespace: Option<&str>) -> Self::Node;
	/// Creates a detached text node.
	fn create_text_node(&mut self, data: &str) -> Self::Node;

	/// Reads the tag name of an existing element.
	fn tag_name(&self, element: &Self::Node) -> String;

	fn set_attribute(&mut self, element: &Self::Node, name: &str, value: &str);
	fn remove_attribute(&mut self, element: &Self::Node, name: &str);

	fn add_event_listener(&mut self, element: &Self::Node, event: &str, handler: &Handler<Self::Event>);
	fn remove_event_listener(&mut self, element: &Self::Node, event: &str, handler: &Handler<Self::Event>);

	/// Overwrites the character data of a text node.
	fn set_text(&mut self, text: &Self::Node, data: &str);

	fn child_count(&self, parent: &Self::Node) -> usize;
	fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node>;
	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Inserts `child` before `reference`, or at the end if `reference` is [`None`].
	fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>);
	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) {
		self.insert_before(parent, child, None)
	}
	fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);
	/// Puts `new` where `old` currently is, detaching `old`.
	fn replace_child(&mut self, parent: &Self::Node, new: &Self::Node, old: &Self::Node);

	/// Called once at the end of each top-level patch.
	fn finish(&mut self) {}
}
