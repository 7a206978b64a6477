use crate::{backend::Backend, node::ElementNode};
use tracing::{instrument, trace};

/// Adopts an existing backing element as the "before" side of the first [`patch`](`crate::patch`).
///
/// Only the tag name is read. Attributes, listeners and children of `node` aren't recorded,
/// so they stay in place and new children are appended after any existing ones.
/// This is meant for empty mount points.
#[instrument(skip(backend))]
pub fn hydrate<B: Backend>(backend: &B, node: B::Node) -> ElementNode<B> {
	let name = backend.tag_name(&node);
	trace!("Adopted <{}>.", name);
	ElementNode::adopted(name, node)
}
