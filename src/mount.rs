use crate::{
	backend::Backend,
	diff::{PatchConfig, Patcher},
	load::hydrate,
	node::ElementNode,
};
use tracing::{instrument, trace, warn};

/// Owns a backing store together with the tree last patched onto it.
///
/// This is the render loop's side of [`patch`](`crate::patch`): Hand it a freshly built tree on every state change
/// and it takes care of retaining the previous one and of splicing in a replaced root.
pub struct Mount<B: Backend> {
	backend: B,
	config: PatchConfig,
	view: ElementNode<B>,
}
impl<B: Backend> Mount<B> {
	/// Mounts onto an existing element. See [`hydrate`].
	pub fn hydrate(backend: B, node: B::Node) -> Self {
		let view = hydrate(&backend, node);
		Self {
			backend,
			config: PatchConfig::default(),
			view,
		}
	}

	#[must_use]
	pub fn with_config(self, config: PatchConfig) -> Self {
		Self { config, ..self }
	}

	/// Patches `next` onto the current view and retains it.
	///
	/// Returns whether the root element was replaced, in which case the new root has already been put in the old one's place.
	///
	/// # Panics
	///
	/// If `next` doesn't match the shape of the current view. Call [`Mount::remount`] to recover.
	#[instrument(skip_all, fields(tag = %next.name))]
	pub fn update(&mut self, mut next: ElementNode<B>) -> bool {
		let replaced = Patcher::with_config(&mut self.backend, self.config).patch(&mut self.view, &mut next);
		if replaced {
			match (self.view.node(), next.node()) {
				(Some(old), Some(new)) => match self.backend.parent_node(old) {
					Some(parent) => self.backend.replace_child(&parent, new, old),
					None => warn!("The replaced root element has no parent. The new root stays detached."),
				},
				_ => warn!("The root element was replaced, but there's nothing to splice."),
			}
		}
		self.view = next;
		replaced
	}

	/// Clears the root element and starts over as if freshly hydrated.
	///
	/// Handlers bound through the current view are unbound first, including those on the root itself.
	///
	/// This is the way back to a known state after a patch panicked midway.
	#[instrument(skip_all)]
	pub fn remount(&mut self) {
		let root = match self.view.node() {
			Some(root) => root.clone(),
			None => return warn!("Nothing to remount: The view was never realized."),
		};
		Patcher::with_config(&mut self.backend, self.config).release(&self.view);
		let count = self.backend.child_count(&root);
		trace!("Removing {} backing child node(s).", count);
		for index in (0..count).rev() {
			if let Some(child) = self.backend.child_at(&root, index) {
				self.backend.remove_child(&root, &child);
			}
		}
		self.view = hydrate(&self.backend, root);
	}

	#[must_use]
	pub fn view(&self) -> &ElementNode<B> {
		&self.view
	}

	#[must_use]
	pub fn root(&self) -> Option<&B::Node> {
		self.view.node()
	}

	#[must_use]
	pub fn config(&self) -> PatchConfig {
		self.config
	}

	#[must_use]
	pub fn backend(&self) -> &B {
		&self.backend
	}

	pub fn backend_mut(&mut self) -> &mut B {
		&mut self.backend
	}
}
