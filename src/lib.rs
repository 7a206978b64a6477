#![doc(html_root_url = "https://docs.rs/pipe-vdom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A small virtual DOM with a memoizing reconciler.
//!
//! Build a tree with [`h`], [`svg`] and [`cache()`] on every render, then [`patch`] it onto the tree from the previous render.
//! The backing store is anything implementing [`Backend`]: [`dom::DomBackend`] in the browser,
//! or [`memory::MemoryBackend`] for tests and headless use.
//!
//! [`Mount`] bundles a backend with the retained tree for the common render loop.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod backend;
mod builder;
mod cache;
mod diff;
pub mod dom;
mod load;
pub mod memory;
mod mount;
mod node;
mod rc_hash_map;

pub use crate::{
	backend::Backend,
	builder::{h, svg, Child, ElementArgs},
	cache::{cache, Arg},
	diff::{patch, PatchConfig, Patcher},
	load::hydrate,
	mount::Mount,
	node::{handler, AttrValue, Attributes, CacheNode, ElementNode, Events, Handler, TextNode, VNode, NAMESPACE_ATTRIBUTE, SVG_NAMESPACE},
};
