//! The narrow contract through which the engine touches the host tree.
//!
//! The engine only ever mutates nodes it created itself, and never reads host state to make diff decisions.
//! The only reads it performs are [`Host::next_sibling`] (to locate the end of a reconciled span)
//! and [`Host::is_container`] (to validate mount targets).

use crate::Error;
use std::rc::Rc;

/// Native event callback as handed to [`Host::add_listener`].
///
/// Hosts pass [`None`] when a native invocation carries no usable event object.
pub type NativeCallback<E> = Rc<dyn Fn(Option<&E>)>;

/// A host tree adapter, e.g. over a browser document ([`DomHost`](`crate::dom::DomHost`))
/// or an in-memory arena ([`MemoryHost`](`crate::memory::MemoryHost`)).
pub trait Host: 'static {
	/// A cheap handle to one host node.
	type Node: Clone + PartialEq + core::fmt::Debug;
	/// The native event type delivered to event handlers.
	type Event: 'static;
	/// Whatever is needed to remove an installed listener again.
	type Listener;

	fn create_element(&self, tag: &str) -> Result<Self::Node, Error>;
	fn create_text(&self, text: &str) -> Self::Node;
	fn set_text(&self, node: &Self::Node, text: &str);

	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), Error>;
	fn remove_attribute(&self, node: &Self::Node, name: &str) -> Result<(), Error>;

	/// Inserts (or moves) `node` into `parent` before `reference`, or at the end if `reference` is [`None`].
	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>) -> Result<(), Error>;
	/// Detaches `node` from its parent.
	fn remove(&self, node: &Self::Node) -> Result<(), Error>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Whether views can be mounted into `node`.
	fn is_container(&self, node: &Self::Node) -> bool;

	fn class_add(&self, node: &Self::Node, token: &str) -> Result<(), Error>;
	fn class_remove(&self, node: &Self::Node, token: &str) -> Result<(), Error>;
	fn class_tokens(&self, node: &Self::Node) -> Vec<String>;

	fn add_listener(&self, node: &Self::Node, event: &str, callback: NativeCallback<Self::Event>) -> Result<Self::Listener, Error>;
	fn remove_listener(&self, node: &Self::Node, listener: Self::Listener);
}
