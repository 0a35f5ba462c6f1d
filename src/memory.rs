//! A headless host tree kept in memory.
//!
//! Besides implementing [`Host`], [`MemoryHost`] records every mutation it receives,
//! which makes it possible to observe *how* the engine changed the tree, not only the result.

use crate::{
	host::{Host, NativeCallback},
	Error,
};
use core::fmt::{self, Debug, Formatter, Write as _};
use std::{cell::RefCell, rc::Rc};
use tracing::trace;

/// Handle to a node inside a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Handle to an installed listener.
#[derive(Debug, PartialEq, Eq)]
pub struct ListenerId(usize);

/// The event type delivered by [`MemoryHost::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
	pub name: String,
}

/// One recorded host mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	CreateElement(NodeId),
	CreateText(NodeId),
	SetText(NodeId),
	SetAttribute(NodeId, String),
	RemoveAttribute(NodeId, String),
	Insert { parent: NodeId, node: NodeId },
	Remove(NodeId),
	ClassAdd(NodeId, String),
	ClassRemove(NodeId, String),
	AddListener(NodeId, String),
	RemoveListener(NodeId, String),
}

impl Mutation {
	#[must_use]
	pub fn node(&self) -> NodeId {
		match *self {
			Self::CreateElement(node)
			| Self::CreateText(node)
			| Self::SetText(node)
			| Self::SetAttribute(node, _)
			| Self::RemoveAttribute(node, _)
			| Self::Insert { node, .. }
			| Self::Remove(node)
			| Self::ClassAdd(node, _)
			| Self::ClassRemove(node, _)
			| Self::AddListener(node, _)
			| Self::RemoveListener(node, _) => node,
		}
	}
}

enum NodeKind {
	Element {
		tag: String,
		attributes: Vec<(String, String)>,
		classes: Vec<String>,
	},
	Text(String),
}

struct NodeData {
	kind: NodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

struct Listener {
	node: NodeId,
	event: String,
	callback: NativeCallback<MemoryEvent>,
}

#[derive(Default)]
struct Arena {
	nodes: Vec<NodeData>,
	listeners: Vec<Option<Listener>>,
	mutations: Vec<Mutation>,
}

impl Arena {
	fn node(&self, id: NodeId) -> Result<&NodeData, Error> {
		self.nodes.get(id.0).ok_or_else(|| Error::host("lookup", format!("unknown node {:?}", id)))
	}

	fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, Error> {
		self.nodes.get_mut(id.0).ok_or_else(|| Error::host("lookup", format!("unknown node {:?}", id)))
	}

	fn push(&mut self, kind: NodeKind) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(NodeData {
			kind,
			parent: None,
			children: Vec::new(),
		});
		id
	}

	fn detach(&mut self, id: NodeId) -> Result<(), Error> {
		if let Some(parent) = self.node_mut(id)?.parent.take() {
			self.node_mut(parent)?.children.retain(|child| *child != id);
		}
		Ok(())
	}

	fn element_mut(&mut self, id: NodeId, operation: &'static str) -> Result<(&mut Vec<(String, String)>, &mut Vec<String>), Error> {
		match &mut self.node_mut(id)?.kind {
			NodeKind::Element { attributes, classes, .. } => Ok((attributes, classes)),
			NodeKind::Text(_) => Err(Error::host(operation, "not an element")),
		}
	}

	fn write_html(&self, id: NodeId, out: &mut String) {
		let node = &self.nodes[id.0];
		match &node.kind {
			NodeKind::Text(text) => out.push_str(text),
			NodeKind::Element { tag, attributes, classes } => {
				out.push('<');
				out.push_str(tag);
				if !classes.is_empty() {
					let _ = write!(out, " class=\"{}\"", classes.join(" "));
				}
				for (name, value) in attributes {
					let _ = write!(out, " {}=\"{}\"", name, value);
				}
				out.push('>');
				for child in &node.children {
					self.write_html(*child, out);
				}
				let _ = write!(out, "</{}>", tag);
			}
		}
	}
}

/// An in-memory [`Host`]. Cloning shares the same tree.
#[derive(Clone, Default)]
pub struct MemoryHost(Rc<RefCell<Arena>>);

impl Debug for MemoryHost {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let arena = self.0.borrow();
		f.debug_struct("MemoryHost")
			.field("nodes", &arena.nodes.len())
			.field("mutations", &arena.mutations.len())
			.finish()
	}
}

impl MemoryHost {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached container element, e.g. to mount into. Not recorded as mutation.
	#[must_use]
	pub fn create_container(&self, tag: &str) -> NodeId {
		self.0.borrow_mut().push(NodeKind::Element {
			tag: tag.to_owned(),
			attributes: Vec::new(),
			classes: Vec::new(),
		})
	}

	#[must_use]
	pub fn children(&self, node: &NodeId) -> Vec<NodeId> {
		self.0.borrow().node(*node).map(|node| node.children.clone()).unwrap_or_default()
	}

	#[must_use]
	pub fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.0.borrow().node(*node).ok().and_then(|node| node.parent)
	}

	#[must_use]
	pub fn tag(&self, node: &NodeId) -> Option<String> {
		match &self.0.borrow().node(*node).ok()?.kind {
			NodeKind::Element { tag, .. } => Some(tag.clone()),
			NodeKind::Text(_) => None,
		}
	}

	#[must_use]
	pub fn text(&self, node: &NodeId) -> Option<String> {
		match &self.0.borrow().node(*node).ok()?.kind {
			NodeKind::Text(text) => Some(text.clone()),
			NodeKind::Element { .. } => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
		match &self.0.borrow().node(*node).ok()?.kind {
			NodeKind::Element { attributes, .. } => attributes.iter().find(|(n, _)| n == name).map(|(_, value)| value.clone()),
			NodeKind::Text(_) => None,
		}
	}

	#[must_use]
	pub fn class_list(&self, node: &NodeId) -> Vec<String> {
		self.class_tokens(node)
	}

	/// Serialises the children of `node`, without `node` itself.
	#[must_use]
	pub fn inner_html(&self, node: &NodeId) -> String {
		let arena = self.0.borrow();
		let mut out = String::new();
		if let Ok(node) = arena.node(*node) {
			for child in &node.children {
				arena.write_html(*child, &mut out);
			}
		}
		out
	}

	#[must_use]
	pub fn to_html(&self, node: &NodeId) -> String {
		let mut out = String::new();
		self.0.borrow().write_html(*node, &mut out);
		out
	}

	/// Number of nodes created through [`Host::create_element`] or [`Host::create_text`] since the last [`MemoryHost::clear_mutations`].
	#[must_use]
	pub fn created_count(&self) -> usize {
		self.0
			.borrow()
			.mutations
			.iter()
			.filter(|mutation| matches!(mutation, Mutation::CreateElement(_) | Mutation::CreateText(_)))
			.count()
	}

	#[must_use]
	pub fn mutations(&self) -> Vec<Mutation> {
		self.0.borrow().mutations.clone()
	}

	pub fn clear_mutations(&self) {
		self.0.borrow_mut().mutations.clear()
	}

	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.0.borrow().listeners.iter().flatten().count()
	}

	/// Invokes all listeners for `event` on `node`, in installation order. Returns how many were invoked.
	pub fn dispatch(&self, node: &NodeId, event: &str, native: Option<&MemoryEvent>) -> usize {
		let callbacks: Vec<_> = self
			.0
			.borrow()
			.listeners
			.iter()
			.flatten()
			.filter(|listener| listener.node == *node && listener.event == event)
			.map(|listener| listener.callback.clone())
			.collect();
		for callback in &callbacks {
			callback(native)
		}
		callbacks.len()
	}

	fn record(&self, mutation: Mutation) {
		trace!(?mutation, "Memory host mutation");
		self.0.borrow_mut().mutations.push(mutation)
	}
}

impl Host for MemoryHost {
	type Node = NodeId;
	type Event = MemoryEvent;
	type Listener = ListenerId;

	fn create_element(&self, tag: &str) -> Result<NodeId, Error> {
		let id = self.create_container(tag);
		self.record(Mutation::CreateElement(id));
		Ok(id)
	}

	fn create_text(&self, text: &str) -> NodeId {
		let id = self.0.borrow_mut().push(NodeKind::Text(text.to_owned()));
		self.record(Mutation::CreateText(id));
		id
	}

	fn set_text(&self, node: &NodeId, text: &str) {
		if let Ok(NodeData { kind: NodeKind::Text(data), .. }) = self.0.borrow_mut().node_mut(*node) {
			*data = text.to_owned();
		}
		self.record(Mutation::SetText(*node));
	}

	fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), Error> {
		{
			let mut arena = self.0.borrow_mut();
			let (attributes, _) = arena.element_mut(*node, "set_attribute")?;
			match attributes.iter_mut().find(|(n, _)| n == name) {
				Some(attribute) => attribute.1 = value.to_owned(),
				None => attributes.push((name.to_owned(), value.to_owned())),
			}
		}
		self.record(Mutation::SetAttribute(*node, name.to_owned()));
		Ok(())
	}

	fn remove_attribute(&self, node: &NodeId, name: &str) -> Result<(), Error> {
		self.0.borrow_mut().element_mut(*node, "remove_attribute")?.0.retain(|(n, _)| n != name);
		self.record(Mutation::RemoveAttribute(*node, name.to_owned()));
		Ok(())
	}

	fn insert_before(&self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) -> Result<(), Error> {
		{
			let mut arena = self.0.borrow_mut();
			if let NodeKind::Text(_) = arena.node(*parent)?.kind {
				return Err(Error::host("insert_before", "text nodes have no children"));
			}
			arena.detach(*node)?;
			let siblings = &mut arena.node_mut(*parent)?.children;
			let index = match reference {
				Some(reference) => siblings
					.iter()
					.position(|child| child == reference)
					.ok_or_else(|| Error::host("insert_before", "reference node is not a child of parent"))?,
				None => siblings.len(),
			};
			siblings.insert(index, *node);
			arena.node_mut(*node)?.parent = Some(*parent);
		}
		self.record(Mutation::Insert { parent: *parent, node: *node });
		Ok(())
	}

	fn remove(&self, node: &NodeId) -> Result<(), Error> {
		self.0.borrow_mut().detach(*node)?;
		self.record(Mutation::Remove(*node));
		Ok(())
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		let arena = self.0.borrow();
		let parent = arena.node(*node).ok()?.parent?;
		let siblings = &arena.node(parent).ok()?.children;
		let index = siblings.iter().position(|child| child == node)?;
		siblings.get(index + 1).copied()
	}

	fn is_container(&self, node: &NodeId) -> bool {
		matches!(self.0.borrow().node(*node), Ok(NodeData { kind: NodeKind::Element { .. }, .. }))
	}

	fn class_add(&self, node: &NodeId, token: &str) -> Result<(), Error> {
		{
			let mut arena = self.0.borrow_mut();
			let (_, classes) = arena.element_mut(*node, "class_add")?;
			if !classes.iter().any(|class| class == token) {
				classes.push(token.to_owned())
			}
		}
		self.record(Mutation::ClassAdd(*node, token.to_owned()));
		Ok(())
	}

	fn class_remove(&self, node: &NodeId, token: &str) -> Result<(), Error> {
		self.0.borrow_mut().element_mut(*node, "class_remove")?.1.retain(|class| class != token);
		self.record(Mutation::ClassRemove(*node, token.to_owned()));
		Ok(())
	}

	fn class_tokens(&self, node: &NodeId) -> Vec<String> {
		match self.0.borrow().node(*node) {
			Ok(NodeData {
				kind: NodeKind::Element { classes, .. },
				..
			}) => classes.clone(),
			_ => Vec::new(),
		}
	}

	fn add_listener(&self, node: &NodeId, event: &str, callback: NativeCallback<MemoryEvent>) -> Result<ListenerId, Error> {
		let id = {
			let mut arena = self.0.borrow_mut();
			arena.node(*node)?;
			arena.listeners.push(Some(Listener {
				node: *node,
				event: event.to_owned(),
				callback,
			}));
			ListenerId(arena.listeners.len() - 1)
		};
		self.record(Mutation::AddListener(*node, event.to_owned()));
		Ok(id)
	}

	fn remove_listener(&self, node: &NodeId, listener: ListenerId) {
		let removed = self.0.borrow_mut().listeners.get_mut(listener.0).and_then(Option::take);
		if let Some(removed) = removed {
			self.record(Mutation::RemoveListener(*node, removed.event));
		}
	}
}
