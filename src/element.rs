//! Live host nodes materialised from specs, and their root-node spans.
//!
//! Every live node owns a non-empty span of root host nodes: elements and text nodes are their own span,
//! fragments and views span their children's roots. Empty content is represented by a placeholder (an empty
//! text node) so that siblings always have an anchor to insert before.

use crate::{
	binding::{self, Applied, BindingHooks},
	diagnostics::redact,
	keyed::Item,
	spec::{Content, Spec, SpecKind},
	value::{Accessor, Value},
	view::{Body, ViewInstance},
	Error, Host,
};
use core::slice;
use std::rc::Rc;
use tracing::{trace, trace_span};

pub(crate) enum Live<H: Host> {
	Element(HostElement<H>),
	Text(HostText<H>),
	Fragment(Vec<Live<H>>),
	View(Box<ViewInstance<H>>),
}

pub(crate) struct HostElement<H: Host> {
	pub(crate) node: H::Node,
	pub(crate) bindings: Vec<AttrBinding<H>>,
	pub(crate) children: Vec<Live<H>>,
}

/// One bound attribute together with its last-applied slot.
pub(crate) struct AttrBinding<H: Host> {
	pub(crate) name: Rc<str>,
	pub(crate) hooks: Option<BindingHooks<H>>,
	pub(crate) applied: Applied<H>,
}

pub(crate) struct HostText<H: Host> {
	pub(crate) node: H::Node,
	/// [`None`] for static text.
	pub(crate) source: Option<Accessor>,
	pub(crate) last: String,
}

/// Text content of a dynamic child. `null` and `undefined` render as nothing.
pub(crate) fn text_of(value: &Value) -> String {
	if value.is_nullish() {
		String::new()
	} else {
		value.to_string()
	}
}

/// Creates all host nodes for `spec`, detached. Element children are appended to their element right away.
pub(crate) fn materialize<H: Host>(host: &H, spec: &Spec<H>) -> Result<Live<H>, Error> {
	match spec.kind() {
		SpecKind::Element(element) => {
			let span = trace_span!("materialize", tag = %element.tag);
			let _enter = span.enter();

			let node = host.create_element(&element.tag)?;
			let mut bindings = Vec::with_capacity(element.attrs.len());
			for attr in &element.attrs {
				if let Some((binding, adapter)) = binding::bind(&attr.kind, &attr.name, &attr.value)? {
					let mut applied = Applied::Nothing;
					adapter.write_initial(host, &node, &binding.value, &mut applied)?;
					bindings.push(AttrBinding {
						name: attr.name.clone(),
						hooks: binding.bindings,
						applied,
					});
				}
			}

			let children = materialize_all(host, &element.children)?;
			let mut roots = Vec::new();
			for child in &children {
				child.collect_roots(&mut roots);
			}
			for root in &roots {
				host.insert_before(&node, root, None)?;
			}
			trace!(bindings = bindings.len(), roots = roots.len(), "Materialised element");
			Ok(Live::Element(HostElement { node, bindings, children }))
		}
		SpecKind::Fragment(fragment) => {
			let children = materialize_all(host, &fragment.children)?;
			if children.is_empty() {
				Ok(Live::placeholder(host))
			} else {
				Ok(Live::Fragment(children))
			}
		}
		SpecKind::View(view) => Ok(Live::View(Box::new(ViewInstance::construct(host, view)?))),
	}
}

fn materialize_all<H: Host>(host: &H, contents: &[Content<H>]) -> Result<Vec<Live<H>>, Error> {
	contents
		.iter()
		.map(|content| match content {
			Content::Spec(spec) => materialize(host, spec),
			Content::Text(text) => Ok(Live::Text(HostText {
				node: host.create_text(text),
				source: None,
				last: text.to_string(),
			})),
			Content::Dynamic(accessor) => {
				let text = text_of(&accessor());
				trace!(text = %redact(&text), "Dynamic text");
				Ok(Live::Text(HostText {
					node: host.create_text(&text),
					source: Some(accessor.clone()),
					last: text,
				}))
			}
		})
		.collect()
}

impl<H: Host> Live<H> {
	pub(crate) fn placeholder(host: &H) -> Self {
		Self::Text(HostText {
			node: host.create_text(""),
			source: None,
			last: String::new(),
		})
	}

	pub(crate) fn first_node(&self) -> Option<&H::Node> {
		match self {
			Self::Element(element) => Some(&element.node),
			Self::Text(text) => Some(&text.node),
			Self::Fragment(children) => children.iter().find_map(Live::first_node),
			Self::View(instance) => match &instance.body {
				Body::Custom { content, .. } => content.first_node(),
				Body::Keyed(list) => list.first_node(),
				Body::Slot(slot) => slot.live.first_node(),
			},
		}
	}

	pub(crate) fn last_node(&self) -> Option<&H::Node> {
		match self {
			Self::Element(element) => Some(&element.node),
			Self::Text(text) => Some(&text.node),
			Self::Fragment(children) => children.iter().rev().find_map(Live::last_node),
			Self::View(instance) => match &instance.body {
				Body::Custom { content, .. } => content.last_node(),
				Body::Keyed(list) => list.last_node(),
				Body::Slot(slot) => slot.live.last_node(),
			},
		}
	}

	/// Appends this node's root host nodes to `out`, in tree order.
	pub(crate) fn collect_roots(&self, out: &mut Vec<H::Node>) {
		match self {
			Self::Element(element) => out.push(element.node.clone()),
			Self::Text(text) => out.push(text.node.clone()),
			Self::Fragment(children) => children.iter().for_each(|child| child.collect_roots(out)),
			Self::View(instance) => match &instance.body {
				Body::Custom { content, .. } => content.collect_roots(out),
				Body::Keyed(list) => list.collect_roots(out),
				Body::Slot(slot) => slot.live.collect_roots(out),
			},
		}
	}

	/// Direct live children, in tree order.
	pub(crate) fn children_mut(&mut self) -> ChildrenMut<'_, H> {
		match self {
			Self::Element(HostElement { children, .. }) | Self::Fragment(children) => ChildrenMut::Slice(children.iter_mut()),
			Self::Text(_) => ChildrenMut::One(None),
			Self::View(instance) => match &mut instance.body {
				Body::Custom { content, .. } => ChildrenMut::One(Some(content)),
				Body::Keyed(list) => ChildrenMut::Items(list.items.iter_mut()),
				Body::Slot(slot) => ChildrenMut::One(Some(&mut slot.live)),
			},
		}
	}
}

pub(crate) enum ChildrenMut<'a, H: Host> {
	Slice(slice::IterMut<'a, Live<H>>),
	Items(slice::IterMut<'a, Item<H>>),
	One(Option<&'a mut Live<H>>),
}

impl<'a, H: Host> Iterator for ChildrenMut<'a, H> {
	type Item = &'a mut Live<H>;

	fn next(&mut self) -> Option<Self::Item> {
		match self {
			Self::Slice(children) => children.next(),
			Self::Items(items) => items.next().map(|item| &mut item.live),
			Self::One(child) => child.take(),
		}
	}
}
