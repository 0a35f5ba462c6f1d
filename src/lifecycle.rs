//! Mount, update and unmount traversals.
//!
//! Mounting runs three separate pre-order passes (`will_mount`, attach + `on_mount`, `did_mount`).
//! Unmounting runs pre-order `will_unmount`, then post-order `on_unmount` and `did_unmount`, then detaches.
//!
//! Updates descend eagerly through the will- and on-phases while collecting every visited view into an
//! [`UpdatePass`]. The did-phase is drained afterwards in reverse visiting order, which is bottom-up.

use crate::{
	diagnostics::{Diagnostics, Warning},
	element::Live,
	view::{Body, MountState, SharedView},
	Error, Host,
};
use tracing::{instrument, trace, trace_span};

/// What a traversal needs besides the tree itself.
pub(crate) struct Context<'a, H: Host> {
	pub(crate) host: &'a H,
	pub(crate) diagnostics: &'a Diagnostics,
}

/// Deferred did-phase of one update pass.
pub(crate) struct UpdatePass<H: Host> {
	deferred: Vec<SharedView<H>>,
}

impl<H: Host> UpdatePass<H> {
	pub(crate) fn new() -> Self {
		Self { deferred: Vec::new() }
	}

	fn defer(&mut self, view: SharedView<H>) {
		self.deferred.push(view)
	}

	/// Fires `did_update` bottom-up.
	pub(crate) fn finish(self) {
		let span = trace_span!("did_update", views = self.deferred.len());
		let _enter = span.enter();
		for view in self.deferred.into_iter().rev() {
			view.borrow_mut().did_update();
		}
	}
}

/// Runs all three mount passes over a freshly materialised subtree, attaching its roots to `parent` before `reference`.
#[instrument(skip_all)]
pub(crate) fn mount<H: Host>(cx: &Context<'_, H>, live: &mut Live<H>, parent: &H::Node, reference: Option<&H::Node>) -> Result<(), Error> {
	live.will_mount();
	attach(cx.host, live, parent, reference)?;
	live.on_mount(cx.host)?;
	live.did_mount();
	Ok(())
}

pub(crate) fn attach<H: Host>(host: &H, live: &Live<H>, parent: &H::Node, reference: Option<&H::Node>) -> Result<(), Error> {
	let mut roots = Vec::new();
	live.collect_roots(&mut roots);
	for root in &roots {
		host.insert_before(parent, root, reference)?;
	}
	Ok(())
}

/// Runs all three unmount passes, then detaches the subtree's roots.
///
/// The roots are detached even if the on-phase fails.
#[instrument(skip_all)]
pub(crate) fn unmount<H: Host>(cx: &Context<'_, H>, live: &mut Live<H>) -> Result<(), Error> {
	live.will_unmount();
	let result = live.on_unmount(cx.host).map(|()| live.did_unmount());
	detach(cx, live);
	result
}

fn detach<H: Host>(cx: &Context<'_, H>, live: &Live<H>) {
	let mut roots = Vec::new();
	live.collect_roots(&mut roots);
	for root in &roots {
		if let Err(error) = cx.host.remove(root) {
			cx.diagnostics.warn(&Warning::DetachFailed { message: error.to_string() });
		}
	}
}

impl<H: Host> Live<H> {
	pub(crate) fn will_mount(&mut self) {
		if let Self::View(instance) = self {
			if let Some(view) = instance.view() {
				view.borrow_mut().will_mount();
			}
		}
		self.children_mut().for_each(Live::will_mount);
	}

	pub(crate) fn on_mount(&mut self, host: &H) -> Result<(), Error> {
		match self {
			Self::Element(element) => {
				for binding in &mut element.bindings {
					if let Some(on_mount) = binding.hooks.as_mut().and_then(|hooks| hooks.on_mount.as_mut()) {
						trace!(attribute = %binding.name, "on_mount binding");
						on_mount(host, &element.node, &mut binding.applied)?;
					}
				}
			}
			Self::View(instance) => {
				if let Some(view) = instance.view() {
					view.borrow_mut().on_mount();
				}
				instance.state = MountState::Mounted;
			}
			Self::Text(_) | Self::Fragment(_) => (),
		}
		self.children_mut().try_for_each(|child| child.on_mount(host))
	}

	pub(crate) fn did_mount(&mut self) {
		if let Self::View(instance) = self {
			if let Some(view) = instance.view() {
				view.borrow_mut().did_mount();
			}
		}
		self.children_mut().for_each(Live::did_mount);
	}

	/// The will- and on-phases of one update pass over this subtree.
	/// `parent` is the host node this subtree's roots live in.
	pub(crate) fn update(&mut self, cx: &Context<'_, H>, parent: &H::Node, pass: &mut UpdatePass<H>) -> Result<(), Error> {
		self.apply(cx)?;
		self.descend(cx, parent, pass)
	}

	/// Refreshes the bindings and text of this node's own roots, stopping at views.
	fn apply(&mut self, cx: &Context<'_, H>) -> Result<(), Error> {
		match self {
			Self::Text(text) => {
				if let Some(source) = &text.source {
					let next = crate::element::text_of(&source());
					if next != text.last {
						trace!("Updating text");
						cx.host.set_text(&text.node, &next);
						text.last = next;
					}
				}
				Ok(())
			}
			Self::Element(element) => {
				for binding in &mut element.bindings {
					if let Some(on_update) = binding.hooks.as_mut().and_then(|hooks| hooks.on_update.as_mut()) {
						on_update(cx.host, &element.node, &mut binding.applied)?;
					}
				}
				Ok(())
			}
			Self::Fragment(children) => children.iter_mut().try_for_each(|child| child.apply(cx)),
			Self::View(_) => Ok(()),
		}
	}

	/// Everything below the roots [`Live::apply`] handled.
	fn descend(&mut self, cx: &Context<'_, H>, parent: &H::Node, pass: &mut UpdatePass<H>) -> Result<(), Error> {
		match self {
			Self::Text(_) => Ok(()),
			Self::Element(element) => {
				let node = &element.node;
				element.children.iter_mut().try_for_each(|child| child.update(cx, node, pass))
			}
			Self::Fragment(children) => children.iter_mut().try_for_each(|child| child.descend(cx, parent, pass)),
			Self::View(instance) => {
				let span = trace_span!("update", view = %instance.name);
				let _enter = span.enter();
				match &mut instance.body {
					Body::Custom { view, content } => {
						if !view.borrow_mut().should_update() {
							trace!("Skipped by should_update");
							return Ok(());
						}
						view.borrow_mut().will_update();
						content.apply(cx)?;
						view.borrow_mut().on_update();
						pass.defer(view.clone());
						content.descend(cx, parent, pass)
					}
					Body::Keyed(list) => list.update(cx, parent, pass),
					Body::Slot(slot) => slot.update(cx, parent, pass),
				}
			}
		}
	}

	fn will_unmount(&mut self) {
		if let Self::View(instance) = self {
			if let Some(view) = instance.view() {
				view.borrow_mut().will_unmount();
			}
		}
		self.children_mut().for_each(Live::will_unmount);
	}

	fn on_unmount(&mut self, host: &H) -> Result<(), Error> {
		self.children_mut().try_for_each(|child| child.on_unmount(host))?;
		match self {
			Self::Element(element) => {
				for binding in &mut element.bindings {
					if let Some(on_unmount) = binding.hooks.as_mut().and_then(|hooks| hooks.on_unmount.as_mut()) {
						trace!(attribute = %binding.name, "on_unmount binding");
						on_unmount(host, &element.node, &mut binding.applied)?;
					}
				}
			}
			Self::View(instance) => {
				if let Some(view) = instance.view() {
					view.borrow_mut().on_unmount();
				}
			}
			Self::Text(_) | Self::Fragment(_) => (),
		}
		Ok(())
	}

	fn did_unmount(&mut self) {
		self.children_mut().for_each(Live::did_unmount);
		if let Self::View(instance) = self {
			if let Some(view) = instance.view() {
				view.borrow_mut().did_unmount();
			}
			instance.state = MountState::Unmounted;
		}
	}
}
