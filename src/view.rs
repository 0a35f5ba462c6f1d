//! Views and their live instances.

use crate::{
	element::{materialize, Live},
	keyed::KeyedList,
	spec::{Props, Spec, ViewSpec},
	switch::{Selector, Slot},
	Error, Host,
};
use core::fmt::{self, Debug, Formatter};
use std::{borrow::Cow, cell::RefCell, rc::Rc};
use tracing::{instrument, trace};

/// A stateful view.
///
/// [`render`](`View::render`) runs exactly once per instance, right after construction.
/// Reactivity comes from accessors inside the returned spec, which are re-evaluated on every update pass.
///
/// All lifecycle hooks default to doing nothing.
#[allow(unused_variables)]
pub trait View<H: Host> {
	fn render(&mut self, props: &Props<H>) -> Result<Option<Spec<H>>, Error>;

	fn will_mount(&mut self) {}
	fn on_mount(&mut self) {}
	fn did_mount(&mut self) {}

	/// Consulted before this view's own update phase. Returning `false` skips it and its entire subtree for this pass.
	fn should_update(&mut self) -> bool {
		true
	}
	fn will_update(&mut self) {}
	fn on_update(&mut self) {}
	/// Runs after every descendant settled.
	fn did_update(&mut self) {}

	fn will_unmount(&mut self) {}
	fn on_unmount(&mut self) {}
	fn did_unmount(&mut self) {}
}

type Constructor<H> = Rc<dyn Fn(&Props<H>) -> Result<Box<dyn View<H>>, Error>>;

pub(crate) enum ClassKind<H: Host> {
	Custom(Constructor<H>),
	For,
	Switch,
	SwitchUnion,
}

/// A named view constructor, used as [`Tag`](`crate::spec::Tag`) of view specs.
pub struct ViewClass<H: Host> {
	name: Cow<'static, str>,
	kind: Rc<ClassKind<H>>,
}

impl<H: Host> ViewClass<H> {
	pub fn new<V: View<H> + 'static>(name: impl Into<Cow<'static, str>>, constructor: impl Fn(&Props<H>) -> Result<V, Error> + 'static) -> Self {
		Self {
			name: name.into(),
			kind: Rc::new(ClassKind::Custom(Rc::new(move |props| Ok(Box::new(constructor(props)?) as Box<dyn View<H>>)))),
		}
	}

	pub(crate) fn builtin(name: &'static str, kind: ClassKind<H>) -> Self {
		Self {
			name: Cow::Borrowed(name),
			kind: Rc::new(kind),
		}
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn name_cow(&self) -> Cow<'static, str> {
		self.name.clone()
	}
}

impl<H: Host> Clone for ViewClass<H> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			kind: self.kind.clone(),
		}
	}
}

impl<H: Host> Debug for ViewClass<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ViewClass").field(&self.name).finish()
	}
}

/// A view that renders a fixed spec.
pub struct Static<H: Host>(Option<Spec<H>>);

impl<H: Host> Static<H> {
	#[must_use]
	pub fn new(spec: Option<Spec<H>>) -> Self {
		Self(spec)
	}
}

impl<H: Host> View<H> for Static<H> {
	fn render(&mut self, _: &Props<H>) -> Result<Option<Spec<H>>, Error> {
		Ok(self.0.clone())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MountState {
	Constructed,
	Mounted,
	Unmounted,
}

pub(crate) type SharedView<H> = Rc<RefCell<Box<dyn View<H>>>>;

pub(crate) enum Body<H: Host> {
	Custom { view: SharedView<H>, content: Live<H> },
	Keyed(KeyedList<H>),
	Slot(Slot<H>),
}

/// The live counterpart of a view spec.
pub(crate) struct ViewInstance<H: Host> {
	pub(crate) name: Cow<'static, str>,
	pub(crate) state: MountState,
	pub(crate) body: Body<H>,
}

impl<H: Host> ViewInstance<H> {
	/// Constructs and renders the view, materialising its content detached from the host tree.
	#[instrument(skip(host, spec), fields(view = %spec.class().name()))]
	pub(crate) fn construct(host: &H, spec: &ViewSpec<H>) -> Result<Self, Error> {
		let props = spec.props();
		let body = match &*spec.class().kind {
			ClassKind::Custom(constructor) => {
				let mut view = constructor(props)?;
				let content = match view.render(props)? {
					Some(rendered) => materialize(host, &rendered)?,
					None => {
						trace!("Rendered nothing");
						Live::placeholder(host)
					}
				};
				Body::Custom {
					view: Rc::new(RefCell::new(view)),
					content,
				}
			}
			ClassKind::For => Body::Keyed(KeyedList::construct(host, props)?),
			ClassKind::Switch => Body::Slot(Slot::construct(host, Selector::switch(props)?)?),
			ClassKind::SwitchUnion => Body::Slot(Slot::construct(host, Selector::union(props)?)?),
		};
		Ok(Self {
			name: spec.class().name_cow(),
			state: MountState::Constructed,
			body,
		})
	}

	pub(crate) fn view(&self) -> Option<&SharedView<H>> {
		match &self.body {
			Body::Custom { view, .. } => Some(view),
			Body::Keyed(_) | Body::Slot(_) => None,
		}
	}
}
