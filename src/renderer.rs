//! The application-facing surface: mounting views into host containers.

use crate::{
	diagnostics::{Diagnostics, Warning, WarningHandler, WarningHandlerId},
	element::{materialize, Live},
	lifecycle::{mount, unmount, Context, UpdatePass},
	spec::{create_spec, Attrs},
	view::{MountState, ViewClass},
	Error, Host,
};
use core::fmt::{self, Debug, Formatter};
use std::{borrow::Cow, cell::RefCell, rc::Rc};
use tracing::{error, instrument, trace};

struct Root<H: Host> {
	container: H::Node,
	live: Live<H>,
}

type RootSlot<H> = Rc<RefCell<Option<Root<H>>>>;

struct Shared<H: Host> {
	host: H,
	diagnostics: Diagnostics,
	mounts: RefCell<Vec<(H::Node, RootSlot<H>)>>,
}

impl<H: Host> Shared<H> {
	fn context(&self) -> Context<'_, H> {
		Context {
			host: &self.host,
			diagnostics: &self.diagnostics,
		}
	}
}

/// Owns a host adapter, the diagnostics sink and the registry of mounted roots.
///
/// Cloning shares all of them.
pub struct Renderer<H: Host> {
	shared: Rc<Shared<H>>,
}

impl<H: Host> Clone for Renderer<H> {
	fn clone(&self) -> Self {
		Self { shared: self.shared.clone() }
	}
}

impl<H: Host + Debug> Debug for Renderer<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Renderer")
			.field("host", &self.shared.host)
			.field("mounted", &self.shared.mounts.borrow().len())
			.finish()
	}
}

impl<H: Host> Renderer<H> {
	#[must_use]
	pub fn new(host: H) -> Self {
		Self {
			shared: Rc::new(Shared {
				host,
				diagnostics: Diagnostics::default(),
				mounts: RefCell::default(),
			}),
		}
	}

	#[must_use]
	pub fn host(&self) -> &H {
		&self.shared.host
	}

	/// Constructs `class` with `props`, then mounts it after any existing children of `root`.
	///
	/// # Errors
	///
	/// - [`Error::InvalidContainer`] if the host can't hold children at `root`.
	/// - [`Error::AlreadyMounted`] if a view is already mounted at `root` through this renderer or one of its clones.
	///   Separate [`Renderer`]s don't see each other's roots.
	/// - Any error raised while constructing, rendering or mounting the view.
	#[instrument(skip_all, fields(view = %class.name()))]
	pub fn mount_to_node(&self, class: &ViewClass<H>, root: &H::Node, props: Attrs<H>) -> Result<Mounted<H>, Error> {
		let shared = &self.shared;
		if !shared.host.is_container(root) {
			error!(?root, "Not a container");
			return Err(Error::InvalidContainer);
		}
		if shared.mounts.borrow().iter().any(|(node, _)| node == root) {
			error!(?root, "Already mounted");
			return Err(Error::AlreadyMounted);
		}

		let spec = create_spec(class, props)?;
		let mut live = materialize(&shared.host, &spec)?;
		mount(&shared.context(), &mut live, root, None)?;
		trace!("Mounted");

		let slot = Rc::new(RefCell::new(Some(Root {
			container: root.clone(),
			live,
		})));
		shared.mounts.borrow_mut().push((root.clone(), slot.clone()));
		Ok(Mounted {
			shared: shared.clone(),
			root: slot,
			view: class.name_cow(),
		})
	}

	/// Unmounts whatever view is mounted at `root`.
	///
	/// # Errors
	///
	/// - [`Error::NotMounted`] if nothing is mounted there.
	/// - [`Error::ReentrantUpdate`] if called while that root is being updated.
	#[instrument(skip_all)]
	pub fn unmount_from_node(&self, root: &H::Node) -> Result<(), Error> {
		let shared = &self.shared;
		let slot = {
			let mut mounts = shared.mounts.borrow_mut();
			let index = match mounts.iter().position(|(node, _)| node == root) {
				Some(index) => index,
				None => {
					error!(?root, "Nothing mounted");
					return Err(Error::NotMounted);
				}
			};
			if mounts[index].1.try_borrow_mut().is_err() {
				error!(?root, "Unmount during update");
				return Err(Error::ReentrantUpdate);
			}
			mounts.remove(index).1
		};

		let taken = slot.borrow_mut().take();
		if let Some(mut mounted) = taken {
			unmount(&shared.context(), &mut mounted.live)?;
			trace!("Unmounted");
		}
		Ok(())
	}

	pub fn add_warning_handler(&self, handler: impl Fn(&Warning) + 'static) -> WarningHandlerId {
		self.shared.diagnostics.subscribe(Rc::new(handler) as WarningHandler)
	}

	/// Returns whether the handler was still registered.
	pub fn remove_warning_handler(&self, id: WarningHandlerId) -> bool {
		self.shared.diagnostics.unsubscribe(id)
	}
}

/// Handle to a mounted root view.
pub struct Mounted<H: Host> {
	shared: Rc<Shared<H>>,
	root: RootSlot<H>,
	view: Cow<'static, str>,
}

impl<H: Host> Debug for Mounted<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Mounted").field("view", &self.view).field("mounted", &self.is_mounted()).finish()
	}
}

impl<H: Host> Mounted<H> {
	/// Runs one update pass over the mounted tree.
	///
	/// Once the view was unmounted, this reports [`Warning::UpdateAfterUnmount`] and does nothing else.
	///
	/// # Errors
	///
	/// - [`Error::ReentrantUpdate`] if this root is already being updated.
	/// - Any error raised by accessors, content functions or the host during the pass.
	#[instrument(skip_all, fields(view = %self.view))]
	pub fn update(&self) -> Result<(), Error> {
		let pass = {
			let mut slot = match self.root.try_borrow_mut() {
				Ok(slot) => slot,
				Err(_) => {
					error!("`update()` called during an update pass of the same root");
					return Err(Error::ReentrantUpdate);
				}
			};
			let root = match slot.as_mut() {
				Some(root) => root,
				None => {
					self.shared.diagnostics.warn(&Warning::UpdateAfterUnmount { view: self.view.clone() });
					return Ok(());
				}
			};
			let mut pass = UpdatePass::new();
			root.live.update(&self.shared.context(), &root.container, &mut pass)?;
			pass
		};
		pass.finish();
		Ok(())
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		match self.root.try_borrow() {
			Ok(slot) => matches!(
				slot.as_ref().map(|root| &root.live),
				Some(Live::View(instance)) if instance.state == MountState::Mounted
			),
			// Only a running update holds the slot mutably.
			Err(_) => true,
		}
	}

	#[must_use]
	pub fn view_name(&self) -> &str {
		&self.view
	}
}
