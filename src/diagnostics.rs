//! Non-fatal diagnostics.
//!
//! Warnings are always logged through [`tracing`], and additionally delivered to every handler registered on the
//! [`Renderer`](`crate::Renderer`) that owns the sink. There is no process-wide channel.

use core::fmt::{self, Display, Formatter};
use std::{borrow::Cow, cell::RefCell, rc::Rc};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Warning {
	/// `update()` was called on an instance that has already been unmounted. The call was ignored.
	UpdateAfterUnmount { view: Cow<'static, str> },
	/// The host refused to detach a node during unmount. The node may linger in the host tree.
	DetachFailed { message: String },
}

impl Display for Warning {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::UpdateAfterUnmount { view } => write!(f, "`update()` called on unmounted view `{}`; ignoring", view),
			Self::DetachFailed { message } => write!(f, "Failed to detach host node: {}", message),
		}
	}
}

pub type WarningHandler = Rc<dyn Fn(&Warning)>;

/// Returned by [`Renderer::add_warning_handler`](`crate::Renderer::add_warning_handler`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WarningHandlerId(u64);

#[derive(Default)]
pub(crate) struct Diagnostics {
	handlers: RefCell<Vec<(WarningHandlerId, WarningHandler)>>,
	next_id: RefCell<u64>,
}

impl Diagnostics {
	pub(crate) fn subscribe(&self, handler: WarningHandler) -> WarningHandlerId {
		let mut next_id = self.next_id.borrow_mut();
		let id = WarningHandlerId(*next_id);
		*next_id += 1;
		self.handlers.borrow_mut().push((id, handler));
		id
	}

	pub(crate) fn unsubscribe(&self, id: WarningHandlerId) -> bool {
		let mut handlers = self.handlers.borrow_mut();
		let len = handlers.len();
		handlers.retain(|(handler_id, _)| *handler_id != id);
		handlers.len() != len
	}

	pub(crate) fn warn(&self, warning: &Warning) {
		warn!("{}", warning);
		// Handlers may (un)subscribe while being notified.
		let handlers: Vec<_> = self.handlers.borrow().iter().map(|(_, handler)| handler.clone()).collect();
		for handler in handlers {
			handler(warning)
		}
	}
}

/// Attribute values and text content only make it into logs with the `dangerous-logging` feature.
pub(crate) fn redact(text: &str) -> Cow<'_, str> {
	if cfg!(feature = "dangerous-logging") {
		Cow::Borrowed(text)
	} else {
		Cow::Owned(format!("<{} bytes>", text.len()))
	}
}
