//! Contract violations and other hard failures.
//!
//! Every fault in this crate is a programmer error and is surfaced at the point of violation.
//! Nothing is retried, and nothing renders partially on purpose.
//! Non-fatal misuse is reported through [`Warning`](`crate::diagnostics::Warning`)s instead.

use std::borrow::Cow;

/// Everything that can go wrong while building specs or running lifecycle passes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The tag is neither a valid element name, the fragment marker nor a view class.
	#[error("Invalid spec type: {0:?}")]
	InvalidSpecType(String),

	/// A raw literal was passed where a frozen value or accessor is required.
	#[error("Attribute `{name}` must be a frozen value (see `constant`) or an accessor, not a raw literal")]
	NonReactiveAttribute { name: String },

	/// A value of the wrong shape was passed for an attribute.
	#[error("Attribute `{name}` expects {expected}")]
	InvalidAttribute { name: String, expected: &'static str },

	#[error("Invalid event handler for `{name}`: {reason}")]
	InvalidEventHandler { name: String, reason: &'static str },

	/// Lifecycle attributes only accept plain node hooks.
	#[error("Lifecycle attribute `{hook}` must be a function taking the host node")]
	InvalidLifecycleHandler { hook: &'static str },

	#[error("View `{view}` requires prop `{prop}`")]
	MissingProp { view: Cow<'static, str>, prop: String },

	#[error("Prop `{prop}` of view `{view}` expects {expected}")]
	InvalidProp {
		view: Cow<'static, str>,
		prop: String,
		expected: &'static str,
	},

	/// Keys must be unique within one keyed list at any instant.
	#[error("Duplicate key {0} in keyed list")]
	DuplicateKey(String),

	/// A `For` sequence accessor returned something other than an array.
	#[error("`each` must produce an array, but produced {0}")]
	NotASequence(&'static str),

	#[error("`SwitchUnion` has no case for {0:?}")]
	UnknownCase(String),

	/// A render or content function failed.
	#[error("Render of `{view}` failed: {message}")]
	Render { view: Cow<'static, str>, message: String },

	#[error("A view is already mounted on this host node")]
	AlreadyMounted,

	#[error("No view is mounted on this host node")]
	NotMounted,

	#[error("The host node is not a valid container")]
	InvalidContainer,

	/// `update()` was called while a pass on the same root was still running.
	#[error("Update requested while a lifecycle pass is in flight")]
	ReentrantUpdate,

	/// The host adapter refused an operation.
	#[error("Host operation `{operation}` failed: {message}")]
	Host { operation: &'static str, message: String },
}

impl Error {
	/// Shorthand for [`Error::Host`].
	pub fn host(operation: &'static str, message: impl Into<String>) -> Self {
		Self::Host {
			operation,
			message: message.into(),
		}
	}

	/// Shorthand for [`Error::Render`], for use in [`View::render`](`crate::View::render`) implementations.
	pub fn render(view: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
		Self::Render {
			view: view.into(),
			message: message.into(),
		}
	}
}
