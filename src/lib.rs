#![doc(html_root_url = "https://docs.rs/cambium/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A reactive view engine.
//!
//! Views render [`Spec`]s once, when they are constructed. The resulting host nodes are then kept in sync by explicit
//! update passes ([`Mounted::update`]), which re-evaluate accessors, diff each binding against what it last applied,
//! and re-run the keyed reconciliation of [`For`], [`Switch`] and [`SwitchUnion`].
//!
//! The engine reaches the host tree only through a [`Host`] adapter.
//! [`memory::MemoryHost`] is an in-memory tree, [`dom::DomHost`] drives a browser document.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod binding;
pub mod diagnostics;
pub mod dom;
mod element;
mod error;
pub mod host;
mod keyed;
mod lifecycle;
pub mod memory;
mod renderer;
pub mod spec;
mod switch;
pub mod value;
pub mod view;

pub use diagnostics::{Warning, WarningHandlerId};
pub use error::Error;
pub use host::Host;
pub use keyed::For;
pub use renderer::{Mounted, Renderer};
pub use spec::{constant, create_spec, flatten_children, handler, hook, is_constant, reactive, AttrValue, Attrs, Child, Children, Content, Spec, Tag};
pub use switch::{Switch, SwitchUnion};
pub use value::{accessor, Accessor, Key, Value};
pub use view::{Static, View, ViewClass};
