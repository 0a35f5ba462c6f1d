//! The binding layer: one adapter per attribute kind.
//!
//! Binding an attribute value produces a [`Binding`] record: the current resolved value, used for the initial host
//! write, plus optional hooks. [`BindingHooks::on_update`] is the only code path that touches the host node for that
//! attribute afterwards, and it diffs against the attribute's [`Applied`] slot, i.e. what *this binding* last wrote,
//! never against the live host state.

use crate::{
	diagnostics::redact,
	spec::AttrValue,
	value::{Accessor, Value},
	Error, Host,
};
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashSet;
use std::rc::Rc;
use tracing::{error, trace};

/// Attribute kinds, resolved once from the attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrKind {
	Generic,
	Class,
	Style,
	/// Carries the native event name, e.g. `click` for `onClick`.
	Event(Rc<str>),
	Lifecycle(LifecycleHook),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleHook {
	OnMount,
	OnUpdate,
	OnUnmount,
}

impl LifecycleHook {
	#[must_use]
	pub fn name(self) -> &'static str {
		match self {
			Self::OnMount => "onMount",
			Self::OnUpdate => "onUpdate",
			Self::OnUnmount => "onUnmount",
		}
	}
}

impl AttrKind {
	#[must_use]
	pub fn classify(name: &str) -> Self {
		match name {
			"class" => Self::Class,
			"style" => Self::Style,
			"onMount" => Self::Lifecycle(LifecycleHook::OnMount),
			"onUpdate" => Self::Lifecycle(LifecycleHook::OnUpdate),
			"onUnmount" => Self::Lifecycle(LifecycleHook::OnUnmount),
			event if event.starts_with("on") && event[2..].starts_with(|c: char| c.is_ascii_uppercase()) => {
				Self::Event(event[2..].to_ascii_lowercase().into())
			}
			_ => Self::Generic,
		}
	}

	/// Checks the value's shape. Called at spec construction.
	pub(crate) fn validate<H: Host>(&self, name: &str, value: &AttrValue<H>) -> Result<(), Error> {
		let result = match (self, value) {
			(Self::Generic | Self::Class | Self::Style, AttrValue::Absent | AttrValue::Frozen(_) | AttrValue::Accessor(_)) => Ok(()),
			(Self::Generic | Self::Class | Self::Style, AttrValue::Literal(_)) => Err(Error::NonReactiveAttribute { name: name.to_owned() }),
			(Self::Generic | Self::Class | Self::Style, _) => Err(Error::InvalidAttribute {
				name: name.to_owned(),
				expected: "a frozen value or an accessor",
			}),

			(Self::Event(event), _) if event.is_empty() => Err(Error::InvalidEventHandler {
				name: name.to_owned(),
				reason: "the event name is empty",
			}),
			(Self::Event(_), AttrValue::Absent | AttrValue::Handler(_)) => Ok(()),
			(Self::Event(_), _) => Err(Error::InvalidEventHandler {
				name: name.to_owned(),
				reason: "the handler is not a function",
			}),

			(Self::Lifecycle(_), AttrValue::Hook(_)) => Ok(()),
			(Self::Lifecycle(hook), _) => Err(Error::InvalidLifecycleHandler { hook: hook.name() }),
		};
		if let Err(error) = &result {
			error!(attribute = name, shape = value.shape(), "{}", error);
		}
		result
	}
}

pub type BindingHook<H> = Box<dyn FnMut(&H, &<H as Host>::Node, &mut Applied<H>) -> Result<(), Error>>;

/// `{value, bindings?}`
pub struct Binding<H: Host> {
	/// The resolved value at bind time.
	pub value: Value,
	/// [`None`] for frozen values: these are written once and never touched again.
	pub bindings: Option<BindingHooks<H>>,
}

pub struct BindingHooks<H: Host> {
	pub on_mount: Option<BindingHook<H>>,
	pub on_update: Option<BindingHook<H>>,
	pub on_unmount: Option<BindingHook<H>>,
}

impl<H: Host> BindingHooks<H> {
	fn on_mount(hook: BindingHook<H>) -> Self {
		Self {
			on_mount: Some(hook),
			on_update: None,
			on_unmount: None,
		}
	}

	fn on_update(hook: BindingHook<H>) -> Self {
		Self {
			on_mount: None,
			on_update: Some(hook),
			on_unmount: None,
		}
	}

	fn on_unmount(hook: BindingHook<H>) -> Self {
		Self {
			on_mount: None,
			on_update: None,
			on_unmount: Some(hook),
		}
	}
}

/// What one binding last applied to its host node.
pub enum Applied<H: Host> {
	Nothing,
	/// A generic attribute's string, or [`None`] if it was removed.
	Text(Option<String>),
	/// The desired class tokens as last computed.
	Tokens(Vec<String>),
	Style(String),
	Listener(H::Listener),
}

impl<H: Host> Debug for Applied<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Nothing => f.write_str("Nothing"),
			Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Self::Tokens(tokens) => f.debug_tuple("Tokens").field(tokens).finish(),
			Self::Style(style) => f.debug_tuple("Style").field(style).finish(),
			Self::Listener(_) => f.write_str("Listener"),
		}
	}
}

impl<H: Host> PartialEq for Applied<H> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Nothing, Self::Nothing) => true,
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Tokens(a), Self::Tokens(b)) => a == b,
			(Self::Style(a), Self::Style(b)) => a == b,
			_ => false,
		}
	}
}

/// Common contract of the per-kind adapters.
pub(crate) trait Adapter<H: Host> {
	/// Resolves the value and installs hooks. [`None`] means "no binding".
	fn bind(&self, value: &AttrValue<H>) -> Result<Option<Binding<H>>, Error>;
	/// The initial host write for a freshly bound value.
	fn write_initial(&self, host: &H, node: &H::Node, value: &Value, applied: &mut Applied<H>) -> Result<(), Error>;
}

/// Binds one attribute through the adapter for its kind.
pub(crate) fn bind<H: Host>(kind: &AttrKind, name: &Rc<str>, value: &AttrValue<H>) -> Result<Option<(Binding<H>, Box<dyn Adapter<H>>)>, Error> {
	let adapter: Box<dyn Adapter<H>> = match kind {
		AttrKind::Generic => Box::new(GenericAdapter { name: name.clone() }),
		AttrKind::Class => Box::new(ClassAdapter),
		AttrKind::Style => Box::new(StyleAdapter),
		AttrKind::Event(event) => Box::new(EventAdapter { event: event.clone() }),
		AttrKind::Lifecycle(hook) => Box::new(LifecycleAdapter { hook: *hook }),
	};
	Ok(adapter.bind(value)?.map(|binding| (binding, adapter)))
}

fn unexpected<H: Host>(name: &str, value: &AttrValue<H>, expected: &'static str) -> Error {
	error!(attribute = name, shape = value.shape(), expected, "Unexpected attribute value at bind time");
	Error::InvalidAttribute {
		name: name.to_owned(),
		expected,
	}
}

/// Resolves frozen and reactive values; [`None`] for absent ones.
fn resolve<H: Host>(name: &str, value: &AttrValue<H>) -> Result<Option<(Value, Option<Accessor>)>, Error> {
	match value {
		AttrValue::Absent => Ok(None),
		AttrValue::Frozen(value) => Ok(Some((value.clone(), None))),
		AttrValue::Accessor(accessor) => Ok(Some((accessor(), Some(accessor.clone())))),
		AttrValue::Literal(_) => Err(Error::NonReactiveAttribute { name: name.to_owned() }),
		other => Err(unexpected(name, other, "a frozen value or an accessor")),
	}
}

struct GenericAdapter {
	name: Rc<str>,
}

impl<H: Host> Adapter<H> for GenericAdapter {
	fn bind(&self, value: &AttrValue<H>) -> Result<Option<Binding<H>>, Error> {
		let (value, accessor) = match resolve(&self.name, value)? {
			Some(resolved) => resolved,
			None => return Ok(None),
		};
		let bindings = accessor.map(|accessor| {
			let name = self.name.clone();
			BindingHooks::on_update(Box::new(move |host: &H, node: &H::Node, applied: &mut Applied<H>| {
				let next = accessor().to_attribute();
				if matches!(applied, Applied::Text(last) if *last == next) {
					return Ok(());
				}
				write_attribute(host, node, &name, next.as_deref())?;
				*applied = Applied::Text(next);
				Ok(())
			}) as BindingHook<H>)
		});
		Ok(Some(Binding { value, bindings }))
	}

	fn write_initial(&self, host: &H, node: &H::Node, value: &Value, applied: &mut Applied<H>) -> Result<(), Error> {
		let text = value.to_attribute();
		if text.is_some() {
			write_attribute(host, node, &self.name, text.as_deref())?;
		}
		*applied = Applied::Text(text);
		Ok(())
	}
}

fn write_attribute<H: Host>(host: &H, node: &H::Node, name: &str, value: Option<&str>) -> Result<(), Error> {
	match value {
		Some(value) => {
			trace!(name, value = %redact(value), "Setting attribute");
			host.set_attribute(node, name, value)
		}
		None => {
			trace!(name, "Removing attribute");
			host.remove_attribute(node, name)
		}
	}
}

/// Desired class tokens of a class value, in first-seen order and without duplicates.
pub(crate) fn class_tokens(value: &Value) -> Result<Vec<String>, Error> {
	let mut tokens = Vec::new();
	let mut seen = HashSet::new();
	let mut push = |token: &str| {
		if seen.insert(token.to_owned()) {
			tokens.push(token.to_owned())
		}
	};
	match value {
		Value::Undefined | Value::Null => (),
		Value::String(classes) => classes.split_whitespace().for_each(&mut push),
		Value::Object(fields) => fields
			.iter()
			.filter(|(_, enabled)| enabled.is_truthy())
			.flat_map(|(classes, _)| classes.split_whitespace())
			.for_each(&mut push),
		other => {
			error!(shape = other.type_name(), "Invalid class value");
			return Err(Error::InvalidAttribute {
				name: "class".to_owned(),
				expected: "a string or a map of class tokens",
			});
		}
	}
	Ok(tokens)
}

/// `(added, removed)`, or [`None`] if the token sets are equal.
pub(crate) fn diff_tokens<'a>(last: &'a [String], next: &'a [String]) -> Option<(Vec<&'a str>, Vec<&'a str>)> {
	let last_set: HashSet<&str> = last.iter().map(String::as_str).collect();
	let next_set: HashSet<&str> = next.iter().map(String::as_str).collect();
	if last_set == next_set {
		return None;
	}
	let added = next.iter().map(String::as_str).filter(|token| !last_set.contains(token)).collect();
	let removed = last.iter().map(String::as_str).filter(|token| !next_set.contains(token)).collect();
	Some((added, removed))
}

struct ClassAdapter;

impl<H: Host> Adapter<H> for ClassAdapter {
	fn bind(&self, value: &AttrValue<H>) -> Result<Option<Binding<H>>, Error> {
		let (value, accessor) = match resolve("class", value)? {
			Some(resolved) => resolved,
			None => return Ok(None),
		};
		let tokens = class_tokens(&value)?;
		let canonical = match value {
			Value::String(_) => value,
			_ => Value::String(tokens.join(" ").into()),
		};
		let bindings = accessor.map(|accessor| {
			BindingHooks::on_update(Box::new(move |host: &H, node: &H::Node, applied: &mut Applied<H>| {
				let next = class_tokens(&accessor())?;
				let empty = Vec::new();
				let last = match applied {
					Applied::Tokens(last) => &*last,
					_ => &empty,
				};
				let changed = match diff_tokens(last, &next) {
					Some((added, removed)) => {
						trace!(?added, ?removed, "Updating class tokens");
						for token in removed {
							host.class_remove(node, token)?;
						}
						for token in added {
							host.class_add(node, token)?;
						}
						true
					}
					None => false,
				};
				if changed {
					*applied = Applied::Tokens(next);
				}
				Ok(())
			}) as BindingHook<H>)
		});
		Ok(Some(Binding { value: canonical, bindings }))
	}

	fn write_initial(&self, host: &H, node: &H::Node, value: &Value, applied: &mut Applied<H>) -> Result<(), Error> {
		let tokens = class_tokens(value)?;
		for token in &tokens {
			host.class_add(node, token)?;
		}
		*applied = Applied::Tokens(tokens);
		Ok(())
	}
}

/// Serialises a style value as `prop:value;prop2:value2`, in field order.
pub(crate) fn style_string(value: &Value) -> Result<String, Error> {
	match value {
		Value::Undefined | Value::Null => Ok(String::new()),
		Value::String(style) => Ok(style.to_string()),
		Value::Object(fields) => Ok(fields
			.iter()
			.filter(|(_, value)| !value.is_nullish())
			.map(|(property, value)| format!("{}:{}", property, value))
			.collect::<Vec<_>>()
			.join(";")),
		other => {
			error!(shape = other.type_name(), "Invalid style value");
			Err(Error::InvalidAttribute {
				name: "style".to_owned(),
				expected: "a string or a map of style properties",
			})
		}
	}
}

struct StyleAdapter;

impl<H: Host> Adapter<H> for StyleAdapter {
	fn bind(&self, value: &AttrValue<H>) -> Result<Option<Binding<H>>, Error> {
		let (value, accessor) = match resolve("style", value)? {
			Some(resolved) => resolved,
			None => return Ok(None),
		};
		let serialized = Value::String(style_string(&value)?.into());
		let bindings = accessor.map(|accessor| {
			BindingHooks::on_update(Box::new(move |host: &H, node: &H::Node, applied: &mut Applied<H>| {
				let next = style_string(&accessor())?;
				if matches!(applied, Applied::Style(last) if *last == next) {
					return Ok(());
				}
				write_attribute(host, node, "style", Some(next.as_str()).filter(|style| !style.is_empty()))?;
				*applied = Applied::Style(next);
				Ok(())
			}) as BindingHook<H>)
		});
		Ok(Some(Binding { value: serialized, bindings }))
	}

	fn write_initial(&self, host: &H, node: &H::Node, value: &Value, applied: &mut Applied<H>) -> Result<(), Error> {
		let style = style_string(value)?;
		if !style.is_empty() {
			write_attribute(host, node, "style", Some(&style))?;
		}
		*applied = Applied::Style(style);
		Ok(())
	}
}

struct EventAdapter {
	event: Rc<str>,
}

impl<H: Host> Adapter<H> for EventAdapter {
	fn bind(&self, value: &AttrValue<H>) -> Result<Option<Binding<H>>, Error> {
		let handler = match value {
			AttrValue::Absent => return Ok(None),
			AttrValue::Handler(handler) => handler.clone(),
			_ => {
				return Err(Error::InvalidEventHandler {
					name: self.event.to_string(),
					reason: "the handler is not a function",
				})
			}
		};
		let event = self.event.clone();
		let on_mount = Box::new(move |host: &H, node: &H::Node, applied: &mut Applied<H>| {
			let handler = handler.clone();
			let name = event.clone();
			let listener = host.add_listener(
				node,
				&event,
				Rc::new(move |native: Option<&H::Event>| match native {
					Some(native) => handler(native),
					None => trace!(event = %name, "Ignoring invocation without event"),
				}),
			)?;
			trace!(event = %event, "Installed listener");
			*applied = Applied::Listener(listener);
			Ok(())
		}) as BindingHook<H>;
		let event = self.event.clone();
		let on_unmount = Box::new(move |host: &H, node: &H::Node, applied: &mut Applied<H>| {
			if let Applied::Listener(listener) = core::mem::replace(applied, Applied::Nothing) {
				trace!(event = %event, "Removing listener");
				host.remove_listener(node, listener);
			}
			Ok(())
		}) as BindingHook<H>;
		Ok(Some(Binding {
			value: Value::Undefined,
			bindings: Some(BindingHooks {
				on_mount: Some(on_mount),
				on_update: None,
				on_unmount: Some(on_unmount),
			}),
		}))
	}

	fn write_initial(&self, _: &H, _: &H::Node, _: &Value, _: &mut Applied<H>) -> Result<(), Error> {
		Ok(())
	}
}

struct LifecycleAdapter {
	hook: LifecycleHook,
}

impl<H: Host> Adapter<H> for LifecycleAdapter {
	fn bind(&self, value: &AttrValue<H>) -> Result<Option<Binding<H>>, Error> {
		let hook = match value {
			AttrValue::Hook(hook) => hook.clone(),
			_ => return Err(Error::InvalidLifecycleHandler { hook: self.hook.name() }),
		};
		let call = Box::new(move |_: &H, node: &H::Node, _: &mut Applied<H>| {
			hook(node);
			Ok(())
		}) as BindingHook<H>;
		let bindings = match self.hook {
			LifecycleHook::OnMount => BindingHooks::on_mount(call),
			LifecycleHook::OnUpdate => BindingHooks::on_update(call),
			LifecycleHook::OnUnmount => BindingHooks::on_unmount(call),
		};
		Ok(Some(Binding {
			value: Value::Undefined,
			bindings: Some(bindings),
		}))
	}

	fn write_initial(&self, _: &H, _: &H::Node, _: &Value, _: &mut Applied<H>) -> Result<(), Error> {
		Ok(())
	}
}
