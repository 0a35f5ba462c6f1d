//! `Switch` and `SwitchUnion`: at most one live child, selected by key.

use crate::{
	element::{materialize, Live},
	lifecycle::{mount, unmount, Context, UpdatePass},
	spec::{create_spec, AttrValue, Attrs, CaseContent, Cases, Props, SlotContent, Spec},
	value::{Accessor, Key, Value},
	view::{ClassKind, ViewClass},
	Error, Host,
};
use std::{mem, rc::Rc};
use tracing::{error, trace, trace_span};

/// The built-in single-slot view.
///
/// Props: `key` (accessor) and `children` (a [`SlotContent`] function).
/// The content function is called only when the key changes, and never for a `null`/`undefined` key,
/// which renders a placeholder instead.
pub struct Switch;

impl Switch {
	#[must_use]
	pub fn class<H: Host>() -> ViewClass<H> {
		ViewClass::builtin("Switch", ClassKind::Switch)
	}

	pub fn spec<H: Host>(key: Accessor, content: impl Fn(&Key) -> Result<Option<Spec<H>>, Error> + 'static) -> Result<Spec<H>, Error> {
		create_spec(
			Self::class(),
			Attrs::new().with("key", key).with("children", AttrValue::SlotContent(Rc::new(content))),
		)
	}
}

/// A [`Switch`] over a tagged value.
///
/// Props: `value` (accessor), `field` (optional, names the discriminant field of an object value; without it the value
/// itself must be a string) and `cases` (a [`Cases`] table from discriminant to content).
/// Each case function receives the `value` accessor.
pub struct SwitchUnion;

impl SwitchUnion {
	#[must_use]
	pub fn class<H: Host>() -> ViewClass<H> {
		ViewClass::builtin("SwitchUnion", ClassKind::SwitchUnion)
	}

	pub fn spec<'a, H: Host>(value: Accessor, field: Option<&str>, cases: impl IntoIterator<Item = (&'a str, CaseContent<H>)>) -> Result<Spec<H>, Error> {
		let cases: Cases<H> = cases.into_iter().map(|(name, content)| (Rc::from(name), content)).collect();
		create_spec(
			Self::class(),
			Attrs::new()
				.with("value", value)
				.with("field", field.map(|field| AttrValue::Frozen(field.into())))
				.with("cases", AttrValue::Cases(cases)),
		)
	}
}

pub(crate) enum Selector<H: Host> {
	Key {
		key: Accessor,
		content: SlotContent<H>,
	},
	Union {
		value: Accessor,
		field: Option<Rc<str>>,
		cases: Cases<H>,
	},
}

impl<H: Host> Selector<H> {
	pub(crate) fn switch(props: &Props<H>) -> Result<Self, Error> {
		Ok(Self::Key {
			key: props.accessor("key")?,
			content: props.slot_content("children")?,
		})
	}

	pub(crate) fn union(props: &Props<H>) -> Result<Self, Error> {
		let field = match props.value("field") {
			Value::Undefined | Value::Null => None,
			Value::String(field) => Some(field),
			other => {
				error!(found = other.type_name(), "`field` is not a string");
				return Err(Error::InvalidProp {
					view: props.view_name().to_owned().into(),
					prop: "field".to_owned(),
					expected: "a string",
				});
			}
		};
		Ok(Self::Union {
			value: props.accessor("value")?,
			field,
			cases: props.cases("cases")?,
		})
	}

	/// The current key, along with the value it was derived from.
	fn key(&self) -> Result<(Option<Key>, Value), Error> {
		match self {
			Self::Key { key, .. } => {
				let value = key();
				Ok((Key::of_switch_value(&value), value))
			}
			Self::Union { value, field, .. } => {
				let value = value();
				let discriminant = match field {
					Some(field) => value.get(field).cloned().unwrap_or_default(),
					None => value,
				};
				match discriminant {
					Value::Undefined | Value::Null => Ok((None, discriminant)),
					Value::String(name) => Ok((Some(Key::String(name.clone())), Value::String(name))),
					other => {
						error!(found = other.type_name(), "Discriminant is not a string");
						Err(Error::UnknownCase(other.to_string()))
					}
				}
			}
		}
	}

	fn content(&self, host: &H, key: Option<&Key>) -> Result<Live<H>, Error> {
		let spec = match (self, key) {
			(_, None) => None,
			(Self::Key { content, .. }, Some(key)) => content(key)?,
			(Self::Union { value, cases, .. }, Some(key)) => {
				let case = match key {
					Key::String(name) => cases.iter().find(|(case, _)| case == name),
					_ => None,
				};
				match case {
					Some((_, content)) => content(value.clone())?,
					None => {
						error!(%key, "Unknown case");
						return Err(Error::UnknownCase(match key {
							Key::String(name) => name.to_string(),
							other => other.to_string(),
						}));
					}
				}
			}
		};
		match spec {
			Some(spec) => materialize(host, &spec),
			None => Ok(Live::placeholder(host)),
		}
	}
}

pub(crate) struct Slot<H: Host> {
	selector: Selector<H>,
	current: Option<Key>,
	/// Keeps an identity-keyed value alive, so that its address can't be reused while `current` refers to it.
	_source: Value,
	/// Set while content failed to attach: the anchor it should have been mounted before.
	/// The next pass rebuilds the slot regardless of its key.
	detached: Option<Option<H::Node>>,
	pub(crate) live: Live<H>,
}

impl<H: Host> Slot<H> {
	pub(crate) fn construct(host: &H, selector: Selector<H>) -> Result<Self, Error> {
		let (current, source) = selector.key()?;
		let live = selector.content(host, current.as_ref())?;
		Ok(Self {
			selector,
			current,
			_source: source,
			detached: None,
			live,
		})
	}

	pub(crate) fn update(&mut self, cx: &Context<'_, H>, parent: &H::Node, pass: &mut UpdatePass<H>) -> Result<(), Error> {
		let (key, source) = self.selector.key()?;
		if key == self.current && self.detached.is_none() {
			self._source = source;
			return self.live.update(cx, parent, pass);
		}

		let span = trace_span!("switch", from = ?self.current, to = ?key);
		let _enter = span.enter();
		let end = match &self.detached {
			Some(anchor) => anchor.clone(),
			None => self.live.last_node().and_then(|node| cx.host.next_sibling(node)),
		};
		let next = self.selector.content(cx.host, key.as_ref())?;
		let mut previous = mem::replace(&mut self.live, next);
		self.current = key;
		self._source = source;
		self.detached = None;

		let unmounted = unmount(cx, &mut previous);
		trace!("Unmounted previous content");
		let mounted = mount(cx, &mut self.live, parent, end.as_ref());
		if mounted.is_err() {
			self.detached = Some(end);
		}
		unmounted.and(mounted)
	}
}
