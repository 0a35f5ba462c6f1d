//! Structural descriptions ("specs") and their builder.
//!
//! A [`Spec`] is an immutable description of one element, view or fragment.
//! It is produced fresh by render and content functions and consumed once to materialise live nodes.

use crate::{
	binding::AttrKind,
	value::{Accessor, Key, Value},
	view::ViewClass,
	Error, Host,
};
use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use std::{borrow::Cow, rc::Rc};
use tracing::{error, trace};

pub type EventHandler<H> = Rc<dyn Fn(&<H as Host>::Event)>;
pub type NodeHook<H> = Rc<dyn Fn(&<H as Host>::Node)>;
/// `(item, index, sequence) -> key`
pub type KeyFn = Rc<dyn Fn(&Value, usize, &[Value]) -> Key>;
/// Builds the content of one keyed list item from its item and index accessors.
pub type ItemContent<H> = Rc<dyn Fn(Accessor, Accessor) -> Result<Option<Spec<H>>, Error>>;
/// Builds the content of a switch slot for its current key.
pub type SlotContent<H> = Rc<dyn Fn(&Key) -> Result<Option<Spec<H>>, Error>>;
/// Builds the content of one `SwitchUnion` case from the (narrowed) value accessor.
pub type CaseContent<H> = Rc<dyn Fn(Accessor) -> Result<Option<Spec<H>>, Error>>;
pub type Cases<H> = Rc<[(Rc<str>, CaseContent<H>)]>;

/// An attribute or prop value as passed to [`create_spec`].
///
/// Which variants are accepted depends on the attribute kind; see [`AttrKind`].
pub enum AttrValue<H: Host> {
	/// `null`/`undefined`: no binding at all.
	Absent,
	/// A raw value that is neither frozen nor reactive. Rejected by every attribute kind.
	Literal(Value),
	/// Bound once and never diffed again. See [`constant`].
	Frozen(Value),
	Accessor(Accessor),
	Handler(EventHandler<H>),
	Hook(NodeHook<H>),
	KeyFn(KeyFn),
	ItemContent(ItemContent<H>),
	SlotContent(SlotContent<H>),
	Cases(Cases<H>),
	/// Anything else a custom view wants to receive, retrieved through [`Props::callback`].
	Callback(Rc<dyn Any>),
}

impl<H: Host> AttrValue<H> {
	pub(crate) fn shape(&self) -> &'static str {
		match self {
			Self::Absent => "nothing",
			Self::Literal(_) => "a raw literal",
			Self::Frozen(_) => "a frozen value",
			Self::Accessor(_) => "an accessor",
			Self::Handler(_) => "an event handler",
			Self::Hook(_) => "a node hook",
			Self::KeyFn(_) => "a key function",
			Self::ItemContent(_) => "an item content function",
			Self::SlotContent(_) => "a slot content function",
			Self::Cases(_) => "a case table",
			Self::Callback(_) => "a callback",
		}
	}

	/// Accessor view of frozen and reactive values.
	pub(crate) fn to_accessor(&self) -> Option<Accessor> {
		match self {
			Self::Frozen(value) => {
				let value = value.clone();
				Some(Rc::new(move || value.clone()))
			}
			Self::Accessor(accessor) => Some(accessor.clone()),
			_ => None,
		}
	}
}

impl<H: Host> Clone for AttrValue<H> {
	fn clone(&self) -> Self {
		match self {
			Self::Absent => Self::Absent,
			Self::Literal(value) => Self::Literal(value.clone()),
			Self::Frozen(value) => Self::Frozen(value.clone()),
			Self::Accessor(accessor) => Self::Accessor(accessor.clone()),
			Self::Handler(handler) => Self::Handler(handler.clone()),
			Self::Hook(hook) => Self::Hook(hook.clone()),
			Self::KeyFn(key_fn) => Self::KeyFn(key_fn.clone()),
			Self::ItemContent(content) => Self::ItemContent(content.clone()),
			Self::SlotContent(content) => Self::SlotContent(content.clone()),
			Self::Cases(cases) => Self::Cases(cases.clone()),
			Self::Callback(callback) => Self::Callback(callback.clone()),
		}
	}
}

impl<H: Host> Debug for AttrValue<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
			Self::Frozen(value) => f.debug_tuple("Frozen").field(value).finish(),
			other => f.write_str(other.shape()),
		}
	}
}

impl<H: Host> From<Value> for AttrValue<H> {
	fn from(value: Value) -> Self {
		if value.is_nullish() {
			Self::Absent
		} else {
			Self::Literal(value)
		}
	}
}

impl<H: Host> From<&str> for AttrValue<H> {
	fn from(value: &str) -> Self {
		Self::Literal(value.into())
	}
}

impl<H: Host> From<Accessor> for AttrValue<H> {
	fn from(accessor: Accessor) -> Self {
		Self::Accessor(accessor)
	}
}

impl<H: Host, T: Into<AttrValue<H>>> From<Option<T>> for AttrValue<H> {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Absent, Into::into)
	}
}

/// Freezes a value: the attribute is written once and never updated.
pub fn constant<H: Host>(value: impl Into<Value>) -> AttrValue<H> {
	AttrValue::Frozen(value.into())
}

#[must_use]
pub fn is_constant<H: Host>(value: &AttrValue<H>) -> bool {
	matches!(value, AttrValue::Frozen(_))
}

pub fn reactive<H: Host>(accessor: impl Fn() -> Value + 'static) -> AttrValue<H> {
	AttrValue::Accessor(Rc::new(accessor))
}

pub fn handler<H: Host>(handler: impl Fn(&H::Event) + 'static) -> AttrValue<H> {
	AttrValue::Handler(Rc::new(handler))
}

pub fn hook<H: Host>(hook: impl Fn(&H::Node) + 'static) -> AttrValue<H> {
	AttrValue::Hook(Rc::new(hook))
}

/// What to build: an element by name, a fragment, or a view.
pub enum Tag<H: Host> {
	Element(Rc<str>),
	Fragment,
	View(ViewClass<H>),
}

impl<H: Host> From<&str> for Tag<H> {
	fn from(name: &str) -> Self {
		Self::Element(name.into())
	}
}

impl<H: Host> From<ViewClass<H>> for Tag<H> {
	fn from(class: ViewClass<H>) -> Self {
		Self::View(class)
	}
}

impl<H: Host> From<&ViewClass<H>> for Tag<H> {
	fn from(class: &ViewClass<H>) -> Self {
		Self::View(class.clone())
	}
}

/// One child as passed in, before flattening.
pub enum Child<H: Host> {
	/// `null`/`undefined`. Dropped.
	Empty,
	Spec(Spec<H>),
	Text(Rc<str>),
	/// Text re-evaluated on each update pass.
	Dynamic(Accessor),
	/// Nested arrays, flattened recursively.
	List(Vec<Child<H>>),
}

impl<H: Host> From<Spec<H>> for Child<H> {
	fn from(spec: Spec<H>) -> Self {
		Self::Spec(spec)
	}
}

impl<H: Host> From<&str> for Child<H> {
	fn from(text: &str) -> Self {
		Self::Text(text.into())
	}
}

impl<H: Host> From<String> for Child<H> {
	fn from(text: String) -> Self {
		Self::Text(text.into())
	}
}

impl<H: Host> From<Accessor> for Child<H> {
	fn from(accessor: Accessor) -> Self {
		Self::Dynamic(accessor)
	}
}

impl<H: Host> From<Content<H>> for Child<H> {
	fn from(content: Content<H>) -> Self {
		match content {
			Content::Spec(spec) => Self::Spec(spec),
			Content::Text(text) => Self::Text(text),
			Content::Dynamic(accessor) => Self::Dynamic(accessor),
		}
	}
}

impl<H: Host> From<Children<H>> for Child<H> {
	fn from(children: Children<H>) -> Self {
		match children {
			Children::Single(content) => content.into(),
			Children::Many(contents) => Self::List(contents.iter().cloned().map(Into::into).collect()),
		}
	}
}

impl<H: Host, T: Into<Child<H>>> From<Option<T>> for Child<H> {
	fn from(child: Option<T>) -> Self {
		child.map_or(Self::Empty, Into::into)
	}
}

impl<H: Host, T: Into<Child<H>>> From<Vec<T>> for Child<H> {
	fn from(children: Vec<T>) -> Self {
		Self::List(children.into_iter().map(Into::into).collect())
	}
}

/// A normalised child.
pub enum Content<H: Host> {
	Spec(Spec<H>),
	Text(Rc<str>),
	Dynamic(Accessor),
}

impl<H: Host> Clone for Content<H> {
	fn clone(&self) -> Self {
		match self {
			Self::Spec(spec) => Self::Spec(spec.clone()),
			Self::Text(text) => Self::Text(text.clone()),
			Self::Dynamic(accessor) => Self::Dynamic(accessor.clone()),
		}
	}
}

impl<H: Host> Debug for Content<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Spec(spec) => spec.fmt(f),
			Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Self::Dynamic(_) => f.write_str("Dynamic"),
		}
	}
}

/// The shape of a view's `children` prop. An absent prop means there were no children.
pub enum Children<H: Host> {
	Single(Content<H>),
	Many(Rc<[Content<H>]>),
}

impl<H: Host> Children<H> {
	fn from_flattened(mut contents: Vec<Content<H>>) -> Option<Self> {
		match contents.len() {
			0 => None,
			1 => contents.pop().map(Self::Single),
			_ => Some(Self::Many(contents.into())),
		}
	}

	#[must_use]
	pub fn len(&self) -> usize {
		match self {
			Self::Single(_) => 1,
			Self::Many(contents) => contents.len(),
		}
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl<H: Host> Clone for Children<H> {
	fn clone(&self) -> Self {
		match self {
			Self::Single(content) => Self::Single(content.clone()),
			Self::Many(contents) => Self::Many(contents.clone()),
		}
	}
}

impl<H: Host> Debug for Children<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Single(content) => f.debug_tuple("Single").field(content).finish(),
			Self::Many(contents) => f.debug_tuple("Many").field(contents).finish(),
		}
	}
}

/// Attribute map plus children, as passed to [`create_spec`].
pub struct Attrs<H: Host> {
	entries: Vec<(Rc<str>, AttrValue<H>)>,
	children: Vec<Child<H>>,
}

impl<H: Host> Default for Attrs<H> {
	fn default() -> Self {
		Self::new()
	}
}

impl<H: Host> Attrs<H> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			entries: Vec::new(),
			children: Vec::new(),
		}
	}

	/// Sets an attribute, replacing an earlier one of the same name.
	#[must_use]
	pub fn with(mut self, name: &str, value: impl Into<AttrValue<H>>) -> Self {
		let value = value.into();
		match self.entries.iter_mut().find(|(n, _)| &**n == name) {
			Some(entry) => entry.1 = value,
			None => self.entries.push((name.into(), value)),
		}
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<Child<H>>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn children<C: Into<Child<H>>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
		self.children.extend(children.into_iter().map(Into::into));
		self
	}
}

/// An immutable structural description. Cloning is cheap.
pub struct Spec<H: Host>(Rc<SpecKind<H>>);

pub enum SpecKind<H: Host> {
	Element(ElementSpec<H>),
	View(ViewSpec<H>),
	Fragment(FragmentSpec<H>),
}

pub struct ElementSpec<H: Host> {
	pub(crate) tag: Rc<str>,
	pub(crate) attrs: Vec<ElementAttr<H>>,
	pub(crate) children: Vec<Content<H>>,
}

pub(crate) struct ElementAttr<H: Host> {
	pub(crate) name: Rc<str>,
	pub(crate) kind: AttrKind,
	pub(crate) value: AttrValue<H>,
}

pub struct ViewSpec<H: Host> {
	pub(crate) class: ViewClass<H>,
	pub(crate) props: Props<H>,
}

pub struct FragmentSpec<H: Host> {
	pub(crate) children: Vec<Content<H>>,
}

impl<H: Host> Spec<H> {
	#[must_use]
	pub fn kind(&self) -> &SpecKind<H> {
		&self.0
	}
}

impl<H: Host> Clone for Spec<H> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<H: Host> Debug for Spec<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self.kind() {
			SpecKind::Element(element) => f
				.debug_struct("Element")
				.field("tag", &element.tag)
				.field("attrs", &element.attrs.iter().map(|attr| &*attr.name).collect::<Vec<_>>())
				.field("children", &element.children)
				.finish(),
			SpecKind::View(view) => f.debug_struct("View").field("class", &view.class.name()).finish(),
			SpecKind::Fragment(fragment) => f.debug_struct("Fragment").field("children", &fragment.children).finish(),
		}
	}
}

impl<H: Host> ElementSpec<H> {
	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
		self.attrs.iter().map(|attr| &*attr.name)
	}

	#[must_use]
	pub fn children(&self) -> &[Content<H>] {
		&self.children
	}
}

impl<H: Host> ViewSpec<H> {
	#[must_use]
	pub fn class(&self) -> &ViewClass<H> {
		&self.class
	}

	#[must_use]
	pub fn props(&self) -> &Props<H> {
		&self.props
	}
}

impl<H: Host> FragmentSpec<H> {
	#[must_use]
	pub fn children(&self) -> &[Content<H>] {
		&self.children
	}
}

/// The props of one view instance.
pub struct Props<H: Host> {
	view: Cow<'static, str>,
	entries: Vec<(Rc<str>, AttrValue<H>)>,
	children: Option<Children<H>>,
}

impl<H: Host> Clone for Props<H> {
	fn clone(&self) -> Self {
		Self {
			view: self.view.clone(),
			entries: self.entries.clone(),
			children: self.children.clone(),
		}
	}
}

impl<H: Host> Props<H> {
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&AttrValue<H>> {
		self.entries.iter().find(|(n, _)| &**n == name).map(|(_, value)| value)
	}

	/// The prop's current value. Absent props and non-value props read as [`Value::Undefined`].
	#[must_use]
	pub fn value(&self, name: &str) -> Value {
		match self.get(name) {
			Some(AttrValue::Frozen(value)) => value.clone(),
			Some(AttrValue::Accessor(accessor)) => accessor(),
			_ => Value::Undefined,
		}
	}

	/// The prop as accessor, failing if it is missing.
	pub fn accessor(&self, name: &str) -> Result<Accessor, Error> {
		self.optional_accessor(name)?.ok_or_else(|| self.missing(name))
	}

	pub fn optional_accessor(&self, name: &str) -> Result<Option<Accessor>, Error> {
		match self.get(name) {
			None | Some(AttrValue::Absent) => Ok(None),
			Some(value) => value.to_accessor().map(Some).ok_or_else(|| self.invalid(name, "a frozen value or an accessor")),
		}
	}

	pub fn key_fn(&self, name: &str) -> Result<Option<KeyFn>, Error> {
		match self.get(name) {
			None | Some(AttrValue::Absent) => Ok(None),
			Some(AttrValue::KeyFn(key_fn)) => Ok(Some(key_fn.clone())),
			Some(_) => Err(self.invalid(name, "a key function")),
		}
	}

	pub fn item_content(&self, name: &str) -> Result<ItemContent<H>, Error> {
		match self.get(name) {
			None | Some(AttrValue::Absent) => Err(self.missing(name)),
			Some(AttrValue::ItemContent(content)) => Ok(content.clone()),
			Some(_) => Err(self.invalid(name, "an item content function")),
		}
	}

	pub fn slot_content(&self, name: &str) -> Result<SlotContent<H>, Error> {
		match self.get(name) {
			None | Some(AttrValue::Absent) => Err(self.missing(name)),
			Some(AttrValue::SlotContent(content)) => Ok(content.clone()),
			Some(_) => Err(self.invalid(name, "a slot content function")),
		}
	}

	pub fn cases(&self, name: &str) -> Result<Cases<H>, Error> {
		match self.get(name) {
			None | Some(AttrValue::Absent) => Err(self.missing(name)),
			Some(AttrValue::Cases(cases)) => Ok(cases.clone()),
			Some(_) => Err(self.invalid(name, "a case table")),
		}
	}

	/// Retrieves a [`AttrValue::Callback`] of a concrete type.
	pub fn callback<T: Any>(&self, name: &str) -> Result<Rc<T>, Error> {
		match self.get(name) {
			None | Some(AttrValue::Absent) => Err(self.missing(name)),
			Some(AttrValue::Callback(callback)) => callback
				.clone()
				.downcast::<T>()
				.map_err(|_| self.invalid(name, "a callback of a different type")),
			Some(_) => Err(self.invalid(name, "a callback")),
		}
	}

	#[must_use]
	pub fn children(&self) -> Option<&Children<H>> {
		self.children.as_ref()
	}

	#[must_use]
	pub fn view_name(&self) -> &str {
		&self.view
	}

	fn missing(&self, name: &str) -> Error {
		error!(view = %self.view, prop = name, "Missing required prop");
		Error::MissingProp {
			view: self.view.clone(),
			prop: name.to_owned(),
		}
	}

	fn invalid(&self, name: &str, expected: &'static str) -> Error {
		error!(view = %self.view, prop = name, expected, "Invalid prop");
		Error::InvalidProp {
			view: self.view.clone(),
			prop: name.to_owned(),
			expected,
		}
	}
}

/// Flattens arbitrarily nested children into one ordered sequence, dropping empty ones.
#[must_use]
pub fn flatten_children<H: Host>(children: Vec<Child<H>>) -> Vec<Content<H>> {
	fn flatten_into<H: Host>(children: Vec<Child<H>>, out: &mut Vec<Content<H>>) {
		for child in children {
			match child {
				Child::Empty => (),
				Child::Spec(spec) => out.push(Content::Spec(spec)),
				Child::Text(text) => out.push(Content::Text(text)),
				Child::Dynamic(accessor) => out.push(Content::Dynamic(accessor)),
				Child::List(children) => flatten_into(children, out),
			}
		}
	}

	let mut out = Vec::with_capacity(children.len());
	flatten_into(children, &mut out);
	out
}

fn validate_element_name(name: &str) -> Result<(), Error> {
	if name.is_empty() || name.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '/' | '=' | '"' | '\'')) {
		error!(tag = name, "Invalid element tag");
		return Err(Error::InvalidSpecType(name.to_owned()));
	}
	Ok(())
}

/// Builds and validates one spec.
///
/// - Element and fragment tags receive their flattened children.
/// - View tags receive their children as the `children` prop: absent for none, unwrapped for one, an array otherwise.
///
/// Attribute shapes are validated here, so contract violations surface at construction.
pub fn create_spec<H: Host>(tag: impl Into<Tag<H>>, attrs: Attrs<H>) -> Result<Spec<H>, Error> {
	let Attrs { entries, children } = attrs;
	let children = flatten_children(children);
	let kind = match tag.into() {
		Tag::Element(tag) => {
			validate_element_name(&tag)?;
			let attrs = entries
				.into_iter()
				.map(|(name, value)| {
					let kind = AttrKind::classify(&name);
					kind.validate(&name, &value)?;
					Ok(ElementAttr { name, kind, value })
				})
				.collect::<Result<Vec<_>, Error>>()?;
			trace!(%tag, attrs = attrs.len(), children = children.len(), "Created element spec");
			SpecKind::Element(ElementSpec { tag, attrs, children })
		}
		Tag::Fragment => {
			if let Some((name, _)) = entries.first() {
				error!(attribute = %name, "Fragments take no attributes");
				return Err(Error::InvalidAttribute {
					name: name.to_string(),
					expected: "no attributes on a fragment",
				});
			}
			trace!(children = children.len(), "Created fragment spec");
			SpecKind::Fragment(FragmentSpec { children })
		}
		Tag::View(class) => {
			if let Some((name, _)) = entries.iter().find(|(_, value)| matches!(value, AttrValue::Literal(_))) {
				error!(view = %class.name(), prop = %name, "Raw literal passed as prop");
				return Err(Error::NonReactiveAttribute { name: name.to_string() });
			}
			trace!(view = %class.name(), props = entries.len(), children = children.len(), "Created view spec");
			SpecKind::View(ViewSpec {
				props: Props {
					view: class.name_cow(),
					entries,
					children: Children::from_flattened(children),
				},
				class,
			})
		}
	};
	Ok(Spec(Rc::new(kind)))
}
