//! Dynamically typed attribute and prop values, list keys and accessors.

use core::{
	fmt::{self, Display, Formatter},
	hash::Hash,
};
use std::rc::Rc;

/// A resolved attribute, prop or item value.
///
/// Arrays and objects are reference-counted; cloning a [`Value`] is always cheap.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
	#[default]
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(Rc<str>),
	Array(Rc<[Value]>),
	/// Ordered field list. Field order is significant for style maps.
	Object(Rc<[(Rc<str>, Value)]>),
}

impl Value {
	pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
		Self::Array(items.into_iter().collect())
	}

	pub fn object<K: Into<Rc<str>>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
		Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
	}

	#[must_use]
	pub fn is_nullish(&self) -> bool {
		matches!(self, Self::Undefined | Self::Null)
	}

	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Undefined | Self::Null => false,
			Self::Bool(b) => *b,
			Self::Number(n) => *n != 0.0 && !n.is_nan(),
			Self::String(s) => !s.is_empty(),
			Self::Array(_) | Self::Object(_) => true,
		}
	}

	/// A short name of this value's shape, for error messages.
	#[must_use]
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Undefined => "undefined",
			Self::Null => "null",
			Self::Bool(_) => "a boolean",
			Self::Number(_) => "a number",
			Self::String(_) => "a string",
			Self::Array(_) => "an array",
			Self::Object(_) => "an object",
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(&**s),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_array(&self) -> Option<&Rc<[Value]>> {
		match self {
			Self::Array(items) => Some(items),
			_ => None,
		}
	}

	/// Looks up an object field. Anything that isn't an object has no fields.
	#[must_use]
	pub fn get(&self, field: &str) -> Option<&Value> {
		match self {
			Self::Object(fields) => fields.iter().find(|(k, _)| &**k == field).map(|(_, v)| v),
			_ => None,
		}
	}

	/// The string written to a host attribute, or [`None`] if the attribute should be removed instead.
	#[must_use]
	pub fn to_attribute(&self) -> Option<String> {
		if self.is_nullish() {
			None
		} else {
			Some(self.to_string())
		}
	}
}

/// Script-style stringification. Nullish values display as their names.
impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Undefined => f.write_str("undefined"),
			Self::Null => f.write_str("null"),
			Self::Bool(b) => write!(f, "{}", b),
			Self::Number(n) => f.write_str(&format_number(*n)),
			Self::String(s) => f.write_str(s),
			Self::Array(items) => {
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(",")?;
					}
					if !item.is_nullish() {
						write!(f, "{}", item)?;
					}
				}
				Ok(())
			}
			Self::Object(_) => f.write_str("[object Object]"),
		}
	}
}

pub(crate) fn format_number(n: f64) -> String {
	if n.is_nan() {
		"NaN".to_owned()
	} else if n.is_infinite() {
		let infinity = if n > 0.0 { "Infinity" } else { "-Infinity" };
		infinity.to_owned()
	} else if n == n.trunc() && n.abs() < 1e15 {
		#[allow(clippy::cast_possible_truncation)]
		let integer = n as i64;
		integer.to_string()
	} else {
		n.to_string()
	}
}

#[allow(clippy::cast_precision_loss)]
mod conversions {
	use super::Value;
	use std::rc::Rc;

	macro_rules! value_from {
		($($t:ty => |$v:ident| $e:expr),+ $(,)?) => {$(
			impl From<$t> for Value {
				fn from($v: $t) -> Self {
					$e
				}
			}
		)+};
	}

	value_from! {
		bool => |v| Self::Bool(v),
		f64 => |v| Self::Number(v),
		i32 => |v| Self::Number(v.into()),
		u32 => |v| Self::Number(v.into()),
		i64 => |v| Self::Number(v as f64),
		usize => |v| Self::Number(v as f64),
		&str => |v| Self::String(v.into()),
		String => |v| Self::String(v.into()),
		Rc<str> => |v| Self::String(v),
		Vec<Value> => |v| Self::Array(v.into()),
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map_or(Self::Undefined, Into::into)
	}
}

/// A zero-argument function re-invoked on every update pass.
pub type Accessor = Rc<dyn Fn() -> Value>;

pub fn accessor(f: impl Fn() -> Value + 'static) -> Accessor {
	Rc::new(f)
}

/// Identifies one item of a keyed list or the content of a switch slot.
///
/// Keys are typed: `Key::from(1)` and `Key::from("1")` are different keys.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
	Undefined,
	Null,
	Bool(bool),
	/// Normalised bit pattern of an `f64` (see [`Key::number`]).
	Number(u64),
	String(Rc<str>),
	/// Reference identity of an array or object value.
	Identity(usize),
}

impl Key {
	/// `-0.0` and `0.0` share a key, as do all NaNs.
	#[must_use]
	pub fn number(n: f64) -> Self {
		let n = if n == 0.0 {
			0.0
		} else if n.is_nan() {
			f64::NAN
		} else {
			n
		};
		Self::Number(n.to_bits())
	}

	/// Keys a value by identity: primitives by value, arrays and objects by reference.
	#[must_use]
	pub fn of_value(value: &Value) -> Self {
		match value {
			Value::Undefined => Self::Undefined,
			Value::Null => Self::Null,
			Value::Bool(b) => Self::Bool(*b),
			Value::Number(n) => Self::number(*n),
			Value::String(s) => Self::String(s.clone()),
			Value::Array(items) => Self::Identity(Rc::as_ptr(items).cast::<()>() as usize),
			Value::Object(fields) => Self::Identity(Rc::as_ptr(fields).cast::<()>() as usize),
		}
	}

	/// Like [`Key::of_value`], but nullish values produce no key at all.
	#[must_use]
	pub fn of_switch_value(value: &Value) -> Option<Self> {
		if value.is_nullish() {
			None
		} else {
			Some(Self::of_value(value))
		}
	}
}

impl Display for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Undefined => f.write_str("undefined"),
			Self::Null => f.write_str("null"),
			Self::Bool(b) => write!(f, "{}", b),
			Self::Number(bits) => f.write_str(&format_number(f64::from_bits(*bits))),
			Self::String(s) => write!(f, "{:?}", s),
			Self::Identity(address) => write!(f, "<object {:#x}>", address),
		}
	}
}

impl fmt::Debug for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Key({})", self)
	}
}

impl From<bool> for Key {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<f64> for Key {
	fn from(n: f64) -> Self {
		Self::number(n)
	}
}

impl From<i32> for Key {
	fn from(n: i32) -> Self {
		Self::number(n.into())
	}
}

impl From<usize> for Key {
	#[allow(clippy::cast_precision_loss)]
	fn from(n: usize) -> Self {
		Self::number(n as f64)
	}
}

impl From<&str> for Key {
	fn from(s: &str) -> Self {
		Self::String(s.into())
	}
}

impl From<String> for Key {
	fn from(s: String) -> Self {
		Self::String(s.into())
	}
}
