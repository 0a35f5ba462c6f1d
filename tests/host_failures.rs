//! Host operations that fail halfway through an update pass.

use cambium::{
	accessor, create_spec,
	host::NativeCallback,
	memory::{ListenerId, MemoryEvent, MemoryHost, NodeId},
	Attrs, Error, For, Host, Key, Mounted, Renderer, Spec, Static, Switch, Value, ViewClass,
};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

/// A [`MemoryHost`] that refuses one `insert_before` call after a given number of successful ones.
#[derive(Clone, Default)]
struct Flaky {
	inner: MemoryHost,
	budget: Rc<Cell<Option<usize>>>,
}

impl Flaky {
	fn refuse_after(&self, successes: usize) {
		self.budget.set(Some(successes));
	}
}

impl Host for Flaky {
	type Node = NodeId;
	type Event = MemoryEvent;
	type Listener = ListenerId;

	fn create_element(&self, tag: &str) -> Result<NodeId, Error> {
		self.inner.create_element(tag)
	}
	fn create_text(&self, text: &str) -> NodeId {
		self.inner.create_text(text)
	}
	fn set_text(&self, node: &NodeId, text: &str) {
		self.inner.set_text(node, text)
	}
	fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), Error> {
		self.inner.set_attribute(node, name, value)
	}
	fn remove_attribute(&self, node: &NodeId, name: &str) -> Result<(), Error> {
		self.inner.remove_attribute(node, name)
	}
	fn insert_before(&self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) -> Result<(), Error> {
		match self.budget.get() {
			Some(0) => {
				self.budget.set(None);
				return Err(Error::host("insert_before", "refused"));
			}
			Some(remaining) => self.budget.set(Some(remaining - 1)),
			None => (),
		}
		self.inner.insert_before(parent, node, reference)
	}
	fn remove(&self, node: &NodeId) -> Result<(), Error> {
		self.inner.remove(node)
	}
	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		self.inner.next_sibling(node)
	}
	fn is_container(&self, node: &NodeId) -> bool {
		self.inner.is_container(node)
	}
	fn class_add(&self, node: &NodeId, token: &str) -> Result<(), Error> {
		self.inner.class_add(node, token)
	}
	fn class_remove(&self, node: &NodeId, token: &str) -> Result<(), Error> {
		self.inner.class_remove(node, token)
	}
	fn class_tokens(&self, node: &NodeId) -> Vec<String> {
		self.inner.class_tokens(node)
	}
	fn add_listener(&self, node: &NodeId, event: &str, callback: NativeCallback<MemoryEvent>) -> Result<ListenerId, Error> {
		self.inner.add_listener(node, event, callback)
	}
	fn remove_listener(&self, node: &NodeId, listener: ListenerId) {
		self.inner.remove_listener(node, listener)
	}
}

fn mount(spec: Spec<Flaky>) -> (Flaky, NodeId, Mounted<Flaky>) {
	let class = ViewClass::new("Fallible", move |_| Ok(Static::new(Some(spec.clone()))));
	let host = Flaky::default();
	let body = host.inner.create_container("body");
	let mounted = Renderer::new(host.clone()).mount_to_node(&class, &body, Attrs::new()).unwrap();
	let section = host.inner.children(&body)[0];
	(host, section, mounted)
}

fn cell(initial: Value) -> (Rc<RefCell<Value>>, cambium::Accessor) {
	let cell = Rc::new(RefCell::new(initial));
	let read = cell.clone();
	(cell, accessor(move || read.borrow().clone()))
}

#[test]
fn keyed_list_recovers_from_a_failed_move() {
	let (items, each) = cell(Value::array([1, 2, 3].map(Value::from)));
	let calls = Rc::new(RefCell::new(Vec::new()));
	let list = For::spec(each, None, {
		let calls = calls.clone();
		move |item: cambium::Accessor, _| {
			calls.borrow_mut().push(item().to_string());
			create_spec("li", Attrs::new().child(item)).map(Some)
		}
	})
	.unwrap();
	let (host, ul, mounted) = mount(create_spec("ul", Attrs::new().child(list).child("end")).unwrap());
	let before = host.inner.children(&ul);

	*items.borrow_mut() = Value::array([3, 2, 1, 4].map(Value::from));
	// The new item's text goes in first, then placement starts.
	host.refuse_after(1);
	assert!(matches!(mounted.update(), Err(Error::Host { operation: "insert_before", .. })));

	mounted.update().unwrap();
	assert_eq!(host.inner.inner_html(&ul), "<li>3</li><li>2</li><li>1</li><li>4</li>end");
	assert_eq!(*calls.borrow(), ["1", "2", "3", "4"]);
	let after = host.inner.children(&ul);
	assert_eq!(after[..3], [before[2], before[1], before[0]]);

	*items.borrow_mut() = Value::array([4].map(Value::from));
	mounted.update().unwrap();
	assert_eq!(host.inner.inner_html(&ul), "<li>4</li>end");
	assert_eq!(after[3], host.inner.children(&ul)[0]);
}

#[test]
fn switch_recovers_from_a_failed_mount() {
	let (key, key_accessor) = cell(Value::from(1));
	let calls = Rc::new(Cell::new(0));
	let slot = Switch::spec(key_accessor, {
		let calls = calls.clone();
		move |key: &Key| {
			calls.set(calls.get() + 1);
			create_spec("i", Attrs::new().child(key.to_string())).map(Some)
		}
	})
	.unwrap();
	let (host, section, mounted) = mount(create_spec("section", Attrs::new().child("[").child(slot).child("]")).unwrap());
	assert_eq!(host.inner.inner_html(&section), "[<i>1</i>]");

	*key.borrow_mut() = Value::from(2);
	host.refuse_after(1);
	assert!(mounted.update().is_err());
	assert_eq!(host.inner.inner_html(&section), "[]");

	mounted.update().unwrap();
	assert_eq!(host.inner.inner_html(&section), "[<i>2</i>]");
	assert_eq!(calls.get(), 3);

	mounted.update().unwrap();
	assert_eq!(calls.get(), 3);
}
