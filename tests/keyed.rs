use cambium::{
	accessor, create_spec, hook,
	memory::{MemoryHost, Mutation, NodeId},
	spec::KeyFn,
	Accessor, Attrs, Error, For, Key, Mounted, Renderer, Spec, Static, Value, ViewClass,
};
use proptest::prelude::*;
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

type H = MemoryHost;
type Calls = Rc<RefCell<Vec<String>>>;

struct Fixture {
	host: MemoryHost,
	ul: NodeId,
	mounted: Mounted<H>,
	items: Rc<RefCell<Value>>,
	calls: Calls,
}

impl Fixture {
	fn set(&self, items: Value) -> Result<(), Error> {
		*self.items.borrow_mut() = items;
		self.mounted.update()
	}

	fn lis(&self) -> Vec<NodeId> {
		self.host.children(&self.ul)
	}

	fn html(&self) -> String {
		self.host.inner_html(&self.ul)
	}

	fn take_calls(&self) -> Vec<String> {
		self.calls.borrow_mut().drain(..).collect()
	}
}

fn mount(spec: Spec<H>) -> Result<(MemoryHost, NodeId, Mounted<H>), Error> {
	let class = ViewClass::new("List", move |_| Ok(Static::new(Some(spec.clone()))));
	let host = MemoryHost::new();
	let body = host.create_container("body");
	let mounted = Renderer::new(host.clone()).mount_to_node(&class, &body, Attrs::new())?;
	let ul = host.children(&body)[0];
	Ok((host, ul, mounted))
}

fn items_spec(items: &Rc<RefCell<Value>>, key: Option<KeyFn>, calls: &Calls, before: Option<&str>) -> Spec<H> {
	let (items, calls) = (items.clone(), calls.clone());
	let list = For::spec(accessor(move || items.borrow().clone()), key, move |item: Accessor, _index| {
		calls.borrow_mut().push(item().to_string());
		create_spec("li", Attrs::new().child(item)).map(Some)
	})
	.unwrap();
	create_spec("ul", Attrs::new().child(before).child(list).child(before.map(|_| "after"))).unwrap()
}

fn fixture(initial: Value, key: Option<KeyFn>) -> Result<Fixture, Error> {
	let items = Rc::new(RefCell::new(initial));
	let calls = Calls::default();
	let (host, ul, mounted) = mount(items_spec(&items, key, &calls, None))?;
	Ok(Fixture {
		host,
		ul,
		mounted,
		items,
		calls,
	})
}

fn numbers(values: &[i32]) -> Value {
	Value::array(values.iter().copied().map(Value::from))
}

#[test]
fn appending_keeps_existing_items() {
	let list = fixture(numbers(&[1, 2, 4]), None).unwrap();
	assert_eq!(list.take_calls(), ["1", "2", "4"]);
	let before = list.lis();
	list.host.clear_mutations();

	list.set(numbers(&[1, 2, 4, 3])).unwrap();

	assert_eq!(list.take_calls(), ["3"]);
	assert_eq!(list.html(), "<li>1</li><li>2</li><li>4</li><li>3</li>");
	assert_eq!(list.lis()[..3], before[..]);
	assert!(!list.host.mutations().iter().any(|mutation| matches!(mutation, Mutation::Remove(_))));
	assert_eq!(list.host.created_count(), 2, "one `li` and its text");
}

#[test]
fn numbers_and_strings_are_distinct_keys() {
	let list = fixture(Value::array([Value::from(1), Value::from("1")]), None).unwrap();
	let [number, string]: [NodeId; 2] = list.lis().try_into().unwrap();
	list.take_calls();
	list.host.clear_mutations();

	list.set(Value::array([Value::from("1"), Value::from(1)])).unwrap();

	assert_eq!(list.lis(), [string, number]);
	assert!(list.take_calls().is_empty());
	assert_eq!(list.host.created_count(), 0);
	assert!(list.host.mutations().iter().all(|mutation| matches!(mutation, Mutation::Insert { .. })));
}

#[test]
fn removal_unmounts_and_detaches() {
	let unmounted = Rc::new(Cell::new(0));
	let items = Rc::new(RefCell::new(numbers(&[1, 2, 3])));
	let list = {
		let (items, unmounted) = (items.clone(), unmounted.clone());
		For::spec(accessor(move || items.borrow().clone()), None, move |item, _| {
			let unmounted = unmounted.clone();
			create_spec(
				"li",
				Attrs::new().with("onUnmount", hook::<H>(move |_| unmounted.set(unmounted.get() + 1))).child(item),
			)
			.map(Some)
		})
		.unwrap()
	};
	let (host, ul, mounted) = mount(create_spec("ul", Attrs::new().child(list)).unwrap()).unwrap();

	*items.borrow_mut() = numbers(&[3, 1]);
	mounted.update().unwrap();
	assert_eq!(unmounted.get(), 1);
	assert_eq!(host.inner_html(&ul), "<li>3</li><li>1</li>");
}

#[test]
fn item_accessors_freeze_once_removed() {
	let items = Rc::new(RefCell::new(Value::array(["a", "b", "c"].map(Value::from))));
	let seen: Rc<RefCell<Vec<(Accessor, Accessor)>>> = Rc::default();
	let list = {
		let (items, seen) = (items.clone(), seen.clone());
		For::spec(accessor(move || items.borrow().clone()), None, move |item, index| {
			seen.borrow_mut().push((item, index));
			Ok(None)
		})
		.unwrap()
	};
	let (_host, _ul, mounted) = mount(create_spec("ul", Attrs::new().child(list)).unwrap()).unwrap();
	let read = |at: usize| {
		let seen = seen.borrow();
		let (item, index) = &seen[at];
		(item().to_string(), index())
	};

	*items.borrow_mut() = Value::array(["c", "a"].map(Value::from));
	mounted.update().unwrap();
	assert_eq!(read(0), ("a".to_owned(), Value::from(1)));
	assert_eq!(read(1), ("b".to_owned(), Value::from(1)));
	assert_eq!(read(2), ("c".to_owned(), Value::from(0)));

	*items.borrow_mut() = Value::array([]);
	mounted.update().unwrap();
	assert_eq!(read(0), ("a".to_owned(), Value::from(1)));
	assert_eq!(read(2), ("c".to_owned(), Value::from(0)));
}

#[test]
fn duplicate_keys_are_rejected() {
	assert!(matches!(fixture(numbers(&[1, 2, 1]), None), Err(Error::DuplicateKey(key)) if key == "1"));

	let list = fixture(numbers(&[1, 2]), None).unwrap();
	assert_eq!(list.set(numbers(&[2, 2])), Err(Error::DuplicateKey("2".to_owned())));
}

#[test]
fn key_function_collisions_are_rejected() {
	let parity: KeyFn = Rc::new(|item: &Value, _: usize, _: &[Value]| Key::from(matches!(item, Value::Number(n) if n % 2.0 == 0.0)));
	assert!(matches!(fixture(numbers(&[1, 2]), Some(parity.clone())), Ok(_)));
	assert!(matches!(fixture(numbers(&[1, 3]), Some(parity)), Err(Error::DuplicateKey(_))));
}

#[test]
fn non_arrays_are_rejected() {
	assert!(matches!(fixture(Value::from("abc"), None), Err(Error::NotASequence("a string"))));
}

#[test]
fn empty_list_keeps_a_placeholder() {
	let list = fixture(Value::array([]), None).unwrap();
	assert_eq!(list.lis().len(), 1);
	assert_eq!(list.html(), "");

	list.set(numbers(&[7])).unwrap();
	assert_eq!(list.lis().len(), 1);
	assert_eq!(list.html(), "<li>7</li>");

	list.set(Value::array([])).unwrap();
	assert_eq!(list.lis().len(), 1);
	assert_eq!(list.host.text(&list.lis()[0]).as_deref(), Some(""));
}

#[test]
fn items_stay_between_siblings() {
	let items = Rc::new(RefCell::new(numbers(&[1])));
	let calls = Calls::default();
	let (host, ul, mounted) = mount(items_spec(&items, None, &calls, Some("before"))).unwrap();
	assert_eq!(host.inner_html(&ul), "before<li>1</li>after");

	*items.borrow_mut() = numbers(&[0, 1, 2]);
	mounted.update().unwrap();
	assert_eq!(host.inner_html(&ul), "before<li>0</li><li>1</li><li>2</li>after");

	*items.borrow_mut() = Value::array([]);
	mounted.update().unwrap();
	assert_eq!(host.inner_html(&ul), "beforeafter");

	*items.borrow_mut() = numbers(&[3]);
	mounted.update().unwrap();
	assert_eq!(host.inner_html(&ul), "before<li>3</li>after");
}

#[test]
fn objects_are_keyed_by_identity() {
	let shared = Value::object([("id", Value::from(1))]);
	let twin = Value::object([("id", Value::from(1))]);
	let list = fixture(Value::array([shared.clone()]), None).unwrap();
	let first = list.lis();
	list.take_calls();

	list.set(Value::array([twin, shared])).unwrap();
	assert_eq!(list.take_calls().len(), 1);
	assert_eq!(list.lis()[1], first[0]);
}

proptest! {
	#[test]
	fn permutations_move_instead_of_recreating(order in Just((0..8).collect::<Vec<i32>>()).prop_shuffle()) {
		let list = fixture(numbers(&[0, 1, 2, 3, 4, 5, 6, 7]), None).unwrap();
		let nodes = list.lis();
		list.take_calls();
		list.host.clear_mutations();

		list.set(numbers(&order)).unwrap();

		prop_assert!(list.take_calls().is_empty());
		prop_assert_eq!(list.host.created_count(), 0);
		let expected: Vec<NodeId> = order.iter().map(|&index| nodes[index as usize]).collect();
		prop_assert_eq!(list.lis(), expected);
		let only_inserts = list.host.mutations().iter().all(|mutation| matches!(mutation, Mutation::Insert { .. }));
		prop_assert!(only_inserts);
	}
}
