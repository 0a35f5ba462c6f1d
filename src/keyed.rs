//! `For`: keyed reconciliation of a dynamic list.

use crate::{
	diagnostics::Warning,
	element::{materialize, Live},
	lifecycle::{unmount, Context, UpdatePass},
	spec::{create_spec, AttrValue, Attrs, ItemContent, KeyFn, Props, Spec},
	value::{Accessor, Key, Value},
	view::{ClassKind, ViewClass},
	Error, Host,
};
use hashbrown::{HashMap, HashSet};
use std::{cell::RefCell, mem, rc::Rc};
use tracing::{error, trace, trace_span};

/// The built-in keyed list view.
///
/// Props:
///
/// - `each`: accessor returning an array.
/// - `key` (optional): a [`KeyFn`]. Without it, items are keyed by identity (see [`Key::of_value`]).
/// - `children`: an [`ItemContent`] function, called once per new key with the item and index accessors.
///
/// The item and index accessors track the item's current value and position while its key is present.
/// Once the key was removed, they keep returning the last values seen.
pub struct For;

impl For {
	#[must_use]
	pub fn class<H: Host>() -> ViewClass<H> {
		ViewClass::builtin("For", ClassKind::For)
	}

	pub fn spec<H: Host>(
		each: Accessor,
		key: Option<KeyFn>,
		content: impl Fn(Accessor, Accessor) -> Result<Option<Spec<H>>, Error> + 'static,
	) -> Result<Spec<H>, Error> {
		create_spec(
			Self::class(),
			Attrs::new()
				.with("each", each)
				.with("key", key.map(AttrValue::KeyFn))
				.with("children", AttrValue::ItemContent(Rc::new(content))),
		)
	}
}

struct ItemCell {
	item: Value,
	index: usize,
}

pub(crate) struct Item<H: Host> {
	key: Key,
	cell: Rc<RefCell<ItemCell>>,
	/// Created by an update pass that didn't reach its on- and did-phases yet.
	pending: bool,
	pub(crate) live: Live<H>,
}

pub(crate) struct KeyedList<H: Host> {
	each: Accessor,
	key: Option<KeyFn>,
	content: ItemContent<H>,
	pub(crate) items: Vec<Item<H>>,
	/// Present exactly while `items` is empty.
	placeholder: Option<H::Node>,
	/// Set while the host order may not match `items`, after a failed pass: the anchor that pass placed before.
	misplaced: Option<Option<H::Node>>,
}

fn new_item<H: Host>(host: &H, content: &ItemContent<H>, key: Key, item: Value, index: usize, pending: bool) -> Result<Item<H>, Error> {
	trace!(%key, index, "Creating item");
	let cell = Rc::new(RefCell::new(ItemCell { item, index }));
	let item_accessor: Accessor = {
		let cell = cell.clone();
		Rc::new(move || cell.borrow().item.clone())
	};
	let index_accessor: Accessor = {
		let cell = cell.clone();
		Rc::new(move || Value::from(cell.borrow().index))
	};
	let live = match content(item_accessor, index_accessor)? {
		Some(spec) => materialize(host, &spec)?,
		None => Live::placeholder(host),
	};
	Ok(Item {
		key,
		cell,
		pending,
		live,
	})
}

impl<H: Host> KeyedList<H> {
	pub(crate) fn construct(host: &H, props: &Props<H>) -> Result<Self, Error> {
		let mut list = Self {
			each: props.accessor("each")?,
			key: props.key_fn("key")?,
			content: props.item_content("children")?,
			items: Vec::new(),
			placeholder: None,
			misplaced: None,
		};
		let sequence = list.sequence()?;
		let keys = list.keys(&sequence)?;
		for (index, (key, item)) in keys.into_iter().zip(sequence.iter()).enumerate() {
			let item = new_item(host, &list.content, key, item.clone(), index, false)?;
			list.items.push(item);
		}
		if list.items.is_empty() {
			list.placeholder = Some(host.create_text(""));
		}
		Ok(list)
	}

	fn sequence(&self) -> Result<Rc<[Value]>, Error> {
		match (self.each)() {
			Value::Array(items) => Ok(items),
			other => {
				error!(found = other.type_name(), "`each` did not return an array");
				Err(Error::NotASequence(other.type_name()))
			}
		}
	}

	fn keys(&self, sequence: &[Value]) -> Result<Vec<Key>, Error> {
		let mut seen = HashSet::with_capacity(sequence.len());
		sequence
			.iter()
			.enumerate()
			.map(|(index, item)| {
				let key = match &self.key {
					Some(key_fn) => key_fn(item, index, sequence),
					None => Key::of_value(item),
				};
				if !seen.insert(key.clone()) {
					error!(%key, index, "Duplicate key");
					return Err(Error::DuplicateKey(key.to_string()));
				}
				Ok(key)
			})
			.collect()
	}

	pub(crate) fn first_node(&self) -> Option<&H::Node> {
		match &self.placeholder {
			Some(placeholder) => Some(placeholder),
			None => self.items.iter().find_map(|item| item.live.first_node()),
		}
	}

	pub(crate) fn last_node(&self) -> Option<&H::Node> {
		match &self.placeholder {
			Some(placeholder) => Some(placeholder),
			None => self.items.iter().rev().find_map(|item| item.live.last_node()),
		}
	}

	pub(crate) fn collect_roots(&self, out: &mut Vec<H::Node>) {
		if let Some(placeholder) = &self.placeholder {
			out.push(placeholder.clone());
		}
		for item in &self.items {
			item.live.collect_roots(out);
		}
	}

	/// Reconciles against the current sequence, then updates the surviving items.
	///
	/// New items are materialised before anything attached is touched, so a failing content function leaves the
	/// list as it was. `items` always describes every item that may still be attached. If a host operation fails
	/// midway, the next pass re-inserts all items instead of only the moved ones.
	pub(crate) fn update(&mut self, cx: &Context<'_, H>, parent: &H::Node, pass: &mut UpdatePass<H>) -> Result<(), Error> {
		let span = trace_span!("For::update");
		let _enter = span.enter();

		let end = match &self.misplaced {
			Some(anchor) => anchor.clone(),
			None => self.last_node().and_then(|node| cx.host.next_sibling(node)),
		};
		let sequence = self.sequence()?;
		let keys = self.keys(&sequence)?;

		let mut fresh = Vec::new();
		{
			let existing: HashSet<&Key> = self.items.iter().map(|item| &item.key).collect();
			for (index, (key, item)) in keys.iter().zip(sequence.iter()).enumerate() {
				if !existing.contains(key) {
					fresh.push(new_item(cx.host, &self.content, key.clone(), item.clone(), index, true)?);
				}
			}
		}

		let kept: HashSet<&Key> = keys.iter().collect();
		let (survivors, removed): (Vec<_>, Vec<_>) = mem::take(&mut self.items).into_iter().partition(|item| kept.contains(&item.key));
		self.items = survivors;
		let mut unmounted = Ok(());
		for mut item in removed {
			trace!(key = %item.key, "Removing item");
			let result = unmount(cx, &mut item.live);
			if unmounted.is_ok() {
				unmounted = result;
			}
		}
		unmounted?;

		// Survivors keep their relative order, so their current positions are enough for the LIS.
		let positions: HashMap<Key, usize> = self.items.iter().enumerate().map(|(index, item)| (item.key.clone(), index)).collect();
		let mut survivors: Vec<Option<Item<H>>> = mem::take(&mut self.items).into_iter().map(Some).collect();
		let mut fresh = fresh.into_iter();
		let mut previous = Vec::with_capacity(keys.len());
		for (index, (key, item)) in keys.iter().zip(sequence.iter()).enumerate() {
			let survivor = positions
				.get(key)
				.and_then(|&position| survivors.get_mut(position).and_then(Option::take).map(|survivor| (survivor, position)));
			match survivor {
				Some((survivor, position)) => {
					{
						let mut cell = survivor.cell.borrow_mut();
						cell.item = item.clone();
						cell.index = index;
					}
					self.items.push(survivor);
					previous.push(Some(position));
				}
				None => {
					if let Some(mut created) = fresh.next() {
						created.live.will_mount();
						self.items.push(created);
						previous.push(None);
					}
				}
			}
		}

		let mut stays = vec![false; self.items.len()];
		if self.misplaced.is_none() {
			let survivors: Vec<(usize, usize)> = previous
				.iter()
				.enumerate()
				.filter_map(|(index, previous)| previous.map(|previous| (index, previous)))
				.collect();
			let previous_order: Vec<usize> = survivors.iter().map(|&(_, previous)| previous).collect();
			for in_order in longest_increasing_subsequence(&previous_order) {
				stays[survivors[in_order].0] = true;
			}
		}

		self.misplaced = Some(end.clone());
		let mut reference = end;
		for (index, item) in self.items.iter().enumerate().rev() {
			if !stays[index] {
				if previous[index].is_some() {
					trace!(key = %item.key, index, "Moving item");
				}
				let mut roots = Vec::new();
				item.live.collect_roots(&mut roots);
				for root in &roots {
					cx.host.insert_before(parent, root, reference.as_ref())?;
				}
			}
			if let Some(first) = item.live.first_node() {
				reference = Some(first.clone());
			}
		}

		if self.items.is_empty() {
			if self.placeholder.is_none() {
				let placeholder = cx.host.create_text("");
				cx.host.insert_before(parent, &placeholder, reference.as_ref())?;
				self.placeholder = Some(placeholder);
			}
		} else if let Some(placeholder) = self.placeholder.take() {
			if let Err(error) = cx.host.remove(&placeholder) {
				cx.diagnostics.warn(&Warning::DetachFailed { message: error.to_string() });
			}
		}
		self.misplaced = None;

		let pending: Vec<bool> = self.items.iter().map(|item| item.pending).collect();
		for (item, _) in self.items.iter_mut().zip(&pending).filter(|(_, pending)| **pending) {
			item.live.on_mount(cx.host)?;
		}
		for (item, _) in self.items.iter_mut().zip(&pending).filter(|(_, pending)| **pending) {
			item.live.did_mount();
			item.pending = false;
		}
		for (item, _) in self.items.iter_mut().zip(&pending).filter(|(_, pending)| !**pending) {
			item.live.update(cx, parent, pass)?;
		}
		Ok(())
	}
}

/// Indices into `values` of one longest strictly increasing subsequence.
pub(crate) fn longest_increasing_subsequence(values: &[usize]) -> Vec<usize> {
	let mut predecessors: Vec<Option<usize>> = vec![None; values.len()];
	// Index of the smallest tail of each increasing run length.
	let mut tails: Vec<usize> = Vec::new();
	for (index, &value) in values.iter().enumerate() {
		let length = tails.partition_point(|&tail| values[tail] < value);
		if length > 0 {
			predecessors[index] = Some(tails[length - 1]);
		}
		if length == tails.len() {
			tails.push(index);
		} else {
			tails[length] = index;
		}
	}

	let mut subsequence = Vec::with_capacity(tails.len());
	let mut current = tails.last().copied();
	while let Some(index) = current {
		subsequence.push(index);
		current = predecessors[index];
	}
	subsequence.reverse();
	subsequence
}
