//! Shared by the lifecycle tests: views that record their hook calls.

use cambium::{accessor, create_spec, memory::MemoryHost, spec::Props, Attrs, Error, Spec, Value, View, ViewClass};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

pub type H = MemoryHost;
pub type Log = Rc<RefCell<Vec<String>>>;

pub struct Recorder {
	name: &'static str,
	log: Log,
	gate: Rc<Cell<bool>>,
	children: Vec<ViewClass<H>>,
}

impl Recorder {
	fn record(&self, event: &str) {
		self.log.borrow_mut().push(format!("{}.{}", self.name, event))
	}
}

impl View<H> for Recorder {
	fn render(&mut self, _: &Props<H>) -> Result<Option<Spec<H>>, Error> {
		let children = self.children.iter().map(|class| create_spec(class, Attrs::new())).collect::<Result<Vec<_>, _>>()?;
		let title = {
			let (name, log) = (self.name, self.log.clone());
			accessor(move || {
				log.borrow_mut().push(format!("{}.title", name));
				Value::from(name)
			})
		};
		create_spec("div", Attrs::new().with("title", title).children(children)).map(Some)
	}

	fn will_mount(&mut self) {
		self.record("will_mount")
	}
	fn on_mount(&mut self) {
		self.record("on_mount")
	}
	fn did_mount(&mut self) {
		self.record("did_mount")
	}
	fn should_update(&mut self) -> bool {
		self.gate.get()
	}
	fn will_update(&mut self) {
		self.record("will_update")
	}
	fn on_update(&mut self) {
		self.record("on_update")
	}
	fn did_update(&mut self) {
		self.record("did_update")
	}
	fn will_unmount(&mut self) {
		self.record("will_unmount")
	}
	fn on_unmount(&mut self) {
		self.record("on_unmount")
	}
	fn did_unmount(&mut self) {
		self.record("did_unmount")
	}
}

/// A recording view class rendering `<div title={name}>` around one instance of each child class.
pub fn recorder(name: &'static str, log: &Log, gate: &Rc<Cell<bool>>, children: Vec<ViewClass<H>>) -> ViewClass<H> {
	let (log, gate) = (log.clone(), gate.clone());
	ViewClass::new(name, move |_| {
		Ok(Recorder {
			name,
			log: log.clone(),
			gate: gate.clone(),
			children: children.clone(),
		})
	})
}

/// Takes the recorded events, leaving out attribute evaluations.
pub fn hooks(log: &Log) -> Vec<String> {
	log.borrow_mut().drain(..).filter(|event| !event.ends_with(".title")).collect()
}
