//! A [`Host`] over a browser document, through `web-sys`.

use crate::{
	host::{Host, NativeCallback},
	Error,
};
use js_sys::Function;
use tracing::{error, instrument, trace};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, Event, Node};

/// Mutates nodes of one [`Document`].
#[derive(Debug, Clone)]
pub struct DomHost {
	document: Document,
}

/// An installed event listener. Dropping it without [`Host::remove_listener`] makes later invocations throw.
#[derive(Debug)]
pub struct DomListener {
	event: String,
	closure: Closure<dyn Fn(JsValue)>,
}

impl DomHost {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self { document }
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

fn js_error(operation: &'static str, error: &JsValue) -> Error {
	let message = error.as_string().unwrap_or_else(|| format!("{:?}", error));
	error!(operation, %message, "Host operation failed");
	Error::host(operation, message)
}

fn element<'a>(node: &'a Node, operation: &'static str) -> Result<&'a Element, Error> {
	node.dyn_ref::<Element>().ok_or_else(|| {
		error!(operation, ?node, "Not an element");
		Error::host(operation, "not an element")
	})
}

impl Host for DomHost {
	type Node = Node;
	type Event = Event;
	type Listener = DomListener;

	fn create_element(&self, tag: &str) -> Result<Node, Error> {
		self.document.create_element(tag).map(Into::into).map_err(|error| js_error("create_element", &error))
	}

	fn create_text(&self, text: &str) -> Node {
		self.document.create_text_node(text).into()
	}

	fn set_text(&self, node: &Node, text: &str) {
		node.set_text_content(Some(text));
	}

	fn set_attribute(&self, node: &Node, name: &str, value: &str) -> Result<(), Error> {
		element(node, "set_attribute")?
			.set_attribute(name, value)
			.map_err(|error| js_error("set_attribute", &error))
	}

	fn remove_attribute(&self, node: &Node, name: &str) -> Result<(), Error> {
		element(node, "remove_attribute")?
			.remove_attribute(name)
			.map_err(|error| js_error("remove_attribute", &error))
	}

	fn insert_before(&self, parent: &Node, node: &Node, reference: Option<&Node>) -> Result<(), Error> {
		parent.insert_before(node, reference).map(drop).map_err(|error| js_error("insert_before", &error))
	}

	fn remove(&self, node: &Node) -> Result<(), Error> {
		match node.parent_node() {
			Some(parent) => parent.remove_child(node).map(drop).map_err(|error| js_error("remove", &error)),
			None => Ok(()),
		}
	}

	fn next_sibling(&self, node: &Node) -> Option<Node> {
		node.next_sibling()
	}

	fn is_container(&self, node: &Node) -> bool {
		node.dyn_ref::<Element>().is_some()
	}

	fn class_add(&self, node: &Node, token: &str) -> Result<(), Error> {
		element(node, "class_add")?
			.class_list()
			.add_1(token)
			.map_err(|error| js_error("class_add", &error))
	}

	fn class_remove(&self, node: &Node, token: &str) -> Result<(), Error> {
		element(node, "class_remove")?
			.class_list()
			.remove_1(token)
			.map_err(|error| js_error("class_remove", &error))
	}

	fn class_tokens(&self, node: &Node) -> Vec<String> {
		match node.dyn_ref::<Element>() {
			Some(element) => {
				let list = element.class_list();
				(0..list.length()).filter_map(|index| list.item(index)).collect()
			}
			None => Vec::new(),
		}
	}

	#[instrument(skip(self, callback))]
	fn add_listener(&self, node: &Node, event: &str, callback: NativeCallback<Event>) -> Result<DomListener, Error> {
		let closure = Closure::wrap(Box::new(move |native: JsValue| callback(native.dyn_ref::<Event>())) as Box<dyn Fn(JsValue)>);
		node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>())
			.map_err(|error| js_error("add_listener", &error))?;
		trace!("Added event listener");
		Ok(DomListener {
			event: event.to_owned(),
			closure,
		})
	}

	#[instrument(skip(self, listener), fields(event = %listener.event))]
	fn remove_listener(&self, node: &Node, listener: DomListener) {
		if let Err(error) = node.remove_event_listener_with_callback(&listener.event, listener.closure.as_ref().unchecked_ref::<Function>()) {
			error!("Failed to remove event listener: {:?}", error);
		}
	}
}
