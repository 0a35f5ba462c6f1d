#![cfg(target_arch = "wasm32")]

use std::sync::Once;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, Element, HtmlElement};

static LOG_INIT: Once = Once::new();

/// Installs browser console logging once and returns a fresh `div` appended to `<body>`.
pub fn container() -> (Document, Element) {
	LOG_INIT.call_once(tracing_wasm::set_as_global_default);

	let document = window().unwrap().document().unwrap();
	let container = document.create_element("div").unwrap();
	document.body().unwrap().append_child(&container).unwrap();
	(document, container)
}

pub fn html_element(document: &Document, id: &str) -> HtmlElement {
	document.get_element_by_id(id).unwrap().dyn_into().unwrap()
}
