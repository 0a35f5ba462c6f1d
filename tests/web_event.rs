#![cfg(target_arch = "wasm32")]

use cambium::{constant, create_spec, dom::DomHost, handler, Attrs, Renderer, Static, ViewClass};
use std::{cell::Cell, rc::Rc};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

mod web_setup_;
use web_setup_::{container, html_element};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn click() {
	let (document, container) = container();
	let clicks = Rc::new(Cell::new(0));
	let on_click = handler::<DomHost>({
		let clicks = clicks.clone();
		move |event| {
			assert_eq!(event.type_(), "click");
			clicks.set(clicks.get() + 1);
		}
	});
	let spec = create_spec(
		"button",
		Attrs::new().with("id", constant::<DomHost>("test-button")).with("onClick", on_click),
	)
	.unwrap();
	let class = ViewClass::new("Button", move |_| Ok(Static::new(Some(spec.clone()))));

	let renderer = Renderer::new(DomHost::new(document.clone()));
	renderer.mount_to_node(&class, &container.clone().into(), Attrs::new()).unwrap();
	assert_eq!(clicks.get(), 0);

	let button = html_element(&document, "test-button");
	button.click();
	assert_eq!(clicks.get(), 1);

	renderer.unmount_from_node(&container.into()).unwrap();
	button.click();
	assert_eq!(clicks.get(), 1);
}
