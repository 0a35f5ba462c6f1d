#![cfg(target_arch = "wasm32")]

use cambium::{accessor, create_spec, dom::DomHost, Accessor, Attrs, For, Renderer, Static, Value, ViewClass};
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::Node;

mod web_setup_;
use web_setup_::{container, html_element};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn keyed_list_in_the_document() {
	let (document, container) = container();
	let items = Rc::new(RefCell::new(Value::array(["a", "b", "c"].map(Value::from))));
	let list = {
		let items = items.clone();
		For::spec(accessor(move || items.borrow().clone()), None, |item: Accessor, _| {
			create_spec("li", Attrs::new().with("class", item.clone()).child(item)).map(Some)
		})
		.unwrap()
	};
	let spec = create_spec("ul", Attrs::new().with("id", cambium::constant::<DomHost>("web-list")).child(list)).unwrap();
	let class = ViewClass::new("List", move |_| Ok(Static::new(Some(spec.clone()))));

	let renderer = Renderer::new(DomHost::new(document.clone()));
	let root: Node = container.clone().into();
	let mounted = renderer.mount_to_node(&class, &root, Attrs::new()).unwrap();

	let ul = html_element(&document, "web-list");
	assert_eq!(ul.inner_html(), r#"<li class="a">a</li><li class="b">b</li><li class="c">c</li>"#);
	let c: Node = ul.last_element_child().unwrap().into();

	*items.borrow_mut() = Value::array(["c", "a"].map(Value::from));
	mounted.update().unwrap();
	assert_eq!(ul.inner_html(), r#"<li class="c">c</li><li class="a">a</li>"#);
	assert!(ul.first_element_child().unwrap().is_same_node(Some(&c)));

	renderer.unmount_from_node(&root).unwrap();
	assert_eq!(container.inner_html(), "");
	assert!(!mounted.is_mounted());
}
