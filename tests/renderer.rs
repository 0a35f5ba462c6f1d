use cambium::{
	constant, create_spec,
	memory::MemoryHost,
	spec::Props,
	Attrs, Error, For, Host, Renderer, Spec, Static, Value, View, ViewClass,
};
use std::{cell::Cell, rc::Rc};

type H = MemoryHost;

fn paragraph() -> ViewClass<H> {
	let spec = create_spec("p", Attrs::new().child("hi")).unwrap();
	ViewClass::new("Paragraph", move |_| Ok(Static::new(Some(spec.clone()))))
}

#[test]
fn mount_appends_after_existing_children() {
	let host = MemoryHost::new();
	let body = host.create_container("body");
	let existing = host.create_text("existing");
	host.insert_before(&body, &existing, None).unwrap();

	let mounted = Renderer::new(host.clone()).mount_to_node(&paragraph(), &body, Attrs::new()).unwrap();
	assert_eq!(host.inner_html(&body), "existing<p>hi</p>");
	assert_eq!(mounted.view_name(), "Paragraph");
	assert!(mounted.is_mounted());
}

#[test]
fn text_nodes_are_not_containers() {
	let host = MemoryHost::new();
	let text = host.create_text("leaf");
	let renderer = Renderer::new(host);
	assert_eq!(renderer.mount_to_node(&paragraph(), &text, Attrs::new()).unwrap_err(), Error::InvalidContainer);
}

#[test]
fn one_view_per_container() {
	let host = MemoryHost::new();
	let body = host.create_container("body");
	let renderer = Renderer::new(host.clone());
	let _mounted = renderer.mount_to_node(&paragraph(), &body, Attrs::new()).unwrap();

	assert_eq!(renderer.mount_to_node(&paragraph(), &body, Attrs::new()).unwrap_err(), Error::AlreadyMounted);
	assert_eq!(host.inner_html(&body), "<p>hi</p>");

	renderer.unmount_from_node(&body).unwrap();
	renderer.mount_to_node(&paragraph(), &body, Attrs::new()).unwrap();
	assert_eq!(host.inner_html(&body), "<p>hi</p>");
}

#[test]
fn clones_share_mounted_roots() {
	let host = MemoryHost::new();
	let body = host.create_container("body");
	let renderer = Renderer::new(host.clone());
	let _mounted = renderer.mount_to_node(&paragraph(), &body, Attrs::new()).unwrap();

	let clone = renderer.clone();
	assert_eq!(clone.mount_to_node(&paragraph(), &body, Attrs::new()).unwrap_err(), Error::AlreadyMounted);
	clone.unmount_from_node(&body).unwrap();
	assert_eq!(renderer.unmount_from_node(&body), Err(Error::NotMounted));
	assert_eq!(host.inner_html(&body), "");
}

#[test]
fn unmounting_an_empty_container_fails() {
	let host = MemoryHost::new();
	let body = host.create_container("body");
	let renderer = Renderer::new(host);
	assert_eq!(renderer.unmount_from_node(&body), Err(Error::NotMounted));

	renderer.mount_to_node(&paragraph(), &body, Attrs::new()).unwrap();
	renderer.unmount_from_node(&body).unwrap();
	assert_eq!(renderer.unmount_from_node(&body), Err(Error::NotMounted));
}

#[test]
fn roots_are_independent() {
	let host = MemoryHost::new();
	let (left, right) = (host.create_container("left"), host.create_container("right"));
	let renderer = Renderer::new(host.clone());
	let first = renderer.mount_to_node(&paragraph(), &left, Attrs::new()).unwrap();
	let second = renderer.clone().mount_to_node(&paragraph(), &right, Attrs::new()).unwrap();

	renderer.unmount_from_node(&left).unwrap();
	assert!(!first.is_mounted());
	assert!(second.is_mounted());
	assert_eq!(host.inner_html(&left), "");
	assert_eq!(host.inner_html(&right), "<p>hi</p>");
}

#[test]
fn builtin_views_require_their_props() {
	let host = MemoryHost::new();
	let body = host.create_container("body");
	let renderer = Renderer::new(host.clone());

	let error = renderer.mount_to_node(&For::class(), &body, Attrs::new()).unwrap_err();
	assert_eq!(
		error,
		Error::MissingProp {
			view: "For".into(),
			prop: "each".to_owned()
		}
	);
	assert_eq!(host.children(&body), []);
}

#[test]
fn props_must_be_reactive_or_frozen() {
	let host = MemoryHost::new();
	let body = host.create_container("body");
	let renderer = Renderer::new(host);

	let error = renderer.mount_to_node(&paragraph(), &body, Attrs::new().with("title", "raw")).unwrap_err();
	assert_eq!(error, Error::NonReactiveAttribute { name: "title".to_owned() });
}

struct Greeting(Rc<Cell<usize>>);

impl View<H> for Greeting {
	fn render(&mut self, props: &Props<H>) -> Result<Option<Spec<H>>, Error> {
		self.0.set(self.0.get() + 1);
		match props.value("name") {
			Value::String(name) => create_spec("h1", Attrs::new().child(format!("Hello, {}!", name))).map(Some),
			other => Err(Error::render(props.view_name().to_owned(), format!("no name in {}", other))),
		}
	}
}

#[test]
fn views_render_once_with_their_props() {
	let renders = Rc::new(Cell::new(0));
	let class = ViewClass::new("Greeting", {
		let renders = renders.clone();
		move |_| Ok(Greeting(renders.clone()))
	});
	let host = MemoryHost::new();
	let body = host.create_container("body");
	let renderer = Renderer::new(host.clone());

	let mounted = renderer.mount_to_node(&class, &body, Attrs::new().with("name", constant::<H>("world"))).unwrap();
	mounted.update().unwrap();
	mounted.update().unwrap();
	assert_eq!(renders.get(), 1);
	assert_eq!(host.inner_html(&body), "<h1>Hello, world!</h1>");
}

#[test]
fn failed_renders_leave_the_container_untouched() {
	let class = ViewClass::new("Greeting", |_| Ok(Greeting(Rc::default())));
	let host = MemoryHost::new();
	let body = host.create_container("body");
	let renderer = Renderer::new(host.clone());

	let error = renderer.mount_to_node(&class, &body, Attrs::new()).unwrap_err();
	assert!(matches!(error, Error::Render { view, .. } if view == "Greeting"));
	assert_eq!(host.children(&body), []);
	assert_eq!(renderer.unmount_from_node(&body), Err(Error::NotMounted));
}

#[test]
fn empty_render_mounts_a_placeholder() {
	let class = ViewClass::<H>::new("Nothing", |_| Ok(Static::new(None)));
	let host = MemoryHost::new();
	let body = host.create_container("body");
	let renderer = Renderer::new(host.clone());

	renderer.mount_to_node(&class, &body, Attrs::new()).unwrap();
	assert_eq!(host.children(&body).len(), 1);
	assert_eq!(host.inner_html(&body), "");

	renderer.unmount_from_node(&body).unwrap();
	assert_eq!(host.children(&body), []);
}
