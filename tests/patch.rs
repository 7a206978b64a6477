use pipe_vdom::{
	attributes, children, events, h, handler, hydrate,
	memory::{MemoryBackend, MemoryEvent, Mutation, NodeId},
	patch, svg, ElementNode, Handler, PatchConfig, Patcher, SVG_NAMESPACE,
};
use std::{cell::Cell, rc::Rc};


type Element = ElementNode<MemoryBackend>;

fn mounted(name: &str) -> (MemoryBackend, NodeId, Element) {
	log_::init();
	let mut backend = MemoryBackend::new();
	let root = backend.create_root(name);
	let view = hydrate(&backend, root);
	(backend, root, view)
}

/// Patches `next` onto `view` in place and returns it, realized.
fn render(backend: &mut MemoryBackend, view: &mut Element, mut next: Element) -> Element {
	assert!(!patch(backend, view, &mut next), "root was replaced");
	next
}

fn counter(count: &Rc<Cell<usize>>) -> Handler<MemoryEvent> {
	let count = Rc::clone(count);
	handler(move |_| count.set(count.get() + 1))
}

fn score(clicked: &Handler<MemoryEvent>) -> Element {
	h(
		"div",
		(
			attributes! { "class" => "score", "width" => 210, "hidden" => false },
			events! { "click" => Rc::clone(clicked) },
			children!["Tune", h("span", attributes! { "x" => 1.5 }), None::<Element>, svg("svg", children![svg("line", ())])],
		),
	)
}

#[test]
fn first_patch_builds_everything() {
	let (mut backend, root, mut view) = mounted("div");
	let clicked = handler(|_| ());
	let tree = render(&mut backend, &mut view, score(&clicked));

	assert_eq!(tree.node(), Some(&root));
	assert_eq!(
		backend.to_html(root),
		r#"<div class="score" hidden="false" width="210">Tune<span x="1.5"></span><svg><line></line></svg></div>"#
	);
	assert_eq!(backend.listener_count(root, "click"), 1);
	for child in tree.children().iter().flatten() {
		assert!(child.node().is_some());
	}
}

#[test]
fn identical_patches_change_nothing() {
	let (mut backend, root, mut view) = mounted("div");
	let clicked = handler(|_| ());
	let mut first = render(&mut backend, &mut view, score(&clicked));
	let html = backend.to_html(root);
	backend.take_mutations();

	let mut second = render(&mut backend, &mut first, score(&clicked));
	assert!(backend.mutations().is_empty(), "{:?}", backend.mutations());
	assert_eq!(backend.to_html(root), html);

	let copy = second.clone();
	let _third = render(&mut backend, &mut second, copy);
	assert!(backend.mutations().is_empty(), "{:?}", backend.mutations());
	assert_eq!(backend.listener_count(root, "click"), 1);
}

#[test]
fn tag_change_replaces_the_root() {
	let (mut backend, root, mut view) = mounted("div");
	let mut after: Element = h("span", (attributes! { "class" => "a" }, children!["x"]));

	assert!(patch(&mut backend, &mut view, &mut after));

	let span = *after.node().unwrap();
	assert_ne!(span, root);
	assert_eq!(backend.to_html(span), r#"<span class="a">x</span>"#);
	assert_eq!(backend.to_html(root), "<div></div>");
}

#[test]
fn tag_change_replaces_a_child_in_place() {
	let (mut backend, root, mut view) = mounted("section");
	let mut before = render(
		&mut backend,
		&mut view,
		h("section", children!["a", h("div", (attributes! { "class" => "a" }, children!["x"])), "b"]),
	);
	let div = backend.children(root)[1];
	backend.take_mutations();

	let _after = render(
		&mut backend,
		&mut before,
		h("section", children!["a", h("span", (attributes! { "class" => "a" }, children!["x"])), "b"]),
	);

	let span = backend.children(root)[1];
	assert_ne!(span, div);
	assert_eq!(backend.name(span), Some("span"));
	assert_eq!(backend.parent(div), None);
	assert!(backend.mutations().contains(&Mutation::Replace { parent: root, new: span, old: div }));
	assert_eq!(backend.to_html(root), r#"<section>a<span class="a">x</span>b</section>"#);
}

#[test]
fn tag_names_compare_case_insensitively() {
	let (mut backend, root, mut view) = mounted("DIV");
	let after = render(&mut backend, &mut view, h("div", ()));
	assert_eq!(after.node(), Some(&root));
}

#[test]
fn attribute_update() {
	let (mut backend, root, mut view) = mounted("button");
	let mut before = render(&mut backend, &mut view, h("button", attributes! { "class" => "a" }));
	backend.take_mutations();

	let _after = render(&mut backend, &mut before, h("button", attributes! { "class" => "b" }));

	assert_eq!(backend.attribute(root, "class"), Some("b"));
	assert_eq!(
		backend.take_mutations(),
		vec![Mutation::SetAttribute {
			node: root,
			name: "class".to_owned(),
			value: "b".to_owned(),
		}]
	);
}

#[test]
fn text_update_reuses_the_text_node() {
	let (mut backend, root, mut view) = mounted("p");
	let mut before = render(&mut backend, &mut view, h("p", children!["1"]));
	let text = backend.children(root)[0];
	backend.take_mutations();

	let _after = render(&mut backend, &mut before, h("p", children!["2"]));

	assert_eq!(backend.children(root), &[text]);
	assert_eq!(backend.text(text), Some("2"));
	assert_eq!(backend.take_mutations(), vec![Mutation::SetText { node: text, data: "2".to_owned() }]);
}

#[test]
fn children_beyond_the_previous_length_are_appended() {
	let (mut backend, root, mut view) = mounted("div");
	let mut before = render(&mut backend, &mut view, h("div", children![h("i", ())]));
	let first = backend.children(root)[0];

	let _after = render(&mut backend, &mut before, h("div", children![h("i", ()), h("b", ()), h("u", ())]));

	let children = backend.children(root);
	assert_eq!(children.len(), 3);
	assert_eq!(children[0], first);
	assert_eq!(backend.to_html(root), "<div><i></i><b></b><u></u></div>");
}

#[test]
fn surplus_children_are_trimmed_from_the_end() {
	let (mut backend, root, mut view) = mounted("div");
	let mut before = render(&mut backend, &mut view, h("div", children!["a", h("b", ()), h("u", ())]));
	let first = backend.children(root)[0];

	let _after = render(&mut backend, &mut before, h("div", children!["c"]));

	assert_eq!(backend.children(root), &[first]);
	assert_eq!(backend.to_html(root), "<div>c</div>");
}

#[test]
fn empty_slots_are_not_realized() {
	let (mut backend, root, mut view) = mounted("div");
	let _after = render(&mut backend, &mut view, h("div", children![h("a", ()), None::<Element>, h("b", ())]));

	assert_eq!(backend.children(root).len(), 2);
	assert_eq!(backend.to_html(root), "<div><a></a><b></b></div>");
}

#[test]
fn empty_slots_do_not_take_part_in_positional_diffing() {
	let (mut backend, root, mut view) = mounted("div");
	let mut before = render(&mut backend, &mut view, h("div", children![h("a", ()), None::<Element>, h("b", ())]));
	backend.take_mutations();

	// Shifting the empty slot around doesn't change the stripped child list.
	let mut after = render(&mut backend, &mut before, h("div", children![None::<Element>, h("a", ()), h("b", ()), None::<Element>]));
	assert!(backend.mutations().is_empty(), "{:?}", backend.mutations());

	// An element is compared against whatever is at its stripped index, here `<a>`.
	let _next = render(&mut backend, &mut after, h("div", children![None::<Element>, h("b", ())]));
	assert_eq!(backend.to_html(root), "<div><b></b></div>");
}

#[test]
fn new_children_within_the_previous_length_are_inserted() {
	let (mut backend, root, mut view) = mounted("ol");
	let mut before = render(&mut backend, &mut view, h("ol", children![h("li", children!["1"]), None::<Element>, None::<Element>]));
	let first = backend.children(root)[0];
	backend.take_mutations();

	let _after = render(&mut backend, &mut before, h("ol", children![h("li", children!["1"]), h("li", children!["2"]), h("li", children!["3"])]));

	assert_eq!(backend.children(root)[0], first);
	assert_eq!(backend.to_html(root), "<ol><li>1</li><li>2</li><li>3</li></ol>");
	let inserted: Vec<usize> = backend
		.mutations()
		.iter()
		.filter_map(|mutation| match *mutation {
			Mutation::Insert { parent, index, .. } if parent == root => Some(index),
			_ => None,
		})
		.collect();
	assert_eq!(inserted, vec![1, 2]);
}

#[test]
fn unrealized_previous_children_are_rebuilt() {
	let (mut backend, root, view) = mounted("div");
	let mut before = view.child(h("i", ()));

	let _after = render(&mut backend, &mut before, h("div", children![h("b", ())]));

	assert_eq!(backend.to_html(root), "<div><b></b></div>");
}

#[test]
fn handler_swap_rebinds_exactly_once() {
	let (mut backend, root, mut view) = mounted("button");
	let (a_count, b_count) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
	let (a, b) = (counter(&a_count), counter(&b_count));

	let mut first = render(&mut backend, &mut view, h("button", (attributes! {}, events! { "click" => Rc::clone(&a) })));
	backend.dispatch(root, "click");
	assert_eq!((a_count.get(), b_count.get()), (1, 0));
	backend.take_mutations();

	let mut second = render(&mut backend, &mut first, h("button", (attributes! {}, events! { "click" => Rc::clone(&b) })));
	assert_eq!(
		backend.take_mutations(),
		vec![
			Mutation::RemoveListener { node: root, event: "click".to_owned() },
			Mutation::AddListener { node: root, event: "click".to_owned() },
		]
	);

	for _ in 0..3 {
		second = render(&mut backend, &mut second, h("button", (attributes! {}, events! { "click" => Rc::clone(&b) })));
	}
	assert!(backend.mutations().is_empty(), "{:?}", backend.mutations());
	assert_eq!(backend.listener_count(root, "click"), 1);

	assert_eq!(backend.dispatch(root, "click"), 1);
	assert_eq!((a_count.get(), b_count.get()), (1, 1));
}

#[test]
fn stale_attributes_are_kept_by_default() {
	let (mut backend, root, mut view) = mounted("rect");
	let mut before = render(&mut backend, &mut view, h("rect", attributes! { "x" => 1, "fill" => "red" }));

	let _after = render(&mut backend, &mut before, h("rect", attributes! { "x" => 2 }));

	assert_eq!(backend.attribute(root, "x"), Some("2"));
	assert_eq!(backend.attribute(root, "fill"), Some("red"));
}

#[test]
fn stale_attributes_are_removed_when_pruning() {
	let (mut backend, root, mut view) = mounted("rect");
	let mut before: Element = h("rect", attributes! { "x" => 1, "fill" => "red" });
	assert!(!Patcher::with_config(&mut backend, PatchConfig::pruning()).patch(&mut view, &mut before));

	let mut after: Element = h("rect", attributes! { "x" => 2 });
	assert!(!Patcher::with_config(&mut backend, PatchConfig::pruning()).patch(&mut before, &mut after));

	assert_eq!(backend.attribute(root, "x"), Some("2"));
	assert_eq!(backend.attribute(root, "fill"), None);
}

#[test]
fn false_attributes_are_written_by_default() {
	let (mut backend, root, mut view) = mounted("input");
	let _after = render(&mut backend, &mut view, h("input", attributes! { "disabled" => false, "checked" => true }));

	assert_eq!(backend.attribute(root, "disabled"), Some("false"));
	assert_eq!(backend.attribute(root, "checked"), Some("true"));
}

#[test]
fn false_attributes_are_omitted_when_configured() {
	let config = PatchConfig {
		omit_false_attributes: true,
		..PatchConfig::default()
	};
	let (mut backend, root, mut view) = mounted("div");

	let mut before: Element = h("div", children![h("input", attributes! { "disabled" => false })]);
	Patcher::with_config(&mut backend, config).patch(&mut view, &mut before);
	let input = backend.children(root)[0];
	assert_eq!(backend.attribute(input, "disabled"), None);

	let mut enabled: Element = h("div", children![h("input", attributes! { "disabled" => "" })]);
	Patcher::with_config(&mut backend, config).patch(&mut before, &mut enabled);
	assert_eq!(backend.attribute(input, "disabled"), Some(""));

	let mut disabled: Element = h("div", children![h("input", attributes! { "disabled" => false })]);
	Patcher::with_config(&mut backend, config).patch(&mut enabled, &mut disabled);
	assert_eq!(backend.attribute(input, "disabled"), None);
}

#[test]
fn stale_listeners_depend_on_configuration() {
	let count = Rc::new(Cell::new(0));
	let clicked = counter(&count);

	for (config, remaining) in [(PatchConfig::default(), 1), (PatchConfig::pruning(), 0)].iter().copied() {
		let (mut backend, root, mut view) = mounted("button");
		let mut before: Element = h("button", (attributes! {}, events! { "click" => Rc::clone(&clicked) }));
		Patcher::with_config(&mut backend, config).patch(&mut view, &mut before);

		let mut after: Element = h("button", ());
		Patcher::with_config(&mut backend, config).patch(&mut before, &mut after);
		assert_eq!(backend.listener_count(root, "click"), remaining);
	}
}

#[test]
fn svg_elements_are_namespaced() {
	let (mut backend, root, mut view) = mounted("div");
	let _after = render(&mut backend, &mut view, h("div", children![svg("svg", (attributes! { "width" => 100 }, children![svg("rect", ())]))]));

	let svg = backend.children(root)[0];
	let rect = backend.children(svg)[0];
	assert_eq!(backend.namespace(svg), Some(SVG_NAMESPACE));
	assert_eq!(backend.namespace(rect), Some(SVG_NAMESPACE));
	assert_eq!(backend.namespace(root), None);
	assert_eq!(backend.attribute(svg, "ns"), None);
	assert_eq!(backend.attribute(svg, "width"), Some("100"));
}

#[test]
fn nested_changes_are_applied_in_place() {
	let (mut backend, root, mut view) = mounted("div");
	let mut before = render(
		&mut backend,
		&mut view,
		h("div", children![h("ul", children![h("li", (attributes! { "class" => "selected" }, children!["A"])), h("li", children!["B"])])]),
	);
	let ul = backend.children(root)[0];
	let items = backend.children(ul).to_vec();
	backend.take_mutations();

	let _after = render(
		&mut backend,
		&mut before,
		h("div", children![h("ul", children![h("li", (attributes! { "class" => "" }, children!["A"])), h("li", (attributes! { "class" => "selected" }, children!["C"]))])]),
	);

	assert_eq!(backend.children(root), &[ul]);
	assert_eq!(backend.children(ul), items.as_slice());
	assert_eq!(backend.to_html(root), r#"<div><ul><li class="">A</li><li class="selected">C</li></ul></div>"#);
	assert_eq!(backend.mutations().len(), 3);
}

#[test]
#[should_panic(expected = "Can't patch element onto text node")]
fn mismatched_children_panic() {
	let (mut backend, _, mut view) = mounted("div");
	let mut before = render(&mut backend, &mut view, h("div", children!["a"]));
	let _after = render(&mut backend, &mut before, h("div", children![h("a", ())]));
}

#[test]
fn nan_attributes_are_not_rewritten() {
	let (mut backend, root, mut view) = mounted("div");
	let mut before = render(&mut backend, &mut view, h("div", attributes! { "x" => f64::NAN }));
	assert_eq!(backend.attribute(root, "x"), Some("NaN"));
	backend.take_mutations();

	let copy = before.clone();
	let _after = render(&mut backend, &mut before, copy);
	assert!(backend.mutations().is_empty(), "{:?}", backend.mutations());
}
