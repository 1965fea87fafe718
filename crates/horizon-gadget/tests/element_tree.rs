//! Integration tests for building and mutating element trees.

use std::sync::Arc;

use horizon_gadget::element::same_element;
use horizon_gadget::graphics::RecordingCanvas;
use horizon_gadget::{
    Div, ElementFactory, ElementRef, Label, RecordingGraphics, Scriptable, Variant, View,
};

fn new_view() -> (Arc<View>, Arc<RecordingGraphics>) {
    let graphics = Arc::new(RecordingGraphics::new());
    let view = View::new(Arc::new(ElementFactory::with_builtin()), graphics.clone());
    view.set_size(100.0, 100.0);
    (view, graphics)
}

#[test]
fn test_register_muffin_class() {
    let factory = Arc::new(ElementFactory::with_builtin());
    assert!(factory.register_element_class("muffin", |context| {
        Some(Div::create(context) as ElementRef)
    }));
    // A second registration is refused and keeps the first creator.
    assert!(!factory.register_element_class("muffin", |context| {
        Some(Label::create(context) as ElementRef)
    }));

    let view = View::new(Arc::clone(&factory), Arc::new(RecordingGraphics::new()));
    let muffin = factory
        .create_element("muffin", None, &view, "breakfast")
        .expect("muffin is registered");
    assert_eq!(muffin.element_base().tag_name(), "muffin");
    assert_eq!(muffin.element_base().name(), "breakfast");
    assert!(muffin.as_any().downcast_ref::<Div>().is_some());

    assert!(factory.create_element("bagel", None, &view, "").is_none());
}

#[test]
fn test_remove_middle_keeps_order() {
    let (view, _) = new_view();
    let children = view.children();
    let first = children.append_element("label", "first").unwrap();
    let second = children.append_element("label", "second").unwrap();
    let third = children.append_element("label", "third").unwrap();
    assert_eq!(children.count(), 3);

    assert!(children.remove_element(&second));
    assert_eq!(children.count(), 2);
    assert!(same_element(&children.get_item_by_index(0).unwrap(), &first));
    assert!(same_element(&children.get_item_by_index(1).unwrap(), &third));
    assert!(!children.remove_element(&second));
    assert!(!view.is_alive(second.element_base().id().unwrap()));
}

#[test]
fn test_insert_before() {
    let (view, _) = new_view();
    let children = view.children();
    let last = children.append_element("label", "last").unwrap();
    let head = children.insert_element("div", Some(&last), "head").unwrap();
    assert!(same_element(&children.get_item_by_index(0).unwrap(), &head));
    assert!(same_element(&children.get_item_by_name("last").unwrap(), &last));
    assert!(children.get_item_by_index(2).is_none());
}

#[test]
fn test_count_tracks_inserts_and_removes() {
    let (view, _) = new_view();
    let children = view.children();
    let mut inserted = 0usize;
    let mut removed = 0usize;
    let mut alive: Vec<ElementRef> = Vec::new();
    for round in 0..12 {
        if round % 3 == 2 {
            let victim = alive.remove(round % alive.len());
            assert!(children.remove_element(&victim));
            removed += 1;
        } else {
            let element = children.append_element("label", &format!("e{round}")).unwrap();
            alive.push(element);
            inserted += 1;
        }
        assert_eq!(children.count(), inserted - removed);
    }
    for element in children.snapshot() {
        assert!(element.element_base().parent().is_none());
        assert!(alive.iter().any(|e| same_element(e, &element)));
    }
    assert_eq!(view.element_count(), inserted - removed);
}

#[test]
fn test_nested_parent_links() {
    let (view, _) = new_view();
    let outer = view.children().append_element("div", "outer").unwrap();
    let inner = outer
        .element_base()
        .children()
        .unwrap()
        .append_element("label", "inner")
        .unwrap();
    let parent = inner.element_base().parent().unwrap();
    assert!(same_element(&parent, &outer));
    assert!(view.element_by_name("inner").is_some());

    view.children().remove_all_elements();
    assert_eq!(view.children().count(), 0);
    assert_eq!(view.element_count(), 0);
    assert!(view.element_by_name("inner").is_none());
}

#[test]
fn test_element_add_filter_vetoes() {
    let (view, _) = new_view();
    view.set_element_add_filter(Some(|element: &ElementRef| {
        element.element_base().tag_name() != "label"
    }));
    assert!(view.children().append_element("label", "nope").is_none());
    assert!(view.children().append_element("div", "yes").is_some());
    assert_eq!(view.children().count(), 1);
    assert_eq!(view.element_count(), 1);
}

#[test]
fn test_single_content_area() {
    let factory = Arc::new(ElementFactory::with_builtin());
    factory.register_element_class("contentarea", |context| {
        Some(Div::create(context) as ElementRef)
    });
    let view = View::new(factory, Arc::new(RecordingGraphics::new()));

    let area = view.children().append_element("contentarea", "").unwrap();
    assert!(view.children().append_element("contentarea", "").is_none());
    assert!(view.content_area().is_some());

    assert!(view.children().remove_element(&area));
    assert!(view.content_area().is_none());
    assert!(view.children().append_element("contentarea", "").is_some());
}

#[test]
fn test_elements_script_members() {
    let (view, _) = new_view();
    let children = view.children();
    children.append_element("label", "a").unwrap();
    children.append_element("div", "b").unwrap();

    assert_eq!(children.get_property_by_name("count"), Some(Variant::Int64(2)));
    let by_index = children.get_property_by_index(1).unwrap();
    let Variant::Scriptable(Some(object)) = by_index else {
        panic!("expected an element, got {by_index:?}");
    };
    assert!(object.downcast_ref::<Div>().is_some());

    let item = children.get_property_by_name("item").unwrap();
    let item = item.as_callable().unwrap();
    let result = item.call(&[Variant::from("a")]);
    assert!(matches!(result.v(), Variant::Scriptable(Some(_))));
    let missing = item.call(&[Variant::Int64(5)]);
    assert!(matches!(missing.v(), Variant::Scriptable(None)));
}

#[test]
fn test_element_properties_through_scriptable() {
    let (view, _) = new_view();
    let label = view.children().append_element("label", "caption").unwrap();

    assert!(label.set_property_by_name("width", Variant::Double(80.0)));
    assert_eq!(label.element_base().width(), 80.0);
    assert!(label.set_property_by_name("width", Variant::from("120")));
    assert_eq!(label.element_base().width(), 120.0);
    assert!(!label.set_property_by_name("width", Variant::from("abc")));
    assert_eq!(label.element_base().width(), 120.0);

    assert!(!label.set_property_by_name("tagName", Variant::from("div")));
    assert_eq!(label.get_property_by_name("tagName"), Some(Variant::from("label")));
    assert!(label.set_property_by_name("innerText", Variant::from("hello")));
    assert_eq!(
        label.as_any().downcast_ref::<Label>().unwrap().inner_text(),
        "hello"
    );
}

#[test]
fn test_incremental_draw_reuses_canvases() {
    let (view, graphics) = new_view();
    let label = view.children().append_element("label", "a").unwrap();
    let base = label.element_base();
    base.set_x(10.0);
    base.set_width(50.0);
    base.set_height(20.0);
    label
        .as_any()
        .downcast_ref::<Label>()
        .unwrap()
        .set_inner_text("hi");

    let canvas = view.draw().unwrap();
    let created = graphics.canvases_created();
    assert_eq!(created, 3);
    {
        let canvas = canvas.lock();
        let recorded = canvas.as_any().downcast_ref::<RecordingCanvas>().unwrap();
        assert_eq!(recorded.texts(), vec!["hi".to_string()]);
    }
    assert!(!view.needs_redraw());

    view.draw().unwrap();
    assert_eq!(graphics.canvases_created(), created);

    // Moving recomposites without redrawing the element.
    base.set_x(20.0);
    assert!(view.needs_redraw());
    assert!(!base.is_changed());
    view.draw().unwrap();
    assert_eq!(graphics.canvases_created(), created);
    assert!(!base.is_position_changed());

    // A new size needs a new canvas.
    base.set_width(60.0);
    view.draw().unwrap();
    assert_eq!(graphics.canvases_created(), created + 1);
}

#[test]
fn test_popup_is_drawn_last() {
    let (view, _) = new_view();
    let popup = view.children().append_element("label", "popup").unwrap();
    let below = view.children().append_element("label", "below").unwrap();
    for (element, text) in [(&popup, "menu"), (&below, "body")] {
        element.element_base().set_width(40.0);
        element.element_base().set_height(10.0);
        element
            .as_any()
            .downcast_ref::<Label>()
            .unwrap()
            .set_inner_text(text);
    }
    view.set_popup_element(Some(&popup));

    let canvas = view.draw().unwrap();
    let canvas = canvas.lock();
    let recorded = canvas.as_any().downcast_ref::<RecordingCanvas>().unwrap();
    assert_eq!(recorded.texts(), vec!["body".to_string(), "menu".to_string()]);
}
