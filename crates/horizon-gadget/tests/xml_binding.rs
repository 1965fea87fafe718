//! Integration tests for loading views and elements from markup.

use std::sync::Arc;

use parking_lot::Mutex;

use horizon_gadget::{
    CallableRef, Div, ElementFactory, EventType, Label, MouseButton, MouseEvent, QuickXmlParser,
    RecordingGraphics, ScriptContext, Scriptable, ScriptableRef, Variant, View, XmlError, XmlParser,
    dynamic_slot, load_view_from_xml,
};

/// A stand-in engine: compiled functions record their source when called.
#[derive(Default)]
struct RecordingScript {
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingScript {
    fn entries(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

impl ScriptContext for RecordingScript {
    fn compile(&self, script: &str, _filename: &str, _row: usize) -> Option<CallableRef> {
        if script.contains("syntax error") {
            return None;
        }
        let log = Arc::clone(&self.log);
        let source = script.to_string();
        Some(dynamic_slot(move |_args: &[Variant]| {
            log.lock().push(format!("call {source}"));
            Variant::Void
        }))
    }

    fn execute(&self, script: &str, _filename: &str, row: usize) {
        self.log.lock().push(format!("run@{row} {}", script.trim()));
    }

    fn set_global(&self, _name: &str, _object: ScriptableRef) -> bool {
        false
    }

    fn register_class(&self, _name: &str, _constructor: CallableRef) -> bool {
        false
    }
}

fn new_view() -> Arc<View> {
    View::new(
        Arc::new(ElementFactory::with_builtin()),
        Arc::new(RecordingGraphics::new()),
    )
}

fn inner_text(view: &View, name: &str) -> String {
    let element = view.element_by_name(name).expect("element exists");
    element.as_any().downcast_ref::<Label>().expect("a label").inner_text()
}

#[test]
fn test_attribute_conversion() {
    let view = new_view();
    load_view_from_xml(
        &view,
        r#"<view width="300" height="200">
             <label name="good" width="120" height="18" visible="false"/>
             <label name="bad" width="abc" height="18" bogus="1"/>
           </view>"#,
        "main.xml",
    )
    .unwrap();

    assert_eq!(view.width(), 300.0);
    assert_eq!(view.height(), 200.0);

    let good = view.element_by_name("good").unwrap();
    assert_eq!(good.element_base().width(), 120.0);
    assert!(!good.element_base().is_visible());

    // The failed attributes are skipped; the rest still apply.
    let bad = view.element_by_name("bad").unwrap();
    assert_eq!(bad.element_base().width(), 0.0);
    assert_eq!(bad.element_base().height(), 18.0);
}

#[test]
fn test_text_content_becomes_inner_text() {
    let view = new_view();
    load_view_from_xml(
        &view,
        "<view>\n  <label name=\"greeting\" innerText=\"ignored\">\n    Hello &amp; welcome\n  </label>\n</view>",
        "main.xml",
    )
    .unwrap();
    assert_eq!(inner_text(&view, "greeting"), "Hello & welcome");
}

#[test]
fn test_nested_elements_and_leaf_children() {
    let view = new_view();
    load_view_from_xml(
        &view,
        r#"<view>
             <div name="outer" autoscroll="true">
               <div name="inner">
                 <label name="deep">text</label>
               </div>
             </div>
             <label name="leaf"><div name="orphan"/></label>
             <nosuchtag name="unknown"/>
           </view>"#,
        "main.xml",
    )
    .unwrap();

    let outer = view.element_by_name("outer").unwrap();
    assert!(outer.as_any().downcast_ref::<Div>().unwrap().is_autoscroll());
    let deep = view.element_by_name("deep").unwrap();
    let inner = deep.element_base().parent().unwrap();
    assert_eq!(inner.element_base().name(), "inner");

    // Labels hold no children and unknown tags create nothing.
    assert!(view.element_by_name("orphan").is_none());
    assert!(view.element_by_name("unknown").is_none());
    assert_eq!(view.children().count(), 2);
    assert_eq!(view.element_count(), 4);
}

#[test]
fn test_scripts_and_handlers() {
    let view = new_view();
    let script = Arc::new(RecordingScript::default());
    view.set_script_context(Some(script.clone() as Arc<dyn ScriptContext>));
    load_view_from_xml(
        &view,
        r#"<view width="100" height="100">
             <script>setup()</script>
             <div name="button" width="50" height="50" onclick="pressed()">
               <script>ignored()</script>
             </div>
             <div name="broken" onclick="syntax error"/>
           </view>"#,
        "main.xml",
    )
    .unwrap();
    assert_eq!(script.entries(), vec!["run@2 setup()".to_string()]);

    view.on_mouse_event(&MouseEvent::new(EventType::Click, 10.0, 10.0, MouseButton::Left));
    assert_eq!(
        script.entries(),
        vec!["run@2 setup()".to_string(), "call pressed()".to_string()]
    );

    let broken = view.element_by_name("broken").unwrap();
    assert!(!broken.element_base().signal(EventType::Click).has_active_connections());
}

#[test]
fn test_handlers_need_a_script_context() {
    let view = new_view();
    load_view_from_xml(
        &view,
        r#"<view><div name="button" onclick="pressed()"/></view>"#,
        "main.xml",
    )
    .unwrap();
    let button = view.element_by_name("button").unwrap();
    assert!(!button.element_base().signal(EventType::Click).has_active_connections());
}

#[test]
fn test_append_element_from_xml() {
    let view = new_view();
    let panel = view
        .children()
        .append_element_from_xml(r#"<div name="panel" width="40"><label name="l">hi</label></div>"#)
        .unwrap();
    assert_eq!(panel.element_base().width(), 40.0);
    assert_eq!(inner_text(&view, "l"), "hi");

    let first = view
        .children()
        .insert_element_from_xml(r#"<label name="first"/>"#, Some(&panel))
        .unwrap();
    assert_eq!(first.element_base().name(), "first");
    assert_eq!(view.children().count(), 2);

    assert!(view.children().append_element_from_xml("<div>").is_none());
    assert_eq!(view.children().count(), 2);
}

#[test]
fn test_load_errors() {
    let view = new_view();
    let err = load_view_from_xml(&view, "<gadget/>", "main.xml").unwrap_err();
    assert!(matches!(err, XmlError::UnexpectedRoot { ref found, .. } if found == "gadget"));

    let err = load_view_from_xml(&view, "<view>\n  <div>\n</view>", "main.xml").unwrap_err();
    match err {
        XmlError::Parse { file, row, .. } => {
            assert_eq!(file, "main.xml");
            assert!(row >= 2);
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
    assert_eq!(view.element_count(), 0);
}

#[test]
fn test_xpath_map() {
    let parser = QuickXmlParser::new();
    let map = parser
        .parse_xpath_map(
            r#"<gadget minimumGadgetHostVersion="5.0">
                 <about>
                   <name>Clock</name>
                   <author name="someone"/>
                 </about>
                 <install><file>a.dll</file><file>b.dll</file></install>
               </gadget>"#,
            "gadget.gmanifest",
            "gadget",
        )
        .unwrap();
    assert_eq!(map.get("@minimumGadgetHostVersion").map(String::as_str), Some("5.0"));
    assert_eq!(map.get("about/name").map(String::as_str), Some("Clock"));
    assert_eq!(map.get("about/author@name").map(String::as_str), Some("someone"));
    assert_eq!(map.get("install/file").map(String::as_str), Some("a.dll"));
    assert_eq!(map.get("install/file[2]").map(String::as_str), Some("b.dll"));

    assert!(matches!(
        parser.parse_xpath_map("<view/>", "gadget.gmanifest", "gadget"),
        Err(XmlError::UnexpectedRoot { .. })
    ));
}
