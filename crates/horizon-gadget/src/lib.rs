//! Horizon Gadget - a desktop gadget host.
//!
//! A gadget is a tree of scriptable elements rooted at a [`View`],
//! described by XML and driven by script event handlers. This crate
//! provides:
//!
//! - **Elements**: the element trait, the `div` and `label` classes, the
//!   ordered [`Elements`] collection and the tag-keyed [`ElementFactory`]
//! - **View**: element registry, mouse and drag dispatch, focus, popup
//!   and incremental drawing
//! - **XML**: a DOM, a parser and the binding of attributes to properties
//! - **Extensions**: native modules registering element classes, script
//!   bindings and framework members
//! - **Graphics**: the canvas interface consumed by drawing, with a
//!   recording implementation
//!
//! The calling convention shared with script engines (variants, callables,
//! signals and scriptable objects) lives in `horizon-gadget-core` and is
//! re-exported here.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use horizon_gadget::{ElementFactory, RecordingGraphics, View, load_view_from_xml};
//!
//! let view = View::new(
//!     Arc::new(ElementFactory::with_builtin()),
//!     Arc::new(RecordingGraphics::new()),
//! );
//! load_view_from_xml(
//!     &view,
//!     r##"<view width="200" height="100">
//!          <div name="panel" width="200" height="100" background="#336699">
//!            <label name="title" width="120" height="20">Hello</label>
//!          </div>
//!        </view>"##,
//!     "main.xml",
//! )
//! .unwrap();
//!
//! assert_eq!(view.element_count(), 2);
//! assert!(view.element_by_name("title").is_some());
//! assert!(view.draw().is_some());
//! ```

pub mod config;
pub mod element;
pub mod error;
pub mod event;
pub mod extension;
pub mod graphics;
pub mod logging;
pub mod script;
pub mod view;
pub mod xml;

pub use horizon_gadget_core::*;

pub use config::{ExtensionConfig, GadgetConfig};
pub use element::{Div, Element, ElementBase, ElementContext, ElementFactory, ElementRef, Elements, Label};
pub use error::{ConfigError, ExtensionError, GadgetError, Result, XmlError};
pub use event::{DragEvent, Event, EventResult, EventType, MouseButton, MouseEvent};
pub use extension::{ExtensionManager, ExtensionModule};
pub use graphics::{Canvas, Color, Graphics, RecordingCanvas, RecordingGraphics, SharedCanvas};
pub use logging::ElementTreeDebug;
pub use script::{ScriptContext, wrap_script_function};
pub use view::{DebugMode, ElementId, View};
pub use xml::{DomElement, QuickXmlParser, XmlParser, load_view_from_xml};

static_assertions::assert_impl_all!(View: Send, Sync);
static_assertions::assert_impl_all!(Elements: Send, Sync);
static_assertions::assert_impl_all!(ElementFactory: Send, Sync);
static_assertions::assert_impl_all!(ExtensionManager: Send, Sync);
static_assertions::assert_impl_all!(GadgetConfig: Send, Sync, Clone);
