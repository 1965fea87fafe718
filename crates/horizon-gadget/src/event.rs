//! Input events delivered to views and elements.
//!
//! Events carry coordinates in the space of whoever receives them: a view
//! receives view coordinates, and each dispatch step re-expresses the event
//! in the local coordinates of the child it forwards to.

/// Keyboard modifiers that may be held during input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held.
    pub alt: bool,
    /// The Meta/Super key is held.
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    /// No button (moves, wheel).
    #[default]
    None,
    /// Primary button (usually left).
    Left,
    /// Secondary button (usually right).
    Right,
    /// Middle button (scroll wheel click).
    Middle,
}

/// The kinds of pointer event an element can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A button was pressed.
    MouseDown,
    /// A button was released.
    MouseUp,
    /// Left click.
    Click,
    /// Left double click.
    DblClick,
    /// Right click.
    RClick,
    /// Right double click.
    RDblClick,
    /// The pointer moved.
    MouseMove,
    /// The pointer entered an element.
    MouseOver,
    /// The pointer left an element.
    MouseOut,
    /// The wheel turned.
    MouseWheel,
    /// A drag moved over a drop target.
    DragOver,
    /// A drag left a drop target.
    DragOut,
    /// A drag was dropped on a drop target.
    DragDrop,
}

impl EventType {
    /// Every event type, in declaration order.
    pub const ALL: [EventType; 13] = [
        Self::MouseDown,
        Self::MouseUp,
        Self::Click,
        Self::DblClick,
        Self::RClick,
        Self::RDblClick,
        Self::MouseMove,
        Self::MouseOver,
        Self::MouseOut,
        Self::MouseWheel,
        Self::DragOver,
        Self::DragOut,
        Self::DragDrop,
    ];

    /// The script-visible signal name for this event type.
    pub fn signal_name(self) -> &'static str {
        match self {
            Self::MouseDown => "onmousedown",
            Self::MouseUp => "onmouseup",
            Self::Click => "onclick",
            Self::DblClick => "ondblclick",
            Self::RClick => "onrclick",
            Self::RDblClick => "onrdblclick",
            Self::MouseMove => "onmousemove",
            Self::MouseOver => "onmouseover",
            Self::MouseOut => "onmouseout",
            Self::MouseWheel => "onmousewheel",
            Self::DragOver => "ondragover",
            Self::DragOut => "ondragout",
            Self::DragDrop => "ondragdrop",
        }
    }

    /// Whether this is a drag event type.
    pub fn is_drag(self) -> bool {
        matches!(self, Self::DragOver | Self::DragOut | Self::DragDrop)
    }
}

/// How an event was handled.
///
/// Ordered so that the stronger outcome compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EventResult {
    /// Nobody handled the event.
    #[default]
    Unhandled,
    /// The event was handled.
    Handled,
    /// A handler canceled the default action.
    Canceled,
}

/// A pointer event.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    /// The event type.
    pub event_type: EventType,
    /// X coordinate in the receiver's space.
    pub x: f64,
    /// Y coordinate in the receiver's space.
    pub y: f64,
    /// Horizontal wheel delta.
    pub wheel_delta_x: i32,
    /// Vertical wheel delta.
    pub wheel_delta_y: i32,
    /// The button involved.
    pub button: MouseButton,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
}

impl MouseEvent {
    /// Create a mouse event at a position.
    pub fn new(event_type: EventType, x: f64, y: f64, button: MouseButton) -> Self {
        Self {
            event_type,
            x,
            y,
            wheel_delta_x: 0,
            wheel_delta_y: 0,
            button,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    /// The same event at another position.
    pub fn at(&self, x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..self.clone()
        }
    }

    /// The same event with another type.
    pub fn with_type(&self, event_type: EventType) -> Self {
        Self {
            event_type,
            ..self.clone()
        }
    }
}

/// A drag-and-drop event.
#[derive(Debug, Clone, PartialEq)]
pub struct DragEvent {
    /// The event type.
    pub event_type: EventType,
    /// X coordinate in the receiver's space.
    pub x: f64,
    /// Y coordinate in the receiver's space.
    pub y: f64,
    /// The dragged file paths or URLs.
    pub drag_files: Vec<String>,
}

impl DragEvent {
    /// Create a drag event.
    pub fn new(event_type: EventType, x: f64, y: f64, drag_files: Vec<String>) -> Self {
        Self {
            event_type,
            x,
            y,
            drag_files,
        }
    }

    /// The same event at another position.
    pub fn at(&self, x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..self.clone()
        }
    }

    /// The same event with another type.
    pub fn with_type(&self, event_type: EventType) -> Self {
        Self {
            event_type,
            ..self.clone()
        }
    }
}

/// The event currently being fired, readable by handlers through the view.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A pointer event.
    Mouse(MouseEvent),
    /// A drag event.
    Drag(DragEvent),
}

impl Event {
    /// The event type.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Mouse(event) => event.event_type,
            Self::Drag(event) => event.event_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_result_ordering() {
        assert!(EventResult::Canceled > EventResult::Handled);
        assert!(EventResult::Handled > EventResult::Unhandled);
        assert_eq!(
            EventResult::Unhandled.max(EventResult::Handled),
            EventResult::Handled
        );
    }

    #[test]
    fn test_mouse_event_remap() {
        let event = MouseEvent::new(EventType::MouseDown, 10.0, 20.0, MouseButton::Left);
        let local = event.at(1.0, 2.0);
        assert_eq!((local.x, local.y), (1.0, 2.0));
        assert_eq!(local.button, MouseButton::Left);
        assert_eq!(local.with_type(EventType::Click).event_type, EventType::Click);
        assert_eq!(EventType::DragDrop.signal_name(), "ondragdrop");
        assert!(EventType::DragOut.is_drag());
    }
}
