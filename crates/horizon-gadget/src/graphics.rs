//! Graphics capability interfaces.
//!
//! Rendering is provided by the host through [`Graphics`], which creates
//! [`Canvas`]es. Elements draw into their own canvas and containers
//! composite child canvases into theirs. [`RecordingGraphics`] is a
//! headless implementation that records every operation, used by tests and
//! by hosts that only need layout.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// An RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Self = Self::from_rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::from_rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Create an opaque color from RGB components.
    pub const fn from_rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rrggbb` or `#aarrggbb`.
    pub fn parse(text: &str) -> Option<Self> {
        let hex = text.trim().strip_prefix('#')?;
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .map(|v| f64::from(v) / 255.0)
        };
        match hex.len() {
            6 => Some(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: 1.0,
            }),
            8 => Some(Self {
                a: channel(0)?,
                r: channel(2)?,
                g: channel(4)?,
                b: channel(6)?,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if self.a >= 1.0 {
            write!(f, "#{:02X}{:02X}{:02X}", byte(self.r), byte(self.g), byte(self.b))
        } else {
            write!(
                f,
                "#{:02X}{:02X}{:02X}{:02X}",
                byte(self.a),
                byte(self.r),
                byte(self.g),
                byte(self.b)
            )
        }
    }
}

/// A drawing surface.
pub trait Canvas: Send + 'static {
    /// Width in pixels.
    fn width(&self) -> f64;
    /// Height in pixels.
    fn height(&self) -> f64;
    /// Clear to transparent.
    fn clear(&mut self);
    /// Save the transform and opacity.
    fn push_state(&mut self);
    /// Restore the last saved state.
    fn pop_state(&mut self);
    /// Translate the coordinate system.
    fn translate(&mut self, dx: f64, dy: f64);
    /// Rotate the coordinate system by `radians`.
    fn rotate(&mut self, radians: f64);
    /// Multiply the current opacity.
    fn multiply_opacity(&mut self, opacity: f64);
    /// Draw a line.
    fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Color);
    /// Fill a rectangle.
    fn draw_filled_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color);
    /// Draw a run of text.
    fn draw_text(&mut self, x: f64, y: f64, text: &str, color: Color);
    /// Draw another canvas with its origin at `(x, y)`.
    fn draw_canvas(&mut self, x: f64, y: f64, canvas: &dyn Canvas);
    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// A canvas shared between an element and whoever composites it.
pub type SharedCanvas = Arc<Mutex<dyn Canvas>>;

/// Creates canvases.
pub trait Graphics: Send + Sync {
    /// Create a canvas of the given size.
    fn new_canvas(&self, width: f64, height: f64) -> SharedCanvas;

    /// The zoom factor applied by the host.
    fn zoom(&self) -> f64 {
        1.0
    }
}

/// One operation recorded by [`RecordingCanvas`].
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Clear,
    PushState,
    PopState,
    Translate(f64, f64),
    Rotate(f64),
    Opacity(f64),
    Line {
        from: (f64, f64),
        to: (f64, f64),
        width: f64,
        color: Color,
    },
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Color,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
    },
    /// A nested canvas with the operations it held when drawn.
    Canvas {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        ops: Vec<CanvasOp>,
    },
}

/// A canvas that records operations instead of rasterizing.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    width: f64,
    height: f64,
    ops: Vec<CanvasOp>,
}

impl RecordingCanvas {
    /// Create an empty canvas.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// The operations recorded since the last clear.
    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    /// All text drawn on this canvas and nested canvases, in order.
    pub fn texts(&self) -> Vec<String> {
        fn collect(ops: &[CanvasOp], out: &mut Vec<String>) {
            for op in ops {
                match op {
                    CanvasOp::Text { text, .. } => out.push(text.clone()),
                    CanvasOp::Canvas { ops, .. } => collect(ops, out),
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.ops, &mut out);
        out
    }
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(CanvasOp::Clear);
    }

    fn push_state(&mut self) {
        self.ops.push(CanvasOp::PushState);
    }

    fn pop_state(&mut self) {
        self.ops.push(CanvasOp::PopState);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.ops.push(CanvasOp::Translate(dx, dy));
    }

    fn rotate(&mut self, radians: f64) {
        self.ops.push(CanvasOp::Rotate(radians));
    }

    fn multiply_opacity(&mut self, opacity: f64) {
        self.ops.push(CanvasOp::Opacity(opacity));
    }

    fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Color) {
        self.ops.push(CanvasOp::Line {
            from: (x0, y0),
            to: (x1, y1),
            width,
            color,
        });
    }

    fn draw_filled_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.ops.push(CanvasOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str, _color: Color) {
        self.ops.push(CanvasOp::Text {
            x,
            y,
            text: text.to_string(),
        });
    }

    fn draw_canvas(&mut self, x: f64, y: f64, canvas: &dyn Canvas) {
        let ops = canvas
            .as_any()
            .downcast_ref::<RecordingCanvas>()
            .map(|recorded| recorded.ops.clone())
            .unwrap_or_default();
        self.ops.push(CanvasOp::Canvas {
            x,
            y,
            width: canvas.width(),
            height: canvas.height(),
            ops,
        });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A [`Graphics`] producing [`RecordingCanvas`]es.
#[derive(Debug, Default)]
pub struct RecordingGraphics {
    created: Mutex<usize>,
}

impl RecordingGraphics {
    /// Create a recording graphics.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many canvases have been created.
    pub fn canvases_created(&self) -> usize {
        *self.created.lock()
    }
}

impl Graphics for RecordingGraphics {
    fn new_canvas(&self, width: f64, height: f64) -> SharedCanvas {
        *self.created.lock() += 1;
        Arc::new(Mutex::new(RecordingCanvas::new(width, height)))
    }
}

/// Record the draw commands of a recording canvas held behind a
/// [`SharedCanvas`].
pub fn recorded_ops(canvas: &SharedCanvas) -> Vec<CanvasOp> {
    canvas
        .lock()
        .as_any()
        .downcast_ref::<RecordingCanvas>()
        .map(|recorded| recorded.ops().to_vec())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!(Color::parse("#FF0000"), Some(Color::from_rgb(1.0, 0.0, 0.0)));
        let translucent = Color::parse("#80000000").unwrap();
        assert!((translucent.a - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(Color::parse("red"), None);
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::WHITE.to_string(), "#FFFFFF");
    }

    #[test]
    fn test_recording_canvas_nesting() {
        let graphics = RecordingGraphics::new();
        let inner = graphics.new_canvas(10.0, 10.0);
        inner.lock().draw_text(0.0, 0.0, "hello", Color::BLACK);

        let mut outer = RecordingCanvas::new(20.0, 20.0);
        outer.draw_canvas(5.0, 5.0, &*inner.lock());
        assert_eq!(outer.texts(), vec!["hello"]);
        assert_eq!(graphics.canvases_created(), 1);
    }
}
