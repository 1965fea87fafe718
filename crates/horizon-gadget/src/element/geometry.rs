//! Coordinate transforms between a parent and a pinned, rotated child.
//!
//! A child is placed at `(x, y)` in its parent. Its pin point `(pin_x,
//! pin_y)`, in child coordinates, lands on `(x, y)` and the child is
//! rotated clockwise around it.

/// Convert degrees to radians.
pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Map a point in parent coordinates into child coordinates.
pub fn parent_coord_to_child_coord(
    x: f64,
    y: f64,
    child_x: f64,
    child_y: f64,
    pin_x: f64,
    pin_y: f64,
    rotation_radians: f64,
) -> (f64, f64) {
    let x0 = x - child_x;
    let y0 = y - child_y;
    if rotation_radians == 0.0 {
        return (x0 + pin_x, y0 + pin_y);
    }
    let (sin, cos) = rotation_radians.sin_cos();
    (x0 * cos + y0 * sin + pin_x, y0 * cos - x0 * sin + pin_y)
}

/// Map a point in child coordinates into parent coordinates.
pub fn child_coord_to_parent_coord(
    child_x: f64,
    child_y: f64,
    x: f64,
    y: f64,
    pin_x: f64,
    pin_y: f64,
    rotation_radians: f64,
) -> (f64, f64) {
    let x0 = child_x - pin_x;
    let y0 = child_y - pin_y;
    if rotation_radians == 0.0 {
        return (x0 + x, y0 + y);
    }
    let (sin, cos) = rotation_radians.sin_cos();
    (x0 * cos - y0 * sin + x, x0 * sin + y0 * cos + y)
}

/// An axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extents {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extents {
    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// The box a `width` x `height` child occupies in its parent.
pub fn child_extent_in_parent(
    x: f64,
    y: f64,
    pin_x: f64,
    pin_y: f64,
    width: f64,
    height: f64,
    rotation_radians: f64,
) -> Extents {
    let corners = [(0.0, 0.0), (width, 0.0), (0.0, height), (width, height)];
    let mut extents = Extents {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for (cx, cy) in corners {
        let (px, py) = child_coord_to_parent_coord(cx, cy, x, y, pin_x, pin_y, rotation_radians);
        extents.min_x = extents.min_x.min(px);
        extents.min_y = extents.min_y.min(py);
        extents.max_x = extents.max_x.max(px);
        extents.max_y = extents.max_y.max(py);
    }
    extents
}
