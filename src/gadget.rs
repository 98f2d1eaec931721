use crate::error::{LayoutError, Result};

/// Integer lattice point; `y` grows downward, positions are top-left corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Point { x, y }
    }
}

/// Axis-aligned rectangle with integer corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    /// True when the open interiors intersect; touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// The rectangle grown by `dx` and `dy` on every side.
    pub fn inflated(&self, dx: i64, dy: i64) -> Rect {
        Rect {
            x: self.x - dx,
            y: self.y - dy,
            width: self.width + 2 * dx,
            height: self.height + 2 * dy,
        }
    }
}

/// A rectangular unit of the output drawing. Domain gadgets, wires and
/// barriers all satisfy this contract; the layout modules observe them only
/// through it.
pub trait PlanarGadget {
    /// Width in lattice units, positive.
    fn width(&self) -> i64;
    /// Height in lattice units, positive.
    fn height(&self) -> i64;
    /// Boundary lattice points where other gadgets may attach, in clockwise
    /// order starting at the top-left-most port.
    fn ports(&self) -> Vec<Point>;
}

/// Factory for wire gadgets. Straight wires carry exactly two ports on
/// opposite edges, turn wires four ports, one per edge; all ports share one
/// fixed offset from the wire's corner.
pub trait WireFactory {
    /// Thickness of vertical wires.
    fn width(&self) -> i64;
    /// Thickness of horizontal wires.
    fn height(&self) -> i64;
    /// Offset of every wire port from the wire's nearest corner.
    fn port_offset(&self) -> i64;
    /// A horizontal wire of the given width, ports on its left and right
    /// edges.
    fn horizontal_wire(&self, width: i64) -> Box<dyn PlanarGadget>;
    /// A vertical wire of the given height, ports on its top and bottom
    /// edges.
    fn vertical_wire(&self, height: i64) -> Box<dyn PlanarGadget>;
    /// A turn wire joining a horizontal and a vertical direction.
    fn turn_wire(&self) -> Box<dyn PlanarGadget>;
}

/// Factory for barrier gadgets: port-less rectangles blocking traversal.
pub trait BarrierFactory {
    fn min_width(&self) -> i64;
    fn min_height(&self) -> i64;
    fn barrier(&self, width: i64, height: i64) -> Box<dyn PlanarGadget>;
}

/// Role of a placed rectangle in a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacedKind {
    Gadget,
    Wire,
    Barrier,
}

/// One gadget placed at an absolute position.
pub struct PlacedGadget {
    pub gadget: Box<dyn PlanarGadget>,
    pub position: Point,
    pub kind: PlacedKind,
}

impl PlacedGadget {
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.gadget.width(),
            self.gadget.height(),
        )
    }

    /// Port positions in absolute coordinates.
    pub fn absolute_ports(&self) -> Vec<Point> {
        self.gadget
            .ports()
            .iter()
            .map(|p| Point::new(p.x + self.position.x, p.y + self.position.y))
            .collect()
    }
}

impl std::fmt::Debug for PlacedGadget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacedGadget")
            .field("rect", &self.rect())
            .field("kind", &self.kind)
            .finish()
    }
}

/// Side of a rectangle boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub fn clockwise_next(self) -> Side {
        match self {
            Side::Top => Side::Right,
            Side::Right => Side::Bottom,
            Side::Bottom => Side::Left,
            Side::Left => Side::Top,
        }
    }

    pub fn counterclockwise_next(self) -> Side {
        match self {
            Side::Top => Side::Left,
            Side::Left => Side::Bottom,
            Side::Bottom => Side::Right,
            Side::Right => Side::Top,
        }
    }
}

/// The side of a `width x height` boundary a point lies on. Corner points
/// resolve clockwise: top before right before bottom before left.
pub fn side_of(p: Point, width: i64, height: i64) -> Option<Side> {
    if p.y == 0 && p.x < width {
        return Some(Side::Top);
    }
    if p.x == width && p.y < height {
        return Some(Side::Right);
    }
    if p.y == height && p.x > 0 {
        return Some(Side::Bottom);
    }
    if p.x == 0 && p.y > 0 {
        return Some(Side::Left);
    }
    None
}

/// Clockwise boundary parameter of a point on a `width x height` boundary,
/// measured from the top-left corner.
fn boundary_parameter(p: Point, width: i64, height: i64) -> Option<i64> {
    match side_of(p, width, height)? {
        Side::Top => Some(p.x),
        Side::Right => Some(width + p.y),
        Side::Bottom => Some(width + height + (width - p.x)),
        Side::Left => Some(2 * width + height + (height - p.y)),
    }
}

/// Validates the gadget contract: ports on the boundary, no duplicates,
/// clockwise order starting at the top-left-most port, and room for a wire
/// plus a barrier between adjacent ports on the same side.
pub fn validate_gadget(
    gadget: &dyn PlanarGadget,
    wire: &dyn WireFactory,
    barrier: &dyn BarrierFactory,
) -> Result<()> {
    let (w, h) = (gadget.width(), gadget.height());
    if w <= 0 || h <= 0 {
        return Err(LayoutError::InvalidGadget(format!(
            "gadget dimensions {}x{} must be positive",
            w, h
        )));
    }

    let ports = gadget.ports();
    let mut params = Vec::with_capacity(ports.len());
    for p in &ports {
        match boundary_parameter(*p, w, h) {
            Some(t) => params.push(t),
            None => {
                return Err(LayoutError::InvalidGadget(format!(
                    "port ({}, {}) is not on the gadget boundary",
                    p.x, p.y
                )));
            }
        }
    }

    // clockwise means cyclically increasing boundary parameters: at most one
    // wrap-around descent, no repeats
    let mut descents = 0;
    for i in 1..params.len() {
        if params[i] == params[i - 1] {
            return Err(LayoutError::InvalidGadget("duplicated port".to_string()));
        }
        if params[i] < params[i - 1] {
            descents += 1;
        }
    }
    if descents > 1 {
        return Err(LayoutError::InvalidGadget(
            "ports are not in clockwise order".to_string(),
        ));
    }
    if let Some(first) = ports.first() {
        if ports
            .iter()
            .any(|p| (p.y, p.x) < (first.y, first.x))
        {
            return Err(LayoutError::InvalidGadget(
                "ports must start at the top-left-most port".to_string(),
            ));
        }
    }

    // adjacent ports on one side must leave room for a wire plus a barrier
    for i in 1..ports.len() {
        let (a, b) = (ports[i - 1], ports[i]);
        let (sa, sb) = (side_of(a, w, h).unwrap(), side_of(b, w, h).unwrap());
        if sa != sb {
            continue;
        }
        let (gap, need) = match sa {
            Side::Top | Side::Bottom => ((b.x - a.x).abs(), wire.width() + barrier.min_width()),
            Side::Left | Side::Right => ((b.y - a.y).abs(), wire.height() + barrier.min_height()),
        };
        if gap < need {
            return Err(LayoutError::InvalidGadget(format!(
                "ports {} and {} leave only {} lattice units, {} required",
                i - 1,
                i,
                gap,
                need
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Box4 {
        ports: Vec<Point>,
    }

    impl PlanarGadget for Box4 {
        fn width(&self) -> i64 {
            20
        }
        fn height(&self) -> i64 {
            10
        }
        fn ports(&self) -> Vec<Point> {
            self.ports.clone()
        }
    }

    struct Wires;
    impl WireFactory for Wires {
        fn width(&self) -> i64 {
            3
        }
        fn height(&self) -> i64 {
            3
        }
        fn port_offset(&self) -> i64 {
            1
        }
        fn horizontal_wire(&self, _: i64) -> Box<dyn PlanarGadget> {
            unimplemented!("not needed for validation tests")
        }
        fn vertical_wire(&self, _: i64) -> Box<dyn PlanarGadget> {
            unimplemented!("not needed for validation tests")
        }
        fn turn_wire(&self) -> Box<dyn PlanarGadget> {
            unimplemented!("not needed for validation tests")
        }
    }

    struct Barriers;
    impl BarrierFactory for Barriers {
        fn min_width(&self) -> i64 {
            3
        }
        fn min_height(&self) -> i64 {
            3
        }
        fn barrier(&self, _: i64, _: i64) -> Box<dyn PlanarGadget> {
            unimplemented!("not needed for validation tests")
        }
    }

    #[test]
    fn test_rect_overlap_excludes_touching() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        let c = Rect::new(9, 9, 5, 5);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_valid_gadget_passes() {
        let g = Box4 {
            ports: vec![
                Point::new(5, 0),
                Point::new(15, 0),
                Point::new(20, 5),
                Point::new(10, 10),
            ],
        };
        assert!(validate_gadget(&g, &Wires, &Barriers).is_ok());
    }

    #[test]
    fn test_port_off_boundary_fails() {
        let g = Box4 {
            ports: vec![Point::new(5, 5)],
        };
        assert!(matches!(
            validate_gadget(&g, &Wires, &Barriers),
            Err(LayoutError::InvalidGadget(_))
        ));
    }

    #[test]
    fn test_counterclockwise_ports_fail() {
        let g = Box4 {
            ports: vec![Point::new(15, 0), Point::new(5, 0)],
        };
        assert!(validate_gadget(&g, &Wires, &Barriers).is_err());
    }

    #[test]
    fn test_crowded_ports_fail() {
        let g = Box4 {
            ports: vec![Point::new(5, 0), Point::new(7, 0)],
        };
        assert!(validate_gadget(&g, &Wires, &Barriers).is_err());
    }

    #[test]
    fn test_side_of_corners_resolve_clockwise() {
        assert_eq!(side_of(Point::new(0, 0), 10, 10), Some(Side::Top));
        assert_eq!(side_of(Point::new(10, 0), 10, 10), Some(Side::Right));
        assert_eq!(side_of(Point::new(10, 10), 10, 10), Some(Side::Bottom));
        assert_eq!(side_of(Point::new(0, 10), 10, 10), Some(Side::Left));
    }
}
