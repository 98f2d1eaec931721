use crate::error::{LayoutError, Result};
use crate::gadget::{
    validate_gadget, BarrierFactory, PlacedGadget, PlacedKind, PlanarGadget, Point, Rect, Side,
    WireFactory,
};

/// Designated exit of one connected port: the column (left edge of the exit
/// wire) on the region's top or bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortTarget {
    pub column: i64,
    pub above: bool,
}

/// Winding state of the wire chain growing out of one port: where it starts,
/// which side of the gadget it faces, its target column, and the rotation
/// sense of its winding.
#[derive(Debug, Clone)]
struct WireEndpoint {
    port_index: usize,
    port: Point,
    side: Side,
    target_x: i64,
    is_target_up: bool,
    clockwise: bool,
}

/// Output of routing one gadget inside its region: the gadget position and
/// every wire and barrier placed around it.
pub struct SingleLayout {
    pub gadget_position: Point,
    pub wires: Vec<PlacedGadget>,
    pub barriers: Vec<PlacedGadget>,
}

/// Routes the connected ports of one gadget to target columns on the top and
/// bottom edges of its allotted region, winding wires around the gadget and
/// filling the rest with barriers.
///
/// Endpoints are placed one at a time, innermost tracks first; an endpoint
/// whose wires would cross an already placed chain waits for the next round
/// and is retried earlier. The check is quadratic in the number of connected
/// ports, which is accepted here.
pub struct SingleGadgetLayout<'a> {
    gadget: &'a dyn PlanarGadget,
    wire: &'a dyn WireFactory,
    barrier: &'a dyn BarrierFactory,
    /// One entry per gadget port; `None` for unconnected ports.
    targets: Vec<Option<PortTarget>>,
}

impl<'a> SingleGadgetLayout<'a> {
    pub fn new(
        gadget: &'a dyn PlanarGadget,
        wire: &'a dyn WireFactory,
        barrier: &'a dyn BarrierFactory,
        targets: Vec<Option<PortTarget>>,
    ) -> Result<Self> {
        validate_gadget(gadget, wire, barrier)?;
        if targets.len() != gadget.ports().len() {
            return Err(LayoutError::InvalidGadget(format!(
                "{} targets for {} ports",
                targets.len(),
                gadget.ports().len()
            )));
        }
        Ok(SingleGadgetLayout {
            gadget,
            wire,
            barrier,
            targets,
        })
    }

    fn connected_ports(&self) -> i64 {
        self.targets.iter().filter(|t| t.is_some()).count() as i64
    }

    /// Minimum region width: the gadget plus the full winding budget of its
    /// connected ports.
    pub fn min_width(&self) -> i64 {
        let k = self.connected_ports();
        let ww = self.wire.width();
        let bw = self.barrier.min_width();
        self.gadget.width()
            + 6 * ww.max(bw)
            + (6 * k - 3).max(0) * (bw + ww - 1)
            + 3 * bw
            + 6 * k * ww
    }

    /// Minimum region height, symmetric to [`Self::min_width`].
    pub fn min_height(&self) -> i64 {
        let k = self.connected_ports();
        let wh = self.wire.height();
        let bh = self.barrier.min_height();
        self.gadget.height()
            + 6 * wh.max(bh)
            + (6 * k - 3).max(0) * (bh + wh - 1)
            + 3 * bh
            + 6 * k * wh
    }

    /// Routes every connected port inside `region` and fills the remaining
    /// area with barriers.
    pub fn layout(&self, region: Rect) -> Result<SingleLayout> {
        if region.width < self.min_width() || region.height < self.min_height() {
            return Err(LayoutError::InvalidGadget(format!(
                "region {}x{} below the required {}x{}",
                region.width,
                region.height,
                self.min_width(),
                self.min_height()
            )));
        }

        let gw = self.gadget.width();
        let gh = self.gadget.height();
        let gx = region.x + (region.width - gw) / 2;
        let gy = region.y + (region.height - gh) / 2;
        let grect = Rect::new(gx, gy, gw, gh);

        let endpoints = self.make_endpoints(gx, gy, grect);

        // initial order: tightest approach spans claim the innermost tracks
        let mut priority: Vec<usize> = (0..endpoints.len()).collect();
        priority.sort_by_key(|&i| (approach_span(&endpoints[i], &grect), i));

        let restarts = 2 * endpoints.len() + 1;
        for _ in 0..restarts {
            let mut router = Router::new(self.wire, region, grect, self.barrier);
            let mut failed = None;
            for &i in &priority {
                if router.route(&endpoints[i]).is_err() {
                    failed = Some(i);
                    break;
                }
            }
            match failed {
                None => {
                    let mut occupied = vec![grect];
                    occupied.extend(router.placed.iter().copied());
                    let barriers = fill_with_barriers(region, &occupied, self.barrier);
                    return Ok(SingleLayout {
                        gadget_position: Point::new(gx, gy),
                        wires: router.wires,
                        barriers,
                    });
                }
                Some(i) => {
                    // the blocked endpoint waits for nobody: try it earlier
                    priority.retain(|&j| j != i);
                    priority.insert(0, i);
                }
            }
        }

        Err(LayoutError::InvalidGadget(
            "port targets require crossing wires".to_string(),
        ))
    }

    fn make_endpoints(&self, gx: i64, gy: i64, _grect: Rect) -> Vec<WireEndpoint> {
        let ports = self.gadget.ports();
        let off = self.wire.port_offset();
        let mut out = Vec::new();
        for (i, target) in self.targets.iter().enumerate() {
            let Some(target) = target else { continue };
            let rel = ports[i];
            let side = crate::gadget::side_of(rel, self.gadget.width(), self.gadget.height())
                .expect("validated ports lie on the boundary");
            let port = Point::new(rel.x + gx, rel.y + gy);
            let centre = gx + self.gadget.width() / 2;
            let clockwise = match (side, target.above) {
                (Side::Top, true) => target.column >= port.x - off,
                (Side::Bottom, false) => target.column <= port.x - off,
                (Side::Left, true) => true,
                (Side::Left, false) => false,
                (Side::Right, true) => false,
                (Side::Right, false) => true,
                (Side::Top, false) => port.x > centre,
                (Side::Bottom, true) => port.x <= centre,
            };
            out.push(WireEndpoint {
                port_index: i,
                port,
                side,
                target_x: target.column,
                is_target_up: target.above,
                clockwise,
            });
        }
        out
    }
}

/// Horizontal distance the endpoint's final approach spans, used only to
/// seed the placement order.
fn approach_span(ep: &WireEndpoint, grect: &Rect) -> i64 {
    let anchor = match ep.side {
        Side::Top | Side::Bottom => ep.port.x,
        Side::Left => grect.x,
        Side::Right => grect.right(),
    };
    (ep.target_x - anchor).abs()
}

/// The sides the endpoint winds across, port side first, target side last,
/// with `laps` full extra turns around the gadget.
fn side_sequence(ep: &WireEndpoint, laps: usize) -> Vec<Side> {
    let target_side = if ep.is_target_up {
        Side::Top
    } else {
        Side::Bottom
    };
    let step = |s: Side| {
        if ep.clockwise {
            s.clockwise_next()
        } else {
            s.counterclockwise_next()
        }
    };
    let mut seq = vec![ep.side];
    let mut cur = ep.side;
    while cur != target_side {
        cur = step(cur);
        seq.push(cur);
    }
    for _ in 0..4 * laps {
        cur = step(cur);
        seq.push(cur);
    }
    seq
}

#[derive(Clone, Copy, Debug)]
enum Orientation {
    Horizontal,
    Vertical,
    Turn,
}

/// Sequential track-based emitter: every wind claims a fresh track on the
/// side it crosses, so later runs always lie strictly outside earlier ones.
struct Router<'a> {
    wire: &'a dyn WireFactory,
    region: Rect,
    grect: Rect,
    ww: i64,
    wh: i64,
    off: i64,
    bw: i64,
    bh: i64,
    /// Next free track per side, indexed by `side_index`.
    tracks: [i64; 4],
    /// Every wire rectangle placed so far.
    placed: Vec<Rect>,
    wires: Vec<PlacedGadget>,
}

fn side_index(s: Side) -> usize {
    match s {
        Side::Top => 0,
        Side::Right => 1,
        Side::Bottom => 2,
        Side::Left => 3,
    }
}

impl<'a> Router<'a> {
    fn new(
        wire: &'a dyn WireFactory,
        region: Rect,
        grect: Rect,
        barrier: &dyn BarrierFactory,
    ) -> Self {
        Router {
            wire,
            region,
            grect,
            ww: wire.width(),
            wh: wire.height(),
            off: wire.port_offset(),
            bw: barrier.min_width(),
            bh: barrier.min_height(),
            tracks: [0; 4],
            placed: Vec::new(),
            wires: Vec::new(),
        }
    }

    /// Band origin of track `i` on a side: the top edge for horizontal
    /// bands, the left edge for vertical bands.
    fn band(&self, side: Side, i: i64) -> i64 {
        match side {
            Side::Top => self.grect.y - self.bh - self.wh - i * (self.wh + self.bh),
            Side::Bottom => self.grect.bottom() + self.bh + i * (self.wh + self.bh),
            Side::Left => self.grect.x - self.bw - self.ww - i * (self.ww + self.bw),
            Side::Right => self.grect.right() + self.bw + i * (self.ww + self.bw),
        }
    }

    fn band_in_region(&self, side: Side, i: i64) -> bool {
        let c = self.band(side, i);
        match side {
            Side::Top | Side::Bottom => c >= self.region.y && c + self.wh <= self.region.bottom(),
            Side::Left | Side::Right => c >= self.region.x && c + self.ww <= self.region.right(),
        }
    }

    /// Routes one endpoint completely: stub, winding runs with turns, exit.
    /// Retries with extra laps or bumped tracks when a segment would come too
    /// close to an earlier wire.
    fn route(&mut self, ep: &WireEndpoint) -> Result<()> {
        // straight exit: the port already faces its column
        let target_side = if ep.is_target_up {
            Side::Top
        } else {
            Side::Bottom
        };
        if ep.side == target_side && ep.target_x == ep.port.x - self.off {
            let rect = if ep.is_target_up {
                Rect::new(
                    ep.target_x,
                    self.region.y,
                    self.ww,
                    ep.port.y - self.region.y,
                )
            } else {
                Rect::new(
                    ep.target_x,
                    ep.port.y,
                    self.ww,
                    self.region.bottom() - ep.port.y,
                )
            };
            if self.collides(&[rect]) {
                return Err(LayoutError::InvalidGadget(
                    "straight exit blocked by an earlier wire".to_string(),
                ));
            }
            self.push_vertical(rect);
            return Ok(());
        }

        for attempt in 0..16usize {
            let laps = attempt / 4;
            let bump = (attempt % 4) as i64;
            if let Some((rects, counts)) = self.try_route(ep, laps, bump) {
                for s in [Side::Top, Side::Right, Side::Bottom, Side::Left] {
                    let used = counts[side_index(s)];
                    if used > 0 {
                        self.tracks[side_index(s)] += used + bump;
                    }
                }
                self.emit(&rects);
                return Ok(());
            }
        }
        Err(LayoutError::InvalidGadget(format!(
            "port {} cannot reach its target column",
            ep.port_index
        )))
    }

    /// One placement attempt; returns the rectangles and per-side track
    /// consumption, or `None` when a segment degenerates or collides.
    #[allow(clippy::type_complexity)]
    fn try_route(
        &self,
        ep: &WireEndpoint,
        laps: usize,
        bump: i64,
    ) -> Option<(Vec<(Rect, Orientation)>, [i64; 4])> {
        let seq = side_sequence(ep, laps);

        // assign a track to every element of the side sequence
        let mut counts: [i64; 4] = [0; 4];
        let mut track_of = Vec::with_capacity(seq.len());
        for &s in &seq {
            let idx = self.tracks[side_index(s)] + bump + counts[side_index(s)];
            counts[side_index(s)] += 1;
            if !self.band_in_region(s, idx) {
                return None;
            }
            track_of.push(self.band(s, idx));
        }

        // turn positions: the stub turn, one corner turn per side change,
        // and the exit turn on the last band
        let mut turns: Vec<Point> = Vec::new();
        match ep.side {
            Side::Top | Side::Bottom => turns.push(Point::new(ep.port.x - self.off, track_of[0])),
            Side::Left | Side::Right => turns.push(Point::new(track_of[0], ep.port.y - self.off)),
        }
        for j in 0..seq.len() - 1 {
            let p = match (seq[j], seq[j + 1]) {
                (Side::Top | Side::Bottom, Side::Left | Side::Right) => {
                    Point::new(track_of[j + 1], track_of[j])
                }
                (Side::Left | Side::Right, Side::Top | Side::Bottom) => {
                    Point::new(track_of[j], track_of[j + 1])
                }
                _ => unreachable!("consecutive sides alternate orientation"),
            };
            turns.push(p);
        }
        turns.push(Point::new(ep.target_x, *track_of.last().unwrap()));

        let mut rects: Vec<(Rect, Orientation)> = Vec::new();

        // stub from the port to the first turn
        let t0 = turns[0];
        let (stub, stub_orientation) = match ep.side {
            Side::Top => (
                Rect::new(t0.x, t0.y + self.wh, self.ww, self.grect.y - t0.y - self.wh),
                Orientation::Vertical,
            ),
            Side::Bottom => (
                Rect::new(
                    t0.x,
                    self.grect.bottom(),
                    self.ww,
                    t0.y - self.grect.bottom(),
                ),
                Orientation::Vertical,
            ),
            Side::Left => (
                Rect::new(
                    t0.x + self.ww,
                    t0.y,
                    self.grect.x - t0.x - self.ww,
                    self.wh,
                ),
                Orientation::Horizontal,
            ),
            Side::Right => (
                Rect::new(self.grect.right(), t0.y, t0.x - self.grect.right(), self.wh),
                Orientation::Horizontal,
            ),
        };
        if stub.width <= 0 || stub.height <= 0 {
            return None;
        }
        rects.push((stub, stub_orientation));

        for w in turns.windows(2) {
            let (a, b) = (w[0], w[1]);
            rects.push((Rect::new(a.x, a.y, self.ww, self.wh), Orientation::Turn));
            let run = if a.y == b.y {
                let (lo, hi) = (a.x.min(b.x), a.x.max(b.x));
                if hi - lo - self.ww < 1 {
                    return None;
                }
                (
                    Rect::new(lo + self.ww, a.y, hi - lo - self.ww, self.wh),
                    Orientation::Horizontal,
                )
            } else {
                let (lo, hi) = (a.y.min(b.y), a.y.max(b.y));
                if hi - lo - self.wh < 1 {
                    return None;
                }
                (
                    Rect::new(a.x, lo + self.wh, self.ww, hi - lo - self.wh),
                    Orientation::Vertical,
                )
            };
            rects.push(run);
        }
        let exit_turn = *turns.last().unwrap();
        rects.push((
            Rect::new(exit_turn.x, exit_turn.y, self.ww, self.wh),
            Orientation::Turn,
        ));

        let exit = if ep.is_target_up {
            Rect::new(
                ep.target_x,
                self.region.y,
                self.ww,
                exit_turn.y - self.region.y,
            )
        } else {
            Rect::new(
                ep.target_x,
                exit_turn.y + self.wh,
                self.ww,
                self.region.bottom() - exit_turn.y - self.wh,
            )
        };
        if exit.height <= 0 {
            return None;
        }
        rects.push((exit, Orientation::Vertical));

        let plain: Vec<Rect> = rects.iter().map(|(r, _)| *r).collect();
        if self.collides(&plain) {
            return None;
        }
        // every rect except the stub must keep a barrier's breadth from the
        // gadget; the stub legitimately abuts it
        for (r, _) in rects.iter().skip(1) {
            if r.inflated(self.bw, self.bh).overlaps(&self.grect) {
                return None;
            }
        }

        Some((rects, counts))
    }

    /// True when any candidate rectangle comes within a barrier's breadth of
    /// an earlier wire.
    fn collides(&self, candidate: &[Rect]) -> bool {
        for r in candidate {
            let inflated = r.inflated(self.bw, self.bh);
            for p in &self.placed {
                if inflated.overlaps(p) {
                    return true;
                }
            }
        }
        false
    }

    fn emit(&mut self, rects: &[(Rect, Orientation)]) {
        for &(r, o) in rects {
            match o {
                Orientation::Horizontal => self.push_horizontal(r),
                Orientation::Vertical => self.push_vertical(r),
                Orientation::Turn => self.push_turn(r),
            }
        }
    }

    fn push_horizontal(&mut self, r: Rect) {
        self.placed.push(r);
        self.wires.push(PlacedGadget {
            gadget: self.wire.horizontal_wire(r.width),
            position: Point::new(r.x, r.y),
            kind: PlacedKind::Wire,
        });
    }

    fn push_vertical(&mut self, r: Rect) {
        self.placed.push(r);
        self.wires.push(PlacedGadget {
            gadget: self.wire.vertical_wire(r.height),
            position: Point::new(r.x, r.y),
            kind: PlacedKind::Wire,
        });
    }

    fn push_turn(&mut self, r: Rect) {
        self.placed.push(r);
        self.wires.push(PlacedGadget {
            gadget: self.wire.turn_wire(),
            position: Point::new(r.x, r.y),
            kind: PlacedKind::Wire,
        });
    }
}

/// Fills every part of `region` not covered by `occupied` with barrier
/// rectangles: horizontal slab decomposition with vertical merging of equal
/// spans.
pub(crate) fn fill_with_barriers(
    region: Rect,
    occupied: &[Rect],
    barrier: &dyn BarrierFactory,
) -> Vec<PlacedGadget> {
    let mut cuts = vec![region.y, region.bottom()];
    for r in occupied {
        if r.y > region.y && r.y < region.bottom() {
            cuts.push(r.y);
        }
        if r.bottom() > region.y && r.bottom() < region.bottom() {
            cuts.push(r.bottom());
        }
    }
    cuts.sort_unstable();
    cuts.dedup();

    // open gap columns carried across slabs for vertical merging
    let mut open: Vec<(i64, i64, i64, i64)> = Vec::new(); // (x, w, y_start, y_end)
    let mut finished: Vec<Rect> = Vec::new();

    for band in cuts.windows(2) {
        let (y1, y2) = (band[0], band[1]);
        let mut spans: Vec<(i64, i64)> = occupied
            .iter()
            .filter(|r| r.y < y2 && r.bottom() > y1)
            .map(|r| (r.x, r.right()))
            .collect();
        spans.sort_unstable();

        let mut gaps: Vec<(i64, i64)> = Vec::new();
        let mut cursor = region.x;
        for (sx, sr) in spans {
            if sx > cursor {
                gaps.push((cursor, sx - cursor));
            }
            cursor = cursor.max(sr);
        }
        if cursor < region.right() {
            gaps.push((cursor, region.right() - cursor));
        }

        let mut next_open = Vec::new();
        for (gx, gwidth) in gaps {
            if let Some(pos) = open
                .iter()
                .position(|&(x, w, _, y_end)| x == gx && w == gwidth && y_end == y1)
            {
                let (x, w, y_start, _) = open.remove(pos);
                next_open.push((x, w, y_start, y2));
            } else {
                next_open.push((gx, gwidth, y1, y2));
            }
        }
        for &(x, w, y_start, y_end) in &open {
            finished.push(Rect::new(x, y_start, w, y_end - y_start));
        }
        open = next_open;
    }
    for &(x, w, y_start, y_end) in &open {
        finished.push(Rect::new(x, y_start, w, y_end - y_start));
    }

    finished.sort_unstable_by_key(|r| (r.y, r.x));
    finished
        .into_iter()
        .filter(|r| r.width > 0 && r.height > 0)
        .map(|r| PlacedGadget {
            gadget: barrier.barrier(r.width, r.height),
            position: Point::new(r.x, r.y),
            kind: PlacedKind::Barrier,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::factories::{SimpleBarrierFactory, SimpleGadget, SimpleWireFactory};

    fn gadget_with_ports(ports: Vec<Point>) -> SimpleGadget {
        SimpleGadget {
            width: 30,
            height: 18,
            ports,
        }
    }

    fn run_layout(gadget: &SimpleGadget, targets: Vec<Option<PortTarget>>) -> (SingleLayout, Rect) {
        let wires = SimpleWireFactory;
        let barriers = SimpleBarrierFactory;
        let layout = SingleGadgetLayout::new(gadget, &wires, &barriers, targets).unwrap();
        let region = Rect::new(0, 0, layout.min_width() + 20, layout.min_height() + 20);
        let result = layout.layout(region).unwrap();
        (result, region)
    }

    fn assert_no_overlaps(result: &SingleLayout, gadget: &SimpleGadget) {
        let mut rects = vec![Rect::new(
            result.gadget_position.x,
            result.gadget_position.y,
            gadget.width,
            gadget.height,
        )];
        rects.extend(result.wires.iter().map(|w| w.rect()));
        rects.extend(result.barriers.iter().map(|b| b.rect()));
        for i in 0..rects.len() {
            for j in i + 1..rects.len() {
                assert!(
                    !rects[i].overlaps(&rects[j]),
                    "rect {:?} overlaps {:?}",
                    rects[i],
                    rects[j]
                );
            }
        }
    }

    fn assert_region_covered(result: &SingleLayout, gadget: &SimpleGadget, region: Rect) {
        let mut area = gadget.width * gadget.height;
        for w in &result.wires {
            area += w.rect().width * w.rect().height;
        }
        for b in &result.barriers {
            area += b.rect().width * b.rect().height;
        }
        assert_eq!(area, region.width * region.height, "region fully tiled");
    }

    fn exit_reaches_edge(result: &SingleLayout, region: Rect, column: i64, above: bool) -> bool {
        result.wires.iter().any(|w| {
            let r = w.rect();
            r.x == column
                && if above {
                    r.y == region.y
                } else {
                    r.bottom() == region.bottom()
                }
        })
    }

    #[test]
    fn test_single_top_port_offset_target() {
        let gadget = gadget_with_ports(vec![Point::new(15, 0)]);
        let (result, region) = run_layout(
            &gadget,
            vec![Some(PortTarget {
                column: 4,
                above: true,
            })],
        );
        assert_no_overlaps(&result, &gadget);
        assert_region_covered(&result, &gadget, region);
        assert!(exit_reaches_edge(&result, region, 4, true));
    }

    #[test]
    fn test_straight_exit_up() {
        let gadget = gadget_with_ports(vec![Point::new(15, 0)]);
        let wires = SimpleWireFactory;
        let barriers = SimpleBarrierFactory;
        let layout = SingleGadgetLayout::new(
            &gadget,
            &wires,
            &barriers,
            vec![Some(PortTarget {
                column: 0, // patched below once the region is known
                above: true,
            })],
        )
        .unwrap();
        let region = Rect::new(0, 0, layout.min_width() + 20, layout.min_height() + 20);
        let gx = region.x + (region.width - gadget.width) / 2;
        // port at gx + 15; a straight exit leaves at port.x - offset
        let column = gx + 15 - 1;
        let layout = SingleGadgetLayout::new(
            &gadget,
            &wires,
            &barriers,
            vec![Some(PortTarget {
                column,
                above: true,
            })],
        )
        .unwrap();
        let result = layout.layout(region).unwrap();
        assert_no_overlaps(&result, &gadget);
        assert_region_covered(&result, &gadget, region);
        assert_eq!(result.wires.len(), 1);
        assert!(exit_reaches_edge(&result, region, column, true));
    }

    #[test]
    fn test_right_port_to_bottom_target() {
        let gadget = gadget_with_ports(vec![Point::new(30, 9)]);
        let (result, region) = run_layout(
            &gadget,
            vec![Some(PortTarget {
                column: 10,
                above: false,
            })],
        );
        assert_no_overlaps(&result, &gadget);
        assert_region_covered(&result, &gadget, region);
        assert!(exit_reaches_edge(&result, region, 10, false));
    }

    #[test]
    fn test_left_port_to_top_target() {
        let gadget = gadget_with_ports(vec![Point::new(0, 9)]);
        let (result, region) = run_layout(
            &gadget,
            vec![Some(PortTarget {
                column: 50,
                above: true,
            })],
        );
        assert_no_overlaps(&result, &gadget);
        assert_region_covered(&result, &gadget, region);
        assert!(exit_reaches_edge(&result, region, 50, true));
    }

    #[test]
    fn test_two_ports_same_side() {
        let gadget = gadget_with_ports(vec![Point::new(8, 0), Point::new(22, 0)]);
        let (result, region) = run_layout(
            &gadget,
            vec![
                Some(PortTarget {
                    column: 20,
                    above: true,
                }),
                Some(PortTarget {
                    column: 70,
                    above: true,
                }),
            ],
        );
        assert_no_overlaps(&result, &gadget);
        assert_region_covered(&result, &gadget, region);
        assert!(exit_reaches_edge(&result, region, 20, true));
        assert!(exit_reaches_edge(&result, region, 70, true));
    }

    #[test]
    fn test_four_ports_mixed_sides() {
        let gadget = gadget_with_ports(vec![
            Point::new(10, 0),
            Point::new(30, 9),
            Point::new(16, 18),
            Point::new(0, 9),
        ]);
        let targets = vec![
            Some(PortTarget {
                column: 30,
                above: true,
            }),
            Some(PortTarget {
                column: 90,
                above: false,
            }),
            Some(PortTarget {
                column: 60,
                above: false,
            }),
            Some(PortTarget {
                column: 6,
                above: true,
            }),
        ];
        let (result, region) = run_layout(&gadget, targets);
        assert_no_overlaps(&result, &gadget);
        assert_region_covered(&result, &gadget, region);
        for (c, up) in [(30, true), (90, false), (60, false), (6, true)] {
            assert!(exit_reaches_edge(&result, region, c, up), "column {}", c);
        }
    }

    #[test]
    fn test_min_size_formula_is_monotone_in_ports() {
        let g1 = gadget_with_ports(vec![Point::new(15, 0)]);
        let g2 = gadget_with_ports(vec![Point::new(8, 0), Point::new(22, 0)]);
        let wires = SimpleWireFactory;
        let barriers = SimpleBarrierFactory;
        let l1 = SingleGadgetLayout::new(
            &g1,
            &wires,
            &barriers,
            vec![Some(PortTarget {
                column: 0,
                above: true,
            })],
        )
        .unwrap();
        let l2 = SingleGadgetLayout::new(
            &g2,
            &wires,
            &barriers,
            vec![
                Some(PortTarget {
                    column: 0,
                    above: true,
                }),
                Some(PortTarget {
                    column: 9,
                    above: true,
                }),
            ],
        )
        .unwrap();
        assert!(l2.min_width() > l1.min_width());
        assert!(l2.min_height() > l1.min_height());
    }

    #[test]
    fn test_region_too_small_is_rejected() {
        let gadget = gadget_with_ports(vec![Point::new(15, 0)]);
        let wires = SimpleWireFactory;
        let barriers = SimpleBarrierFactory;
        let layout = SingleGadgetLayout::new(
            &gadget,
            &wires,
            &barriers,
            vec![Some(PortTarget {
                column: 5,
                above: true,
            })],
        )
        .unwrap();
        assert!(layout.layout(Rect::new(0, 0, 40, 30)).is_err());
    }

    #[test]
    fn test_wires_connect_port_to_port() {
        let gadget = gadget_with_ports(vec![Point::new(15, 0)]);
        let (result, _) = run_layout(
            &gadget,
            vec![Some(PortTarget {
                column: 4,
                above: true,
            })],
        );
        // consecutive wires of one chain share exactly one port position
        let mut port_points: Vec<Point> = Vec::new();
        for w in &result.wires {
            port_points.extend(w.absolute_ports());
        }
        for w in &result.wires {
            let shared = w
                .absolute_ports()
                .iter()
                .filter(|p| port_points.iter().filter(|q| q == p).count() > 1)
                .count();
            assert!(shared >= 1, "every wire joins the chain at a port");
        }
    }
}
