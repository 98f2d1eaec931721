//! Geometric layout verifier: checks the invariants a finished layout must
//! satisfy and reports violations as [`LayoutError::InvalidLayout`]. The
//! production path upholds these by construction; the verifier exists for
//! the test suite.

use crate::error::{LayoutError, Result};
use crate::gadget::{PlacedKind, Rect};
use crate::gadget_layout::GadgetLayout;

/// Checks a layout end to end:
///
/// 1. pairwise disjoint interiors,
/// 2. bounding-box corner at the origin,
/// 3. port adjacency: every pair of touching non-barrier gadgets coincides
///    in exactly one port,
/// 4. corner padding: the corner neighbourhoods of every non-barrier gadget
///    are covered by barriers, except where wires legitimately meet.
pub fn verify_layout(layout: &GadgetLayout, barrier_min: (i64, i64)) -> Result<()> {
    let rects: Vec<Rect> = layout.placements.iter().map(|p| p.rect()).collect();

    for i in 0..rects.len() {
        for j in i + 1..rects.len() {
            if rects[i].overlaps(&rects[j]) {
                return Err(LayoutError::InvalidLayout(format!(
                    "{:?} overlaps {:?}",
                    rects[i], rects[j]
                )));
            }
        }
    }

    let bbox = layout.bounding_box();
    if (bbox.x, bbox.y) != (0, 0) {
        return Err(LayoutError::InvalidLayout(format!(
            "bounding box corner at ({}, {})",
            bbox.x, bbox.y
        )));
    }

    verify_port_adjacency(layout)?;
    verify_corner_padding(layout, barrier_min)?;
    Ok(())
}

/// Two rectangles touch when they share a boundary segment of positive
/// length.
fn touching(a: &Rect, b: &Rect) -> bool {
    let horizontal_contact = (a.right() == b.x || b.right() == a.x)
        && a.y.max(b.y) < a.bottom().min(b.bottom());
    let vertical_contact = (a.bottom() == b.y || b.bottom() == a.y)
        && a.x.max(b.x) < a.right().min(b.right());
    horizontal_contact || vertical_contact
}

fn verify_port_adjacency(layout: &GadgetLayout) -> Result<()> {
    let placements = &layout.placements;
    for i in 0..placements.len() {
        if placements[i].kind == PlacedKind::Barrier {
            continue;
        }
        for j in i + 1..placements.len() {
            if placements[j].kind == PlacedKind::Barrier {
                continue;
            }
            let (ra, rb) = (placements[i].rect(), placements[j].rect());
            if !touching(&ra, &rb) {
                continue;
            }
            let pa = placements[i].absolute_ports();
            let pb = placements[j].absolute_ports();
            let coinciding = pa
                .iter()
                .filter(|p| pb.iter().any(|q| q == *p))
                .count();
            if coinciding != 1 {
                return Err(LayoutError::InvalidLayout(format!(
                    "touching gadgets {:?} and {:?} coincide in {} ports",
                    ra, rb, coinciding
                )));
            }
        }
    }
    Ok(())
}

fn verify_corner_padding(layout: &GadgetLayout, (bw, bh): (i64, i64)) -> Result<()> {
    let bbox = layout.bounding_box();
    let placements = &layout.placements;

    // port-connectivity between placements: a coinciding port pair
    let connected = |i: usize, j: usize| -> bool {
        let pi = placements[i].absolute_ports();
        placements[j]
            .absolute_ports()
            .iter()
            .any(|q| pi.contains(q))
    };

    for (idx, p) in placements.iter().enumerate() {
        if p.kind == PlacedKind::Barrier {
            continue;
        }
        let r = p.rect();
        let corners = [
            Rect::new(r.x - bw, r.y - bh, bw, bh),
            Rect::new(r.right(), r.y - bh, bw, bh),
            Rect::new(r.right(), r.bottom(), bw, bh),
            Rect::new(r.x - bw, r.bottom(), bw, bh),
        ];
        for square in corners {
            let clipped = clip(&square, &bbox);
            if clipped.width <= 0 || clipped.height <= 0 {
                continue; // at the layout edge
            }
            // the corner neighbourhood may hold barriers, wires meeting at a
            // junction, and the port-connected counterpart of this gadget;
            // a foreign gadget box is a defect
            let mut cover: Vec<Rect> = Vec::new();
            for (oi, other) in placements.iter().enumerate() {
                if oi == idx {
                    continue;
                }
                let orect = other.rect();
                if !orect.overlaps(&clipped) {
                    continue;
                }
                let allowed = match other.kind {
                    PlacedKind::Barrier | PlacedKind::Wire => true,
                    PlacedKind::Gadget => connected(idx, oi),
                };
                if !allowed {
                    return Err(LayoutError::InvalidLayout(format!(
                        "corner {:?} of {:?} touches a foreign gadget box",
                        clipped, r
                    )));
                }
                cover.push(orect);
            }
            if covered_area(&clipped, &cover) != clipped.width * clipped.height {
                return Err(LayoutError::InvalidLayout(format!(
                    "corner {:?} of {:?} is not padded",
                    clipped, r
                )));
            }
        }
    }
    Ok(())
}

fn clip(a: &Rect, into: &Rect) -> Rect {
    let x1 = a.x.max(into.x);
    let y1 = a.y.max(into.y);
    let x2 = a.right().min(into.right());
    let y2 = a.bottom().min(into.bottom());
    Rect::new(x1, y1, x2 - x1, y2 - y1)
}

/// Area of `target` covered by the union of `rects`, by slab decomposition.
fn covered_area(target: &Rect, rects: &[Rect]) -> i64 {
    let mut cuts = vec![target.y, target.bottom()];
    for r in rects {
        cuts.push(r.y.clamp(target.y, target.bottom()));
        cuts.push(r.bottom().clamp(target.y, target.bottom()));
    }
    cuts.sort_unstable();
    cuts.dedup();

    let mut area = 0;
    for band in cuts.windows(2) {
        let (y1, y2) = (band[0], band[1]);
        let mut spans: Vec<(i64, i64)> = rects
            .iter()
            .filter(|r| r.y < y2 && r.bottom() > y1)
            .map(|r| (r.x.max(target.x), r.right().min(target.right())))
            .filter(|(a, b)| a < b)
            .collect();
        spans.sort_unstable();
        let mut cursor = target.x;
        for (sx, sr) in spans {
            let lo = sx.max(cursor);
            if sr > lo {
                area += (sr - lo) * (y2 - y1);
                cursor = sr;
            }
        }
    }
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gadget::{PlacedGadget, Point};
    use crate::testing::factories::SimpleGadget;
    use hashbrown::HashMap;

    fn placed(kind: PlacedKind, x: i64, y: i64, w: i64, h: i64, ports: Vec<Point>) -> PlacedGadget {
        PlacedGadget {
            gadget: Box::new(SimpleGadget {
                width: w,
                height: h,
                ports,
            }),
            position: Point::new(x, y),
            kind,
        }
    }

    #[test]
    fn test_overlap_is_reported() {
        let layout = GadgetLayout {
            placements: vec![
                placed(PlacedKind::Barrier, 0, 0, 10, 10, vec![]),
                placed(PlacedKind::Barrier, 5, 5, 10, 10, vec![]),
            ],
            vertex_placement: HashMap::new(),
        };
        assert!(verify_layout(&layout, (3, 3)).is_err());
    }

    #[test]
    fn test_origin_normalisation_is_checked() {
        let layout = GadgetLayout {
            placements: vec![placed(PlacedKind::Barrier, 2, 3, 10, 10, vec![])],
            vertex_placement: HashMap::new(),
        };
        assert!(verify_layout(&layout, (3, 3)).is_err());
    }

    #[test]
    fn test_touching_without_port_is_reported() {
        let layout = GadgetLayout {
            placements: vec![
                placed(PlacedKind::Wire, 0, 0, 10, 3, vec![]),
                placed(PlacedKind::Wire, 10, 0, 10, 3, vec![]),
                // padding so the bounding box corner sits at the origin
                placed(PlacedKind::Barrier, 0, 3, 20, 5, vec![]),
            ],
            vertex_placement: HashMap::new(),
        };
        assert!(verify_layout(&layout, (1, 1)).is_err());
    }

    #[test]
    fn test_port_joined_wires_pass() {
        let layout = GadgetLayout {
            placements: vec![
                placed(
                    PlacedKind::Wire,
                    0,
                    0,
                    10,
                    3,
                    vec![Point::new(0, 1), Point::new(10, 1)],
                ),
                placed(
                    PlacedKind::Wire,
                    10,
                    0,
                    10,
                    3,
                    vec![Point::new(0, 1), Point::new(10, 1)],
                ),
                placed(PlacedKind::Barrier, 0, 3, 20, 5, vec![]),
            ],
            vertex_placement: HashMap::new(),
        };
        // the shared point (10, 1) is one coinciding port
        verify_layout(&layout, (1, 1)).unwrap();
    }

    #[test]
    fn test_covered_area() {
        let target = Rect::new(0, 0, 4, 4);
        let full = vec![Rect::new(0, 0, 2, 4), Rect::new(2, 0, 2, 4)];
        assert_eq!(covered_area(&target, &full), 16);
        let partial = vec![Rect::new(0, 0, 2, 4)];
        assert_eq!(covered_area(&target, &partial), 8);
        let overlapping = vec![Rect::new(0, 0, 3, 4), Rect::new(1, 0, 3, 4)];
        assert_eq!(covered_area(&target, &overlapping), 16);
    }
}
