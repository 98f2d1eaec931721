use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use crate::{
    embedding::PlanarEmbedding,
    error::{LayoutError, Result},
    gadget::{BarrierFactory, PlacedGadget, PlacedKind, PlanarGadget, Point, Rect, WireFactory},
    single_layout::{fill_with_barriers, PortTarget, SingleGadgetLayout},
    types::UnorderedPair,
    visibility::visibility_representation,
    EdgeLabel, UnGraph,
};

/// The per-vertex inputs of the global layout: one gadget per embedded
/// vertex, and for every incident edge the index of the port it binds to.
pub struct GadgetArrangement {
    pub gadgets: HashMap<NodeIndex, Box<dyn PlanarGadget>>,
    pub edge_ports: HashMap<NodeIndex, HashMap<NodeIndex, usize>>,
}

/// A finished layout: every gadget, wire and barrier with its top-left
/// position, bounding box normalised to the origin.
pub struct GadgetLayout {
    pub placements: Vec<PlacedGadget>,
    /// Index into `placements` of each vertex's gadget.
    pub vertex_placement: HashMap<NodeIndex, usize>,
}

impl GadgetLayout {
    pub fn bounding_box(&self) -> Rect {
        let mut min_x = i64::MAX;
        let mut min_y = i64::MAX;
        let mut max_x = i64::MIN;
        let mut max_y = i64::MIN;
        for p in &self.placements {
            let r = p.rect();
            min_x = min_x.min(r.x);
            min_y = min_y.min(r.y);
            max_x = max_x.max(r.right());
            max_y = max_y.max(r.bottom());
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    fn translate(&mut self, dx: i64, dy: i64) {
        for p in &mut self.placements {
            p.position.x += dx;
            p.position.y += dy;
        }
    }
}

/// Lays out an embedded gadget graph: a visibility representation assigns
/// each vertex a bar and each edge a column, every gadget is routed inside
/// its region by the winding router, regions are joined by vertical
/// connector wires flanked with barriers, and the rest of the bounding box
/// is filled with barriers.
pub fn layout_gadgets(
    embedding: &PlanarEmbedding,
    arrangement: GadgetArrangement,
    wire: &dyn WireFactory,
    barrier: &dyn BarrierFactory,
) -> Result<GadgetLayout> {
    // the rotation system defines the graph
    let mut graph = UnGraph::new_undirected();
    for i in 0..embedding.clockwise_order.len() {
        graph.add_node(i as u32);
    }
    for (ui, nbrs) in embedding.clockwise_order.iter().enumerate() {
        let u = NodeIndex::new(ui);
        for &w in nbrs {
            if u.index() < w.index() {
                graph.add_edge(u, w, EdgeLabel::Real);
            }
        }
    }

    let vertices: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|v| !embedding.order_at(*v).is_empty())
        .collect();
    if vertices.is_empty() {
        return Err(LayoutError::InvalidLayout(
            "nothing to lay out".to_string(),
        ));
    }

    // per-vertex routers for the minimum region sizes
    let mut widths = HashMap::new();
    let mut heights = HashMap::new();
    for &v in &vertices {
        let gadget = arrangement
            .gadgets
            .get(&v)
            .ok_or_else(|| LayoutError::InvalidLayout(format!("vertex {} has no gadget", v.index())))?;
        let ports = arrangement
            .edge_ports
            .get(&v)
            .ok_or_else(|| LayoutError::InvalidLayout(format!("vertex {} has no ports", v.index())))?;
        let degree = embedding.order_at(v).len();
        if ports.len() != degree {
            return Err(LayoutError::InvalidLayout(format!(
                "vertex {} binds {} ports for {} edges",
                v.index(),
                ports.len(),
                degree
            )));
        }
        let placeholder = placeholder_targets(gadget.as_ref(), ports)?;
        let single = SingleGadgetLayout::new(gadget.as_ref(), wire, barrier, placeholder)?;
        widths.insert(v, single.min_width() + wire.width() + 2 * barrier.min_width());
        heights.insert(
            v,
            single.min_height() + wire.height().max(barrier.min_height()),
        );
    }

    let h_pitch = widths.values().copied().max().unwrap_or(1)
        + wire.width()
        + 2 * barrier.min_width();
    let v_gap = wire.height() + 2 * barrier.min_height();

    let rep = visibility_representation(&graph, embedding, &widths, &heights, h_pitch, v_gap)?;

    let mut layout = GadgetLayout {
        placements: Vec::new(),
        vertex_placement: HashMap::new(),
    };
    let mut regions: HashMap<NodeIndex, Rect> = HashMap::new();
    let mut gadget_boxes = arrangement.gadgets;

    for &v in &vertices {
        let bar = rep.bars[&v];
        let gadget = gadget_boxes.remove(&v).expect("sized above");
        let ports = &arrangement.edge_ports[&v];

        let region = Rect::new(
            bar.min_x - barrier.min_width(),
            bar.y,
            (bar.max_x - bar.min_x) + wire.width() + 2 * barrier.min_width(),
            heights[&v] - wire.height().max(barrier.min_height()),
        );
        regions.insert(v, region);

        let mut targets: Vec<Option<PortTarget>> = vec![None; gadget.ports().len()];
        for (&w, &port) in ports {
            if port >= targets.len() {
                return Err(LayoutError::InvalidLayout(format!(
                    "vertex {} uses port {} of {}",
                    v.index(),
                    port,
                    targets.len()
                )));
            }
            if targets[port].is_some() {
                return Err(LayoutError::InvalidLayout(format!(
                    "vertex {} binds port {} twice",
                    v.index(),
                    port
                )));
            }
            let column = rep.edge_columns[&UnorderedPair::new(v, w)];
            targets[port] = Some(PortTarget {
                column,
                above: rep.bars[&w].y < bar.y,
            });
        }

        let single = SingleGadgetLayout::new(gadget.as_ref(), wire, barrier, targets)?;
        let routed = single.layout(region)?;

        layout.vertex_placement.insert(v, layout.placements.len());
        layout.placements.push(PlacedGadget {
            gadget,
            position: routed.gadget_position,
            kind: PlacedKind::Gadget,
        });
        layout.placements.extend(routed.wires);
        layout.placements.extend(routed.barriers);
    }

    // vertical connector per edge, flanked by barrier strips
    for e in graph_edges(&graph) {
        let (u, v) = (e.first(), e.second());
        // edges run from the lower st-position down the drawing
        let (upper, lower) = if rep.position[&u] < rep.position[&v] {
            (u, v)
        } else {
            (v, u)
        };
        debug_assert!(rep.is_above(upper, lower));
        let column = rep.edge_columns[&e];
        let y1 = regions[&upper].bottom();
        let y2 = regions[&lower].y;
        if y2 <= y1 {
            return Err(LayoutError::InvalidLayout(
                "adjacent regions overlap vertically".to_string(),
            ));
        }
        layout.placements.push(PlacedGadget {
            gadget: wire.vertical_wire(y2 - y1),
            position: Point::new(column, y1),
            kind: PlacedKind::Wire,
        });
        for flank_x in [column - barrier.min_width(), column + wire.width()] {
            layout.placements.push(PlacedGadget {
                gadget: barrier.barrier(barrier.min_width(), y2 - y1),
                position: Point::new(flank_x, y1),
                kind: PlacedKind::Barrier,
            });
        }
    }

    // fill whatever remains of the bounding box
    let bbox = layout.bounding_box();
    let occupied: Vec<Rect> = layout.placements.iter().map(|p| p.rect()).collect();
    layout
        .placements
        .extend(fill_with_barriers(bbox, &occupied, barrier));

    // normalise the bounding box corner to the origin
    let bbox = layout.bounding_box();
    layout.translate(-bbox.x, -bbox.y);

    Ok(layout)
}

/// Dummy targets used only to size a region before columns are known.
fn placeholder_targets(
    gadget: &dyn PlanarGadget,
    ports: &HashMap<NodeIndex, usize>,
) -> Result<Vec<Option<PortTarget>>> {
    let mut targets: Vec<Option<PortTarget>> = vec![None; gadget.ports().len()];
    for &port in ports.values() {
        if port >= targets.len() {
            return Err(LayoutError::InvalidLayout(format!(
                "port index {} out of range",
                port
            )));
        }
        targets[port] = Some(PortTarget {
            column: 0,
            above: true,
        });
    }
    Ok(targets)
}

fn graph_edges(graph: &UnGraph) -> Vec<UnorderedPair> {
    use petgraph::visit::EdgeRef;
    graph
        .edge_references()
        .map(|e| UnorderedPair::new(e.source(), e.target()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintMap;
    use crate::ec_embedding::embed_ec;
    use crate::gadget::Side;
    use crate::testing::factories::{SimpleBarrierFactory, SimpleGadget, SimpleWireFactory};

    /// A 30x18 gadget with one port per side.
    fn four_port_gadget() -> SimpleGadget {
        SimpleGadget {
            width: 30,
            height: 18,
            ports: vec![
                Point::new(15, 0),
                Point::new(30, 9),
                Point::new(15, 18),
                Point::new(0, 9),
            ],
        }
    }

    fn port_for_side(side: Side) -> usize {
        match side {
            Side::Top => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Left => 3,
        }
    }

    fn build_arrangement(embedding: &PlanarEmbedding) -> GadgetArrangement {
        // assign ports by rotation order: top, right, bottom, left per degree
        let side_order = [Side::Top, Side::Right, Side::Bottom, Side::Left];
        let mut gadgets: HashMap<NodeIndex, Box<dyn PlanarGadget>> = HashMap::new();
        let mut edge_ports = HashMap::new();
        for (vi, rot) in embedding.clockwise_order.iter().enumerate() {
            if rot.is_empty() {
                continue;
            }
            let v = NodeIndex::new(vi);
            gadgets.insert(v, Box::new(four_port_gadget()) as Box<dyn PlanarGadget>);
            let mut ports = HashMap::new();
            for (k, &w) in rot.iter().enumerate() {
                ports.insert(w, port_for_side(side_order[k]));
            }
            edge_ports.insert(v, ports);
        }
        GadgetArrangement {
            gadgets,
            edge_ports,
        }
    }

    fn assert_layout_sound(layout: &GadgetLayout) {
        // pairwise disjoint interiors
        let rects: Vec<Rect> = layout.placements.iter().map(|p| p.rect()).collect();
        for i in 0..rects.len() {
            for j in i + 1..rects.len() {
                assert!(
                    !rects[i].overlaps(&rects[j]),
                    "{:?} overlaps {:?}",
                    rects[i],
                    rects[j]
                );
            }
        }
        // bounding box at the origin
        let bbox = layout.bounding_box();
        assert_eq!((bbox.x, bbox.y), (0, 0));
    }

    #[test]
    fn test_layout_of_path_graph() {
        let mut graph = UnGraph::new_undirected();
        let n: Vec<_> = (0..3).map(|i| graph.add_node(i)).collect();
        graph.add_edge(n[0], n[1], crate::EdgeLabel::Real);
        graph.add_edge(n[1], n[2], crate::EdgeLabel::Real);
        let embedding = embed_ec(&graph, n[0], &ConstraintMap::new())
            .unwrap()
            .unwrap();

        let arrangement = build_arrangement(&embedding);
        let layout = layout_gadgets(
            &embedding,
            arrangement,
            &SimpleWireFactory,
            &SimpleBarrierFactory,
        )
        .unwrap();

        assert_layout_sound(&layout);
        crate::testing::verify::verify_layout(&layout, (3, 3)).unwrap();
        assert_eq!(layout.vertex_placement.len(), 3);
    }

    #[test]
    fn test_layout_of_cycle() {
        let mut graph = UnGraph::new_undirected();
        let n: Vec<_> = (0..4).map(|i| graph.add_node(i)).collect();
        for i in 0..4 {
            graph.add_edge(n[i], n[(i + 1) % 4], crate::EdgeLabel::Real);
        }
        let embedding = embed_ec(&graph, n[0], &ConstraintMap::new())
            .unwrap()
            .unwrap();

        let arrangement = build_arrangement(&embedding);
        let layout = layout_gadgets(
            &embedding,
            arrangement,
            &SimpleWireFactory,
            &SimpleBarrierFactory,
        )
        .unwrap();
        assert_layout_sound(&layout);
    }
}
