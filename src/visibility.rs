use hashbrown::{HashMap, HashSet};
use petgraph::graph::NodeIndex;

use crate::{
    block_cut::block_cut_tree,
    embedding::PlanarEmbedding,
    error::{LayoutError, Result},
    types::UnorderedPair,
    EdgeLabel, UnGraph,
};

/// Horizontal bar assigned to one vertex of the visibility representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bar {
    pub y: i64,
    pub min_x: i64,
    pub max_x: i64,
}

/// A visibility representation of a planar embedding: every vertex becomes a
/// horizontal bar, every edge a column joining the bars of its endpoints.
#[derive(Debug, Clone)]
pub struct VisibilityRepresentation {
    pub bars: HashMap<NodeIndex, Bar>,
    pub edge_columns: HashMap<UnorderedPair, i64>,
    /// st-order position per vertex; edges run from the lower position to
    /// the higher one.
    pub position: HashMap<NodeIndex, usize>,
}

impl VisibilityRepresentation {
    /// Whether `u` lies above `v` (its bar has the smaller y).
    pub fn is_above(&self, u: NodeIndex, v: NodeIndex) -> bool {
        self.bars[&u].y < self.bars[&v].y
    }
}

/// Computes a visibility representation of a connected planar embedding.
///
/// * `widths` / `heights`: minimum bar width and row height per vertex,
/// * `h_pitch`: horizontal distance between consecutive edge columns; must
///   be at least the widest bar plus the required spacing,
/// * `v_gap`: vertical gap left between consecutive rows.
///
/// The graph is first augmented to a biconnected planar graph (dummy edges
/// between rotation-consecutive neighbours of cut vertices), an st-numbering
/// is derived from an open ear decomposition, and bars and columns follow
/// from a sweep in st-order: each vertex consumes the contiguous block of
/// its incoming edge columns and opens its outgoing columns in rotation
/// order.
pub fn visibility_representation(
    graph: &UnGraph,
    emb: &PlanarEmbedding,
    widths: &HashMap<NodeIndex, i64>,
    heights: &HashMap<NodeIndex, i64>,
    h_pitch: i64,
    v_gap: i64,
) -> Result<VisibilityRepresentation> {
    let vertices: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|v| !emb.order_at(*v).is_empty() || graph.node_count() == 1)
        .collect();

    if vertices.is_empty() {
        return Err(LayoutError::InvalidLayout(
            "empty embedding has no visibility representation".to_string(),
        ));
    }
    if vertices.len() == 1 {
        let v = vertices[0];
        let mut bars = HashMap::new();
        bars.insert(
            v,
            Bar {
                y: 0,
                min_x: 0,
                max_x: widths.get(&v).copied().unwrap_or(1),
            },
        );
        let mut position = HashMap::new();
        position.insert(v, 0);
        return Ok(VisibilityRepresentation {
            bars,
            edge_columns: HashMap::new(),
            position,
        });
    }

    // compact the embedded component: the augmentation and the ear search
    // assume every index belongs to the graph under study
    let mut compact: HashMap<NodeIndex, usize> = HashMap::new();
    for (i, &v) in vertices.iter().enumerate() {
        compact.insert(v, i);
    }
    let remap = |v: NodeIndex| NodeIndex::new(compact[&v]);

    let mut aug = UnGraph::new_undirected();
    for &v in &vertices {
        aug.add_node(v.index() as u32);
    }
    let mut rotation: Vec<Vec<NodeIndex>> = vec![Vec::new(); vertices.len()];
    for &v in &vertices {
        rotation[compact[&v]] = emb.order_at(v).iter().map(|&w| remap(w)).collect();
        for &w in emb.order_at(v) {
            if compact[&v] < compact[&w] {
                aug.add_edge(remap(v), remap(w), EdgeLabel::Real);
            }
        }
    }

    // 1. planar biconnection augmentation
    augment_biconnected(&mut aug, &mut rotation);

    // 2. st-edge taken from the declared outer face
    let (s, t) = {
        let a = remap(emb.external_face.first().copied().unwrap_or(vertices[0]));
        let b = match emb.external_face.get(1) {
            Some(&b) => remap(b),
            None => rotation[a.index()][0],
        };
        (a, b)
    };

    // 3. st-order from an open ear decomposition
    let order = st_order(&aug, s, t)?;
    let mut position = HashMap::new();
    for (i, &v) in order.iter().enumerate() {
        position.insert(v, i);
    }

    // 4. sweep: one column slot per edge, inserted in rotation order
    let columns = sweep_columns(&rotation, &order, &position);

    // 5. coordinates, mapped back to the caller's vertex ids
    let mut y_of: HashMap<NodeIndex, i64> = HashMap::new();
    for &v in &order {
        let orig_heights = |w: NodeIndex| {
            heights
                .get(&vertices[w.index()])
                .copied()
                .unwrap_or(1)
        };
        let mut y = 0;
        for w in aug.neighbors(v) {
            if position[&w] < position[&v] {
                y = y.max(y_of[&w] + orig_heights(w) + v_gap);
            }
        }
        y_of.insert(v, y);
    }

    let mut bars: HashMap<NodeIndex, Bar> = HashMap::new();
    let mut edge_columns = HashMap::new();
    for (pair, rank) in &columns.rank_of {
        edge_columns.insert(*pair, *rank as i64 * h_pitch);
    }

    for &v in &order {
        let mut min_x = i64::MAX;
        let mut max_x = i64::MIN;
        for w in aug.neighbors(v) {
            let x = edge_columns[&UnorderedPair::new(v, w)];
            min_x = min_x.min(x);
            max_x = max_x.max(x);
        }
        // widen to the requested minimum, symmetrically
        let orig = vertices[v.index()];
        let want = widths.get(&orig).copied().unwrap_or(1);
        let span = max_x - min_x;
        if span < want {
            let extra = want - span;
            min_x -= extra / 2;
            max_x += extra - extra / 2;
        }
        bars.insert(
            orig,
            Bar {
                y: y_of[&v],
                min_x,
                max_x,
            },
        );
    }

    // dummy edges shaped the drawing; only real columns are reported, in the
    // caller's vertex ids
    let mut out_columns = HashMap::new();
    let mut out_position = HashMap::new();
    for (pair, &x) in &edge_columns {
        let (a, b) = (vertices[pair.first().index()], vertices[pair.second().index()]);
        if graph.find_edge(a, b).is_some() {
            out_columns.insert(UnorderedPair::new(a, b), x);
        }
    }
    for (&v, &p) in &position {
        out_position.insert(vertices[v.index()], p);
    }

    Ok(VisibilityRepresentation {
        bars,
        edge_columns: out_columns,
        position: out_position,
    })
}

/// Adds dummy edges between rotation-consecutive neighbours of cut vertices
/// lying in different blocks, preserving planarity, until the graph is
/// biconnected.
fn augment_biconnected(graph: &mut UnGraph, rotation: &mut [Vec<NodeIndex>]) {
    loop {
        let bct = block_cut_tree(graph);
        if bct.cut_count == 0 {
            return;
        }
        let mut changed = false;
        for c in graph.node_indices().collect::<Vec<_>>() {
            if bct.node_to_id[c.index()] < bct.block_count {
                continue; // not a cut vertex
            }
            let rot = rotation[c.index()].clone();
            let d = rot.len();
            for i in 0..d {
                let a = rot[i];
                let b = rot[(i + 1) % d];
                if edge_block(&bct, c, a) == edge_block(&bct, c, b) {
                    continue;
                }
                if graph.find_edge(a, b).is_some() {
                    continue;
                }
                graph.add_edge(a, b, EdgeLabel::Structure);
                // the chord lives in the corner face between (c,a) and (c,b):
                // insert b just before c at a, and a just after c at b
                let pa = rotation[a.index()].iter().position(|&x| x == c).unwrap();
                rotation[a.index()].insert(pa, b);
                let pb = rotation[b.index()].iter().position(|&x| x == c).unwrap();
                rotation[b.index()].insert(pb + 1, a);
                changed = true;
                break; // block structure changed; recompute
            }
            if changed {
                break;
            }
        }
        if !changed {
            return;
        }
    }
}

/// The block containing the edge `(c, w)`.
fn edge_block(bct: &crate::block_cut::BlockCutTree, c: NodeIndex, w: NodeIndex) -> usize {
    if bct.node_to_id[w.index()] < bct.block_count {
        return bct.node_to_id[w.index()];
    }
    // both endpoints are cut vertices: find the block holding the edge
    for (i, members) in bct.block_vertex_to_vertex.iter().enumerate() {
        let (Some(ci), Some(wi)) = (
            members.iter().position(|&x| x == c),
            members.iter().position(|&x| x == w),
        ) else {
            continue;
        };
        if bct.blocks[i]
            .find_edge(NodeIndex::new(ci), NodeIndex::new(wi))
            .is_some()
        {
            return i;
        }
    }
    unreachable!("edge belongs to some block")
}

/// st-order of a biconnected graph: s first, t last, every other vertex with
/// a neighbour on each side. Built by ear insertion: starting from the ends
/// of the edge (s, t), repeatedly attach a path of unplaced vertices between
/// two placed ones.
fn st_order(graph: &UnGraph, s: NodeIndex, t: NodeIndex) -> Result<Vec<NodeIndex>> {
    let mut order = vec![s, t];
    let mut placed: HashSet<NodeIndex> = [s, t].into_iter().collect();

    while placed.len() < graph.node_count() {
        // an edge from a placed vertex into the unplaced part
        let mut ear: Option<(NodeIndex, Vec<NodeIndex>, NodeIndex)> = None;
        'outer: for &u in &order {
            let mut nbrs: Vec<NodeIndex> = graph.neighbors(u).collect();
            nbrs.reverse();
            for v in nbrs {
                if placed.contains(&v) {
                    continue;
                }
                if let Some((path, z)) = unplaced_path(graph, v, u, &placed) {
                    ear = Some((u, path, z));
                    break 'outer;
                }
            }
        }
        let Some((u, path, z)) = ear else {
            return Err(LayoutError::InvalidLayout(
                "graph is not biconnected after augmentation".to_string(),
            ));
        };

        let (pu, pz) = (
            order.iter().position(|&x| x == u).unwrap(),
            order.iter().position(|&x| x == z).unwrap(),
        );
        // internals go right after the earlier endpoint, oriented towards
        // the later one
        let (insert_after, forward) = if pu < pz { (pu, true) } else { (pz, false) };
        let mut internals = path;
        if !forward {
            internals.reverse();
        }
        for (k, &w) in internals.iter().enumerate() {
            order.insert(insert_after + 1 + k, w);
            placed.insert(w);
        }
    }

    Ok(order)
}

/// BFS through unplaced vertices from `v` to any placed vertex other than
/// `u`; returns the unplaced path (including `v`) and the placed endpoint.
fn unplaced_path(
    graph: &UnGraph,
    v: NodeIndex,
    u: NodeIndex,
    placed: &HashSet<NodeIndex>,
) -> Option<(Vec<NodeIndex>, NodeIndex)> {
    let mut prev: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(v);
    prev.insert(v, v);

    while let Some(x) = queue.pop_front() {
        let mut nbrs: Vec<NodeIndex> = graph.neighbors(x).collect();
        nbrs.reverse();
        for w in nbrs {
            if w == u || prev.contains_key(&w) {
                continue;
            }
            if placed.contains(&w) {
                // reconstruct the unplaced path v..x
                let mut path = vec![x];
                let mut cur = x;
                while prev[&cur] != cur {
                    cur = prev[&cur];
                    path.push(cur);
                }
                path.reverse();
                return Some((path, w));
            }
            prev.insert(w, x);
            queue.push_back(w);
        }
    }
    None
}

struct Columns {
    rank_of: HashMap<UnorderedPair, usize>,
}

/// The sweep: edge slots live in one left-to-right order; a vertex replaces
/// the block of its incoming slots by its outgoing slots. Incoming slots of
/// a planar st-graph are contiguous among the open slots, so the drawing
/// stays planar and the final slot order gives the columns.
fn sweep_columns(
    rotation: &[Vec<NodeIndex>],
    order: &[NodeIndex],
    position: &HashMap<NodeIndex, usize>,
) -> Columns {
    let mut slots: Vec<UnorderedPair> = Vec::new();

    for &v in order {
        let rot = &rotation[v.index()];
        let d = rot.len();
        let outgoing_cyclic: Vec<NodeIndex> = {
            // the outgoing neighbours form one contiguous cyclic block;
            // read it in rotation order
            let is_out = |w: NodeIndex| position[&w] > position[&v];
            let mut start = None;
            for i in 0..d {
                if is_out(rot[i]) && !is_out(rot[(i + d - 1) % d]) {
                    start = Some(i);
                    break;
                }
            }
            match start {
                Some(start) => {
                    let mut block = Vec::new();
                    for k in 0..d {
                        let w = rot[(start + k) % d];
                        if !is_out(w) {
                            break;
                        }
                        block.push(w);
                    }
                    block
                }
                None => rot.iter().copied().filter(|&w| is_out(w)).collect(),
            }
        };
        // clockwise rotation order of the out-block is right-to-left on the
        // row below; reverse it for left-to-right insertion
        let outgoing: Vec<NodeIndex> = outgoing_cyclic.into_iter().rev().collect();

        let incoming: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, pair)| pair.contains(v))
            .map(|(i, _)| i)
            .collect();

        let insert_at = match incoming.last() {
            Some(&last) => last + 1,
            None => slots.len(),
        };
        for (k, &w) in outgoing.iter().enumerate() {
            slots.insert(insert_at + k, UnorderedPair::new(v, w));
        }
    }

    let mut rank_of = HashMap::new();
    for (i, pair) in slots.iter().enumerate() {
        rank_of.insert(*pair, i);
    }
    Columns { rank_of }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintMap;
    use crate::ec_embedding::embed_ec;
    use crate::testing::graphs::grid_graph;

    fn unit_maps(graph: &UnGraph, w: i64, h: i64) -> (HashMap<NodeIndex, i64>, HashMap<NodeIndex, i64>) {
        let mut widths = HashMap::new();
        let mut heights = HashMap::new();
        for v in graph.node_indices() {
            widths.insert(v, w);
            heights.insert(v, h);
        }
        (widths, heights)
    }

    fn check_visibility(graph: &UnGraph, rep: &VisibilityRepresentation) {
        // every edge column lies within both endpoint bars
        for (pair, &x) in &rep.edge_columns {
            for v in [pair.first(), pair.second()] {
                let bar = rep.bars[&v];
                assert!(bar.min_x <= x && x <= bar.max_x, "column outside bar");
            }
        }
        // bars of same-row vertices do not overlap
        let vs: Vec<NodeIndex> = rep.bars.keys().copied().collect();
        for i in 0..vs.len() {
            for j in i + 1..vs.len() {
                let (a, b) = (rep.bars[&vs[i]], rep.bars[&vs[j]]);
                if a.y == b.y {
                    assert!(
                        a.max_x < b.min_x || b.max_x < a.min_x,
                        "bars overlap on one row"
                    );
                }
            }
        }
        // no edge column crosses a foreign bar strictly between its rows
        for (pair, &x) in &rep.edge_columns {
            let (mut y1, mut y2) = (rep.bars[&pair.first()].y, rep.bars[&pair.second()].y);
            if y1 > y2 {
                std::mem::swap(&mut y1, &mut y2);
            }
            for (&v, bar) in &rep.bars {
                if pair.contains(v) {
                    continue;
                }
                if y1 < bar.y && bar.y < y2 {
                    assert!(
                        x < bar.min_x || x > bar.max_x,
                        "edge column pierces the bar of {:?}",
                        v
                    );
                }
            }
        }
        let _ = graph;
    }

    #[test]
    fn test_visibility_of_path() {
        let mut graph = UnGraph::new_undirected();
        let n: Vec<_> = (0..3).map(|i| graph.add_node(i)).collect();
        graph.add_edge(n[0], n[1], EdgeLabel::Real);
        graph.add_edge(n[1], n[2], EdgeLabel::Real);

        let emb = embed_ec(&graph, n[0], &ConstraintMap::new())
            .unwrap()
            .unwrap();
        let (widths, heights) = unit_maps(&graph, 10, 5);
        let rep = visibility_representation(&graph, &emb, &widths, &heights, 20, 4).unwrap();
        assert_eq!(rep.edge_columns.len(), 2);
        check_visibility(&graph, &rep);
    }

    #[test]
    fn test_visibility_of_grid() {
        let graph = grid_graph(3, 3);
        let emb = embed_ec(&graph, NodeIndex::new(0), &ConstraintMap::new())
            .unwrap()
            .unwrap();
        let (widths, heights) = unit_maps(&graph, 12, 6);
        let rep = visibility_representation(&graph, &emb, &widths, &heights, 30, 5).unwrap();
        assert_eq!(rep.edge_columns.len(), graph.edge_count());
        check_visibility(&graph, &rep);
        // rows respect the heights plus the gap
        for (pair, _) in rep.edge_columns.iter() {
            let (a, b) = (rep.bars[&pair.first()], rep.bars[&pair.second()]);
            assert!((a.y - b.y).abs() >= 6 + 5);
        }
    }

    #[test]
    fn test_visibility_of_star_needs_augmentation() {
        // a star has a cut vertex of high degree
        let mut graph = UnGraph::new_undirected();
        let c = graph.add_node(0);
        let leaves: Vec<_> = (1..5).map(|i| graph.add_node(i)).collect();
        for &l in &leaves {
            graph.add_edge(c, l, EdgeLabel::Real);
        }
        let emb = embed_ec(&graph, c, &ConstraintMap::new()).unwrap().unwrap();
        let (widths, heights) = unit_maps(&graph, 8, 4);
        let rep = visibility_representation(&graph, &emb, &widths, &heights, 16, 3).unwrap();
        assert_eq!(rep.edge_columns.len(), 4);
        check_visibility(&graph, &rep);
    }

    #[test]
    fn test_bar_widening_respects_minimum() {
        let mut graph = UnGraph::new_undirected();
        let a = graph.add_node(0);
        let b = graph.add_node(1);
        graph.add_edge(a, b, EdgeLabel::Real);
        let emb = embed_ec(&graph, a, &ConstraintMap::new()).unwrap().unwrap();
        let (widths, heights) = unit_maps(&graph, 24, 4);
        let rep = visibility_representation(&graph, &emb, &widths, &heights, 40, 3).unwrap();
        for bar in rep.bars.values() {
            assert!(bar.max_x - bar.min_x >= 24);
        }
    }
}
