use hashbrown::{HashMap, HashSet};
use petgraph::graph::NodeIndex;

use crate::{
    block_cut::block_cut_tree,
    embedding::{faces_of, PlanarEmbedding},
    expansion::Expansion,
    skeleton_embedding::embed_skeleton,
    spqr_tree::spqr_tree,
    UnGraph,
};

/// Directed half of a skeleton edge, ephemeral to one block merge.
///
/// `next_clockwise` links the half-edges around their common start vertex;
/// `virtual_match` identifies a virtual half-edge with its counterpart in the
/// neighbouring SPQR component (same start vertex, same shared edge id).
#[derive(Debug, Clone)]
pub(crate) struct HalfEdge {
    pub comp: usize,
    pub start: usize,
    pub end: usize,
    pub eid: usize,
    pub is_virtual: bool,
    pub twin: usize,
    pub next_clockwise: usize,
    pub virtual_match: Option<usize>,
}

/// Merges the per-SPQR-component skeleton embeddings of one block into the
/// block's rotation system, in expansion-graph coordinates: for each
/// block-local vertex, its real neighbours clockwise.
///
/// Returns `None` when a skeleton is non-planar or an O-hub cannot be
/// oriented.
pub(crate) fn merge_block(
    block: &UnGraph,
    local_to_vertex: &[NodeIndex],
    expansion: &Expansion,
) -> Option<Vec<Vec<NodeIndex>>> {
    let n_local = block.node_count();

    if n_local == 1 {
        return Some(vec![Vec::new()]);
    }
    if block.edge_count() == 1 {
        let mut out = vec![Vec::new(); n_local];
        out[0] = vec![local_to_vertex[1]];
        out[1] = vec![local_to_vertex[0]];
        return Some(out);
    }

    let tree = spqr_tree(block);
    let tricon = &tree.tricon;
    debug_assert!(!tricon.components.is_empty());

    // embed the skeletons walking the SPQR tree, so the arena order follows
    // the decomposition
    let mut comp_order = Vec::with_capacity(tricon.components.len());
    let mut seen = vec![false; tricon.components.len()];
    let mut stack = vec![0usize];
    seen[0] = true;
    while let Some(c) = stack.pop() {
        comp_order.push(c);
        for &d in &tree.adj[c] {
            if !seen[d] {
                seen[d] = true;
                stack.push(d);
            }
        }
    }
    debug_assert_eq!(comp_order.len(), tricon.components.len());

    let mut rotations = vec![Vec::new(); tricon.components.len()];
    for &comp_id in &comp_order {
        rotations[comp_id] = embed_skeleton(
            comp_id,
            tricon,
            n_local,
            local_to_vertex,
            expansion,
        )?;
    }

    // build the half-edge arena over all components
    let mut arena: Vec<HalfEdge> = Vec::new();
    // (comp, vertex) -> ids of its half-edges, aligned with the rotation
    let mut at: HashMap<(usize, usize), Vec<usize>> = HashMap::new();

    for (c, rotation) in rotations.iter().enumerate() {
        for (v, eids) in rotation.iter().enumerate() {
            if eids.is_empty() {
                continue;
            }
            let mut ids = Vec::with_capacity(eids.len());
            for &eid in eids {
                let (a, b) = tricon.edges[eid];
                let end = if a == v { b } else { a };
                let id = arena.len();
                arena.push(HalfEdge {
                    comp: c,
                    start: v,
                    end,
                    eid,
                    is_virtual: !tricon.is_real[eid],
                    twin: usize::MAX,
                    next_clockwise: usize::MAX,
                    virtual_match: None,
                });
                ids.push(id);
            }
            for (p, &id) in ids.iter().enumerate() {
                arena[id].next_clockwise = ids[(p + 1) % ids.len()];
            }
            at.insert((c, v), ids);
        }
    }

    // twin links within each component
    for id in 0..arena.len() {
        if arena[id].twin != usize::MAX {
            continue;
        }
        let (eid, end, comp) = (arena[id].eid, arena[id].end, arena[id].comp);
        let other = at[&(comp, end)]
            .iter()
            .copied()
            .find(|&o| arena[o].eid == eid)
            .expect("every skeleton edge has both half-edges");
        arena[id].twin = other;
        arena[other].twin = id;
    }

    // virtual matches across the component pair sharing each edge id
    for eid in 0..tricon.edges.len() {
        let Some((c1, c2)) = tricon.virtual_pair(eid) else {
            continue;
        };
        let (u, v) = tricon.edges[eid];
        for x in [u, v] {
            let h1 = at[&(c1, x)]
                .iter()
                .copied()
                .find(|&h| arena[h].eid == eid)
                .expect("virtual edge present in both components");
            let h2 = at[&(c2, x)]
                .iter()
                .copied()
                .find(|&h| arena[h].eid == eid)
                .expect("virtual edge present in both components");
            arena[h1].virtual_match = Some(h2);
            arena[h2].virtual_match = Some(h1);
        }
    }

    // aggregate: walk next_clockwise per start vertex, skipping through
    // virtual matches, accumulating real ends
    let mut out = vec![Vec::new(); n_local];
    for v in 0..n_local {
        let mut start = None;
        'search: for c in 0..rotations.len() {
            if let Some(ids) = at.get(&(c, v)) {
                for &id in ids {
                    if !arena[id].is_virtual {
                        start = Some(id);
                        break 'search;
                    }
                }
            }
        }
        let Some(start) = start else {
            continue;
        };

        let mut order = vec![local_to_vertex[arena[start].end]];
        let mut cur = start;
        loop {
            let mut h = arena[cur].next_clockwise;
            while arena[h].is_virtual {
                h = arena[arena[h].virtual_match.unwrap()].next_clockwise;
            }
            debug_assert_eq!(arena[arena[h].twin].end, arena[h].start);
            if h == start {
                break;
            }
            order.push(local_to_vertex[arena[h].end]);
            cur = h;
        }
        out[v] = order;
    }

    Some(out)
}

/// Embeds the whole expansion graph: per-block SPQR merge, concatenation at
/// cut vertices (rotated so wheel hubs stay clear of the seams), and outer
/// face selection.
pub(crate) fn embed_expansion(expansion: &Expansion) -> Option<PlanarEmbedding> {
    let graph = &expansion.graph;
    let n = graph.node_count();

    if n == 0 {
        return Some(PlanarEmbedding {
            clockwise_order: vec![],
            external_face: vec![],
        });
    }

    let bct = block_cut_tree(graph);

    // per-block rotations, in expansion coordinates
    let mut block_orders: Vec<HashMap<NodeIndex, Vec<NodeIndex>>> = Vec::new();
    for (i, block) in bct.blocks.iter().enumerate() {
        let local_to_vertex = &bct.block_vertex_to_vertex[i];
        let merged = merge_block(block, local_to_vertex, expansion)?;
        let mut by_vertex = HashMap::new();
        for (local, order) in merged.into_iter().enumerate() {
            by_vertex.insert(local_to_vertex[local], order);
        }
        block_orders.push(by_vertex);
    }

    let mut clockwise_order: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
    for v in graph.node_indices() {
        let mut combined = Vec::new();
        for order in block_orders.iter_mut() {
            if let Some(list) = order.remove(&v) {
                if !list.is_empty() {
                    combined.push(rotate_avoiding_hubs(list, &expansion.hubs));
                }
            }
        }
        clockwise_order[v.index()] = combined.concat();
    }

    let external_face = select_outer_face(&clockwise_order, expansion, graph);

    Some(PlanarEmbedding {
        clockwise_order,
        external_face,
    })
}

/// Rotates a cyclic list so no wheel hub sits at either end, when possible;
/// inner-wheel faces then survive the concatenation at cut vertices.
fn rotate_avoiding_hubs(list: Vec<NodeIndex>, hubs: &HashSet<NodeIndex>) -> Vec<NodeIndex> {
    let k = list.len();
    let rotated = |s: usize| -> Vec<NodeIndex> {
        (0..k).map(|i| list[(s + i) % k]).collect()
    };
    for s in 0..k {
        if !hubs.contains(&list[s]) && !hubs.contains(&list[(s + k - 1) % k]) {
            return rotated(s);
        }
    }
    for s in 0..k {
        if !hubs.contains(&list[s]) {
            return rotated(s);
        }
    }
    list
}

/// Picks the outer face of the merged embedding. A candidate may not be an
/// inner-wheel triangular face, an outer-wheel cycle face, or a pure edge
/// face; on tree-like graphs where every candidate is ruled out, falls back
/// to a face through an edge not incident to any wheel hub.
fn select_outer_face(
    clockwise_order: &[Vec<NodeIndex>],
    expansion: &Expansion,
    graph: &UnGraph,
) -> Vec<NodeIndex> {
    let faces = faces_of(clockwise_order);

    if faces.faces.is_empty() {
        // no edges: a single vertex is its own outer face
        return graph.node_indices().take(1).collect();
    }

    let hub_neighbourhoods: Vec<HashSet<NodeIndex>> = expansion
        .hubs
        .iter()
        .map(|&h| graph.neighbors(h).collect())
        .collect();

    for id in 0..faces.faces.len() {
        let walk = faces.walk(id);
        if walk.len() == 2 {
            continue;
        }
        let vertex_set: HashSet<NodeIndex> = walk.iter().copied().collect();
        if walk.len() == 3 && walk.iter().any(|v| expansion.hubs.contains(v)) {
            continue;
        }
        if hub_neighbourhoods.iter().any(|nbrs| *nbrs == vertex_set) {
            continue;
        }
        return walk;
    }

    // tree-like fallback: any face through an edge clear of wheel hubs
    for id in 0..faces.faces.len() {
        let has_clear_edge = faces.faces[id].iter().any(|&(a, b)| {
            !expansion.hubs.contains(&a) && !expansion.hubs.contains(&b)
        });
        if has_clear_edge {
            return faces.walk(id);
        }
    }
    faces.walk(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintMap;
    use crate::EdgeLabel;

    /// Euler check for a connected rotation system: faces = |E| - |V| + 2.
    fn assert_valid_rotation_system(order: &[Vec<NodeIndex>], edge_count: usize, n: usize) {
        let degree_sum: usize = order.iter().map(|l| l.len()).sum();
        assert_eq!(degree_sum, 2 * edge_count);
        let faces = faces_of(order);
        assert_eq!(faces.faces.len(), edge_count + 2 - n, "euler");
    }

    fn build(graph: &UnGraph) -> PlanarEmbedding {
        let component: Vec<NodeIndex> = graph.node_indices().collect();
        let exp = Expansion::build(graph, &component, &ConstraintMap::new());
        embed_expansion(&exp).unwrap()
    }

    #[test]
    fn test_embed_two_triangles_with_cut_vertex() {
        let mut g = UnGraph::new_undirected();
        let n: Vec<_> = (0..5).map(|i| g.add_node(i)).collect();
        for &(u, v) in &[(0usize, 1), (1, 2), (2, 0), (0, 3), (3, 4), (4, 0)] {
            g.add_edge(n[u], n[v], EdgeLabel::Real);
        }
        let emb = build(&g);
        // faces: |E| - |V| + 1 + 1 = 6 - 5 + 2 = 3
        assert_valid_rotation_system(&emb.clockwise_order, 6, 5);
        assert_eq!(emb.clockwise_order[0].len(), 4);
        assert!(emb.external_face.len() >= 3);
    }

    #[test]
    fn test_embed_k4_through_spqr() {
        let mut g = UnGraph::new_undirected();
        let n: Vec<_> = (0..4).map(|i| g.add_node(i)).collect();
        for &(u, v) in &[(0usize, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)] {
            g.add_edge(n[u], n[v], EdgeLabel::Real);
        }
        let emb = build(&g);
        assert_valid_rotation_system(&emb.clockwise_order, 6, 4);
    }

    #[test]
    fn test_embed_tree_single_face() {
        let mut g = UnGraph::new_undirected();
        let n: Vec<_> = (0..4).map(|i| g.add_node(i)).collect();
        for &(u, v) in &[(0usize, 1), (1, 2), (1, 3)] {
            g.add_edge(n[u], n[v], EdgeLabel::Real);
        }
        let emb = build(&g);
        // a tree closes into one face walking every edge twice
        let faces = faces_of(&emb.clockwise_order);
        assert_eq!(faces.faces.len(), 1);
        assert_eq!(emb.external_face.len(), 6);
    }
}
