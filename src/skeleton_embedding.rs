use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use crate::{
    embedding::planar_rotation,
    expansion::Expansion,
    triconnected_blocks::outside_structures::{ComponentType, TriconnectedComponents},
};

/// Rotation system of one SPQR component skeleton: for each block-local
/// vertex, the incident skeleton edge ids in clockwise order. Vertices not in
/// the component carry empty lists.
pub(crate) type SkeletonRotation = Vec<Vec<usize>>;

/// Embeds one SPQR component skeleton and fixes its orientation against the
/// O-hubs it contains.
///
/// * P-node skeletons (two vertices, parallel edges) get one deterministic
///   edge order at one end and the reverse at the other.
/// * S-node skeletons (a cycle) are embedded by walking the cycle; the
///   embedding is unique up to reflection.
/// * R-node skeletons go through the planar embedder on a simple-graph view.
///   Every O-hub whose recorded spoke pair appears in the skeleton votes on
///   the orientation; contradictory votes fail the embedding (`None`), and a
///   unanimous "flipped" vote reflects the skeleton.
///
/// `local_to_vertex` translates block-local vertex ids to expansion vertices
/// for the O-hub lookup.
pub(crate) fn embed_skeleton(
    comp_id: usize,
    tricon: &TriconnectedComponents,
    n_local: usize,
    local_to_vertex: &[NodeIndex],
    expansion: &Expansion,
) -> Option<SkeletonRotation> {
    let comp = &tricon.components[comp_id];
    let mut rotation: SkeletonRotation = vec![Vec::new(); n_local];

    match comp.comp_type.unwrap() {
        ComponentType::P => {
            let (u, v) = tricon.edges[comp.edges[0]];
            for &eid in &comp.edges {
                rotation[u].push(eid);
            }
            rotation[v] = comp.edges.iter().rev().copied().collect();
            Some(rotation)
        }
        ComponentType::S => {
            // walk the cycle; each vertex sees [arriving edge, leaving edge]
            let mut incident: HashMap<usize, Vec<usize>> = HashMap::new();
            for &eid in &comp.edges {
                let (u, v) = tricon.edges[eid];
                incident.entry(u).or_default().push(eid);
                incident.entry(v).or_default().push(eid);
            }
            let first = comp.edges[0];
            let (start, mut cur) = tricon.edges[first];
            let mut prev_eid = first;
            rotation[start].push(first);
            while cur != start {
                let eids = &incident[&cur];
                let next_eid = if eids[0] == prev_eid { eids[1] } else { eids[0] };
                rotation[cur].push(prev_eid);
                rotation[cur].push(next_eid);
                let (a, b) = tricon.edges[next_eid];
                cur = if a == cur { b } else { a };
                prev_eid = next_eid;
            }
            rotation[start].insert(0, prev_eid);
            Some(rotation)
        }
        ComponentType::R => {
            // compact the skeleton into 0..nc and run the planar embedder
            let mut compact: HashMap<usize, usize> = HashMap::new();
            let mut uncompact: Vec<usize> = Vec::new();
            let mut pair_to_eid: HashMap<(usize, usize), usize> = HashMap::new();
            let mut edges: Vec<(usize, usize)> = Vec::new();
            for &eid in &comp.edges {
                let (u, v) = tricon.edges[eid];
                for x in [u, v] {
                    if !compact.contains_key(&x) {
                        compact.insert(x, uncompact.len());
                        uncompact.push(x);
                    }
                }
                let (cu, cv) = (compact[&u], compact[&v]);
                pair_to_eid.insert((cu, cv), eid);
                pair_to_eid.insert((cv, cu), eid);
                edges.push((cu, cv));
            }

            let order = planar_rotation(uncompact.len(), &edges)?;

            let mut can_plain = true;
            let mut can_flipped = true;
            for (cu, nbrs) in order.iter().enumerate() {
                let hub = local_to_vertex[uncompact[cu]];
                let (Some(&first), Some(&second)) = (
                    expansion.o_hub_firsts.get(&hub),
                    expansion.o_hub_seconds.get(&hub),
                ) else {
                    continue;
                };
                let d = nbrs.len();
                let mut fpos = None;
                let mut spos = None;
                for (i, &cw) in nbrs.iter().enumerate() {
                    let w = local_to_vertex[uncompact[cw]];
                    if w == first {
                        fpos = Some(i);
                    }
                    if w == second {
                        spos = Some(i);
                    }
                }
                let (Some(fpos), Some(spos)) = (fpos, spos) else {
                    continue;
                };
                let plain_here = (fpos + 1) % d == spos;
                let flipped_here = (spos + 1) % d == fpos;
                can_plain &= plain_here;
                can_flipped &= flipped_here;
            }

            if !can_plain && !can_flipped {
                return None;
            }

            for (cu, nbrs) in order.iter().enumerate() {
                let mut eids: Vec<usize> = nbrs
                    .iter()
                    .map(|&cw| pair_to_eid[&(cu, cw)])
                    .collect();
                if !can_plain {
                    eids.reverse();
                }
                rotation[uncompact[cu]] = eids;
            }
            Some(rotation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::Expansion;
    use crate::{constraint::ConstraintMap, triconnected::triconnected_components, EdgeLabel, UnGraph};
    use petgraph::graph::NodeIndex;

    fn cycle_graph(n: usize) -> UnGraph {
        let mut g = UnGraph::new_undirected();
        for i in 0..n {
            g.add_node(i as u32);
        }
        for i in 0..n {
            g.add_edge(
                NodeIndex::new(i),
                NodeIndex::new((i + 1) % n),
                EdgeLabel::Real,
            );
        }
        g
    }

    #[test]
    fn test_cycle_skeleton_rotation() {
        let g = cycle_graph(5);
        let tricon = triconnected_components(&g);
        assert_eq!(tricon.components.len(), 1);

        let local_to_vertex: Vec<NodeIndex> = g.node_indices().collect();
        let dummy = Expansion::build(&g, &local_to_vertex, &ConstraintMap::new());
        let rot = embed_skeleton(0, &tricon, 5, &local_to_vertex, &dummy).unwrap();
        for v in 0..5 {
            assert_eq!(rot[v].len(), 2, "cycle vertex must see two edges");
        }
    }

    #[test]
    fn test_k4_skeleton_rotation_covers_all_edges() {
        let mut g = UnGraph::new_undirected();
        for i in 0..4 {
            g.add_node(i);
        }
        for &(u, v) in &[(0usize, 1usize), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)] {
            g.add_edge(NodeIndex::new(u), NodeIndex::new(v), EdgeLabel::Real);
        }
        let tricon = triconnected_components(&g);
        assert_eq!(tricon.components.len(), 1);

        let local_to_vertex: Vec<NodeIndex> = g.node_indices().collect();
        let dummy = Expansion::build(&g, &local_to_vertex, &ConstraintMap::new());
        let rot = embed_skeleton(0, &tricon, 4, &local_to_vertex, &dummy).unwrap();
        let total: usize = rot.iter().map(|r| r.len()).sum();
        assert_eq!(total, 12);
    }
}
