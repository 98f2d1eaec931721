use hashbrown::HashSet;
use petgraph::graph::NodeIndex;

use crate::{
    constraint::ConstraintMap,
    contraction::contract,
    embedding::PlanarEmbedding,
    error::{LayoutError, Result},
    expansion::Expansion,
    half_edge::embed_expansion,
    UnGraph,
};

/// Computes a planar embedding of the connected component containing `start`
/// that satisfies the given per-vertex rotational constraints, or returns
/// `Ok(None)` when no such embedding exists.
///
/// Ill-formed constraints (a tree whose leaf set disagrees with the vertex's
/// neighbour set) are rejected with [`LayoutError::InvalidConstraint`].
pub fn embed_ec(
    graph: &UnGraph,
    start: NodeIndex,
    constraints: &ConstraintMap,
) -> Result<Option<PlanarEmbedding>> {
    validate_constraints(graph, constraints)?;
    Ok(embed_ec_unchecked(graph, start, constraints))
}

/// The embedding pipeline without boundary validation: expansion, per-block
/// SPQR embedding with O-hub orientation, half-edge merge, contraction.
pub(crate) fn embed_ec_unchecked(
    graph: &UnGraph,
    start: NodeIndex,
    constraints: &ConstraintMap,
) -> Option<PlanarEmbedding> {
    let component = component_of(graph, start);
    let expansion = Expansion::build(graph, &component, constraints);
    let exp_embedding = embed_expansion(&expansion)?;
    Some(contract(graph, &component, &expansion, &exp_embedding))
}

/// Vertices of the connected component containing `start`, in BFS order.
pub(crate) fn component_of(graph: &UnGraph, start: NodeIndex) -> Vec<NodeIndex> {
    let mut seen = HashSet::new();
    let mut queue = std::collections::VecDeque::new();
    let mut out = Vec::new();
    seen.insert(start);
    queue.push_back(start);
    while let Some(v) = queue.pop_front() {
        out.push(v);
        let mut nbrs: Vec<NodeIndex> = graph.neighbors(v).collect();
        nbrs.reverse(); // petgraph iterates neighbours latest-first
        for w in nbrs {
            if seen.insert(w) {
                queue.push_back(w);
            }
        }
    }
    out
}

/// Checks that every constraint tree's leaf set equals its vertex's
/// neighbour set, with no duplicated leaves.
pub(crate) fn validate_constraints(graph: &UnGraph, constraints: &ConstraintMap) -> Result<()> {
    for (&v, tree) in constraints {
        let leaves = tree.leaves(tree.root());
        let leaf_set: HashSet<NodeIndex> = leaves.iter().copied().collect();
        if leaf_set.len() != leaves.len() {
            return Err(LayoutError::InvalidConstraint {
                vertex: graph.node_weight(v).copied().unwrap_or(v.index() as u32),
                reason: "constraint tree repeats a leaf vertex".to_string(),
            });
        }
        let neighbours: HashSet<NodeIndex> = graph.neighbors(v).collect();
        if leaf_set != neighbours {
            return Err(LayoutError::InvalidConstraint {
                vertex: graph.node_weight(v).copied().unwrap_or(v.index() as u32),
                reason: format!(
                    "constraint tree has {} leaves but the vertex has {} neighbours",
                    leaf_set.len(),
                    neighbours.len()
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintTree;
    use crate::testing::check::{is_closed_walk, is_valid_embedding, satisfies_constraints};
    use crate::testing::graphs::{complete_graph, grid_graph, petersen};

    fn v(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn test_k4_with_oriented_constraint() {
        let graph = complete_graph(4);
        let mut constraints = ConstraintMap::new();
        constraints.insert(
            v(0),
            ConstraintTree::oriented(vec![
                ConstraintTree::vertex(v(1)),
                ConstraintTree::vertex(v(2)),
                ConstraintTree::vertex(v(3)),
            ]),
        );

        let emb = embed_ec(&graph, v(0), &constraints).unwrap().unwrap();
        let component = component_of(&graph, v(0));
        assert!(is_valid_embedding(&graph, &emb, &component));
        assert!(is_closed_walk(&graph, &emb.external_face));
        assert!(satisfies_constraints(&emb, &constraints));

        // the clockwise order at v0 must be exactly [v1, v2, v3] cyclically
        let order = emb.order_at(v(0));
        let p = order.iter().position(|&x| x == v(1)).unwrap();
        assert_eq!(order[(p + 1) % 3], v(2));
        assert_eq!(order[(p + 2) % 3], v(3));
    }

    #[test]
    fn test_k4_oriented_reverse_also_embeddable() {
        // K4 has both reflections available, so the reversed listing embeds too
        let graph = complete_graph(4);
        let mut constraints = ConstraintMap::new();
        constraints.insert(
            v(0),
            ConstraintTree::oriented(vec![
                ConstraintTree::vertex(v(3)),
                ConstraintTree::vertex(v(2)),
                ConstraintTree::vertex(v(1)),
            ]),
        );
        let emb = embed_ec(&graph, v(0), &constraints).unwrap().unwrap();
        assert!(satisfies_constraints(&emb, &constraints));
    }

    #[test]
    fn test_k5_returns_absence() {
        let graph = complete_graph(5);
        assert!(embed_ec(&graph, v(0), &ConstraintMap::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_petersen_returns_absence() {
        let graph = petersen();
        assert!(embed_ec(&graph, v(0), &ConstraintMap::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unconstrained_planar_graph_embeds() {
        let graph = grid_graph(3, 4);
        let emb = embed_ec(&graph, v(0), &ConstraintMap::new())
            .unwrap()
            .unwrap();
        let component = component_of(&graph, v(0));
        assert!(is_valid_embedding(&graph, &emb, &component));
        assert!(is_closed_walk(&graph, &emb.external_face));
    }

    #[test]
    fn test_mirror_constraint_allows_either_orientation() {
        let graph = complete_graph(4);
        let mut constraints = ConstraintMap::new();
        constraints.insert(
            v(0),
            ConstraintTree::mirror(vec![
                ConstraintTree::vertex(v(1)),
                ConstraintTree::vertex(v(2)),
                ConstraintTree::vertex(v(3)),
            ]),
        );
        let emb = embed_ec(&graph, v(0), &constraints).unwrap().unwrap();
        assert!(satisfies_constraints(&emb, &constraints));
    }

    #[test]
    fn test_group_constraints_on_grid() {
        let graph = grid_graph(3, 3);
        let centre = v(4);
        let mut constraints = ConstraintMap::new();
        let nbrs: Vec<NodeIndex> = graph.neighbors(centre).collect();
        constraints.insert(
            centre,
            ConstraintTree::group(nbrs.iter().map(|&w| ConstraintTree::vertex(w)).collect()),
        );
        let emb = embed_ec(&graph, v(0), &constraints).unwrap().unwrap();
        assert!(satisfies_constraints(&emb, &constraints));
    }

    #[test]
    fn test_conflicting_oriented_constraints_fail() {
        // a triangle fan where two vertices demand opposite cyclic orders of
        // the shared neighbours; only one of the two reflections can win
        let graph = complete_graph(4);
        let mut constraints = ConstraintMap::new();
        constraints.insert(
            v(0),
            ConstraintTree::oriented(vec![
                ConstraintTree::vertex(v(1)),
                ConstraintTree::vertex(v(2)),
                ConstraintTree::vertex(v(3)),
            ]),
        );
        // at v1 the K4 rotation is forced to the reflection of v0's, so
        // demanding the same listed order around v1 is unsatisfiable
        constraints.insert(
            v(1),
            ConstraintTree::oriented(vec![
                ConstraintTree::vertex(v(0)),
                ConstraintTree::vertex(v(2)),
                ConstraintTree::vertex(v(3)),
            ]),
        );
        assert!(embed_ec(&graph, v(0), &constraints).unwrap().is_none());
    }

    #[test]
    fn test_invalid_constraint_is_rejected() {
        let graph = complete_graph(4);
        let mut constraints = ConstraintMap::new();
        constraints.insert(
            v(0),
            ConstraintTree::oriented(vec![
                ConstraintTree::vertex(v(1)),
                ConstraintTree::vertex(v(2)),
            ]),
        );
        assert!(matches!(
            embed_ec(&graph, v(0), &constraints),
            Err(LayoutError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn test_random_graphs_embed_consistently() {
        use crate::testing::graphs::random_graph;
        for i in 0..30 {
            let n = 4 + i / 3;
            let m = n + i;
            let graph = random_graph(n, m, i);
            let component = component_of(&graph, v(0));
            if let Some(emb) = embed_ec(&graph, v(0), &ConstraintMap::new()).unwrap() {
                assert!(is_valid_embedding(&graph, &emb, &component), "seed {}", i);
                assert!(is_closed_walk(&graph, &emb.external_face), "seed {}", i);
            }
        }
    }

    #[test]
    fn test_component_restriction() {
        // two disjoint triangles; embedding from one leaves the other empty
        let mut graph = complete_graph(3);
        let a = graph.add_node(3);
        let b = graph.add_node(4);
        let c = graph.add_node(5);
        graph.add_edge(a, b, crate::EdgeLabel::Real);
        graph.add_edge(b, c, crate::EdgeLabel::Real);
        graph.add_edge(c, a, crate::EdgeLabel::Real);

        let emb = embed_ec(&graph, v(0), &ConstraintMap::new())
            .unwrap()
            .unwrap();
        assert!(emb.order_at(a).is_empty());
        assert!(!emb.order_at(v(0)).is_empty());
    }
}
