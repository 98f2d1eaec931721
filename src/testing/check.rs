use hashbrown::HashSet;
use petgraph::graph::NodeIndex;

use crate::{
    constraint::ConstraintMap,
    embedding::{faces_of, PlanarEmbedding},
    UnGraph,
};

/// Checks that an embedding of one connected component is a planar rotation
/// system: every embedded vertex's neighbour list matches its adjacency, and
/// the face orbits close in exactly `|E| - |V| + 2` faces.
pub fn is_valid_embedding(graph: &UnGraph, emb: &PlanarEmbedding, component: &[NodeIndex]) -> bool {
    let in_component: HashSet<NodeIndex> = component.iter().copied().collect();
    let mut edge_count = 0;

    for &v in component {
        let listed: HashSet<NodeIndex> = emb.order_at(v).iter().copied().collect();
        if listed.len() != emb.order_at(v).len() {
            return false;
        }
        let actual: HashSet<NodeIndex> = graph
            .neighbors(v)
            .filter(|w| in_component.contains(w))
            .collect();
        if listed != actual {
            return false;
        }
        edge_count += listed.len();
    }
    edge_count /= 2;

    if edge_count == 0 {
        return component.len() <= 1;
    }

    let faces = faces_of(&emb.clockwise_order);
    faces.faces.len() == edge_count + 2 - component.len()
}

/// Checks that the external face is a closed walk of graph edges.
pub fn is_closed_walk(graph: &UnGraph, walk: &[NodeIndex]) -> bool {
    if walk.len() < 2 {
        return true;
    }
    for i in 0..walk.len() {
        let a = walk[i];
        let b = walk[(i + 1) % walk.len()];
        if graph.find_edge(a, b).is_none() {
            return false;
        }
    }
    true
}

/// Checks property 1: every constrained vertex's clockwise order linearises
/// its constraint tree.
pub fn satisfies_constraints(emb: &PlanarEmbedding, constraints: &ConstraintMap) -> bool {
    for (&v, tree) in constraints {
        let order = emb.order_at(v);
        if order.is_empty() && tree.leaf_count(tree.root()) == 0 {
            continue;
        }
        if !tree.order_satisfies(order) {
            return false;
        }
    }
    true
}
