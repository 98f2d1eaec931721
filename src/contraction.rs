use petgraph::graph::NodeIndex;

use crate::{
    constraint::ConstraintTree,
    embedding::PlanarEmbedding,
    expansion::{Expansion, VertexGadget},
    types::UnorderedPair,
    UnGraph,
};

/// Projects an embedding of the expansion graph back to the original graph:
/// for each original vertex the gadget is walked in the expansion's clockwise
/// order, emitting the original neighbour of every leaf encountered and
/// recursing into child constraint nodes at their spokes.
///
/// The emitted order is simultaneously a linearisation of the vertex's
/// constraint tree and the planar rotation of the contracted embedding.
pub(crate) fn contract(
    original: &UnGraph,
    component: &[NodeIndex],
    expansion: &Expansion,
    exp_embedding: &PlanarEmbedding,
) -> PlanarEmbedding {
    let mut clockwise_order: Vec<Vec<NodeIndex>> = vec![Vec::new(); original.node_count()];

    for &v in component {
        let gadget = &expansion.gadgets[&v];
        let tree = &gadget.tree;
        let root = gadget.root;
        let mut order = Vec::new();

        if tree.leaf_count(root) == 0 {
            // isolated vertex
        } else if let Some(w) = tree.leaf_vertex(root) {
            order.push(w);
        } else {
            emit_node(v, gadget, tree, root, None, expansion, exp_embedding, &mut order);
        }
        clockwise_order[v.index()] = order;
    }

    let external_face = project_outer_face(&clockwise_order, expansion, exp_embedding, component);

    PlanarEmbedding {
        clockwise_order,
        external_face,
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_node(
    v: NodeIndex,
    gadget: &VertexGadget,
    tree: &ConstraintTree,
    n: usize,
    enter_from: Option<NodeIndex>,
    expansion: &Expansion,
    exp_embedding: &PlanarEmbedding,
    out: &mut Vec<NodeIndex>,
) {
    use crate::constraint::ConstraintKind;

    match tree.kind(n) {
        ConstraintKind::Group => {
            let hub = gadget.hub[&n];
            let rot = exp_embedding.order_at(hub);
            for x in cyclic_walk(rot, enter_from) {
                if let Some(&c) = gadget.attach_child.get(&x) {
                    // child gadget hanging off the hub
                    if let Some(w) = tree.leaf_vertex(c) {
                        out.push(w);
                    } else {
                        emit_node(v, gadget, tree, c, Some(hub), expansion, exp_embedding, out);
                    }
                } else {
                    // an inter-expansion edge of a leaf merged into the hub
                    let pair = UnorderedPair::new(hub, x);
                    if let Some(orig) = expansion.expansion_edge_to_edge.get(&pair) {
                        out.push(orig.other(v));
                    }
                }
            }
        }
        ConstraintKind::Oriented | ConstraintKind::Mirror => {
            let hub = gadget.hub[&n];
            let rot = exp_embedding.order_at(hub);
            let walk = match gadget.parent_spoke.get(&n).copied() {
                // below the root: skip the reserved parent spoke
                Some(p) => cyclic_walk(rot, Some(p)),
                // at the root: start the walk at the recorded spoke
                None => cyclic_walk_from(rot, gadget.start[&n]),
            };
            for s in walk {
                if let Some(&c) = gadget.spoke_child.get(&s) {
                    if let Some(w) = tree.leaf_vertex(c) {
                        out.push(w);
                    } else {
                        emit_node(v, gadget, tree, c, Some(s), expansion, exp_embedding, out);
                    }
                }
                // buffer spokes carry nothing
            }
        }
        ConstraintKind::Vertex(w) => {
            out.push(*w);
        }
    }
}

/// The rotation list read cyclically: all entries starting after `after` when
/// given, or the list as stored.
fn cyclic_walk(rot: &[NodeIndex], after: Option<NodeIndex>) -> Vec<NodeIndex> {
    match after {
        None => rot.to_vec(),
        Some(a) => {
            let k = rot.len();
            let start = rot
                .iter()
                .position(|&x| x == a)
                .expect("anchor must be a neighbour");
            (1..k).map(|i| rot[(start + i) % k]).collect()
        }
    }
}

/// The rotation list read cyclically starting at `first`, inclusive.
fn cyclic_walk_from(rot: &[NodeIndex], first: NodeIndex) -> Vec<NodeIndex> {
    let k = rot.len();
    let start = rot
        .iter()
        .position(|&x| x == first)
        .expect("anchor must be a neighbour");
    (0..k).map(|i| rot[(start + i) % k]).collect()
}

/// Chooses the contracted embedding's outer face: the face orbit carrying the
/// image of an edge on the expansion outer face, falling back to the first
/// face.
fn project_outer_face(
    clockwise_order: &[Vec<NodeIndex>],
    expansion: &Expansion,
    exp_embedding: &PlanarEmbedding,
    component: &[NodeIndex],
) -> Vec<NodeIndex> {
    let faces = crate::embedding::faces_of(clockwise_order);
    if faces.faces.is_empty() {
        return component.iter().take(1).copied().collect();
    }

    let ext = &exp_embedding.external_face;
    for i in 0..ext.len() {
        let a = ext[i];
        let b = ext[(i + 1) % ext.len()];
        let Some(orig) = expansion
            .expansion_edge_to_edge
            .get(&UnorderedPair::new(a, b))
        else {
            continue;
        };
        let u = expansion.vertex_owner[&a];
        debug_assert!(orig.contains(u));
        let w = orig.other(u);
        if let Some(&face) = faces.face_of.get(&(u, w)) {
            return faces.walk(face);
        }
    }

    faces.walk(0)
}
