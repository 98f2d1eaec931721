use hashbrown::HashMap;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::{
    constraint::{ConstraintMap, ConstraintTree},
    dual_graph::{dual_graph, DualGraph},
    ec_embedding::{component_of, embed_ec_unchecked, validate_constraints},
    embedding::PlanarEmbedding,
    error::Result,
    types::UnorderedPair,
    EdgeLabel, UnGraph,
};

/// The two threads through a crossing vertex: traversing the crossing from
/// `start1` continues to `end1`, and from `start2` to `end2`. The mirror
/// constraint imposed on the crossing lists its neighbours in the interleaved
/// order `[start1, start2, end1, end2]`, which pins the rotation to a genuine
/// crossing in either handedness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub start1: NodeIndex,
    pub end1: NodeIndex,
    pub start2: NodeIndex,
    pub end2: NodeIndex,
}

impl Crossing {
    fn replace(&mut self, old: NodeIndex, new: NodeIndex) {
        for slot in [
            &mut self.start1,
            &mut self.end1,
            &mut self.start2,
            &mut self.end2,
        ] {
            if *slot == old {
                *slot = new;
            }
        }
    }
}

/// Result of [`embed_ec_with_crossings`]: a planar super-graph of the input
/// in which every input edge is realised by a path through added vertices
/// (degree-4 crossing vertices and degree-2 subdivision vertices), plus a
/// constraint-respecting planar embedding of that super-graph.
#[derive(Debug)]
pub struct PlanarEmbeddingWithCrossings {
    /// The planar super-graph.
    pub graph: UnGraph,
    /// Its constraint-respecting embedding.
    pub embedding: PlanarEmbedding,
    /// Input vertex -> super-graph vertex (the identity here; input vertices
    /// keep their indices).
    pub original_to_vertex: HashMap<NodeIndex, NodeIndex>,
    /// Per input edge, the realising path in the super-graph, from one
    /// endpoint to the other.
    pub added_vertices: HashMap<UnorderedPair, Vec<NodeIndex>>,
    /// Crossing vertex -> its thread metadata.
    pub crossings: HashMap<NodeIndex, Crossing>,
    /// Non-crossing subdivision vertices that survived cleanup.
    pub subdivisions: Vec<NodeIndex>,
}

/// Embeds the connected component of `start` under the given constraints,
/// inserting crossing vertices where constrained planarity fails. Always
/// succeeds on well-formed constraints: any graph is realisable with enough
/// crossings.
///
/// Edges are added greedily in breadth-first order, probing the EC embedder
/// after each; rejected edges are re-inserted along a shortest face path in
/// the dual of a fresh embedding, one mirror-constrained crossing vertex per
/// crossed edge.
pub fn embed_ec_with_crossings(
    graph: &UnGraph,
    start: NodeIndex,
    constraints: &ConstraintMap,
) -> Result<PlanarEmbeddingWithCrossings> {
    validate_constraints(graph, constraints)?;

    let component = component_of(graph, start);
    let mut state = Inserter::new(graph, &component, constraints);

    // greedy pass: keep every edge the EC embedder accepts
    let mut cross_edges = Vec::new();
    for (u, w) in bfs_edge_order(graph, &component) {
        state.out.add_edge(u, w, EdgeLabel::Real);
        let cons = state.restricted_constraints();
        if embed_ec_unchecked(&state.out, u, &cons).is_none() {
            let e = state.out.find_edge(u, w).unwrap();
            state.out.remove_edge(e);
            cross_edges.push((u, w));
        } else {
            state.register_kept_edge(u, w);
        }
    }

    for (s, t) in cross_edges {
        state.insert_cross_edge(s, t);
    }

    state.contract_unneeded_subdivisions();

    let cons = state.restricted_constraints();
    let embedding = embed_ec_unchecked(&state.out, start, &cons)
        .expect("crossing insertion always yields an embeddable graph");

    let mut original_to_vertex = HashMap::new();
    for &v in &component {
        original_to_vertex.insert(v, v);
    }

    Ok(PlanarEmbeddingWithCrossings {
        graph: state.out,
        embedding,
        original_to_vertex,
        added_vertices: state.paths,
        crossings: state.crossings,
        subdivisions: state.subdivisions,
    })
}

/// Edges of the component in breadth-first order from its first vertex.
fn bfs_edge_order(graph: &UnGraph, component: &[NodeIndex]) -> Vec<(NodeIndex, NodeIndex)> {
    let mut listed = hashbrown::HashSet::new();
    let mut out = Vec::new();
    for &u in component {
        let mut nbrs: Vec<NodeIndex> = graph.neighbors(u).collect();
        nbrs.reverse();
        for w in nbrs {
            if listed.insert(UnorderedPair::new(u, w)) {
                out.push((u, w));
            }
        }
    }
    out
}

/// Mutable state of the crossing insertion: the growing super-graph, the
/// per-vertex constraint trees over current neighbour ids, the realising
/// paths, and the crossing records.
struct Inserter {
    out: UnGraph,
    /// Constraint tree per vertex, leaves referring to current neighbours
    /// (or to not-yet-inserted original neighbours).
    trees: HashMap<NodeIndex, ConstraintTree>,
    /// Original edge -> its realising path.
    paths: HashMap<UnorderedPair, Vec<NodeIndex>>,
    /// Current super-graph segment -> the original edge it belongs to.
    seg_to_edge: HashMap<UnorderedPair, UnorderedPair>,
    crossings: HashMap<NodeIndex, Crossing>,
    subdivisions: Vec<NodeIndex>,
}

impl Inserter {
    fn new(graph: &UnGraph, component: &[NodeIndex], constraints: &ConstraintMap) -> Self {
        let mut out = UnGraph::new_undirected();
        for v in graph.node_indices() {
            out.add_node(*graph.node_weight(v).unwrap());
        }
        let mut trees = HashMap::new();
        for &v in component {
            if let Some(tree) = constraints.get(&v) {
                trees.insert(v, tree.clone());
            }
        }
        Inserter {
            out,
            trees,
            paths: HashMap::new(),
            seg_to_edge: HashMap::new(),
            crossings: HashMap::new(),
            subdivisions: Vec::new(),
        }
    }

    fn register_kept_edge(&mut self, u: NodeIndex, w: NodeIndex) {
        let pair = UnorderedPair::new(u, w);
        self.paths.insert(pair, vec![u, w]);
        self.seg_to_edge.insert(pair, pair);
    }

    /// The constraint map restricted to edges present in the super-graph.
    fn restricted_constraints(&self) -> ConstraintMap {
        let mut cons = ConstraintMap::new();
        for (&v, tree) in &self.trees {
            let mut present = HashMap::new();
            for leaf in tree.leaves(tree.root()) {
                if self.out.find_edge(v, leaf).is_some() {
                    present.insert(leaf, leaf);
                }
            }
            if let Some(restricted) = tree.replace_vertices(&present) {
                cons.insert(v, restricted);
            }
        }
        cons
    }

    /// Inserts the rejected edge `(s, t)` along a shortest dual face path,
    /// one crossing vertex per crossed primal edge.
    fn insert_cross_edge(&mut self, s: NodeIndex, t: NodeIndex) {
        if self.out.neighbors(s).count() == 0 || self.out.neighbors(t).count() == 0 {
            // a pendant endpoint embeds directly in any allowed gap
            self.out.add_edge(s, t, EdgeLabel::Real);
            self.register_kept_edge(s, t);
            return;
        }

        let cons = self.restricted_constraints();
        let emb = embed_ec_unchecked(&self.out, s, &cons)
            .expect("the grown graph stays embeddable between insertions");
        let dual = dual_graph(&self.out, &emb);

        let start_faces = self.allowed_faces(s, t, &emb, &dual);
        let end_faces = self.allowed_faces(t, s, &emb, &dual);
        let path = dual
            .shortest_face_path(&start_faces, &end_faces)
            .expect("the dual of a connected embedding is connected");

        if path.len() == 1 {
            // a shared admissible face: the edge embeds without crossing
            self.out.add_edge(s, t, EdgeLabel::Real);
            self.register_kept_edge(s, t);
            return;
        }

        let pair_st = UnorderedPair::new(s, t);
        let mut chain = vec![s];
        let mut prev = s;
        let last_step = path.len() - 1;

        for i in 1..path.len() {
            let candidates = dual.edges_between(path[i - 1], path[i]);
            debug_assert!(!candidates.is_empty());
            let mut chosen = *candidates
                .iter()
                .find(|c| !c.contains(s) && !c.contains(t))
                .unwrap_or(&candidates[0]);

            // an incident edge at the chain's own endpoint would produce a
            // parallel edge; a subdivision vertex makes room
            if i == 1 && chosen.contains(s) {
                chosen = self.subdivide_segment(chosen, s);
            }
            if i == last_step && chosen.contains(t) {
                chosen = self.subdivide_segment(chosen, t);
            }

            let (a, b) = (chosen.first(), chosen.second());
            let x = self.fresh_vertex();

            let e = self.out.find_edge(a, b).unwrap();
            self.out.remove_edge(e);
            self.out.add_edge(a, x, EdgeLabel::Real);
            self.out.add_edge(x, b, EdgeLabel::Real);
            self.out.add_edge(prev, x, EdgeLabel::Real);

            self.split_segment_bookkeeping(chosen, x);
            self.replace_in_tree(a, b, x);
            self.replace_in_tree(b, a, x);

            // thread 1 follows the crossed edge, thread 2 the new chain;
            // end2 is filled when the next chain vertex exists
            self.crossings.insert(
                x,
                Crossing {
                    start1: a,
                    end1: b,
                    start2: prev,
                    end2: x,
                },
            );
            if let Some(c) = self.crossings.get_mut(&prev) {
                if c.end2 == prev {
                    c.end2 = x;
                }
            }
            self.seg_to_edge.insert(UnorderedPair::new(prev, x), pair_st);

            chain.push(x);
            prev = x;
        }

        self.out.add_edge(prev, t, EdgeLabel::Real);
        self.seg_to_edge.insert(UnorderedPair::new(prev, t), pair_st);
        if let Some(c) = self.crossings.get_mut(&prev) {
            if c.end2 == prev {
                c.end2 = t;
            }
        }

        // endpoints now see the chain heads in place of each other
        self.replace_in_tree(s, t, chain[1]);
        self.replace_in_tree(t, s, prev);

        // mirror-constrain every new crossing vertex
        for &x in &chain[1..] {
            let c = self.crossings[&x].clone();
            self.trees.insert(
                x,
                ConstraintTree::mirror(vec![
                    ConstraintTree::vertex(c.start1),
                    ConstraintTree::vertex(c.start2),
                    ConstraintTree::vertex(c.end1),
                    ConstraintTree::vertex(c.end2),
                ]),
            );
        }

        chain.push(t);
        self.paths.insert(pair_st, chain);
    }

    /// Faces into which a new edge at `v` may emerge without violating `v`'s
    /// constraint: for every admissible gap between consecutive current
    /// neighbours, the face at that corner.
    fn allowed_faces(
        &self,
        v: NodeIndex,
        towards: NodeIndex,
        emb: &PlanarEmbedding,
        dual: &DualGraph,
    ) -> Vec<usize> {
        let rot = emb.order_at(v);
        let d = rot.len();
        debug_assert!(d > 0);

        let placeholder = NodeIndex::new(self.out.node_count());
        let candidate_tree = self.trees.get(&v).map(|tree| {
            let mut map = HashMap::new();
            for leaf in tree.leaves(tree.root()) {
                if self.out.find_edge(v, leaf).is_some() {
                    map.insert(leaf, leaf);
                }
            }
            map.insert(towards, placeholder);
            tree.replace_vertices(&map)
                .expect("a constrained vertex with a pending edge keeps at least one leaf")
        });

        let mut faces = Vec::new();
        for i in 0..d {
            if let Some(tree) = &candidate_tree {
                let mut candidate: Vec<NodeIndex> = Vec::with_capacity(d + 1);
                candidate.extend_from_slice(&rot[..=i]);
                candidate.push(placeholder);
                candidate.extend_from_slice(&rot[i + 1..]);
                if !tree.order_satisfies(&candidate) {
                    continue;
                }
            }
            let next = rot[(i + 1) % d];
            if let Some(&f) = dual.right_faces.get(&(v, next)) {
                if !faces.contains(&f) {
                    faces.push(f);
                }
            }
        }
        debug_assert!(!faces.is_empty());
        faces
    }

    /// Splits the segment `(near, far)` with a fresh subdivision vertex next
    /// to `near`, returning the far part for crossing.
    fn subdivide_segment(&mut self, seg: UnorderedPair, near: NodeIndex) -> UnorderedPair {
        let far = seg.other(near);
        let d = self.fresh_vertex();

        let e = self.out.find_edge(near, far).unwrap();
        self.out.remove_edge(e);
        self.out.add_edge(near, d, EdgeLabel::Real);
        self.out.add_edge(d, far, EdgeLabel::Real);

        self.split_segment_bookkeeping(seg, d);
        self.replace_in_tree(near, far, d);
        self.replace_in_tree(far, near, d);
        self.subdivisions.push(d);

        UnorderedPair::new(d, far)
    }

    fn fresh_vertex(&mut self) -> NodeIndex {
        let id = self.out.node_count() as u32;
        self.out.add_node(id)
    }

    /// Replaces segment `(a, b)` of its original edge's path with the two
    /// segments through `mid`.
    fn split_segment_bookkeeping(&mut self, seg: UnorderedPair, mid: NodeIndex) {
        let orig = self
            .seg_to_edge
            .remove(&seg)
            .expect("every segment belongs to a path");
        let path = self.paths.get_mut(&orig).expect("path exists");
        let pos = path
            .windows(2)
            .position(|w| UnorderedPair::new(w[0], w[1]) == seg)
            .expect("segment lies on its path");
        path.insert(pos + 1, mid);
        self.seg_to_edge
            .insert(UnorderedPair::new(seg.first(), mid), orig);
        self.seg_to_edge
            .insert(UnorderedPair::new(mid, seg.second()), orig);
    }

    /// Rewrites `v`'s constraint leaf for `old` to `new`, and patches `v`'s
    /// crossing record when `v` is itself a crossing vertex.
    fn replace_in_tree(&mut self, v: NodeIndex, old: NodeIndex, new: NodeIndex) {
        if let Some(tree) = self.trees.get_mut(&v) {
            tree.replace_leaf(old, new);
        }
        if let Some(c) = self.crossings.get_mut(&v) {
            c.replace(old, new);
        }
    }

    /// Contracts out subdivision vertices whose two sides turned out not to
    /// need them: reconnect the neighbours directly unless that would create
    /// a parallel edge, and propagate into adjacent records.
    fn contract_unneeded_subdivisions(&mut self) {
        let mut kept = Vec::new();
        for &d in &self.subdivisions.clone() {
            let nbrs: Vec<NodeIndex> = self.out.neighbors(d).collect();
            if nbrs.len() != 2 {
                kept.push(d);
                continue;
            }
            let (p, q) = (nbrs[1], nbrs[0]);
            if self.out.find_edge(p, q).is_some() {
                kept.push(d);
                continue;
            }

            while let Some(e) = self.out.edges(d).next().map(|e| e.id()) {
                self.out.remove_edge(e);
            }
            self.out.add_edge(p, q, EdgeLabel::Real);

            // drop d from its path and stitch the segment maps
            let orig = self
                .seg_to_edge
                .remove(&UnorderedPair::new(p, d))
                .expect("segment belongs to a path");
            self.seg_to_edge.remove(&UnorderedPair::new(d, q));
            self.seg_to_edge.insert(UnorderedPair::new(p, q), orig);
            let path = self.paths.get_mut(&orig).expect("path exists");
            path.retain(|&x| x != d);

            self.replace_in_tree(p, d, q);
            self.replace_in_tree(q, d, p);
            self.trees.remove(&d);
        }
        self.subdivisions = kept;
    }
}
