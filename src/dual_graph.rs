use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::{
    embedding::{FaceSet, PlanarEmbedding},
    types::UnorderedPair,
    UnGraph,
};

/// One dual edge: the two faces separated by a set of primal edges. Parallel
/// dual edges are collapsed into one entry carrying every realising primal
/// edge; self-loops (bridges) are dropped.
#[derive(Debug, Clone)]
pub struct DualEdge {
    pub faces: (usize, usize),
    pub primal_edges: Vec<UnorderedPair>,
}

/// Combinatorial dual of a planar embedding: one vertex per face, one edge
/// class per pair of adjacent faces.
#[derive(Debug, Clone)]
pub struct DualGraph {
    pub faces: FaceSet,
    pub dual_edges: Vec<DualEdge>,
    /// Per face, incident dual edge ids in deterministic order.
    pub adj: Vec<Vec<usize>>,
    /// Primal edge -> the two faces it separates.
    pub edge_to_dual_edge: HashMap<UnorderedPair, (usize, usize)>,
    /// Face lying clockwise of each primal half-edge.
    pub right_faces: HashMap<(NodeIndex, NodeIndex), usize>,
}

/// Builds the dual graph of an embedding.
pub fn dual_graph(graph: &UnGraph, emb: &PlanarEmbedding) -> DualGraph {
    let faces = emb.faces();
    let face_count = faces.faces.len();

    let mut edge_to_dual_edge = HashMap::new();
    let mut pair_to_dual: HashMap<(usize, usize), usize> = HashMap::new();
    let mut dual_edges: Vec<DualEdge> = Vec::new();

    for e in graph.edge_references() {
        let (u, v) = (e.source(), e.target());
        let (Some(&f1), Some(&f2)) = (faces.face_of.get(&(u, v)), faces.face_of.get(&(v, u)))
        else {
            continue; // edge outside the embedded component
        };
        let pair = UnorderedPair::new(u, v);
        edge_to_dual_edge.insert(pair, (f1, f2));
        if f1 == f2 {
            continue; // a bridge separates nothing
        }
        let key = (f1.min(f2), f1.max(f2));
        let id = *pair_to_dual.entry(key).or_insert_with(|| {
            dual_edges.push(DualEdge {
                faces: key,
                primal_edges: Vec::new(),
            });
            dual_edges.len() - 1
        });
        dual_edges[id].primal_edges.push(pair);
    }

    let mut adj = vec![Vec::new(); face_count];
    for (id, de) in dual_edges.iter().enumerate() {
        adj[de.faces.0].push(id);
        adj[de.faces.1].push(id);
    }

    DualGraph {
        right_faces: faces.face_of.clone(),
        faces,
        dual_edges,
        adj,
        edge_to_dual_edge,
    }
}

impl DualGraph {
    /// Shortest face path from any start face to any end face, by BFS.
    /// Returns the face sequence, length 1 when a start face is already an
    /// end face.
    pub fn shortest_face_path(&self, starts: &[usize], ends: &[usize]) -> Option<Vec<usize>> {
        let n = self.faces.faces.len();
        let mut is_end = FixedBitSet::with_capacity(n);
        for &f in ends {
            is_end.insert(f);
        }

        let mut prev: Vec<Option<usize>> = vec![None; n];
        let mut seen = FixedBitSet::with_capacity(n);
        let mut queue = std::collections::VecDeque::new();

        for &f in starts {
            if !seen.put(f) {
                queue.push_back(f);
            }
        }

        let mut hit = None;
        'bfs: while let Some(f) = queue.pop_front() {
            if is_end.contains(f) {
                hit = Some(f);
                break 'bfs;
            }
            for &de in &self.adj[f] {
                let (a, b) = self.dual_edges[de].faces;
                let g = if a == f { b } else { a };
                if !seen.put(g) {
                    prev[g] = Some(f);
                    queue.push_back(g);
                }
            }
        }

        let mut cur = hit?;
        let mut path = vec![cur];
        while let Some(p) = prev[cur] {
            path.push(p);
            cur = p;
        }
        path.reverse();
        Some(path)
    }

    /// The primal edges realising the adjacency of two consecutive faces.
    pub fn edges_between(&self, f1: usize, f2: usize) -> &[UnorderedPair] {
        let key = (f1.min(f2), f1.max(f2));
        for de in &self.dual_edges {
            if de.faces == key {
                return &de.primal_edges;
            }
        }
        &[]
    }
}
