use hashbrown::{HashMap, HashSet};
use petgraph::graph::NodeIndex;

use crate::embedding_blocks::lr::LrPlanarity;

/// Combinatorial description of a planar drawing: for every vertex the list
/// of its neighbours clockwise around it, plus one face walk designated as
/// the outer face.
///
/// `clockwise_order` is indexed by `NodeIndex::index()`; vertices outside the
/// embedded component carry empty lists. `external_face` is a closed walk:
/// consecutive entries (and last-to-first) are edges, and vertices may repeat
/// on tree-like graphs.
#[derive(Debug, Clone)]
pub struct PlanarEmbedding {
    pub clockwise_order: Vec<Vec<NodeIndex>>,
    pub external_face: Vec<NodeIndex>,
}

impl PlanarEmbedding {
    /// The clockwise neighbour order of `v`.
    pub fn order_at(&self, v: NodeIndex) -> &[NodeIndex] {
        &self.clockwise_order[v.index()]
    }

    /// Enumerates the face orbits of the rotation system.
    pub fn faces(&self) -> FaceSet {
        faces_of(&self.clockwise_order)
    }
}

/// The face orbits of a rotation system. Each directed half-edge lies on
/// exactly one face; `face_of[(u, v)]` is the face traced by following
/// `(u, v)` under the next-clockwise-at-end rule.
#[derive(Debug, Clone)]
pub struct FaceSet {
    pub faces: Vec<Vec<(NodeIndex, NodeIndex)>>,
    pub face_of: HashMap<(NodeIndex, NodeIndex), usize>,
}

impl FaceSet {
    /// The face walk as a vertex sequence (sources of the half-edges).
    pub fn walk(&self, face: usize) -> Vec<NodeIndex> {
        self.faces[face].iter().map(|&(u, _)| u).collect()
    }
}

/// Computes the face orbits of a rotation system: from half-edge `(u, v)` the
/// walk continues with `(v, w)` where `w` follows `u` in the clockwise order
/// at `v`.
pub fn faces_of(clockwise_order: &[Vec<NodeIndex>]) -> FaceSet {
    let mut pos: HashMap<(NodeIndex, NodeIndex), usize> = HashMap::new();
    for (ui, nbrs) in clockwise_order.iter().enumerate() {
        let u = NodeIndex::new(ui);
        for (i, &v) in nbrs.iter().enumerate() {
            pos.insert((u, v), i);
        }
    }

    let mut faces = Vec::new();
    let mut face_of = HashMap::new();

    for (ui, nbrs) in clockwise_order.iter().enumerate() {
        let u = NodeIndex::new(ui);
        for &v in nbrs.iter() {
            if face_of.contains_key(&(u, v)) {
                continue;
            }
            let id = faces.len();
            let mut walk = Vec::new();
            let (mut a, mut b) = (u, v);
            loop {
                face_of.insert((a, b), id);
                walk.push((a, b));
                let list = &clockwise_order[b.index()];
                let i = pos[&(b, a)];
                let w = list[(i + 1) % list.len()];
                a = b;
                b = w;
                if (a, b) == (u, v) {
                    break;
                }
            }
            faces.push(walk);
        }
    }

    FaceSet { faces, face_of }
}

/// Runs the left-right planarity test on the given edge list over vertices
/// `0..n` and returns a planar rotation (per-vertex neighbour order in one
/// consistent orientation), or `None` when the graph is not planar.
///
/// Parallel edges are merged and self-loops ignored, so the rotation covers
/// the simple support of the input. Disconnected inputs are embedded
/// per component.
pub fn planar_rotation(n: usize, edges: &[(usize, usize)]) -> Option<Vec<Vec<usize>>> {
    if n == 0 {
        return Some(vec![]);
    }

    // reduce to the simple support
    let mut seen = HashSet::new();
    let mut simple = Vec::new();
    for &(u, v) in edges {
        if u != v && seen.insert((u.min(v), u.max(v))) {
            simple.push((u, v));
        }
    }

    LrPlanarity::new(n, &simple).embed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_graph_edges(n: usize) -> Vec<(usize, usize)> {
        let mut edges = vec![];
        for i in 0..n {
            for j in i + 1..n {
                edges.push((i, j));
            }
        }
        edges
    }

    fn face_count(order: &[Vec<usize>]) -> usize {
        let as_nodes: Vec<Vec<NodeIndex>> = order
            .iter()
            .map(|l| l.iter().map(|&v| NodeIndex::new(v)).collect())
            .collect();
        faces_of(&as_nodes).faces.len()
    }

    fn degree_sum(order: &[Vec<usize>]) -> usize {
        order.iter().map(|l| l.len()).sum()
    }

    #[test]
    fn test_k4_is_planar_with_euler_faces() {
        let order = planar_rotation(4, &complete_graph_edges(4)).unwrap();
        assert_eq!(degree_sum(&order), 12);
        // |E| - |V| + c + 1 = 6 - 4 + 1 + 1
        assert_eq!(face_count(&order), 4);
    }

    #[test]
    fn test_k5_is_not_planar() {
        assert!(planar_rotation(5, &complete_graph_edges(5)).is_none());
    }

    #[test]
    fn test_k33_is_not_planar() {
        let mut edges = vec![];
        for i in 0..3 {
            for j in 3..6 {
                edges.push((i, j));
            }
        }
        assert!(planar_rotation(6, &edges).is_none());
    }

    #[test]
    fn test_tree_has_single_face() {
        let order = planar_rotation(4, &[(0, 1), (1, 2), (1, 3)]).unwrap();
        assert_eq!(face_count(&order), 1);
    }

    #[test]
    fn test_disconnected_components() {
        let order = planar_rotation(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]).unwrap();
        // two triangles; face orbits are per component, 2 each
        assert_eq!(face_count(&order), 4);
    }

    #[test]
    fn test_parallel_edges_are_merged() {
        let order = planar_rotation(2, &[(0, 1), (0, 1), (1, 0)]).unwrap();
        assert_eq!(order[0], vec![1]);
        assert_eq!(order[1], vec![0]);
    }

    #[test]
    fn test_grid_rotation_is_planar_consistent() {
        // 3x3 grid: 9 vertices, 12 edges, faces = 12 - 9 + 1 + 1 = 5
        let mut edges = vec![];
        for r in 0..3 {
            for c in 0..3 {
                if r + 1 < 3 {
                    edges.push((r * 3 + c, (r + 1) * 3 + c));
                }
                if c + 1 < 3 {
                    edges.push((r * 3 + c, r * 3 + c + 1));
                }
            }
        }
        let order = planar_rotation(9, &edges).unwrap();
        assert_eq!(face_count(&order), 5);
    }
}
