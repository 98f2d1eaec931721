use crate::{
    triconnected::triconnected_components,
    triconnected_blocks::outside_structures::TriconnectedComponents,
    UnGraph,
};

/// SPQR tree of a biconnected graph: the triconnected components plus the
/// tree edges between components sharing a virtual edge.
#[derive(Debug, Clone)]
pub struct SpqrTree {
    pub tricon: TriconnectedComponents,
    pub adj: Vec<Vec<usize>>,
}

impl SpqrTree {
    fn new(tricon: TriconnectedComponents) -> Self {
        let n = tricon.components.len();
        SpqrTree {
            tricon,
            adj: vec![Vec::new(); n],
        }
    }

    fn add_edge(&mut self, u: usize, v: usize) {
        self.adj[u].push(v);
        self.adj[v].push(u);
    }
}

/// Builds the SPQR tree by connecting every pair of components that share a
/// virtual edge.
pub fn spqr_tree(graph: &UnGraph) -> SpqrTree {
    let tricon = triconnected_components(graph);

    let mut tree = SpqrTree::new(tricon);

    for eid in 0..tree.tricon.edges.len() {
        if let Some((a, b)) = tree.tricon.virtual_pair(eid) {
            tree.add_edge(a, b);
        }
    }

    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgeLabel;
    use petgraph::graph::NodeIndex;

    #[test]
    fn test_spqr_tree_of_two_triangles() {
        let mut g = UnGraph::new_undirected();
        for i in 0..4 {
            g.add_node(i);
        }
        for &(u, v) in &[(0usize, 1usize), (0, 2), (1, 2), (0, 3), (1, 3)] {
            g.add_edge(NodeIndex::new(u), NodeIndex::new(v), EdgeLabel::Real);
        }
        let tree = spqr_tree(&g);
        // two S nodes hanging off one P node
        assert_eq!(tree.tricon.components.len(), 3);
        let degrees: Vec<usize> = tree.adj.iter().map(|a| a.len()).collect();
        assert_eq!(degrees.iter().sum::<usize>(), 4);
        assert_eq!(*degrees.iter().max().unwrap(), 2);
    }

    #[test]
    fn test_spqr_tree_of_rigid_graph_is_single_node() {
        let mut g = UnGraph::new_undirected();
        for i in 0..4 {
            g.add_node(i);
        }
        for &(u, v) in &[(0usize, 1usize), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)] {
            g.add_edge(NodeIndex::new(u), NodeIndex::new(v), EdgeLabel::Real);
        }
        let tree = spqr_tree(&g);
        assert_eq!(tree.tricon.components.len(), 1);
        assert!(tree.adj[0].is_empty());
    }
}
