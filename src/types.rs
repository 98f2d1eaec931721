use petgraph::graph::NodeIndex;

/// Enum representing the type of edge in a graph.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum EdgeLabel {
    Real,
    Virtual,
    Structure,
}

impl std::fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeLabel::Real => write!(f, "Real"),
            EdgeLabel::Virtual => write!(f, "Virtual"),
            EdgeLabel::Structure => write!(f, "Structure"),
        }
    }
}

/// Wrapper for petgraph's graph type.
///
/// Node weights are stable integer ids attached solely for debug printing;
/// all algorithms identify vertices by `NodeIndex`.
pub type UnGraph = petgraph::graph::UnGraph<u32, EdgeLabel>;

/// Enum to mark edges in DFS tree.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DFSEdgeLabel {
    Unvisited,
    Tree,
    Back,
}

impl std::fmt::Display for DFSEdgeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DFSEdgeLabel::Unvisited => write!(f, "Unvisited"),
            DFSEdgeLabel::Tree => write!(f, "Tree"),
            DFSEdgeLabel::Back => write!(f, "Back"),
        }
    }
}

/// Order-insensitive pair of vertices, used as an edge key in maps and sets.
///
/// `UnorderedPair::new(a, b) == UnorderedPair::new(b, a)` and both hash the
/// same, so undirected edges can be looked up without worrying about the
/// direction they were stored in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct UnorderedPair(NodeIndex, NodeIndex);

impl UnorderedPair {
    pub fn new(a: NodeIndex, b: NodeIndex) -> Self {
        if a.index() <= b.index() {
            UnorderedPair(a, b)
        } else {
            UnorderedPair(b, a)
        }
    }

    pub fn first(&self) -> NodeIndex {
        self.0
    }

    pub fn second(&self) -> NodeIndex {
        self.1
    }

    /// Given one endpoint, returns the other one.
    pub fn other(&self, v: NodeIndex) -> NodeIndex {
        if self.0 == v { self.1 } else { self.0 }
    }

    pub fn contains(&self, v: NodeIndex) -> bool {
        self.0 == v || self.1 == v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unordered_pair_symmetry() {
        let a = NodeIndex::new(3);
        let b = NodeIndex::new(7);
        assert_eq!(UnorderedPair::new(a, b), UnorderedPair::new(b, a));
        assert_eq!(UnorderedPair::new(a, b).other(a), b);
        assert_eq!(UnorderedPair::new(a, b).other(b), a);
        assert!(UnorderedPair::new(a, b).contains(a));
        assert!(!UnorderedPair::new(a, b).contains(NodeIndex::new(0)));
    }
}
