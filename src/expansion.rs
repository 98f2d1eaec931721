use hashbrown::{HashMap, HashSet};
use petgraph::graph::NodeIndex;

use crate::{
    constraint::{ConstraintKind, ConstraintMap, ConstraintTree},
    types::UnorderedPair,
    EdgeLabel, UnGraph,
};

/// Per-vertex bookkeeping of one expansion gadget, used by the contractor to
/// walk the gadget in clockwise order.
#[derive(Debug, Clone)]
pub struct VertexGadget {
    /// The effective constraint tree (synthesised GROUP-of-leaves for an
    /// unconstrained vertex).
    pub tree: ConstraintTree,
    /// Effective root node, unary chains skipped.
    pub root: usize,
    /// Hub of each expanded GROUP / ORIENTED / MIRROR node.
    pub hub: HashMap<usize, NodeIndex>,
    /// Reserved parent spoke of each non-root wheel.
    pub parent_spoke: HashMap<usize, NodeIndex>,
    /// Rim spoke starting the clockwise walk of a root wheel.
    pub start: HashMap<usize, NodeIndex>,
    /// Rim spoke -> the child constraint node it carries.
    pub spoke_child: HashMap<NodeIndex, usize>,
    /// Child attachment vertex -> child constraint node, for GROUP hubs.
    pub attach_child: HashMap<NodeIndex, usize>,
}

/// The expansion of a constrained graph: an auxiliary graph whose planar
/// embeddings, with every O-hub correctly oriented, are exactly the
/// constraint-satisfying planar embeddings of the original.
#[derive(Debug)]
pub struct Expansion {
    /// The expansion graph.
    pub graph: UnGraph,
    /// `(v, w) -> E`: the expansion vertex of `v`'s gadget that carries the
    /// edge towards the neighbour `w`.
    pub end_to_endpoint: HashMap<(NodeIndex, NodeIndex), NodeIndex>,
    /// Expansion edge -> the original edge it realises.
    pub expansion_edge_to_edge: HashMap<UnorderedPair, UnorderedPair>,
    /// For each O-hub, the spoke that must come first.
    pub o_hub_firsts: HashMap<NodeIndex, NodeIndex>,
    /// For each O-hub, the spoke that must follow it clockwise.
    pub o_hub_seconds: HashMap<NodeIndex, NodeIndex>,
    /// All wheel hubs.
    pub hubs: HashSet<NodeIndex>,
    /// Expansion vertex -> the original vertex whose gadget owns it.
    pub vertex_owner: HashMap<NodeIndex, NodeIndex>,
    /// Per original vertex, its gadget bookkeeping.
    pub gadgets: HashMap<NodeIndex, VertexGadget>,
}

impl Expansion {
    /// Builds the expansion of the given vertices of `graph` under
    /// `constraints`. Vertices outside `component` are ignored.
    pub fn build(graph: &UnGraph, component: &[NodeIndex], constraints: &ConstraintMap) -> Self {
        let mut exp = Expansion {
            graph: UnGraph::new_undirected(),
            end_to_endpoint: HashMap::new(),
            expansion_edge_to_edge: HashMap::new(),
            o_hub_firsts: HashMap::new(),
            o_hub_seconds: HashMap::new(),
            hubs: HashSet::new(),
            vertex_owner: HashMap::new(),
            gadgets: HashMap::new(),
        };
        let in_component: HashSet<NodeIndex> = component.iter().copied().collect();

        for &v in component {
            let tree = match constraints.get(&v) {
                Some(t) => t.clone(),
                None => synthesize_group(graph, v),
            };
            exp.expand_vertex(v, tree);
        }

        // one expansion edge per original edge between the recorded endpoints
        for &v in component {
            for w in graph.neighbors(v) {
                if v.index() > w.index() || !in_component.contains(&w) {
                    continue;
                }
                let a = exp.end_to_endpoint[&(v, w)];
                let b = exp.end_to_endpoint[&(w, v)];
                if exp.graph.find_edge(a, b).is_none() {
                    exp.graph.add_edge(a, b, EdgeLabel::Real);
                }
                exp.expansion_edge_to_edge
                    .insert(UnorderedPair::new(a, b), UnorderedPair::new(v, w));
            }
        }

        exp
    }

    fn new_vertex(&mut self, owner: NodeIndex) -> NodeIndex {
        let id = self.graph.node_count() as u32;
        let x = self.graph.add_node(id);
        self.vertex_owner.insert(x, owner);
        x
    }

    fn expand_vertex(&mut self, v: NodeIndex, tree: ConstraintTree) {
        let root = tree.skip_unary(tree.root());
        let mut gadget = VertexGadget {
            tree: tree.clone(),
            root,
            hub: HashMap::new(),
            parent_spoke: HashMap::new(),
            start: HashMap::new(),
            spoke_child: HashMap::new(),
            attach_child: HashMap::new(),
        };

        if tree.leaf_count(root) == 0 {
            // isolated vertex: the gadget is a lone expansion vertex
            self.new_vertex(v);
            self.gadgets.insert(v, gadget);
            return;
        }

        if let Some(w) = tree.leaf_vertex(root) {
            // a single neighbour needs no structure
            let e = self.new_vertex(v);
            self.end_to_endpoint.insert((v, w), e);
            self.gadgets.insert(v, gadget);
            return;
        }

        self.expand_node(v, &tree, root, true, &mut gadget);
        self.gadgets.insert(v, gadget);
    }

    /// Expands the subtree rooted at `n` and returns the attachment vertex by
    /// which the parent connects to it.
    fn expand_node(
        &mut self,
        v: NodeIndex,
        tree: &ConstraintTree,
        n: usize,
        is_root: bool,
        gadget: &mut VertexGadget,
    ) -> NodeIndex {
        match tree.kind(n) {
            ConstraintKind::Group => {
                let hub = self.new_vertex(v);
                gadget.hub.insert(n, hub);
                for c in tree.consolidated_children(n) {
                    if let Some(w) = tree.leaf_vertex(c) {
                        // leaf children are merged into the hub itself
                        self.end_to_endpoint.insert((v, w), hub);
                    } else {
                        let attachment = self.expand_node(v, tree, c, false, gadget);
                        self.graph.add_edge(hub, attachment, EdgeLabel::Real);
                        gadget.attach_child.insert(attachment, c);
                    }
                }
                hub
            }
            ConstraintKind::Oriented | ConstraintKind::Mirror => {
                let oriented = *tree.kind(n) == ConstraintKind::Oriented;
                let children = tree.consolidated_children(n);
                let k = children.len();
                let spoke_count = if is_root { 2 * k } else { 2 * k + 2 };

                let hub = self.new_vertex(v);
                self.hubs.insert(hub);
                gadget.hub.insert(n, hub);

                let rim: Vec<NodeIndex> = (0..spoke_count).map(|_| self.new_vertex(v)).collect();
                for i in 0..spoke_count {
                    self.graph.add_edge(hub, rim[i], EdgeLabel::Real);
                    self.graph
                        .add_edge(rim[i], rim[(i + 1) % spoke_count], EdgeLabel::Real);
                }

                // child spokes sit at even rim positions, buffers at odd ones
                for (i, &c) in children.iter().enumerate() {
                    let s = rim[2 * i];
                    gadget.spoke_child.insert(s, c);
                    if let Some(w) = tree.leaf_vertex(c) {
                        self.end_to_endpoint.insert((v, w), s);
                    } else {
                        let attachment = self.expand_node(v, tree, c, false, gadget);
                        self.graph.add_edge(s, attachment, EdgeLabel::Real);
                    }
                }

                if oriented {
                    // two clockwise-consecutive spokes pin the orientation
                    self.o_hub_firsts.insert(hub, rim[0]);
                    self.o_hub_seconds.insert(hub, rim[1]);
                }

                if is_root {
                    gadget.start.insert(n, rim[0]);
                } else {
                    gadget.parent_spoke.insert(n, rim[2 * k]);
                }

                if is_root { rim[0] } else { rim[2 * k] }
            }
            ConstraintKind::Vertex(_) => {
                unreachable!("leaf children are expanded by their parent")
            }
        }
    }
}

/// Flat GROUP-of-leaves tree for an unconstrained vertex.
fn synthesize_group(graph: &UnGraph, v: NodeIndex) -> ConstraintTree {
    let mut children: Vec<ConstraintTree> = Vec::new();
    let mut nbrs: Vec<NodeIndex> = graph.neighbors(v).collect();
    nbrs.reverse(); // petgraph iterates neighbours latest-first
    for w in nbrs {
        children.push(ConstraintTree::vertex(w));
    }
    if children.is_empty() {
        ConstraintTree::group(vec![])
    } else if children.len() == 1 {
        children.pop().unwrap()
    } else {
        ConstraintTree::group(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::NodeIndex;

    fn k4() -> UnGraph {
        let mut g = UnGraph::new_undirected();
        for i in 0..4 {
            g.add_node(i);
        }
        for &(u, v) in &[(0usize, 1usize), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)] {
            g.add_edge(NodeIndex::new(u), NodeIndex::new(v), EdgeLabel::Real);
        }
        g
    }

    #[test]
    fn test_unconstrained_expansion_is_isomorphic_to_input() {
        let g = k4();
        let component: Vec<NodeIndex> = g.node_indices().collect();
        let exp = Expansion::build(&g, &component, &ConstraintMap::new());
        assert_eq!(exp.graph.node_count(), 4);
        assert_eq!(exp.graph.edge_count(), 6);
        assert!(exp.hubs.is_empty());
    }

    #[test]
    fn test_oriented_root_builds_wheel() {
        let g = k4();
        let v1 = NodeIndex::new(0);
        let mut constraints = ConstraintMap::new();
        constraints.insert(
            v1,
            ConstraintTree::oriented(vec![
                ConstraintTree::vertex(NodeIndex::new(1)),
                ConstraintTree::vertex(NodeIndex::new(2)),
                ConstraintTree::vertex(NodeIndex::new(3)),
            ]),
        );
        let component: Vec<NodeIndex> = g.node_indices().collect();
        let exp = Expansion::build(&g, &component, &constraints);

        // wheel: hub + 6 rim spokes, plus three singleton gadgets
        assert_eq!(exp.graph.node_count(), 7 + 3);
        assert_eq!(exp.hubs.len(), 1);
        let hub = *exp.hubs.iter().next().unwrap();
        assert_eq!(exp.graph.neighbors(hub).count(), 6);
        assert!(exp.o_hub_firsts.contains_key(&hub));

        // every K4 edge is realised by exactly one expansion edge
        assert_eq!(exp.expansion_edge_to_edge.len(), 6);
        // rim cycle + spokes + 6 inter-gadget edges + 3 edges among singletons
        let gadget = &exp.gadgets[&v1];
        assert_eq!(gadget.spoke_child.len(), 3);
        assert!(gadget.parent_spoke.is_empty());
    }

    #[test]
    fn test_mirror_subtree_reserves_parent_spoke() {
        let mut g = UnGraph::new_undirected();
        for i in 0..6 {
            g.add_node(i);
        }
        let c = NodeIndex::new(0);
        for i in 1..6 {
            g.add_edge(c, NodeIndex::new(i), EdgeLabel::Real);
        }
        let mut constraints = ConstraintMap::new();
        constraints.insert(
            c,
            ConstraintTree::group(vec![
                ConstraintTree::vertex(NodeIndex::new(1)),
                ConstraintTree::mirror(vec![
                    ConstraintTree::vertex(NodeIndex::new(2)),
                    ConstraintTree::vertex(NodeIndex::new(3)),
                ]),
                ConstraintTree::oriented(vec![
                    ConstraintTree::vertex(NodeIndex::new(4)),
                    ConstraintTree::vertex(NodeIndex::new(5)),
                ]),
            ]),
        );
        let component: Vec<NodeIndex> = g.node_indices().collect();
        let exp = Expansion::build(&g, &component, &constraints);

        let gadget = &exp.gadgets[&c];
        // two non-root wheels with 2 children each: 2k + 2 = 6 spokes
        assert_eq!(gadget.parent_spoke.len(), 2);
        assert_eq!(exp.hubs.len(), 2);
        // only the oriented wheel records an O-hub
        assert_eq!(exp.o_hub_firsts.len(), 1);
        for hub in &exp.hubs {
            assert_eq!(exp.graph.neighbors(*hub).count(), 6);
        }
    }
}
