use hashbrown::{HashMap, HashSet};
use petgraph::graph::NodeIndex;

/// Kind of a constraint tree node.
///
/// A constraint tree is rooted at a vertex `V` of the original graph and
/// restricts the cyclic order of `V`'s neighbours in a planar embedding:
///
/// * `Group`: children can be permuted freely,
/// * `Oriented`: children appear in the listed order, clockwise,
/// * `Mirror`: children appear in the listed order or its reverse,
/// * `Vertex(w)`: leaf, refers to the neighbour `w` of `V`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ConstraintKind {
    Group,
    Oriented,
    Mirror,
    Vertex(NodeIndex),
}

/// One node of a constraint tree. Nodes live in the tree's arena and refer to
/// each other by index.
#[derive(Clone, Debug)]
pub struct ConstraintNode {
    pub kind: ConstraintKind,
    pub children: Vec<usize>,
    pub parent: Option<usize>,
}

/// Arena-allocated constraint tree. The leaf set must equal the neighbour set
/// of the constrained vertex; `embed_ec` validates this at its boundary.
#[derive(Clone, Debug)]
pub struct ConstraintTree {
    nodes: Vec<ConstraintNode>,
    root: usize,
}

/// Map from constrained vertices to their constraint trees. A vertex missing
/// from the map is fully unconstrained.
pub type ConstraintMap = HashMap<NodeIndex, ConstraintTree>;

impl ConstraintTree {
    /// A single-leaf tree.
    pub fn vertex(w: NodeIndex) -> Self {
        ConstraintTree {
            nodes: vec![ConstraintNode {
                kind: ConstraintKind::Vertex(w),
                children: vec![],
                parent: None,
            }],
            root: 0,
        }
    }

    pub fn group(children: Vec<ConstraintTree>) -> Self {
        Self::internal(ConstraintKind::Group, children)
    }

    pub fn oriented(children: Vec<ConstraintTree>) -> Self {
        Self::internal(ConstraintKind::Oriented, children)
    }

    pub fn mirror(children: Vec<ConstraintTree>) -> Self {
        Self::internal(ConstraintKind::Mirror, children)
    }

    fn internal(kind: ConstraintKind, children: Vec<ConstraintTree>) -> Self {
        let mut nodes = vec![ConstraintNode {
            kind,
            children: vec![],
            parent: None,
        }];
        for child in children {
            let child_root = Self::graft(&mut nodes, &child, child.root);
            nodes[child_root].parent = Some(0);
            nodes[0].children.push(child_root);
        }
        ConstraintTree { nodes, root: 0 }
    }

    fn graft(nodes: &mut Vec<ConstraintNode>, src: &ConstraintTree, n: usize) -> usize {
        let id = nodes.len();
        nodes.push(ConstraintNode {
            kind: src.nodes[n].kind.clone(),
            children: vec![],
            parent: None,
        });
        for &c in &src.nodes[n].children {
            let cid = Self::graft(nodes, src, c);
            nodes[cid].parent = Some(id);
            nodes[id].children.push(cid);
        }
        id
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn kind(&self, n: usize) -> &ConstraintKind {
        &self.nodes[n].kind
    }

    pub fn children(&self, n: usize) -> &[usize] {
        &self.nodes[n].children
    }

    pub fn parent(&self, n: usize) -> Option<usize> {
        self.nodes[n].parent
    }

    pub fn is_leaf(&self, n: usize) -> bool {
        matches!(self.nodes[n].kind, ConstraintKind::Vertex(_))
    }

    pub fn leaf_vertex(&self, n: usize) -> Option<NodeIndex> {
        match self.nodes[n].kind {
            ConstraintKind::Vertex(w) => Some(w),
            _ => None,
        }
    }

    /// Skips through unary chains: a node with exactly one child stands for
    /// that child, transitively.
    pub fn skip_unary(&self, mut n: usize) -> usize {
        while !self.is_leaf(n) && self.nodes[n].children.len() == 1 {
            n = self.nodes[n].children[0];
        }
        n
    }

    /// Simplified child sequence of `n`: unary chains are skipped and an
    /// `Oriented` child directly under an `Oriented` parent is flattened into
    /// its own children. Deterministic for equal inputs.
    pub fn consolidated_children(&self, n: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for &c in &self.nodes[n].children {
            let c = self.skip_unary(c);
            if self.nodes[n].kind == ConstraintKind::Oriented
                && self.nodes[c].kind == ConstraintKind::Oriented
            {
                out.extend(self.consolidated_children(c));
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Leaf vertices of the subtree rooted at `n`, in subtree order.
    pub fn leaves(&self, n: usize) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        self.collect_leaves(n, &mut out);
        out
    }

    fn collect_leaves(&self, n: usize, out: &mut Vec<NodeIndex>) {
        match self.nodes[n].kind {
            ConstraintKind::Vertex(w) => out.push(w),
            _ => {
                for &c in &self.nodes[n].children {
                    self.collect_leaves(c, out);
                }
            }
        }
    }

    /// Number of leaves below `n`.
    pub fn leaf_count(&self, n: usize) -> usize {
        match self.nodes[n].kind {
            ConstraintKind::Vertex(_) => 1,
            _ => self.nodes[n].children.iter().map(|&c| self.leaf_count(c)).sum(),
        }
    }

    /// Maps each leaf vertex to its leaf node id.
    pub fn leaf_nodes(&self) -> HashMap<NodeIndex, usize> {
        let mut out = HashMap::new();
        for (id, node) in self.nodes.iter().enumerate() {
            if let ConstraintKind::Vertex(w) = node.kind {
                out.insert(w, id);
            }
        }
        out
    }

    /// Copy of the tree where each leaf with a vertex in `replacements` is
    /// rewritten to the replacement vertex. Leaves outside the map are pruned,
    /// ancestors left without children are pruned, and `None` is returned if
    /// nothing remains.
    pub fn replace_vertices(
        &self,
        replacements: &HashMap<NodeIndex, NodeIndex>,
    ) -> Option<ConstraintTree> {
        let mut nodes = Vec::new();
        let root = self.copy_filtered(self.root, replacements, &mut nodes)?;
        Some(ConstraintTree { nodes, root })
    }

    fn copy_filtered(
        &self,
        n: usize,
        replacements: &HashMap<NodeIndex, NodeIndex>,
        out: &mut Vec<ConstraintNode>,
    ) -> Option<usize> {
        match self.nodes[n].kind {
            ConstraintKind::Vertex(w) => {
                let &r = replacements.get(&w)?;
                let id = out.len();
                out.push(ConstraintNode {
                    kind: ConstraintKind::Vertex(r),
                    children: vec![],
                    parent: None,
                });
                Some(id)
            }
            ref kind => {
                let kind = kind.clone();
                let mut kids = Vec::new();
                for &c in &self.nodes[n].children {
                    if let Some(cid) = self.copy_filtered(c, replacements, out) {
                        kids.push(cid);
                    }
                }
                if kids.is_empty() {
                    return None;
                }
                let id = out.len();
                out.push(ConstraintNode {
                    kind,
                    children: kids.clone(),
                    parent: None,
                });
                for cid in kids {
                    out[cid].parent = Some(id);
                }
                Some(id)
            }
        }
    }

    /// Rewrites the single leaf referring to `old` so it refers to `new`
    /// instead. Used by the crossings embedder when an edge gets subdivided or
    /// crossed.
    pub fn replace_leaf(&mut self, old: NodeIndex, new: NodeIndex) {
        for node in &mut self.nodes {
            if node.kind == ConstraintKind::Vertex(old) {
                node.kind = ConstraintKind::Vertex(new);
                return;
            }
        }
    }

    /// Equivalent tree with every unary chain collapsed to its lowest
    /// branching descendant, bounding tree height by the number of leaves.
    pub fn remove_non_branching(&self) -> ConstraintTree {
        let mut nodes = Vec::new();
        let root = self.copy_branching(self.skip_unary(self.root), &mut nodes);
        ConstraintTree { nodes, root }
    }

    fn copy_branching(&self, n: usize, out: &mut Vec<ConstraintNode>) -> usize {
        let n = self.skip_unary(n);
        match self.nodes[n].kind {
            ConstraintKind::Vertex(w) => {
                let id = out.len();
                out.push(ConstraintNode {
                    kind: ConstraintKind::Vertex(w),
                    children: vec![],
                    parent: None,
                });
                id
            }
            ref kind => {
                let kind = kind.clone();
                let kids: Vec<usize> = self.nodes[n]
                    .children
                    .iter()
                    .map(|&c| self.copy_branching(c, out))
                    .collect();
                let id = out.len();
                out.push(ConstraintNode {
                    kind,
                    children: kids.clone(),
                    parent: None,
                });
                for cid in kids {
                    out[cid].parent = Some(id);
                }
                id
            }
        }
    }

    /// Decides whether `cyclic` (read clockwise) is a valid linearisation of
    /// the tree: every subtree's leaves form a contiguous cyclic arc, with
    /// `Oriented` children chained in listed order, `Mirror` children chained
    /// in listed or reversed order, and `Group` children in any order.
    pub fn order_satisfies(&self, cyclic: &[NodeIndex]) -> bool {
        let leaves = self.leaves(self.root);
        if leaves.len() != cyclic.len() {
            return false;
        }
        let set: HashSet<NodeIndex> = leaves.iter().copied().collect();
        if set.len() != leaves.len() {
            return false;
        }
        let mut pos = HashMap::new();
        for (i, &w) in cyclic.iter().enumerate() {
            if !set.contains(&w) || pos.insert(w, i).is_some() {
                return false;
            }
        }
        self.arc_of(self.root, &pos, cyclic.len()).is_some()
    }

    /// Returns the cyclic arc `(start, len)` occupied by the subtree's leaves,
    /// or `None` if the subtree is not realised contiguously and in an
    /// admissible order.
    fn arc_of(
        &self,
        n: usize,
        pos: &HashMap<NodeIndex, usize>,
        m: usize,
    ) -> Option<(usize, usize)> {
        match self.nodes[n].kind {
            ConstraintKind::Vertex(w) => Some((*pos.get(&w)?, 1)),
            ConstraintKind::Group => {
                let mut arcs = Vec::new();
                for &c in &self.nodes[n].children {
                    arcs.push(self.arc_of(c, pos, m)?);
                }
                radsort::sort_by_key(&mut arcs, |&(start, _)| start);
                let total: usize = arcs.iter().map(|&(_, len)| len).sum();
                // Contiguity is checked by chaining the arcs in start order;
                // a full circle is trivially contiguous.
                if total == m {
                    return Some((arcs[0].0, m));
                }
                for w in 0..arcs.len() {
                    if Self::chains(&arcs, w, m) {
                        return Some((arcs[w].0, total));
                    }
                }
                None
            }
            ConstraintKind::Oriented | ConstraintKind::Mirror => {
                let mut arcs = Vec::new();
                for &c in &self.nodes[n].children {
                    arcs.push(self.arc_of(c, pos, m)?);
                }
                let total: usize = arcs.iter().map(|&(_, len)| len).sum();
                if Self::chains(&arcs, 0, m) {
                    return Some((arcs[0].0, total));
                }
                if self.nodes[n].kind == ConstraintKind::Mirror {
                    let mut rev = arcs.clone();
                    rev.reverse();
                    if Self::chains(&rev, 0, m) {
                        return Some((rev[0].0, total));
                    }
                }
                None
            }
        }
    }

    /// Checks that the arcs, read from index `from` cyclically, tile one
    /// contiguous arc: each arc starts where the previous one ended.
    fn chains(arcs: &[(usize, usize)], from: usize, m: usize) -> bool {
        let k = arcs.len();
        let mut expected = None;
        for i in 0..k {
            let (start, len) = arcs[(from + i) % k];
            if let Some(e) = expected {
                if start != e {
                    return false;
                }
            }
            expected = Some((start + len) % m);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn test_consolidation_skips_unary_and_flattens_oriented() {
        // oriented( group( vertex(1) ), oriented( vertex(2), vertex(3) ) )
        let tree = ConstraintTree::oriented(vec![
            ConstraintTree::group(vec![ConstraintTree::vertex(v(1))]),
            ConstraintTree::oriented(vec![
                ConstraintTree::vertex(v(2)),
                ConstraintTree::vertex(v(3)),
            ]),
        ]);
        let kids = tree.consolidated_children(tree.root());
        assert_eq!(kids.len(), 3);
        assert_eq!(tree.leaf_vertex(kids[0]), Some(v(1)));
        assert_eq!(tree.leaf_vertex(kids[1]), Some(v(2)));
        assert_eq!(tree.leaf_vertex(kids[2]), Some(v(3)));
    }

    #[test]
    fn test_leaves_in_subtree_order() {
        let tree = ConstraintTree::mirror(vec![
            ConstraintTree::vertex(v(4)),
            ConstraintTree::group(vec![
                ConstraintTree::vertex(v(2)),
                ConstraintTree::vertex(v(9)),
            ]),
        ]);
        assert_eq!(tree.leaves(tree.root()), vec![v(4), v(2), v(9)]);
        assert_eq!(tree.leaf_count(tree.root()), 3);

        // leaf nodes map back to their vertices, parents chain to the root
        let leaf_nodes = tree.leaf_nodes();
        for (&w, &id) in &leaf_nodes {
            assert_eq!(tree.leaf_vertex(id), Some(w));
            let mut n = id;
            while let Some(p) = tree.parent(n) {
                n = p;
            }
            assert_eq!(n, tree.root());
        }
    }

    #[test]
    fn test_replace_vertices_prunes_and_rewrites() {
        let tree = ConstraintTree::oriented(vec![
            ConstraintTree::vertex(v(1)),
            ConstraintTree::group(vec![
                ConstraintTree::vertex(v(2)),
                ConstraintTree::vertex(v(3)),
            ]),
        ]);
        let mut map = HashMap::new();
        map.insert(v(1), v(10));
        map.insert(v(3), v(3));
        let replaced = tree.replace_vertices(&map).unwrap();
        assert_eq!(replaced.leaves(replaced.root()), vec![v(10), v(3)]);

        let empty = tree.replace_vertices(&HashMap::new());
        assert!(empty.is_none());
    }

    #[test]
    fn test_remove_non_branching() {
        let tree = ConstraintTree::group(vec![ConstraintTree::mirror(vec![
            ConstraintTree::oriented(vec![
                ConstraintTree::vertex(v(1)),
                ConstraintTree::vertex(v(2)),
            ]),
        ])]);
        let collapsed = tree.remove_non_branching();
        assert_eq!(collapsed.kind(collapsed.root()), &ConstraintKind::Oriented);
        assert_eq!(collapsed.leaves(collapsed.root()), vec![v(1), v(2)]);
    }

    #[test]
    fn test_order_satisfies_oriented() {
        let tree = ConstraintTree::oriented(vec![
            ConstraintTree::vertex(v(1)),
            ConstraintTree::vertex(v(2)),
            ConstraintTree::vertex(v(3)),
        ]);
        assert!(tree.order_satisfies(&[v(1), v(2), v(3)]));
        // cyclic rotations are the same cyclic order
        assert!(tree.order_satisfies(&[v(2), v(3), v(1)]));
        // the reversal is not
        assert!(!tree.order_satisfies(&[v(3), v(2), v(1)]));
    }

    #[test]
    fn test_order_satisfies_mirror() {
        let tree = ConstraintTree::mirror(vec![
            ConstraintTree::vertex(v(1)),
            ConstraintTree::vertex(v(2)),
            ConstraintTree::vertex(v(3)),
        ]);
        assert!(tree.order_satisfies(&[v(1), v(2), v(3)]));
        assert!(tree.order_satisfies(&[v(3), v(2), v(1)]));
        assert!(tree.order_satisfies(&[v(2), v(1), v(3)])); // rotation of the reversal
    }

    #[test]
    fn test_order_satisfies_group_contiguity() {
        let tree = ConstraintTree::oriented(vec![
            ConstraintTree::group(vec![
                ConstraintTree::vertex(v(1)),
                ConstraintTree::vertex(v(2)),
            ]),
            ConstraintTree::group(vec![
                ConstraintTree::vertex(v(3)),
                ConstraintTree::vertex(v(4)),
            ]),
        ]);
        assert!(tree.order_satisfies(&[v(2), v(1), v(3), v(4)]));
        assert!(tree.order_satisfies(&[v(1), v(2), v(4), v(3)]));
        // groups interleaved
        assert!(!tree.order_satisfies(&[v(1), v(3), v(2), v(4)]));
    }

    #[test]
    fn test_order_satisfies_rejects_wrong_leaves() {
        let tree = ConstraintTree::group(vec![
            ConstraintTree::vertex(v(1)),
            ConstraintTree::vertex(v(2)),
        ]);
        assert!(!tree.order_satisfies(&[v(1)]));
        assert!(!tree.order_satisfies(&[v(1), v(5)]));
    }

    #[test]
    fn test_replace_leaf_in_place() {
        let mut tree = ConstraintTree::mirror(vec![
            ConstraintTree::vertex(v(1)),
            ConstraintTree::vertex(v(2)),
        ]);
        tree.replace_leaf(v(2), v(7));
        assert_eq!(tree.leaves(tree.root()), vec![v(1), v(7)]);
    }
}
