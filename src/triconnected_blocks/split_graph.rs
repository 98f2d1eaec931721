//! Working graph of the split-component search: a stable edge table with
//! in-place orientation and kill marks, plus the preparatory passes of the
//! Hopcroft-Tarjan algorithm (bond extraction, palm orientation, acceptable
//! adjacency order, path numbering).
//!
//! Reference:
//! [Hopcroft, J., & Tarjan, R. (1973). Dividing a Graph into Triconnected Components.](https://epubs.siam.org/doi/10.1137/0202012)

use std::collections::VecDeque;

use hashbrown::HashMap;
use petgraph::visit::EdgeRef;

use crate::{
    triconnected_blocks::outside_structures::{Component, ComponentType, EdgeType},
    UnGraph,
};

pub(crate) const UNSET: usize = usize::MAX;

/// One edge of the working graph. Killed edges keep their slot so edge ids
/// stay stable across splits.
#[derive(Debug, Clone)]
pub(crate) struct SkelEdge {
    pub from: usize,
    pub to: usize,
    pub kind: Option<EdgeType>,
}

#[derive(Debug)]
pub(crate) struct SplitGraph {
    pub n: usize,
    pub edges: Vec<SkelEdge>,
    /// Edge ids per vertex; outgoing only once the graph is rooted.
    pub adj: Vec<Vec<usize>>,

    pub num: Vec<usize>,
    pub numrev: Vec<usize>,
    pub low1: Vec<usize>,
    pub low2: Vec<usize>,
    pub sub: Vec<usize>,
    pub par: Vec<Option<usize>>,
    pub par_edge: Vec<Option<usize>>,
    pub deg: Vec<usize>,

    /// Back edges returning to each vertex, consumed front-first.
    pub high: Vec<VecDeque<usize>>,
    pub starts_path: Vec<bool>,
}

impl SplitGraph {
    pub fn from_block(graph: &UnGraph) -> Self {
        let n = graph.node_count();
        let mut g = SplitGraph {
            n,
            edges: Vec::with_capacity(graph.edge_count()),
            adj: vec![Vec::new(); n],
            num: vec![UNSET; n],
            numrev: vec![0; n],
            low1: vec![0; n],
            low2: vec![0; n],
            sub: vec![0; n],
            par: vec![None; n],
            par_edge: vec![None; n],
            deg: vec![0; n],
            high: vec![VecDeque::new(); n],
            starts_path: Vec::new(),
        };
        for e in graph.edge_references() {
            let (u, v) = (e.source().index(), e.target().index());
            g.new_edge(u.min(v), u.max(v), None);
        }
        g
    }

    pub fn new_edge(&mut self, from: usize, to: usize, kind: Option<EdgeType>) -> usize {
        let eid = self.edges.len();
        self.edges.push(SkelEdge { from, to, kind });
        self.adj[from].push(eid);
        self.starts_path.push(false);
        self.deg[from] += 1;
        self.deg[to] += 1;
        eid
    }

    pub fn ends(&self, eid: usize) -> (usize, usize) {
        (self.edges[eid].from, self.edges[eid].to)
    }

    pub fn kind(&self, eid: usize) -> Option<EdgeType> {
        self.edges[eid].kind
    }

    pub fn other(&self, eid: usize, v: usize) -> usize {
        let e = &self.edges[eid];
        if e.from == v { e.to } else { e.from }
    }

    pub fn remove_edge(&mut self, eid: usize) {
        debug_assert!(self.edges[eid].kind != Some(EdgeType::Killed));
        self.edges[eid].kind = Some(EdgeType::Killed);
        let (s, t) = self.ends(eid);
        self.deg[s] -= 1;
        self.deg[t] -= 1;
    }

    pub fn make_tedge(&mut self, eid: usize) {
        debug_assert!(self.edges[eid].kind.is_none());
        self.edges[eid].kind = Some(EdgeType::Tree);
        let (s, t) = self.ends(eid);
        self.par_edge[t] = Some(eid);
        self.par[t] = Some(s);
    }

    pub fn make_bedge(&mut self, eid: usize) {
        debug_assert!(self.edges[eid].kind.is_none());
        self.edges[eid].kind = Some(EdgeType::Back);
        let (s, t) = self.ends(eid);
        if self.get_high(s) < self.num[s] {
            self.high[t].push_back(eid);
        }
    }

    /// Target of the first non-killed edge out of `u`, or `None` at the root.
    pub fn first_alive(&self, root: usize, u: usize) -> Option<usize> {
        if u == root {
            return None;
        }
        self.adj[u]
            .iter()
            .find(|&&eid| self.edges[eid].kind != Some(EdgeType::Killed))
            .map(|&eid| self.edges[eid].to)
    }

    /// Highest return point of a still-alive back edge into `u`.
    pub fn get_high(&mut self, u: usize) -> usize {
        while let Some(&eid) = self.high[u].front() {
            if self.edges[eid].kind == Some(EdgeType::Killed) {
                self.high[u].pop_front();
            } else {
                return self.num[self.other(eid, u)];
            }
        }
        0
    }

    /// Groups parallel edges into bonds: each bundle retires its originals
    /// into a P component glued by one fresh virtual edge. Self-loops are
    /// dropped from the adjacency. Rebuilds the adjacency with both
    /// directions, since the graph is not rooted yet.
    pub fn extract_bonds(&mut self, components: &mut Vec<Component>) {
        let m = self.edges.len();
        let mut bundles: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for eid in 0..m {
            let (u, v) = self.ends(eid);
            if u != v {
                bundles.entry((u.min(v), u.max(v))).or_default().push(eid);
            }
        }

        self.adj = vec![Vec::new(); self.n];
        for eid in 0..m {
            let (u, v) = self.ends(eid);
            if u == v {
                continue;
            }
            // the first edge of a bundle settles the whole bundle
            let Some(bundle) = bundles.remove(&(u.min(v), u.max(v))) else {
                continue;
            };
            if bundle.len() == 1 {
                self.adj[u].push(eid);
                self.adj[v].push(eid);
            } else {
                let evirt = self.new_edge(u.min(v), u.max(v), None);
                self.adj[u.max(v)].push(evirt);

                let mut bond = Component::new(Some(ComponentType::P));
                bond.push_edge(evirt, self, true);
                for &dup in &bundle {
                    bond.push_edge(dup, self, false);
                }
                bond.commit(components);
            }
        }
    }

    /// Rooted depth-first orientation with an explicit stack: classifies
    /// every edge as tree or back, points it along the traversal, and
    /// computes `num` (preorder), `low1`/`low2` and the subtree sizes.
    pub fn palm_orientation(&mut self, root: usize) {
        self.num[root] = 0;
        self.low1[root] = 0;
        self.low2[root] = 0;
        self.sub[root] = 1;
        let mut clock = 1;

        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some(&(v, cursor)) = stack.last() {
            if cursor < self.adj[v].len() {
                stack.last_mut().expect("just observed").1 += 1;
                let eid = self.adj[v][cursor];
                if self.edges[eid].kind.is_some() {
                    continue; // reached from the other endpoint already
                }
                let w = self.other(eid, v);
                self.point(eid, v);
                if self.num[w] == UNSET {
                    self.edges[eid].kind = Some(EdgeType::Tree);
                    self.par[w] = Some(v);
                    self.par_edge[w] = Some(eid);
                    self.num[w] = clock;
                    clock += 1;
                    self.low1[w] = self.num[w];
                    self.low2[w] = self.num[w];
                    self.sub[w] = 1;
                    stack.push((w, 0));
                } else {
                    self.edges[eid].kind = Some(EdgeType::Back);
                    if self.num[w] < self.low1[v] {
                        self.low2[v] = self.low1[v];
                        self.low1[v] = self.num[w];
                    } else if self.num[w] > self.low1[v] {
                        self.low2[v] = self.low2[v].min(self.num[w]);
                    }
                }
            } else {
                stack.pop();
                if let Some(&(u, _)) = stack.last() {
                    // fold the finished child into its parent
                    self.sub[u] += self.sub[v];
                    if self.low1[v] < self.low1[u] {
                        self.low2[u] = self.low1[u].min(self.low2[v]);
                        self.low1[u] = self.low1[v];
                    } else if self.low1[v] == self.low1[u] {
                        self.low2[u] = self.low2[u].min(self.low2[v]);
                    } else {
                        self.low2[u] = self.low2[u].min(self.low1[v]);
                    }
                }
            }
        }
    }

    fn point(&mut self, eid: usize, from: usize) {
        let e = &mut self.edges[eid];
        if e.from != from {
            std::mem::swap(&mut e.from, &mut e.to);
        }
    }

    /// Rebuilds every adjacency list with the live outgoing edges in the
    /// acceptable order: `3 * low1(to)` for a tree edge whose subtree has a
    /// single escape, `3 * low1(to) + 2` with more than one, and
    /// `3 * num(to) + 1` for a back edge.
    pub fn sort_acceptable(&mut self) {
        let mut rebuilt: Vec<Vec<usize>> = vec![Vec::new(); self.n];
        for eid in 0..self.edges.len() {
            if self.edges[eid].kind == Some(EdgeType::Killed) {
                continue;
            }
            rebuilt[self.edges[eid].from].push(eid);
        }
        for list in &mut rebuilt {
            radsort::sort_by_key(list, |&eid| self.acceptable_rank(eid));
        }
        self.adj = rebuilt;
    }

    fn acceptable_rank(&self, eid: usize) -> usize {
        let e = &self.edges[eid];
        if e.kind == Some(EdgeType::Tree) {
            if self.low2[e.to] < self.num[e.from] {
                3 * self.low1[e.to]
            } else {
                3 * self.low1[e.to] + 2
            }
        } else {
            3 * self.num[e.to] + 1
        }
    }

    /// Second numbering pass: renumbers the vertices in reverse post-order
    /// of the acceptable traversal, rewrites `low1`/`low2` into the new
    /// numbering, collects the `high` lists of back-edge return points, and
    /// marks every edge that opens a new path.
    ///
    /// The reverse post-order gives the interval property the component
    /// search relies on: the subtree of `v` occupies
    /// `[num(v), num(v) + sub(v))`.
    pub fn pathfind(&mut self, root: usize) {
        let mut newnum = vec![0; self.n];
        let mut counter = self.n;

        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some(&(v, cursor)) = stack.last() {
            if cursor < self.adj[v].len() {
                stack.last_mut().expect("just observed").1 += 1;
                let eid = self.adj[v][cursor];
                // the first edge out of a non-root vertex continues its path
                self.starts_path[eid] = v == root || cursor != 0;
                if self.edges[eid].kind == Some(EdgeType::Tree) {
                    stack.push((self.edges[eid].to, 0));
                } else {
                    let to = self.edges[eid].to;
                    self.high[to].push_back(eid);
                }
            } else {
                stack.pop();
                counter -= 1;
                newnum[v] = counter;
            }
        }

        let mut translate = vec![0; self.n];
        for v in 0..self.n {
            translate[self.num[v]] = newnum[v];
        }
        for v in 0..self.n {
            self.low1[v] = translate[self.low1[v]];
            self.low2[v] = translate[self.low2[v]];
            self.num[v] = newnum[v];
            self.numrev[self.num[v]] = v;
        }
    }
}
