//! Left-right planarity test over an arc arena.
//!
//! Every undirected edge `e` is stored as the arc pair `2e` and `2e + 1`;
//! an arc's twin is `arc ^ 1`. The three passes follow the algorithm
//! description: a depth-first orientation computing lowpoints and nesting
//! depths, the conflict-pair test partitioning back arcs into left and
//! right of their fundamental cycles, and the rotation assembly inserting
//! each back arc next to the reference child it returned through.
//!
//! Reference:
//! [The Left-Right Planarity Test](https://acm.math.spbu.ru/~sk1/download/papers/planar//brandes2010-planarity.pdf)

use fixedbitset::FixedBitSet;

const NONE: usize = usize::MAX;

/// Contiguous run of back arcs on one side of a fundamental cycle. The high
/// end follows reference-arc chains while trimming, so it may be `NONE`
/// while the interval is still considered occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval {
    low: usize,
    high: usize,
}

impl Interval {
    fn empty() -> Self {
        Interval {
            low: NONE,
            high: NONE,
        }
    }

    fn of(arc: usize) -> Self {
        Interval {
            low: arc,
            high: arc,
        }
    }

    fn is_empty(&self) -> bool {
        self.low == NONE
    }
}

/// Two interval sides that must stay on opposite sides of a cycle.
#[derive(Debug, Clone, Copy)]
struct ConflictPair {
    left: Interval,
    right: Interval,
}

impl ConflictPair {
    fn of_right(arc: usize) -> Self {
        ConflictPair {
            left: Interval::empty(),
            right: Interval::of(arc),
        }
    }

    fn swap_sides(&mut self) {
        std::mem::swap(&mut self.left, &mut self.right);
    }
}

/// Scratch state of one planarity run.
pub(crate) struct LrPlanarity {
    n: usize,
    /// Per arc, the vertex it enters; the twin arc is `arc ^ 1`.
    dst: Vec<usize>,
    /// Per vertex, the arcs leaving it; reduced to the oriented arcs after
    /// the first pass.
    out: Vec<Vec<usize>>,
    /// Edges reached by the orientation pass.
    visited: FixedBitSet,
    /// Arcs chosen as the traversal direction of their edge.
    chosen: FixedBitSet,
    height: Vec<usize>,
    /// Per vertex, the arc its parent reached it through.
    parent_arc: Vec<usize>,
    lowpt: Vec<usize>,
    lowpt2: Vec<usize>,
    nesting: Vec<i64>,
    refarc: Vec<usize>,
    side: Vec<i8>,
    lowpt_arc: Vec<usize>,
    stack: Vec<ConflictPair>,
    /// Per arc, the conflict-stack height before the arc was processed.
    bottom: Vec<usize>,
}

impl LrPlanarity {
    /// Expects a simple edge list: no self-loops, no parallel edges.
    pub fn new(n: usize, edges: &[(usize, usize)]) -> Self {
        let m = edges.len();
        let mut dst = Vec::with_capacity(2 * m);
        let mut out = vec![Vec::new(); n];
        for (e, &(u, v)) in edges.iter().enumerate() {
            dst.push(v);
            dst.push(u);
            out[u].push(2 * e);
            out[v].push(2 * e + 1);
        }
        LrPlanarity {
            n,
            dst,
            out,
            visited: FixedBitSet::with_capacity(m),
            chosen: FixedBitSet::with_capacity(2 * m),
            height: vec![NONE; n],
            parent_arc: vec![NONE; n],
            lowpt: vec![NONE; 2 * m],
            lowpt2: vec![NONE; 2 * m],
            nesting: vec![0; 2 * m],
            refarc: vec![NONE; 2 * m],
            side: vec![1; 2 * m],
            lowpt_arc: vec![NONE; 2 * m],
            stack: Vec::new(),
            bottom: vec![0; 2 * m],
        }
    }

    fn src(&self, arc: usize) -> usize {
        self.dst[arc ^ 1]
    }

    /// Runs all three passes and returns the per-vertex neighbour rotation,
    /// or `None` when the graph is not planar.
    pub fn embed(mut self) -> Option<Vec<Vec<usize>>> {
        let mut roots = Vec::new();
        for v in 0..self.n {
            if self.height[v] == NONE {
                self.height[v] = 0;
                roots.push(v);
                self.orient(v);
            }
        }

        // keep the traversal direction of each edge, innermost cycles first
        for v in 0..self.n {
            let mut list = std::mem::take(&mut self.out[v]);
            list.retain(|&a| self.chosen.contains(a));
            radsort::sort_by_key(&mut list, |&a| self.nesting[a]);
            self.out[v] = list;
        }

        for &r in &roots {
            if !self.test(r) {
                return None;
            }
        }

        // fold the reference chains into definite sides, then re-sort by the
        // signed nesting depth
        for v in 0..self.n {
            let mut list = std::mem::take(&mut self.out[v]);
            for &a in &list {
                self.nesting[a] *= self.resolve_side(a) as i64;
            }
            radsort::sort_by_key(&mut list, |&a| self.nesting[a]);
            self.out[v] = list;
        }

        let mut rotation = vec![Vec::new(); self.n];
        let mut left_ref = vec![NONE; self.n];
        let mut right_ref = vec![NONE; self.n];
        for &r in &roots {
            self.attach(r, &mut rotation, &mut left_ref, &mut right_ref);
        }
        Some(rotation)
    }

    /// First pass: orients every edge away from the root and computes
    /// heights, lowpoints and nesting depths.
    fn orient(&mut self, v: usize) {
        let e = self.parent_arc[v];
        let arcs = self.out[v].clone();
        for a in arcs {
            if self.visited.contains(a >> 1) {
                continue;
            }
            self.visited.insert(a >> 1);
            self.chosen.insert(a);
            let w = self.dst[a];

            self.lowpt[a] = self.height[v];
            self.lowpt2[a] = self.height[v];
            if self.height[w] == NONE {
                // tree arc
                self.parent_arc[w] = a;
                self.height[w] = self.height[v] + 1;
                self.orient(w);
            } else {
                // back arc
                self.lowpt[a] = self.height[w];
            }

            self.nesting[a] = 2 * self.lowpt[a] as i64;
            if self.lowpt2[a] < self.height[v] {
                // chordal: both sides of the cycle are used
                self.nesting[a] += 1;
            }

            if e != NONE {
                if self.lowpt[a] < self.lowpt[e] {
                    self.lowpt2[e] = self.lowpt[e].min(self.lowpt2[a]);
                    self.lowpt[e] = self.lowpt[a];
                } else if self.lowpt[a] > self.lowpt[e] {
                    self.lowpt2[e] = self.lowpt2[e].min(self.lowpt[a]);
                } else {
                    self.lowpt2[e] = self.lowpt2[e].min(self.lowpt2[a]);
                }
            }
        }
    }

    /// Second pass: partitions the back arcs over the conflict-pair stack.
    /// Returns false when two arcs are forced onto the same side of a cycle
    /// from both directions, i.e. the graph is not planar.
    fn test(&mut self, v: usize) -> bool {
        let e = self.parent_arc[v];
        let arcs = self.out[v].clone();
        let first = arcs.first().copied();
        for a in arcs {
            self.bottom[a] = self.stack.len();
            let w = self.dst[a];
            if self.parent_arc[w] == a {
                if !self.test(w) {
                    return false;
                }
            } else {
                self.lowpt_arc[a] = a;
                self.stack.push(ConflictPair::of_right(a));
            }

            if self.lowpt[a] < self.height[v] {
                // the subtree of a returns below v
                if Some(a) == first {
                    self.lowpt_arc[e] = self.lowpt_arc[a];
                } else if !self.merge_constraints(a, e) {
                    return false;
                }
            }
        }

        if e != NONE {
            let u = self.src(e);
            self.prune_returns_to(u);
            if self.lowpt[e] < self.height[u] {
                // e is no bridge: its side will follow the higher of the two
                // remaining candidates
                let top = self.stack.last().expect("a return edge leaves a pair");
                let (hl, hr) = (top.left.high, top.right.high);
                self.refarc[e] = if hl != NONE && (hr == NONE || self.lowpt[hl] > self.lowpt[hr]) {
                    hl
                } else {
                    hr
                };
            }
        }
        true
    }

    /// Folds the conflict pairs created by the subtree of `a` into one and
    /// reconciles it with the constraints of the earlier siblings of `a`.
    fn merge_constraints(&mut self, a: usize, e: usize) -> bool {
        let mut p = ConflictPair {
            left: Interval::empty(),
            right: Interval::empty(),
        };

        // everything the subtree of a put on the stack must land on one side
        // of the fundamental cycle of a
        while self.stack.len() > self.bottom[a] {
            let mut q = self.stack.pop().expect("guarded by the loop condition");
            if !q.left.is_empty() {
                q.swap_sides();
            }
            if !q.left.is_empty() {
                return false;
            }
            if self.lowpt[q.right.low] > self.lowpt[e] {
                self.chain_under(&mut p.right, q.right);
            } else {
                // returns at or below the parent cycle: align it
                self.refarc[q.right.low] = self.lowpt_arc[e];
            }
        }

        // siblings whose return edges conflict with a move to the other side
        while self
            .stack
            .last()
            .map(|q| self.conflicting(q.left, a) || self.conflicting(q.right, a))
            .unwrap_or(false)
        {
            let mut q = self.stack.pop().expect("guarded by the loop condition");
            if self.conflicting(q.right, a) {
                q.swap_sides();
            }
            if self.conflicting(q.right, a) {
                return false;
            }
            self.chain_under(&mut p.right, q.right);
            self.chain_under(&mut p.left, q.left);
        }

        if !p.left.is_empty() || !p.right.is_empty() {
            self.stack.push(p);
        }
        true
    }

    fn conflicting(&self, i: Interval, b: usize) -> bool {
        !i.is_empty() && self.lowpt[i.high] > self.lowpt[b]
    }

    /// Chains the lower interval `q` under `p`, linking the reference of
    /// `p`'s low end to `q`'s high end.
    fn chain_under(&mut self, p: &mut Interval, q: Interval) {
        if q.is_empty() {
            return;
        }
        if p.is_empty() {
            *p = q;
        } else {
            self.refarc[p.low] = q.high;
            p.low = q.low;
        }
    }

    /// Drops the back arcs returning to `u`; they cannot conflict with
    /// anything processed later.
    fn prune_returns_to(&mut self, u: usize) {
        while self
            .stack
            .last()
            .map(|q| self.lowest(q) == self.height[u])
            .unwrap_or(false)
        {
            let q = self.stack.pop().expect("guarded by the loop condition");
            if !q.left.is_empty() {
                self.side[q.left.low] = -1;
            }
        }

        if let Some(mut p) = self.stack.pop() {
            self.trim_side(&mut p.left, u, p.right);
            self.trim_side(&mut p.right, u, p.left);
            if !p.left.is_empty() || !p.right.is_empty() {
                self.stack.push(p);
            }
        }
    }

    fn trim_side(&mut self, i: &mut Interval, u: usize, other: Interval) {
        if i.is_empty() {
            return;
        }
        while i.high != NONE && self.dst[i.high] == u {
            i.high = self.refarc[i.high];
        }
        if i.high == NONE {
            // the whole side returned to u
            if !other.is_empty() {
                self.refarc[i.low] = other.low;
            }
            self.side[i.low] = -1;
            *i = Interval::empty();
        }
    }

    fn lowest(&self, q: &ConflictPair) -> usize {
        match (q.left.is_empty(), q.right.is_empty()) {
            (false, false) => self.lowpt[q.left.low].min(self.lowpt[q.right.low]),
            (false, true) => self.lowpt[q.left.low],
            (true, false) => self.lowpt[q.right.low],
            (true, true) => NONE,
        }
    }

    /// Walks the reference chain of `a` to an arc with a settled side, then
    /// folds the signs back along the chain.
    fn resolve_side(&mut self, a: usize) -> i8 {
        let mut chain = vec![a];
        loop {
            let last = *chain.last().expect("chain starts non-empty");
            if self.refarc[last] == NONE {
                break;
            }
            chain.push(self.refarc[last]);
        }
        for i in (0..chain.len() - 1).rev() {
            let x = chain[i];
            self.side[x] *= self.side[chain[i + 1]];
            self.refarc[x] = NONE;
        }
        self.side[a]
    }

    /// Third pass: assembles the rotation. Every vertex opens with its
    /// parent, its outgoing arcs follow in signed nesting order, and each
    /// back arc is inserted at its ancestor next to the reference child it
    /// came through: clockwise after it for right arcs, counterclockwise
    /// before it for left arcs.
    fn attach(
        &self,
        v: usize,
        rotation: &mut [Vec<usize>],
        left_ref: &mut [usize],
        right_ref: &mut [usize],
    ) {
        for &a in &self.out[v] {
            let w = self.dst[a];
            rotation[v].push(w);
            if self.parent_arc[w] == a {
                // tree arc: the parent entry opens the child's rotation
                debug_assert!(rotation[w].is_empty());
                rotation[w].push(v);
                left_ref[v] = w;
                right_ref[v] = w;
                self.attach(w, rotation, left_ref, right_ref);
            } else if self.side[a] >= 0 {
                let at = marker_position(&rotation[w], right_ref[w]);
                rotation[w].insert(at + 1, v);
            } else {
                let at = marker_position(&rotation[w], left_ref[w]);
                rotation[w].insert(at, v);
                left_ref[w] = v;
            }
        }
    }
}

fn marker_position(rotation: &[usize], marker: usize) -> usize {
    rotation
        .iter()
        .position(|&x| x == marker)
        .expect("the reference entry is present before any insertion")
}
