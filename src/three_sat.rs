use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use crate::{
    constraint::{ConstraintMap, ConstraintTree},
    crossings::{embed_ec_with_crossings, Crossing, PlanarEmbeddingWithCrossings},
    error::{LayoutError, Result},
    gadget::{BarrierFactory, PlanarGadget, WireFactory},
    gadget_layout::{layout_gadgets, GadgetArrangement, GadgetLayout},
    types::UnorderedPair,
    EdgeLabel, UnGraph,
};

/// One literal of a 3-CNF formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    pub variable: usize,
    pub negated: bool,
}

impl Literal {
    pub fn positive(variable: usize) -> Self {
        Literal {
            variable,
            negated: false,
        }
    }

    pub fn negative(variable: usize) -> Self {
        Literal {
            variable,
            negated: true,
        }
    }
}

/// A 3-CNF instance: clauses of exactly three literals over
/// `0..num_variables`.
#[derive(Debug, Clone)]
pub struct ThreeSat {
    pub num_variables: usize,
    pub clauses: Vec<[Literal; 3]>,
}

impl ThreeSat {
    pub fn new(num_variables: usize, clauses: Vec<[Literal; 3]>) -> Self {
        ThreeSat {
            num_variables,
            clauses,
        }
    }

    /// Evaluates the formula under an assignment.
    pub fn evaluate(&self, assignment: &[bool]) -> bool {
        self.clauses.iter().all(|clause| {
            clause
                .iter()
                .any(|lit| assignment[lit.variable] != lit.negated)
        })
    }

    /// Exhaustive satisfiability reference, for testing layouts against.
    pub fn satisfiable_brute_force(&self) -> bool {
        assert!(
            self.num_variables < usize::BITS as usize,
            "brute force reference limited to small instances"
        );
        (0..1usize << self.num_variables).any(|mask| {
            let assignment: Vec<bool> =
                (0..self.num_variables).map(|i| mask >> i & 1 == 1).collect();
            self.evaluate(&assignment)
        })
    }

    fn validate(&self) -> Result<()> {
        for clause in &self.clauses {
            for lit in clause {
                if lit.variable >= self.num_variables {
                    return Err(LayoutError::InvalidLayout(format!(
                        "literal refers to variable {} of {}",
                        lit.variable, self.num_variables
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Port indices of a variable gadget, depending on which literal taps exist.
#[derive(Debug, Clone, Copy)]
pub struct VariablePorts {
    pub entry: usize,
    pub exit: usize,
    pub positive: Option<usize>,
    pub negative: Option<usize>,
}

/// Port indices of a clause gadget: three literal taps, one railroad entry,
/// one railroad exit.
#[derive(Debug, Clone, Copy)]
pub struct ClausePorts {
    pub literals: [usize; 3],
    pub exit: usize,
    pub entry: usize,
}

/// Port indices of a junction gadget: chain in, clause tap, chain out.
#[derive(Debug, Clone, Copy)]
pub struct JunctionPorts {
    pub input: usize,
    pub clause: usize,
    pub output: usize,
}

/// Port indices of a crossover gadget, for a given handedness.
#[derive(Debug, Clone, Copy)]
pub struct CrossoverPorts {
    pub first_entry: usize,
    pub first_exit: usize,
    pub second_entry: usize,
    pub second_exit: usize,
}

/// Factory for the domain gadgets of the 3-SAT reduction. Port indices refer
/// to the clockwise port lists of the created gadgets.
pub trait ThreeSatGadgetFactory {
    fn variable_gadget(&self, positive: bool, negative: bool) -> Box<dyn PlanarGadget>;
    fn variable_ports(&self, positive: bool, negative: bool) -> VariablePorts;
    fn clause_gadget(&self) -> Box<dyn PlanarGadget>;
    fn clause_ports(&self) -> ClausePorts;
    fn junction_gadget(&self) -> Box<dyn PlanarGadget>;
    fn junction_ports(&self) -> JunctionPorts;
    fn crossover_gadget(&self, clockwise: bool) -> Box<dyn PlanarGadget>;
    fn crossover_ports(&self, clockwise: bool) -> CrossoverPorts;
}

/// Role of a vertex in the compiled gadget graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Start,
    Finish,
    Variable(usize),
    /// The gating variable between the variable row and the clause row.
    Gate,
    Clause(usize),
    /// Junction of one literal chain: `(variable, negated, clause)`.
    Junction(usize, bool, usize),
    /// A crossing vertex promoted to a crossover gadget.
    Crossover,
    /// A subdivision vertex promoted to a pass-through junction.
    Subdivision,
}

/// Output of the 3-SAT compiler: the geometric layout plus the materialised
/// gadget graph it realises.
pub struct ThreeSatLayout {
    pub layout: GadgetLayout,
    /// The super-graph whose vertices became gadgets.
    pub graph: UnGraph,
    pub roles: HashMap<NodeIndex, Role>,
    pub start: NodeIndex,
    pub finish: NodeIndex,
    /// Start to finish, the gadgets the token must pass in order.
    pub railroad: Vec<NodeIndex>,
    /// Crossing vertex -> thread metadata, for following crossover wires.
    pub crossings: HashMap<NodeIndex, Crossing>,
    /// Crossing vertices of the embedding, one crossover gadget each.
    pub crossover_count: usize,
}

impl ThreeSatLayout {
    /// Reference traversal semantics of the layout: a token walks the wires
    /// out of the start gadget, chooses a sign at every variable gadget
    /// (unlocking that sign's literal chains), and passes a clause gadget
    /// only when one of its junction taps carries an unlocked sign. Crossover
    /// gadgets pass the token straight through along their threads,
    /// pass-through junctions along their only other wire. Returns whether
    /// the finish gadget is reachable.
    pub fn traversal_reaches_finish(&self) -> bool {
        let mut assignment = HashMap::new();
        self.advance(0, &mut assignment)
    }

    fn advance(&self, at: usize, assignment: &mut HashMap<usize, bool>) -> bool {
        let v = self.railroad[at];
        match &self.roles[&v] {
            Role::Finish => true,
            Role::Start | Role::Gate => self.step(at, assignment),
            Role::Variable(x) => {
                let x = *x;
                for sign in [true, false] {
                    assignment.insert(x, sign);
                    if self.step(at, assignment) {
                        return true;
                    }
                }
                assignment.remove(&x);
                false
            }
            Role::Clause(_) => self.clause_open(v, assignment) && self.step(at, assignment),
            _ => false,
        }
    }

    /// Walks the wire leaving `railroad[at]` towards the next railroad
    /// gadget.
    fn step(&self, at: usize, assignment: &mut HashMap<usize, bool>) -> bool {
        let v = self.railroad[at];
        let target = self.railroad[at + 1];
        let mut nbrs: Vec<NodeIndex> = self.graph.neighbors(v).collect();
        nbrs.reverse();
        for h in nbrs {
            if self.follow(v, h) == target {
                return self.advance(at + 1, assignment);
            }
        }
        false
    }

    /// Follows a wire through crossovers and pass-through junctions until it
    /// reaches the next proper gadget.
    fn follow(&self, mut from: NodeIndex, mut cur: NodeIndex) -> NodeIndex {
        loop {
            match self.roles.get(&cur) {
                Some(Role::Crossover) => {
                    let c = &self.crossings[&cur];
                    let next = if from == c.start1 {
                        c.end1
                    } else if from == c.end1 {
                        c.start1
                    } else if from == c.start2 {
                        c.end2
                    } else {
                        c.start2
                    };
                    from = cur;
                    cur = next;
                }
                Some(Role::Subdivision) => {
                    let next = self
                        .graph
                        .neighbors(cur)
                        .find(|&w| w != from)
                        .expect("subdivision vertices pass straight through");
                    from = cur;
                    cur = next;
                }
                _ => return cur,
            }
        }
    }

    /// A clause lets the token through when one of its junction taps carries
    /// the sign its variable was set to.
    fn clause_open(&self, clause: NodeIndex, assignment: &HashMap<usize, bool>) -> bool {
        let mut nbrs: Vec<NodeIndex> = self.graph.neighbors(clause).collect();
        nbrs.reverse();
        for h in nbrs {
            let g = self.follow(clause, h);
            if let Some(Role::Junction(var, negated, _)) = self.roles.get(&g) {
                if assignment.get(var).copied() == Some(!*negated) {
                    return true;
                }
            }
        }
        false
    }
}

/// Compiles a 3-CNF instance into a geometric gadget layout.
///
/// The gadget graph strings start, variables, a gating variable, clauses and
/// finish into a railroad, and hangs one junction chain per literal off its
/// variable, one junction per clause occurrence, which keeps the graph
/// simple by construction. The EC embedder with crossings lays the graph
/// flat, crossings become crossover gadgets, surviving subdivision vertices
/// become pass-through junctions, and the global layout materialises
/// coordinates.
///
/// Traversal solvability of the resulting layout, under the factory's port
/// semantics (a variable unlocks the chains of its chosen sign, a clause
/// needs one unlocked chain, the railroad needs every clause), is equivalent
/// to satisfiability of the formula.
#[allow(clippy::too_many_arguments)]
pub fn layout_3sat(
    three_sat: &ThreeSat,
    factory: &dyn ThreeSatGadgetFactory,
    wire: &dyn WireFactory,
    barrier: &dyn BarrierFactory,
    start_gadget: Box<dyn PlanarGadget>,
    start_port: usize,
    finish_gadget: Box<dyn PlanarGadget>,
    finish_port: usize,
) -> Result<ThreeSatLayout> {
    three_sat.validate()?;
    if start_port >= start_gadget.ports().len() || finish_port >= finish_gadget.ports().len() {
        return Err(LayoutError::InvalidGadget(
            "start or finish port out of range".to_string(),
        ));
    }

    let compiled = GadgetGraph::build(three_sat);
    let pewc = embed_ec_with_crossings(&compiled.graph, compiled.start, &compiled.constraints)?;

    let arrangement = materialise(
        &compiled,
        &pewc,
        factory,
        start_gadget,
        start_port,
        finish_gadget,
        finish_port,
    )?;

    let mut roles = compiled.roles.clone();
    for x in pewc.crossings.keys() {
        roles.insert(*x, Role::Crossover);
    }
    for d in &pewc.subdivisions {
        roles.insert(*d, Role::Subdivision);
    }

    let layout = layout_gadgets(&pewc.embedding, arrangement, wire, barrier)?;

    let crossover_count = pewc.crossings.len();
    Ok(ThreeSatLayout {
        layout,
        graph: pewc.graph,
        roles,
        start: compiled.start,
        finish: compiled.finish,
        railroad: compiled.railroad.clone(),
        crossings: pewc.crossings,
        crossover_count,
    })
}

/// Chain links of one junction.
#[derive(Debug, Clone, Copy)]
struct JunctionInfo {
    prev: NodeIndex,
    clause: NodeIndex,
    next: Option<NodeIndex>,
}

/// The abstract gadget graph of one formula, before geometry.
struct GadgetGraph {
    graph: UnGraph,
    constraints: ConstraintMap,
    roles: HashMap<NodeIndex, Role>,
    start: NodeIndex,
    finish: NodeIndex,
    /// Start, variables, gate, clauses, finish, in railroad order.
    railroad: Vec<NodeIndex>,
    /// Per variable: the heads of its positive and negative literal chains.
    taps: Vec<(Option<NodeIndex>, Option<NodeIndex>)>,
    /// Per clause: its three junctions, in literal order.
    clause_junctions: Vec<[NodeIndex; 3]>,
    junction_info: HashMap<NodeIndex, JunctionInfo>,
}

impl GadgetGraph {
    fn build(three_sat: &ThreeSat) -> GadgetGraph {
        let mut graph = UnGraph::new_undirected();
        let mut roles = HashMap::new();

        let start = graph.add_node(0);
        roles.insert(start, Role::Start);

        let variables: Vec<NodeIndex> = (0..three_sat.num_variables)
            .map(|i| {
                let v = graph.add_node(graph.node_count() as u32);
                roles.insert(v, Role::Variable(i));
                v
            })
            .collect();
        let gate = graph.add_node(graph.node_count() as u32);
        roles.insert(gate, Role::Gate);
        let clauses: Vec<NodeIndex> = (0..three_sat.clauses.len())
            .map(|i| {
                let c = graph.add_node(graph.node_count() as u32);
                roles.insert(c, Role::Clause(i));
                c
            })
            .collect();
        let finish = graph.add_node(graph.node_count() as u32);
        roles.insert(finish, Role::Finish);

        // the railroad: start, variables, gate, clauses, finish
        let mut railroad = vec![start];
        railroad.extend(variables.iter().copied());
        railroad.push(gate);
        railroad.extend(clauses.iter().copied());
        railroad.push(finish);
        for w in railroad.windows(2) {
            graph.add_edge(w[0], w[1], EdgeLabel::Real);
        }

        // literal chains: variable -> junction -> junction -> ..., one
        // junction per clause occurrence, each junction tapping its clause
        let mut taps: Vec<(Option<NodeIndex>, Option<NodeIndex>)> =
            vec![(None, None); three_sat.num_variables];
        let mut chain_tail: HashMap<Literal, NodeIndex> = HashMap::new();
        let mut clause_junctions: Vec<[NodeIndex; 3]> = Vec::new();
        let mut junction_info: HashMap<NodeIndex, JunctionInfo> = HashMap::new();

        for (ci, clause) in three_sat.clauses.iter().enumerate() {
            let mut junctions = [start; 3];
            for (k, lit) in clause.iter().enumerate() {
                let j = graph.add_node(graph.node_count() as u32);
                roles.insert(j, Role::Junction(lit.variable, lit.negated, ci));

                let prev = match chain_tail.get(lit) {
                    Some(&tail) => {
                        junction_info
                            .get_mut(&tail)
                            .expect("chain tails are junctions")
                            .next = Some(j);
                        tail
                    }
                    None => {
                        let v = variables[lit.variable];
                        let slot = if lit.negated {
                            &mut taps[lit.variable].1
                        } else {
                            &mut taps[lit.variable].0
                        };
                        *slot = Some(j);
                        v
                    }
                };
                graph.add_edge(prev, j, EdgeLabel::Real);
                graph.add_edge(j, clauses[ci], EdgeLabel::Real);
                junction_info.insert(
                    j,
                    JunctionInfo {
                        prev,
                        clause: clauses[ci],
                        next: None,
                    },
                );
                chain_tail.insert(*lit, j);
                junctions[k] = j;
            }
            clause_junctions.push(junctions);
        }

        let mut compiled = GadgetGraph {
            graph,
            constraints: ConstraintMap::new(),
            roles,
            start,
            finish,
            railroad,
            taps,
            clause_junctions,
            junction_info,
        };
        compiled.constraints = compiled.constrain();
        compiled
    }

    /// One ORIENTED root per vertex, a GROUP child per port range, in
    /// clockwise port order: neighbours bound to the same range stay
    /// contiguous, ranges keep their declared order around the vertex.
    fn constrain(&self) -> ConstraintMap {
        let mut constraints = ConstraintMap::new();
        let pos_in_railroad: HashMap<NodeIndex, usize> = self
            .railroad
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();

        for v in self.graph.node_indices() {
            let tree = match &self.roles[&v] {
                Role::Start | Role::Finish => continue,
                Role::Variable(i) => {
                    let r = pos_in_railroad[&v];
                    let (pos, neg) = self.taps[*i];
                    // clockwise: positive tap up, exit right, negative tap
                    // down, entry left
                    let mut children = Vec::new();
                    if let Some(p) = pos {
                        children.push(ConstraintTree::group(vec![ConstraintTree::vertex(p)]));
                    }
                    children.push(ConstraintTree::group(vec![ConstraintTree::vertex(
                        self.railroad[r + 1],
                    )]));
                    if let Some(n) = neg {
                        children.push(ConstraintTree::group(vec![ConstraintTree::vertex(n)]));
                    }
                    children.push(ConstraintTree::group(vec![ConstraintTree::vertex(
                        self.railroad[r - 1],
                    )]));
                    ConstraintTree::oriented(children)
                }
                Role::Gate => {
                    let r = pos_in_railroad[&v];
                    ConstraintTree::oriented(vec![
                        ConstraintTree::vertex(self.railroad[r + 1]),
                        ConstraintTree::vertex(self.railroad[r - 1]),
                    ])
                }
                Role::Clause(ci) => {
                    let r = pos_in_railroad[&v];
                    // clockwise: the three literal taps up, exit, entry
                    ConstraintTree::oriented(vec![
                        ConstraintTree::group(
                            self.clause_junctions[*ci]
                                .iter()
                                .map(|&j| ConstraintTree::vertex(j))
                                .collect(),
                        ),
                        ConstraintTree::group(vec![ConstraintTree::vertex(self.railroad[r + 1])]),
                        ConstraintTree::group(vec![ConstraintTree::vertex(self.railroad[r - 1])]),
                    ])
                }
                Role::Junction(..) => {
                    // clockwise: clause tap up, chain out, chain in
                    let info = self.junction_info[&v];
                    let mut children = vec![ConstraintTree::vertex(info.clause)];
                    if let Some(n) = info.next {
                        children.push(ConstraintTree::vertex(n));
                    }
                    children.push(ConstraintTree::vertex(info.prev));
                    ConstraintTree::oriented(children)
                }
                Role::Crossover | Role::Subdivision => continue,
            };
            constraints.insert(v, tree);
        }
        constraints
    }
}

/// Builds the per-vertex gadget boxes and port bindings over the
/// materialised super-graph.
fn materialise(
    compiled: &GadgetGraph,
    pewc: &PlanarEmbeddingWithCrossings,
    factory: &dyn ThreeSatGadgetFactory,
    start_gadget: Box<dyn PlanarGadget>,
    start_port: usize,
    finish_gadget: Box<dyn PlanarGadget>,
    finish_port: usize,
) -> Result<GadgetArrangement> {
    let mut gadgets: HashMap<NodeIndex, Box<dyn PlanarGadget>> = HashMap::new();
    let mut edge_ports: HashMap<NodeIndex, HashMap<NodeIndex, usize>> = HashMap::new();
    let mut start_gadget = Some(start_gadget);
    let mut finish_gadget = Some(finish_gadget);

    // the super-graph neighbour standing in for an original edge at `v`
    let head = |v: NodeIndex, w: NodeIndex| -> NodeIndex {
        let pair = UnorderedPair::new(v, w);
        let path = &pewc.added_vertices[&pair];
        if path[0] == v {
            path[1]
        } else {
            path[path.len() - 2]
        }
    };

    for v in pewc.graph.node_indices() {
        let rot = pewc.embedding.order_at(v);
        if rot.is_empty() {
            continue; // outside the embedded component
        }

        let mut ports = HashMap::new();
        match compiled.roles.get(&v) {
            Some(Role::Start) => {
                ports.insert(rot[0], start_port);
                gadgets.insert(v, start_gadget.take().expect("one start vertex"));
            }
            Some(Role::Finish) => {
                ports.insert(rot[0], finish_port);
                gadgets.insert(v, finish_gadget.take().expect("one finish vertex"));
            }
            Some(Role::Variable(i)) => {
                let r = railroad_position(compiled, v);
                let (pos, neg) = compiled.taps[*i];
                let spec = factory.variable_ports(pos.is_some(), neg.is_some());
                ports.insert(head(v, compiled.railroad[r - 1]), spec.entry);
                ports.insert(head(v, compiled.railroad[r + 1]), spec.exit);
                if let Some(p) = pos {
                    ports.insert(head(v, p), spec.positive.expect("factory offers the tap"));
                }
                if let Some(n) = neg {
                    ports.insert(head(v, n), spec.negative.expect("factory offers the tap"));
                }
                gadgets.insert(v, factory.variable_gadget(pos.is_some(), neg.is_some()));
            }
            Some(Role::Gate) => {
                let r = railroad_position(compiled, v);
                let spec = factory.variable_ports(false, false);
                ports.insert(head(v, compiled.railroad[r - 1]), spec.entry);
                ports.insert(head(v, compiled.railroad[r + 1]), spec.exit);
                gadgets.insert(v, factory.variable_gadget(false, false));
            }
            Some(Role::Clause(ci)) => {
                let r = railroad_position(compiled, v);
                let spec = factory.clause_ports();
                let entry_head = head(v, compiled.railroad[r - 1]);
                ports.insert(entry_head, spec.entry);
                ports.insert(head(v, compiled.railroad[r + 1]), spec.exit);
                // the junction taps take the literal ports in the clockwise
                // order the embedding settled on, starting after the entry
                let junction_heads: Vec<NodeIndex> = compiled.clause_junctions[*ci]
                    .iter()
                    .map(|&j| head(v, j))
                    .collect();
                let start_at = rot
                    .iter()
                    .position(|&x| x == entry_head)
                    .expect("entry head is a neighbour");
                let mut slot = 0;
                for k in 1..rot.len() {
                    let w = rot[(start_at + k) % rot.len()];
                    if junction_heads.contains(&w) {
                        ports.insert(w, spec.literals[slot]);
                        slot += 1;
                    }
                }
                if slot != 3 {
                    return Err(LayoutError::InvalidLayout(
                        "clause junction taps do not close up".to_string(),
                    ));
                }
                gadgets.insert(v, factory.clause_gadget());
            }
            Some(Role::Junction(..)) => {
                let spec = factory.junction_ports();
                let info = compiled.junction_info[&v];
                ports.insert(head(v, info.prev), spec.input);
                ports.insert(head(v, info.clause), spec.clause);
                if let Some(n) = info.next {
                    ports.insert(head(v, n), spec.output);
                }
                gadgets.insert(v, factory.junction_gadget());
            }
            Some(Role::Crossover) | Some(Role::Subdivision) => {
                unreachable!("added vertices carry no compiled role")
            }
            None => {
                if let Some(c) = pewc.crossings.get(&v) {
                    debug_assert_eq!(rot.len(), 4);
                    let p = rot
                        .iter()
                        .position(|&x| x == c.start1)
                        .expect("thread ends are neighbours");
                    let clockwise = rot[(p + 1) % 4] == c.start2;
                    let spec = factory.crossover_ports(clockwise);
                    ports.insert(c.start1, spec.first_entry);
                    ports.insert(c.end1, spec.first_exit);
                    ports.insert(c.start2, spec.second_entry);
                    ports.insert(c.end2, spec.second_exit);
                    gadgets.insert(v, factory.crossover_gadget(clockwise));
                } else {
                    // a surviving subdivision: a pass-through junction
                    debug_assert_eq!(rot.len(), 2);
                    let spec = factory.junction_ports();
                    ports.insert(rot[0], spec.input);
                    ports.insert(rot[1], spec.output);
                    gadgets.insert(v, factory.junction_gadget());
                }
            }
        }
        edge_ports.insert(v, ports);
    }

    Ok(GadgetArrangement {
        gadgets,
        edge_ports,
    })
}

fn railroad_position(compiled: &GadgetGraph, v: NodeIndex) -> usize {
    compiled
        .railroad
        .iter()
        .position(|&x| x == v)
        .expect("railroad vertices are recorded in order")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::factories::{
        SimpleBarrierFactory, SimpleThreeSatFactory, SimpleWireFactory,
    };

    fn reference_layout(three_sat: &ThreeSat) -> Result<ThreeSatLayout> {
        let factory = SimpleThreeSatFactory;
        layout_3sat(
            three_sat,
            &factory,
            &SimpleWireFactory,
            &SimpleBarrierFactory,
            factory.start_gadget(),
            0,
            factory.finish_gadget(),
            0,
        )
    }

    fn random_three_sat(vars: usize, clauses: usize, seed: u64) -> ThreeSat {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(seed);
        let clauses = (0..clauses)
            .map(|_| {
                [(); 3].map(|_| Literal {
                    variable: rng.random_range(0..vars),
                    negated: rng.random_bool(0.5),
                })
            })
            .collect();
        ThreeSat::new(vars, clauses)
    }

    fn assert_layout_disjoint(layout: &GadgetLayout) {
        let rects: Vec<crate::gadget::Rect> =
            layout.placements.iter().map(|p| p.rect()).collect();
        for i in 0..rects.len() {
            for j in i + 1..rects.len() {
                assert!(
                    !rects[i].overlaps(&rects[j]),
                    "{:?} overlaps {:?}",
                    rects[i],
                    rects[j]
                );
            }
        }
        let bbox = layout.bounding_box();
        assert_eq!((bbox.x, bbox.y), (0, 0));
    }

    #[test]
    fn test_evaluate_and_brute_force() {
        // (x0 | !x1 | x2) & (!x0 | x1 | x2)
        let f = ThreeSat::new(
            3,
            vec![
                [
                    Literal::positive(0),
                    Literal::negative(1),
                    Literal::positive(2),
                ],
                [
                    Literal::negative(0),
                    Literal::positive(1),
                    Literal::positive(2),
                ],
            ],
        );
        assert!(f.evaluate(&[true, true, false]));
        assert!(!f.evaluate(&[true, false, false]));
        assert!(f.satisfiable_brute_force());
    }

    #[test]
    fn test_unsatisfiable_brute_force() {
        // (x0 | x0 | x0) & (!x0 | !x0 | !x0)
        let f = ThreeSat::new(
            1,
            vec![
                [
                    Literal::positive(0),
                    Literal::positive(0),
                    Literal::positive(0),
                ],
                [
                    Literal::negative(0),
                    Literal::negative(0),
                    Literal::negative(0),
                ],
            ],
        );
        assert!(!f.satisfiable_brute_force());
    }

    #[test]
    fn test_gadget_graph_shape() {
        let f = ThreeSat::new(
            3,
            vec![[
                Literal::positive(0),
                Literal::negative(1),
                Literal::positive(2),
            ]],
        );
        let compiled = GadgetGraph::build(&f);
        // start + 3 variables + gate + 1 clause + finish + 3 junctions
        assert_eq!(compiled.graph.node_count(), 10);
        // railroad (6) + per junction a chain edge and a clause edge (6)
        assert_eq!(compiled.graph.edge_count(), 12);
        assert_eq!(compiled.railroad.len(), 7);
        // every junction knows its chain
        for junctions in &compiled.clause_junctions {
            for j in junctions {
                assert!(compiled.junction_info.contains_key(j));
            }
        }
    }

    #[test]
    fn test_compiled_constraints_are_well_formed() {
        let f = ThreeSat::new(
            2,
            vec![[
                Literal::positive(0),
                Literal::negative(1),
                Literal::positive(0),
            ]],
        );
        let compiled = GadgetGraph::build(&f);
        crate::ec_embedding::validate_constraints(&compiled.graph, &compiled.constraints)
            .expect("compiled constraints match the neighbourhoods");
    }

    #[test]
    fn test_satisfiable_instance_lays_out() {
        // S7: a single satisfiable clause over three variables
        let f = ThreeSat::new(
            3,
            vec![[
                Literal::positive(0),
                Literal::negative(1),
                Literal::positive(2),
            ]],
        );
        let result = reference_layout(&f).unwrap();
        assert_layout_disjoint(&result.layout);
        crate::testing::verify::verify_layout(&result.layout, (3, 3)).unwrap();
        assert!(f.satisfiable_brute_force());
        // S7: the token reaches the finish gadget
        assert!(result.traversal_reaches_finish());
        // the layout realises every compiled vertex as a gadget
        assert!(result.layout.vertex_placement.len() >= 10);
        assert_eq!(result.roles[&result.start], Role::Start);
        assert_eq!(result.roles[&result.finish], Role::Finish);
    }

    #[test]
    fn test_unsatisfiable_instance_still_lays_out() {
        // S8-like: x0 forced both ways; the layout exists, traversal fails
        let f = ThreeSat::new(
            1,
            vec![
                [
                    Literal::positive(0),
                    Literal::positive(0),
                    Literal::positive(0),
                ],
                [
                    Literal::negative(0),
                    Literal::negative(0),
                    Literal::negative(0),
                ],
            ],
        );
        let result = reference_layout(&f).unwrap();
        assert_layout_disjoint(&result.layout);
        assert!(!f.satisfiable_brute_force());
        // S8: the finish gadget stays unreachable
        assert!(!result.traversal_reaches_finish());
    }

    #[test]
    fn test_two_clause_instance() {
        let f = ThreeSat::new(
            3,
            vec![
                [
                    Literal::positive(0),
                    Literal::positive(1),
                    Literal::positive(2),
                ],
                [
                    Literal::negative(0),
                    Literal::negative(1),
                    Literal::positive(2),
                ],
            ],
        );
        let result = reference_layout(&f).unwrap();
        assert_layout_disjoint(&result.layout);
        assert_eq!(
            result.traversal_reaches_finish(),
            f.satisfiable_brute_force()
        );
    }

    /// Property 10: over a random collection of 3-CNF instances, the layout
    /// admits a start-to-finish traversal exactly when the instance is
    /// satisfiable.
    #[test]
    fn test_property_10_random_instances() {
        for seed in 0..6u64 {
            let f = random_three_sat(3, 3, seed);
            let result = reference_layout(&f).unwrap();
            assert_eq!(
                result.traversal_reaches_finish(),
                f.satisfiable_brute_force(),
                "seed {}",
                seed
            );
        }
    }

    /// Forced-unsatisfiable instances are rare in uniform samples; pin a few
    /// alongside the random sweep.
    #[test]
    fn test_property_10_unsatisfiable_instances() {
        let contradiction = |v: usize| {
            [
                [
                    Literal::positive(v),
                    Literal::positive(v),
                    Literal::positive(v),
                ],
                [
                    Literal::negative(v),
                    Literal::negative(v),
                    Literal::negative(v),
                ],
            ]
        };
        let f = ThreeSat::new(2, {
            let mut clauses: Vec<[Literal; 3]> = contradiction(0).to_vec();
            clauses.extend(contradiction(1));
            clauses
        });
        assert!(!f.satisfiable_brute_force());
        let result = reference_layout(&f).unwrap();
        assert!(!result.traversal_reaches_finish());
    }
}
