use petgraph::graph::NodeIndex;
use petgraph::visit::NodeIndexable;

use crate::{EdgeLabel, UnGraph};

/// Complete graph on `n` vertices.
pub fn complete_graph(n: usize) -> UnGraph {
    let mut graph = UnGraph::new_undirected();
    for i in 0..n {
        graph.add_node(i as u32);
    }
    for i in 0..n {
        for j in i + 1..n {
            graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), EdgeLabel::Real);
        }
    }
    graph
}

/// Complete bipartite graph on `a + b` vertices.
pub fn complete_bipartite(a: usize, b: usize) -> UnGraph {
    let mut graph = UnGraph::new_undirected();
    for i in 0..a + b {
        graph.add_node(i as u32);
    }
    for i in 0..a {
        for j in 0..b {
            graph.add_edge(NodeIndex::new(i), NodeIndex::new(a + j), EdgeLabel::Real);
        }
    }
    graph
}

/// The Petersen graph: outer 5-cycle, inner 5-star, spokes between them.
pub fn petersen() -> UnGraph {
    let mut graph = UnGraph::new_undirected();
    for i in 0..10 {
        graph.add_node(i);
    }
    for i in 0..5 {
        graph.add_edge(
            NodeIndex::new(i),
            NodeIndex::new((i + 1) % 5),
            EdgeLabel::Real,
        );
        graph.add_edge(
            NodeIndex::new(5 + i),
            NodeIndex::new(5 + (i + 2) % 5),
            EdgeLabel::Real,
        );
        graph.add_edge(NodeIndex::new(i), NodeIndex::new(5 + i), EdgeLabel::Real);
    }
    graph
}

/// Generates a grid graph with the specified number of rows and columns.
pub fn grid_graph(rows: usize, cols: usize) -> UnGraph {
    assert!(rows > 1 && cols > 1);
    let mut graph = UnGraph::new_undirected();

    for r in 0..rows {
        for c in 0..cols {
            graph.add_node((r * cols + c) as u32);
        }
    }

    for r in 0..rows {
        for c in 0..cols {
            if r + 1 < rows {
                graph.add_edge(
                    NodeIndex::new(r * cols + c),
                    NodeIndex::new((r + 1) * cols + c),
                    EdgeLabel::Real,
                );
            }
            if c + 1 < cols {
                graph.add_edge(
                    NodeIndex::new(r * cols + c),
                    NodeIndex::new(r * cols + c + 1),
                    EdgeLabel::Real,
                );
            }
        }
    }

    graph
}

/// Seeded random connected graph: a random tree plus `m - n + 1` extra edges.
pub fn random_graph(n: usize, m: usize, seed: usize) -> UnGraph {
    use rand::rngs::StdRng;
    use rand::Rng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(seed as u64);
    let mut graph = UnGraph::new_undirected();

    for i in 0..n {
        graph.add_node(i.try_into().unwrap());
        if i > 0 {
            let j = rng.random_range(0..i);
            graph.add_edge(graph.from_index(i), graph.from_index(j), EdgeLabel::Real);
        }
    }

    for _ in n - 1..m {
        let s = rng.random_range(0..n);
        let t = rng.random_range(0..n);
        if s != t && graph.find_edge(graph.from_index(s), graph.from_index(t)).is_none() {
            graph.add_edge(graph.from_index(s), graph.from_index(t), EdgeLabel::Real);
        }
    }

    graph
}
