use petgraph::visit::EdgeRef;

use crate::{
    block_cut::block_cut_tree,
    triconnected_blocks::{
        merge_components::merge_components,
        outside_structures::{Component, ComponentType, EdgeType, TriconnectedComponents},
        split_graph::SplitGraph,
    },
    UnGraph,
};

fn find_components(
    root: usize,
    u: usize,
    vedges_cutoff: usize,
    graph: &mut SplitGraph,
    estack: &mut Vec<usize>,
    tstack: &mut Vec<(usize, usize, usize)>,
    components: &mut Vec<Component>,
) {
    fn update_tstack(
        u: usize,
        to: usize,
        eid: usize,
        tstack: &mut Vec<(usize, usize, usize)>,
        graph: &SplitGraph,
    ) {
        fn pop_tstack(
            cutoff: usize,
            mut max_h: usize,
            mut last_b: usize,
            tstack: &mut Vec<(usize, usize, usize)>,
        ) -> (usize, usize, usize) {
            while let Some(&(h, a, b)) = tstack.last() {
                if a > cutoff {
                    tstack.pop();
                    max_h = h.max(max_h);
                    last_b = b;
                } else {
                    break;
                }
            }

            (max_h, cutoff, last_b)
        }

        let (max_h, a, last_b) = if graph.kind(eid) == Some(EdgeType::Tree) {
            pop_tstack(
                graph.low1[to],
                graph.num[to] + graph.sub[to] - 1,
                graph.num[u],
                tstack,
            )
        } else {
            pop_tstack(graph.num[to], graph.num[u], graph.num[u], tstack)
        };

        tstack.push((max_h, a, last_b));
    }

    fn check_highpoint(u: usize, tstack: &mut Vec<(usize, usize, usize)>, graph: &mut SplitGraph) {
        let u_high = graph.get_high(u);

        while let Some(&(h, a, b)) = tstack.last() {
            if a != graph.num[u] && b != graph.num[u] && u_high > h {
                tstack.pop();
            } else {
                break;
            }
        }
    }

    /// Handles type-2 split pairs: `(u, to)` such that everything between
    /// them in the numbering hangs below `u`.
    fn check_type_2(
        root: usize,
        u: usize,
        mut to: usize,
        tstack: &mut Vec<(usize, usize, usize)>,
        estack: &mut Vec<usize>,
        graph: &mut SplitGraph,
        components: &mut Vec<Component>,
    ) {
        if u == root {
            return;
        }

        loop {
            let (h, a, b) = if let Some(&last) = tstack.last() {
                last
            } else {
                (0, usize::MAX, 0)
            };

            let cond_1 = a == graph.num[u];
            let cond_2 = graph.deg[to] == 2
                && graph.num[graph.first_alive(root, to).unwrap()] > graph.num[to];

            if !(cond_1 || cond_2) {
                break;
            }
            if a == graph.num[u] && graph.par[graph.numrev[b]] == Some(u) {
                tstack.pop();
                continue;
            }

            let mut eab = None;
            let mut evirt;
            if cond_2 {
                // a degree-2 chain vertex: the triangle (u, to, next) splits off
                to = graph.first_alive(root, to).unwrap();

                let mut component = Component::new(Some(ComponentType::S));

                for _ in 0..2 {
                    let eid = estack.pop().unwrap();
                    component.push_edge(eid, graph, false);
                }

                evirt = graph.new_edge(u, to, None);
                component.push_edge(evirt, graph, true);

                component.commit(components);

                if let Some(&eid) = estack.last() {
                    if graph.ends(eid) == (to, u) {
                        estack.pop();
                        eab = Some(eid);
                    }
                }
            } else {
                to = graph.numrev[b];

                tstack.pop();
                let mut component = Component::new(None);
                loop {
                    if let Some(&eid) = estack.last() {
                        let (x, y) = graph.ends(eid);

                        let x_in_subtree = graph.num[u] <= graph.num[x] && graph.num[x] <= h;
                        let y_in_subtree = graph.num[u] <= graph.num[y] && graph.num[y] <= h;
                        if !(x_in_subtree && y_in_subtree) {
                            break;
                        }

                        estack.pop();

                        if (x == u && y == to) || (y == u && x == to) {
                            eab = Some(eid);
                        } else {
                            component.push_edge(eid, graph, false);
                        }
                    } else {
                        break;
                    }
                }

                evirt = graph.new_edge(u, to, None);
                component.push_edge(evirt, graph, true);
                component.commit(components);
            }

            if let Some(eab) = eab {
                // a parallel edge between the split pair forms a bond
                let mut component = Component::new(Some(ComponentType::P));
                component.push_edge(eab, graph, false);

                component.push_edge(evirt, graph, false);

                evirt = graph.new_edge(u, to, None);
                component.push_edge(evirt, graph, true);

                component.commit(components);
            }

            estack.push(evirt);
            graph.make_tedge(evirt);
        }
    }

    /// Handles type-1 split pairs: `(u, low1(to))` when the subtree of `to`
    /// reaches `low1(to)` but nothing above it.
    fn check_type_1(
        root: usize,
        u: usize,
        to: usize,
        estack: &mut Vec<usize>,
        graph: &mut SplitGraph,
        components: &mut Vec<Component>,
        t_edges_left: usize,
    ) {
        if graph.low2[to] >= graph.num[u]
            && graph.low1[to] < graph.num[u]
            && (Some(root) != graph.par[u] || t_edges_left != 0)
        {
            let mut component = Component::new(None);
            while let Some(&eid) = estack.last() {
                let (x, y) = graph.ends(eid);
                let x_in_subtree =
                    graph.num[to] <= graph.num[x] && graph.num[x] < graph.num[to] + graph.sub[to];
                let y_in_subtree =
                    graph.num[to] <= graph.num[y] && graph.num[y] < graph.num[to] + graph.sub[to];

                if !(x_in_subtree || y_in_subtree) {
                    break;
                }

                estack.pop();

                component.push_edge(eid, graph, false);
            }

            let mut evirt = graph.new_edge(u, graph.numrev[graph.low1[to]], None);
            component.push_edge(evirt, graph, true);

            component.commit(components);

            if let Some(&eid) = estack.last() {
                let (x, y) = graph.ends(eid);
                if (x == u && y == graph.numrev[graph.low1[to]])
                    || (y == u && x == graph.numrev[graph.low1[to]])
                {
                    estack.pop();
                    let mut component = Component::new(Some(ComponentType::P));

                    component.push_edge(eid, graph, false);

                    component.push_edge(evirt, graph, false);

                    evirt = graph.new_edge(u, graph.numrev[graph.low1[to]], None);
                    component.push_edge(evirt, graph, true);

                    component.commit(components);
                }
            }

            if Some(graph.numrev[graph.low1[to]]) != graph.par[u] {
                estack.push(evirt);

                graph.make_bedge(evirt);
            } else {
                // the virtual edge doubles the parent edge of u: bond them
                let parent_edge = graph.par_edge[u].unwrap();

                let mut component = Component::new(Some(ComponentType::P));

                component.push_edge(parent_edge, graph, false);

                component.push_edge(evirt, graph, false);

                evirt = graph.new_edge(graph.par[u].unwrap(), u, None);
                component.push_edge(evirt, graph, true);

                component.commit(components);

                graph.make_tedge(evirt);
                graph.par_edge[u] = Some(evirt);
            }
        }
    }

    let mut adjacent_tedges = graph.adj[u]
        .iter()
        .filter(|&&eid| graph.kind(eid) == Some(EdgeType::Tree))
        .count();

    let mut i = 0;
    while i < graph.adj[u].len() {
        let eid = graph.adj[u][i];
        if eid >= vedges_cutoff {
            // virtual edges are handled where they are created
            break;
        }

        let to = graph.other(eid, u);
        if graph.starts_path[eid] {
            update_tstack(u, to, eid, tstack, graph);
        }

        if graph.kind(eid) == Some(EdgeType::Tree) {
            let mut new_tstack = vec![];
            find_components(
                root,
                to,
                vedges_cutoff,
                graph,
                estack,
                if graph.starts_path[eid] {
                    &mut new_tstack
                } else {
                    tstack
                },
                components,
            );
            adjacent_tedges -= 1;

            // eid itself may have been retired by a bond along the way
            let push_eid = graph.par_edge[to].unwrap();
            estack.push(push_eid);

            check_type_2(
                root,
                u,
                to,
                if graph.starts_path[eid] {
                    &mut new_tstack
                } else {
                    tstack
                },
                estack,
                graph,
                components,
            );
            check_type_1(root, u, to, estack, graph, components, adjacent_tedges);

            check_highpoint(u, tstack, graph);
        } else {
            estack.push(eid);
        }

        i += 1;
    }
}

/// Computes the split components (triconnected components) of a biconnected,
/// loopless graph.
///
/// A pair of vertices `(s, t)` is a *split pair* if removing both disconnects
/// the graph or multiple edges connect them directly. Splitting on every split
/// pair and replacing each side by a virtual edge `(s, t)` yields components
/// of three kinds: bonds (P), polygons (S) and triconnected skeletons (R).
/// Merging P with P and S with S along shared virtual edges gives the final
/// triconnected components; every surviving virtual edge is shared by exactly
/// two components and glues them into the SPQR tree.
///
/// References:
/// * [Hopcroft, J., & Tarjan, R. (1973). Dividing a Graph into Triconnected Components.](https://epubs.siam.org/doi/10.1137/0202012)
/// * [Explaining Hopcroft, Tarjan, Gutwenger, and Mutzel's SPQR Decomposition Algorithm](https://shoyamanishi.github.io/wailea/docs/spqr_explained/HTGMExplained.pdf)
pub fn triconnected_components(in_graph: &UnGraph) -> TriconnectedComponents {
    let n = in_graph.node_count();
    let m = in_graph.edge_count();
    let root = 0;

    debug_assert!(block_cut_tree(in_graph).block_count == 1);
    assert!(n >= 2);

    let mut components = Vec::new();

    if n == 2 {
        // a lone edge or a bond; nothing to split
        let edges: Vec<(usize, usize)> = in_graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
            .collect();
        let mut tricon = TriconnectedComponents {
            components: vec![],
            edges,
            is_real: vec![true; m],
            edge_to_components: vec![vec![]; m],
        };
        if m >= 3 {
            let mut c = Component::new(Some(ComponentType::P));
            c.edges = (0..m).collect();
            tricon.components.push(c);
            for eid in 0..m {
                tricon.edge_to_components[eid].push(0);
            }
        }
        return tricon;
    }

    let mut graph = SplitGraph::from_block(in_graph);

    graph.extract_bonds(&mut components);

    // first pass: num, low1, low2, sub, par, deg, edge kinds and orientation
    graph.palm_orientation(root);

    graph.sort_acceptable();

    // second pass: high(v), starts_path(e) and the reverse post-order
    graph.pathfind(root);

    let vedges_cutoff = graph.edges.len();
    let mut estack = Vec::new();
    let mut tstack = Vec::new();
    find_components(
        root,
        root,
        vedges_cutoff,
        &mut graph,
        &mut estack,
        &mut tstack,
        &mut components,
    );

    let mut component = Component::new(None);
    while let Some(eid) = estack.pop() {
        component.push_edge(eid, &mut graph, false);
    }
    component.commit(&mut components);

    merge_components(graph.edges.len(), &mut components);

    let mut edge_to_components = vec![Vec::new(); graph.edges.len()];
    for (i, c) in components.iter().enumerate() {
        for &eid in &c.edges {
            edge_to_components[eid].push(i);
        }
    }

    let is_real = (0..graph.edges.len()).map(|eid| eid < m).collect();

    TriconnectedComponents {
        components,
        edges: graph.edges.iter().map(|e| (e.from, e.to)).collect(),
        is_real,
        edge_to_components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgeLabel;
    use petgraph::graph::NodeIndex;

    fn graph_from(n: usize, edges: &[(usize, usize)]) -> UnGraph {
        let mut g = UnGraph::new_undirected();
        for i in 0..n {
            g.add_node(i as u32);
        }
        for &(u, v) in edges {
            g.add_edge(NodeIndex::new(u), NodeIndex::new(v), EdgeLabel::Real);
        }
        g
    }

    fn count_types(tricon: &TriconnectedComponents) -> (usize, usize, usize) {
        let mut p = 0;
        let mut s = 0;
        let mut r = 0;
        for c in &tricon.components {
            match c.comp_type.unwrap() {
                ComponentType::P => p += 1,
                ComponentType::S => s += 1,
                ComponentType::R => r += 1,
            }
        }
        (p, s, r)
    }

    /// Every real edge must land in exactly one component; every surviving
    /// virtual edge in exactly two.
    fn assert_membership(tricon: &TriconnectedComponents) {
        for (eid, comps) in tricon.edge_to_components.iter().enumerate() {
            if tricon.is_real[eid] {
                assert_eq!(comps.len(), 1, "real edge {} in {} components", eid, comps.len());
            } else {
                assert!(comps.len() == 2 || comps.is_empty());
            }
        }
    }

    #[test]
    fn test_cycle_is_single_s_component() {
        let g = graph_from(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let tricon = triconnected_components(&g);
        assert_eq!(count_types(&tricon), (0, 1, 0));
        assert_membership(&tricon);
    }

    #[test]
    fn test_k4_is_single_r_component() {
        let g = graph_from(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        let tricon = triconnected_components(&g);
        assert_eq!(count_types(&tricon), (0, 0, 1));
        assert_membership(&tricon);
    }

    #[test]
    fn test_two_triangles_sharing_an_edge() {
        // vertices 0-1 shared; triangles 0-1-2 and 0-1-3
        let g = graph_from(4, &[(0, 1), (0, 2), (1, 2), (0, 3), (1, 3)]);
        let tricon = triconnected_components(&g);
        let (p, s, r) = count_types(&tricon);
        assert_eq!(r, 0);
        assert_eq!(s, 2);
        assert_eq!(p, 1);
        assert_membership(&tricon);
    }

    #[test]
    fn test_wheel_with_chain() {
        // wheel on hub 0, rim 1-2-3-4, plus a path 1-5-3 splitting off
        let g = graph_from(
            6,
            &[
                (0, 1),
                (0, 2),
                (0, 3),
                (0, 4),
                (1, 2),
                (2, 3),
                (3, 4),
                (4, 1),
                (1, 5),
                (5, 3),
            ],
        );
        let tricon = triconnected_components(&g);
        let (p, s, r) = count_types(&tricon);
        assert_eq!(r, 1);
        assert_eq!(s, 1);
        assert_eq!(p, 0);
        assert_membership(&tricon);
    }

    #[test]
    fn test_edge_coverage_is_preserved() {
        let g = graph_from(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2), (0, 3)]);
        let tricon = triconnected_components(&g);
        assert_membership(&tricon);
        // all real edges accounted for
        let mut covered = 0;
        for (eid, comps) in tricon.edge_to_components.iter().enumerate() {
            if tricon.is_real[eid] && comps.len() == 1 {
                covered += 1;
            }
        }
        assert_eq!(covered, g.edge_count());
    }
}
