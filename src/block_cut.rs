use crate::{DFSEdgeLabel, EdgeLabel, UnGraph};
use hashbrown::HashSet;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::{EdgeRef, NodeIndexable};

/// Block-cut tree of a connected graph: its biconnected components (blocks),
/// its cut vertices, and the tree connecting them.
#[derive(Debug, Clone)]
pub struct BlockCutTree {
    /// Number of blocks in the graph.
    pub block_count: usize,
    /// Number of cut vertices in the graph.
    pub cut_count: usize,
    /// Blocks of the graph, as standalone subgraphs.
    pub blocks: Vec<UnGraph>,
    /// Graph of blocks and cut vertices. Blocks have ids from 0 to
    /// block_count - 1, cut vertices from block_count onwards.
    pub graph: UnGraph,
    /// Maps a node index of the original graph to its id in the skeleton: the
    /// block id for a non-cut vertex, `block_count + cut_id` for a cut vertex
    /// (which belongs to several blocks).
    pub node_to_id: Vec<usize>,
    /// Per block, the original `NodeIndex` of each block-local vertex.
    pub block_vertex_to_vertex: Vec<Vec<NodeIndex>>,
    /// DFS labels of the original graph's edges.
    pub edge_labels: Vec<DFSEdgeLabel>,
    /// DFS preorder numbers.
    pub preorder: Vec<usize>,
}

/// Lowpoint DFS that identifies cut vertices and collects the edge sets of
/// biconnected components from the edge stack.
///
/// Based on the [Tarjan & Hopcroft algorithm](https://en.wikipedia.org/wiki/Biconnected_component).
/// The graph must be connected; on a forest input only the component of the
/// start vertex is decomposed.
fn dfs(
    graph: &UnGraph,
    u: usize,
    parent: Option<usize>,
    time: &mut usize,
    preorder: &mut [usize],
    edge_labels: &mut [DFSEdgeLabel],
    edge_stack: &mut Vec<usize>,
    blocks: &mut Vec<Vec<usize>>,
    is_cut: &mut [bool],
) -> usize {
    preorder[u] = *time;
    *time += 1;
    let mut low = preorder[u];
    let mut children = 0;

    for e in graph.edges(NodeIndex::new(u)) {
        let v = e.target().index();
        if preorder[v] == usize::MAX {
            edge_labels[e.id().index()] = DFSEdgeLabel::Tree;
            children += 1;

            let stack_len = edge_stack.len();
            edge_stack.push(e.id().index());

            let low_v = dfs(
                graph,
                v,
                Some(u),
                time,
                preorder,
                edge_labels,
                edge_stack,
                blocks,
                is_cut,
            );

            low = low.min(low_v);
            if low_v >= preorder[u] {
                // u separates the subtree of v: everything pushed since the
                // tree edge (u, v) is one block
                is_cut[u] = parent.is_some();
                let block = edge_stack[stack_len..].to_vec();
                edge_stack.truncate(stack_len);
                blocks.push(block);
            }
        } else if preorder[v] < preorder[u] && edge_labels[e.id().index()] == DFSEdgeLabel::Unvisited
        {
            edge_stack.push(e.id().index());
            edge_labels[e.id().index()] = DFSEdgeLabel::Back;
            low = low.min(preorder[v]);
        }

        if parent.is_none() && children > 1 {
            is_cut[u] = true;
        }
    }

    low
}

/// Returns the block-cut tree of a connected graph.
///
/// A graph with one vertex and no edges counts as one block. Cut vertices are
/// members of every block they touch; block subgraphs renumber vertices but
/// keep node weights, and `block_vertex_to_vertex` maps block-local indices
/// back to the input graph.
pub fn block_cut_tree(graph: &UnGraph) -> BlockCutTree {
    let graph_size = graph.node_count();
    let mut time = 0;
    let mut preorder = vec![usize::MAX; graph_size];
    let mut edge_labels = vec![DFSEdgeLabel::Unvisited; graph.edge_count()];
    let mut edge_stack = Vec::with_capacity(graph.edge_count());
    let mut is_cut = vec![false; graph_size];
    let mut blocks = Vec::new();

    if graph_size == 1 && graph.edge_count() == 0 {
        let mut bct = BlockCutTree {
            block_count: 1,
            cut_count: 0,
            blocks: vec![UnGraph::new_undirected()],
            graph: UnGraph::new_undirected(),
            node_to_id: vec![0],
            block_vertex_to_vertex: vec![vec![NodeIndex::new(0)]],
            edge_labels: vec![],
            preorder: vec![0],
        };
        bct.blocks[0].add_node(*graph.node_weight(NodeIndex::new(0)).unwrap());
        bct.graph.add_node(0);
        return bct;
    }

    dfs(
        graph,
        0,
        None,
        &mut time,
        &mut preorder,
        &mut edge_labels,
        &mut edge_stack,
        &mut blocks,
        &mut is_cut,
    );

    let mut block_vertex_sets: Vec<HashSet<usize>> = vec![HashSet::new(); blocks.len()];
    let mut local_index: Vec<usize> = vec![0; graph_size];

    let mut bct = BlockCutTree {
        block_count: blocks.len(),
        cut_count: 0,
        blocks: Vec::with_capacity(blocks.len()),
        graph: UnGraph::new_undirected(),
        node_to_id: vec![0; graph_size],
        block_vertex_to_vertex: Vec::with_capacity(blocks.len()),
        edge_labels,
        preorder: preorder.clone(),
    };

    for (i, block) in blocks.iter().enumerate() {
        let mut block_graph = UnGraph::new_undirected();

        for &edge_idx in block {
            let (v, w) = graph
                .edge_endpoints(EdgeIndex::new(edge_idx))
                .expect("edge endpoints should exist");
            block_vertex_sets[i].extend([v.index(), w.index()]);
        }

        // linear sort keeps block-local indices aligned with input indices
        let mut block_vertices: Vec<usize> = block_vertex_sets[i].iter().copied().collect();
        radsort::sort(&mut block_vertices);

        let mut to_vertex = Vec::with_capacity(block_vertices.len());
        for u in block_vertices {
            let label = *graph.node_weight(NodeIndex::new(u)).unwrap();
            local_index[u] = block_graph.add_node(label).index();
            bct.node_to_id[u] = i;
            to_vertex.push(NodeIndex::new(u));
        }

        for &edge_idx in block {
            let (v, w) = graph
                .edge_endpoints(EdgeIndex::new(edge_idx))
                .expect("edge endpoints should exist");
            block_graph.add_edge(
                NodeIndex::new(local_index[v.index()]),
                NodeIndex::new(local_index[w.index()]),
                EdgeLabel::Real,
            );
        }

        bct.graph.add_node(i.try_into().unwrap());
        bct.blocks.push(block_graph);
        bct.block_vertex_to_vertex.push(to_vertex);
    }

    for u in graph.node_indices().map(|n| n.index()) {
        if is_cut[u] {
            bct.node_to_id[u] = bct
                .graph
                .add_node(*graph.node_weight(NodeIndex::new(u)).unwrap())
                .index();
            bct.cut_count += 1;
        }
    }

    for (i, vertex_set) in block_vertex_sets.iter().enumerate() {
        for &u in vertex_set {
            if is_cut[u] {
                bct.graph.add_edge(
                    bct.graph.from_index(i),
                    bct.graph.from_index(bct.node_to_id[u]),
                    EdgeLabel::Structure,
                );
            }
        }
    }

    bct
}

impl BlockCutTree {
    /// Block ids containing the given original vertex, in block order.
    pub fn blocks_of(&self, v: NodeIndex) -> Vec<usize> {
        let mut out = Vec::new();
        for (i, map) in self.block_vertex_to_vertex.iter().enumerate() {
            if map.contains(&v) {
                out.push(i);
            }
        }
        out
    }
}
