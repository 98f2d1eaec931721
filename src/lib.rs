#![warn(missing_docs)]

//! # ec_planarity
//!
//! A Rust library for planar embeddings of simple graphs under per-vertex
//! rotational embedding constraints, crossing insertion via shortest paths in
//! the dual of a partial embedding, and rectilinear gadget layouts driving a
//! 3-SAT-to-planar-motion reduction.
//!
//! Based on [`petgraph`](https://docs.rs/petgraph).

pub mod block_cut;
pub mod constraint;
pub mod contraction;
pub mod crossings;
pub mod dual_graph;
pub mod ec_embedding;
pub mod embedding;
pub(crate) mod embedding_blocks;
pub mod error;
pub mod expansion;
pub mod gadget;
pub mod gadget_layout;
pub mod half_edge;
pub mod single_layout;
pub mod skeleton_embedding;
pub mod spqr_tree;
pub mod testing;
pub mod three_sat;
pub mod triconnected;
pub mod triconnected_blocks;
pub mod types;
pub mod visibility;

pub use constraint::{ConstraintKind, ConstraintMap, ConstraintTree};
pub use crossings::{embed_ec_with_crossings, Crossing, PlanarEmbeddingWithCrossings};
pub use ec_embedding::embed_ec;
pub use embedding::PlanarEmbedding;
pub use error::{LayoutError, Result};
pub use gadget_layout::layout_gadgets;
pub use three_sat::layout_3sat;
pub use types::DFSEdgeLabel;
pub use types::EdgeLabel;
pub use types::UnGraph;
