use thiserror::Error;

/// Errors reported at the API boundaries of the crate.
///
/// Algorithmic absence ("no constrained planar embedding exists") is *not* an
/// error; `embed_ec` reports it as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A constraint tree's leaf set disagrees with the constrained vertex's
    /// neighbour set.
    #[error("invalid constraint at vertex {vertex}: {reason}")]
    InvalidConstraint { vertex: u32, reason: String },

    /// A gadget's ports are not on its boundary, not in clockwise order,
    /// duplicated, or too close together for the required wires and barriers.
    #[error("invalid gadget: {0}")]
    InvalidGadget(String),

    /// Inputs to the layout stage are internally inconsistent. The production
    /// path never produces these by construction; the testing verifier does.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

/// Result type alias for ec_planarity operations.
pub type Result<T> = std::result::Result<T, LayoutError>;
