/// Error type shared by every stage of the view pipeline
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot normalize a vector of (near) zero length")]
    DegenerateVector,
    #[error("degenerate projection: {0}")]
    DegenerateProjection(String),
    #[error("cannot multiply a {}x{} matrix by a {}x{} matrix", left.0, left.1, right.0, right.1)]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    #[error("cannot multiply an empty matrix chain")]
    EmptyChain,
    #[error("line clipping did not converge within {0} iterations")]
    ClipIterationExceeded(usize),
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("invalid scene: {0}")]
    SceneFormat(String),
    #[error("malformed scene document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse STL: {0}")]
    Stl(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
