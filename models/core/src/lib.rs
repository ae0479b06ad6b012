pub mod descriptor;
pub mod pooling;
pub mod runtime;
pub mod tensor;
pub mod variant;

use thiserror::Error;

pub use descriptor::ModelDescriptor;
pub use pooling::{l2_normalize, masked_mean_pool};
pub use runtime::{Runtime, Session};
pub use tensor::{OutputTensors, RawOutput, TensorMap};
pub use variant::EmbeddingVariant;

/// A single fixed-size embedding vector.
pub type Embedding = Vec<f32>;

#[derive(Debug, Error, Clone)]
pub enum ModelError {
    #[error("Model is not supported: {0}")]
    Config(String),
    #[error("Could not initialize model: {0}")]
    Initialization(String),
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("{0}")]
    Runtime(String),
}
