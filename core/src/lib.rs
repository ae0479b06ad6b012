pub mod pool;
pub mod worker;

use fast_embeddings_model_core::ModelError;
use thiserror::Error;

pub use fast_embeddings_model_core::Embedding;
pub use pool::EmbeddingPool;
pub use worker::Worker;

#[derive(Error, Debug)]
pub enum EmbeddingsError {
    #[error("tokenizer error {0}")]
    Tokenizer(#[from] tokenizers::Error),
    #[error("Input validation error: {0}")]
    Validation(String),
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}
