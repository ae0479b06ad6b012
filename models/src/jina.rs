use fast_embeddings_model_core::{
    l2_normalize, masked_mean_pool, EmbeddingVariant, ModelDescriptor, ModelError, RawOutput,
};
use ndarray::Array2;

/// Jina v2 family. The runtime returns token level embeddings; pooling
/// over the attention mask and L2 normalization happen here.
#[derive(Debug, Clone, Copy)]
pub struct JinaVariant;

static JINA_MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        name: "jinaai/jina-embeddings-v2-base-en",
        dimension: 768,
        size_mb: 550,
        source: "https://huggingface.co/jinaai/jina-embeddings-v2-base-en",
        description: "English model with an 8192 token context window",
    },
    ModelDescriptor {
        name: "jinaai/jina-embeddings-v2-small-en",
        dimension: 512,
        size_mb: 130,
        source: "https://huggingface.co/jinaai/jina-embeddings-v2-small-en",
        description: "Small English model with an 8192 token context window",
    },
];

impl EmbeddingVariant for JinaVariant {
    fn name(&self) -> &'static str {
        "jina"
    }

    fn supported_models(&self) -> &'static [ModelDescriptor] {
        JINA_MODELS
    }

    fn reduce_output(&self, output: &RawOutput) -> Result<Array2<f32>, ModelError> {
        let pooled = masked_mean_pool(output.token_embeddings()?, output.attention_mask())?;
        Ok(l2_normalize(pooled))
    }
}
