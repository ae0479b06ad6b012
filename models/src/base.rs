use fast_embeddings_model_core::{EmbeddingVariant, ModelDescriptor};

/// Models whose exported graph already returns one pooled vector per
/// input, so the pipeline defaults (identity sanitization, pooled
/// passthrough) apply unchanged.
#[derive(Debug, Clone, Copy)]
pub struct BaseVariant;

static BASE_MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        name: "BAAI/bge-small-en-v1.5",
        dimension: 384,
        size_mb: 130,
        source: "https://huggingface.co/BAAI/bge-small-en-v1.5",
        description: "Fast English embedding model",
    },
    ModelDescriptor {
        name: "BAAI/bge-base-en-v1.5",
        dimension: 768,
        size_mb: 420,
        source: "https://huggingface.co/BAAI/bge-base-en-v1.5",
        description: "Base English embedding model",
    },
    ModelDescriptor {
        name: "sentence-transformers/all-MiniLM-L6-v2",
        dimension: 384,
        size_mb: 90,
        source: "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2",
        description: "Sentence transformer, 6 layer MiniLM",
    },
];

impl EmbeddingVariant for BaseVariant {
    fn name(&self) -> &'static str {
        "base"
    }

    fn supported_models(&self) -> &'static [ModelDescriptor] {
        BASE_MODELS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fast_embeddings_model_core::tensor::{ATTENTION_MASK, INPUT_IDS, SENTENCE_EMBEDDING};
    use fast_embeddings_model_core::{OutputTensors, RawOutput, TensorMap};
    use ndarray::arr2;

    #[test]
    fn sanitization_is_the_identity_and_idempotent() {
        let mut input = TensorMap::new();
        input.insert(INPUT_IDS, arr2(&[[1_i64, 2]]).into_dyn());
        input.insert(ATTENTION_MASK, arr2(&[[1_i64, 1]]).into_dyn());

        let once = BaseVariant.sanitize_input(input).unwrap();
        assert_eq!(once.len(), 2);
        let twice = BaseVariant.sanitize_input(once.clone()).unwrap();

        assert_eq!(once.len(), twice.len());
        assert!(twice.contains(INPUT_IDS));
        assert!(twice.contains(ATTENTION_MASK));
    }

    #[test]
    fn reduction_passes_pooled_output_through() {
        let mut tensors = OutputTensors::new();
        tensors.insert(
            SENTENCE_EMBEDDING.to_string(),
            arr2(&[[1.0_f32, 2.0], [3.0, 4.0]]).into_dyn(),
        );
        let output = RawOutput::new(tensors, arr2(&[[1_i64], [1]]));

        let reduced = BaseVariant.reduce_output(&output).unwrap();

        assert_eq!(reduced, arr2(&[[1.0, 2.0], [3.0, 4.0]]));
    }
}
