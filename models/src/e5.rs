use fast_embeddings_model_core::tensor::TOKEN_TYPE_IDS;
use fast_embeddings_model_core::{EmbeddingVariant, ModelDescriptor, ModelError, TensorMap};

/// Multilingual E5 family. The exported graph only takes `input_ids`
/// and `attention_mask`; the token type tensor must never reach the
/// runtime.
#[derive(Debug, Clone, Copy)]
pub struct E5Variant;

static E5_MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        name: "intfloat/multilingual-e5-large",
        dimension: 1024,
        size_mb: 2240,
        source: "https://huggingface.co/intfloat/multilingual-e5-large",
        description: "Multilingual model for 100+ languages",
    },
    ModelDescriptor {
        name: "intfloat/multilingual-e5-base",
        dimension: 768,
        size_mb: 1110,
        source: "https://huggingface.co/intfloat/multilingual-e5-base",
        description: "Base sized multilingual model",
    },
];

impl EmbeddingVariant for E5Variant {
    fn name(&self) -> &'static str {
        "e5"
    }

    fn supported_models(&self) -> &'static [ModelDescriptor] {
        E5_MODELS
    }

    fn sanitize_input(&self, mut input: TensorMap) -> Result<TensorMap, ModelError> {
        // Removing an absent name is a no-op
        input.remove(TOKEN_TYPE_IDS);
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fast_embeddings_model_core::tensor::{ATTENTION_MASK, INPUT_IDS};
    use ndarray::arr2;

    fn tokenizer_output() -> TensorMap {
        let mut input = TensorMap::new();
        input.insert(INPUT_IDS, arr2(&[[1_i64, 2]]).into_dyn());
        input.insert(ATTENTION_MASK, arr2(&[[1_i64, 1]]).into_dyn());
        input
    }

    #[test]
    fn drops_the_token_type_tensor() {
        let mut input = tokenizer_output();
        input.insert(TOKEN_TYPE_IDS, arr2(&[[0_i64, 0]]).into_dyn());

        let sanitized = E5Variant.sanitize_input(input).unwrap();

        assert!(!sanitized.contains(TOKEN_TYPE_IDS));
        assert!(sanitized.contains(INPUT_IDS));
        assert!(sanitized.contains(ATTENTION_MASK));
    }

    #[test]
    fn dropping_an_absent_tensor_is_a_no_op() {
        let sanitized = E5Variant.sanitize_input(tokenizer_output()).unwrap();

        assert_eq!(sanitized.len(), 2);
        assert!(!sanitized.contains(TOKEN_TYPE_IDS));
    }

    #[test]
    fn sanitization_is_idempotent() {
        let mut input = tokenizer_output();
        input.insert(TOKEN_TYPE_IDS, arr2(&[[0_i64, 0]]).into_dyn());

        let once = E5Variant.sanitize_input(input).unwrap();
        let names_once: Vec<String> = {
            let mut names: Vec<String> = once.names().map(str::to_string).collect();
            names.sort();
            names
        };
        let twice = E5Variant.sanitize_input(once).unwrap();
        let names_twice: Vec<String> = {
            let mut names: Vec<String> = twice.names().map(str::to_string).collect();
            names.sort();
            names
        };

        assert_eq!(names_once, names_twice);
    }
}
