use crate::ModelError;
use ndarray::{Array2, ArrayD, ArrayView2, ArrayView3, Ix2, Ix3};
use std::collections::HashMap;

pub const INPUT_IDS: &str = "input_ids";
pub const ATTENTION_MASK: &str = "attention_mask";
pub const TOKEN_TYPE_IDS: &str = "token_type_ids";

pub const LAST_HIDDEN_STATE: &str = "last_hidden_state";
pub const TOKEN_EMBEDDINGS: &str = "token_embeddings";
pub const SENTENCE_EMBEDDING: &str = "sentence_embedding";
pub const TEXT_EMBEDS: &str = "text_embeds";

// NOTE: exporters are not consistent about output naming, hence the
// lookup precedence
const TOKEN_LEVEL_KEYS: &[&str] = &[LAST_HIDDEN_STATE, TOKEN_EMBEDDINGS];
const POOLED_KEYS: &[&str] = &[SENTENCE_EMBEDDING, TEXT_EMBEDS];

/// Named integer input tensors, the interchange format between the
/// tokenizer, the pipeline and the inference runtime.
#[derive(Debug, Clone, Default)]
pub struct TensorMap {
    tensors: HashMap<String, ArrayD<i64>>,
}

impl TensorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: ArrayD<i64>) {
        self.tensors.insert(name.into(), tensor);
    }

    /// Removing an absent name is a no-op.
    pub fn remove(&mut self, name: &str) -> Option<ArrayD<i64>> {
        self.tensors.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ArrayD<i64>> {
        self.tensors.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn require(&self, name: &str) -> Result<&ArrayD<i64>, ModelError> {
        self.tensors
            .get(name)
            .ok_or_else(|| ModelError::ShapeMismatch(format!("missing input tensor `{name}`")))
    }

    pub fn require2(&self, name: &str) -> Result<ArrayView2<i64>, ModelError> {
        self.require(name)?
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| {
                ModelError::ShapeMismatch(format!("input tensor `{name}` must have rank 2"))
            })
    }
}

impl IntoIterator for TensorMap {
    type Item = (String, ArrayD<i64>);
    type IntoIter = std::collections::hash_map::IntoIter<String, ArrayD<i64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tensors.into_iter()
    }
}

/// Named output tensors produced by one inference call.
pub type OutputTensors = HashMap<String, ArrayD<f32>>;

/// Runtime output for one batch, plus the attention mask that applies
/// to it. The mask is the one echoed by the runtime when it produces
/// one, otherwise the mask that was fed in; variants cannot tell the
/// difference.
#[derive(Debug, Clone)]
pub struct RawOutput {
    tensors: OutputTensors,
    attention_mask: Array2<i64>,
}

impl RawOutput {
    pub fn new(tensors: OutputTensors, attention_mask: Array2<i64>) -> Self {
        Self {
            tensors,
            attention_mask,
        }
    }

    pub fn attention_mask(&self) -> ArrayView2<i64> {
        self.attention_mask.view()
    }

    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.tensors.get(name)
    }

    /// Token level embeddings `[batch, seq, hidden]`.
    pub fn token_embeddings(&self) -> Result<ArrayView3<f32>, ModelError> {
        for key in TOKEN_LEVEL_KEYS {
            if let Some(tensor) = self.tensors.get(*key) {
                return tensor.view().into_dimensionality::<Ix3>().map_err(|_| {
                    ModelError::ShapeMismatch(format!("output tensor `{key}` must have rank 3"))
                });
            }
        }
        Err(self.unknown_keys())
    }

    /// Embeddings the runtime already reduced to `[batch, hidden]`.
    pub fn pooled(&self) -> Result<ArrayView2<f32>, ModelError> {
        for key in POOLED_KEYS {
            if let Some(tensor) = self.tensors.get(*key) {
                return as_rank2(key, tensor);
            }
        }
        // A single rank 2 output is unambiguous whatever its name
        if self.tensors.len() == 1 {
            if let Some((name, tensor)) = self.tensors.iter().next() {
                if tensor.ndim() == 2 {
                    return as_rank2(name, tensor);
                }
            }
        }
        Err(self.unknown_keys())
    }

    fn unknown_keys(&self) -> ModelError {
        let mut names: Vec<&str> = self.tensors.keys().map(String::as_str).collect();
        names.sort_unstable();
        ModelError::ShapeMismatch(format!("unknown output keys: {names:?}"))
    }
}

fn as_rank2<'a>(name: &str, tensor: &'a ArrayD<f32>) -> Result<ArrayView2<'a, f32>, ModelError> {
    tensor.view().into_dimensionality::<Ix2>().map_err(|_| {
        ModelError::ShapeMismatch(format!("output tensor `{name}` must have rank 2"))
    })
}
