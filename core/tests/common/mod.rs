// Not every test binary exercises every helper
#![allow(dead_code)]

use fast_embeddings_model_core::tensor::{
    ATTENTION_MASK, INPUT_IDS, LAST_HIDDEN_STATE, SENTENCE_EMBEDDING, TOKEN_TYPE_IDS,
};
use fast_embeddings_model_core::{
    ModelDescriptor, ModelError, OutputTensors, Runtime, Session, TensorMap,
};
use ndarray::{Array2, Array3};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokenizers::models::wordlevel::WordLevel;
use tokenizers::Tokenizer;

/// Test vocabulary; the id of each word doubles as its fingerprint in
/// the fake embeddings below.
pub const WORDS: &[&str] = &["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];

/// Write a word level tokenizer into `dir` so workers can load it like
/// any downloaded model directory.
pub fn write_tokenizer(dir: &Path) {
    let mut vocab: HashMap<String, u32> = WORDS
        .iter()
        .enumerate()
        .map(|(id, word)| (word.to_string(), id as u32))
        .collect();
    vocab.insert("[UNK]".to_string(), WORDS.len() as u32);

    let model = WordLevel::builder()
        .vocab(vocab)
        .unk_token("[UNK]".to_string())
        .build()
        .unwrap();
    let tokenizer = Tokenizer::new(model);
    tokenizer.save(dir.join("tokenizer.json"), false).unwrap();
}

/// Fake inference runtime. Outputs are deterministic functions of the
/// input ids so tests can trace each embedding back to its text.
pub struct MockRuntime {
    /// Per-session artificial latency, assigned round robin at load time
    pub delays: Vec<u64>,
    /// Emit pooled `[batch, hidden]` output instead of token level output
    pub pooled: bool,
    /// Refuse any session load
    pub fail_load: bool,
    /// Error out when the sanitized input still carries token type ids,
    /// like a graph exported with two inputs would
    pub strict_inputs: bool,
    /// Fail any batch containing this id
    pub poison_id: Option<i64>,
    /// Emit this width instead of the descriptor's
    pub dimension_override: Option<usize>,
    next_session: AtomicUsize,
}

impl MockRuntime {
    pub fn pooled() -> Self {
        Self {
            delays: vec![0],
            pooled: true,
            fail_load: false,
            strict_inputs: false,
            poison_id: None,
            dimension_override: None,
            next_session: AtomicUsize::new(0),
        }
    }

    pub fn token_level() -> Self {
        Self {
            pooled: false,
            ..Self::pooled()
        }
    }
}

impl Runtime for MockRuntime {
    fn load(
        &self,
        descriptor: &ModelDescriptor,
        _cache_dir: &Path,
        intra_threads: usize,
    ) -> Result<Box<dyn Session>, ModelError> {
        assert_eq!(intra_threads, 1, "workers must load single threaded sessions");

        if self.fail_load {
            return Err(ModelError::Initialization(
                "mock runtime refused to load".to_string(),
            ));
        }

        let index = self.next_session.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MockSession {
            hidden: self
                .dimension_override
                .unwrap_or(descriptor.dimension),
            delay: Duration::from_millis(self.delays[index % self.delays.len()]),
            pooled: self.pooled,
            strict_inputs: self.strict_inputs,
            poison_id: self.poison_id,
        }))
    }
}

struct MockSession {
    hidden: usize,
    delay: Duration,
    pooled: bool,
    strict_inputs: bool,
    poison_id: Option<i64>,
}

impl Session for MockSession {
    fn run(&mut self, inputs: TensorMap) -> Result<OutputTensors, ModelError> {
        if self.strict_inputs && inputs.contains(TOKEN_TYPE_IDS) {
            return Err(ModelError::Runtime(
                "unexpected input: token_type_ids".to_string(),
            ));
        }

        let input_ids = inputs.require2(INPUT_IDS)?.to_owned();
        let attention_mask = inputs.require2(ATTENTION_MASK)?.to_owned();

        if let Some(poison) = self.poison_id {
            if input_ids.iter().any(|&id| id == poison) {
                return Err(ModelError::Runtime("mock inference failure".to_string()));
            }
        }

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let (batch, seq) = input_ids.dim();
        let mut tensors = OutputTensors::new();
        if self.pooled {
            // Every column of a row carries the masked sum of its ids
            let sums: Vec<f32> = (0..batch)
                .map(|i| {
                    (0..seq)
                        .map(|j| (input_ids[[i, j]] * attention_mask[[i, j]]) as f32)
                        .sum()
                })
                .collect();
            let output = Array2::from_shape_fn((batch, self.hidden), |(i, _)| sums[i]);
            tensors.insert(SENTENCE_EMBEDDING.to_string(), output.into_dyn());
        } else {
            // Token level: component k of token j is `id + k`
            let output = Array3::from_shape_fn((batch, seq, self.hidden), |(i, j, k)| {
                input_ids[[i, j]] as f32 + k as f32
            });
            tensors.insert(LAST_HIDDEN_STATE.to_string(), output.into_dyn());
        }

        Ok(tensors)
    }
}
