use crate::worker::Worker;
use crate::EmbeddingsError;
use fast_embeddings_model_core::{Embedding, Runtime};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{instrument, Span};

/// Default number of texts handed to a worker per request.
pub const DEFAULT_BATCH_SIZE: usize = 256;

struct WorkerRequest {
    texts: Vec<String>,
    response_tx: oneshot::Sender<Result<Vec<Embedding>, EmbeddingsError>>,
    span: Span,
}

/// Distributes batches across a fixed set of workers, each owning one
/// model instance on a dedicated thread, and reassembles results in
/// submission order.
#[derive(Debug, Clone)]
pub struct EmbeddingPool {
    /// Channel to communicate with the background worker threads
    sender: async_channel::Sender<WorkerRequest>,
    batch_size: usize,
}

impl EmbeddingPool {
    /// Start `workers` workers for `model_name`.
    ///
    /// Every model instance is loaded eagerly on the calling thread so a
    /// broken setup surfaces here, not inside a detached thread. The
    /// first worker that cannot initialize aborts construction.
    pub fn new(
        model_name: &str,
        cache_dir: &Path,
        runtime: Arc<dyn Runtime>,
        workers: Option<usize>,
        batch_size: Option<usize>,
    ) -> Result<Self, EmbeddingsError> {
        let workers = workers.unwrap_or_else(num_cpus::get).max(1);
        let batch_size = batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1);
        tracing::info!("Starting {workers} embedding workers for {model_name}");

        let (sender, receiver) = async_channel::bounded(workers * 4);

        let mut loaded = Vec::with_capacity(workers);
        for _ in 0..workers {
            loaded.push(Worker::new(model_name, cache_dir, runtime.as_ref())?);
        }

        for worker in loaded {
            let receiver_clone = receiver.clone();
            // Spawn worker
            std::thread::spawn(move || worker_loop(worker, receiver_clone));
        }

        Ok(Self { sender, batch_size })
    }

    /// Number of texts per dispatched batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed `texts`. Output order matches input order across however
    /// many batches and workers the call spans, whatever order the
    /// workers finish in.
    #[instrument(skip_all)]
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Embedding>, EmbeddingsError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let counter = metrics::counter!("fe_embed_count");
        counter.increment(1);

        let total = texts.len();
        let mut pending = Vec::with_capacity(total.div_ceil(self.batch_size));
        let mut texts = texts.into_iter();

        loop {
            let chunk: Vec<String> = texts.by_ref().take(self.batch_size).collect();
            if chunk.is_empty() {
                break;
            }

            let (response_tx, response_rx) = oneshot::channel();
            // Unwrap is safe here
            self.sender
                .send(WorkerRequest {
                    texts: chunk,
                    response_tx,
                    span: Span::current(),
                })
                .await
                .expect("Embedding workers dropped the receiver. This is a bug.");
            pending.push(response_rx);
        }

        // Await responses in submission order: reassembly is by original
        // index, not completion order
        let mut results = Vec::with_capacity(total);
        for response_rx in pending {
            let embeddings = response_rx
                .await
                .expect(
                    "Embedding worker dropped the sender without sending a response. This is a bug.",
                )
                .map_err(|err| {
                    let counter = metrics::counter!("fe_request_failure", "err" => "inference");
                    counter.increment(1);
                    tracing::error!("{err}");
                    err
                })?;
            results.extend(embeddings);
        }

        let counter = metrics::counter!("fe_embed_success");
        counter.increment(1);
        let histogram = metrics::histogram!("fe_embed_duration");
        histogram.record(start.elapsed().as_secs_f64());
        let histogram = metrics::histogram!("fe_embed_batch_size");
        histogram.record(total as f64);

        Ok(results)
    }
}

fn worker_loop(mut worker: Worker, receiver: async_channel::Receiver<WorkerRequest>) {
    // Loop over requests; the loop ends when every pool handle is dropped
    while let Ok(request) = receiver.recv_blocking() {
        request.span.in_scope(|| {
            if !request.response_tx.is_closed() {
                // It's possible that the caller dropped its request resulting
                // in a send error. We just discard the error
                let _ = request.response_tx.send(worker.embed(&request.texts));
            }
        });
    }
}
