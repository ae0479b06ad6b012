use fast_embeddings_model_core::{
    ModelDescriptor, ModelError, OutputTensors, Runtime, Session, TensorMap,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session as OrtInner, SessionInputValue};
use std::borrow::Cow;
use std::path::Path;

/// ONNX Runtime implementation of the runtime seam.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrtRuntime;

pub struct OrtSession {
    session: OrtInner,
    output_names: Vec<String>,
}

impl Runtime for OrtRuntime {
    fn load(
        &self,
        descriptor: &ModelDescriptor,
        cache_dir: &Path,
        intra_threads: usize,
    ) -> Result<Box<dyn Session>, ModelError> {
        let onnx_path = {
            let default_path = cache_dir.join("model.onnx");
            match default_path.exists() {
                true => default_path,
                false => cache_dir.join("onnx/model.onnx"),
            }
        };
        if !onnx_path.exists() {
            return Err(ModelError::Initialization(format!(
                "no ONNX weights for {} at {:?}",
                descriptor.name, onnx_path
            )));
        }

        let session = OrtInner::builder()
            .s()?
            .with_intra_threads(intra_threads)
            .s()?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .s()?
            .commit_from_file(onnx_path)
            .s()?;

        let output_names = session
            .outputs
            .iter()
            .map(|output| output.name.clone())
            .collect();
        tracing::info!("Loaded ONNX session for {}", descriptor.name);

        Ok(Box::new(OrtSession {
            session,
            output_names,
        }))
    }
}

impl Session for OrtSession {
    fn run(&mut self, inputs: TensorMap) -> Result<OutputTensors, ModelError> {
        let mut ort_inputs: Vec<(Cow<'_, str>, SessionInputValue<'_>)> =
            Vec::with_capacity(inputs.len());
        for (name, tensor) in inputs {
            let value = ort::value::Tensor::from_array(tensor).e()?;
            ort_inputs.push((name.into(), value.into()));
        }

        let outputs = self.session.run(ort_inputs).e()?;

        let mut tensors = OutputTensors::with_capacity(self.output_names.len());
        for name in &self.output_names {
            if let Some(value) = outputs.get(name.as_str()) {
                // Non-float outputs (echoed masks and the like) are skipped;
                // variants take the mask from the pipeline instead
                if let Ok(array) = value.try_extract_array::<f32>() {
                    tensors.insert(name.clone(), array.to_owned());
                }
            }
        }

        Ok(tensors)
    }
}

trait WrapErr<O> {
    fn s(self) -> Result<O, ModelError>;
    fn e(self) -> Result<O, ModelError>;
}

impl<O> WrapErr<O> for Result<O, ort::Error> {
    fn s(self) -> Result<O, ModelError> {
        self.map_err(|err| ModelError::Initialization(err.to_string()))
    }
    fn e(self) -> Result<O, ModelError> {
        self.map_err(|err| ModelError::Runtime(err.to_string()))
    }
}
