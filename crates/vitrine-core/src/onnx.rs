//! ONNX Runtime session loading shared by every model wrapper.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use ndarray::Array4;
use ort::session::Session;
use ort::value::{Tensor, Value};

use crate::error::PipelineError;

/// A loaded session plus the tensor names it declares.
///
/// `Session::run` takes `&mut self`, so the session sits behind a `Mutex`.
pub(crate) struct OnnxSession {
    session: Mutex<Session>,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl OnnxSession {
    /// Open `path`; `role` names the model in error messages.
    pub fn open(path: &Path, role: &str) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::Model {
                message: format!("{role} model not found at {:?}", path),
            });
        }

        let session = Session::builder()
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(path)
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to load {role} model {:?}: {e}", path),
            })?;

        let inputs: Vec<String> = session.inputs().iter().map(|i| i.name().to_string()).collect();
        let outputs: Vec<String> = session.outputs().iter().map(|o| o.name().to_string()).collect();
        tracing::debug!("Opened {role} model {:?} (inputs: {:?}, outputs: {:?})", path, inputs, outputs);

        Ok(Self {
            session: Mutex::new(session),
            inputs,
            outputs,
        })
    }

    /// Name of the first declared input, or `fallback` when none is declared.
    pub fn first_input(&self, fallback: &str) -> String {
        self.inputs
            .first()
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|i| i == name)
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|o| o == name)
    }

    /// Exclusive access for one `run`. A poisoned lock is reported, not propagated as a panic.
    pub fn lock(&self) -> Result<MutexGuard<'_, Session>, String> {
        self.session
            .lock()
            .map_err(|e| format!("Session lock poisoned: {e}"))
    }
}

/// Copy an NCHW array into an owned input tensor.
pub(crate) fn image_tensor(array: &Array4<f32>) -> ort::Result<Tensor<f32>> {
    let shape: Vec<i64> = array.shape().iter().map(|&d| d as i64).collect();
    Value::from_array((shape, array.iter().copied().collect::<Vec<f32>>()))
}
