//! ONNX Runtime backend for [`SsdModel`].

use std::path::Path;

use follow_types::FollowError;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::{Tensor, Value};
use tracing::info;

use crate::model::SsdModel;

/// An SSD network loaded into an ONNX Runtime session on the CPU.
pub struct OnnxSsdModel {
    session: Session,
    input_width: u32,
    input_height: u32,
}

impl OnnxSsdModel {
    /// Load the model at `path`.  The network is fed `input_width ×
    /// input_height` images.
    pub fn open(path: &Path, input_width: u32, input_height: u32) -> Result<Self, FollowError> {
        let session = Session::builder()
            .map_err(|e| load_failed("failed to create session builder", path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_failed("failed to set optimization level", path, e))?
            .commit_from_file(path)
            .map_err(|e| load_failed("failed to load ONNX model", path, e))?;
        info!(
            model = %path.display(),
            input_width,
            input_height,
            "SSD model loaded"
        );
        Ok(Self {
            session,
            input_width,
            input_height,
        })
    }
}

fn load_failed(stage: &str, path: &Path, e: impl std::fmt::Display) -> FollowError {
    FollowError::DetectorFailed(format!("{stage} ({}): {e}", path.display()))
}

impl SsdModel for OnnxSsdModel {
    fn input_size(&self) -> (u32, u32) {
        (self.input_width, self.input_height)
    }

    fn infer(&mut self, input: Vec<f32>) -> Result<Vec<f32>, FollowError> {
        let shape = vec![
            1usize,
            3,
            self.input_height as usize,
            self.input_width as usize,
        ];
        let input = Tensor::from_array((shape, input.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| FollowError::DetectorFailed(format!("failed to create tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| FollowError::DetectorFailed(format!("ONNX inference failed: {e}")))?;
        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| FollowError::DetectorFailed(format!("failed to extract tensor: {e}")))?;
        Ok(data.to_vec())
    }
}
