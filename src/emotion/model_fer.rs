use std::path::Path;
use std::sync::Arc;

use ndarray::{CowArray, IxDyn};
use ort::tensor::OrtOwnedTensor;
use ort::{Environment, ExecutionProvider, GraphOptimizationLevel, Session, SessionBuilder, Value};
use tracing::info;

use crate::emotion::{EmotionClassifier, EmotionPrediction};
use crate::error::{ClassifyError, StartupError};
use crate::face::NormalizedFace;

/// FER-2013 style classifier: 48x48 grayscale in, seven emotion scores out.
///
/// The session is built once and only read afterwards, so `classify` takes
/// `&self`.
pub struct FerEmotionModel {
    _environment: Arc<Environment>,
    session: Session,
}

impl FerEmotionModel {
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        if !path.is_file() {
            return Err(StartupError::ModelNotFound(path.to_path_buf()));
        }

        let load_error = |e: ort::OrtError| StartupError::ModelLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let environment = Environment::builder()
            .with_name("emotion-monitor")
            .with_execution_providers([ExecutionProvider::CPU(Default::default())])
            .build()
            .map_err(load_error)?
            .into_arc();

        let session = SessionBuilder::new(&environment)
            .map_err(load_error)?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(load_error)?
            .with_intra_threads(1)
            .map_err(load_error)?
            .with_model_from_file(path)
            .map_err(load_error)?;

        info!("Loaded emotion model {}", path.display());

        Ok(Self {
            _environment: environment,
            session,
        })
    }
}

impl EmotionClassifier for FerEmotionModel {
    fn classify(&self, face: &NormalizedFace) -> Result<EmotionPrediction, ClassifyError> {
        let array: CowArray<f32, IxDyn> = face.to_nhwc()?.into_dyn().into();

        let inputs = vec![Value::from_array(self.session.allocator(), &array)?];
        let outputs: Vec<Value> = self.session.run(inputs)?;

        let output = outputs.first().ok_or(ClassifyError::MissingOutput)?;
        let scores: OrtOwnedTensor<f32, _> = output.try_extract()?;
        let scores: Vec<f32> = scores.view().iter().copied().collect();

        EmotionPrediction::from_scores(&scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_model_is_fatal() {
        let result = FerEmotionModel::load(Path::new("/nonexistent/fer.onnx"));
        assert!(matches!(result, Err(StartupError::ModelNotFound(_))));
    }

    #[test]
    fn test_garbage_model_is_fatal() {
        let mut file = tempfile::Builder::new().suffix(".onnx").tempfile().unwrap();
        file.write_all(b"definitely not a protobuf").unwrap();

        let result = FerEmotionModel::load(file.path());
        assert!(matches!(result, Err(StartupError::ModelLoad { .. })));
    }
}
