//! Emotion classifier provider backed by a facial-expression ONNX model.
//!
//! The model contract: grayscale face crop in, one score per emotion category
//! out, in the canonical category order. Models exported with a built-in
//! detector signal "no face" with an all-zero output vector.

#[cfg(feature = "onnx")]
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use std::path::PathBuf;
use thiserror::Error;

use crate::frame::Frame;
use crate::types::EmotionScores;
#[cfg(feature = "onnx")]
use crate::types::{Emotion, EMOTION_COUNT};

/// Errors that can occur during emotion classification
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Failed to load model: {0}")]
    ModelLoadError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Feature not enabled")]
    FeatureNotEnabled,
}

/// A collaborator that scores one frame at a time.
///
/// `Ok(None)` from [`analyze`](EmotionClassifier::analyze) means no face was
/// found; that is a normal outcome, not an error.
pub trait EmotionClassifier: Send {
    /// Load weights and run a throwaway inference so the first real frame
    /// does not pay the startup cost. Failure here is fatal to the session.
    fn warmup(&mut self) -> Result<(), ClassifierError>;

    /// Score one frame. The returned vector is raw: non-negative, but not
    /// necessarily summing to 1.
    fn analyze(&mut self, frame: &Frame) -> Result<Option<EmotionScores>, ClassifierError>;
}

/// Configuration for the ONNX classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Path to the emotion ONNX model
    pub model_path: PathBuf,
    /// Number of threads for ONNX inference
    pub n_threads: usize,
    /// Side length the face crop is resized to before inference
    pub input_size: u32,
    /// Minimum total output mass below which the frame counts as "no face"
    pub min_face_mass: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            n_threads: 1,
            input_size: 64,
            min_face_mass: 1e-3,
        }
    }
}

/// Emotion classifier running a local ONNX model
#[cfg(feature = "onnx")]
pub struct OnnxEmotionClassifier {
    session: Session,
    config: ClassifierConfig,
}

#[cfg(feature = "onnx")]
impl OnnxEmotionClassifier {
    /// Create a new classifier from a model file
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        if !config.model_path.exists() {
            return Err(ClassifierError::ModelLoadError(format!(
                "Model not found at {:?}",
                config.model_path
            )));
        }

        let session = Session::builder()
            .map_err(|e| ClassifierError::ModelLoadError(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifierError::ModelLoadError(e.to_string()))?
            .with_intra_threads(config.n_threads)
            .map_err(|e| ClassifierError::ModelLoadError(e.to_string()))?
            .commit_from_file(&config.model_path)
            .map_err(|e| ClassifierError::ModelLoadError(e.to_string()))?;

        tracing::info!(
            "Emotion classifier initialized with model: {:?}",
            config.model_path
        );

        Ok(Self { session, config })
    }

    /// Resize to the model input and normalize pixels to [0, 1] grayscale.
    fn preprocess(&self, frame: &Frame) -> Vec<f32> {
        let size = self.config.input_size;
        let resized = image::imageops::resize(
            &frame.image,
            size,
            size,
            image::imageops::FilterType::Triangle,
        );
        let gray = image::imageops::grayscale(&resized);
        gray.pixels().map(|p| p.0[0] as f32 / 255.0).collect()
    }

    fn run_inference(&mut self, pixels: Vec<f32>) -> Result<Vec<f32>, ClassifierError> {
        let size = self.config.input_size as usize;
        let input_shape = [1_usize, 1, size, size];

        let input_tensor = Value::from_array((input_shape, pixels))
            .map_err(|e| ClassifierError::InferenceError(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ClassifierError::InferenceError(e.to_string()))?;

        let output = outputs.iter().next().ok_or_else(|| {
            ClassifierError::InferenceError("No output from model".to_string())
        })?;

        let output_tensor = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::InferenceError(e.to_string()))?;

        Ok(output_tensor.1.iter().copied().collect())
    }
}

#[cfg(feature = "onnx")]
impl EmotionClassifier for OnnxEmotionClassifier {
    fn warmup(&mut self) -> Result<(), ClassifierError> {
        let size = self.config.input_size as usize;
        let blank = vec![0.0f32; size * size];
        self.run_inference(blank)?;
        tracing::info!("Emotion classifier warmup complete");
        Ok(())
    }

    fn analyze(&mut self, frame: &Frame) -> Result<Option<EmotionScores>, ClassifierError> {
        if frame.image.width() == 0 || frame.image.height() == 0 {
            return Err(ClassifierError::InvalidInput("empty frame".to_string()));
        }

        let pixels = self.preprocess(frame);
        let values = self.run_inference(pixels)?;

        if values.len() < EMOTION_COUNT {
            tracing::warn!(
                "Unexpected output shape from emotion model: {} values",
                values.len()
            );
            return Ok(None);
        }

        let mut scores = EmotionScores::default();
        for (emotion, value) in Emotion::ALL.iter().zip(values.iter()) {
            scores.set(*emotion, value.max(0.0));
        }

        if scores.sum() < self.config.min_face_mass {
            tracing::debug!("No face in frame (output mass {:.4})", scores.sum());
            return Ok(None);
        }

        Ok(Some(scores))
    }
}

// Stub implementation when the feature is not enabled
#[cfg(not(feature = "onnx"))]
pub struct OnnxEmotionClassifier;

#[cfg(not(feature = "onnx"))]
impl OnnxEmotionClassifier {
    pub fn new(_config: ClassifierConfig) -> Result<Self, ClassifierError> {
        Err(ClassifierError::FeatureNotEnabled)
    }
}

#[cfg(not(feature = "onnx"))]
impl EmotionClassifier for OnnxEmotionClassifier {
    fn warmup(&mut self) -> Result<(), ClassifierError> {
        Err(ClassifierError::FeatureNotEnabled)
    }

    fn analyze(&mut self, _frame: &Frame) -> Result<Option<EmotionScores>, ClassifierError> {
        Err(ClassifierError::FeatureNotEnabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClassifierConfig::default();
        assert_eq!(config.n_threads, 1);
        assert_eq!(config.input_size, 64);
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_missing_model_is_load_error() {
        let config = ClassifierConfig {
            model_path: PathBuf::from("/nonexistent/emotion.onnx"),
            ..Default::default()
        };
        let result = OnnxEmotionClassifier::new(config);
        assert!(matches!(result, Err(ClassifierError::ModelLoadError(_))));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_stub_provider() {
        let result = OnnxEmotionClassifier::new(ClassifierConfig::default());
        assert!(matches!(result, Err(ClassifierError::FeatureNotEnabled)));
    }
}
