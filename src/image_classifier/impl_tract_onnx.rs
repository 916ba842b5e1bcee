use crate::frame::Frame;
use crate::image_classifier::interface::{
    sort_by_confidence, Classification, ClassifyError, ImageClassifier,
};
use crate::image_classifier::tract::image::frame_to_tensor;
use std::path::Path;
use tract_onnx::prelude::*;

use super::models::model_config::ModelConfig;

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model file {0} does not exist")]
    MissingModel(String),
    #[error("could not read labels from {path}: {source}")]
    Labels {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("label file {0} contains no labels")]
    NoLabels(String),
    #[error("model {path} is not a usable classifier: {reason}")]
    Malformed { path: String, reason: String },
    #[error("model scores {outputs} classes but has {labels} labels")]
    LabelCountMismatch { outputs: usize, labels: usize },
}

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

pub struct ImageClassifierTractOnnx {
    model: Plan,
    labels: Vec<String>,
    config: ModelConfig,
}

impl ImageClassifierTractOnnx {
    /// Loads the model and runs it once on a blank input so a model whose output does
    /// not line up with the label file is rejected here instead of on the first frame.
    pub fn new(config: ModelConfig) -> Result<Self, ModelLoadError> {
        if !Path::new(&config.onnx_model_path).is_file() {
            return Err(ModelLoadError::MissingModel(config.onnx_model_path.clone()));
        }

        let labels = read_labels(&config.labels_path)?;

        let (height, width) = (
            config.input_shape.0 as usize,
            config.input_shape.1 as usize,
        );
        let malformed = |e: TractError| ModelLoadError::Malformed {
            path: config.onnx_model_path.clone(),
            reason: e.to_string(),
        };

        let model = tract_onnx::onnx()
            .model_for_path(&config.onnx_model_path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, 3, height, width]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(malformed)?;

        let blank = Tensor::zero::<f32>(&[1, 3, height, width]).map_err(malformed)?;
        let outputs = model.run(tvec!(blank.into_tvalue())).map_err(malformed)?;
        let output_len = output_width(&outputs).map_err(|reason| ModelLoadError::Malformed {
            path: config.onnx_model_path.clone(),
            reason,
        })?;

        if output_len != labels.len() {
            return Err(ModelLoadError::LabelCountMismatch {
                outputs: output_len,
                labels: labels.len(),
            });
        }

        Ok(Self {
            model,
            labels,
            config,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

fn read_labels(path: &str) -> Result<Vec<String>, ModelLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Labels {
        path: path.to_string(),
        source,
    })?;

    let labels = parse_labels(&contents);
    if labels.is_empty() {
        return Err(ModelLoadError::NoLabels(path.to_string()));
    }
    Ok(labels)
}

pub fn parse_labels(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Width of the single `[N]` or `[1, N]` float output of a classifier.
fn output_width(outputs: &[TValue]) -> Result<usize, String> {
    let [output] = outputs else {
        return Err(format!("expected one output, got {}", outputs.len()));
    };
    if output.datum_type() != f32::datum_type() {
        return Err(format!("expected a float output, got {:?}", output.datum_type()));
    }
    match output.shape() {
        [width] | [1, width] => Ok(*width),
        shape => Err(format!("expected a [1, N] output, got {:?}", shape)),
    }
}

/// Raw logits are turned into probabilities. Outputs that already look like a
/// probability distribution are kept as they are.
pub fn to_probabilities(scores: &[f32]) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    let is_distribution = scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 1e-3;
    if is_distribution {
        return scores.to_vec();
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

impl ImageClassifier for ImageClassifierTractOnnx {
    fn classify(&self, frame: &Frame) -> Result<Vec<Classification>, ClassifyError> {
        let input = frame_to_tensor(
            frame,
            self.config.input_shape.1, // width
            self.config.input_shape.0, // height
        )?;

        let outputs = self
            .model
            .run(tvec!(input.into_tvalue()))
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| ClassifyError::Inference("model produced no output".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        let scores: Vec<f32> = output.iter().copied().collect();
        to_classifications(&self.labels, &scores)
    }
}

fn to_classifications(
    labels: &[String],
    scores: &[f32],
) -> Result<Vec<Classification>, ClassifyError> {
    if let Some(score) = scores.iter().find(|score| !score.is_finite()) {
        return Err(ClassifyError::Inference(format!(
            "model produced a non-finite score {}",
            score
        )));
    }

    let mut classifications: Vec<Classification> = labels
        .iter()
        .zip(to_probabilities(scores))
        .map(|(label, confidence)| Classification {
            label: label.clone(),
            confidence,
        })
        .collect();

    sort_by_confidence(&mut classifications);

    Ok(classifications)
}
