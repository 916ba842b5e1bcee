use crate::frame::{ConversionError, Frame};

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("frame conversion failed: {0}")]
    Conversion(#[from] ConversionError),
    #[error("inference failed: {0}")]
    Inference(String),
}

pub trait ImageClassifier: Send + Sync {
    /// Returns every label the model reports, highest confidence first.
    fn classify(&self, frame: &Frame) -> Result<Vec<Classification>, ClassifyError>;
}

pub fn sort_by_confidence(classifications: &mut [Classification]) {
    classifications.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
