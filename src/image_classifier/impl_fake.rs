use crate::image_classifier::interface::{
    sort_by_confidence, Classification, ClassifyError, ImageClassifier,
};
use crate::frame::Frame;
use rand::distr::{Distribution, Uniform};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

enum Behavior {
    Random,
    Fixed(Vec<Classification>),
    Fail(String),
}

/// Stand-in for a real model. Frames are still converted so pixel format errors surface
/// the same way they do with a real classifier.
pub struct ImageClassifierFake {
    behavior: Behavior,
    delay: Duration,
    calls: AtomicUsize,
}

impl ImageClassifierFake {
    pub fn new() -> Self {
        Self {
            behavior: Behavior::Random,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_results(results: Vec<(&str, f32)>) -> Self {
        Self {
            behavior: Behavior::Fixed(
                results
                    .into_iter()
                    .map(|(label, confidence)| Classification {
                        label: label.to_string(),
                        confidence,
                    })
                    .collect(),
            ),
            ..Self::new()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            behavior: Behavior::Fail(message.to_string()),
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn random_classifications() -> Result<Vec<Classification>, ClassifyError> {
        let labels = ["fish", "shrimp", "crab", "squid", "shell", "seaweed"];

        let mut rng = rand::rng();
        let index_dist = Uniform::new(0, labels.len())
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;
        let confidence_dist =
            Uniform::new(0.0f32, 1.0).map_err(|e| ClassifyError::Inference(e.to_string()))?;

        let top = index_dist.sample(&mut rng);
        let confidence = confidence_dist.sample(&mut rng);
        let runner_up = (top + 1) % labels.len();

        let mut classifications = vec![
            Classification {
                label: labels[top].to_string(),
                confidence,
            },
            Classification {
                label: labels[runner_up].to_string(),
                confidence: (1.0 - confidence) * confidence_dist.sample(&mut rng),
            },
        ];
        sort_by_confidence(&mut classifications);
        Ok(classifications)
    }
}

impl ImageClassifier for ImageClassifierFake {
    fn classify(&self, frame: &Frame) -> Result<Vec<Classification>, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        frame.to_image()?;
        std::thread::sleep(self.delay);

        match &self.behavior {
            Behavior::Random => Self::random_classifications(),
            Behavior::Fixed(results) => Ok(results.clone()),
            Behavior::Fail(message) => Err(ClassifyError::Inference(message.clone())),
        }
    }
}
