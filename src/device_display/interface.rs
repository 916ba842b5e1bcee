use crate::frame::Frame;
use std::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceDisplayEvent {
    ToggleCamera,
    Close,
}

/// The screen the classification results are published to. Every call happens on the
/// UI loop, one at a time.
pub trait DeviceDisplay: Send + Sync {
    /// Shown until the first result arrives.
    fn on_waiting(&mut self, label: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// A classification finished. `confidence` is `None` when the frame could not be
    /// classified.
    fn on_result(
        &mut self,
        frame: &Frame,
        label: &str,
        confidence: Option<f32>,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    fn on_camera_status(&mut self, status: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// User actions. Meant to be subscribed to once.
    fn events(&self) -> std::sync::mpsc::Receiver<DeviceDisplayEvent>;
}

pub fn format_label(label: &str, confidence: Option<f32>) -> String {
    match confidence {
        Some(confidence) => format!("{} - {:.2}%", label, confidence * 100.0),
        None => label.to_string(),
    }
}
