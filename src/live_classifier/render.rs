use crate::device_display::interface::DeviceDisplay;
use crate::live_classifier::core::{camera_status, State};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// Pushes state changes to the display. Results are forwarded once per generation so
/// the display sees exactly one `on_result` per accepted classification.
pub struct Render {
    device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
    rendered_generation: Option<u64>,
    rendered_status: Option<String>,
}

impl Render {
    pub fn new(device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>) -> Self {
        Self {
            device_display,
            rendered_generation: None,
            rendered_status: None,
        }
    }

    pub fn render(&mut self, state: &State) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut device_display = self.device_display.lock().map_err(|e| e.to_string())?;

        if self.rendered_generation != Some(state.published.generation) {
            let published = &state.published;
            match &published.current_frame {
                Some(frame) => device_display.on_result(
                    frame,
                    &published.current_label,
                    published.current_confidence,
                )?,
                None => device_display.on_waiting(&published.current_label)?,
            }
            self.rendered_generation = Some(published.generation);
        }

        let status = camera_status(&state.camera);
        if self.rendered_status.as_deref() != Some(status.as_str()) {
            device_display.on_camera_status(&status)?;
            self.rendered_status = Some(status);
        }

        Ok(())
    }
}
