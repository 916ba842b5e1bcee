use crate::classifier_pipeline::ClassifierPipeline;
use crate::device_camera::interface::CameraSelection;
use crate::device_display::interface::DeviceDisplay;
use crate::frame_source::main::{FrameSource, FrameSourceError};
use crate::frame_source::session::SessionId;
use crate::library::logger::interface::Logger;
use crate::live_classifier::core::{Effect, Event};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct RunEffect {
    logger: Arc<dyn Logger + Send + Sync>,
    frame_source: Arc<Mutex<FrameSource>>,
    pipeline: Arc<ClassifierPipeline>,
    device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
    event_sender: Sender<Event>,
}

impl RunEffect {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        frame_source: Arc<Mutex<FrameSource>>,
        pipeline: Arc<ClassifierPipeline>,
        device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
        event_sender: Sender<Event>,
    ) -> Self {
        Self {
            logger,
            frame_source,
            pipeline,
            device_display,
            event_sender,
        }
    }

    pub fn run_effect(&self, effect: Effect) {
        let _ = self.logger.info(&format!("Running effect: {:?}", effect));

        match effect {
            Effect::SubscribeToDisplayEvents => {
                let events = match self.device_display.lock() {
                    Ok(device_display) => device_display.events(),
                    Err(_) => return,
                };
                for event in events {
                    if self.event_sender.send(Event::DisplayEvent(event)).is_err() {
                        break;
                    }
                }
            }
            Effect::StartCamera(camera) => {
                let result = self.with_frame_source(camera, |frame_source| frame_source.start(camera));
                let _ = self
                    .event_sender
                    .send(Event::CameraStartDone { camera, result });
            }
            Effect::SwitchCamera(camera) => {
                self.pipeline.deactivate();
                let result = self.with_frame_source(camera, |frame_source| {
                    if let (Some(from), Some(session)) =
                        (frame_source.current_camera(), frame_source.current_session())
                    {
                        let _ = self.logger.info(&format!(
                            "Switching from {} camera session {} to {} camera",
                            from, session, camera
                        ));
                    }
                    frame_source.switch_camera(camera)
                });
                let _ = self
                    .event_sender
                    .send(Event::CameraStartDone { camera, result });
            }
            Effect::StopCamera => {
                self.pipeline.deactivate();
                let mut frame_source = self.lock_frame_source();
                if frame_source.is_running() {
                    frame_source.stop();
                } else {
                    let _ = self.logger.info("Camera already stopped");
                }
            }
        }
    }

    /// Runs a start against the frame source and activates the pipeline for the new
    /// session while the frame source is still locked.
    fn with_frame_source(
        &self,
        camera: CameraSelection,
        start: impl FnOnce(&mut FrameSource) -> Result<SessionId, FrameSourceError>,
    ) -> Result<SessionId, FrameSourceError> {
        let mut frame_source = self.lock_frame_source();

        let result = start(&mut frame_source);
        match &result {
            Ok(session) => self.pipeline.activate(*session),
            Err(e) => {
                let _ = self
                    .logger
                    .error(&format!("Failed to start {} camera: {}", camera, e));
            }
        }
        result
    }

    /// A capture thread that panicked must not keep the device attached.
    fn lock_frame_source(&self) -> MutexGuard<'_, FrameSource> {
        match self.frame_source.lock() {
            Ok(frame_source) => frame_source,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
