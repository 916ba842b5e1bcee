use crate::device_camera::interface::{
    CameraSelection, DeviceCameraDiscovery, DeviceCameraError, DeviceQuery,
};
use crate::frame_source::session::{CaptureSession, FrameCallback, SessionId};
use crate::library::logger::interface::Logger;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FrameSourceError {
    #[error("no {0} camera is available")]
    DeviceUnavailable(CameraSelection),
    #[error("could not attach the {camera} camera: {source}")]
    InputAttach {
        camera: CameraSelection,
        #[source]
        source: DeviceCameraError,
    },
}

pub struct FrameSource {
    discovery: Arc<dyn DeviceCameraDiscovery + Send + Sync>,
    logger: Arc<dyn Logger + Send + Sync>,
    on_frame: FrameCallback,
    capture_error_backoff: Duration,
    session: Option<CaptureSession>,
}

impl FrameSource {
    pub fn new(
        discovery: Arc<dyn DeviceCameraDiscovery + Send + Sync>,
        logger: Arc<dyn Logger + Send + Sync>,
        on_frame: FrameCallback,
        capture_error_backoff: Duration,
    ) -> Self {
        Self {
            discovery,
            logger: logger.with_namespace("frame_source"),
            on_frame,
            capture_error_backoff,
            session: None,
        }
    }

    /// Starts capturing from the first device matching `camera`. A running session is
    /// stopped first so at most one device is ever attached.
    pub fn start(&mut self, camera: CameraSelection) -> Result<SessionId, FrameSourceError> {
        self.stop();

        let device = self
            .discovery
            .discover(&DeviceQuery::video(camera))
            .into_iter()
            .next()
            .ok_or(FrameSourceError::DeviceUnavailable(camera))?;

        let input = device
            .attach()
            .map_err(|source| FrameSourceError::InputAttach { camera, source })?;

        let session = CaptureSession::spawn(
            camera,
            device.name().to_string(),
            input,
            self.on_frame.clone(),
            self.capture_error_backoff,
            self.logger.clone(),
        );

        let _ = self.logger.info(&format!(
            "Session {} started on {} camera {}",
            session.id, camera, session.device_name
        ));

        let id = session.id;
        self.session = Some(session);
        Ok(id)
    }

    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            let id = session.id;
            session.stop();
            let _ = self.logger.info(&format!("Session {} stopped", id));
        }
    }

    pub fn switch_camera(&mut self, to: CameraSelection) -> Result<SessionId, FrameSourceError> {
        self.stop();
        self.start(to)
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_camera(&self) -> Option<CameraSelection> {
        self.session.as_ref().map(|session| session.camera)
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(|session| session.id)
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}
