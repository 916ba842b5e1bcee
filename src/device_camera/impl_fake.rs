use crate::device_camera::interface::{
    CameraSelection, DeviceCamera, DeviceCameraError, DeviceCameraInput,
};
use crate::frame::{Frame, Orientation, PixelFormat};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Produces solid-colour frames. A random colour is picked per frame unless one is set.
pub struct DeviceCameraFake {
    name: String,
    position: CameraSelection,
    width: u32,
    height: u32,
    color: Option<[u8; 3]>,
    orientation: Orientation,
    frame_interval: Duration,
    reject_attach: AtomicBool,
    busy: Arc<AtomicBool>,
    active_handles: Arc<AtomicUsize>,
}

impl DeviceCameraFake {
    pub fn new(name: &str, position: CameraSelection) -> Self {
        Self {
            name: name.to_string(),
            position,
            width: 64,
            height: 48,
            color: None,
            orientation: Orientation::Portrait,
            frame_interval: Duration::from_millis(33),
            reject_attach: AtomicBool::new(false),
            busy: Arc::new(AtomicBool::new(false)),
            active_handles: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    pub fn set_reject_attach(&self, reject: bool) {
        self.reject_attach.store(reject, Ordering::SeqCst);
    }

    pub fn active_handles(&self) -> usize {
        self.active_handles.load(Ordering::SeqCst)
    }
}

impl DeviceCamera for DeviceCameraFake {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> CameraSelection {
        self.position
    }

    fn attach(&self) -> Result<Box<dyn DeviceCameraInput + Send>, DeviceCameraError> {
        if self.reject_attach.load(Ordering::SeqCst) {
            return Err(DeviceCameraError::Rejected {
                name: self.name.clone(),
                reason: "configuration not supported".to_string(),
            });
        }

        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(DeviceCameraError::Busy(self.name.clone()));
        }

        self.active_handles.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(DeviceCameraFakeInput {
            width: self.width,
            height: self.height,
            color: self.color,
            orientation: self.orientation,
            frame_interval: self.frame_interval,
            busy: self.busy.clone(),
            active_handles: self.active_handles.clone(),
        }))
    }
}

struct DeviceCameraFakeInput {
    width: u32,
    height: u32,
    color: Option<[u8; 3]>,
    orientation: Orientation,
    frame_interval: Duration,
    busy: Arc<AtomicBool>,
    active_handles: Arc<AtomicUsize>,
}

impl DeviceCameraInput for DeviceCameraFakeInput {
    fn capture_frame(&mut self) -> Result<Frame, DeviceCameraError> {
        std::thread::sleep(self.frame_interval);

        let color = self.color.unwrap_or_else(rand::random::<[u8; 3]>);
        let data = color
            .iter()
            .copied()
            .cycle()
            .take(self.width as usize * self.height as usize * 3)
            .collect();

        Ok(Frame::new(
            self.width,
            self.height,
            PixelFormat::Rgb8,
            self.orientation,
            data,
        ))
    }
}

impl Drop for DeviceCameraFakeInput {
    fn drop(&mut self) {
        self.active_handles.fetch_sub(1, Ordering::SeqCst);
        self.busy.store(false, Ordering::SeqCst);
    }
}
