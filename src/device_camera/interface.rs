use crate::frame::Frame;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum CameraSelection {
    Front,
    #[default]
    Back,
}

impl CameraSelection {
    pub fn toggled(self) -> Self {
        match self {
            CameraSelection::Front => CameraSelection::Back,
            CameraSelection::Back => CameraSelection::Front,
        }
    }
}

impl std::fmt::Display for CameraSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraSelection::Front => write!(f, "front"),
            CameraSelection::Back => write!(f, "back"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    WideAngle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceQuery {
    pub device_type: DeviceType,
    pub media_kind: MediaKind,
    pub position: CameraSelection,
}

impl DeviceQuery {
    pub fn video(position: CameraSelection) -> Self {
        Self {
            device_type: DeviceType::WideAngle,
            media_kind: MediaKind::Video,
            position,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceCameraError {
    #[error("camera {0} is busy")]
    Busy(String),
    #[error("camera {name} rejected the capture configuration: {reason}")]
    Rejected { name: String, reason: String },
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// A physical camera that can be attached for exclusive capture.
pub trait DeviceCamera: Send + Sync {
    fn name(&self) -> &str;
    fn position(&self) -> CameraSelection;
    /// Acquires the device. The returned input holds the device until dropped.
    fn attach(&self) -> Result<Box<dyn DeviceCameraInput + Send>, DeviceCameraError>;
}

pub trait DeviceCameraInput {
    /// Blocks until the next frame is available.
    fn capture_frame(&mut self) -> Result<Frame, DeviceCameraError>;
}

/// Lists the candidate devices matching a query, best match first.
pub trait DeviceCameraDiscovery: Send + Sync {
    fn discover(&self, query: &DeviceQuery) -> Vec<Arc<dyn DeviceCamera + Send + Sync>>;
}
