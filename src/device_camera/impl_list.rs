use crate::device_camera::interface::{DeviceCamera, DeviceCameraDiscovery, DeviceQuery};
use std::sync::Arc;

/// Discovery over a fixed set of devices, filtered by position.
pub struct DeviceCameraDiscoveryList {
    cameras: Vec<Arc<dyn DeviceCamera + Send + Sync>>,
}

impl DeviceCameraDiscoveryList {
    pub fn new(cameras: Vec<Arc<dyn DeviceCamera + Send + Sync>>) -> Self {
        Self { cameras }
    }
}

impl DeviceCameraDiscovery for DeviceCameraDiscoveryList {
    fn discover(&self, query: &DeviceQuery) -> Vec<Arc<dyn DeviceCamera + Send + Sync>> {
        self.cameras
            .iter()
            .filter(|camera| camera.position() == query.position)
            .cloned()
            .collect()
    }
}
