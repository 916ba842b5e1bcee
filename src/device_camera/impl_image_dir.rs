use crate::device_camera::interface::{
    CameraSelection, DeviceCamera, DeviceCameraError, DeviceCameraInput,
};
use crate::frame::{Frame, Orientation};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Replays the images of a directory in name order, looping forever.
pub struct DeviceCameraImageDir {
    name: String,
    position: CameraSelection,
    dir: PathBuf,
    orientation: Orientation,
    frame_interval: Duration,
    busy: Arc<AtomicBool>,
}

impl DeviceCameraImageDir {
    pub fn new(
        position: CameraSelection,
        dir: PathBuf,
        orientation: Orientation,
        frame_interval: Duration,
    ) -> Self {
        Self {
            name: format!("{} ({})", dir.display(), position),
            position,
            dir,
            orientation,
            frame_interval,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

impl DeviceCamera for DeviceCameraImageDir {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> CameraSelection {
        self.position
    }

    fn attach(&self) -> Result<Box<dyn DeviceCameraInput + Send>, DeviceCameraError> {
        let paths = list_images(&self.dir).map_err(|e| DeviceCameraError::Rejected {
            name: self.name.clone(),
            reason: e.to_string(),
        })?;

        if paths.is_empty() {
            return Err(DeviceCameraError::Rejected {
                name: self.name.clone(),
                reason: "directory contains no images".to_string(),
            });
        }

        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(DeviceCameraError::Busy(self.name.clone()));
        }

        Ok(Box::new(DeviceCameraImageDirInput {
            paths,
            next: 0,
            orientation: self.orientation,
            frame_interval: self.frame_interval,
            busy: self.busy.clone(),
        }))
    }
}

struct DeviceCameraImageDirInput {
    paths: Vec<PathBuf>,
    next: usize,
    orientation: Orientation,
    frame_interval: Duration,
    busy: Arc<AtomicBool>,
}

impl DeviceCameraInput for DeviceCameraImageDirInput {
    fn capture_frame(&mut self) -> Result<Frame, DeviceCameraError> {
        std::thread::sleep(self.frame_interval);

        let path = &self.paths[self.next];
        self.next = (self.next + 1) % self.paths.len();

        let image = image::open(path)?;
        Ok(Frame::from_image(&image, self.orientation))
    }
}

impl Drop for DeviceCameraImageDirInput {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}
