use crate::device_camera::interface::{CameraSelection, DeviceCameraInput};
use crate::frame::Frame;
use crate::library::logger::interface::Logger;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub type SessionId = u64;

pub type FrameCallback = Arc<dyn Fn(SessionId, Frame) + Send + Sync>;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_session_id() -> SessionId {
    NEXT_SESSION_ID.fetch_add(1, Ordering::SeqCst)
}

/// One continuous capture run. Owns the attached device input through its capture thread.
pub struct CaptureSession {
    pub id: SessionId,
    pub camera: CameraSelection,
    pub device_name: String,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CaptureSession {
    pub fn spawn(
        camera: CameraSelection,
        device_name: String,
        mut input: Box<dyn DeviceCameraInput + Send>,
        on_frame: FrameCallback,
        capture_error_backoff: Duration,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        let id = next_session_id();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();

        let thread = std::thread::spawn(move || {
            while thread_running.load(Ordering::SeqCst) {
                match input.capture_frame() {
                    Ok(frame) => {
                        if !thread_running.load(Ordering::SeqCst) {
                            break;
                        }
                        on_frame(id, frame);
                    }
                    Err(e) => {
                        let _ = logger.error(&format!("Session {} capture failed: {}", id, e));
                        std::thread::sleep(capture_error_backoff);
                    }
                }
            }
            drop(input);
            let _ = logger.info(&format!("Session {} released its device", id));
        });

        Self {
            id,
            camera,
            device_name,
            running,
            thread: Some(thread),
        }
    }

    /// Signals the capture thread and waits for it to release the device.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
