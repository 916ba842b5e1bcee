use crate::device_camera::impl_fake::DeviceCameraFake;
use crate::device_camera::impl_list::DeviceCameraDiscoveryList;
use crate::device_camera::interface::{CameraSelection, DeviceCamera};
use crate::frame::Frame;
use crate::frame_source::main::{FrameSource, FrameSourceError};
use crate::frame_source::session::SessionId;
use crate::library::logger::impl_console::LoggerConsole;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Fixture {
    front: Arc<DeviceCameraFake>,
    back: Arc<DeviceCameraFake>,
    frames: Arc<Mutex<Vec<(SessionId, Frame)>>>,
    frame_source: FrameSource,
}

impl Fixture {
    fn new() -> Self {
        let front = Arc::new(
            DeviceCameraFake::new("front", CameraSelection::Front)
                .with_color([0, 0, 255])
                .with_frame_interval(Duration::from_millis(5)),
        );
        let back = Arc::new(
            DeviceCameraFake::new("back", CameraSelection::Back)
                .with_color([255, 0, 0])
                .with_frame_interval(Duration::from_millis(5)),
        );
        let cameras: Vec<Arc<dyn DeviceCamera + Send + Sync>> = vec![front.clone(), back.clone()];
        Self::with_cameras(front, back, cameras)
    }

    fn with_cameras(
        front: Arc<DeviceCameraFake>,
        back: Arc<DeviceCameraFake>,
        cameras: Vec<Arc<dyn DeviceCamera + Send + Sync>>,
    ) -> Self {
        let logger = Arc::new(LoggerConsole::new(
            chrono::FixedOffset::east_opt(0).unwrap(),
        ));
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = frames.clone();
        let frame_source = FrameSource::new(
            Arc::new(DeviceCameraDiscoveryList::new(cameras)),
            logger,
            Arc::new(move |session, frame| sink.lock().unwrap().push((session, frame))),
            Duration::from_millis(5),
        );

        Self {
            front,
            back,
            frames,
            frame_source,
        }
    }

    fn wait_for_frame_from(&self, session: SessionId) -> Frame {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some((_, frame)) = self
                .frames
                .lock()
                .unwrap()
                .iter()
                .find(|(id, _)| *id == session)
            {
                return frame.clone();
            }
            assert!(Instant::now() < deadline, "no frame from session {}", session);
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

#[test]
fn test_start_delivers_frames_from_selected_camera() {
    let mut f = Fixture::new();

    let session = f.frame_source.start(CameraSelection::Back).unwrap();
    let frame = f.wait_for_frame_from(session);

    assert_eq!(&frame.data[..3], &[255, 0, 0]);
    assert!(f.frame_source.is_running());
    assert_eq!(f.frame_source.current_camera(), Some(CameraSelection::Back));
    assert_eq!(f.back.active_handles(), 1);
    assert_eq!(f.front.active_handles(), 0);
}

#[test]
fn test_stop_twice_is_idempotent() {
    let mut f = Fixture::new();
    f.frame_source.start(CameraSelection::Back).unwrap();

    f.frame_source.stop();
    f.frame_source.stop();

    assert!(!f.frame_source.is_running());
    assert_eq!(f.back.active_handles(), 0);
}

#[test]
fn test_stop_when_never_started_is_noop() {
    let mut f = Fixture::new();
    f.frame_source.stop();
    assert!(!f.frame_source.is_running());
}

#[test]
fn test_no_frames_after_stop() {
    let mut f = Fixture::new();
    let session = f.frame_source.start(CameraSelection::Back).unwrap();
    f.wait_for_frame_from(session);

    f.frame_source.stop();
    let delivered = f.frames.lock().unwrap().len();
    std::thread::sleep(Duration::from_millis(50));

    assert_eq!(f.frames.lock().unwrap().len(), delivered);
}

#[test]
fn test_switch_front_then_back_leaves_one_handle_on_back() {
    let mut f = Fixture::new();
    f.frame_source.start(CameraSelection::Back).unwrap();

    let front_session = f.frame_source.switch_camera(CameraSelection::Front).unwrap();
    f.wait_for_frame_from(front_session);
    let back_session = f.frame_source.switch_camera(CameraSelection::Back).unwrap();
    let frame = f.wait_for_frame_from(back_session);

    assert_ne!(front_session, back_session);
    assert_eq!(&frame.data[..3], &[255, 0, 0]);
    assert_eq!(f.frame_source.current_camera(), Some(CameraSelection::Back));
    assert_eq!(f.frame_source.current_session(), Some(back_session));
    assert_eq!(f.back.active_handles(), 1);
    assert_eq!(f.front.active_handles(), 0);
}

#[test]
fn test_missing_device_is_unavailable() {
    let front = Arc::new(DeviceCameraFake::new("front", CameraSelection::Front));
    let back = Arc::new(DeviceCameraFake::new("back", CameraSelection::Back));
    let cameras: Vec<Arc<dyn DeviceCamera + Send + Sync>> = vec![back.clone()];
    let mut f = Fixture::with_cameras(front, back, cameras);

    let result = f.frame_source.start(CameraSelection::Front);

    assert!(matches!(
        result,
        Err(FrameSourceError::DeviceUnavailable(CameraSelection::Front))
    ));
    assert!(!f.frame_source.is_running());
}

#[test]
fn test_failed_switch_leaves_source_stopped() {
    let mut f = Fixture::new();
    f.frame_source.start(CameraSelection::Back).unwrap();
    f.front.set_reject_attach(true);

    let result = f.frame_source.switch_camera(CameraSelection::Front);

    assert!(matches!(
        result,
        Err(FrameSourceError::InputAttach {
            camera: CameraSelection::Front,
            ..
        })
    ));
    assert!(!f.frame_source.is_running());
    assert_eq!(f.frame_source.current_camera(), None);
    assert_eq!(f.back.active_handles(), 0);
    assert_eq!(f.front.active_handles(), 0);
}
