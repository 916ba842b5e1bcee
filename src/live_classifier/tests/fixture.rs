use crate::config::Config;
use crate::device_camera::impl_fake::DeviceCameraFake;
use crate::device_camera::impl_list::DeviceCameraDiscoveryList;
use crate::device_camera::interface::{CameraSelection, DeviceCamera};
use crate::device_display::impl_fake::{DeviceDisplayFake, DisplayCall};
use crate::device_display::interface::DeviceDisplayEvent;
use crate::image_classifier::impl_fake::ImageClassifierFake;
use crate::library::logger::impl_console::LoggerConsole;
use crate::live_classifier::core::State;
use crate::live_classifier::main::LiveClassifier;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

#[allow(dead_code)]
pub struct Fixture {
    pub config: Config,
    pub front: Arc<DeviceCameraFake>,
    pub back: Arc<DeviceCameraFake>,
    pub display_calls: Arc<Mutex<Vec<DisplayCall>>>,
    pub display_events: Sender<DeviceDisplayEvent>,
    pub live_classifier: Option<LiveClassifier>,
}

impl Fixture {
    pub fn new(image_classifier: ImageClassifierFake) -> Self {
        let config = Config {
            logger_timezone: chrono::FixedOffset::east_opt(0).unwrap(),
            ..Config::default()
        };
        let logger = Arc::new(LoggerConsole::new(config.logger_timezone));
        let front = Arc::new(
            DeviceCameraFake::new("front", CameraSelection::Front)
                .with_size(1, 1)
                .with_color([0, 0, 255])
                .with_frame_interval(Duration::from_millis(10)),
        );
        let back = Arc::new(
            DeviceCameraFake::new("back", CameraSelection::Back)
                .with_size(1, 1)
                .with_color([255, 0, 0])
                .with_frame_interval(Duration::from_millis(10)),
        );
        let cameras: Vec<Arc<dyn DeviceCamera + Send + Sync>> = vec![front.clone(), back.clone()];
        let device_display = DeviceDisplayFake::new();
        let display_calls = device_display.calls();
        let display_events = device_display.sender();

        let live_classifier = LiveClassifier::new(
            config.clone(),
            logger,
            Arc::new(DeviceCameraDiscoveryList::new(cameras)),
            Arc::new(image_classifier),
            Arc::new(Mutex::new(device_display)),
        );

        Self {
            config,
            front,
            back,
            display_calls,
            display_events,
            live_classifier: Some(live_classifier),
        }
    }

    /// Runs the UI loop on its own thread until `Close` is sent.
    pub fn start(&mut self) -> JoinHandle<State> {
        let live_classifier = self
            .live_classifier
            .take()
            .expect("fixture already started");
        std::thread::spawn(move || live_classifier.run().unwrap())
    }

    pub fn close(&self, handle: JoinHandle<State>) -> State {
        self.display_events.send(DeviceDisplayEvent::Close).unwrap();
        handle.join().unwrap()
    }

    pub fn results(&self) -> Vec<(Vec<u8>, String, Option<f32>)> {
        self.display_calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                DisplayCall::Result {
                    frame,
                    label,
                    confidence,
                } => Some((frame.data.as_ref().clone(), label.clone(), *confidence)),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.display_calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                DisplayCall::CameraStatus(status) => Some(status.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn wait_until(&self, what: &str, condition: impl Fn(&Fixture) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition(self) {
            assert!(Instant::now() < deadline, "timed out waiting for {}", what);
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}
