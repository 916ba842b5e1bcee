use crate::device_display::interface::{DeviceDisplay, DeviceDisplayEvent};
use crate::frame::Frame;
use std::error::Error;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    Waiting(String),
    Result {
        frame: Frame,
        label: String,
        confidence: Option<f32>,
    },
    CameraStatus(String),
}

/// Records every call. Events can be injected through `sender`.
pub struct DeviceDisplayFake {
    calls: Arc<Mutex<Vec<DisplayCall>>>,
    event_sender: Sender<DeviceDisplayEvent>,
    event_receiver: Mutex<Option<Receiver<DeviceDisplayEvent>>>,
}

impl DeviceDisplayFake {
    pub fn new() -> Self {
        let (event_sender, event_receiver) = channel();
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            event_sender,
            event_receiver: Mutex::new(Some(event_receiver)),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<DisplayCall>>> {
        self.calls.clone()
    }

    pub fn sender(&self) -> Sender<DeviceDisplayEvent> {
        self.event_sender.clone()
    }

    fn record(&self, call: DisplayCall) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.calls
            .lock()
            .map_err(|e| e.to_string())?
            .push(call);
        Ok(())
    }
}

impl DeviceDisplay for DeviceDisplayFake {
    fn on_waiting(&mut self, label: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.record(DisplayCall::Waiting(label.to_string()))
    }

    fn on_result(
        &mut self,
        frame: &Frame,
        label: &str,
        confidence: Option<f32>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.record(DisplayCall::Result {
            frame: frame.clone(),
            label: label.to_string(),
            confidence,
        })
    }

    fn on_camera_status(&mut self, status: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.record(DisplayCall::CameraStatus(status.to_string()))
    }

    fn events(&self) -> Receiver<DeviceDisplayEvent> {
        match self.event_receiver.lock().ok().and_then(|mut rx| rx.take()) {
            Some(receiver) => receiver,
            None => channel().1,
        }
    }
}
