use crate::classifier_pipeline::Publication;
use crate::config::Config;
use crate::device_camera::interface::CameraSelection;
use crate::device_display::interface::DeviceDisplayEvent;
use crate::frame::Frame;
use crate::frame_source::main::FrameSourceError;
use crate::frame_source::session::SessionId;

#[derive(Debug, Clone, PartialEq)]
pub enum CameraState {
    Starting {
        camera: CameraSelection,
    },
    Running {
        camera: CameraSelection,
        session: SessionId,
    },
    Failed {
        camera: CameraSelection,
        message: String,
    },
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedState {
    pub current_frame: Option<Frame>,
    pub current_label: String,
    pub current_confidence: Option<f32>,
    /// Bumped on every accepted result.
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub camera: CameraState,
    pub published: PublishedState,
}

#[derive(Debug)]
pub enum Event {
    CameraStartDone {
        camera: CameraSelection,
        result: Result<SessionId, FrameSourceError>,
    },
    DisplayEvent(DeviceDisplayEvent),
    Classified(Publication),
}

impl Event {
    pub fn to_display_string(&self) -> String {
        match self {
            Event::Classified(publication) => format!(
                "Classified {{ session: {}, label: {:?}, confidence: {:?} }}",
                publication.session, publication.label, publication.confidence
            ),
            event => format!("{:?}", event),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SubscribeToDisplayEvents,
    StartCamera(CameraSelection),
    SwitchCamera(CameraSelection),
    StopCamera,
}

pub fn init(config: &Config) -> (State, Vec<Effect>) {
    (
        State {
            camera: CameraState::Starting {
                camera: config.initial_camera,
            },
            published: PublishedState {
                current_frame: None,
                current_label: config.waiting_label.clone(),
                current_confidence: None,
                generation: 0,
            },
        },
        vec![
            Effect::SubscribeToDisplayEvents,
            Effect::StartCamera(config.initial_camera),
        ],
    )
}

pub fn transition(_config: &Config, state: State, event: Event) -> (State, Vec<Effect>) {
    match (state.camera.clone(), event) {
        (_, Event::DisplayEvent(DeviceDisplayEvent::Close)) => (
            State {
                camera: CameraState::Stopped,
                ..state
            },
            vec![Effect::StopCamera],
        ),

        (CameraState::Stopped, _) => (state, vec![]),

        // Camera lifecycle
        (
            CameraState::Starting { camera },
            Event::CameraStartDone {
                camera: started,
                result,
            },
        ) if camera == started => {
            let camera_state = match result {
                Ok(session) => CameraState::Running { camera, session },
                Err(e) => CameraState::Failed {
                    camera,
                    message: e.to_string(),
                },
            };
            (
                State {
                    camera: camera_state,
                    ..state
                },
                vec![],
            )
        }
        (
            CameraState::Running { camera, .. } | CameraState::Failed { camera, .. },
            Event::DisplayEvent(DeviceDisplayEvent::ToggleCamera),
        ) => {
            let next = camera.toggled();
            (
                State {
                    camera: CameraState::Starting { camera: next },
                    ..state
                },
                vec![Effect::SwitchCamera(next)],
            )
        }

        // Publishing
        (CameraState::Running { session, .. }, Event::Classified(publication))
            if publication.session == session =>
        {
            let published = PublishedState {
                current_frame: Some(publication.frame),
                current_label: publication.label,
                current_confidence: publication.confidence,
                generation: state.published.generation + 1,
            };
            (State { published, ..state }, vec![])
        }

        // Stale results, toggles while a camera is starting, late start results
        _ => (state, vec![]),
    }
}

pub fn camera_status(state: &CameraState) -> String {
    match state {
        CameraState::Starting { camera } => format!("Starting {} camera...", camera),
        CameraState::Running { camera, .. } => format!("Using {} camera", camera),
        CameraState::Failed { camera, message } => {
            format!("Could not start {} camera: {}", camera, message)
        }
        CameraState::Stopped => "Camera stopped".to_string(),
    }
}
