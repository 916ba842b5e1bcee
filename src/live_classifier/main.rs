use crate::classifier_pipeline::ClassifierPipeline;
use crate::config::Config;
use crate::device_camera::interface::DeviceCameraDiscovery;
use crate::device_display::interface::DeviceDisplay;
use crate::frame_source::main::FrameSource;
use crate::image_classifier::interface::ImageClassifier;
use crate::library::logger::interface::Logger;
use crate::live_classifier::core::{init, transition, CameraState, Effect, Event, State};
use crate::live_classifier::render::Render;
use crate::live_classifier::run_effect::RunEffect;
use std::error::Error;
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};

pub struct LiveClassifier {
    config: Config,
    logger: Arc<dyn Logger + Send + Sync>,
    device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
    pipeline: Arc<ClassifierPipeline>,
    run_effect: RunEffect,
    event_receiver: Receiver<Event>,
}

impl LiveClassifier {
    pub fn new(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        discovery: Arc<dyn DeviceCameraDiscovery + Send + Sync>,
        image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
        device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
    ) -> Self {
        let (event_sender, event_receiver) = channel();

        let publish_sender = event_sender.clone();
        let pipeline = Arc::new(ClassifierPipeline::new(
            image_classifier,
            logger.clone(),
            &config.unable_to_classify_label,
            Arc::new(move |publication| {
                let _ = publish_sender.send(Event::Classified(publication));
            }),
        ));

        let frame_pipeline = pipeline.clone();
        let frame_source = Arc::new(Mutex::new(FrameSource::new(
            discovery,
            logger.clone(),
            Arc::new(move |session, frame| frame_pipeline.submit(session, frame)),
            config.capture_error_backoff,
        )));

        let logger = logger.with_namespace("live_classifier");

        let run_effect = RunEffect::new(
            logger.clone(),
            frame_source,
            pipeline.clone(),
            device_display.clone(),
            event_sender,
        );

        Self {
            config,
            logger,
            device_display,
            pipeline,
            run_effect,
            event_receiver,
        }
    }

    fn spawn_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            let run_effect = self.run_effect.clone();
            std::thread::spawn(move || run_effect.run_effect(effect));
        }
    }

    /// Runs the UI loop until the display asks to close. Returns the final state.
    pub fn run(&self) -> Result<State, Box<dyn Error + Send + Sync>> {
        let mut render = Render::new(self.device_display.clone());

        let (mut state, effects) = init(&self.config);
        render.render(&state)?;
        self.spawn_effects(effects);

        loop {
            let event = self.event_receiver.recv()?;

            if !matches!(event, Event::Classified(_)) {
                let _ = self
                    .logger
                    .info(&format!("Event: {}", event.to_display_string()));
            }

            let (new_state, effects) = transition(&self.config, state, event);
            state = new_state;

            if let Err(e) = render.render(&state) {
                let _ = self.logger.error(&format!("Failed to render: {}", e));
            }

            if state.camera == CameraState::Stopped {
                for effect in effects {
                    self.run_effect.run_effect(effect);
                }
                self.pipeline.shutdown();
                let _ = self.logger.info(&format!(
                    "Stopped after dropping {} frames",
                    self.pipeline.dropped_frames()
                ));
                return Ok(state);
            }

            self.spawn_effects(effects);
        }
    }
}
