use crate::frame::Frame;
use crate::frame_source::session::SessionId;
use crate::image_classifier::interface::{Classification, ClassifyError, ImageClassifier};
use crate::library::logger::interface::Logger;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

const NO_SESSION: SessionId = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub session: SessionId,
    pub frame: Frame,
    pub label: String,
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Classifying,
}

pub type PublishFn = Arc<dyn Fn(Publication) + Send + Sync>;

#[derive(Default)]
struct Mailbox {
    pending: Option<(SessionId, Frame)>,
    shutdown: bool,
}

struct Shared {
    mailbox: Mutex<Mailbox>,
    wake: Condvar,
    state: Mutex<PipelineState>,
    active_session: AtomicU64,
    dropped_frames: AtomicU64,
}

impl Shared {
    fn is_active(&self, session: SessionId) -> bool {
        session != NO_SESSION && self.active_session.load(Ordering::SeqCst) == session
    }

    fn set_state(&self, state: PipelineState) {
        if let Ok(mut current) = self.state.lock() {
            *current = state;
        }
    }
}

/// Classifies frames one at a time on a worker thread. Frames that arrive while a
/// classification runs replace the single pending slot.
pub struct ClassifierPipeline {
    shared: Arc<Shared>,
    classifier: Arc<dyn ImageClassifier + Send + Sync>,
    logger: Arc<dyn Logger + Send + Sync>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ClassifierPipeline {
    pub fn new(
        classifier: Arc<dyn ImageClassifier + Send + Sync>,
        logger: Arc<dyn Logger + Send + Sync>,
        unable_to_classify_label: &str,
        publish: PublishFn,
    ) -> Self {
        let logger = logger.with_namespace("classifier_pipeline");
        let shared = Arc::new(Shared {
            mailbox: Mutex::new(Mailbox::default()),
            wake: Condvar::new(),
            state: Mutex::new(PipelineState::Idle),
            active_session: AtomicU64::new(NO_SESSION),
            dropped_frames: AtomicU64::new(0),
        });

        let worker = std::thread::spawn({
            let shared = shared.clone();
            let classifier = classifier.clone();
            let logger = logger.clone();
            let unable_to_classify_label = unable_to_classify_label.to_string();
            move || {
                run_worker(
                    shared,
                    classifier,
                    logger,
                    unable_to_classify_label,
                    publish,
                )
            }
        });

        Self {
            shared,
            classifier,
            logger,
            worker: Mutex::new(Some(worker)),
        }
    }

    pub fn classify(&self, frame: &Frame) -> Result<Vec<Classification>, ClassifyError> {
        self.classifier.classify(frame)
    }

    /// Hands a frame to the worker without waiting for it to be classified.
    pub fn submit(&self, session: SessionId, frame: Frame) {
        if !self.shared.is_active(session) {
            self.shared.dropped_frames.fetch_add(1, Ordering::SeqCst);
            return;
        }

        let replaced = match self.shared.mailbox.lock() {
            Ok(mut mailbox) => mailbox.pending.replace((session, frame)).is_some(),
            Err(_) => return,
        };

        if replaced {
            self.shared.dropped_frames.fetch_add(1, Ordering::SeqCst);
        }

        self.shared.wake.notify_one();
    }

    pub fn activate(&self, session: SessionId) {
        self.shared.active_session.store(session, Ordering::SeqCst);
        let _ = self
            .logger
            .info(&format!("Publishing results for session {}", session));
    }

    /// Results of any classification still in flight are discarded from now on.
    pub fn deactivate(&self) {
        let previous = self
            .shared
            .active_session
            .swap(NO_SESSION, Ordering::SeqCst);

        if let Ok(mut mailbox) = self.shared.mailbox.lock() {
            if mailbox.pending.take().is_some() {
                self.shared.dropped_frames.fetch_add(1, Ordering::SeqCst);
            }
        }

        if previous != NO_SESSION {
            let _ = self
                .logger
                .info(&format!("Stopped publishing results for session {}", previous));
        }
    }

    pub fn state(&self) -> PipelineState {
        self.shared
            .state
            .lock()
            .map(|state| *state)
            .unwrap_or(PipelineState::Idle)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.shared.dropped_frames.load(Ordering::SeqCst)
    }

    pub fn shutdown(&self) {
        if let Ok(mut mailbox) = self.shared.mailbox.lock() {
            mailbox.shutdown = true;
        }
        self.shared.wake.notify_all();

        let worker = self.worker.lock().ok().and_then(|mut worker| worker.take());
        if let Some(worker) = worker {
            let _ = worker.join();
        }
    }
}

impl Drop for ClassifierPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    shared: Arc<Shared>,
    classifier: Arc<dyn ImageClassifier + Send + Sync>,
    logger: Arc<dyn Logger + Send + Sync>,
    unable_to_classify_label: String,
    publish: PublishFn,
) {
    loop {
        let (session, frame) = {
            let Ok(mut mailbox) = shared.mailbox.lock() else {
                return;
            };
            loop {
                if mailbox.shutdown {
                    return;
                }
                if let Some(next) = mailbox.pending.take() {
                    break next;
                }
                mailbox = match shared.wake.wait(mailbox) {
                    Ok(mailbox) => mailbox,
                    Err(_) => return,
                };
            }
        };

        shared.set_state(PipelineState::Classifying);

        let (label, confidence) = match classifier.classify(&frame) {
            Ok(classifications) if classifications.iter().any(|c| !c.confidence.is_finite()) => {
                let _ = logger.error("Model returned a non-finite confidence");
                (unable_to_classify_label.clone(), None)
            }
            Ok(classifications) => match classifications.first() {
                Some(top) => (top.label.clone(), Some(top.confidence.clamp(0.0, 1.0))),
                None => {
                    let _ = logger.info("Model returned no classifications");
                    (unable_to_classify_label.clone(), None)
                }
            },
            Err(e) => {
                let _ = logger.error(&format!("Failed to classify frame: {}", e));
                (unable_to_classify_label.clone(), None)
            }
        };

        if shared.is_active(session) {
            publish(Publication {
                session,
                frame,
                label,
                confidence,
            });
        } else {
            let _ = logger.info(&format!(
                "Discarded result from inactive session {}",
                session
            ));
        }

        shared.set_state(PipelineState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Orientation, PixelFormat};
    use crate::image_classifier::impl_fake::ImageClassifierFake;
    use crate::library::logger::impl_console::LoggerConsole;
    use std::time::{Duration, Instant};

    const UNABLE: &str = "Unable to classify image.";

    struct Fixture {
        classifier: Arc<ImageClassifierFake>,
        published: Arc<Mutex<Vec<Publication>>>,
        pipeline: ClassifierPipeline,
    }

    impl Fixture {
        fn new(classifier: ImageClassifierFake) -> Self {
            let classifier = Arc::new(classifier);
            let published = Arc::new(Mutex::new(Vec::new()));
            let sink = published.clone();
            let pipeline = ClassifierPipeline::new(
                classifier.clone(),
                Arc::new(LoggerConsole::new(
                    chrono::FixedOffset::east_opt(0).unwrap(),
                )),
                UNABLE,
                Arc::new(move |publication| sink.lock().unwrap().push(publication)),
            );
            Self {
                classifier,
                published,
                pipeline,
            }
        }

        fn wait_for_publications(&self, count: usize) -> Vec<Publication> {
            let deadline = Instant::now() + Duration::from_secs(5);
            loop {
                let published = self.published.lock().unwrap().clone();
                if published.len() >= count {
                    return published;
                }
                assert!(Instant::now() < deadline, "timed out waiting for results");
                std::thread::sleep(Duration::from_millis(5));
            }
        }

        fn wait_for_state(&self, state: PipelineState) {
            let deadline = Instant::now() + Duration::from_secs(5);
            while self.pipeline.state() != state {
                assert!(Instant::now() < deadline, "timed out waiting for {:?}", state);
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    #[test]
    fn test_classify_returns_model_output_in_order() {
        let f = Fixture::new(ImageClassifierFake::with_results(vec![
            ("shrimp", 0.92),
            ("fish", 0.08),
        ]));

        let result = f
            .pipeline
            .classify(&Frame::solid_color(1, 1, [200, 100, 50]))
            .unwrap();

        let labels: Vec<(&str, f32)> = result
            .iter()
            .map(|c| (c.label.as_str(), c.confidence))
            .collect();
        assert_eq!(labels, vec![("shrimp", 0.92), ("fish", 0.08)]);
    }

    #[test]
    fn test_top_label_is_published() {
        let f = Fixture::new(ImageClassifierFake::with_results(vec![
            ("shrimp", 0.92),
            ("fish", 0.08),
        ]));
        f.pipeline.activate(7);

        f.pipeline.submit(7, Frame::solid_color(1, 1, [200, 100, 50]));

        let published = f.wait_for_publications(1);
        assert_eq!(published[0].session, 7);
        assert_eq!(published[0].label, "shrimp");
        assert_eq!(published[0].confidence, Some(0.92));
    }

    #[test]
    fn test_empty_result_publishes_placeholder() {
        let f = Fixture::new(ImageClassifierFake::with_results(vec![]));
        f.pipeline.activate(1);

        f.pipeline.submit(1, Frame::solid_color(1, 1, [0, 0, 0]));

        let published = f.wait_for_publications(1);
        assert_eq!(published[0].label, UNABLE);
        assert_eq!(published[0].confidence, None);
    }

    #[test]
    fn test_failures_publish_placeholder_and_pipeline_keeps_running() {
        let f = Fixture::new(ImageClassifierFake::failing("boom"));
        f.pipeline.activate(1);

        f.pipeline.submit(
            1,
            Frame::new(2, 2, PixelFormat::Nv12, Orientation::Portrait, vec![0; 6]),
        );
        f.wait_for_publications(1);
        f.pipeline.submit(1, Frame::solid_color(1, 1, [0, 0, 0]));

        let published = f.wait_for_publications(2);
        assert!(published.iter().all(|p| p.label == UNABLE));
        assert_eq!(f.pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn test_non_finite_confidence_publishes_placeholder() {
        let f = Fixture::new(ImageClassifierFake::with_results(vec![
            ("fish", f32::NAN),
            ("shrimp", 0.4),
        ]));
        f.pipeline.activate(5);

        f.pipeline.submit(5, Frame::solid_color(1, 1, [0, 0, 0]));

        let published = f.wait_for_publications(1);
        assert_eq!(published[0].label, UNABLE);
        assert_eq!(published[0].confidence, None);
    }

    #[test]
    fn test_empty_frame_publishes_placeholder() {
        let f = Fixture::new(ImageClassifierFake::with_results(vec![("fish", 0.7)]));
        f.pipeline.activate(6);

        f.pipeline.submit(
            6,
            Frame::new(0, 0, PixelFormat::Rgb8, Orientation::Portrait, vec![]),
        );

        let published = f.wait_for_publications(1);
        assert_eq!(published[0].label, UNABLE);
        assert_eq!(published[0].confidence, None);
    }

    #[test]
    fn test_frames_for_inactive_session_are_dropped() {
        let f = Fixture::new(ImageClassifierFake::with_results(vec![("fish", 0.5)]));
        f.pipeline.activate(2);

        f.pipeline.submit(1, Frame::solid_color(1, 1, [0, 0, 0]));
        std::thread::sleep(Duration::from_millis(30));

        assert!(f.published.lock().unwrap().is_empty());
        assert_eq!(f.classifier.calls(), 0);
        assert_eq!(f.pipeline.dropped_frames(), 1);
    }

    #[test]
    fn test_result_completing_after_deactivate_is_not_published() {
        let f = Fixture::new(
            ImageClassifierFake::with_results(vec![("shrimp", 0.9)])
                .with_delay(Duration::from_millis(100)),
        );
        f.pipeline.activate(3);

        f.pipeline.submit(3, Frame::solid_color(1, 1, [0, 0, 0]));
        f.wait_for_state(PipelineState::Classifying);
        f.pipeline.deactivate();
        f.wait_for_state(PipelineState::Idle);

        assert_eq!(f.classifier.calls(), 1);
        assert!(f.published.lock().unwrap().is_empty());
    }

    #[test]
    fn test_pending_frame_is_replaced_while_classifying() {
        let f = Fixture::new(
            ImageClassifierFake::with_results(vec![("shrimp", 0.9)])
                .with_delay(Duration::from_millis(100)),
        );
        f.pipeline.activate(4);

        f.pipeline.submit(4, Frame::solid_color(1, 1, [1, 1, 1]));
        f.wait_for_state(PipelineState::Classifying);
        f.pipeline.submit(4, Frame::solid_color(1, 1, [2, 2, 2]));
        f.pipeline.submit(4, Frame::solid_color(1, 1, [3, 3, 3]));

        let published = f.wait_for_publications(2);
        f.wait_for_state(PipelineState::Idle);
        std::thread::sleep(Duration::from_millis(150));

        assert_eq!(f.published.lock().unwrap().len(), 2);
        assert_eq!(&published[0].frame.data[..], &[1, 1, 1]);
        assert_eq!(&published[1].frame.data[..], &[3, 3, 3]);
        assert_eq!(f.pipeline.dropped_frames(), 1);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let f = Fixture::new(ImageClassifierFake::new());
        f.pipeline.shutdown();
        f.pipeline.shutdown();
    }
}
