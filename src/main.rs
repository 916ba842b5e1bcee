use clap::Parser;
use config::{Args, Config, DisplayKind};
use device_camera::impl_fake::DeviceCameraFake;
use device_camera::impl_image_dir::DeviceCameraImageDir;
use device_camera::impl_list::DeviceCameraDiscoveryList;
use device_camera::interface::{CameraSelection, DeviceCamera};
use device_display::impl_console::DeviceDisplayConsole;
use device_display::impl_gui::DeviceDisplayGui;
use image_classifier::impl_fake::ImageClassifierFake;
use image_classifier::impl_tract_onnx::ImageClassifierTractOnnx;
use image_classifier::interface::ImageClassifier;
use library::logger::impl_console::LoggerConsole;
use library::logger::interface::Logger;
use live_classifier::main::LiveClassifier;
use std::sync::{Arc, Mutex};

mod classifier_pipeline;
mod config;
mod device_camera;
mod device_display;
mod frame;
mod frame_source;
mod image_classifier;
mod library;
mod live_classifier;

fn cameras(config: &Config) -> Vec<Arc<dyn DeviceCamera + Send + Sync>> {
    [
        (CameraSelection::Front, &config.front_dir),
        (CameraSelection::Back, &config.back_dir),
    ]
    .into_iter()
    .map(|(position, dir)| -> Arc<dyn DeviceCamera + Send + Sync> {
        match dir {
            Some(dir) => Arc::new(DeviceCameraImageDir::new(
                position,
                dir.clone(),
                config.frame_orientation,
                config.frame_interval,
            )),
            None => Arc::new(
                DeviceCameraFake::new(&format!("fake {}", position), position)
                    .with_orientation(config.frame_orientation)
                    .with_frame_interval(config.frame_interval),
            ),
        }
    })
    .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from(Args::parse());

    let logger = Arc::new(LoggerConsole::new(config.logger_timezone));

    let image_classifier: Arc<dyn ImageClassifier + Send + Sync> = match &config.model {
        Some(model) => {
            logger.info(&format!("Loading model {}", model.onnx_model_path))?;
            let classifier = ImageClassifierTractOnnx::new(model.clone())?;
            logger.info(&format!("Model ready with {} labels", classifier.labels().len()))?;
            Arc::new(classifier)
        }
        None => {
            logger.info("No model given, classifying with the fake classifier")?;
            Arc::new(ImageClassifierFake::new())
        }
    };

    let discovery = Arc::new(DeviceCameraDiscoveryList::new(cameras(&config)));

    match config.display {
        DisplayKind::Console => {
            let device_display = Arc::new(Mutex::new(DeviceDisplayConsole::new()));
            let live_classifier = LiveClassifier::new(
                config,
                logger,
                discovery,
                image_classifier,
                device_display,
            );
            live_classifier.run()?;
        }
        DisplayKind::Gui => {
            let device_display = DeviceDisplayGui::new();
            let window = device_display.window();
            let live_classifier = LiveClassifier::new(
                config,
                logger,
                discovery,
                image_classifier,
                Arc::new(Mutex::new(device_display)),
            );

            let ui_loop = std::thread::spawn(move || live_classifier.run());
            window.run()?;
            ui_loop.join().map_err(|_| "UI loop panicked")??;
        }
    }

    Ok(())
}
