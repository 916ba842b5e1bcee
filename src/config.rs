use crate::device_camera::interface::CameraSelection;
use crate::frame::Orientation;
use crate::image_classifier::models::model_config::ModelConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    Console,
    Gui,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub logger_timezone: chrono::FixedOffset,
    pub initial_camera: CameraSelection,
    pub frame_interval: Duration,
    pub frame_orientation: Orientation,
    pub capture_error_backoff: Duration,
    pub model: Option<ModelConfig>,
    pub waiting_label: String,
    pub unable_to_classify_label: String,
    pub display: DisplayKind,
    pub front_dir: Option<PathBuf>,
    pub back_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logger_timezone: local_timezone(),
            initial_camera: CameraSelection::Back,
            frame_interval: Duration::from_millis(100),
            frame_orientation: Orientation::Portrait,
            capture_error_backoff: Duration::from_millis(500),
            model: None,
            waiting_label: "Waiting for image...".to_string(),
            unable_to_classify_label: "Unable to classify image.".to_string(),
            display: DisplayKind::Console,
            front_dir: None,
            back_dir: None,
        }
    }
}

/// Command line of the `live-image-class` binary.
#[derive(Debug, Parser)]
#[command(name = "live-image-class", about = "Classifies live camera frames with an ONNX model")]
pub struct Args {
    /// Show the frames in a window instead of the console panel.
    #[arg(long)]
    pub gui: bool,
    /// Start on the front camera instead of the back one.
    #[arg(long)]
    pub front: bool,
    /// ONNX classifier. Without it frames are labelled by the fake classifier.
    #[arg(long, requires = "labels")]
    pub model: Option<String>,
    /// Label file, one label per line in model output order.
    #[arg(long, requires = "model")]
    pub labels: Option<String>,
    /// Square model input size in pixels.
    #[arg(long, default_value_t = 224, value_parser = clap::value_parser!(u32).range(1..))]
    pub input_size: u32,
    /// Replay the images of this directory as the front camera.
    #[arg(long)]
    pub front_dir: Option<PathBuf>,
    /// Replay the images of this directory as the back camera.
    #[arg(long)]
    pub back_dir: Option<PathBuf>,
    /// Pause between captured frames.
    #[arg(long, default_value_t = 100)]
    pub frame_interval_ms: u64,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let model = match (args.model, args.labels) {
            (Some(onnx_model_path), Some(labels_path)) => Some(ModelConfig {
                onnx_model_path,
                labels_path,
                input_shape: (args.input_size, args.input_size),
            }),
            _ => None,
        };

        Config {
            initial_camera: if args.front {
                CameraSelection::Front
            } else {
                CameraSelection::Back
            },
            frame_interval: Duration::from_millis(args.frame_interval_ms),
            model,
            display: if args.gui {
                DisplayKind::Gui
            } else {
                DisplayKind::Console
            },
            front_dir: args.front_dir,
            back_dir: args.back_dir,
            ..Config::default()
        }
    }
}

fn local_timezone() -> chrono::FixedOffset {
    *chrono::Local::now().offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(list: &[&str]) -> Result<Config, clap::Error> {
        Args::try_parse_from(std::iter::once("live-image-class").chain(list.iter().copied()))
            .map(Config::from)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.initial_camera, CameraSelection::Back);
        assert_eq!(config.display, DisplayKind::Console);
        assert_eq!(config.frame_interval, Duration::from_millis(100));
        assert_eq!(config.waiting_label, "Waiting for image...");
        assert_eq!(config.unable_to_classify_label, "Unable to classify image.");
        assert!(config.model.is_none());
    }

    #[test]
    fn test_model_flags() {
        let config = parse(&[
            "--gui",
            "--front",
            "--model",
            "fish.onnx",
            "--labels",
            "fish.txt",
            "--input-size",
            "299",
            "--frame-interval-ms",
            "40",
        ])
        .unwrap();

        assert_eq!(config.display, DisplayKind::Gui);
        assert_eq!(config.initial_camera, CameraSelection::Front);
        assert_eq!(config.frame_interval, Duration::from_millis(40));
        assert_eq!(
            config.model,
            Some(ModelConfig {
                onnx_model_path: "fish.onnx".to_string(),
                labels_path: "fish.txt".to_string(),
                input_shape: (299, 299),
            })
        );
    }

    #[test]
    fn test_image_dirs() {
        let config = parse(&["--front-dir", "front", "--back-dir", "back"]).unwrap();
        assert_eq!(config.front_dir, Some(PathBuf::from("front")));
        assert_eq!(config.back_dir, Some(PathBuf::from("back")));
    }

    #[test]
    fn test_model_and_labels_go_together() {
        assert_eq!(
            parse(&["--model", "fish.onnx"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(
            parse(&["--labels", "fish.txt"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse(&["--labels"]).is_err());
        assert_eq!(
            parse(&["--frame-interval-ms", "soon"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["--input-size", "0"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["--verbose"]).unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
    }

    #[test]
    fn test_help_is_generated() {
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
    }
}
