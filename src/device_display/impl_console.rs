use crate::device_display::interface::{format_label, DeviceDisplay, DeviceDisplayEvent};
use crate::frame::Frame;
use std::error::Error;
use std::io::BufRead;
use std::sync::mpsc::{channel, Receiver};

const WIDTH: usize = 40;

/// Text panel on stdout. Reads the controls from stdin: an empty line or `r` rotates the
/// camera, `q` quits.
pub struct DeviceDisplayConsole {
    frame_line: String,
    label_line: String,
    status_line: String,
}

impl DeviceDisplayConsole {
    pub fn new() -> Self {
        Self {
            frame_line: "[no image]".to_string(),
            label_line: String::new(),
            status_line: String::new(),
        }
    }

    fn lines(&self) -> Vec<String> {
        let border = "─".repeat(WIDTH + 2);
        let row = |text: &str| {
            let text: String = text.chars().take(WIDTH).collect();
            format!("│ {:<width$} │", text, width = WIDTH)
        };
        vec![
            format!("┌{}┐", border),
            row("Image Classification"),
            row(&self.frame_line),
            row(&self.label_line),
            row(&self.status_line),
            row("[Enter] Rotate Camera   [q] Quit"),
            format!("└{}┘", border),
        ]
    }

    fn render_display(&self) {
        println!("{}", self.lines().join("\n"));
    }
}

fn parse_command(line: &str) -> Option<DeviceDisplayEvent> {
    match line.trim() {
        "" | "r" => Some(DeviceDisplayEvent::ToggleCamera),
        "q" => Some(DeviceDisplayEvent::Close),
        _ => None,
    }
}

impl DeviceDisplay for DeviceDisplayConsole {
    fn on_waiting(&mut self, label: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.label_line = label.to_string();
        self.render_display();
        Ok(())
    }

    fn on_result(
        &mut self,
        frame: &Frame,
        label: &str,
        confidence: Option<f32>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.frame_line = format!("[{}x{} {:?}]", frame.width, frame.height, frame.format);
        self.label_line = format_label(label, confidence);
        self.render_display();
        Ok(())
    }

    fn on_camera_status(&mut self, status: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.status_line = status.to_string();
        self.render_display();
        Ok(())
    }

    fn events(&self) -> Receiver<DeviceDisplayEvent> {
        let (tx, rx) = channel();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if let Some(event) = parse_command(&line) {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            }
        });
        rx
    }
}
