use crate::device_display::interface::{format_label, DeviceDisplay, DeviceDisplayEvent};
use crate::frame::Frame;
use eframe::egui;
use std::error::Error;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const FRAME_HEIGHT: f32 = 300.0;

#[derive(Default)]
struct GuiState {
    image: Option<egui::ColorImage>,
    image_generation: u64,
    label: String,
    status: String,
}

struct DisplayWindow {
    state: Arc<Mutex<GuiState>>,
    events: Sender<DeviceDisplayEvent>,
    texture: Option<egui::TextureHandle>,
    texture_generation: u64,
}

impl DisplayWindow {
    fn sync_texture(&mut self, ctx: &egui::Context) -> (String, String) {
        let Ok(state) = self.state.lock() else {
            return (String::new(), String::new());
        };

        if state.image_generation != self.texture_generation {
            self.texture_generation = state.image_generation;
            self.texture = state.image.clone().map(|image| {
                ctx.load_texture("frame", image, egui::TextureOptions::LINEAR)
            });
        }

        (state.label.clone(), state.status.clone())
    }
}

impl eframe::App for DisplayWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let (label, status) = self.sync_texture(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading("Image Classification");
                ui.add_space(12.0);

                match &self.texture {
                    Some(texture) => {
                        let size = texture.size_vec2();
                        let scale = FRAME_HEIGHT / size.y.max(1.0);
                        ui.image((texture.id(), size * scale));
                    }
                    None => {
                        let (rect, _) = ui.allocate_exact_size(
                            egui::vec2(ui.available_width(), FRAME_HEIGHT),
                            egui::Sense::hover(),
                        );
                        ui.painter().rect_filled(rect, 0.0, egui::Color32::GRAY);
                    }
                }

                ui.add_space(12.0);
                ui.label(egui::RichText::new(label).strong().size(18.0));
                ui.label(egui::RichText::new(status).weak());
                ui.add_space(12.0);

                let rotate = egui::Button::new(
                    egui::RichText::new("Rotate Camera").color(egui::Color32::WHITE),
                )
                .fill(egui::Color32::from_rgb(52, 199, 89));

                if ui.add(rotate).clicked() {
                    let _ = self.events.send(DeviceDisplayEvent::ToggleCamera);
                }
            });
        });

        ctx.request_repaint_after(Duration::from_millis(33));
    }
}

pub struct DeviceDisplayGuiWindow {
    state: Arc<Mutex<GuiState>>,
    event_sender: Sender<DeviceDisplayEvent>,
}

impl DeviceDisplayGuiWindow {
    /// Blocks until the window is closed, then reports `Close`. Must run on the main thread.
    pub fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default().with_inner_size([420.0, 520.0]),
            ..Default::default()
        };

        let window = DisplayWindow {
            state: self.state.clone(),
            events: self.event_sender.clone(),
            texture: None,
            texture_generation: 0,
        };

        let result = eframe::run_native(
            "Image Classification",
            options,
            Box::new(|_cc| Box::new(window)),
        );

        let _ = self.event_sender.send(DeviceDisplayEvent::Close);

        result.map_err(|e| e.to_string().into())
    }
}

pub struct DeviceDisplayGui {
    state: Arc<Mutex<GuiState>>,
    event_sender: Sender<DeviceDisplayEvent>,
    event_receiver: Mutex<Option<Receiver<DeviceDisplayEvent>>>,
}

impl DeviceDisplayGui {
    pub fn new() -> Self {
        let (event_sender, event_receiver) = channel();
        Self {
            state: Arc::new(Mutex::new(GuiState::default())),
            event_sender,
            event_receiver: Mutex::new(Some(event_receiver)),
        }
    }

    /// Handle for running the window on the main thread while the display itself is
    /// driven from the UI loop.
    pub fn window(&self) -> DeviceDisplayGuiWindow {
        DeviceDisplayGuiWindow {
            state: self.state.clone(),
            event_sender: self.event_sender.clone(),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut GuiState)) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut state = self.state.lock().map_err(|e| e.to_string())?;
        apply(&mut state);
        Ok(())
    }
}

fn to_color_image(frame: &Frame) -> Option<egui::ColorImage> {
    let rgba = frame.to_image().ok()?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Some(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

impl DeviceDisplay for DeviceDisplayGui {
    fn on_waiting(&mut self, label: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.update(|state| state.label = label.to_string())
    }

    fn on_result(
        &mut self,
        frame: &Frame,
        label: &str,
        confidence: Option<f32>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let image = to_color_image(frame);
        self.update(|state| {
            state.image = image;
            state.image_generation += 1;
            state.label = format_label(label, confidence);
        })
    }

    fn on_camera_status(&mut self, status: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.update(|state| state.status = status.to_string())
    }

    fn events(&self) -> Receiver<DeviceDisplayEvent> {
        match self.event_receiver.lock().ok().and_then(|mut rx| rx.take()) {
            Some(receiver) => receiver,
            None => channel().1,
        }
    }
}
