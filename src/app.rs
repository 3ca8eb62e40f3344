use tracing::error;

use crate::face_detection::FaceDetectionModel;
use crate::session::{Workbench, JPEG_EXTENSIONS};
use crate::utils::{lock, SharedState};

pub struct FaceWizardApp<M> {
    workbench: Workbench<M>,
    shared_state: SharedState,
    texture: Option<egui::TextureHandle>,
    texture_revision: u64,
    window_title: String,
}

impl<M: FaceDetectionModel + 'static> FaceWizardApp<M> {
    pub fn new(cc: &eframe::CreationContext<'_>, mut workbench: Workbench<M>) -> Self {
        let ctx = cc.egui_ctx.clone();
        workbench.set_on_update(move || ctx.request_repaint());
        let shared_state = workbench.state();

        Self {
            workbench,
            shared_state,
            texture: None,
            texture_revision: 0,
            window_title: String::new(),
        }
    }

    fn browse(&mut self) {
        let selection = rfd::FileDialog::new()
            .add_filter("JPEG Image", &JPEG_EXTENSIONS)
            .pick_file();

        if let Err(err) = self.workbench.select(selection) {
            error!("cannot start detection: {}", err);
        }
    }

    // re-upload the texture only when the displayed bitmap was replaced
    fn sync_texture(&mut self, ctx: &egui::Context) {
        let state = lock(&self.shared_state);
        if state.revision == self.texture_revision {
            return;
        }
        self.texture_revision = state.revision;

        let Some(display) = state.display.as_ref() else {
            self.texture = None;
            return;
        };
        let ui_image =
            egui::ColorImage::from_rgba_unmultiplied(display.size(), display.image.as_raw());
        drop(state);

        match self.texture.as_mut() {
            Some(texture) => texture.set(ui_image, egui::TextureOptions::default()),
            None => {
                self.texture =
                    Some(ctx.load_texture("face_photo", ui_image, egui::TextureOptions::default()))
            }
        }
    }
}

impl<M: FaceDetectionModel + 'static> eframe::App for FaceWizardApp<M> {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.sync_texture(ctx);

        let (status, file_name) = {
            let state = lock(&self.shared_state);
            let file_name = state
                .image_path
                .as_deref()
                .and_then(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned());
            (state.status.clone(), file_name)
        };
        let title = status.title();
        if title != self.window_title {
            frame.set_window_title(&title);
            self.window_title = title;
        }

        let mut browse_clicked = false;

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Browse...").clicked() {
                        browse_clicked = true;
                        ui.close_menu();
                    }
                    if ui.button("Quit").clicked() {
                        frame.close();
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Browse").clicked() {
                    browse_clicked = true;
                }
                if let Some(file_name) = &file_name {
                    ui.label(file_name);
                }
                if status.is_busy() {
                    ui.spinner();
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(texture) = self.texture.as_ref() else {
                ui.centered_and_justified(|ui| ui.label("Pick a JPEG image to detect faces."));
                return;
            };

            // fit the image into the panel, keeping its aspect ratio
            let [width, height] = texture.size();
            let available = ui.available_size();
            let scale = (available.x / width as f32)
                .min(available.y / height as f32)
                .min(1.0);
            ui.image(
                texture,
                egui::Vec2::new(width as f32 * scale, height as f32 * scale),
            );
        });

        if browse_clicked {
            self.browse();
        }
    }
}
