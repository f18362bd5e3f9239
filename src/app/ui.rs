use super::SkuFilterApp;
use super::SubmissionPhase;
use crate::upload::FileSlot;
use crate::utils::file_size::format_size;
use eframe::egui::{self, Color32, RichText};
use rfd::FileDialog;
use tracing::error;

const ACCENT: Color32 = Color32::from_rgb(46, 139, 87);

impl SkuFilterApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(20.0);
            ui.vertical_centered(|ui| {
                ui.heading("📊 Excel SKU Filter");
                ui.add_space(5.0);
                ui.label(
                    RichText::new("Keep only the rows whose SKU Code is in your list")
                        .color(ui.visuals().text_color().gamma_multiply(0.7)),
                );
            });

            ui.add_space(20.0);

            for slot in FileSlot::ALL {
                self.render_file_input(ui, slot);
                ui.add_space(10.0);
            }

            ui.add_space(10.0);

            ui.vertical_centered(|ui| {
                let loading = self.state.is_loading();
                let label = if loading {
                    "Processing..."
                } else {
                    "🚀 Upload & Filter"
                };

                ui.add_enabled_ui(!loading, |ui| {
                    let button = egui::Button::new(label).min_size(egui::vec2(200.0, 40.0));
                    if ui.add(button).clicked() {
                        self.start_upload(ctx);
                    }
                });

                match self.state.phase() {
                    SubmissionPhase::Completed if !loading => {
                        ui.add_space(5.0);
                        ui.colored_label(ACCENT, "✅ Filtering complete");
                    }
                    SubmissionPhase::Failed => {
                        ui.add_space(5.0);
                        ui.colored_label(Color32::from_rgb(220, 50, 50), "❌ Last upload failed");
                    }
                    _ => {}
                }
            });

            if self.state.is_loading() {
                self.render_progress(ui);
            }

            if self.state.download().is_some() {
                self.render_download(ui);
            }

            ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui| {
                ui.add_space(10.0);
                ui.label(
                    RichText::new(format!("Endpoint: {}", self.config.endpoint))
                        .small()
                        .weak(),
                );
            });
        });
    }

    fn render_file_input(&mut self, ui: &mut egui::Ui, slot: FileSlot) {
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            ui.label(slot.label());
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.button("📁 Choose File").clicked() {
                    if let Some(path) = FileDialog::new().pick_file() {
                        self.select_file(slot, path);
                    }
                }

                match self.state.file(slot) {
                    Some(file) => {
                        ui.label(&file.name);
                        if let Some(size) = file.size {
                            ui.label(RichText::new(format_size(size)).weak());
                        }
                    }
                    None => {
                        ui.label(RichText::new("No file chosen").weak());
                    }
                }
            });
        });
    }

    fn render_progress(&self, ui: &mut egui::Ui) {
        ui.add_space(20.0);
        let percent = self.state.progress();
        let progress_bar = egui::ProgressBar::new(f32::from(percent) / 100.0)
            .text(format!("{}%", percent))
            .animate(false)
            .fill(ACCENT);
        ui.add(progress_bar);
    }

    fn render_download(&mut self, ui: &mut egui::Ui) {
        ui.add_space(20.0);
        ui.vertical_centered(|ui| {
            let Some(artifact) = self.state.download() else {
                return;
            };
            let file_name = artifact.file_name.clone();
            let hover = format!("{} ({})", file_name, format_size(artifact.len() as u64));

            let link = ui.link(RichText::new("⬇ Download Result").size(16.0).color(ACCENT));
            if link.on_hover_text(hover).clicked() {
                if let Some(path) = FileDialog::new().set_file_name(&file_name).save_file() {
                    self.save_download(path);
                }
            }

            if let Some(path) = self.saved_path.clone() {
                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("Saved to {}", path.display())).weak());
                    if ui.small_button("Open").clicked() {
                        if let Err(e) = open::that(&path) {
                            error!(path = %path.display(), error = %e, "failed to open result");
                        }
                    }
                });
            }
        });
    }
}
