mod state;
mod ui;

use crate::config::Config;
use crate::error::UPLOAD_FAILED_MESSAGE;
use crate::upload::{FilterClient, FileSlot, SelectedFile, UploadEvent, UploadRequest};
use eframe::{egui, App};
use state::{FormState, Notice, NoticeLevel, SubmissionPhase, SubmitOutcome};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use tracing::{debug, error, info};

pub struct SkuFilterApp {
    config: Config,
    state: FormState,
    client: FilterClient,
    event_sender: std_mpsc::Sender<UploadEvent>,
    event_receiver: std_mpsc::Receiver<UploadEvent>,
    saved_path: Option<PathBuf>,
}

impl SkuFilterApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        info!(endpoint = %config.endpoint, "initializing SKU filter client");
        Self::with_config(config)
    }

    fn with_config(config: Config) -> Self {
        let (event_sender, event_receiver) = std_mpsc::channel();
        Self {
            state: FormState::new(config.result_file_name.clone()),
            client: FilterClient::new(config.endpoint.clone()),
            config,
            event_sender,
            event_receiver,
            saved_path: None,
        }
    }

    pub fn select_file(&mut self, slot: FileSlot, path: PathBuf) {
        self.state.select_file(slot, SelectedFile::from_path(path));
    }

    pub fn start_upload(&mut self, ctx: &egui::Context) {
        match self.state.submit() {
            SubmitOutcome::Started(request) => self.spawn_worker(request, ctx.clone()),
            SubmitOutcome::Rejected(err) => debug!(error = %err, "nothing sent"),
            SubmitOutcome::Busy => {}
        }
    }

    /// One thread and runtime per submission; results come back over the channel.
    fn spawn_worker(&self, request: UploadRequest, ctx: egui::Context) {
        let client = self.client.clone();
        let sender = self.event_sender.clone();

        std::thread::spawn(move || {
            let id = request.id;
            match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(client.run(request, &sender)),
                Err(e) => {
                    error!(id = id.0, error = %e, "failed to start upload runtime");
                    sender
                        .send(UploadEvent::Failed {
                            id,
                            reason: e.to_string(),
                        })
                        .unwrap_or_default();
                }
            }
            ctx.request_repaint();
        });
    }

    pub fn save_download(&mut self, path: PathBuf) {
        let Some(artifact) = self.state.download() else {
            return;
        };

        match artifact.save_to(&path) {
            Ok(()) => {
                info!(path = %path.display(), bytes = artifact.len(), "result saved");
                self.saved_path = Some(path);
            }
            Err(e) => {
                error!(error = %e, "failed to save result");
                self.state.push_notice(Notice::error(e.user_message()));
            }
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        let mut had_updates = false;
        while let Ok(event) = self.event_receiver.try_recv() {
            had_updates = true;
            if matches!(event, UploadEvent::Completed { .. }) {
                self.saved_path = None;
            }
            self.state.apply(event);
        }

        if self.state.is_loading() || had_updates {
            ctx.request_repaint();
        }
    }

    /// Shows a pending notice as a blocking native dialog.
    fn show_notice(&mut self) {
        let Some(notice) = self.state.take_notice() else {
            return;
        };

        let (level, title) = match notice.level {
            NoticeLevel::Warning => (rfd::MessageLevel::Warning, "Missing input"),
            NoticeLevel::Error if notice.message == UPLOAD_FAILED_MESSAGE => {
                (rfd::MessageLevel::Error, "Upload failed")
            }
            NoticeLevel::Error => (rfd::MessageLevel::Error, "Error"),
        };

        let _ = rfd::MessageDialog::new()
            .set_level(level)
            .set_title(title)
            .set_description(notice.message.as_str())
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

impl App for SkuFilterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
        self.show_notice();
    }
}
