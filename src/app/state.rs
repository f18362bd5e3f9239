use crate::error::{SubmitError, UPLOAD_FAILED_MESSAGE};
use crate::upload::progress::{self, COMPLETE_PERCENT, INITIAL_PERCENT};
use crate::upload::{
    DownloadArtifact, FileSlot, SelectedFile, SubmissionId, UploadEvent, UploadRequest,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Uploading,
    Failed,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A blocking message the UI must show before going on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Result of pressing submit.
#[derive(Debug)]
pub enum SubmitOutcome {
    Started(UploadRequest),
    Rejected(SubmitError),
    /// A request is already in flight.
    Busy,
}

/// The form controller. Owned by the UI loop, which is its only writer.
#[derive(Debug)]
pub struct FormState {
    data_file: Option<SelectedFile>,
    sku_file: Option<SelectedFile>,
    progress: u8,
    loading: bool,
    download: Option<DownloadArtifact>,
    phase: SubmissionPhase,
    notice: Option<Notice>,
    result_file_name: String,
    active: Option<SubmissionId>,
    next_id: u64,
}

impl FormState {
    pub fn new(result_file_name: impl Into<String>) -> Self {
        Self {
            data_file: None,
            sku_file: None,
            progress: 0,
            loading: false,
            download: None,
            phase: SubmissionPhase::Idle,
            notice: None,
            result_file_name: result_file_name.into(),
            active: None,
            next_id: 1,
        }
    }

    pub fn file(&self, slot: FileSlot) -> Option<&SelectedFile> {
        match slot {
            FileSlot::Data => self.data_file.as_ref(),
            FileSlot::Sku => self.sku_file.as_ref(),
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn download(&self) -> Option<&DownloadArtifact> {
        self.download.as_ref()
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Replaces whatever was selected for `slot`.
    pub fn select_file(&mut self, slot: FileSlot, file: SelectedFile) {
        debug!(slot = %slot, name = %file.name, size = ?file.size, "file selected");
        match slot {
            FileSlot::Data => self.data_file = Some(file),
            FileSlot::Sku => self.sku_file = Some(file),
        }
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        if self.loading {
            warn!(active = ?self.active, "submit ignored, a request is already in flight");
            return SubmitOutcome::Busy;
        }

        let (data_file, sku_file) = match (&self.data_file, &self.sku_file) {
            (Some(data), Some(sku)) => (data.clone(), sku.clone()),
            _ => {
                let err = SubmitError::MissingInput {
                    slots: FileSlot::ALL
                        .into_iter()
                        .filter(|slot| self.file(*slot).is_none())
                        .collect(),
                };
                warn!(error = %err, "submit rejected");
                self.notice = Some(Notice::warning(err.user_message()));
                return SubmitOutcome::Rejected(err);
            }
        };

        let id = SubmissionId(self.next_id);
        self.next_id += 1;
        self.active = Some(id);
        self.loading = true;
        self.progress = INITIAL_PERCENT;
        self.phase = SubmissionPhase::Uploading;

        info!(id = id.0, data_file = %data_file.name, sku_file = %sku_file.name, "submission started");
        SubmitOutcome::Started(UploadRequest {
            id,
            data_file,
            sku_file,
        })
    }

    /// Applies a worker event. Events for anything but the active submission are dropped.
    pub fn apply(&mut self, event: UploadEvent) {
        if !self.loading || self.active != Some(event.id()) {
            debug!(id = event.id().0, "dropping stale upload event");
            return;
        }

        match event {
            UploadEvent::Progress { loaded, total, .. } => {
                self.progress = progress::advance(self.progress, loaded, total);
            }
            UploadEvent::Completed { id, bytes } => {
                info!(id = id.0, bytes = bytes.len(), "download ready");
                self.progress = COMPLETE_PERCENT;
                self.download = Some(DownloadArtifact::new(self.result_file_name.clone(), bytes));
                self.phase = SubmissionPhase::Completed;
                self.finish();
            }
            UploadEvent::Failed { id, reason } => {
                warn!(id = id.0, %reason, "submission failed");
                self.notice = Some(Notice::error(UPLOAD_FAILED_MESSAGE));
                self.phase = SubmissionPhase::Failed;
                self.finish();
            }
        }
    }

    fn finish(&mut self) {
        self.loading = false;
        self.active = None;
    }
}
