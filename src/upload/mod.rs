mod client;
pub mod progress;
mod types;

pub use client::FilterClient;
pub use types::{
    DownloadArtifact, FileSlot, SelectedFile, SubmissionId, UploadEvent, UploadRequest,
};
