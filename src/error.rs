//! Error types for the SKU filter client.
//!
//! Every error carries a developer-facing `Display` that gets logged. Users only
//! ever see the fixed notice texts below.

use crate::upload::FileSlot;
use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

pub const MISSING_INPUT_MESSAGE: &str = "Please upload both files!";
/// Shown for every upload failure, whatever the cause.
pub const UPLOAD_FAILED_MESSAGE: &str = "Error uploading files!";
pub const SAVE_FAILED_MESSAGE: &str = "Could not save the result file!";

/// Submission refused before any request was built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("missing input file(s): {}", format_slots(.slots))]
    MissingInput { slots: Vec<FileSlot> },
}

/// Anything that goes wrong between reading the inputs and receiving the
/// response body.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to send request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("server answered {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("failed to read response body: {0}")]
    ResponseBody(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SubmitError {
    pub fn user_message(&self) -> &'static str {
        MISSING_INPUT_MESSAGE
    }
}

impl SaveError {
    pub fn user_message(&self) -> &'static str {
        SAVE_FAILED_MESSAGE
    }
}

fn format_slots(slots: &[FileSlot]) -> String {
    slots
        .iter()
        .map(|slot| slot.field_name())
        .collect::<Vec<_>>()
        .join(", ")
}
