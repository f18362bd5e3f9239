use crate::error::SaveError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One of the two inputs of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSlot {
    Data,
    Sku,
}

impl FileSlot {
    pub const ALL: [FileSlot; 2] = [FileSlot::Data, FileSlot::Sku];

    /// Multipart field name the endpoint expects.
    pub fn field_name(self) -> &'static str {
        match self {
            FileSlot::Data => "data_file",
            FileSlot::Sku => "sku_file",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileSlot::Data => "Data File (Excel / ZIP)",
            FileSlot::Sku => "SKU File (Excel)",
        }
    }
}

impl fmt::Display for FileSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A file picked by the user. Only the reference is kept; bytes are read at
/// submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: Option<u64>,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let size = fs::metadata(&path).ok().map(|meta| meta.len());

        Self { path, name, size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionId(pub u64);

/// Everything the worker needs to issue one request.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub id: SubmissionId,
    pub data_file: SelectedFile,
    pub sku_file: SelectedFile,
}

impl UploadRequest {
    pub fn file(&self, slot: FileSlot) -> &SelectedFile {
        match slot {
            FileSlot::Data => &self.data_file,
            FileSlot::Sku => &self.sku_file,
        }
    }
}

/// Sent from the upload worker to the UI loop.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    Progress {
        id: SubmissionId,
        loaded: u64,
        total: Option<u64>,
    },
    Completed {
        id: SubmissionId,
        bytes: Vec<u8>,
    },
    Failed {
        id: SubmissionId,
        reason: String,
    },
}

impl UploadEvent {
    pub fn id(&self) -> SubmissionId {
        match self {
            UploadEvent::Progress { id, .. }
            | UploadEvent::Completed { id, .. }
            | UploadEvent::Failed { id, .. } => *id,
        }
    }
}

/// The response payload held for download.
#[derive(Debug, Clone)]
pub struct DownloadArtifact {
    pub file_name: String,
    bytes: Arc<[u8]>,
}

impl DownloadArtifact {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SaveError> {
        fs::write(path, self.bytes()).map_err(|source| SaveError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
