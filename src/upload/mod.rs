//! Upload module
//!
//! Validates uploaded file entries for one request field and persists the
//! accepted ones into a save directory.

use serde::{Serialize, Serializer};
use thiserror::Error;

pub mod handler;
pub mod limits;
pub mod pattern;
pub mod persist;
pub mod request;
pub mod staging;

pub use handler::{HandlerConfig, UploadHandler, DEFAULT_MAX_SIZE};
pub use limits::PostSizeLimit;
pub use pattern::{AcceptPattern, PatternError};
pub use request::{FieldUpload, RequestError, UploadEntry, UploadRequest};

/// Failure codes reported by the transport layer for a single entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Code 1: larger than the server-side per-file directive
    IniSize,
    /// Code 2: larger than the limit declared by the submitting form
    FormSize,
    /// Code 3: only part of the file arrived
    Partial,
    /// Code 4: the field was submitted without a file
    NoFile,
    /// Code 6: no temporary directory to receive the file
    NoTmpDir,
    /// Code 7: the temporary file could not be written
    CantWrite,
    /// Code 8: an extension stopped the transfer
    Extension,
    /// Any other non-zero code
    Unknown(u32),
}

impl TransportError {
    /// Map a raw transport code, `0` meaning "no error"
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => None,
            1 => Some(Self::IniSize),
            2 => Some(Self::FormSize),
            3 => Some(Self::Partial),
            4 => Some(Self::NoFile),
            6 => Some(Self::NoTmpDir),
            7 => Some(Self::CantWrite),
            8 => Some(Self::Extension),
            other => Some(Self::Unknown(other)),
        }
    }

    /// Raw transport code
    pub fn code(&self) -> u32 {
        match self {
            Self::IniSize => 1,
            Self::FormSize => 2,
            Self::Partial => 3,
            Self::NoFile => 4,
            Self::NoTmpDir => 6,
            Self::CantWrite => 7,
            Self::Extension => 8,
            Self::Unknown(code) => *code,
        }
    }

    /// Human-readable message for the code
    pub fn message(&self) -> String {
        match self {
            Self::IniSize => "the uploaded file exceeds the server upload size limit".into(),
            Self::FormSize => "the uploaded file exceeds the form size limit".into(),
            Self::Partial => "the file was only partially uploaded".into(),
            Self::NoFile => "no file was uploaded".into(),
            Self::NoTmpDir => "missing temporary folder".into(),
            Self::CantWrite => "failed to write file to disk".into(),
            Self::Extension => "file upload stopped by extension".into(),
            Self::Unknown(code) => format!("unknown upload error (code {})", code),
        }
    }
}

/// Why an entry was not persisted
///
/// The `Display` text is the message reported in [`UploadResult::error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    #[error("{}", .0.message())]
    Transport(TransportError),

    #[error("exceeds post size limit")]
    PostSizeExceeded,

    #[error("filetype not allowed")]
    TypeRejected,

    #[error("file too big")]
    TooBig,

    #[error("abort")]
    Aborted,

    #[error("failed to write file: {0}")]
    WriteFailed(String),
}

impl UploadFailure {
    /// Short label used for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::PostSizeExceeded => "post_size",
            Self::TypeRejected => "type",
            Self::TooBig => "too_big",
            Self::Aborted => "abort",
            Self::WriteFailed(_) => "write",
        }
    }
}

/// Outcome for one processed entry
///
/// `size` is the declared size for rejected entries and the measured on-disk
/// size once a file has been written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    #[serde(serialize_with = "serialize_failure")]
    pub error: Option<UploadFailure>,
}

impl UploadResult {
    /// Whether the entry was persisted
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Error message, if any
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

fn serialize_failure<S>(error: &Option<UploadFailure>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}
