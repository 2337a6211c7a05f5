//! Upload handler
//!
//! Processes every entry submitted under one field name: each entry is
//! validated, moved (or streamed) into the save directory and then measured
//! on disk. Entries are handled one after another, in submission order.
//!
//! # Example
//!
//! ```no_run
//! use file_uploadr::upload::{
//!     AcceptPattern, FieldUpload, PostSizeLimit, UploadEntry, UploadHandler, UploadRequest,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = UploadHandler::new("avatar")
//!     .with_accept_pattern(AcceptPattern::new(r"/\.(png|jpe?g)$/i")?)
//!     .with_max_size(1024 * 1024)
//!     .with_save_path("/var/lib/uploadr/avatars");
//!
//! let mut request = UploadRequest::new().with_field(
//!     "avatar",
//!     FieldUpload::Single(UploadEntry::multipart("/tmp/upload-1234", "me.png", 500, "image/png")),
//! );
//!
//! for result in handler.process(&mut request, PostSizeLimit::parse("8m")) {
//!     match result.error_message() {
//!         None => println!("stored {} ({} bytes)", result.name, result.size),
//!         Some(error) => println!("rejected {}: {}", result.name, error),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use super::limits::PostSizeLimit;
use super::pattern::AcceptPattern;
use super::persist;
use super::request::{FieldUpload, UploadEntry, UploadRequest};
use super::{UploadFailure, UploadResult};
use std::io;
use std::path::{PathBuf, MAIN_SEPARATOR};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Default per-file ceiling (10 MiB)
pub const DEFAULT_MAX_SIZE: u64 = 10_485_760;

/// Default save directory when none is configured
pub const DEFAULT_UPLOAD_ROOT: &str = "upload";

static UNIQUE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Handler settings, fully resolved at construction
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerConfig {
    pub field_name: String,
    pub accept_pattern: AcceptPattern,
    pub max_size: u64,
    pub save_path: String,
}

impl HandlerConfig {
    /// Settings for `field_name` with every other value defaulted
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            accept_pattern: AcceptPattern::any(),
            max_size: DEFAULT_MAX_SIZE,
            save_path: DEFAULT_UPLOAD_ROOT.to_string(),
        }
    }
}

/// Single-field upload handler
#[derive(Debug, Clone)]
pub struct UploadHandler {
    config: HandlerConfig,
}

impl UploadHandler {
    /// Handler for `field_name` with default settings
    pub fn new(field_name: impl Into<String>) -> Self {
        Self::from_config(HandlerConfig::new(field_name))
    }

    /// Handler from explicit settings
    pub fn from_config(config: HandlerConfig) -> Self {
        Self { config }
    }

    pub fn with_accept_pattern(mut self, pattern: AcceptPattern) -> Self {
        self.config.accept_pattern = pattern;
        self
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.config.max_size = max_size;
        self
    }

    pub fn with_save_path(mut self, save_path: impl Into<String>) -> Self {
        self.config.save_path = save_path.into();
        self
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn field_name(&self) -> &str {
        &self.config.field_name
    }

    pub fn accept_pattern(&self) -> &AcceptPattern {
        &self.config.accept_pattern
    }

    pub fn max_size(&self) -> u64 {
        self.config.max_size
    }

    /// Save directory with exactly one trailing separator
    pub fn save_path(&self) -> String {
        normalize_directory(&self.config.save_path)
    }

    /// Process-unique, time-based name token
    ///
    /// Hex seconds and microseconds followed by a process-wide counter.
    /// Not random; do not use where unpredictability matters.
    pub fn unique_file_name(&self) -> String {
        let now = chrono::Utc::now();
        let sequence = UNIQUE_COUNTER.fetch_add(1, Ordering::Relaxed);
        format!(
            "{:08x}{:05x}.{:08}",
            now.timestamp(),
            now.timestamp_subsec_micros(),
            sequence
        )
    }

    /// Handle every entry submitted under the configured field
    ///
    /// Results come back in submission order. A single entry without
    /// size or type falls back to the request's `CONTENT_LENGTH` and
    /// `CONTENT_TYPE`; a missing field is handled as a raw-body upload
    /// with no declared name.
    pub fn process(&self, request: &mut UploadRequest<'_>, limit: PostSizeLimit) -> Vec<UploadResult> {
        let entries = match request.field(&self.config.field_name).cloned() {
            Some(FieldUpload::Multiple(entries)) => entries,
            Some(FieldUpload::Single(entry)) => vec![with_header_fallback(entry, request)],
            None => {
                tracing::debug!(
                    field = %self.config.field_name,
                    "Field not present, treating request body as the upload"
                );
                vec![with_header_fallback(UploadEntry::default(), request)]
            }
        };

        entries
            .iter()
            .map(|entry| self.upload(entry, request, limit))
            .collect()
    }

    /// Validate one entry and persist it when it passes
    #[tracing::instrument(
        name = "upload.file",
        skip(self, entry, request, limit),
        fields(
            upload.field = %self.config.field_name,
            upload.name = %entry.name,
            upload.declared_size = ?entry.size,
            upload.size = tracing::field::Empty,
            upload.error = tracing::field::Empty
        )
    )]
    pub fn upload(
        &self,
        entry: &UploadEntry,
        request: &mut UploadRequest<'_>,
        limit: PostSizeLimit,
    ) -> UploadResult {
        let start_time = Instant::now();
        let mut result = UploadResult {
            name: entry.name.clone(),
            size: entry.size.unwrap_or(0),
            mime_type: entry.mime_type.clone().unwrap_or_default(),
            error: None,
        };

        if let Err(failure) = self.validate(entry, &result, request.content_length(), limit) {
            tracing::warn!(
                reason = failure.reason(),
                error = %failure,
                "Upload rejected"
            );
            return self.finish(result, Some(failure), start_time);
        }

        let dest = PathBuf::from(format!("{}{}", self.save_path(), result.name));

        let written = match &entry.temp_path {
            Some(temp_path) => persist::move_into_place(temp_path, &dest),
            None => {
                let written = match request.take_body() {
                    Some(mut body) => persist::write_stream(&mut body, &dest),
                    None => persist::write_stream(&mut io::empty(), &dest),
                };
                written.map(|_| ())
            }
        };

        if let Err(e) = written {
            tracing::error!(
                path = %dest.display(),
                error = %e,
                "Failed to write upload"
            );
            return self.finish(result, Some(UploadFailure::WriteFailed(e.to_string())), start_time);
        }

        let measured = persist::measure(&dest).unwrap_or_else(|e| {
            tracing::warn!(path = %dest.display(), error = %e, "Failed to measure upload");
            0
        });

        if measured != result.size {
            tracing::warn!(
                path = %dest.display(),
                declared = result.size,
                measured = measured,
                "Size mismatch after transfer, discarding file"
            );
            result.size = measured;
            persist::discard(&dest);
            return self.finish(result, Some(UploadFailure::Aborted), start_time);
        }

        tracing::info!(
            path = %dest.display(),
            bytes = measured,
            mime_type = %result.mime_type,
            "Upload stored"
        );
        self.finish(result, None, start_time)
    }

    /// First failing check wins
    fn validate(
        &self,
        entry: &UploadEntry,
        result: &UploadResult,
        content_length: Option<u64>,
        limit: PostSizeLimit,
    ) -> Result<(), UploadFailure> {
        if let Some(error) = entry.error {
            return Err(UploadFailure::Transport(error));
        }

        if limit.is_exceeded_by(content_length) {
            return Err(UploadFailure::PostSizeExceeded);
        }

        if !self.config.accept_pattern.is_match(&result.name) {
            return Err(UploadFailure::TypeRejected);
        }

        if result.size > self.config.max_size {
            return Err(UploadFailure::TooBig);
        }

        Ok(())
    }

    fn finish(
        &self,
        mut result: UploadResult,
        failure: Option<UploadFailure>,
        start_time: Instant,
    ) -> UploadResult {
        let span = tracing::Span::current();
        span.record("upload.size", result.size);
        if let Some(failure) = &failure {
            span.record("upload.error", tracing::field::display(failure));
        }

        #[cfg(feature = "metrics")]
        {
            let field = self.config.field_name.as_str();
            crate::metrics::record_upload_duration(field, start_time.elapsed().as_secs_f64());
            match &failure {
                None => crate::metrics::record_upload_success(field, result.size),
                Some(failure) => crate::metrics::record_upload_failure(field, failure.reason()),
            }
        }
        #[cfg(not(feature = "metrics"))]
        let _ = start_time;

        result.error = failure;
        result
    }
}

/// Fill a single entry's missing size/type from the request headers
fn with_header_fallback(mut entry: UploadEntry, request: &UploadRequest<'_>) -> UploadEntry {
    if entry.size.is_none() {
        entry.size = request.content_length();
    }
    if entry.mime_type.is_none() {
        entry.mime_type = request.content_type().map(str::to_string);
    }
    entry
}

/// Ensure exactly one trailing separator, replacing a trailing `/` or `\`
fn normalize_directory(directory: &str) -> String {
    if directory.is_empty() {
        return format!(".{}", MAIN_SEPARATOR);
    }
    let trimmed = directory
        .strip_suffix(|c: char| c == '/' || c == '\\')
        .unwrap_or(directory);
    format!("{}{}", trimmed, MAIN_SEPARATOR)
}
