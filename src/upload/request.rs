//! Upload request model
//!
//! Everything the handler needs from the transport layer for one request:
//! the per-field file entries, the `CONTENT_LENGTH` / `CONTENT_TYPE` headers
//! and the raw body stream used by non-multipart (PUT style) uploads.

use super::TransportError;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use thiserror::Error;

/// Request model errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequestError {
    #[error("Parallel upload arrays differ in length: {0}")]
    LengthMismatch(String),
}

/// One raw upload descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadEntry {
    /// Temp file written by the multipart mechanism; `None` for raw-body uploads
    pub temp_path: Option<PathBuf>,
    pub name: String,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    pub error: Option<TransportError>,
}

impl UploadEntry {
    /// Entry backed by a multipart temp file
    pub fn multipart(
        temp_path: impl Into<PathBuf>,
        name: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            temp_path: Some(temp_path.into()),
            name: name.into(),
            size: Some(size),
            mime_type: Some(mime_type.into()),
            error: None,
        }
    }

    /// Entry whose content is the request body
    pub fn raw_body(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Attach a raw transport code (`0` clears the error)
    pub fn with_error_code(mut self, code: u32) -> Self {
        self.error = TransportError::from_code(code);
        self
    }
}

/// Entries submitted under one field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpload {
    Single(UploadEntry),
    Multiple(Vec<UploadEntry>),
}

impl FieldUpload {
    /// Build a multi-entry field from the transport's parallel arrays
    ///
    /// Empty temp names mean "no temp file" for that index.
    pub fn from_parallel(
        temp_names: Vec<String>,
        names: Vec<String>,
        sizes: Vec<u64>,
        types: Vec<String>,
        errors: Vec<u32>,
    ) -> Result<Self, RequestError> {
        let len = temp_names.len();
        if [names.len(), sizes.len(), types.len(), errors.len()]
            .iter()
            .any(|&l| l != len)
        {
            return Err(RequestError::LengthMismatch(format!(
                "temp_name={}, name={}, size={}, type={}, error={}",
                len,
                names.len(),
                sizes.len(),
                types.len(),
                errors.len()
            )));
        }

        let entries = temp_names
            .into_iter()
            .zip(names)
            .zip(sizes)
            .zip(types)
            .zip(errors)
            .map(|((((temp_name, name), size), mime_type), code)| UploadEntry {
                temp_path: (!temp_name.is_empty()).then(|| PathBuf::from(temp_name)),
                name,
                size: Some(size),
                mime_type: Some(mime_type),
                error: TransportError::from_code(code),
            })
            .collect();

        Ok(Self::Multiple(entries))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(entries) => entries.len(),
        }
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Current request as seen by the upload handler
#[derive(Default)]
pub struct UploadRequest<'a> {
    files: HashMap<String, FieldUpload>,
    content_length: Option<u64>,
    content_type: Option<String>,
    body: Option<Box<dyn Read + 'a>>,
}

impl<'a> UploadRequest<'a> {
    /// Empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the entries for a field
    pub fn with_field(mut self, field: impl Into<String>, upload: FieldUpload) -> Self {
        self.files.insert(field.into(), upload);
        self
    }

    /// Set the declared `CONTENT_LENGTH`
    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    /// Set the declared `CONTENT_TYPE`
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Attach the raw body stream
    pub fn with_body<R: Read + 'a>(mut self, body: R) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// Entries for `field`, if submitted
    pub fn field(&self, field: &str) -> Option<&FieldUpload> {
        self.files.get(field)
    }

    /// Declared total body length
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Declared body content type
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Take the raw body stream; a body can only be consumed once
    pub fn take_body(&mut self) -> Option<Box<dyn Read + 'a>> {
        self.body.take()
    }
}

impl fmt::Debug for UploadRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("files", &self.files)
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .field("body", &self.body.as_ref().map(|_| ".."))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parallel_preserves_order() {
        let field = FieldUpload::from_parallel(
            vec!["/tmp/a".into(), "".into()],
            vec!["a.png".into(), "b.png".into()],
            vec![10, 20],
            vec!["image/png".into(), "image/png".into()],
            vec![0, 4],
        )
        .unwrap();

        let FieldUpload::Multiple(entries) = field else {
            panic!("Expected Multiple field");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.png");
        assert_eq!(entries[0].temp_path, Some(PathBuf::from("/tmp/a")));
        assert_eq!(entries[0].error, None);
        assert_eq!(entries[1].temp_path, None);
        assert_eq!(entries[1].error, Some(TransportError::NoFile));
    }

    #[test]
    fn test_from_parallel_length_mismatch() {
        let result = FieldUpload::from_parallel(
            vec!["/tmp/a".into()],
            vec!["a.png".into(), "b.png".into()],
            vec![10],
            vec!["image/png".into()],
            vec![0],
        );
        assert!(matches!(result, Err(RequestError::LengthMismatch(_))));
    }

    #[test]
    fn test_take_body_once() {
        let mut request = UploadRequest::new().with_body(&b"hello"[..]);
        assert!(request.take_body().is_some());
        assert!(request.take_body().is_none());
    }

    #[test]
    fn test_entry_error_code() {
        let entry = UploadEntry::raw_body("a.txt").with_error_code(3);
        assert_eq!(entry.error, Some(TransportError::Partial));
        let entry = entry.with_error_code(0);
        assert_eq!(entry.error, None);
    }
}
