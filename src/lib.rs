//! File Uploadr Library
//!
//! Validating upload handler that stores accepted files in a local directory.
//!
//! # Features
//!
//! - **Single or Multiple**: one field may carry one file or an array of files
//! - **Raw Body Uploads**: PUT-style uploads without a multipart envelope
//! - **Validation**: accept pattern, per-file ceiling, request body ceiling
//! - **Truncation Detection**: stored files are re-measured and discarded on mismatch
//!
//! # Example
//!
//! ```no_run
//! use file_uploadr::config::Config;
//! use file_uploadr::upload::{FieldUpload, UploadEntry, UploadRequest};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let handler = config.handler("avatar").expect("avatar handler configured");
//!
//!     let mut request = UploadRequest::new().with_field(
//!         "avatar",
//!         FieldUpload::Single(UploadEntry::multipart("/tmp/upload-1", "me.png", 500, "image/png")),
//!     );
//!     for result in handler.process(&mut request, config.post_size_limit()) {
//!         println!("{}: {:?}", result.name, result.error_message());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use upload::{UploadHandler, UploadResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
