//! Tests for configuration parsing
//!
//! Validates YAML parsing, defaults, environment expansion and the handlers
//! built from configuration.

use file_uploadr::config::{Config, ConfigError, ConfigLoader};
use file_uploadr::upload::{FieldUpload, UploadEntry, UploadRequest, DEFAULT_MAX_SIZE};
use std::io::Write;

#[test]
fn test_parse_full_config() {
    let yaml = r#"
upload_root: "/srv/uploads"
post_max_size: "8m"
handlers:
  - field: avatar
    accept_types: '/\.(png|jpe?g)$/i'
    max_size: 1048576
    save_path: "/srv/uploads/avatars"
  - field: attachment
"#;

    let config = ConfigLoader::parse(yaml).expect("Failed to parse YAML");

    assert_eq!(config.upload_root, "/srv/uploads");
    assert_eq!(config.post_size_limit().get(), Some(8 * 1024 * 1024));
    assert_eq!(config.handlers.len(), 2);

    let avatar = config.handler("avatar").unwrap();
    assert_eq!(avatar.max_size(), 1048576);
    assert!(avatar.accept_pattern().is_match("me.JPG"));
    assert!(!avatar.accept_pattern().is_match("me.gif"));
    assert_eq!(avatar.config().save_path, "/srv/uploads/avatars");

    let attachment = config.handler("attachment").unwrap();
    assert_eq!(attachment.max_size(), DEFAULT_MAX_SIZE);
    assert!(attachment.accept_pattern().is_match("anything.bin"));
    assert_eq!(attachment.config().save_path, "/srv/uploads");
}

#[test]
fn test_defaults_when_omitted() {
    let config = ConfigLoader::parse("handlers:\n  - field: file\n").unwrap();

    assert_eq!(config.upload_root, "upload");
    assert_eq!(config.post_size_limit().get(), None);
}

#[test]
fn test_empty_post_max_size_means_no_limit() {
    let yaml = "post_max_size: \"\"\nhandlers:\n  - field: file\n";
    let config = ConfigLoader::parse(yaml).unwrap();

    assert_eq!(config.post_size_limit().get(), None);
}

#[test]
fn test_null_post_max_size_means_no_limit() {
    let config = ConfigLoader::parse("post_max_size:\nhandlers:\n  - field: file\n").unwrap();

    assert_eq!(config.post_size_limit().get(), None);
}

#[test]
fn test_malformed_post_max_size_is_tolerated() {
    for value in ["bogus", "-1", "[8m]", "true"] {
        let yaml = format!("post_max_size: {}\nhandlers:\n  - field: file\n", value);
        let config = ConfigLoader::parse(&yaml)
            .unwrap_or_else(|e| panic!("post_max_size {} rejected: {}", value, e));
        assert_eq!(config.post_size_limit().get(), None, "post_max_size: {}", value);
    }
}

#[test]
fn test_fractional_post_max_size() {
    let config = ConfigLoader::parse("post_max_size: 1.5g\nhandlers:\n  - field: file\n").unwrap();
    assert_eq!(config.post_size_limit().get(), Some(1536 * 1024 * 1024));

    let config = ConfigLoader::parse("post_max_size: 1.5\nhandlers:\n  - field: file\n").unwrap();
    assert_eq!(config.post_size_limit().get(), Some(1));
}

#[test]
fn test_invalid_accept_pattern_fails_to_parse() {
    let yaml = "handlers:\n  - field: file\n    accept_types: '(unclosed'\n";

    match ConfigLoader::parse(yaml) {
        Err(ConfigError::ParseError(e)) => assert!(e.to_string().contains("accept pattern")),
        other => panic!("Expected ParseError, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_no_handlers_fails_validation() {
    let result = ConfigLoader::parse("handlers: []\n");
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
#[serial_test::serial]
fn test_upload_root_from_environment() {
    std::env::set_var("UPLOADR_TEST_ROOT", "/data/incoming");
    let yaml = "upload_root: \"${UPLOADR_TEST_ROOT:-/fallback}\"\nhandlers:\n  - field: file\n";

    let config = ConfigLoader::parse(yaml).unwrap();
    std::env::remove_var("UPLOADR_TEST_ROOT");

    assert_eq!(config.upload_root, "/data/incoming");
}

#[test]
#[serial_test::serial]
fn test_upload_root_env_default() {
    std::env::remove_var("UPLOADR_TEST_ROOT");
    let yaml = "upload_root: \"${UPLOADR_TEST_ROOT:-/fallback}\"\nhandlers:\n  - field: file\n";

    let config = ConfigLoader::parse(yaml).unwrap();

    assert_eq!(config.upload_root, "/fallback");
}

#[test]
fn test_load_from_file_and_process() {
    let save = tempfile::tempdir().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "upload_root: \"{}\"\npost_max_size: 1k\nhandlers:\n  - field: doc\n    max_size: 100\n",
        save.path().display()
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    let handler = config.handler("doc").unwrap();

    let temp_path = temp.path().join("upload");
    std::fs::write(&temp_path, b"hello").unwrap();
    let mut request = UploadRequest::new()
        .with_field(
            "doc",
            FieldUpload::Single(UploadEntry::multipart(&temp_path, "hello.txt", 5, "text/plain")),
        )
        .with_content_length(5);

    let results = handler.process(&mut request, config.post_size_limit());

    assert!(results[0].is_success());
    assert!(save.path().join("hello.txt").exists());
}

#[test]
fn test_missing_config_file() {
    let result = Config::load("/nonexistent/uploadr.yaml");
    assert!(matches!(result, Err(ConfigError::IoError(_))));
}
